//! Frame-rate sampling over a timed measurement window
//!
//! The render loop calls [`MetricSampler::tick`] once per frame. Frame counts are
//! flushed into an fps value once per flush interval; the value is only recorded while a
//! measurement window is past its warm-up, so startup jitter never reaches the export.

use crate::config::SamplerConfig;
use crate::error::ExportError;
use crate::export::{self, ExportOutcome};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One recorded frame-rate value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Flush time, milliseconds since the Unix epoch
    pub timestamp: u64,
    /// Frames per second over the flushed interval
    pub fps: u32,
}

/// Where a measurement window currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MeasurementPhase {
    /// No window running
    Idle,
    /// Window started, samples not recorded yet
    WarmUp,
    /// Samples are recorded
    Active,
}

/// Deadlines of one measurement window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementWindow {
    started_at: u64,
    warmup_ms: u64,
    window_ms: u64,
}

impl MeasurementWindow {
    /// A window starting at `started_at`
    pub fn new(started_at: u64, config: &SamplerConfig) -> Self {
        Self {
            started_at,
            warmup_ms: config.warmup_ms,
            window_ms: config.window_ms,
        }
    }

    /// Start time
    pub fn started_at(&self) -> u64 {
        self.started_at
    }

    /// When recording begins
    pub fn active_at(&self) -> u64 {
        self.started_at.saturating_add(self.warmup_ms)
    }

    /// When recording stops
    pub fn ends_at(&self) -> u64 {
        self.started_at.saturating_add(self.window_ms)
    }

    /// Phase at time `now`
    pub fn phase_at(&self, now: u64) -> MeasurementPhase {
        if now < self.active_at() {
            MeasurementPhase::WarmUp
        } else if now < self.ends_at() {
            MeasurementPhase::Active
        } else {
            MeasurementPhase::Idle
        }
    }
}

/// Rolling frame counter plus the samples of the current window
#[derive(Debug, Clone)]
pub struct MetricSampler {
    config: SamplerConfig,
    window: Option<MeasurementWindow>,
    samples: Vec<MetricSample>,
    frames: u32,
    last_flush: Option<u64>,
    current_fps: Option<u32>,
    last_phase: MeasurementPhase,
}

impl MetricSampler {
    /// Create an idle sampler
    pub fn new(config: SamplerConfig) -> Self {
        Self {
            config,
            window: None,
            samples: Vec::new(),
            frames: 0,
            last_flush: None,
            current_fps: None,
            last_phase: MeasurementPhase::Idle,
        }
    }

    /// Begin a new window at `now`, discarding earlier samples
    ///
    /// A window still running is replaced along with its deadlines.
    pub fn start_measurement(&mut self, now: u64) {
        if self.window.is_some() {
            debug!("replacing running measurement window");
        }
        let window = MeasurementWindow::new(now, &self.config);
        self.samples.clear();
        self.window = Some(window);
        self.last_phase = MeasurementPhase::WarmUp;
        info!(
            warmup_ms = self.config.warmup_ms,
            window_ms = self.config.window_ms,
            "measurement started"
        );
    }

    /// Phase at time `now`
    pub fn phase(&self, now: u64) -> MeasurementPhase {
        self.window
            .map(|window| window.phase_at(now))
            .unwrap_or(MeasurementPhase::Idle)
    }

    /// Running window, if any
    pub fn window(&self) -> Option<&MeasurementWindow> {
        self.window.as_ref()
    }

    /// Samples of the current (or last) window
    pub fn samples(&self) -> &[MetricSample] {
        &self.samples
    }

    /// Most recent flushed fps, recorded or not
    pub fn current_fps(&self) -> Option<u32> {
        self.current_fps
    }

    /// Count a rendered frame at `now`
    ///
    /// Returns the sample recorded by this tick, if the tick flushed inside the active phase.
    pub fn tick(&mut self, now: u64) -> Option<MetricSample> {
        self.frames = self.frames.saturating_add(1);
        let phase = self.observe_phase(now);

        let Some(last_flush) = self.last_flush else {
            // first frame only anchors the interval
            self.frames = 0;
            self.last_flush = Some(now);
            return None;
        };

        let elapsed = now.saturating_sub(last_flush);
        if elapsed < self.config.flush_interval_ms {
            return None;
        }

        let fps = (f64::from(self.frames) * 1000.0 / elapsed as f64).round() as u32;
        self.frames = 0;
        self.last_flush = Some(now);
        self.current_fps = Some(fps);

        if phase != MeasurementPhase::Active {
            return None;
        }
        let sample = MetricSample { timestamp: now, fps };
        self.samples.push(sample);
        Some(sample)
    }

    /// Serialize the recorded samples
    pub fn export(&self, filename: &str) -> Result<ExportOutcome, ExportError> {
        export::export_samples(&self.samples, filename)
    }

    fn observe_phase(&mut self, now: u64) -> MeasurementPhase {
        let phase = self.phase(now);
        if phase != self.last_phase {
            match phase {
                MeasurementPhase::Active => info!("measurement warm-up finished, recording"),
                MeasurementPhase::Idle => {
                    info!(samples = self.samples.len(), "measurement window finished");
                    self.window = None;
                }
                MeasurementPhase::WarmUp => {}
            }
            self.last_phase = phase;
        }
        phase
    }
}
