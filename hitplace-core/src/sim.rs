//! Scripted AR sessions
//!
//! A [`Scenario`] describes when surfaces are in view, how the host paces frames, and
//! when the user acts. [`run_scenario`] replays it against a real [`ArSession`] over a
//! [`ScriptedTracker`] and a manual clock, so the whole pipeline can be exercised without
//! a device.

use crate::clock::ManualClock;
use crate::config::HitplaceConfig;
use crate::error::{Error, Result, TrackerError};
use crate::export::CsvArtifact;
use crate::handshake::{HandshakeState, Resolved};
use crate::model::ModelProvider;
use crate::sampler::MetricSample;
use crate::scene::{Renderer, Scene};
use crate::session::{ArSession, RETICLE_ENTITY};
use crate::tracker::{
    HitTestOptions, HitTestResult, HitTestSourceHandle, Pose, ReferenceSpaceKind, RequestId,
    SpaceHandle, SpatialTracker, TrackerFrame,
};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use tracing::{debug, info};

/// A stretch of time during which a surface is in view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSpan {
    /// First visible moment, ms from scenario start
    pub from_ms: u64,
    /// End of visibility (exclusive)
    pub to_ms: u64,
    /// Hit position in the local space
    pub position: Vec3,
    /// Rotation of the surface around the up axis
    #[serde(default)]
    pub yaw_degrees: f32,
}

impl SurfaceSpan {
    fn covers(&self, t: u64) -> bool {
        self.from_ms <= t && t < self.to_ms
    }

    fn pose(&self) -> Pose {
        Pose::from_position_orientation(self.position, Quat::from_rotation_y(self.yaw_degrees.to_radians()))
    }
}

/// Frame pacing override for a stretch of time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacingSpan {
    /// Start, ms from scenario start
    pub from_ms: u64,
    /// End (exclusive)
    pub to_ms: u64,
    /// Frame interval inside the span
    pub frame_interval_ms: u64,
}

/// How many times each handshake request is rejected before it succeeds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailurePlan {
    /// Rejections of the viewer space request
    #[serde(default)]
    pub viewer_space: u32,
    /// Rejections of the hit-test source request
    #[serde(default)]
    pub hit_test_source: u32,
    /// Rejections of the local space request
    #[serde(default)]
    pub local_space: u32,
}

/// A user or host action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScenarioAction {
    /// The host starts an AR session
    SessionStart,
    /// The host ends the AR session
    SessionEnd,
    /// The user taps to place
    Select,
    /// The user picks a model
    SelectModel {
        /// Catalog key
        key: String,
    },
    /// The user starts a measurement window
    StartMeasurement,
    /// The user asks for the CSV export
    Export,
}

/// An action at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioEvent {
    /// Time, ms from scenario start
    pub at_ms: u64,
    /// What happens
    #[serde(flatten)]
    pub action: ScenarioAction,
}

/// A scripted session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario length in ms
    pub duration_ms: u64,

    /// Default frame interval
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Wall-clock time the scenario starts at
    #[serde(default = "default_start_epoch_ms")]
    pub start_epoch_ms: u64,

    /// Handshake rejections to inject
    #[serde(default)]
    pub failures: FailurePlan,

    /// When surfaces are in view
    #[serde(default)]
    pub surfaces: Vec<SurfaceSpan>,

    /// Frame interval overrides
    #[serde(default)]
    pub pacing: Vec<PacingSpan>,

    /// User and host actions
    #[serde(default)]
    pub events: Vec<ScenarioEvent>,
}

fn default_frame_interval_ms() -> u64 { 16 }
fn default_start_epoch_ms() -> u64 { 1_700_000_000_000 }

impl Scenario {
    /// Parse a TOML scenario
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let scenario: Scenario =
            toml::from_str(text).map_err(|e| Error::Scenario(e.to_string()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Read a TOML scenario file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Scenario(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// The stock session: find a floor, place a few cubes, measure for the full window
    pub fn demo() -> Self {
        let at = |at_ms: u64, action: ScenarioAction| ScenarioEvent { at_ms, action };
        Self {
            duration_ms: 42_000,
            frame_interval_ms: default_frame_interval_ms(),
            start_epoch_ms: default_start_epoch_ms(),
            failures: FailurePlan::default(),
            surfaces: vec![
                SurfaceSpan {
                    from_ms: 500,
                    to_ms: 12_000,
                    position: Vec3::new(0.0, -1.3, -1.0),
                    yaw_degrees: 0.0,
                },
                SurfaceSpan {
                    from_ms: 15_000,
                    to_ms: 30_000,
                    position: Vec3::new(0.6, -1.3, -2.0),
                    yaw_degrees: 45.0,
                },
            ],
            pacing: vec![PacingSpan {
                from_ms: 20_000,
                to_ms: 25_000,
                frame_interval_ms: 33,
            }],
            events: vec![
                at(0, ScenarioAction::SessionStart),
                at(100, ScenarioAction::Select),
                at(1_000, ScenarioAction::StartMeasurement),
                at(2_000, ScenarioAction::Select),
                at(13_000, ScenarioAction::Select),
                at(16_000, ScenarioAction::Select),
                at(40_000, ScenarioAction::Export),
                at(41_000, ScenarioAction::SessionEnd),
            ],
        }
    }

    /// Check pacing values
    pub fn validate(&self) -> Result<()> {
        if self.frame_interval_ms == 0 || self.pacing.iter().any(|p| p.frame_interval_ms == 0) {
            return Err(Error::Scenario("frame interval must be greater than zero".to_string()));
        }
        Ok(())
    }

    fn frame_interval_at(&self, t: u64) -> u64 {
        self.pacing
            .iter()
            .find(|span| span.from_ms <= t && t < span.to_ms)
            .map(|span| span.frame_interval_ms)
            .unwrap_or(self.frame_interval_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PendingRequest {
    Space(ReferenceSpaceKind),
    Source,
}

/// Tracker that resolves every request on the following frame
#[derive(Debug, Clone)]
pub struct ScriptedTracker {
    next_id: u64,
    next_handle: u64,
    pending: VecDeque<(RequestId, PendingRequest)>,
    failures: FailurePlan,
    surfaces: Vec<SurfaceSpan>,
    live_sources: Vec<HitTestSourceHandle>,
    cancelled: Vec<HitTestSourceHandle>,
}

impl ScriptedTracker {
    /// Tracker with the given surfaces and rejection plan
    pub fn new(surfaces: Vec<SurfaceSpan>, failures: FailurePlan) -> Self {
        Self {
            next_id: 0,
            next_handle: 0,
            pending: VecDeque::new(),
            failures,
            surfaces,
            live_sources: Vec::new(),
            cancelled: Vec::new(),
        }
    }

    /// Requests issued but not yet resolved
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    /// Sources released through [`SpatialTracker::cancel_hit_test_source`]
    pub fn cancelled_sources(&self) -> &[HitTestSourceHandle] {
        &self.cancelled
    }

    /// Resolve every outstanding request
    pub fn drain_completions(&mut self) -> Vec<(RequestId, std::result::Result<Resolved, TrackerError>)> {
        let pending: Vec<_> = self.pending.drain(..).collect();
        pending
            .into_iter()
            .map(|(id, request)| (id, self.complete(request)))
            .collect()
    }

    /// The tracked frame at scenario time `t`
    pub fn frame_at(&self, t: u64) -> ScriptedFrame {
        ScriptedFrame {
            live_sources: self.live_sources.clone(),
            hit: self.surfaces.iter().find(|span| span.covers(t)).map(SurfaceSpan::pose),
        }
    }

    fn complete(&mut self, request: PendingRequest) -> std::result::Result<Resolved, TrackerError> {
        match request {
            PendingRequest::Space(kind) => {
                let remaining = match kind {
                    ReferenceSpaceKind::Viewer => &mut self.failures.viewer_space,
                    _ => &mut self.failures.local_space,
                };
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(TrackerError::UnsupportedReferenceSpace(kind));
                }
                Ok(Resolved::Space(SpaceHandle(self.allocate_handle())))
            }
            PendingRequest::Source => {
                if self.failures.hit_test_source > 0 {
                    self.failures.hit_test_source -= 1;
                    return Err(TrackerError::HitTestSourceRejected("hit-test feature unavailable".to_string()));
                }
                let source = HitTestSourceHandle(self.allocate_handle());
                self.live_sources.push(source);
                Ok(Resolved::HitTestSource(source))
            }
        }
    }

    fn allocate_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn issue(&mut self, request: PendingRequest) -> RequestId {
        self.next_id += 1;
        let id = RequestId(self.next_id);
        self.pending.push_back((id, request));
        id
    }
}

impl SpatialTracker for ScriptedTracker {
    fn request_reference_space(&mut self, kind: ReferenceSpaceKind) -> RequestId {
        self.issue(PendingRequest::Space(kind))
    }

    fn request_hit_test_source(&mut self, options: HitTestOptions) -> RequestId {
        debug!(space = options.space.0, "scripted hit-test source requested");
        self.issue(PendingRequest::Source)
    }

    fn cancel_hit_test_source(&mut self, source: HitTestSourceHandle) {
        self.live_sources.retain(|live| *live != source);
        self.cancelled.push(source);
    }
}

/// Hit produced by a [`ScriptedFrame`]
#[derive(Debug, Clone, Copy)]
pub struct ScriptedHit {
    pose: Pose,
}

impl HitTestResult for ScriptedHit {
    fn pose(&self, _space: SpaceHandle) -> Option<Pose> {
        Some(self.pose)
    }
}

/// One frame of a scripted session
#[derive(Debug, Clone)]
pub struct ScriptedFrame {
    live_sources: Vec<HitTestSourceHandle>,
    hit: Option<Pose>,
}

impl TrackerFrame for ScriptedFrame {
    type Hit = ScriptedHit;

    fn hit_test_results(&self, source: HitTestSourceHandle) -> Vec<ScriptedHit> {
        if !self.live_sources.contains(&source) {
            return Vec::new();
        }
        self.hit.map(|pose| ScriptedHit { pose }).into_iter().collect()
    }
}

/// Renderer that records what would have been drawn
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    /// Frames rendered
    pub frames: u64,
    /// Frames with the reticle shown
    pub reticle_frames: u64,
    /// Most entities visible in one frame
    pub peak_visible: usize,
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, scene: &Scene) {
        self.frames += 1;
        let visible = scene.entities().filter(|(_, entity)| entity.visible).count();
        self.peak_visible = self.peak_visible.max(visible);
        if scene.get_by_name(RETICLE_ENTITY).is_some_and(|reticle| reticle.visible) {
            self.reticle_frames += 1;
        }
    }
}

/// Where a placed object ended up
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedSummary {
    /// Entity name
    pub name: String,
    /// World position
    pub position: [f32; 3],
}

/// Outcome of a replayed scenario
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// Frames rendered
    pub frames: u64,
    /// Frames with the reticle shown
    pub reticle_frames: u64,
    /// Select actions issued
    pub selects: usize,
    /// Objects in the scene at the end
    pub placed: Vec<PlacedSummary>,
    /// Samples of the last measurement window
    pub samples: Vec<MetricSample>,
    /// Notices shown to the user
    pub notices: Vec<String>,
    /// Handshake state at the end
    pub final_state: String,
    /// Files offered for download
    #[serde(skip)]
    pub artifacts: Vec<CsvArtifact>,
}

/// Replay `scenario` and report what happened
pub async fn run_scenario<P>(
    scenario: &Scenario,
    config: &HitplaceConfig,
    provider: &P,
) -> Result<SimulationReport>
where
    P: ModelProvider + ?Sized,
{
    scenario.validate()?;

    let clock = ManualClock::new(scenario.start_epoch_ms);
    let tracker = ScriptedTracker::new(scenario.surfaces.clone(), scenario.failures.clone());
    let mut session = ArSession::new(tracker, config, Box::new(clock.clone()))?;
    let mut renderer = RecordingRenderer::default();

    let mut events: Vec<&ScenarioEvent> = scenario.events.iter().collect();
    events.sort_by_key(|event| event.at_ms);
    let mut events = events.into_iter().peekable();

    let mut in_session = false;
    let mut selects = 0;
    let mut notices = Vec::new();
    let mut artifacts = Vec::new();

    info!(duration_ms = scenario.duration_ms, events = scenario.events.len(), "replaying scenario");

    let mut t = 0;
    while t <= scenario.duration_ms {
        clock.set(scenario.start_epoch_ms + t);

        for (request, outcome) in session.tracker_mut().drain_completions() {
            session.resolve(request, outcome);
        }

        while let Some(event) = events.next_if(|event| event.at_ms <= t) {
            debug!(at_ms = event.at_ms, action = ?event.action, "scenario event");
            match &event.action {
                ScenarioAction::SessionStart => {
                    in_session = true;
                    session.on_session_start();
                }
                ScenarioAction::SessionEnd => {
                    in_session = false;
                    session.on_session_end();
                }
                ScenarioAction::Select => {
                    selects += 1;
                    session.on_select();
                }
                ScenarioAction::SelectModel { key } => {
                    session.select_model(provider, key).await;
                }
                ScenarioAction::StartMeasurement => session.start_measurement(),
                ScenarioAction::Export => {
                    let outcome = session.export()?;
                    if let Some(notice) = outcome.notice() {
                        notices.push(notice.to_string());
                    }
                    if let Some(artifact) = outcome.artifact() {
                        artifacts.push(artifact.clone());
                    }
                }
            }
        }

        let frame = in_session.then(|| session.tracker().frame_at(t));
        session.on_animation_frame(frame.as_ref(), &mut renderer);

        t += scenario.frame_interval_at(t);
    }

    let placed = session
        .pipeline()
        .placed_objects()
        .iter()
        .filter_map(|object| session.scene().get(object.entity))
        .map(|entity| PlacedSummary {
            name: entity.name.clone(),
            position: entity.position().to_array(),
        })
        .collect();

    let final_state = match session.pipeline().handshake().state() {
        HandshakeState::Ready(_) => "tracking".to_string(),
        HandshakeState::Stalled { error } => format!("stalled: {}", error),
        HandshakeState::Uninitialized => "uninitialized".to_string(),
        _ => "handshaking".to_string(),
    };

    Ok(SimulationReport {
        frames: renderer.frames,
        reticle_frames: renderer.reticle_frames,
        selects,
        placed,
        samples: session.sampler().samples().to_vec(),
        notices,
        final_state,
        artifacts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_toml() {
        let scenario = Scenario::from_toml_str(
            r#"
            duration_ms = 3000

            [failures]
            hit_test_source = 1

            [[surfaces]]
            from_ms = 100
            to_ms = 2000
            position = [0.0, -1.0, -1.5]

            [[pacing]]
            from_ms = 1000
            to_ms = 2000
            frame_interval_ms = 40

            [[events]]
            at_ms = 0
            action = "session_start"

            [[events]]
            at_ms = 500
            action = "select_model"
            key = "chair"
            "#,
        )
        .unwrap();

        assert_eq!(scenario.frame_interval_ms, 16);
        assert_eq!(scenario.failures.hit_test_source, 1);
        assert_eq!(scenario.surfaces[0].position, Vec3::new(0.0, -1.0, -1.5));
        assert_eq!(scenario.frame_interval_at(1500), 40);
        assert_eq!(scenario.frame_interval_at(2000), 16);
        assert_eq!(
            scenario.events[1].action,
            ScenarioAction::SelectModel { key: "chair".to_string() }
        );
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = Scenario::from_toml_str("duration_ms = 10\nframe_interval_ms = 0").unwrap_err();
        assert!(matches!(err, Error::Scenario(_)));
    }

    #[test]
    fn test_tracker_resolves_on_drain() {
        let mut tracker = ScriptedTracker::new(Vec::new(), FailurePlan { viewer_space: 1, ..FailurePlan::default() });
        let first = tracker.request_reference_space(ReferenceSpaceKind::Viewer);
        let second = tracker.request_reference_space(ReferenceSpaceKind::Viewer);
        assert_eq!(tracker.pending_requests(), 2);

        let completions = tracker.drain_completions();
        assert_eq!(tracker.pending_requests(), 0);
        assert_eq!(completions[0].0, first);
        assert!(completions[0].1.is_err());
        assert_eq!(completions[1].0, second);
        assert!(matches!(completions[1].1, Ok(Resolved::Space(_))));
    }

    #[test]
    fn test_late_source_after_session_end_is_released() {
        let tracker = ScriptedTracker::new(Vec::new(), FailurePlan::default());
        let config = HitplaceConfig::default();
        let mut session = ArSession::new(tracker, &config, Box::new(ManualClock::new(0))).unwrap();

        session.on_session_start();
        for (request, outcome) in session.tracker_mut().drain_completions() {
            assert!(session.resolve(request, outcome));
        }
        session.on_session_end();

        let late = session.tracker_mut().drain_completions();
        assert_eq!(late.len(), 1);
        for (request, outcome) in late {
            assert!(!session.resolve(request, outcome));
        }
        assert_eq!(session.tracker().cancelled_sources().len(), 1);
        assert!(session.tracker().live_sources.is_empty());
    }

    #[test]
    fn test_cancelled_source_yields_no_hits() {
        let surface = SurfaceSpan {
            from_ms: 0,
            to_ms: 1000,
            position: Vec3::ZERO,
            yaw_degrees: 0.0,
        };
        let mut tracker = ScriptedTracker::new(vec![surface], FailurePlan::default());
        tracker.request_hit_test_source(HitTestOptions::from_space(SpaceHandle(1)));
        let source = match tracker.drain_completions().remove(0).1 {
            Ok(Resolved::HitTestSource(source)) => source,
            other => panic!("unexpected completion: {:?}", other),
        };

        assert_eq!(tracker.frame_at(10).hit_test_results(source).len(), 1);
        assert!(tracker.frame_at(2000).hit_test_results(source).is_empty());

        tracker.cancel_hit_test_source(source);
        assert!(tracker.frame_at(10).hit_test_results(source).is_empty());
        assert_eq!(tracker.cancelled_sources(), &[source]);
    }
}
