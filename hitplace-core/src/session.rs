//! AR session glue
//!
//! [`ArSession`] owns one placement pipeline, one metric sampler and the scene they write
//! to, and exposes one method per host callback: session start/end, request completion,
//! animation frame, select, and the measurement/export/model-selection commands.

use crate::clock::Clock;
use crate::config::HitplaceConfig;
use crate::error::{ConfigError, ExportError, TrackerError};
use crate::export::{ArtifactSink, ExportOutcome};
use crate::handshake::Resolved;
use crate::model::{ModelCatalog, ModelProvider, ModelSource};
use crate::placement::{PipelinePhase, PlacementPipeline, PlacementTemplate};
use crate::sampler::{MeasurementPhase, MetricSampler};
use crate::scene::{Entity, EntityId, EntityKind, Renderer, Scene, SceneGraph};
use crate::tracker::{RequestId, SpatialTracker, TrackerFrame};
use tracing::{info, warn};

/// Name of the reticle entity in the session scene
pub const RETICLE_ENTITY: &str = "reticle";

/// One AR session and everything it drives
pub struct ArSession<T: SpatialTracker> {
    tracker: T,
    clock: Box<dyn Clock>,
    pipeline: PlacementPipeline,
    sampler: MetricSampler,
    scene: Scene,
    reticle_entity: EntityId,
    catalog: ModelCatalog,
    primitive_size: f32,
    export_filename: String,
    frames: u64,
}

impl<T: SpatialTracker> ArSession<T> {
    /// Set up a session over `tracker`
    ///
    /// Fails if `config` does not pass [`HitplaceConfig::validate`].
    pub fn new(tracker: T, config: &HitplaceConfig, clock: Box<dyn Clock>) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut scene = Scene::new("ar-session");
        let reticle_entity =
            scene.add_entity(Entity::new(RETICLE_ENTITY, EntityKind::reticle()).with_visible(false));

        Ok(Self {
            tracker,
            clock,
            pipeline: PlacementPipeline::new(&config.placement),
            sampler: MetricSampler::new(config.sampler.clone()),
            scene,
            reticle_entity,
            catalog: ModelCatalog::new(config.models.clone()),
            primitive_size: config.placement.primitive_size,
            export_filename: config.export.filename.clone(),
            frames: 0,
        })
    }

    /// The tracker
    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    /// The tracker, mutably
    pub fn tracker_mut(&mut self) -> &mut T {
        &mut self.tracker
    }

    /// The placement pipeline
    pub fn pipeline(&self) -> &PlacementPipeline {
        &self.pipeline
    }

    /// The metric sampler
    pub fn sampler(&self) -> &MetricSampler {
        &self.sampler
    }

    /// The scene
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Model catalog used by [`ArSession::select_model`]
    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Animation frames processed
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Current pipeline phase
    pub fn phase(&self) -> PipelinePhase {
        self.pipeline.phase()
    }

    /// Current measurement phase
    pub fn measurement_phase(&self) -> MeasurementPhase {
        self.sampler.phase(self.clock.now_ms())
    }

    /// Host signalled session start
    pub fn on_session_start(&mut self) {
        self.pipeline.on_session_start(&mut self.tracker);
    }

    /// Host signalled session end
    pub fn on_session_end(&mut self) {
        self.pipeline.on_session_end(&mut self.tracker);
        self.sync_reticle();
    }

    /// Host resolved or rejected a tracker request
    pub fn resolve(&mut self, request: RequestId, outcome: Result<Resolved, TrackerError>) -> bool {
        self.pipeline.resolve(&mut self.tracker, request, outcome)
    }

    /// Render callback
    ///
    /// `frame` is `None` when the host renders outside an AR session; the reticle is
    /// then left as is.
    pub fn on_animation_frame<F, R>(&mut self, frame: Option<&F>, renderer: &mut R)
    where
        F: TrackerFrame,
        R: Renderer + ?Sized,
    {
        self.frames += 1;
        self.sampler.tick(self.clock.now_ms());

        if let Some(frame) = frame {
            self.pipeline.update(frame);
            self.sync_reticle();
        }

        renderer.render(&self.scene);
    }

    /// User select action
    pub fn on_select(&mut self) -> Option<EntityId> {
        self.pipeline.select(&mut self.scene)
    }

    /// User pressed "start measurement"
    pub fn start_measurement(&mut self) {
        self.sampler.start_measurement(self.clock.now_ms());
    }

    /// User pressed "export"
    pub fn export(&self) -> Result<ExportOutcome, ExportError> {
        self.sampler.export(&self.export_filename)
    }

    /// Export and hand the artifact to `sink`
    pub fn export_to(&self, sink: &mut dyn ArtifactSink) -> Result<ExportOutcome, ExportError> {
        let outcome = self.export()?;
        if let Some(artifact) = outcome.artifact() {
            sink.deliver(artifact)?;
        }
        Ok(outcome)
    }

    /// User picked a model from the selection control
    ///
    /// Unknown keys and load failures are logged; the current model stays selected.
    pub async fn select_model<P>(&mut self, provider: &P, key: &str) -> bool
    where
        P: ModelProvider + ?Sized,
    {
        let source = match self.catalog.resolve(key) {
            Ok(source) => source,
            Err(error) => {
                warn!(%error, "model selection ignored");
                return false;
            }
        };

        match source {
            ModelSource::Cube => {
                let template = PlacementTemplate::Cube { size: self.primitive_size };
                self.pipeline.set_template(template, &mut self.scene);
                true
            }
            ModelSource::File(path) => {
                info!(key, path = %path.display(), "loading model");
                let result = provider.load(&path).await;
                self.pipeline.apply_model_load(result, &mut self.scene)
            }
        }
    }

    fn sync_reticle(&mut self) {
        let reticle = self.pipeline.reticle();
        self.scene.set_visible(self.reticle_entity, reticle.is_visible());
        if reticle.is_visible() {
            self.scene.set_transform(self.reticle_entity, reticle.transform());
        }
    }
}
