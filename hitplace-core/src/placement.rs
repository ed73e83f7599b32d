//! Hit-test driven placement pipeline
//!
//! Each tracked frame moves the [`Reticle`] to the first hit-test result, and a select
//! action drops (or moves) an object at the reticle. Until the session handshake has
//! produced a hit-test source every frame counts as "no hits".

use crate::config::{PlacementConfig, PlacementMode};
use crate::error::{ModelError, TrackerError};
use crate::handshake::{Handshake, Resolved};
use crate::model::ModelAsset;
use crate::reticle::Reticle;
use crate::scene::{Entity, EntityId, EntityKind, SceneGraph};
use crate::tracker::{HitTestResult, RequestId, SpatialTracker, TrackerFrame};
use glam::Mat4;
use tracing::{debug, info, warn};

/// Coarse pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    /// No usable hit-test source: no session, handshake in flight, or handshake stalled
    Uninitialized,
    /// Hit-testing every frame
    Tracking,
}

/// What a select action places
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementTemplate {
    /// The built-in cube
    Cube {
        /// Edge length in meters
        size: f32,
    },
    /// A loaded model
    Model(ModelAsset),
}

impl PlacementTemplate {
    /// Scene geometry for this template
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            PlacementTemplate::Cube { size } => EntityKind::Cube { size: *size },
            PlacementTemplate::Model(asset) => EntityKind::Model(asset.clone()),
        }
    }

    /// Short name used for placed entities
    pub fn label(&self) -> &str {
        match self {
            PlacementTemplate::Cube { .. } => "cube",
            PlacementTemplate::Model(asset) => &asset.name,
        }
    }
}

/// An object placed by a select action
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedObject {
    /// Scene entity
    pub entity: EntityId,
    /// Transform copied from the reticle
    pub transform: Mat4,
}

/// Turns hit-test results into a reticle and placed objects
#[derive(Debug, Clone)]
pub struct PlacementPipeline {
    handshake: Handshake,
    reticle: Reticle,
    mode: PlacementMode,
    template: PlacementTemplate,
    placed: Vec<PlacedObject>,
    spawned: usize,
}

impl PlacementPipeline {
    /// Create a pipeline placing cubes
    pub fn new(config: &PlacementConfig) -> Self {
        Self {
            handshake: Handshake::new(config.handshake_retries),
            reticle: Reticle::new(),
            mode: config.mode,
            template: PlacementTemplate::Cube { size: config.primitive_size },
            placed: Vec::new(),
            spawned: 0,
        }
    }

    /// Current phase
    pub fn phase(&self) -> PipelinePhase {
        if self.handshake.is_ready() {
            PipelinePhase::Tracking
        } else {
            PipelinePhase::Uninitialized
        }
    }

    /// Session handshake
    pub fn handshake(&self) -> &Handshake {
        &self.handshake
    }

    /// The reticle
    pub fn reticle(&self) -> &Reticle {
        &self.reticle
    }

    /// Objects placed so far, oldest first
    pub fn placed_objects(&self) -> &[PlacedObject] {
        &self.placed
    }

    /// Template used by the next select
    pub fn template(&self) -> &PlacementTemplate {
        &self.template
    }

    /// Placement mode
    pub fn mode(&self) -> PlacementMode {
        self.mode
    }

    /// Host signalled session start
    pub fn on_session_start(&mut self, tracker: &mut dyn SpatialTracker) {
        info!("tracking session started");
        self.handshake.begin(tracker);
    }

    /// Host resolved (or rejected) a tracker request
    pub fn resolve(
        &mut self,
        tracker: &mut dyn SpatialTracker,
        request: RequestId,
        outcome: Result<Resolved, TrackerError>,
    ) -> bool {
        self.handshake.resolve(tracker, request, outcome)
    }

    /// Host signalled session end. Drops every session handle before returning.
    pub fn on_session_end(&mut self, tracker: &mut dyn SpatialTracker) {
        self.handshake.end(tracker);
        self.reticle.hide();
        info!(placed = self.placed.len(), "tracking session ended");
    }

    /// Per-frame hit test. Returns whether the reticle is visible afterwards.
    pub fn update<F: TrackerFrame>(&mut self, frame: &F) -> bool {
        let Some(handles) = self.handshake.handles().copied() else {
            self.reticle.hide();
            return false;
        };

        let hits = frame.hit_test_results(handles.hit_test_source);
        match hits.first().and_then(|hit| hit.pose(handles.local_space)) {
            Some(pose) => self.reticle.show_at(pose.transform),
            None => {
                if !hits.is_empty() {
                    debug!("first hit has no pose in the local space");
                }
                self.reticle.hide();
            }
        }
        self.reticle.is_visible()
    }

    /// Handle a select action
    ///
    /// Places (or, in reposition mode, moves) an object at the reticle. Does nothing while
    /// the reticle is hidden.
    pub fn select(&mut self, scene: &mut dyn SceneGraph) -> Option<EntityId> {
        let Some(transform) = self.reticle.placement_transform() else {
            debug!("select ignored, no surface under the reticle");
            return None;
        };

        if self.mode == PlacementMode::Reposition {
            if let Some(object) = self.placed.first_mut() {
                if scene.set_transform(object.entity, transform) {
                    object.transform = transform;
                    debug!(entity = object.entity.0, "moved placed object");
                    return Some(object.entity);
                }
                warn!(entity = object.entity.0, "placed object vanished from the scene");
                self.placed.clear();
            }
        }

        let name = format!("{}-{}", self.template.label(), self.spawned);
        let entity = scene.add_entity(
            Entity::new(name, self.template.entity_kind()).with_transform(transform),
        );
        self.spawned += 1;
        self.placed.push(PlacedObject { entity, transform });
        debug!(entity = entity.0, total = self.placed.len(), "placed object");
        Some(entity)
    }

    /// Use `template` for future placements
    ///
    /// In reposition mode the persistent object switches to the new template in place.
    pub fn set_template(&mut self, template: PlacementTemplate, scene: &mut dyn SceneGraph) {
        if self.mode == PlacementMode::Reposition {
            if let Some(object) = self.placed.first() {
                scene.set_kind(object.entity, template.entity_kind());
            }
        }
        info!(template = template.label(), "placement template changed");
        self.template = template;
    }

    /// Apply the outcome of an asynchronous model load
    ///
    /// A failed load is logged and the current template stays in use.
    pub fn apply_model_load(
        &mut self,
        result: Result<ModelAsset, ModelError>,
        scene: &mut dyn SceneGraph,
    ) -> bool {
        match result {
            Ok(asset) => {
                self.set_template(PlacementTemplate::Model(asset), scene);
                true
            }
            Err(error) => {
                warn!(%error, template = self.template.label(), "model load failed, keeping current model");
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "placement_tests.rs"]
mod tests;
