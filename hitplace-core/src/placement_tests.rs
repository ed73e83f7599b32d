use super::*;
use crate::scene::Scene;
use crate::tracker::{
    HitTestOptions, HitTestSourceHandle, Pose, ReferenceSpaceKind, SpaceHandle,
};
use glam::Vec3;
use std::path::PathBuf;

#[derive(Default)]
struct CountingTracker {
    next_id: u64,
    cancelled: usize,
}

impl SpatialTracker for CountingTracker {
    fn request_reference_space(&mut self, _kind: ReferenceSpaceKind) -> RequestId {
        self.next_id += 1;
        RequestId(self.next_id)
    }

    fn request_hit_test_source(&mut self, _options: HitTestOptions) -> RequestId {
        self.next_id += 1;
        RequestId(self.next_id)
    }

    fn cancel_hit_test_source(&mut self, _source: HitTestSourceHandle) {
        self.cancelled += 1;
    }
}

#[derive(Clone, Copy)]
struct FixedHit(Option<Mat4>);

impl HitTestResult for FixedHit {
    fn pose(&self, _space: SpaceHandle) -> Option<Pose> {
        self.0.map(Pose::new)
    }
}

struct MockFrame {
    hits: Vec<FixedHit>,
}

impl MockFrame {
    fn empty() -> Self {
        Self { hits: Vec::new() }
    }

    fn hits_at(positions: &[Vec3]) -> Self {
        Self {
            hits: positions
                .iter()
                .map(|p| FixedHit(Some(Mat4::from_translation(*p))))
                .collect(),
        }
    }
}

impl TrackerFrame for MockFrame {
    type Hit = FixedHit;

    fn hit_test_results(&self, _source: HitTestSourceHandle) -> Vec<FixedHit> {
        self.hits.clone()
    }
}

fn tracking_pipeline(config: &PlacementConfig, tracker: &mut CountingTracker) -> PlacementPipeline {
    let mut pipeline = PlacementPipeline::new(config);
    pipeline.on_session_start(tracker);
    pipeline.resolve(tracker, RequestId(1), Ok(Resolved::Space(SpaceHandle(1))));
    pipeline.resolve(tracker, RequestId(2), Ok(Resolved::HitTestSource(HitTestSourceHandle(1))));
    pipeline.resolve(tracker, RequestId(3), Ok(Resolved::Space(SpaceHandle(2))));
    assert_eq!(pipeline.phase(), PipelinePhase::Tracking);
    pipeline
}

fn floor_at(z: f32) -> Vec3 {
    Vec3::new(0.0, -1.2, z)
}

// ===== Reticle Updates =====

#[test]
fn test_hit_shows_reticle_at_first_result() {
    let mut tracker = CountingTracker::default();
    let mut pipeline = tracking_pipeline(&PlacementConfig::default(), &mut tracker);

    let frame = MockFrame::hits_at(&[floor_at(-1.0), floor_at(-3.0)]);
    assert!(pipeline.update(&frame));

    assert!(pipeline.reticle().is_visible());
    assert_eq!(pipeline.reticle().transform(), Mat4::from_translation(floor_at(-1.0)));
}

#[test]
fn test_zero_hits_hide_reticle_regardless_of_prior_state() {
    let mut tracker = CountingTracker::default();
    let mut pipeline = tracking_pipeline(&PlacementConfig::default(), &mut tracker);

    pipeline.update(&MockFrame::hits_at(&[floor_at(-1.0)]));
    assert!(!pipeline.update(&MockFrame::empty()));
    assert!(!pipeline.reticle().is_visible());

    assert!(!pipeline.update(&MockFrame::empty()));
    assert!(!pipeline.reticle().is_visible());
}

#[test]
fn test_unresolvable_first_pose_counts_as_no_hit() {
    let mut tracker = CountingTracker::default();
    let mut pipeline = tracking_pipeline(&PlacementConfig::default(), &mut tracker);

    let frame = MockFrame {
        hits: vec![FixedHit(None), FixedHit(Some(Mat4::from_translation(floor_at(-2.0))))],
    };
    assert!(!pipeline.update(&frame));
}

#[test]
fn test_hits_are_skipped_before_handshake_completes() {
    let mut tracker = CountingTracker::default();
    let mut pipeline = PlacementPipeline::new(&PlacementConfig::default());
    pipeline.on_session_start(&mut tracker);

    assert_eq!(pipeline.phase(), PipelinePhase::Uninitialized);
    assert!(!pipeline.update(&MockFrame::hits_at(&[floor_at(-1.0)])));
}

#[test]
fn test_session_end_clears_source() {
    let mut tracker = CountingTracker::default();
    let mut pipeline = tracking_pipeline(&PlacementConfig::default(), &mut tracker);
    pipeline.update(&MockFrame::hits_at(&[floor_at(-1.0)]));

    pipeline.on_session_end(&mut tracker);

    assert_eq!(pipeline.phase(), PipelinePhase::Uninitialized);
    assert_eq!(tracker.cancelled, 1);
    assert!(!pipeline.reticle().is_visible());
    assert!(!pipeline.update(&MockFrame::hits_at(&[floor_at(-1.0)])));
}

// ===== Select =====

#[test]
fn test_select_without_surface_is_noop() {
    let mut tracker = CountingTracker::default();
    let mut pipeline = tracking_pipeline(&PlacementConfig::default(), &mut tracker);
    let mut scene = Scene::new("test");

    pipeline.update(&MockFrame::hits_at(&[floor_at(-1.0)]));
    pipeline.update(&MockFrame::empty());

    assert_eq!(pipeline.select(&mut scene), None);
    assert!(scene.is_empty());
    assert!(pipeline.placed_objects().is_empty());
}

#[test]
fn test_spawn_mode_adds_object_per_select() {
    let mut tracker = CountingTracker::default();
    let mut pipeline = tracking_pipeline(&PlacementConfig::default(), &mut tracker);
    let mut scene = Scene::new("test");

    pipeline.update(&MockFrame::hits_at(&[floor_at(-1.0)]));
    let first = pipeline.select(&mut scene).unwrap();
    pipeline.update(&MockFrame::hits_at(&[floor_at(-2.0)]));
    let second = pipeline.select(&mut scene).unwrap();

    assert_ne!(first, second);
    assert_eq!(scene.len(), 2);
    assert_eq!(scene.get(first).unwrap().name, "cube-0");
    assert_eq!(scene.get(second).unwrap().position(), floor_at(-2.0));
    assert_eq!(scene.get(second).unwrap().kind, EntityKind::Cube { size: 0.1 });
}

#[test]
fn test_placed_transform_matches_reticle() {
    let mut tracker = CountingTracker::default();
    let mut pipeline = tracking_pipeline(&PlacementConfig::default(), &mut tracker);
    let mut scene = Scene::new("test");

    let tilted = Mat4::from_rotation_translation(
        glam::Quat::from_rotation_y(0.7),
        floor_at(-1.5),
    );
    pipeline.update(&MockFrame { hits: vec![FixedHit(Some(tilted))] });
    let id = pipeline.select(&mut scene).unwrap();

    assert_eq!(pipeline.placed_objects()[0].transform, pipeline.reticle().transform());
    assert_eq!(scene.get(id).unwrap().transform, tilted);
}

#[test]
fn test_reposition_mode_moves_single_object() {
    let config = PlacementConfig {
        mode: PlacementMode::Reposition,
        ..PlacementConfig::default()
    };
    let mut tracker = CountingTracker::default();
    let mut pipeline = tracking_pipeline(&config, &mut tracker);
    let mut scene = Scene::new("test");

    pipeline.update(&MockFrame::hits_at(&[floor_at(-1.0)]));
    let first = pipeline.select(&mut scene).unwrap();
    pipeline.update(&MockFrame::hits_at(&[floor_at(-4.0)]));
    let second = pipeline.select(&mut scene).unwrap();

    assert_eq!(first, second);
    assert_eq!(scene.len(), 1);
    assert_eq!(scene.get(first).unwrap().position(), floor_at(-4.0));
    assert_eq!(pipeline.placed_objects().len(), 1);
}

// ===== Templates =====

fn lamp() -> ModelAsset {
    ModelAsset {
        name: "lamp".to_string(),
        source: PathBuf::from("assets/lamp.glb"),
        nodes: Vec::new(),
        roots: Vec::new(),
        mesh_count: 1,
    }
}

#[test]
fn test_model_load_switches_template() {
    let mut tracker = CountingTracker::default();
    let mut pipeline = tracking_pipeline(&PlacementConfig::default(), &mut tracker);
    let mut scene = Scene::new("test");

    assert!(pipeline.apply_model_load(Ok(lamp()), &mut scene));
    pipeline.update(&MockFrame::hits_at(&[floor_at(-1.0)]));
    let id = pipeline.select(&mut scene).unwrap();

    let entity = scene.get(id).unwrap();
    assert_eq!(entity.name, "lamp-0");
    assert!(matches!(&entity.kind, EntityKind::Model(asset) if asset.name == "lamp"));
}

#[test]
fn test_failed_model_load_keeps_previous_template() {
    let mut pipeline = PlacementPipeline::new(&PlacementConfig::default());
    let mut scene = Scene::new("test");

    let loaded = pipeline.apply_model_load(
        Err(ModelError::UnknownSelection("ghost".to_string())),
        &mut scene,
    );

    assert!(!loaded);
    assert_eq!(pipeline.template(), &PlacementTemplate::Cube { size: 0.1 });
}

#[test]
fn test_reposition_mode_swaps_model_in_place() {
    let config = PlacementConfig {
        mode: PlacementMode::Reposition,
        ..PlacementConfig::default()
    };
    let mut tracker = CountingTracker::default();
    let mut pipeline = tracking_pipeline(&config, &mut tracker);
    let mut scene = Scene::new("test");

    pipeline.update(&MockFrame::hits_at(&[floor_at(-1.0)]));
    let id = pipeline.select(&mut scene).unwrap();
    pipeline.set_template(PlacementTemplate::Model(lamp()), &mut scene);

    let entity = scene.get(id).unwrap();
    assert!(matches!(entity.kind, EntityKind::Model(_)));
    assert_eq!(entity.position(), floor_at(-1.0));
}
