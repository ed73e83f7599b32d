//! Hitplace - hit-test driven object placement for AR sessions
//!
//! This crate turns per-frame surface detection results from a spatial tracker into a
//! reticle and placed objects, and samples the render loop's frame rate over a timed
//! measurement window that can be exported as CSV.
//!
//! The host platform (renderer, tracker, model loading) is reached only through the
//! traits in [`tracker`], [`scene`] and [`model`], so the whole pipeline runs without a
//! device in tests and in the [`sim`] harness.

#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod handshake;
pub mod model;
pub mod placement;
pub mod reticle;
pub mod sampler;
pub mod scene;
pub mod session;
pub mod sim;
pub mod tracker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{HitplaceConfig, PlacementConfig, PlacementMode, SamplerConfig, ExportConfig};
pub use error::{Error, Result, TrackerError, ModelError, ExportError, ConfigError};
pub use export::{ArtifactSink, CsvArtifact, DirectorySink, ExportOutcome, NOTHING_TO_EXPORT};
pub use handshake::{Handshake, HandshakeState, Resolved, SessionHandles};
pub use model::{GltfModelProvider, ModelAsset, ModelCatalog, ModelProvider, ModelSource};
pub use placement::{PipelinePhase, PlacedObject, PlacementPipeline, PlacementTemplate};
pub use reticle::Reticle;
pub use sampler::{MeasurementPhase, MeasurementWindow, MetricSample, MetricSampler};
pub use scene::{Entity, EntityId, EntityKind, Renderer, Scene, SceneGraph};
pub use session::ArSession;
pub use tracker::{
    HitTestOptions, HitTestResult, HitTestSourceHandle, Pose, ReferenceSpaceKind, RequestId,
    SpaceHandle, SpatialTracker, TrackerFrame,
};
