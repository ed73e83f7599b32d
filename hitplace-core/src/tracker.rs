//! Spatial tracker capabilities
//!
//! The host platform (WebXR, ARCore, a scripted replay) is reached only through these
//! traits. Requests that the platform resolves asynchronously return a [`RequestId`];
//! the host later reports the outcome through [`crate::ArSession::resolve`].

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an outstanding tracker request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque handle to a reference space owned by the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpaceHandle(pub u64);

/// Opaque handle to a hit-test source owned by the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HitTestSourceHandle(pub u64);

/// Kinds of reference space the pipeline asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceSpaceKind {
    /// Tracks the device itself; hit-test rays are cast from here
    Viewer,
    /// World-locked space that reticle and object poses are expressed in
    Local,
    /// Like `Local` with the origin at floor level
    LocalFloor,
}

impl fmt::Display for ReferenceSpaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReferenceSpaceKind::Viewer => "viewer",
            ReferenceSpaceKind::Local => "local",
            ReferenceSpaceKind::LocalFloor => "local-floor",
        };
        f.write_str(name)
    }
}

/// Options for a hit-test source request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTestOptions {
    /// Space the hit-test ray originates from
    pub space: SpaceHandle,
}

impl HitTestOptions {
    /// Cast straight ahead from `space`
    pub fn from_space(space: SpaceHandle) -> Self {
        Self { space }
    }
}

/// A rigid transform resolved by the tracker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Column-major transform matrix
    pub transform: Mat4,
}

impl Pose {
    /// Wrap a transform matrix
    pub fn new(transform: Mat4) -> Self {
        Self { transform }
    }

    /// Build from the 16-float column-major layout platforms hand out
    pub fn from_cols_array(matrix: &[f32; 16]) -> Self {
        Self { transform: Mat4::from_cols_array(matrix) }
    }

    /// Build from a position and orientation
    pub fn from_position_orientation(position: Vec3, orientation: Quat) -> Self {
        Self { transform: Mat4::from_rotation_translation(orientation, position) }
    }

    /// Translation part of the pose
    pub fn position(&self) -> Vec3 {
        self.transform.w_axis.truncate()
    }
}

/// Session-level tracker requests
///
/// Every request is non-blocking. The returned id is later matched against the
/// completion the host reports, so ids must not repeat within a tracker's lifetime.
pub trait SpatialTracker {
    /// Ask for a reference space of the given kind
    fn request_reference_space(&mut self, kind: ReferenceSpaceKind) -> RequestId;

    /// Ask for a hit-test source casting rays from `options.space`
    fn request_hit_test_source(&mut self, options: HitTestOptions) -> RequestId;

    /// Release a hit-test source that is no longer needed
    fn cancel_hit_test_source(&mut self, _source: HitTestSourceHandle) {}
}

/// A single tracked frame
pub trait TrackerFrame {
    /// Result type produced by this frame's hit tests
    type Hit: HitTestResult;

    /// Hit results for `source`, ordered nearest first. Empty when nothing was hit.
    fn hit_test_results(&self, source: HitTestSourceHandle) -> Vec<Self::Hit>;
}

/// One candidate surface intersection
pub trait HitTestResult {
    /// Pose of the intersection expressed in `space`, if the tracker can resolve it
    fn pose(&self, space: SpaceHandle) -> Option<Pose>;
}
