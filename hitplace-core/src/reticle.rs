//! Surface indicator driven by hit-test results

use glam::Mat4;

/// The most recently detected surface point
///
/// Visible only while the latest tracked frame produced a hit. The transform is left
/// untouched when the reticle hides, so it must not be read while invisible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reticle {
    visible: bool,
    transform: Mat4,
}

impl Default for Reticle {
    fn default() -> Self {
        Self::new()
    }
}

impl Reticle {
    /// A hidden reticle at the origin
    pub fn new() -> Self {
        Self {
            visible: false,
            transform: Mat4::IDENTITY,
        }
    }

    /// Show the reticle at a freshly detected surface pose
    pub(crate) fn show_at(&mut self, transform: Mat4) {
        self.visible = true;
        self.transform = transform;
    }

    /// Hide the reticle, keeping its last transform
    pub(crate) fn hide(&mut self) {
        self.visible = false;
    }

    /// Whether the last frame found a surface
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Last detected surface transform, possibly stale
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// The transform, but only while it is valid
    pub fn placement_transform(&self) -> Option<Mat4> {
        self.visible.then_some(self.transform)
    }
}
