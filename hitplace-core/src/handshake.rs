//! Session setup handshake
//!
//! Obtaining the handles a tracking session needs takes three asynchronous tracker
//! requests, issued one after the other: a viewer reference space, a hit-test source cast
//! from it, and a local reference space poses are resolved in. [`Handshake`] is the state
//! machine that issues them; [`Handshake::resolve`] is its single transition function and
//! is fed every completion the host reports.

use crate::error::TrackerError;
use crate::tracker::{
    HitTestOptions, HitTestSourceHandle, ReferenceSpaceKind, RequestId, SpaceHandle,
    SpatialTracker,
};
use tracing::{debug, info, warn};

/// A successfully resolved tracker request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    /// A reference space
    Space(SpaceHandle),
    /// A hit-test source
    HitTestSource(HitTestSourceHandle),
}

/// Handles held while a session is tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionHandles {
    /// Space hit-test rays are cast from
    pub viewer_space: SpaceHandle,
    /// Space poses are resolved in
    pub local_space: SpaceHandle,
    /// Source queried every frame
    pub hit_test_source: HitTestSourceHandle,
}

/// Handshake progress
#[derive(Debug, Clone, PartialEq)]
pub enum HandshakeState {
    /// No session, or the previous one ended
    Uninitialized,
    /// Waiting for the viewer reference space
    AwaitingViewerSpace {
        /// Outstanding request
        request: RequestId,
    },
    /// Waiting for the hit-test source
    AwaitingHitTestSource {
        /// Resolved viewer space
        viewer_space: SpaceHandle,
        /// Outstanding request
        request: RequestId,
    },
    /// Waiting for the local reference space
    AwaitingLocalSpace {
        /// Resolved viewer space
        viewer_space: SpaceHandle,
        /// Resolved hit-test source
        hit_test_source: HitTestSourceHandle,
        /// Outstanding request
        request: RequestId,
    },
    /// All handles obtained
    Ready(SessionHandles),
    /// A request was rejected and retries are exhausted. Placement stays unavailable
    /// until the session ends.
    Stalled {
        /// The final rejection
        error: TrackerError,
    },
}

impl HandshakeState {
    /// The request this state is waiting on
    pub fn pending_request(&self) -> Option<RequestId> {
        match self {
            HandshakeState::AwaitingViewerSpace { request }
            | HandshakeState::AwaitingHitTestSource { request, .. }
            | HandshakeState::AwaitingLocalSpace { request, .. } => Some(*request),
            _ => None,
        }
    }

    fn step_name(&self) -> &'static str {
        match self {
            HandshakeState::Uninitialized => "uninitialized",
            HandshakeState::AwaitingViewerSpace { .. } => "viewer-space",
            HandshakeState::AwaitingHitTestSource { .. } => "hit-test-source",
            HandshakeState::AwaitingLocalSpace { .. } => "local-space",
            HandshakeState::Ready(_) => "ready",
            HandshakeState::Stalled { .. } => "stalled",
        }
    }
}

/// Drives a session from no handles to [`HandshakeState::Ready`]
#[derive(Debug, Clone)]
pub struct Handshake {
    state: HandshakeState,
    max_retries: u32,
    retries_used: u32,
}

impl Handshake {
    /// A handshake that re-issues a rejected request up to `max_retries` times
    pub fn new(max_retries: u32) -> Self {
        Self {
            state: HandshakeState::Uninitialized,
            max_retries,
            retries_used: 0,
        }
    }

    /// Current progress
    pub fn state(&self) -> &HandshakeState {
        &self.state
    }

    /// Handles, once all three are held
    pub fn handles(&self) -> Option<&SessionHandles> {
        match &self.state {
            HandshakeState::Ready(handles) => Some(handles),
            _ => None,
        }
    }

    /// Whether hit-testing can run
    pub fn is_ready(&self) -> bool {
        matches!(self.state, HandshakeState::Ready(_))
    }

    /// Start the handshake for a new session
    ///
    /// Ignored unless the handshake is uninitialized; a session that is already being set
    /// up or tracking keeps its requests.
    pub fn begin(&mut self, tracker: &mut dyn SpatialTracker) {
        if self.state != HandshakeState::Uninitialized {
            debug!(step = self.state.step_name(), "handshake already started");
            return;
        }

        self.retries_used = 0;
        let request = tracker.request_reference_space(ReferenceSpaceKind::Viewer);
        debug!(%request, "requested viewer reference space");
        self.state = HandshakeState::AwaitingViewerSpace { request };
    }

    /// Apply the outcome of a tracker request
    ///
    /// Returns `false` when the completion does not belong to the outstanding request,
    /// which happens for requests issued by a session that has since ended. A hit-test
    /// source granted by such a completion is cancelled right away.
    pub fn resolve(
        &mut self,
        tracker: &mut dyn SpatialTracker,
        request: RequestId,
        outcome: Result<Resolved, TrackerError>,
    ) -> bool {
        if self.state.pending_request() != Some(request) {
            debug!(%request, step = self.state.step_name(), "ignoring stale completion");
            // nothing owns a source granted to an ended session
            if let Ok(Resolved::HitTestSource(source)) = outcome {
                tracker.cancel_hit_test_source(source);
            }
            return false;
        }

        match outcome {
            Ok(resolved) => self.advance(tracker, request, resolved),
            Err(error) => self.reject(tracker, error),
        }
        true
    }

    /// Tear down the session, cancelling a held hit-test source
    ///
    /// Returns the handles if the session was tracking.
    pub fn end(&mut self, tracker: &mut dyn SpatialTracker) -> Option<SessionHandles> {
        let previous = std::mem::replace(&mut self.state, HandshakeState::Uninitialized);
        self.retries_used = 0;

        match previous {
            HandshakeState::Ready(handles) => {
                tracker.cancel_hit_test_source(handles.hit_test_source);
                Some(handles)
            }
            HandshakeState::AwaitingLocalSpace { hit_test_source, .. } => {
                tracker.cancel_hit_test_source(hit_test_source);
                None
            }
            _ => None,
        }
    }

    fn advance(&mut self, tracker: &mut dyn SpatialTracker, request: RequestId, resolved: Resolved) {
        let current = std::mem::replace(&mut self.state, HandshakeState::Uninitialized);

        self.state = match (current, resolved) {
            (HandshakeState::AwaitingViewerSpace { .. }, Resolved::Space(viewer_space)) => {
                let request = tracker.request_hit_test_source(HitTestOptions::from_space(viewer_space));
                debug!(%request, "viewer space ready, requested hit-test source");
                HandshakeState::AwaitingHitTestSource { viewer_space, request }
            }
            (
                HandshakeState::AwaitingHitTestSource { viewer_space, .. },
                Resolved::HitTestSource(hit_test_source),
            ) => {
                let request = tracker.request_reference_space(ReferenceSpaceKind::Local);
                debug!(%request, "hit-test source ready, requested local reference space");
                HandshakeState::AwaitingLocalSpace { viewer_space, hit_test_source, request }
            }
            (
                HandshakeState::AwaitingLocalSpace { viewer_space, hit_test_source, .. },
                Resolved::Space(local_space),
            ) => {
                info!("tracking session ready");
                HandshakeState::Ready(SessionHandles {
                    viewer_space,
                    local_space,
                    hit_test_source,
                })
            }
            (current, resolved) => {
                if let Resolved::HitTestSource(source) = resolved {
                    tracker.cancel_hit_test_source(source);
                }
                self.state = current;
                self.reject(tracker, TrackerError::UnexpectedHandle(request));
                return;
            }
        };
        self.retries_used = 0;
    }

    fn reject(&mut self, tracker: &mut dyn SpatialTracker, error: TrackerError) {
        if self.retries_used < self.max_retries {
            self.retries_used += 1;
            warn!(
                step = self.state.step_name(),
                attempt = self.retries_used,
                %error,
                "handshake request rejected, retrying"
            );
            self.reissue(tracker);
            return;
        }

        warn!(step = self.state.step_name(), %error, "handshake stalled, placement unavailable");
        if let HandshakeState::AwaitingLocalSpace { hit_test_source, .. } = self.state {
            tracker.cancel_hit_test_source(hit_test_source);
        }
        self.state = HandshakeState::Stalled { error };
    }

    fn reissue(&mut self, tracker: &mut dyn SpatialTracker) {
        match &mut self.state {
            HandshakeState::AwaitingViewerSpace { request } => {
                *request = tracker.request_reference_space(ReferenceSpaceKind::Viewer);
            }
            HandshakeState::AwaitingHitTestSource { viewer_space, request } => {
                *request = tracker.request_hit_test_source(HitTestOptions::from_space(*viewer_space));
            }
            HandshakeState::AwaitingLocalSpace { request, .. } => {
                *request = tracker.request_reference_space(ReferenceSpaceKind::Local);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[path = "handshake_tests.rs"]
mod tests;
