//! Transition strategy contract

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::clock::{FrameClock, RealtimeClock};
use crate::config::TransitionMode;
use crate::surface::{OverlayFrame, TransitionSurface};

/// An interchangeable visual effect played around a scene switch
///
/// Both halves suspend until the effect finishes. Cancellation aborts the
/// animation early without an error; the surface is put back into its resting
/// state before returning.
#[async_trait]
pub trait TransitionStrategy: Send + Sync {
    /// Mode this strategy implements
    fn mode(&self) -> TransitionMode;

    /// Cover the screen before the scene is swapped
    async fn play_out(&self, from: Option<&str>, to: &str, description: &str, cancel: &CancellationToken);

    /// Reveal the new scene
    async fn play_in(&self, to: &str, description: &str, cancel: &CancellationToken);

    /// Put the surface back into its resting state immediately
    fn reset(&self);
}

/// Surface and clock shared by the animated strategies
#[derive(Clone)]
pub struct TransitionContext {
    pub surface: Arc<dyn TransitionSurface>,
    pub clock: Arc<dyn FrameClock>,
}

impl TransitionContext {
    pub fn new(surface: Arc<dyn TransitionSurface>, clock: Arc<dyn FrameClock>) -> Self {
        Self { surface, clock }
    }

    /// Use a [`RealtimeClock`] ticking every `frame_interval`
    pub fn realtime(surface: Arc<dyn TransitionSurface>, frame_interval: std::time::Duration) -> Self {
        Self::new(surface, Arc::new(RealtimeClock::new(frame_interval)))
    }

    pub(crate) fn rest(&self, sorting_order: i32) {
        self.surface.present(&OverlayFrame::resting(sorting_order));
    }
}

impl std::fmt::Debug for TransitionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionContext").finish_non_exhaustive()
    }
}

/// Switch instantly
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTransition;

#[async_trait]
impl TransitionStrategy for NoTransition {
    fn mode(&self) -> TransitionMode {
        TransitionMode::None
    }

    async fn play_out(&self, _from: Option<&str>, _to: &str, _description: &str, _cancel: &CancellationToken) {}

    async fn play_in(&self, _to: &str, _description: &str, _cancel: &CancellationToken) {}

    fn reset(&self) {}
}

/// Caption shown on the overlay, if any
pub(crate) fn caption(description: &str) -> Option<String> {
    let description = description.trim();
    if description.is_empty() {
        None
    } else {
        Some(description.to_string())
    }
}
