//! Fade to a flat overlay

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::animate::{sweep, Animation};
use crate::config::{to_duration, FadeConfig, TransitionConfig, TransitionMode};
use crate::easing::Easing;
use crate::strategy::{caption, TransitionContext, TransitionStrategy};
use crate::surface::OverlayFrame;

/// Fades the overlay in over the old scene and out over the new one
#[derive(Debug, Clone)]
pub struct FadeTransition {
    context: TransitionContext,
    config: FadeConfig,
    overlay_alpha: f32,
    sorting_order: i32,
}

impl FadeTransition {
    pub fn new(context: TransitionContext, config: &TransitionConfig) -> Self {
        Self {
            context,
            config: config.fade.clone(),
            overlay_alpha: config.overlay_alpha,
            sorting_order: config.sorting_order,
        }
    }

    fn frame(&self, coverage: f32, caption: &Option<String>) -> OverlayFrame {
        OverlayFrame {
            alpha: self.overlay_alpha * Easing::EaseInOut.apply(coverage),
            blocks_input: true,
            caption: caption.clone(),
            ..OverlayFrame::resting(self.sorting_order)
        }
    }
}

#[async_trait]
impl TransitionStrategy for FadeTransition {
    fn mode(&self) -> TransitionMode {
        TransitionMode::Fade
    }

    async fn play_out(&self, from: Option<&str>, to: &str, description: &str, cancel: &CancellationToken) {
        log::debug!("Fade out: {} -> {}", from.unwrap_or("<none>"), to);
        let caption = caption(description);
        let outcome = sweep(
            self.context.surface.as_ref(),
            self.context.clock.as_ref(),
            to_duration(self.config.out_duration),
            cancel,
            (0.0, 1.0),
            self.sorting_order,
            |coverage| self.frame(coverage, &caption),
        )
        .await;

        if outcome == Animation::Cancelled {
            log::debug!("Fade out to '{}' cancelled", to);
        }
    }

    async fn play_in(&self, to: &str, description: &str, cancel: &CancellationToken) {
        log::debug!("Fade in: {}", to);
        let caption = caption(description);
        let outcome = sweep(
            self.context.surface.as_ref(),
            self.context.clock.as_ref(),
            to_duration(self.config.in_duration),
            cancel,
            (1.0, 0.0),
            self.sorting_order,
            |coverage| self.frame(coverage, &caption),
        )
        .await;

        if outcome == Animation::Cancelled {
            log::debug!("Fade in of '{}' cancelled", to);
        }
    }

    fn reset(&self) {
        self.context.rest(self.sorting_order);
    }
}
