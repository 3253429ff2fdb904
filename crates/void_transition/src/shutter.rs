//! Shutter panels

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::animate::{sweep, Animation};
use crate::config::{to_duration, ShutterConfig, TransitionConfig, TransitionMode};
use crate::easing::Easing;
use crate::strategy::{caption, TransitionContext, TransitionStrategy};
use crate::surface::OverlayFrame;

/// Two panels slide in from the screen edges and meet in the middle
#[derive(Debug, Clone)]
pub struct ShutterTransition {
    context: TransitionContext,
    config: ShutterConfig,
    overlay_alpha: f32,
    sorting_order: i32,
}

impl ShutterTransition {
    pub fn new(context: TransitionContext, config: &TransitionConfig) -> Self {
        Self {
            context,
            config: config.shutter.clone(),
            overlay_alpha: config.overlay_alpha,
            sorting_order: config.sorting_order,
        }
    }

    fn frame(&self, coverage: f32, caption: &Option<String>) -> OverlayFrame {
        let closed = Easing::EaseIn.apply(coverage);
        OverlayFrame {
            alpha: if closed > 0.0 { self.overlay_alpha } else { 0.0 },
            blocks_input: true,
            shutter: closed,
            // Only legible once the panels have met
            caption: if closed >= 1.0 { caption.clone() } else { None },
            ..OverlayFrame::resting(self.sorting_order)
        }
    }
}

#[async_trait]
impl TransitionStrategy for ShutterTransition {
    fn mode(&self) -> TransitionMode {
        TransitionMode::Shutter
    }

    async fn play_out(&self, from: Option<&str>, to: &str, description: &str, cancel: &CancellationToken) {
        log::debug!("Shutter closing: {} -> {}", from.unwrap_or("<none>"), to);
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
            log::debug!("Shutter close for '{}' cancelled", to);
        }
    }

    async fn play_in(&self, to: &str, description: &str, cancel: &CancellationToken) {
        log::debug!("Shutter opening: {}", to);
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
            log::debug!("Shutter open for '{}' cancelled", to);
        }
    }

    fn reset(&self) {
        self.context.rest(self.sorting_order);
    }
}
