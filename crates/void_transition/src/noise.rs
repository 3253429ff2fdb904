//! Placeholder noise effect

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::animate::{sweep, Animation};
use crate::config::{to_duration, NoiseConfig, TransitionConfig, TransitionMode};
use crate::easing::Easing;
use crate::strategy::{caption, TransitionContext, TransitionStrategy};
use crate::surface::OverlayFrame;

/// Static noise that ramps up with the overlay alpha
#[derive(Debug, Clone)]
pub struct NoiseTransition {
    context: TransitionContext,
    config: NoiseConfig,
    overlay_alpha: f32,
    sorting_order: i32,
}

impl NoiseTransition {
    pub fn new(context: TransitionContext, config: &TransitionConfig) -> Self {
        Self {
            context,
            config: config.noise.clone(),
            overlay_alpha: config.overlay_alpha,
            sorting_order: config.sorting_order,
        }
    }

    fn frame(&self, coverage: f32, caption: &Option<String>) -> OverlayFrame {
        let level = Easing::EaseInOut.apply(coverage);
        OverlayFrame {
            alpha: self.overlay_alpha * level,
            blocks_input: true,
            noise: self.config.intensity * level,
            caption: caption.clone(),
            ..OverlayFrame::resting(self.sorting_order)
        }
    }
}

#[async_trait]
impl TransitionStrategy for NoiseTransition {
    fn mode(&self) -> TransitionMode {
        TransitionMode::Noise
    }

    async fn play_out(&self, from: Option<&str>, to: &str, description: &str, cancel: &CancellationToken) {
        log::debug!("Noise out: {} -> {}", from.unwrap_or("<none>"), to);
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
            log::debug!("Noise out to '{}' cancelled", to);
        }
    }

    async fn play_in(&self, to: &str, description: &str, cancel: &CancellationToken) {
        log::debug!("Noise in: {}", to);
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
            log::debug!("Noise in of '{}' cancelled", to);
        }
    }

    fn reset(&self) {
        self.context.rest(self.sorting_order);
    }
}
