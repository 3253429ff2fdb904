//! Letterbox bars followed by a fade

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::animate::{sweep, Animation};
use crate::config::{to_duration, CinematicConfig, TransitionConfig, TransitionMode};
use crate::easing::Easing;
use crate::strategy::{caption, TransitionContext, TransitionStrategy};
use crate::surface::OverlayFrame;

/// Closes letterbox bars over the first half of play-out, then fades the
/// overlay in. Play-in runs the same curve backwards.
#[derive(Debug, Clone)]
pub struct CinematicTransition {
    context: TransitionContext,
    config: CinematicConfig,
    overlay_alpha: f32,
    sorting_order: i32,
}

impl CinematicTransition {
    pub fn new(context: TransitionContext, config: &TransitionConfig) -> Self {
        Self {
            context,
            config: config.cinematic.clone(),
            overlay_alpha: config.overlay_alpha,
            sorting_order: config.sorting_order,
        }
    }

    fn frame(&self, coverage: f32, caption: &Option<String>) -> OverlayFrame {
        let bars = Easing::EaseOut.apply(coverage * 2.0);
        let fade = Easing::EaseInOut.apply((coverage - 0.5) * 2.0);

        OverlayFrame {
            alpha: self.overlay_alpha * fade,
            blocks_input: true,
            letterbox: self.config.bar_height_ratio * bars,
            caption: caption.clone(),
            ..OverlayFrame::resting(self.sorting_order)
        }
    }
}

#[async_trait]
impl TransitionStrategy for CinematicTransition {
    fn mode(&self) -> TransitionMode {
        TransitionMode::Cinematic
    }

    async fn play_out(&self, from: Option<&str>, to: &str, description: &str, cancel: &CancellationToken) {
        log::debug!("Cinematic out: {} -> {}", from.unwrap_or("<none>"), to);
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
            log::debug!("Cinematic out to '{}' cancelled", to);
        }
    }

    async fn play_in(&self, to: &str, description: &str, cancel: &CancellationToken) {
        log::debug!("Cinematic in: {}", to);
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
            log::debug!("Cinematic in of '{}' cancelled", to);
        }
    }

    fn reset(&self) {
        self.context.rest(self.sorting_order);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::OverlayLayer;
    use std::sync::Arc;
    use std::time::Duration;

    fn transition() -> CinematicTransition {
        let layer = Arc::new(OverlayLayer::new(0));
        let context = TransitionContext::realtime(layer, Duration::from_millis(16));
        CinematicTransition::new(context, &TransitionConfig::default())
    }

    #[test]
    fn test_bars_close_before_fade() {
        let cinematic = transition();
        let ratio = TransitionConfig::default().cinematic.bar_height_ratio;

        let half = cinematic.frame(0.5, &None);
        assert_eq!(half.letterbox, ratio);
        assert_eq!(half.alpha, 0.0);

        let quarter = cinematic.frame(0.25, &None);
        assert!(quarter.letterbox > 0.0 && quarter.letterbox < ratio);

        let full = cinematic.frame(1.0, &None);
        assert_eq!(full.letterbox, ratio);
        assert_eq!(full.alpha, 1.0);
    }
}
