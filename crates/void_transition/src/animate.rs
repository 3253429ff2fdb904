//! Frame loop shared by the animated strategies

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::clock::FrameClock;
use crate::surface::{OverlayFrame, TransitionSurface};

/// How an animation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Animation {
    Completed,
    Cancelled,
}

/// Call `frame` once per clock tick with linear progress in `[0, 1]`
///
/// The last call always receives `1.0` unless the animation is cancelled.
/// A zero duration produces a single final frame.
pub async fn animate<F>(
    clock: &dyn FrameClock,
    duration: Duration,
    cancel: &CancellationToken,
    mut frame: F,
) -> Animation
where
    F: FnMut(f32) + Send,
{
    let start = clock.now();
    let total = duration.as_secs_f32();

    loop {
        if cancel.is_cancelled() {
            return Animation::Cancelled;
        }

        let t = if total <= 0.0 {
            1.0
        } else {
            (clock.now().saturating_sub(start).as_secs_f32() / total).min(1.0)
        };
        frame(t);
        if t >= 1.0 {
            return Animation::Completed;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Animation::Cancelled,
            _ = clock.next_frame() => {}
        }
    }
}

/// Drive overlay coverage from `from` to `to` over `duration`
///
/// `shape` turns a coverage value into the frame to present. A cancelled
/// sweep, or one that ends fully uncovered, leaves the resting frame on the
/// surface.
pub(crate) async fn sweep<S>(
    surface: &dyn TransitionSurface,
    clock: &dyn FrameClock,
    duration: Duration,
    cancel: &CancellationToken,
    (from, to): (f32, f32),
    sorting_order: i32,
    shape: S,
) -> Animation
where
    S: Fn(f32) -> OverlayFrame + Send + Sync,
{
    let outcome = animate(clock, duration, cancel, |t| {
        surface.present(&shape(from + (to - from) * t));
    })
    .await;

    if outcome == Animation::Cancelled || to <= 0.0 {
        surface.present(&OverlayFrame::resting(sorting_order));
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::RealtimeClock;
    use parking_lot::Mutex;

    #[tokio::test(start_paused = true)]
    async fn test_progress_is_monotonic_and_finishes() {
        let clock = RealtimeClock::new(Duration::from_millis(10));
        let seen = Mutex::new(Vec::new());

        let outcome = animate(&clock, Duration::from_millis(100), &CancellationToken::new(), |t| {
            seen.lock().push(t)
        })
        .await;

        let seen = seen.into_inner();
        assert_eq!(outcome, Animation::Completed);
        assert_eq!(seen.first().copied(), Some(0.0));
        assert_eq!(seen.last().copied(), Some(1.0));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert!(seen.len() >= 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_duration() {
        let clock = RealtimeClock::default();
        let mut frames = 0;

        let outcome = animate(&clock, Duration::ZERO, &CancellationToken::new(), |t| {
            assert_eq!(t, 1.0);
            frames += 1;
        })
        .await;

        assert_eq!(outcome, Animation::Completed);
        assert_eq!(frames, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_loop() {
        let clock = RealtimeClock::new(Duration::from_millis(10));
        let cancel = CancellationToken::new();
        let mut last = 0.0;

        let (outcome, _) = tokio::join!(
            animate(&clock, Duration::from_secs(10), &cancel, |t| last = t),
            async {
                tokio::time::sleep(Duration::from_millis(55)).await;
                cancel.cancel();
            }
        );

        assert_eq!(outcome, Animation::Cancelled);
        assert!(last < 0.1);
    }
}
