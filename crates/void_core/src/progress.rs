//! Progress reporting seam
//!
//! Resource acquisition reports fractional progress through a [`ProgressSink`];
//! loading trackers hand out sinks that forward into their shared state.

/// Receives fractional progress updates in `[0, 1]`
///
/// Implementations must be cheap and must never block: sinks are invoked
/// from inside resource acquisition loops.
pub trait ProgressSink: Send + Sync {
    /// Report the current progress
    fn report(&self, progress: f32);
}

impl<F> ProgressSink for F
where
    F: Fn(f32) + Send + Sync,
{
    fn report(&self, progress: f32) {
        self(progress)
    }
}

/// A sink that discards every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report(&self, _progress: f32) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_closure_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let sink = move |p: f32| seen_clone.lock().unwrap().push(p);

        sink.report(0.25);
        sink.report(1.0);

        assert_eq!(*seen.lock().unwrap(), vec![0.25, 1.0]);
    }

    #[test]
    fn test_arc_dyn_sink() {
        let sink: Arc<dyn ProgressSink> = Arc::new(NullProgress);
        sink.report(0.5);
        let forwarded = sink.clone();
        forwarded.report(0.75);
    }
}
