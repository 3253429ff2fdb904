//! Overlay surface
//!
//! Strategies describe what the overlay should look like as an
//! [`OverlayFrame`] and hand it to a [`TransitionSurface`]. Drawing the frame
//! is the host's business.

use parking_lot::Mutex;

/// Visual state of the transition overlay
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayFrame {
    /// Overlay opacity, 0 = transparent
    pub alpha: f32,
    /// Swallow input while the overlay is up
    pub blocks_input: bool,
    /// Letterbox bar height as a fraction of the screen
    pub letterbox: f32,
    /// Shutter closure, 0 = open, 1 = closed
    pub shutter: f32,
    /// Noise intensity
    pub noise: f32,
    /// Draw order relative to other UI
    pub sorting_order: i32,
    /// Text shown on the overlay
    pub caption: Option<String>,
}

impl OverlayFrame {
    /// Fully transparent, not blocking input
    pub fn resting(sorting_order: i32) -> Self {
        Self {
            alpha: 0.0,
            blocks_input: false,
            letterbox: 0.0,
            shutter: 0.0,
            noise: 0.0,
            sorting_order,
            caption: None,
        }
    }

    /// Check if nothing is visible
    pub fn is_resting(&self) -> bool {
        self.alpha <= 0.0
            && !self.blocks_input
            && self.letterbox <= 0.0
            && self.shutter <= 0.0
            && self.noise <= 0.0
    }
}

impl Default for OverlayFrame {
    fn default() -> Self {
        Self::resting(0)
    }
}

/// Where transition frames are presented
pub trait TransitionSurface: Send + Sync {
    fn present(&self, frame: &OverlayFrame);
}

/// In-memory surface that keeps the latest frame
#[derive(Debug)]
pub struct OverlayLayer {
    state: Mutex<LayerState>,
}

#[derive(Debug)]
struct LayerState {
    current: OverlayFrame,
    frames: u64,
    peak_alpha: f32,
}

impl OverlayLayer {
    pub fn new(sorting_order: i32) -> Self {
        Self {
            state: Mutex::new(LayerState {
                current: OverlayFrame::resting(sorting_order),
                frames: 0,
                peak_alpha: 0.0,
            }),
        }
    }

    /// Latest presented frame
    pub fn current(&self) -> OverlayFrame {
        self.state.lock().current.clone()
    }

    /// Number of frames presented so far
    pub fn frame_count(&self) -> u64 {
        self.state.lock().frames
    }

    /// Highest alpha ever presented
    pub fn peak_alpha(&self) -> f32 {
        self.state.lock().peak_alpha
    }
}

impl Default for OverlayLayer {
    fn default() -> Self {
        Self::new(0)
    }
}

impl TransitionSurface for OverlayLayer {
    fn present(&self, frame: &OverlayFrame) {
        let mut state = self.state.lock();
        state.current = frame.clone();
        state.frames += 1;
        state.peak_alpha = state.peak_alpha.max(frame.alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resting_frame() {
        let frame = OverlayFrame::resting(5);
        assert!(frame.is_resting());
        assert_eq!(frame.sorting_order, 5);

        let covered = OverlayFrame {
            alpha: 1.0,
            blocks_input: true,
            ..frame
        };
        assert!(!covered.is_resting());
    }

    #[test]
    fn test_layer_records_frames() {
        let layer = OverlayLayer::new(10);
        assert!(layer.current().is_resting());
        assert_eq!(layer.frame_count(), 0);

        layer.present(&OverlayFrame {
            alpha: 0.6,
            ..OverlayFrame::resting(10)
        });
        layer.present(&OverlayFrame::resting(10));

        assert_eq!(layer.frame_count(), 2);
        assert_eq!(layer.peak_alpha(), 0.6);
        assert!(layer.current().is_resting());
    }
}
