//! # Void Transition
//!
//! Visual effects played around a scene switch.
//!
//! Every effect implements [`TransitionStrategy`]: `play_out` covers the old
//! scene, `play_in` reveals the new one. The [`TransitionSelector`] picks the
//! strategy for the configured [`TransitionMode`] and never fails to pick one.
//!
//! Effects don't draw anything themselves. Each frame is described as an
//! [`OverlayFrame`] and presented to a [`TransitionSurface`]; the host decides
//! how to render it.
//!
//! ## Usage
//!
//! ```ignore
//! let layer = Arc::new(OverlayLayer::new(config.sorting_order));
//! let context = TransitionContext::realtime(layer.clone(), config.frame_interval());
//! let selector = TransitionSelector::standard(context, &config);
//!
//! let strategy = selector.resolve(&config);
//! strategy.play_out(Some("menu"), "forest", "Loading forest", &cancel).await;
//! ```

pub mod animate;
pub mod cinematic;
pub mod clock;
pub mod config;
pub mod easing;
pub mod fade;
pub mod noise;
pub mod selector;
pub mod shutter;
pub mod strategy;
pub mod surface;

pub use animate::{animate, Animation};
pub use cinematic::CinematicTransition;
pub use clock::{FrameClock, RealtimeClock};
pub use config::{
    CinematicConfig, FadeConfig, NoiseConfig, ShutterConfig, TransitionConfig, TransitionMode,
};
pub use easing::Easing;
pub use fade::FadeTransition;
pub use noise::NoiseTransition;
pub use selector::TransitionSelector;
pub use shutter::ShutterTransition;
pub use strategy::{NoTransition, TransitionContext, TransitionStrategy};
pub use surface::{OverlayFrame, OverlayLayer, TransitionSurface};

pub mod prelude {
    pub use crate::config::{TransitionConfig, TransitionMode};
    pub use crate::selector::TransitionSelector;
    pub use crate::strategy::{TransitionContext, TransitionStrategy};
    pub use crate::surface::{OverlayFrame, OverlayLayer, TransitionSurface};
}
