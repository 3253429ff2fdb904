//! Strategy selection
//!
//! Maps the configured [`TransitionMode`] to a registered strategy. Selection
//! never fails: a disabled configuration resolves to [`NoTransition`], and a
//! mode without a registered strategy falls back to fade, then to the first
//! registered strategy, then to [`NoTransition`].

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cinematic::CinematicTransition;
use crate::config::{TransitionConfig, TransitionMode};
use crate::fade::FadeTransition;
use crate::noise::NoiseTransition;
use crate::shutter::ShutterTransition;
use crate::strategy::{NoTransition, TransitionContext, TransitionStrategy};

/// Registry of transition strategies keyed by mode
#[derive(Default)]
pub struct TransitionSelector {
    strategies: BTreeMap<TransitionMode, Arc<dyn TransitionStrategy>>,
}

impl TransitionSelector {
    /// Create an empty selector
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a selector with every built-in strategy registered
    pub fn standard(context: TransitionContext, config: &TransitionConfig) -> Self {
        let mut selector = Self::new();
        selector.register(Arc::new(NoTransition));
        selector.register(Arc::new(FadeTransition::new(context.clone(), config)));
        selector.register(Arc::new(CinematicTransition::new(context.clone(), config)));
        selector.register(Arc::new(ShutterTransition::new(context.clone(), config)));
        selector.register(Arc::new(NoiseTransition::new(context, config)));
        selector
    }

    /// Register a strategy under its own mode, returning the one it replaces
    pub fn register(&mut self, strategy: Arc<dyn TransitionStrategy>) -> Option<Arc<dyn TransitionStrategy>> {
        let mode = strategy.mode();
        let previous = self.strategies.insert(mode, strategy);
        if previous.is_some() {
            log::debug!("Replaced {} transition strategy", mode);
        }
        previous
    }

    /// Remove the strategy for `mode`
    pub fn unregister(&mut self, mode: TransitionMode) -> Option<Arc<dyn TransitionStrategy>> {
        self.strategies.remove(&mode)
    }

    /// Strategy registered for exactly `mode`
    pub fn get(&self, mode: TransitionMode) -> Option<Arc<dyn TransitionStrategy>> {
        self.strategies.get(&mode).cloned()
    }

    pub fn contains(&self, mode: TransitionMode) -> bool {
        self.strategies.contains_key(&mode)
    }

    /// Registered modes
    pub fn modes(&self) -> Vec<TransitionMode> {
        self.strategies.keys().copied().collect()
    }

    /// Pick the strategy to use for `config`
    pub fn resolve(&self, config: &TransitionConfig) -> Arc<dyn TransitionStrategy> {
        if !config.enable_transition {
            log::debug!("Transitions disabled; switching without an effect");
            return self.no_transition();
        }
        if config.mode == TransitionMode::None {
            return self.no_transition();
        }
        if let Some(strategy) = self.get(config.mode) {
            return strategy;
        }

        let fallback = self
            .get(TransitionMode::Fade)
            .or_else(|| self.strategies.values().next().cloned())
            .unwrap_or_else(|| Arc::new(NoTransition));

        log::warn!(
            "No {} transition registered; falling back to {}",
            config.mode,
            fallback.mode()
        );
        fallback
    }

    fn no_transition(&self) -> Arc<dyn TransitionStrategy> {
        self.get(TransitionMode::None).unwrap_or_else(|| Arc::new(NoTransition))
    }
}

impl std::fmt::Debug for TransitionSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionSelector")
            .field("modes", &self.modes())
            .finish()
    }
}
