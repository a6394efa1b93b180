use std::collections::HashSet;
use std::time::Duration;

use crate::chart::{Effect, EffectKind, ItemId};

/// One-shot presentation handed to the host for painting. Carries no state
/// back into the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggeredEffect {
    pub id: ItemId,
    pub kind: EffectKind,
    /// How long the transient presentation element should stay on screen
    /// before the host removes it.
    pub display_for: Duration,
}

/// Per-frame scan detecting when playback time crosses an effect's scheduled
/// time in the forward direction.
///
/// Runs independently of the animation driver against the same time source;
/// the two loops never communicate and must be torn down together. Each
/// effect fires at most once per forward pass, keyed by its stable id, so
/// structural edits of the effects collection between frames cannot confuse
/// the deduplication. Moving backward (a seek or loop) starts a new pass.
#[derive(Debug, Default)]
pub struct EffectScheduler {
    last_observed: f64,
    fired: HashSet<ItemId>,
}

impl EffectScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples the current playback time and returns the effects whose
    /// scheduled time lies in `(last observed, now]` and have not fired this
    /// pass.
    pub fn sample(&mut self, effects: &[Effect], now: f64) -> Vec<TriggeredEffect> {
        if now < self.last_observed {
            self.fired.clear();
        }

        let mut triggered = Vec::new();
        for effect in effects {
            if self.last_observed < effect.time
                && effect.time <= now
                && self.fired.insert(effect.id)
            {
                triggered.push(TriggeredEffect {
                    id: effect.id,
                    kind: effect.kind.clone(),
                    display_for: effect.kind.display_duration(),
                });
            }
        }

        self.last_observed = now;
        triggered
    }

    /// Forgets the observed time and every fired effect, e.g. on teardown or
    /// when the chart is replaced wholesale.
    pub fn reset(&mut self) {
        self.last_observed = 0.0;
        self.fired.clear();
    }
}
