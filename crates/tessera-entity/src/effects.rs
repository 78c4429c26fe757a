//! Timed status effects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MobEffect {
    /// Reduces incoming damage by 20% per level.
    Resistance,
    /// Ignores fire damage.
    FireResistance,
    /// Air supply does not drop under water.
    WaterBreathing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectInstance {
    /// Zero-based level.
    pub amplifier: u8,
    /// Remaining ticks.
    pub duration: i32,
}

impl EffectInstance {
    pub fn new(amplifier: u8, duration: i32) -> Self {
        Self { amplifier, duration }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffects {
    effects: BTreeMap<MobEffect, EffectInstance>,
}

impl ActiveEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an effect. A stronger level replaces the current one; the same
    /// level only extends the duration.
    pub fn add(&mut self, effect: MobEffect, instance: EffectInstance) -> bool {
        match self.effects.get_mut(&effect) {
            Some(current) => {
                if instance.amplifier > current.amplifier
                    || (instance.amplifier == current.amplifier && instance.duration > current.duration)
                {
                    *current = instance;
                    true
                } else {
                    false
                }
            }
            None => {
                self.effects.insert(effect, instance);
                true
            }
        }
    }

    pub fn get(&self, effect: MobEffect) -> Option<&EffectInstance> {
        self.effects.get(&effect)
    }

    pub fn has(&self, effect: MobEffect) -> bool {
        self.effects.contains_key(&effect)
    }

    pub fn remove(&mut self, effect: MobEffect) -> Option<EffectInstance> {
        self.effects.remove(&effect)
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Count every effect down by one tick and drop the expired ones.
    pub fn tick(&mut self) -> Vec<MobEffect> {
        let mut expired = Vec::new();
        for (effect, instance) in self.effects.iter_mut() {
            instance.duration -= 1;
            if instance.duration <= 0 {
                expired.push(*effect);
            }
        }
        for effect in &expired {
            self.effects.remove(effect);
        }
        expired
    }
}
