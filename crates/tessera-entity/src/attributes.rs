//! Attribute values with keyed modifiers.
//!
//! Each attribute has a base value plus modifiers applied in three passes:
//! additions, then multiples of the summed base, then multiples of the
//! running total. The result is clamped to the attribute's range.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::LivingTraits;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Attribute {
    MaxHealth,
    MovementSpeed,
    Armor,
    ArmorToughness,
    KnockbackResistance,
}

impl Attribute {
    pub const ALL: [Attribute; 5] = [
        Attribute::MaxHealth,
        Attribute::MovementSpeed,
        Attribute::Armor,
        Attribute::ArmorToughness,
        Attribute::KnockbackResistance,
    ];

    /// Allowed range of the final value.
    pub fn range(self) -> (f64, f64) {
        match self {
            Attribute::MaxHealth => (1.0, 1024.0),
            Attribute::MovementSpeed => (0.0, 1024.0),
            Attribute::Armor => (0.0, 30.0),
            Attribute::ArmorToughness => (0.0, 20.0),
            Attribute::KnockbackResistance => (0.0, 1.0),
        }
    }

    pub fn default_value(self) -> f64 {
        match self {
            Attribute::MaxHealth => 20.0,
            Attribute::MovementSpeed => 0.7,
            _ => 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Add,
    MultiplyBase,
    MultiplyTotal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeModifier {
    /// Removal key; at most one modifier per id on an attribute.
    pub id: String,
    pub amount: f64,
    pub operation: Operation,
}

impl AttributeModifier {
    pub fn new(id: &str, amount: f64, operation: Operation) -> Self {
        Self {
            id: id.to_string(),
            amount,
            operation,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeInstance {
    pub base: f64,
    modifiers: Vec<AttributeModifier>,
}

impl AttributeInstance {
    pub fn new(base: f64) -> Self {
        Self {
            base,
            modifiers: Vec::new(),
        }
    }

    pub fn modifiers(&self) -> &[AttributeModifier] {
        &self.modifiers
    }

    pub fn value(&self, attribute: Attribute) -> f64 {
        let mut base = self.base;
        for m in self.by_operation(Operation::Add) {
            base += m.amount;
        }
        let mut total = base;
        for m in self.by_operation(Operation::MultiplyBase) {
            total += base * m.amount;
        }
        for m in self.by_operation(Operation::MultiplyTotal) {
            total *= 1.0 + m.amount;
        }
        let (lo, hi) = attribute.range();
        total.clamp(lo, hi)
    }

    fn by_operation(&self, op: Operation) -> impl Iterator<Item = &AttributeModifier> {
        self.modifiers.iter().filter(move |m| m.operation == op)
    }
}

/// Per-entity attribute table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeMap {
    instances: BTreeMap<Attribute, AttributeInstance>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table seeded with the base values of a living type.
    pub fn for_living(traits: &LivingTraits) -> Self {
        let mut map = Self::new();
        map.set_base(Attribute::MaxHealth, traits.max_health as f64);
        map.set_base(Attribute::MovementSpeed, traits.movement_speed);
        map.set_base(Attribute::Armor, traits.armor);
        map.set_base(Attribute::ArmorToughness, traits.armor_toughness);
        map.set_base(Attribute::KnockbackResistance, traits.knockback_resistance);
        map
    }

    pub fn value(&self, attribute: Attribute) -> f64 {
        match self.instances.get(&attribute) {
            Some(instance) => instance.value(attribute),
            None => attribute.default_value(),
        }
    }

    pub fn base(&self, attribute: Attribute) -> f64 {
        self.instances
            .get(&attribute)
            .map_or_else(|| attribute.default_value(), |i| i.base)
    }

    pub fn set_base(&mut self, attribute: Attribute, base: f64) {
        if !base.is_finite() {
            tracing::warn!(?attribute, base, "rejecting non-finite attribute base");
            return;
        }
        self.instances
            .entry(attribute)
            .or_insert_with(|| AttributeInstance::new(attribute.default_value()))
            .base = base;
    }

    /// Add a modifier. Returns `false` if one with the same id is already present.
    pub fn add_modifier(&mut self, attribute: Attribute, modifier: AttributeModifier) -> bool {
        let instance = self
            .instances
            .entry(attribute)
            .or_insert_with(|| AttributeInstance::new(attribute.default_value()));
        if instance.modifiers.iter().any(|m| m.id == modifier.id) {
            return false;
        }
        instance.modifiers.push(modifier);
        true
    }

    /// Remove the modifier keyed `id`. Removing an absent id is a no-op.
    pub fn remove_modifier(&mut self, attribute: Attribute, id: &str) -> bool {
        let Some(instance) = self.instances.get_mut(&attribute) else {
            return false;
        };
        let before = instance.modifiers.len();
        instance.modifiers.retain(|m| m.id != id);
        instance.modifiers.len() != before
    }

    pub fn get(&self, attribute: Attribute) -> Option<&AttributeInstance> {
        self.instances.get(&attribute)
    }
}
