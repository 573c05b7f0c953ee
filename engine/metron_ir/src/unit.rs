//! Unit definitions.
//!
//! The engine does not resolve units themselves; it only needs, per unit
//! type, the ordered set of unit instances so the unit-set resolver can
//! seed and narrow inclusion sets. The caller hands a read-only
//! [`UnitPopulation`] in alongside the declaration store.

use indexmap::IndexMap;

use crate::{Name, UnitId};

/// One named concrete unit value belonging to a unit type.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct UnitInstance {
    pub name: Name,
    pub symbol: Option<Name>,
    pub plural: Option<Name>,
}

impl UnitInstance {
    pub fn new(name: Name) -> Self {
        UnitInstance {
            name,
            symbol: None,
            plural: None,
        }
    }

    #[must_use]
    pub fn with_symbol(mut self, symbol: Name) -> Self {
        self.symbol = Some(symbol);
        self
    }

    #[must_use]
    pub fn with_plural(mut self, plural: Name) -> Self {
        self.plural = Some(plural);
        self
    }
}

/// A unit type and its instances, in declaration order.
#[derive(Clone, Debug)]
pub struct UnitDefinition {
    identity: UnitId,
    instances: IndexMap<Name, UnitInstance>,
}

impl UnitDefinition {
    pub fn new(identity: UnitId) -> Self {
        UnitDefinition {
            identity,
            instances: IndexMap::new(),
        }
    }

    /// Add an instance. The first definition of a name wins.
    #[must_use]
    pub fn with_instance(mut self, instance: UnitInstance) -> Self {
        self.instances.entry(instance.name).or_insert(instance);
        self
    }

    pub fn identity(&self) -> UnitId {
        self.identity
    }

    pub fn contains(&self, name: Name) -> bool {
        self.instances.contains_key(&name)
    }

    pub fn get(&self, name: Name) -> Option<&UnitInstance> {
        self.instances.get(&name)
    }

    /// Instance names in declaration order.
    pub fn instance_names(&self) -> impl Iterator<Item = Name> + '_ {
        self.instances.keys().copied()
    }

    pub fn instances(&self) -> impl Iterator<Item = &UnitInstance> {
        self.instances.values()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Read-only collection of unit definitions, keyed by identity.
#[derive(Clone, Debug, Default)]
pub struct UnitPopulation {
    units: IndexMap<UnitId, UnitDefinition>,
}

impl UnitPopulation {
    pub fn new() -> Self {
        UnitPopulation {
            units: IndexMap::new(),
        }
    }

    /// Add a unit definition. The first definition of an identity wins.
    #[must_use]
    pub fn with_unit(mut self, unit: UnitDefinition) -> Self {
        self.units.entry(unit.identity()).or_insert(unit);
        self
    }

    pub fn get(&self, identity: UnitId) -> Option<&UnitDefinition> {
        self.units.get(&identity)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StringInterner;

    #[test]
    fn test_instance_order_preserved() {
        let interner = StringInterner::new();
        let length = UnitId::of(&interner, "units::Length");
        let unit = UnitDefinition::new(length)
            .with_instance(UnitInstance::new(interner.intern("Metre")))
            .with_instance(UnitInstance::new(interner.intern("Kilometre")))
            .with_instance(UnitInstance::new(interner.intern("Mile")));

        let names: Vec<_> = unit
            .instance_names()
            .map(|n| interner.lookup(n))
            .collect();
        assert_eq!(names, ["Metre", "Kilometre", "Mile"]);
    }

    #[test]
    fn test_first_instance_wins() {
        let interner = StringInterner::new();
        let length = UnitId::of(&interner, "units::Length");
        let metre = interner.intern("Metre");
        let unit = UnitDefinition::new(length)
            .with_instance(UnitInstance::new(metre).with_symbol(interner.intern("m")))
            .with_instance(UnitInstance::new(metre));

        assert_eq!(unit.len(), 1);
        let kept = unit.get(metre);
        assert!(kept.is_some_and(|i| i.symbol.is_some()));
    }

    #[test]
    fn test_population_lookup() {
        let interner = StringInterner::new();
        let length = UnitId::of(&interner, "units::Length");
        let time = UnitId::of(&interner, "units::Time");
        let population = UnitPopulation::new().with_unit(UnitDefinition::new(length));

        assert!(population.get(length).is_some());
        assert!(population.get(time).is_none());
    }
}
