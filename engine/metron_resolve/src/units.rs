//! Unit-instance set resolution.
//!
//! Computes, for one type, the set of unit instances it exposes. The
//! set algebra is evaluated from the root of the ancestor chain toward
//! the leaf: the chain is first truncated at the nearest ancestor that
//! stops inheriting units (that ancestor reseeds from the full
//! instance set), then each step applies its own lists. A non-empty
//! inclusion intersects; otherwise a non-empty exclusion subtracts.
//!
//! Because an inclusion intersects the already-narrowed inherited set,
//! an instance excluded by an ancestor stays excluded for descendants
//! that keep inheriting; only `inherit units = false` reseeds the full
//! set and makes it re-includable.

use indexmap::IndexSet;
use rustc_hash::FxHashSet;

use metron_diagnostic::{Diagnostic, DiagnosticKind, DiagnosticQueue};
use metron_ir::{Facet, Name, QuantityDeclaration, QuantityId, UnitDefinition};

use crate::Population;

/// Resolve the included unit instances of `id` against its unit.
///
/// The result preserves the unit definition's instance order, and is
/// always a subset of the unit's full instance set.
pub(crate) fn resolve_included_units(
    population: &Population,
    unit: &UnitDefinition,
    id: QuantityId,
    queue: &mut DiagnosticQueue,
) -> IndexSet<Name> {
    let Some(chain) = population.chain(id) else {
        return IndexSet::new();
    };

    // Truncate the chain at the first step (walking leaf to root) that
    // does not inherit units; that step reseeds from the full set.
    let mut last = chain.len().saturating_sub(1);
    for (step, &ancestor) in chain.iter().enumerate() {
        if step == chain.len() - 1 {
            break;
        }
        let inherits = population
            .get(ancestor)
            .is_some_and(|decl| decl.inherit.resolve(Facet::Units));
        if !inherits {
            last = step;
            break;
        }
    }

    // Seed with the full instance set, then refine root-ward first.
    let mut included: IndexSet<Name> = unit.instance_names().collect();
    for &ancestor in chain[..=last].iter().rev() {
        if let Some(decl) = population.get(ancestor) {
            apply_step(decl, &mut included, queue);
        }
    }

    included
}

/// Apply one declaration's inclusion/exclusion lists to the running set.
fn apply_step(
    decl: &QuantityDeclaration,
    included: &mut IndexSet<Name>,
    queue: &mut DiagnosticQueue,
) {
    let has_inclusions = decl.unit_inclusions.iter().any(|list| !list.names.is_empty());
    let has_exclusions = decl.unit_exclusions.iter().any(|list| !list.names.is_empty());

    if has_inclusions && has_exclusions {
        // Contradiction: the exclusion lists collapse to empty.
        queue.push(Diagnostic::error(
            DiagnosticKind::ContradictoryUnitInclusionExclusion,
            decl.identity,
        ));
    }

    if has_inclusions {
        // Names not present on the unit are silently skipped: the
        // intersection cannot introduce them.
        let names: FxHashSet<Name> = decl
            .unit_inclusions
            .iter()
            .flat_map(|list| list.names.iter().copied())
            .collect();
        included.retain(|name| names.contains(name));
    } else if has_exclusions {
        let names: FxHashSet<Name> = decl
            .unit_exclusions
            .iter()
            .flat_map(|list| list.names.iter().copied())
            .collect();
        included.retain(|name| !names.contains(name));
    }
}

#[cfg(test)]
mod tests {
    use metron_diagnostic::DiagnosticQueue;
    use metron_ir::{
        DeclarationStore, QuantityDeclaration, StringInterner, UnitId, UnitInstance,
        UnitInstanceList,
    };
    use pretty_assertions::assert_eq;

    use super::*;

    struct Fixture {
        interner: StringInterner,
        unit: UnitDefinition,
    }

    impl Fixture {
        fn new() -> Self {
            let interner = StringInterner::new();
            let length = UnitId::of(&interner, "units::Length");
            let unit = UnitDefinition::new(length)
                .with_instance(UnitInstance::new(interner.intern("Metre")))
                .with_instance(UnitInstance::new(interner.intern("Kilometre")))
                .with_instance(UnitInstance::new(interner.intern("Mile")));
            Fixture { interner, unit }
        }

        fn list(&self, names: &[&str]) -> UnitInstanceList {
            UnitInstanceList::new(names.iter().map(|n| self.interner.intern(n)))
        }

        fn resolve(
            &self,
            decls: Vec<QuantityDeclaration>,
            id: QuantityId,
        ) -> (Vec<&'static str>, usize) {
            let store = DeclarationStore::new(decls);
            let mut queue = DiagnosticQueue::new();
            let population = Population::build(&store, &self.interner, &mut queue);
            let included = resolve_included_units(&population, &self.unit, id, &mut queue);
            let names = included
                .iter()
                .map(|&n| self.interner.lookup(n))
                .collect();
            (names, queue.len())
        }
    }

    #[test]
    fn test_base_without_lists_gets_full_set() {
        let fixture = Fixture::new();
        let distance = QuantityId::of(&fixture.interner, "Distance");
        let decls = vec![QuantityDeclaration::scalar_base(
            distance,
            fixture.unit.identity(),
        )];

        let (names, diagnostics) = fixture.resolve(decls, distance);
        assert_eq!(names, ["Metre", "Kilometre", "Mile"]);
        assert_eq!(diagnostics, 0);
    }

    #[test]
    fn test_inclusion_then_exclusion_algebra() {
        // Base {Metre, Kilometre, Mile}; child includes (Metre,
        // Kilometre) -> {Metre, Kilometre}; grandchild excludes
        // Kilometre -> {Metre}, not {Metre, Mile}.
        let fixture = Fixture::new();
        let distance = QuantityId::of(&fixture.interner, "Distance");
        let altitude = QuantityId::of(&fixture.interner, "Altitude");
        let ceiling = QuantityId::of(&fixture.interner, "Ceiling");

        let decls = vec![
            QuantityDeclaration::scalar_base(distance, fixture.unit.identity()),
            QuantityDeclaration::scalar_specialization(altitude, distance)
                .with_unit_inclusion(fixture.list(&["Metre", "Kilometre"])),
            QuantityDeclaration::scalar_specialization(ceiling, altitude)
                .with_unit_exclusion(fixture.list(&["Kilometre"])),
        ];

        let (names, diagnostics) = fixture.resolve(decls, ceiling);
        assert_eq!(names, ["Metre"]);
        assert_eq!(diagnostics, 0);
    }

    #[test]
    fn test_exclusion_not_resurrected_by_inclusion() {
        // Grandparent excludes Kilometre; the leaf's inclusion list
        // intersects the narrowed set, so Kilometre stays excluded.
        let fixture = Fixture::new();
        let distance = QuantityId::of(&fixture.interner, "Distance");
        let altitude = QuantityId::of(&fixture.interner, "Altitude");
        let ceiling = QuantityId::of(&fixture.interner, "Ceiling");

        let decls = vec![
            QuantityDeclaration::scalar_base(distance, fixture.unit.identity())
                .with_unit_exclusion(fixture.list(&["Kilometre"])),
            QuantityDeclaration::scalar_specialization(altitude, distance),
            QuantityDeclaration::scalar_specialization(ceiling, altitude)
                .with_unit_inclusion(fixture.list(&["Metre", "Kilometre"])),
        ];

        let (names, diagnostics) = fixture.resolve(decls, ceiling);
        assert_eq!(names, ["Metre"]);
        assert_eq!(diagnostics, 0);
    }

    #[test]
    fn test_inherit_units_false_reseeds_full_set() {
        // Same shape, but the leaf opts out of unit inheritance: the
        // set reseeds from the full instance set and the leaf's own
        // inclusion can name Kilometre again.
        let fixture = Fixture::new();
        let distance = QuantityId::of(&fixture.interner, "Distance");
        let altitude = QuantityId::of(&fixture.interner, "Altitude");
        let ceiling = QuantityId::of(&fixture.interner, "Ceiling");

        let decls = vec![
            QuantityDeclaration::scalar_base(distance, fixture.unit.identity())
                .with_unit_exclusion(fixture.list(&["Kilometre"])),
            QuantityDeclaration::scalar_specialization(altitude, distance),
            QuantityDeclaration::scalar_specialization(ceiling, altitude)
                .with_inherit(Facet::Units, false)
                .with_unit_inclusion(fixture.list(&["Metre", "Kilometre"])),
        ];

        let (names, diagnostics) = fixture.resolve(decls, ceiling);
        assert_eq!(names, ["Metre", "Kilometre"]);
        assert_eq!(diagnostics, 0);
    }

    #[test]
    fn test_unknown_inclusion_names_silently_skipped() {
        let fixture = Fixture::new();
        let distance = QuantityId::of(&fixture.interner, "Distance");
        let decls = vec![QuantityDeclaration::scalar_base(
            distance,
            fixture.unit.identity(),
        )
        .with_unit_inclusion(fixture.list(&["Metre", "Furlong"]))];

        let (names, diagnostics) = fixture.resolve(decls, distance);
        assert_eq!(names, ["Metre"]);
        assert_eq!(diagnostics, 0);
    }

    #[test]
    fn test_contradictory_lists_collapse_exclusions() {
        let fixture = Fixture::new();
        let distance = QuantityId::of(&fixture.interner, "Distance");
        let decls = vec![QuantityDeclaration::scalar_base(
            distance,
            fixture.unit.identity(),
        )
        .with_unit_inclusion(fixture.list(&["Metre", "Mile"]))
        .with_unit_exclusion(fixture.list(&["Mile"]))];

        let (names, diagnostics) = fixture.resolve(decls, distance);
        // The inclusion applies; the exclusion is ignored and diagnosed.
        assert_eq!(names, ["Metre", "Mile"]);
        assert_eq!(diagnostics, 1);
    }

    #[test]
    fn test_multiple_inclusion_sites_union_before_intersecting() {
        let fixture = Fixture::new();
        let distance = QuantityId::of(&fixture.interner, "Distance");
        let decls = vec![QuantityDeclaration::scalar_base(
            distance,
            fixture.unit.identity(),
        )
        .with_unit_inclusion(fixture.list(&["Metre"]))
        .with_unit_inclusion(fixture.list(&["Mile"]))];

        let (names, diagnostics) = fixture.resolve(decls, distance);
        assert_eq!(names, ["Metre", "Mile"]);
        assert_eq!(diagnostics, 0);
    }
}
