//! Facet inheritance resolution.
//!
//! For every surviving type, walks the precomputed ancestor chain and
//! merges each facet:
//!
//! - short-circuit facets take the first defined value walking from
//!   the type itself toward the root, with a per-facet default when
//!   the chain is exhausted
//! - accumulating facets concatenate, defined-type first then ancestor
//!   order, stopping at the first step whose facet-specific
//!   inheritance flag resolves to false (that step's own items are
//!   still included)
//!
//! Group members resolve through their group: their chain is
//! member -> group -> group ancestors, so a facet defined on the group
//! is found like any ancestor's. References that name a group are
//! afterwards mapped to the group's member of the member's own
//! dimension.

use smallvec::SmallVec;

use metron_diagnostic::{Diagnostic, DiagnosticContext, DiagnosticKind, DiagnosticQueue};
use metron_ir::{
    DerivationRule, Dimension, Facet, QuantityConstant, QuantityConversion, QuantityDeclaration,
    QuantityId, QuantityOperation, QuantityProcess, UnitPopulation,
};

use crate::units::resolve_included_units;
use crate::{Population, ResolvedQuantity};

/// Resolve one type into its materialized definition.
///
/// Returns `None` when the type cannot be resolved (its unit is
/// unknown, or population state is inconsistent); the failure is
/// diagnosed and never affects sibling resolutions.
pub(crate) fn resolve_quantity(
    population: &Population,
    units: &UnitPopulation,
    id: QuantityId,
    queue: &mut DiagnosticQueue,
) -> Option<ResolvedQuantity> {
    let decl = population.get(id)?;
    let Some(chain) = population.chain(id) else {
        queue.push(Diagnostic::error(DiagnosticKind::UnresolvedAncestor, id));
        return None;
    };

    let root = chain.last().copied()?;
    let Some(root_decl) = population.get(root) else {
        queue.push(Diagnostic::error(DiagnosticKind::UnresolvedAncestor, id));
        return None;
    };
    let Some(unit_id) = root_decl.unit else {
        queue.push(Diagnostic::error(DiagnosticKind::UnresolvedUnit, id));
        return None;
    };
    let Some(unit) = units.get(unit_id) else {
        queue.push(
            Diagnostic::error(DiagnosticKind::UnresolvedUnit, id)
                .with_context(DiagnosticContext::UnknownUnit { unit: unit_id }),
        );
        return None;
    };

    let dimension = search(population, chain, |d| d.dimension);
    let scalar = search(population, chain, |d| d.scalar);

    let implement_sum = search(population, chain, |d| d.implement_sum.as_bool()).unwrap_or(true);
    let implement_difference =
        search(population, chain, |d| d.implement_difference.as_bool()).unwrap_or(true);

    let mut difference = search(population, chain, |d| d.difference);
    let derivations = collect(population, chain, Facet::Derivations, derivations_of);
    let constants = collect(population, chain, Facet::Constants, constants_of);
    let mut conversions = collect(population, chain, Facet::Conversions, conversions_of);
    let operations = collect(population, chain, Facet::Operations, operations_of);
    let processes = collect(population, chain, Facet::Processes, processes_of);

    if decl.kind.is_group_member() {
        if let Some(member_dimension) = dimension {
            // A difference naming a group maps to the member of this
            // member's dimension.
            if let Some(target) = difference {
                if let Some(members) = population.group_members(target) {
                    difference = members.get(member_dimension);
                    if difference.is_none() {
                        queue.push(
                            Diagnostic::error(
                                DiagnosticKind::VectorGroupLacksMemberOfDimension,
                                id,
                            )
                            .with_context(DiagnosticContext::MissingDimension {
                                group: target,
                                dimension: member_dimension,
                            }),
                        );
                    }
                }
            }

            conversions = map_member_conversions(
                population,
                id,
                member_dimension,
                conversions,
                queue,
            );
        }
    }

    Some(ResolvedQuantity {
        identity: id,
        kind: decl.kind,
        unit: unit_id,
        dimension,
        scalar,
        included_unit_instances: resolve_included_units(population, unit, id, queue),
        default_unit_instance: search(population, chain, |d| d.default_unit_name),
        default_unit_symbol: search(population, chain, |d| d.default_unit_symbol),
        implement_sum,
        implement_difference,
        difference,
        derivations,
        constants,
        conversions,
        operations,
        processes,
        reciprocal: search(population, chain, |d| d.reciprocal),
        square: search(population, chain, |d| d.square),
        cube: search(population, chain, |d| d.cube),
        square_root: search(population, chain, |d| d.square_root),
        cube_root: search(population, chain, |d| d.cube_root),
    })
}

/// First defined value walking from the type itself toward the root.
fn search<T>(
    population: &Population,
    chain: &[QuantityId],
    extract: impl Fn(&QuantityDeclaration) -> Option<T>,
) -> Option<T> {
    chain
        .iter()
        .find_map(|&id| population.get(id).and_then(&extract))
}

/// Concatenate a facet across the chain, defined-type first, stopping
/// at the first step that does not inherit the facet.
fn collect<T: Clone>(
    population: &Population,
    chain: &[QuantityId],
    facet: Facet,
    extract: fn(&QuantityDeclaration) -> &[T],
) -> Vec<T> {
    let mut items = Vec::new();
    for (step, &id) in chain.iter().enumerate() {
        let Some(decl) = population.get(id) else {
            break;
        };
        items.extend_from_slice(extract(decl));
        let derived = step + 1 < chain.len();
        if derived && !decl.inherit.resolve(facet) {
            break;
        }
    }
    items
}

fn derivations_of(decl: &QuantityDeclaration) -> &[DerivationRule] {
    &decl.derivations
}

fn constants_of(decl: &QuantityDeclaration) -> &[QuantityConstant] {
    &decl.constants
}

fn conversions_of(decl: &QuantityDeclaration) -> &[QuantityConversion] {
    &decl.conversions
}

fn operations_of(decl: &QuantityDeclaration) -> &[QuantityOperation] {
    &decl.operations
}

fn processes_of(decl: &QuantityDeclaration) -> &[QuantityProcess] {
    &decl.processes
}

/// Map conversion targets naming a group to that group's member of the
/// member's dimension; unmappable targets are dropped with a
/// diagnostic, and a conversion left without targets is dropped whole.
fn map_member_conversions(
    population: &Population,
    id: QuantityId,
    dimension: Dimension,
    conversions: Vec<QuantityConversion>,
    queue: &mut DiagnosticQueue,
) -> Vec<QuantityConversion> {
    let mut mapped = Vec::with_capacity(conversions.len());
    for conversion in conversions {
        let mut targets: SmallVec<[QuantityId; 2]> = SmallVec::new();
        for &target in &conversion.targets {
            let Some(members) = population.group_members(target) else {
                targets.push(target);
                continue;
            };
            match members.get(dimension) {
                Some(member) => targets.push(member),
                None => {
                    queue.push(
                        Diagnostic::error(DiagnosticKind::VectorGroupLacksMemberOfDimension, id)
                            .with_context(DiagnosticContext::MissingDimension {
                                group: target,
                                dimension,
                            }),
                    );
                }
            }
        }
        if !targets.is_empty() {
            mapped.push(QuantityConversion {
                targets,
                direction: conversion.direction,
            });
        }
    }
    mapped
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use metron_ir::{
        DeclarationStore, QuantityDeclaration, StringInterner, UnitDefinition, UnitId,
        UnitInstance,
    };
    use pretty_assertions::assert_eq;

    use super::*;

    struct Fixture {
        interner: StringInterner,
        units: UnitPopulation,
        unit: UnitId,
    }

    impl Fixture {
        fn new() -> Self {
            let interner = StringInterner::new();
            let unit = UnitId::of(&interner, "units::Length");
            let definition = UnitDefinition::new(unit)
                .with_instance(UnitInstance::new(interner.intern("Metre")))
                .with_instance(UnitInstance::new(interner.intern("Kilometre")));
            let units = UnitPopulation::new().with_unit(definition);
            Fixture {
                interner,
                units,
                unit,
            }
        }

        fn resolve(
            &self,
            decls: Vec<QuantityDeclaration>,
            id: QuantityId,
        ) -> (Option<ResolvedQuantity>, Vec<Diagnostic>) {
            let store = DeclarationStore::new(decls);
            let mut queue = DiagnosticQueue::new();
            let population = Population::build(&store, &self.interner, &mut queue);
            let resolved = resolve_quantity(&population, &self.units, id, &mut queue);
            (resolved, queue.flush())
        }
    }

    #[test]
    fn test_default_unit_short_circuits_to_root() {
        let fixture = Fixture::new();
        let metre = fixture.interner.intern("Metre");
        let distance = QuantityId::of(&fixture.interner, "Distance");
        let altitude = QuantityId::of(&fixture.interner, "Altitude");
        let ceiling = QuantityId::of(&fixture.interner, "Ceiling");

        let decls = vec![
            QuantityDeclaration::scalar_base(distance, fixture.unit).with_default_unit(metre),
            QuantityDeclaration::scalar_specialization(altitude, distance),
            QuantityDeclaration::scalar_specialization(ceiling, altitude),
        ];

        let (resolved, diagnostics) = fixture.resolve(decls, ceiling);
        let resolved = resolved.unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(resolved.default_unit_instance, Some(metre));
        assert_eq!(resolved.unit, fixture.unit);
    }

    #[test]
    fn test_default_unit_overridden_midway() {
        let fixture = Fixture::new();
        let metre = fixture.interner.intern("Metre");
        let kilometre = fixture.interner.intern("Kilometre");
        let distance = QuantityId::of(&fixture.interner, "Distance");
        let altitude = QuantityId::of(&fixture.interner, "Altitude");
        let ceiling = QuantityId::of(&fixture.interner, "Ceiling");

        let decls = vec![
            QuantityDeclaration::scalar_base(distance, fixture.unit).with_default_unit(metre),
            QuantityDeclaration::scalar_specialization(altitude, distance)
                .with_default_unit(kilometre),
            QuantityDeclaration::scalar_specialization(ceiling, altitude),
        ];

        let (resolved, _) = fixture.resolve(decls, ceiling);
        assert_eq!(resolved.unwrap().default_unit_instance, Some(kilometre));
    }

    #[test]
    fn test_sum_difference_default_true() {
        let fixture = Fixture::new();
        let distance = QuantityId::of(&fixture.interner, "Distance");
        let decls = vec![QuantityDeclaration::scalar_base(distance, fixture.unit)];

        let (resolved, _) = fixture.resolve(decls, distance);
        let resolved = resolved.unwrap();
        assert!(resolved.implement_sum);
        assert!(resolved.implement_difference);
        assert_eq!(resolved.difference, None);
    }

    #[test]
    fn test_sum_flag_inherited_from_ancestor() {
        let fixture = Fixture::new();
        let distance = QuantityId::of(&fixture.interner, "Distance");
        let altitude = QuantityId::of(&fixture.interner, "Altitude");

        let decls = vec![
            QuantityDeclaration::scalar_base(distance, fixture.unit).with_implement_sum(false),
            QuantityDeclaration::scalar_specialization(altitude, distance),
        ];

        let (resolved, _) = fixture.resolve(decls, altitude);
        assert!(!resolved.unwrap().implement_sum);
    }

    #[test]
    fn test_constants_not_inherited_by_default() {
        let fixture = Fixture::new();
        let metre = fixture.interner.intern("Metre");
        let distance = QuantityId::of(&fixture.interner, "Distance");
        let altitude = QuantityId::of(&fixture.interner, "Altitude");
        let everest = fixture.interner.intern("Everest");

        let decls = vec![
            QuantityDeclaration::scalar_base(distance, fixture.unit)
                .with_constant(QuantityConstant::new(everest, metre, 8848.0)),
            QuantityDeclaration::scalar_specialization(altitude, distance),
        ];

        let (resolved, _) = fixture.resolve(decls, altitude);
        assert!(resolved.unwrap().constants.is_empty());
    }

    #[test]
    fn test_constants_inherited_when_enabled() {
        let fixture = Fixture::new();
        let metre = fixture.interner.intern("Metre");
        let distance = QuantityId::of(&fixture.interner, "Distance");
        let altitude = QuantityId::of(&fixture.interner, "Altitude");
        let everest = fixture.interner.intern("Everest");

        let decls = vec![
            QuantityDeclaration::scalar_base(distance, fixture.unit)
                .with_constant(QuantityConstant::new(everest, metre, 8848.0)),
            QuantityDeclaration::scalar_specialization(altitude, distance)
                .with_inherit(Facet::Constants, true),
        ];

        let (resolved, _) = fixture.resolve(decls, altitude);
        assert_eq!(resolved.unwrap().constants.len(), 1);
    }

    #[test]
    fn test_derivations_defined_first_then_ancestor_order() {
        let fixture = Fixture::new();
        let time = QuantityId::of(&fixture.interner, "Time");
        let distance = QuantityId::of(&fixture.interner, "Distance");
        let altitude = QuantityId::of(&fixture.interner, "Altitude");

        let base_rule = DerivationRule::new("{0} * {1}", [time, time]);
        let leaf_rule = DerivationRule::new("{0} / {1}", [distance, time]);

        let decls = vec![
            QuantityDeclaration::scalar_base(distance, fixture.unit)
                .with_derivation(base_rule.clone()),
            QuantityDeclaration::scalar_specialization(altitude, distance)
                .with_derivation(leaf_rule.clone()),
        ];

        let (resolved, _) = fixture.resolve(decls, altitude);
        assert_eq!(resolved.unwrap().derivations, vec![leaf_rule, base_rule]);
    }

    #[test]
    fn test_derivation_inheritance_disabled_keeps_own_items() {
        let fixture = Fixture::new();
        let time = QuantityId::of(&fixture.interner, "Time");
        let distance = QuantityId::of(&fixture.interner, "Distance");
        let altitude = QuantityId::of(&fixture.interner, "Altitude");

        let base_rule = DerivationRule::new("{0} * {1}", [time, time]);
        let leaf_rule = DerivationRule::new("{0} / {1}", [distance, time]);

        let decls = vec![
            QuantityDeclaration::scalar_base(distance, fixture.unit).with_derivation(base_rule),
            QuantityDeclaration::scalar_specialization(altitude, distance)
                .with_inherit(Facet::Derivations, false)
                .with_derivation(leaf_rule.clone()),
        ];

        let (resolved, _) = fixture.resolve(decls, altitude);
        assert_eq!(resolved.unwrap().derivations, vec![leaf_rule]);
    }

    #[test]
    fn test_conversions_follow_derivations_flag() {
        let fixture = Fixture::new();
        let distance = QuantityId::of(&fixture.interner, "Distance");
        let width = QuantityId::of(&fixture.interner, "Width");
        let altitude = QuantityId::of(&fixture.interner, "Altitude");

        let decls = vec![
            QuantityDeclaration::scalar_base(distance, fixture.unit)
                .with_conversion(QuantityConversion::new([width])),
            // Disabling derivations also stops unset conversions.
            QuantityDeclaration::scalar_specialization(altitude, distance)
                .with_inherit(Facet::Derivations, false),
        ];

        let (resolved, _) = fixture.resolve(decls, altitude);
        assert!(resolved.unwrap().conversions.is_empty());
    }

    #[test]
    fn test_power_relations_searched_up_chain() {
        let fixture = Fixture::new();
        let area = QuantityId::of(&fixture.interner, "Area");
        let distance = QuantityId::of(&fixture.interner, "Distance");
        let altitude = QuantityId::of(&fixture.interner, "Altitude");

        let decls = vec![
            QuantityDeclaration::scalar_base(distance, fixture.unit).with_square(area),
            QuantityDeclaration::scalar_specialization(altitude, distance),
        ];

        let (resolved, _) = fixture.resolve(decls, altitude);
        let resolved = resolved.unwrap();
        assert_eq!(resolved.square, Some(area));
        assert_eq!(resolved.reciprocal, None);
        assert_eq!(resolved.cube_root, None);
    }

    #[test]
    fn test_unknown_unit_yields_no_result() {
        let fixture = Fixture::new();
        let ghost_unit = UnitId::of(&fixture.interner, "units::Ghost");
        let distance = QuantityId::of(&fixture.interner, "Distance");

        let decls = vec![QuantityDeclaration::scalar_base(distance, ghost_unit)];

        let (resolved, diagnostics) = fixture.resolve(decls, distance);
        assert!(resolved.is_none());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnresolvedUnit);
    }

    #[test]
    fn test_member_difference_mapped_to_dimension() {
        let fixture = Fixture::new();
        let position = QuantityId::of(&fixture.interner, "Position");
        let offset = QuantityId::of(&fixture.interner, "Offset");
        let position3 = QuantityId::of(&fixture.interner, "Position3");
        let offset3 = QuantityId::of(&fixture.interner, "Offset3");

        let decls = vec![
            QuantityDeclaration::group_base(position, fixture.unit).with_difference(offset),
            QuantityDeclaration::group_base(offset, fixture.unit),
            QuantityDeclaration::group_member(position3, position, 3),
            QuantityDeclaration::group_member(offset3, offset, 3),
        ];

        let (resolved, diagnostics) = fixture.resolve(decls, position3);
        assert!(diagnostics.is_empty());
        assert_eq!(resolved.unwrap().difference, Some(offset3));
    }

    #[test]
    fn test_member_difference_missing_dimension_diagnosed() {
        let fixture = Fixture::new();
        let position = QuantityId::of(&fixture.interner, "Position");
        let offset = QuantityId::of(&fixture.interner, "Offset");
        let position2 = QuantityId::of(&fixture.interner, "Position2");
        let offset3 = QuantityId::of(&fixture.interner, "Offset3");

        // Offset has a 3D member only; Position2 demands 2D.
        let decls = vec![
            QuantityDeclaration::group_base(position, fixture.unit).with_difference(offset),
            QuantityDeclaration::group_base(offset, fixture.unit),
            QuantityDeclaration::group_member(position2, position, 2),
            QuantityDeclaration::group_member(offset3, offset, 3),
        ];

        let (resolved, diagnostics) = fixture.resolve(decls, position2);
        let resolved = resolved.unwrap();
        assert_eq!(resolved.difference, None);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].kind,
            DiagnosticKind::VectorGroupLacksMemberOfDimension
        );
    }

    #[test]
    fn test_member_conversion_targets_mapped() {
        let fixture = Fixture::new();
        let position = QuantityId::of(&fixture.interner, "Position");
        let offset = QuantityId::of(&fixture.interner, "Offset");
        let position3 = QuantityId::of(&fixture.interner, "Position3");
        let offset3 = QuantityId::of(&fixture.interner, "Offset3");

        let decls = vec![
            QuantityDeclaration::group_base(position, fixture.unit)
                .with_conversion(QuantityConversion::new([offset])),
            QuantityDeclaration::group_base(offset, fixture.unit),
            QuantityDeclaration::group_member(position3, position, 3),
            QuantityDeclaration::group_member(offset3, offset, 3),
        ];

        let (resolved, diagnostics) = fixture.resolve(decls, position3);
        assert!(diagnostics.is_empty());
        let conversions = resolved.unwrap().conversions;
        assert_eq!(conversions.len(), 1);
        assert_eq!(conversions[0].targets.as_slice(), [offset3]);
    }
}
