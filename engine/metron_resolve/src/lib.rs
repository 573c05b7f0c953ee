//! Metron Resolve - Inheritance Resolution Engine
//!
//! Resolves a closed population of quantity declarations into
//! fully-materialized definitions:
//!
//! 1. [`Population::build`] partitions declarations, rejects
//!    duplicates, assigns every derived type its root base by
//!    fixed-point iteration, attaches group members to their group's
//!    dimension map, and precomputes ancestor chains.
//! 2. Facet resolution walks each chain, merging inherited facets
//!    (unit-instance sets by inclusion/exclusion algebra, accumulated
//!    derivations/constants/conversions, short-circuit defaults).
//! 3. [`build_operator_index`] expands defined derivation rules into
//!    primitive operator facts and reverse-indexes them by operand.
//!
//! The whole engine is a pure computation over immutable inputs: the
//! population snapshot is built once and then only read, so per-type
//! resolution runs in parallel. Malformed input never panics or
//! aborts; every anomaly becomes one structured diagnostic and the
//! offending declaration is excluded from the output.
//!
//! ```
//! use metron_ir::{
//!     DeclarationStore, QuantityDeclaration, QuantityId, StringInterner, UnitDefinition,
//!     UnitId, UnitInstance, UnitPopulation,
//! };
//!
//! let interner = StringInterner::new();
//! let length = UnitId::of(&interner, "units::Length");
//! let units = UnitPopulation::new().with_unit(
//!     UnitDefinition::new(length)
//!         .with_instance(UnitInstance::new(interner.intern("Metre"))),
//! );
//!
//! let distance = QuantityId::of(&interner, "Distance");
//! let store = DeclarationStore::new(vec![QuantityDeclaration::scalar_base(
//!     distance, length,
//! )]);
//!
//! let resolution = metron_resolve::resolve(&store, &units, &interner);
//! assert!(resolution.diagnostics.is_empty());
//! assert!(resolution.get(distance).is_some());
//! ```

mod inherit;
mod operators;
mod population;
mod resolved;
mod units;

use indexmap::{IndexMap, IndexSet};
use rayon::prelude::*;

use metron_diagnostic::{Diagnostic, DiagnosticQueue};
use metron_ir::{DeclarationStore, QuantityId, StringInterner, UnitPopulation};

pub use operators::{build_operator_index, OperatorDerivation};
pub use population::{ChainError, GroupMembers, Population};
pub use resolved::ResolvedQuantity;

/// The immutable output of one resolution pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Fully resolved types, in declaration order. Contains only the
    /// types that resolved without being dropped.
    pub quantities: IndexMap<QuantityId, ResolvedQuantity>,
    /// Per-group dimension maps.
    pub groups: IndexMap<QuantityId, GroupMembers>,
    /// Reverse index of operator facts by operand type.
    pub operator_index: IndexMap<QuantityId, IndexSet<OperatorDerivation>>,
    /// Every diagnostic emitted during the pass, in emission order.
    pub diagnostics: Vec<Diagnostic>,
}

impl Resolution {
    pub fn get(&self, id: QuantityId) -> Option<&ResolvedQuantity> {
        self.quantities.get(&id)
    }

    /// Operator facts referencing a type as an operand.
    pub fn operator_derivations(&self, id: QuantityId) -> Option<&IndexSet<OperatorDerivation>> {
        self.operator_index.get(&id)
    }

    pub fn diagnostics_for(&self, id: QuantityId) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.quantity == id)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Resolve a declaration store against a unit population.
#[tracing::instrument(level = "debug", skip_all)]
pub fn resolve(
    store: &DeclarationStore,
    units: &UnitPopulation,
    interner: &StringInterner,
) -> Resolution {
    resolve_with_interrupt(store, units, interner, &|| false)
}

/// Resolve with a cooperative interrupt, checked once per type.
///
/// Interrupted types are simply absent from the output; results for
/// types resolved before the interrupt remain valid.
#[tracing::instrument(level = "debug", skip_all)]
pub fn resolve_with_interrupt(
    store: &DeclarationStore,
    units: &UnitPopulation,
    interner: &StringInterner,
    interrupt: &(dyn Fn() -> bool + Sync),
) -> Resolution {
    let mut queue = DiagnosticQueue::new();
    let population = Population::build(store, interner, &mut queue);

    let ids: Vec<QuantityId> = population.ids().collect();
    let outcomes: Vec<(Option<ResolvedQuantity>, DiagnosticQueue)> = ids
        .par_iter()
        .map(|&id| {
            if interrupt() {
                return (None, DiagnosticQueue::new());
            }
            let mut local = DiagnosticQueue::new();
            let resolved = inherit::resolve_quantity(&population, units, id, &mut local);
            (resolved, local)
        })
        .collect();

    // Merge per-type outcomes sequentially, in population order, so
    // the output is deterministic regardless of scheduling.
    let mut quantities = IndexMap::new();
    for (resolved, local) in outcomes {
        queue.absorb(local);
        if let Some(resolved) = resolved {
            quantities.insert(resolved.identity, resolved);
        }
    }

    let operator_index = operators::build_operator_index(&population);
    let groups = population.groups().clone();

    tracing::debug!(
        resolved = quantities.len(),
        diagnostics = queue.len(),
        "resolution complete"
    );

    Resolution {
        quantities,
        groups,
        operator_index,
        diagnostics: queue.flush(),
    }
}
