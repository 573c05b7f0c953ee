//! Resolved quantity records.

use indexmap::IndexSet;

use metron_ir::{
    DerivationRule, Dimension, Name, QuantityConstant, QuantityConversion, QuantityId,
    QuantityKind, QuantityOperation, QuantityProcess, UnitId,
};

/// The fully-materialized definition of one quantity type.
///
/// All facets are merged across the ancestor chain: accumulating
/// facets are defined-first then ancestor order; short-circuit facets
/// are the nearest defined value. Power relations are `None` when
/// never defined anywhere in the chain.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolvedQuantity {
    pub identity: QuantityId,
    pub kind: QuantityKind,
    /// The root base's unit.
    pub unit: UnitId,
    pub dimension: Option<Dimension>,
    /// Associated scalar quantity, for vector kinds.
    pub scalar: Option<QuantityId>,
    /// Flat set of exposed unit instances, in unit-definition order.
    pub included_unit_instances: IndexSet<Name>,
    pub default_unit_instance: Option<Name>,
    pub default_unit_symbol: Option<Name>,
    pub implement_sum: bool,
    pub implement_difference: bool,
    pub difference: Option<QuantityId>,
    pub derivations: Vec<DerivationRule>,
    pub constants: Vec<QuantityConstant>,
    pub conversions: Vec<QuantityConversion>,
    pub operations: Vec<QuantityOperation>,
    pub processes: Vec<QuantityProcess>,
    pub reciprocal: Option<QuantityId>,
    pub square: Option<QuantityId>,
    pub cube: Option<QuantityId>,
    pub square_root: Option<QuantityId>,
    pub cube_root: Option<QuantityId>,
}

impl ResolvedQuantity {
    /// Whether a unit instance is exposed by this quantity.
    pub fn includes_unit_instance(&self, name: Name) -> bool {
        self.included_unit_instances.contains(&name)
    }
}
