//! Quantity declarations.
//!
//! One [`QuantityDeclaration`] per declared type, produced by the
//! declaration reader and never mutated afterwards. Facet lists hold
//! only what is defined directly on the type; inherited facts are
//! merged later by the resolver.

use std::fmt;

use crate::{
    DerivationRule, Dimension, InheritFlags, Name, QuantityConstant, QuantityConversion,
    QuantityId, QuantityOperation, QuantityProcess, Toggle, UnitId, UnitInstanceList,
};

/// The seven declaration kinds.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QuantityKind {
    ScalarBase,
    ScalarSpecialization,
    VectorBase,
    VectorSpecialization,
    GroupBase,
    GroupSpecialization,
    GroupMember,
}

/// Kind family: the root a specialization chain must terminate at.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KindFamily {
    Scalar,
    Vector,
    Group,
}

impl QuantityKind {
    pub const fn family(self) -> KindFamily {
        match self {
            QuantityKind::ScalarBase | QuantityKind::ScalarSpecialization => KindFamily::Scalar,
            QuantityKind::VectorBase | QuantityKind::VectorSpecialization => KindFamily::Vector,
            QuantityKind::GroupBase
            | QuantityKind::GroupSpecialization
            | QuantityKind::GroupMember => KindFamily::Group,
        }
    }

    /// Whether this kind roots a specialization chain.
    pub const fn is_base(self) -> bool {
        matches!(
            self,
            QuantityKind::ScalarBase | QuantityKind::VectorBase | QuantityKind::GroupBase
        )
    }

    /// Whether this kind has a specialization parent.
    pub const fn is_specialization(self) -> bool {
        matches!(
            self,
            QuantityKind::ScalarSpecialization
                | QuantityKind::VectorSpecialization
                | QuantityKind::GroupSpecialization
        )
    }

    pub const fn is_group_member(self) -> bool {
        matches!(self, QuantityKind::GroupMember)
    }

    /// Whether declarations of this kind must carry a dimension.
    pub const fn requires_dimension(self) -> bool {
        matches!(self, QuantityKind::VectorBase | QuantityKind::GroupMember)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            QuantityKind::ScalarBase => "scalar base",
            QuantityKind::ScalarSpecialization => "scalar specialization",
            QuantityKind::VectorBase => "vector base",
            QuantityKind::VectorSpecialization => "vector specialization",
            QuantityKind::GroupBase => "vector group base",
            QuantityKind::GroupSpecialization => "vector group specialization",
            QuantityKind::GroupMember => "vector group member",
        }
    }
}

impl fmt::Display for QuantityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable per-type attribute record.
///
/// Bases carry a `unit`; specializations and group members carry an
/// `original` (the specialization parent, or the owning group for
/// members). Everything else is optional and subject to inheritance.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct QuantityDeclaration {
    pub identity: QuantityId,
    pub kind: QuantityKind,
    pub unit: Option<UnitId>,
    pub original: Option<QuantityId>,
    pub dimension: Option<Dimension>,
    pub scalar: Option<QuantityId>,
    pub implement_sum: Toggle,
    pub implement_difference: Toggle,
    pub difference: Option<QuantityId>,
    pub default_unit_name: Option<Name>,
    pub default_unit_symbol: Option<Name>,
    pub inherit: InheritFlags,
    pub unit_inclusions: Vec<UnitInstanceList>,
    pub unit_exclusions: Vec<UnitInstanceList>,
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

impl QuantityDeclaration {
    fn empty(identity: QuantityId, kind: QuantityKind) -> Self {
        QuantityDeclaration {
            identity,
            kind,
            unit: None,
            original: None,
            dimension: None,
            scalar: None,
            implement_sum: Toggle::Unset,
            implement_difference: Toggle::Unset,
            difference: None,
            default_unit_name: None,
            default_unit_symbol: None,
            inherit: InheritFlags::new(),
            unit_inclusions: Vec::new(),
            unit_exclusions: Vec::new(),
            derivations: Vec::new(),
            constants: Vec::new(),
            conversions: Vec::new(),
            operations: Vec::new(),
            processes: Vec::new(),
            reciprocal: None,
            square: None,
            cube: None,
            square_root: None,
            cube_root: None,
        }
    }

    pub fn scalar_base(identity: QuantityId, unit: UnitId) -> Self {
        let mut decl = Self::empty(identity, QuantityKind::ScalarBase);
        decl.unit = Some(unit);
        decl
    }

    pub fn scalar_specialization(identity: QuantityId, original: QuantityId) -> Self {
        let mut decl = Self::empty(identity, QuantityKind::ScalarSpecialization);
        decl.original = Some(original);
        decl
    }

    /// `dimension` is the raw declared value; 0 is recorded as absent and
    /// later diagnosed by the population builder.
    pub fn vector_base(identity: QuantityId, unit: UnitId, dimension: u32) -> Self {
        let mut decl = Self::empty(identity, QuantityKind::VectorBase);
        decl.unit = Some(unit);
        decl.dimension = Dimension::new(dimension);
        decl
    }

    pub fn vector_specialization(identity: QuantityId, original: QuantityId) -> Self {
        let mut decl = Self::empty(identity, QuantityKind::VectorSpecialization);
        decl.original = Some(original);
        decl
    }

    pub fn group_base(identity: QuantityId, unit: UnitId) -> Self {
        let mut decl = Self::empty(identity, QuantityKind::GroupBase);
        decl.unit = Some(unit);
        decl
    }

    pub fn group_specialization(identity: QuantityId, original: QuantityId) -> Self {
        let mut decl = Self::empty(identity, QuantityKind::GroupSpecialization);
        decl.original = Some(original);
        decl
    }

    /// A member of `group` with the given raw dimension (0 = absent).
    pub fn group_member(identity: QuantityId, group: QuantityId, dimension: u32) -> Self {
        let mut decl = Self::empty(identity, QuantityKind::GroupMember);
        decl.original = Some(group);
        decl.dimension = Dimension::new(dimension);
        decl
    }

    #[must_use]
    pub fn with_scalar(mut self, scalar: QuantityId) -> Self {
        self.scalar = Some(scalar);
        self
    }

    #[must_use]
    pub fn with_implement_sum(mut self, value: bool) -> Self {
        self.implement_sum = Toggle::from_bool(value);
        self
    }

    #[must_use]
    pub fn with_implement_difference(mut self, value: bool) -> Self {
        self.implement_difference = Toggle::from_bool(value);
        self
    }

    #[must_use]
    pub fn with_difference(mut self, difference: QuantityId) -> Self {
        self.difference = Some(difference);
        self
    }

    #[must_use]
    pub fn with_default_unit(mut self, name: Name) -> Self {
        self.default_unit_name = Some(name);
        self
    }

    #[must_use]
    pub fn with_default_unit_symbol(mut self, symbol: Name) -> Self {
        self.default_unit_symbol = Some(symbol);
        self
    }

    #[must_use]
    pub fn with_inherit(mut self, facet: crate::Facet, value: bool) -> Self {
        self.inherit = self.inherit.with(facet, value);
        self
    }

    #[must_use]
    pub fn with_unit_inclusion(mut self, list: UnitInstanceList) -> Self {
        self.unit_inclusions.push(list);
        self
    }

    #[must_use]
    pub fn with_unit_exclusion(mut self, list: UnitInstanceList) -> Self {
        self.unit_exclusions.push(list);
        self
    }

    #[must_use]
    pub fn with_derivation(mut self, rule: DerivationRule) -> Self {
        self.derivations.push(rule);
        self
    }

    #[must_use]
    pub fn with_constant(mut self, constant: QuantityConstant) -> Self {
        self.constants.push(constant);
        self
    }

    #[must_use]
    pub fn with_conversion(mut self, conversion: QuantityConversion) -> Self {
        self.conversions.push(conversion);
        self
    }

    #[must_use]
    pub fn with_operation(mut self, operation: QuantityOperation) -> Self {
        self.operations.push(operation);
        self
    }

    #[must_use]
    pub fn with_process(mut self, process: QuantityProcess) -> Self {
        self.processes.push(process);
        self
    }

    #[must_use]
    pub fn with_reciprocal(mut self, id: QuantityId) -> Self {
        self.reciprocal = Some(id);
        self
    }

    #[must_use]
    pub fn with_square(mut self, id: QuantityId) -> Self {
        self.square = Some(id);
        self
    }

    #[must_use]
    pub fn with_cube(mut self, id: QuantityId) -> Self {
        self.cube = Some(id);
        self
    }

    #[must_use]
    pub fn with_square_root(mut self, id: QuantityId) -> Self {
        self.square_root = Some(id);
        self
    }

    #[must_use]
    pub fn with_cube_root(mut self, id: QuantityId) -> Self {
        self.cube_root = Some(id);
        self
    }
}

/// The immutable collection of declarations handed to the engine.
#[derive(Clone, Debug, Default)]
pub struct DeclarationStore {
    decls: Vec<QuantityDeclaration>,
}

impl DeclarationStore {
    pub fn new(decls: Vec<QuantityDeclaration>) -> Self {
        DeclarationStore { decls }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QuantityDeclaration> {
        self.decls.iter()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

impl FromIterator<QuantityDeclaration> for DeclarationStore {
    fn from_iter<T: IntoIterator<Item = QuantityDeclaration>>(iter: T) -> Self {
        DeclarationStore {
            decls: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a DeclarationStore {
    type Item = &'a QuantityDeclaration;
    type IntoIter = std::slice::Iter<'a, QuantityDeclaration>;

    fn into_iter(self) -> Self::IntoIter {
        self.decls.iter()
    }
}
