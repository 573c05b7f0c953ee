//! Facet records attached to quantity declarations.
//!
//! Each record describes one fact defined *directly on* a declaration;
//! merging with ancestor facts is the resolver's job, never done here.

use smallvec::SmallVec;

use crate::{Name, QuantityId};

/// A primitive binary operator appearing in derivations and operations.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DerivationOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl DerivationOperator {
    /// The operator's expression symbol.
    pub const fn symbol(self) -> char {
        match self {
            DerivationOperator::Add => '+',
            DerivationOperator::Subtract => '-',
            DerivationOperator::Multiply => '*',
            DerivationOperator::Divide => '/',
        }
    }

    /// Parse an expression symbol.
    pub const fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(DerivationOperator::Add),
            '-' => Some(DerivationOperator::Subtract),
            '*' => Some(DerivationOperator::Multiply),
            '/' => Some(DerivationOperator::Divide),
            _ => None,
        }
    }

    /// Whether operand order is interchangeable.
    pub const fn is_commutative(self) -> bool {
        matches!(self, DerivationOperator::Add | DerivationOperator::Multiply)
    }
}

/// One inclusion or exclusion list from a single declaration site.
///
/// A declaration may carry several lists (one per attribute site); their
/// order is preserved for diagnostics even though set algebra unions them.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitInstanceList {
    pub names: SmallVec<[Name; 4]>,
}

impl UnitInstanceList {
    pub fn new(names: impl IntoIterator<Item = Name>) -> Self {
        UnitInstanceList {
            names: names.into_iter().collect(),
        }
    }
}

/// A high-level derivation rule defined on a quantity.
///
/// The expression is an operator pattern over `{index}` placeholders
/// referring to the signature, e.g. `"{0} / {1}"` with signature
/// `[Length, Time]` on `Speed`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DerivationRule {
    pub expression: String,
    pub signature: SmallVec<[QuantityId; 2]>,
    /// Also derive operand-swapped operator facts where algebra allows.
    pub permutations: bool,
}

impl DerivationRule {
    pub fn new(expression: impl Into<String>, signature: impl IntoIterator<Item = QuantityId>) -> Self {
        DerivationRule {
            expression: expression.into(),
            signature: signature.into_iter().collect(),
            permutations: false,
        }
    }

    /// Enable operand permutations.
    #[must_use]
    pub fn with_permutations(mut self) -> Self {
        self.permutations = true;
        self
    }
}

/// A named constant defined on a quantity, anchored to a unit instance.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuantityConstant {
    pub name: Name,
    pub unit_instance: Name,
    /// Constant magnitude, stored as bits so the record is `Eq + Hash`.
    value_bits: u64,
    /// Emit the "multiples of this constant" accessor family.
    pub generate_multiples: bool,
}

impl QuantityConstant {
    pub fn new(name: Name, unit_instance: Name, value: f64) -> Self {
        QuantityConstant {
            name,
            unit_instance,
            value_bits: value.to_bits(),
            generate_multiples: false,
        }
    }

    /// The constant's magnitude in its unit instance.
    pub fn value(&self) -> f64 {
        f64::from_bits(self.value_bits)
    }

    /// Enable the multiples accessor family.
    #[must_use]
    pub fn with_multiples(mut self) -> Self {
        self.generate_multiples = true;
        self
    }
}

/// Direction of a quantity conversion.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConversionDirection {
    /// From the declaring quantity to the targets only.
    #[default]
    Forward,
    /// Both directions.
    Bidirectional,
}

/// A conversion defined on a quantity, naming the target quantities.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuantityConversion {
    pub targets: SmallVec<[QuantityId; 2]>,
    pub direction: ConversionDirection,
}

impl QuantityConversion {
    pub fn new(targets: impl IntoIterator<Item = QuantityId>) -> Self {
        QuantityConversion {
            targets: targets.into_iter().collect(),
            direction: ConversionDirection::Forward,
        }
    }

    #[must_use]
    pub fn bidirectional(mut self) -> Self {
        self.direction = ConversionDirection::Bidirectional;
        self
    }
}

/// Which operand slot the declaring quantity occupies in an operation.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperandPosition {
    #[default]
    Left,
    Right,
}

/// An operator the quantity exposes directly against another quantity.
///
/// Unlike a [`DerivationRule`], an operation is not expanded into the
/// operator-derivation reverse index; it describes a method/operator
/// surface only.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuantityOperation {
    pub operator: DerivationOperator,
    pub other: QuantityId,
    pub result: QuantityId,
    pub position: OperandPosition,
    /// Also expose the operand-swapped form.
    pub mirrored: bool,
}

impl QuantityOperation {
    pub fn new(operator: DerivationOperator, other: QuantityId, result: QuantityId) -> Self {
        QuantityOperation {
            operator,
            other,
            result,
            position: OperandPosition::Left,
            mirrored: false,
        }
    }

    #[must_use]
    pub fn on_right(mut self) -> Self {
        self.position = OperandPosition::Right;
        self
    }

    #[must_use]
    pub fn mirrored(mut self) -> Self {
        self.mirrored = true;
        self
    }
}

/// A named computed expression attached to a quantity.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuantityProcess {
    pub name: Name,
    pub expression: String,
    pub parameters: SmallVec<[QuantityId; 2]>,
}

impl QuantityProcess {
    pub fn new(
        name: Name,
        expression: impl Into<String>,
        parameters: impl IntoIterator<Item = QuantityId>,
    ) -> Self {
        QuantityProcess {
            name,
            expression: expression.into(),
            parameters: parameters.into_iter().collect(),
        }
    }
}
