//! Operator-derivation indexing.
//!
//! Expands every type's *defined* (non-inherited) derivation rules
//! into primitive binary operator facts and builds the reverse index
//! mapping each operand type to the facts that reference it. Inherited
//! derivations are deliberately not expanded: the ancestor that
//! defined them already contributed the same facts to the index.

use indexmap::{IndexMap, IndexSet};

use metron_ir::{DerivationOperator, DerivationRule, QuantityId};

use crate::Population;

/// A primitive operator fact: `left op right = result`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OperatorDerivation {
    pub left: QuantityId,
    pub right: QuantityId,
    pub operator: DerivationOperator,
    pub result: QuantityId,
}

/// Build the reverse index over every type in the population.
///
/// Every population type gets an entry, possibly empty. Facts whose
/// operand lies outside the population are still indexed under the
/// operand that is known; fully foreign facts vanish silently.
#[tracing::instrument(level = "debug", skip_all)]
pub fn build_operator_index(
    population: &Population,
) -> IndexMap<QuantityId, IndexSet<OperatorDerivation>> {
    let mut index: IndexMap<QuantityId, IndexSet<OperatorDerivation>> =
        population.ids().map(|id| (id, IndexSet::new())).collect();

    for decl in population.iter() {
        for rule in &decl.derivations {
            for derivation in expand_rule(decl.identity, rule) {
                for operand in [derivation.left, derivation.right] {
                    if let Some(entry) = index.get_mut(&operand) {
                        entry.insert(derivation.clone());
                    }
                }
            }
        }
    }

    index
}

/// Expand one derivation rule into its primitive operator facts.
///
/// Only a binary pattern `{i} op {j}` over a two-element signature
/// expands; anything else is a method-only derivation carrying no
/// operator fact. A permutating rule also yields the operand-swapped
/// fact when the operator is commutative.
fn expand_rule(result: QuantityId, rule: &DerivationRule) -> Vec<OperatorDerivation> {
    let Some((left_index, operator, right_index)) = parse_binary_pattern(&rule.expression) else {
        return Vec::new();
    };
    if rule.signature.len() != 2 || left_index == right_index {
        return Vec::new();
    }
    let (Some(&left), Some(&right)) = (
        rule.signature.get(left_index),
        rule.signature.get(right_index),
    ) else {
        return Vec::new();
    };

    let mut derivations = vec![OperatorDerivation {
        left,
        right,
        operator,
        result,
    }];
    if rule.permutations && operator.is_commutative() && left != right {
        derivations.push(OperatorDerivation {
            left: right,
            right: left,
            operator,
            result,
        });
    }
    derivations
}

/// Parse `{i} op {j}` with `op` one of `+ - * /`, ignoring whitespace
/// and at most one pair of outer parentheses.
fn parse_binary_pattern(expression: &str) -> Option<(usize, DerivationOperator, usize)> {
    let cleaned: String = expression.chars().filter(|c| !c.is_whitespace()).collect();
    let mut pattern = cleaned.as_str();
    if let Some(inner) = pattern
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        if !inner.contains(['(', ')']) {
            pattern = inner;
        }
    }

    let (left, rest) = parse_placeholder(pattern)?;
    let mut chars = rest.chars();
    let operator = DerivationOperator::from_symbol(chars.next()?)?;
    let (right, tail) = parse_placeholder(chars.as_str())?;
    if !tail.is_empty() {
        return None;
    }
    Some((left, operator, right))
}

fn parse_placeholder(pattern: &str) -> Option<(usize, &str)> {
    let rest = pattern.strip_prefix('{')?;
    let close = rest.find('}')?;
    let index = rest[..close].parse().ok()?;
    Some((index, &rest[close + 1..]))
}
