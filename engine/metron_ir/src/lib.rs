//! Metron IR - Data Model for Quantity Resolution
//!
//! This crate contains the core data structures consumed and produced by
//! the resolution engine:
//! - `Name` and `StringInterner` for interned identifiers
//! - `QuantityId` / `UnitId` type identities
//! - `QuantityDeclaration` and the seven declaration kinds
//! - Facet records (derivations, constants, conversions, operations,
//!   processes) and the inheritance flags governing them
//! - Unit definitions and the unit population
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: strings become `Name(u32)`, type identities
//!   become `QuantityId`/`UnitId` wrappers over a `Name`
//! - **Identities, not pointers**: parent references are stored as
//!   identities and resolved through population lookup, so specialization
//!   chains are plain data with no ownership cycles
//! - **Immutable inputs**: a `QuantityDeclaration` is built once by the
//!   declaration reader and never mutated by the engine
//!
//! Types that contain floats store them as u64 bits for Hash compatibility.

mod decl;
mod dimension;
mod facets;
mod identity;
mod interner;
mod name;
mod toggle;
mod unit;

pub use decl::{DeclarationStore, KindFamily, QuantityDeclaration, QuantityKind};
pub use dimension::Dimension;
pub use facets::{
    ConversionDirection, DerivationOperator, DerivationRule, OperandPosition, QuantityConstant,
    QuantityConversion, QuantityOperation, QuantityProcess, UnitInstanceList,
};
pub use identity::{QuantityId, UnitId};
pub use interner::{InternError, SharedInterner, StringInterner};
pub use name::Name;
pub use toggle::{Facet, FacetSet, InheritFlags, Toggle};
pub use unit::{UnitDefinition, UnitInstance, UnitPopulation};
