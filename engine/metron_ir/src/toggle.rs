//! Tri-state toggles and facet-inheritance flags.
//!
//! Every inheritable boolean on a declaration is a tri-state
//! [`Toggle`] rather than a plain bool, so "unset" is distinguishable
//! from an explicit false and defaulting rules (including the
//! "mimic another flag" rule for conversions) are explicit, testable
//! code paths rather than accidental defaults.

use bitflags::bitflags;

/// Tri-state boolean: explicitly enabled, explicitly disabled, or unset.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Toggle {
    /// Not specified; defaulting rules apply.
    #[default]
    Unset,
    /// Explicitly enabled.
    Enabled,
    /// Explicitly disabled.
    Disabled,
}

impl Toggle {
    /// Explicit value, if one was given.
    #[inline]
    pub const fn as_bool(self) -> Option<bool> {
        match self {
            Toggle::Unset => None,
            Toggle::Enabled => Some(true),
            Toggle::Disabled => Some(false),
        }
    }

    /// Explicit value, or the given default when unset.
    #[inline]
    pub const fn unwrap_or(self, default: bool) -> bool {
        match self {
            Toggle::Unset => default,
            Toggle::Enabled => true,
            Toggle::Disabled => false,
        }
    }

    /// Wrap an explicit boolean.
    #[inline]
    pub const fn from_bool(value: bool) -> Self {
        if value {
            Toggle::Enabled
        } else {
            Toggle::Disabled
        }
    }

    /// Whether an explicit value was given.
    #[inline]
    pub const fn is_set(self) -> bool {
        !matches!(self, Toggle::Unset)
    }
}

/// One inheritable facet of a quantity declaration.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Facet {
    Derivations,
    Constants,
    Conversions,
    Units,
    Operations,
    Processes,
}

impl Facet {
    /// All facets, in a stable order.
    pub const ALL: [Facet; 6] = [
        Facet::Derivations,
        Facet::Constants,
        Facet::Conversions,
        Facet::Units,
        Facet::Operations,
        Facet::Processes,
    ];

    const fn bit(self) -> FacetSet {
        match self {
            Facet::Derivations => FacetSet::DERIVATIONS,
            Facet::Constants => FacetSet::CONSTANTS,
            Facet::Conversions => FacetSet::CONVERSIONS,
            Facet::Units => FacetSet::UNITS,
            Facet::Operations => FacetSet::OPERATIONS,
            Facet::Processes => FacetSet::PROCESSES,
        }
    }
}

bitflags! {
    /// Bitset of facets.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct FacetSet: u8 {
        const DERIVATIONS = 1 << 0;
        const CONSTANTS = 1 << 1;
        const CONVERSIONS = 1 << 2;
        const UNITS = 1 << 3;
        const OPERATIONS = 1 << 4;
        const PROCESSES = 1 << 5;
    }
}

/// Per-facet inheritance flags of one declaration.
///
/// Stored as two bitsets: which facets carry an explicit flag, and the
/// explicit values. [`InheritFlags::resolve`] applies the per-facet
/// defaults: derivations, units and operations inherit by default;
/// constants and processes do not; conversions, when unset, mimics the
/// resolved derivations flag of the same declaration.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct InheritFlags {
    explicit: FacetSet,
    values: FacetSet,
}

impl InheritFlags {
    /// All facets unset.
    pub const fn new() -> Self {
        InheritFlags {
            explicit: FacetSet::empty(),
            values: FacetSet::empty(),
        }
    }

    /// Set an explicit flag value. Builder-style.
    #[must_use]
    pub fn with(mut self, facet: Facet, value: bool) -> Self {
        self.explicit |= facet.bit();
        self.values.set(facet.bit(), value);
        self
    }

    /// The raw tri-state of a facet's flag.
    pub fn get(self, facet: Facet) -> Toggle {
        if self.explicit.contains(facet.bit()) {
            Toggle::from_bool(self.values.contains(facet.bit()))
        } else {
            Toggle::Unset
        }
    }

    /// The effective flag value after defaulting.
    pub fn resolve(self, facet: Facet) -> bool {
        match self.get(facet) {
            Toggle::Enabled => true,
            Toggle::Disabled => false,
            Toggle::Unset => match facet {
                Facet::Derivations | Facet::Units | Facet::Operations => true,
                Facet::Constants | Facet::Processes => false,
                // Unset conversions mimic the resolved derivations flag.
                Facet::Conversions => self.resolve(Facet::Derivations),
            },
        }
    }
}
