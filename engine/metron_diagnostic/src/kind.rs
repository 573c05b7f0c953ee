use std::fmt;

/// Stable codes for all engine diagnostics.
///
/// Format: E#### where the first digit indicates the phase:
/// - E1xxx: population building
/// - E2xxx: unit-set resolution
/// - E3xxx: inheritance resolution
/// - E9xxx: internal/defensive checks
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DiagnosticKind {
    // Population building (E1xxx)
    /// The same identity declared more than once (any kinds).
    DuplicateTypeDeclaration,
    /// A specialization chain is cyclic or dangles without a base.
    QuantityGroupMissingRoot,
    /// Two members of one group claim the same dimension.
    DuplicateVectorDimension,
    /// A group member names a group that does not exist.
    UnknownVectorGroup,
    /// A vector base or group member without a usable dimension.
    MissingOrInvalidVectorDimension,
    /// Declared dimension disagrees with the name-implied dimension.
    VectorNameAndDimensionConflict,

    // Unit-set resolution (E2xxx)
    /// Inclusion and exclusion lists both non-empty at one step.
    ContradictoryUnitInclusionExclusion,
    /// A root base names a unit absent from the unit population.
    UnresolvedUnit,

    // Inheritance resolution (E3xxx)
    /// A reference demands a dimension absent from the target group.
    VectorGroupLacksMemberOfDimension,

    // Internal (E9xxx)
    /// An ancestor identity vanished between building and resolution.
    UnresolvedAncestor,
}

impl DiagnosticKind {
    /// Get the stable code as a string (e.g. "E1002").
    pub const fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::DuplicateTypeDeclaration => "E1001",
            DiagnosticKind::QuantityGroupMissingRoot => "E1002",
            DiagnosticKind::DuplicateVectorDimension => "E1003",
            DiagnosticKind::UnknownVectorGroup => "E1004",
            DiagnosticKind::MissingOrInvalidVectorDimension => "E1005",
            DiagnosticKind::VectorNameAndDimensionConflict => "E1006",
            DiagnosticKind::ContradictoryUnitInclusionExclusion => "E2001",
            DiagnosticKind::UnresolvedUnit => "E2002",
            DiagnosticKind::VectorGroupLacksMemberOfDimension => "E3001",
            DiagnosticKind::UnresolvedAncestor => "E9001",
        }
    }

    /// Check if this is a population-building diagnostic (E1xxx range).
    pub fn is_population_error(self) -> bool {
        self.as_str().starts_with("E1")
    }

    /// Check if this is an internal/defensive diagnostic (E9xxx range).
    pub fn is_internal(self) -> bool {
        self.as_str().starts_with("E9")
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
