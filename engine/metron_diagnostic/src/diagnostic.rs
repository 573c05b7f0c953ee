use std::fmt;

use metron_ir::{Dimension, QuantityId, QuantityKind, UnitId};

use crate::DiagnosticKind;

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Typed payload giving a renderer enough context for a message.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum DiagnosticContext {
    #[default]
    None,
    /// The kind under which the identity was first declared.
    DuplicateOf { existing: QuantityKind },
    /// The ancestor chain that was walked, and whether it closed a cycle.
    UnresolvedChain {
        chain: Vec<QuantityId>,
        cyclic: bool,
    },
    /// A dimension collision inside a group; `kept` is the surviving member.
    DimensionCollision {
        group: QuantityId,
        dimension: Dimension,
        kept: QuantityId,
    },
    /// A group lacking a member of the demanded dimension.
    MissingDimension {
        group: QuantityId,
        dimension: Dimension,
    },
    /// Declared vs name-implied dimension disagreement.
    DimensionMismatch {
        declared: Option<Dimension>,
        implied: Option<Dimension>,
    },
    /// A group reference that resolved to nothing.
    UnknownGroup { group: QuantityId },
    /// A unit reference that resolved to nothing.
    UnknownUnit { unit: UnitId },
}

/// A structured diagnostic record.
///
/// Carries the stable kind, the offending type identity, and a typed
/// context payload; rendering text is the host's concern.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[must_use = "diagnostics should be queued or returned, not silently dropped"]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    /// The type this diagnostic is attached to.
    pub quantity: QuantityId,
    pub context: DiagnosticContext,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(kind: DiagnosticKind, quantity: QuantityId) -> Self {
        Diagnostic {
            kind,
            severity: Severity::Error,
            quantity,
            context: DiagnosticContext::None,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(kind: DiagnosticKind, quantity: QuantityId) -> Self {
        Diagnostic {
            kind,
            severity: Severity::Warning,
            quantity,
            context: DiagnosticContext::None,
        }
    }

    /// Attach a context payload.
    pub fn with_context(mut self, context: DiagnosticContext) -> Self {
        self.context = context;
        self
    }

    /// Check if this is an error (vs warning).
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] quantity #{}",
            self.severity,
            self.kind,
            self.quantity.name().raw()
        )?;
        if self.context != DiagnosticContext::None {
            write!(f, ": {:?}", self.context)?;
        }
        Ok(())
    }
}
