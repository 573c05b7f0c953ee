//! Population building.
//!
//! Turns the raw declaration store into a read-only snapshot that the
//! resolver components can query randomly: per-kind dictionaries,
//! root-base assignments for every derived type, per-group dimension
//! maps, and precomputed ancestor chains.
//!
//! # Design
//!
//! - Declarations live in an arena `Vec`; every cross-reference is an
//!   identity resolved through map lookup, so cycle detection is a
//!   seen-set check and chain walking is bounded by population size.
//! - Root assignment is a fixed-point iteration over the still
//!   unassigned specializations: each pass adopts the root already
//!   found for the parent. A pass that assigns nothing while
//!   candidates remain means those candidates are cyclic or dangling.
//! - Malformed input never aborts the build; each anomaly becomes one
//!   diagnostic and the offending declaration is excluded from the
//!   snapshot that flows onward.

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use metron_diagnostic::{Diagnostic, DiagnosticContext, DiagnosticKind, DiagnosticQueue};
use metron_ir::{
    DeclarationStore, Dimension, QuantityDeclaration, QuantityId, QuantityKind, StringInterner,
};

/// Failure walking a specialization chain.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The chain ends at a missing declaration or a base of the wrong
    /// kind family.
    #[error("specialization chain does not terminate at a base")]
    MissingRoot { chain: Vec<QuantityId> },
    /// The chain revisits a declaration.
    #[error("specialization chain forms a cycle")]
    Cycle { chain: Vec<QuantityId> },
}

impl ChainError {
    fn into_context(self) -> DiagnosticContext {
        match self {
            ChainError::MissingRoot { chain } => DiagnosticContext::UnresolvedChain {
                chain,
                cyclic: false,
            },
            ChainError::Cycle { chain } => DiagnosticContext::UnresolvedChain {
                chain,
                cyclic: true,
            },
        }
    }
}

/// The members of one vector group, keyed by dimension.
///
/// At most one member per dimension; a collision is diagnosed during
/// building and the first-seen member is kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupMembers {
    pub(crate) by_dimension: IndexMap<Dimension, QuantityId>,
}

impl GroupMembers {
    /// The member registered for a dimension.
    pub fn get(&self, dimension: Dimension) -> Option<QuantityId> {
        self.by_dimension.get(&dimension).copied()
    }

    /// Registered dimensions, in member declaration order.
    pub fn dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        self.by_dimension.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, QuantityId)> + '_ {
        self.by_dimension.iter().map(|(&d, &id)| (d, id))
    }

    pub fn len(&self) -> usize {
        self.by_dimension.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_dimension.is_empty()
    }
}

const KIND_COUNT: usize = 7;

const fn kind_slot(kind: QuantityKind) -> usize {
    match kind {
        QuantityKind::ScalarBase => 0,
        QuantityKind::ScalarSpecialization => 1,
        QuantityKind::VectorBase => 2,
        QuantityKind::VectorSpecialization => 3,
        QuantityKind::GroupBase => 4,
        QuantityKind::GroupSpecialization => 5,
        QuantityKind::GroupMember => 6,
    }
}

/// The read-only population snapshot.
///
/// Built once, then shared by reference with every resolver component;
/// nothing mutates it afterwards, which is what licenses resolving
/// independent types in parallel.
#[derive(Debug)]
pub struct Population {
    /// Declaration arena, in input order, duplicates excluded.
    decls: Vec<QuantityDeclaration>,
    /// Surviving identities to arena index.
    by_identity: FxHashMap<QuantityId, usize>,
    /// Surviving identities in declaration order.
    order: Vec<QuantityId>,
    /// Per-kind dictionaries over the survivors.
    by_kind: [IndexMap<QuantityId, usize>; KIND_COUNT],
    /// Root base of every surviving type (bases map to themselves).
    roots: FxHashMap<QuantityId, QuantityId>,
    /// Ancestor chain (self first, root last) of every surviving type.
    chains: FxHashMap<QuantityId, Vec<QuantityId>>,
    /// Dimension maps of every surviving group.
    groups: IndexMap<QuantityId, GroupMembers>,
}

impl Population {
    /// Build the population snapshot from raw declarations.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn build(
        store: &DeclarationStore,
        interner: &StringInterner,
        queue: &mut DiagnosticQueue,
    ) -> Population {
        Builder::new(store, interner, queue).finish()
    }

    pub fn get(&self, id: QuantityId) -> Option<&QuantityDeclaration> {
        self.by_identity.get(&id).map(|&idx| &self.decls[idx])
    }

    pub fn contains(&self, id: QuantityId) -> bool {
        self.by_identity.contains_key(&id)
    }

    /// Surviving identities, in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = QuantityId> + '_ {
        self.order.iter().copied()
    }

    /// Surviving declarations, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &QuantityDeclaration> {
        self.order.iter().filter_map(move |id| self.get(*id))
    }

    /// Surviving declarations of one kind, in declaration order.
    pub fn of_kind(&self, kind: QuantityKind) -> impl Iterator<Item = &QuantityDeclaration> {
        self.by_kind[kind_slot(kind)]
            .values()
            .map(move |&idx| &self.decls[idx])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The root (non-specialized) ancestor of a type. Bases are their
    /// own root.
    pub fn root_of(&self, id: QuantityId) -> Option<QuantityId> {
        self.roots.get(&id).copied()
    }

    /// The precomputed ancestor chain of a type: itself first, the
    /// root base last.
    pub fn chain(&self, id: QuantityId) -> Option<&[QuantityId]> {
        self.chains.get(&id).map(Vec::as_slice)
    }

    /// Dimension maps of every surviving group, keyed by group identity.
    pub fn groups(&self) -> &IndexMap<QuantityId, GroupMembers> {
        &self.groups
    }

    pub fn group_members(&self, group: QuantityId) -> Option<&GroupMembers> {
        self.groups.get(&group)
    }
}

struct Builder<'a> {
    interner: &'a StringInterner,
    queue: &'a mut DiagnosticQueue,
    decls: Vec<QuantityDeclaration>,
    by_identity: FxHashMap<QuantityId, usize>,
    alive: Vec<bool>,
    roots: FxHashMap<QuantityId, QuantityId>,
    groups: IndexMap<QuantityId, GroupMembers>,
}

impl<'a> Builder<'a> {
    fn new(
        store: &DeclarationStore,
        interner: &'a StringInterner,
        queue: &'a mut DiagnosticQueue,
    ) -> Self {
        let mut builder = Builder {
            interner,
            queue,
            decls: Vec::with_capacity(store.len()),
            by_identity: FxHashMap::default(),
            alive: Vec::with_capacity(store.len()),
            roots: FxHashMap::default(),
            groups: IndexMap::new(),
        };
        builder.partition(store);
        builder.validate_dimensions();
        builder.assign_roots();
        builder.populate_groups();
        builder.precompute_chains();
        builder
    }

    /// Stage 1: per-kind partitioning with duplicate rejection.
    ///
    /// Any second declaration of an identity is rejected, whether the
    /// kinds match or not; the first-seen declaration wins.
    fn partition(&mut self, store: &DeclarationStore) {
        for decl in store {
            if let Some(&existing) = self.by_identity.get(&decl.identity) {
                self.queue.push(
                    Diagnostic::error(DiagnosticKind::DuplicateTypeDeclaration, decl.identity)
                        .with_context(DiagnosticContext::DuplicateOf {
                            existing: self.decls[existing].kind,
                        }),
                );
                continue;
            }
            self.by_identity.insert(decl.identity, self.decls.len());
            self.decls.push(decl.clone());
            self.alive.push(true);
        }
    }

    /// Stage 2: dimension validation for vector bases and group members.
    fn validate_dimensions(&mut self) {
        for idx in 0..self.decls.len() {
            let decl = &self.decls[idx];
            match decl.dimension {
                None if decl.kind.requires_dimension() => {
                    self.queue.push(Diagnostic::error(
                        DiagnosticKind::MissingOrInvalidVectorDimension,
                        decl.identity,
                    ));
                    self.alive[idx] = false;
                }
                Some(declared) => {
                    let path = decl.identity.lookup(self.interner);
                    let implied = Dimension::implied_by_name(path);
                    if implied.is_some_and(|implied| implied != declared) {
                        self.queue.push(
                            Diagnostic::error(
                                DiagnosticKind::VectorNameAndDimensionConflict,
                                decl.identity,
                            )
                            .with_context(DiagnosticContext::DimensionMismatch {
                                declared: Some(declared),
                                implied,
                            }),
                        );
                        self.alive[idx] = false;
                    }
                }
                None => {}
            }
        }
    }

    /// Stage 3: root assignment by fixed-point iteration.
    ///
    /// Seeds every surviving base with itself, then repeatedly adopts
    /// the parent's root for still-unassigned specializations. A pass
    /// with no progress leaves exactly the cyclic and dangling chains;
    /// each gets one diagnostic and is dropped, not retried.
    fn assign_roots(&mut self) {
        for (idx, decl) in self.decls.iter().enumerate() {
            if self.alive[idx] && decl.kind.is_base() {
                self.roots.insert(decl.identity, decl.identity);
            }
        }

        let mut unassigned: Vec<usize> = (0..self.decls.len())
            .filter(|&idx| self.alive[idx] && self.decls[idx].kind.is_specialization())
            .collect();

        loop {
            let before = unassigned.len();
            unassigned.retain(|&idx| {
                let decl = &self.decls[idx];
                let Some(original) = decl.original else {
                    return true;
                };
                let Some(&root) = self.roots.get(&original) else {
                    return true;
                };
                let root_matches = self
                    .by_identity
                    .get(&root)
                    .is_some_and(|&r| self.decls[r].kind.family() == decl.kind.family());
                if root_matches {
                    self.roots.insert(decl.identity, root);
                    false
                } else {
                    true
                }
            });
            if unassigned.len() == before {
                break;
            }
        }

        // Diagnose every failure against the pre-drop state, so each
        // member of a cycle reports the cycle rather than a dangling
        // chain through an already-dropped sibling.
        let failures: Vec<(usize, ChainError)> = unassigned
            .iter()
            .map(|&idx| {
                let identity = self.decls[idx].identity;
                let err = match self.try_chain(identity) {
                    Err(err) => err,
                    // The fixed point said no root; a walkable chain
                    // here would be an internal inconsistency, so
                    // report what was walked.
                    Ok(chain) => ChainError::MissingRoot { chain },
                };
                (idx, err)
            })
            .collect();
        let dropped = failures.len();
        for (idx, err) in failures {
            let identity = self.decls[idx].identity;
            self.queue.push(
                Diagnostic::error(DiagnosticKind::QuantityGroupMissingRoot, identity)
                    .with_context(err.into_context()),
            );
            self.alive[idx] = false;
        }

        tracing::debug!(
            roots = self.roots.len(),
            dropped,
            "root assignment complete"
        );
    }

    /// Stage 4: group population.
    ///
    /// Every surviving group gets a (possibly empty) dimension map;
    /// members of unknown or dropped groups are dropped, as are
    /// members colliding on a dimension (first one wins). Surviving
    /// members then adopt their group's root.
    fn populate_groups(&mut self) {
        for (idx, decl) in self.decls.iter().enumerate() {
            if self.alive[idx]
                && matches!(
                    decl.kind,
                    QuantityKind::GroupBase | QuantityKind::GroupSpecialization
                )
            {
                self.groups.insert(decl.identity, GroupMembers::default());
            }
        }

        for idx in 0..self.decls.len() {
            if !self.alive[idx] || !self.decls[idx].kind.is_group_member() {
                continue;
            }
            let identity = self.decls[idx].identity;
            let (Some(owner), Some(dimension)) =
                (self.decls[idx].original, self.decls[idx].dimension)
            else {
                // Dimension presence was validated in stage 2; a member
                // without an owner cannot be attached to anything.
                self.queue
                    .push(Diagnostic::error(DiagnosticKind::UnknownVectorGroup, identity));
                self.alive[idx] = false;
                continue;
            };
            let Some(members) = self.groups.get_mut(&owner) else {
                self.queue.push(
                    Diagnostic::error(DiagnosticKind::UnknownVectorGroup, identity)
                        .with_context(DiagnosticContext::UnknownGroup { group: owner }),
                );
                self.alive[idx] = false;
                continue;
            };
            if let Some(&kept) = members.by_dimension.get(&dimension) {
                self.queue.push(
                    Diagnostic::error(DiagnosticKind::DuplicateVectorDimension, identity)
                        .with_context(DiagnosticContext::DimensionCollision {
                            group: owner,
                            dimension,
                            kept,
                        }),
                );
                self.alive[idx] = false;
                continue;
            }
            members.by_dimension.insert(dimension, identity);

            if let Some(&root) = self.roots.get(&owner) {
                self.roots.insert(identity, root);
            }
        }
    }

    /// Stage 5: precompute ancestor chains for every survivor.
    fn precompute_chains(&mut self) {
        for idx in 0..self.decls.len() {
            if !self.alive[idx] {
                continue;
            }
            let identity = self.decls[idx].identity;
            if self.try_chain(identity).is_err() {
                // Stages 3 and 4 should have dropped everything with a
                // broken chain already.
                self.queue.push(Diagnostic::error(
                    DiagnosticKind::UnresolvedAncestor,
                    identity,
                ));
                self.alive[idx] = false;
            }
        }
    }

    /// Walk the ancestor chain of a type: itself first, then each
    /// `original` link, ending at a base of the same kind family.
    fn try_chain(&self, start: QuantityId) -> Result<Vec<QuantityId>, ChainError> {
        let family = match self.lookup_alive(start) {
            Some(decl) => decl.kind.family(),
            None => {
                return Err(ChainError::MissingRoot { chain: vec![start] });
            }
        };

        let mut chain = vec![start];
        let mut seen: FxHashSet<QuantityId> = FxHashSet::default();
        seen.insert(start);
        let mut current = start;

        // Bounded by population size via the seen-set.
        loop {
            let Some(decl) = self.lookup_alive(current) else {
                return Err(ChainError::MissingRoot { chain });
            };
            if decl.kind.is_base() {
                if decl.kind.family() == family {
                    return Ok(chain);
                }
                return Err(ChainError::MissingRoot { chain });
            }
            let Some(parent) = decl.original else {
                return Err(ChainError::MissingRoot { chain });
            };
            chain.push(parent);
            if !seen.insert(parent) {
                return Err(ChainError::Cycle { chain });
            }
            current = parent;
        }
    }

    fn lookup_alive(&self, id: QuantityId) -> Option<&QuantityDeclaration> {
        let &idx = self.by_identity.get(&id)?;
        self.alive[idx].then(|| &self.decls[idx])
    }

    fn finish(mut self) -> Population {
        let mut chains: FxHashMap<QuantityId, Vec<QuantityId>> = FxHashMap::default();
        for idx in 0..self.decls.len() {
            if !self.alive[idx] {
                continue;
            }
            if let Ok(chain) = self.try_chain(self.decls[idx].identity) {
                chains.insert(self.decls[idx].identity, chain);
            }
        }

        let mut order = Vec::new();
        let mut by_identity = FxHashMap::default();
        let mut by_kind: [IndexMap<QuantityId, usize>; KIND_COUNT] = Default::default();
        for (idx, decl) in self.decls.iter().enumerate() {
            if !self.alive[idx] {
                continue;
            }
            order.push(decl.identity);
            by_identity.insert(decl.identity, idx);
            by_kind[kind_slot(decl.kind)].insert(decl.identity, idx);
        }

        self.roots.retain(|id, _| by_identity.contains_key(id));

        tracing::debug!(
            total = self.decls.len(),
            surviving = order.len(),
            groups = self.groups.len(),
            "population built"
        );

        Population {
            decls: self.decls,
            by_identity,
            order,
            by_kind,
            roots: self.roots,
            chains,
            groups: self.groups,
        }
    }
}
