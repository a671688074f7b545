//! Qualifiers, qualifier sets, and the qualifier hierarchy collaborator.
//!
//! Every concrete type carries a set of *primary qualifiers*, at most one per
//! qualifier hierarchy. Hierarchies are independent lattices; each has a
//! distinguished top element that is used to bucket qualifiers by hierarchy.
//!
//! ## Representation
//!
//! | Type | Meaning |
//! |------|---------|
//! | `HierarchyId` | Index of a hierarchy within one lattice provider |
//! | `Qualifier` | `(hierarchy, rank)`, rank 0 is the hierarchy's top |
//! | `QualifierSet` | Sorted, de-duplicated set of qualifiers |
//!
//! The hierarchy a qualifier belongs to is part of the qualifier itself, so
//! per-hierarchy replacement (`QualifierSet::replace_in_hierarchies`) needs no
//! lattice access. Ordering *within* a hierarchy is only known to a
//! `QualifierHierarchy` implementation.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt;

// =============================================================================
// Qualifier
// =============================================================================

/// Identifier of one qualifier hierarchy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HierarchyId(pub u16);

/// A qualifier value drawn from one hierarchy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Qualifier {
    pub hierarchy: HierarchyId,
    pub rank: u32,
}

impl Qualifier {
    pub const fn new(hierarchy: HierarchyId, rank: u32) -> Self {
        Self { hierarchy, rank }
    }

    /// The top element of `hierarchy`.
    pub const fn top(hierarchy: HierarchyId) -> Self {
        Self { hierarchy, rank: 0 }
    }

    pub const fn is_top(self) -> bool {
        self.rank == 0
    }
}

// =============================================================================
// QualifierSet
// =============================================================================

/// Sorted, de-duplicated set of qualifiers.
///
/// Used both for the primary qualifiers of a type and for the set of
/// hierarchy tops a constraint holds under. Most sets hold one or two
/// entries, so the storage is inline.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifierSet(SmallVec<[Qualifier; 2]>);

impl QualifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(qualifier: Qualifier) -> Self {
        let mut set = Self::new();
        set.insert(qualifier);
        set
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, qualifier: Qualifier) -> bool {
        self.0.binary_search(&qualifier).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = Qualifier> + '_ {
        self.0.iter().copied()
    }

    /// Insert `qualifier`, returning `true` if it was not present.
    pub fn insert(&mut self, qualifier: Qualifier) -> bool {
        match self.0.binary_search(&qualifier) {
            Ok(_) => false,
            Err(pos) => {
                self.0.insert(pos, qualifier);
                true
            }
        }
    }

    /// Add every member of `other` to this set.
    ///
    /// Returns `true` if at least one qualifier was added. Members already
    /// present are left untouched, so repeated unions are idempotent.
    pub fn union_with(&mut self, other: &QualifierSet) -> bool {
        let mut grew = false;
        for qualifier in other.iter() {
            grew |= self.insert(qualifier);
        }
        grew
    }

    /// The first member belonging to `hierarchy`, if any.
    pub fn in_hierarchy(&self, hierarchy: HierarchyId) -> Option<Qualifier> {
        self.0.iter().copied().find(|q| q.hierarchy == hierarchy)
    }

    /// Overwrite this set hierarchy by hierarchy.
    ///
    /// Every hierarchy mentioned in `replacements` loses its current members
    /// and receives the replacement members instead. Hierarchies that
    /// `replacements` does not mention keep their qualifiers.
    pub fn replace_in_hierarchies(&mut self, replacements: &QualifierSet) {
        if replacements.is_empty() {
            return;
        }
        self.0.retain(|q| replacements.in_hierarchy(q.hierarchy).is_none());
        self.union_with(replacements);
    }
}

impl fmt::Debug for QualifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.iter()).finish()
    }
}

impl FromIterator<Qualifier> for QualifierSet {
    fn from_iter<I: IntoIterator<Item = Qualifier>>(iter: I) -> Self {
        let mut set = Self::new();
        for qualifier in iter {
            set.insert(qualifier);
        }
        set
    }
}

impl<'a> IntoIterator for &'a QualifierSet {
    type Item = Qualifier;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, Qualifier>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

// =============================================================================
// QualifierHierarchy - hierarchy provider collaborator
// =============================================================================

/// Lookup surface of the qualifier lattice definitions.
///
/// The constraint store only needs `top_of` to bucket bare qualifiers by
/// hierarchy. Bound-based strategies additionally join and meet qualifiers.
pub trait QualifierHierarchy {
    /// The top qualifier of the hierarchy `qualifier` belongs to.
    fn top_of(&self, qualifier: Qualifier) -> Qualifier;

    /// Join of two qualifiers. `None` when they belong to different hierarchies.
    fn least_upper_bound(&self, a: Qualifier, b: Qualifier) -> Option<Qualifier>;

    /// Meet of two qualifiers. `None` when they belong to different hierarchies.
    fn greatest_lower_bound(&self, a: Qualifier, b: Qualifier) -> Option<Qualifier>;
}

impl<H: QualifierHierarchy + ?Sized> QualifierHierarchy for &H {
    fn top_of(&self, qualifier: Qualifier) -> Qualifier {
        (**self).top_of(qualifier)
    }

    fn least_upper_bound(&self, a: Qualifier, b: Qualifier) -> Option<Qualifier> {
        (**self).least_upper_bound(a, b)
    }

    fn greatest_lower_bound(&self, a: Qualifier, b: Qualifier) -> Option<Qualifier> {
        (**self).greatest_lower_bound(a, b)
    }
}

// =============================================================================
// QualifierLattice - named chain hierarchies
// =============================================================================

/// Error raised while registering qualifier hierarchies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LatticeError {
    /// A hierarchy was declared without any qualifier.
    EmptyHierarchy,
    /// A qualifier name was declared twice.
    DuplicateQualifier(String),
    /// More hierarchies than `HierarchyId` can address.
    TooManyHierarchies,
}

impl fmt::Display for LatticeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyHierarchy => write!(f, "qualifier hierarchy declares no qualifiers"),
            Self::DuplicateQualifier(name) => write!(f, "qualifier '{name}' is declared twice"),
            Self::TooManyHierarchies => write!(f, "too many qualifier hierarchies"),
        }
    }
}

impl std::error::Error for LatticeError {}

/// A set of named hierarchies, each totally ordered from top to bottom.
///
/// Chains cover the common qualifier systems (`@Nullable > @NonNull`,
/// `@Tainted > @Untainted`); join picks the higher element, meet the lower.
#[derive(Clone, Debug, Default)]
pub struct QualifierLattice {
    hierarchies: Vec<Vec<String>>,
    by_name: FxHashMap<String, Qualifier>,
}

impl QualifierLattice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hierarchy given its qualifier names ordered top to bottom.
    pub fn add_hierarchy<I, S>(&mut self, names: I) -> Result<HierarchyId, LatticeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(LatticeError::EmptyHierarchy);
        }
        let id = u16::try_from(self.hierarchies.len())
            .map(HierarchyId)
            .map_err(|_| LatticeError::TooManyHierarchies)?;

        let mut added = FxHashMap::default();
        for (rank, name) in names.iter().enumerate() {
            if self.by_name.contains_key(name) || added.contains_key(name) {
                return Err(LatticeError::DuplicateQualifier(name.clone()));
            }
            added.insert(name.clone(), Qualifier::new(id, rank as u32));
        }

        self.by_name.extend(added);
        self.hierarchies.push(names);
        Ok(id)
    }

    pub fn lookup(&self, name: &str) -> Option<Qualifier> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, qualifier: Qualifier) -> Option<&str> {
        self.hierarchies
            .get(qualifier.hierarchy.0 as usize)?
            .get(qualifier.rank as usize)
            .map(String::as_str)
    }

    pub fn hierarchy_count(&self) -> usize {
        self.hierarchies.len()
    }

    /// Top of every registered hierarchy, in registration order.
    pub fn tops(&self) -> QualifierSet {
        (0..self.hierarchies.len())
            .map(|index| Qualifier::top(HierarchyId(index as u16)))
            .collect()
    }
}

impl QualifierHierarchy for QualifierLattice {
    fn top_of(&self, qualifier: Qualifier) -> Qualifier {
        Qualifier::top(qualifier.hierarchy)
    }

    fn least_upper_bound(&self, a: Qualifier, b: Qualifier) -> Option<Qualifier> {
        (a.hierarchy == b.hierarchy).then(|| if a.rank <= b.rank { a } else { b })
    }

    fn greatest_lower_bound(&self, a: Qualifier, b: Qualifier) -> Option<Qualifier> {
        (a.hierarchy == b.hierarchy).then(|| if a.rank >= b.rank { a } else { b })
    }
}

#[cfg(test)]
#[path = "../tests/qualifier_tests.rs"]
mod tests;
