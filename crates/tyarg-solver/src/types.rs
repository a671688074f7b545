//! Concrete type surface of the inference core.
//!
//! The core never looks inside a concrete type. It needs exactly three
//! things from one:
//!
//! | Capability | Used by |
//! |------------|---------|
//! | Primary qualifiers | Null-type substitution during merge |
//! | Null-type marker | Completeness checks and merge |
//! | Deep copy + qualifier replacement | Chain resolution, strategies |
//!
//! These are captured by [`QualifiedType`]. Joins and meets of concrete types
//! belong to the type-system oracle ([`TypeOracle`]), which only the
//! bound-based strategies consult.
//!
//! [`SimpleType`] and [`NominalOracle`] are a small nominal type model (named
//! types with single inheritance and invariant type arguments) used by the CLI
//! and by tests.

use rustc_hash::FxHashMap;
use std::fmt;
use std::hash::Hash;
use tyarg_common::{Qualifier, QualifierHierarchy, QualifierSet};

// =============================================================================
// QualifiedType - the concrete type contract
// =============================================================================

/// A concrete type carrying primary qualifiers.
///
/// Types are used as map keys in constraint records, hence `Eq + Hash`.
pub trait QualifiedType: Clone + Eq + Hash + fmt::Debug {
    /// The primary qualifiers, at most one per hierarchy.
    fn primary_qualifiers(&self) -> &QualifierSet;

    /// Overwrite the primary qualifiers hierarchy by hierarchy.
    ///
    /// Hierarchies not mentioned in `replacements` keep their qualifier.
    fn replace_qualifiers(&mut self, replacements: &QualifierSet);

    /// Whether this is the type of the `null` literal.
    ///
    /// The null type is never an acceptable inferred type argument.
    fn is_null_type(&self) -> bool;

    /// An independent copy that can be mutated without affecting `self`.
    ///
    /// Implementations that share structure behind reference counting must
    /// override this.
    fn deep_copy(&self) -> Self {
        self.clone()
    }

    /// Deep copy with `replacements` applied to the primary qualifiers.
    fn copy_with_qualifiers(&self, replacements: &QualifierSet) -> Self {
        let mut copy = self.deep_copy();
        copy.replace_qualifiers(replacements);
        copy
    }
}

/// Type-system oracle: joins and meets of concrete types.
pub trait TypeOracle<Ty> {
    /// The most specific type both `a` and `b` are subtypes of.
    fn least_upper_bound(&self, a: &Ty, b: &Ty) -> Option<Ty>;

    /// The most general type that is a subtype of both `a` and `b`.
    fn greatest_lower_bound(&self, a: &Ty, b: &Ty) -> Option<Ty>;
}

// =============================================================================
// SimpleType
// =============================================================================

/// Structure of a [`SimpleType`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SimpleKind {
    /// Type of the `null` literal; a subtype of every declared type.
    Null,
    /// A declared type, possibly applied to type arguments.
    Declared { name: String, args: Vec<SimpleType> },
}

/// A named type with primary qualifiers.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SimpleType {
    pub kind: SimpleKind,
    pub qualifiers: QualifierSet,
}

impl SimpleType {
    pub fn null() -> Self {
        Self {
            kind: SimpleKind::Null,
            qualifiers: QualifierSet::new(),
        }
    }

    pub fn declared(name: impl Into<String>) -> Self {
        Self {
            kind: SimpleKind::Declared {
                name: name.into(),
                args: Vec::new(),
            },
            qualifiers: QualifierSet::new(),
        }
    }

    /// Apply type arguments. Has no effect on the null type.
    pub fn with_args(mut self, type_args: Vec<SimpleType>) -> Self {
        if let SimpleKind::Declared { args, .. } = &mut self.kind {
            *args = type_args;
        }
        self
    }

    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifiers.replace_in_hierarchies(&QualifierSet::single(qualifier));
        self
    }

    pub fn with_qualifiers(mut self, qualifiers: QualifierSet) -> Self {
        self.qualifiers = qualifiers;
        self
    }

    /// Name of a declared type, `None` for the null type.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            SimpleKind::Null => None,
            SimpleKind::Declared { name, .. } => Some(name),
        }
    }

    pub fn args(&self) -> &[SimpleType] {
        match &self.kind {
            SimpleKind::Null => &[],
            SimpleKind::Declared { args, .. } => args,
        }
    }
}

impl QualifiedType for SimpleType {
    fn primary_qualifiers(&self) -> &QualifierSet {
        &self.qualifiers
    }

    fn replace_qualifiers(&mut self, replacements: &QualifierSet) {
        self.qualifiers.replace_in_hierarchies(replacements);
    }

    fn is_null_type(&self) -> bool {
        matches!(self.kind, SimpleKind::Null)
    }
}

// =============================================================================
// NominalOracle
// =============================================================================

/// Error raised while declaring nominal types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NominalError {
    /// The type name was already declared.
    DuplicateType(String),
    /// The declared supertype has not been declared yet.
    UnknownSupertype { name: String, supertype: String },
}

impl fmt::Display for NominalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateType(name) => write!(f, "type '{name}' is declared twice"),
            Self::UnknownSupertype { name, supertype } => {
                write!(f, "type '{name}' extends undeclared type '{supertype}'")
            }
        }
    }
}

impl std::error::Error for NominalError {}

/// Joins and meets over single-inheritance named types.
///
/// A supertype must be declared before its subtypes, so the declared
/// hierarchy is always a forest. Type arguments are invariant: two
/// applications of the same type with different arguments have no join or
/// meet. Subtyping between different names ignores type arguments.
/// Qualifiers are joined and met per hierarchy through `H`.
#[derive(Clone, Debug)]
pub struct NominalOracle<H> {
    hierarchy: H,
    supertypes: FxHashMap<String, Option<String>>,
}

impl<H: QualifierHierarchy> NominalOracle<H> {
    pub fn new(hierarchy: H) -> Self {
        Self {
            hierarchy,
            supertypes: FxHashMap::default(),
        }
    }

    pub fn hierarchy(&self) -> &H {
        &self.hierarchy
    }

    /// Declare `name`, optionally extending an already-declared type.
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        supertype: Option<&str>,
    ) -> Result<(), NominalError> {
        let name = name.into();
        if self.supertypes.contains_key(&name) {
            return Err(NominalError::DuplicateType(name));
        }
        if let Some(parent) = supertype {
            if !self.supertypes.contains_key(parent) {
                return Err(NominalError::UnknownSupertype {
                    name,
                    supertype: parent.to_string(),
                });
            }
        }
        self.supertypes.insert(name, supertype.map(str::to_string));
        Ok(())
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.supertypes.contains_key(name)
    }

    /// `name` followed by its supertypes, nearest first.
    fn ancestors<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        std::iter::successors(Some(name), move |current| {
            self.supertypes.get(*current).and_then(|parent| parent.as_deref())
        })
    }

    /// Whether `sub` names `sup` or one of its declared subtypes.
    pub fn is_subtype_name(&self, sub: &str, sup: &str) -> bool {
        self.ancestors(sub).any(|name| name == sup)
    }

    /// Combine two qualifier sets hierarchy by hierarchy.
    ///
    /// A hierarchy present on only one side keeps that side's qualifier.
    fn combine_qualifiers(
        &self,
        a: &QualifierSet,
        b: &QualifierSet,
        combine: impl Fn(&H, Qualifier, Qualifier) -> Option<Qualifier>,
    ) -> QualifierSet {
        let mut combined = QualifierSet::new();
        for qa in a {
            match b.in_hierarchy(qa.hierarchy) {
                Some(qb) => {
                    if let Some(q) = combine(&self.hierarchy, qa, qb) {
                        combined.insert(q);
                    }
                }
                None => {
                    combined.insert(qa);
                }
            }
        }
        for qb in b {
            if a.in_hierarchy(qb.hierarchy).is_none() {
                combined.insert(qb);
            }
        }
        combined
    }
}

impl<H: QualifierHierarchy> TypeOracle<SimpleType> for NominalOracle<H> {
    fn least_upper_bound(&self, a: &SimpleType, b: &SimpleType) -> Option<SimpleType> {
        let kind = match (&a.kind, &b.kind) {
            (SimpleKind::Null, _) => b.kind.clone(),
            (_, SimpleKind::Null) => a.kind.clone(),
            (
                SimpleKind::Declared {
                    name: a_name,
                    args: a_args,
                },
                SimpleKind::Declared {
                    name: b_name,
                    args: b_args,
                },
            ) => {
                if a_name == b_name {
                    if a_args != b_args {
                        return None;
                    }
                    a.kind.clone()
                } else if self.is_subtype_name(b_name, a_name) {
                    a.kind.clone()
                } else if self.is_subtype_name(a_name, b_name) {
                    b.kind.clone()
                } else {
                    let common = self
                        .ancestors(a_name)
                        .find(|ancestor| self.is_subtype_name(b_name, ancestor))?;
                    SimpleKind::Declared {
                        name: common.to_string(),
                        args: Vec::new(),
                    }
                }
            }
        };

        let qualifiers =
            self.combine_qualifiers(&a.qualifiers, &b.qualifiers, |h, x, y| {
                h.least_upper_bound(x, y)
            });
        Some(SimpleType { kind, qualifiers })
    }

    fn greatest_lower_bound(&self, a: &SimpleType, b: &SimpleType) -> Option<SimpleType> {
        let kind = match (&a.kind, &b.kind) {
            (SimpleKind::Null, _) | (_, SimpleKind::Null) => SimpleKind::Null,
            (
                SimpleKind::Declared {
                    name: a_name,
                    args: a_args,
                },
                SimpleKind::Declared {
                    name: b_name,
                    args: b_args,
                },
            ) => {
                if a_name == b_name {
                    if a_args != b_args {
                        return None;
                    }
                    a.kind.clone()
                } else if self.is_subtype_name(a_name, b_name) {
                    a.kind.clone()
                } else if self.is_subtype_name(b_name, a_name) {
                    b.kind.clone()
                } else {
                    return None;
                }
            }
        };

        let qualifiers =
            self.combine_qualifiers(&a.qualifiers, &b.qualifiers, |h, x, y| {
                h.greatest_lower_bound(x, y)
            });
        Some(SimpleType { kind, qualifiers })
    }
}

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod tests;
