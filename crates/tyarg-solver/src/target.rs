//! Inference targets.

use std::fmt;
use tyarg_common::FxIndexSet;

/// Identifier of a type parameter whose argument is being inferred.
///
/// Targets are opaque: the inference core only compares them. The driver
/// owns the mapping between ids and the type parameters they stand for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u32);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// The fixed target set of one inference session, in declaration order.
pub type TargetSet = FxIndexSet<TargetId>;
