//! Road graph primitives: nodes and edges.
//!
//! Edges refer to their endpoints by coordinates, not by node handles; nodes
//! are looked up by position through `crate::cells::CellIndex`. Ids are handed
//! out by the index at insertion time, so they are dense and monotonically
//! increasing within one generation run.

mod edge;
mod node;

pub use edge::{Edge, RoadKind};
pub use node::Node;

/// Identifier types for clarity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub usize);

impl EdgeId {
    /// Placeholder carried by proposals until the index accepts them.
    pub const PENDING: EdgeId = EdgeId(usize::MAX);

    #[inline]
    pub fn is_pending(self) -> bool {
        self == Self::PENDING
    }
}
