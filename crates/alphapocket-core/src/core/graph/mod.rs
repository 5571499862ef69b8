//! Graph connectivity helpers used by the clustering engine.

pub mod union_find;

pub use union_find::{UnionFind, connected_components};
