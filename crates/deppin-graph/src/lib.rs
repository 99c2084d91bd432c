//! # deppin-graph
//!
//! Pure data structures for pinned import dependency graphs.
//!
//! This crate holds the data model shared by the analyzer core and its
//! consumers. It performs no I/O.
//!
//! - [`ImportPath`]: byte-exact, slash-separated package identifier with a
//!   segment-boundary prefix relation and vendor/internal helpers
//! - [`Revision`]: opaque pinned identifier attached to an import path
//! - [`WorldId`]: stable name of a build-constraint world
//! - [`DependencyGraph`]: frozen, canonically ordered graph rooted at the
//!   analysis target, built through [`GraphBuilder`]
//!
//! ## Quick Start
//!
//! ```rust
//! use deppin_graph::{GraphBuilder, ImportPath, Revision, WorldId};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let app = ImportPath::new("example.org/app")?;
//! let lib = ImportPath::new("example.org/lib")?;
//! let host = WorldId::host();
//!
//! let root = Revision::root(app.clone());
//! let pinned = Revision::pinned(lib.clone(), "v1.2.3");
//!
//! let mut builder = GraphBuilder::new(root.clone());
//! builder.merge_node(pinned.clone(), &host)?;
//! builder.add_edge(&root, &pinned, &host)?;
//!
//! let graph = builder.build();
//! assert_eq!(graph.dependencies(&app).len(), 1);
//! println!("{}", graph.to_json()?);
//! # Ok(())
//! # }
//! ```

pub mod graph;
pub mod import_path;
pub mod revision;
pub mod world_id;

pub use graph::{DependencyGraph, Edge, Folded, GraphBuilder, NodeConflict};
pub use import_path::{ImportPath, ImportPathError, is_path_prefix};
pub use revision::Revision;
pub use world_id::WorldId;

/// Error types for graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// An edge endpoint is not a node of the graph.
    #[error("unknown node: {0}")]
    UnknownNode(Revision),

    /// An edge from a node to itself.
    #[error("self-edge on {0}")]
    SelfEdge(Revision),

    /// A non-root node without incoming edges.
    #[error("node {0} has no incoming edge")]
    Orphan(Revision),

    /// Two worlds disagree on a revision.
    #[error(transparent)]
    Conflict(#[from] NodeConflict),

    /// Serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;
