//! Flat Tree
//!
//! Incrementally flattens a hierarchical, lazily-expandable tree into an
//! ordered, addressable list of rows for windowed rendering, while keeping
//! per-node openness across repeated flattenings.
//!
//! # Core Concepts
//!
//! - **TreeSource**: the data owner, driven through a resumable traversal
//! - **TreeFlattener**: walks the source and publishes the flat order
//! - **NodeRegistry**: per-node state (openness, latest descriptor, toggle handle)
//! - **TreeView**: binds a flattener to a [`RenderSurface`] and a row renderer
//!
//! # Example
//!
//! ```
//! use flat_tree::prelude::*;
//!
//! let mut tree = MemoryTree::new();
//! tree.add_root("R", ()).unwrap();
//! tree.add_child("R", "C1", ()).unwrap();
//! tree.add_child("R", "C2", ()).unwrap();
//!
//! let mut flattener = TreeFlattener::new(tree);
//! flattener.recompute_tree(true, true).unwrap();
//! assert_eq!(flattener.flat_order(), ["R"]);
//!
//! flattener.toggle_nodes([("R".to_string(), true)]).unwrap();
//! assert_eq!(flattener.flat_order(), ["R", "C1", "C2"]);
//! ```

mod engine;
mod error;
pub mod memory;
mod node;
mod options;
mod registry;
mod render;
pub mod source;
mod window;

pub use engine::{SharedFlattener, TreeFlattener};
pub use error::{Result, TreeError};
pub use memory::MemoryTree;
pub use node::{NodeDescriptor, ToggleHandle};
pub use options::{RowMarkers, TreeOptions, WindowOptions};
pub use registry::{NodeRecord, NodeRegistry};
pub use render::{
    row_props, DefaultRowRenderer, RenderSurface, RenderedRange, RowProps, RowRenderer, RowStyle,
    ScrollAlign, TreeView,
};
pub use source::{DepthFirstWalker, Step, Traversal, TreeSource};
pub use window::ListWindow;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        DefaultRowRenderer, ListWindow, MemoryTree, NodeDescriptor, RenderSurface, RowProps,
        RowRenderer, ScrollAlign, Step, ToggleHandle, Traversal, TreeError, TreeFlattener,
        TreeOptions, TreeSource, TreeView, WindowOptions,
    };
}
