//! Filesystem Tree
//!
//! A lazily-loaded directory tree for the flat-tree engine. Directories are
//! only read when the flattener reports them as open.
//!
//! # Example
//!
//! ```no_run
//! use flat_tree::prelude::*;
//! use fs_tree::{FileRenderer, FsTree};
//!
//! let tree = FsTree::new(".").expect("Failed to open directory");
//! let window = ListWindow::new(WindowOptions::new().viewport_size(20.0)).unwrap();
//! let options = TreeOptions::new().row_size(1.0);
//! let renderer = FileRenderer::new(options.markers.clone());
//!
//! let mut view = TreeView::new(tree, window, renderer, options).unwrap();
//! view.recompute_tree(true, true).unwrap();
//! for line in view.render() {
//!     println!("{}", line);
//! }
//! ```

mod filesystem;

use std::path::PathBuf;

use flat_tree::{RowMarkers, RowProps, RowRenderer};

pub use filesystem::{FileData, FsTree};

/// Renders a filesystem row as an indented, marked line with size info
#[derive(Debug, Clone, Default)]
pub struct FileRenderer {
    markers: RowMarkers,
}

impl FileRenderer {
    pub fn new(markers: RowMarkers) -> Self {
        Self { markers }
    }
}

impl RowRenderer<PathBuf, FileData> for FileRenderer {
    type Output = String;

    fn render_row(&self, row: RowProps<'_, PathBuf, FileData>) -> String {
        let marker = if row.is_leaf() {
            &self.markers.leaf
        } else if row.is_opened {
            &self.markers.open
        } else {
            &self.markers.closed
        };
        let indent = row.indentation.max(0.0).round() as usize;
        let file = row.payload;

        let detail = if file.is_dir {
            format!("{} items", row.children_count)
        } else {
            format_size(file.size)
        };
        format!(
            "{:indent$}{} {} ({})",
            "",
            marker,
            file.name,
            detail,
            indent = indent
        )
    }
}

/// Format file size in human-readable format
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}
