//! Filesystem tree source with lazy loading support

use anyhow::{bail, Context, Result};
use flat_tree::{DepthFirstWalker, NodeDescriptor, Traversal, TreeSource};
use log::{debug, trace, warn};
use path_clean::PathClean;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Payload carried by every filesystem node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileData {
    /// The entry's name (not full path)
    pub name: String,
    /// File size in bytes (0 for directories)
    pub size: u64,
    /// File extension (if any)
    pub extension: Option<String>,
    /// Whether this entry is a directory
    pub is_dir: bool,
}

impl std::fmt::Display for FileData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Index into the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeId(usize);

impl NodeId {
    const ROOT: NodeId = NodeId(0);
}

/// State of a directory's children
#[derive(Debug, Clone)]
enum ChildrenState {
    /// Children have not been read yet, or were invalidated by a refresh
    NotLoaded,
    /// Children have been read
    Loaded(Vec<NodeId>),
    /// Reading the directory failed
    Error(String),
}

#[derive(Debug, Clone)]
struct FsNode {
    data: FileData,
    full_path: PathBuf,
    /// Path relative to the tree root; this is the node's identity
    rel_path: PathBuf,
    children: ChildrenState,
    /// Number of entries, counted without loading them
    entry_count: Option<usize>,
}

/// Arena of discovered entries.
///
/// Slots are reused by path when a directory is read again, so the arena
/// only grows with the number of distinct paths seen.
#[derive(Debug)]
struct Listing {
    nodes: Vec<FsNode>,
    root_path: PathBuf,
    path_cache: HashMap<PathBuf, NodeId>,
}

impl Listing {
    fn node(&self, id: NodeId) -> &FsNode {
        &self.nodes[id.0]
    }

    /// Forget every directory listing so it is read again on descent
    fn invalidate(&mut self) {
        for node in &mut self.nodes {
            if node.data.is_dir {
                node.children = ChildrenState::NotLoaded;
                node.entry_count = None;
            }
        }
    }

    fn ensure_loaded(&mut self, id: NodeId) -> Result<()> {
        let node = self.node(id);
        if !node.data.is_dir || matches!(node.children, ChildrenState::Loaded(_)) {
            return Ok(());
        }

        let path = node.full_path.clone();
        match self.load_children(&path) {
            Ok(child_ids) => {
                debug!("Loaded {} entries from {}", child_ids.len(), path.display());
                let node = &mut self.nodes[id.0];
                node.entry_count = Some(child_ids.len());
                node.children = ChildrenState::Loaded(child_ids);
                Ok(())
            }
            Err(e) => {
                let node = &mut self.nodes[id.0];
                node.entry_count = Some(0);
                node.children = ChildrenState::Error(format!("{:#}", e));
                Err(e)
            }
        }
    }

    fn load_children(&mut self, path: &Path) -> Result<Vec<NodeId>> {
        let entries =
            fs::read_dir(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(self.add_entries(path, entries))
    }

    /// Register directory entries and return them sorted.
    ///
    /// Entries that fail to read (e.g. removed mid-listing) are skipped.
    fn add_entries(
        &mut self,
        path: &Path,
        entries: impl IntoIterator<Item = io::Result<fs::DirEntry>>,
    ) -> Vec<NodeId> {
        let mut child_ids = Vec::new();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping entry in {}: {}", path.display(), e);
                    continue;
                }
            };
            let entry_path = entry.path();
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("Skipping {}: {}", entry_path.display(), e);
                    continue;
                }
            };

            let rel_path = pathdiff::diff_paths(&entry_path, &self.root_path)
                .unwrap_or_else(|| PathBuf::from(entry.file_name()));

            let extension = if metadata.is_file() {
                entry_path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|s| s.to_string())
            } else {
                None
            };

            let data = FileData {
                name: entry.file_name().to_string_lossy().to_string(),
                size: if metadata.is_dir() { 0 } else { metadata.len() },
                extension,
                is_dir: metadata.is_dir(),
            };

            let node_id = match self.path_cache.get(&rel_path) {
                Some(&id) => {
                    let node = &mut self.nodes[id.0];
                    // Kind may have changed on disk
                    if node.data.is_dir != data.is_dir {
                        node.children = ChildrenState::NotLoaded;
                        node.entry_count = None;
                    }
                    node.data = data;
                    id
                }
                None => {
                    let id = NodeId(self.nodes.len());
                    self.nodes.push(FsNode {
                        data,
                        full_path: entry_path,
                        rel_path: rel_path.clone(),
                        children: ChildrenState::NotLoaded,
                        entry_count: None,
                    });
                    self.path_cache.insert(rel_path, id);
                    id
                }
            };
            child_ids.push(node_id);
        }

        // Sort children: directories first, then files, alphabetically within each group
        child_ids.sort_by(|&a, &b| {
            let a = &self.nodes[a.0].data;
            let b = &self.nodes[b.0].data;
            b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name))
        });

        child_ids
    }

    /// Number of entries in a directory, without loading them
    fn entry_count(&mut self, id: NodeId) -> usize {
        let node = &self.nodes[id.0];
        if !node.data.is_dir {
            return 0;
        }
        if let Some(count) = node.entry_count {
            return count;
        }

        let count = match fs::read_dir(&node.full_path) {
            Ok(entries) => entries.count(),
            Err(e) => {
                warn!("Cannot list {}: {}", node.full_path.display(), e);
                0
            }
        };
        self.nodes[id.0].entry_count = Some(count);
        count
    }

    fn describe(&mut self, id: NodeId, open_by_default: bool) -> NodeDescriptor<PathBuf, FileData> {
        let children = self.entry_count(id);
        let node = self.node(id);
        NodeDescriptor::new(node.rel_path.clone(), node.data.clone())
            .children(children)
            .open(open_by_default)
    }

    fn children_of(&mut self, rel_path: &PathBuf) -> Vec<NodeDescriptor<PathBuf, FileData>> {
        let Some(&id) = self.path_cache.get(rel_path) else {
            warn!("Asked for children of unknown path {}", rel_path.display());
            return Vec::new();
        };

        if let Err(e) = self.ensure_loaded(id) {
            warn!("{:#}", e);
            return Vec::new();
        }

        let child_ids = match &self.node(id).children {
            ChildrenState::Loaded(children) => children.clone(),
            _ => Vec::new(),
        };
        trace!("Descending into {} ({} entries)", rel_path.display(), child_ids.len());
        child_ids
            .into_iter()
            .map(|child| self.describe(child, false))
            .collect()
    }
}

/// A filesystem tree that reads directories only when they are opened.
///
/// Node identities are paths relative to the root; the root itself is the
/// empty path. Implements [`TreeSource`], so the flattener decides which
/// directories get read.
///
/// # Example
///
/// ```no_run
/// use flat_tree::TreeFlattener;
/// use fs_tree::FsTree;
///
/// let tree = FsTree::new("./src").expect("Failed to open directory");
/// let mut flattener = TreeFlattener::new(tree);
/// flattener.recompute_tree(true, true).expect("Failed to flatten");
/// println!("{} rows", flattener.row_count());
/// ```
#[derive(Debug)]
pub struct FsTree {
    listing: Listing,
    seen: HashSet<PathBuf>,
    open_root: bool,
}

impl FsTree {
    /// Create a filesystem tree rooted at the given directory.
    ///
    /// Nothing below the root is read until the root is opened.
    ///
    /// # Errors
    ///
    /// Returns an error if the path doesn't exist or isn't a directory.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().clean();
        let metadata = fs::metadata(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        if !metadata.is_dir() {
            bail!("{} is not a directory", path.display());
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(".")
            .to_string();

        let root = FsNode {
            data: FileData {
                name,
                size: 0,
                extension: None,
                is_dir: true,
            },
            full_path: path.clone(),
            rel_path: PathBuf::new(),
            children: ChildrenState::NotLoaded,
            entry_count: None,
        };

        let mut path_cache = HashMap::new();
        path_cache.insert(PathBuf::new(), NodeId::ROOT);

        Ok(Self {
            listing: Listing {
                nodes: vec![root],
                root_path: path,
                path_cache,
            },
            seen: HashSet::new(),
            open_root: true,
        })
    }

    /// Set whether the root starts opened (the default)
    pub fn open_root(mut self, open: bool) -> Self {
        self.open_root = open;
        self
    }

    /// The directory this tree is rooted at
    pub fn root_path(&self) -> &Path {
        &self.listing.root_path
    }

    /// Full filesystem path of a node
    pub fn full_path(&self, rel_path: &Path) -> Option<&Path> {
        let id = self.listing.path_cache.get(rel_path)?;
        Some(self.listing.node(*id).full_path.as_path())
    }

    /// Check if a directory's children have been read
    pub fn is_loaded(&self, rel_path: &Path) -> bool {
        self.listing
            .path_cache
            .get(rel_path)
            .map(|id| matches!(self.listing.node(*id).children, ChildrenState::Loaded(_)))
            .unwrap_or(false)
    }

    /// Error recorded for a directory that could not be read
    pub fn load_error(&self, rel_path: &Path) -> Option<&str> {
        let id = self.listing.path_cache.get(rel_path)?;
        match &self.listing.node(*id).children {
            ChildrenState::Error(e) => Some(e.as_str()),
            _ => None,
        }
    }

    /// Number of entries discovered so far, including the root
    pub fn node_count(&self) -> usize {
        self.listing.nodes.len()
    }
}

impl TreeSource for FsTree {
    type Id = PathBuf;
    type Payload = FileData;

    fn traverse(&mut self, refresh: bool) -> Box<dyn Traversal<PathBuf, FileData> + '_> {
        if refresh {
            self.listing.invalidate();
        }

        let listing = &mut self.listing;
        let root = listing.describe(NodeId::ROOT, self.open_root);
        let walker = DepthFirstWalker::new(vec![root], move |rel_path: &PathBuf| {
            listing.children_of(rel_path)
        })
        .remember(&mut self.seen, refresh);

        Box::new(walker)
    }
}
