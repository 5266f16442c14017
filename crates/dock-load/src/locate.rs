//! Source Locator: turn a data tree into an ordered load plan.
//!
//! A directory takes part only if it holds a manifest (`index.json` by
//! default) of the form `{"ordering": ["authors", "books", "geo"]}`. Each
//! entry names a child directory (a *branch*), a data file without its
//! extension, or both. The plan is produced in two passes:
//!
//! 1. Walk the tree top-down in file-name order. For every manifest, record
//!    the entry slots in listed order: the branch first, then one file slot
//!    per configured extension that exists on disk.
//! 2. Expand from the root manifest. File slots are emitted as they come. A
//!    branch with its own manifest expands its slots recursively; a branch
//!    without one expands to every recorded file beneath it, in discovery
//!    order.
//!
//! Branches expand once and files are emitted once, both keyed by exact path.
//! Branch membership is by path component, so `books` never claims
//! `books_archive/...`.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

use dock_config::SourceConfig;
use dock_core::{EntityType, Schema};
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};

use crate::error::LoadConfigError;

/// Per-directory manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    pub ordering: Vec<String>,
}

impl Manifest {
    /// Read and parse a manifest file.
    ///
    /// # Errors
    ///
    /// Returns [`LoadConfigError::ManifestIo`] if the file cannot be read and
    /// [`LoadConfigError::Manifest`] if it is not an object with an
    /// `ordering` list.
    pub fn from_path(path: &Path) -> Result<Self, LoadConfigError> {
        let text = fs::read_to_string(path).map_err(|source| LoadConfigError::ManifestIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| LoadConfigError::Manifest {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// One data file and the entity type it loads into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    pub entity: EntityType,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
enum Slot {
    Branch(PathBuf),
    File(PathBuf),
}

/// Everything the walk learned about the tree.
#[derive(Debug, Default)]
struct Tree {
    /// Slots per manifest directory, in manifest order.
    scopes: HashMap<PathBuf, Vec<Slot>>,
    /// Every recorded file, in walk order.
    discovered: Vec<PathBuf>,
}

/// Locates and orders data sources under a root directory.
#[derive(Debug, Clone)]
pub struct SourceLocator {
    config: SourceConfig,
}

impl SourceLocator {
    #[must_use]
    pub const fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    /// Ordered data file paths under `root`.
    ///
    /// Returns an empty plan (and logs a warning) when the root itself has
    /// no manifest.
    ///
    /// # Errors
    ///
    /// Returns [`LoadConfigError`] if the root is missing, the walk fails, or
    /// any manifest in the tree is malformed, even one no ancestor refers to.
    pub fn ordered_paths(&self, root: &Path) -> Result<Vec<PathBuf>, LoadConfigError> {
        let root = root.canonicalize().map_err(|source| LoadConfigError::Root {
            path: root.to_path_buf(),
            source,
        })?;
        let tree = self.walk(&root)?;

        if !tree.scopes.contains_key(&root) {
            tracing::warn!(root = %root.display(), manifest = %self.config.manifest, "data root has no manifest; nothing to load");
            return Ok(Vec::new());
        }

        let mut expanded = HashSet::new();
        let mut emitted = HashSet::new();
        let mut ordered = Vec::new();
        expanded.insert(root.clone());
        expand(&tree, &root, &mut expanded, &mut emitted, &mut ordered);

        tracing::debug!(root = %root.display(), sources = ordered.len(), "located sources");
        Ok(ordered)
    }

    /// The load plan: ordered sources mapped to declared entity types.
    ///
    /// # Errors
    ///
    /// As [`SourceLocator::ordered_paths`], plus [`LoadConfigError::Schema`]
    /// when a file maps to an undeclared entity type.
    pub fn locate(&self, root: &Path, schema: &Schema) -> Result<Vec<Source>, LoadConfigError> {
        self.ordered_paths(root)?
            .into_iter()
            .map(|path| map_source(path, schema))
            .collect()
    }

    fn walk(&self, root: &Path) -> Result<Tree, LoadConfigError> {
        let ignored = self.config.ignored_dirs.clone();
        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .hidden(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                entry.depth() == 0
                    || !entry.file_type().is_some_and(|ft| ft.is_dir())
                    || !ignored
                        .iter()
                        .any(|name| entry.file_name().to_string_lossy() == name.as_str())
            })
            .build();

        let mut tree = Tree::default();
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_some_and(|ft| ft.is_dir()) {
                continue;
            }
            let dir = entry.path();
            let manifest_path = dir.join(&self.config.manifest);
            if !manifest_path.is_file() {
                continue;
            }

            let manifest = Manifest::from_path(&manifest_path)?;
            let slots = self.slots(dir, &manifest);
            tree.discovered.extend(slots.iter().filter_map(|slot| match slot {
                Slot::File(path) => Some(path.clone()),
                Slot::Branch(_) => None,
            }));
            tree.scopes.insert(dir.to_path_buf(), slots);
        }
        Ok(tree)
    }

    fn slots(&self, dir: &Path, manifest: &Manifest) -> Vec<Slot> {
        let mut slots = Vec::new();
        for entry in &manifest.ordering {
            if !is_child_name(entry) {
                tracing::warn!(dir = %dir.display(), entry = %entry, "manifest entry is not a plain child name; skipping");
                continue;
            }
            let mut matched = false;

            let branch = dir.join(entry);
            if branch.is_dir() {
                matched = true;
                if self.config.is_ignored(entry) {
                    tracing::warn!(dir = %branch.display(), "manifest lists an ignored directory; skipping");
                } else {
                    slots.push(Slot::Branch(branch));
                }
            }

            for ext in &self.config.extensions {
                let file = dir.join(format!("{entry}{ext}"));
                if file.is_file() {
                    matched = true;
                    slots.push(Slot::File(file));
                }
            }

            if !matched {
                tracing::warn!(dir = %dir.display(), entry = %entry, "manifest entry matches no directory or data file; skipping");
            }
        }
        slots
    }
}

/// Manifest entries name direct children only: exactly one normal component.
fn is_child_name(entry: &str) -> bool {
    let mut components = Path::new(entry).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn expand(
    tree: &Tree,
    dir: &Path,
    expanded: &mut HashSet<PathBuf>,
    emitted: &mut HashSet<PathBuf>,
    ordered: &mut Vec<PathBuf>,
) {
    let Some(slots) = tree.scopes.get(dir) else {
        return;
    };
    for slot in slots {
        match slot {
            Slot::File(path) => {
                if emitted.insert(path.clone()) {
                    ordered.push(path.clone());
                }
            }
            Slot::Branch(branch) => {
                if !expanded.insert(branch.clone()) {
                    continue;
                }
                if tree.scopes.contains_key(branch) {
                    expand(tree, branch, expanded, emitted, ordered);
                } else {
                    for path in tree.discovered.iter().filter(|p| p.starts_with(branch)) {
                        if emitted.insert(path.clone()) {
                            ordered.push(path.clone());
                        }
                    }
                }
            }
        }
    }
}

/// Map a data file to its entity type: the parent directory names the
/// namespace, the title-cased stem names the type.
///
/// # Errors
///
/// Returns [`LoadConfigError::Unmappable`] for paths without a parent or
/// stem, and [`LoadConfigError::Schema`] for undeclared types.
pub fn map_source(path: PathBuf, schema: &Schema) -> Result<Source, LoadConfigError> {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned());
    let namespace = path
        .parent()
        .and_then(Path::file_name)
        .map(|s| s.to_string_lossy().into_owned());
    let (Some(stem), Some(namespace)) = (stem, namespace) else {
        return Err(LoadConfigError::Unmappable(path));
    };

    let entity = schema.entity_type(&namespace, &title_case(&stem))?;
    tracing::debug!(entity = %entity, path = %path.display(), "mapped source");
    Ok(Source { entity, path })
}

/// Title-case a file stem: every run of letters starts upper-case and
/// continues lower-case (`book_reviews` becomes `Book_Reviews`).
#[must_use]
pub fn title_case(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut at_boundary = true;
    for ch in word.chars() {
        if ch.is_alphabetic() {
            if at_boundary {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_boundary = false;
        } else {
            out.push(ch);
            at_boundary = true;
        }
    }
    out
}
