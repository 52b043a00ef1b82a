//! Tree repositories: where [`FamilyTree`]s live between layout calls.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use thiserror::Error;

use crate::ir::{AccessRole, FamilyGraph, FamilyTree, TreeAccess};
use crate::kinship::tree_name_short;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("tree not found: {0}")]
    NotFound(String),
    #[error("tree store I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("tree file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One row of a tree listing, with the caller's strongest role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeSummary {
    pub id: String,
    pub name: String,
    pub role: AccessRole,
    pub persons: usize,
}

impl TreeSummary {
    fn for_identity(tree: &FamilyTree, identity: &str) -> Option<Self> {
        let role = tree.access.role_of(identity)?;
        Some(Self {
            id: tree.id.clone(),
            name: tree_name_short(tree),
            role,
            persons: tree.data.persons.len(),
        })
    }
}

pub trait TreeRepository {
    fn load(&self, id: &str) -> Result<FamilyTree, StoreError>;

    /// Overwrites an existing tree; unknown ids are `NotFound`.
    fn save(&self, tree: &FamilyTree) -> Result<(), StoreError>;

    /// Stores a new tree owned by `owner` and returns it with its fresh id.
    fn create(
        &self,
        name: Option<String>,
        owner: &str,
        data: FamilyGraph,
    ) -> Result<FamilyTree, StoreError>;

    /// Trees the identity can see, ordered by id.
    fn list_for(&self, identity: &str) -> Result<Vec<TreeSummary>, StoreError>;
}

fn timestamp() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
        .to_string()
}

fn new_tree(id: String, name: Option<String>, owner: &str, data: FamilyGraph) -> FamilyTree {
    let now = timestamp();
    FamilyTree {
        id,
        name,
        data,
        access: TreeAccess::owned_by(owner),
        created_at: Some(now.clone()),
        updated_at: Some(now),
    }
}

fn next_tree_id(count: usize, taken: impl Fn(&str) -> bool) -> String {
    let mut k = count + 1;
    loop {
        let candidate = format!("tree-{k}");
        if !taken(&candidate) {
            return candidate;
        }
        k += 1;
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTreeStore {
    trees: Mutex<BTreeMap<String, FamilyTree>>,
}

impl InMemoryTreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trees(trees: impl IntoIterator<Item = FamilyTree>) -> Self {
        Self {
            trees: Mutex::new(trees.into_iter().map(|tree| (tree.id.clone(), tree)).collect()),
        }
    }
}

impl TreeRepository for InMemoryTreeStore {
    fn load(&self, id: &str) -> Result<FamilyTree, StoreError> {
        let trees = self.trees.lock().unwrap_or_else(PoisonError::into_inner);
        trees
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn save(&self, tree: &FamilyTree) -> Result<(), StoreError> {
        let mut trees = self.trees.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = trees
            .get_mut(&tree.id)
            .ok_or_else(|| StoreError::NotFound(tree.id.clone()))?;
        *slot = FamilyTree {
            updated_at: Some(timestamp()),
            ..tree.clone()
        };
        tracing::info!(id = %tree.id, "tree saved");
        Ok(())
    }

    fn create(
        &self,
        name: Option<String>,
        owner: &str,
        data: FamilyGraph,
    ) -> Result<FamilyTree, StoreError> {
        let mut trees = self.trees.lock().unwrap_or_else(PoisonError::into_inner);
        let id = next_tree_id(trees.len(), |id| trees.contains_key(id));
        let tree = new_tree(id, name, owner, data);
        trees.insert(tree.id.clone(), tree.clone());
        tracing::info!(id = %tree.id, owner, "tree created");
        Ok(tree)
    }

    fn list_for(&self, identity: &str) -> Result<Vec<TreeSummary>, StoreError> {
        let trees = self.trees.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(trees
            .values()
            .filter_map(|tree| TreeSummary::for_identity(tree, identity))
            .collect())
    }
}

/// One pretty-printed `<id>.json` file per tree in a directory.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ids double as file names, so anything that could leave the directory
    /// is treated as unknown.
    fn path_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        let safe = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !id.starts_with('.');
        if !safe {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(self.root.join(format!("{id}.json")))
    }

    fn write(&self, tree: &FamilyTree) -> Result<(), StoreError> {
        let path = self.path_for(&tree.id)?;
        let json = serde_json::to_string_pretty(tree)?;
        fs::write(path, json)?;
        Ok(())
    }

    fn all(&self) -> Result<Vec<FamilyTree>, StoreError> {
        let mut trees = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let content = fs::read_to_string(&path)?;
            match serde_json::from_str::<FamilyTree>(&content) {
                Ok(tree) => trees.push(tree),
                Err(err) => tracing::warn!(path = %path.display(), %err, "skipping unreadable tree file"),
            }
        }
        trees.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(trees)
    }
}

impl TreeRepository for JsonDirStore {
    fn load(&self, id: &str) -> Result<FamilyTree, StoreError> {
        let path = self.path_for(id)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, tree: &FamilyTree) -> Result<(), StoreError> {
        if !self.path_for(&tree.id)?.exists() {
            return Err(StoreError::NotFound(tree.id.clone()));
        }
        let stamped = FamilyTree {
            updated_at: Some(timestamp()),
            ..tree.clone()
        };
        self.write(&stamped)?;
        tracing::info!(id = %tree.id, dir = %self.root.display(), "tree saved");
        Ok(())
    }

    fn create(
        &self,
        name: Option<String>,
        owner: &str,
        data: FamilyGraph,
    ) -> Result<FamilyTree, StoreError> {
        let existing = self.all()?.len();
        let id = next_tree_id(existing, |id| {
            self.path_for(id).map(|path| path.exists()).unwrap_or(true)
        });
        let tree = new_tree(id, name, owner, data);
        self.write(&tree)?;
        tracing::info!(id = %tree.id, owner, dir = %self.root.display(), "tree created");
        Ok(tree)
    }

    fn list_for(&self, identity: &str) -> Result<Vec<TreeSummary>, StoreError> {
        Ok(self
            .all()?
            .iter()
            .filter_map(|tree| TreeSummary::for_identity(tree, identity))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Person, PersonData};

    fn graph() -> FamilyGraph {
        FamilyGraph {
            persons: vec![Person::new(
                "p1",
                PersonData {
                    first_name: "Jane".into(),
                    last_name: "doe".into(),
                    ..PersonData::default()
                },
            )],
            relationships: vec![],
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ftree-store-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn exercise(store: &dyn TreeRepository) {
        let created = store.create(Some("Mine".into()), "a@x", graph()).unwrap();
        assert_eq!(created.id, "tree-1");
        assert_eq!(created.access.role_of("a@x"), Some(AccessRole::Owner));

        let mut loaded = store.load(&created.id).unwrap();
        assert_eq!(loaded.data, graph());
        loaded.access.viewer.push("b@x".into());
        store.save(&loaded).unwrap();

        let for_b = store.list_for("b@x").unwrap();
        assert_eq!(for_b.len(), 1);
        assert_eq!(for_b[0].role, AccessRole::Viewer);
        assert_eq!(for_b[0].name, "J.Doe family");
        assert!(store.list_for("c@x").unwrap().is_empty());

        let second = store.create(None, "b@x", FamilyGraph::new()).unwrap();
        assert_eq!(second.id, "tree-2");
        let for_b: Vec<String> = store.list_for("b@x").unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(for_b, vec!["tree-1".to_string(), "tree-2".to_string()]);
    }

    #[test]
    fn in_memory_round_trip() {
        exercise(&InMemoryTreeStore::new());
    }

    #[test]
    fn json_dir_round_trip() {
        let dir = scratch_dir("round-trip");
        exercise(&JsonDirStore::open(&dir).unwrap());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn save_requires_an_existing_tree() {
        let store = InMemoryTreeStore::new();
        let tree = new_tree("ghost".into(), None, "a@x", FamilyGraph::new());
        assert!(matches!(store.save(&tree), Err(StoreError::NotFound(id)) if id == "ghost"));

        let dir = scratch_dir("save-missing");
        let store = JsonDirStore::open(&dir).unwrap();
        assert!(matches!(store.save(&tree), Err(StoreError::NotFound(_))));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn path_like_ids_are_rejected() {
        let dir = scratch_dir("ids");
        let store = JsonDirStore::open(&dir).unwrap();
        assert!(matches!(store.load("../etc/passwd"), Err(StoreError::NotFound(_))));
        assert!(matches!(store.load("missing"), Err(StoreError::NotFound(_))));
        let _ = fs::remove_dir_all(&dir);
    }
}
