use std::collections::HashMap;

use crate::ir::Relationship;

/// Parent/child adjacency built once per layout pass.
///
/// Neighbor lists keep relationship input order and drop repeated links, so
/// every traversal over the index is deterministic.
#[derive(Debug, Clone, Default)]
pub struct RelationshipIndex {
    children: HashMap<String, Vec<String>>,
    parents: HashMap<String, Vec<String>>,
}

impl RelationshipIndex {
    pub fn build(relationships: &[Relationship]) -> Self {
        let mut index = Self::default();
        for rel in relationships {
            push_unique(
                index.children.entry(rel.parent_id.clone()).or_default(),
                &rel.child_id,
            );
            push_unique(
                index.parents.entry(rel.child_id.clone()).or_default(),
                &rel.parent_id,
            );
        }
        index
    }

    pub fn children_of(&self, id: &str) -> &[String] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn parents_of(&self, id: &str) -> &[String] {
        self.parents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_parents(&self, id: &str) -> bool {
        !self.parents_of(id).is_empty()
    }

    /// Ids that appear as a child of at least one relationship, sorted.
    pub fn children_with_parents(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.parents.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

fn push_unique(list: &mut Vec<String>, id: &str) {
    if !list.iter().any(|existing| existing == id) {
        list.push(id.to_string());
    }
}
