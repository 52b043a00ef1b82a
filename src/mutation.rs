//! Graph edits. Every operation reads a snapshot and returns a new graph; on
//! error the input is left untouched.

use std::collections::{HashSet, VecDeque};

use thiserror::Error;

use crate::ir::{FamilyGraph, Gender, PersonData};
use crate::layout::{LayoutMode, RelationshipIndex};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelationshipViolation {
    #[error("a person cannot be their own parent")]
    SelfLink,
    #[error("{parent} is already a parent of {child}")]
    Duplicate { parent: String, child: String },
    #[error("{child} already has two parents")]
    TooManyParents { child: String },
    #[error("{child} already has a parent of gender {gender}")]
    SameGenderParents { child: String, gender: String },
    #[error("children cannot be added to the tree's main person {root}")]
    ChildOfRoot { root: String },
    #[error("{parent} descends from {child}; linking them would form a cycle")]
    Cycle { parent: String, child: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("invalid relationship: {0}")]
    InvalidRelationship(#[from] RelationshipViolation),
    #[error("person not found: {0}")]
    NotFound(String),
}

/// Where a newly added person attaches to the existing tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonLink {
    /// The new person becomes a parent of this person.
    ParentOf(String),
    /// The new person becomes a child of this person.
    ChildOf(String),
}

/// The view the edit is made from; children may not be hung below the root
/// of an ancestors view.
#[derive(Debug, Clone, Default)]
pub struct MutationContext {
    pub root_id: Option<String>,
    pub mode: LayoutMode,
}

#[derive(Debug, Clone)]
pub struct Added {
    pub graph: FamilyGraph,
    pub person_id: String,
}

#[derive(Debug, Clone)]
pub struct Linked {
    pub graph: FamilyGraph,
    pub relationship_id: String,
}

pub fn add_person(
    graph: &FamilyGraph,
    data: PersonData,
    link: Option<PersonLink>,
    ctx: &MutationContext,
) -> Result<Added, MutationError> {
    let person_id = fresh_id("person", graph.persons.len(), |id| graph.contains(id));

    match &link {
        Some(PersonLink::ParentOf(child)) => {
            require_person(graph, child)?;
            check_parent_slot(graph, child, data.gender)?;
        }
        Some(PersonLink::ChildOf(parent)) => {
            require_person(graph, parent)?;
            check_not_root(parent, ctx)?;
        }
        None => {}
    }

    let mut next = graph.clone();
    next.upsert_person(&person_id, data);
    if let Some(link) = link {
        let rel_id = fresh_id("rel", next.relationships.len(), |id| {
            next.relationships.iter().any(|rel| rel.id == id)
        });
        match link {
            PersonLink::ParentOf(child) => next.link(&rel_id, &person_id, &child),
            PersonLink::ChildOf(parent) => next.link(&rel_id, &parent, &person_id),
        }
    }
    tracing::info!(id = %person_id, "person added");
    Ok(Added {
        graph: next,
        person_id,
    })
}

pub fn edit_person(
    graph: &FamilyGraph,
    person_id: &str,
    data: PersonData,
) -> Result<FamilyGraph, MutationError> {
    require_person(graph, person_id)?;
    let mut next = graph.clone();
    next.upsert_person(person_id, data);
    tracing::info!(id = person_id, "person edited");
    Ok(next)
}

/// Removes the person together with every one of their ancestors, and all
/// relationships touching a removed person.
pub fn delete_person(graph: &FamilyGraph, person_id: &str) -> Result<FamilyGraph, MutationError> {
    require_person(graph, person_id)?;
    let removed = ancestor_closure(graph, person_id);

    let next = FamilyGraph {
        persons: graph
            .persons
            .iter()
            .filter(|person| !removed.contains(person.id.as_str()))
            .cloned()
            .collect(),
        relationships: graph
            .relationships
            .iter()
            .filter(|rel| {
                !removed.contains(rel.parent_id.as_str()) && !removed.contains(rel.child_id.as_str())
            })
            .cloned()
            .collect(),
    };
    tracing::info!(id = person_id, removed = removed.len(), "person deleted with ancestors");
    Ok(next)
}

/// Links two existing persons as parent and child.
pub fn add_relationship(
    graph: &FamilyGraph,
    parent_id: &str,
    child_id: &str,
    ctx: &MutationContext,
) -> Result<Linked, MutationError> {
    require_person(graph, parent_id)?;
    require_person(graph, child_id)?;
    if parent_id == child_id {
        return Err(RelationshipViolation::SelfLink.into());
    }
    if graph.has_relationship(parent_id, child_id) {
        return Err(RelationshipViolation::Duplicate {
            parent: parent_id.to_string(),
            child: child_id.to_string(),
        }
        .into());
    }
    let parent_gender = graph.person(parent_id).and_then(|p| p.gender());
    check_parent_slot(graph, child_id, parent_gender)?;
    check_not_root(parent_id, ctx)?;
    if descends_from(graph, parent_id, child_id) {
        return Err(RelationshipViolation::Cycle {
            parent: parent_id.to_string(),
            child: child_id.to_string(),
        }
        .into());
    }

    let mut next = graph.clone();
    let relationship_id = fresh_id("rel", next.relationships.len(), |id| {
        next.relationships.iter().any(|rel| rel.id == id)
    });
    next.link(&relationship_id, parent_id, child_id);
    tracing::info!(id = %relationship_id, parent = parent_id, child = child_id, "relationship added");
    Ok(Linked {
        graph: next,
        relationship_id,
    })
}

fn require_person(graph: &FamilyGraph, id: &str) -> Result<(), MutationError> {
    if graph.contains(id) {
        Ok(())
    } else {
        Err(MutationError::NotFound(id.to_string()))
    }
}

/// A child takes at most two parents, and a second parent must not share the
/// first one's recorded gender.
fn check_parent_slot(
    graph: &FamilyGraph,
    child_id: &str,
    gender: Option<Gender>,
) -> Result<(), RelationshipViolation> {
    let parents: Vec<&str> = graph.parents_of(child_id).collect();
    if parents.len() >= 2 {
        return Err(RelationshipViolation::TooManyParents {
            child: child_id.to_string(),
        });
    }
    for parent in parents {
        let existing = graph.person(parent).and_then(|p| p.gender());
        if existing == gender {
            let gender = existing
                .map(|g| format!("{g:?}").to_lowercase())
                .unwrap_or_else(|| "unknown".to_string());
            return Err(RelationshipViolation::SameGenderParents {
                child: child_id.to_string(),
                gender,
            });
        }
    }
    Ok(())
}

fn check_not_root(parent_id: &str, ctx: &MutationContext) -> Result<(), RelationshipViolation> {
    if ctx.mode == LayoutMode::Ancestors && ctx.root_id.as_deref() == Some(parent_id) {
        return Err(RelationshipViolation::ChildOfRoot {
            root: parent_id.to_string(),
        });
    }
    Ok(())
}

/// `prefix-k` for the first k past `count` that is not taken.
fn fresh_id(prefix: &str, count: usize, taken: impl Fn(&str) -> bool) -> String {
    let mut k = count + 1;
    loop {
        let candidate = format!("{prefix}-{k}");
        if !taken(&candidate) {
            return candidate;
        }
        k += 1;
    }
}

fn ancestor_closure<'a>(graph: &'a FamilyGraph, start: &'a str) -> HashSet<&'a str> {
    let index = RelationshipIndex::build(&graph.relationships);
    let mut removed: HashSet<&str> = HashSet::from([start]);
    let mut queue: VecDeque<&str> = VecDeque::from([start]);
    while let Some(current) = queue.pop_front() {
        for parent in index.parents_of(current) {
            if let Some(person) = graph.person(parent)
                && removed.insert(person.id.as_str())
            {
                queue.push_back(person.id.as_str());
            }
        }
    }
    removed
}

/// True when `descendant` is `ancestor` or reachable from it through child links.
fn descends_from(graph: &FamilyGraph, descendant: &str, ancestor: &str) -> bool {
    let index = RelationshipIndex::build(&graph.relationships);
    let mut seen: HashSet<&str> = HashSet::from([ancestor]);
    let mut queue: VecDeque<&str> = VecDeque::from([ancestor]);
    while let Some(current) = queue.pop_front() {
        if current == descendant {
            return true;
        }
        for child in index.children_of(current) {
            if seen.insert(child.as_str()) {
                queue.push_back(child.as_str());
            }
        }
    }
    false
}
