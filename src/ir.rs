use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Some(Self::Male),
            "female" | "f" => Some(Self::Female),
            "other" | "o" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Every person field except the id. Add and edit operations carry this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonData {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    /// Identity key used to map a signed-in viewer onto a person.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hobbies: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    #[serde(flatten)]
    pub data: PersonData,
}

impl Person {
    pub fn new(id: impl Into<String>, data: PersonData) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    pub fn gender(&self) -> Option<Gender> {
        self.data.gender
    }

    pub fn identity_key(&self) -> Option<&str> {
        self.data.email.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: String,
    pub parent_id: String,
    pub child_id: String,
}

impl Relationship {
    pub fn new(id: impl Into<String>, parent_id: impl Into<String>, child_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.into(),
            child_id: child_id.into(),
        }
    }

    pub fn touches(&self, person_id: &str) -> bool {
        self.parent_id == person_id || self.child_id == person_id
    }
}

/// The snapshot the layout engine consumes on every recomputation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FamilyGraph {
    pub persons: Vec<Person>,
    pub relationships: Vec<Relationship>,
}

impl FamilyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn person(&self, id: &str) -> Option<&Person> {
        self.persons.iter().find(|person| person.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.person(id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    pub fn parents_of<'a>(&'a self, child_id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.relationships
            .iter()
            .filter(move |rel| rel.child_id == child_id)
            .map(|rel| rel.parent_id.as_str())
    }

    pub fn has_relationship(&self, parent_id: &str, child_id: &str) -> bool {
        self.relationships
            .iter()
            .any(|rel| rel.parent_id == parent_id && rel.child_id == child_id)
    }

    /// Inserts or replaces a person by id, keeping input order stable.
    pub fn upsert_person(&mut self, id: &str, data: PersonData) {
        if let Some(existing) = self.persons.iter_mut().find(|person| person.id == id) {
            existing.data = data;
        } else {
            self.persons.push(Person::new(id, data));
        }
    }

    pub fn link(&mut self, id: &str, parent_id: &str, child_id: &str) {
        self.relationships
            .push(Relationship::new(id, parent_id, child_id));
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeAccess {
    pub owner: Vec<String>,
    pub editor: Vec<String>,
    pub viewer: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessRole {
    Owner,
    Editor,
    Viewer,
}

impl TreeAccess {
    pub fn owned_by(identity: &str) -> Self {
        Self {
            owner: vec![identity.to_string()],
            ..Self::default()
        }
    }

    /// Strongest role the identity holds on the tree, if any.
    pub fn role_of(&self, identity: &str) -> Option<AccessRole> {
        let has = |list: &[String]| list.iter().any(|entry| entry == identity);
        if has(&self.owner) {
            Some(AccessRole::Owner)
        } else if has(&self.editor) {
            Some(AccessRole::Editor)
        } else if has(&self.viewer) {
            Some(AccessRole::Viewer)
        } else {
            None
        }
    }
}

/// A stored tree: the graph plus metadata and access lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyTree {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub data: FamilyGraph,
    #[serde(default)]
    pub access: TreeAccess,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_json_uses_flat_camel_case() {
        let json = r#"{"id":"p1","firstName":"John","lastName":"Smith","gender":"male","email":"x@y.com"}"#;
        let person: Person = serde_json::from_str(json).unwrap();
        assert_eq!(person.id, "p1");
        assert_eq!(person.data.first_name, "John");
        assert_eq!(person.gender(), Some(Gender::Male));
        assert_eq!(person.identity_key(), Some("x@y.com"));
    }

    #[test]
    fn graph_tolerates_missing_sections() {
        let graph: FamilyGraph = serde_json::from_str(r#"{"persons":[]}"#).unwrap();
        assert!(graph.is_empty());
        assert!(graph.relationships.is_empty());
    }

    #[test]
    fn access_role_prefers_owner() {
        let access = TreeAccess {
            owner: vec!["a@x".into()],
            editor: vec!["a@x".into(), "b@x".into()],
            viewer: vec!["c@x".into()],
        };
        assert_eq!(access.role_of("a@x"), Some(AccessRole::Owner));
        assert_eq!(access.role_of("b@x"), Some(AccessRole::Editor));
        assert_eq!(access.role_of("c@x"), Some(AccessRole::Viewer));
        assert_eq!(access.role_of("d@x"), None);
    }

    #[test]
    fn gender_tokens() {
        assert_eq!(Gender::from_token("F"), Some(Gender::Female));
        assert_eq!(Gender::from_token(" male "), Some(Gender::Male));
        assert_eq!(Gender::from_token("x"), None);
    }
}
