//! Display helpers for people in a tree: kinship roles relative to the
//! main person, names, initials and life spans.

use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};
use std::fmt;

use crate::ir::{FamilyGraph, FamilyTree, Gender, Person};
use crate::layout::RelationshipIndex;

/// How a person relates to the main person of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    You,
    /// Direct ancestor `generation` steps above the main person.
    Ancestor {
        generation: u32,
        gender: Option<Gender>,
    },
    Unrelated,
}

impl Role {
    fn sort_key(self) -> (u32, u8) {
        match self {
            Role::Ancestor { generation, gender } => {
                let gender_rank = if gender == Some(Gender::Female) { 1 } else { 0 };
                (generation, gender_rank)
            }
            Role::You | Role::Unrelated => (u32::MAX, 0),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Role::You => f.write_str("You"),
            Role::Unrelated => Ok(()),
            Role::Ancestor { generation, gender } => {
                let female = gender == Some(Gender::Female);
                match generation {
                    0 => f.write_str("You"),
                    1 => f.write_str(if female { "Mother" } else { "Father" }),
                    _ => {
                        let base = if female { "grandmother" } else { "grandfather" };
                        let greats = generation - 2;
                        if greats == 0 {
                            let mut chars = base.chars();
                            if let Some(first) = chars.next() {
                                write!(f, "{}{}", first.to_ascii_uppercase(), chars.as_str())?;
                            }
                            return Ok(());
                        }
                        f.write_str("Great-")?;
                        for _ in 1..greats {
                            f.write_str("great-")?;
                        }
                        f.write_str(base)
                    }
                }
            }
        }
    }
}

/// Role of `person_id` relative to `main_id`: the fewest parent steps from
/// the main person up to them, or `Unrelated` if they are not an ancestor.
pub fn person_role(graph: &FamilyGraph, person_id: &str, main_id: &str) -> Role {
    if person_id == main_id {
        return Role::You;
    }
    let index = RelationshipIndex::build(&graph.relationships);
    let gender = graph.person(person_id).and_then(Person::gender);

    let mut seen: HashSet<&str> = HashSet::from([main_id]);
    let mut queue: VecDeque<(&str, u32)> = VecDeque::from([(main_id, 0)]);
    while let Some((current, depth)) = queue.pop_front() {
        for parent in index.parents_of(current) {
            if parent == person_id {
                return Role::Ancestor {
                    generation: depth + 1,
                    gender,
                };
            }
            if seen.insert(parent.as_str()) {
                queue.push_back((parent.as_str(), depth + 1));
            }
        }
    }
    Role::Unrelated
}

/// First, middle and last name joined by spaces, skipping empty parts.
pub fn full_name(person: &Person) -> String {
    let data = &person.data;
    [
        Some(data.first_name.as_str()),
        data.middle_name.as_deref(),
        Some(data.last_name.as_str()),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.trim().is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}

pub fn initial(person: &Person) -> String {
    person
        .data
        .first_name
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "?".to_string())
}

/// "1923-1998", "1923", or empty when the birth year is unknown.
pub fn life_years(person: &Person) -> String {
    let birth = person.data.birth_date.as_deref().and_then(leading_year);
    let death = person.data.death_date.as_deref().and_then(leading_year);
    match (birth, death) {
        (Some(birth), Some(death)) => format!("{birth}-{death}"),
        (Some(birth), None) => birth.to_string(),
        (None, _) => String::new(),
    }
}

fn leading_year(date: &str) -> Option<i32> {
    let digits: String = date
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.len() < 3 {
        return None;
    }
    digits.parse().ok()
}

/// Short label such as "J.Smith family", taken from the first person in the
/// tree; falls back to the tree name, then its id.
pub fn tree_name_short(tree: &FamilyTree) -> String {
    let fallback = || tree.name.clone().unwrap_or_else(|| tree.id.clone());
    let Some(first) = tree.data.persons.first() else {
        return fallback();
    };
    let first_name = first.data.first_name.trim();
    let last_name = first.data.last_name.trim();
    if first_name.is_empty() && last_name.is_empty() {
        return fallback();
    }

    let initial: String = first_name
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default();
    let mut chars = last_name.chars();
    let last = match chars.next() {
        Some(head) => {
            let rest = chars.as_str().to_lowercase();
            head.to_uppercase().chain(rest.chars()).collect()
        }
        None => String::new(),
    };
    format!("{initial}.{last} family")
}

/// Orders people closest generation first, fathers before mothers, then by
/// name; the main person and unrelated people go last.
pub fn sort_by_role<'a>(members: &mut [(&'a Person, Role)]) {
    members.sort_by(|(a, role_a), (b, role_b)| {
        match role_a.sort_key().cmp(&role_b.sort_key()) {
            Ordering::Equal => full_name(a).cmp(&full_name(b)),
            other => other,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{PersonData, Relationship, TreeAccess};

    fn person(id: &str, first: &str, last: &str, gender: Option<Gender>) -> Person {
        Person::new(
            id,
            PersonData {
                first_name: first.into(),
                last_name: last.into(),
                gender,
                ..PersonData::default()
            },
        )
    }

    fn lineage() -> FamilyGraph {
        FamilyGraph {
            persons: vec![
                person("me", "Ann", "Lee", Some(Gender::Female)),
                person("dad", "Bob", "Lee", Some(Gender::Male)),
                person("gm", "Cat", "Lee", Some(Gender::Female)),
                person("ggf", "Dan", "Lee", Some(Gender::Male)),
                person("gggm", "Eve", "Lee", Some(Gender::Female)),
                person("cousin", "Fay", "Lee", None),
            ],
            relationships: vec![
                Relationship::new("r1", "dad", "me"),
                Relationship::new("r2", "gm", "dad"),
                Relationship::new("r3", "ggf", "gm"),
                Relationship::new("r4", "gggm", "ggf"),
            ],
        }
    }

    #[test]
    fn roles_follow_generation_and_gender() {
        let g = lineage();
        let label = |id: &str| person_role(&g, id, "me").to_string();
        assert_eq!(label("me"), "You");
        assert_eq!(label("dad"), "Father");
        assert_eq!(label("gm"), "Grandmother");
        assert_eq!(label("ggf"), "Great-grandfather");
        assert_eq!(label("gggm"), "Great-great-grandmother");
        assert_eq!(label("cousin"), "");
    }

    #[test]
    fn role_walk_survives_cycles() {
        let mut g = lineage();
        g.relationships.push(Relationship::new("r5", "me", "gm"));
        assert_eq!(person_role(&g, "cousin", "me"), Role::Unrelated);
    }

    #[test]
    fn names_and_years() {
        let mut p = person("p", "john", "Smith", None);
        p.data.middle_name = Some("Q".into());
        assert_eq!(full_name(&p), "john Q Smith");
        assert_eq!(initial(&p), "J");
        assert_eq!(initial(&person("x", "", "", None)), "?");
        assert_eq!(life_years(&p), "");
        p.data.birth_date = Some("1923-04-01".into());
        assert_eq!(life_years(&p), "1923");
        p.data.death_date = Some("1998".into());
        assert_eq!(life_years(&p), "1923-1998");
    }

    #[test]
    fn short_tree_name() {
        let tree = FamilyTree {
            id: "t1".into(),
            name: Some("Ours".into()),
            data: FamilyGraph {
                persons: vec![person("p", "john", "sMITH", None)],
                relationships: vec![],
            },
            access: TreeAccess::default(),
            created_at: None,
            updated_at: None,
        };
        assert_eq!(tree_name_short(&tree), "J.Smith family");

        let empty = FamilyTree {
            data: FamilyGraph::new(),
            ..tree
        };
        assert_eq!(tree_name_short(&empty), "Ours");
    }

    #[test]
    fn sorting_puts_parents_first() {
        let g = lineage();
        let mut members: Vec<(&Person, Role)> = g
            .persons
            .iter()
            .map(|p| (p, person_role(&g, &p.id, "me")))
            .collect();
        sort_by_role(&mut members);
        let order: Vec<&str> = members.iter().map(|(p, _)| p.id.as_str()).collect();
        assert_eq!(order, vec!["dad", "gm", "ggf", "gggm", "me", "cousin"]);
    }
}
