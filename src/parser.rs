use crate::ir::{FamilyGraph, FamilyTree};
use anyhow::{Result, anyhow};
use serde_json::Value;

#[derive(Debug, Default)]
pub struct ParseOutput {
    pub graph: FamilyGraph,
    /// Present when the input was a stored tree rather than a bare graph.
    pub tree: Option<FamilyTree>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Tree,
    Graph,
}

/// Reads a family graph `{persons, relationships}` or a stored tree
/// `{id, data: {persons, relationships}, access}`. JSON5 is accepted.
pub fn parse_family(input: &str) -> Result<ParseOutput> {
    let value: Value = json5::from_str(input)?;
    let output = match detect_document_kind(&value)? {
        DocumentKind::Tree => {
            let tree: FamilyTree = serde_json::from_value(value)?;
            ParseOutput {
                graph: tree.data.clone(),
                tree: Some(tree),
            }
        }
        DocumentKind::Graph => ParseOutput {
            graph: serde_json::from_value(value)?,
            tree: None,
        },
    };
    report_dangling(&output.graph);
    Ok(output)
}

fn detect_document_kind(value: &Value) -> Result<DocumentKind> {
    let object = value
        .as_object()
        .ok_or_else(|| anyhow!("expected a JSON object with `persons` or `data`"))?;
    if object.get("data").is_some_and(Value::is_object) {
        return Ok(DocumentKind::Tree);
    }
    if object.contains_key("persons") || object.contains_key("relationships") {
        return Ok(DocumentKind::Graph);
    }
    Err(anyhow!("expected a JSON object with `persons` or `data`"))
}

/// Relationships naming unknown persons are kept; layout ignores them.
fn report_dangling(graph: &FamilyGraph) {
    let dangling = graph
        .relationships
        .iter()
        .filter(|rel| !graph.contains(&rel.parent_id) || !graph.contains(&rel.child_id))
        .count();
    if dangling > 0 {
        tracing::warn!(dangling, "relationships reference unknown persons");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_graph() {
        let parsed = parse_family(
            r#"{
                persons: [{ id: "p1", firstName: "Ann", lastName: "Lee" }],
                relationships: [],
            }"#,
        )
        .unwrap();
        assert!(parsed.tree.is_none());
        assert_eq!(parsed.graph.persons[0].data.first_name, "Ann");
    }

    #[test]
    fn parses_stored_tree() {
        let parsed = parse_family(
            r#"{"id":"t1","data":{"persons":[{"id":"p1","firstName":"A","lastName":"B"}],"relationships":[]},"access":{"owner":["a@x"]}}"#,
        )
        .unwrap();
        let tree = parsed.tree.unwrap();
        assert_eq!(tree.id, "t1");
        assert_eq!(tree.access.owner, vec!["a@x".to_string()]);
        assert_eq!(parsed.graph.persons.len(), 1);
    }

    #[test]
    fn rejects_other_documents() {
        assert!(parse_family("[1, 2]").is_err());
        assert!(parse_family(r#"{"nodes": []}"#).is_err());
        assert!(parse_family("not json").is_err());
    }
}
