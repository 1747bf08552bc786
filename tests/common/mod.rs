use thicket::{ElementNode, Query, QueryError, fixtures};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Runs `query` from `start` and returns the `id` of every match.
pub fn select_ids(query: &str, start: &ElementNode) -> Result<Vec<String>, QueryError> {
    let query: Query<ElementNode> = Query::compile(query)?;
    Ok(fixtures::ids(&query.select(start)?))
}

/// `root` with four same-level children `n1`..`n4`, each carrying an `id`
/// and one nested child of its own.
pub fn row() -> ElementNode {
    ElementNode::new("row").with_children_of((1..=4).map(|i| {
        ElementNode::new(format!("n{i}"))
            .with_attribute("id", format!("n{i}"))
            .with_child(ElementNode::new("inner").with_attribute("id", format!("n{i}.inner")))
    }))
}
