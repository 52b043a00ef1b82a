use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// Nothing to lay out; callers render an empty placeholder.
    #[error("family graph has no persons")]
    EmptyGraph,
}
