use thiserror::Error;

/// Error raised by the [grammar analysis](super::prepare_grammar)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// No rule of a left-recursive group lies on every one of its cycles
    #[error("no leader found for the left-recursive rules {}", .0.join(", "))]
    NoLeader(Vec<String>),

    /// The start vertex of a cycle search is not part of the searched component
    #[error("strongly connected component does not contain the start vertex {0:?}")]
    StartNotInScc(String),

    /// Some vertices of the searched component are not keys of the graph
    #[error("vertices {} of the component are missing from the graph", .0.join(", "))]
    MissingVertices(Vec<String>),
}
