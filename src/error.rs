use thiserror::Error;

/// Everything that can go wrong during a solve. Input problems are caught
/// before any model is built; solver problems carry the Gurobi status out.
#[derive(Debug, Error)]
pub enum SolveError {
    #[error("{sources} source vertices but {targets} target vertices")]
    AgentCountMismatch { sources: usize, targets: usize },

    #[error("vertex {vertex} is outside the network (1..={max})")]
    VertexOutOfRange { vertex: usize, max: usize },

    #[error("agents {0} and {1} share source vertex {2}")]
    DuplicateSource(usize, usize, usize),

    #[error("agents {0} and {1} share target vertex {2}")]
    DuplicateTarget(usize, usize, usize),

    #[error("agent {agent} departs at {value}, departures must be >= 0")]
    NegativeDeparture { agent: usize, value: f64 },

    #[error("{table} contains negative entry {value}")]
    NegativeEntry { table: &'static str, value: f64 },

    #[error("{table} has {got} {unit} entries, expected {want}")]
    TableSizeMismatch {
        table: &'static str,
        got: usize,
        want: usize,
        unit: &'static str,
    },

    #[error("agents collide on shared vertices:{0}")]
    OverlappingPaths(String),

    #[error("solver stopped with non-optimal status {0:?}")]
    NonOptimal(grb::Status),

    #[error(transparent)]
    Solver(#[from] grb::Error),
}
