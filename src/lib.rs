//! Multi-agent path finding with heterogeneous costs, reduced to
//! mixed-integer programs. Three solver flavors share the constraint
//! builders: continuous time with static conflict disjunctions, discrete
//! time over an unrolled horizon, and continuous time with lazily
//! generated conflict cuts.

pub mod common;
pub mod config;
pub mod cost;
pub mod detect;
pub mod error;
pub mod network;
pub mod scenario;
pub mod solver;
pub mod stat;

mod model;

pub use common::{Agent, Solution, StepPath, StepSolution, TimedPath};
pub use config::{Cli, SolveConfig, VertexVisit};
pub use cost::{EdgeTable, VertexTable};
pub use error::SolveError;
pub use network::Network;
pub use solver::{
    mapf_continuous_time, mapf_continuous_time_dynamic_conflict, mapf_discrete_time,
};
