use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::common::Agent;
use crate::cost::{EdgeTable, VertexTable};
use crate::error::SolveError;
use crate::network::Network;

#[derive(Parser, Debug)]
#[command(
    name = "mapf-milp",
    about = "Multi-agent path finding solved as mixed-integer programs.",
    version = "0.1"
)]
pub struct Cli {
    #[arg(long, short, help = "Path to the YAML scenario file")]
    pub scenario: String,

    #[arg(
        long,
        short,
        default_value = "dynamic",
        help = "Solver flavor: continuous, dynamic or discrete"
    )]
    pub mode: String,
}

/// Whether an agent entering a vertex over an inbound edge must pay a dwell
/// step there. `Auto` only enforces the dwell where the vertex costs
/// something, so free-to-pass vertices are not penalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VertexVisit {
    Auto,
    Yes,
    No,
}

/// Everything one solve needs: the network, the agents, the four parameter
/// tables and the solver knobs. Built once per problem; `validate` runs
/// before any model construction.
#[derive(Debug, Clone)]
pub struct SolveConfig {
    pub network: Network,
    pub agents: Vec<Agent>,
    pub vertex_cost: VertexTable,
    pub edge_cost: EdgeTable,
    pub vertex_wait: VertexTable,
    pub edge_wait: EdgeTable,
    /// Solve as a MILP; when false every binary becomes a `[0, 1]` bound
    /// and the answer is only the LP lower bound.
    pub integer: bool,
    pub swap_constraint: bool,
    /// Big-M override. Must strictly upper-bound every feasible arrival
    /// time; `big_m()` derives a conservative default when unset.
    pub time_horizon: Option<f64>,
    /// Discrete horizon `T`; defaults to the number of edges.
    pub time_duration: Option<usize>,
    pub vertex_binding: bool,
    pub vertex_visit: VertexVisit,
    /// Resolve dynamic conflicts with a single ordering constraint picked
    /// from the incumbent instead of a binary disjunction.
    pub heuristic_conflict: bool,
    /// Safety gap override for dynamically generated ordering constraints.
    pub epsilon: Option<f64>,
    /// Solver time limit in seconds, `-1.0` for unlimited.
    pub timeout: f64,
}

impl SolveConfig {
    /// A config with unit costs and waits, zero departures and the default
    /// knobs. `sources[i]` and `targets[i]` describe agent `i`.
    pub fn new(
        network: Network,
        sources: &[usize],
        targets: &[usize],
    ) -> Result<Self, SolveError> {
        if sources.len() != targets.len() {
            return Err(SolveError::AgentCountMismatch {
                sources: sources.len(),
                targets: targets.len(),
            });
        }
        let agents = sources
            .iter()
            .zip(targets.iter())
            .enumerate()
            .map(|(id, (&source, &target))| Agent {
                id,
                source,
                target,
                departure: 0.0,
            })
            .collect();
        let n = network.vertex_count();
        Ok(SolveConfig {
            network,
            agents,
            vertex_cost: VertexTable::uniform(n, 1.0),
            edge_cost: EdgeTable::uniform(n, 1.0),
            vertex_wait: VertexTable::uniform(n, 1.0),
            edge_wait: EdgeTable::uniform(n, 1.0),
            integer: true,
            swap_constraint: true,
            time_horizon: None,
            time_duration: None,
            vertex_binding: false,
            vertex_visit: VertexVisit::Auto,
            heuristic_conflict: false,
            epsilon: None,
            timeout: -1.0,
        })
    }

    pub fn validate(&self) -> Result<(), SolveError> {
        let n = self.network.vertex_count();

        for agent in &self.agents {
            for vertex in [agent.source, agent.target] {
                if !self.network.contains(vertex) {
                    return Err(SolveError::VertexOutOfRange { vertex, max: n });
                }
            }
            if agent.departure < 0.0 {
                return Err(SolveError::NegativeDeparture {
                    agent: agent.id,
                    value: agent.departure,
                });
            }
        }

        for i in 0..self.agents.len() {
            for j in (i + 1)..self.agents.len() {
                if self.agents[i].source == self.agents[j].source {
                    return Err(SolveError::DuplicateSource(i, j, self.agents[i].source));
                }
                if self.agents[i].target == self.agents[j].target {
                    return Err(SolveError::DuplicateTarget(i, j, self.agents[i].target));
                }
            }
        }

        self.vertex_cost.validate("vertex_cost", &self.agents, n)?;
        self.edge_cost.validate("edge_cost", &self.agents, n)?;
        self.vertex_wait.validate("vertex_wait", &self.agents, n)?;
        self.edge_wait.validate("edge_wait", &self.agents, n)?;
        Ok(())
    }

    /// The big-M for timing and conflict disjunctions. The derived bound
    /// `A * |E| * max(edge_wait) + max(departure)` upper-bounds any arrival
    /// on a simple path; an override below it is suspicious and gets a
    /// warning, since an undersized horizon silently prunes solutions.
    pub fn big_m(&self) -> f64 {
        let derived = self.agents.len() as f64
            * self.network.edge_count() as f64
            * self.edge_wait.max_value()
            + self
                .agents
                .iter()
                .map(|a| a.departure)
                .fold(0.0, f64::max);
        match self.time_horizon {
            Some(horizon) => {
                if horizon < derived {
                    warn!(
                        "time horizon {} is below the derived bound {}, feasible solutions may be cut off",
                        horizon, derived
                    );
                }
                horizon
            }
            None => derived,
        }
    }

    /// Safety gap for lazily generated ordering constraints.
    pub fn safety_gap(&self) -> f64 {
        if let Some(eps) = self.epsilon {
            return eps;
        }
        let smallest_wait = [
            self.vertex_wait.min_positive(),
            self.edge_wait.min_positive(),
        ]
        .into_iter()
        .flatten()
        .reduce(f64::min);
        1e-4 * smallest_wait.unwrap_or(1.0)
    }

    /// Discrete horizon `T`.
    pub fn horizon(&self) -> usize {
        self.time_duration.unwrap_or(self.network.edge_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_network() -> Network {
        Network::directed(4, &[(1, 2), (2, 3), (3, 4)]).unwrap()
    }

    #[test]
    fn test_duplicate_endpoints_rejected() {
        let config = SolveConfig::new(line_network(), &[1, 1], &[3, 4]).unwrap();
        assert!(matches!(
            config.validate(),
            Err(SolveError::DuplicateSource(0, 1, 1))
        ));

        let config = SolveConfig::new(line_network(), &[1, 2], &[4, 4]).unwrap();
        assert!(matches!(
            config.validate(),
            Err(SolveError::DuplicateTarget(0, 1, 4))
        ));
    }

    #[test]
    fn test_length_mismatch_and_range() {
        assert!(matches!(
            SolveConfig::new(line_network(), &[1, 2], &[4]),
            Err(SolveError::AgentCountMismatch {
                sources: 2,
                targets: 1
            })
        ));

        let config = SolveConfig::new(line_network(), &[1], &[9]).unwrap();
        assert!(matches!(
            config.validate(),
            Err(SolveError::VertexOutOfRange { vertex: 9, max: 4 })
        ));
    }

    #[test]
    fn test_negative_departure_rejected() {
        let mut config = SolveConfig::new(line_network(), &[1], &[4]).unwrap();
        config.agents[0].departure = -1.0;
        assert!(matches!(
            config.validate(),
            Err(SolveError::NegativeDeparture { agent: 0, .. })
        ));
    }

    #[test]
    fn test_big_m_default_and_override() {
        let mut config = SolveConfig::new(line_network(), &[1, 2], &[3, 4]).unwrap();
        config.agents[1].departure = 5.0;
        // 2 agents * 3 edges * unit travel + latest departure
        assert_eq!(config.big_m(), 11.0);

        config.time_horizon = Some(100.0);
        assert_eq!(config.big_m(), 100.0);
    }

    #[test]
    fn test_safety_gap_scales_with_waits() {
        let mut config = SolveConfig::new(line_network(), &[1], &[4]).unwrap();
        assert_eq!(config.safety_gap(), 1e-4);

        config.vertex_wait = VertexTable::uniform(4, 0.5);
        assert_eq!(config.safety_gap(), 0.5e-4);

        config.epsilon = Some(1e-2);
        assert_eq!(config.safety_gap(), 1e-2);
    }

    #[test]
    fn test_horizon_defaults_to_edge_count() {
        let mut config = SolveConfig::new(line_network(), &[1], &[4]).unwrap();
        assert_eq!(config.horizon(), 3);
        config.time_duration = Some(10);
        assert_eq!(config.horizon(), 10);
    }
}
