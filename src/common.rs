use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::detect;
use crate::network::Network;
use crate::stat::Stats;

/// A routed entity. `id` is the agent's position in the configuration's
/// agent list and doubles as its row index in every variable grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: usize,
    pub source: usize,
    pub target: usize,
    pub departure: f64,
}

impl Agent {
    pub fn verify(&self, network: &Network) -> bool {
        network.contains(self.source) && network.contains(self.target)
    }
}

/// One agent's itinerary in continuous time: `(arrival time, vertex)` pairs
/// and `(entry time, edge)` pairs, both ascending by time. A well-formed
/// itinerary has one more vertex than edges; `edges[i]` leaves
/// `vertices[i]` and arrives at `vertices[i + 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedPath {
    pub vertices: Vec<(f64, usize)>,
    pub edges: Vec<(f64, (usize, usize))>,
}

impl TimedPath {
    pub fn vertex_sequence(&self) -> Vec<usize> {
        self.vertices.iter().map(|&(_, v)| v).collect()
    }

    /// Arrival time at the final vertex.
    pub fn arrival(&self) -> Option<f64> {
        self.vertices.last().map(|&(t, _)| t)
    }
}

/// One agent's itinerary in discrete time, indexed by step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepPath {
    pub vertices: Vec<(usize, usize)>,
    pub edges: Vec<(usize, (usize, usize))>,
}

#[derive(Debug, Clone)]
pub struct Solution {
    pub paths: Vec<TimedPath>,
    pub objective: f64,
    pub stats: Stats,
}

impl Solution {
    /// Replays the solution against the network: every path must be a
    /// contiguous timed walk from its agent's source to its target, and the
    /// set of paths must be conflict-free.
    pub fn verify(&self, network: &Network, agents: &[Agent], swap: bool) -> bool {
        if self.paths.len() != agents.len() {
            error!("incomplete solution");
            return false;
        }

        for (path, agent) in self.paths.iter().zip(agents.iter()) {
            if path.vertices.len() != path.edges.len() + 1 {
                error!(
                    "agent {} itinerary has {} vertices for {} edges",
                    agent.id,
                    path.vertices.len(),
                    path.edges.len()
                );
                return false;
            }

            if path.vertices.first().is_none_or(|&(_, v)| v != agent.source)
                || path.vertices.last().is_none_or(|&(_, v)| v != agent.target)
            {
                error!(
                    "agent {} path endpoints {:?} -> {:?} do not match source {} target {}",
                    agent.id,
                    path.vertices.first(),
                    path.vertices.last(),
                    agent.source,
                    agent.target
                );
                return false;
            }

            for (i, &(entry, (u, v))) in path.edges.iter().enumerate() {
                let (arrived_u, at_u) = path.vertices[i];
                let (arrived_v, at_v) = path.vertices[i + 1];
                if u != at_u || v != at_v {
                    error!("agent {} edge ({u},{v}) does not join its walk", agent.id);
                    return false;
                }
                if network.edge_id(u, v).is_none() {
                    error!(
                        "agent {} uses edge ({u},{v}) missing from the network",
                        agent.id
                    );
                    return false;
                }
                if entry < arrived_u || arrived_v <= arrived_u {
                    error!("agent {} timing is not monotone around ({u},{v})", agent.id);
                    return false;
                }
            }
        }

        if let Some(conflict) =
            detect::first_conflict(&self.paths, swap, detect::DEFAULT_DETECT_EPS)
        {
            error!("solution still conflicts: {conflict:?}");
            return false;
        }

        true
    }

    pub fn log_solution(&self, solver: &str) {
        let mut formatted = String::new();
        for (index, path) in self.paths.iter().enumerate() {
            formatted.push_str(&format!(" agent{}:\n", index));
            for &(t, v) in &path.vertices {
                formatted.push_str(&format!("   - v: {}\n     t: {:.3}\n", v, t));
            }
        }
        debug!("{} solution:\n{}", solver, formatted);
    }
}

#[derive(Debug, Clone)]
pub struct StepSolution {
    pub paths: Vec<StepPath>,
    pub objective: f64,
    pub stats: Stats,
}

impl StepSolution {
    /// Per-step occupancy check: no vertex or edge cell is shared, and no
    /// edge is traversed in both directions in the same step.
    pub fn verify(&self, agents: &[Agent]) -> bool {
        use std::collections::HashSet;

        if self.paths.len() != agents.len() {
            error!("incomplete solution");
            return false;
        }

        for (path, agent) in self.paths.iter().zip(agents.iter()) {
            // an agent may depart straight onto an outgoing edge, and may
            // reach its target in the final step
            let starts_at_source = match (path.vertices.first(), path.edges.first()) {
                (Some(&(tv, v)), Some(&(te, (u, _)))) => {
                    if te < tv {
                        u == agent.source
                    } else {
                        v == agent.source
                    }
                }
                (Some(&(_, v)), None) => v == agent.source,
                (None, Some(&(_, (u, _)))) => u == agent.source,
                (None, None) => false,
            };
            let ends_at_target = match (path.vertices.last(), path.edges.last()) {
                (Some(&(tv, v)), Some(&(te, (_, w)))) => {
                    if te > tv {
                        w == agent.target
                    } else {
                        v == agent.target
                    }
                }
                (Some(&(_, v)), None) => v == agent.target,
                (None, Some(&(_, (_, w)))) => w == agent.target,
                (None, None) => false,
            };
            if !starts_at_source || !ends_at_target {
                error!("agent {} step path misses its endpoints", agent.id);
                return false;
            }
        }

        let horizon = self
            .paths
            .iter()
            .flat_map(|p| p.vertices.iter().map(|&(t, _)| t + 1))
            .max()
            .unwrap_or(0);

        for step in 0..horizon {
            let mut seen_vertices = HashSet::new();
            let mut seen_edges = HashSet::new();
            for path in &self.paths {
                for &(t, v) in &path.vertices {
                    if t == step && !seen_vertices.insert(v) {
                        error!("vertex conflict at {v} in step {step}");
                        return false;
                    }
                }
                for &(t, (u, v)) in &path.edges {
                    if t == step && (!seen_edges.insert((u, v)) || seen_edges.contains(&(v, u))) {
                        error!("edge conflict on ({u},{v}) in step {step}");
                        return false;
                    }
                }
            }
        }

        true
    }

    pub fn log_solution(&self, solver: &str) {
        let mut formatted = String::new();
        for (index, path) in self.paths.iter().enumerate() {
            formatted.push_str(&format!(" agent{}:\n", index));
            for &(t, v) in &path.vertices {
                formatted.push_str(&format!("   - v: {}\n     t: {}\n", v, t));
            }
        }
        debug!("{} solution:\n{}", solver, formatted);
    }
}
