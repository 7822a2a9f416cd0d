use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use tracing::info;

use crate::config::SolveConfig;
use crate::cost::{EdgeTable, VertexTable};
use crate::error::SolveError;
use crate::network::Network;

fn one() -> f64 {
    1.0
}

/// YAML description of a solve: the network, the agents and uniform
/// parameters with optional per-vertex/per-edge overrides.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScenarioFile {
    pub vertices: usize,
    pub edges: Vec<[usize; 2]>,
    #[serde(default)]
    pub directed: bool,
    pub sources: Vec<usize>,
    pub targets: Vec<usize>,
    #[serde(default)]
    pub departures: Vec<f64>,
    #[serde(default = "one")]
    pub vertex_cost: f64,
    #[serde(default = "one")]
    pub vertex_wait: f64,
    #[serde(default = "one")]
    pub edge_cost: f64,
    #[serde(default = "one")]
    pub edge_wait: f64,
    #[serde(default)]
    pub edge_cost_overrides: Vec<(usize, usize, f64)>,
    #[serde(default)]
    pub vertex_wait_overrides: Vec<(usize, f64)>,
    #[serde(default)]
    pub swap_constraint: Option<bool>,
    #[serde(default)]
    pub timeout: Option<f64>,
}

impl ScenarioFile {
    pub fn load(path: &str) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_yaml::from_reader(reader)?)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn to_config(&self) -> Result<SolveConfig, SolveError> {
        let edges: Vec<(usize, usize)> = self.edges.iter().map(|&[u, v]| (u, v)).collect();
        let network = if self.directed {
            Network::directed(self.vertices, &edges)?
        } else {
            Network::undirected(self.vertices, &edges)?
        };

        let mut config = SolveConfig::new(network, &self.sources, &self.targets)?;
        for (agent, &departure) in config.agents.iter_mut().zip(self.departures.iter()) {
            agent.departure = departure;
        }

        let n = self.vertices;
        config.vertex_cost = VertexTable::uniform(n, self.vertex_cost);
        config.edge_cost = EdgeTable::from_overrides(
            n,
            self.edge_cost,
            &self.edge_cost_overrides,
            !self.directed,
        );
        config.edge_wait = EdgeTable::uniform(n, self.edge_wait);

        let mut waits = vec![self.vertex_wait; n];
        for &(v, wait) in &self.vertex_wait_overrides {
            waits[v - 1] = wait;
        }
        config.vertex_wait = VertexTable::Shared(waits);

        if let Some(swap) = self.swap_constraint {
            config.swap_constraint = swap;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }

        info!(
            "scenario: {} vertices, {} edges, {} agents",
            n,
            config.network.edge_count(),
            config.agents.len()
        );
        Ok(config)
    }
}

/// `a` agents on disjoint direct edges `i -> a+i`. Conflict-free by
/// construction.
pub fn parallel_lines(a: usize) -> Result<SolveConfig, SolveError> {
    let edges: Vec<(usize, usize)> = (1..=a).map(|i| (i, a + i)).collect();
    let network = Network::directed(2 * a, &edges)?;
    let sources: Vec<usize> = (1..=a).collect();
    let targets: Vec<usize> = (a + 1..=2 * a).collect();
    SolveConfig::new(network, &sources, &targets)
}

/// `a` agents all funneled through center vertex 1, which carries a dwell
/// time of 2. Agent `k` runs `2+k -> 1 -> a+2+k`.
pub fn directional_star(a: usize) -> Result<SolveConfig, SolveError> {
    let n = 2 * a + 1;
    let mut edges = Vec::with_capacity(2 * a);
    for k in 0..a {
        edges.push((2 + k, 1));
        edges.push((1, a + 2 + k));
    }
    let network = Network::directed(n, &edges)?;
    let sources: Vec<usize> = (2..a + 2).collect();
    let targets: Vec<usize> = (a + 2..n + 1).collect();

    let mut config = SolveConfig::new(network, &sources, &targets)?;
    let mut waits = vec![1.0; n];
    waits[0] = 2.0;
    config.vertex_wait = VertexTable::Shared(waits);
    Ok(config)
}

/// Two horizontal and two vertical agents crossing a 2x2 grid of shared
/// crossings. Crossings are 1..=4 (row-major), rows enter at 5/7 and leave
/// at 6/8, columns enter at 9/11 and leave at 10/12.
pub fn grid_cross() -> Result<SolveConfig, SolveError> {
    let edges = [
        // row 1: 5 -> 1 -> 2 -> 6, row 2: 7 -> 3 -> 4 -> 8
        (5, 1),
        (1, 2),
        (2, 6),
        (7, 3),
        (3, 4),
        (4, 8),
        // column 1: 9 -> 1 -> 3 -> 10, column 2: 11 -> 2 -> 4 -> 12
        (9, 1),
        (1, 3),
        (3, 10),
        (11, 2),
        (2, 4),
        (4, 12),
    ];
    let network = Network::directed(12, &edges)?;
    SolveConfig::new(network, &[5, 7, 9, 11], &[6, 8, 10, 12])
}

/// Outer cycle `2..=a+1` with spokes to center vertex 1, all undirected.
/// Agent `k` starts on outer vertex `k` and targets the outer vertex
/// `shift` positions behind it.
pub fn wheel_pass(a: usize, shift: usize) -> Result<SolveConfig, SolveError> {
    let n = a + 1;
    let mut edges = Vec::with_capacity(2 * a);
    for k in 0..a {
        let here = 2 + k;
        let next = 2 + (k + 1) % a;
        edges.push((here, next));
        edges.push((here, 1));
    }
    let network = Network::undirected(n, &edges)?;
    let sources: Vec<usize> = (0..a).map(|k| 2 + k).collect();
    let targets: Vec<usize> = (0..a).map(|k| 2 + (k + a - shift % a) % a).collect();
    SolveConfig::new(network, &sources, &targets)
}

/// The two-branch merge fixture: three agents contending for the cheap
/// corridor through vertices 2 and 6.
pub fn two_branch_merge() -> Result<SolveConfig, SolveError> {
    let scenario = ScenarioFile {
        vertices: 8,
        edges: vec![
            [1, 2],
            [2, 3],
            [2, 4],
            [2, 6],
            [3, 6],
            [4, 5],
            [5, 6],
            [6, 7],
            [6, 8],
        ],
        directed: false,
        sources: vec![1, 4, 8],
        targets: vec![7, 8, 3],
        departures: Vec::new(),
        vertex_cost: 1.0,
        vertex_wait: 1.0,
        edge_cost: 1.0,
        edge_wait: 1.0,
        edge_cost_overrides: vec![
            (2, 6, 2.0),
            (3, 6, 80.0),
            (4, 5, 20.0),
            (5, 6, 10.0),
        ],
        vertex_wait_overrides: Vec::new(),
        swap_constraint: None,
        timeout: None,
    };
    scenario.to_config()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_from_yaml() {
        let yaml = "
vertices: 4
edges:
  - [1, 2]
  - [2, 3]
  - [3, 4]
directed: true
sources: [1]
targets: [4]
edge_cost: 2.0
vertex_wait_overrides:
  - [2, 5.0]
";
        let scenario = ScenarioFile::from_yaml_str(yaml).unwrap();
        let config = scenario.to_config().unwrap();

        assert_eq!(config.network.edge_count(), 3);
        assert_eq!(config.agents.len(), 1);
        assert_eq!(config.edge_cost.get(0, 1, 2), 2.0);
        assert_eq!(config.vertex_wait.get(0, 2), 5.0);
        assert_eq!(config.vertex_wait.get(0, 3), 1.0);
    }

    #[test]
    fn test_load_scenario_file() {
        let scenario = ScenarioFile::load("scenarios/two_branch.yaml").unwrap();
        let config = scenario.to_config().unwrap();

        assert_eq!(config.agents.len(), 3);
        assert_eq!(config.network.edge_count(), 18);
        assert_eq!(config.edge_cost.get(0, 6, 3), 80.0);
    }

    #[test]
    fn test_parallel_lines_shape() {
        let config = parallel_lines(3).unwrap();
        assert_eq!(config.network.vertex_count(), 6);
        assert_eq!(config.network.edge_count(), 3);
        assert_eq!(config.agents[1].source, 2);
        assert_eq!(config.agents[1].target, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_star_waits_at_center() {
        let config = directional_star(3).unwrap();
        assert_eq!(config.network.vertex_count(), 7);
        assert_eq!(config.vertex_wait.get(0, 1), 2.0);
        assert_eq!(config.vertex_wait.get(0, 4), 1.0);
        // every agent routes through the center
        for agent in &config.agents {
            assert!(config.network.edge_id(agent.source, 1).is_some());
            assert!(config.network.edge_id(1, agent.target).is_some());
        }
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_wheel_pass_shape() {
        let config = wheel_pass(4, 1).unwrap();
        assert_eq!(config.network.vertex_count(), 5);
        // outer cycle and spokes, both directions
        assert_eq!(config.network.edge_count(), 16);
        let sources: Vec<usize> = config.agents.iter().map(|a| a.source).collect();
        let targets: Vec<usize> = config.agents.iter().map(|a| a.target).collect();
        assert_eq!(sources, vec![2, 3, 4, 5]);
        assert_eq!(targets, vec![5, 2, 3, 4]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_two_branch_merge_costs() {
        let config = two_branch_merge().unwrap();
        assert_eq!(config.network.vertex_count(), 8);
        assert_eq!(config.network.edge_count(), 18);
        assert_eq!(config.edge_cost.get(0, 3, 6), 80.0);
        assert_eq!(config.edge_cost.get(0, 6, 3), 80.0);
        assert_eq!(config.edge_cost.get(1, 2, 6), 2.0);
        assert_eq!(config.edge_cost.get(2, 1, 2), 1.0);
        assert!(config.validate().is_ok());
    }
}
