use std::collections::BTreeMap;

use crate::common::TimedPath;
use crate::error::SolveError;

/// Tolerance separating "just after" from "simultaneous". Subtracted from
/// every leave time so that back-to-back occupations do not read as
/// conflicts.
pub const DEFAULT_DETECT_EPS: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub enum Conflict {
    Vertex {
        vertex: usize,
        agent_1: usize,
        agent_2: usize,
    },
    Edge {
        /// The contested edge as traversed by `agent_1`.
        edge: (usize, usize),
        agent_1: usize,
        agent_2: usize,
        swap: bool,
    },
}

#[derive(Debug, Clone, Copy)]
struct Event {
    time: f64,
    enter: bool,
    agent: usize,
    /// Edge events only: the agent traverses the key's reversed direction.
    inverted: bool,
    edge: (usize, usize),
}

/// First vertex conflict among the timed paths, scanning vertices in
/// ascending order. Agents enter and leave each vertex in alternating
/// order when the paths are conflict-free; two adjacent events of the same
/// kind name the offending pair.
pub fn detect_vertex_conflict(paths: &[TimedPath], eps: f64) -> Option<Conflict> {
    let mut events: BTreeMap<usize, Vec<Event>> = BTreeMap::new();

    for (agent, path) in paths.iter().enumerate() {
        for (i, &(enter, vertex)) in path.vertices.iter().enumerate() {
            // the final vertex is occupied for good
            let leave = match path.edges.get(i) {
                Some(&(t, _)) => t,
                None => f64::INFINITY,
            };
            if leave.is_finite() && leave - enter <= eps {
                continue;
            }
            let list = events.entry(vertex).or_default();
            list.push(Event {
                time: enter,
                enter: true,
                agent,
                inverted: false,
                edge: (0, 0),
            });
            list.push(Event {
                time: leave - eps,
                enter: false,
                agent,
                inverted: false,
                edge: (0, 0),
            });
        }
    }

    for (vertex, mut list) in events {
        if let Some((first, second)) = scan_alternation(&mut list) {
            return Some(Conflict::Vertex {
                vertex,
                agent_1: first.agent.min(second.agent),
                agent_2: first.agent.max(second.agent),
            });
        }
    }
    None
}

/// First edge conflict among the timed paths. With `detect_swap`, edges are
/// keyed by ascending endpoints and anti-parallel traversals land in the
/// same event list; a conflict whose two agents disagree on the direction
/// flag is a swap.
pub fn detect_edge_conflict(paths: &[TimedPath], detect_swap: bool, eps: f64) -> Option<Conflict> {
    let mut events: BTreeMap<(usize, usize), Vec<Event>> = BTreeMap::new();

    for (agent, path) in paths.iter().enumerate() {
        for (i, &(enter, (u, v))) in path.edges.iter().enumerate() {
            let leave = path.vertices[i + 1].0;
            if leave - enter <= eps {
                continue;
            }
            let (key, inverted) = if detect_swap && u > v {
                ((v, u), true)
            } else {
                ((u, v), false)
            };
            let list = events.entry(key).or_default();
            list.push(Event {
                time: enter,
                enter: true,
                agent,
                inverted,
                edge: (u, v),
            });
            list.push(Event {
                time: leave - eps,
                enter: false,
                agent,
                inverted,
                edge: (u, v),
            });
        }
    }

    for (_, mut list) in events {
        if let Some((first, second)) = scan_alternation(&mut list) {
            let (lo, hi) = if first.agent <= second.agent {
                (first, second)
            } else {
                (second, first)
            };
            return Some(Conflict::Edge {
                edge: lo.edge,
                agent_1: lo.agent,
                agent_2: hi.agent,
                swap: first.inverted != second.inverted,
            });
        }
    }
    None
}

/// Vertex conflicts take precedence over edge conflicts, mirroring the
/// order in which the dynamic loop resolves them.
pub fn first_conflict(paths: &[TimedPath], detect_swap: bool, eps: f64) -> Option<Conflict> {
    detect_vertex_conflict(paths, eps)
        .or_else(|| detect_edge_conflict(paths, detect_swap, eps))
}

fn scan_alternation(list: &mut [Event]) -> Option<(Event, Event)> {
    list.sort_by(|a, b| a.time.total_cmp(&b.time).then(a.enter.cmp(&b.enter)));
    list.windows(2).find_map(|pair| {
        if pair[0].enter == pair[1].enter && pair[0].agent != pair[1].agent {
            Some((pair[0], pair[1]))
        } else {
            None
        }
    })
}

/// Vertices used by more than one agent in the untimed relaxation, with the
/// colliding agent indices.
pub fn shared_vertices(vertex_paths: &[Vec<usize>]) -> BTreeMap<usize, Vec<usize>> {
    let mut users: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (agent, path) in vertex_paths.iter().enumerate() {
        for &v in path {
            let list = users.entry(v).or_default();
            if list.last() != Some(&agent) {
                list.push(agent);
            }
        }
    }
    users.retain(|_, agents| agents.len() > 1);
    users
}

pub fn shared_edges(edge_paths: &[Vec<(usize, usize)>]) -> BTreeMap<(usize, usize), Vec<usize>> {
    let mut users: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
    for (agent, path) in edge_paths.iter().enumerate() {
        for &e in path {
            let list = users.entry(e).or_default();
            if list.last() != Some(&agent) {
                list.push(agent);
            }
        }
    }
    users.retain(|_, agents| agents.len() > 1);
    users
}

/// True when no vertex and no edge is used by two different agents. This is
/// the test that lets the dynamic solver skip timing altogether.
pub fn paths_disjoint(vertex_paths: &[Vec<usize>], edge_paths: &[Vec<(usize, usize)>]) -> bool {
    shared_vertices(vertex_paths).is_empty() && shared_edges(edge_paths).is_empty()
}

/// Assertion form of the overlap check: fails with a message listing every
/// contested vertex and the agents colliding on it.
pub fn assert_disjoint(vertex_paths: &[Vec<usize>]) -> Result<(), SolveError> {
    let shared = shared_vertices(vertex_paths);
    if shared.is_empty() {
        return Ok(());
    }
    let mut message = String::new();
    for (vertex, agents) in &shared {
        let agents = agents
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        message.push_str(&format!("\n  vertex {} shared by agents {}", vertex, agents));
    }
    Err(SolveError::OverlappingPaths(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timed(vertices: &[(f64, usize)], edges: &[(f64, (usize, usize))]) -> TimedPath {
        TimedPath {
            vertices: vertices.to_vec(),
            edges: edges.to_vec(),
        }
    }

    #[test]
    fn test_vertex_conflict_on_overlapping_dwell() {
        let a = timed(
            &[(0.0, 1), (1.0, 2), (3.0, 3)],
            &[(0.5, (1, 2)), (2.0, (2, 3))],
        );
        let b = timed(
            &[(0.0, 4), (1.5, 2), (4.0, 5)],
            &[(0.5, (4, 2)), (2.5, (2, 5))],
        );

        let conflict = detect_vertex_conflict(&[a, b], DEFAULT_DETECT_EPS);
        assert_eq!(
            conflict,
            Some(Conflict::Vertex {
                vertex: 2,
                agent_1: 0,
                agent_2: 1
            })
        );
    }

    #[test]
    fn test_sequential_dwells_do_not_conflict() {
        // agent 1 enters vertex 2 exactly when agent 0 starts leaving
        let a = timed(
            &[(0.0, 1), (1.0, 2), (3.0, 3)],
            &[(0.5, (1, 2)), (2.0, (2, 3))],
        );
        let b = timed(
            &[(1.0, 4), (2.0, 2), (4.0, 5)],
            &[(1.5, (4, 2)), (3.0, (2, 5))],
        );

        assert_eq!(detect_vertex_conflict(&[a, b], DEFAULT_DETECT_EPS), None);
    }

    #[test]
    fn test_zero_length_dwell_is_skipped() {
        // agent 0 passes straight through vertex 2 (zero dwell) while agent 1
        // sits on it
        let a = timed(
            &[(0.0, 1), (1.0, 2), (2.0, 3)],
            &[(0.5, (1, 2)), (1.0, (2, 3))],
        );
        let b = timed(&[(0.5, 2), (5.0, 4)], &[(4.0, (2, 4))]);

        assert_eq!(detect_vertex_conflict(&[a, b], DEFAULT_DETECT_EPS), None);
    }

    #[test]
    fn test_parked_target_conflicts_with_later_arrival() {
        let a = timed(&[(0.0, 1), (5.0, 2)], &[(4.0, (1, 2))]);
        let b = timed(&[(0.0, 3), (7.0, 2)], &[(6.0, (3, 2))]);

        let conflict = detect_vertex_conflict(&[a, b], DEFAULT_DETECT_EPS);
        assert_eq!(
            conflict,
            Some(Conflict::Vertex {
                vertex: 2,
                agent_1: 0,
                agent_2: 1
            })
        );
    }

    #[test]
    fn test_edge_conflict_same_direction() {
        let a = timed(&[(0.0, 1), (3.0, 2)], &[(1.0, (1, 2))]);
        let b = timed(&[(0.0, 3), (4.0, 2)], &[(2.0, (1, 2))]);

        let conflict = detect_edge_conflict(&[a, b], false, DEFAULT_DETECT_EPS);
        assert_eq!(
            conflict,
            Some(Conflict::Edge {
                edge: (1, 2),
                agent_1: 0,
                agent_2: 1,
                swap: false
            })
        );
    }

    #[test]
    fn test_swap_conflict_only_with_detection_enabled() {
        let a = timed(&[(0.0, 1), (2.0, 2)], &[(1.0, (1, 2))]);
        let b = timed(&[(0.0, 2), (2.2, 1)], &[(1.2, (2, 1))]);

        assert_eq!(
            detect_edge_conflict(&[a.clone(), b.clone()], false, DEFAULT_DETECT_EPS),
            None
        );

        let conflict = detect_edge_conflict(&[a, b], true, DEFAULT_DETECT_EPS);
        assert_eq!(
            conflict,
            Some(Conflict::Edge {
                edge: (1, 2),
                agent_1: 0,
                agent_2: 1,
                swap: true
            })
        );
    }

    #[test]
    fn test_overlap_check() {
        // 1 2 3 | 4 5 2 | 6 2 4 collides on vertices 2 and 4
        let overlapping = vec![vec![1, 2, 3], vec![4, 5, 2], vec![6, 2, 4]];
        let shared = shared_vertices(&overlapping);
        assert_eq!(shared.get(&2), Some(&vec![0, 1, 2]));
        assert_eq!(shared.get(&4), Some(&vec![1, 2]));
        assert!(!paths_disjoint(&overlapping, &[]));

        let disjoint = vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9, 10]];
        assert!(shared_vertices(&disjoint).is_empty());
        assert!(paths_disjoint(&disjoint, &[]));
    }

    #[test]
    fn test_overlap_assertion_lists_colliders() {
        let overlapping = vec![vec![1, 2, 3], vec![4, 5, 2], vec![6, 2, 4]];
        let err = assert_disjoint(&overlapping).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("vertex 2 shared by agents 0, 1, 2"));
        assert!(message.contains("vertex 4 shared by agents 1, 2"));

        assert!(assert_disjoint(&[vec![1, 2], vec![3, 4]]).is_ok());
    }
}
