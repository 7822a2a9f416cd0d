use grb::prelude::*;

use crate::common::{Agent, StepPath, TimedPath};
use crate::model::{SelectionVars, StepVars, TimingVars};
use crate::network::Network;

/// Threshold above which a relaxed binary counts as selected.
const SELECTED: f64 = 0.5;

/// Timed itineraries from the solved model: selected vertices paired with
/// their arrival times and selected edges with their entry times, each
/// sorted ascending.
pub(crate) fn timed_paths(
    model: &Model,
    network: &Network,
    agents: &[Agent],
    sel: &SelectionVars,
    tim: &TimingVars,
) -> grb::Result<Vec<TimedPath>> {
    let mut paths = Vec::with_capacity(agents.len());
    for agent in agents {
        let a = agent.id;
        let mut vertices = Vec::new();
        for v in network.vertices() {
            if model.get_obj_attr(attr::X, &sel.y(a, v))? > SELECTED {
                vertices.push((model.get_obj_attr(attr::X, &tim.vertex(a, v))?, v));
            }
        }
        vertices.sort_by(|l, r| l.0.total_cmp(&r.0));

        let mut edges = Vec::new();
        for (e, &(u, v)) in network.edges().iter().enumerate() {
            if model.get_obj_attr(attr::X, &sel.x(a, e))? > SELECTED {
                edges.push((model.get_obj_attr(attr::X, &tim.edge(a, e))?, (u, v)));
            }
        }
        edges.sort_by(|l, r| l.0.total_cmp(&r.0));

        paths.push(TimedPath { vertices, edges });
    }
    Ok(paths)
}

/// Ordered source-to-target walks read off the selection alone, for the
/// phase where no timing variables exist yet.
pub(crate) fn selected_walks(
    model: &Model,
    network: &Network,
    agents: &[Agent],
    sel: &SelectionVars,
) -> grb::Result<(Vec<Vec<usize>>, Vec<Vec<(usize, usize)>>)> {
    let mut vertex_walks = Vec::with_capacity(agents.len());
    let mut edge_walks = Vec::with_capacity(agents.len());
    for agent in agents {
        let mut vertices = vec![agent.source];
        let mut edges = Vec::new();
        let mut at = agent.source;
        while at != agent.target && vertices.len() <= network.vertex_count() {
            match selected_out_edge(model, network, sel, agent.id, at)? {
                Some(e) => {
                    let (u, v) = network.edge(e);
                    edges.push((u, v));
                    vertices.push(v);
                    at = v;
                }
                None => break,
            }
        }
        vertex_walks.push(vertices);
        edge_walks.push(edges);
    }
    Ok((vertex_walks, edge_walks))
}

/// The outbound edge the agent takes out of `v` in the current solution,
/// if any.
pub(crate) fn selected_out_edge(
    model: &Model,
    network: &Network,
    sel: &SelectionVars,
    agent: usize,
    v: usize,
) -> grb::Result<Option<usize>> {
    for &e in network.out_edges(v) {
        if model.get_obj_attr(attr::X, &sel.x(agent, e))? > SELECTED {
            return Ok(Some(e));
        }
    }
    Ok(None)
}

/// Step-indexed itineraries from the solved discrete model, ordered by
/// step construction.
pub(crate) fn step_paths(
    model: &Model,
    network: &Network,
    agents: &[Agent],
    vars: &StepVars,
    horizon: usize,
) -> grb::Result<Vec<StepPath>> {
    let mut paths = Vec::with_capacity(agents.len());
    for agent in agents {
        let a = agent.id;
        let mut vertices = Vec::new();
        let mut edges = Vec::new();
        for t in 0..horizon {
            for v in network.vertices() {
                if model.get_obj_attr(attr::X, &vars.y(a, v, t))? > SELECTED {
                    vertices.push((t, v));
                }
            }
            for (e, &(u, v)) in network.edges().iter().enumerate() {
                if model.get_obj_attr(attr::X, &vars.x(a, e, t))? > SELECTED {
                    edges.push((t, (u, v)));
                }
            }
        }
        paths.push(StepPath { vertices, edges });
    }
    Ok(paths)
}
