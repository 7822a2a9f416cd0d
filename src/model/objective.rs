use grb::prelude::*;

use super::{SelectionVars, StepVars, TimingVars};
use crate::common::Agent;
use crate::cost::{EdgeTable, VertexTable};
use crate::network::Network;

/// Travel plus dwell cost over the selected edges and vertices.
pub(crate) fn selection_cost(
    network: &Network,
    agents: &[Agent],
    vertex_cost: &VertexTable,
    edge_cost: &EdgeTable,
    sel: &SelectionVars,
) -> Expr {
    let mut terms = Vec::new();
    for agent in agents {
        let a = agent.id;
        for (e, &(u, v)) in network.edges().iter().enumerate() {
            terms.push(edge_cost.get(a, u, v) * sel.x(a, e));
        }
        for v in network.vertices() {
            terms.push(vertex_cost.get(a, v) * sel.y(a, v));
        }
    }
    terms.grb_sum()
}

/// Sum of the agents' arrival times at their targets. Added to the cost
/// objective whenever timing variables are in the model.
pub(crate) fn arrival_cost(agents: &[Agent], tim: &TimingVars) -> Expr {
    agents
        .iter()
        .map(|agent| tim.vertex(agent.id, agent.target))
        .grb_sum()
}

/// Discrete counterpart of `selection_cost`, summed over every step.
pub(crate) fn step_cost(
    network: &Network,
    agents: &[Agent],
    vertex_cost: &VertexTable,
    edge_cost: &EdgeTable,
    vars: &StepVars,
    horizon: usize,
) -> Expr {
    let mut terms = Vec::new();
    for agent in agents {
        let a = agent.id;
        for t in 0..horizon {
            for (e, &(u, v)) in network.edges().iter().enumerate() {
                terms.push(edge_cost.get(a, u, v) * vars.x(a, e, t));
            }
            for v in network.vertices() {
                terms.push(vertex_cost.get(a, v) * vars.y(a, v, t));
            }
        }
    }
    terms.grb_sum()
}
