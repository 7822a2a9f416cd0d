use grb::prelude::*;

use super::StepVars;
use crate::common::Agent;
use crate::config::VertexVisit;
use crate::cost::VertexTable;
use crate::network::Network;

fn departure_step(agent: &Agent) -> usize {
    agent.departure.max(0.0).round() as usize
}

/// Step-by-step movement rows for the unrolled model. In the default
/// dwell-allowed mode an agent at `v` in step `t` is either still at `v` in
/// `t + 1` or has started leaving on an outgoing edge; the vertex-binding
/// mode couples every step rigidly to the previous step's inbound edge.
pub(crate) fn add_step_flow(
    model: &mut Model,
    network: &Network,
    agents: &[Agent],
    vertex_cost: &VertexTable,
    vars: &StepVars,
    horizon: usize,
    vertex_binding: bool,
    vertex_visit: VertexVisit,
) -> grb::Result<()> {
    for agent in agents {
        let a = agent.id;
        let dep = departure_step(agent);
        let out = |v: usize, t: usize| {
            network
                .out_edges(v)
                .iter()
                .map(|&e| vars.x(a, e, t))
                .grb_sum()
        };
        let inn = |v: usize, t: usize| {
            network
                .in_edges(v)
                .iter()
                .map(|&e| vars.x(a, e, t))
                .grb_sum()
        };
        let everywhere = |t: usize| {
            network
                .vertices()
                .map(|v| vars.y(a, v, t))
                .chain((0..network.edge_count()).map(|e| vars.x(a, e, t)))
                .grb_sum()
        };

        // the agent does not exist before its departure step, and enters the
        // network at its source
        for t in 0..dep.min(horizon) {
            model.add_constr(&format!("absent_a{a}_t{t}"), c!(everywhere(t) == 0.0))?;
        }
        if dep < horizon {
            model.add_constr(
                &format!("start_a{a}"),
                c!(vars.y(a, agent.source, dep) + out(agent.source, dep) == 1.0),
            )?;
        }

        let leaves = (dep..horizon)
            .map(|t| out(agent.source, t) - inn(agent.source, t))
            .grb_sum();
        model.add_constr(&format!("source_leaves_a{a}"), c!(leaves == 1.0))?;

        let arrives = (dep..horizon)
            .map(|t| inn(agent.target, t) + out(agent.target, t))
            .grb_sum();
        model.add_constr(&format!("target_arrives_a{a}"), c!(arrives == 1.0))?;

        if vertex_binding {
            for t in (dep + 1)..horizon {
                for v in network.vertices() {
                    model.add_constr(
                        &format!("bind_y_a{a}_{v}_t{t}"),
                        c!(vars.y(a, v, t) == inn(v, t - 1)),
                    )?;
                    // the target absorbs its inbound edge, everything else
                    // passes it straight on
                    if v != agent.target {
                        model.add_constr(
                            &format!("bind_x_a{a}_{v}_t{t}"),
                            c!(out(v, t) == inn(v, t - 1)),
                        )?;
                    }
                }
                let visits = network.vertices().map(|v| vars.y(a, v, t)).grb_sum();
                model.add_constr(&format!("bind_one_a{a}_t{t}"), c!(visits <= 1.0))?;
            }
            continue;
        }

        for t in dep..horizon.saturating_sub(1) {
            for v in network.vertices() {
                model.add_constr(
                    &format!("step_a{a}_{v}_t{t}"),
                    c!(vars.y(a, v, t) + inn(v, t) == vars.y(a, v, t + 1) + out(v, t + 1)),
                )?;
            }
        }

        for t in dep..horizon {
            model.add_constr(&format!("occupy_a{a}_t{t}"), c!(everywhere(t) == 1.0))?;
        }

        for v in network.vertices() {
            let pay = match vertex_visit {
                VertexVisit::Yes => true,
                VertexVisit::No => false,
                VertexVisit::Auto => vertex_cost.get(a, v) > 0.0,
            };
            if !pay {
                continue;
            }
            for t in dep..horizon.saturating_sub(1) {
                model.add_constr(
                    &format!("dwell_a{a}_{v}_t{t}"),
                    c!(vars.y(a, v, t + 1) >= inn(v, t)),
                )?;
            }
        }
    }
    Ok(())
}

/// One occupant per `(vertex, step)` and `(edge, step)` cell, plus the
/// anti-parallel row when swap protection is on.
pub(crate) fn add_step_conflicts(
    model: &mut Model,
    network: &Network,
    agents: &[Agent],
    vars: &StepVars,
    horizon: usize,
    swap: bool,
) -> grb::Result<()> {
    for t in 0..horizon {
        for v in network.vertices() {
            let occupants = agents
                .iter()
                .map(|agent| {
                    let a = agent.id;
                    std::iter::once(vars.y(a, v, t))
                        .chain(network.in_edges(v).iter().map(move |&e| vars.x(a, e, t)))
                        .grb_sum()
                })
                .grb_sum();
            model.add_constr(&format!("cell_v{v}_t{t}"), c!(occupants <= 1.0))?;
        }

        for (e, &(u, v)) in network.edges().iter().enumerate() {
            let users = agents.iter().map(|agent| vars.x(agent.id, e, t)).grb_sum();
            model.add_constr(&format!("cell_e{u}_{v}_t{t}"), c!(users <= 1.0))?;
        }

        if swap {
            for (e, &(u, v)) in network.edges().iter().enumerate() {
                let Some(rev) = network.reverse_id(e) else {
                    continue;
                };
                if u > v {
                    continue; // one row per anti-parallel pair
                }
                let users = agents
                    .iter()
                    .map(|agent| vars.x(agent.id, e, t) + vars.x(agent.id, rev, t))
                    .grb_sum();
                model.add_constr(&format!("cell_sw{u}_{v}_t{t}"), c!(users <= 1.0))?;
            }
        }
    }
    Ok(())
}
