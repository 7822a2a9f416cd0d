use grb::prelude::*;

use super::SelectionVars;
use crate::common::Agent;
use crate::network::Network;

/// Flow rows tying each agent's `x` to a single source-to-target path and
/// `y` to exactly the vertices that path visits.
pub(crate) fn add_connectivity(
    model: &mut Model,
    network: &Network,
    agents: &[Agent],
    sel: &SelectionVars,
) -> grb::Result<()> {
    for agent in agents {
        let a = agent.id;
        let outflow = |v: usize| network.out_edges(v).iter().map(|&e| sel.x(a, e)).grb_sum();
        let inflow = |v: usize| network.in_edges(v).iter().map(|&e| sel.x(a, e)).grb_sum();

        model.add_constr(
            &format!("visit_source_a{a}"),
            c!(sel.y(a, agent.source) == 1.0),
        )?;
        model.add_constr(
            &format!("visit_target_a{a}"),
            c!(sel.y(a, agent.target) == 1.0),
        )?;

        // the source is left exactly once and never re-entered; the target
        // is entered exactly once and never left
        model.add_constr(
            &format!("source_out_a{a}"),
            c!(outflow(agent.source) == 1.0),
        )?;
        model.add_constr(&format!("source_in_a{a}"), c!(inflow(agent.source) == 0.0))?;
        model.add_constr(&format!("target_in_a{a}"), c!(inflow(agent.target) == 1.0))?;
        model.add_constr(
            &format!("target_out_a{a}"),
            c!(outflow(agent.target) == 0.0),
        )?;

        for v in network.vertices() {
            if v == agent.source || v == agent.target {
                continue;
            }
            model.add_constr(&format!("flow_a{a}_v{v}"), c!(outflow(v) == inflow(v)))?;
        }

        // edge-implies-vertex: y is forced by the inbound selection, which
        // also zeroes spurious visits
        for v in network.vertices() {
            if v == agent.source {
                continue;
            }
            model.add_constr(&format!("visit_a{a}_v{v}"), c!(sel.y(a, v) == inflow(v)))?;
        }
    }
    Ok(())
}
