use grb::prelude::*;

use super::{SelectionVars, TimingVars};
use crate::common::Agent;
use crate::cost::{EdgeTable, VertexTable};
use crate::network::Network;

/// Big-M propagation of arrival times along the selected path: an agent may
/// enter an outbound edge only after dwelling at the vertex, and arrives at
/// the edge's head only after the traversal duration. Both rows go slack
/// when the vertex/edge is not selected.
pub(crate) fn add_timing(
    model: &mut Model,
    network: &Network,
    agents: &[Agent],
    vertex_wait: &VertexTable,
    edge_wait: &EdgeTable,
    sel: &SelectionVars,
    tim: &TimingVars,
    big_m: f64,
) -> grb::Result<()> {
    for agent in agents {
        let a = agent.id;
        model.add_constr(
            &format!("depart_a{a}"),
            c!(tim.vertex(a, agent.source) == agent.departure),
        )?;

        for v in network.vertices() {
            let wait = vertex_wait.get(a, v);
            for &e in network.out_edges(v) {
                let (_, w) = network.edge(e);
                model.add_constr(
                    &format!("enter_a{a}_{v}_{w}"),
                    c!(tim.edge(a, e) >= tim.vertex(a, v) + (wait + big_m) * sel.y(a, v) - big_m),
                )?;
            }
        }

        for (e, &(u, v)) in network.edges().iter().enumerate() {
            let travel = edge_wait.get(a, u, v);
            model.add_constr(
                &format!("arrive_a{a}_{u}_{v}"),
                c!(tim.vertex(a, v) >= tim.edge(a, e) + (travel + big_m) * sel.x(a, e) - big_m),
            )?;
        }
    }
    Ok(())
}
