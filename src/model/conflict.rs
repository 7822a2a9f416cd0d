use grb::prelude::*;
use itertools::Itertools;

use super::{unit_var, TimingVars};
use crate::common::Agent;
use crate::network::Network;

/// One disjunction per agent pair and vertex, edge, and (optionally)
/// anti-parallel edge pair: either `i` clears the resource before `j`
/// touches it, or the other way around. The pointer variable picks the
/// active branch; the inactive branch is absorbed by big-M.
pub(crate) fn add_static_conflicts(
    model: &mut Model,
    network: &Network,
    agents: &[Agent],
    tim: &TimingVars,
    big_m: f64,
    swap: bool,
    integer: bool,
) -> grb::Result<()> {
    for (i, j) in (0..agents.len()).tuple_combinations() {
        for v in network.vertices() {
            if network.out_edges(v).is_empty() {
                continue;
            }
            let d = unit_var(model, &format!("ord_v{v}_a{i}_a{j}"), integer)?;
            for &e in network.out_edges(v) {
                let (_, w) = network.edge(e);
                // i enters v only after j has left through every selected
                // outgoing edge, or vice versa
                model.add_constr(
                    &format!("vc_{v}_{w}_a{i}_after_a{j}"),
                    c!(tim.vertex(i, v) >= tim.edge(j, e) - big_m * d),
                )?;
                model.add_constr(
                    &format!("vc_{v}_{w}_a{j}_after_a{i}"),
                    c!(tim.vertex(j, v) >= tim.edge(i, e) - big_m * (1 - d)),
                )?;
            }
        }

        for (e, &(u, v)) in network.edges().iter().enumerate() {
            let d = unit_var(model, &format!("ord_e{u}_{v}_a{i}_a{j}"), integer)?;
            model.add_constr(
                &format!("ec_{u}_{v}_a{i}_after_a{j}"),
                c!(tim.edge(i, e) >= tim.vertex(j, v) - big_m * d),
            )?;
            model.add_constr(
                &format!("ec_{u}_{v}_a{j}_after_a{i}"),
                c!(tim.edge(j, e) >= tim.vertex(i, v) - big_m * (1 - d)),
            )?;
        }

        if swap {
            for (e, &(u, v)) in network.edges().iter().enumerate() {
                let Some(rev) = network.reverse_id(e) else {
                    continue;
                };
                let d = unit_var(model, &format!("ord_sw{u}_{v}_a{i}_a{j}"), integer)?;
                model.add_constr(
                    &format!("sw_{u}_{v}_a{i}_after_a{j}"),
                    c!(tim.edge(i, e) >= tim.vertex(j, u) - big_m * d),
                )?;
                model.add_constr(
                    &format!("sw_{u}_{v}_a{j}_after_a{i}"),
                    c!(tim.edge(j, rev) >= tim.vertex(i, v) - big_m * (1 - d)),
                )?;
            }
        }
    }
    Ok(())
}
