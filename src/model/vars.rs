use grb::prelude::*;

use crate::common::Agent;
use crate::network::Network;

/// A `[0, 1]` variable, binary unless the model is an LP relaxation.
pub(crate) fn unit_var(model: &mut Model, name: &str, integer: bool) -> grb::Result<Var> {
    if integer {
        add_intvar!(model, name: name, bounds: 0..1)
    } else {
        add_ctsvar!(model, name: name, bounds: 0..1)
    }
}

/// Edge-selection and vertex-visit grids, one row per agent. Vertices are
/// addressed 1-based, edges by their network id.
pub(crate) struct SelectionVars {
    x: Vec<Vec<Var>>,
    y: Vec<Vec<Var>>,
}

impl SelectionVars {
    pub(crate) fn new(
        model: &mut Model,
        network: &Network,
        agents: &[Agent],
        integer: bool,
    ) -> grb::Result<Self> {
        let mut x = Vec::with_capacity(agents.len());
        let mut y = Vec::with_capacity(agents.len());
        for agent in agents {
            let mut x_row = Vec::with_capacity(network.edge_count());
            for &(u, v) in network.edges() {
                x_row.push(unit_var(
                    model,
                    &format!("x_a{}_{}_{}", agent.id, u, v),
                    integer,
                )?);
            }
            let mut y_row = Vec::with_capacity(network.vertex_count());
            for v in network.vertices() {
                y_row.push(unit_var(model, &format!("y_a{}_{}", agent.id, v), integer)?);
            }
            x.push(x_row);
            y.push(y_row);
        }
        Ok(SelectionVars { x, y })
    }

    pub(crate) fn x(&self, agent: usize, edge: usize) -> Var {
        self.x[agent][edge]
    }

    pub(crate) fn y(&self, agent: usize, vertex: usize) -> Var {
        self.y[agent][vertex - 1]
    }
}

/// Arrival times per vertex and edge-entry times per edge, one row per
/// agent.
pub(crate) struct TimingVars {
    t_v: Vec<Vec<Var>>,
    t_e: Vec<Vec<Var>>,
}

impl TimingVars {
    pub(crate) fn new(
        model: &mut Model,
        network: &Network,
        agents: &[Agent],
    ) -> grb::Result<Self> {
        let mut t_v = Vec::with_capacity(agents.len());
        let mut t_e = Vec::with_capacity(agents.len());
        for agent in agents {
            let mut v_row = Vec::with_capacity(network.vertex_count());
            for v in network.vertices() {
                v_row.push(add_ctsvar!(
                    model,
                    name: &format!("tv_a{}_{}", agent.id, v),
                    bounds: 0..
                )?);
            }
            let mut e_row = Vec::with_capacity(network.edge_count());
            for &(u, v) in network.edges() {
                e_row.push(add_ctsvar!(
                    model,
                    name: &format!("te_a{}_{}_{}", agent.id, u, v),
                    bounds: 0..
                )?);
            }
            t_v.push(v_row);
            t_e.push(e_row);
        }
        Ok(TimingVars { t_v, t_e })
    }

    pub(crate) fn vertex(&self, agent: usize, vertex: usize) -> Var {
        self.t_v[agent][vertex - 1]
    }

    pub(crate) fn edge(&self, agent: usize, edge: usize) -> Var {
        self.t_e[agent][edge]
    }
}

/// Time-indexed selection grids for the unrolled discrete model:
/// `x[agent][edge][step]` and `y[agent][vertex][step]`.
pub(crate) struct StepVars {
    x: Vec<Vec<Vec<Var>>>,
    y: Vec<Vec<Vec<Var>>>,
}

impl StepVars {
    pub(crate) fn new(
        model: &mut Model,
        network: &Network,
        agents: &[Agent],
        horizon: usize,
        integer: bool,
    ) -> grb::Result<Self> {
        let mut x = Vec::with_capacity(agents.len());
        let mut y = Vec::with_capacity(agents.len());
        for agent in agents {
            let mut x_row = Vec::with_capacity(network.edge_count());
            for &(u, v) in network.edges() {
                let mut steps = Vec::with_capacity(horizon);
                for t in 0..horizon {
                    steps.push(unit_var(
                        model,
                        &format!("x_a{}_{}_{}_t{}", agent.id, u, v, t),
                        integer,
                    )?);
                }
                x_row.push(steps);
            }
            let mut y_row = Vec::with_capacity(network.vertex_count());
            for v in network.vertices() {
                let mut steps = Vec::with_capacity(horizon);
                for t in 0..horizon {
                    steps.push(unit_var(
                        model,
                        &format!("y_a{}_{}_t{}", agent.id, v, t),
                        integer,
                    )?);
                }
                y_row.push(steps);
            }
            x.push(x_row);
            y.push(y_row);
        }
        Ok(StepVars { x, y })
    }

    pub(crate) fn x(&self, agent: usize, edge: usize, step: usize) -> Var {
        self.x[agent][edge][step]
    }

    pub(crate) fn y(&self, agent: usize, vertex: usize, step: usize) -> Var {
        self.y[agent][vertex - 1][step]
    }
}
