mod connectivity;
mod conflict;
mod discrete;
mod objective;
mod timing;
mod vars;

pub(crate) use connectivity::add_connectivity;
pub(crate) use conflict::add_static_conflicts;
pub(crate) use discrete::{add_step_conflicts, add_step_flow};
pub(crate) use objective::{arrival_cost, selection_cost, step_cost};
pub(crate) use timing::add_timing;
pub(crate) use vars::{unit_var, SelectionVars, StepVars, TimingVars};
