mod continuous;
mod discrete;
mod dynamic;
mod parse;

pub use continuous::mapf_continuous_time;
pub use discrete::mapf_discrete_time;
pub use dynamic::mapf_continuous_time_dynamic_conflict;

use grb::prelude::*;

use crate::error::SolveError;

/// A quiet model with the time limit applied once at creation.
pub(crate) fn new_model(name: &str, timeout: f64) -> Result<Model, SolveError> {
    let mut env = Env::new("")?;
    env.set(param::OutputFlag, 0)?;
    env.set(param::LogToConsole, 0)?;
    if timeout >= 0.0 {
        env.set(param::TimeLimit, timeout)?;
    }
    Ok(Model::with_env(name, env)?)
}

pub(crate) fn require_optimal(model: &Model) -> Result<(), SolveError> {
    match model.status()? {
        Status::Optimal => Ok(()),
        status => Err(SolveError::NonOptimal(status)),
    }
}
