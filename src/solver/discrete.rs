use std::time::Instant;

use grb::prelude::*;

use super::{new_model, parse, require_optimal};
use crate::common::StepSolution;
use crate::config::SolveConfig;
use crate::error::SolveError;
use crate::model::{add_step_conflicts, add_step_flow, step_cost, StepVars};
use crate::stat::Stats;

/// Discrete-time solve over the unrolled horizon `T = config.horizon()`.
/// A horizon too short for some agent surfaces as solver infeasibility.
pub fn mapf_discrete_time(config: &SolveConfig) -> Result<StepSolution, SolveError> {
    config.validate()?;
    let start = Instant::now();
    let horizon = config.horizon();

    let mut model = new_model("mapf_discrete", config.timeout)?;
    let vars = StepVars::new(
        &mut model,
        &config.network,
        &config.agents,
        horizon,
        config.integer,
    )?;
    add_step_flow(
        &mut model,
        &config.network,
        &config.agents,
        &config.vertex_cost,
        &vars,
        horizon,
        config.vertex_binding,
        config.vertex_visit,
    )?;
    add_step_conflicts(
        &mut model,
        &config.network,
        &config.agents,
        &vars,
        horizon,
        config.swap_constraint,
    )?;

    let cost = step_cost(
        &config.network,
        &config.agents,
        &config.vertex_cost,
        &config.edge_cost,
        &vars,
        horizon,
    );
    model.set_objective(cost, Minimize)?;

    model.optimize()?;
    require_optimal(&model)?;

    let paths = parse::step_paths(&model, &config.network, &config.agents, &vars, horizon)?;
    let stats = Stats {
        objective: model.get_attr(attr::ObjVal)?,
        time_ms: start.elapsed().as_millis() as usize,
        iterations: 1,
        ..Stats::default()
    };
    stats.print("discrete");

    let solution = StepSolution {
        paths,
        objective: stats.objective,
        stats,
    };
    solution.log_solution("discrete");
    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .try_init();
    }

    #[test]
    fn test_parallel_lines_fill_the_horizon() {
        init_tracing();
        let config = scenario::parallel_lines(3).unwrap();
        let solution = mapf_discrete_time(&config).unwrap();

        assert!(solution.verify(&config.agents));
        // every agent occupies one unit-cost cell per step of the horizon
        assert!((solution.objective - 9.0).abs() < 1e-6);
        for path in &solution.paths {
            assert_eq!(path.edges.len(), 1);
        }
    }

    #[test]
    fn test_grid_cross_steps_apart() {
        init_tracing();
        let mut config = scenario::grid_cross().unwrap();
        // three hops per agent, plus room to linearize the crossings
        config.time_duration = Some(8);
        let solution = mapf_discrete_time(&config).unwrap();
        assert!(solution.verify(&config.agents));
    }

    #[test]
    fn test_vertex_binding_mode() {
        init_tracing();
        let mut config = scenario::parallel_lines(2).unwrap();
        config.vertex_binding = true;
        config.time_duration = Some(4);
        let solution = mapf_discrete_time(&config).unwrap();

        for (path, agent) in solution.paths.iter().zip(config.agents.iter()) {
            assert_eq!(path.edges.len(), 1);
            assert_eq!(path.edges[0].1, (agent.source, agent.target));
        }
    }
}
