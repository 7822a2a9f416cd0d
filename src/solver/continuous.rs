use std::time::Instant;

use grb::prelude::*;

use super::{new_model, parse, require_optimal};
use crate::common::Solution;
use crate::config::SolveConfig;
use crate::error::SolveError;
use crate::model::{
    add_connectivity, add_static_conflicts, add_timing, arrival_cost, selection_cost,
    SelectionVars, TimingVars,
};
use crate::stat::Stats;

/// Continuous-time solve with every pairwise conflict disjunction installed
/// up front.
pub fn mapf_continuous_time(config: &SolveConfig) -> Result<Solution, SolveError> {
    config.validate()?;
    let start = Instant::now();

    let mut model = new_model("mapf_continuous", config.timeout)?;
    let sel = SelectionVars::new(&mut model, &config.network, &config.agents, config.integer)?;
    add_connectivity(&mut model, &config.network, &config.agents, &sel)?;

    let tim = TimingVars::new(&mut model, &config.network, &config.agents)?;
    let big_m = config.big_m();
    add_timing(
        &mut model,
        &config.network,
        &config.agents,
        &config.vertex_wait,
        &config.edge_wait,
        &sel,
        &tim,
        big_m,
    )?;
    add_static_conflicts(
        &mut model,
        &config.network,
        &config.agents,
        &tim,
        big_m,
        config.swap_constraint,
        config.integer,
    )?;

    let cost = selection_cost(
        &config.network,
        &config.agents,
        &config.vertex_cost,
        &config.edge_cost,
        &sel,
    );
    model.set_objective(cost + arrival_cost(&config.agents, &tim), Minimize)?;

    model.optimize()?;
    require_optimal(&model)?;

    let paths = parse::timed_paths(&model, &config.network, &config.agents, &sel, &tim)?;
    let stats = Stats {
        objective: model.get_attr(attr::ObjVal)?,
        time_ms: start.elapsed().as_millis() as usize,
        iterations: 1,
        ..Stats::default()
    };
    stats.print("continuous");

    let solution = Solution {
        paths,
        objective: stats.objective,
        stats,
    };
    solution.log_solution("continuous");
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
    fn test_parallel_lines_take_direct_edges() {
        init_tracing();
        let config = scenario::parallel_lines(3).unwrap();
        let solution = mapf_continuous_time(&config).unwrap();

        assert!(solution.verify(&config.network, &config.agents, true));
        for (path, agent) in solution.paths.iter().zip(config.agents.iter()) {
            assert_eq!(path.vertex_sequence(), vec![agent.source, agent.target]);
            // unit wait at the source, then a unit traversal
            assert!((path.arrival().unwrap() - 2.0).abs() < 1e-6);
        }
        // 3 * (edge cost 1 + two unit vertices) plus 3 arrivals at t = 2
        assert!((solution.objective - 15.0).abs() < 1e-6);
    }

    #[test]
    fn test_two_branch_merge_routes() {
        init_tracing();
        let config = scenario::two_branch_merge().unwrap();
        let solution = mapf_continuous_time(&config).unwrap();

        assert!(solution.verify(&config.network, &config.agents, true));
        assert_eq!(solution.paths[0].vertex_sequence(), vec![1, 2, 6, 7]);
        assert_eq!(solution.paths[1].vertex_sequence(), vec![4, 2, 6, 8]);
        assert_eq!(solution.paths[2].vertex_sequence(), vec![8, 6, 2, 3]);

        let total_arrival: f64 = solution
            .paths
            .iter()
            .map(|path| path.arrival().unwrap())
            .sum();
        assert!(total_arrival <= 21.0 + 1e-6);
    }

    #[test]
    fn test_grid_cross_is_conflict_free() {
        init_tracing();
        let config = scenario::grid_cross().unwrap();
        let solution = mapf_continuous_time(&config).unwrap();
        assert!(solution.verify(&config.network, &config.agents, true));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        init_tracing();
        let config = scenario::parallel_lines(2).unwrap();
        let first = mapf_continuous_time(&config).unwrap();
        let second = mapf_continuous_time(&config).unwrap();
        assert!((first.objective - second.objective).abs() < 1e-9);
    }
}
