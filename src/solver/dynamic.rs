use std::time::Instant;

use grb::prelude::*;
use tracing::debug;

use super::{new_model, parse, require_optimal};
use crate::common::{Solution, TimedPath};
use crate::config::SolveConfig;
use crate::detect::{self, Conflict};
use crate::error::SolveError;
use crate::model::{
    add_connectivity, add_timing, arrival_cost, selection_cost, unit_var, SelectionVars,
    TimingVars,
};
use crate::stat::Stats;

/// Continuous-time solve with lazily generated conflict constraints.
///
/// A cost-only relaxation is solved first. If the untimed paths are already
/// pairwise disjoint, their timing follows analytically and no disjunction
/// is ever built. Otherwise timing enters the model and the loop alternates
/// between re-optimizing (warm-started from the incumbent) and cutting off
/// the first conflict the detector reports, until none remains.
pub fn mapf_continuous_time_dynamic_conflict(
    config: &SolveConfig,
) -> Result<Solution, SolveError> {
    config.validate()?;
    let start = Instant::now();
    let mut stats = Stats::default();

    let mut model = new_model("mapf_dynamic", config.timeout)?;
    let sel = SelectionVars::new(&mut model, &config.network, &config.agents, config.integer)?;
    add_connectivity(&mut model, &config.network, &config.agents, &sel)?;
    let cost = selection_cost(
        &config.network,
        &config.agents,
        &config.vertex_cost,
        &config.edge_cost,
        &sel,
    );
    model.set_objective(cost.clone(), Minimize)?;

    model.optimize()?;
    require_optimal(&model)?;
    stats.iterations += 1;

    let (vertex_walks, edge_walks) =
        parse::selected_walks(&model, &config.network, &config.agents, &sel)?;
    if detect::paths_disjoint(&vertex_walks, &edge_walks) {
        debug!("untimed paths are disjoint, timing follows analytically");
        stats.objective = model.get_attr(attr::ObjVal)?;
        stats.time_ms = start.elapsed().as_millis() as usize;
        stats.print("dynamic");
        let solution = Solution {
            paths: analytic_timing(config, &vertex_walks),
            objective: stats.objective,
            stats,
        };
        solution.log_solution("dynamic");
        return Ok(solution);
    }

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
    model.set_objective(cost + arrival_cost(&config.agents, &tim), Minimize)?;

    let eps = config.safety_gap();
    let mut warm: Option<(Vec<Var>, Vec<f64>)> = None;
    let mut cut = 0usize;
    let paths = loop {
        if let Some((vars, values)) = warm.take() {
            model.set_obj_attr_batch(attr::Start, vars.into_iter().zip(values))?;
        }
        model.optimize()?;
        require_optimal(&model)?;
        stats.iterations += 1;

        let paths = parse::timed_paths(&model, &config.network, &config.agents, &sel, &tim)?;
        let Some(conflict) = detect::first_conflict(
            &paths,
            config.swap_constraint,
            detect::DEFAULT_DETECT_EPS,
        ) else {
            break paths;
        };
        debug!("iteration {}: {:?}", stats.iterations, conflict);

        // keep the incumbent for the next warm start before the model moves
        let all_vars = model.get_vars()?.to_vec();
        let values = model.get_obj_attr_batch(attr::X, all_vars.iter().copied())?;

        match conflict {
            Conflict::Vertex {
                vertex,
                agent_1,
                agent_2,
            } => {
                add_vertex_cut(
                    &mut model, config, &sel, &tim, vertex, agent_1, agent_2, big_m, eps, cut,
                )?;
                stats.vertex_cuts += 1;
            }
            Conflict::Edge {
                edge,
                agent_1,
                agent_2,
                swap,
            } => {
                add_edge_cut(
                    &mut model, config, &tim, edge, agent_1, agent_2, swap, big_m, eps, cut,
                )?;
                stats.edge_cuts += 1;
            }
        }
        cut += 1;
        warm = Some((all_vars, values));
    };

    stats.objective = model.get_attr(attr::ObjVal)?;
    stats.time_ms = start.elapsed().as_millis() as usize;
    stats.print("dynamic");

    let solution = Solution {
        paths,
        objective: stats.objective,
        stats,
    };
    solution.log_solution("dynamic");
    Ok(solution)
}

/// Ordering constraint for a vertex conflict between `i` and `j`, built
/// against each agent's selected outbound edge. An agent without one is
/// parked on its target, so the other must clear the vertex first and the
/// constraint loses its disjunctive half.
#[allow(clippy::too_many_arguments)]
fn add_vertex_cut(
    model: &mut Model,
    config: &SolveConfig,
    sel: &SelectionVars,
    tim: &TimingVars,
    vertex: usize,
    i: usize,
    j: usize,
    big_m: f64,
    eps: f64,
    cut: usize,
) -> Result<(), SolveError> {
    let e_i = parse::selected_out_edge(model, &config.network, sel, i, vertex)?;
    let e_j = parse::selected_out_edge(model, &config.network, sel, j, vertex)?;

    match (e_i, e_j) {
        (Some(ei), Some(ej)) => {
            if config.heuristic_conflict {
                // keep only the ordering the incumbent is closest to
                let arrive_i = model.get_obj_attr(attr::X, &tim.vertex(i, vertex))?;
                let arrive_j = model.get_obj_attr(attr::X, &tim.vertex(j, vertex))?;
                let clear_i = model.get_obj_attr(attr::X, &tim.edge(i, ei))?;
                let clear_j = model.get_obj_attr(attr::X, &tim.edge(j, ej))?;
                if clear_j + eps - arrive_i <= clear_i + eps - arrive_j {
                    model.add_constr(
                        &format!("cut{cut}_v{vertex}_a{i}_after_a{j}"),
                        c!(tim.vertex(i, vertex) >= tim.edge(j, ej) + eps),
                    )?;
                } else {
                    model.add_constr(
                        &format!("cut{cut}_v{vertex}_a{j}_after_a{i}"),
                        c!(tim.vertex(j, vertex) >= tim.edge(i, ei) + eps),
                    )?;
                }
            } else {
                let d = unit_var(model, &format!("cut{cut}_v{vertex}"), config.integer)?;
                model.add_constr(
                    &format!("cut{cut}_v{vertex}_a{i}_after_a{j}"),
                    c!(tim.vertex(i, vertex) >= tim.edge(j, ej) + eps - big_m * d),
                )?;
                model.add_constr(
                    &format!("cut{cut}_v{vertex}_a{j}_after_a{i}"),
                    c!(tim.vertex(j, vertex) >= tim.edge(i, ei) + eps - big_m * (1 - d)),
                )?;
            }
        }
        (None, Some(ej)) => {
            model.add_constr(
                &format!("cut{cut}_v{vertex}_a{i}_last"),
                c!(tim.vertex(i, vertex) >= tim.edge(j, ej) + eps),
            )?;
        }
        (Some(ei), None) => {
            model.add_constr(
                &format!("cut{cut}_v{vertex}_a{j}_last"),
                c!(tim.vertex(j, vertex) >= tim.edge(i, ei) + eps),
            )?;
        }
        (None, None) => unreachable!("agents {i} and {j} cannot both end at vertex {vertex}"),
    }
    Ok(())
}

/// Ordering constraint for an edge conflict. For a swap the second agent
/// traverses the reversed edge, so each side is cleared at the opposite
/// endpoint.
#[allow(clippy::too_many_arguments)]
fn add_edge_cut(
    model: &mut Model,
    config: &SolveConfig,
    tim: &TimingVars,
    edge: (usize, usize),
    i: usize,
    j: usize,
    swap: bool,
    big_m: f64,
    eps: f64,
    cut: usize,
) -> Result<(), SolveError> {
    let (u, v) = edge;
    let Some(e) = config.network.edge_id(u, v) else {
        unreachable!("conflict on edge ({u},{v}) missing from the network");
    };

    if !swap {
        if config.heuristic_conflict {
            let enter_i = model.get_obj_attr(attr::X, &tim.edge(i, e))?;
            let enter_j = model.get_obj_attr(attr::X, &tim.edge(j, e))?;
            let arrive_i = model.get_obj_attr(attr::X, &tim.vertex(i, v))?;
            let arrive_j = model.get_obj_attr(attr::X, &tim.vertex(j, v))?;
            if arrive_j + eps - enter_i <= arrive_i + eps - enter_j {
                model.add_constr(
                    &format!("cut{cut}_e{u}_{v}_a{i}_after_a{j}"),
                    c!(tim.edge(i, e) >= tim.vertex(j, v) + eps),
                )?;
            } else {
                model.add_constr(
                    &format!("cut{cut}_e{u}_{v}_a{j}_after_a{i}"),
                    c!(tim.edge(j, e) >= tim.vertex(i, v) + eps),
                )?;
            }
        } else {
            let d = unit_var(model, &format!("cut{cut}_e{u}_{v}"), config.integer)?;
            model.add_constr(
                &format!("cut{cut}_e{u}_{v}_a{i}_after_a{j}"),
                c!(tim.edge(i, e) >= tim.vertex(j, v) + eps - big_m * d),
            )?;
            model.add_constr(
                &format!("cut{cut}_e{u}_{v}_a{j}_after_a{i}"),
                c!(tim.edge(j, e) >= tim.vertex(i, v) + eps - big_m * (1 - d)),
            )?;
        }
        return Ok(());
    }

    let Some(rev) = config.network.edge_id(v, u) else {
        unreachable!("swap conflict without the reversed edge ({v},{u})");
    };
    if config.heuristic_conflict {
        let enter_i = model.get_obj_attr(attr::X, &tim.edge(i, e))?;
        let enter_j = model.get_obj_attr(attr::X, &tim.edge(j, rev))?;
        let clear_i = model.get_obj_attr(attr::X, &tim.vertex(i, v))?;
        let clear_j = model.get_obj_attr(attr::X, &tim.vertex(j, u))?;
        if clear_j + eps - enter_i <= clear_i + eps - enter_j {
            model.add_constr(
                &format!("cut{cut}_sw{u}_{v}_a{i}_after_a{j}"),
                c!(tim.edge(i, e) >= tim.vertex(j, u) + eps),
            )?;
        } else {
            model.add_constr(
                &format!("cut{cut}_sw{u}_{v}_a{j}_after_a{i}"),
                c!(tim.edge(j, rev) >= tim.vertex(i, v) + eps),
            )?;
        }
    } else {
        let d = unit_var(model, &format!("cut{cut}_sw{u}_{v}"), config.integer)?;
        model.add_constr(
            &format!("cut{cut}_sw{u}_{v}_a{i}_after_a{j}"),
            c!(tim.edge(i, e) >= tim.vertex(j, u) + eps - big_m * d),
        )?;
        model.add_constr(
            &format!("cut{cut}_sw{u}_{v}_a{j}_after_a{i}"),
            c!(tim.edge(j, rev) >= tim.vertex(i, v) + eps - big_m * (1 - d)),
        )?;
    }
    Ok(())
}

/// Forward pass assigning times to conflict-free walks: dwell at each
/// vertex, then traverse, starting from the agent's departure.
fn analytic_timing(config: &SolveConfig, walks: &[Vec<usize>]) -> Vec<TimedPath> {
    config
        .agents
        .iter()
        .zip(walks.iter())
        .map(|(agent, walk)| {
            let a = agent.id;
            let mut vertices = Vec::with_capacity(walk.len());
            let mut edges = Vec::with_capacity(walk.len().saturating_sub(1));
            let mut t = agent.departure;
            vertices.push((t, walk[0]));
            for pair in walk.windows(2) {
                let (u, v) = (pair[0], pair[1]);
                let entry = t + config.vertex_wait.get(a, u);
                edges.push((entry, (u, v)));
                t = entry + config.edge_wait.get(a, u, v);
                vertices.push((t, v));
            }
            TimedPath { vertices, edges }
        })
        .collect()
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
    fn test_analytic_timing_accumulates_waits() {
        let mut config = scenario::parallel_lines(2).unwrap();
        config.agents[1].departure = 3.0;
        let walks = vec![vec![1, 3], vec![2, 4]];
        let paths = analytic_timing(&config, &walks);

        assert_eq!(paths[0].vertices, vec![(0.0, 1), (2.0, 3)]);
        assert_eq!(paths[0].edges, vec![(1.0, (1, 3))]);
        assert_eq!(paths[1].vertices, vec![(3.0, 2), (5.0, 4)]);
    }

    #[test]
    fn test_disjoint_paths_skip_timing() {
        init_tracing();
        let config = scenario::parallel_lines(3).unwrap();
        let solution = mapf_continuous_time_dynamic_conflict(&config).unwrap();

        assert!(solution.verify(&config.network, &config.agents, true));
        // one cost-only solve, no cuts
        assert_eq!(solution.stats.iterations, 1);
        assert_eq!(solution.stats.vertex_cuts + solution.stats.edge_cuts, 0);
        assert!((solution.objective - 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_grid_cross_generates_cuts() {
        init_tracing();
        let config = scenario::grid_cross().unwrap();
        let solution = mapf_continuous_time_dynamic_conflict(&config).unwrap();

        assert!(solution.verify(&config.network, &config.agents, true));
        assert!(solution.stats.vertex_cuts + solution.stats.edge_cuts >= 1);
    }

    #[test]
    fn test_star_linearizes_hub_visits() {
        init_tracing();
        let config = scenario::directional_star(3).unwrap();
        let solution = mapf_continuous_time_dynamic_conflict(&config).unwrap();
        assert!(solution.verify(&config.network, &config.agents, true));

        // dwell intervals at the hub cannot overlap, so with its wait of 2
        // the arrivals there spread at least that far apart
        let mut hub_arrivals: Vec<f64> = solution
            .paths
            .iter()
            .map(|path| path.vertices[1].0)
            .collect();
        hub_arrivals.sort_by(f64::total_cmp);
        for pair in hub_arrivals.windows(2) {
            assert!(pair[1] - pair[0] >= 2.0 - 1e-6);
        }
    }

    #[test]
    fn test_wheel_pass_with_swap_constraint() {
        init_tracing();
        let config = scenario::wheel_pass(4, 1).unwrap();
        let solution = mapf_continuous_time_dynamic_conflict(&config).unwrap();
        assert!(solution.verify(&config.network, &config.agents, true));
    }

    #[test]
    fn test_heuristic_cuts_stay_conflict_free() {
        init_tracing();
        // two agents forced through the single middle vertex 3
        let network =
            crate::Network::directed(5, &[(1, 3), (3, 2), (4, 3), (3, 5)]).unwrap();
        let mut config = crate::SolveConfig::new(network, &[1, 4], &[2, 5]).unwrap();
        config.heuristic_conflict = true;

        let solution = mapf_continuous_time_dynamic_conflict(&config).unwrap();
        // the heuristic may lose optimality but never conflict-freeness
        assert!(solution.verify(&config.network, &config.agents, true));
        assert!(solution.stats.vertex_cuts >= 1);
    }

    #[test]
    fn test_cuts_only_tighten_the_objective() {
        init_tracing();
        let config = scenario::grid_cross().unwrap();
        let static_solution = crate::solver::mapf_continuous_time(&config).unwrap();
        let dynamic_solution = mapf_continuous_time_dynamic_conflict(&config).unwrap();
        // the lazy loop relaxes, then tightens back to the static optimum;
        // its cuts carry a safety gap the static disjunctions do not
        assert!(dynamic_solution.objective <= static_solution.objective + 1e-2);
    }
}
