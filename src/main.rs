use anyhow::bail;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mapf_milp::config::Cli;
use mapf_milp::scenario::ScenarioFile;
use mapf_milp::solver::{
    mapf_continuous_time, mapf_continuous_time_dynamic_conflict, mapf_discrete_time,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let scenario = ScenarioFile::load(&cli.scenario)?;
    let config = scenario.to_config()?;

    match cli.mode.as_str() {
        "continuous" => {
            let solution = mapf_continuous_time(&config)?;
            print_timed(&solution.paths, solution.objective);
        }
        "dynamic" => {
            let solution = mapf_continuous_time_dynamic_conflict(&config)?;
            print_timed(&solution.paths, solution.objective);
        }
        "discrete" => {
            let solution = mapf_discrete_time(&config)?;
            for (agent, path) in solution.paths.iter().enumerate() {
                println!("agent {}:", agent);
                for &(t, v) in &path.vertices {
                    println!("  step {:>3}  vertex {}", t, v);
                }
            }
            println!("objective: {}", solution.objective);
        }
        mode => bail!("unknown mode {mode:?}, expected continuous, dynamic or discrete"),
    }
    Ok(())
}

fn print_timed(paths: &[mapf_milp::TimedPath], objective: f64) {
    for (agent, path) in paths.iter().enumerate() {
        println!("agent {}:", agent);
        for &(t, v) in &path.vertices {
            println!("  t {:>8.3}  vertex {}", t, v);
        }
    }
    println!("objective: {}", objective);
}
