use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub objective: f64,
    pub time_ms: usize,
    pub iterations: usize,
    pub vertex_cuts: usize,
    pub edge_cuts: usize,
}

impl Stats {
    pub fn print(&self, solver: &str) {
        info!(
            "{} objective {:?} time(ms) {:?} iterations {:?} vertex cuts {:?} edge cuts {:?}",
            solver, self.objective, self.time_ms, self.iterations, self.vertex_cuts, self.edge_cuts
        );
    }
}
