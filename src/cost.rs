use crate::common::Agent;
use crate::error::SolveError;

/// Per-vertex parameter table, either shared by all agents or one row per
/// agent. `get` right-aligns its indices: the leading agent index is
/// discarded when the table is shared, so builders use one code path for
/// both ranks.
#[derive(Debug, Clone)]
pub enum VertexTable {
    Shared(Vec<f64>),
    PerAgent(Vec<Vec<f64>>),
}

impl VertexTable {
    pub fn uniform(vertex_count: usize, value: f64) -> Self {
        VertexTable::Shared(vec![value; vertex_count])
    }

    pub fn get(&self, agent: usize, v: usize) -> f64 {
        match self {
            VertexTable::Shared(row) => row[v - 1],
            VertexTable::PerAgent(rows) => rows[agent][v - 1],
        }
    }

    pub fn max_value(&self) -> f64 {
        self.values().fold(0.0, f64::max)
    }

    pub fn min_positive(&self) -> Option<f64> {
        self.values().filter(|&v| v > 0.0).reduce(f64::min)
    }

    fn values(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        match self {
            VertexTable::Shared(row) => Box::new(row.iter().copied()),
            VertexTable::PerAgent(rows) => Box::new(rows.iter().flatten().copied()),
        }
    }

    pub(crate) fn validate(
        &self,
        table: &'static str,
        agents: &[Agent],
        vertex_count: usize,
    ) -> Result<(), SolveError> {
        match self {
            VertexTable::Shared(row) => check_len(table, row.len(), vertex_count, "vertex")?,
            VertexTable::PerAgent(rows) => {
                check_len(table, rows.len(), agents.len(), "agent")?;
                for row in rows {
                    check_len(table, row.len(), vertex_count, "vertex")?;
                }
            }
        }
        check_non_negative(table, self.values())
    }
}

/// Per-edge parameter table as a dense `(u, v)` matrix, shared or per-agent.
#[derive(Debug, Clone)]
pub enum EdgeTable {
    Shared(Vec<Vec<f64>>),
    PerAgent(Vec<Vec<Vec<f64>>>),
}

impl EdgeTable {
    pub fn uniform(vertex_count: usize, value: f64) -> Self {
        EdgeTable::Shared(vec![vec![value; vertex_count]; vertex_count])
    }

    /// Shared table from a default value plus `(u, v, value)` overrides.
    /// With `symmetric`, each override is applied to both directions.
    pub fn from_overrides(
        vertex_count: usize,
        default: f64,
        overrides: &[(usize, usize, f64)],
        symmetric: bool,
    ) -> Self {
        let mut matrix = vec![vec![default; vertex_count]; vertex_count];
        for &(u, v, value) in overrides {
            matrix[u - 1][v - 1] = value;
            if symmetric {
                matrix[v - 1][u - 1] = value;
            }
        }
        EdgeTable::Shared(matrix)
    }

    pub fn get(&self, agent: usize, u: usize, v: usize) -> f64 {
        match self {
            EdgeTable::Shared(matrix) => matrix[u - 1][v - 1],
            EdgeTable::PerAgent(tensors) => tensors[agent][u - 1][v - 1],
        }
    }

    pub fn max_value(&self) -> f64 {
        self.values().fold(0.0, f64::max)
    }

    pub fn min_positive(&self) -> Option<f64> {
        self.values().filter(|&v| v > 0.0).reduce(f64::min)
    }

    fn values(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        match self {
            EdgeTable::Shared(matrix) => Box::new(matrix.iter().flatten().copied()),
            EdgeTable::PerAgent(tensors) => {
                Box::new(tensors.iter().flatten().flatten().copied())
            }
        }
    }

    pub(crate) fn validate(
        &self,
        table: &'static str,
        agents: &[Agent],
        vertex_count: usize,
    ) -> Result<(), SolveError> {
        match self {
            EdgeTable::Shared(matrix) => check_matrix(table, matrix, vertex_count)?,
            EdgeTable::PerAgent(tensors) => {
                check_len(table, tensors.len(), agents.len(), "agent")?;
                for matrix in tensors {
                    check_matrix(table, matrix, vertex_count)?;
                }
            }
        }
        check_non_negative(table, self.values())
    }
}

fn check_len(
    table: &'static str,
    got: usize,
    want: usize,
    unit: &'static str,
) -> Result<(), SolveError> {
    if got != want {
        return Err(SolveError::TableSizeMismatch {
            table,
            got,
            want,
            unit,
        });
    }
    Ok(())
}

fn check_matrix(
    table: &'static str,
    matrix: &[Vec<f64>],
    vertex_count: usize,
) -> Result<(), SolveError> {
    check_len(table, matrix.len(), vertex_count, "row")?;
    for row in matrix {
        check_len(table, row.len(), vertex_count, "column")?;
    }
    Ok(())
}

fn check_non_negative(
    table: &'static str,
    values: impl Iterator<Item = f64>,
) -> Result<(), SolveError> {
    for value in values {
        if value < 0.0 {
            return Err(SolveError::NegativeEntry { table, value });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agents(n: usize) -> Vec<Agent> {
        (0..n)
            .map(|id| Agent {
                id,
                source: id + 1,
                target: id + 2,
                departure: 0.0,
            })
            .collect()
    }

    #[test]
    fn test_right_align_get() {
        let shared = VertexTable::Shared(vec![1.0, 2.0, 3.0]);
        // the agent index is discarded against a shared table
        assert_eq!(shared.get(0, 2), 2.0);
        assert_eq!(shared.get(7, 2), 2.0);

        let per_agent = VertexTable::PerAgent(vec![vec![1.0, 2.0], vec![5.0, 6.0]]);
        assert_eq!(per_agent.get(0, 1), 1.0);
        assert_eq!(per_agent.get(1, 1), 5.0);
    }

    #[test]
    fn test_edge_overrides_symmetric() {
        let table = EdgeTable::from_overrides(3, 1.0, &[(1, 2, 80.0)], true);
        assert_eq!(table.get(0, 1, 2), 80.0);
        assert_eq!(table.get(0, 2, 1), 80.0);
        assert_eq!(table.get(0, 2, 3), 1.0);
        assert_eq!(table.max_value(), 80.0);
        assert_eq!(table.min_positive(), Some(1.0));
    }

    #[test]
    fn test_validate_dimensions_and_sign() {
        let bad_len = VertexTable::Shared(vec![1.0, 1.0]);
        assert!(matches!(
            bad_len.validate("vertex_cost", &agents(1), 3),
            Err(SolveError::TableSizeMismatch { got: 2, want: 3, .. })
        ));

        let bad_rows = VertexTable::PerAgent(vec![vec![1.0, 1.0, 1.0]]);
        assert!(bad_rows.validate("vertex_cost", &agents(2), 3).is_err());

        let negative = EdgeTable::uniform(2, -1.0);
        assert!(matches!(
            negative.validate("edge_cost", &agents(1), 2),
            Err(SolveError::NegativeEntry { .. })
        ));

        let good = EdgeTable::uniform(2, 0.5);
        assert!(good.validate("edge_cost", &agents(1), 2).is_ok());
    }
}
