use std::collections::HashMap;

use crate::error::SolveError;

/// Directed graph over vertices `1..=n` with precomputed incidence lists.
///
/// Undirected input is canonicalized by inserting every edge in both
/// directions, so the rest of the crate only ever sees ordered pairs.
#[derive(Debug, Clone)]
pub struct Network {
    vertex_count: usize,
    edges: Vec<(usize, usize)>,
    out: Vec<Vec<usize>>, // vertex -> ids of outgoing edges
    inn: Vec<Vec<usize>>, // vertex -> ids of incoming edges
    index: HashMap<(usize, usize), usize>,
}

impl Network {
    pub fn directed(vertex_count: usize, edges: &[(usize, usize)]) -> Result<Self, SolveError> {
        let mut net = Network {
            vertex_count,
            edges: Vec::with_capacity(edges.len()),
            out: vec![Vec::new(); vertex_count + 1],
            inn: vec![Vec::new(); vertex_count + 1],
            index: HashMap::with_capacity(edges.len()),
        };
        for &(u, v) in edges {
            net.insert(u, v)?;
        }
        Ok(net)
    }

    pub fn undirected(vertex_count: usize, edges: &[(usize, usize)]) -> Result<Self, SolveError> {
        let mut net = Network {
            vertex_count,
            edges: Vec::with_capacity(2 * edges.len()),
            out: vec![Vec::new(); vertex_count + 1],
            inn: vec![Vec::new(); vertex_count + 1],
            index: HashMap::with_capacity(2 * edges.len()),
        };
        for &(u, v) in edges {
            net.insert(u, v)?;
            net.insert(v, u)?;
        }
        Ok(net)
    }

    fn insert(&mut self, u: usize, v: usize) -> Result<(), SolveError> {
        for vertex in [u, v] {
            if vertex < 1 || vertex > self.vertex_count {
                return Err(SolveError::VertexOutOfRange {
                    vertex,
                    max: self.vertex_count,
                });
            }
        }
        if self.index.contains_key(&(u, v)) {
            return Ok(());
        }
        let id = self.edges.len();
        self.edges.push((u, v));
        self.index.insert((u, v), id);
        self.out[u].push(id);
        self.inn[v].push(id);
        Ok(())
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn vertices(&self) -> impl Iterator<Item = usize> {
        1..=self.vertex_count
    }

    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    pub fn edge(&self, id: usize) -> (usize, usize) {
        self.edges[id]
    }

    pub fn edge_id(&self, u: usize, v: usize) -> Option<usize> {
        self.index.get(&(u, v)).copied()
    }

    /// Id of the anti-parallel edge `(v, u)`, if the network has one.
    pub fn reverse_id(&self, id: usize) -> Option<usize> {
        let (u, v) = self.edges[id];
        self.edge_id(v, u)
    }

    pub fn out_edges(&self, v: usize) -> &[usize] {
        &self.out[v]
    }

    pub fn in_edges(&self, v: usize) -> &[usize] {
        &self.inn[v]
    }

    pub fn contains(&self, v: usize) -> bool {
        v >= 1 && v <= self.vertex_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undirected_duplicates_both_directions() {
        let net = Network::undirected(3, &[(1, 2), (2, 3)]).unwrap();

        assert_eq!(net.edge_count(), 4);
        assert!(net.edge_id(1, 2).is_some());
        assert!(net.edge_id(2, 1).is_some());
        assert_eq!(net.out_edges(2).len(), 2);
        assert_eq!(net.in_edges(2).len(), 2);

        let id = net.edge_id(1, 2).unwrap();
        assert_eq!(net.edge(net.reverse_id(id).unwrap()), (2, 1));
    }

    #[test]
    fn test_directed_has_no_reverse() {
        let net = Network::directed(2, &[(1, 2)]).unwrap();

        assert_eq!(net.edge_count(), 1);
        assert!(net.edge_id(2, 1).is_none());
        assert!(net.reverse_id(0).is_none());
    }

    #[test]
    fn test_vertex_out_of_range() {
        let err = Network::directed(3, &[(1, 4)]).unwrap_err();
        assert!(matches!(
            err,
            SolveError::VertexOutOfRange { vertex: 4, max: 3 }
        ));

        let err = Network::directed(3, &[(0, 2)]).unwrap_err();
        assert!(matches!(
            err,
            SolveError::VertexOutOfRange { vertex: 0, max: 3 }
        ));
    }
}
