//! Undirected simple graphs with stable edge indices.
//!
//! Purpose
//! - Provide the read-only storage the matching engine consumes: adjacency
//!   lists, edge endpoints by index, and an O(1) pair-to-index lookup.
//! - Keep the API minimal; the engine never mutates the graph and holds a
//!   shared reference for its whole lifetime.

pub mod rand;

/// Immutable undirected graph over vertices `0..n`.
///
/// Edges keep the index they were inserted with; the matching engine reports
/// solutions as lists of these indices and resolves ties (which edge links a
/// pair of expanded blossoms) by the smallest index.
#[derive(Clone, Debug)]
pub struct Graph {
    n: usize,
    edges: Vec<(usize, usize)>,
    adj: Vec<Vec<usize>>,
    // Row-major n*n lookup: index[u * n + v] is the edge joining u and v.
    index: Vec<Option<usize>>,
}

impl Graph {
    /// Build a graph on `n` vertices from a list of undirected edges.
    ///
    /// Preconditions (checked): endpoints in range, no self loops, no
    /// duplicate edges in either orientation.
    pub fn new(n: usize, edges: &[(usize, usize)]) -> Self {
        let mut adj = vec![Vec::new(); n];
        let mut index = vec![None; n * n];
        let mut stored = Vec::with_capacity(edges.len());
        for (i, &(u, v)) in edges.iter().enumerate() {
            assert!(u < n && v < n, "edge ({u}, {v}) out of range for n = {n}");
            assert_ne!(u, v, "self loop at vertex {u}");
            assert!(
                index[u * n + v].is_none(),
                "duplicate edge ({u}, {v}) at position {i}"
            );
            index[u * n + v] = Some(i);
            index[v * n + u] = Some(i);
            adj[u].push(v);
            adj[v].push(u);
            stored.push((u, v));
        }
        Self {
            n,
            edges: stored,
            adj,
            index,
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Endpoints of the edge with index `i`.
    #[inline]
    pub fn edge(&self, i: usize) -> (usize, usize) {
        self.edges[i]
    }

    /// Index of the edge joining `u` and `v`, if they are adjacent.
    #[inline]
    pub fn edge_index(&self, u: usize, v: usize) -> Option<usize> {
        self.index[u * self.n + v]
    }

    #[inline]
    pub fn is_adjacent(&self, u: usize, v: usize) -> bool {
        self.edge_index(u, v).is_some()
    }

    /// Neighbors of `v` in insertion order.
    #[inline]
    pub fn adj_list(&self, v: usize) -> &[usize] {
        &self.adj[v]
    }
}
