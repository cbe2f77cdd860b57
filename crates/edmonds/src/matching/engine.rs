//! The matching engine: forest growth, blossom contraction/expansion,
//! augmentation, and the dual-cost update of the primal-dual loop.
//!
//! State model
//! - Per-vertex/blossom arrays are sized `2n`: slots `[0, n)` are the
//!   original vertices, slots `[n, 2n)` are blossom handles drawn from a
//!   free-index stack and returned when a blossom is expanded or destroyed.
//! - `outer[v]` names the outermost blossom containing `v` (idempotent:
//!   `outer[outer[v]] == outer[v]`); `deep[v]` lists the original vertices
//!   nested anywhere inside `v`; `shallow[v]` is the odd circuit of direct
//!   children, tip first.
//! - An edge is usable iff its slack is zero (within tolerance); a blossom
//!   with positive dual is blocked and behaves as an atomic vertex.
//!
//! Every solve starts from `clear()`, so recycled blossom handles can never
//! observe state from a previous solve.

use std::collections::VecDeque;

use log::{debug, trace};

use crate::graph::Graph;
use crate::heap::MinHeap;

use super::types::{Label, MatchCfg, MatchingError, Result};

/// Blossom-matching engine over a fixed graph.
///
/// Owns all mutable solver state; one instance supports one in-flight solve
/// at a time and may be reused for repeated solves on the same graph.
pub struct Matching<'g> {
    g: &'g Graph,
    cfg: MatchCfg,
    n: usize,
    m: usize,

    outer: Vec<usize>,
    deep: Vec<Vec<usize>>,
    shallow: Vec<Vec<usize>>,
    tip: Vec<usize>,
    active: Vec<bool>,
    label: Vec<Label>,
    forest: Vec<Option<usize>>,
    root: Vec<usize>,
    blocked: Vec<bool>,
    dual: Vec<f64>,
    slack: Vec<f64>,
    mate: Vec<Option<usize>>,

    free: Vec<usize>,
    visited: Vec<bool>,
    queue: VecDeque<usize>,
    perfect: bool,
}

impl<'g> Matching<'g> {
    pub fn new(g: &'g Graph) -> Self {
        Self::with_cfg(g, MatchCfg::default())
    }

    pub fn with_cfg(g: &'g Graph, cfg: MatchCfg) -> Self {
        let n = g.vertex_count();
        let m = g.edge_count();
        let mut engine = Self {
            g,
            cfg,
            n,
            m,
            outer: (0..2 * n).collect(),
            deep: vec![Vec::new(); 2 * n],
            shallow: vec![Vec::new(); 2 * n],
            tip: (0..2 * n).collect(),
            active: vec![false; 2 * n],
            label: vec![Label::Unlabeled; 2 * n],
            forest: vec![None; 2 * n],
            root: (0..2 * n).collect(),
            blocked: vec![false; 2 * n],
            dual: vec![0.0; 2 * n],
            slack: vec![0.0; m],
            mate: vec![None; 2 * n],
            free: Vec::with_capacity(n),
            visited: vec![false; 2 * n],
            queue: VecDeque::with_capacity(n),
            perfect: false,
        };
        engine.clear();
        engine
    }

    /// Maximum-cardinality matching as a list of edge indices.
    pub fn solve_maximum_matching(&mut self) -> Vec<usize> {
        self.clear();
        self.grow();
        let matching = self.retrieve_matching();
        debug!(
            "maximum matching: {} edges, perfect = {}",
            matching.len(),
            self.perfect
        );
        matching
    }

    /// Minimum-cost perfect matching for `cost[i]` per edge index `i`.
    ///
    /// Returns the matched edge indices and their total (original) cost, or
    /// [`MatchingError::Infeasible`] if no perfect matching exists; in that
    /// case no cost-based work is done and the engine is left cleared.
    ///
    /// `cost.len()` must equal the graph's edge count.
    pub fn solve_minimum_cost_perfect_matching(
        &mut self,
        cost: &[f64],
    ) -> Result<(Vec<usize>, f64)> {
        assert_eq!(cost.len(), self.m, "expected one cost per edge");

        self.solve_maximum_matching();
        if !self.perfect {
            self.clear();
            return Err(MatchingError::Infeasible);
        }

        self.clear();
        // Slacks start as the (shifted) reduced costs.
        self.slack.copy_from_slice(cost);
        self.positive_costs();

        self.perfect = false;
        let mut rounds = 0u32;
        while !self.perfect {
            self.heuristic();
            self.grow();
            self.update_dual_costs();
            self.reset();
            rounds += 1;
        }

        let matching = self.retrieve_matching();
        let obj: f64 = matching.iter().map(|&e| cost[e]).sum();
        debug!(
            "min-cost perfect matching: {} edges, cost {:.6}, {} rounds, dual objective {:.6}",
            matching.len(),
            obj,
            rounds,
            self.dual_objective()
        );
        Ok((matching, obj))
    }

    /// Dual objective of the last cost solve: vertex duals plus the duals of
    /// blocked blossoms. Equals the primal cost of the returned matching (up
    /// to the shared tolerance) once a perfect matching has been found with
    /// non-negative costs.
    pub fn dual_objective(&self) -> f64 {
        let mut obj = 0.0;
        for i in 0..2 * self.n {
            if i < self.n || self.blocked[i] {
                obj += self.dual[i];
            }
        }
        obj
    }

    // ---- forest growth -------------------------------------------------

    /// Grows the alternating forest until either an augmenting path is found
    /// and applied (then restarts from a fresh forest) or the search is
    /// exhausted, leaving the caller to perform a dual update.
    fn grow(&mut self) {
        self.reset();
        let g = self.g;

        // BFS over outer blossoms; seeds are the unmatched roots.
        'forest: while let Some(seed) = self.queue.pop_front() {
            let w = self.outer[seed];

            // w may be a blossom: explore the connections of every original
            // vertex inside it.
            let mut di = 0;
            while di < self.deep[w].len() {
                let u = self.deep[w][di];
                di += 1;

                for &v in g.adj_list(u) {
                    if self.edge_blocked(u, v) {
                        continue;
                    }
                    // u is even; an odd endpoint cannot extend the forest.
                    if self.label[self.outer[v]] == Label::Odd {
                        continue;
                    }

                    if self.label[self.outer[v]] != Label::Even {
                        // Unlabeled: extend through v's matched edge.
                        let vm = self.mate[self.outer[v]]
                            .expect("an unlabeled non-root vertex is matched");

                        self.forest[self.outer[v]] = Some(u);
                        self.label[self.outer[v]] = Label::Odd;
                        self.root[self.outer[v]] = self.root[self.outer[u]];
                        self.forest[self.outer[vm]] = Some(v);
                        self.label[self.outer[vm]] = Label::Even;
                        self.root[self.outer[vm]] = self.root[self.outer[u]];

                        if !self.visited[self.outer[vm]] {
                            self.visited[self.outer[vm]] = true;
                            self.queue.push_back(vm);
                        }
                    } else if self.root[self.outer[v]] != self.root[self.outer[u]] {
                        // Even endpoints in different trees: augmenting path.
                        trace!("augmenting path between {u} and {v}");
                        self.augment(u, v);
                        self.reset();
                        continue 'forest;
                    } else if self.outer[u] != self.outer[v] {
                        // Even endpoints in the same tree: blossom.
                        let b = self.contract(u, v);
                        self.queue.push_front(b);
                        self.visited[b] = true;
                        continue 'forest;
                    }
                }
            }
        }

        self.perfect = (0..self.n).all(|i| self.mate[self.outer[i]].is_some());
    }

    /// Augments the matching along the forest paths root[u] .. u, v .. root[v].
    fn augment(&mut self, u: usize, v: usize) {
        let mut p = self.outer[u];
        let mut q = self.outer[v];
        let outv = q;

        let mut fp = self.forest[p];
        self.mate[p] = Some(q);
        self.mate[q] = Some(p);
        self.expand(p, false);
        self.expand(q, false);
        while let Some(up) = fp {
            q = self.outer[up];
            p = self.outer[self.forest[q].expect("odd blossom has a forest parent")];
            fp = self.forest[p];

            self.mate[p] = Some(q);
            self.mate[q] = Some(p);
            self.expand(p, false);
            self.expand(q, false);
        }

        p = outv;
        fp = self.forest[p];
        while let Some(up) = fp {
            q = self.outer[up];
            p = self.outer[self.forest[q].expect("odd blossom has a forest parent")];
            fp = self.forest[p];

            self.mate[p] = Some(q);
            self.mate[q] = Some(p);
            self.expand(p, false);
            self.expand(q, false);
        }
    }

    // ---- blossom management --------------------------------------------

    /// Contracts the odd circuit through two even, same-tree vertices into a
    /// fresh blossom slot; returns the new blossom handle.
    fn contract(&mut self, u: usize, v: usize) -> usize {
        let t = self.free.pop().expect("a free blossom slot is available");

        // The tip is the first common outer blossom on the two root paths.
        let mut in_path = vec![false; 2 * self.n];
        let mut cur = Some(u);
        while let Some(x) = cur {
            in_path[self.outer[x]] = true;
            cur = self.forest[self.outer[x]];
        }
        let mut tip = self.outer[v];
        while !in_path[tip] {
            tip = self.outer[self.forest[tip].expect("root paths meet at a common ancestor")];
        }
        self.tip[t] = tip;

        // Odd circuit in cyclic order: tip, down to u, then v back up.
        let mut circuit = Vec::new();
        let mut x = self.outer[u];
        circuit.push(x);
        while x != tip {
            x = self.outer[self.forest[x].expect("u-side path reaches the tip")];
            circuit.push(x);
        }
        circuit.reverse();
        let mut y = self.outer[v];
        while y != tip {
            circuit.push(y);
            y = self.outer[self.forest[y].expect("v-side path reaches the tip")];
        }
        trace!("contracting blossom {t} with circuit {circuit:?}");

        let mut members = Vec::new();
        for &s in &circuit {
            self.outer[s] = t;
            for k in 0..self.deep[s].len() {
                let j = self.deep[s][k];
                members.push(j);
                self.outer[j] = t;
            }
        }
        self.shallow[t] = circuit;
        self.deep[t] = members;

        self.forest[t] = self.forest[tip];
        self.label[t] = Label::Even;
        self.root[t] = self.root[tip];
        self.active[t] = true;
        self.outer[t] = t;
        self.mate[t] = self.mate[tip];
        t
    }

    /// Expands blossom `u`: fixes the mate pair on the lowest-index tight
    /// edge towards its mated blossom, assigns alternating mates around the
    /// odd circuit, restores `outer` for the freed children, returns the slot
    /// to the pool, and recurses into the children.
    ///
    /// Blocked blossoms stay contracted unless `expand_blocked` is set (the
    /// final matching retrieval forces them open).
    fn expand(&mut self, u: usize, expand_blocked: bool) {
        let v = self.outer[self.mate[u].expect("an expanded blossom is matched")];

        // The lowest edge index makes both sides of a mated blossom pair
        // settle on the same connecting edge when expanded independently.
        let mut best = self.m;
        let mut pair = None;
        for &di in &self.deep[u] {
            for &dj in &self.deep[v] {
                if let Some(e) = self.g.edge_index(di, dj) {
                    if !self.edge_blocked_by_index(e) && e < best {
                        best = e;
                        pair = Some((di, dj));
                    }
                }
            }
        }
        let (p, q) = pair.expect("mated blossoms are joined by a tight edge");
        self.mate[u] = Some(q);
        self.mate[v] = Some(p);

        if u < self.n || (self.blocked[u] && !expand_blocked) {
            return;
        }
        trace!("expanding blossom {u} on edge ({p}, {q})");

        // Rotate the circuit so the child holding p leads, then pair off the
        // remaining children around the odd circuit.
        let lead = self.shallow[u]
            .iter()
            .position(|&s| self.deep[s].contains(&p))
            .expect("the tight endpoint lies inside one child");
        self.shallow[u].rotate_left(lead);

        let circuit = self.shallow[u].clone();
        self.mate[circuit[0]] = self.mate[u];
        let mut i = 1;
        while i + 1 < circuit.len() {
            self.mate[circuit[i]] = Some(circuit[i + 1]);
            self.mate[circuit[i + 1]] = Some(circuit[i]);
            i += 2;
        }

        for &s in &circuit {
            self.outer[s] = s;
            for k in 0..self.deep[s].len() {
                let j = self.deep[s][k];
                self.outer[j] = s;
            }
        }
        self.active[u] = false;
        self.free.push(u);

        for &s in &circuit {
            self.expand(s, expand_blocked);
        }
    }

    /// Dissolves an unblocked blossom without touching the matching, undoing
    /// the contraction recursively and returning the slots to the pool.
    fn destroy(&mut self, t: usize) {
        if t < self.n || (self.blocked[t] && self.cfg.greater(self.dual[t], 0.0)) {
            return;
        }

        for i in 0..self.shallow[t].len() {
            let s = self.shallow[t][i];
            self.outer[s] = s;
            for k in 0..self.deep[s].len() {
                let j = self.deep[s][k];
                self.outer[j] = s;
            }
            self.destroy(s);
        }

        self.active[t] = false;
        self.blocked[t] = false;
        self.free.push(t);
        self.mate[t] = None;
    }

    // ---- dual update ----------------------------------------------------

    /// Adjusts duals and slacks after an exhausted grow phase so that at
    /// least one new forest extension becomes possible, preserving dual
    /// feasibility (`slack >= 0` for every edge).
    fn update_dual_costs(&mut self) {
        let g = self.g;

        // Step bounds: e1 over even/unlabeled edges, e2 over even/even edges
        // between different outer blossoms, e3 over odd blossom duals.
        let mut e1: Option<f64> = None;
        let mut e2: Option<f64> = None;
        let mut e3: Option<f64> = None;
        for i in 0..self.m {
            let (u, v) = g.edge(i);
            let lu = self.label[self.outer[u]];
            let lv = self.label[self.outer[v]];

            if (lu == Label::Even && lv == Label::Unlabeled)
                || (lv == Label::Even && lu == Label::Unlabeled)
            {
                if e1.map_or(true, |b| self.cfg.greater(b, self.slack[i])) {
                    e1 = Some(self.slack[i]);
                }
            } else if self.outer[u] != self.outer[v]
                && lu == Label::Even
                && lv == Label::Even
            {
                if e2.map_or(true, |b| self.cfg.greater(b, self.slack[i])) {
                    e2 = Some(self.slack[i]);
                }
            }
        }
        for i in self.n..2 * self.n {
            if self.active[i]
                && self.outer[i] == i
                && self.label[i] == Label::Odd
                && e3.map_or(true, |b| self.cfg.greater(b, self.dual[i]))
            {
                e3 = Some(self.dual[i]);
            }
        }

        let mut e = e1.or(e2).or(e3).unwrap_or(0.0);
        // Clamp so a single step cannot overshoot a blossom-shrink (e2/2) or
        // blossom-unblock (e3) event.
        if let Some(b2) = e2 {
            if self.cfg.greater(e, b2 / 2.0) {
                e = b2 / 2.0;
            }
        }
        if let Some(b3) = e3 {
            if self.cfg.greater(e, b3) {
                e = b3;
            }
        }
        trace!("dual step {e}");

        for i in 0..2 * self.n {
            if i != self.outer[i] || !self.active[i] {
                continue;
            }
            match self.label[i] {
                Label::Even => self.dual[i] += e,
                Label::Odd => self.dual[i] -= e,
                Label::Unlabeled => {}
            }
        }

        for i in 0..self.m {
            let (u, v) = g.edge(i);
            if self.outer[u] == self.outer[v] {
                continue;
            }
            let lu = self.label[self.outer[u]];
            let lv = self.label[self.outer[v]];
            match (lu, lv) {
                (Label::Even, Label::Even) => self.slack[i] -= 2.0 * e,
                (Label::Odd, Label::Odd) => self.slack[i] += 2.0 * e,
                (Label::Even, Label::Unlabeled) | (Label::Unlabeled, Label::Even) => {
                    self.slack[i] -= e
                }
                (Label::Odd, Label::Unlabeled) | (Label::Unlabeled, Label::Odd) => {
                    self.slack[i] += e
                }
                _ => {}
            }
        }

        for i in self.n..2 * self.n {
            if self.cfg.greater(self.dual[i], 0.0) {
                self.blocked[i] = true;
            } else if self.active[i] && self.blocked[i] {
                // The blossom is becoming unblocked.
                if self.mate[i].is_none() {
                    self.destroy(i);
                } else {
                    self.blocked[i] = false;
                    self.expand(i, false);
                }
            }
        }
    }

    // ---- warm start and bookkeeping -------------------------------------

    /// Greedy warm start: vertices in ascending unblocked degree, each
    /// matched to its eligible neighbor of minimum degree. Pure convergence
    /// aid; correctness never depends on it.
    fn heuristic(&mut self) {
        let g = self.g;
        let mut degree = vec![0usize; self.n];
        for i in 0..self.m {
            if self.edge_blocked_by_index(i) {
                continue;
            }
            let (u, v) = g.edge(i);
            degree[u] += 1;
            degree[v] += 1;
        }

        let mut heap = MinHeap::with_capacity(self.n);
        for (i, &d) in degree.iter().enumerate() {
            heap.insert(d, i);
        }

        let mut matched = 0usize;
        while let Some(u) = heap.delete_min() {
            if self.mate[self.outer[u]].is_some() {
                continue;
            }
            let mut min: Option<usize> = None;
            for &v in g.adj_list(u) {
                if self.edge_blocked(u, v)
                    || self.outer[u] == self.outer[v]
                    || self.mate[self.outer[v]].is_some()
                {
                    continue;
                }
                if min.map_or(true, |w| degree[v] < degree[w]) {
                    min = Some(v);
                }
            }
            if let Some(v) = min {
                self.mate[self.outer[u]] = Some(v);
                self.mate[self.outer[v]] = Some(u);
                matched += 1;
            }
        }
        trace!("heuristic matched {matched} pairs");
    }

    /// Shifts all slacks so the smallest is non-negative.
    fn positive_costs(&mut self) {
        let mut min_edge = 0.0;
        for &s in &self.slack {
            if self.cfg.greater(min_edge - s, 0.0) {
                min_edge = s;
            }
        }
        for s in &mut self.slack {
            *s -= min_edge;
        }
    }

    /// Force-expands every active matched blossom, then reads the matching
    /// off the original vertices as edge indices.
    fn retrieve_matching(&mut self) -> Vec<usize> {
        for i in 0..2 * self.n {
            if self.active[i] && self.mate[i].is_some() && self.outer[i] == i {
                self.expand(i, true);
            }
        }

        let mut matching = Vec::new();
        for i in 0..self.m {
            let (u, v) = self.g.edge(i);
            if self.mate[u] == Some(v) {
                matching.push(i);
            }
        }
        matching
    }

    /// Resets the alternating forest: drops labels and parent pointers,
    /// dissolves zero-dual top-level blossoms, and seeds the grow queue with
    /// the unmatched roots (labeled even).
    fn reset(&mut self) {
        for i in 0..2 * self.n {
            self.forest[i] = None;
            self.root[i] = i;

            if i >= self.n && self.active[i] && self.outer[i] == i {
                self.destroy(i);
            }
        }

        for f in &mut self.visited {
            *f = false;
        }
        self.queue.clear();
        for i in 0..self.n {
            let w = self.outer[i];
            if self.mate[w].is_none() {
                self.label[w] = Label::Even;
                if !self.visited[w] {
                    self.visited[w] = true;
                    self.queue.push_back(i);
                }
            } else {
                self.label[w] = Label::Unlabeled;
            }
        }

        #[cfg(debug_assertions)]
        self.check_mate_symmetry();
    }

    /// Reinitializes every array: all original vertices active and unmatched,
    /// no blossoms, zero duals and slacks, full free-slot pool.
    fn clear(&mut self) {
        self.free.clear();
        self.free.extend(self.n..2 * self.n);

        for i in 0..2 * self.n {
            self.outer[i] = i;
            self.deep[i].clear();
            if i < self.n {
                self.deep[i].push(i);
            }
            self.shallow[i].clear();
            self.active[i] = i < self.n;
            self.label[i] = Label::Unlabeled;
            self.forest[i] = None;
            self.root[i] = i;
            self.blocked[i] = false;
            self.dual[i] = 0.0;
            self.mate[i] = None;
            self.tip[i] = i;
        }
        for s in &mut self.slack {
            *s = 0.0;
        }
        self.perfect = false;
    }

    #[cfg(debug_assertions)]
    fn check_mate_symmetry(&self) {
        for v in 0..2 * self.n {
            if !self.active[v] || self.outer[v] != v {
                continue;
            }
            if let Some(mv) = self.mate[v] {
                let w = self.outer[mv];
                let back = self.mate[w].map(|x| self.outer[x]);
                debug_assert_eq!(back, Some(v), "asymmetric mates on {v} and {w}");
            }
        }
    }

    // ---- edge predicates -------------------------------------------------

    /// An edge with positive slack cannot be used by the matching.
    #[inline]
    fn edge_blocked_by_index(&self, e: usize) -> bool {
        self.cfg.greater(self.slack[e], 0.0)
    }

    #[inline]
    fn edge_blocked(&self, u: usize, v: usize) -> bool {
        let e = self
            .g
            .edge_index(u, v)
            .expect("adjacent vertices carry an edge index");
        self.edge_blocked_by_index(e)
    }
}
