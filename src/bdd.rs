//! The BDD manager: canonical node construction and boolean combination.
//!
//! All diagram operations go through a [`Bdd`] manager, which owns the
//! unique table of nodes and the operation cache. Edges handed out by the
//! manager are canonical: two edges are equal if and only if they denote
//! the same boolean function under the manager's variable order.
//!
//! Variables are 1-indexed `u32`s; index 0 is reserved for the terminal.
//! The variable index doubles as the position in the global order, so the
//! level of variable `v` is `v - 1`.
//!
//! Complement convention: the single terminal node represents ⊤ through a
//! plain edge and ⊥ through a complemented one, and the `high` edge of a
//! stored node is never complemented. [`Bdd::mk_node`] restores this form
//! by complementing the node and both children; [`Bdd::low_edge`] and
//! [`Bdd::high_edge`] push an incoming edge's complement onto the children.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Debug;

use log::debug;

use crate::cache::OpCache;
use crate::edge::Edge;
use crate::hash::{pairing3, StableHash};
use crate::node::Node;
use crate::table::UniqueTable;

/// Key of the ITE operation cache: the normalized operand triple.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct IteKey(Edge, Edge, Edge);

impl StableHash for IteKey {
    fn stable_hash(&self) -> u64 {
        pairing3(self.0.code(), self.1.code(), self.2.code())
    }
}

pub struct Bdd {
    table: RefCell<UniqueTable<Node>>,
    ite_cache: RefCell<OpCache<IteKey, Edge>>,
    one: Edge,
    zero: Edge,
}

impl Bdd {
    /// Create a manager with storage for `2^bits` nodes.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "storage bits must be in 0..=31");

        let mut table = UniqueTable::new(bits);

        // The shared terminal node lives at index 1.
        let terminal = table.alloc();
        debug_assert_eq!(terminal, 1);
        let one = Edge::positive(terminal as u32);

        Self {
            table: RefCell::new(table),
            ite_cache: RefCell::new(OpCache::new(bits.min(16))),
            one,
            zero: -one,
        }
    }

    /// The constant true function.
    pub fn one(&self) -> Edge {
        self.one
    }

    /// The constant false function.
    pub fn zero(&self) -> Edge {
        self.zero
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::new(20)
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.table.borrow();
        f.debug_struct("Bdd")
            .field("capacity", &table.capacity())
            .field("nodes", &table.len())
            .finish()
    }
}

impl Bdd {
    /// Variable labeling the node at `index` (0 for the terminal).
    pub fn var(&self, index: usize) -> u32 {
        self.table.borrow().value(index).var
    }

    /// Stored `low` edge of the node at `index`, without polarity applied.
    pub fn low(&self, index: usize) -> Edge {
        self.table.borrow().value(index).low
    }

    /// Stored `high` edge of the node at `index`, without polarity applied.
    pub fn high(&self, index: usize) -> Edge {
        self.table.borrow().value(index).high
    }

    /// The `low` cofactor of the function denoted by `e`, with the edge's
    /// complement pushed down.
    pub fn low_edge(&self, e: Edge) -> Edge {
        let low = self.low(e.index());
        if e.is_complemented() {
            -low
        } else {
            low
        }
    }

    /// The `high` cofactor of the function denoted by `e`, with the edge's
    /// complement pushed down.
    pub fn high_edge(&self, e: Edge) -> Edge {
        let high = self.high(e.index());
        if e.is_complemented() {
            -high
        } else {
            high
        }
    }

    pub fn is_zero(&self, e: Edge) -> bool {
        e == self.zero
    }

    pub fn is_one(&self, e: Edge) -> bool {
        e == self.one
    }

    pub fn is_terminal(&self, e: Edge) -> bool {
        self.is_zero(e) || self.is_one(e)
    }

    /// Number of live nodes in the unique table (terminal included).
    pub fn num_nodes(&self) -> usize {
        self.table.borrow().len()
    }

    /// Level of the node reached through `e`, with terminals ranked below
    /// every variable.
    pub(crate) fn level_of(&self, e: Edge, num_vars: usize) -> usize {
        if self.is_terminal(e) {
            num_vars
        } else {
            (self.var(e.index()) - 1) as usize
        }
    }

    /// The canonical edge for the function `if var then high else low`.
    ///
    /// Applies redundancy elimination, complement normalization, and
    /// hash-consing, in that order.
    pub fn mk_node(&self, var: u32, low: Edge, high: Edge) -> Edge {
        debug_assert_ne!(var, 0, "variable indices are 1-based");
        debug_assert!(
            self.is_terminal(low) || self.var(low.index()) > var,
            "ordering violated on the low child"
        );
        debug_assert!(
            self.is_terminal(high) || self.var(high.index()) > var,
            "ordering violated on the high child"
        );

        // A node with identical children decides nothing.
        if low == high {
            return low;
        }

        // Keep the high edge plain by complementing the whole node.
        if high.is_complemented() {
            return -self.mk_node(var, -low, -high);
        }

        let index = self.table.borrow_mut().put(Node { var, low, high });
        Edge::positive(index as u32)
    }

    /// The single-variable function `var`.
    pub fn mk_var(&self, var: u32) -> Edge {
        self.mk_node(var, self.zero, self.one)
    }

    /// Conjunction of literals (DIMACS-style signed indices), built
    /// bottom-up without going through `apply_ite`.
    pub fn mk_cube(&self, literals: impl IntoIterator<Item = i32>) -> Edge {
        let mut literals: Vec<i32> = literals.into_iter().collect();
        literals.sort_by_key(|lit| std::cmp::Reverse(lit.abs()));
        debug!("mk_cube(literals = {:?})", literals);

        let mut current = self.one;
        for lit in literals {
            debug_assert_ne!(lit, 0, "literal 0 is invalid");
            current = if lit < 0 {
                self.mk_node(lit.unsigned_abs(), current, self.zero)
            } else {
                self.mk_node(lit.unsigned_abs(), self.zero, current)
            };
        }
        current
    }

    /// Disjunction of literals (DIMACS-style signed indices), built
    /// bottom-up without going through `apply_ite`.
    pub fn mk_clause(&self, literals: impl IntoIterator<Item = i32>) -> Edge {
        let mut literals: Vec<i32> = literals.into_iter().collect();
        literals.sort_by_key(|lit| std::cmp::Reverse(lit.abs()));
        debug!("mk_clause(literals = {:?})", literals);

        let mut current = self.zero;
        for lit in literals {
            debug_assert_ne!(lit, 0, "literal 0 is invalid");
            current = if lit < 0 {
                self.mk_node(lit.unsigned_abs(), self.one, current)
            } else {
                self.mk_node(lit.unsigned_abs(), current, self.one)
            };
        }
        current
    }

    /// Both cofactors of `e` with respect to `var`, which must not be below
    /// the node's own variable. If the node does not test `var`, both
    /// cofactors are `e` itself.
    pub fn top_cofactors(&self, e: Edge, var: u32) -> (Edge, Edge) {
        debug_assert_ne!(var, 0, "variable indices are 1-based");

        if self.is_terminal(e) || var < self.var(e.index()) {
            return (e, e);
        }
        debug_assert_eq!(var, self.var(e.index()));

        (self.low_edge(e), self.high_edge(e))
    }

    /// `if f then g else h`, the one boolean combinator everything else is
    /// built from.
    pub fn apply_ite(&self, f: Edge, g: Edge, h: Edge) -> Edge {
        debug!("apply_ite(f = {f}, g = {g}, h = {h})");

        // Constant selector.
        if self.is_one(f) {
            return g;
        }
        if self.is_zero(f) {
            return h;
        }

        // Results known without recursion.
        if g == h {
            return g;
        }
        if self.is_one(g) && self.is_zero(h) {
            return f;
        }
        if self.is_zero(g) && self.is_one(h) {
            return -f;
        }
        if self.is_one(g) && h == -f {
            return self.one;
        }
        if g == f && self.is_one(h) {
            return self.one;
        }
        if g == -f && self.is_zero(h) {
            return self.zero;
        }
        if self.is_zero(g) && h == f {
            return f;
        }

        // Standard triples: a branch equal to ±f collapses to a constant.
        if g == f {
            return self.apply_ite(f, self.one, h);
        }
        if g == -f {
            return self.apply_ite(f, self.zero, h);
        }
        if h == f {
            return self.apply_ite(f, g, self.zero);
        }
        if h == -f {
            return self.apply_ite(f, g, self.one);
        }

        let fv = self.var(f.index());
        let gv = self.var(g.index());
        let hv = self.var(h.index());
        debug_assert_ne!(fv, 0);

        // Commutative forms: rewrite so the operand with the lowest top
        // variable comes first, improving cache reuse.
        if self.is_one(g) && hv != 0 && hv < fv {
            return self.apply_ite(h, self.one, f);
        }
        if self.is_zero(h) && gv != 0 && gv < fv {
            return self.apply_ite(g, f, self.zero);
        }
        if self.is_one(h) && gv != 0 && gv < fv {
            return self.apply_ite(-g, -f, self.one);
        }
        if self.is_zero(g) && hv != 0 && hv < fv {
            return self.apply_ite(-h, self.zero, -f);
        }
        if g == -h && gv != 0 && gv < fv {
            return self.apply_ite(g, f, -f);
        }

        // Normalize polarities: the selector and the then-branch are kept
        // plain, complementing the result if needed.
        let (mut f, mut g, mut h) = (f, g, h);
        if f.is_complemented() {
            f = -f;
            std::mem::swap(&mut g, &mut h);
        }
        let complement_result = g.is_complemented();
        if complement_result {
            g = -g;
            h = -h;
        }

        let key = IteKey(f, g, h);
        if let Some(cached) = self.ite_cache.borrow().get(&key) {
            debug!("cache: apply_ite(f = {f}, g = {g}, h = {h}) -> {cached}");
            return if complement_result { -cached } else { cached };
        }

        // Shannon expansion on the top variable of the three operands.
        let mut top = self.var(f.index());
        for v in [self.var(g.index()), self.var(h.index())] {
            if v != 0 {
                top = top.min(v);
            }
        }

        let (f0, f1) = self.top_cofactors(f, top);
        let (g0, g1) = self.top_cofactors(g, top);
        let (h0, h1) = self.top_cofactors(h, top);

        let low = self.apply_ite(f0, g0, h0);
        let high = self.apply_ite(f1, g1, h1);
        let result = self.mk_node(top, low, high);
        debug!("computed: apply_ite(f = {f}, g = {g}, h = {h}) -> {result}");
        self.ite_cache.borrow_mut().insert(&key, result);

        if complement_result {
            -result
        } else {
            result
        }
    }

    pub fn apply_not(&self, f: Edge) -> Edge {
        -f
    }

    pub fn apply_and(&self, f: Edge, g: Edge) -> Edge {
        self.apply_ite(f, g, self.zero)
    }

    pub fn apply_or(&self, f: Edge, g: Edge) -> Edge {
        self.apply_ite(f, self.one, g)
    }

    pub fn apply_xor(&self, f: Edge, g: Edge) -> Edge {
        self.apply_ite(f, -g, g)
    }

    pub fn apply_eq(&self, f: Edge, g: Edge) -> Edge {
        self.apply_ite(f, g, -g)
    }

    pub fn apply_imply(&self, f: Edge, g: Edge) -> Edge {
        self.apply_ite(f, g, self.one)
    }

    pub fn apply_and_many(&self, edges: impl IntoIterator<Item = Edge>) -> Edge {
        edges
            .into_iter()
            .fold(self.one, |acc, e| self.apply_and(acc, e))
    }

    pub fn apply_or_many(&self, edges: impl IntoIterator<Item = Edge>) -> Edge {
        edges
            .into_iter()
            .fold(self.zero, |acc, e| self.apply_or(acc, e))
    }

    /// Cofactor `f` by fixing every variable in `values`, in one
    /// level-by-level pass.
    ///
    /// The memo table lives for this call only; reusing it across calls
    /// with different `values` would silently return stale results.
    pub fn restrict(&self, f: Edge, values: &HashMap<u32, bool>) -> Edge {
        let mut memo = HashMap::new();
        self.restrict_rec(f, values, &mut memo)
    }

    fn restrict_rec(
        &self,
        f: Edge,
        values: &HashMap<u32, bool>,
        memo: &mut HashMap<Edge, Edge>,
    ) -> Edge {
        if self.is_terminal(f) || values.is_empty() {
            return f;
        }
        if let Some(&res) = memo.get(&f) {
            return res;
        }

        let v = self.var(f.index());
        let res = match values.get(&v) {
            Some(true) => self.restrict_rec(self.high_edge(f), values, memo),
            Some(false) => self.restrict_rec(self.low_edge(f), values, memo),
            None => {
                let low = self.restrict_rec(self.low_edge(f), values, memo);
                let high = self.restrict_rec(self.high_edge(f), values, memo);
                self.mk_node(v, low, high)
            }
        };
        memo.insert(f, res);
        res
    }

    /// Evaluate `f` under a total assignment (`values[v - 1]` is the value
    /// of variable `v`), following a single path to a terminal.
    pub fn evaluate(&self, f: Edge, values: &[bool]) -> bool {
        let mut current = f;
        while !self.is_terminal(current) {
            let v = self.var(current.index());
            current = if values[(v - 1) as usize] {
                self.high_edge(current)
            } else {
                self.low_edge(current)
            };
        }
        self.is_one(current)
    }

    /// Indices of all nodes reachable from `roots` (terminal included).
    pub fn reachable(&self, roots: impl IntoIterator<Item = Edge>) -> HashSet<usize> {
        let mut visited = HashSet::new();
        visited.insert(self.one.index());

        let mut queue: VecDeque<usize> = roots.into_iter().map(Edge::index).collect();
        while let Some(index) = queue.pop_front() {
            if visited.insert(index) {
                queue.push_back(self.low(index).index());
                queue.push_back(self.high(index).index());
            }
        }
        visited
    }

    /// Number of nodes in the sub-DAG rooted at `f`, terminal included.
    pub fn size(&self, f: Edge) -> usize {
        self.reachable([f]).len()
    }

    /// Drop every node not reachable from `roots` and clear the operation
    /// cache. Explicit and optional: the diagram is typically built once
    /// and read many times, so nothing is collected automatically.
    pub fn collect_garbage(&self, roots: &[Edge]) {
        debug!("collect_garbage({} roots)", roots.len());

        self.ite_cache.borrow_mut().clear();
        let alive = self.reachable(roots.iter().copied());
        self.table.borrow_mut().sweep(&alive);
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_terminals() {
        let bdd = Bdd::default();

        assert!(bdd.is_terminal(bdd.one()));
        assert!(bdd.is_terminal(bdd.zero()));
        assert!(bdd.is_one(bdd.one()));
        assert!(bdd.is_zero(bdd.zero()));
        assert_eq!(bdd.zero(), -bdd.one());
    }

    #[test]
    fn test_var_node() {
        let bdd = Bdd::default();

        let x = bdd.mk_var(1);
        assert_eq!(bdd.var(x.index()), 1);
        assert_eq!(bdd.low_edge(x), bdd.zero());
        assert_eq!(bdd.high_edge(x), bdd.one());

        let not_x = -x;
        assert_eq!(bdd.low_edge(not_x), bdd.one());
        assert_eq!(bdd.high_edge(not_x), bdd.zero());
    }

    #[test]
    fn test_mk_node_redundancy() {
        let bdd = Bdd::default();
        let x2 = bdd.mk_var(2);
        assert_eq!(bdd.mk_node(1, x2, x2), x2);
    }

    #[test]
    fn test_mk_node_canonicity() {
        let bdd = Bdd::default();

        // Requesting a complemented high edge yields a complemented node
        // whose stored high edge is plain.
        let e = bdd.mk_node(1, bdd.one(), bdd.zero());
        assert!(e.is_complemented());
        assert!(!bdd.high(e.index()).is_complemented());
        assert_eq!(e, -bdd.mk_var(1));
    }

    #[test]
    fn test_hash_consing_shares_nodes() {
        let bdd = Bdd::default();

        let a = bdd.mk_node(1, bdd.zero(), bdd.one());
        let b = bdd.mk_node(1, bdd.zero(), bdd.one());
        assert_eq!(a, b);
        assert_eq!(bdd.num_nodes(), 2); // terminal + x1
    }

    #[test]
    fn test_cube_and_clause() {
        let bdd = Bdd::default();

        let x1 = bdd.mk_var(1);
        let x2 = bdd.mk_var(2);
        let x3 = bdd.mk_var(3);

        let cube = bdd.mk_cube([1, -2, 3]);
        let by_and = bdd.apply_and_many([x1, -x2, x3]);
        assert_eq!(cube, by_and);

        let clause = bdd.mk_clause([1, -2, 3]);
        let by_or = bdd.apply_or_many([x1, -x2, x3]);
        assert_eq!(clause, by_or);
    }

    #[test]
    fn test_de_morgan() {
        let bdd = Bdd::default();

        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);

        assert_eq!(-bdd.apply_and(x, y), bdd.apply_or(-x, -y));
        assert_eq!(-bdd.apply_or(x, y), bdd.apply_and(-x, -y));
    }

    #[test]
    fn test_xor_identities() {
        let bdd = Bdd::default();

        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        let f = bdd.apply_and(x, y);

        assert_eq!(bdd.apply_xor(f, f), bdd.zero());
        assert_eq!(bdd.apply_xor(f, -f), bdd.one());
        assert_eq!(bdd.apply_xor(x, y), bdd.apply_xor(y, x));
    }

    #[test]
    fn test_ite_terminal_cases() {
        let bdd = Bdd::default();

        let g = bdd.mk_var(2);
        let h = bdd.mk_var(3);
        assert_eq!(bdd.apply_ite(bdd.one(), g, h), g);
        assert_eq!(bdd.apply_ite(bdd.zero(), g, h), h);

        let f = bdd.mk_var(1);
        assert_eq!(bdd.apply_ite(f, g, g), g);
        assert_eq!(bdd.apply_ite(f, bdd.one(), bdd.zero()), f);
        assert_eq!(bdd.apply_ite(f, bdd.zero(), bdd.one()), -f);
    }

    #[test]
    fn test_ite_standard_triples() {
        let bdd = Bdd::default();

        let h = bdd.mk_var(3);
        let g = bdd.mk_var(2);
        let f = bdd.mk_node(1, bdd.one(), h);

        assert_eq!(bdd.apply_ite(f, f, h), bdd.apply_or(f, h));
        assert_eq!(bdd.apply_ite(f, g, f), bdd.apply_and(f, g));
        assert_eq!(bdd.apply_ite(f, -g, bdd.one()), -bdd.apply_and(f, g));
        assert_eq!(bdd.apply_ite(f, bdd.zero(), -h), -bdd.apply_or(f, h));
    }

    #[test]
    fn test_ite_negated_operands() {
        let bdd = Bdd::default();

        let f = bdd.mk_var(6);
        let g = bdd.mk_var(7);
        let h = bdd.mk_var(8);
        let expected = bdd.mk_node(6, -g, -h);
        assert_eq!(bdd.apply_ite(-f, -g, -h), expected);
    }

    #[test]
    fn test_restrict_single_variable() {
        let bdd = Bdd::default();

        let x1 = bdd.mk_var(1);
        let x2 = bdd.mk_var(2);
        let x3 = bdd.mk_var(3);

        let f = bdd.apply_or(bdd.apply_eq(x1, x2), x3);
        let restricted = bdd.restrict(f, &HashMap::from([(2, false)]));
        assert_eq!(restricted, bdd.apply_or(-x1, x3));
    }

    #[test]
    fn test_restrict_multiple_variables() {
        let bdd = Bdd::default();

        let x1 = bdd.mk_var(1);
        let x3 = bdd.mk_var(3);

        let f = bdd.mk_cube([-1, 2, 3, -4]);
        let values = HashMap::from([(2, true), (4, false)]);
        assert_eq!(bdd.restrict(f, &values), bdd.apply_and(-x1, x3));
    }

    #[test]
    fn test_restrict_to_constant() {
        let bdd = Bdd::default();

        let f = bdd.mk_cube([1, 2]);
        assert_eq!(bdd.restrict(f, &HashMap::from([(1, false)])), bdd.zero());

        let g = bdd.mk_clause([1, 2]);
        assert_eq!(bdd.restrict(g, &HashMap::from([(2, true)])), bdd.one());
    }

    #[test]
    fn test_evaluate() {
        let bdd = Bdd::default();

        let f = bdd.mk_clause([1, -3]);
        assert!(bdd.evaluate(f, &[true, false, true]));
        assert!(bdd.evaluate(f, &[false, true, false]));
        assert!(!bdd.evaluate(f, &[false, false, true]));

        assert!(bdd.evaluate(bdd.one(), &[]));
        assert!(!bdd.evaluate(bdd.zero(), &[]));
    }

    #[test]
    fn test_size() {
        let bdd = Bdd::default();

        assert_eq!(bdd.size(bdd.one()), 1);

        let f = bdd.mk_cube([1, 2, 3]);
        assert_eq!(bdd.size(f), 4);
        // Complementation is free: same sub-DAG.
        assert_eq!(bdd.size(-f), 4);
    }

    #[test]
    fn test_construction_is_deterministic() {
        let build = |bdd: &Bdd| {
            let a = bdd.mk_clause([1, 2, -3]);
            let b = bdd.mk_clause([-1, 3]);
            bdd.apply_and(a, b)
        };

        let bdd1 = Bdd::default();
        let bdd2 = Bdd::default();
        let f1 = build(&bdd1);
        let f2 = build(&bdd2);

        assert_eq!(f1.raw(), f2.raw());
        assert_eq!(bdd1.num_nodes(), bdd2.num_nodes());
    }

    #[test]
    fn test_collect_garbage_keeps_roots() {
        let bdd = Bdd::default();

        let keep = bdd.mk_cube([1, 2]);
        let scratch = bdd.mk_cube([3, 4, 5]);
        let nodes_before = bdd.num_nodes();

        bdd.collect_garbage(&[keep]);

        assert!(bdd.num_nodes() < nodes_before);
        assert_eq!(bdd.size(keep), 3);
        assert!(bdd.evaluate(keep, &[true, true]));

        // Rebuilding the dropped function must still canonicalize.
        let rebuilt = bdd.mk_cube([3, 4, 5]);
        assert_eq!(bdd.mk_cube([3, 4, 5]), rebuilt);
        let _ = scratch;
    }

    #[test]
    fn test_apply_results_are_shared() {
        let bdd = Bdd::default();

        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        let f = bdd.apply_xor(x, y);
        let g = bdd.apply_xor(x, y);
        assert_eq!(f, g);

        let h = bdd.apply_xor(x, -y);
        assert_eq!(h, -f);
    }
}
