//! Referral graph and reach counting.
//!
//! Nodes are user ids, edges are `referrer -> referred` for every
//! `REFER_USER` action that names a target. The graph is a multigraph and
//! may contain cycles, including self-loops.
//!
//! The reach count of a user is the number of referral edges leaving any
//! node reachable from that user (the user included). Equivalently: walk
//! everything reachable, count each edge once when its source is expanded.

use crate::record::Action;
use roaring::RoaringBitmap;
use std::collections::{BTreeMap, HashMap};

/// Adjacency lists of the referral graph, in log order, duplicates kept.
///
/// # Examples
///
/// ```
/// use actionfold::{Action, ReferralGraph, REFER_USER};
///
/// let log = vec![
///     Action::new(1, REFER_USER, 1).with_target(2),
///     Action::new(2, REFER_USER, 2).with_target(1),
/// ];
/// let graph = ReferralGraph::from_actions(&log);
/// let index = graph.referral_index([1, 2, 3]);
/// assert_eq!(index[&1], 2);
/// assert_eq!(index[&2], 2);
/// assert_eq!(index[&3], 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReferralGraph {
    adjacency: HashMap<i64, Vec<i64>>,
    edge_count: usize,
}

impl ReferralGraph {
    /// Build the graph from every referral edge in the log.
    pub fn from_actions(actions: &[Action]) -> Self {
        let mut graph = ReferralGraph::default();
        for action in actions {
            match action.referral_edge() {
                Some((from, to)) => graph.add_edge(from, to),
                None if action.is_referral() => {
                    log::debug!(
                        "actionfold: referral action {} has no target user, ignoring",
                        action.id
                    );
                }
                None => {}
            }
        }
        graph
    }

    fn add_edge(&mut self, from: i64, to: i64) {
        self.adjacency.entry(from).or_default().push(to);
        self.edge_count += 1;
    }

    /// Users directly referred by `user`, one entry per referral action.
    pub fn direct_referrals(&self, user: i64) -> &[i64] {
        self.adjacency.get(&user).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of referral edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    fn out_degree(&self, user: i64) -> u64 {
        self.direct_referrals(user).len() as u64
    }

    /// Reach count of a single user.
    pub fn reach_count(&self, user: i64) -> u64 {
        self.referral_index([user]).get(&user).copied().unwrap_or(0)
    }

    /// Reach count for every user in `users`.
    ///
    /// All state used by the computation (visited marks, reach sets) lives
    /// for this call only, so concurrent callers never share anything
    /// mutable. Users that refer nobody map to 0.
    pub fn referral_index<I>(&self, users: I) -> BTreeMap<i64, u64>
    where
        I: IntoIterator<Item = i64>,
    {
        let mut traversal = Traversal::new(self);
        let roots: Vec<(i64, u32)> = users
            .into_iter()
            .map(|user| (user, traversal.intern(user)))
            .collect();
        for &(_, slot) in &roots {
            traversal.visit(slot);
        }

        let totals = traversal.component_totals();
        log::debug!(
            "actionfold: referral index over {} users, {} nodes expanded, {} components",
            roots.len(),
            traversal.expanded,
            totals.len()
        );
        roots
            .into_iter()
            .map(|(user, slot)| (user, totals[traversal.component[slot as usize] as usize]))
            .collect()
    }
}

const UNVISITED: u32 = u32::MAX;

/// Nodes reachable from a component, and the edges leaving them.
#[derive(Default)]
struct Reach {
    nodes: RoaringBitmap,
    total: u64,
}

/// Request-scoped traversal state.
///
/// User ids are interned into a dense arena of `u32` slots so reach sets
/// are compressed bitmaps. Every reachable node is expanded exactly once by
/// an iterative Tarjan pass; nodes of one strongly connected component
/// share a reach set.
struct Traversal<'g> {
    graph: &'g ReferralGraph,
    slots: HashMap<i64, u32>,
    nodes: Vec<i64>,
    degree: Vec<u64>,
    index: Vec<u32>,
    lowlink: Vec<u32>,
    on_stack: Vec<bool>,
    component: Vec<u32>,
    stack: Vec<u32>,
    next_index: u32,
    /// Components in the order Tarjan closes them: every component comes
    /// after all components reachable from it.
    members: Vec<Vec<u32>>,
    expanded: usize,
}

impl<'g> Traversal<'g> {
    fn new(graph: &'g ReferralGraph) -> Self {
        Traversal {
            graph,
            slots: HashMap::new(),
            nodes: Vec::new(),
            degree: Vec::new(),
            index: Vec::new(),
            lowlink: Vec::new(),
            on_stack: Vec::new(),
            component: Vec::new(),
            stack: Vec::new(),
            next_index: 0,
            members: Vec::new(),
            expanded: 0,
        }
    }

    fn intern(&mut self, user: i64) -> u32 {
        if let Some(&slot) = self.slots.get(&user) {
            return slot;
        }
        // Slots are roaring bitmap members, so at most u32::MAX - 1 distinct
        // users (u32::MAX marks unvisited). An in-memory dataset never
        // gets near that.
        debug_assert!(self.nodes.len() < UNVISITED as usize);
        let slot = self.nodes.len() as u32;
        self.slots.insert(user, slot);
        self.nodes.push(user);
        self.degree.push(self.graph.out_degree(user));
        self.index.push(UNVISITED);
        self.lowlink.push(UNVISITED);
        self.on_stack.push(false);
        self.component.push(UNVISITED);
        slot
    }

    fn open(&mut self, slot: u32) {
        let s = slot as usize;
        self.index[s] = self.next_index;
        self.lowlink[s] = self.next_index;
        self.next_index += 1;
        self.on_stack[s] = true;
        self.stack.push(slot);
        self.expanded += 1;
    }

    /// Iterative Tarjan from `root`; a no-op if `root` was already reached.
    fn visit(&mut self, root: u32) {
        if self.index[root as usize] != UNVISITED {
            return;
        }

        let graph = self.graph;
        self.open(root);
        let mut frames: Vec<(u32, usize)> = vec![(root, 0)];

        while let Some(frame) = frames.last_mut() {
            let (slot, pos) = *frame;
            let s = slot as usize;

            if let Some(&referred) = graph.direct_referrals(self.nodes[s]).get(pos) {
                frame.1 += 1;
                let next = self.intern(referred);
                let n = next as usize;
                if self.index[n] == UNVISITED {
                    self.open(next);
                    frames.push((next, 0));
                } else if self.on_stack[n] {
                    self.lowlink[s] = self.lowlink[s].min(self.index[n]);
                }
                continue;
            }

            frames.pop();
            if let Some(&(parent, _)) = frames.last() {
                let p = parent as usize;
                self.lowlink[p] = self.lowlink[p].min(self.lowlink[s]);
            }
            if self.lowlink[s] == self.index[s] {
                self.close_component(slot);
            }
        }
    }

    fn close_component(&mut self, head: u32) {
        let id = self.members.len() as u32;
        let mut members = Vec::new();
        while let Some(slot) = self.stack.pop() {
            self.on_stack[slot as usize] = false;
            self.component[slot as usize] = id;
            members.push(slot);
            if slot == head {
                break;
            }
        }
        self.members.push(members);
    }

    fn degree_sum(&self, slots: &RoaringBitmap) -> u64 {
        slots.iter().map(|slot| self.degree[slot as usize]).sum()
    }

    /// Reach count of every component, indexed by component id.
    ///
    /// Components are processed sinks first, so successors are always
    /// finished. A successor's reach set is dropped once its last
    /// predecessor has merged it, and the last predecessor takes it over
    /// instead of copying, which keeps long chains linear.
    fn component_totals(&self) -> Vec<u64> {
        let count = self.members.len();
        let graph = self.graph;

        let successors: Vec<Vec<u32>> = self
            .members
            .iter()
            .enumerate()
            .map(|(id, members)| {
                let mut next: Vec<u32> = members
                    .iter()
                    .flat_map(|&slot| graph.direct_referrals(self.nodes[slot as usize]))
                    .filter_map(|user| self.slots.get(user))
                    .map(|&slot| self.component[slot as usize])
                    .filter(|&c| c as usize != id)
                    .collect();
                next.sort_unstable();
                next.dedup();
                next
            })
            .collect();

        let mut pending = vec![0u32; count];
        for next in &successors {
            for &c in next {
                pending[c as usize] += 1;
            }
        }
        let has_predecessors: Vec<bool> = pending.iter().map(|&n| n > 0).collect();

        let mut reach: Vec<Option<Reach>> = (0..count).map(|_| None).collect();
        let mut totals = vec![0u64; count];

        for id in 0..count {
            let mut acc: Option<Reach> = None;
            for &c in &successors[id] {
                pending[c as usize] -= 1;
                if acc.is_none() && pending[c as usize] == 0 {
                    acc = reach[c as usize].take();
                }
            }
            let mut acc = acc.unwrap_or_default();

            for &c in &successors[id] {
                if let Some(other) = &reach[c as usize] {
                    let fresh = &other.nodes - &acc.nodes;
                    acc.total += self.degree_sum(&fresh);
                    acc.nodes |= fresh;
                }
                if pending[c as usize] == 0 {
                    reach[c as usize] = None;
                }
            }

            for &slot in &self.members[id] {
                acc.nodes.insert(slot);
                acc.total += self.degree[slot as usize];
            }

            totals[id] = acc.total;
            if has_predecessors[id] {
                reach[id] = Some(acc);
            }
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::REFER_USER;

    fn refer(id: i64, from: i64, to: i64) -> Action {
        Action::new(id, REFER_USER, from).with_target(to)
    }

    #[test]
    fn shared_descendant_is_counted_once() {
        // 1 -> 2, 1 -> 3, 2 -> 4, 3 -> 4, 4 -> 5
        let log = vec![
            refer(1, 1, 2),
            refer(2, 1, 3),
            refer(3, 2, 4),
            refer(4, 3, 4),
            refer(5, 4, 5),
        ];
        let graph = ReferralGraph::from_actions(&log);

        let index = graph.referral_index([2, 3, 1]);
        assert_eq!(index[&2], 2);
        assert_eq!(index[&3], 2);
        assert_eq!(index[&1], 5);
    }

    #[test]
    fn cycle_is_one_component() {
        // 1 -> 2 -> 3 -> 1, 3 -> 4
        let log = vec![refer(1, 1, 2), refer(2, 2, 3), refer(3, 3, 1), refer(4, 3, 4)];
        let graph = ReferralGraph::from_actions(&log);
        let mut traversal = Traversal::new(&graph);
        let root = traversal.intern(2);
        traversal.visit(root);

        assert_eq!(traversal.members.len(), 2);
        assert_eq!(traversal.members[0].len(), 1);
        assert_eq!(traversal.members[1].len(), 3);
        assert_eq!(traversal.component_totals(), vec![0, 4]);
    }

    #[test]
    fn every_node_expanded_once() {
        let n = 1_000;
        let log: Vec<Action> = (1..n).map(|i| refer(i, i, i + 1)).collect();
        let graph = ReferralGraph::from_actions(&log);

        for order in [(1..=n).collect::<Vec<_>>(), (1..=n).rev().collect()] {
            let mut traversal = Traversal::new(&graph);
            for &user in &order {
                let slot = traversal.intern(user);
                traversal.visit(slot);
            }
            assert_eq!(traversal.expanded, n as usize);
            assert_eq!(traversal.members.len(), n as usize);
        }
    }

    #[test]
    fn interning_is_stable() {
        let graph = ReferralGraph::default();
        let mut traversal = Traversal::new(&graph);
        let a = traversal.intern(42);
        let b = traversal.intern(-7);
        assert_eq!(traversal.intern(42), a);
        assert_ne!(a, b);
        assert_eq!(traversal.nodes, vec![42, -7]);
    }
}
