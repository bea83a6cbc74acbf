/// Priority-queue search shared by Dijkstra, A* and greedy best-first. It is a
/// resumable take on
/// [pathfinding's astar function](https://docs.rs/pathfinding/latest/pathfinding/directed/astar/index.html):
/// nodes live in an insertion-ordered map so that the heap only stores indices, and
/// expansion can be suspended after any number of nodes.
use fxhash::FxBuildHasher;
use indexmap::map::Entry::{Occupied, Vacant};
use indexmap::IndexMap;
use log::trace;

use crate::cell::Cell;
use crate::solver::Progress;
use num_traits::Zero;

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::hash::Hash;

pub(crate) type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Marks the root of a parent chain.
pub(crate) const NO_PARENT: usize = usize::MAX;

struct SmallestCostHolder<K> {
    estimated_cost: K,
    /// Cost-so-far, used to detect stale entries.
    cost: K,
    tiebreak: K,
    seq: usize,
    index: usize,
}

impl<K: PartialEq> Eq for SmallestCostHolder<K> {}

impl<K: PartialEq> PartialEq for SmallestCostHolder<K> {
    fn eq(&self, other: &Self) -> bool {
        self.estimated_cost.eq(&other.estimated_cost)
            && self.tiebreak.eq(&other.tiebreak)
            && self.seq == other.seq
    }
}

impl<K: Ord> PartialOrd for SmallestCostHolder<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord> Ord for SmallestCostHolder<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Smallest estimate first, then the largest tiebreak (deepest node for A*),
        // then the earliest insertion.
        other
            .estimated_cost
            .cmp(&self.estimated_cost)
            .then_with(|| self.tiebreak.cmp(&other.tiebreak))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Walks a parent chain stored as map indices back to its root and returns it root first.
pub(crate) fn reverse_path<N, V, F>(parents: &FxIndexMap<N, V>, mut parent: F, start: usize) -> Vec<N>
where
    N: Eq + Hash + Clone,
    F: FnMut(&V) -> usize,
{
    let mut path = Vec::new();
    let mut i = start;
    while let Some((node, value)) = parents.get_index(i) {
        path.push(node.clone());
        i = parent(value);
    }
    path.reverse();
    path
}

/// Result of a bounded expansion round.
pub(crate) enum Expansion<N, C> {
    Pending,
    Found(Vec<N>, C),
    Exhausted,
}

impl<C> Expansion<Cell, C> {
    pub fn into_progress(self) -> Progress {
        match self {
            Expansion::Pending => Progress::Pending,
            Expansion::Found(path, _) => Progress::Found(path),
            Expansion::Exhausted => Progress::exhausted(),
        }
    }
}

pub(crate) struct SearchContext<N, C> {
    to_see: BinaryHeap<SmallestCostHolder<C>>,
    parents: FxIndexMap<N, (usize, C)>,
    seq: usize,
    expanded: usize,
}

impl<N, C> SearchContext<N, C>
where
    N: Eq + Hash + Clone,
    C: Zero + Ord + Copy,
{
    pub fn new(start: N) -> SearchContext<N, C> {
        let mut parents: FxIndexMap<N, (usize, C)> = FxIndexMap::default();
        parents.insert(start, (NO_PARENT, Zero::zero()));
        let mut to_see = BinaryHeap::new();
        to_see.push(SmallestCostHolder {
            estimated_cost: Zero::zero(),
            cost: Zero::zero(),
            tiebreak: Zero::zero(),
            seq: 0,
            index: 0,
        });
        SearchContext {
            to_see,
            parents,
            seq: 1,
            expanded: 0,
        }
    }

    /// Number of nodes taken off the queue and expanded, stale entries excluded.
    pub fn expanded(&self) -> usize {
        self.expanded
    }

    /// Expands at most `budget` nodes.
    ///
    /// `priority` maps a newly reached node and its cost-so-far to
    /// `(estimated_cost, tiebreak)`. When `reopen` is set a discovered node is queued
    /// again if a cheaper way to it is found; otherwise the first discovery is final.
    pub fn expand<FN, IN, FP, FS>(
        &mut self,
        budget: usize,
        mut successors: FN,
        mut priority: FP,
        mut success: FS,
        reopen: bool,
    ) -> Expansion<N, C>
    where
        FN: FnMut(&N) -> IN,
        IN: IntoIterator<Item = (N, C)>,
        FP: FnMut(&N, C) -> (C, C),
        FS: FnMut(&N) -> bool,
    {
        let mut remaining = budget;
        while remaining > 0 {
            let Some(SmallestCostHolder { cost, index, .. }) = self.to_see.pop() else {
                return Expansion::Exhausted;
            };
            let successors = {
                let Some((node, &(_, c))) = self.parents.get_index(index) else {
                    continue;
                };
                // A node may sit in the heap several times if a cheaper way to it was
                // found later. Only the entry matching its recorded cost is expanded.
                if cost > c {
                    continue;
                }
                self.expanded += 1;
                remaining -= 1;
                if success(node) {
                    let path = reverse_path(&self.parents, |&(p, _)| p, index);
                    return Expansion::Found(path, cost);
                }
                successors(node)
            };
            for (successor, move_cost) in successors {
                let new_cost = cost + move_cost;
                let n;
                match self.parents.entry(successor) {
                    Vacant(e) => {
                        n = e.index();
                        e.insert((index, new_cost));
                    }
                    Occupied(mut e) => {
                        if reopen && e.get().1 > new_cost {
                            n = e.index();
                            e.insert((index, new_cost));
                        } else {
                            continue;
                        }
                    }
                }
                let (estimated_cost, tiebreak) = match self.parents.get_index(n) {
                    Some((node, _)) => priority(node, new_cost),
                    None => continue,
                };
                self.to_see.push(SmallestCostHolder {
                    estimated_cost,
                    cost: new_cost,
                    tiebreak,
                    seq: self.seq,
                    index: n,
                });
                self.seq += 1;
            }
        }
        if self.to_see.is_empty() {
            trace!("Frontier emptied after {} expansions", self.expanded);
            Expansion::Exhausted
        } else {
            Expansion::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Line graph 0 - 1 - 2 - ... with unit costs.
    fn line_successors(n: &i32) -> Vec<(i32, i32)> {
        vec![(n - 1, 1), (n + 1, 1)]
            .into_iter()
            .filter(|(m, _)| (0..10).contains(m))
            .collect()
    }

    #[test]
    fn finds_path_on_line() {
        let mut ct: SearchContext<i32, i32> = SearchContext::new(2);
        match ct.expand(usize::MAX, line_successors, |_, g| (g, 0), |n| *n == 6, true) {
            Expansion::Found(path, cost) => {
                assert_eq!(path, vec![2, 3, 4, 5, 6]);
                assert_eq!(cost, 4);
            }
            _ => panic!("expected a path"),
        }
    }

    /// Expansion stops after the budget and resumes where it left off.
    #[test]
    fn resumes_after_budget() {
        let mut ct: SearchContext<i32, i32> = SearchContext::new(0);
        let mut rounds = 0;
        loop {
            rounds += 1;
            match ct.expand(2, line_successors, |_, g| (g, 0), |n| *n == 9, true) {
                Expansion::Pending => continue,
                Expansion::Found(path, _) => {
                    assert_eq!(path.len(), 10);
                    break;
                }
                Expansion::Exhausted => panic!("line is connected"),
            }
        }
        assert_eq!(ct.expanded(), 10);
        assert_eq!(rounds, 5);
    }

    #[test]
    fn exhausts_without_goal() {
        let mut ct: SearchContext<i32, i32> = SearchContext::new(0);
        assert!(matches!(
            ct.expand(usize::MAX, line_successors, |_, g| (g, 0), |n| *n == 42, true),
            Expansion::Exhausted
        ));
        assert_eq!(ct.expanded(), 10);
    }

    /// Equal priorities are served in insertion order.
    #[test]
    fn ties_are_fifo() {
        let mut heap = BinaryHeap::new();
        for seq in 0..3 {
            heap.push(SmallestCostHolder {
                estimated_cost: 1,
                cost: 0,
                tiebreak: 0,
                seq,
                index: seq,
            });
        }
        let order: Vec<usize> = std::iter::from_fn(|| heap.pop().map(|h| h.index)).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }
}
