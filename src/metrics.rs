use core::fmt;
use fxhash::FxHashMap;
use log::{info, trace};
use std::time::Duration;

use crate::solver::{AlgorithmId, SearchResult, Termination};

/// Running totals for one algorithm.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlgorithmStats {
    pub call_count: usize,
    pub success_count: usize,
    pub total_nodes_explored: usize,
    pub total_elapsed: Duration,
    /// Moves summed over successful calls.
    pub total_path_length: usize,
}

impl AlgorithmStats {
    pub fn average_nodes_explored(&self) -> f64 {
        ratio(self.total_nodes_explored as f64, self.call_count)
    }

    pub fn average_elapsed(&self) -> Duration {
        match u32::try_from(self.call_count) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.total_elapsed / n,
            Err(_) => self.total_elapsed.div_f64(self.call_count as f64),
        }
    }

    /// Average number of moves of the paths found.
    pub fn average_path_length(&self) -> f64 {
        ratio(self.total_path_length as f64, self.success_count)
    }

    pub fn success_rate(&self) -> f64 {
        ratio(self.success_count as f64, self.call_count)
    }

    fn add(&mut self, result: &SearchResult) {
        self.call_count += 1;
        self.total_nodes_explored += result.nodes_explored;
        self.total_elapsed += result.elapsed;
        if result.success {
            self.success_count += 1;
            self.total_path_length += result.path_length();
        }
    }
}

fn ratio(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

/// Per-algorithm tallies of planning calls for side-by-side comparison. One collector
/// spans a comparison session; [reset](MetricsCollector::reset) starts a new one.
#[derive(Clone, Debug, Default)]
pub struct MetricsCollector {
    stats: FxHashMap<AlgorithmId, AlgorithmStats>,
}

impl MetricsCollector {
    pub fn new() -> MetricsCollector {
        MetricsCollector::default()
    }

    /// Adds a finished search. Rejected and cancelled requests are not counted,
    /// since no algorithm ran to completion for them.
    pub fn record(&mut self, result: &SearchResult) {
        if matches!(
            result.termination,
            Termination::InvalidRequest(_) | Termination::Cancelled
        ) {
            trace!("Not recording {:?} {} call", result.termination, result.algorithm);
            return;
        }
        self.stats.entry(result.algorithm).or_default().add(result);
    }

    pub fn stats(&self, algorithm: AlgorithmId) -> Option<&AlgorithmStats> {
        self.stats.get(&algorithm)
    }

    /// Recorded algorithms in [AlgorithmId::ALL] order.
    pub fn iter(&self) -> impl Iterator<Item = (AlgorithmId, &AlgorithmStats)> + '_ {
        AlgorithmId::ALL
            .into_iter()
            .filter_map(|id| self.stats.get(&id).map(|s| (id, s)))
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn reset(&mut self) {
        info!(
            "Resetting metrics for {} algorithms",
            self.stats.len()
        );
        self.stats.clear();
    }
}

impl fmt::Display for MetricsCollector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "{:<14}{:>7}{:>10}{:>12}{:>14}{:>10}",
            "algorithm", "calls", "successes", "avg nodes", "avg time ms", "avg path"
        )?;
        for (id, s) in self.iter() {
            writeln!(
                f,
                "{:<14}{:>7}{:>10}{:>12.1}{:>14.3}{:>10.1}",
                id.label(),
                s.call_count,
                s.success_count,
                s.average_nodes_explored(),
                s.average_elapsed().as_secs_f64() * 1000.0,
                s.average_path_length()
            )?;
        }
        Ok(())
    }
}
