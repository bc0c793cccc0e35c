//! Slew activity dependency graph and critical path evaluation.
//!
//! Activities form a DAG: an activity starts when the last of its
//! prerequisites ends. The graph is sorted once at construction (Kahn's
//! algorithm) and evaluated many times against different duration lookups.
//!
//! The slew delay is the end time of the terminal `exposures` activity, or
//! the latest end over all sinks when no `exposures` node exists.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use obsmodel_types::ActivityKind;
use serde::Serialize;

/// Errors from building an [`ActivityGraph`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// The prerequisites contain a cycle.
    #[error("cyclic prerequisites: {activity} depends on itself")]
    Cyclic {
        /// An activity on (or behind) the cycle.
        activity: ActivityKind,
    },

    /// A prerequisite names an activity that is not part of the graph.
    #[error("{activity} lists {prerequisite} as a prerequisite but it is not in the graph")]
    UnknownPrerequisite {
        /// The activity declaring the dependency.
        activity: ActivityKind,
        /// The missing prerequisite.
        prerequisite: ActivityKind,
    },

    /// The graph has no activities.
    #[error("slew graph has no activities")]
    Empty,
}

/// When one activity runs during an evaluated slew.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActivityTiming {
    /// The activity.
    pub activity: ActivityKind,
    /// Seconds after slew start when it begins.
    pub start: f64,
    /// How long it runs.
    pub duration: f64,
    /// Seconds after slew start when it ends.
    pub end: f64,
    /// The prerequisite that ended last, if any.
    pub gated_by: Option<ActivityKind>,
}

/// Result of evaluating the graph against a set of durations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalPath {
    timings: Vec<ActivityTiming>,
    total: f64,
    chain: Vec<ActivityKind>,
}

impl CriticalPath {
    /// Total slew delay in seconds.
    pub const fn total(&self) -> f64 {
        self.total
    }

    /// Per-activity timings in execution order.
    pub fn timings(&self) -> &[ActivityTiming] {
        &self.timings
    }

    /// Timing of one activity.
    pub fn timing(&self, activity: ActivityKind) -> Option<&ActivityTiming> {
        self.timings.iter().find(|t| t.activity == activity)
    }

    /// Duration of one activity, zero when it is not in the graph.
    pub fn duration(&self, activity: ActivityKind) -> f64 {
        self.timing(activity).map_or(0.0, |t| t.duration)
    }

    /// Activities on the longest chain, earliest first.
    ///
    /// Zero-duration activities stay on the chain when they gate the next
    /// activity.
    pub fn chain(&self) -> &[ActivityKind] {
        &self.chain
    }
}

/// A validated, topologically sorted activity graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityGraph {
    prerequisites: BTreeMap<ActivityKind, Vec<ActivityKind>>,
    order: Vec<ActivityKind>,
    sinks: Vec<ActivityKind>,
}

impl ActivityGraph {
    /// Validate and sort a prerequisite table.
    ///
    /// Duplicate prerequisites are collapsed; the first occurrence keeps its
    /// position, which decides ties on the critical path.
    pub fn new(prerequisites: BTreeMap<ActivityKind, Vec<ActivityKind>>) -> Result<Self, GraphError> {
        if prerequisites.is_empty() {
            return Err(GraphError::Empty);
        }

        let mut cleaned = BTreeMap::new();
        for (&activity, list) in &prerequisites {
            let mut unique: Vec<ActivityKind> = Vec::with_capacity(list.len());
            for &prerequisite in list {
                if prerequisite == activity {
                    return Err(GraphError::Cyclic { activity });
                }
                if !prerequisites.contains_key(&prerequisite) {
                    return Err(GraphError::UnknownPrerequisite {
                        activity,
                        prerequisite,
                    });
                }
                if !unique.contains(&prerequisite) {
                    unique.push(prerequisite);
                }
            }
            cleaned.insert(activity, unique);
        }

        let order = topological_order(&cleaned)?;
        let depended_on: BTreeSet<ActivityKind> = cleaned.values().flatten().copied().collect();
        let sinks = order
            .iter()
            .copied()
            .filter(|activity| !depended_on.contains(activity))
            .collect();

        Ok(Self {
            prerequisites: cleaned,
            order,
            sinks,
        })
    }

    /// Activities in a valid execution order.
    pub fn order(&self) -> &[ActivityKind] {
        &self.order
    }

    /// Activities nothing depends on.
    pub fn sinks(&self) -> &[ActivityKind] {
        &self.sinks
    }

    /// Whether `activity` is part of the graph.
    pub fn contains(&self, activity: ActivityKind) -> bool {
        self.prerequisites.contains_key(&activity)
    }

    /// Prerequisites of `activity` (empty when it is not in the graph).
    pub fn prerequisites(&self, activity: ActivityKind) -> &[ActivityKind] {
        self.prerequisites.get(&activity).map_or(&[], Vec::as_slice)
    }

    /// Schedule every activity as early as its prerequisites allow.
    ///
    /// `duration` is called once per activity. Negative or non-finite
    /// durations count as zero.
    pub fn evaluate<F>(&self, mut duration: F) -> CriticalPath
    where
        F: FnMut(ActivityKind) -> f64,
    {
        let mut ends: BTreeMap<ActivityKind, f64> = BTreeMap::new();
        let mut timings = Vec::with_capacity(self.order.len());

        for &activity in &self.order {
            let mut gate: Option<(ActivityKind, f64)> = None;
            for &prerequisite in self.prerequisites(activity) {
                let end = ends.get(&prerequisite).copied().unwrap_or(0.0);
                if gate.is_none_or(|(_, latest)| end > latest) {
                    gate = Some((prerequisite, end));
                }
            }
            let start = gate.map_or(0.0, |(_, end)| end);
            let raw = duration(activity);
            let length = if raw.is_finite() { raw.max(0.0) } else { 0.0 };
            let end = start + length;
            ends.insert(activity, end);
            timings.push(ActivityTiming {
                activity,
                start,
                duration: length,
                end,
                gated_by: gate.map(|(prerequisite, _)| prerequisite),
            });
        }

        let terminal = if self.contains(ActivityKind::Exposures) {
            Some(ActivityKind::Exposures)
        } else {
            self.sinks.iter().copied().fold(None, |best: Option<(ActivityKind, f64)>, sink| {
                let end = ends.get(&sink).copied().unwrap_or(0.0);
                if best.is_none_or(|(_, latest)| end > latest) {
                    Some((sink, end))
                } else {
                    best
                }
            })
            .map(|(sink, _)| sink)
        };

        let total = terminal.and_then(|t| ends.get(&t).copied()).unwrap_or(0.0);
        let mut chain = Vec::new();
        let mut cursor = terminal;
        while let Some(activity) = cursor {
            chain.push(activity);
            cursor = timings
                .iter()
                .find(|t| t.activity == activity)
                .and_then(|t| t.gated_by);
        }
        chain.reverse();

        CriticalPath {
            timings,
            total,
            chain,
        }
    }
}

/// Kahn's algorithm. Ready activities are released in enum order so the
/// result is deterministic.
fn topological_order(
    prerequisites: &BTreeMap<ActivityKind, Vec<ActivityKind>>,
) -> Result<Vec<ActivityKind>, GraphError> {
    let mut pending: BTreeMap<ActivityKind, usize> = prerequisites
        .iter()
        .map(|(&activity, list)| (activity, list.len()))
        .collect();
    let mut dependents: BTreeMap<ActivityKind, Vec<ActivityKind>> = BTreeMap::new();
    for (&activity, list) in prerequisites {
        for &prerequisite in list {
            dependents.entry(prerequisite).or_default().push(activity);
        }
    }

    let mut ready: VecDeque<ActivityKind> = pending
        .iter()
        .filter(|&(_, &count)| count == 0)
        .map(|(&activity, _)| activity)
        .collect();
    let mut order = Vec::with_capacity(prerequisites.len());

    while let Some(activity) = ready.pop_front() {
        order.push(activity);
        for dependent in dependents.get(&activity).into_iter().flatten() {
            if let Some(count) = pending.get_mut(dependent) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    ready.push_back(*dependent);
                }
            }
        }
    }

    if order.len() < prerequisites.len() {
        let stuck = pending
            .iter()
            .find(|&(_, &count)| count > 0)
            .map(|(&activity, _)| activity);
        if let Some(activity) = stuck {
            return Err(GraphError::Cyclic { activity });
        }
    }
    Ok(order)
}
