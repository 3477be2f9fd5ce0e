use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use ptask_model::{AssignmentDetails, TaskId};

/// What one reconcile pass has to do, as three disjoint sets keyed by task id.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Running but no longer assigned.
    pub stop: Vec<TaskId>,
    /// Assigned but not running.
    pub start: Vec<AssignmentDetails>,
    /// Running and assigned with a strictly newer context.
    pub update: Vec<AssignmentDetails>,
}

impl ReconcilePlan {
    /// Diff the running set against the assigned list.
    ///
    /// A task present on both sides with an equal or older `last_context_updated` is left alone.
    /// Duplicate ids in `assigned` collapse to the newest entry. Output is sorted by task id.
    pub fn compute<'a, I>(running: I, assigned: &[AssignmentDetails]) -> Self
    where
        I: IntoIterator<Item = &'a AssignmentDetails>,
    {
        let mut wanted: HashMap<&TaskId, &AssignmentDetails> = HashMap::new();
        for a in assigned {
            wanted
                .entry(&a.task_id)
                .and_modify(|cur| {
                    if a.is_newer_than(cur) {
                        *cur = a;
                    }
                })
                .or_insert(a);
        }

        let mut plan = ReconcilePlan::default();
        let mut seen: HashSet<&TaskId> = HashSet::new();

        for current in running {
            seen.insert(&current.task_id);
            match wanted.get(&current.task_id) {
                None => plan.stop.push(current.task_id.clone()),
                Some(next) if next.is_newer_than(current) => plan.update.push((*next).clone()),
                Some(_) => {}
            }
        }
        for (id, a) in &wanted {
            if !seen.contains(*id) {
                plan.start.push((*a).clone());
            }
        }

        plan.stop.sort();
        plan.start.sort_by(|a, b| a.task_id.cmp(&b.task_id));
        plan.update.sort_by(|a, b| a.task_id.cmp(&b.task_id));
        plan
    }

    pub fn is_empty(&self) -> bool {
        self.stop.is_empty() && self.start.is_empty() && self.update.is_empty()
    }
}

/// Counters describing what a reconcile pass actually did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub stopped: usize,
    pub started: usize,
    pub updated: usize,
    /// Starts or updates that failed and will be retried next pass.
    pub failed: usize,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.stopped == 0 && self.started == 0 && self.updated == 0 && self.failed == 0
    }
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stopped={} started={} updated={} failed={}",
            self.stopped, self.started, self.updated, self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a(id: &str, ts: i64) -> AssignmentDetails {
        AssignmentDetails::new(id, ts)
    }

    fn ids(v: &[AssignmentDetails]) -> Vec<&str> {
        v.iter().map(|a| a.task_id.as_str()).collect()
    }

    #[test]
    fn splits_into_disjoint_sets() {
        let running = vec![a("keep", 1), a("gone", 1), a("changed", 1)];
        let assigned = vec![a("keep", 1), a("changed", 2), a("new", 1)];

        let plan = ReconcilePlan::compute(&running, &assigned);

        assert_eq!(plan.stop, vec![TaskId::from("gone")]);
        assert_eq!(ids(&plan.start), vec!["new"]);
        assert_eq!(ids(&plan.update), vec!["changed"]);
        assert_eq!(plan.update[0].last_context_updated, 2);
    }

    #[test]
    fn equal_or_older_context_is_untouched() {
        let running = vec![a("same", 5), a("older", 5)];
        let assigned = vec![a("same", 5), a("older", 3)];

        let plan = ReconcilePlan::compute(&running, &assigned);
        assert!(plan.is_empty(), "unexpected plan: {plan:?}");
    }

    #[test]
    fn empty_assignment_stops_everything() {
        let running = vec![a("t1", 1), a("t2", 1)];
        let plan = ReconcilePlan::compute(&running, &[]);

        assert_eq!(plan.stop, vec![TaskId::from("t1"), TaskId::from("t2")]);
        assert!(plan.start.is_empty());
        assert!(plan.update.is_empty());
    }

    #[test]
    fn duplicates_collapse_to_newest() {
        let assigned = vec![a("t", 1), a("t", 7), a("t", 3)];
        let plan = ReconcilePlan::compute(std::iter::empty(), &assigned);

        assert_eq!(plan.start.len(), 1);
        assert_eq!(plan.start[0].last_context_updated, 7);
    }

    #[test]
    fn report_display() {
        let r = ReconcileReport {
            stopped: 1,
            started: 2,
            updated: 0,
            failed: 3,
        };
        assert_eq!(r.to_string(), "stopped=1 started=2 updated=0 failed=3");
        assert!(!r.is_noop());
        assert!(ReconcileReport::default().is_noop());
    }
}
