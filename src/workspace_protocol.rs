// SPDX-License-Identifier: GPL-2.0-only

//! Workspace-protocol transactions (4.H): two-phase pending→commit queues
//! shared by `cosmic-workspaces-v1` and `ext-workspace-v1` bindings, plus
//! `done` batching and per-output enter/leave tracking.

use std::collections::HashSet;

use crate::workspace::WorkspaceId;

/// One queued workspace-protocol request (spec.md §3 "Pending-transaction
/// queue").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOp {
    Create { name: String },
    Activate(WorkspaceId),
    Deactivate(WorkspaceId),
    Remove(WorkspaceId),
    /// `ext-workspace-v1` only: assign a workspace to a different group.
    Assign { workspace: WorkspaceId, group: u32 },
}

/// A compositor-side signal emitted when a queued op is drained on commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitSignal {
    Create(String),
    Activate(WorkspaceId),
    Deactivate(WorkspaceId),
    Remove(WorkspaceId),
    Assign(WorkspaceId, u32),
}

/// A session context shared by every resource derived from one
/// `manager_resource` bind (spec.md §4.H "Workspace protocol
/// transactions"). Queues ops until `commit`.
#[derive(Debug, Default)]
pub struct TransactionQueue {
    pending: Vec<TransactionOp>,
}

impl TransactionQueue {
    pub fn new() -> Self {
        Self { pending: Vec::new() }
    }

    pub fn enqueue(&mut self, op: TransactionOp) {
        self.pending.push(op);
    }

    /// Invalidate every queued op referring to `workspace` (object
    /// destruction, spec.md §3).
    pub fn invalidate_workspace(&mut self, workspace: WorkspaceId) {
        self.pending.retain(|op| match op {
            TransactionOp::Activate(w) | TransactionOp::Deactivate(w) | TransactionOp::Remove(w) => *w != workspace,
            TransactionOp::Assign { workspace: w, .. } => *w != workspace,
            TransactionOp::Create { .. } => true,
        });
    }

    /// Drain the queue in order, turning each op into a compositor-side
    /// signal (property 6: atomicity, same order as queued).
    pub fn commit(&mut self) -> Vec<CommitSignal> {
        self.pending
            .drain(..)
            .map(|op| match op {
                TransactionOp::Create { name } => CommitSignal::Create(name),
                TransactionOp::Activate(w) => CommitSignal::Activate(w),
                TransactionOp::Deactivate(w) => CommitSignal::Deactivate(w),
                TransactionOp::Remove(w) => CommitSignal::Remove(w),
                TransactionOp::Assign { workspace, group } => CommitSignal::Assign(workspace, group),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Per-workspace state fields that batch into one `done` per event-loop
/// iteration (spec.md §4.H "Done batching").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkspaceProtocolState {
    pub active: bool,
    pub urgent: bool,
    pub hidden: bool,
    pub name: String,
    pub coordinates: (i32, i32),
}

/// Tracks pending vs. applied workspace-protocol state for one manager
/// binding, coalescing multiple field updates into a single flush +
/// aggregated `done`.
#[derive(Debug, Default)]
pub struct DoneBatcher {
    applied: std::collections::HashMap<WorkspaceId, WorkspaceProtocolState>,
    pending: std::collections::HashMap<WorkspaceId, WorkspaceProtocolState>,
    dirty: bool,
}

impl DoneBatcher {
    pub fn new() -> Self {
        Self {
            applied: Default::default(),
            pending: Default::default(),
            dirty: false,
        }
    }

    /// Stage a field change; marks the batcher dirty so the caller's idle
    /// source schedules exactly one flush.
    pub fn stage(&mut self, workspace: WorkspaceId, state: WorkspaceProtocolState) {
        self.pending.insert(workspace, state);
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flush `pending → applied`, returning the set of workspaces whose
    /// state actually changed (these, plus an aggregated `done`, are what
    /// the caller sends to bound clients). Idempotent when not dirty.
    pub fn flush(&mut self) -> Vec<WorkspaceId> {
        if !self.dirty {
            return Vec::new();
        }
        let mut changed = Vec::new();
        for (id, state) in self.pending.drain() {
            let differs = self.applied.get(&id) != Some(&state);
            if differs {
                changed.push(id);
            }
            self.applied.insert(id, state);
        }
        self.dirty = false;
        changed
    }
}

/// Per-client-object output association, delivering coalesced
/// enter/leave/done per the `output_tracker` vtable (spec.md §4.H
/// "Per-output enter/leave").
pub trait OutputTrackerSink {
    fn send_output_enter(&mut self, output: &str);
    fn send_output_leave(&mut self, output: &str);
    fn send_done(&mut self);
}

#[derive(Debug, Default)]
pub struct OutputTracker {
    entered: HashSet<String>,
}

impl OutputTracker {
    pub fn new() -> Self {
        Self { entered: HashSet::new() }
    }

    /// Associate `output` with this object, sending `enter` if it wasn't
    /// already associated (first bind or first association alike).
    pub fn enter(&mut self, output: &str, sink: &mut impl OutputTrackerSink) {
        if self.entered.insert(output.to_string()) {
            sink.send_output_enter(output);
        }
    }

    pub fn leave(&mut self, output: &str, sink: &mut impl OutputTrackerSink) {
        if self.entered.remove(output) {
            sink.send_output_leave(output);
        }
    }

    /// Reconcile against a fresh set of outputs the object should be
    /// associated with, sending enter/leave for the delta and exactly one
    /// coalesced `done` if anything changed.
    pub fn reconcile(&mut self, outputs: &[String], sink: &mut impl OutputTrackerSink) {
        let target: HashSet<String> = outputs.iter().cloned().collect();
        let to_leave: Vec<String> = self.entered.difference(&target).cloned().collect();
        let to_enter: Vec<String> = target.difference(&self.entered).cloned().collect();
        let mut changed = false;
        for output in &to_leave {
            self.entered.remove(output);
            sink.send_output_leave(output);
            changed = true;
        }
        for output in &to_enter {
            self.entered.insert(output.clone());
            sink.send_output_enter(output);
            changed = true;
        }
        if changed {
            sink.send_done();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_drains_in_queued_order() {
        let mut queue = TransactionQueue::new();
        queue.enqueue(TransactionOp::Activate(WorkspaceId(1)));
        queue.enqueue(TransactionOp::Deactivate(WorkspaceId(2)));
        let signals = queue.commit();
        assert_eq!(
            signals,
            vec![
                CommitSignal::Activate(WorkspaceId(1)),
                CommitSignal::Deactivate(WorkspaceId(2)),
            ]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn destroyed_object_invalidates_its_pending_ops() {
        let mut queue = TransactionQueue::new();
        queue.enqueue(TransactionOp::Activate(WorkspaceId(1)));
        queue.enqueue(TransactionOp::Remove(WorkspaceId(2)));
        queue.invalidate_workspace(WorkspaceId(1));
        let signals = queue.commit();
        assert_eq!(signals, vec![CommitSignal::Remove(WorkspaceId(2))]);
    }

    #[test]
    fn done_batcher_flushes_only_changed_workspaces() {
        let mut batcher = DoneBatcher::new();
        let state_a = WorkspaceProtocolState {
            active: true,
            ..Default::default()
        };
        batcher.stage(WorkspaceId(1), state_a.clone());
        let changed = batcher.flush();
        assert_eq!(changed, vec![WorkspaceId(1)]);

        batcher.stage(WorkspaceId(1), state_a);
        assert!(batcher.is_dirty());
        let changed_again = batcher.flush();
        assert!(changed_again.is_empty(), "no actual state delta");
    }

    struct RecordingSink {
        events: Vec<String>,
    }

    impl OutputTrackerSink for RecordingSink {
        fn send_output_enter(&mut self, output: &str) {
            self.events.push(format!("enter:{output}"));
        }
        fn send_output_leave(&mut self, output: &str) {
            self.events.push(format!("leave:{output}"));
        }
        fn send_done(&mut self) {
            self.events.push("done".to_string());
        }
    }

    #[test]
    fn output_tracker_sends_enter_once_and_coalesces_done() {
        let mut tracker = OutputTracker::new();
        let mut sink = RecordingSink { events: Vec::new() };
        tracker.reconcile(&["DP-1".to_string(), "DP-2".to_string()], &mut sink);
        assert_eq!(sink.events.len(), 3, "2 enters + 1 done");
        assert_eq!(sink.events.last(), Some(&"done".to_string()));

        sink.events.clear();
        tracker.reconcile(&["DP-1".to_string(), "DP-2".to_string()], &mut sink);
        assert!(sink.events.is_empty(), "no delta, no done");
    }

    #[test]
    fn output_tracker_leave_on_removal() {
        let mut tracker = OutputTracker::new();
        let mut sink = RecordingSink { events: Vec::new() };
        tracker.enter("DP-1", &mut sink);
        tracker.leave("DP-1", &mut sink);
        assert_eq!(sink.events, vec!["enter:DP-1", "leave:DP-1"]);
    }
}
