//! Folded scheduler state and the single-flight transitions.
//!
//! This is the synchronous half of the scheduler: it owns the accumulator,
//! the intent, the target selection and the debounce gate, and decides when
//! a request may go out. The async worker drives it.

use std::time::Duration;

use log::{debug, trace, warn};
use tokio::time::Instant;

use crate::classifier::{classify, Classified};
use crate::config::SchedulerConfig;
use crate::debounce::DebounceGate;
use crate::fields::FieldMap;
use crate::gateway::{GatewayOperation, GatewayReply, GatewayRequest};
use crate::model::{ModelReference, ModelTarget, UpdateIntent};
use crate::notifications::Notification;

/// Effect of folding one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldOutcome {
    Metadata,
    Field,
    Intent(UpdateIntent),
    /// Reset/revert with a zero flag: countdown cleared, nothing queued.
    Disarmed,
    Unhandled,
}

/// The request currently outstanding at the gateway.
#[derive(Debug, Clone)]
pub struct InFlight {
    pub request_id: u64,
    pub intent: UpdateIntent,
    /// Fields sent with the request, removed from the accumulator on success.
    pub flushed: FieldMap,
    pub load: Option<ModelTarget>,
    pub dispatched_at: Instant,
}

#[derive(Debug)]
pub struct SchedulerState {
    fields: FieldMap,
    intent: UpdateIntent,
    model: ModelReference,
    loaded_target: Option<ModelTarget>,
    gate: DebounceGate,
    in_flight: Option<InFlight>,
    next_request_id: u64,
}

impl SchedulerState {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            fields: FieldMap::new(),
            intent: UpdateIntent::None,
            model: ModelReference::default(),
            loaded_target: None,
            gate: DebounceGate::new(config.quiet_period, config.tick),
            in_flight: None,
            next_request_id: 1,
        }
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn intent(&self) -> UpdateIntent {
        self.intent
    }

    pub fn model(&self) -> &ModelReference {
        &self.model
    }

    pub fn in_flight(&self) -> Option<&InFlight> {
        self.in_flight.as_ref()
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.in_flight.is_some()
    }

    /// How long to wait for input before the next debounce tick.
    pub fn gate_wait(&self) -> Option<Duration> {
        self.gate.next_wait()
    }

    pub fn tick(&mut self) {
        self.gate.tick();
    }

    /// Idle, countdown elapsed and something to do.
    pub fn ready_to_dispatch(&self) -> bool {
        self.in_flight.is_none() && self.gate.is_elapsed() && !self.intent.is_none()
    }

    pub fn fold(&mut self, notification: &Notification) -> FoldOutcome {
        trace!(
            "Scheduler.fold {}={:?}",
            notification.key,
            notification.value
        );
        match classify(notification) {
            Classified::TargetName(name) => {
                self.model.name = name;
                FoldOutcome::Metadata
            }
            Classified::TargetState(state) => {
                self.model.state = state;
                FoldOutcome::Metadata
            }
            Classified::SourceBlock(block) => {
                self.model.source_block = block;
                FoldOutcome::Metadata
            }
            Classified::Reference(reference) => {
                self.model.reference = reference;
                self.intent = UpdateIntent::Update;
                self.gate.restart();
                FoldOutcome::Intent(UpdateIntent::Update)
            }
            Classified::Reset { armed } => self.fold_discrete(UpdateIntent::Reset, armed),
            Classified::Revert { armed } => self.fold_discrete(UpdateIntent::Revert, armed),
            Classified::Field {
                block,
                tunable,
                value,
            } => {
                self.fields.set(block, tunable, value);
                self.gate.restart();
                // Edits landing mid-flight go out with the next cycle
                if self.in_flight.is_some() && self.intent.is_none() {
                    self.intent = UpdateIntent::Update;
                }
                FoldOutcome::Field
            }
            Classified::Unhandled => {
                warn!("Unhandled field {}", notification.key);
                FoldOutcome::Unhandled
            }
        }
    }

    fn fold_discrete(&mut self, intent: UpdateIntent, armed: bool) -> FoldOutcome {
        self.gate.force_open();
        if !armed {
            return FoldOutcome::Disarmed;
        }
        if self.intent.is_discrete() && self.intent != intent {
            debug!("{} replaces pending {}", intent, self.intent);
        }
        self.intent = intent;
        FoldOutcome::Intent(intent)
    }

    /// Snapshots the pending work into a request and enters `AwaitingReply`.
    ///
    /// Returns `None` when a dispatch is not allowed right now.
    pub fn begin_dispatch(&mut self, now: Instant) -> Option<GatewayRequest> {
        if !self.ready_to_dispatch() {
            return None;
        }

        let intent = std::mem::take(&mut self.intent);
        let target = self.model.target();
        let (load, operation, flushed) = match intent {
            UpdateIntent::Update => {
                let fields = self.fields.clone();
                let load = target.filter(|t| self.loaded_target.as_ref() != Some(t));
                let operation = GatewayOperation::Commit {
                    fields: fields.clone(),
                    reference: self.model.reference.clone(),
                    source_block: self.model.source_block.clone(),
                };
                (load, operation, fields)
            }
            UpdateIntent::Reset => {
                // Local edits are discarded along with the working state
                self.fields.clear();
                (target, GatewayOperation::Reset, FieldMap::new())
            }
            UpdateIntent::Revert => {
                let load = target.filter(|t| self.loaded_target.as_ref() != Some(t));
                (load, GatewayOperation::Revert, FieldMap::new())
            }
            UpdateIntent::None => return None,
        };

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.in_flight = Some(InFlight {
            request_id,
            intent,
            flushed,
            load: load.clone(),
            dispatched_at: now,
        });

        Some(GatewayRequest {
            id: request_id,
            load,
            operation,
        })
    }

    /// Settles the outstanding request and returns to `Idle`.
    ///
    /// Returns `None` if nothing was outstanding.
    pub fn complete(&mut self, reply: &GatewayReply) -> Option<InFlight> {
        let flight = self.in_flight.take()?;
        if reply.success {
            self.fields.remove_flushed(&flight.flushed);
            if let Some(target) = &flight.load {
                self.loaded_target = Some(target.clone());
            }
        } else if flight.load.is_some() {
            // Force a reload with the next request
            self.loaded_target = None;
        }
        Some(flight)
    }

    /// When the outstanding request times out, if one is configured.
    pub fn reply_deadline(&self, reply_timeout: Option<Duration>) -> Option<Instant> {
        let timeout = reply_timeout?;
        self.in_flight
            .as_ref()
            .map(|flight| flight.dispatched_at + timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> SchedulerState {
        SchedulerState::new(&SchedulerConfig::default())
    }

    fn fold_all(state: &mut SchedulerState, items: &[(&str, Option<&str>)]) {
        for (key, value) in items {
            state.fold(&Notification::new(*key, value.map(str::to_string)));
        }
    }

    fn elapse(state: &mut SchedulerState) {
        while state.gate_wait().is_some() {
            state.tick();
        }
    }

    #[test]
    fn test_field_edits_alone_are_not_actionable() {
        let mut state = state();
        fold_all(&mut state, &[("/update/BlockA/Tunable1", Some("5"))]);
        elapse(&mut state);
        assert!(!state.ready_to_dispatch());
        assert_eq!(state.fields().get("BlockA", "Tunable1"), Some("5"));
    }

    #[test]
    fn test_reference_waits_for_quiet_period() {
        let mut state = state();
        fold_all(
            &mut state,
            &[
                ("/update/BlockA/Tunable1", Some("5")),
                ("/update/BlockA/Tunable1", Some("7")),
                ("/reference", Some("R1")),
            ],
        );
        assert!(!state.ready_to_dispatch());
        elapse(&mut state);
        assert!(state.ready_to_dispatch());

        let request = state.begin_dispatch(Instant::now()).unwrap();
        match request.operation {
            GatewayOperation::Commit {
                fields, reference, ..
            } => {
                assert_eq!(fields.get("BlockA", "Tunable1"), Some("7"));
                assert_eq!(fields.len(), 1);
                assert_eq!(reference.as_deref(), Some("R1"));
            }
            other => panic!("Expected commit, got {:?}", other),
        }
        assert_eq!(state.intent(), UpdateIntent::None);
        assert!(state.is_awaiting_reply());
    }

    #[test]
    fn test_reset_bypasses_countdown() {
        let mut state = state();
        fold_all(
            &mut state,
            &[("/update/BlockA/Tunable1", Some("5")), ("/reset", Some("1"))],
        );
        assert!(state.ready_to_dispatch());
        let request = state.begin_dispatch(Instant::now()).unwrap();
        assert_eq!(request.operation, GatewayOperation::Reset);
        assert!(state.fields().is_empty());
    }

    #[test]
    fn test_disarmed_reset_queues_nothing() {
        let mut state = state();
        let outcome = state.fold(&Notification::set("/reset", "0"));
        assert_eq!(outcome, FoldOutcome::Disarmed);
        assert!(!state.ready_to_dispatch());
    }

    #[test]
    fn test_discrete_commands_are_last_wins() {
        let mut state = state();
        fold_all(
            &mut state,
            &[
                ("/reference", Some("R1")),
                ("/revert", Some("1")),
                ("/reset", Some("1")),
            ],
        );
        assert_eq!(state.intent(), UpdateIntent::Reset);

        fold_all(&mut state, &[("/revert", Some("1"))]);
        assert_eq!(state.intent(), UpdateIntent::Revert);
    }

    #[test]
    fn test_no_second_dispatch_while_in_flight() {
        let mut state = state();
        fold_all(&mut state, &[("/reset", Some("1"))]);
        assert!(state.begin_dispatch(Instant::now()).is_some());

        fold_all(&mut state, &[("/revert", Some("1"))]);
        assert!(!state.ready_to_dispatch());
        assert!(state.begin_dispatch(Instant::now()).is_none());

        state.complete(&GatewayReply::ok());
        assert!(state.ready_to_dispatch());
        let request = state.begin_dispatch(Instant::now()).unwrap();
        assert_eq!(request.operation, GatewayOperation::Revert);
        assert_eq!(request.id, 2);
    }

    #[test]
    fn test_edit_during_flight_carries_update_intent() {
        let mut state = state();
        fold_all(
            &mut state,
            &[("/update/BlockA/Tunable1", Some("7")), ("/reference", Some("R1"))],
        );
        elapse(&mut state);
        state.begin_dispatch(Instant::now()).unwrap();

        fold_all(&mut state, &[("/update/BlockA/Tunable1", Some("9"))]);
        assert_eq!(state.intent(), UpdateIntent::Update);

        state.complete(&GatewayReply::ok());
        assert_eq!(state.fields().get("BlockA", "Tunable1"), Some("9"));
        elapse(&mut state);
        let request = state.begin_dispatch(Instant::now()).unwrap();
        let fields = request.operation.fields().unwrap();
        assert_eq!(fields.get("BlockA", "Tunable1"), Some("9"));
    }

    #[test]
    fn test_successful_flush_empties_accumulator() {
        let mut state = state();
        fold_all(
            &mut state,
            &[("/update/BlockA/Tunable1", Some("7")), ("/reference", Some("R1"))],
        );
        elapse(&mut state);
        state.begin_dispatch(Instant::now()).unwrap();
        let flight = state.complete(&GatewayReply::ok()).unwrap();

        assert_eq!(flight.intent, UpdateIntent::Update);
        assert!(state.fields().is_empty());
        assert_eq!(state.intent(), UpdateIntent::None);
        assert!(!state.is_awaiting_reply());
        assert!(!state.ready_to_dispatch());
    }

    #[test]
    fn test_failed_flush_keeps_fields() {
        let mut state = state();
        fold_all(
            &mut state,
            &[("/update/BlockA/Tunable1", Some("7")), ("/reference", Some("R1"))],
        );
        elapse(&mut state);
        state.begin_dispatch(Instant::now()).unwrap();
        state.complete(&GatewayReply::failure_message("boom"));

        assert_eq!(state.fields().get("BlockA", "Tunable1"), Some("7"));
        // No automatic retry
        assert!(!state.ready_to_dispatch());
    }

    #[test]
    fn test_target_loaded_once_until_selection_changes() {
        let mut state = state();
        fold_all(
            &mut state,
            &[
                ("/FolderName", Some("API Test")),
                ("/StateFile", Some("State (3)")),
                ("/reference", Some("R1")),
            ],
        );
        elapse(&mut state);
        let first = state.begin_dispatch(Instant::now()).unwrap();
        assert_eq!(first.load, Some(ModelTarget::new("API Test", "State (3)")));
        state.complete(&GatewayReply::ok());

        fold_all(&mut state, &[("/reference", Some("R2"))]);
        elapse(&mut state);
        let second = state.begin_dispatch(Instant::now()).unwrap();
        assert_eq!(second.load, None);
        state.complete(&GatewayReply::ok());

        fold_all(
            &mut state,
            &[("/StateFile", Some("State (4)")), ("/reference", Some("R3"))],
        );
        elapse(&mut state);
        let third = state.begin_dispatch(Instant::now()).unwrap();
        assert_eq!(third.load, Some(ModelTarget::new("API Test", "State (4)")));
    }

    #[test]
    fn test_reset_always_reloads_target() {
        let mut state = state();
        fold_all(
            &mut state,
            &[
                ("/FolderName", Some("M")),
                ("/StateFile", Some("S")),
                ("/reference", Some("R1")),
            ],
        );
        elapse(&mut state);
        state.begin_dispatch(Instant::now()).unwrap();
        state.complete(&GatewayReply::ok());

        fold_all(&mut state, &[("/reset", Some("1"))]);
        let request = state.begin_dispatch(Instant::now()).unwrap();
        assert_eq!(request.load, Some(ModelTarget::new("M", "S")));
    }

    #[test]
    fn test_metadata_does_not_touch_countdown_or_intent() {
        let mut state = state();
        assert_eq!(
            state.fold(&Notification::set("/SourceBlock", "Output")),
            FoldOutcome::Metadata
        );
        assert_eq!(state.gate_wait(), None);
        assert_eq!(state.intent(), UpdateIntent::None);
        assert_eq!(state.model().source_block.as_deref(), Some("Output"));
    }

    #[test]
    fn test_reply_deadline() {
        let mut state = state();
        let timeout = Some(Duration::from_secs(5));
        assert_eq!(state.reply_deadline(timeout), None);

        fold_all(&mut state, &[("/revert", Some("1"))]);
        let now = Instant::now();
        state.begin_dispatch(now).unwrap();
        assert_eq!(state.reply_deadline(timeout), Some(now + Duration::from_secs(5)));
        assert_eq!(state.reply_deadline(None), None);
    }

    #[test]
    fn test_stray_reply_is_ignored() {
        let mut state = state();
        assert!(state.complete(&GatewayReply::ok()).is_none());
    }
}
