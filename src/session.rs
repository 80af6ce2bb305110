use std::fmt;

use tracing::{debug, info};

use crate::error::SessionError;
use crate::recorder::IntervalRecorder;

/// Fewest intervals a session needs before it may be submitted
pub const MIN_INTERVALS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Idle,
    Recording,
    Locked,
    Resulted,
}

/// Identifies one submission so late completions can be told apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Edit to the typed text carried by a key-down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEdit {
    Insert(char),
    Backspace,
}

/// The one live capture: intervals plus the accumulated text
#[derive(Debug, Clone, Default)]
pub struct KeystrokeSession {
    recorder: IntervalRecorder,
    text: String,
}

impl KeystrokeSession {
    pub fn intervals(&self) -> &[f64] {
        self.recorder.intervals()
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Read-only copy of a session handed to the analysis client
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub ticket: Ticket,
    pub intervals: Vec<f64>,
    pub text: String,
}

/// Owns the live session and gates capture and submission by phase
#[derive(Debug, Clone)]
pub struct SessionMachine {
    session: KeystrokeSession,
    phase: Phase,
    in_flight: Option<Ticket>,
    next_ticket: u64,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMachine {
    pub fn new() -> Self {
        Self {
            session: KeystrokeSession::default(),
            phase: Phase::Idle,
            in_flight: None,
            next_ticket: 1,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session(&self) -> &KeystrokeSession {
        &self.session
    }

    pub fn intervals(&self) -> &[f64] {
        self.session.intervals()
    }

    pub fn text(&self) -> &str {
        self.session.text()
    }

    /// Raw length of the typed text, in characters
    pub fn char_count(&self) -> usize {
        self.session.text.chars().count()
    }

    pub fn in_flight(&self) -> Option<Ticket> {
        self.in_flight
    }

    /// Key-downs are only taken while no submission is pending or rendered
    pub fn is_capturing(&self) -> bool {
        matches!(self.phase, Phase::Idle | Phase::Recording)
    }

    /// Times a key-down at `at_ms`. Returns false when the key-down was discarded.
    pub fn record_keydown(&mut self, at_ms: f64) -> bool {
        if !self.is_capturing() {
            debug!(phase = %self.phase, "key-down discarded");
            return false;
        }

        self.session.recorder.record(at_ms);
        if self.phase == Phase::Idle {
            self.phase = Phase::Recording;
        }
        true
    }

    /// Applies a text edit under the same gate as timing capture
    pub fn apply_edit(&mut self, edit: TextEdit) -> bool {
        if !self.is_capturing() {
            return false;
        }

        match edit {
            TextEdit::Insert(c) => self.session.text.push(c),
            TextEdit::Backspace => {
                self.session.text.pop();
            }
        }
        true
    }

    /// Locks the session and returns the snapshot to analyze
    pub fn submit(&mut self) -> Result<SessionSnapshot, SessionError> {
        match self.phase {
            Phase::Locked => return Err(SessionError::InFlight),
            Phase::Resulted => return Err(SessionError::AlreadyAnalyzed),
            Phase::Idle | Phase::Recording => {}
        }

        let captured = self.session.recorder.len();
        if captured < MIN_INTERVALS {
            return Err(SessionError::InsufficientData {
                captured,
                required: MIN_INTERVALS,
            });
        }

        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.in_flight = Some(ticket);
        self.phase = Phase::Locked;
        info!(%ticket, intervals = captured, "session locked for analysis");

        Ok(SessionSnapshot {
            ticket,
            intervals: self.session.intervals().to_vec(),
            text: self.session.text.clone(),
        })
    }

    fn settle(&mut self, ticket: Ticket) -> Result<(), SessionError> {
        if self.phase != Phase::Locked {
            return Err(SessionError::NotLocked);
        }
        if self.in_flight != Some(ticket) {
            return Err(SessionError::Stale(ticket));
        }
        self.in_flight = None;
        Ok(())
    }

    /// Successful completion: the rendered waveform comes from the captured intervals
    pub fn on_result(&mut self, ticket: Ticket) -> Result<(), SessionError> {
        self.settle(ticket)?;
        self.phase = Phase::Resulted;
        Ok(())
    }

    /// Failed completion: unlock for a retry with everything captured so far
    pub fn on_error(&mut self, ticket: Ticket) -> Result<(), SessionError> {
        self.settle(ticket)?;
        self.phase = Phase::Recording;
        Ok(())
    }

    /// Discards the session from any phase
    pub fn reset(&mut self) {
        self.session = KeystrokeSession::default();
        self.in_flight = None;
        self.phase = Phase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn typed(keydowns: usize) -> SessionMachine {
        let mut machine = SessionMachine::new();
        for i in 0..keydowns {
            machine.record_keydown(i as f64 * 100.0 + (i % 3) as f64 * 7.0);
            machine.apply_edit(TextEdit::Insert('a'));
        }
        machine
    }

    #[test]
    fn test_new_machine_is_idle_and_empty() {
        let machine = SessionMachine::new();
        assert_eq!(machine.phase(), Phase::Idle);
        assert!(machine.intervals().is_empty());
        assert_eq!(machine.text(), "");
        assert_eq!(machine.in_flight(), None);
    }

    #[test]
    fn test_first_keydown_moves_to_recording_without_interval() {
        let mut machine = SessionMachine::new();
        assert!(machine.record_keydown(10.0));
        assert_eq!(machine.phase(), Phase::Recording);
        assert!(machine.intervals().is_empty());

        machine.record_keydown(55.0);
        assert_eq!(machine.intervals(), &[45.0]);
    }

    #[test]
    fn test_interval_count_is_keydowns_minus_one() {
        let machine = typed(7);
        assert_eq!(machine.intervals().len(), 6);
        assert_eq!(machine.char_count(), 7);
    }

    #[test]
    fn test_submit_refuses_below_threshold() {
        let mut machine = typed(MIN_INTERVALS);
        assert_eq!(machine.intervals().len(), MIN_INTERVALS - 1);

        let err = machine.submit().unwrap_err();
        assert_eq!(
            err,
            SessionError::InsufficientData {
                captured: MIN_INTERVALS - 1,
                required: MIN_INTERVALS
            }
        );
        assert_eq!(machine.phase(), Phase::Recording);
        assert_eq!(machine.in_flight(), None);
    }

    #[test]
    fn test_submit_from_idle_is_insufficient() {
        let mut machine = SessionMachine::new();
        assert_matches!(
            machine.submit(),
            Err(SessionError::InsufficientData { captured: 0, .. })
        );
        assert_eq!(machine.phase(), Phase::Idle);
    }

    #[test]
    fn test_submit_locks_and_snapshots() {
        let mut machine = typed(MIN_INTERVALS + 1);
        let snapshot = machine.submit().unwrap();

        assert_eq!(machine.phase(), Phase::Locked);
        assert_eq!(machine.in_flight(), Some(snapshot.ticket));
        assert_eq!(snapshot.intervals, machine.intervals());
        assert_eq!(snapshot.text, "a".repeat(MIN_INTERVALS + 1));
    }

    #[test]
    fn test_locked_discards_keydowns_and_edits() {
        let mut machine = typed(12);
        machine.submit().unwrap();
        let intervals = machine.intervals().to_vec();

        assert!(!machine.record_keydown(99_999.0));
        assert!(!machine.apply_edit(TextEdit::Insert('z')));
        assert!(!machine.apply_edit(TextEdit::Backspace));

        assert_eq!(machine.intervals(), intervals.as_slice());
        assert_eq!(machine.char_count(), 12);
    }

    #[test]
    fn test_second_submit_while_locked_is_refused() {
        let mut machine = typed(12);
        machine.submit().unwrap();
        assert_eq!(machine.submit(), Err(SessionError::InFlight));
    }

    #[test]
    fn test_result_moves_to_resulted_and_stays_locked() {
        let mut machine = typed(12);
        let snapshot = machine.submit().unwrap();

        machine.on_result(snapshot.ticket).unwrap();
        assert_eq!(machine.phase(), Phase::Resulted);
        assert!(!machine.record_keydown(1.0e6));
        assert_eq!(machine.submit(), Err(SessionError::AlreadyAnalyzed));
    }

    #[test]
    fn test_error_unlocks_for_retry_with_same_data() {
        let mut machine = typed(12);
        let first = machine.submit().unwrap();

        machine.on_error(first.ticket).unwrap();
        assert_eq!(machine.phase(), Phase::Recording);
        assert_eq!(machine.intervals(), first.intervals.as_slice());
        assert_eq!(machine.text(), first.text);

        let second = machine.submit().unwrap();
        assert_ne!(first.ticket, second.ticket);
        assert_eq!(first.intervals, second.intervals);
        assert_eq!(first.text, second.text);
    }

    #[test]
    fn test_completion_outside_locked_is_rejected() {
        let mut machine = typed(12);
        let snapshot = machine.submit().unwrap();
        machine.on_result(snapshot.ticket).unwrap();

        assert_eq!(
            machine.on_error(snapshot.ticket),
            Err(SessionError::NotLocked)
        );
        assert_eq!(machine.phase(), Phase::Resulted);
    }

    #[test]
    fn test_completion_after_reset_is_stale() {
        let mut machine = typed(12);
        let old = machine.submit().unwrap();
        machine.reset();
        assert_eq!(machine.on_result(old.ticket), Err(SessionError::NotLocked));

        for i in 0..12 {
            machine.record_keydown(i as f64 * 50.0);
        }
        let fresh = machine.submit().unwrap();
        assert_eq!(
            machine.on_result(old.ticket),
            Err(SessionError::Stale(old.ticket))
        );
        assert_eq!(machine.phase(), Phase::Locked);
        machine.on_result(fresh.ticket).unwrap();
        assert_eq!(machine.phase(), Phase::Resulted);
    }

    #[test]
    fn test_reset_from_every_phase() {
        let mut idle = SessionMachine::new();
        let mut recording = typed(3);
        let mut locked = typed(12);
        locked.submit().unwrap();
        let mut resulted = typed(12);
        let ticket = resulted.submit().unwrap().ticket;
        resulted.on_result(ticket).unwrap();

        for machine in [&mut idle, &mut recording, &mut locked, &mut resulted] {
            machine.reset();
            assert_eq!(machine.phase(), Phase::Idle);
            assert!(machine.intervals().is_empty());
            assert_eq!(machine.text(), "");
            assert_eq!(machine.in_flight(), None);
        }
    }

    #[test]
    fn test_reset_forgets_previous_timestamp() {
        let mut machine = typed(4);
        machine.reset();
        machine.record_keydown(10_000.0);
        assert!(machine.intervals().is_empty());
    }

    #[test]
    fn test_backspace_edits_text_but_is_still_timed() {
        let mut machine = SessionMachine::new();
        machine.record_keydown(0.0);
        machine.apply_edit(TextEdit::Insert('h'));
        machine.record_keydown(80.0);
        machine.apply_edit(TextEdit::Backspace);

        assert_eq!(machine.text(), "");
        assert_eq!(machine.intervals(), &[80.0]);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Idle.to_string(), "Idle");
        assert_eq!(Phase::Locked.to_string(), "Locked");
    }
}
