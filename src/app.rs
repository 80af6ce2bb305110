use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{info, warn};

use crate::analysis::{dispatch, AnalysisMethod, AnalysisOutcome, Analyzer, ConfidenceDisplay};
use crate::error::SessionError;
use crate::rhythm::RhythmSummary;
use crate::runtime::PulseEvent;
use crate::session::{Phase, SessionMachine, TextEdit};
use crate::waveform::Waveform;

pub const IDLE_LABEL: &str = "Idle";
pub const IDLE_STATUS: &str = "Status: Waiting for input";

/// Presentation sinks populated by the controller
#[derive(Debug, Clone, PartialEq)]
pub struct Readout {
    pub char_count: usize,
    pub label: String,
    pub confidence: ConfidenceDisplay,
    pub status: String,
    pub method: Option<AnalysisMethod>,
    pub analyzed_at: Option<DateTime<Local>>,
}

impl Default for Readout {
    fn default() -> Self {
        Self {
            char_count: 0,
            label: IDLE_LABEL.to_string(),
            confidence: ConfidenceDisplay::default(),
            status: IDLE_STATUS.to_string(),
            method: None,
            analyzed_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// What a key press means to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Keydown(TextEdit),
    Submit,
    Reset,
    Quit,
    Ignore,
}

impl From<&KeyEvent> for Command {
    fn from(key: &KeyEvent) -> Self {
        if key.kind != KeyEventKind::Press {
            return Command::Ignore;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => Command::Quit,
            KeyCode::Char('c') if ctrl => Command::Quit,
            KeyCode::Char('l') if ctrl => Command::Reset,
            KeyCode::Tab => Command::Submit,
            KeyCode::Char(_) if ctrl => Command::Ignore,
            KeyCode::Char(c) => Command::Keydown(TextEdit::Insert(c)),
            KeyCode::Enter => Command::Keydown(TextEdit::Insert('\n')),
            KeyCode::Backspace => Command::Keydown(TextEdit::Backspace),
            _ => Command::Ignore,
        }
    }
}

/// Owns the session and wires it to the analyzer and the display
pub struct App {
    pub machine: SessionMachine,
    pub readout: Readout,
    analyzer: Arc<dyn Analyzer>,
    events: Sender<PulseEvent>,
    origin: Instant,
    ticks: u64,
}

impl App {
    pub fn new(analyzer: Arc<dyn Analyzer>, events: Sender<PulseEvent>) -> Self {
        Self {
            machine: SessionMachine::new(),
            readout: Readout::default(),
            analyzer,
            events,
            origin: Instant::now(),
            ticks: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn on_tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
    }

    /// Key event stamped with its arrival instant
    pub fn on_key(&mut self, key: KeyEvent, at: Instant) -> Flow {
        let at_ms = at.saturating_duration_since(self.origin).as_secs_f64() * 1000.0;
        self.on_key_at(key, at_ms)
    }

    /// Key event stamped in milliseconds on the session clock
    pub fn on_key_at(&mut self, key: KeyEvent, at_ms: f64) -> Flow {
        match Command::from(&key) {
            Command::Keydown(edit) => self.keydown(edit, at_ms),
            Command::Submit => self.submit(),
            Command::Reset => self.reset(),
            Command::Quit => return Flow::Quit,
            Command::Ignore => {}
        }
        Flow::Continue
    }

    /// Timing capture and the text buffer are gated together; the counter is
    /// refreshed from the text at every key-down whatever the phase.
    pub fn keydown(&mut self, edit: TextEdit, at_ms: f64) {
        if self.machine.record_keydown(at_ms) {
            self.machine.apply_edit(edit);
        }
        self.readout.char_count = self.machine.char_count();
    }

    pub fn submit(&mut self) {
        match self.machine.submit() {
            Ok(snapshot) => {
                self.readout.status = "Analyzing...".to_string();
                dispatch(Arc::clone(&self.analyzer), snapshot, self.events.clone());
            }
            Err(SessionError::InsufficientData { required, .. }) => {
                self.readout.status =
                    format!("Please type at least {required} characters before analyzing.");
            }
            Err(e) => {
                info!(error = %e, "submit refused");
                self.readout.status = e.to_string();
            }
        }
    }

    pub fn on_analysis(&mut self, outcome: AnalysisOutcome) {
        let AnalysisOutcome { ticket, result } = outcome;
        let settled = match &result {
            Ok(_) => self.machine.on_result(ticket),
            Err(_) => self.machine.on_error(ticket),
        };
        if let Err(e) = settled {
            warn!(error = %e, %ticket, "discarding analysis outcome");
            return;
        }

        match result {
            Ok(result) => {
                info!(%ticket, label = %result.label, confidence = result.confidence, "analysis complete");
                let method = result.method();
                self.readout.confidence = result.confidence_display();
                self.readout.status = method.to_string();
                self.readout.method = Some(method);
                self.readout.label = result.label;
                self.readout.analyzed_at = Some(Local::now());
            }
            Err(e) => {
                warn!(error = %e, %ticket, "analysis failed, unlocking for retry");
                self.readout.status = format!("Error: {e}. Press Tab to retry.");
            }
        }
    }

    pub fn reset(&mut self) {
        info!(phase = %self.machine.phase(), "session reset");
        self.machine.reset();
        self.readout = Readout::default();
    }

    /// Waveform for the current phase: the captured rhythm once a result is in,
    /// the baseline otherwise
    pub fn waveform(&self) -> Waveform {
        match self.machine.phase() {
            Phase::Resulted => Waveform::from_intervals(self.machine.intervals()),
            _ => Waveform::Baseline,
        }
    }

    pub fn rhythm(&self) -> Option<RhythmSummary> {
        RhythmSummary::of(self.machine.intervals())
    }
}
