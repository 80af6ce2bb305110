use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AnalysisError;
use crate::runtime::PulseEvent;
use crate::session::{SessionSnapshot, Ticket};

/// Full turn of the confidence ring, in ring-offset units
pub const CIRCUMFERENCE: f64 = 314.0;

/// Marker the service puts in labels produced by text analysis
const CONTEXT_MARKER: &str = "NLP";

#[derive(Debug, Serialize)]
pub struct AnalysisRequest<'a> {
    pub data: &'a [f64],
    pub text: &'a str,
}

impl<'a> From<&'a SessionSnapshot> for AnalysisRequest<'a> {
    fn from(snapshot: &'a SessionSnapshot) -> Self {
        Self {
            data: &snapshot.intervals,
            text: &snapshot.text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnalysisResponse {
    emotion: String,
    #[serde(default)]
    confidence: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum AnalysisMethod {
    #[strum(to_string = "Status: Context-Aware NLP Active")]
    ContextAware,
    #[strum(to_string = "Status: AI Keystroke Active")]
    KeystrokeBased,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub label: String,
    /// In `[0, 1]`; an absent score is 0
    pub confidence: f64,
}

impl AnalysisResult {
    pub fn new(label: impl Into<String>, confidence: Option<f64>) -> Self {
        Self {
            label: label.into(),
            confidence: confidence.unwrap_or(0.0).clamp(0.0, 1.0),
        }
    }

    pub fn method(&self) -> AnalysisMethod {
        if self.label.contains(CONTEXT_MARKER) {
            AnalysisMethod::ContextAware
        } else {
            AnalysisMethod::KeystrokeBased
        }
    }

    pub fn confidence_display(&self) -> ConfidenceDisplay {
        ConfidenceDisplay::from_confidence(self.confidence)
    }
}

impl From<AnalysisResponse> for AnalysisResult {
    fn from(wire: AnalysisResponse) -> Self {
        Self::new(wire.emotion, wire.confidence)
    }
}

/// Confidence as shown: a whole percentage and the matching ring offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceDisplay {
    pub percent: u32,
    pub ring_offset: f64,
}

impl Default for ConfidenceDisplay {
    fn default() -> Self {
        Self {
            percent: 0,
            ring_offset: CIRCUMFERENCE,
        }
    }
}

impl ConfidenceDisplay {
    pub fn from_confidence(confidence: f64) -> Self {
        let percent = (confidence.clamp(0.0, 1.0) * 100.0).round() as u32;
        Self {
            percent,
            ring_offset: CIRCUMFERENCE - (percent as f64 / 100.0) * CIRCUMFERENCE,
        }
    }

    /// Filled share of the ring, in `[0, 1]`
    pub fn ring_fill(&self) -> f64 {
        ((CIRCUMFERENCE - self.ring_offset) / CIRCUMFERENCE).clamp(0.0, 1.0)
    }
}

/// Decodes a response body into a result, or a protocol error
pub fn parse_response(body: &[u8]) -> Result<AnalysisResult, AnalysisError> {
    let wire: AnalysisResponse = serde_json::from_slice(body)?;
    Ok(wire.into())
}

/// Remote classifier seam
pub trait Analyzer: Send + Sync + 'static {
    fn analyze(&self, snapshot: &SessionSnapshot) -> Result<AnalysisResult, AnalysisError>;
}

/// Posts sessions as JSON to a fixed endpoint
#[derive(Debug, Clone)]
pub struct HttpAnalyzer {
    client: Client,
    endpoint: String,
}

impl HttpAnalyzer {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, AnalysisError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Analyzer for HttpAnalyzer {
    fn analyze(&self, snapshot: &SessionSnapshot) -> Result<AnalysisResult, AnalysisError> {
        debug!(endpoint = %self.endpoint, ticket = %snapshot.ticket, "posting session");
        let body = self
            .client
            .post(&self.endpoint)
            .json(&AnalysisRequest::from(snapshot))
            .send()?
            .error_for_status()?
            .bytes()?;
        parse_response(&body)
    }
}

/// Completion of one submission, delivered back to the control loop
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub ticket: Ticket,
    pub result: Result<AnalysisResult, AnalysisError>,
}

/// Runs the analysis off the control thread and posts the outcome to `events`
pub fn dispatch(
    analyzer: Arc<dyn Analyzer>,
    snapshot: SessionSnapshot,
    events: Sender<PulseEvent>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let result = analyzer.analyze(&snapshot);
        let outcome = AnalysisOutcome {
            ticket: snapshot.ticket,
            result,
        };
        if events.send(PulseEvent::Analysis(outcome)).is_err() {
            warn!(ticket = %snapshot.ticket, "event loop gone, dropping analysis outcome");
        }
    })
}
