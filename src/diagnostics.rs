//! In-memory diagnostic log for external debugging tools.
//!
//! While logging is on, every connector and statement operation appends one [`LogEntry`]:
//! the operation name plus a JSON payload with its inputs, the adapter-level steps it ran
//! (each with its error, if any) and its outcome. Nothing in the crate reads the log back.

use std::fmt::Display;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde_json::{Value as JsonValue, json};

/// One logged operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub operation: String,
    pub payload: JsonValue,
}

/// One adapter primitive call made while serving an operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<JsonValue>,
    pub error: Option<String>,
}

impl Step {
    pub fn ok(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detail: None,
            error: None,
        }
    }

    pub fn failed(name: impl Into<String>, error: &impl Display) -> Self {
        Self {
            name: name.into(),
            detail: None,
            error: Some(error.to_string()),
        }
    }

    pub fn from_result<T, E: Display>(name: impl Into<String>, result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => Self::ok(name),
            Err(e) => Self::failed(name, e),
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: JsonValue) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Steps an adapter accumulates until the owning operation collects them.
#[derive(Debug, Default)]
pub struct StepLog(Vec<Step>);

impl StepLog {
    pub fn push(&mut self, step: Step) {
        self.0.push(step);
    }

    /// Record the outcome of a primitive and pass the result through.
    pub fn track<T, E: Display>(&mut self, name: &str, result: Result<T, E>) -> Result<T, E> {
        self.0.push(Step::from_result(name, &result));
        result
    }

    pub fn take(&mut self) -> Vec<Step> {
        std::mem::take(&mut self.0)
    }
}

#[derive(Debug, Default)]
struct DiagnosticLog {
    enabled: bool,
    entries: Vec<LogEntry>,
}

/// Log buffer shared by a connector and the statements it prepared.
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedLog(Arc<Mutex<DiagnosticLog>>);

impl SharedLog {
    fn with<R>(&self, f: impl FnOnce(&mut DiagnosticLog) -> R) -> R {
        let mut guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub(crate) fn start(&self) {
        self.with(|log| {
            log.enabled = true;
            log.entries.clear();
        });
    }

    pub(crate) fn stop(&self) {
        self.with(|log| log.enabled = false);
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.with(|log| log.enabled)
    }

    pub(crate) fn flush(&self) -> Vec<LogEntry> {
        self.with(|log| std::mem::take(&mut log.entries))
    }

    /// Append an entry; the payload is only built while logging is on.
    pub(crate) fn record(&self, operation: &str, payload: impl FnOnce() -> JsonValue) {
        self.with(|log| {
            if log.enabled {
                log.entries.push(LogEntry {
                    operation: operation.to_string(),
                    payload: payload(),
                });
            }
        });
    }
}

/// Payload builder shared by connector and statement operations.
pub(crate) fn payload(inputs: JsonValue, steps: &[Step], outcome: JsonValue) -> JsonValue {
    json!({
        "inputs": inputs,
        "steps": steps,
        "outcome": outcome,
    })
}
