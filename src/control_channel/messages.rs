//! Wire format of the control channel
//!
//! Outbound results use the cable envelope the coordinator expects: the
//! payload is JSON serialized *into a string* under `data`, and the channel
//! identifier is itself a JSON string.
//!
//! ```json
//! {"command":"message",
//!  "identifier":"{\"channel\":\"IndexerChannel\"}",
//!  "data":"{\"action\":\"parse\",\"url\":...,\"response\":...}"}
//! ```
//!
//! Inbound frames are bare job objects.

use serde_json::{Map, Value, json};

use super::errors::ChannelError;
use crate::indexer::Job;
use crate::indexer_engine::JobResult;
use crate::utils::INDEXER_CHANNEL;

/// Classified inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Job(Box<Job>),
    /// Application-level ping (`{"type":"ping"}`)
    Heartbeat,
    /// Anything else, with the reason it was not a job
    Ignored(String),
}

/// Data payload for a terminal result, `None` for deferrals
#[must_use]
pub fn result_payload(result: &JobResult) -> Option<Map<String, Value>> {
    match result {
        JobResult::Success { job, response } => {
            let mut data = job.echo_fields();
            data.insert("action".into(), Value::String("parse".into()));
            data.insert(
                "response".into(),
                serde_json::to_value(response).unwrap_or(Value::Null),
            );
            Some(data)
        }
        JobResult::Failure { job, error } => {
            let mut data = job.echo_fields();
            data.insert("action".into(), Value::String("error".into()));
            data.insert("message".into(), Value::String(error.to_string()));
            data.insert(
                "kind".into(),
                serde_json::to_value(error.kind()).unwrap_or(Value::Null),
            );
            Some(data)
        }
        JobResult::RetryDeferred { .. } => None,
    }
}

/// Wrap a data payload in the channel envelope
pub fn envelope(data: &Map<String, Value>) -> Result<String, ChannelError> {
    let identifier = serde_json::to_string(&json!({ "channel": INDEXER_CHANNEL }))
        .map_err(|e| ChannelError::Encode(e.to_string()))?;
    let data = serde_json::to_string(data).map_err(|e| ChannelError::Encode(e.to_string()))?;

    serde_json::to_string(&json!({
        "command": "message",
        "identifier": identifier,
        "data": data,
    }))
    .map_err(|e| ChannelError::Encode(e.to_string()))
}

/// Encode a result for sending; `Ok(None)` for results that are not sent
pub fn encode_result(result: &JobResult) -> Result<Option<String>, ChannelError> {
    result_payload(result).map(|data| envelope(&data)).transpose()
}

/// Classify an inbound text frame
#[must_use]
pub fn decode_inbound(text: &str) -> Inbound {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => return Inbound::Ignored(format!("not JSON: {e}")),
    };

    match value.get("type").and_then(Value::as_str) {
        Some("ping") => return Inbound::Heartbeat,
        Some(other) => return Inbound::Ignored(format!("control message '{other}'")),
        None => {}
    }

    // Cable servers wrap broadcasts as {"identifier": ..., "message": {...}}
    let body = match value.get("message") {
        Some(inner @ Value::Object(_)) if value.get("url").is_none() => inner.clone(),
        _ => value,
    };

    match serde_json::from_value::<Job>(body) {
        Ok(job) => Inbound::Job(Box::new(job)),
        Err(e) => Inbound::Ignored(format!("not a valid job: {e}")),
    }
}
