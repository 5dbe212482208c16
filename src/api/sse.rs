//! SSE wire parsing and the query-stream frame union.
//!
//! The backend pushes one JSON object per SSE event while it routes a query.
//! Historically clients probed each object for known field names; here the
//! probe order is baked into [`Frame`] as a serde `untagged` enum — variant
//! declaration order is match priority, so a frame carrying several known
//! fields decodes as the highest-priority shape. Everything downstream
//! switches on the explicit variant, never on raw JSON.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Frame union
// ---------------------------------------------------------------------------

/// One decoded message from the query stream.
///
/// Variant order is significant: serde tries untagged variants top to
/// bottom, which implements the wire contract's first-match-wins rule
/// (error beats status, status beats step, step beats final response).
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Frame {
    /// Backend-reported failure. Terminal — no further frames follow.
    Error { error: String },
    /// Routing-algorithm status paired with the query's classified domain.
    StatusUpdate { rl_status: String, domain: String },
    /// One unit of intermediate routing work, with an optional opaque
    /// payload under one of several historical key names.
    ProgressStep {
        step: String,
        #[serde(default)]
        metrics: Option<Value>,
        #[serde(default)]
        models: Option<Value>,
        #[serde(default)]
        details: Option<Value>,
    },
    /// The answer. Terminal — the sole success path.
    FinalResponse {
        final_response: String,
        #[serde(default)]
        model_used: Option<String>,
    },
}

impl Frame {
    /// Decode one SSE event payload into a frame.
    ///
    /// An unrecognized shape is an error: a silent contract change on the
    /// wire should fail the query loudly rather than be skipped.
    pub fn decode(data: &str) -> Result<Self> {
        serde_json::from_str(data)
            .with_context(|| format!("unrecognized stream frame: {}", truncate_for_error(data)))
    }

    /// The opaque payload of a progress-step frame, whichever key carried it.
    pub fn step_payload(&self) -> Option<&Value> {
        match self {
            Self::ProgressStep {
                metrics,
                models,
                details,
                ..
            } => metrics
                .as_ref()
                .or(models.as_ref())
                .or(details.as_ref())
                .filter(|v| !v.is_null()),
            _ => None,
        }
    }
}

fn truncate_for_error(data: &str) -> String {
    const MAX: usize = 120;
    if data.len() <= MAX {
        data.to_string()
    } else {
        let cut: String = data.chars().take(MAX).collect();
        format!("{cut}…")
    }
}

// ---------------------------------------------------------------------------
// SSE event assembly
// ---------------------------------------------------------------------------

/// Incremental assembler for the SSE line protocol.
///
/// Feed it raw lines as they arrive; it buffers `data:` fields and yields
/// the joined payload at each blank-line event boundary. Comment lines
/// (leading `:`) and non-data fields (`event:`, `id:`, `retry:`) are
/// ignored — the stream only ever carries JSON in `data`.
#[derive(Debug, Default)]
pub struct EventAssembler {
    data: Vec<String>,
}

impl EventAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line (without the trailing newline). Returns the completed
    /// event payload when this line finishes an event.
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.is_empty() {
            if self.data.is_empty() {
                return None;
            }
            let payload = self.data.join("\n");
            self.data.clear();
            return Some(payload);
        }

        if line.starts_with(':') {
            return None;
        }

        if let Some(rest) = line.strip_prefix("data:") {
            self.data.push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
        }

        None
    }

    /// Flush a trailing event that was not terminated by a blank line
    /// (stream ended mid-event).
    pub fn finish(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        let payload = self.data.join("\n");
        self.data.clear();
        Some(payload)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_error_frame() {
        let frame = Frame::decode(r#"{"error": "no models available"}"#).unwrap();
        assert_eq!(
            frame,
            Frame::Error {
                error: "no models available".to_string()
            }
        );
    }

    #[test]
    fn decodes_status_update() {
        let frame = Frame::decode(r#"{"rl_status": "exploring", "domain": "coding"}"#).unwrap();
        assert_eq!(
            frame,
            Frame::StatusUpdate {
                rl_status: "exploring".to_string(),
                domain: "coding".to_string()
            }
        );
    }

    #[test]
    fn decodes_progress_step_with_metrics() {
        let frame =
            Frame::decode(r#"{"step": "Scoring candidates", "metrics": {"count": 3}}"#).unwrap();
        match &frame {
            Frame::ProgressStep { step, .. } => assert_eq!(step, "Scoring candidates"),
            other => panic!("expected progress step, got {other:?}"),
        }
        assert_eq!(frame.step_payload().unwrap()["count"], 3);
    }

    #[test]
    fn decodes_bare_step() {
        let frame = Frame::decode(r#"{"step": "Selecting model"}"#).unwrap();
        assert!(matches!(frame, Frame::ProgressStep { .. }));
        assert!(frame.step_payload().is_none());
    }

    #[test]
    fn step_payload_falls_back_across_keys() {
        let frame = Frame::decode(r#"{"step": "Shortlist", "models": ["a", "b"]}"#).unwrap();
        assert!(frame.step_payload().unwrap().is_array());

        let frame = Frame::decode(r#"{"step": "Routing", "details": {"k": 1}}"#).unwrap();
        assert!(frame.step_payload().unwrap().is_object());
    }

    #[test]
    fn null_payload_is_treated_as_absent() {
        let frame = Frame::decode(r#"{"step": "Warmup", "metrics": null}"#).unwrap();
        assert!(frame.step_payload().is_none());
    }

    #[test]
    fn decodes_final_response() {
        let frame =
            Frame::decode(r#"{"final_response": "42", "model_used": "gpt-4o-mini"}"#).unwrap();
        assert_eq!(
            frame,
            Frame::FinalResponse {
                final_response: "42".to_string(),
                model_used: Some("gpt-4o-mini".to_string())
            }
        );
    }

    #[test]
    fn final_response_without_model_label() {
        let frame = Frame::decode(r#"{"final_response": "done"}"#).unwrap();
        assert_eq!(
            frame,
            Frame::FinalResponse {
                final_response: "done".to_string(),
                model_used: None
            }
        );
    }

    #[test]
    fn error_field_wins_over_other_shapes() {
        // A frame carrying several known fields decodes by priority order.
        let frame =
            Frame::decode(r#"{"error": "boom", "step": "X", "final_response": "y"}"#).unwrap();
        assert!(matches!(frame, Frame::Error { .. }));
    }

    #[test]
    fn status_wins_over_step() {
        let frame =
            Frame::decode(r#"{"rl_status": "exploit", "domain": "chat", "step": "X"}"#).unwrap();
        assert!(matches!(frame, Frame::StatusUpdate { .. }));
    }

    #[test]
    fn unknown_shape_is_an_error() {
        assert!(Frame::decode(r#"{"progress": 0.5}"#).is_err());
        assert!(Frame::decode("not json").is_err());
    }

    #[test]
    fn assembler_joins_data_lines() {
        let mut asm = EventAssembler::new();
        assert_eq!(asm.push_line("data: {\"step\":"), None);
        assert_eq!(asm.push_line("data: \"A\"}"), None);
        assert_eq!(asm.push_line(""), Some("{\"step\":\n\"A\"}".to_string()));
    }

    #[test]
    fn assembler_ignores_comments_and_other_fields() {
        let mut asm = EventAssembler::new();
        assert_eq!(asm.push_line(": keep-alive"), None);
        assert_eq!(asm.push_line("event: message"), None);
        assert_eq!(asm.push_line("id: 7"), None);
        assert_eq!(asm.push_line("data: {}"), None);
        assert_eq!(asm.push_line(""), Some("{}".to_string()));
    }

    #[test]
    fn assembler_skips_empty_events() {
        let mut asm = EventAssembler::new();
        assert_eq!(asm.push_line(""), None);
        assert_eq!(asm.push_line(""), None);
    }

    #[test]
    fn assembler_strips_carriage_returns() {
        let mut asm = EventAssembler::new();
        assert_eq!(asm.push_line("data: {\"x\":1}\r"), None);
        assert_eq!(asm.push_line("\r"), Some("{\"x\":1}".to_string()));
    }

    #[test]
    fn assembler_flushes_unterminated_event() {
        let mut asm = EventAssembler::new();
        asm.push_line("data: tail");
        assert_eq!(asm.finish(), Some("tail".to_string()));
        assert_eq!(asm.finish(), None);
    }
}
