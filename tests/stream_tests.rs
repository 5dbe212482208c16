/// End-to-end frame pipeline tests: a replayed SSE body goes through
/// `QueryStream` (line assembly, frame decoding) into `QuerySession`
/// (transcript mutation), exactly as the CLI drives a live query.
use oxbow::api::QueryStream;
use oxbow::api::sse::Frame;
use oxbow::playground::Role;
use oxbow::playground::params::{AutoParams, QueryParams};
use oxbow::playground::session::{FrameOutcome, QueryOutcome, QuerySession};

fn replay(body: &str) -> QueryStream {
    QueryStream::from_reader(std::io::Cursor::new(body.to_string()))
}

/// Pump a stream into a session until a terminal outcome or end of stream.
fn pump(stream: &mut QueryStream, session: &mut QuerySession) -> Option<QueryOutcome> {
    while let Some(frame) = stream.next_frame().ok().flatten() {
        if let FrameOutcome::Finished(outcome) = session.apply_frame(frame) {
            return Some(outcome);
        }
    }
    None
}

#[test]
fn replayed_query_builds_the_full_transcript() {
    let body = "data: {\"rl_status\": \"exploiting\", \"domain\": \"coding\"}\n\n\
                data: {\"step\": \"Classifying query\"}\n\n\
                data: {\"step\": \"Scoring candidates\", \"metrics\": {\"pool\": 4}}\n\n\
                data: {\"final_response\": \"Here you go.\", \"model_used\": \"claude-sonnet\"}\n\n";

    let mut session = QuerySession::new();
    let id = session
        .begin_query("write a sort", &QueryParams::Auto(AutoParams::balanced()))
        .unwrap();
    let mut stream = replay(body);

    let outcome = pump(&mut stream, &mut session);
    assert_eq!(
        outcome,
        Some(QueryOutcome::Answered {
            text: "Here you go.".to_string(),
            model: Some("claude-sonnet".to_string()),
        })
    );

    let processing = session.transcript().get(id).unwrap();
    let labels: Vec<&str> = processing.steps.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "exploiting (domain: coding)",
            "Classifying query",
            "Scoring candidates"
        ]
    );
    assert_eq!(processing.steps[2].payload.as_ref().unwrap()["pool"], 4);
    assert!(processing.done);

    let terminal = session.transcript().entries().last().unwrap();
    assert_eq!(terminal.role, Role::System);
    assert_eq!(terminal.text, "Here you go.");
    assert_eq!(terminal.model.as_deref(), Some("claude-sonnet"));
}

#[test]
fn replayed_error_fails_the_query() {
    let body = "data: {\"step\": \"Classifying query\"}\n\n\
                data: {\"error\": \"insufficient balance\"}\n\n";

    let mut session = QuerySession::new();
    session
        .begin_query("q", &QueryParams::Auto(AutoParams::balanced()))
        .unwrap();
    let mut stream = replay(body);

    let outcome = pump(&mut stream, &mut session);
    assert_eq!(
        outcome,
        Some(QueryOutcome::Failed {
            message: "insufficient balance".to_string(),
        })
    );
    // user + processing, no terminal system entry
    assert_eq!(session.transcript().len(), 2);
}

#[test]
fn stream_that_closes_early_yields_no_outcome() {
    let body = "data: {\"step\": \"Classifying query\"}\n\n";

    let mut session = QuerySession::new();
    let id = session
        .begin_query("q", &QueryParams::Auto(AutoParams::balanced()))
        .unwrap();
    let mut stream = replay(body);

    assert_eq!(pump(&mut stream, &mut session), None);
    // Driver treats this as a transport failure and aborts.
    session.abort();
    assert!(!session.query_running());
    assert!(!session.transcript().get(id).unwrap().done);
}

#[test]
fn multi_line_data_and_comments_are_handled() {
    // An event split across two data lines, with keep-alive comments and
    // CRLF terminators mixed in.
    let body = ": keep-alive\r\n\
                data: {\"final_response\":\r\n\
                data: \"split\"}\r\n\
                \r\n";

    let mut stream = replay(body);
    let frame = stream.next_frame().unwrap().unwrap();
    assert_eq!(
        frame,
        Frame::FinalResponse {
            final_response: "split".to_string(),
            model_used: None,
        }
    );
}

#[test]
fn frame_priority_prefers_error_over_step_shapes() {
    // A payload carrying both an error field and a step field must decode
    // as the error, whatever else rides along.
    let body = "data: {\"error\": \"boom\", \"step\": \"ignored\"}\n\n";
    let mut stream = replay(body);
    assert_eq!(
        stream.next_frame().unwrap().unwrap(),
        Frame::Error {
            error: "boom".to_string()
        }
    );
}
