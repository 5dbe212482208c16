//! HTTP/SSE client for the routing backend.
//!
//! Communicates with the hosted routing service using the synchronous
//! `ureq` client. Session auth is a backend-issued cookie carried on every
//! request; the base URL is injected from config at construction and never
//! read from ambient state.
//!
//! Endpoints:
//!
//! - **Ranges**: `GET /query/get_ranges` — valid constraint intervals.
//! - **Catalog**: `GET /models/model_catalog` — selectable models.
//! - **Wallet**: `GET /wallet/balance` — current balance.
//! - **Query**: `GET /query/stream?…` — one SSE connection per query,
//!   returned as a [`QueryStream`] handle.

pub mod sse;

use std::io::{BufRead, BufReader, Read};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::config::schema::BackendConfig;
use crate::playground::params::{ConstraintRanges, QueryParams};

use sse::{EventAssembler, Frame};

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// One entry in the selectable-model catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogModel {
    pub id: String,
    pub name: String,
    pub cost: f64,
    pub latency: f64,
    pub performance: f64,
}

/// Response body from `GET /models/model_catalog`.
#[derive(Debug, Deserialize)]
struct CatalogResponse {
    models: Vec<CatalogModel>,
}

/// Response body from `GET /wallet/balance`.
#[derive(Debug, Deserialize)]
struct WalletResponse {
    wallet_balance: f64,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous backend client.
///
/// Built once from the `[backend]` config and shared by every command in a
/// single invocation.
#[derive(Debug)]
pub struct ApiClient {
    agent: ureq::Agent,
    base_url: String,
    session_cookie: String,
    fetch_timeout: Duration,
}

impl ApiClient {
    /// Build a client from the resolved backend config.
    ///
    /// The agent's read timeout doubles as the query stream's idle timeout:
    /// a stream that stays silent that long errors out instead of hanging
    /// forever.
    pub fn from_config(config: &BackendConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_millis(config.connect_timeout_ms))
            .timeout_read(Duration::from_millis(config.stream_idle_timeout_ms))
            .build();

        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session_cookie: config.session_cookie.clone(),
            fetch_timeout: Duration::from_millis(config.connect_timeout_ms),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a GET request with the session cookie attached.
    fn get(&self, path: &str) -> ureq::Request {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.agent.get(&url);
        if !self.session_cookie.is_empty() {
            req = req.set("Cookie", &format!("session_id={}", self.session_cookie));
        }
        req
    }

    // -----------------------------------------------------------------------
    // Simple fetches
    // -----------------------------------------------------------------------

    /// Fetch the valid constraint ranges.
    pub fn get_ranges(&self) -> Result<ConstraintRanges> {
        self.get("/query/get_ranges")
            .timeout(self.fetch_timeout)
            .call()
            .context("range fetch failed")?
            .into_json()
            .context("failed to parse range response")
    }

    /// Fetch the selectable-model catalog.
    pub fn model_catalog(&self) -> Result<Vec<CatalogModel>> {
        let resp: CatalogResponse = self
            .get("/models/model_catalog")
            .timeout(self.fetch_timeout)
            .call()
            .context("model catalog fetch failed")?
            .into_json()
            .context("failed to parse model catalog response")?;
        Ok(resp.models)
    }

    /// Fetch the wallet balance.
    pub fn wallet_balance(&self) -> Result<f64> {
        let resp: WalletResponse = self
            .get("/wallet/balance")
            .timeout(self.fetch_timeout)
            .call()
            .context("wallet balance fetch failed")?
            .into_json()
            .context("failed to parse wallet response")?;
        Ok(resp.wallet_balance)
    }

    // -----------------------------------------------------------------------
    // Query stream
    // -----------------------------------------------------------------------

    /// Open the one-shot event stream for a single query.
    ///
    /// Exactly one connection per submitted query; the returned handle is
    /// the connection — dropping it closes the stream.
    pub fn stream_query(&self, query: &str, params: &QueryParams) -> Result<QueryStream> {
        let path = format!("/query/stream?{}", build_query_string(query, params));
        let resp = self
            .get(&path)
            .set("Accept", "text/event-stream")
            .call()
            .context("failed to open query stream")?;

        Ok(QueryStream::from_reader(resp.into_reader()))
    }
}

// ---------------------------------------------------------------------------
// Query string encoding
// ---------------------------------------------------------------------------

/// Encode the query text and routing parameters as a URL query string.
fn build_query_string(query: &str, params: &QueryParams) -> String {
    let mut pairs: Vec<(&str, String)> = vec![("user_query", query.to_string())];

    match params {
        QueryParams::Manual { model_id } => {
            pairs.push(("model_id", model_id.clone()));
        }
        QueryParams::Auto(auto) => {
            pairs.push(("cost_priority", fmt_num(auto.cost_priority)));
            pairs.push(("accuracy_priority", fmt_num(auto.accuracy_priority)));
            pairs.push(("latency_priority", fmt_num(auto.latency_priority)));
            if let Some(v) = auto.cost_max {
                pairs.push(("cost_max", fmt_num(v)));
            }
            if let Some(v) = auto.perf_min {
                pairs.push(("perf_min", fmt_num(v)));
            }
            if let Some(v) = auto.lat_max {
                pairs.push(("lat_max", fmt_num(v)));
            }
        }
    }

    pairs
        .iter()
        .map(|(k, v)| format!("{k}={}", percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn fmt_num(v: f64) -> String {
    // Avoid "5" vs "5.0" churn server-side: integers print bare.
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Percent-encode a query-string component (RFC 3986 unreserved set).
fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Query stream handle
// ---------------------------------------------------------------------------

/// Open SSE connection for one query.
///
/// Pull frames with [`next_frame`]; drop the handle to close the
/// connection (the cancellation path). An idle timeout on the underlying
/// agent turns a silent stream into a read error here.
///
/// [`next_frame`]: QueryStream::next_frame
pub struct QueryStream {
    reader: BufReader<Box<dyn Read + Send + Sync + 'static>>,
    assembler: EventAssembler,
}

impl QueryStream {
    /// Wrap a raw SSE body. Public so tests (and stream replays) can drive
    /// the frame pipeline from any reader.
    pub fn from_reader(body: impl Read + Send + Sync + 'static) -> Self {
        Self {
            reader: BufReader::new(Box::new(body)),
            assembler: EventAssembler::new(),
        }
    }

    /// Block until the next frame arrives.
    ///
    /// Returns `Ok(None)` when the server closes the stream without another
    /// frame. Read failures (including the idle timeout) and undecodable
    /// frames are errors — the caller treats both as a transport failure
    /// for this query.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        let mut line = String::new();
        loop {
            line.clear();
            let n = self
                .reader
                .read_line(&mut line)
                .context("query stream read failed")?;

            if n == 0 {
                // Server closed the connection; flush a trailing event.
                return match self.assembler.finish() {
                    Some(payload) => Frame::decode(&payload).map(Some),
                    None => Ok(None),
                };
            }

            let trimmed = line.strip_suffix('\n').unwrap_or(&line);
            if let Some(payload) = self.assembler.push_line(trimmed) {
                return Frame::decode(&payload).map(Some);
            }
        }
    }

    /// Close the connection. Dropping the handle does the same; this spelling
    /// exists so cancellation reads as intent at call sites.
    pub fn close(self) {}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
