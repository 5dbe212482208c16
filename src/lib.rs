//! oxbow — terminal client for an intelligent LLM routing service.
//!
//! The backend picks the best model for each query from priority weights
//! and numeric constraints, streaming its routing decisions as server-sent
//! events. oxbow submits queries, renders the routing steps live, and keeps
//! a local history of what was routed where.

pub mod api;
pub mod cli;
pub mod config;
pub mod history;
pub mod playground;
