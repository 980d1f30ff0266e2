//! Navigation and completeness engine for a guided, multi-section interview.
//!
//! A [`flow::FlowGraph`] is built once from a declarative [`flow::FlowDeclaration`]
//! and is immutable afterwards. Every query (`is_available`, `next_screen`,
//! `compute_checklist`, condition evaluation) reads facts through a per-call
//! [`flow::Snapshot`] and never mutates anything.

pub mod config;
pub mod error;
pub mod flow;
pub mod snapshot;
pub mod telemetry;
