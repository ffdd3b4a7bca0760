//! The concurrent, sharded position-counting pipeline.
//!
//! [`metadata`] loads per-test sidecar JSON and derives the file-list
//! filters (C7); [`table`] is the sharded count/canonical tables (C3/C4);
//! [`visitor`] is the per-game traversal policy that drives them (C5); and
//! [`pipeline`] ties everything together: [`pipeline::Config`], the shared
//! run-wide state, and the worker pool & planner (C6).

pub mod metadata;
pub mod pipeline;
pub mod table;
pub mod visitor;
