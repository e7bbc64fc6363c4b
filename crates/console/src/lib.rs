//! `stakeboard-console` library crate.
//!
//! The client-side coordinator for today's profit distribution: status
//! polling, countdown, toast notifications, draft caching, and the
//! queue/modify/cancel and slot allocation workflows.  The `stakeboard`
//! binary in `main.rs` drives these from the command line.

pub mod config;
pub mod countdown;
pub mod draft;
pub mod error;
pub mod notify;
pub mod poller;
pub mod render;
pub mod slots;
pub mod workflow;
