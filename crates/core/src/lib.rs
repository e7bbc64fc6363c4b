//! Domain types and pure logic for the distribution console.
//!
//! Nothing in this crate performs I/O, so it can be shared by the REST
//! client, the console coordinator and any future tooling.

pub mod countdown;
pub mod distribution;
pub mod error;
pub mod form;
pub mod polling;
pub mod ros_editor;
pub mod slots;
pub mod types;
pub mod wat;
