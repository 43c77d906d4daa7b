// svctail - app/mod.rs
//
// Application layer: run-log I/O, follower threads, session orchestration
// and presentation.
// Dependencies: core layer.
// Must NOT depend on: platform specifics.

pub mod history;
pub mod present;
pub mod session;
pub mod tail;
