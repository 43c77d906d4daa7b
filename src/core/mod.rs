// svctail - core/mod.rs
//
// Core logic layer: data model, line parsing, source resolution and the
// historical merge.
// Must NOT depend on: app, platform, or perform filesystem I/O.

pub mod merge;
pub mod model;
pub mod parser;
pub mod resolve;
