// svctail - platform/mod.rs
//
// Platform layer: configuration directories, config.toml and the service
// catalog file.
// Dependencies: core model types, app::tail follow settings, directories crate.

pub mod catalog;
pub mod config;
