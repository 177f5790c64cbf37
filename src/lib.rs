//! Single-user, local-only encrypted password vault: library surface.
//!
//! `main.rs` is a thin binary wrapper around the modules exported here.
//! Exporting them as a library lets integration tests under `tests/`
//! drive the vault engine through `ScriptedPrompter` without a real
//! terminal.

pub mod cipher;
pub mod cli;
pub mod codec;
pub mod error;
pub mod kdf;
pub mod logging;
pub mod passgen;
pub mod rand_source;
pub mod secure;
pub mod signals;
pub mod ui;
pub mod vault;
