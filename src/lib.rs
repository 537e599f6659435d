//! # scumflow
//!
//! Log ingestion for SCUM game servers: polls each configured server's log
//! directory over FTP or SFTP, parses new lines of the chat, login, kill,
//! admin and sentry logs, and stores them as facts plus incrementally
//! maintained player and weapon statistics in SQLite.
//!
//! ## Modules
//!
//! - [`model`] - targets, log types, parsed events, checkpoints
//! - [`parser`] - checkpointed UTF-16 log parsers
//! - [`store`] - SQLite schema, checkpoints, batch persistence
//! - [`transport`] - primary FTP, safe FTP and SFTP behind one trait
//! - [`pipeline`] - scheduler and per-target passes
//! - [`steam_bans`] - optional ban lookups on login

pub mod model;
pub mod parser;
pub mod pipeline;
pub mod steam_bans;
pub mod store;
pub mod transport;
