//! Renders PostgreSQL logical decoding changes as a stream of JSON objects.
//!
//! The [`decoding`] module holds the output plugin: transaction markers,
//! row change envelopes and per-type literal formatting. The [`pgoutput`]
//! and [`replay`] modules provide a host that feeds the plugin from a
//! captured pgoutput stream.

pub mod checkpoint;
pub mod config;
pub mod decoding;
pub mod error;
pub mod pgoutput;
pub mod replay;

pub use config::{Config, PluginOptions};
pub use decoding::{JsonDecodingPlugin, OutputPlugin};
pub use error::{Error, Result};
pub use replay::{ReplaySummary, Replayer};
