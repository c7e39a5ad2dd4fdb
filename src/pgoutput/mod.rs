//! A bundled host for the JSON plugin that replays pgoutput streams.

pub mod builder;
pub mod capture;
pub mod catalog;
pub mod decoder;

#[cfg(test)]
mod decoder_tests;

pub use builder::{MessageBuilder, TupleValue};
pub use capture::{encode_capture, CaptureReader};
pub use catalog::RelationCatalog;
pub use decoder::{ColumnInfo, PgOutputDecoder, PgOutputMessage, RelationInfo};
