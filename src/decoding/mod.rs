//! The JSON output plugin: transaction framing, row envelopes and literal
//! formatting.

pub mod framer;
pub mod host;
pub mod ident;
pub mod literal;
pub mod plugin;
pub mod row;
pub mod session;
pub mod types;

pub use host::{BufferedWriter, Catalog, OutputWriter};
pub use literal::{format_literal, type_oids, TypeCategory, TypedValue, UNCHANGED_TOAST_DATUM};
pub use plugin::{DecodingContext, JsonDecodingPlugin, OutputPlugin, OutputType};
pub use session::DecodingState;
pub use types::*;
