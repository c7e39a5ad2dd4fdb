//! Seams between the encoder and the host that drives it.

use bytes::{Bytes, BytesMut};

use super::types::Oid;
use crate::Result;

/// Catalog access supplied by the host.
///
/// Lookups happen per event; implementations must reflect schema changes
/// made between events.
pub trait Catalog {
    /// Name of the namespace (schema) that owns relation `relid`.
    fn namespace_name(&self, relid: Oid) -> Result<String>;

    /// Text representation of `value` produced by the output function of `type_oid`.
    fn output_text(&self, type_oid: Oid, value: &[u8]) -> Result<String>;

    /// Materialize an out-of-line value into `into`.
    fn detoast(&self, value: &[u8], into: &mut BytesMut) -> Result<()>;
}

/// Write primitive supplied by the replication transport.
///
/// `prepare_write` is always followed by exactly one `write` carrying one
/// complete JSON object.
pub trait OutputWriter {
    fn prepare_write(&mut self, last_write: bool);

    fn write(&mut self, data: &[u8], last_write: bool) -> Result<()>;
}

/// Collects every written object in memory.
#[derive(Debug, Default)]
pub struct BufferedWriter {
    messages: Vec<Bytes>,
    pending: bool,
}

impl BufferedWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Bytes] {
        &self.messages
    }

    /// Written objects as UTF-8 text, lossily converted.
    pub fn lines(&self) -> Vec<String> {
        self.messages
            .iter()
            .map(|m| String::from_utf8_lossy(m).into_owned())
            .collect()
    }

    /// Takes every object written so far, leaving the writer empty.
    pub fn drain(&mut self) -> Vec<Bytes> {
        std::mem::take(&mut self.messages)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl OutputWriter for BufferedWriter {
    fn prepare_write(&mut self, _last_write: bool) {
        self.pending = true;
    }

    fn write(&mut self, data: &[u8], _last_write: bool) -> Result<()> {
        debug_assert!(self.pending, "write without prepare_write");
        self.pending = false;
        self.messages.push(Bytes::copy_from_slice(data));
        Ok(())
    }
}
