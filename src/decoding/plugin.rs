//! Output plugin callbacks invoked by the host's replication machinery.

use tracing::{debug, trace};

use super::framer::{write_begin, write_commit};
use super::host::{Catalog, OutputWriter};
use super::row::write_row_change;
use super::session::DecodingState;
use super::types::{Lsn, Relation, ReorderBufferTxn, RowChange};
use crate::config::PluginOptions;
use crate::{Error, Result};

/// Output format announced to the host at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    Textual,
}

/// Host services available to a callback.
pub struct DecodingContext<'a> {
    pub catalog: &'a dyn Catalog,
    pub writer: &'a mut dyn OutputWriter,
}

impl<'a> DecodingContext<'a> {
    pub fn new(catalog: &'a dyn Catalog, writer: &'a mut dyn OutputWriter) -> Self {
        Self { catalog, writer }
    }

    fn emit(&mut self, data: &str) -> Result<()> {
        self.writer.prepare_write(true);
        self.writer.write(data.as_bytes(), true)
    }
}

/// Callback surface of a logical decoding output plugin.
pub trait OutputPlugin {
    /// Allocates per-stream state.
    fn startup(&mut self, options: PluginOptions) -> OutputType;

    /// Releases per-stream state.
    fn shutdown(&mut self);

    fn begin_txn(&mut self, ctx: &mut DecodingContext<'_>, txn: &ReorderBufferTxn) -> Result<()>;

    fn commit_txn(
        &mut self,
        ctx: &mut DecodingContext<'_>,
        txn: &ReorderBufferTxn,
        commit_lsn: Lsn,
    ) -> Result<()>;

    fn change(
        &mut self,
        ctx: &mut DecodingContext<'_>,
        txn: &ReorderBufferTxn,
        relation: &Relation,
        change: &RowChange,
    ) -> Result<()>;
}

/// Emits one JSON object per transaction boundary and per row change.
#[derive(Debug, Default)]
pub struct JsonDecodingPlugin {
    state: Option<DecodingState>,
}

impl JsonDecodingPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Option<&DecodingState> {
        self.state.as_ref()
    }

    fn state_mut(&mut self) -> Result<&mut DecodingState> {
        self.state.as_mut().ok_or(Error::NotStarted)
    }
}

impl OutputPlugin for JsonDecodingPlugin {
    fn startup(&mut self, options: PluginOptions) -> OutputType {
        debug!(?options, "Starting JSON decoding stream");
        self.state = Some(DecodingState::new(options));
        OutputType::Textual
    }

    fn shutdown(&mut self) {
        if self.state.take().is_some() {
            debug!("JSON decoding stream shut down");
        }
    }

    fn begin_txn(&mut self, ctx: &mut DecodingContext<'_>, txn: &ReorderBufferTxn) -> Result<()> {
        let state = self.state_mut()?;
        state.xact_wrote_changes = false;

        let mut scratch = state.scratch();
        write_begin(&mut scratch.out, txn.xid)?;
        ctx.emit(&scratch.out)?;

        trace!(xid = txn.xid, final_lsn = %txn.final_lsn, "BEGIN");
        Ok(())
    }

    fn commit_txn(
        &mut self,
        ctx: &mut DecodingContext<'_>,
        txn: &ReorderBufferTxn,
        commit_lsn: Lsn,
    ) -> Result<()> {
        let state = self.state_mut()?;
        let wrote_changes = state.xact_wrote_changes;

        let mut scratch = state.scratch();
        write_commit(&mut scratch.out, txn.xid)?;
        ctx.emit(&scratch.out)?;

        trace!(xid = txn.xid, %commit_lsn, wrote_changes, "COMMIT");
        Ok(())
    }

    fn change(
        &mut self,
        ctx: &mut DecodingContext<'_>,
        txn: &ReorderBufferTxn,
        relation: &Relation,
        change: &RowChange,
    ) -> Result<()> {
        let state = self.state_mut()?;
        let options = state.options.clone();

        {
            let mut scratch = state.scratch();
            write_row_change(&mut scratch, ctx.catalog, relation, change, &options)?;
            ctx.emit(&scratch.out)?;
        }

        state.xact_wrote_changes = true;
        trace!(xid = txn.xid, relation = %relation.name, change = %change.kind(), "CHANGE");
        Ok(())
    }
}
