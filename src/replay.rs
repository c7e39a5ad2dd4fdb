//! Drives the JSON plugin from a captured pgoutput stream.
//!
//! This module stands in for the transport: each object the plugin writes
//! is framed as one line on the sink.

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, info, trace};

use crate::checkpoint::{Checkpoint, CheckpointManager};
use crate::decoding::{
    BufferedWriter, DecodingContext, HeapTuple, JsonDecodingPlugin, Lsn, OutputPlugin,
    ReorderBufferTxn, RowChange,
};
use crate::pgoutput::{CaptureReader, PgOutputDecoder, PgOutputMessage, RelationCatalog};
use crate::{Config, Error, Result};

/// Counters reported at the end of a replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Frames read from the capture, including skipped ones
    pub frames: u64,
    /// Frames skipped because a checkpoint covered them
    pub skipped_frames: u64,
    /// Objects written to the sink in this run
    pub messages: u64,
    /// Transactions committed in this run
    pub transactions: u64,
}

#[derive(Debug, Default)]
struct Progress {
    resume_frame: u64,
    message_count: u64,
    // Frame and message count just after the most recent COMMIT; a
    // checkpoint never lands inside a transaction.
    last_commit_frame: u64,
    last_commit_message_count: u64,
    commits_since_checkpoint: u64,
    last_commit: Option<(u32, Lsn)>,
    summary: ReplaySummary,
}

/// What a dispatched message did to the transaction state.
enum Dispatched {
    Nothing,
    Committed { xid: u32, commit_lsn: Lsn },
}

pub struct Replayer {
    config: Config,
    plugin: JsonDecodingPlugin,
    decoder: PgOutputDecoder,
    catalog: RelationCatalog,
    writer: BufferedWriter,
    current_txn: Option<ReorderBufferTxn>,
    checkpoints: Option<CheckpointManager>,
}

impl Replayer {
    pub fn new(config: Config) -> Self {
        let checkpoints = config
            .replay
            .checkpoint_file
            .as_ref()
            .map(CheckpointManager::new);

        Self {
            config,
            plugin: JsonDecodingPlugin::new(),
            decoder: PgOutputDecoder::new(),
            catalog: RelationCatalog::new(),
            writer: BufferedWriter::new(),
            current_txn: None,
            checkpoints,
        }
    }

    /// Replays `capture`, writing one line per emitted object to `sink`.
    ///
    /// Objects emitted before a failure are flushed to the sink before the
    /// error is returned.
    pub async fn run<W>(&mut self, capture: Bytes, sink: W) -> Result<ReplaySummary>
    where
        W: AsyncWrite + Unpin,
    {
        let resume = match &self.checkpoints {
            Some(manager) => {
                debug!(path = %manager.path().display(), "Loading replay checkpoint");
                manager.load().await?
            }
            None => None,
        };
        let resume_frame = resume.as_ref().map_or(0, |c| c.frame);
        let message_count = resume.as_ref().map_or(0, |c| c.message_count);
        let mut progress = Progress {
            resume_frame,
            message_count,
            last_commit_frame: resume_frame,
            last_commit_message_count: message_count,
            ..Progress::default()
        };

        if progress.resume_frame > 0 {
            info!(resume_frame = progress.resume_frame, "Resuming replay from checkpoint");
        }

        let mut sink = BufWriter::with_capacity(self.config.replay.output_buffer_size, sink);
        let mut reader = CaptureReader::new(capture);

        self.plugin.startup(self.config.plugin.clone());
        let outcome = self.pump(&mut reader, &mut sink, &mut progress).await;
        sink.flush().await?;
        outcome?;

        if progress.commits_since_checkpoint > 0 {
            self.save_checkpoint(&progress).await?;
        }

        if let Some(txn) = self.current_txn.take() {
            debug!(
                xid = txn.xid,
                decoder_xid = ?self.decoder.current_xid(),
                resume_frame = progress.last_commit_frame,
                "Capture ended inside a transaction"
            );
        }
        self.plugin.shutdown();

        let summary = progress.summary;
        info!(
            frames = summary.frames,
            skipped = summary.skipped_frames,
            messages = summary.messages,
            transactions = summary.transactions,
            "Replay finished"
        );
        Ok(summary)
    }

    async fn pump<W>(
        &mut self,
        reader: &mut CaptureReader,
        sink: &mut BufWriter<W>,
        progress: &mut Progress,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while let Some(frame) = reader.next_frame()? {
            let index = CaptureReader::position(reader) - 1;
            let emit = index >= progress.resume_frame;
            progress.summary.frames += 1;
            if !emit {
                progress.summary.skipped_frames += 1;
            }

            let dispatched = match self.decoder.decode(&frame)? {
                Some(message) => self.dispatch(message, emit)?,
                None => Dispatched::Nothing,
            };
            trace!(frame = index, emit, lsn = ?self.decoder.current_lsn(), "Decoded frame");

            for line in self.writer.drain() {
                sink.write_all(&line).await?;
                sink.write_all(b"\n").await?;
                progress.summary.messages += 1;
                progress.message_count += 1;
            }

            if let Dispatched::Committed { xid, commit_lsn } = dispatched {
                progress.summary.transactions += 1;
                progress.commits_since_checkpoint += 1;
                progress.last_commit = Some((xid, commit_lsn));
                progress.last_commit_frame = CaptureReader::position(reader);
                progress.last_commit_message_count = progress.message_count;

                if progress.commits_since_checkpoint >= self.config.replay.checkpoint_interval_commits {
                    sink.flush().await?;
                    self.save_checkpoint(progress).await?;
                    progress.commits_since_checkpoint = 0;
                }
            }
        }

        Ok(())
    }

    fn dispatch(&mut self, message: PgOutputMessage, emit: bool) -> Result<Dispatched> {
        // Relation metadata is needed even for frames already emitted.
        if let PgOutputMessage::Relation(info) = message {
            self.catalog.apply(info);
            return Ok(Dispatched::Nothing);
        }

        if !emit {
            return Ok(Dispatched::Nothing);
        }

        let (rel_id, change) = match message {
            PgOutputMessage::Relation(_) => return Ok(Dispatched::Nothing),
            PgOutputMessage::Begin { xid, final_lsn } => {
                let txn = ReorderBufferTxn { xid, final_lsn };
                let mut ctx = DecodingContext::new(&self.catalog, &mut self.writer);
                self.plugin.begin_txn(&mut ctx, &txn)?;
                self.current_txn = Some(txn);
                return Ok(Dispatched::Nothing);
            }
            PgOutputMessage::Commit { commit_lsn, .. } => {
                let txn = self
                    .current_txn
                    .take()
                    .ok_or_else(|| Error::invalid_message("COMMIT without BEGIN"))?;
                let mut ctx = DecodingContext::new(&self.catalog, &mut self.writer);
                self.plugin.commit_txn(&mut ctx, &txn, commit_lsn)?;
                return Ok(Dispatched::Committed {
                    xid: txn.xid,
                    commit_lsn,
                });
            }
            PgOutputMessage::Insert { rel_id, new } => (
                rel_id,
                RowChange::Insert {
                    new: HeapTuple::new(new),
                },
            ),
            PgOutputMessage::Update { rel_id, old, new } => (
                rel_id,
                RowChange::Update {
                    old: old.map(HeapTuple::new),
                    new: HeapTuple::new(new),
                },
            ),
            PgOutputMessage::Delete { rel_id, old } => (
                rel_id,
                RowChange::Delete {
                    old: old.map(HeapTuple::new),
                },
            ),
        };

        let txn = self.current_txn.ok_or_else(|| {
            Error::invalid_message(format!("{} outside a transaction", change.kind()))
        })?;
        let relation = self.catalog.relation(rel_id)?;
        let mut ctx = DecodingContext::new(&self.catalog, &mut self.writer);
        self.plugin.change(&mut ctx, &txn, &relation, &change)?;
        Ok(Dispatched::Nothing)
    }

    async fn save_checkpoint(&self, progress: &Progress) -> Result<()> {
        let Some(manager) = &self.checkpoints else {
            return Ok(());
        };

        let (xid, lsn) = match progress.last_commit {
            Some((xid, lsn)) => (Some(xid), lsn.to_string()),
            None => (None, Lsn::default().to_string()),
        };
        manager
            .save(&Checkpoint::new(
                progress.last_commit_frame,
                xid,
                lsn,
                progress.last_commit_message_count,
            ))
            .await
    }
}
