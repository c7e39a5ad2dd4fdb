//! Builds pgoutput frames, for producing captures and for tests.

use bytes::{BufMut, Bytes, BytesMut};
use std::collections::HashMap;

use crate::decoding::{Oid, Xid};

/// A column value in a built tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TupleValue {
    Null,
    UnchangedToast,
    Text(String),
}

impl TupleValue {
    pub fn text(value: impl Into<String>) -> Self {
        TupleValue::Text(value.into())
    }
}

impl From<Option<&str>> for TupleValue {
    fn from(value: Option<&str>) -> Self {
        match value {
            Some(v) => TupleValue::Text(v.to_string()),
            None => TupleValue::Null,
        }
    }
}

#[derive(Debug, Clone)]
struct BuilderRelation {
    schema: String,
    table: String,
    columns: Vec<(String, Oid, bool)>,
}

/// Builds XLogData frames carrying pgoutput messages.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    lsn: u64,
    timestamp: i64,
    relations: HashMap<Oid, BuilderRelation>,
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self {
            lsn: 1000,
            timestamp: 750_000_000_000_000, // 2023-10-07 in microseconds since 2000-01-01
            relations: HashMap::new(),
        }
    }

    pub fn with_lsn(mut self, lsn: u64) -> Self {
        self.lsn = lsn;
        self
    }

    pub fn add_relation(mut self, id: Oid, schema: &str, table: &str, columns: Vec<(&str, Oid, bool)>) -> Self {
        let columns = columns
            .into_iter()
            .map(|(name, type_id, is_key)| (name.to_string(), type_id, is_key))
            .collect();

        self.relations.insert(
            id,
            BuilderRelation {
                schema: schema.to_string(),
                table: table.to_string(),
                columns,
            },
        );
        self
    }

    fn header(&self) -> BytesMut {
        let mut buf = BytesMut::new();
        buf.put_u8(b'w');
        buf.put_u64(self.lsn);
        buf.put_u64(self.lsn + 100);
        buf.put_i64(self.timestamp);
        buf
    }

    /// A primary keepalive frame, which carries no pgoutput message.
    pub fn keepalive_message(&self) -> Bytes {
        let mut buf = BytesMut::new();
        buf.put_u8(b'k');
        buf.put_u64(self.lsn);
        buf.put_i64(self.timestamp);
        buf.put_u8(0);
        buf.freeze()
    }

    pub fn begin_message(&self, xid: Xid) -> Bytes {
        let mut buf = self.header();
        buf.put_u8(b'B');
        buf.put_u64(self.lsn);
        buf.put_i64(self.timestamp);
        buf.put_u32(xid);
        buf.freeze()
    }

    pub fn commit_message(&self) -> Bytes {
        let mut buf = self.header();
        buf.put_u8(b'C');
        buf.put_u8(0);
        buf.put_u64(self.lsn);
        buf.put_u64(self.lsn + 100);
        buf.put_i64(self.timestamp);
        buf.freeze()
    }

    /// # Panics
    ///
    /// Panics if `rel_id` was not registered with [`add_relation`](Self::add_relation).
    pub fn relation_message(&self, rel_id: Oid) -> Bytes {
        let relation = self
            .relations
            .get(&rel_id)
            .expect("Relation not found. Use add_relation() first.");

        let mut buf = self.header();
        buf.put_u8(b'R');
        buf.put_u32(rel_id);
        put_cstring(&mut buf, &relation.schema);
        put_cstring(&mut buf, &relation.table);
        buf.put_u8(b'd'); // replica identity default
        buf.put_u16(relation.columns.len() as u16);

        for (name, type_id, is_key) in &relation.columns {
            buf.put_u8(u8::from(*is_key));
            put_cstring(&mut buf, name);
            buf.put_u32(*type_id);
            buf.put_i32(-1);
        }

        buf.freeze()
    }

    pub fn insert_message(&self, rel_id: Oid, values: Vec<TupleValue>) -> Bytes {
        let mut buf = self.header();
        buf.put_u8(b'I');
        buf.put_u32(rel_id);
        buf.put_u8(b'N');
        put_tuple(&mut buf, &values);
        buf.freeze()
    }

    pub fn update_message(&self, rel_id: Oid, old_values: Option<Vec<TupleValue>>, new_values: Vec<TupleValue>) -> Bytes {
        let mut buf = self.header();
        buf.put_u8(b'U');
        buf.put_u32(rel_id);

        if let Some(old) = old_values {
            buf.put_u8(b'O');
            put_tuple(&mut buf, &old);
        }

        buf.put_u8(b'N');
        put_tuple(&mut buf, &new_values);
        buf.freeze()
    }

    /// A DELETE; `None` builds the message sent under `REPLICA IDENTITY NOTHING`.
    pub fn delete_message(&self, rel_id: Oid, key_values: Option<Vec<TupleValue>>) -> Bytes {
        let mut buf = self.header();
        buf.put_u8(b'D');
        buf.put_u32(rel_id);

        if let Some(values) = key_values {
            buf.put_u8(b'K');
            put_tuple(&mut buf, &values);
        }

        buf.freeze()
    }

    pub fn truncate_message(&self, rel_ids: Vec<Oid>) -> Bytes {
        let mut buf = self.header();
        buf.put_u8(b'T');
        buf.put_u32(rel_ids.len() as u32);
        buf.put_u8(0);

        for rel_id in rel_ids {
            buf.put_u32(rel_id);
        }

        buf.freeze()
    }
}

fn put_cstring(buf: &mut BytesMut, value: &str) {
    buf.put_slice(value.as_bytes());
    buf.put_u8(0);
}

fn put_tuple(buf: &mut BytesMut, values: &[TupleValue]) {
    buf.put_u16(values.len() as u16);

    for value in values {
        match value {
            TupleValue::Null => buf.put_u8(b'n'),
            TupleValue::UnchangedToast => buf.put_u8(b'u'),
            TupleValue::Text(text) => {
                buf.put_u8(b't');
                buf.put_u32(text.len() as u32);
                buf.put_slice(text.as_bytes());
            }
        }
    }
}
