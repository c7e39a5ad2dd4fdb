use bytes::{Buf, Bytes};
use tracing::{debug, trace};

use crate::decoding::{Datum, Lsn, Oid, Xid};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationInfo {
    pub id: Oid,
    pub schema: String,
    pub table: String,
    pub columns: Vec<ColumnInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub type_id: Oid,
    pub is_key: bool,
}

/// A logical replication message relevant to the JSON plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PgOutputMessage {
    Begin { xid: Xid, final_lsn: Lsn },
    Commit { commit_lsn: Lsn, end_lsn: Lsn },
    Relation(RelationInfo),
    Insert { rel_id: Oid, new: Vec<Datum> },
    Update { rel_id: Oid, old: Option<Vec<Datum>>, new: Vec<Datum> },
    Delete { rel_id: Oid, old: Option<Vec<Datum>> },
}

/// Parses XLogData-wrapped pgoutput messages.
#[derive(Debug, Default)]
pub struct PgOutputDecoder {
    current_lsn: Option<Lsn>,
    current_xid: Option<Xid>,
}

impl PgOutputDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// End LSN of the last XLogData frame seen.
    pub fn current_lsn(&self) -> Option<Lsn> {
        self.current_lsn
    }

    /// Transaction of the last BEGIN seen, cleared at COMMIT.
    pub fn current_xid(&self) -> Option<Xid> {
        self.current_xid
    }

    pub fn decode(&mut self, data: &[u8]) -> Result<Option<PgOutputMessage>> {
        if data.is_empty() {
            return Ok(None);
        }

        // Only XLogData ('w') carries pgoutput messages; keepalives are skipped.
        if data[0] != b'w' {
            return Ok(None);
        }

        let mut cursor = &data[1..];
        ensure(&cursor, 24, "XLogData header")?;

        let _start_lsn = cursor.get_u64();
        let end_lsn = cursor.get_u64();
        let _timestamp = cursor.get_i64();

        self.current_lsn = Some(Lsn(end_lsn));

        if cursor.is_empty() {
            return Ok(None);
        }

        let msg_type = cursor.get_u8();

        match msg_type {
            b'B' => self.decode_begin(cursor),
            b'C' => self.decode_commit(cursor),
            b'R' => decode_relation(cursor),
            b'I' => decode_insert(cursor),
            b'U' => decode_update(cursor),
            b'D' => decode_delete(cursor),
            b'T' => {
                debug!("TRUNCATE received, not part of the JSON stream");
                Ok(None)
            }
            _ => {
                debug!("Unknown pgoutput message type: {}", msg_type as char);
                Ok(None)
            }
        }
    }

    fn decode_begin(&mut self, mut cursor: &[u8]) -> Result<Option<PgOutputMessage>> {
        ensure(&cursor, 20, "BEGIN message")?;

        let final_lsn = Lsn(cursor.get_u64());
        let _timestamp = cursor.get_i64();
        let xid = cursor.get_u32();

        self.current_xid = Some(xid);

        trace!("BEGIN: lsn={}, xid={}", final_lsn, xid);
        Ok(Some(PgOutputMessage::Begin { xid, final_lsn }))
    }

    fn decode_commit(&mut self, mut cursor: &[u8]) -> Result<Option<PgOutputMessage>> {
        ensure(&cursor, 25, "COMMIT message")?;

        let _flags = cursor.get_u8();
        let commit_lsn = Lsn(cursor.get_u64());
        let end_lsn = Lsn(cursor.get_u64());
        let _timestamp = cursor.get_i64();

        self.current_xid = None;

        trace!("COMMIT: lsn={}", end_lsn);
        Ok(Some(PgOutputMessage::Commit { commit_lsn, end_lsn }))
    }
}

fn ensure(cursor: &&[u8], len: usize, what: &str) -> Result<()> {
    if cursor.remaining() < len {
        return Err(Error::invalid_message(format!(
            "Truncated {}: need {} bytes, have {}",
            what,
            len,
            cursor.remaining()
        )));
    }
    Ok(())
}

fn read_cstring(cursor: &mut &[u8], what: &str) -> Result<String> {
    let end = cursor
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| Error::invalid_message(format!("Unterminated {}", what)))?;
    let value = String::from_utf8(cursor[..end].to_vec())
        .map_err(|e| Error::invalid_message(format!("Invalid UTF-8 in {}: {}", what, e)))?;
    cursor.advance(end + 1);
    Ok(value)
}

fn decode_relation(mut cursor: &[u8]) -> Result<Option<PgOutputMessage>> {
    ensure(&cursor, 4, "RELATION message")?;
    let rel_id = cursor.get_u32();
    let schema = read_cstring(&mut cursor, "namespace name")?;
    let table = read_cstring(&mut cursor, "relation name")?;

    ensure(&cursor, 3, "RELATION message")?;
    let _replica_identity = cursor.get_u8();
    let num_columns = cursor.get_u16();

    let mut columns = Vec::with_capacity(num_columns as usize);

    for _ in 0..num_columns {
        ensure(&cursor, 1, "column flags")?;
        let flags = cursor.get_u8();
        let name = read_cstring(&mut cursor, "column name")?;

        ensure(&cursor, 8, "column type")?;
        let type_id = cursor.get_u32();
        let _type_modifier = cursor.get_i32();

        columns.push(ColumnInfo {
            name,
            type_id,
            is_key: (flags & 1) != 0,
        });
    }

    debug!("RELATION: {}={}.{}", rel_id, schema, table);
    Ok(Some(PgOutputMessage::Relation(RelationInfo {
        id: rel_id,
        schema,
        table,
        columns,
    })))
}

fn decode_insert(mut cursor: &[u8]) -> Result<Option<PgOutputMessage>> {
    ensure(&cursor, 5, "INSERT message")?;

    let rel_id = cursor.get_u32();
    let tuple_type = cursor.get_u8();

    if tuple_type != b'N' {
        return Err(Error::invalid_message(format!(
            "Unexpected tuple type in INSERT: {}",
            tuple_type as char
        )));
    }

    let new = decode_tuple_data(&mut cursor)?;
    Ok(Some(PgOutputMessage::Insert { rel_id, new }))
}

fn decode_update(mut cursor: &[u8]) -> Result<Option<PgOutputMessage>> {
    ensure(&cursor, 5, "UPDATE message")?;

    let rel_id = cursor.get_u32();
    let mut tuple_type = cursor.get_u8();
    let mut old = None;

    if tuple_type == b'O' || tuple_type == b'K' {
        old = Some(decode_tuple_data(&mut cursor)?);
        ensure(&cursor, 1, "UPDATE new tuple")?;
        tuple_type = cursor.get_u8();
    }

    if tuple_type != b'N' {
        return Err(Error::invalid_message(format!(
            "Unexpected tuple type in UPDATE: {}",
            tuple_type as char
        )));
    }

    let new = decode_tuple_data(&mut cursor)?;
    Ok(Some(PgOutputMessage::Update { rel_id, old, new }))
}

fn decode_delete(mut cursor: &[u8]) -> Result<Option<PgOutputMessage>> {
    ensure(&cursor, 4, "DELETE message")?;

    let rel_id = cursor.get_u32();

    // A table with REPLICA IDENTITY NOTHING sends no old tuple.
    if cursor.is_empty() {
        return Ok(Some(PgOutputMessage::Delete { rel_id, old: None }));
    }

    let tuple_type = cursor.get_u8();
    if tuple_type != b'O' && tuple_type != b'K' {
        return Err(Error::invalid_message(format!(
            "Unexpected tuple type in DELETE: {}",
            tuple_type as char
        )));
    }

    let old = decode_tuple_data(&mut cursor)?;
    Ok(Some(PgOutputMessage::Delete {
        rel_id,
        old: Some(old),
    }))
}

fn decode_tuple_data(cursor: &mut &[u8]) -> Result<Vec<Datum>> {
    ensure(cursor, 2, "tuple data")?;
    let num_columns = cursor.get_u16();
    let mut values = Vec::with_capacity(num_columns as usize);

    for _ in 0..num_columns {
        ensure(cursor, 1, "column kind")?;
        let col_type = cursor.get_u8();

        match col_type {
            b'n' => values.push(Datum::Null),
            b'u' => values.push(Datum::UnchangedToast),
            b't' => {
                ensure(cursor, 4, "text value length")?;
                let len = cursor.get_u32() as usize;
                ensure(cursor, len, "text value")?;
                values.push(Datum::Inline(Bytes::copy_from_slice(&cursor[..len])));
                cursor.advance(len);
            }
            b'b' => {
                return Err(Error::invalid_message(
                    "Binary tuple values are not supported; use the text protocol",
                ));
            }
            _ => {
                return Err(Error::invalid_message(format!(
                    "Unknown column kind: {}",
                    col_type as char
                )));
            }
        }
    }

    Ok(values)
}
