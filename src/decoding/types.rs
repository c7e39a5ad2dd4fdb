//! Host-side data model handed to the output plugin callbacks.

use bytes::Bytes;
use std::fmt;

/// PostgreSQL object identifier (relations, types).
pub type Oid = u32;

/// Transaction identifier as assigned by the host.
pub type Xid = u32;

/// Write-ahead log position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Lsn(pub u64);

impl fmt::Display for Lsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}/{:X}", self.0 >> 32, self.0 & 0xFFFF_FFFF)
    }
}

impl From<u64> for Lsn {
    fn from(value: u64) -> Self {
        Lsn(value)
    }
}

/// Column definition from a relation's tuple descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub type_oid: Oid,
    /// Physical attribute number; negative for system columns.
    pub attnum: i16,
    pub is_dropped: bool,
}

impl Attribute {
    pub fn new(name: impl Into<String>, type_oid: Oid, attnum: i16) -> Self {
        Self {
            name: name.into(),
            type_oid,
            attnum,
            is_dropped: false,
        }
    }

    pub fn dropped(mut self) -> Self {
        self.is_dropped = true;
        self
    }

    /// Whether the column takes part in a row image.
    pub fn is_visible(&self) -> bool {
        !self.is_dropped && self.attnum >= 0
    }
}

/// Ordered column definitions of a relation, in physical order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TupleDesc {
    pub attrs: Vec<Attribute>,
}

impl TupleDesc {
    pub fn new(attrs: Vec<Attribute>) -> Self {
        Self { attrs }
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

/// A relation as seen by the change callback.
///
/// Only the relation's own name travels with it; the namespace name is
/// resolved through the [`Catalog`](super::Catalog) on every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub oid: Oid,
    pub name: String,
    pub desc: TupleDesc,
}

/// One stored column value in the host's representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datum {
    Null,
    /// Value stored inline in the tuple.
    Inline(Bytes),
    /// Out-of-line or compressed value the host can still materialize.
    Toasted(Bytes),
    /// Out-of-line value kept on disk and not carried with this change.
    UnchangedToast,
}

impl Datum {
    pub fn inline(value: impl Into<Bytes>) -> Self {
        Datum::Inline(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }
}

/// A row as stored: one datum per descriptor attribute, including dropped
/// and system columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeapTuple {
    pub values: Vec<Datum>,
}

impl HeapTuple {
    pub fn new(values: Vec<Datum>) -> Self {
        Self { values }
    }

    /// Value for the attribute at `index`; missing trailing values read as NULL.
    pub fn get(&self, index: usize) -> &Datum {
        self.values.get(index).unwrap_or(&Datum::Null)
    }
}

/// Kind of row change, as spelled in the emitted `change` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Insert => "INSERT",
            ChangeKind::Update => "UPDATE",
            ChangeKind::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row-level change delivered by the host.
///
/// The old image of an update is carried for completeness but never encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowChange {
    Insert { new: HeapTuple },
    Update { old: Option<HeapTuple>, new: HeapTuple },
    Delete { old: Option<HeapTuple> },
}

impl RowChange {
    pub fn kind(&self) -> ChangeKind {
        match self {
            RowChange::Insert { .. } => ChangeKind::Insert,
            RowChange::Update { .. } => ChangeKind::Update,
            RowChange::Delete { .. } => ChangeKind::Delete,
        }
    }

    /// The tuple whose columns end up in `data`, if any.
    pub fn encoded_tuple(&self) -> Option<&HeapTuple> {
        match self {
            RowChange::Insert { new } | RowChange::Update { new, .. } => Some(new),
            RowChange::Delete { old } => old.as_ref(),
        }
    }
}

/// Transaction handle passed to begin/commit callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderBufferTxn {
    pub xid: Xid,
    pub final_lsn: Lsn,
}

impl ReorderBufferTxn {
    pub fn new(xid: Xid) -> Self {
        Self {
            xid,
            final_lsn: Lsn::default(),
        }
    }
}
