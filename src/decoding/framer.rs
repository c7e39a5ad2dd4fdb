//! Transaction boundary markers.

use serde::Serialize;

use super::types::Xid;
use crate::Result;

pub const BEGIN_TYPE: &str = "transaction.begin";
pub const COMMIT_TYPE: &str = "transaction.commit";

#[derive(Debug, Serialize)]
struct TransactionMarker {
    #[serde(rename = "type")]
    kind: &'static str,
    xid: String,
}

fn write_marker(out: &mut String, kind: &'static str, xid: Xid) -> Result<()> {
    let marker = TransactionMarker {
        kind,
        xid: xid.to_string(),
    };
    out.push_str(&serde_json::to_string(&marker)?);
    Ok(())
}

/// Appends `{"type":"transaction.begin","xid":"<xid>"}`.
pub fn write_begin(out: &mut String, xid: Xid) -> Result<()> {
    write_marker(out, BEGIN_TYPE, xid)
}

/// Appends `{"type":"transaction.commit","xid":"<xid>"}`.
pub fn write_commit(out: &mut String, xid: Xid) -> Result<()> {
    write_marker(out, COMMIT_TYPE, xid)
}
