#![allow(dead_code)]

use bytes::{Bytes, BytesMut};
use pg_decoding_json::decoding::{
    type_oids, Attribute, BufferedWriter, Catalog, DecodingContext, Oid, Relation, TupleDesc,
};
use pg_decoding_json::pgoutput::{MessageBuilder, TupleValue};
use pg_decoding_json::{Error, Result};
use std::collections::HashMap;

pub const ORDERS_OID: Oid = 16384;

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("pg_decoding_json=debug")
        .with_test_writer()
        .try_init()
        .ok();
}

/// In-memory host catalog: namespaces per relation, text type output and
/// an out-of-line store keyed by pointer bytes.
#[derive(Default)]
pub struct MemoryCatalog {
    pub namespaces: HashMap<Oid, String>,
    pub toast: HashMap<Vec<u8>, String>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        let mut catalog = Self::default();
        catalog.namespaces.insert(ORDERS_OID, "public".to_string());
        catalog
    }

    pub fn with_toast(mut self, pointer: &str, value: &str) -> Self {
        self.toast.insert(pointer.as_bytes().to_vec(), value.to_string());
        self
    }
}

impl Catalog for MemoryCatalog {
    fn namespace_name(&self, relid: Oid) -> Result<String> {
        self.namespaces
            .get(&relid)
            .cloned()
            .ok_or_else(|| Error::Catalog(format!("cache lookup failed for relation {}", relid)))
    }

    fn output_text(&self, type_oid: Oid, value: &[u8]) -> Result<String> {
        String::from_utf8(value.to_vec()).map_err(|e| Error::TypeOutput {
            type_oid,
            message: e.to_string(),
        })
    }

    fn detoast(&self, value: &[u8], into: &mut BytesMut) -> Result<()> {
        let full = self
            .toast
            .get(value)
            .ok_or_else(|| Error::Catalog("missing chunk for toast value".to_string()))?;
        into.extend_from_slice(full.as_bytes());
        Ok(())
    }
}

pub fn orders() -> Relation {
    Relation {
        oid: ORDERS_OID,
        name: "orders".to_string(),
        desc: TupleDesc::new(vec![
            Attribute::new("id", type_oids::INT4, 1),
            Attribute::new("note", type_oids::TEXT, 2),
        ]),
    }
}

pub fn context<'a>(catalog: &'a MemoryCatalog, writer: &'a mut BufferedWriter) -> DecodingContext<'a> {
    DecodingContext::new(catalog, writer)
}

/// Builder with `public.orders(id int4, note text, paid bool)` registered as relation 1.
pub fn orders_builder() -> MessageBuilder {
    MessageBuilder::new().add_relation(
        1,
        "public",
        "orders",
        vec![
            ("id", type_oids::INT4, true),
            ("note", type_oids::TEXT, false),
            ("paid", type_oids::BOOL, false),
        ],
    )
}

pub fn row(id: &str, note: Option<&str>, paid: &str) -> Vec<TupleValue> {
    vec![TupleValue::text(id), note.into(), TupleValue::text(paid)]
}

pub fn lines(output: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(output)
        .lines()
        .map(str::to_string)
        .collect()
}

pub fn frames(messages: Vec<Bytes>) -> Bytes {
    pg_decoding_json::pgoutput::encode_capture(messages)
}
