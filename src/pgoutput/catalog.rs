use bytes::BytesMut;
use std::collections::HashMap;
use tracing::debug;

use super::decoder::RelationInfo;
use crate::decoding::{Attribute, Catalog, Oid, Relation, TupleDesc};
use crate::{Error, Result};

/// pgoutput sends an empty namespace for relations in `pg_catalog`.
const CATALOG_NAMESPACE: &str = "pg_catalog";

/// Catalog built from RELATION messages of a pgoutput stream.
///
/// Values arrive already converted by the server's type output functions,
/// so output is a UTF-8 check and detoasting is a copy.
#[derive(Debug, Default)]
pub struct RelationCatalog {
    relations: HashMap<Oid, RelationInfo>,
}

impl RelationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records (or replaces) the definition of a relation.
    pub fn apply(&mut self, relation: RelationInfo) {
        let key_columns: Vec<&str> = relation
            .columns
            .iter()
            .filter(|column| column.is_key)
            .map(|column| column.name.as_str())
            .collect();

        match self.relations.get(&relation.id) {
            Some(previous) if previous != &relation => debug!(
                rel_id = relation.id,
                ?key_columns,
                "Relation definition changed for {}.{}", relation.schema, relation.table
            ),
            Some(_) => {}
            None => debug!(
                rel_id = relation.id,
                ?key_columns,
                "Registered relation {}.{}", relation.schema, relation.table
            ),
        }
        self.relations.insert(relation.id, relation);
    }

    fn info(&self, rel_id: Oid) -> Result<&RelationInfo> {
        self.relations
            .get(&rel_id)
            .ok_or_else(|| Error::Catalog(format!("Unknown relation ID: {}", rel_id)))
    }

    /// Current definition of `rel_id` in the shape the change callback expects.
    pub fn relation(&self, rel_id: Oid) -> Result<Relation> {
        let info = self.info(rel_id)?;
        let attrs = info
            .columns
            .iter()
            .zip(1i16..)
            .map(|(column, attnum)| Attribute::new(column.name.clone(), column.type_id, attnum))
            .collect();

        Ok(Relation {
            oid: info.id,
            name: info.table.clone(),
            desc: TupleDesc::new(attrs),
        })
    }
}

impl Catalog for RelationCatalog {
    fn namespace_name(&self, relid: Oid) -> Result<String> {
        let info = self.info(relid)?;
        if info.schema.is_empty() {
            Ok(CATALOG_NAMESPACE.to_string())
        } else {
            Ok(info.schema.clone())
        }
    }

    fn output_text(&self, type_oid: Oid, value: &[u8]) -> Result<String> {
        String::from_utf8(value.to_vec()).map_err(|e| Error::TypeOutput {
            type_oid,
            message: e.to_string(),
        })
    }

    fn detoast(&self, value: &[u8], into: &mut BytesMut) -> Result<()> {
        into.extend_from_slice(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoding::type_oids;
    use crate::pgoutput::decoder::ColumnInfo;

    fn users(schema: &str) -> RelationInfo {
        RelationInfo {
            id: 1,
            schema: schema.to_string(),
            table: "users".to_string(),
            columns: vec![
                ColumnInfo {
                    name: "id".to_string(),
                    type_id: type_oids::INT4,
                    is_key: true,
                },
                ColumnInfo {
                    name: "name".to_string(),
                    type_id: type_oids::TEXT,
                    is_key: false,
                },
            ],
        }
    }

    #[test]
    fn test_relation_lookup() {
        let mut catalog = RelationCatalog::new();
        catalog.apply(users("public"));

        let relation = catalog.relation(1).unwrap();
        assert_eq!(relation.name, "users");
        assert_eq!(relation.desc.len(), 2);
        assert_eq!(relation.desc.attrs[1].attnum, 2);
        assert_eq!(catalog.namespace_name(1).unwrap(), "public");
    }

    #[test]
    fn test_empty_namespace_is_pg_catalog() {
        let mut catalog = RelationCatalog::new();
        catalog.apply(users(""));
        assert_eq!(catalog.namespace_name(1).unwrap(), "pg_catalog");
    }

    #[test]
    fn test_unknown_relation() {
        let catalog = RelationCatalog::new();
        assert!(matches!(catalog.relation(99), Err(Error::Catalog(_))));
        assert!(matches!(catalog.namespace_name(99), Err(Error::Catalog(_))));
    }

    #[test]
    fn test_redefinition_replaces_columns() {
        let mut catalog = RelationCatalog::new();
        catalog.apply(users("public"));

        let mut altered = users("app");
        altered.columns.pop();
        catalog.apply(altered);

        assert_eq!(catalog.relation(1).unwrap().desc.len(), 1);
        assert_eq!(catalog.namespace_name(1).unwrap(), "app");
    }

    #[test]
    fn test_invalid_utf8_is_a_type_output_error() {
        let catalog = RelationCatalog::new();
        let result = catalog.output_text(type_oids::TEXT, &[0xff, 0xfe]);
        assert!(matches!(result, Err(Error::TypeOutput { type_oid: 25, .. })));
    }
}
