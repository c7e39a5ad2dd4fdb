//! Row change envelopes.

use tracing::trace;

use super::host::Catalog;
use super::ident::quote_qualified_identifier;
use super::literal::{TypeCategory, TypedValue};
use super::session::Arena;
use super::types::{ChangeKind, Datum, HeapTuple, Relation, RowChange};
use crate::config::PluginOptions;
use crate::Result;

/// Appends the complete `{"type":"table",...}` object for `change` to `arena.out`.
///
/// Values that need materializing are detoasted into `arena.detoasted`.
pub fn write_row_change(
    arena: &mut Arena,
    catalog: &dyn Catalog,
    relation: &Relation,
    change: &RowChange,
    options: &PluginOptions,
) -> Result<()> {
    let namespace = catalog.namespace_name(relation.oid)?;
    let kind = change.kind();

    arena.out.push_str("{\"type\":\"table\",\"name\":\"");
    arena.out.push_str(&quote_qualified_identifier(
        &namespace,
        &relation.name,
        options.quote_all_identifiers,
    ));
    arena.out.push_str("\",\"change\":\"");
    arena.out.push_str(kind.as_str());
    arena.out.push('"');

    if let Some(tuple) = change.encoded_tuple() {
        arena.out.push_str(",\"data\":{");
        write_tuple(arena, catalog, relation, tuple, kind == ChangeKind::Delete)?;
        arena.out.push('}');
    }
    arena.out.push('}');

    trace!(
        relation = %relation.name,
        change = %kind,
        bytes = arena.out.len(),
        "Encoded row change"
    );
    Ok(())
}

/// Appends `"column":literal` pairs in descriptor order.
fn write_tuple(
    arena: &mut Arena,
    catalog: &dyn Catalog,
    relation: &Relation,
    tuple: &HeapTuple,
    skip_nulls: bool,
) -> Result<()> {
    let mut first = true;

    for (index, attr) in relation.desc.attrs.iter().enumerate() {
        if !attr.is_visible() {
            continue;
        }

        let datum = tuple.get(index);
        if skip_nulls && datum.is_null() {
            continue;
        }

        if !first {
            arena.out.push(',');
        }
        first = false;

        arena.out.push('"');
        arena.out.push_str(&attr.name);
        arena.out.push_str("\":");

        let category = TypeCategory::for_oid(attr.type_oid);
        match datum {
            Datum::Null => TypedValue::Null.write_to(&mut arena.out),
            Datum::UnchangedToast => TypedValue::UnresolvedExternal.write_to(&mut arena.out),
            Datum::Inline(value) => {
                let text = catalog.output_text(attr.type_oid, value)?;
                TypedValue::Literal(category, &text).write_to(&mut arena.out);
            }
            Datum::Toasted(pointer) => {
                arena.detoasted.clear();
                catalog.detoast(pointer, &mut arena.detoasted)?;
                let text = catalog.output_text(attr.type_oid, &arena.detoasted)?;
                TypedValue::Literal(category, &text).write_to(&mut arena.out);
            }
        }
    }

    Ok(())
}
