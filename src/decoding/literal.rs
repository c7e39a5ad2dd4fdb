//! Literal formatting for column values.
//!
//! Each column's text representation is rendered according to a small set
//! of type categories. The generic text rule doubles embedded double quotes
//! (SQL style) and leaves backslashes and control characters untouched, so
//! its output is not strict JSON when those characters occur. Consumers of
//! the stream already rely on that form.

use tracing::warn;

use super::types::Oid;

/// Marker emitted for out-of-line values that were not carried with a change.
pub const UNCHANGED_TOAST_DATUM: &str = "\"???unchanged-toast-datum???\"";

/// Built-in PostgreSQL type OIDs that select a literal rule.
pub mod type_oids {
    use super::Oid;

    pub const BOOL: Oid = 16;
    pub const INT8: Oid = 20;
    pub const INT2: Oid = 21;
    pub const INT4: Oid = 23;
    pub const TEXT: Oid = 25;
    pub const OID: Oid = 26;
    pub const JSON: Oid = 114;
    pub const FLOAT4: Oid = 700;
    pub const FLOAT8: Oid = 701;
    pub const VARCHAR: Oid = 1043;
    pub const TIMESTAMPTZ: Oid = 1184;
    pub const BIT: Oid = 1560;
    pub const VARBIT: Oid = 1562;
    pub const NUMERIC: Oid = 1700;
    pub const UUID: Oid = 2950;
    pub const JSONB: Oid = 3802;
    pub const INT4_ARRAY: Oid = 1007;
    pub const TEXT_ARRAY: Oid = 1009;
}

/// Formatting rule selected by a column's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    /// Integers, floats, numeric and oid: emitted verbatim.
    Numeric,
    /// `bit` / `varbit`: emitted as `"B'<bits>'"`.
    BitString,
    /// `bool`: `t` / `f` mapped to `true` / `false`.
    Boolean,
    /// Everything else, quoted with `"` doubling.
    Text,
}

impl TypeCategory {
    pub fn for_oid(type_oid: Oid) -> Self {
        use type_oids::*;

        match type_oid {
            INT2 | INT4 | INT8 | OID | FLOAT4 | FLOAT8 | NUMERIC => TypeCategory::Numeric,
            BIT | VARBIT => TypeCategory::BitString,
            BOOL => TypeCategory::Boolean,
            _ => TypeCategory::Text,
        }
    }

    /// Appends the literal for `raw` to `out`.
    pub fn write_literal(self, out: &mut String, raw: &str) {
        match self {
            TypeCategory::Numeric => out.push_str(raw),
            TypeCategory::BitString => {
                out.push_str("\"B'");
                out.push_str(raw);
                out.push_str("'\"");
            }
            TypeCategory::Boolean => {
                let value = match raw {
                    "t" => "true",
                    "f" => "false",
                    other => {
                        warn!(text = %other, "Unexpected boolean text, rendering as false");
                        "false"
                    }
                };
                out.push_str(value);
            }
            TypeCategory::Text => {
                out.reserve(raw.len() + 2);
                out.push('"');
                for ch in raw.chars() {
                    if ch == '"' {
                        out.push('"');
                    }
                    out.push(ch);
                }
                out.push('"');
            }
        }
    }
}

/// A column value ready for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypedValue<'a> {
    Null,
    /// Out-of-line value whose content is not available to this change.
    UnresolvedExternal,
    Literal(TypeCategory, &'a str),
}

impl TypedValue<'_> {
    pub fn write_to(&self, out: &mut String) {
        match self {
            TypedValue::Null => out.push_str("null"),
            TypedValue::UnresolvedExternal => out.push_str(UNCHANGED_TOAST_DATUM),
            TypedValue::Literal(category, raw) => category.write_literal(out, raw),
        }
    }
}

/// Renders a single literal into a fresh string.
pub fn format_literal(category: TypeCategory, raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    category.write_literal(&mut out, raw);
    out
}
