//! Identifier quoting following PostgreSQL's `quote_identifier` rules.

use std::borrow::Cow;

/// Keywords that cannot appear as bare identifiers: the reserved,
/// column-name and type/function-name categories. Sorted for binary search.
const NON_UNRESERVED_KEYWORDS: &[&str] = &[
    "all",
    "analyse",
    "analyze",
    "and",
    "any",
    "array",
    "as",
    "asc",
    "asymmetric",
    "authorization",
    "between",
    "bigint",
    "binary",
    "bit",
    "boolean",
    "both",
    "case",
    "cast",
    "char",
    "character",
    "check",
    "coalesce",
    "collate",
    "collation",
    "column",
    "concurrently",
    "constraint",
    "create",
    "cross",
    "current_catalog",
    "current_date",
    "current_role",
    "current_schema",
    "current_time",
    "current_timestamp",
    "current_user",
    "dec",
    "decimal",
    "default",
    "deferrable",
    "desc",
    "distinct",
    "do",
    "else",
    "end",
    "except",
    "exists",
    "extract",
    "false",
    "fetch",
    "float",
    "for",
    "foreign",
    "freeze",
    "from",
    "full",
    "grant",
    "greatest",
    "group",
    "grouping",
    "having",
    "ilike",
    "in",
    "initially",
    "inner",
    "inout",
    "int",
    "integer",
    "intersect",
    "interval",
    "into",
    "is",
    "isnull",
    "join",
    "json",
    "json_array",
    "json_arrayagg",
    "json_exists",
    "json_object",
    "json_objectagg",
    "json_query",
    "json_scalar",
    "json_serialize",
    "json_table",
    "json_value",
    "lateral",
    "leading",
    "least",
    "left",
    "like",
    "limit",
    "localtime",
    "localtimestamp",
    "merge_action",
    "national",
    "natural",
    "nchar",
    "none",
    "normalize",
    "not",
    "notnull",
    "null",
    "nullif",
    "numeric",
    "offset",
    "on",
    "only",
    "or",
    "order",
    "out",
    "outer",
    "overlaps",
    "overlay",
    "placing",
    "position",
    "precision",
    "primary",
    "real",
    "references",
    "returning",
    "right",
    "row",
    "select",
    "session_user",
    "setof",
    "similar",
    "smallint",
    "some",
    "substring",
    "symmetric",
    "system_user",
    "table",
    "tablesample",
    "then",
    "time",
    "timestamp",
    "to",
    "trailing",
    "treat",
    "trim",
    "true",
    "union",
    "unique",
    "user",
    "using",
    "values",
    "varchar",
    "variadic",
    "verbose",
    "when",
    "where",
    "window",
    "with",
    "xmlattributes",
    "xmlconcat",
    "xmlelement",
    "xmlexists",
    "xmlforest",
    "xmlnamespaces",
    "xmlparse",
    "xmlpi",
    "xmlroot",
    "xmlserialize",
    "xmltable",
];

fn is_keyword(ident: &str) -> bool {
    NON_UNRESERVED_KEYWORDS.binary_search(&ident).is_ok()
}

fn is_safe_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    let starts_ok = matches!(chars.next(), Some('a'..='z' | '_'));
    starts_ok
        && chars.all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_'))
        && !is_keyword(ident)
}

/// Quotes `ident` only when it would not survive re-parsing as a bare name.
pub fn quote_identifier(ident: &str, quote_all: bool) -> Cow<'_, str> {
    if !quote_all && is_safe_identifier(ident) {
        return Cow::Borrowed(ident);
    }

    let mut quoted = String::with_capacity(ident.len() + 2);
    quoted.push('"');
    for ch in ident.chars() {
        if ch == '"' {
            quoted.push('"');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    Cow::Owned(quoted)
}

/// `namespace.name`, each part quoted as needed.
pub fn quote_qualified_identifier(namespace: &str, name: &str, quote_all: bool) -> String {
    format!(
        "{}.{}",
        quote_identifier(namespace, quote_all),
        quote_identifier(name, quote_all)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_table_is_sorted() {
        assert!(NON_UNRESERVED_KEYWORDS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_plain_identifiers_stay_bare() {
        assert_eq!(quote_identifier("orders", false), "orders");
        assert_eq!(quote_identifier("_tmp1", false), "_tmp1");
        assert_eq!(quote_identifier("order_items_2024", false), "order_items_2024");
    }

    #[test]
    fn test_identifiers_needing_quotes() {
        assert_eq!(quote_identifier("Public", false), "\"Public\"");
        assert_eq!(quote_identifier("Order Table", false), "\"Order Table\"");
        assert_eq!(quote_identifier("1st", false), "\"1st\"");
        assert_eq!(quote_identifier("a-b", false), "\"a-b\"");
        assert_eq!(quote_identifier("", false), "\"\"");
        assert_eq!(quote_identifier("café", false), "\"café\"");
        assert_eq!(quote_identifier("say\"what", false), "\"say\"\"what\"");
    }

    #[test]
    fn test_keywords() {
        assert_eq!(quote_identifier("user", false), "\"user\"");
        assert_eq!(quote_identifier("table", false), "\"table\"");
        assert_eq!(quote_identifier("between", false), "\"between\"");
        assert_eq!(quote_identifier("left", false), "\"left\"");
        // Unreserved keywords may stay bare.
        assert_eq!(quote_identifier("name", false), "name");
        assert_eq!(quote_identifier("data", false), "data");
    }

    #[test]
    fn test_quote_all() {
        assert_eq!(quote_identifier("orders", true), "\"orders\"");
    }

    #[test]
    fn test_qualified() {
        assert_eq!(quote_qualified_identifier("public", "orders", false), "public.orders");
        assert_eq!(
            quote_qualified_identifier("Public", "Order Table", false),
            "\"Public\".\"Order Table\""
        );
        assert_eq!(quote_qualified_identifier("public", "user", false), "public.\"user\"");
    }
}
