//! Typed document-list queries
//!
//! The backend accepts each query as a JSON string passed in a repeated
//! `queries[]` URL parameter.

use serde_json::{json, Value};

/// Attribute holding a document's creation timestamp
pub const CREATED_AT: &str = "$createdAt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Equal { attribute: String, values: Vec<String> },
    Search { attribute: String, value: String },
    OrderDesc { attribute: String },
    Limit(usize),
    /// Resume a listing after the document with this id
    CursorAfter(String),
}

impl Query {
    pub fn equal(attribute: &str, value: &str) -> Self {
        Query::Equal {
            attribute: attribute.to_string(),
            values: vec![value.to_string()],
        }
    }

    pub fn search(attribute: &str, value: &str) -> Self {
        Query::Search {
            attribute: attribute.to_string(),
            value: value.to_string(),
        }
    }

    pub fn order_desc(attribute: &str) -> Self {
        Query::OrderDesc {
            attribute: attribute.to_string(),
        }
    }

    pub fn limit(limit: usize) -> Self {
        Query::Limit(limit)
    }

    pub fn cursor_after(document_id: &str) -> Self {
        Query::CursorAfter(document_id.to_string())
    }

    fn to_json(&self) -> Value {
        match self {
            Query::Equal { attribute, values } => json!({
                "method": "equal",
                "attribute": attribute,
                "values": values,
            }),
            Query::Search { attribute, value } => json!({
                "method": "search",
                "attribute": attribute,
                "values": [value],
            }),
            Query::OrderDesc { attribute } => json!({
                "method": "orderDesc",
                "attribute": attribute,
            }),
            Query::Limit(limit) => json!({
                "method": "limit",
                "values": [limit],
            }),
            Query::CursorAfter(id) => json!({
                "method": "cursorAfter",
                "values": [id],
            }),
        }
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(query: &Query) -> Value {
        serde_json::from_str(&query.to_string()).unwrap()
    }

    #[test]
    fn test_equal_query() {
        let q = parsed(&Query::equal("accountId", "acc1"));
        assert_eq!(q["method"], "equal");
        assert_eq!(q["attribute"], "accountId");
        assert_eq!(q["values"], json!(["acc1"]));
    }

    #[test]
    fn test_search_query() {
        let q = parsed(&Query::search("title", "sunset"));
        assert_eq!(q["method"], "search");
        assert_eq!(q["values"], json!(["sunset"]));
    }

    #[test]
    fn test_order_desc_has_no_values() {
        let q = parsed(&Query::order_desc(CREATED_AT));
        assert_eq!(q["attribute"], "$createdAt");
        assert!(q.get("values").is_none());
    }

    #[test]
    fn test_limit_query() {
        let q = parsed(&Query::limit(7));
        assert_eq!(q["method"], "limit");
        assert_eq!(q["values"], json!([7]));
    }

    #[test]
    fn test_cursor_after_query() {
        let q = parsed(&Query::cursor_after("doc42"));
        assert_eq!(q["method"], "cursorAfter");
        assert_eq!(q["values"], json!(["doc42"]));
    }
}
