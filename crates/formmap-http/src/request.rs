//! The parameter sources of one request.
//!
//! [`RequestData`] carries the three maps the binder merges: query
//! parameters, posted form parameters, and the JSON body's top-level
//! members. It is built either directly from those maps or through
//! [`RequestDataBuilder`], which parses the body according to its
//! content type.

use formmap_core::{FormmapError, FormmapResult};

use crate::querydict::QueryDict;

/// The query, posted, and JSON parameters of a single request.
///
/// # Examples
///
/// ```
/// use formmap_http::RequestData;
///
/// let data = RequestData::builder()
///     .query_string("page=2")
///     .content_type("application/x-www-form-urlencoded")
///     .body(b"name=alice".to_vec())
///     .build()
///     .unwrap();
/// assert_eq!(data.query().get("page"), Some("2"));
/// assert_eq!(data.post().get("name"), Some("alice"));
/// assert!(data.json().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestData {
    query: QueryDict,
    post: QueryDict,
    json: serde_json::Map<String, serde_json::Value>,
}

impl RequestData {
    /// Creates request data from already-parsed sources.
    pub fn new(
        query: QueryDict,
        post: QueryDict,
        json: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self { query, post, json }
    }

    /// Returns a builder for parsing raw request parts.
    pub fn builder() -> RequestDataBuilder {
        RequestDataBuilder::default()
    }

    /// Query string parameters.
    pub const fn query(&self) -> &QueryDict {
        &self.query
    }

    /// Posted form parameters.
    pub const fn post(&self) -> &QueryDict {
        &self.post
    }

    /// Top-level members of the JSON body.
    pub const fn json(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.json
    }

    /// Returns `true` if no source holds any parameter.
    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && self.post.is_empty() && self.json.is_empty()
    }
}

/// Builder that parses raw request parts into [`RequestData`].
#[derive(Debug, Default)]
pub struct RequestDataBuilder {
    query_string: String,
    content_type: Option<String>,
    body: Vec<u8>,
}

impl RequestDataBuilder {
    /// Sets the query string (with or without leading `?`).
    #[must_use]
    pub fn query_string(mut self, qs: &str) -> Self {
        self.query_string = qs.to_string();
        self
    }

    /// Sets the content type of the body.
    #[must_use]
    pub fn content_type(mut self, ct: &str) -> Self {
        self.content_type = Some(ct.to_string());
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Parses the parts into [`RequestData`].
    ///
    /// An urlencoded body fills the posted parameters; a JSON body must be an
    /// object and fills the JSON parameters. Other content types contribute
    /// nothing beyond the query string.
    pub fn build(self) -> FormmapResult<RequestData> {
        let query = QueryDict::parse(&self.query_string);
        let content_type = self.content_type.as_deref().unwrap_or_default();

        let post = if content_type.starts_with("application/x-www-form-urlencoded") {
            QueryDict::parse(&String::from_utf8_lossy(&self.body))
        } else {
            QueryDict::new()
        };

        let json = if content_type.starts_with("application/json") && !self.body.is_empty() {
            match serde_json::from_slice::<serde_json::Value>(&self.body)? {
                serde_json::Value::Object(map) => map,
                other => {
                    return Err(FormmapError::SerializationError(format!(
                        "JSON body must be an object, got {}",
                        json_kind(&other)
                    )))
                }
            }
        } else {
            serde_json::Map::new()
        };

        tracing::trace!(
            query = query.len(),
            post = post.len(),
            json = json.len(),
            "parsed request data"
        );

        Ok(RequestData { query, post, json })
    }
}

const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        assert!(RequestData::default().is_empty());
    }

    #[test]
    fn test_build_query_only() {
        let data = RequestData::builder().query_string("?a=1&b=2").build().unwrap();
        assert_eq!(data.query().get("a"), Some("1"));
        assert!(data.post().is_empty());
        assert!(!data.is_empty());
    }

    #[test]
    fn test_build_form_body_with_charset() {
        let data = RequestData::builder()
            .content_type("application/x-www-form-urlencoded; charset=utf-8")
            .body(b"user=bob&pass=x+y".to_vec())
            .build()
            .unwrap();
        assert_eq!(data.post().get("pass"), Some("x y"));
    }

    #[test]
    fn test_build_json_body_keeps_order() {
        let data = RequestData::builder()
            .content_type("application/json")
            .body(br#"{"z": 1, "a": "two", "m": [3]}"#.to_vec())
            .build()
            .unwrap();
        let keys: Vec<&String> = data.json().keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
        assert!(data.post().is_empty());
    }

    #[test]
    fn test_build_json_body_not_object() {
        let result = RequestData::builder()
            .content_type("application/json")
            .body(b"[1, 2]".to_vec())
            .build();
        assert!(matches!(result, Err(FormmapError::SerializationError(_))));
    }

    #[test]
    fn test_build_json_body_malformed() {
        let result = RequestData::builder()
            .content_type("application/json")
            .body(b"{".to_vec())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_content_type_ignored() {
        let data = RequestData::builder()
            .content_type("text/plain")
            .body(b"a=1".to_vec())
            .build()
            .unwrap();
        assert!(data.is_empty());
    }
}
