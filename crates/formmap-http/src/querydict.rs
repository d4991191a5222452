//! Query string dictionary for request parameters.
//!
//! [`QueryDict`] wraps [`MultiValueDict`](formmap_core::utils::MultiValueDict)
//! to hold the parameters of a query string or an urlencoded form body. Keys
//! keep the order in which they first appear on the wire.

use formmap_core::utils::MultiValueDict;

/// An ordered dictionary for query string and form data.
///
/// # Examples
///
/// ```
/// use formmap_http::QueryDict;
///
/// let qd = QueryDict::parse("color=red&color=blue&size=large");
/// assert_eq!(qd.get("color"), Some("blue"));
/// assert_eq!(qd.get_list("color"), Some(&vec!["red".to_string(), "blue".to_string()]));
/// assert_eq!(qd.keys().collect::<Vec<_>>(), vec!["color", "size"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryDict {
    data: MultiValueDict<String, String>,
}

impl QueryDict {
    /// Creates a new, empty `QueryDict`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a URL query string (e.g., `"key1=val1&key2=val2"`).
    ///
    /// Handles percent-encoding and `+` as space, and supports multiple
    /// values per key. A leading `?` is ignored.
    pub fn parse(query_string: &str) -> Self {
        let mut data = MultiValueDict::new();
        let query_string = query_string.strip_prefix('?').unwrap_or(query_string);

        for pair in query_string.split('&') {
            if pair.is_empty() {
                continue;
            }

            let (key, value) = pair
                .find('=')
                .map_or((pair, ""), |eq_pos| (&pair[..eq_pos], &pair[eq_pos + 1..]));

            data.append(percent_decode(key), percent_decode(value));
        }

        Self { data }
    }

    /// Builds a `QueryDict` from already-decoded key/value pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut data = MultiValueDict::new();
        for (key, value) in pairs {
            data.append(key.into(), value.into());
        }
        Self { data }
    }

    /// Returns the last value for the given key, or `None` if not present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(&key.to_string()).map(String::as_str)
    }

    /// Returns all values for the given key, or `None` if not present.
    pub fn get_list(&self, key: &str) -> Option<&Vec<String>> {
        self.data.get_list(&key.to_string())
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the `QueryDict` contains no keys.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if the specified key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(&key.to_string())
    }

    /// Returns an iterator over the keys, in wire order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Returns an iterator over `(key, last value)` pairs, in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.data.iter().filter_map(|(key, values)| {
            values.last().map(|value| (key.as_str(), value.as_str()))
        })
    }
}

/// Decodes a percent-encoded string.
fn percent_decode(input: &str) -> String {
    // Replace + with space (form encoding), then decode percent sequences
    let plus_decoded = input.replace('+', " ");
    percent_encoding::percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let qd = QueryDict::new();
        assert!(qd.is_empty());
        assert_eq!(qd.len(), 0);
    }

    #[test]
    fn test_parse_multiple_keys() {
        let qd = QueryDict::parse("a=1&b=2&c=3");
        assert_eq!(qd.get("a"), Some("1"));
        assert_eq!(qd.get("b"), Some("2"));
        assert_eq!(qd.get("c"), Some("3"));
        assert_eq!(qd.len(), 3);
    }

    #[test]
    fn test_parse_multiple_values() {
        let qd = QueryDict::parse("color=red&color=blue&color=green");
        assert_eq!(qd.get("color"), Some("green"));
        assert_eq!(qd.get_list("color").map(Vec::len), Some(3));
    }

    #[test]
    fn test_parse_empty_and_leading_question_mark() {
        assert!(QueryDict::parse("").is_empty());
        let qd = QueryDict::parse("?x=1");
        assert_eq!(qd.get("x"), Some("1"));
    }

    #[test]
    fn test_parse_percent_and_plus() {
        let qd = QueryDict::parse("name=John+Doe&city=New%20York&q=%E6%9D%B1%E4%BA%AC");
        assert_eq!(qd.get("name"), Some("John Doe"));
        assert_eq!(qd.get("city"), Some("New York"));
        assert_eq!(qd.get("q"), Some("東京"));
    }

    #[test]
    fn test_parse_key_without_value() {
        let qd = QueryDict::parse("flag&x=");
        assert_eq!(qd.get("flag"), Some(""));
        assert_eq!(qd.get("x"), Some(""));
    }

    #[test]
    fn test_iter_wire_order() {
        let qd = QueryDict::parse("b_x=5&a=1&b_y=9");
        let pairs: Vec<_> = qd.iter().collect();
        assert_eq!(pairs, vec![("b_x", "5"), ("a", "1"), ("b_y", "9")]);
    }

    #[test]
    fn test_from_pairs() {
        let qd = QueryDict::from_pairs([("x", "1"), ("y", "2"), ("x", "3")]);
        assert_eq!(qd.get("x"), Some("3"));
        assert!(qd.contains_key("y"));
        assert_eq!(qd.keys().collect::<Vec<_>>(), vec!["x", "y"]);
    }
}
