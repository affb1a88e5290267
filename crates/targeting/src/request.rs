//! Request attributes: the query parameters of the visitor's page request.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use url::Url;

/// The five standard UTM campaign tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtmTag {
    Source,
    Medium,
    Campaign,
    Term,
    Content,
}

impl UtmTag {
    pub const ALL: [UtmTag; 5] = [
        UtmTag::Source,
        UtmTag::Medium,
        UtmTag::Campaign,
        UtmTag::Term,
        UtmTag::Content,
    ];

    pub fn param_name(&self) -> &'static str {
        match self {
            UtmTag::Source => "utm_source",
            UtmTag::Medium => "utm_medium",
            UtmTag::Campaign => "utm_campaign",
            UtmTag::Term => "utm_term",
            UtmTag::Content => "utm_content",
        }
    }
}

/// Query parameters keyed by lowercase name. When a name repeats, the
/// first value wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestAttributes {
    params: HashMap<String, String>,
}

impl RequestAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string, with or without the leading `?`.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self::from_pairs(url::form_urlencoded::parse(query.as_bytes()))
    }

    pub fn from_url(url: &Url) -> Self {
        Self::from_pairs(url.query_pairs())
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = HashMap::new();
        for (key, value) in pairs {
            params
                .entry(key.as_ref().to_ascii_lowercase())
                .or_insert_with(|| value.into());
        }
        Self { params }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn utm(&self, tag: UtmTag) -> Option<&str> {
        self.get(tag.param_name())
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_query_decodes_values() {
        let attrs = RequestAttributes::from_query("?utm_source=news%20letter&promo=fall+sale");
        assert_eq!(attrs.utm(UtmTag::Source), Some("news letter"));
        assert_eq!(attrs.get("promo"), Some("fall sale"));
        assert_eq!(attrs.len(), 2);
    }

    #[test]
    fn test_first_value_wins() {
        let attrs = RequestAttributes::from_query("ref=a&ref=b");
        assert_eq!(attrs.get("ref"), Some("a"));
    }

    #[test]
    fn test_names_are_case_insensitive() {
        let attrs = RequestAttributes::from_query("UTM_Campaign=Holiday");
        assert_eq!(attrs.utm(UtmTag::Campaign), Some("Holiday"));
        assert_eq!(attrs.get("utm_CAMPAIGN"), Some("Holiday"));
    }

    #[test]
    fn test_from_url() {
        let url = Url::parse("https://example.com/offer?utm_medium=email&utm_term=sz3").unwrap();
        let attrs = RequestAttributes::from_url(&url);
        assert_eq!(attrs.utm(UtmTag::Medium), Some("email"));
        assert_eq!(attrs.utm(UtmTag::Term), Some("sz3"));
        assert!(attrs.utm(UtmTag::Content).is_none());
    }

    #[test]
    fn test_empty_query() {
        assert!(RequestAttributes::from_query("").is_empty());
        assert!(RequestAttributes::from_query("?").is_empty());
    }
}
