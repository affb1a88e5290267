//! Targeting rule types and evaluation logic.
//!
//! Matching is case-insensitive and ignores surrounding whitespace on both
//! the rule value and the request value.

use serde::{Deserialize, Serialize};

use crate::request::{RequestAttributes, UtmTag};

/// Which request attribute a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    /// A named query parameter; the rule must carry `parameter_name`.
    #[serde(alias = "queryParam")]
    QueryParam,
    #[serde(alias = "utmSource")]
    UtmSource,
    #[serde(alias = "utmMedium")]
    UtmMedium,
    #[serde(alias = "utmCampaign")]
    UtmCampaign,
    #[serde(alias = "utmTerm")]
    UtmTerm,
    #[serde(alias = "utmContent")]
    UtmContent,
}

impl ParameterType {
    pub fn utm_tag(&self) -> Option<UtmTag> {
        match self {
            ParameterType::QueryParam => None,
            ParameterType::UtmSource => Some(UtmTag::Source),
            ParameterType::UtmMedium => Some(UtmTag::Medium),
            ParameterType::UtmCampaign => Some(UtmTag::Campaign),
            ParameterType::UtmTerm => Some(UtmTag::Term),
            ParameterType::UtmContent => Some(UtmTag::Content),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Contains,
    #[serde(alias = "startsWith")]
    StartsWith,
}

impl MatchType {
    /// A blank expected value never matches.
    pub fn compare(&self, actual: &str, expected: &str) -> bool {
        let expected = expected.trim().to_lowercase();
        if expected.is_empty() {
            return false;
        }
        let actual = actual.trim().to_lowercase();
        match self {
            MatchType::Exact => actual == expected,
            MatchType::Contains => actual.contains(&expected),
            MatchType::StartsWith => actual.starts_with(&expected),
        }
    }
}

/// One predicate over the visitor's request attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetingRule {
    #[serde(alias = "parameterType")]
    pub parameter_type: ParameterType,
    #[serde(default, alias = "parameterName", skip_serializing_if = "Option::is_none")]
    pub parameter_name: Option<String>,
    pub value: String,
    #[serde(alias = "matchType")]
    pub match_type: MatchType,
}

impl TargetingRule {
    pub fn utm(tag: ParameterType, value: impl Into<String>, match_type: MatchType) -> Self {
        Self {
            parameter_type: tag,
            parameter_name: None,
            value: value.into(),
            match_type,
        }
    }

    pub fn query_param(
        name: impl Into<String>,
        value: impl Into<String>,
        match_type: MatchType,
    ) -> Self {
        Self {
            parameter_type: ParameterType::QueryParam,
            parameter_name: Some(name.into()),
            value: value.into(),
            match_type,
        }
    }

    /// The request value this rule inspects, if present.
    fn lookup<'a>(&self, attrs: &'a RequestAttributes) -> Option<&'a str> {
        match self.parameter_type.utm_tag() {
            Some(tag) => attrs.utm(tag),
            None => self
                .parameter_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .and_then(|name| attrs.get(name)),
        }
    }

    /// A missing attribute never matches.
    pub fn matches(&self, attrs: &RequestAttributes) -> bool {
        self.lookup(attrs)
            .map_or(false, |actual| self.match_type.compare(actual, &self.value))
    }
}
