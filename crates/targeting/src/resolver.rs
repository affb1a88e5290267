//! Audience variant selection and component resolution.
//!
//! Resolution happens in two steps: `match_variant` turns request
//! attributes into a variant (first variant whose rules all pass), then
//! `components_for_audience` picks the component list for that variant
//! name, falling back to the page defaults.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use storefront_core::{ComponentDescriptor, PageDocument};
use tracing::{debug, warn};

use crate::error::TargetingResult;
use crate::request::RequestAttributes;
use crate::rules::TargetingRule;

/// An alternate set of page components for visitors matching its rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "C: Deserialize<'de>"))]
pub struct AudienceVariant<C = ComponentDescriptor> {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "targetingRules")]
    pub targeting_rules: Vec<TargetingRule>,
    #[serde(default)]
    pub components: Vec<C>,
}

impl<C> AudienceVariant<C> {
    /// All rules must pass. A variant without rules never matches.
    pub fn matches(&self, attrs: &RequestAttributes) -> bool {
        !self.targeting_rules.is_empty() && self.targeting_rules.iter().all(|r| r.matches(attrs))
    }
}

/// Targeting block of a page document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "C: Deserialize<'de>"))]
pub struct AudienceTargeting<C = ComponentDescriptor> {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub variants: Vec<AudienceVariant<C>>,
}

impl<C> Default for AudienceTargeting<C> {
    fn default() -> Self {
        Self {
            enabled: false,
            variants: Vec::new(),
        }
    }
}

impl<C: DeserializeOwned> AudienceTargeting<C> {
    pub fn from_value(value: serde_json::Value) -> TargetingResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Parse a targeting block, treating anything malformed as "not configured".
    pub fn from_value_lenient(value: &serde_json::Value) -> Option<Self> {
        if value.is_null() {
            return None;
        }
        match Self::from_value(value.clone()) {
            Ok(targeting) => Some(targeting),
            Err(e) => {
                warn!(error = %e, "Ignoring malformed audience targeting config");
                None
            }
        }
    }
}

/// Pick the component list to render.
///
/// Returns `default_components` itself when targeting is absent or
/// disabled, when no variant name is given, when no variant has that name,
/// or when the named variant has no components.
pub fn components_for_audience<'a, C>(
    targeting: Option<&'a AudienceTargeting<C>>,
    default_components: &'a [C],
    matching_variant: Option<&str>,
) -> &'a [C] {
    let Some(targeting) = targeting.filter(|t| t.enabled) else {
        return default_components;
    };
    let Some(name) = matching_variant.filter(|n| !n.is_empty()) else {
        return default_components;
    };

    match targeting.variants.iter().find(|v| v.name == name) {
        Some(variant) if !variant.components.is_empty() => &variant.components,
        _ => default_components,
    }
}

/// First variant, in list order, whose rules all pass.
pub fn match_variant<'a, C>(
    targeting: Option<&'a AudienceTargeting<C>>,
    attrs: &RequestAttributes,
) -> Option<&'a AudienceVariant<C>> {
    targeting
        .filter(|t| t.enabled)?
        .variants
        .iter()
        .find(|v| v.matches(attrs))
}

/// Result of resolving a page against one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution<'a, C> {
    /// Name of the matched variant, if any.
    pub variant: Option<&'a str>,
    pub components: &'a [C],
    /// `false` when the defaults are rendered, even if a variant matched.
    pub personalized: bool,
}

pub fn resolve<'a, C>(
    targeting: Option<&'a AudienceTargeting<C>>,
    default_components: &'a [C],
    attrs: &RequestAttributes,
) -> Resolution<'a, C> {
    let variant = match_variant(targeting, attrs).map(|v| v.name.as_str());
    let components = components_for_audience(targeting, default_components, variant);
    Resolution {
        variant,
        components,
        personalized: !std::ptr::eq(components, default_components),
    }
}

/// Resolved, owned page content ready to hand to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResolution {
    pub slug: String,
    pub variant: Option<String>,
    pub personalized: bool,
    pub components: Vec<ComponentDescriptor>,
}

/// Applies audience targeting to page documents, honouring the site-wide switch.
#[derive(Debug, Clone)]
pub struct AudienceResolver {
    site_enabled: bool,
}

impl AudienceResolver {
    pub fn new(site_enabled: bool) -> Self {
        Self { site_enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.site_enabled
    }

    pub fn resolve_page(&self, page: &PageDocument, attrs: &RequestAttributes) -> PageResolution {
        let targeting = if self.site_enabled {
            page.audience_targeting
                .as_ref()
                .and_then(AudienceTargeting::<ComponentDescriptor>::from_value_lenient)
        } else {
            None
        };

        let resolution = resolve(targeting.as_ref(), &page.components, attrs);
        debug!(
            slug = %page.slug,
            variant = resolution.variant.unwrap_or("none"),
            personalized = resolution.personalized,
            "Resolved page components"
        );

        PageResolution {
            slug: page.slug.clone(),
            variant: resolution.variant.map(str::to_string),
            personalized: resolution.personalized,
            components: resolution.components.to_vec(),
        }
    }
}

impl Default for AudienceResolver {
    fn default() -> Self {
        Self::new(true)
    }
}
