//! Content types shared between the targeting resolver and the API server.

use serde::{Deserialize, Serialize};

/// A renderable page section as delivered by the content store.
///
/// The engines never look inside a descriptor; `type` and `props` are handed
/// to the rendering front end as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub props: serde_json::Value,
}

impl ComponentDescriptor {
    pub fn new(component_type: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            key: None,
            props: serde_json::Value::Null,
        }
    }
}

/// A page document as stored in the content directory.
///
/// `audience_targeting` is kept as raw JSON so that a malformed targeting
/// block never prevents the page itself from loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageDocument {
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub components: Vec<ComponentDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience_targeting: Option<serde_json::Value>,
}
