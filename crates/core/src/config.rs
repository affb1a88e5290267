use serde::Deserialize;

/// Root application configuration. Loaded from an optional
/// `config/storefront.toml` file, then environment variables with the
/// prefix `STOREFRONT__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_site_id")]
    pub site_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub quiz: QuizConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub targeting: TargetingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_site_id() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "storefront-0".to_string())
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_enabled() -> bool {
    true
}
fn default_metrics_port() -> u16 {
    9091
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            port: default_metrics_port(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            site_id: default_site_id(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            quiz: QuizConfig::default(),
            content: ContentConfig::default(),
            targeting: TargetingConfig::default(),
        }
    }
}

// ─── Quiz Config ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct QuizConfig {
    /// JSON catalog document. The built-in sizing quiz is used when unset.
    #[serde(default)]
    pub catalog_path: Option<String>,
    /// Screen address prefix; question `x` routes to `{route_prefix}/x`.
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,
    #[serde(default = "default_results_route")]
    pub results_route: String,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    #[serde(default = "default_eviction_interval_secs")]
    pub eviction_interval_secs: u64,
}

fn default_route_prefix() -> String { "/sizing-quiz".to_string() }
fn default_results_route() -> String { "/sizing-quiz/results".to_string() }
fn default_session_ttl_secs() -> u64 { 1800 }
fn default_max_sessions() -> usize { 100_000 }
fn default_eviction_interval_secs() -> u64 { 60 }

impl QuizConfig {
    /// Screen address for a question id.
    pub fn route_for(&self, question_id: &str) -> String {
        format!("{}/{}", self.route_prefix.trim_end_matches('/'), question_id)
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            route_prefix: default_route_prefix(),
            results_route: default_results_route(),
            session_ttl_secs: default_session_ttl_secs(),
            max_sessions: default_max_sessions(),
            eviction_interval_secs: default_eviction_interval_secs(),
        }
    }
}

// ─── Content Config ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    /// Directory holding one `<slug>.json` page document per page.
    #[serde(default = "default_pages_dir")]
    pub pages_dir: String,
}

fn default_pages_dir() -> String { "content/pages".to_string() }

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            pages_dir: default_pages_dir(),
        }
    }
}

// ─── Targeting Config ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct TargetingConfig {
    /// Site-wide switch. When off every page renders its default components.
    #[serde(default = "default_targeting_enabled")]
    pub enabled: bool,
}

fn default_targeting_enabled() -> bool { true }

impl Default for TargetingConfig {
    fn default() -> Self {
        Self {
            enabled: default_targeting_enabled(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the optional config file and environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/storefront").required(false))
            .add_source(
                config::Environment::with_prefix("STOREFRONT")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api.http_port, 8080);
        assert_eq!(config.quiz.route_prefix, "/sizing-quiz");
        assert!(config.quiz.catalog_path.is_none());
        assert!(config.targeting.enabled);
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "api": { "http_port": 3000 },
            "quiz": { "session_ttl_secs": 60 }
        }))
        .unwrap();
        assert_eq!(config.api.http_port, 3000);
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.quiz.session_ttl_secs, 60);
        assert_eq!(config.quiz.results_route, "/sizing-quiz/results");
        assert_eq!(config.content.pages_dir, "content/pages");
    }

    #[test]
    fn test_route_for() {
        let mut quiz = QuizConfig::default();
        assert_eq!(quiz.route_for("birthdate"), "/sizing-quiz/birthdate");
        quiz.route_prefix = "/quiz/".to_string();
        assert_eq!(quiz.route_for("name"), "/quiz/name");
    }
}
