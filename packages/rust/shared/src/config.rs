//! Application configuration for Vitrine.
//!
//! User config lives at `~/.vitrine/vitrine.toml`.
//! CLI flags override config file values, which override defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, VitrineError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "vitrine.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".vitrine";

// ---------------------------------------------------------------------------
// Config structs (matching vitrine.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Public site settings.
    #[serde(default)]
    pub site: SiteConfig,

    /// Content source settings.
    #[serde(default)]
    pub cms: CmsConfig,

    /// Image CDN settings.
    #[serde(default)]
    pub cdn: CdnConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Expertise catalogue location.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Legacy slug redirects.
    #[serde(default)]
    pub redirects: RedirectsConfig,
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Public origin of the website, used for every absolute URL in feeds.
    #[serde(default = "default_site_url")]
    pub base_url: String,

    /// Site / publication name (Open Graph `site_name`, Google News publication).
    #[serde(default = "default_site_name")]
    pub name: String,

    /// Content language (ISO 639-1).
    #[serde(default = "default_language")]
    pub language: String,

    /// Image used when a record has no featured media.
    #[serde(default = "default_placeholder_image")]
    pub placeholder_image: String,

    /// Posts per archive page.
    #[serde(default = "default_posts_per_page")]
    pub posts_per_page: u32,

    /// Static routes listed in the static sitemap.
    #[serde(default = "default_static_pages")]
    pub static_pages: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_site_url(),
            name: default_site_name(),
            language: default_language(),
            placeholder_image: default_placeholder_image(),
            posts_per_page: default_posts_per_page(),
            static_pages: default_static_pages(),
        }
    }
}

fn default_site_url() -> String {
    "https://www.example.com".into()
}
fn default_site_name() -> String {
    "Vitrine".into()
}
fn default_language() -> String {
    "fr".into()
}
fn default_placeholder_image() -> String {
    "/images/placeholder.jpg".into()
}
fn default_posts_per_page() -> u32 {
    9
}
fn default_static_pages() -> Vec<String> {
    [
        "/",
        "/about",
        "/contact",
        "/blog",
        "/expertise",
        "/portfolio",
        "/team",
        "/toolbox",
        "/levee",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// `[cms]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmsConfig {
    /// Origin of the WordPress instance.
    #[serde(default = "default_cms_url")]
    pub base_url: String,

    /// Path of the REST API root, relative to `base_url`.
    #[serde(default = "default_rest_path")]
    pub rest_path: String,

    /// Path of the GraphQL endpoint, relative to `base_url`.
    #[serde(default = "default_graphql_path")]
    pub graphql_path: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Name of the env var holding the CMS bearer token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            base_url: default_cms_url(),
            rest_path: default_rest_path(),
            graphql_path: default_graphql_path(),
            timeout_secs: default_timeout_secs(),
            token_env: default_token_env(),
        }
    }
}

fn default_cms_url() -> String {
    "https://cms.example.com".into()
}
fn default_rest_path() -> String {
    "/wp-json/wp/v2".into()
}
fn default_graphql_path() -> String {
    "/graphql".into()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_token_env() -> String {
    "VITRINE_CMS_TOKEN".into()
}

/// `[cdn]` section. Image rewriting is disabled while `base_url` is unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CdnConfig {
    /// CDN origin that mirrors `wp-content/uploads`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Width hint appended as `?w=` when no explicit width is requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_width: Option<u32>,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Directory receiving uploaded documents.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// libSQL database file for the document registry.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Upper bound on a multipart upload body.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            upload_dir: default_upload_dir(),
            database_path: default_database_path(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".into()
}
fn default_upload_dir() -> String {
    "var/uploads".into()
}
fn default_database_path() -> String {
    "var/vitrine.db".into()
}
fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

/// `[catalog]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON or TOML file describing expertise categories. Built-in catalogue when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// `[redirects]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedirectsConfig {
    /// Legacy author slug → canonical author slug.
    #[serde(default)]
    pub authors: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// CMS settings (runtime, resolved from config + environment)
// ---------------------------------------------------------------------------

/// Runtime CMS connection settings — resolved from config file + environment.
#[derive(Debug, Clone)]
pub struct CmsSettings {
    /// REST API root, always ending with `/`.
    pub rest_url: Url,
    /// GraphQL endpoint.
    pub graphql_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Optional bearer token.
    pub token: Option<String>,
}

impl CmsSettings {
    /// Resolve settings, reading the token from the configured env var if set.
    pub fn from_config(config: &CmsConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url).map_err(|e| {
            VitrineError::config(format!("invalid cms.base_url '{}': {e}", config.base_url))
        })?;

        let rest_path = format!("{}/", config.rest_path.trim_end_matches('/'));
        let rest_url = base
            .join(&rest_path)
            .map_err(|e| VitrineError::config(format!("invalid cms.rest_path: {e}")))?;
        let graphql_url = base
            .join(&config.graphql_path)
            .map_err(|e| VitrineError::config(format!("invalid cms.graphql_path: {e}")))?;

        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.is_empty());

        Ok(Self {
            rest_url,
            graphql_url,
            timeout: Duration::from_secs(config.timeout_secs),
            token,
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.vitrine/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| VitrineError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.vitrine/vitrine.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| VitrineError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| VitrineError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| VitrineError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| VitrineError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| VitrineError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("posts_per_page"));
        assert!(toml_str.contains("VITRINE_CMS_TOKEN"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.site.posts_per_page, 9);
        assert_eq!(parsed.cms.graphql_path, "/graphql");
        assert_eq!(parsed.site.static_pages.len(), 9);
    }

    #[test]
    fn config_with_redirects_and_cdn() {
        let toml_str = r#"
[site]
base_url = "https://www.agence.test"

[cdn]
base_url = "https://cdn.agence.test"
default_width = 1200

[redirects.authors]
jdupont = "jean-dupont"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.site.base_url, "https://www.agence.test");
        assert_eq!(config.site.language, "fr");
        assert_eq!(config.cdn.default_width, Some(1200));
        assert_eq!(
            config.redirects.authors.get("jdupont").map(String::as_str),
            Some("jean-dupont")
        );
    }

    #[test]
    fn cms_settings_from_config() {
        let mut cms = CmsConfig::default();
        cms.base_url = "https://cms.agence.test".into();
        cms.token_env = "VITRINE_TEST_NONEXISTENT_TOKEN_12345".into();

        let settings = CmsSettings::from_config(&cms).expect("resolve");
        assert_eq!(
            settings.rest_url.as_str(),
            "https://cms.agence.test/wp-json/wp/v2/"
        );
        assert_eq!(settings.graphql_url.as_str(), "https://cms.agence.test/graphql");
        assert_eq!(settings.timeout, Duration::from_secs(15));
        assert!(settings.token.is_none());
    }

    #[test]
    fn cms_settings_rejects_bad_url() {
        let mut cms = CmsConfig::default();
        cms.base_url = "not a url".into();
        let err = CmsSettings::from_config(&cms).unwrap_err();
        assert!(err.to_string().contains("invalid cms.base_url"));
    }
}
