//! Expertise catalogue loading.
//!
//! The catalogue is a JSON or TOML file (chosen by extension) holding a
//! `categories` list. Without a configured file the built-in catalogue is used.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use vitrine_shared::{Expertise, ExpertiseCategory, Result, VitrineError};

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    categories: Vec<ExpertiseCategory>,
}

/// Load the catalogue from `path`, or the built-in one when `path` is `None`.
pub fn load_catalog(path: Option<&Path>) -> Result<Vec<ExpertiseCategory>> {
    let Some(path) = path else {
        return Ok(default_catalog());
    };

    let content = std::fs::read_to_string(path).map_err(|e| VitrineError::io(path, e))?;
    let file: CatalogFile = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content).map_err(|e| {
            VitrineError::config(format!("invalid catalogue {}: {e}", path.display()))
        })?,
        Some("toml") => toml::from_str(&content).map_err(|e| {
            VitrineError::config(format!("invalid catalogue {}: {e}", path.display()))
        })?,
        _ => {
            return Err(VitrineError::config(format!(
                "catalogue {} must be a .json or .toml file",
                path.display()
            )));
        }
    };

    let expertises: usize = file.categories.iter().map(|c| c.expertises.len()).sum();
    info!(
        path = %path.display(),
        categories = file.categories.len(),
        expertises,
        "expertise catalogue loaded"
    );
    Ok(file.categories)
}

/// The agency's default service catalogue.
pub fn default_catalog() -> Vec<ExpertiseCategory> {
    fn category(name: &str, titles: &[&str]) -> ExpertiseCategory {
        ExpertiseCategory {
            name: name.to_string(),
            slug: None,
            expertises: titles
                .iter()
                .map(|t| Expertise {
                    title: (*t).to_string(),
                    slug: None,
                    description: None,
                })
                .collect(),
        }
    }

    vec![
        category(
            "Growth Marketing",
            &["SEO", "SEA", "Growth hacking", "Marketing automation", "Content marketing"],
        ),
        category(
            "Levée de fonds",
            &["Pitch deck", "Business plan", "Due diligence", "Valorisation"],
        ),
        category(
            "Produit & Tech",
            &["Développement web", "Application mobile", "UX design", "No-code"],
        ),
        category("Brand", &["Identité visuelle", "Naming", "Relations presse"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_file(ext: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("vitrine_catalog_{}.{ext}", Uuid::now_v7()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn default_catalog_is_used_without_path() {
        let catalog = load_catalog(None).unwrap();
        assert_eq!(catalog.len(), 4);
        assert!(catalog.iter().all(|c| !c.expertises.is_empty()));
    }

    #[test]
    fn loads_toml() {
        let path = temp_file(
            "toml",
            r#"
[[categories]]
name = "Growth"

[[categories.expertises]]
title = "SEO"
description = "Référencement naturel"

[[categories.expertises]]
title = "Google Ads"
slug = "sea"
"#,
        );
        let catalog = load_catalog(Some(&path)).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].expertises.len(), 2);
        assert_eq!(catalog[0].expertises[1].slug.as_deref(), Some("sea"));
    }

    #[test]
    fn loads_json() {
        let path = temp_file(
            "json",
            r#"{"categories": [{"name": "Brand", "expertises": [{"title": "Naming"}]}]}"#,
        );
        let catalog = load_catalog(Some(&path)).unwrap();
        assert_eq!(catalog[0].name, "Brand");
    }

    #[test]
    fn rejects_unknown_extension_and_missing_file() {
        let path = temp_file("yaml", "categories: []");
        assert!(load_catalog(Some(&path)).is_err());

        let missing = std::env::temp_dir().join("vitrine_missing_catalog.json");
        assert!(load_catalog(Some(&missing)).is_err());
    }
}
