//! Shared types, error model, and configuration for Vitrine.
//!
//! This crate is the foundation depended on by all other Vitrine crates.
//! It provides:
//! - [`VitrineError`] — the unified error type
//! - Domain types ([`Post`], [`Category`], [`TeamMember`], [`Document`], ...)
//! - Configuration ([`AppConfig`], [`CmsSettings`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CatalogConfig, CdnConfig, CmsConfig, CmsSettings, RedirectsConfig, ServerConfig,
    SiteConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, VitrineError};
pub use types::{
    Author, Category, Document, DocumentType, Expertise, ExpertiseCategory, LeveeItem, Media,
    Paged, PortfolioItem, Post, TeamFields, TeamMember, ToolboxEntry, ToolboxProduct,
};
