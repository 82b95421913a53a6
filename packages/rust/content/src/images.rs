//! Featured-image resolution and CDN URL rewriting.

use url::Url;

use vitrine_shared::{CdnConfig, Media, Post, Result, VitrineError};

/// Rendition names tried in order before falling back to the original upload.
const PREFERRED_SIZES: &[&str] = &["large", "medium_large", "full"];

/// Path prefix of WordPress uploads.
const UPLOADS_PREFIX: &str = "/wp-content/uploads/";

/// Best-available image URL for `media`, or `placeholder` when there is none.
pub fn resolve_image_url(media: Option<&Media>, placeholder: &str) -> String {
    let Some(media) = media else {
        return placeholder.to_string();
    };

    PREFERRED_SIZES
        .iter()
        .find_map(|size| media.sizes.get(*size).filter(|url| !url.is_empty()))
        .or_else(|| Some(&media.source_url).filter(|url| !url.is_empty()))
        .cloned()
        .unwrap_or_else(|| placeholder.to_string())
}

/// Featured image of a post, falling back to `placeholder`.
pub fn featured_image(post: &Post, placeholder: &str) -> String {
    resolve_image_url(post.featured_media.as_ref(), placeholder)
}

/// Rewrites CMS upload URLs onto the image CDN.
#[derive(Debug, Clone)]
pub struct CdnRewriter {
    cms_origin: Url,
    cdn_base: Url,
    default_width: Option<u32>,
}

impl CdnRewriter {
    /// Build a rewriter, or `None` when no CDN is configured.
    pub fn from_config(cdn: &CdnConfig, cms_base_url: &str) -> Result<Option<Self>> {
        let Some(cdn_base) = cdn.base_url.as_deref() else {
            return Ok(None);
        };

        let cms_origin = Url::parse(cms_base_url)
            .map_err(|e| VitrineError::config(format!("invalid cms.base_url: {e}")))?;
        let cdn_base = Url::parse(cdn_base)
            .map_err(|e| VitrineError::config(format!("invalid cdn.base_url: {e}")))?;

        Ok(Some(Self {
            cms_origin,
            cdn_base,
            default_width: cdn.default_width,
        }))
    }

    /// Rewrite `url` when it points at the CMS uploads directory.
    ///
    /// Any other URL (external, relative, already on the CDN) is returned as is.
    pub fn rewrite(&self, url: &str, width: Option<u32>) -> String {
        let Ok(parsed) = Url::parse(url) else {
            return url.to_string();
        };

        let same_origin = parsed.scheme() == self.cms_origin.scheme()
            && parsed.host_str() == self.cms_origin.host_str()
            && parsed.port_or_known_default() == self.cms_origin.port_or_known_default();
        if !same_origin || !parsed.path().starts_with(UPLOADS_PREFIX) {
            return url.to_string();
        }

        let mut target = self.cdn_base.clone();
        let base_path = self.cdn_base.path().trim_end_matches('/');
        target.set_path(&format!("{base_path}{}", parsed.path()));
        target.set_query(None);

        if let Some(w) = width.or(self.default_width) {
            target.query_pairs_mut().append_pair("w", &w.to_string());
        }

        target.to_string()
    }
}

/// Rewrite `url` onto the CDN when one is configured; identity otherwise.
pub fn rewrite_for_cdn(url: &str, cdn: Option<&CdnRewriter>) -> String {
    match cdn {
        Some(cdn) => cdn.rewrite(url, None),
        None => url.to_string(),
    }
}
