//! WordPress REST + GraphQL implementation of [`ContentSource`].

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use vitrine_shared::{
    Author, Category, CmsSettings, LeveeItem, Paged, PortfolioItem, Post, Result, TeamMember,
    ToolboxEntry, VitrineError,
};

use crate::graphql::{self, LIST_LIMIT};
use crate::wire::{
    GqlTeamMember, GqlToolbox, GraphqlResponse, Nodes, WpErrorBody, WpPost, WpTerm, WpUser,
};
use crate::{ContentSource, PostQuery};

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 3;

/// Largest page size the REST API accepts.
const REST_MAX_PER_PAGE: u32 = 100;

/// Safety cap on pages walked by "fetch everything" helpers.
const MAX_WALK_PAGES: u32 = 50;

/// User-Agent string for CMS requests.
const USER_AGENT: &str = concat!("Vitrine/", env!("CARGO_PKG_VERSION"));

/// REST error code WordPress returns for a page past the end of a collection.
const INVALID_PAGE_CODE: &str = "rest_post_invalid_page_number";

/// Status and raw body of a forwarded GraphQL call.
#[derive(Debug, Clone)]
pub struct ProxiedResponse {
    pub status: u16,
    pub body: Bytes,
}

/// Client for a headless WordPress instance.
#[derive(Debug, Clone)]
pub struct WordPressClient {
    client: Client,
    settings: CmsSettings,
}

impl WordPressClient {
    /// Build a client from resolved CMS settings.
    pub fn new(settings: CmsSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(settings.timeout)
            .build()
            .map_err(|e| VitrineError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, settings })
    }

    /// GraphQL endpoint this client talks to.
    pub fn graphql_url(&self) -> &Url {
        &self.settings.graphql_url
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.settings.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn rest_url(&self, path: &str) -> Result<Url> {
        self.settings
            .rest_url
            .join(path)
            .map_err(|e| VitrineError::config(format!("invalid REST path '{path}': {e}")))
    }

    // -----------------------------------------------------------------------
    // REST plumbing
    // -----------------------------------------------------------------------

    /// GET a REST collection, returning the decoded body and pagination headers.
    async fn get_rest<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<(T, PageHeaders)> {
        let url = self.rest_url(path)?;
        debug!(%url, ?query, "REST request");

        let response = self
            .authorize(self.client.get(url.clone()).query(query))
            .send()
            .await
            .map_err(|e| VitrineError::Network(format!("{url}: {e}")))?;

        let response = check_rest_status(response, &url).await?;
        let headers = PageHeaders::from_headers(response.headers());
        let body = response
            .json::<T>()
            .await
            .map_err(|e| VitrineError::parse(format!("{url}: undecodable body: {e}")))?;

        Ok((body, headers))
    }

    /// Walk every page of a REST collection.
    async fn get_rest_all<T: DeserializeOwned>(
        &self,
        path: &str,
        extra: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let mut all = Vec::new();
        let mut page = 1;

        loop {
            let mut query = vec![
                ("per_page", REST_MAX_PER_PAGE.to_string()),
                ("page", page.to_string()),
                ("_embed", "1".to_string()),
            ];
            query.extend(extra.iter().cloned());

            let (batch, headers): (Vec<T>, _) = self.get_rest(path, &query).await?;
            let batch_len = batch.len();
            all.extend(batch);

            let total_pages = headers.total_pages.unwrap_or(1);
            if page >= total_pages || batch_len == 0 {
                break;
            }
            if page >= MAX_WALK_PAGES {
                warn!(path, page, total_pages, "collection walk capped");
                break;
            }
            page += 1;
        }

        Ok(all)
    }

    /// Fetch a post-shaped record by slug.
    async fn get_rest_by_slug(&self, path: &str, slug: &str) -> Result<Option<WpPost>> {
        let query = [("slug", slug.to_string()), ("_embed", "1".to_string())];
        let (records, _): (Vec<WpPost>, _) = self.get_rest(path, &query).await?;
        Ok(records.into_iter().next())
    }

    // -----------------------------------------------------------------------
    // GraphQL plumbing
    // -----------------------------------------------------------------------

    /// Run a GraphQL query and decode its `data` member.
    async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T> {
        let url = &self.settings.graphql_url;
        let payload = serde_json::json!({ "query": query, "variables": variables });

        let response = self
            .authorize(self.client.post(url.clone()).json(&payload))
            .send()
            .await
            .map_err(|e| VitrineError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VitrineError::Upstream {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let envelope = response
            .json::<GraphqlResponse<T>>()
            .await
            .map_err(|e| VitrineError::parse(format!("{url}: undecodable GraphQL body: {e}")))?;

        if let Some(first) = envelope.errors.first() {
            return Err(VitrineError::parse(format!(
                "GraphQL error ({} total): {}",
                envelope.errors.len(),
                first.message
            )));
        }

        envelope
            .data
            .ok_or_else(|| VitrineError::parse("GraphQL response has no data"))
    }

    /// Forward a raw GraphQL request body to the CMS, verbatim.
    #[instrument(skip_all, fields(bytes = body.len()))]
    pub async fn forward_graphql(&self, body: Bytes) -> Result<ProxiedResponse> {
        let url = &self.settings.graphql_url;
        let response = self
            .authorize(
                self.client
                    .post(url.clone())
                    .header(CONTENT_TYPE, "application/json")
                    .body(body),
            )
            .send()
            .await
            .map_err(|e| VitrineError::Network(format!("{url}: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| VitrineError::Network(format!("{url}: failed to read body: {e}")))?;

        debug!(status, bytes = body.len(), "GraphQL request forwarded");
        Ok(ProxiedResponse { status, body })
    }
}

#[async_trait]
impl ContentSource for WordPressClient {
    #[instrument(skip(self), fields(page = query.page, per_page = query.per_page))]
    async fn list_posts(&self, query: &PostQuery) -> Result<Paged<Post>> {
        let mut params = vec![
            ("per_page", query.per_page.clamp(1, REST_MAX_PER_PAGE).to_string()),
            ("page", query.page.max(1).to_string()),
            ("_embed", "1".to_string()),
        ];
        if let Some(category) = query.category {
            params.push(("categories", category.to_string()));
        }
        if let Some(author) = query.author {
            params.push(("author", author.to_string()));
        }
        if !query.exclude.is_empty() {
            let ids: Vec<String> = query.exclude.iter().map(u64::to_string).collect();
            params.push(("exclude", ids.join(",")));
        }

        let (records, headers): (Vec<WpPost>, _) = self.get_rest("posts", &params).await?;
        let items = records
            .into_iter()
            .map(WpPost::into_post)
            .collect::<Result<Vec<_>>>()?;

        let total = headers.total.unwrap_or(items.len() as u64);
        let total_pages = headers
            .total_pages
            .unwrap_or(if items.is_empty() { 0 } else { 1 });

        Ok(Paged {
            items,
            total,
            total_pages,
        })
    }

    #[instrument(skip(self))]
    async fn post_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        self.get_rest_by_slug("posts", slug)
            .await?
            .map(WpPost::into_post)
            .transpose()
    }

    #[instrument(skip(self), fields(since = %since))]
    async fn recent_posts(&self, since: DateTime<Utc>) -> Result<Vec<Post>> {
        let after = since.to_rfc3339_opts(SecondsFormat::Secs, true);
        let records = self.get_rest_all::<WpPost>("posts", &[("after", after)]).await?;
        let posts = records
            .into_iter()
            .map(WpPost::into_post)
            .collect::<Result<Vec<_>>>()?;
        Ok(posts.into_iter().filter(|p| p.published_at > since).collect())
    }

    #[instrument(skip(self))]
    async fn all_posts(&self) -> Result<Vec<Post>> {
        self.get_rest_all::<WpPost>("posts", &[])
            .await?
            .into_iter()
            .map(WpPost::into_post)
            .collect()
    }

    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let terms: Vec<WpTerm> = self
            .get_rest_all("categories", &[("hide_empty", "true".to_string())])
            .await?;
        Ok(terms.into_iter().map(WpTerm::into_category).collect())
    }

    #[instrument(skip(self))]
    async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let (terms, _): (Vec<WpTerm>, _) = self
            .get_rest("categories", &[("slug", slug.to_string())])
            .await?;
        Ok(terms.into_iter().next().map(WpTerm::into_category))
    }

    #[instrument(skip(self))]
    async fn author_by_slug(&self, slug: &str) -> Result<Option<Author>> {
        let (users, _): (Vec<WpUser>, _) =
            self.get_rest("users", &[("slug", slug.to_string())]).await?;
        Ok(users.into_iter().find_map(WpUser::into_author))
    }

    #[instrument(skip(self))]
    async fn list_portfolio(&self) -> Result<Vec<PortfolioItem>> {
        self.get_rest_all::<WpPost>("portfolio", &[])
            .await?
            .into_iter()
            .map(WpPost::into_portfolio)
            .collect()
    }

    #[instrument(skip(self))]
    async fn portfolio_by_slug(&self, slug: &str) -> Result<Option<PortfolioItem>> {
        self.get_rest_by_slug("portfolio", slug)
            .await?
            .map(WpPost::into_portfolio)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn list_team(&self) -> Result<Vec<TeamMember>> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Data {
            team_members: Option<Nodes<GqlTeamMember>>,
        }

        let data: Data = self
            .graphql(
                &graphql::team_list(),
                serde_json::json!({ "first": LIST_LIMIT }),
            )
            .await?;
        Ok(data
            .team_members
            .map(|n| n.nodes)
            .unwrap_or_default()
            .into_iter()
            .map(GqlTeamMember::into_member)
            .collect())
    }

    #[instrument(skip(self))]
    async fn team_member_by_slug(&self, slug: &str) -> Result<Option<TeamMember>> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Data {
            team_member: Option<GqlTeamMember>,
        }

        let data: Data = self
            .graphql(&graphql::team_by_slug(), serde_json::json!({ "slug": slug }))
            .await?;
        Ok(data.team_member.map(GqlTeamMember::into_member))
    }

    #[instrument(skip(self))]
    async fn list_toolbox(&self) -> Result<Vec<ToolboxEntry>> {
        #[derive(serde::Deserialize)]
        struct Data {
            toolboxes: Option<Nodes<GqlToolbox>>,
        }

        let data: Data = self
            .graphql(
                &graphql::toolbox_list(),
                serde_json::json!({ "first": LIST_LIMIT }),
            )
            .await?;
        Ok(data
            .toolboxes
            .map(|n| n.nodes)
            .unwrap_or_default()
            .into_iter()
            .map(GqlToolbox::into_entry)
            .collect())
    }

    #[instrument(skip(self))]
    async fn toolbox_by_slug(&self, slug: &str) -> Result<Option<ToolboxEntry>> {
        #[derive(serde::Deserialize)]
        struct Data {
            toolbox: Option<GqlToolbox>,
        }

        let data: Data = self
            .graphql(&graphql::toolbox_by_slug(), serde_json::json!({ "slug": slug }))
            .await?;
        Ok(data.toolbox.map(GqlToolbox::into_entry))
    }

    #[instrument(skip(self))]
    async fn list_levees(&self) -> Result<Vec<LeveeItem>> {
        self.get_rest_all::<WpPost>("levee", &[])
            .await?
            .into_iter()
            .map(WpPost::into_levee)
            .collect()
    }

    #[instrument(skip(self))]
    async fn levee_by_slug(&self, slug: &str) -> Result<Option<LeveeItem>> {
        self.get_rest_by_slug("levee", slug)
            .await?
            .map(WpPost::into_levee)
            .transpose()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Pagination headers of a REST collection response.
#[derive(Debug, Default, Clone, Copy)]
struct PageHeaders {
    total: Option<u64>,
    total_pages: Option<u32>,
}

impl PageHeaders {
    fn from_headers(headers: &HeaderMap) -> Self {
        let parse = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
        };
        Self {
            total: parse("x-wp-total"),
            total_pages: parse("x-wp-totalpages").map(|n| n.min(u32::MAX as u64) as u32),
        }
    }
}

/// Turn a non-success REST response into the matching error.
async fn check_rest_status(response: Response, url: &Url) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: WpErrorBody = response.json().await.unwrap_or_default();
    if body.code == INVALID_PAGE_CODE {
        debug!(%url, "page past the end of the collection");
        return Err(VitrineError::not_found(format!("page of {url}")));
    }

    warn!(
        %url,
        status = status.as_u16(),
        code = %body.code,
        message = %body.message,
        "CMS request failed"
    );
    Err(VitrineError::Upstream {
        status: status.as_u16(),
        url: url.to_string(),
    })
}
