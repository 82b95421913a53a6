//! GraphQL documents sent to WPGraphQL.

/// Upper bound on nodes fetched by list queries.
pub(crate) const LIST_LIMIT: u32 = 500;

const TEAM_FIELDS: &str = r#"
    id
    slug
    title
    modifiedGmt
    teamFields {
      extract
      position
      image { sourceUrl altText }
    }
"#;

const TOOLBOX_FIELDS: &str = r#"
    slug
    title
    dateGmt
    modifiedGmt
    productFields {
      launchDay
      tagline
      website
    }
    featuredImage { node { sourceUrl altText } }
"#;

pub(crate) fn team_list() -> String {
    format!(
        "query TeamMembers($first: Int!) {{\n  teamMembers(first: $first, where: {{ orderby: {{ field: MENU_ORDER, order: ASC }} }}) {{\n    nodes {{{TEAM_FIELDS}    }}\n  }}\n}}"
    )
}

pub(crate) fn team_by_slug() -> String {
    format!(
        "query TeamMember($slug: ID!) {{\n  teamMember(id: $slug, idType: SLUG) {{{TEAM_FIELDS}  }}\n}}"
    )
}

pub(crate) fn toolbox_list() -> String {
    format!(
        "query Toolboxes($first: Int!) {{\n  toolboxes(first: $first) {{\n    nodes {{{TOOLBOX_FIELDS}    }}\n  }}\n}}"
    )
}

pub(crate) fn toolbox_by_slug() -> String {
    format!(
        "query Toolbox($slug: ID!) {{\n  toolbox(id: $slug, idType: SLUG) {{{TOOLBOX_FIELDS}  }}\n}}"
    )
}
