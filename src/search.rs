use tracing::{debug, warn};

use crate::{
    error::FetchError,
    teams::resolve_teams,
    types::{FieldCondition, FieldKind, Forge, PullRequest, QueryConditions},
};

/// Fields sent to GitHub, in the order they appear in the search string.
const QUALIFIER_ORDER: [FieldKind; 5] = [
    FieldKind::Author,
    FieldKind::Org,
    FieldKind::ReviewRequested,
    FieldKind::Repo,
    FieldKind::User,
];

#[derive(Debug, Default)]
pub struct SearchQueryBuilder {
    terms: Vec<String>,
}

impl SearchQueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pr_type(&mut self) -> &mut Self {
        self.terms.push("type:pr".to_string());
        self
    }

    pub fn open(&mut self) -> &mut Self {
        self.terms.push("state:open".to_string());
        self
    }

    pub fn condition(&mut self, kind: FieldKind, condition: &FieldCondition) -> &mut Self {
        if let Some(qualifier) = qualifier_of(kind, condition) {
            self.terms.push(qualifier);
        }
        self
    }

    pub fn build(&self) -> String {
        self.terms.join(" ")
    }
}

/// Renders a condition as a GitHub search qualifier, e.g. `author:a,b` or
/// `-author:a,b`. Returns `None` for fields GitHub cannot express and for
/// inactive conditions.
pub fn qualifier_of(kind: FieldKind, condition: &FieldCondition) -> Option<String> {
    if !kind.is_search_qualifier() || !condition.is_active() {
        return None;
    }
    let negation = if condition.inclusion { "" } else { "-" };
    Some(format!(
        "{negation}{}:{}",
        kind.as_str(),
        condition.values.join(",")
    ))
}

/// Constructs the search string for the server-side part of a query.
pub fn build_search_query(conditions: &QueryConditions) -> String {
    let mut builder = SearchQueryBuilder::new();
    builder.pr_type();
    for kind in QUALIFIER_ORDER {
        builder.condition(kind, conditions.get(kind));
    }
    builder.open().build()
}

/// Expands team tokens in the author and review-requested fields.
///
/// A field whose teams all expand to nobody ends up with no values and drops
/// out of the search query.
pub async fn prepare<F>(
    conditions: QueryConditions,
    forge: &F,
) -> Result<QueryConditions, FetchError>
where
    F: Forge + Sync,
{
    let (authors, review_requested) = futures::try_join!(
        resolve_teams(&conditions.author.values, forge),
        resolve_teams(&conditions.review_requested.values, forge)
    )?;

    let mut resolved = conditions;
    for (kind, values) in [
        (FieldKind::Author, authors),
        (FieldKind::ReviewRequested, review_requested),
    ] {
        let condition = resolved.get_mut(kind);
        if condition.is_active() && values.is_empty() {
            warn!("'{kind}' matches no one after resolving teams, dropping it");
        }
        condition.values = values;
    }

    Ok(resolved)
}

/// Drains every page of open pull requests matching `conditions`.
///
/// Pages are requested one after another, each with the cursor returned by
/// the previous one, and concatenated in arrival order. Any failed page
/// fails the whole fetch.
pub async fn fetch_all<F>(
    conditions: &QueryConditions,
    forge: &F,
) -> Result<Vec<PullRequest>, FetchError>
where
    F: Forge + Sync,
{
    let search_query = build_search_query(conditions);
    let mut pull_requests = Vec::new();
    let mut after_cursor: Option<String> = None;
    let mut page_count = 0;

    loop {
        page_count += 1;
        let page = forge
            .search_page(&search_query, after_cursor.as_deref())
            .await?;
        debug!(
            page = page_count,
            pull_requests = page.pull_requests.len(),
            query = %search_query,
            "fetched search page"
        );
        pull_requests.extend(page.pull_requests);

        if !page.cursor.has_next_page {
            break;
        }

        after_cursor = page.cursor.end_cursor;

        if after_cursor.is_none() {
            warn!("search reported more pages without a cursor, stopping at page {page_count}");
            break;
        }
    }

    Ok(pull_requests)
}
