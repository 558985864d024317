use serde::Deserialize;

use crate::{
    error::{FetchError, TeamLookupError},
    types::{PageCursor, PullRequest, ReviewRequestee, SearchPage},
};

/// GitHub's display name for pull requests whose author account is gone.
const GHOST_LOGIN: &str = "ghost";

pub fn create_search_query(search_query: &str, after: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "query": r#"
            query($query: String!, $after: String) {
                search(query: $query, type: ISSUE, first: 100, after: $after) {
                    pageInfo {
                        hasNextPage
                        endCursor
                    }
                    nodes {
                        __typename
                        ... on PullRequest {
                            title
                            url
                            author {
                                login
                            }
                            labels(first: 100) {
                                nodes {
                                    name
                                }
                            }
                            reviewRequests(first: 100) {
                                nodes {
                                    requestedReviewer {
                                        __typename
                                        ... on User {
                                            login
                                        }
                                        ... on Team {
                                            name
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        "#,
        "variables": {
            "query": search_query,
            "after": after,
        }
    })
}

pub fn create_team_members_query(org: &str, team: &str) -> serde_json::Value {
    serde_json::json!({
        "query": r#"
            query($org: String!, $team: String!) {
                organization(login: $org) {
                    teams(first: 100, query: $team) {
                        nodes {
                            name
                            slug
                            members(first: 100) {
                                nodes {
                                    login
                                }
                            }
                        }
                    }
                }
            }
        "#,
        "variables": {
            "org": org,
            "team": team,
        }
    })
}

/// Envelope of every GraphQL response. GitHub answers `200 OK` with an
/// `errors` list for failures such as an unknown organisation.
#[derive(Debug, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQLError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLError {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl GraphQLError {
    pub fn is_not_found(&self) -> bool {
        self.kind.as_deref() == Some("NOT_FOUND")
    }
}

/// Joins the messages of a non-empty error list.
pub fn describe_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Deserialize)]
pub struct SearchData {
    pub search: SearchResults,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub page_info: PageInfo,
    pub nodes: Vec<SearchNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// Issues share the search type with pull requests and come back as bare
/// typename nodes.
#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
pub enum SearchNode {
    PullRequest(GraphQLPullRequest),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLPullRequest {
    pub title: String,
    pub url: String,
    pub author: Option<GraphQLActor>,
    pub labels: Option<GraphQLLabelConnection>,
    pub review_requests: Option<GraphQLReviewRequestConnection>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLActor {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLLabelConnection {
    #[serde(default)]
    pub nodes: Vec<GraphQLLabel>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLLabel {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLReviewRequestConnection {
    #[serde(default)]
    pub nodes: Vec<GraphQLReviewRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLReviewRequest {
    pub requested_reviewer: Option<RequestedReviewer>,
}

/// Mannequins and bots can be requested too; they carry no name we can
/// match on.
#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
pub enum RequestedReviewer {
    User { login: String },
    Team { name: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct OrganizationData {
    pub organization: Option<GraphQLOrganization>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLOrganization {
    pub teams: GraphQLTeamConnection,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLTeamConnection {
    #[serde(default)]
    pub nodes: Vec<GraphQLTeam>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLTeam {
    pub name: String,
    pub slug: String,
    pub members: GraphQLMemberConnection,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLMemberConnection {
    #[serde(default)]
    pub nodes: Vec<GraphQLActor>,
}

impl GraphQLTeam {
    pub fn is_named(&self, team: &str) -> bool {
        self.slug == team || self.name == team
    }
}

pub fn convert_review_request(request: GraphQLReviewRequest) -> Option<ReviewRequestee> {
    match request.requested_reviewer? {
        RequestedReviewer::User { login } => Some(ReviewRequestee::user(login)),
        RequestedReviewer::Team { name } => Some(ReviewRequestee::team(name)),
        RequestedReviewer::Other => None,
    }
}

pub fn convert_graphql_pr(graphql_pr: GraphQLPullRequest) -> PullRequest {
    PullRequest {
        title: graphql_pr.title,
        url: graphql_pr.url,
        author_login: graphql_pr
            .author
            .map(|a| a.login)
            .unwrap_or_else(|| GHOST_LOGIN.to_string()),
        labels: graphql_pr
            .labels
            .map(|labels| labels.nodes.into_iter().map(|l| l.name).collect())
            .unwrap_or_default(),
        review_requests: graphql_pr
            .review_requests
            .map(|requests| {
                requests
                    .nodes
                    .into_iter()
                    .filter_map(convert_review_request)
                    .collect()
            })
            .unwrap_or_default(),
    }
}

pub fn convert_search_results(results: SearchResults) -> SearchPage {
    SearchPage {
        pull_requests: results
            .nodes
            .into_iter()
            .filter_map(|node| match node {
                SearchNode::PullRequest(pr) => Some(convert_graphql_pr(pr)),
                SearchNode::Other => None,
            })
            .collect(),
        cursor: PageCursor {
            end_cursor: results.page_info.end_cursor,
            has_next_page: results.page_info.has_next_page,
        },
    }
}

/// Unwraps a search response, treating any reported error as fatal.
pub fn search_page_from_response(
    response: GraphQLResponse<SearchData>,
) -> Result<SearchPage, FetchError> {
    if !response.errors.is_empty() {
        return Err(FetchError::GraphQL(describe_errors(&response.errors)));
    }
    let data = response
        .data
        .ok_or_else(|| FetchError::GraphQL("search response carried no data".to_string()))?;
    Ok(convert_search_results(data.search))
}

/// Picks `team` out of an organisation's teams and returns its member logins.
///
/// A missing organisation or team, or `NOT_FOUND` errors only, mean the team
/// does not exist. Any other error fails the lookup.
pub fn team_members_from_response(
    response: GraphQLResponse<OrganizationData>,
    org: &str,
    team: &str,
) -> Result<Vec<String>, TeamLookupError> {
    let not_found = || TeamLookupError::NotFound {
        org: org.to_string(),
        team: team.to_string(),
    };

    if !response.errors.is_empty() && !response.errors.iter().all(|e| e.is_not_found()) {
        return Err(FetchError::GraphQL(describe_errors(&response.errors)).into());
    }

    let organization = response
        .data
        .and_then(|data| data.organization)
        .ok_or_else(not_found)?;

    organization
        .teams
        .nodes
        .into_iter()
        .find(|candidate| candidate.is_named(team))
        .map(|found| found.members.nodes.into_iter().map(|m| m.login).collect())
        .ok_or_else(not_found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RequesteeKind;

    fn search_response(json: serde_json::Value) -> GraphQLResponse<SearchData> {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn search_query_carries_variables() {
        let first = create_search_query("type:pr state:open", None);
        assert_eq!(first["variables"]["query"], "type:pr state:open");
        assert!(first["variables"]["after"].is_null());

        let next = create_search_query("type:pr state:open", Some("Y3Vyc29yOjEwMA=="));
        assert_eq!(next["variables"]["after"], "Y3Vyc29yOjEwMA==");
        assert!(next["query"].as_str().unwrap().contains("first: 100"));
    }

    #[test]
    fn converts_a_search_page() {
        let response = search_response(serde_json::json!({
            "data": {
                "search": {
                    "pageInfo": { "hasNextPage": true, "endCursor": "abc" },
                    "nodes": [
                        {
                            "__typename": "PullRequest",
                            "title": "Enable to fetch pull requests by specifying assignee",
                            "url": "https://github.com/owner/repo/pull/26",
                            "author": { "login": "alice" },
                            "labels": { "nodes": [{ "name": "enhancement" }] },
                            "reviewRequests": {
                                "nodes": [
                                    { "requestedReviewer": { "__typename": "User", "login": "bob" } },
                                    { "requestedReviewer": { "__typename": "Team", "name": "my-team" } },
                                    { "requestedReviewer": { "__typename": "Mannequin" } },
                                    { "requestedReviewer": null }
                                ]
                            }
                        },
                        { "__typename": "Issue" }
                    ]
                }
            }
        }));

        let page = search_page_from_response(response).unwrap();
        assert_eq!(page.cursor, PageCursor::more("abc"));
        assert_eq!(page.pull_requests.len(), 1);

        let pr = &page.pull_requests[0];
        assert_eq!(pr.author_login, "alice");
        assert_eq!(pr.labels, vec!["enhancement".to_string()]);
        assert_eq!(
            pr.review_requests,
            vec![ReviewRequestee::user("bob"), ReviewRequestee::team("my-team")]
        );
        assert_eq!(pr.review_requests[1].kind, RequesteeKind::Team);
    }

    #[test]
    fn missing_author_is_ghost() {
        let response = search_response(serde_json::json!({
            "data": {
                "search": {
                    "pageInfo": { "hasNextPage": false, "endCursor": null },
                    "nodes": [{
                        "__typename": "PullRequest",
                        "title": "Orphan",
                        "url": "https://github.com/owner/repo/pull/2",
                        "author": null,
                        "labels": null,
                        "reviewRequests": { "nodes": [] }
                    }]
                }
            }
        }));

        let page = search_page_from_response(response).unwrap();
        assert_eq!(page.cursor, PageCursor::last());
        assert_eq!(page.pull_requests[0].author_login, "ghost");
        assert!(page.pull_requests[0].labels.is_empty());
    }

    #[test]
    fn graphql_errors_fail_the_page() {
        let response = search_response(serde_json::json!({
            "data": null,
            "errors": [
                { "type": "RATE_LIMITED", "message": "API rate limit exceeded" }
            ]
        }));

        let err = search_page_from_response(response).unwrap_err();
        assert!(matches!(err, FetchError::GraphQL(message) if message == "API rate limit exceeded"));
    }

    fn team_response(json: serde_json::Value) -> GraphQLResponse<OrganizationData> {
        serde_json::from_value(json).unwrap()
    }

    fn backend_teams() -> GraphQLResponse<OrganizationData> {
        team_response(serde_json::json!({
            "data": {
                "organization": {
                    "teams": {
                        "nodes": [
                            {
                                "name": "Backend Core",
                                "slug": "backend-core",
                                "members": { "nodes": [{ "login": "x" }, { "login": "z" }] }
                            },
                            {
                                "name": "ok-go",
                                "slug": "ok-go",
                                "members": { "nodes": [{ "login": "y" }] }
                            }
                        ]
                    }
                }
            }
        }))
    }

    #[test]
    fn team_matches_by_slug() {
        let members = team_members_from_response(backend_teams(), "myorg", "backend-core").unwrap();
        assert_eq!(members, vec!["x", "z"]);
    }

    #[test]
    fn team_matches_by_display_name() {
        let members = team_members_from_response(backend_teams(), "myorg", "Backend Core").unwrap();
        assert_eq!(members, vec!["x", "z"]);
    }

    #[test]
    fn team_without_a_match_is_not_found() {
        let err = team_members_from_response(backend_teams(), "myorg", "backend").unwrap_err();
        assert!(matches!(
            err,
            TeamLookupError::NotFound { org, team } if org == "myorg" && team == "backend"
        ));
    }

    #[test]
    fn unknown_organisation_is_not_found() {
        let response = team_response(serde_json::json!({
            "data": { "organization": null },
            "errors": [{
                "type": "NOT_FOUND",
                "path": ["organization"],
                "message": "Could not resolve to an Organization with the login of 'nope'."
            }]
        }));

        let err = team_members_from_response(response, "nope", "backend").unwrap_err();
        assert!(matches!(err, TeamLookupError::NotFound { .. }));
    }

    #[test]
    fn other_team_lookup_errors_fail_the_fetch() {
        let response = team_response(serde_json::json!({
            "data": null,
            "errors": [{ "type": "RATE_LIMITED", "message": "API rate limit exceeded" }]
        }));

        let err = team_members_from_response(response, "myorg", "backend-core").unwrap_err();
        assert!(matches!(
            err,
            TeamLookupError::Fetch(FetchError::GraphQL(message)) if message == "API rate limit exceeded"
        ));
    }
}
