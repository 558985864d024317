use std::time::Duration;

use async_trait::async_trait;
use octocrab::Octocrab;
use serde::de::DeserializeOwned;

use crate::{
    error::{FetchError, TeamLookupError},
    graphql::{
        GraphQLResponse, OrganizationData, SearchData, create_search_query,
        create_team_members_query, search_page_from_response, team_members_from_response,
    },
    types::{Forge, SearchPage},
};

/// Limit applied to every request sent to GitHub.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Environment variables checked for a token, in order of preference.
pub const TOKEN_VARIABLES: [&str; 3] = ["GITHUB_AUTH_TOKEN", "GITHUB_TOKEN", "GH_TOKEN"];

/// Returns the first non-empty token from [`TOKEN_VARIABLES`].
pub fn get_github_token() -> Option<String> {
    TOKEN_VARIABLES
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|token| token.trim().to_string())
        .find(|token| !token.is_empty())
}

/// GitHub GraphQL API, authenticated with a static token.
pub struct GitHub {
    octocrab: Octocrab,
    timeout: Duration,
}

impl GitHub {
    pub fn new(token: impl Into<String>, base_uri: Option<&str>) -> Result<Self, FetchError> {
        let mut builder = Octocrab::builder().personal_token(token.into());
        if let Some(uri) = base_uri {
            builder = builder.base_uri(uri)?;
        }
        Ok(Self {
            octocrab: builder.build()?,
            timeout: REQUEST_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn graphql<R>(&self, payload: &serde_json::Value) -> Result<R, FetchError>
    where
        R: DeserializeOwned + Send,
    {
        match tokio::time::timeout(self.timeout, self.octocrab.graphql::<R>(payload)).await {
            Ok(response) => Ok(response?),
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        }
    }
}

#[async_trait]
impl Forge for GitHub {
    async fn search_page(
        &self,
        query: &str,
        after: Option<&str>,
    ) -> Result<SearchPage, FetchError> {
        let payload = create_search_query(query, after);
        let response: GraphQLResponse<SearchData> = self.graphql(&payload).await?;
        search_page_from_response(response)
    }

    async fn team_members(&self, org: &str, team: &str) -> Result<Vec<String>, TeamLookupError> {
        let payload = create_team_members_query(org, team);
        let response: GraphQLResponse<OrganizationData> = self.graphql(&payload).await?;
        team_members_from_response(response, org, team)
    }
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;

    use super::*;

    #[tokio::test]
    async fn unanswered_request_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let timeout = Duration::from_millis(300);
        let github = GitHub::new("t0ken", Some(&format!("http://{addr}/")))
            .unwrap()
            .with_timeout(timeout);
        let err = github
            .search_page("type:pr state:open", None)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Timeout(elapsed) if elapsed == timeout));
        assert_eq!(err.to_string(), "GitHub API request timed out after 300ms");
        server.abort();
    }
}
