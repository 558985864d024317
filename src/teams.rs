use futures::future::try_join_all;
use tracing::{debug, warn};

use crate::{
    error::{FetchError, TeamLookupError},
    types::{Forge, ValueSet, split_team_token},
};

/// Replaces every `org/team` value with the team's member logins.
///
/// Plain logins pass through. The result keeps the first occurrence of each
/// login, in input order. A team that cannot be found expands to nothing;
/// any other lookup failure aborts.
pub async fn resolve_teams<F>(values: &ValueSet, forge: &F) -> Result<ValueSet, FetchError>
where
    F: Forge + Sync,
{
    let expansions = try_join_all(values.iter().map(|value| expand_value(value, forge))).await?;
    Ok(expansions.into_iter().flatten().collect())
}

async fn expand_value<F>(value: &str, forge: &F) -> Result<Vec<String>, FetchError>
where
    F: Forge + Sync,
{
    let Some((org, team)) = split_team_token(value) else {
        return Ok(vec![value.to_string()]);
    };

    match forge.team_members(org, team).await {
        Ok(members) => {
            debug!(org, team, members = members.len(), "resolved team");
            Ok(members)
        }
        Err(TeamLookupError::NotFound { .. }) => {
            warn!("team '{value}' not found, ignoring it");
            Ok(Vec::new())
        }
        Err(TeamLookupError::Fetch(err)) => Err(err),
    }
}
