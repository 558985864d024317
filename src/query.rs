use std::io;

use tracing::error;

use crate::{
    conversation::{ChatSink, Recipient, command_conversation, failure_conversation},
    error::FetchError,
    filter::apply_filters,
    parser::parse_command,
    search::{fetch_all, prepare},
    types::{Forge, QueryConditions},
};

/// Runs one query end to end and returns the rendered lines.
///
/// Team tokens are expanded first, then every result page is fetched, then
/// the client-side filters are applied.
pub async fn fetch_pull_requests<F>(
    conditions: QueryConditions,
    forge: &F,
) -> Result<Vec<String>, FetchError>
where
    F: Forge + Sync,
{
    let resolved = prepare(conditions, forge).await?;
    let pull_requests = fetch_all(&resolved, forge).await?;
    Ok(apply_filters(&pull_requests, &resolved))
}

/// Answers a chat message if it is an `ls` command.
///
/// Returns whether the message was handled. A failed fetch is reported to
/// the requester rather than propagated.
pub async fn handle_message<F, S>(message: &str, forge: &F, sink: &S) -> io::Result<bool>
where
    F: Forge + Sync,
    S: ChatSink + Sync,
{
    let Some(conditions) = parse_command(message) else {
        return Ok(false);
    };

    let conversation = match fetch_pull_requests(conditions, forge).await {
        Ok(lines) => command_conversation(lines),
        Err(err) => {
            error!("failed to answer '{message}': {err}");
            failure_conversation(&err)
        }
    };

    sink.say(&Recipient::Requester, &conversation).await?;
    Ok(true)
}
