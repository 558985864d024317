use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use chrono::Local;
use cron::Schedule;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::{
    conversation::{ChatSink, Recipient, reminder_conversation},
    error::{ConfigError, MappingError},
    query::fetch_pull_requests,
    types::{Forge, QueryConditions},
};

/// Links a chat user to the GitHub account whose review queue they get
/// reminded about.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderMapping {
    pub chat_handle_name: String,
    pub external_account: String,
}

/// Reads the mapping file: a JSON array of
/// `{"chatHandleName": ..., "externalAccount": ...}` objects.
pub fn load_mappings(path: &Path) -> Result<Vec<ReminderMapping>, MappingError> {
    let content = std::fs::read_to_string(path).map_err(|source| MappingError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| MappingError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Outcome of one reminder round.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub notified: usize,
    pub empty: usize,
    pub failed: usize,
}

/// Reminds every mapped user of the pull requests awaiting their review.
///
/// Users are handled one at a time; a failure for one is logged and does not
/// stop the others.
pub async fn remind_all<F, S>(mappings: &[ReminderMapping], forge: &F, sink: &S) -> TickSummary
where
    F: Forge + Sync,
    S: ChatSink + Sync,
{
    let mut summary = TickSummary::default();

    for mapping in mappings {
        let conditions = QueryConditions::review_requested_by(&mapping.external_account);
        let lines = match fetch_pull_requests(conditions, forge).await {
            Ok(lines) => lines,
            Err(err) => {
                error!(
                    "reminder for {} ({}) failed: {err}",
                    mapping.chat_handle_name, mapping.external_account
                );
                summary.failed += 1;
                continue;
            }
        };

        let Some(conversation) = reminder_conversation(lines) else {
            debug!(handle = %mapping.chat_handle_name, "nothing to review");
            summary.empty += 1;
            continue;
        };

        let recipient = Recipient::Handle(mapping.chat_handle_name.clone());
        match sink.say(&recipient, &conversation).await {
            Ok(()) => summary.notified += 1,
            Err(err) => {
                error!(
                    "failed to deliver reminder to {}: {err}",
                    mapping.chat_handle_name
                );
                summary.failed += 1;
            }
        }
    }

    summary
}

/// Sends review reminders on a cron schedule.
pub struct PersonalReminder {
    schedule: Schedule,
    mapping_file: PathBuf,
}

impl PersonalReminder {
    pub fn new(
        cron_expression: &str,
        mapping_file: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let schedule =
            Schedule::from_str(cron_expression).map_err(|source| ConfigError::InvalidCron {
                expression: cron_expression.to_string(),
                source,
            })?;
        Ok(Self {
            schedule,
            mapping_file: mapping_file.into(),
        })
    }

    /// Runs one reminder round. The mapping file is re-read every time so
    /// edits apply without a restart.
    pub async fn tick<F, S>(&self, forge: &F, sink: &S) -> Result<TickSummary, MappingError>
    where
        F: Forge + Sync,
        S: ChatSink + Sync,
    {
        let mappings = load_mappings(&self.mapping_file)?;
        info!(mappings = mappings.len(), "reminder tick");
        let summary = remind_all(&mappings, forge, sink).await;
        info!(
            notified = summary.notified,
            empty = summary.empty,
            failed = summary.failed,
            "reminder tick finished"
        );
        Ok(summary)
    }

    /// Ticks at every upcoming fire time of the schedule, in local time.
    /// Returns only if the schedule has no further fire times.
    pub async fn run<F, S>(&self, forge: &F, sink: &S)
    where
        F: Forge + Sync,
        S: ChatSink + Sync,
    {
        loop {
            let Some(next) = self.schedule.upcoming(Local).next() else {
                warn!("reminder schedule has no upcoming fire times");
                return;
            };
            let wait = (next - Local::now()).to_std().unwrap_or_default();
            debug!(next = %next, "waiting for next reminder tick");
            tokio::time::sleep(wait).await;

            if let Err(err) = self.tick(forge, sink).await {
                error!("reminder tick skipped: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn loads_mapping_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"chatHandleName": "alice", "externalAccount": "alice-gh"}},
                {{"chatHandleName": "bob", "externalAccount": "bobby"}}
            ]"#
        )
        .unwrap();

        let mappings = load_mappings(file.path()).unwrap();
        assert_eq!(
            mappings,
            vec![
                ReminderMapping {
                    chat_handle_name: "alice".to_string(),
                    external_account: "alice-gh".to_string(),
                },
                ReminderMapping {
                    chat_handle_name: "bob".to_string(),
                    external_account: "bobby".to_string(),
                },
            ]
        );
    }

    #[test]
    fn missing_mapping_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_mappings(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, MappingError::Io { .. }));
    }

    #[test]
    fn malformed_mapping_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"chatHandleName": "alice"}}]"#).unwrap();
        let err = load_mappings(file.path()).unwrap_err();
        assert!(matches!(err, MappingError::Json { .. }));
    }

    #[test]
    fn rejects_invalid_cron() {
        let err = PersonalReminder::new("every monday", "mapping.json").err().unwrap();
        assert!(matches!(err, ConfigError::InvalidCron { .. }));
    }

    #[test]
    fn accepts_seconds_first_cron() {
        assert!(PersonalReminder::new("0 0 10 * * Mon-Fri", "mapping.json").is_ok());
    }
}
