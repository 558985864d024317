use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::{error::ConfigError, github::get_github_token};

const ABORT_MESSAGE: &str = "Cannot continue to start the bot due to critical lack of parameters.";

#[derive(Parser, Debug)]
#[command(
    name = "review-waiting-list",
    version,
    about = "Lists open pull requests that still need review, on demand or as scheduled personal reminders"
)]
struct CliArgs {
    /// GitHub token (falls back to GITHUB_TOKEN, then GH_TOKEN)
    #[arg(
        long = "github-token",
        env = "GITHUB_AUTH_TOKEN",
        hide_env_values = true,
        value_name = "TOKEN"
    )]
    pub github_token: Option<String>,

    /// GitHub API base URL, for GitHub Enterprise
    #[arg(long = "api-url", env = "GITHUB_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: CommandArgs,
}

#[derive(Subcommand, Debug)]
enum CommandArgs {
    /// List open pull requests, e.g. `ls author:alice,myorg/team label:-wip`
    Ls {
        /// Query tokens: author, repo, user, org, review-requested, label, reviewer
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true, value_name = "QUERY")]
        query: Vec<String>,
    },

    /// Remind every mapped user of the pull requests awaiting their review
    Remind {
        /// Cron expression, seconds first (e.g. "0 0 10 * * Mon-Fri")
        #[arg(long, env = "PERSONAL_CRON", value_name = "CRON")]
        cron: Option<String>,

        /// JSON file mapping chat handles to GitHub accounts
        #[arg(long = "mapping-file", env = "PERSONAL_MAPPING_FILE", value_name = "PATH")]
        mapping_file: Option<PathBuf>,

        /// Run a single reminder round now and exit
        #[arg(long)]
        once: bool,
    },
}

/// What the process was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Answer one `ls` command; `message` is the full chat text.
    Ls { message: String },
    Remind {
        cron: String,
        mapping_file: PathBuf,
        once: bool,
    },
}

/// Validated startup configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub github_token: String,
    pub api_url: Option<String>,
    pub mode: Mode,
}

impl CliArgs {
    /// Checks every required setting and reports all missing ones at once.
    fn into_settings(
        self,
        fallback_token: impl FnOnce() -> Option<String>,
    ) -> Result<Settings, ConfigError> {
        let mut missing = Vec::new();

        let github_token = self
            .github_token
            .filter(|token| !token.trim().is_empty())
            .or_else(fallback_token);
        if github_token.is_none() {
            missing.push("Error: GITHUB_AUTH_TOKEN is missing.".to_string());
        }

        let mode = match self.command {
            CommandArgs::Ls { query } => Some(Mode::Ls {
                message: format!("ls {}", query.join(" ")),
            }),
            CommandArgs::Remind {
                cron,
                mapping_file,
                once,
            } => {
                let cron = cron.filter(|c| !c.trim().is_empty());
                if cron.is_none() {
                    missing.push("Error: PERSONAL_CRON is missing.".to_string());
                }
                if mapping_file.is_none() {
                    missing.push("Error: PERSONAL_MAPPING_FILE is missing.".to_string());
                }
                cron.zip(mapping_file).map(|(cron, mapping_file)| Mode::Remind {
                    cron,
                    mapping_file,
                    once,
                })
            }
        };

        match (github_token, mode) {
            (Some(github_token), Some(mode)) => Ok(Settings {
                github_token,
                api_url: self.api_url.filter(|url| !url.trim().is_empty()),
                mode,
            }),
            _ => {
                missing.push(ABORT_MESSAGE.to_string());
                Err(ConfigError::Missing(missing))
            }
        }
    }
}

/// Parses command-line arguments and the environment into settings.
///
/// Help and version requests surface as `clap::Error`; missing settings as
/// [`ConfigError::Missing`].
pub fn parse_args<I, T>(args: I) -> Result<Settings>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = CliArgs::try_parse_from(args)?;
    Ok(cli.into_settings(get_github_token)?)
}
