//! Review waiting list: which pull requests still need attention?
//!
//! Parses the `ls` query language, expands GitHub teams into their members,
//! drains a paginated GitHub search and renders the open pull requests as
//! chat lines. The same pipeline backs scheduled personal reminders.

pub mod cli;
pub mod conversation;
pub mod error;
pub mod filter;
pub mod github;
pub mod graphql;
pub mod parser;
pub mod query;
pub mod reminder;
pub mod search;
pub mod teams;
pub mod types;

pub use cli::{Mode, Settings, parse_args};
pub use conversation::{ChatSink, Recipient, WriterSink};
pub use error::{ConfigError, FetchError, MappingError, ParseError, TeamLookupError};
pub use filter::apply_filters;
pub use github::GitHub;
pub use parser::{parse, parse_command};
pub use query::{fetch_pull_requests, handle_message};
pub use reminder::{PersonalReminder, ReminderMapping, TickSummary, load_mappings, remind_all};
pub use search::{build_search_query, fetch_all, prepare, qualifier_of};
pub use teams::resolve_teams;
pub use types::{
    FieldCondition, FieldKind, Forge, PageCursor, PullRequest, QueryConditions, RequesteeKind,
    ReviewRequestee, SearchPage, ValueSet,
};
