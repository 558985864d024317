use async_trait::async_trait;

use crate::error::{FetchError, TeamLookupError};

/// The closed set of fields the `ls` query language understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Author,
    Repo,
    User,
    Org,
    ReviewRequested,
    Label,
    Reviewer,
}

impl FieldKind {
    pub const ALL: [FieldKind; 7] = [
        FieldKind::Author,
        FieldKind::Repo,
        FieldKind::User,
        FieldKind::Org,
        FieldKind::ReviewRequested,
        FieldKind::Label,
        FieldKind::Reviewer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Author => "author",
            FieldKind::Repo => "repo",
            FieldKind::User => "user",
            FieldKind::Org => "org",
            FieldKind::ReviewRequested => "review-requested",
            FieldKind::Label => "label",
            FieldKind::Reviewer => "reviewer",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        FieldKind::ALL.into_iter().find(|kind| kind.as_str() == key)
    }

    /// Whether GitHub search can express this field. Label and reviewer are
    /// matched client-side only.
    pub fn is_search_qualifier(&self) -> bool {
        !matches!(self, FieldKind::Label | FieldKind::Reviewer)
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Insertion-ordered set of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueSet(Vec<String>);

impl ValueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the value was already present.
    pub fn insert(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.contains(&value) {
            return false;
        }
        self.0.push(value);
        true
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|v| v == value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn join(&self, separator: &str) -> String {
        self.0.join(separator)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<S: Into<String>> Extend<S> for ValueSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<S: Into<String>> FromIterator<S> for ValueSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = ValueSet::new();
        set.extend(iter);
        set
    }
}

/// Match values and polarity for a single query field.
///
/// With `inclusion` set a record matches if any value matches; otherwise it
/// matches if none do. An empty value set never filters anything out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCondition {
    pub kind: FieldKind,
    pub values: ValueSet,
    pub inclusion: bool,
}

impl FieldCondition {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            values: ValueSet::new(),
            inclusion: true,
        }
    }

    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values.extend(values);
        self
    }

    pub fn negated(mut self) -> Self {
        self.inclusion = false;
        self
    }

    pub fn is_active(&self) -> bool {
        !self.values.is_empty()
    }

    /// Applies polarity to the outcome of matching a record against
    /// `values`. The matcher is not called for inactive conditions.
    pub fn passes(&self, matcher: impl FnOnce(&ValueSet) -> bool) -> bool {
        if !self.is_active() {
            return true;
        }
        matcher(&self.values) == self.inclusion
    }
}

/// One condition per [`FieldKind`], always fully populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConditions {
    pub author: FieldCondition,
    pub repo: FieldCondition,
    pub user: FieldCondition,
    pub org: FieldCondition,
    pub review_requested: FieldCondition,
    pub label: FieldCondition,
    pub reviewer: FieldCondition,
}

impl Default for QueryConditions {
    fn default() -> Self {
        Self {
            author: FieldCondition::new(FieldKind::Author),
            repo: FieldCondition::new(FieldKind::Repo),
            user: FieldCondition::new(FieldKind::User),
            org: FieldCondition::new(FieldKind::Org),
            review_requested: FieldCondition::new(FieldKind::ReviewRequested),
            label: FieldCondition::new(FieldKind::Label),
            reviewer: FieldCondition::new(FieldKind::Reviewer),
        }
    }
}

impl QueryConditions {
    /// The implicit query behind a personal reminder.
    pub fn review_requested_by(account: &str) -> Self {
        let mut conditions = Self::default();
        conditions.review_requested.values.insert(account);
        conditions
    }

    pub fn get(&self, kind: FieldKind) -> &FieldCondition {
        match kind {
            FieldKind::Author => &self.author,
            FieldKind::Repo => &self.repo,
            FieldKind::User => &self.user,
            FieldKind::Org => &self.org,
            FieldKind::ReviewRequested => &self.review_requested,
            FieldKind::Label => &self.label,
            FieldKind::Reviewer => &self.reviewer,
        }
    }

    pub fn get_mut(&mut self, kind: FieldKind) -> &mut FieldCondition {
        match kind {
            FieldKind::Author => &mut self.author,
            FieldKind::Repo => &mut self.repo,
            FieldKind::User => &mut self.user,
            FieldKind::Org => &mut self.org,
            FieldKind::ReviewRequested => &mut self.review_requested,
            FieldKind::Label => &mut self.label,
            FieldKind::Reviewer => &mut self.reviewer,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldCondition> {
        FieldKind::ALL.into_iter().map(|kind| self.get(kind))
    }
}

/// Splits an `org/team` value. Anything without exactly one separator, or
/// with an empty half, is a plain name.
pub fn split_team_token(value: &str) -> Option<(&str, &str)> {
    let parts: Vec<&str> = value.split('/').collect();
    if parts.len() != 2 || parts.iter().any(|part| part.is_empty()) {
        return None;
    }
    Some((parts[0], parts[1]))
}

pub fn is_team_token(value: &str) -> bool {
    split_team_token(value).is_some()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequesteeKind {
    User,
    Team,
}

/// A user or team whose review has been requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRequestee {
    pub kind: RequesteeKind,
    pub name: String,
}

impl ReviewRequestee {
    pub fn user(login: impl Into<String>) -> Self {
        Self {
            kind: RequesteeKind::User,
            name: login.into(),
        }
    }

    pub fn team(name: impl Into<String>) -> Self {
        Self {
            kind: RequesteeKind::Team,
            name: name.into(),
        }
    }
}

/// An open pull request as returned by one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub title: String,
    pub url: String,
    pub author_login: String,
    pub labels: Vec<String>,
    pub review_requests: Vec<ReviewRequestee>,
}

impl PullRequest {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn reviewer_names(&self) -> impl Iterator<Item = &str> {
        self.review_requests.iter().map(|r| r.name.as_str())
    }
}

/// Where the next search page starts, if there is one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageCursor {
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

impl PageCursor {
    pub fn last() -> Self {
        Self::default()
    }

    pub fn more(end_cursor: impl Into<String>) -> Self {
        Self {
            end_cursor: Some(end_cursor.into()),
            has_next_page: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub pull_requests: Vec<PullRequest>,
    pub cursor: PageCursor,
}

/// The code host the pipelines talk to.
#[async_trait]
pub trait Forge {
    /// Fetches one page of open pull requests for `query`, starting after
    /// `after` when given.
    async fn search_page(
        &self,
        query: &str,
        after: Option<&str>,
    ) -> Result<SearchPage, FetchError>;

    /// Lists the logins of the members of `org/team`.
    async fn team_members(&self, org: &str, team: &str) -> Result<Vec<String>, TeamLookupError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_set_keeps_first_occurrence_order() {
        let set: ValueSet = ["b", "a", "b", "c", "a"].into_iter().collect();
        assert_eq!(set.as_slice(), &["b", "a", "c"]);
    }

    #[test]
    fn default_conditions_cover_every_field() {
        let conditions = QueryConditions::default();
        for kind in FieldKind::ALL {
            let condition = conditions.get(kind);
            assert_eq!(condition.kind, kind);
            assert!(condition.inclusion);
            assert!(condition.values.is_empty());
        }
        assert_eq!(conditions.iter().count(), 7);
    }

    #[test]
    fn field_kind_keys() {
        assert_eq!(
            FieldKind::from_key("review-requested"),
            Some(FieldKind::ReviewRequested)
        );
        assert_eq!(FieldKind::from_key("Author"), None);
        assert_eq!(FieldKind::from_key("assignee"), None);
        assert!(FieldKind::Org.is_search_qualifier());
        assert!(!FieldKind::Label.is_search_qualifier());
    }

    #[test]
    fn team_tokens_need_exactly_one_separator() {
        assert_eq!(split_team_token("myorg/myteam"), Some(("myorg", "myteam")));
        assert!(!is_team_token("alice"));
        assert!(!is_team_token("a/b/c"));
        assert!(!is_team_token("/team"));
        assert!(!is_team_token("org/"));
    }

    #[test]
    fn inactive_condition_always_passes() {
        let condition = FieldCondition::new(FieldKind::Label).negated();
        assert!(condition.passes(|_| panic!("matcher must not run")));
    }

    #[test]
    fn polarity_inverts_match() {
        let include = FieldCondition::new(FieldKind::Label).with_values(["bug"]);
        assert!(include.passes(|_| true));
        assert!(!include.passes(|_| false));

        let exclude = include.clone().negated();
        assert!(!exclude.passes(|_| true));
        assert!(exclude.passes(|_| false));
    }
}
