use crate::types::{FieldCondition, PullRequest, QueryConditions, split_team_token};

/// Title fragments that mark a pull request as not ready for review.
const IGNORE_WORDS: [&str; 3] = ["wip", "dontmerge", "donotmerge"];

/// Lowercases a title and drops quotes and whitespace, so that
/// `"Don't merge"` and `[W I P]` are caught too.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '\'' | '"' | '`'))
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn is_ignorable(pr: &PullRequest) -> bool {
    let sanitized = sanitize_title(&pr.title);
    IGNORE_WORDS.iter().any(|word| sanitized.contains(word))
}

pub fn matches_label(pr: &PullRequest, label: &FieldCondition) -> bool {
    label.passes(|values| values.iter().any(|value| pr.has_label(value)))
}

/// Team values are compared by their team name only, since GitHub reports a
/// requested team without its organisation.
pub fn matches_reviewer(pr: &PullRequest, reviewer: &FieldCondition) -> bool {
    reviewer.passes(|values| {
        values.iter().any(|value| {
            let name = split_team_token(value).map_or(value, |(_, team)| team);
            pr.reviewer_names().any(|requested| requested == name)
        })
    })
}

pub fn format_pull_request(index: usize, pr: &PullRequest) -> String {
    let reviewers: Vec<&str> = pr.reviewer_names().collect();
    let review_text = if reviewers.is_empty() {
        "no reviewer assigned".to_string()
    } else {
        format!("reviewer: {}", reviewers.join(" "))
    };
    format!(
        "{}. \"{}\" {} by {} {}",
        index + 1,
        pr.title,
        pr.url,
        pr.author_login,
        review_text
    )
}

/// Applies the client-side filters and renders the survivors, numbered from
/// one, in fetch order.
pub fn apply_filters(prs: &[PullRequest], conditions: &QueryConditions) -> Vec<String> {
    prs.iter()
        .filter(|pr| !is_ignorable(pr))
        .filter(|pr| matches_label(pr, &conditions.label))
        .filter(|pr| matches_reviewer(pr, &conditions.reviewer))
        .enumerate()
        .map(|(index, pr)| format_pull_request(index, pr))
        .collect()
}
