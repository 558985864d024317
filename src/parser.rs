//! The `ls` query language.
//!
//! A query is a whitespace-separated list of `key:value,value,...` tokens,
//! for example `author:alice,myorg/backend label:-wip repo:owner/name`.
//! A `-` in front of the value list negates the whole field. Tokens that are
//! not `key:value` pairs, or whose key is unknown, are ignored so that a
//! query can sit inside ordinary chat text.

use tracing::{debug, warn};

use crate::{
    error::ParseError,
    types::{FieldKind, QueryConditions},
};

const COMMAND_PREFIX: &str = "ls";

#[derive(Debug, PartialEq, Eq)]
struct FieldToken<'a> {
    kind: FieldKind,
    inclusion: bool,
    values: Vec<&'a str>,
}

/// Parses a query into a fully-populated set of conditions.
///
/// Repeated keys accumulate their values; the polarity of the last
/// occurrence wins. Tokens with an empty value list are logged and skipped.
pub fn parse(input: &str) -> QueryConditions {
    let mut conditions = QueryConditions::default();

    for token in input.split_whitespace() {
        match parse_token(token) {
            Ok(Some(field)) => {
                let condition = conditions.get_mut(field.kind);
                condition.inclusion = field.inclusion;
                condition.values.extend(field.values);
            }
            Ok(None) => debug!(token, "ignoring token"),
            Err(err) => warn!("skipping query token '{token}': {err}"),
        }
    }

    conditions
}

/// Recognises the `ls <query>` chat command and parses its query.
pub fn parse_command(message: &str) -> Option<QueryConditions> {
    let rest = message.trim_start().strip_prefix(COMMAND_PREFIX)?;
    if !rest.starts_with(char::is_whitespace) || rest.trim().is_empty() {
        return None;
    }
    Some(parse(rest))
}

fn parse_token(token: &str) -> Result<Option<FieldToken<'_>>, ParseError> {
    let Some((key, raw_values)) = token.split_once(':') else {
        return Ok(None);
    };
    let Some(kind) = FieldKind::from_key(key) else {
        return Ok(None);
    };

    let (inclusion, list) = match raw_values.strip_prefix('-') {
        Some(rest) => (false, rest),
        None => (true, raw_values),
    };

    let values: Vec<&str> = list.split(',').filter(|v| !v.is_empty()).collect();
    if values.is_empty() {
        return Err(ParseError::EmptyValueList {
            key: key.to_string(),
        });
    }

    Ok(Some(FieldToken {
        kind,
        inclusion,
        values,
    }))
}
