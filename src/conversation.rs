//! Conversations handed to the chat platform.
//!
//! The transport itself lives outside this crate; it only has to implement
//! [`ChatSink`]. [`WriterSink`] renders conversations onto any writer, which
//! is what the command-line front end and the tests use.

use std::{
    io::{self, Write},
    sync::Mutex,
};

use async_trait::async_trait;

use crate::error::FetchError;

pub const COMMAND_HEADER: &str = ":memo: Review waiting list!";
pub const REMINDER_HEADER: &str = ":memo: Please review!";
pub const FOOTER: &str = "That's all. Please review!";
pub const EMPTY_RESULT: &str = "No pull requests for now.";

/// Who a conversation is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Whoever sent the command being answered.
    Requester,
    /// A chat user, by handle.
    Handle(String),
}

#[async_trait]
pub trait ChatSink {
    /// Delivers one conversation, one message per line.
    async fn say(&self, recipient: &Recipient, lines: &[String]) -> io::Result<()>;
}

/// Reply to an `ls` command.
pub fn command_conversation(lines: Vec<String>) -> Vec<String> {
    let mut conversation = Vec::with_capacity(lines.len() + 2);
    conversation.push(COMMAND_HEADER.to_string());
    if lines.is_empty() {
        conversation.push(EMPTY_RESULT.to_string());
    } else {
        conversation.extend(lines);
        conversation.push(FOOTER.to_string());
    }
    conversation
}

/// Reply to an `ls` command whose fetch failed.
pub fn failure_conversation(err: &FetchError) -> Vec<String> {
    vec![
        COMMAND_HEADER.to_string(),
        format!(":warning: Failed to fetch pull requests: {err}"),
    ]
}

/// A personal reminder; nothing is sent when there is nothing to review.
pub fn reminder_conversation(lines: Vec<String>) -> Option<Vec<String>> {
    if lines.is_empty() {
        return None;
    }
    let mut conversation = Vec::with_capacity(lines.len() + 2);
    conversation.push(REMINDER_HEADER.to_string());
    conversation.extend(lines);
    conversation.push(FOOTER.to_string());
    Some(conversation)
}

/// Writes conversations as plain lines, prefixing reminders with
/// `@<handle>`.
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl<W: Write + Send> ChatSink for WriterSink<W> {
    async fn say(&self, recipient: &Recipient, lines: &[String]) -> io::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| io::Error::other("chat writer lock poisoned"))?;
        for line in lines {
            match recipient {
                Recipient::Requester => writeln!(writer, "{line}")?,
                Recipient::Handle(handle) => writeln!(writer, "@{handle} {line}")?,
            }
        }
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_conversation_with_results() {
        let conversation = command_conversation(vec!["1. a".to_string(), "2. b".to_string()]);
        assert_eq!(
            conversation,
            vec![
                ":memo: Review waiting list!",
                "1. a",
                "2. b",
                "That's all. Please review!"
            ]
        );
    }

    #[test]
    fn command_conversation_without_results() {
        assert_eq!(
            command_conversation(Vec::new()),
            vec![":memo: Review waiting list!", "No pull requests for now."]
        );
    }

    #[test]
    fn reminder_only_when_something_to_review() {
        assert_eq!(reminder_conversation(Vec::new()), None);
        assert_eq!(
            reminder_conversation(vec!["1. a".to_string()]).unwrap(),
            vec![":memo: Please review!", "1. a", "That's all. Please review!"]
        );
    }

    #[test]
    fn failure_mentions_the_cause() {
        let lines = failure_conversation(&FetchError::GraphQL("rate limited".to_string()));
        assert_eq!(lines[0], COMMAND_HEADER);
        assert!(lines[1].contains("rate limited"));
    }

    #[tokio::test]
    async fn writer_sink_prefixes_handles() {
        let sink = WriterSink::new(Vec::new());
        sink.say(&Recipient::Requester, &["hello".to_string()])
            .await
            .unwrap();
        sink.say(&Recipient::Handle("alice".to_string()), &["hi".to_string()])
            .await
            .unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(output, "hello\n@alice hi\n");
    }
}
