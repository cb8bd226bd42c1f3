//! Markdown transcript export and import.
//!
//! The format is a `# Debate Topic:` header followed by one
//! `**Role**: content` block per message, blank-line separated. Content may
//! span multiple lines; a new role line starts the next message.

use regex::Regex;
use tracing::warn;

use crate::event::Role;
use crate::transcript::{Message, Transcript};

/// Serialize an assembled transcript to markdown.
pub fn to_markdown(topic: &str, messages: &[Message]) -> String {
    let mut output = format!("# Debate Topic: {}\n\n", topic);
    for message in messages {
        output.push_str(&format!(
            "**{}**: {}\n\n",
            message.role.display_name(),
            message.content
        ));
    }
    output
}

/// A transcript parsed back from markdown.
#[derive(Debug, Default)]
pub struct ImportedDebate {
    pub topic: Option<String>,
    pub transcript: Transcript,
}

/// Parse a saved transcript. Blocks with unrecognized role labels are
/// skipped. The importer bypasses streaming entirely; every parsed message
/// arrives closed via `append_message`.
pub fn from_markdown(input: &str) -> ImportedDebate {
    let role_line = Regex::new(r"^\*\*(.*?)\*\*: (.*)").unwrap();
    let topic_line = Regex::new(r"^# Debate Topic: (.*)").unwrap();

    let mut imported = ImportedDebate::default();
    let mut current: Option<(Option<Role>, Vec<String>)> = None;

    let flush = |current: &mut Option<(Option<Role>, Vec<String>)>,
                 imported: &mut ImportedDebate| {
        if let Some((role, lines)) = current.take() {
            let content = lines.join("\n").trim().to_string();
            match role {
                Some(role) => imported.transcript.append_message(role, content),
                None => warn!("skipping transcript block with unknown role label"),
            }
        }
    };

    for line in input.lines() {
        if let Some(captures) = topic_line.captures(line) {
            imported.topic = Some(captures[1].trim().to_string());
            continue;
        }
        if let Some(captures) = role_line.captures(line) {
            flush(&mut current, &mut imported);
            let role = Role::from_label(&captures[1]);
            if role.is_none() {
                warn!(label = &captures[1], "unrecognized role label in transcript");
            }
            current = Some((role, vec![captures[2].to_string()]));
        } else if let Some((_, ref mut lines)) = current {
            lines.push(line.to_string());
        }
    }
    flush(&mut current, &mut imported);

    imported
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format() {
        let mut transcript = Transcript::new();
        transcript.append_message(Role::Moderator, "Welcome to the debate.");
        transcript.append_message(Role::Proponent, "I argue in favor.");

        let markdown = to_markdown("Cats vs dogs", transcript.messages());
        assert!(markdown.starts_with("# Debate Topic: Cats vs dogs\n\n"));
        assert!(markdown.contains("**Moderator**: Welcome to the debate.\n\n"));
        assert!(markdown.contains("**Proponent**: I argue in favor.\n\n"));
    }

    #[test]
    fn test_round_trip_preserves_order_and_content() {
        let mut transcript = Transcript::new();
        transcript.append_message(Role::Moderator, "Opening remarks.");
        transcript.append_message(Role::Proponent, "First point.\n\nSecond point.");
        transcript.append_message(Role::Opponent, "A rebuttal.");
        transcript.append_message(Role::Proponent, "Closing.");

        let markdown = to_markdown("Cats vs dogs", transcript.messages());
        let imported = from_markdown(&markdown);

        assert_eq!(imported.topic.as_deref(), Some("Cats vs dogs"));
        let original: Vec<_> = transcript
            .messages()
            .iter()
            .map(|m| (m.role, m.content.clone()))
            .collect();
        let restored: Vec<_> = imported
            .transcript
            .messages()
            .iter()
            .map(|m| (m.role, m.content.clone()))
            .collect();
        assert_eq!(original, restored);
    }

    #[test]
    fn test_import_skips_unknown_role_labels() {
        let input = "# Debate Topic: T\n\n**Narrator**: off-script\n\n**Opponent**: on-script\n";
        let imported = from_markdown(input);
        let messages = imported.transcript.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::Opponent);
        assert_eq!(messages[0].content, "on-script");
    }

    #[test]
    fn test_import_without_topic_header() {
        let imported = from_markdown("**Moderator**: hello\n");
        assert!(imported.topic.is_none());
        assert_eq!(imported.transcript.messages().len(), 1);
    }
}
