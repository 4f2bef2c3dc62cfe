//! Prompt construction. Everything here is pure: same input, same messages.

use chrono::{DateTime, SecondsFormat, Utc};

use super::instructions::{LONG_FORM_TEMPLATE, RESPONSE_PROMPT, REWRITE_PROMPT};
use crate::llm::ChatMessage;

#[derive(Debug, Clone)]
pub struct PromptInput<'a> {
    pub query: &'a str,
    pub history: &'a [ChatMessage],
    pub context: &'a str,
    pub date: DateTime<Utc>,
}

/// `[system prompt with context, history..., user query]`
pub fn build_response_messages(input: &PromptInput<'_>) -> Vec<ChatMessage> {
    let date = input.date.to_rfc3339_opts(SecondsFormat::Millis, true);
    let system = format!(
        "{} \n {}",
        render(
            RESPONSE_PROMPT,
            &[("{context}", input.context), ("{date}", &date)]
        ),
        LONG_FORM_TEMPLATE
    );

    let mut messages = Vec::with_capacity(input.history.len() + 2);
    messages.push(ChatMessage::system(system));
    messages.extend(input.history.iter().cloned());
    messages.push(ChatMessage::user(input.query));
    messages
}

pub fn build_rewrite_prompt(history: &[ChatMessage], query: &str) -> String {
    let chat_history = format_history(history);
    render(
        REWRITE_PROMPT,
        &[("{chat_history}", &chat_history), ("{query}", query)],
    )
}

/// One `role: content` line per turn.
pub fn format_history(history: &[ChatMessage]) -> String {
    history
        .iter()
        .map(|message| format!("{}: {}", message.role.as_str(), message.content))
        .collect::<Vec<_>>()
        .join("\n")
}

// Single pass, so placeholder-looking text inside values is left alone.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match vars.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}
