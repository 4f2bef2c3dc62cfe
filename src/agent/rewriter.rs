use std::sync::Arc;

use super::prompt::build_rewrite_prompt;
use crate::core::config::LlmSettings;
use crate::core::errors::PipelineError;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};

/// Turns a follow-up question into a standalone search phrase.
#[derive(Clone)]
pub struct QueryRewriter {
    llm: Arc<dyn LlmProvider>,
    settings: LlmSettings,
}

impl QueryRewriter {
    pub fn new(llm: Arc<dyn LlmProvider>, settings: LlmSettings) -> Self {
        Self { llm, settings }
    }

    /// One completion call, no retry. A blank completion falls back to the
    /// query as typed.
    pub async fn rewrite(
        &self,
        history: &[ChatMessage],
        query: &str,
    ) -> Result<String, PipelineError> {
        let prompt = build_rewrite_prompt(history, query);
        let request =
            ChatRequest::new(vec![ChatMessage::user(prompt)]).with_settings(&self.settings);

        let raw = self
            .llm
            .chat(request)
            .await
            .map_err(PipelineError::generation)?;

        let rewritten = parse_rewrite(&raw).unwrap_or_else(|| query.trim().to_string());
        tracing::debug!(original = %query, rewritten = %rewritten, "Query rewritten");
        Ok(rewritten)
    }
}

fn parse_rewrite(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|line| !line.is_empty())?;
    let line = ["Rephrased question:", "Rephrased:"]
        .iter()
        .find_map(|prefix| line.strip_prefix(prefix))
        .unwrap_or(line)
        .trim();
    (!line.is_empty()).then(|| line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedChat;
    use serde_json::json;

    fn settings() -> LlmSettings {
        LlmSettings::from_config(&json!({})).expect("settings")
    }

    #[tokio::test]
    async fn standalone_question_is_kept() {
        let llm = Arc::new(ScriptedChat::new(&[]).with_reply("What is Docker\n"));
        let rewriter = QueryRewriter::new(llm.clone(), settings());

        let rewritten = rewriter.rewrite(&[], "What is Docker?").await.expect("rewrite");

        assert_eq!(rewritten, "What is Docker");
        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages.len(), 1);
        assert!(requests[0].messages[0]
            .content
            .contains("Conversation:\n\n\nFollow up question: What is Docker?"));
    }

    #[tokio::test]
    async fn blank_completion_falls_back_to_query() {
        let llm = Arc::new(ScriptedChat::new(&[]).with_reply("  \n"));
        let rewritten = QueryRewriter::new(llm, settings())
            .rewrite(&[], " Rust async ")
            .await
            .expect("rewrite");
        assert_eq!(rewritten, "Rust async");
    }

    #[test]
    fn parse_strips_echoed_label() {
        assert_eq!(
            parse_rewrite("Rephrased: Population of New York City").as_deref(),
            Some("Population of New York City")
        );
        assert_eq!(parse_rewrite("\n  Capital of france \nextra"), Some("Capital of france".into()));
        assert_eq!(parse_rewrite("Rephrased:   "), None);
    }
}
