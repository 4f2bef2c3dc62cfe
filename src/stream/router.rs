use tokio::sync::mpsc;

use super::events::{PipelineEvent, StreamEvent, GENERIC_ERROR_MESSAGE};
use crate::rag::{resolve_citations, Document};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    Started,
    SourcesEmitted,
    Streaming,
    Ended,
    Errored,
}

impl RouterState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RouterState::Ended | RouterState::Errored)
    }
}

/// Per-request state machine turning pipeline checkpoints into client events.
///
/// Guarantees `sources` comes before any `response`, and that exactly one of
/// `end`/`error` is emitted. Anything arriving after that is dropped.
#[derive(Debug)]
pub struct EventRouter {
    state: RouterState,
    sources: Vec<Document>,
    answer: String,
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRouter {
    pub fn new() -> Self {
        Self {
            state: RouterState::Started,
            sources: Vec::new(),
            answer: String::new(),
        }
    }

    pub fn state(&self) -> RouterState {
        self.state
    }

    pub fn route(&mut self, event: PipelineEvent) -> Option<StreamEvent> {
        if self.state.is_terminal() {
            tracing::warn!(state = ?self.state, event = ?event, "Dropping pipeline event after terminal state");
            return None;
        }

        match event {
            PipelineEvent::SourcesRetrieved(docs) => {
                if self.state != RouterState::Started {
                    tracing::warn!(state = ?self.state, "Ignoring repeated sources checkpoint");
                    return None;
                }
                self.state = RouterState::SourcesEmitted;
                self.sources = docs.clone();
                Some(StreamEvent::Sources(docs))
            }
            PipelineEvent::ResponseChunk(chunk) => {
                if self.state == RouterState::Started {
                    tracing::warn!("Response chunk arrived before sources");
                    return Some(self.fail());
                }
                self.state = RouterState::Streaming;
                self.answer.push_str(&chunk);
                Some(StreamEvent::Response(chunk))
            }
            PipelineEvent::ResponseFinished => {
                if self.state == RouterState::Started {
                    tracing::warn!("Response finished before sources");
                    return Some(self.fail());
                }
                self.state = RouterState::Ended;
                self.log_citations();
                Some(StreamEvent::End)
            }
            PipelineEvent::Failed(err) => {
                tracing::debug!(stage = err.stage(), "Pipeline failure routed to client");
                Some(self.fail())
            }
        }
    }

    /// Called when the pipeline side hung up. Emits `error` unless a terminal
    /// event already went out.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        if self.state.is_terminal() {
            return None;
        }
        tracing::warn!(state = ?self.state, "Pipeline stopped without a terminal event");
        Some(self.fail())
    }

    /// Drives the router until a terminal event is delivered or the client
    /// goes away. Dropping `input` afterwards lets the pipeline notice and stop.
    pub async fn run(
        mut self,
        mut input: mpsc::Receiver<PipelineEvent>,
        output: mpsc::Sender<StreamEvent>,
    ) {
        while let Some(event) = input.recv().await {
            if let Some(out) = self.route(event) {
                if output.send(out).await.is_err() {
                    tracing::debug!("Client stopped listening");
                    return;
                }
            }
            if self.state.is_terminal() {
                return;
            }
        }

        if let Some(out) = self.finish() {
            let _ = output.send(out).await;
        }
    }

    fn fail(&mut self) -> StreamEvent {
        self.state = RouterState::Errored;
        StreamEvent::Error(GENERIC_ERROR_MESSAGE.to_string())
    }

    fn log_citations(&self) {
        let cited = resolve_citations(&self.answer, &self.sources);
        let urls: Vec<&str> = cited.iter().map(|(_, doc)| doc.metadata.url.as_str()).collect();
        tracing::info!(
            sources = self.sources.len(),
            cited = cited.len(),
            answer_chars = self.answer.chars().count(),
            "Answer complete; cited {:?}",
            urls
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::PipelineError;
    use crate::testing::doc;

    #[test]
    fn happy_path_transitions() {
        let mut router = EventRouter::new();
        assert_eq!(router.state(), RouterState::Started);

        let sources = router.route(PipelineEvent::SourcesRetrieved(vec![doc("d0")]));
        assert!(matches!(sources, Some(StreamEvent::Sources(ref d)) if d.len() == 1));
        assert_eq!(router.state(), RouterState::SourcesEmitted);

        let chunk = router.route(PipelineEvent::ResponseChunk("Docker [1]".into()));
        assert_eq!(chunk, Some(StreamEvent::Response("Docker [1]".into())));
        assert_eq!(router.state(), RouterState::Streaming);

        assert_eq!(router.route(PipelineEvent::ResponseFinished), Some(StreamEvent::End));
        assert_eq!(router.state(), RouterState::Ended);
    }

    #[test]
    fn empty_answer_can_end_straight_after_sources() {
        let mut router = EventRouter::new();
        router.route(PipelineEvent::SourcesRetrieved(Vec::new()));
        assert_eq!(router.route(PipelineEvent::ResponseFinished), Some(StreamEvent::End));
    }

    #[test]
    fn nothing_is_emitted_after_end() {
        let mut router = EventRouter::new();
        router.route(PipelineEvent::SourcesRetrieved(Vec::new()));
        router.route(PipelineEvent::ResponseFinished);

        assert_eq!(router.route(PipelineEvent::ResponseChunk("late".into())), None);
        assert_eq!(
            router.route(PipelineEvent::Failed(PipelineError::generation("late"))),
            None
        );
        assert_eq!(router.finish(), None);
        assert_eq!(router.state(), RouterState::Ended);
    }

    #[test]
    fn failure_mid_stream_is_terminal() {
        let mut router = EventRouter::new();
        router.route(PipelineEvent::SourcesRetrieved(vec![doc("d0")]));
        router.route(PipelineEvent::ResponseChunk("partial".into()));

        let err = router.route(PipelineEvent::Failed(PipelineError::generation("reset")));
        assert_eq!(err, Some(StreamEvent::Error(GENERIC_ERROR_MESSAGE.into())));
        assert_eq!(router.state(), RouterState::Errored);
        assert_eq!(router.route(PipelineEvent::ResponseChunk("more".into())), None);
        assert_eq!(router.route(PipelineEvent::ResponseFinished), None);
    }

    #[test]
    fn failure_before_sources_is_reported() {
        let mut router = EventRouter::new();
        let err = router.route(PipelineEvent::Failed(PipelineError::retrieval("dns")));
        assert!(matches!(err, Some(StreamEvent::Error(_))));
    }

    #[test]
    fn chunk_before_sources_fails_the_request() {
        let mut router = EventRouter::new();
        let out = router.route(PipelineEvent::ResponseChunk("too early".into()));
        assert!(matches!(out, Some(StreamEvent::Error(_))));
        assert_eq!(router.state(), RouterState::Errored);
    }

    #[test]
    fn repeated_sources_are_ignored() {
        let mut router = EventRouter::new();
        router.route(PipelineEvent::SourcesRetrieved(vec![doc("d0")]));
        assert_eq!(router.route(PipelineEvent::SourcesRetrieved(Vec::new())), None);
        assert_eq!(router.state(), RouterState::SourcesEmitted);
    }

    #[test]
    fn finish_without_terminal_emits_error() {
        let mut router = EventRouter::new();
        router.route(PipelineEvent::SourcesRetrieved(Vec::new()));
        assert!(matches!(router.finish(), Some(StreamEvent::Error(_))));
        assert_eq!(router.finish(), None);
    }

    #[tokio::test]
    async fn run_stops_after_terminal_event() {
        let (in_tx, in_rx) = mpsc::channel(8);
        let (out_tx, mut out_rx) = mpsc::channel(8);

        in_tx
            .send(PipelineEvent::SourcesRetrieved(vec![doc("d0")]))
            .await
            .expect("send");
        in_tx.send(PipelineEvent::ResponseChunk("a".into())).await.expect("send");
        in_tx.send(PipelineEvent::ResponseFinished).await.expect("send");
        in_tx.send(PipelineEvent::ResponseChunk("b".into())).await.expect("send");

        EventRouter::new().run(in_rx, out_tx).await;

        let mut kinds = Vec::new();
        while let Some(event) = out_rx.recv().await {
            kinds.push(event.kind());
        }
        assert_eq!(kinds, vec!["sources", "response", "end"]);
        assert!(in_tx.is_closed());
    }

    #[tokio::test]
    async fn run_reports_dropped_pipeline() {
        let (in_tx, in_rx) = mpsc::channel(8);
        let (out_tx, mut out_rx) = mpsc::channel(8);
        in_tx
            .send(PipelineEvent::SourcesRetrieved(Vec::new()))
            .await
            .expect("send");
        drop(in_tx);

        EventRouter::new().run(in_rx, out_tx).await;

        assert_eq!(out_rx.recv().await.map(|e| e.kind()), Some("sources"));
        assert_eq!(out_rx.recv().await.map(|e| e.kind()), Some("error"));
        assert_eq!(out_rx.recv().await, None);
    }
}
