pub mod events;
pub mod router;

use futures_util::Stream;
use tokio::sync::mpsc;

pub use events::{PipelineEvent, StreamEvent, GENERIC_ERROR_MESSAGE};
pub use router::{EventRouter, RouterState};

/// Receiving end of one request's event channel.
///
/// Dropping it abandons the request: the router stops, and the pipeline
/// notices on its next send.
pub struct SearchStream {
    rx: mpsc::Receiver<StreamEvent>,
}

impl SearchStream {
    pub fn new(rx: mpsc::Receiver<StreamEvent>) -> Self {
        Self { rx }
    }

    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.rx.recv().await
    }

    pub fn into_stream(self) -> impl Stream<Item = StreamEvent> + Send {
        futures_util::stream::unfold(self.rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })
    }
}
