//! Chat worker: owns the [`ChatClient`] and sends queued messages one at a time.

use grid_core::{ChatClient, MarkdownRenderer, SendOutcome};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::events::{AppEvent, ChannelTranscriptSink, EventSender};

/// Handle for queueing operator messages.
#[derive(Clone)]
pub struct ChatQueue {
    tx: mpsc::UnboundedSender<String>,
}

impl ChatQueue {
    #[cfg(test)]
    pub(crate) fn from_sender(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx }
    }

    /// Returns false when the worker is gone.
    pub fn submit(&self, message: String) -> bool {
        self.tx.send(message).is_ok()
    }
}

/// Spawn the worker. Messages are processed in submission order; each send runs to
/// completion (or failure) before the next one starts.
pub fn spawn<R>(mut client: ChatClient<R>, events: EventSender) -> (ChatQueue, JoinHandle<()>)
where
    R: MarkdownRenderer + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let handle = tokio::spawn(async move {
        let mut sink = ChannelTranscriptSink::new(events.clone());
        while let Some(message) = rx.recv().await {
            let outcome = client.send(&message, &mut sink).await;
            let unsent = match outcome {
                SendOutcome::Completed { reply } => {
                    tracing::info!(reply_len = reply.len(), "chat reply complete");
                    None
                }
                SendOutcome::Ignored => None,
                SendOutcome::InitFailed => {
                    tracing::info!("chat session unavailable, returning message to the input");
                    Some(message)
                }
                other => {
                    tracing::info!(outcome = ?other, "chat send did not complete");
                    None
                }
            };
            if events.send(AppEvent::ChatSettled { unsent }).is_err() {
                break;
            }
        }
        tracing::debug!("chat worker stopped");
    });
    (ChatQueue { tx }, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_core::{ChatTransport, ChatTurn, FragmentStream, GridError, GridResult, MessageBody, Sender, Transcript};
    use std::sync::Arc;

    struct Echo;

    #[async_trait::async_trait]
    impl ChatTransport for Echo {
        async fn open_stream(&self, _context: &[ChatTurn], message: &str) -> GridResult<FragmentStream> {
            let parts = vec![Ok::<_, GridError>(format!("echo: {}", message))];
            Ok(Box::pin(futures::stream::iter(parts)))
        }
    }

    #[tokio::test]
    async fn worker_replies_in_submission_order() {
        let client = ChatClient::new(Box::new(|| {
            let t: Arc<dyn ChatTransport> = Arc::new(Echo);
            Ok(t)
        }));
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let (queue, handle) = spawn(client, events_tx);

        assert!(queue.submit("one".into()));
        assert!(queue.submit("two".into()));
        drop(queue);
        handle.await.unwrap();

        let mut transcript = Transcript::default();
        let mut settled = 0;
        while let Ok(event) = events_rx.try_recv() {
            match event {
                AppEvent::Transcript(update) => transcript.apply(update),
                AppEvent::ChatSettled { unsent } => {
                    assert_eq!(unsent, None);
                    settled += 1;
                }
                _ => {}
            }
        }
        assert_eq!(settled, 2);
        let order: Vec<Sender> = transcript.messages().iter().map(|m| m.sender).collect();
        assert_eq!(order, vec![Sender::Operator, Sender::Assistant, Sender::Operator, Sender::Assistant]);
        match &transcript.messages()[3].body {
            MessageBody::Markup(m) => assert_eq!(m.plain_text(), "echo: two"),
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[tokio::test]
    async fn message_comes_back_when_no_session_can_be_created() {
        let client = ChatClient::new(Box::new(|| Err(GridError::MissingCredential("GRID_LLM_API_KEY".into()))));
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let (queue, handle) = spawn(client, events_tx);

        assert!(queue.submit("scan the perimeter".into()));
        drop(queue);
        handle.await.unwrap();

        let mut transcript = Transcript::default();
        let mut returned = Vec::new();
        while let Ok(event) = events_rx.try_recv() {
            match event {
                AppEvent::Transcript(update) => transcript.apply(update),
                AppEvent::ChatSettled { unsent } => returned.push(unsent),
                _ => {}
            }
        }
        assert_eq!(returned, vec![Some("scan the perimeter".to_string())]);
        assert_eq!(transcript.messages().len(), 1);
        assert!(matches!(transcript.messages()[0].body, MessageBody::Error(_)));
    }
}
