//! Bidirectional streaming: the channel a stream step talks over, and the
//! one-shot binding the sequencer hands back to the host.
//!
//! The engine only locates the stream handler and packages it; framing and
//! socket lifecycle are the host's job. A handler is expected to submit a
//! process-equivalent request itself when it wants the workflow to
//! advance -- running a stream never mutates the session.

use futures_util::future::BoxFuture;
use stepwise_types::FlowError;
use tokio::sync::mpsc;

/// Default channel capacity for [`MessageChannel::pair`].
const CHANNEL_CAPACITY: usize = 32;

/// One endpoint of a duplex text-message channel.
///
/// The step's handler receives one endpoint; the host transport pumps the
/// other against its socket.
pub struct MessageChannel {
    /// Messages arriving from the peer.
    pub incoming: mpsc::Receiver<String>,
    /// Messages sent to the peer.
    pub outgoing: mpsc::Sender<String>,
}

impl MessageChannel {
    /// Create a linked pair of endpoints with a small buffer.
    pub fn pair() -> (MessageChannel, MessageChannel) {
        let (tx_ab, rx_ab) = mpsc::channel(CHANNEL_CAPACITY);
        let (tx_ba, rx_ba) = mpsc::channel(CHANNEL_CAPACITY);
        (
            MessageChannel {
                incoming: rx_ba,
                outgoing: tx_ab,
            },
            MessageChannel {
                incoming: rx_ab,
                outgoing: tx_ba,
            },
        )
    }
}

/// A located stream handler, ready to be driven by the host.
///
/// One-shot: the host calls [`StreamBinding::run`] exactly once with the
/// handler-side endpoint of a [`MessageChannel`].
pub struct StreamBinding {
    handler: Box<dyn FnOnce(MessageChannel) -> BoxFuture<'static, Result<(), FlowError>> + Send>,
}

impl std::fmt::Debug for StreamBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamBinding").finish_non_exhaustive()
    }
}

impl StreamBinding {
    /// Wrap an async handler over a message channel.
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: FnOnce(MessageChannel) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), FlowError>> + Send + 'static,
    {
        Self {
            handler: Box::new(move |channel| Box::pin(handler(channel))),
        }
    }

    /// Drive the handler to completion over `channel`.
    pub async fn run(self, channel: MessageChannel) -> Result<(), FlowError> {
        (self.handler)(channel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pair_endpoints_are_linked() {
        let (mut host, mut handler) = MessageChannel::pair();

        host.outgoing.send("ping".to_string()).await.unwrap();
        assert_eq!(handler.incoming.recv().await.as_deref(), Some("ping"));

        handler.outgoing.send("pong".to_string()).await.unwrap();
        assert_eq!(host.incoming.recv().await.as_deref(), Some("pong"));
    }

    #[tokio::test]
    async fn test_binding_runs_handler_over_channel() {
        let binding = StreamBinding::new(|mut channel: MessageChannel| async move {
            while let Some(msg) = channel.incoming.recv().await {
                let reply = format!("echo: {msg}");
                if channel.outgoing.send(reply).await.is_err() {
                    break;
                }
            }
            Ok::<(), FlowError>(())
        });

        let (mut host, handler_end) = MessageChannel::pair();
        let task = tokio::spawn(binding.run(handler_end));

        host.outgoing.send("hello".to_string()).await.unwrap();
        assert_eq!(host.incoming.recv().await.as_deref(), Some("echo: hello"));

        drop(host);
        task.await.unwrap().unwrap();
    }
}
