//! Non-blocking progress delivery over a bounded channel

use redline_domain::{ProgressSink, ProgressUpdate};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// Default buffer for [`ChannelSink::channel`]
pub const DEFAULT_PROGRESS_BUFFER: usize = 16;

/// Sink that forwards updates into an `mpsc` channel
///
/// Sending never waits: when the buffer is full the update is dropped, and
/// a closed receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::Sender<ProgressUpdate>,
}

impl ChannelSink {
    /// Wrap an existing sender
    pub fn new(sender: mpsc::Sender<ProgressUpdate>) -> Self {
        Self { sender }
    }

    /// Create a sink and its receiver
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<ProgressUpdate>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        (Self::new(sender), receiver)
    }
}

impl ProgressSink for ChannelSink {
    fn notify(&self, update: ProgressUpdate) {
        match self.sender.try_send(update) {
            Ok(()) => {}
            Err(TrySendError::Full(update)) => {
                warn!(
                    step = %update.step,
                    progress = update.progress,
                    "Progress buffer full, update dropped"
                );
            }
            Err(TrySendError::Closed(update)) => {
                debug!(step = %update.step, "Progress receiver gone, update dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_updates_arrive_in_order() {
        let (sink, mut rx) = ChannelSink::channel(4);
        sink.notify(ProgressUpdate::processing("Step 1/5", 10, "Parsing original contract..."));
        sink.notify(ProgressUpdate::processing(
            "Step 1/5",
            20,
            "Original contract parsed successfully",
        ));
        drop(sink);

        assert_eq!(rx.recv().await.map(|u| u.progress), Some(10));
        assert_eq!(rx.recv().await.map(|u| u.progress), Some(20));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_full_buffer_drops_instead_of_blocking() {
        let (sink, mut rx) = ChannelSink::channel(1);
        sink.notify(ProgressUpdate::processing("Step 1/5", 10, "first"));
        sink.notify(ProgressUpdate::processing("Step 1/5", 20, "second"));

        assert_eq!(rx.recv().await.map(|u| u.message), Some("first".to_string()));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_receiver_is_ignored() {
        let (sink, rx) = ChannelSink::channel(1);
        drop(rx);
        sink.notify(ProgressUpdate::processing("Completed", 100, "Processing complete!"));
    }
}
