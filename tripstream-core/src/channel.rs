//! Local channels for inter-task communication.
//!
//! Uses crossbeam-channel for bounded, backpressure-aware communication
//! between pipeline stages running in different threads.

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, Receiver, Sender};

use crate::types::StreamElement;

/// Sender side of a local channel.
#[derive(Clone)]
pub struct LocalChannelSender<T> {
    sender: Sender<StreamElement<T>>,
}

impl<T> LocalChannelSender<T> {
    /// Send a stream element to the channel.
    ///
    /// Blocks if the channel is full (backpressure).
    pub fn send(&self, element: StreamElement<T>) -> Result<()> {
        self.sender
            .send(element)
            .map_err(|_| anyhow!("channel closed: receiver dropped"))
    }
}

/// Receiver side of a local channel.
pub struct LocalChannelReceiver<T> {
    receiver: Receiver<StreamElement<T>>,
}

impl<T> LocalChannelReceiver<T> {
    /// Receive the next stream element from the channel.
    ///
    /// Blocks until an element is available.
    pub fn recv(&self) -> Result<StreamElement<T>> {
        self.receiver
            .recv()
            .map_err(|_| anyhow!("channel closed: sender dropped"))
    }
}

/// Create a bounded local channel pair.
///
/// When the channel is full, `send()` blocks until space is available,
/// propagating backpressure through the pipeline.
pub fn local_channel<T>(capacity: usize) -> (LocalChannelSender<T>, LocalChannelReceiver<T>) {
    let (sender, receiver) = bounded(capacity);
    (
        LocalChannelSender { sender },
        LocalChannelReceiver { receiver },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StreamRecord;

    #[test]
    fn test_local_channel_send_recv() {
        let (sender, receiver) = local_channel::<i32>(10);

        sender.send(StreamElement::record(42)).unwrap();

        match receiver.recv().unwrap() {
            StreamElement::Record(rec) => assert_eq!(rec.value, 42),
            other => panic!("expected Record, got {other:?}"),
        }
    }

    #[test]
    fn test_local_channel_watermark_and_end() {
        let (sender, receiver) = local_channel::<i32>(10);

        sender.send(StreamElement::watermark(1000)).unwrap();
        sender.send(StreamElement::End).unwrap();

        assert!(matches!(
            receiver.recv().unwrap(),
            StreamElement::Watermark(wm) if wm.timestamp == 1000
        ));
        assert_eq!(receiver.recv().unwrap(), StreamElement::End);
    }

    #[test]
    fn test_local_channel_closed() {
        let (sender, receiver) = local_channel::<i32>(10);

        sender.send(StreamElement::record(42)).unwrap();
        drop(sender);

        // Buffered element is still delivered, then recv fails.
        assert!(receiver.recv().is_ok());
        assert!(receiver.recv().is_err());
    }

    #[test]
    fn test_local_channel_clone_sender() {
        let (sender, receiver) = local_channel::<i32>(10);
        let sender2 = sender.clone();

        sender.send(StreamElement::record(1)).unwrap();
        sender2.send(StreamElement::record(2)).unwrap();

        assert_eq!(
            receiver.recv().unwrap(),
            StreamElement::Record(StreamRecord::new(1))
        );
        assert_eq!(
            receiver.recv().unwrap(),
            StreamElement::Record(StreamRecord::new(2))
        );
    }
}
