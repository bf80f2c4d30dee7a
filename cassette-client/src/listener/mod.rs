//! Event sink collaborator for server-pushed cluster events.

use cassette_core::protocol::ClusterEvent;

use std::sync::mpsc;

/// Receives decoded EVENT payloads (frames on stream −1).
///
/// The engine dispatches events as they interleave with responses; it
/// never buffers them. Implementations must not block for long, since
/// they run on the connection's thread between body reads.
pub trait EventSink {
    /// Delivers one decoded event.
    fn on_event(&self, event: ClusterEvent);
}

/// Default sink: logs and discards events.
#[derive(Debug, Default)]
pub struct DiscardEvents;

impl EventSink for DiscardEvents {
    fn on_event(&self, event: ClusterEvent) {
        tracing::debug!(?event, "discarding unhandled cluster event");
    }
}

/// Channel senders forward events to a consumer thread.
impl EventSink for mpsc::Sender<ClusterEvent> {
    fn on_event(&self, event: ClusterEvent) {
        if self.send(event).is_err() {
            tracing::warn!("event receiver dropped, cluster event lost");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cassette_core::protocol::{StatusChange, TopologyChange};

    #[test]
    fn channel_sink_forwards_events() {
        let (tx, rx) = mpsc::channel();
        let event = ClusterEvent::Status {
            change: StatusChange::Up,
            node: "127.0.0.1:9042".parse().unwrap(),
        };
        tx.on_event(event.clone());
        assert_eq!(rx.recv().unwrap(), event);
    }

    #[test]
    fn dropped_receiver_does_not_panic() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        tx.on_event(ClusterEvent::Topology {
            change: TopologyChange::NewNode,
            node: "127.0.0.1:9042".parse().unwrap(),
        });
    }
}
