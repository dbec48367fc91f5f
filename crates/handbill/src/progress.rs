//! Progress observers.
//!
//! Progress is advisory, not authoritative: delivery is fire-and-forget with
//! no backpressure, and a slow or dropped observer never stalls an upload.

use billproto::ProgressEvent;
use tokio::sync::mpsc;

/// A sink for progress events. Called from upload worker tasks; must not
/// block.
pub trait ProgressObserver: Send + Sync {
    fn on_event(&self, event: ProgressEvent);
}

/// Discards all events.
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn on_event(&self, _event: ProgressEvent) {}
}

/// Forwards events over an unbounded channel to whoever wants them (UI,
/// logging, a test harness). A closed receiver drops events silently.
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_event(&self, event: ProgressEvent) {
        // Fire-and-forget: a gone receiver is not an error
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billproto::ProgressStep;

    #[test]
    fn test_channel_observer_delivers() {
        let (observer, mut rx) = ChannelObserver::new();
        observer.on_event(ProgressEvent::new(
            ProgressStep::Started,
            0,
            "a.png",
            2,
            0.0,
            0,
        ));
        let event = rx.try_recv().unwrap();
        assert_eq!(event.step, ProgressStep::Started);
        assert_eq!(event.file_name, "a.png");
    }

    #[test]
    fn test_dropped_receiver_is_silent() {
        let (observer, rx) = ChannelObserver::new();
        drop(rx);
        // Must not panic
        observer.on_event(ProgressEvent::new(
            ProgressStep::Completed,
            0,
            "a.png",
            1,
            1.0,
            0,
        ));
    }
}
