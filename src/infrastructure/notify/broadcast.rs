use crate::domain::events::DomainEvent;
use crate::domain::ports::notifier::Notifier;
use tokio::sync::broadcast;

/// Fans events out to in-process receivers. Events sent while nobody is
/// listening are dropped; slow receivers see `Lagged`.
pub struct BroadcastNotifier {
    tx: broadcast::Sender<DomainEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn receiver(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, event: DomainEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("no notification receivers");
        }
    }
}
