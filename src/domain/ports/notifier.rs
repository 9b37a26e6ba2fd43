use crate::domain::events::DomainEvent;

/// Delivery port for [`DomainEvent`]s.
///
/// Notification is fire-and-forget: a failing consumer must never roll back
/// the write that produced the event.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: DomainEvent);

    fn notify_all(&self, events: Vec<DomainEvent>) {
        for event in events {
            self.notify(event);
        }
    }
}
