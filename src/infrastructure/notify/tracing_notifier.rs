use crate::domain::events::DomainEvent;
use crate::domain::ports::notifier::Notifier;

/// Writes every event to the `crowdsignal::events` tracing target.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, event: DomainEvent) {
        let payload = serde_json::to_string(&event).unwrap_or_default();
        tracing::info!(target: "crowdsignal::events", kind = event.kind(), %payload, "notification");
    }
}
