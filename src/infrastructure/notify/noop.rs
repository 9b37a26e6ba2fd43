use crate::domain::events::DomainEvent;
use crate::domain::ports::notifier::Notifier;

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _event: DomainEvent) {}
}
