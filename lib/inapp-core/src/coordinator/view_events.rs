use crate::coordinator::DisplayCoordinator;
use crate::message::Message;
use crate::platform::{MessageHandler, ViewListener};
use std::sync::{Arc, Weak};

/// Forwards a view's lifecycle notifications to the message handler and back
/// to the coordinator that owns the view.
pub(crate) struct ViewEvents {
    message: Message,
    handler: Arc<dyn MessageHandler>,
    coordinator: Weak<DisplayCoordinator>,
}

impl ViewEvents {
    pub(crate) fn new(
        message: Message,
        handler: Arc<dyn MessageHandler>,
        coordinator: Weak<DisplayCoordinator>,
    ) -> Self {
        Self {
            message,
            handler,
            coordinator,
        }
    }
}

impl ViewListener for ViewEvents {
    fn on_message_was_shown(&self) {
        self.handler.on_message_was_shown(&self.message);
    }

    fn on_message_will_dismiss(&self) {
        // A coordinator driven dismiss has already announced itself.
        let announced = self
            .coordinator
            .upgrade()
            .is_some_and(|coordinator| coordinator.is_dismiss_in_flight());
        if !announced {
            self.handler.on_message_will_dismiss(&self.message);
        }
    }

    fn on_message_was_dismissed(&self) {
        self.handler.on_message_was_dismissed(&self.message);
        if let Some(coordinator) = self.coordinator.upgrade() {
            coordinator.on_view_dismissed();
        }
    }
}
