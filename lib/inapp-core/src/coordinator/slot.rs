use crate::coordinator::DisplayCoordinator;
use log::debug;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Holds the one coordinator that is currently showing or about to show.
///
/// Owned by the [`DisplayContext`](crate::coordinator::DisplayContext) and
/// shared with each coordinator it creates, so a coordinator can step out once
/// it is dismissed.
#[derive(Default)]
pub struct ActiveSlot {
    current: Mutex<Option<Arc<DisplayCoordinator>>>,
}

impl ActiveSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<DisplayCoordinator>>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current(&self) -> Option<Arc<DisplayCoordinator>> {
        self.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }

    /// Puts `coordinator` in the slot, returning whichever one it replaced.
    pub(crate) fn occupy(
        &self,
        coordinator: Arc<DisplayCoordinator>,
    ) -> Option<Arc<DisplayCoordinator>> {
        debug!("Active message is now {}", coordinator.message().id);
        self.lock().replace(coordinator)
    }

    /// Empties the slot if it still holds `coordinator`. A newer occupant is left alone.
    pub(crate) fn release_if(&self, coordinator: &DisplayCoordinator) -> bool {
        let mut current = self.lock();
        match current.as_ref() {
            Some(active) if std::ptr::eq(Arc::as_ptr(active), coordinator) => {
                *current = None;
                debug!("Active message {} released", coordinator.message().id);
                true
            }
            _ => false,
        }
    }
}
