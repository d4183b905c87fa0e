use crate::config::Config;
use crate::coordinator::slot::ActiveSlot;
use crate::coordinator::DisplayCoordinator;
use crate::message::{Message, MessageContent};
use crate::platform::{dispatch, HostSurface, Platform, SurfaceError};
use crate::retry::RetryTimer;
use crate::{InAppError, InAppResult};
use log::{debug, error};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::{AbortHandle, JoinHandle};

#[derive(Debug)]
pub enum ShowOutcome {
    /// Content is loading. The coordinator shows it once rendering completes.
    Loaded(Arc<DisplayCoordinator>),
    /// The content renderer is not available on this host. Nothing is shown.
    Abandoned,
    /// The request was cancelled before a host surface appeared.
    Cancelled,
}

/// A pending show request. Dropping it does not cancel the request.
pub struct ShowHandle {
    surface_wait: AbortHandle,
    task: JoinHandle<InAppResult<ShowOutcome>>,
}

impl ShowHandle {
    /// Stops waiting for a host surface. Once a surface has been found the
    /// request runs to completion and this has no effect.
    pub fn cancel(&self) {
        self.surface_wait.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn wait(self) -> InAppResult<ShowOutcome> {
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Ok(ShowOutcome::Cancelled),
            Err(e) => Err(InAppError::Task(e.to_string())),
        }
    }
}

/// Application level entry point for showing messages. Owns the active slot.
pub struct DisplayContext {
    config: Arc<Config>,
    platform: Platform,
    slot: Arc<ActiveSlot>,
}

impl DisplayContext {
    pub fn new(config: Config, platform: Platform) -> Self {
        Self {
            config: Arc::new(config),
            platform,
            slot: Arc::new(ActiveSlot::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn slot(&self) -> &Arc<ActiveSlot> {
        &self.slot
    }

    pub fn active(&self) -> Option<Arc<DisplayCoordinator>> {
        self.slot.current()
    }

    /// Shows `message` once the host has a foreground surface. Never fails
    /// for lack of a surface; it waits, polling at the configured interval.
    ///
    /// A preview replaces whatever is active, after that message has finished
    /// dismissing. Any other message is set up right away.
    ///
    /// Must be called from within a tokio runtime.
    pub fn show_message_content(&self, message: Message, content: MessageContent) -> ShowHandle {
        let config = self.config.clone();
        let platform = self.platform.clone();
        let slot = self.slot.clone();

        let surface_wait = wait_for_surface(&config, &platform);
        let abort = surface_wait.abort_handle();

        let task = tokio::spawn(async move {
            let host = match surface_wait.await {
                Ok(host) => host,
                Err(e) if e.is_cancelled() => {
                    debug!("Show of message {} cancelled before a surface appeared", message.id);
                    return Ok(ShowOutcome::Cancelled);
                }
                Err(e) => return Err(InAppError::Task(e.to_string())),
            };
            debug!("Showing message {} on {}", message.id, host.id);

            if message.is_preview {
                if let Some(active) = slot.current() {
                    dismiss_for_preview(&platform, active).await;
                }
            }

            initialize(message, content, host, config, platform, slot).await
        });

        ShowHandle {
            surface_wait: abort,
            task,
        }
    }

    /// Dismisses whatever message is active, if any.
    pub fn dismiss_current_message(&self) {
        debug!("Dismissing current message: {:?}", self.slot.current());
        if let Some(active) = self.slot.current() {
            dispatch(
                self.platform.ui.as_ref(),
                Box::new(move || active.dismiss_and_await_next(None)),
            );
        }
    }
}

/// Polls the host for a foreground surface on its own task. Aborting that task
/// cancels only the wait.
fn wait_for_surface(config: &Config, platform: &Platform) -> JoinHandle<HostSurface> {
    if platform.host.current_surface().is_none() {
        debug!(
            "No foreground surface yet, checking again every {:?}",
            config.init_retry_delay()
        );
    }

    let host = platform.host.clone();
    RetryTimer::every(config.init_retry_delay()).spawn(move || host.current_surface())
}

async fn dismiss_for_preview(platform: &Platform, active: Arc<DisplayCoordinator>) {
    debug!("Dismissing message {} for a preview", active.message().id);

    let (done_tx, done_rx) = oneshot::channel();
    let dismissing = active.clone();
    dispatch(
        platform.ui.as_ref(),
        Box::new(move || {
            dismissing.dismiss_and_await_next(Some(Box::new(move || {
                let _ = done_tx.send(());
            })));
        }),
    );

    if done_rx.await.is_err() {
        debug!("Dismiss of message {} was dropped", active.message().id);
    }
    // Covers a message that never rendered and so had nothing to dismiss.
    active.retire();
}

async fn initialize(
    message: Message,
    content: MessageContent,
    host: HostSurface,
    config: Arc<Config>,
    platform: Platform,
    slot: Arc<ActiveSlot>,
) -> InAppResult<ShowOutcome> {
    let payload = content.encoded_payload();
    let ui = platform.ui.clone();
    let coordinator = DisplayCoordinator::new(message, content, host, config, platform, slot.clone());
    slot.occupy(coordinator.clone());

    // Surfaces belong to the UI thread.
    let (result_tx, result_rx) = oneshot::channel();
    let setup = coordinator.clone();
    dispatch(
        ui.as_ref(),
        Box::new(move || {
            let _ = result_tx.send(setup.setup_content_surface(&payload));
        }),
    );

    match result_rx.await {
        Ok(Ok(())) => Ok(ShowOutcome::Loaded(coordinator)),
        Ok(Err(SurfaceError::RendererUnavailable(reason))) => {
            error!("Error setting up content surface: {reason}");
            coordinator.abandon();
            Ok(ShowOutcome::Abandoned)
        }
        Ok(Err(e)) => {
            error!("Error setting up content surface: {e}");
            coordinator.abandon();
            Err(e.into())
        }
        Err(_) => {
            coordinator.abandon();
            Err(InAppError::UiThreadGone)
        }
    }
}
