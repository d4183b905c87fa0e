use crate::bridge::MessageBridge;
use crate::message::{Message, MessageContent};
use crate::platform::{
    DismissCallback, HostSurface, ScriptCallback, SurfaceResult, UiTask,
};
use serde_json::Value;
use std::sync::Arc;

/// The thread that owns every view. Tasks posted from other threads run there in order.
pub trait UiThread: Send + Sync {
    fn is_ui_thread(&self) -> bool;

    /// Enqueues the task. Must not run it inline, even when called on the UI thread.
    fn run_on_ui_thread(&self, task: UiTask);
}

/// Runs `task` right away when already on the UI thread, otherwise enqueues it.
pub fn dispatch(ui: &dyn UiThread, task: UiTask) {
    if ui.is_ui_thread() {
        task();
    } else {
        ui.run_on_ui_thread(task);
    }
}

/// Receives foreground surface transitions from the host.
pub trait SurfaceListener: Send + Sync {
    fn available(&self, surface: &HostSurface);
    fn stopped(&self, surface: &HostSurface);
}

pub trait HostLifecycleTracker: Send + Sync {
    /// The surface currently in the foreground, if the host has one yet.
    fn current_surface(&self) -> Option<HostSurface>;

    /// Registers `listener` under `key`, replacing any listener with the same key.
    /// If a surface is already available, `available` is delivered immediately.
    fn register(&self, key: &str, listener: Arc<dyn SurfaceListener>);

    fn unregister(&self, key: &str);
}

/// The embedded renderer holding one message's markup.
pub trait ContentSurface: Send + Sync {
    /// Loads a base64 encoded markup payload.
    fn load(&self, payload: &str) -> SurfaceResult<()>;

    /// Evaluates `script` and hands back its JSON result. The callback may run on any thread.
    fn evaluate_script(&self, script: &str, on_result: ScriptCallback);

    fn resize(&self, width: i32, height: i32);
}

pub trait ContentSurfaceFactory: Send + Sync {
    /// Creates a renderer attached to `host`. Script messages from the page go to `bridge`.
    fn create(
        &self,
        host: &HostSurface,
        bridge: MessageBridge,
    ) -> SurfaceResult<Arc<dyn ContentSurface>>;

    fn set_debugging_enabled(&self, _enabled: bool) {}
}

/// Notifications a presentation view raises about its own lifecycle.
pub trait ViewListener: Send + Sync {
    fn on_message_was_shown(&self);
    fn on_message_will_dismiss(&self);
    fn on_message_was_dismissed(&self);
}

/// The on-screen overlay. Placement, dragging and animation live behind this trait.
pub trait PresentationView: Send + Sync {
    fn set_content(&self, surface: Arc<dyn ContentSurface>);
    fn update_height(&self, px: i32);
    fn show(&self, host: &HostSurface);
    fn is_dragging(&self) -> bool;
    fn check_if_should_dismiss(&self);

    /// Runs the dismiss animation and calls `on_dismissed` once it finishes.
    /// The callback may run on any thread.
    fn dismiss_and_await_next(&self, on_dismissed: DismissCallback);

    /// Detaches the content from whatever surface currently hosts it. The view stays usable.
    fn remove_all_views(&self);
}

pub trait PresentationViewFactory: Send + Sync {
    fn create(
        &self,
        content: &MessageContent,
        drag_to_dismiss_disabled: bool,
        listener: Arc<dyn ViewListener>,
    ) -> Arc<dyn PresentationView>;
}

/// Application side receiver of message lifecycle and action events.
pub trait MessageHandler: Send + Sync {
    fn on_message_was_shown(&self, _message: &Message) {}
    fn on_message_will_dismiss(&self, _message: &Message) {}
    fn on_message_was_dismissed(&self, _message: &Message) {}
    fn on_message_action(&self, _message: &Message, _body: &Value) {}
    fn on_preview_action(&self, _message: &Message, _body: &Value) {}
    fn on_page_changed(&self, _message: &Message, _page: &Value) {}
}

/// Every collaborator a coordinator needs, bundled for injection.
#[derive(Clone)]
pub struct Platform {
    pub ui: Arc<dyn UiThread>,
    pub host: Arc<dyn HostLifecycleTracker>,
    pub surfaces: Arc<dyn ContentSurfaceFactory>,
    pub views: Arc<dyn PresentationViewFactory>,
    pub handler: Arc<dyn MessageHandler>,
}
