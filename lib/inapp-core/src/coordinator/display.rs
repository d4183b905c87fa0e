use crate::bridge::{ActionTaken, BridgeEvent, MessageBridge, RenderingComplete};
use crate::config::Config;
use crate::coordinator::slot::ActiveSlot;
use crate::coordinator::view_events::ViewEvents;
use crate::geometry::{self, max_view_size};
use crate::message::{Message, MessageContent, Position};
use crate::platform::{
    dispatch, ContentSurface, DismissCallback, HostSurface, Platform, PresentationView,
    ScreenMetrics, SurfaceId, SurfaceListener, SurfaceResult,
};
use log::{debug, info, log_enabled, trace, warn, Level};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

const LISTENER_KEY_PREFIX: &str = "DisplayCoordinator";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    AwaitingRenderComplete,
    Displaying,
    /// The host surface stopped; the view is kept for the next surface.
    Detached,
    Dismissing,
    Terminal,
    /// The renderer could not be created, nothing was shown.
    Abandoned,
}

impl Phase {
    fn is_finished(&self) -> bool {
        matches!(self, Phase::Dismissing | Phase::Terminal | Phase::Abandoned)
    }
}

struct CoordinatorState {
    phase: Phase,
    content: MessageContent,
    content_surface: Option<Arc<dyn ContentSurface>>,
    view: Option<Arc<dyn PresentationView>>,
    host: HostSurface,
    last_surface_id: Option<SurfaceId>,
    last_page_height: i32,
    /// A dismiss is in flight. Further dismiss requests complete immediately.
    dismiss_fired: bool,
    /// The user asked to close. Surface changes must not bring the view back.
    closing: bool,
}

/// Drives one message from loading through display to dismissal.
///
/// Host surface events and bridge events race on the view reference, so every
/// read or swap of it goes through `state`. The lock is only held long enough
/// to copy what is needed; collaborators are always called without it.
pub struct DisplayCoordinator {
    this: Weak<DisplayCoordinator>,
    message: Message,
    config: Arc<Config>,
    platform: Platform,
    slot: Arc<ActiveSlot>,
    state: Mutex<CoordinatorState>,
}

impl DisplayCoordinator {
    pub(crate) fn new(
        message: Message,
        content: MessageContent,
        host: HostSurface,
        config: Arc<Config>,
        platform: Platform,
        slot: Arc<ActiveSlot>,
    ) -> Arc<Self> {
        let last_page_height = content.page_height;
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            message,
            config,
            platform,
            slot,
            state: Mutex::new(CoordinatorState {
                phase: Phase::Idle,
                content,
                content_surface: None,
                view: None,
                host,
                last_surface_id: None,
                last_page_height,
                dismiss_fired: false,
                closing: false,
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn phase(&self) -> Phase {
        self.state().phase
    }

    pub fn content(&self) -> MessageContent {
        self.state().content.clone()
    }

    pub fn last_page_height(&self) -> i32 {
        self.state().last_page_height
    }

    pub fn last_surface_id(&self) -> Option<SurfaceId> {
        self.state().last_surface_id.clone()
    }

    pub fn is_closing(&self) -> bool {
        self.state().closing
    }

    pub fn has_view(&self) -> bool {
        self.state().view.is_some()
    }

    /// Key this coordinator registers under with the host lifecycle tracker.
    pub fn listener_key(&self) -> String {
        format!("{LISTENER_KEY_PREFIX}{}", self.message.id)
    }

    fn margin_px(&self, metrics: &ScreenMetrics) -> i32 {
        metrics.dp_to_px(self.config.margin_dp)
    }

    fn current_view(&self) -> Option<Arc<dyn PresentationView>> {
        self.state().view.clone()
    }

    fn set_view(&self, view: Option<Arc<dyn PresentationView>>) {
        self.state().view = view;
    }

    /// Creates the content surface on the current host and loads `payload` into it.
    /// Must run on the UI thread.
    pub(crate) fn setup_content_surface(&self, payload: &str) -> SurfaceResult<()> {
        let surfaces = &self.platform.surfaces;
        surfaces.set_debugging_enabled(self.config.content_debugging || log_enabled!(Level::Debug));

        let host = {
            let mut state = self.state();
            if state.phase.is_finished() {
                debug!("Message {} was replaced before loading", self.message.id);
                return Ok(());
            }
            state.phase = Phase::Loading;
            state.host.clone()
        };

        let bridge = MessageBridge::new(
            self.config.bridge_name.as_str(),
            self.this.clone(),
            self.platform.ui.clone(),
        );
        let surface = surfaces.create(&host, bridge)?;
        self.state().content_surface = Some(surface.clone());

        // Start at the largest extent so the page can report its natural height.
        let (width, height) = max_view_size(&host.metrics, self.margin_px(&host.metrics));
        surface.resize(width, height);
        surface.load(payload)?;

        let mut state = self.state();
        if state.phase == Phase::Loading {
            state.phase = Phase::AwaitingRenderComplete;
        }
        debug!("Loaded content for message {} on {}", self.message.id, host.id);
        Ok(())
    }

    /// Marks a coordinator whose surface could not be set up and frees the active slot.
    pub(crate) fn abandon(&self) {
        self.state().phase = Phase::Abandoned;
        self.slot.release_if(self);
    }

    /// Ends a coordinator replaced by a preview. Anything it has not shown yet
    /// never will be; a dismiss already in flight finishes on its own.
    pub(crate) fn retire(&self) {
        let retired = {
            let mut state = self.state();
            if state.phase.is_finished() {
                false
            } else {
                state.phase = Phase::Terminal;
                state.view = None;
                state.content_surface = None;
                true
            }
        };

        if retired {
            debug!("Message {} retired", self.message.id);
            self.platform.host.unregister(&self.listener_key());
        }
        self.slot.release_if(self);
    }

    pub(crate) fn handle_bridge_event(&self, event: BridgeEvent) {
        match event {
            BridgeEvent::RenderingComplete(render) => self.handle_render_complete(render),
            BridgeEvent::ActionTaken(action) => self.handle_action_taken(action),
            BridgeEvent::PageChange(page) => {
                self.platform.handler.on_page_changed(&self.message, &page)
            }
            BridgeEvent::Unknown(_) => {}
        }
    }

    fn handle_render_complete(&self, render: RenderingComplete) {
        let (metrics, phase) = {
            let state = self.state();
            (state.host.metrics, state.phase)
        };
        if phase.is_finished() {
            debug!("Ignoring render complete for message {} in {phase:?}", self.message.id);
            return;
        }

        let position = render.display_location();
        let page_height = render.page_height(&metrics, self.margin_px(&metrics));
        let drag_to_dismiss_disabled = render.drag_to_dismiss_disabled();
        debug!(
            "Message {} rendered: position {position}, height {page_height}, drag to dismiss disabled {drag_to_dismiss_disabled}",
            self.message.id
        );

        let content = {
            let mut state = self.state();
            state.content.display_location = position;
            state.content.page_height = page_height;
            state.last_page_height = page_height;
            state.content.clone()
        };

        let listener = Arc::new(ViewEvents::new(
            self.message.clone(),
            self.platform.handler.clone(),
            self.this.clone(),
        ));
        let view = self
            .platform
            .views
            .create(&content, drag_to_dismiss_disabled, listener);
        self.set_view(Some(view));

        // Delivers `available` right away when a surface is already up.
        if let Some(this) = self.this.upgrade() {
            self.platform.host.register(&self.listener_key(), this);
        }
    }

    fn handle_action_taken(&self, action: ActionTaken) {
        if self.current_view().is_some_and(|view| view.is_dragging()) {
            debug!("Ignoring action on message {} while dragging", self.message.id);
            return;
        }

        let handler = &self.platform.handler;
        if self.message.is_preview {
            handler.on_preview_action(&self.message, &action.body);
        } else if action.id.is_some() {
            handler.on_message_action(&self.message, &action.body);
        }

        if action.close {
            self.state().closing = true;
            self.dismiss_and_await_next(None);
        }
    }

    /// Attaches the content to the view and shows it on the current host surface.
    /// The view is called after the lock is released; a dismiss landing in
    /// between is tolerated since every caller runs on the UI thread.
    pub(crate) fn show_view(&self, height_override: Option<i32>) {
        let (view, surface, host) = {
            let mut state = self.state();
            let Some(view) = state.view.clone() else {
                warn!("No view found to show message {}", self.message.id);
                return;
            };
            if let Some(height) = height_override {
                state.last_page_height = height;
            }
            if !state.phase.is_finished() {
                state.phase = Phase::Displaying;
            }
            (view, state.content_surface.clone(), state.host.clone())
        };

        debug!(
            "Showing message {} on {} with height {height_override:?}",
            self.message.id, host.id
        );
        if let Some(surface) = surface {
            view.set_content(surface);
        }
        if let Some(height) = height_override {
            view.update_height(height);
        }
        view.show(&host);
        view.check_if_should_dismiss();
    }

    /// Re-measures the page after the surface changed shape, then shows it at the new height.
    fn remeasure_and_show(&self) {
        let (has_view, position, host, surface) = {
            let state = self.state();
            (
                state.view.is_some(),
                state.content.display_location,
                state.host.clone(),
                state.content_surface.clone(),
            )
        };
        if !has_view {
            return;
        }

        if position == Position::FullScreen {
            self.show_view(None);
            return;
        }

        let Some(surface) = surface else {
            warn!("No content surface to measure message {}", self.message.id);
            return;
        };

        debug!("Re-measuring message {} on {}", self.message.id, host.id);
        let (width, height) = max_view_size(&host.metrics, self.margin_px(&host.metrics));
        surface.resize(width, height);

        let this = self.this.clone();
        let ui = self.platform.ui.clone();
        let metrics = host.metrics;
        surface.evaluate_script(
            &self.config.page_meta_data_script,
            Box::new(move |result| {
                dispatch(
                    ui.as_ref(),
                    Box::new(move || {
                        if let Some(coordinator) = this.upgrade() {
                            coordinator.apply_measurement(&result, &metrics);
                        }
                    }),
                );
            }),
        );
    }

    fn apply_measurement(&self, result: &str, metrics: &ScreenMetrics) {
        let meta: Value = match serde_json::from_str(result) {
            Ok(meta) => meta,
            Err(e) => {
                warn!("Could not parse page metadata for message {}: {e}", self.message.id);
                return;
            }
        };

        let height = geometry::page_rect_to_view_height(&meta, metrics, self.margin_px(metrics));
        self.show_view(Some(height));
    }

    /// Starts the dismiss animation. `on_complete` runs exactly once: right away
    /// when there is nothing to dismiss or a dismiss is already running,
    /// otherwise on the UI thread after the animation.
    pub fn dismiss_and_await_next(&self, on_complete: Option<DismissCallback>) {
        let view = {
            let mut state = self.state();
            match state.view.clone() {
                Some(view) if !state.dismiss_fired => {
                    state.dismiss_fired = true;
                    state.phase = Phase::Dismissing;
                    view
                }
                _ => {
                    drop(state);
                    trace!("Nothing to dismiss for message {}", self.message.id);
                    if let Some(callback) = on_complete {
                        callback();
                    }
                    return;
                }
            }
        };

        info!("Dismissing message {}", self.message.id);
        self.platform.handler.on_message_will_dismiss(&self.message);

        let this = self.this.clone();
        let ui = self.platform.ui.clone();
        view.dismiss_and_await_next(Box::new(move || {
            dispatch(
                ui.as_ref(),
                Box::new(move || {
                    if let Some(coordinator) = this.upgrade() {
                        coordinator.finish_dismiss();
                    }
                    if let Some(callback) = on_complete {
                        callback();
                    }
                }),
            );
        }));
    }

    fn finish_dismiss(&self) {
        {
            let mut state = self.state();
            state.dismiss_fired = false;
            state.view = None;
            state.phase = Phase::Terminal;
        }
        self.platform.host.unregister(&self.listener_key());
        self.slot.release_if(self);
        debug!("Message {} dismissed", self.message.id);
    }

    pub(crate) fn is_dismiss_in_flight(&self) -> bool {
        self.state().dismiss_fired
    }

    /// The view went away. When the view dismissed itself (a swipe, say) the
    /// coordinator is finished here; otherwise the pending dismiss finishes it.
    pub(crate) fn on_view_dismissed(&self) {
        self.platform.host.unregister(&self.listener_key());

        let view_initiated = {
            let mut state = self.state();
            if state.dismiss_fired {
                false
            } else {
                state.view = None;
                state.phase = Phase::Terminal;
                true
            }
        };

        if view_initiated {
            self.slot.release_if(self);
        }
    }
}

impl SurfaceListener for DisplayCoordinator {
    fn available(&self, surface: &HostSurface) {
        let (last_surface_id, closing, last_page_height) = {
            let mut state = self.state();
            let last = state.last_surface_id.replace(surface.id.clone());
            state.host = surface.clone();
            (last, state.closing, state.last_page_height)
        };

        debug!(
            "Surface {} available for message {}, last surface {last_surface_id:?}",
            surface.id, self.message.id
        );

        match last_surface_id {
            None => self.show_view(None),
            Some(last) if last != surface.id => {
                if closing {
                    debug!("Message {} is closing, not moving it to {}", self.message.id, surface.id);
                    return;
                }
                if let Some(view) = self.current_view() {
                    view.remove_all_views();
                }
                self.show_view(Some(last_page_height));
            }
            // Same surface announced again, usually a rotation.
            Some(_) => self.remeasure_and_show(),
        }
    }

    fn stopped(&self, surface: &HostSurface) {
        let view = {
            let mut state = self.state();
            if state.last_surface_id.as_ref() != Some(&surface.id) {
                return;
            }
            if state.phase == Phase::Displaying {
                state.phase = Phase::Detached;
            }
            state.view.clone()
        };

        debug!("Surface {} stopped, detaching message {}", surface.id, self.message.id);
        if let Some(view) = view {
            view.remove_all_views();
        }
    }
}

impl fmt::Debug for DisplayCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayCoordinator")
            .field("message", &self.message)
            .field("phase", &self.phase())
            .finish()
    }
}
