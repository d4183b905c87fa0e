//! Recording, in-memory collaborators. Used by tests and the headless driver.

use crate::bridge::MessageBridge;
use crate::message::{Message, MessageContent, Position};
use crate::platform::{
    ContentSurface, ContentSurfaceFactory, DismissCallback, HostLifecycleTracker, HostSurface,
    MessageHandler, Platform, PresentationView, PresentationViewFactory, ScriptCallback,
    SurfaceError, SurfaceId, SurfaceListener, SurfaceResult, UiTask, UiThread, ViewListener,
};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A UI thread that is either "always current" (tasks run inline) or a queue
/// drained explicitly with [`MockUiThread::run_pending`].
pub struct MockUiThread {
    inline: bool,
    queue: Mutex<VecDeque<UiTask>>,
}

impl MockUiThread {
    pub fn inline() -> Self {
        Self {
            inline: true,
            queue: Mutex::new(VecDeque::new()),
        }
    }

    pub fn queued() -> Self {
        Self {
            inline: false,
            queue: Mutex::new(VecDeque::new()),
        }
    }

    /// Runs queued tasks, including any they enqueue, and returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let task = lock(&self.queue).pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    pub fn pending(&self) -> usize {
        lock(&self.queue).len()
    }
}

impl UiThread for MockUiThread {
    fn is_ui_thread(&self) -> bool {
        self.inline
    }

    fn run_on_ui_thread(&self, task: UiTask) {
        lock(&self.queue).push_back(task);
    }
}

#[derive(Default)]
pub struct MockHostTracker {
    current: Mutex<Option<HostSurface>>,
    listeners: Mutex<HashMap<String, Arc<dyn SurfaceListener>>>,
}

impl MockHostTracker {
    pub fn new(current: Option<HostSurface>) -> Self {
        Self {
            current: Mutex::new(current),
            listeners: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_current(&self, surface: Option<HostSurface>) {
        *lock(&self.current) = surface;
    }

    fn listeners(&self) -> Vec<Arc<dyn SurfaceListener>> {
        lock(&self.listeners).values().cloned().collect()
    }

    /// Brings `surface` to the foreground and tells every listener.
    pub fn make_available(&self, surface: HostSurface) {
        self.set_current(Some(surface.clone()));
        for listener in self.listeners() {
            listener.available(&surface);
        }
    }

    /// Stops `surface`, telling every listener.
    pub fn stop(&self, surface: &HostSurface) {
        {
            let mut current = lock(&self.current);
            if current.as_ref().map(|s| &s.id) == Some(&surface.id) {
                *current = None;
            }
        }
        for listener in self.listeners() {
            listener.stopped(surface);
        }
    }

    pub fn registered_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = lock(&self.listeners).keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl HostLifecycleTracker for MockHostTracker {
    fn current_surface(&self) -> Option<HostSurface> {
        lock(&self.current).clone()
    }

    fn register(&self, key: &str, listener: Arc<dyn SurfaceListener>) {
        lock(&self.listeners).insert(key.to_string(), listener.clone());
        if let Some(surface) = self.current_surface() {
            listener.available(&surface);
        }
    }

    fn unregister(&self, key: &str) {
        lock(&self.listeners).remove(key);
    }
}

pub struct MockContentSurface {
    pub host: SurfaceId,
    bridge: MessageBridge,
    loads: Mutex<Vec<String>>,
    resizes: Mutex<Vec<(i32, i32)>>,
    scripts: Mutex<Vec<String>>,
    pending_scripts: Mutex<VecDeque<ScriptCallback>>,
    script_result: Mutex<Option<String>>,
}

impl MockContentSurface {
    fn new(host: SurfaceId, bridge: MessageBridge) -> Self {
        Self {
            host,
            bridge,
            loads: Mutex::new(Vec::new()),
            resizes: Mutex::new(Vec::new()),
            scripts: Mutex::new(Vec::new()),
            pending_scripts: Mutex::new(VecDeque::new()),
            script_result: Mutex::new(None),
        }
    }

    /// Posts `raw` through the bridge as the page would.
    pub fn post(&self, raw: &str) {
        self.bridge.post_message(raw);
    }

    pub fn bridge_name(&self) -> String {
        self.bridge.name().to_string()
    }

    /// Makes future script evaluations answer immediately with `result`.
    pub fn answer_scripts_with(&self, result: impl Into<String>) {
        *lock(&self.script_result) = Some(result.into());
    }

    /// Answers the oldest pending script evaluation. Returns false if none was pending.
    pub fn complete_script(&self, result: &str) -> bool {
        let callback = lock(&self.pending_scripts).pop_front();
        match callback {
            Some(callback) => {
                callback(result.to_string());
                true
            }
            None => false,
        }
    }

    pub fn loads(&self) -> Vec<String> {
        lock(&self.loads).clone()
    }

    pub fn resizes(&self) -> Vec<(i32, i32)> {
        lock(&self.resizes).clone()
    }

    pub fn scripts(&self) -> Vec<String> {
        lock(&self.scripts).clone()
    }
}

impl ContentSurface for MockContentSurface {
    fn load(&self, payload: &str) -> SurfaceResult<()> {
        lock(&self.loads).push(payload.to_string());
        Ok(())
    }

    fn evaluate_script(&self, script: &str, on_result: ScriptCallback) {
        lock(&self.scripts).push(script.to_string());
        let answer = lock(&self.script_result).clone();
        match answer {
            Some(result) => on_result(result),
            None => lock(&self.pending_scripts).push_back(on_result),
        }
    }

    fn resize(&self, width: i32, height: i32) {
        lock(&self.resizes).push((width, height));
    }
}

#[derive(Default)]
pub struct MockContentSurfaceFactory {
    surfaces: Mutex<Vec<Arc<MockContentSurface>>>,
    fail_with: Mutex<Option<SurfaceError>>,
    debugging: AtomicBool,
}

impl MockContentSurfaceFactory {
    /// Makes the next `create` fail with `error`.
    pub fn fail_next(&self, error: SurfaceError) {
        *lock(&self.fail_with) = Some(error);
    }

    pub fn last(&self) -> Option<Arc<MockContentSurface>> {
        lock(&self.surfaces).last().cloned()
    }

    pub fn created(&self) -> usize {
        lock(&self.surfaces).len()
    }

    pub fn debugging_enabled(&self) -> bool {
        self.debugging.load(Ordering::SeqCst)
    }
}

impl ContentSurfaceFactory for MockContentSurfaceFactory {
    fn create(
        &self,
        host: &HostSurface,
        bridge: MessageBridge,
    ) -> SurfaceResult<Arc<dyn ContentSurface>> {
        if let Some(error) = lock(&self.fail_with).take() {
            return Err(error);
        }

        let surface = Arc::new(MockContentSurface::new(host.id.clone(), bridge));
        lock(&self.surfaces).push(surface.clone());
        Ok(surface)
    }

    fn set_debugging_enabled(&self, enabled: bool) {
        self.debugging.store(enabled, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewCall {
    SetContent,
    UpdateHeight(i32),
    Show(SurfaceId),
    CheckIfShouldDismiss,
    Dismiss,
    RemoveAllViews,
}

pub struct MockPresentationView {
    pub position: Position,
    pub page_height: i32,
    pub drag_to_dismiss_disabled: bool,
    listener: Arc<dyn ViewListener>,
    calls: Mutex<Vec<ViewCall>>,
    dragging: AtomicBool,
    shown: AtomicBool,
    auto_complete_dismiss: bool,
    pending_dismiss: Mutex<Option<DismissCallback>>,
}

impl MockPresentationView {
    pub fn calls(&self) -> Vec<ViewCall> {
        lock(&self.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    pub fn set_dragging(&self, dragging: bool) {
        self.dragging.store(dragging, Ordering::SeqCst);
    }

    /// Heights applied through `update_height`, in order.
    pub fn heights(&self) -> Vec<i32> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ViewCall::UpdateHeight(px) => Some(px),
                _ => None,
            })
            .collect()
    }

    pub fn show_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, ViewCall::Show(_)))
            .count()
    }

    pub fn has_pending_dismiss(&self) -> bool {
        lock(&self.pending_dismiss).is_some()
    }

    /// Ends a dismiss animation started while auto completion is off.
    pub fn finish_dismiss(&self) -> bool {
        let callback = lock(&self.pending_dismiss).take();
        match callback {
            Some(callback) => {
                self.listener.on_message_was_dismissed();
                callback();
                true
            }
            None => false,
        }
    }

    /// Simulates the user swiping the message away.
    pub fn swipe_away(&self) {
        self.listener.on_message_will_dismiss();
        self.listener.on_message_was_dismissed();
    }
}

impl PresentationView for MockPresentationView {
    fn set_content(&self, _surface: Arc<dyn ContentSurface>) {
        lock(&self.calls).push(ViewCall::SetContent);
    }

    fn update_height(&self, px: i32) {
        lock(&self.calls).push(ViewCall::UpdateHeight(px));
    }

    fn show(&self, host: &HostSurface) {
        lock(&self.calls).push(ViewCall::Show(host.id.clone()));
        if !self.shown.swap(true, Ordering::SeqCst) {
            self.listener.on_message_was_shown();
        }
    }

    fn is_dragging(&self) -> bool {
        self.dragging.load(Ordering::SeqCst)
    }

    fn check_if_should_dismiss(&self) {
        lock(&self.calls).push(ViewCall::CheckIfShouldDismiss);
    }

    fn dismiss_and_await_next(&self, on_dismissed: DismissCallback) {
        lock(&self.calls).push(ViewCall::Dismiss);
        self.listener.on_message_will_dismiss();
        if self.auto_complete_dismiss {
            self.listener.on_message_was_dismissed();
            on_dismissed();
        } else {
            *lock(&self.pending_dismiss) = Some(on_dismissed);
        }
    }

    fn remove_all_views(&self) {
        lock(&self.calls).push(ViewCall::RemoveAllViews);
    }
}

pub struct MockViewFactory {
    auto_complete_dismiss: AtomicBool,
    views: Mutex<Vec<Arc<MockPresentationView>>>,
}

impl Default for MockViewFactory {
    fn default() -> Self {
        Self {
            auto_complete_dismiss: AtomicBool::new(true),
            views: Mutex::new(Vec::new()),
        }
    }
}

impl MockViewFactory {
    /// When off, views hold dismiss callbacks until [`MockPresentationView::finish_dismiss`].
    pub fn set_auto_complete_dismiss(&self, auto: bool) {
        self.auto_complete_dismiss.store(auto, Ordering::SeqCst);
    }

    pub fn last(&self) -> Option<Arc<MockPresentationView>> {
        lock(&self.views).last().cloned()
    }

    pub fn created(&self) -> usize {
        lock(&self.views).len()
    }
}

impl PresentationViewFactory for MockViewFactory {
    fn create(
        &self,
        content: &MessageContent,
        drag_to_dismiss_disabled: bool,
        listener: Arc<dyn ViewListener>,
    ) -> Arc<dyn PresentationView> {
        let view = Arc::new(MockPresentationView {
            position: content.display_location,
            page_height: content.page_height,
            drag_to_dismiss_disabled,
            listener,
            calls: Mutex::new(Vec::new()),
            dragging: AtomicBool::new(false),
            shown: AtomicBool::new(false),
            auto_complete_dismiss: self.auto_complete_dismiss.load(Ordering::SeqCst),
            pending_dismiss: Mutex::new(None),
        });
        lock(&self.views).push(view.clone());
        view
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HandlerEvent {
    Shown(String),
    WillDismiss(String),
    Dismissed(String),
    Action(String, Value),
    PreviewAction(String, Value),
    PageChanged(String, Value),
}

#[derive(Default)]
pub struct RecordingHandler {
    events: Mutex<Vec<HandlerEvent>>,
}

impl RecordingHandler {
    pub fn events(&self) -> Vec<HandlerEvent> {
        lock(&self.events).clone()
    }

    fn record(&self, event: HandlerEvent) {
        lock(&self.events).push(event);
    }
}

impl MessageHandler for RecordingHandler {
    fn on_message_was_shown(&self, message: &Message) {
        self.record(HandlerEvent::Shown(message.id.clone()));
    }

    fn on_message_will_dismiss(&self, message: &Message) {
        self.record(HandlerEvent::WillDismiss(message.id.clone()));
    }

    fn on_message_was_dismissed(&self, message: &Message) {
        self.record(HandlerEvent::Dismissed(message.id.clone()));
    }

    fn on_message_action(&self, message: &Message, body: &Value) {
        self.record(HandlerEvent::Action(message.id.clone(), body.clone()));
    }

    fn on_preview_action(&self, message: &Message, body: &Value) {
        self.record(HandlerEvent::PreviewAction(message.id.clone(), body.clone()));
    }

    fn on_page_changed(&self, message: &Message, page: &Value) {
        self.record(HandlerEvent::PageChanged(message.id.clone(), page.clone()));
    }
}

/// Every mock, kept typed so tests can drive and inspect them.
pub struct MockPlatform {
    pub ui: Arc<MockUiThread>,
    pub host: Arc<MockHostTracker>,
    pub surfaces: Arc<MockContentSurfaceFactory>,
    pub views: Arc<MockViewFactory>,
    pub handler: Arc<RecordingHandler>,
}

impl MockPlatform {
    /// Mocks with an inline UI thread and `surface` in the foreground.
    pub fn new(surface: Option<HostSurface>) -> Self {
        Self::with_ui(MockUiThread::inline(), surface)
    }

    pub fn with_ui(ui: MockUiThread, surface: Option<HostSurface>) -> Self {
        Self {
            ui: Arc::new(ui),
            host: Arc::new(MockHostTracker::new(surface)),
            surfaces: Arc::new(MockContentSurfaceFactory::default()),
            views: Arc::new(MockViewFactory::default()),
            handler: Arc::new(RecordingHandler::default()),
        }
    }

    pub fn platform(&self) -> Platform {
        Platform {
            ui: self.ui.clone(),
            host: self.host.clone(),
            surfaces: self.surfaces.clone(),
            views: self.views.clone(),
            handler: self.handler.clone(),
        }
    }
}
