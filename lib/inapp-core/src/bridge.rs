//! Inbound channel from rendered content back to its coordinator.
//!
//! Content posts JSON envelopes tagged by `type`:
//! - `rendering_complete`: the page finished rendering and reports where and how tall it wants to be
//! - `action_taken`: the user clicked something, possibly asking to close
//! - `page_change`: the content moved to another page, forwarded untouched

use crate::coordinator::DisplayCoordinator;
use crate::geometry;
use crate::message::{Position, UNSET_PAGE_HEIGHT};
use crate::platform::{dispatch, ScreenMetrics, UiThread};
use log::{debug, trace, warn};
use serde::Deserialize;
use serde_json::Value;
use std::sync::{Arc, Weak};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Bridge message is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Bridge message has no type")]
    MissingType,
    #[error("Malformed {kind} message: {reason}")]
    Malformed { kind: String, reason: String },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Envelope {
    RenderingComplete(RenderingComplete),
    ActionTaken { body: Value },
    PageChange,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct ActionBody {
    #[serde(default)]
    id: Option<Value>,
    close: bool,
}

/// Fields of a `rendering_complete` envelope. Every field is optional and
/// resolved leniently, falling back to full screen placement.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RenderingComplete {
    #[serde(rename = "displayLocation", default)]
    pub display_location: Option<Value>,
    #[serde(rename = "pageMetaData", default)]
    pub page_meta_data: Option<Value>,
    #[serde(rename = "dragToDismissDisabled", default)]
    pub drag_to_dismiss_disabled: Option<Value>,
}

impl RenderingComplete {
    pub fn display_location(&self) -> Position {
        match self.display_location.as_ref().and_then(Value::as_str) {
            Some("") | None => Position::FullScreen,
            Some(name) => name.parse().unwrap_or_else(|e| {
                warn!("{e}, falling back to {}", Position::FullScreen);
                Position::FullScreen
            }),
        }
    }

    pub fn drag_to_dismiss_disabled(&self) -> bool {
        self.drag_to_dismiss_disabled
            .as_ref()
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Pixel height for the view. Full screen content is never measured.
    pub fn page_height(&self, metrics: &ScreenMetrics, margin_px: i32) -> i32 {
        if self.display_location() == Position::FullScreen {
            return UNSET_PAGE_HEIGHT;
        }

        match &self.page_meta_data {
            Some(meta) => geometry::page_rect_to_view_height(meta, metrics, margin_px),
            None => UNSET_PAGE_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionTaken {
    pub id: Option<String>,
    pub close: bool,
    /// The `body` object exactly as the content sent it.
    pub body: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    RenderingComplete(RenderingComplete),
    ActionTaken(ActionTaken),
    /// The whole envelope.
    PageChange(Value),
    Unknown(String),
}

pub fn parse_bridge_message(raw: &str) -> Result<BridgeEvent, BridgeError> {
    let value: Value = serde_json::from_str(raw)?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(BridgeError::MissingType)?
        .to_owned();

    let envelope = Envelope::deserialize(&value).map_err(|e| BridgeError::Malformed {
        kind: kind.clone(),
        reason: e.to_string(),
    })?;

    let event = match envelope {
        Envelope::RenderingComplete(render) => BridgeEvent::RenderingComplete(render),
        Envelope::ActionTaken { body } => {
            let parsed = ActionBody::deserialize(&body).map_err(|e| BridgeError::Malformed {
                kind: kind.clone(),
                reason: e.to_string(),
            })?;
            BridgeEvent::ActionTaken(ActionTaken {
                id: parsed.id.as_ref().and_then(Value::as_str).map(str::to_owned),
                close: parsed.close,
                body,
            })
        }
        Envelope::PageChange => BridgeEvent::PageChange(value),
        Envelope::Unknown => BridgeEvent::Unknown(kind),
    };

    Ok(event)
}

/// Handle given to a content surface so its page can talk to the coordinator.
/// Holds the coordinator weakly; messages arriving after it is gone are dropped.
#[derive(Clone)]
pub struct MessageBridge {
    name: String,
    coordinator: Weak<DisplayCoordinator>,
    ui: Arc<dyn UiThread>,
}

impl MessageBridge {
    pub(crate) fn new(
        name: impl Into<String>,
        coordinator: Weak<DisplayCoordinator>,
        ui: Arc<dyn UiThread>,
    ) -> Self {
        Self {
            name: name.into(),
            coordinator,
            ui,
        }
    }

    /// Name the bridge object is exposed under in the page's script environment.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entry point for the page. May be called from any thread.
    pub fn post_message(&self, raw: &str) {
        debug!("Bridge message: {raw}");

        let event = match parse_bridge_message(raw) {
            Ok(BridgeEvent::Unknown(kind)) => {
                trace!("Ignoring bridge message of type {kind}");
                return;
            }
            Ok(event) => event,
            Err(e) => {
                warn!("Dropping bridge message: {e}");
                return;
            }
        };

        let coordinator = self.coordinator.clone();
        dispatch(
            self.ui.as_ref(),
            Box::new(move || match coordinator.upgrade() {
                Some(coordinator) => coordinator.handle_bridge_event(event),
                None => trace!("Bridge message arrived after its coordinator was dropped"),
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> BridgeEvent {
        parse_bridge_message(&value.to_string()).unwrap()
    }

    fn render(value: Value) -> RenderingComplete {
        match parse(value) {
            BridgeEvent::RenderingComplete(render) => render,
            other => panic!("expected rendering_complete, got {other:?}"),
        }
    }

    #[test]
    fn test_rendering_complete_with_all_fields() {
        let r = render(json!({
            "type": "rendering_complete",
            "displayLocation": "CENTER_MODAL",
            "pageMetaData": { "rect": { "height": 300 } },
            "dragToDismissDisabled": true
        }));

        let metrics = ScreenMetrics::new(1080, 548, 1.0);
        assert_eq!(r.display_location(), Position::CenterModal);
        assert!(r.drag_to_dismiss_disabled());
        assert_eq!(r.page_height(&metrics, 24), 300);
    }

    #[test]
    fn test_rendering_complete_clamps_to_screen() {
        let r = render(json!({
            "type": "rendering_complete",
            "displayLocation": "CENTER_MODAL",
            "pageMetaData": { "rect": { "height": 700 } }
        }));

        let metrics = ScreenMetrics::new(1080, 548, 1.0);
        assert_eq!(r.page_height(&metrics, 24), 500);
    }

    #[test]
    fn test_rendering_complete_missing_location_is_full_screen() {
        let r = render(json!({
            "type": "rendering_complete",
            "pageMetaData": { "rect": { "height": 300 } }
        }));

        let metrics = ScreenMetrics::default();
        assert_eq!(r.display_location(), Position::FullScreen);
        assert_eq!(r.page_height(&metrics, 24), UNSET_PAGE_HEIGHT);
        assert!(!r.drag_to_dismiss_disabled());
    }

    #[test]
    fn test_rendering_complete_bad_fields_fall_back() {
        let r = render(json!({
            "type": "rendering_complete",
            "displayLocation": "SIDEWAYS",
            "dragToDismissDisabled": "yes"
        }));
        assert_eq!(r.display_location(), Position::FullScreen);
        assert!(!r.drag_to_dismiss_disabled());

        let r = render(json!({ "type": "rendering_complete", "displayLocation": "" }));
        assert_eq!(r.display_location(), Position::FullScreen);

        let r = render(json!({ "type": "rendering_complete", "displayLocation": 3 }));
        assert_eq!(r.display_location(), Position::FullScreen);
    }

    #[test]
    fn test_rendering_complete_lowercase_location() {
        let r = render(json!({ "type": "rendering_complete", "displayLocation": "top_banner" }));
        assert_eq!(r.display_location(), Position::TopBanner);
    }

    #[test]
    fn test_banner_without_page_meta_data_is_unset() {
        let r = render(json!({ "type": "rendering_complete", "displayLocation": "BOTTOM_BANNER" }));
        assert_eq!(r.page_height(&ScreenMetrics::default(), 24), UNSET_PAGE_HEIGHT);
    }

    #[test]
    fn test_action_taken_with_null_id() {
        match parse(json!({ "type": "action_taken", "body": { "close": true, "id": null } })) {
            BridgeEvent::ActionTaken(action) => {
                assert!(action.close);
                assert_eq!(action.id, None);
                assert_eq!(action.body, json!({ "close": true, "id": null }));
            }
            other => panic!("expected action_taken, got {other:?}"),
        }
    }

    #[test]
    fn test_action_taken_with_id() {
        match parse(json!({ "type": "action_taken", "body": { "close": false, "id": "btn-1" } })) {
            BridgeEvent::ActionTaken(action) => {
                assert!(!action.close);
                assert_eq!(action.id.as_deref(), Some("btn-1"));
            }
            other => panic!("expected action_taken, got {other:?}"),
        }
    }

    #[test]
    fn test_action_taken_without_close_is_malformed() {
        let err = parse_bridge_message(r#"{"type":"action_taken","body":{"id":"x"}}"#).unwrap_err();
        assert!(matches!(err, BridgeError::Malformed { ref kind, .. } if kind == "action_taken"));

        let err = parse_bridge_message(r#"{"type":"action_taken"}"#).unwrap_err();
        assert!(matches!(err, BridgeError::Malformed { .. }));
    }

    #[test]
    fn test_page_change_is_forwarded_verbatim() {
        let envelope = json!({ "type": "page_change", "pageIndex": 2, "pageId": "p2" });
        assert_eq!(parse(envelope.clone()), BridgeEvent::PageChange(envelope));
    }

    #[test]
    fn test_unknown_type_is_reported() {
        assert_eq!(
            parse(json!({ "type": "resize", "height": 10 })),
            BridgeEvent::Unknown("resize".to_string())
        );
    }

    #[test]
    fn test_malformed_envelopes() {
        assert!(matches!(
            parse_bridge_message("not json"),
            Err(BridgeError::InvalidJson(_))
        ));
        assert!(matches!(
            parse_bridge_message(r#"{"displayLocation":"TOP_BANNER"}"#),
            Err(BridgeError::MissingType)
        ));
        assert!(matches!(
            parse_bridge_message(r#"{"type":7}"#),
            Err(BridgeError::MissingType)
        ));
    }
}
