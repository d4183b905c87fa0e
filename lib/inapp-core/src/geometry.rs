//! Converts page geometry reported by rendered content into view heights.

use crate::message::UNSET_PAGE_HEIGHT;
use crate::platform::ScreenMetrics;
use log::{debug, error};
use serde_json::Value;

/// Gap kept between the overlay and every screen edge, in logical units.
pub const MARGIN_DP: i32 = 24;

/// Largest extent the content may take: the screen minus the margin on both sides.
pub fn max_view_size(metrics: &ScreenMetrics, margin_px: i32) -> (i32, i32) {
    (
        (metrics.width_px - margin_px * 2).max(0),
        (metrics.height_px - margin_px * 2).max(0),
    )
}

pub fn max_view_height(metrics: &ScreenMetrics, margin_px: i32) -> i32 {
    max_view_size(metrics, margin_px).1
}

pub fn clamp_height(px: i32, max_px: i32) -> i32 {
    px.max(0).min(max_px)
}

/// Reads `rect.height` from a page metadata object and returns the pixel
/// height the view should take, or [`UNSET_PAGE_HEIGHT`] if it is missing.
pub fn page_rect_to_view_height(meta: &Value, metrics: &ScreenMetrics, margin_px: i32) -> i32 {
    let Some(height) = meta
        .get("rect")
        .and_then(|rect| rect.get("height"))
        .and_then(Value::as_f64)
    else {
        error!("Could not read page height from page metadata: {meta}");
        return UNSET_PAGE_HEIGHT;
    };

    let px = metrics.dp_to_px(height as i32);
    debug!("Page height {height} converts to {px}px");

    let max_px = max_view_height(metrics, margin_px);
    if px > max_px {
        debug!("Page height {px}px is over the screen max {max_px}px");
    }

    clamp_height(px, max_px)
}
