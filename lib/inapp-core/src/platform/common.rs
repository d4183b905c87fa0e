use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identity of a host foreground surface. Two announcements with the same id
/// refer to the same surface (for example after a rotation).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceId(pub String);

impl SurfaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SurfaceId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenMetrics {
    pub width_px: i32,
    pub height_px: i32,
    /// Pixels per logical unit
    pub density: f32,
}

impl ScreenMetrics {
    pub fn new(width_px: i32, height_px: i32, density: f32) -> Self {
        Self {
            width_px,
            height_px,
            density,
        }
    }

    /// Converts logical units to physical pixels, truncating like the host toolkit does.
    pub fn dp_to_px(&self, dp: i32) -> i32 {
        (dp as f32 * self.density) as i32
    }
}

impl Default for ScreenMetrics {
    fn default() -> Self {
        Self::new(1080, 1920, 1.0)
    }
}

/// A foreground surface of the enclosing application, as announced by the
/// host lifecycle tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct HostSurface {
    pub id: SurfaceId,
    pub metrics: ScreenMetrics,
}

impl HostSurface {
    pub fn new(id: impl Into<String>, metrics: ScreenMetrics) -> Self {
        Self {
            id: SurfaceId::new(id),
            metrics,
        }
    }
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The embedded renderer is not installed on this host.
    #[error("content renderer unavailable: {0}")]
    RendererUnavailable(String),
    #[error("content surface failed: {0}")]
    Failed(String),
}

impl From<&str> for SurfaceError {
    fn from(value: &str) -> Self {
        SurfaceError::Failed(value.to_owned())
    }
}

impl From<String> for SurfaceError {
    fn from(value: String) -> Self {
        SurfaceError::Failed(value)
    }
}

pub type SurfaceResult<T> = Result<T, SurfaceError>;

pub type UiTask = Box<dyn FnOnce() + Send + 'static>;
pub type ScriptCallback = Box<dyn FnOnce(String) + Send + 'static>;
pub type DismissCallback = Box<dyn FnOnce() + Send + 'static>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dp_to_px_truncates() {
        let metrics = ScreenMetrics::new(1080, 1920, 2.75);
        assert_eq!(metrics.dp_to_px(24), 66);
        assert_eq!(metrics.dp_to_px(1), 2);
        assert_eq!(metrics.dp_to_px(0), 0);
    }

    #[test]
    fn test_surface_id_display() {
        let id = SurfaceId::new("MainActivity");
        assert_eq!(id.to_string(), "MainActivity");
        assert_eq!(id, SurfaceId::from("MainActivity"));
    }

    #[test]
    fn test_surface_error_from_str() {
        let err: SurfaceError = "boom".into();
        assert!(matches!(err, SurfaceError::Failed(ref msg) if msg == "boom"));
        assert!(err.to_string().contains("boom"));
    }
}
