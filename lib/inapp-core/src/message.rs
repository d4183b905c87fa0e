use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Page height meaning "not measured yet", which the view treats as full screen.
pub const UNSET_PAGE_HEIGHT: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub is_preview: bool,
}

impl Message {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_preview: false,
        }
    }

    pub fn preview(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_preview: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Position {
    TopBanner,
    BottomBanner,
    CenterModal,
    FullScreen,
}

impl Position {
    pub fn is_banner(&self) -> bool {
        matches!(self, Position::TopBanner | Position::BottomBanner)
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            Position::TopBanner => "TOP_BANNER",
            Position::BottomBanner => "BOTTOM_BANNER",
            Position::CenterModal => "CENTER_MODAL",
            Position::FullScreen => "FULL_SCREEN",
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::FullScreen
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TOP_BANNER" => Ok(Position::TopBanner),
            "BOTTOM_BANNER" => Ok(Position::BottomBanner),
            "CENTER_MODAL" => Ok(Position::CenterModal),
            "FULL_SCREEN" => Ok(Position::FullScreen),
            _ => Err(format!("Unknown display location: {s}")),
        }
    }
}

/// Markup plus the placement facts learned once the content has rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageContent {
    pub html: String,
    pub display_location: Position,
    pub page_height: i32,
}

impl MessageContent {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            display_location: Position::FullScreen,
            page_height: UNSET_PAGE_HEIGHT,
        }
    }

    /// The markup as handed to the content surface: base64 of the UTF-8 bytes, unwrapped.
    pub fn encoded_payload(&self) -> String {
        STANDARD.encode(self.html.as_bytes())
    }
}
