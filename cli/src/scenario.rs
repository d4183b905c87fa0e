use inapp_core::platform::{HostSurface, ScreenMetrics};
use inapp_core::Message;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse scenario '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("Scenario must set exactly one of `html` and `html_file`")]
    Markup,
}

pub type ScenarioResult<T> = Result<T, ScenarioError>;

#[derive(Debug, Clone, Deserialize)]
pub struct MessageSpec {
    pub id: String,
    #[serde(default)]
    pub preview: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Screen {
    pub width: i32,
    pub height: i32,
    pub density: f32,
}

impl Default for Screen {
    fn default() -> Self {
        let metrics = ScreenMetrics::default();
        Self {
            width: metrics.width_px,
            height: metrics.height_px,
            density: metrics.density,
        }
    }
}

impl Screen {
    pub fn metrics(&self) -> ScreenMetrics {
        ScreenMetrics::new(self.width, self.height, self.density)
    }
}

/// One host or content event, applied in order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// The surface with this id comes to the foreground.
    Available(String),
    Stopped(String),
    /// Raw JSON the content posts through the bridge.
    Bridge(String),
    /// Answers the oldest pending page measurement.
    ScriptResult(String),
    Dismiss,
    /// The user swipes the message away.
    Swipe,
    WaitMs(u64),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub message: MessageSpec,
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    html_file: Option<PathBuf>,
    #[serde(default)]
    pub screen: Screen,
    /// Surface in the foreground when the message is shown
    #[serde(default)]
    pub surface: Option<String>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Reads a scenario. `html_file` is resolved against the scenario's directory.
    pub fn load(path: &Path) -> ScenarioResult<Self> {
        let contents = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut scenario: Scenario =
            serde_yaml::from_str(&contents).map_err(|source| ScenarioError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        scenario.html = match (scenario.html.take(), scenario.html_file.take()) {
            (Some(html), None) => Some(html),
            (None, Some(file)) => {
                let file = path.parent().map_or(file.clone(), |dir| dir.join(&file));
                let html = fs::read_to_string(&file)
                    .map_err(|source| ScenarioError::Read { path: file, source })?;
                Some(html)
            }
            _ => return Err(ScenarioError::Markup),
        };

        Ok(scenario)
    }

    pub fn html(&self) -> &str {
        self.html.as_deref().unwrap_or_default()
    }

    pub fn message(&self) -> Message {
        if self.message.preview {
            Message::preview(self.message.id.as_str())
        } else {
            Message::new(self.message.id.as_str())
        }
    }

    pub fn host_surface(&self, id: &str) -> HostSurface {
        HostSurface::new(id, self.screen.metrics())
    }

    pub fn initial_surface(&self) -> Option<HostSurface> {
        self.surface.as_deref().map(|id| self.host_surface(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SCENARIO: &str = r#"
message:
  id: welcome
html: "<p>Hi</p>"
screen:
  width: 720
  height: 1280
  density: 2.0
surface: main
steps:
  - bridge: '{"type":"rendering_complete","displayLocation":"CENTER_MODAL"}'
  - available: main
  - stopped: main
  - script_result: '{"rect":{"height":120}}'
  - wait_ms: 250
  - swipe
  - dismiss
"#;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_scenario() {
        let dir = TempDir::new().unwrap();
        let scenario = Scenario::load(&write(&dir, "s.yaml", SCENARIO)).unwrap();

        assert_eq!(scenario.message().id, "welcome");
        assert!(!scenario.message().is_preview);
        assert_eq!(scenario.html(), "<p>Hi</p>");
        assert_eq!(scenario.screen.metrics(), ScreenMetrics::new(720, 1280, 2.0));
        assert_eq!(scenario.initial_surface().unwrap().id.as_str(), "main");
        assert_eq!(
            scenario.steps,
            vec![
                Step::Bridge(
                    r#"{"type":"rendering_complete","displayLocation":"CENTER_MODAL"}"#.into()
                ),
                Step::Available("main".into()),
                Step::Stopped("main".into()),
                Step::ScriptResult(r#"{"rect":{"height":120}}"#.into()),
                Step::WaitMs(250),
                Step::Swipe,
                Step::Dismiss,
            ]
        );
    }

    #[test]
    fn test_html_file_is_relative_to_scenario() {
        let dir = TempDir::new().unwrap();
        write(&dir, "page.html", "<p>From file</p>");
        let path = write(
            &dir,
            "s.yaml",
            "message:\n  id: m\n  preview: true\nhtml_file: page.html\n",
        );

        let scenario = Scenario::load(&path).unwrap();
        assert_eq!(scenario.html(), "<p>From file</p>");
        assert!(scenario.message().is_preview);
        assert!(scenario.initial_surface().is_none());
        assert!(scenario.steps.is_empty());
        assert_eq!(scenario.screen.metrics(), ScreenMetrics::default());
    }

    #[test]
    fn test_markup_is_required() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "s.yaml", "message:\n  id: m\n");
        assert!(matches!(Scenario::load(&path), Err(ScenarioError::Markup)));
    }

    #[test]
    fn test_unknown_step_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "s.yaml",
            "message:\n  id: m\nhtml: x\nsteps:\n  - teleport: main\n",
        );
        assert!(matches!(
            Scenario::load(&path),
            Err(ScenarioError::Parse { .. })
        ));
    }
}
