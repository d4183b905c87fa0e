use crate::scenario::{Scenario, Step};
use inapp_core::platform::mock::{HandlerEvent, MockPlatform};
use inapp_core::{
    Config, DisplayContext, DisplayCoordinator, InAppResult, MessageContent, Phase, ShowHandle,
    ShowOutcome,
};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// What a replayed scenario left behind.
#[derive(Debug)]
pub struct Report {
    pub phase: Option<Phase>,
    pub events: Vec<HandlerEvent>,
}

/// Replays a scenario against the mock platform.
pub struct Player {
    scenario: Scenario,
    mock: MockPlatform,
    context: DisplayContext,
    pending: Option<ShowHandle>,
    coordinator: Option<Arc<DisplayCoordinator>>,
}

impl Player {
    pub fn new(config: Config, scenario: Scenario) -> Self {
        let mock = MockPlatform::new(scenario.initial_surface());
        let context = DisplayContext::new(config, mock.platform());
        Self {
            scenario,
            mock,
            context,
            pending: None,
            coordinator: None,
        }
    }

    pub async fn run(mut self) -> InAppResult<Report> {
        let message = self.scenario.message();
        info!("Showing message {} (preview: {})", message.id, message.is_preview);
        let content = MessageContent::new(self.scenario.html());
        self.pending = Some(self.context.show_message_content(message, content));

        if self.scenario.initial_surface().is_some() {
            self.settle().await?;
        }

        let steps = std::mem::take(&mut self.scenario.steps);
        for (index, step) in steps.into_iter().enumerate() {
            debug!("Step {}: {step:?}", index + 1);
            self.apply(step).await?;
        }

        if let Some(handle) = self.pending.take() {
            warn!("No surface ever came to the foreground, cancelling the show");
            handle.cancel();
        }

        Ok(Report {
            phase: self.coordinator.as_ref().map(|c| c.phase()),
            events: self.mock.handler.events(),
        })
    }

    /// Waits for the pending show request to load or give up.
    async fn settle(&mut self) -> InAppResult<()> {
        let Some(handle) = self.pending.take() else {
            return Ok(());
        };

        match handle.wait().await? {
            ShowOutcome::Loaded(coordinator) => {
                info!("Message {} loaded", coordinator.message().id);
                self.coordinator = Some(coordinator);
            }
            ShowOutcome::Abandoned => warn!("Content renderer unavailable, nothing shown"),
            ShowOutcome::Cancelled => warn!("Show request was cancelled"),
        }
        Ok(())
    }

    async fn apply(&mut self, step: Step) -> InAppResult<()> {
        match step {
            Step::Available(id) => {
                self.mock
                    .host
                    .make_available(self.scenario.host_surface(&id));
                self.settle().await?;
            }
            Step::Stopped(id) => self.mock.host.stop(&self.scenario.host_surface(&id)),
            Step::Bridge(raw) => match self.mock.surfaces.last() {
                Some(surface) => surface.post(&raw),
                None => warn!("No content surface to post to, skipping bridge message"),
            },
            Step::ScriptResult(result) => {
                let answered = self
                    .mock
                    .surfaces
                    .last()
                    .is_some_and(|surface| surface.complete_script(&result));
                if !answered {
                    warn!("No page measurement was pending");
                }
            }
            Step::Dismiss => self.context.dismiss_current_message(),
            Step::Swipe => match self.mock.views.last() {
                Some(view) => view.swipe_away(),
                None => warn!("No view to swipe away"),
            },
            Step::WaitMs(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Scenario;
    use std::fs;
    use tempfile::TempDir;

    fn scenario(yaml: &str) -> Scenario {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scenario.yaml");
        fs::write(&path, yaml).unwrap();
        Scenario::load(&path).unwrap()
    }

    #[tokio::test]
    async fn test_replay_shows_and_dismisses() {
        let scenario = scenario(
            r#"
message: { id: welcome }
html: "<p>Hi</p>"
surface: main
steps:
  - bridge: '{"type":"rendering_complete","displayLocation":"TOP_BANNER","pageMetaData":{"rect":{"height":80}}}'
  - bridge: '{"type":"action_taken","body":{"id":"ok","close":true}}'
"#,
        );

        let report = Player::new(Config::default(), scenario).run().await.unwrap();

        assert_eq!(report.phase, Some(Phase::Terminal));
        assert_eq!(
            report.events,
            vec![
                HandlerEvent::Shown("welcome".into()),
                HandlerEvent::Action(
                    "welcome".into(),
                    serde_json::json!({ "id": "ok", "close": true })
                ),
                HandlerEvent::WillDismiss("welcome".into()),
                HandlerEvent::Dismissed("welcome".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_replay_waits_for_surface() {
        let scenario = scenario(
            r#"
message: { id: late }
html: "<p>Hi</p>"
steps:
  - wait_ms: 50
  - available: main
  - bridge: '{"type":"rendering_complete"}'
"#,
        );

        let report = Player::new(Config::default(), scenario).run().await.unwrap();

        assert_eq!(report.phase, Some(Phase::Displaying));
        assert_eq!(report.events, vec![HandlerEvent::Shown("late".into())]);
    }

    #[tokio::test]
    async fn test_replay_without_surface_never_loads() {
        let scenario = scenario("message: { id: lost }\nhtml: x\n");

        let report = Player::new(Config::default(), scenario).run().await.unwrap();

        assert_eq!(report.phase, None);
        assert!(report.events.is_empty());
    }
}
