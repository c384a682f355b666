// SPDX-License-Identifier: MPL-2.0
//! Analysis step: queue the job, then wait for its result.
//!
//! Like the uploader, it starts by itself once mounted. The wait runs as a
//! single background task polling at the configured interval; the spinner
//! only animates the UI.

use crate::application::analysis::{self, AnalysisInput};
use crate::application::port::GazeBackend;
use crate::config::SessionConfig;
use crate::domain::gaze::GazeAnalysisResult;
use crate::error::Error;
use crate::i18n::fluent::I18n;
use crate::ui::design_tokens::{palette, spacing, typography};
use crate::ui::progress_task::run_with_progress;
use crate::ui::styles::button as button_styles;
use crate::ui::widgets::ProgressRing;
use iced::task;
use iced::widget::{button, Column, Text};
use iced::{alignment, Element, Length, Subscription, Task};
use std::time::Duration;

const SPINNER_INTERVAL: Duration = Duration::from_millis(50);
const SPINNER_STEP: f32 = 0.15;

#[derive(Debug, Clone, PartialEq)]
enum Stage {
    Idle,
    Queuing,
    Waiting {
        task_id: String,
        progress: Option<f32>,
    },
    Done,
    Failed,
}

pub struct State {
    input: AnalysisInput,
    poll_interval: Duration,
    max_attempts: u32,
    stage: Stage,
    rotation: f32,
    wait: Option<task::Handle>,
}

#[derive(Debug, Clone)]
pub enum Message {
    Start,
    Started(Result<String, Error>),
    Progress(Option<f32>),
    Finished(Result<GazeAnalysisResult, Error>),
    SpinnerTick,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    None,
    Started(String),
    Completed(GazeAnalysisResult),
    Failed(Error),
}

impl State {
    #[must_use]
    pub fn new(input: AnalysisInput, config: &SessionConfig) -> Self {
        Self {
            input,
            poll_interval: config.analysis_poll_interval,
            max_attempts: config.max_poll_attempts,
            stage: Stage::Idle,
            rotation: 0.0,
            wait: None,
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.stage, Stage::Queuing | Stage::Waiting { .. })
    }

    #[must_use]
    pub fn task_id(&self) -> Option<&str> {
        match &self.stage {
            Stage::Waiting { task_id, .. } => Some(task_id),
            _ => None,
        }
    }

    pub fn handle_message<B: GazeBackend>(
        &mut self,
        message: Message,
        backend: &B,
    ) -> (Event, Task<Message>) {
        match message {
            Message::Start => {
                if self.is_running() || self.stage == Stage::Done {
                    return (Event::None, Task::none());
                }
                self.stage = Stage::Queuing;
                let backend = backend.clone();
                let input = self.input.clone();
                (
                    Event::None,
                    Task::perform(
                        async move { analysis::start(&backend, &input).await },
                        Message::Started,
                    ),
                )
            }
            Message::Started(result) => {
                if self.stage != Stage::Queuing {
                    return (Event::None, Task::none());
                }
                match result {
                    Ok(task_id) => {
                        self.stage = Stage::Waiting {
                            task_id: task_id.clone(),
                            progress: None,
                        };
                        let task = self.wait_for(backend, task_id.clone());
                        (Event::Started(task_id), task)
                    }
                    Err(err) => {
                        self.stage = Stage::Failed;
                        (Event::Failed(err), Task::none())
                    }
                }
            }
            Message::Progress(reported) => {
                if let Stage::Waiting { progress, .. } = &mut self.stage {
                    if reported.is_some() {
                        *progress = reported.map(|p| p.clamp(0.0, 1.0));
                    }
                }
                (Event::None, Task::none())
            }
            Message::Finished(result) => {
                if !matches!(self.stage, Stage::Waiting { .. }) {
                    return (Event::None, Task::none());
                }
                self.wait = None;
                match result {
                    Ok(result) => {
                        self.stage = Stage::Done;
                        (Event::Completed(result), Task::none())
                    }
                    Err(err) => {
                        self.stage = Stage::Failed;
                        (Event::Failed(err), Task::none())
                    }
                }
            }
            Message::SpinnerTick => {
                self.rotation = (self.rotation + SPINNER_STEP) % std::f32::consts::TAU;
                (Event::None, Task::none())
            }
        }
    }

    fn wait_for<B: GazeBackend>(&mut self, backend: &B, task_id: String) -> Task<Message> {
        let backend = backend.clone();
        let interval = self.poll_interval;
        let max_attempts = self.max_attempts;
        let (task, handle) = run_with_progress(
            move |mut progress| async move {
                analysis::wait_for_result(&backend, &task_id, interval, max_attempts, |p| {
                    progress.report(p);
                })
                .await
            },
            Message::Progress,
            Message::Finished,
        )
        .abortable();
        self.wait = Some(handle.abort_on_drop());
        task
    }

    pub fn subscription(&self) -> Subscription<Message> {
        if self.is_running() {
            iced::time::every(SPINNER_INTERVAL).map(|_| Message::SpinnerTick)
        } else {
            Subscription::none()
        }
    }

    pub fn view<'a>(&'a self, i18n: &'a I18n) -> Element<'a, Message> {
        let (ring, status) = match &self.stage {
            Stage::Idle | Stage::Queuing => (
                Some(ProgressRing::spinning(palette::PRIMARY_500, self.rotation)),
                i18n.tr("analysis-queued"),
            ),
            Stage::Waiting {
                progress: Some(fraction),
                ..
            } => {
                let percent = format!("{:.0}", fraction * 100.0);
                (
                    Some(ProgressRing::determinate(palette::PRIMARY_500, *fraction)),
                    i18n.tr_with_args("analysis-progress", &[("percent", percent.as_str())]),
                )
            }
            Stage::Waiting { progress: None, .. } => (
                Some(ProgressRing::spinning(palette::PRIMARY_500, self.rotation)),
                i18n.tr("analysis-running"),
            ),
            Stage::Done => (None, i18n.tr("analysis-done")),
            Stage::Failed => (None, i18n.tr("analysis-failed")),
        };

        let mut content = Column::new()
            .spacing(spacing::MD)
            .align_x(alignment::Horizontal::Center)
            .width(Length::Fill)
            .push(Text::new(i18n.tr("analysis-title")).size(typography::TITLE_MD));

        if let Some(ring) = ring {
            content = content.push(ring.into_element());
        }
        content = content.push(Text::new(status));

        if self.stage == Stage::Failed {
            content = content.push(
                button(Text::new(i18n.tr("analysis-retry")))
                    .on_press(Message::Start)
                    .style(button_styles::primary),
            );
        }

        content.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockBackend;

    fn state() -> State {
        State::new(
            AnalysisInput {
                media_id: "media-1".into(),
                test_id: "test-1".into(),
                calibration_session_id: "abc123".into(),
            },
            &SessionConfig::default(),
        )
    }

    fn waiting(backend: &MockBackend) -> State {
        let mut state = state();
        let _ = state.handle_message(Message::Start, backend);
        let (event, _) = state.handle_message(Message::Started(Ok("task-1".into())), backend);
        assert_eq!(event, Event::Started("task-1".into()));
        state
    }

    #[test]
    fn start_is_not_repeated_while_running() {
        let backend = MockBackend::new();
        let mut state = state();
        let _ = state.handle_message(Message::Start, &backend);
        assert!(state.is_running());
        let (event, _) = state.handle_message(Message::Start, &backend);
        assert_eq!(event, Event::None);
    }

    #[test]
    fn task_id_is_exposed_while_waiting() {
        let backend = MockBackend::new();
        let state = waiting(&backend);
        assert_eq!(state.task_id(), Some("task-1"));
    }

    #[test]
    fn result_completes_once() {
        let backend = MockBackend::new();
        let mut state = waiting(&backend);
        let result = GazeAnalysisResult {
            gaze_score: 92.0,
            ..GazeAnalysisResult::default()
        };
        let (event, _) = state.handle_message(Message::Finished(Ok(result.clone())), &backend);
        assert_eq!(event, Event::Completed(result.clone()));
        assert!(!state.is_running());

        let (again, _) = state.handle_message(Message::Finished(Ok(result)), &backend);
        assert_eq!(again, Event::None);
    }

    #[test]
    fn timeout_fails_and_allows_retry() {
        let backend = MockBackend::new();
        let mut state = waiting(&backend);
        let err = Error::AnalysisTimeout { attempts: 90 };
        let (event, _) = state.handle_message(Message::Finished(Err(err.clone())), &backend);
        assert_eq!(event, Event::Failed(err));

        let _ = state.handle_message(Message::Start, &backend);
        assert!(state.is_running());
    }

    #[test]
    fn start_failure_is_reported() {
        let backend = MockBackend::new();
        let mut state = state();
        let _ = state.handle_message(Message::Start, &backend);
        let (event, _) = state.handle_message(Message::Started(Err(Error::Auth)), &backend);
        assert_eq!(event, Event::Failed(Error::Auth));
    }

    #[test]
    fn missing_progress_keeps_last_value() {
        let backend = MockBackend::new();
        let mut state = waiting(&backend);
        let _ = state.handle_message(Message::Progress(Some(0.4)), &backend);
        let _ = state.handle_message(Message::Progress(None), &backend);
        assert!(matches!(
            state.stage,
            Stage::Waiting {
                progress: Some(p),
                ..
            } if (p - 0.4).abs() < f32::EPSILON
        ));
    }
}
