// SPDX-License-Identifier: MPL-2.0
//! Upload step.
//!
//! Starts by itself when the modal mounts it and runs at most once, unless
//! the attempt failed and the user retries. The transfer lives on a
//! background task; dropping the widget aborts the transfer.

use crate::application::port::{ApiError, GazeBackend};
use crate::application::upload::{upload_recording, UploadGuard, UploadMilestone, UploadOutcome};
use crate::domain::media::RecordedMedia;
use crate::error::Error;
use crate::i18n::fluent::I18n;
use crate::ui::design_tokens::{palette, sizing, spacing, typography};
use crate::ui::progress_task::run_with_progress;
use crate::ui::styles::button as button_styles;
use iced::task;
use iced::widget::{button, progress_bar, Column, Text};
use iced::{alignment, Element, Length, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Idle,
    Uploading,
    Done,
    Failed,
}

pub struct State {
    media: RecordedMedia,
    min_size: u64,
    guard: UploadGuard,
    status: Status,
    progress: f32,
    transfer: Option<task::Handle>,
}

#[derive(Debug, Clone)]
pub enum Message {
    Start,
    Progress(UploadMilestone),
    Finished(Result<UploadOutcome, Error>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    None,
    Started,
    Progress(f32),
    Completed {
        media_id: String,
        test_id: String,
        /// Set when the best-effort completion notice failed.
        notice_error: Option<ApiError>,
    },
    Failed(Error),
}

impl State {
    #[must_use]
    pub fn new(media: RecordedMedia, min_size: u64) -> Self {
        Self {
            media,
            min_size,
            guard: UploadGuard::new(),
            status: Status::Idle,
            progress: 0.0,
            transfer: None,
        }
    }

    #[must_use]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    #[must_use]
    pub fn is_uploading(&self) -> bool {
        self.status == Status::Uploading
    }

    pub fn handle_message<B: GazeBackend>(
        &mut self,
        message: Message,
        backend: &B,
    ) -> (Event, Task<Message>) {
        match message {
            Message::Start => {
                if !self.guard.try_begin() {
                    return (Event::None, Task::none());
                }
                self.status = Status::Uploading;
                self.progress = 0.0;

                let backend = backend.clone();
                let media = self.media.clone();
                let min_size = self.min_size;
                let (task, handle) = run_with_progress(
                    move |mut progress| async move {
                        upload_recording(&backend, &media, min_size, |milestone| {
                            progress.report(milestone);
                        })
                        .await
                    },
                    Message::Progress,
                    Message::Finished,
                )
                .abortable();
                self.transfer = Some(handle.abort_on_drop());
                (Event::Started, task)
            }
            Message::Progress(milestone) => {
                if self.status != Status::Uploading {
                    return (Event::None, Task::none());
                }
                self.progress = self.progress.max(milestone.fraction());
                (Event::Progress(self.progress), Task::none())
            }
            Message::Finished(result) => {
                if self.status != Status::Uploading {
                    return (Event::None, Task::none());
                }
                self.transfer = None;
                match result {
                    Ok(outcome) => {
                        self.status = Status::Done;
                        self.progress = 1.0;
                        (
                            Event::Completed {
                                media_id: outcome.media_id,
                                test_id: outcome.test_id,
                                notice_error: outcome.completion_notice.err(),
                            },
                            Task::none(),
                        )
                    }
                    Err(err) => {
                        self.status = Status::Failed;
                        self.guard.release();
                        (Event::Failed(err), Task::none())
                    }
                }
            }
        }
    }

    pub fn view<'a>(&'a self, i18n: &'a I18n) -> Element<'a, Message> {
        let size = format_size(self.media.size());
        let percent = format!("{:.0}", self.progress * 100.0);

        let status = match self.status {
            Status::Idle => i18n.tr("upload-preparing"),
            Status::Uploading => {
                i18n.tr_with_args("upload-in-progress", &[("percent", percent.as_str())])
            }
            Status::Done => i18n.tr("upload-done"),
            Status::Failed => i18n.tr("upload-failed"),
        };

        let mut content = Column::new()
            .spacing(spacing::MD)
            .align_x(alignment::Horizontal::Center)
            .width(Length::Fill)
            .push(Text::new(i18n.tr("upload-title")).size(typography::TITLE_MD))
            .push(
                Text::new(i18n.tr_with_args("upload-size", &[("size", size.as_str())]))
                    .size(typography::BODY_SM)
                    .color(palette::GRAY_400),
            )
            .push(
                progress_bar(0.0..=1.0, self.progress)
                    .girth(sizing::PROGRESS_BAR_HEIGHT)
                    .length(Length::Fixed(sizing::PREVIEW_WIDTH)),
            )
            .push(Text::new(status));

        if self.status == Status::Failed {
            content = content.push(
                button(Text::new(i18n.tr("upload-retry")))
                    .on_press(Message::Start)
                    .style(button_styles::primary),
            );
        }

        content.into()
    }
}

/// Human-readable payload size.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
