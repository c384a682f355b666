// SPDX-License-Identifier: MPL-2.0
//! Playback step for an uploaded test video.
//!
//! Looks up the signed playback URL, downloads the object into the video
//! cache and hands the file to the FFmpeg playback subscription. A copy of
//! the cached file can be saved through the native file dialog.

use crate::application::port::{ApiError, GazeBackend, PlaybackInfo};
use crate::error::{Error, VideoError};
use crate::i18n::fluent::I18n;
use crate::infrastructure::http::download_to_file;
use crate::ui::design_tokens::{palette, sizing, spacing, typography};
use crate::ui::progress_task::run_with_progress;
use crate::ui::recorder::format_elapsed;
use crate::ui::styles::{button as button_styles, container as container_styles};
use crate::video_player::{video_playback, DecoderCommand, DecoderCommandSender, PlaybackMessage};
use iced::task;
use iced::widget::{button, image, progress_bar, Column, Container, Row, Text};
use iced::{alignment, Element, Length, Subscription, Task};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_EXTENSION: &str = "mp4";

#[derive(Debug, Clone, PartialEq)]
enum Stage {
    FetchingInfo,
    Downloading { progress: f32 },
    Ready { path: PathBuf },
    Failed,
}

pub struct State {
    test_id: String,
    cache_dir: PathBuf,
    client: reqwest::Client,
    stage: Stage,
    /// Bumped for every file handed to the decoder; keys the subscription.
    playback_id: u64,
    commands: Option<DecoderCommandSender>,
    frame: Option<image::Handle>,
    duration_secs: f64,
    position_secs: f64,
    playing: bool,
    ended: bool,
    saved_to: Option<PathBuf>,
    save_directory: Option<PathBuf>,
    download: Option<task::Handle>,
}

#[derive(Debug, Clone)]
pub enum Message {
    Load,
    InfoLoaded(Result<PlaybackInfo, ApiError>),
    DownloadProgress(f32),
    Downloaded(Result<PathBuf, Error>),
    Playback(PlaybackMessage),
    TogglePlay,
    SaveCopy,
    SaveTargetChosen(Option<PathBuf>),
    Saved(Result<PathBuf, Error>),
    Retry,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    None,
    /// The video is on disk and handed to the decoder.
    Ready { size_bytes: u64 },
    Saved(PathBuf),
    Failed(Error),
}

impl State {
    #[must_use]
    pub fn new(test_id: String, cache_dir: PathBuf, client: reqwest::Client) -> Self {
        Self {
            test_id,
            cache_dir,
            client,
            stage: Stage::FetchingInfo,
            playback_id: 0,
            commands: None,
            frame: None,
            duration_secs: 0.0,
            position_secs: 0.0,
            playing: false,
            ended: false,
            saved_to: None,
            save_directory: None,
            download: None,
        }
    }

    /// Directory the save dialog opens in.
    #[must_use]
    pub fn with_save_directory(mut self, directory: Option<PathBuf>) -> Self {
        self.save_directory = directory;
        self
    }

    #[must_use]
    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.stage, Stage::Ready { .. })
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn handle_message<B: GazeBackend>(
        &mut self,
        message: Message,
        backend: &B,
    ) -> (Event, Task<Message>) {
        match message {
            Message::Load => {
                self.stage = Stage::FetchingInfo;
                let backend = backend.clone();
                let test_id = self.test_id.clone();
                (
                    Event::None,
                    Task::perform(
                        async move { backend.playback_info(&test_id).await },
                        Message::InfoLoaded,
                    ),
                )
            }
            Message::InfoLoaded(result) => {
                if self.stage != Stage::FetchingInfo {
                    return (Event::None, Task::none());
                }
                match result {
                    Ok(info) => self.start_download(&info),
                    Err(err) => {
                        self.stage = Stage::Failed;
                        (Event::Failed(err.into()), Task::none())
                    }
                }
            }
            Message::DownloadProgress(fraction) => {
                if let Stage::Downloading { progress } = &mut self.stage {
                    *progress = progress.max(fraction);
                }
                (Event::None, Task::none())
            }
            Message::Downloaded(result) => {
                if !matches!(self.stage, Stage::Downloading { .. }) {
                    return (Event::None, Task::none());
                }
                self.download = None;
                match result {
                    Ok(path) => (self.open(path), Task::none()),
                    Err(err) => {
                        self.stage = Stage::Failed;
                        (Event::Failed(err), Task::none())
                    }
                }
            }
            Message::Playback(playback) => (self.on_playback(playback), Task::none()),
            Message::TogglePlay => {
                let Some(commands) = &self.commands else {
                    return (Event::None, Task::none());
                };
                let command = if self.playing {
                    DecoderCommand::Pause
                } else {
                    DecoderCommand::Play
                };
                if commands.send(command).is_ok() {
                    self.playing = !self.playing;
                    if self.playing {
                        self.ended = false;
                    }
                }
                (Event::None, Task::none())
            }
            Message::SaveCopy => {
                let Stage::Ready { path } = &self.stage else {
                    return (Event::None, Task::none());
                };
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| format!("{}.{DEFAULT_EXTENSION}", self.test_id));
                let extension = path
                    .extension()
                    .map(|ext| ext.to_string_lossy().into_owned())
                    .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
                let directory = self.save_directory.clone();
                (
                    Event::None,
                    Task::perform(
                        async move {
                            let mut dialog = rfd::AsyncFileDialog::new();
                            if let Some(directory) = directory.filter(|dir| dir.is_dir()) {
                                dialog = dialog.set_directory(directory);
                            }
                            dialog
                                .set_file_name(&file_name)
                                .add_filter("Video", &[extension.as_str()])
                                .save_file()
                                .await
                                .map(|handle| handle.path().to_path_buf())
                        },
                        Message::SaveTargetChosen,
                    ),
                )
            }
            Message::SaveTargetChosen(target) => {
                let (Some(target), Stage::Ready { path }) = (target, &self.stage) else {
                    return (Event::None, Task::none());
                };
                let source = path.clone();
                (
                    Event::None,
                    Task::perform(copy_file(source, target), Message::Saved),
                )
            }
            Message::Saved(result) => match result {
                Ok(target) => {
                    self.saved_to = Some(target.clone());
                    self.save_directory = target.parent().map(Path::to_path_buf);
                    (Event::Saved(target), Task::none())
                }
                Err(err) => (Event::Failed(err), Task::none()),
            },
            Message::Retry => {
                self.reset_playback();
                self.handle_message(Message::Load, backend)
            }
        }
    }

    fn start_download(&mut self, info: &PlaybackInfo) -> (Event, Task<Message>) {
        let destination = self.cache_dir.join(cache_file_name(&self.test_id, info));

        if is_cached(&destination, info.file_size) {
            return (self.open(destination), Task::none());
        }

        self.stage = Stage::Downloading { progress: 0.0 };
        let client = self.client.clone();
        let url = info.url.clone();
        let (task, handle) = run_with_progress(
            move |mut progress| async move {
                download_to_file(&client, &url, &destination, |fraction| {
                    progress.report(fraction);
                })
                .await
                .map(|_| destination)
                .map_err(Error::from)
            },
            Message::DownloadProgress,
            Message::Downloaded,
        )
        .abortable();
        self.download = Some(handle.abort_on_drop());
        (Event::None, task)
    }

    fn open(&mut self, path: PathBuf) -> Event {
        self.reset_playback();
        let size_bytes = std::fs::metadata(&path).map_or(0, |meta| meta.len());
        self.playback_id = self.playback_id.wrapping_add(1);
        self.stage = Stage::Ready { path };
        Event::Ready { size_bytes }
    }

    fn reset_playback(&mut self) {
        self.commands = None;
        self.frame = None;
        self.duration_secs = 0.0;
        self.position_secs = 0.0;
        self.playing = false;
        self.ended = false;
        self.download = None;
    }

    fn on_playback(&mut self, message: PlaybackMessage) -> Event {
        if !self.is_ready() {
            return Event::None;
        }
        match message {
            PlaybackMessage::Started(commands) => {
                self.commands = Some(commands);
                Event::None
            }
            PlaybackMessage::Opened { duration_secs, .. } => {
                self.duration_secs = duration_secs;
                Event::None
            }
            PlaybackMessage::FrameReady {
                rgba_data,
                width,
                height,
                pts_secs,
            } => {
                self.frame = Some(image::Handle::from_rgba(
                    width,
                    height,
                    Arc::unwrap_or_clone(rgba_data),
                ));
                self.position_secs = pts_secs;
                Event::None
            }
            PlaybackMessage::EndOfStream => {
                self.playing = false;
                self.ended = true;
                Event::None
            }
            PlaybackMessage::Error(message) => {
                self.reset_playback();
                self.stage = Stage::Failed;
                Event::Failed(VideoError::from_message(&message).into())
            }
        }
    }

    pub fn subscription(&self) -> Subscription<Message> {
        match &self.stage {
            Stage::Ready { path } => {
                video_playback(path.clone(), self.playback_id).map(Message::Playback)
            }
            _ => Subscription::none(),
        }
    }

    pub fn view<'a>(&'a self, i18n: &'a I18n) -> Element<'a, Message> {
        let body: Element<'a, Message> = match &self.stage {
            Stage::FetchingInfo => Text::new(i18n.tr("player-loading")).into(),
            Stage::Downloading { progress } => {
                let percent = format!("{:.0}", progress * 100.0);
                Column::new()
                    .spacing(spacing::SM)
                    .align_x(alignment::Horizontal::Center)
                    .push(
                        progress_bar(0.0..=1.0, *progress)
                            .girth(sizing::PROGRESS_BAR_HEIGHT)
                            .length(Length::Fixed(sizing::PREVIEW_WIDTH)),
                    )
                    .push(Text::new(i18n.tr_with_args(
                        "player-downloading",
                        &[("percent", percent.as_str())],
                    )))
                    .into()
            }
            Stage::Ready { .. } => self.ready_view(i18n),
            Stage::Failed => Column::new()
                .spacing(spacing::SM)
                .align_x(alignment::Horizontal::Center)
                .push(Text::new(i18n.tr("player-failed")).color(palette::ERROR_500))
                .push(
                    button(Text::new(i18n.tr("player-retry")))
                        .on_press(Message::Retry)
                        .style(button_styles::primary),
                )
                .into(),
        };

        Column::new()
            .spacing(spacing::MD)
            .align_x(alignment::Horizontal::Center)
            .width(Length::Fill)
            .push(Text::new(i18n.tr("player-title")).size(typography::TITLE_MD))
            .push(body)
            .into()
    }

    fn ready_view<'a>(&'a self, i18n: &'a I18n) -> Element<'a, Message> {
        let screen: Element<'a, Message> = match &self.frame {
            Some(handle) => image(handle.clone())
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            None => Text::new(i18n.tr("player-opening")).into(),
        };
        let screen = Container::new(screen)
            .width(Length::Fixed(sizing::PREVIEW_WIDTH))
            .height(Length::Fixed(sizing::PREVIEW_HEIGHT))
            .align_x(alignment::Horizontal::Center)
            .align_y(alignment::Vertical::Center)
            .style(container_styles::media_frame);

        let toggle_key = if self.playing {
            "player-pause"
        } else if self.ended {
            "player-replay"
        } else {
            "player-play"
        };
        let position = format!(
            "{} / {}",
            format_elapsed(secs(self.position_secs)),
            format_elapsed(secs(self.duration_secs))
        );

        let controls = Row::new()
            .spacing(spacing::SM)
            .align_y(alignment::Vertical::Center)
            .push(
                button(Text::new(i18n.tr(toggle_key)))
                    .on_press_maybe(self.commands.is_some().then_some(Message::TogglePlay))
                    .style(button_styles::primary),
            )
            .push(Text::new(position).size(typography::BODY_SM))
            .push(
                button(Text::new(i18n.tr("player-save")))
                    .on_press(Message::SaveCopy)
                    .style(button_styles::secondary),
            );

        let mut content = Column::new()
            .spacing(spacing::SM)
            .align_x(alignment::Horizontal::Center)
            .push(screen)
            .push(controls);

        if let Some(target) = &self.saved_to {
            let shown = target.display().to_string();
            content = content.push(
                Text::new(i18n.tr_with_args("player-saved", &[("path", shown.as_str())]))
                    .size(typography::CAPTION)
                    .color(palette::SUCCESS_500),
            );
        }

        content.into()
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

/// File name of the cached copy: the test id plus the remote extension.
#[must_use]
pub fn cache_file_name(test_id: &str, info: &PlaybackInfo) -> String {
    let stem: String = test_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = if stem.is_empty() {
        "video".to_string()
    } else {
        stem
    };
    format!("{stem}.{}", remote_extension(info))
}

fn remote_extension(info: &PlaybackInfo) -> String {
    let from_name = info
        .file_name
        .as_deref()
        .and_then(|name| Path::new(name).extension())
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));
    if let Some(ext) = from_name {
        return ext;
    }
    let from_type = info.content_type.as_deref().and_then(|content_type| {
        match content_type.split(';').next().map(str::trim) {
            Some("video/webm") => Some("webm"),
            Some("video/x-msvideo" | "video/avi") => Some("avi"),
            Some("video/quicktime") => Some("mov"),
            Some("video/mp4") => Some("mp4"),
            _ => None,
        }
    });
    from_type.unwrap_or(DEFAULT_EXTENSION).to_string()
}

/// A cached file is reused when its size matches the announced size.
fn is_cached(path: &Path, expected_size: Option<u64>) -> bool {
    match (std::fs::metadata(path), expected_size) {
        (Ok(meta), Some(size)) => meta.is_file() && meta.len() == size,
        _ => false,
    }
}

async fn copy_file(source: PathBuf, target: PathBuf) -> Result<PathBuf, Error> {
    tokio::task::spawn_blocking(move || std::fs::copy(&source, &target).map(|_| target))
        .await
        .map_err(|e| Error::Io(e.to_string()))?
        .map_err(Error::from)
}
