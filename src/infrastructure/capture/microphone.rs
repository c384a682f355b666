// SPDX-License-Identifier: MPL-2.0
//! Microphone input through `cpal`.
//!
//! The input callback converts every sample to `i16` and appends it to a
//! shared buffer that the capture worker drains once per video frame.

use super::classify_device_error;
use crate::application::port::MicrophoneSource;
use crate::domain::frame::AudioFormat;
use crate::error::PermissionError;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::Sample;
use std::sync::{Arc, Mutex};

/// Samples kept when the worker stops draining (about 10 s of stereo 48 kHz).
const MAX_BUFFERED_SAMPLES: usize = 48_000 * 2 * 10;

#[derive(Default)]
pub struct CpalMicrophone {
    buffer: Arc<Mutex<Vec<i16>>>,
    stream: Option<cpal::Stream>,
}

impl CpalMicrophone {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn build_stream<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        buffer: Arc<Mutex<Vec<i16>>>,
    ) -> Result<cpal::Stream, PermissionError>
    where
        T: cpal::SizedSample,
        i16: cpal::FromSample<T>,
    {
        device
            .build_input_stream(
                config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    let Ok(mut buf) = buffer.lock() else {
                        return;
                    };
                    if buf.len() + data.len() > MAX_BUFFERED_SAMPLES {
                        return;
                    }
                    buf.extend(data.iter().map(|s| i16::from_sample(*s)));
                },
                |err| {
                    eprintln!("Audio input error: {err}");
                },
                None,
            )
            .map_err(|e| classify_device_error(&e.to_string()))
    }
}

impl std::fmt::Debug for CpalMicrophone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpalMicrophone")
            .field("open", &self.stream.is_some())
            .finish_non_exhaustive()
    }
}

impl MicrophoneSource for CpalMicrophone {
    fn open(&mut self) -> Result<AudioFormat, PermissionError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(PermissionError::NoDevice)?;

        let supported_config = device
            .default_input_config()
            .map_err(|e| classify_device_error(&e.to_string()))?;

        let format = AudioFormat {
            sample_rate: supported_config.sample_rate(),
            channels: supported_config.channels(),
        };

        let buffer = Arc::clone(&self.buffer);
        let stream = match supported_config.sample_format() {
            cpal::SampleFormat::F32 => {
                Self::build_stream::<f32>(&device, &supported_config.into(), buffer)?
            }
            cpal::SampleFormat::I16 => {
                Self::build_stream::<i16>(&device, &supported_config.into(), buffer)?
            }
            cpal::SampleFormat::U16 => {
                Self::build_stream::<u16>(&device, &supported_config.into(), buffer)?
            }
            other => {
                return Err(PermissionError::DeviceFailed(format!(
                    "unsupported sample format {other:?}"
                )))
            }
        };

        stream
            .play()
            .map_err(|e| classify_device_error(&e.to_string()))?;
        self.stream = Some(stream);
        Ok(format)
    }

    fn drain_samples(&mut self) -> Vec<i16> {
        match self.buffer.lock() {
            Ok(mut buf) => std::mem::take(&mut *buf),
            Err(_) => Vec::new(),
        }
    }

    fn release(&mut self) {
        // Dropping the stream stops the callback.
        self.stream = None;
        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }
    }
}
