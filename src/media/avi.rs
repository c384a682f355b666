// SPDX-License-Identifier: MPL-2.0
//! Minimal AVI (RIFF) muxer for MJPEG video with optional PCM audio.
//!
//! Chunks are buffered in memory and the headers are written by
//! [`AviWriter::finish`], once frame and sample counts are known. Layout:
//!
//! ```text
//! RIFF 'AVI '
//!   LIST 'hdrl'  avih, LIST 'strl' (video), [LIST 'strl' (audio)]
//!   LIST 'movi'  00dc / 01wb chunks
//!   idx1
//! ```

use crate::domain::frame::AudioFormat;

pub const CONTENT_TYPE: &str = "video/x-msvideo";

const AVIF_HASINDEX: u32 = 0x10;
const AVIIF_KEYFRAME: u32 = 0x10;
const VIDEO_CHUNK: &[u8; 4] = b"00dc";
const AUDIO_CHUNK: &[u8; 4] = b"01wb";

struct IndexEntry {
    id: [u8; 4],
    /// Offset of the chunk header from the `movi` fourcc.
    offset: u32,
    size: u32,
}

/// Accumulates frames and samples, then produces a complete AVI file.
pub struct AviWriter {
    width: u32,
    height: u32,
    fps: u32,
    audio: Option<AudioFormat>,
    movi: Vec<u8>,
    index: Vec<IndexEntry>,
    frame_count: u32,
    audio_bytes: u64,
    max_chunk: u32,
}

impl std::fmt::Debug for AviWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AviWriter")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("fps", &self.fps)
            .field("frames", &self.frame_count)
            .field("audio_bytes", &self.audio_bytes)
            .finish_non_exhaustive()
    }
}

impl AviWriter {
    #[must_use]
    pub fn new(width: u32, height: u32, fps: u32, audio: Option<AudioFormat>) -> Self {
        Self {
            width,
            height,
            fps: fps.max(1),
            audio,
            movi: Vec::new(),
            index: Vec::new(),
            frame_count: 0,
            audio_bytes: 0,
            max_chunk: 0,
        }
    }

    #[must_use]
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    #[must_use]
    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    /// Appends one JPEG-encoded frame.
    pub fn push_frame(&mut self, jpeg: &[u8]) {
        self.push_chunk(*VIDEO_CHUNK, jpeg);
        self.frame_count += 1;
    }

    /// Appends interleaved PCM samples. Ignored without an audio stream.
    pub fn push_audio(&mut self, samples: &[i16]) {
        if self.audio.is_none() || samples.is_empty() {
            return;
        }
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        self.audio_bytes += bytes.len() as u64;
        self.push_chunk(*AUDIO_CHUNK, &bytes);
    }

    #[allow(clippy::cast_possible_truncation)]
    fn push_chunk(&mut self, id: [u8; 4], data: &[u8]) {
        let size = data.len() as u32;
        // +4 for the 'movi' fourcc the offsets are relative to.
        let offset = self.movi.len() as u32 + 4;
        self.movi.extend_from_slice(&id);
        self.movi.extend_from_slice(&size.to_le_bytes());
        self.movi.extend_from_slice(data);
        if data.len() % 2 == 1 {
            self.movi.push(0);
        }
        self.index.push(IndexEntry { id, offset, size });
        self.max_chunk = self.max_chunk.max(size);
    }

    /// Writes headers, data and index.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn finish(self) -> Vec<u8> {
        let hdrl = self.header_list();

        let mut idx1 = Vec::with_capacity(self.index.len() * 16);
        for entry in &self.index {
            idx1.extend_from_slice(&entry.id);
            idx1.extend_from_slice(&AVIIF_KEYFRAME.to_le_bytes());
            idx1.extend_from_slice(&entry.offset.to_le_bytes());
            idx1.extend_from_slice(&entry.size.to_le_bytes());
        }

        let movi_list = list(b"movi", &self.movi);
        let idx1_chunk = chunk(b"idx1", &idx1);

        let mut body = Vec::with_capacity(4 + hdrl.len() + movi_list.len() + idx1_chunk.len());
        body.extend_from_slice(b"AVI ");
        body.extend_from_slice(&hdrl);
        body.extend_from_slice(&movi_list);
        body.extend_from_slice(&idx1_chunk);

        let mut out = Vec::with_capacity(body.len() + 8);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }

    fn header_list(&self) -> Vec<u8> {
        let stream_count: u32 = if self.audio.is_some() { 2 } else { 1 };
        let micros_per_frame = 1_000_000 / self.fps;
        let max_bytes_per_sec =
            self.max_chunk * self.fps + self.audio.map_or(0, AudioFormat::bytes_per_second);

        let mut avih = Vec::with_capacity(56);
        for value in [
            micros_per_frame,
            max_bytes_per_sec,
            0, // padding granularity
            AVIF_HASINDEX,
            self.frame_count,
            0, // initial frames
            stream_count,
            self.max_chunk,
            self.width,
            self.height,
            0,
            0,
            0,
            0,
        ] {
            avih.extend_from_slice(&value.to_le_bytes());
        }

        let mut hdrl = chunk(b"avih", &avih);
        hdrl.extend_from_slice(&list(b"strl", &self.video_stream_list()));
        if let Some(format) = self.audio {
            hdrl.extend_from_slice(&list(b"strl", &self.audio_stream_list(format)));
        }
        list(b"hdrl", &hdrl)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn video_stream_list(&self) -> Vec<u8> {
        let mut strh = Vec::with_capacity(56);
        strh.extend_from_slice(b"vids");
        strh.extend_from_slice(b"MJPG");
        for value in [
            0u32, // flags
            0,    // priority + language
            0,    // initial frames
            1,    // scale
            self.fps,
            0, // start
            self.frame_count,
            self.max_chunk,
            u32::MAX, // quality: default
            0,        // sample size: variable
        ] {
            strh.extend_from_slice(&value.to_le_bytes());
        }
        for value in [0i16, 0, self.width as i16, self.height as i16] {
            strh.extend_from_slice(&value.to_le_bytes());
        }

        // BITMAPINFOHEADER
        let mut strf = Vec::with_capacity(40);
        strf.extend_from_slice(&40u32.to_le_bytes());
        strf.extend_from_slice(&(self.width as i32).to_le_bytes());
        strf.extend_from_slice(&(self.height as i32).to_le_bytes());
        strf.extend_from_slice(&1u16.to_le_bytes());
        strf.extend_from_slice(&24u16.to_le_bytes());
        strf.extend_from_slice(b"MJPG");
        strf.extend_from_slice(&(self.width * self.height * 3).to_le_bytes());
        for _ in 0..4 {
            strf.extend_from_slice(&0u32.to_le_bytes());
        }

        let mut out = chunk(b"strh", &strh);
        out.extend_from_slice(&chunk(b"strf", &strf));
        out
    }

    #[allow(clippy::cast_possible_truncation)]
    fn audio_stream_list(&self, format: AudioFormat) -> Vec<u8> {
        let block_align = u32::from(format.block_align());
        let length = (self.audio_bytes / u64::from(block_align.max(1))) as u32;

        let mut strh = Vec::with_capacity(56);
        strh.extend_from_slice(b"auds");
        strh.extend_from_slice(&[0; 4]);
        for value in [
            0u32,
            0,
            0,
            block_align,
            format.bytes_per_second(),
            0,
            length,
            self.max_chunk,
            u32::MAX,
            block_align,
        ] {
            strh.extend_from_slice(&value.to_le_bytes());
        }
        strh.extend_from_slice(&[0; 8]);

        // WAVEFORMATEX, PCM
        let mut strf = Vec::with_capacity(18);
        strf.extend_from_slice(&1u16.to_le_bytes());
        strf.extend_from_slice(&format.channels.to_le_bytes());
        strf.extend_from_slice(&format.sample_rate.to_le_bytes());
        strf.extend_from_slice(&format.bytes_per_second().to_le_bytes());
        strf.extend_from_slice(&format.block_align().to_le_bytes());
        strf.extend_from_slice(&AudioFormat::BITS_PER_SAMPLE.to_le_bytes());
        strf.extend_from_slice(&0u16.to_le_bytes());

        let mut out = chunk(b"strh", &strh);
        out.extend_from_slice(&chunk(b"strf", &strf));
        out
    }
}

#[allow(clippy::cast_possible_truncation)]
fn chunk(id: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 9);
    out.extend_from_slice(id);
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
    if data.len() % 2 == 1 {
        out.push(0);
    }
    out
}

#[allow(clippy::cast_possible_truncation)]
fn list(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 12);
    out.extend_from_slice(b"LIST");
    out.extend_from_slice(&((data.len() + 4) as u32).to_le_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    #[test]
    fn riff_size_covers_whole_file() {
        let mut writer = AviWriter::new(4, 4, 15, None);
        writer.push_frame(&[0xFF, 0xD8, 0xFF, 0xD9]);
        let file = writer.finish();
        assert_eq!(&file[..4], b"RIFF");
        assert_eq!(&file[8..12], b"AVI ");
        assert_eq!(u32_at(&file, 4) as usize, file.len() - 8);
    }

    #[test]
    fn header_reports_frame_count_and_size() {
        let mut writer = AviWriter::new(640, 480, 15, None);
        for _ in 0..3 {
            writer.push_frame(&[1, 2, 3]);
        }
        let file = writer.finish();
        let avih = find(&file, b"avih").unwrap() + 8;
        assert_eq!(u32_at(&file, avih), 1_000_000 / 15);
        assert_eq!(u32_at(&file, avih + 16), 3);
        assert_eq!(u32_at(&file, avih + 24), 1);
        assert_eq!(u32_at(&file, avih + 32), 640);
        assert_eq!(u32_at(&file, avih + 36), 480);
    }

    #[test]
    fn odd_chunks_are_padded_and_indexed() {
        let mut writer = AviWriter::new(2, 2, 10, None);
        writer.push_frame(&[1, 2, 3]);
        writer.push_frame(&[4, 5]);
        let file = writer.finish();

        let movi = find(&file, b"movi").unwrap();
        let idx1 = find(&file, b"idx1").unwrap();
        assert_eq!(u32_at(&file, idx1 + 4), 32);

        // Second entry points right after the padded first chunk.
        let second_offset = u32_at(&file, idx1 + 8 + 16 + 8) as usize;
        assert_eq!(second_offset, 4 + 8 + 4);
        assert_eq!(&file[movi + second_offset..movi + second_offset + 4], b"00dc");
    }

    #[test]
    fn audio_stream_is_declared_when_present() {
        let format = AudioFormat {
            sample_rate: 16_000,
            channels: 1,
        };
        let mut writer = AviWriter::new(2, 2, 10, Some(format));
        writer.push_frame(&[1, 2]);
        writer.push_audio(&[1, -1, 2, -2]);
        let file = writer.finish();

        let avih = find(&file, b"avih").unwrap() + 8;
        assert_eq!(u32_at(&file, avih + 24), 2);
        assert!(find(&file, b"auds").is_some());
        assert!(find(&file, b"01wb").is_some());
    }

    #[test]
    fn audio_is_ignored_without_audio_stream() {
        let mut writer = AviWriter::new(2, 2, 10, None);
        writer.push_audio(&[1, 2, 3]);
        assert!(find(&writer.finish(), b"01wb").is_none());
    }
}
