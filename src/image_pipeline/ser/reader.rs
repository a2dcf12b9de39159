//! Lazy SER frame reader.
//!
//! The header is parsed once in [`SerReader::open`]. Every call to
//! [`SerReader::frames`] reopens the file and seeks to the payload, so the
//! sequence can be restarted as often as needed without re-parsing.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::image_pipeline::common::error::{FlatFieldError, Result};
use crate::image_pipeline::ser::header::read_header;
use crate::image_pipeline::ser::types::{ByteOrder, Frame, SerHeader};

pub struct SerReader {
    path: PathBuf,
    header: SerHeader,
    frame_limit: Option<usize>,
}

impl SerReader {
    /// Opens a capture and validates its header. `frame_limit` truncates the
    /// sequence to the first N frames.
    pub fn open<P: AsRef<Path>>(path: P, frame_limit: Option<usize>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| {
            FlatFieldError::InputReadError(format!("{}: {}", path.display(), e))
        })?;
        let file_len = file.metadata()?.len();
        let header = read_header(&mut file, file_len)?;

        info!(
            path = %path.display(),
            width = header.width,
            height = header.height,
            frames = header.frame_count,
            bit_depth = header.bit_depth,
            "Opened SER capture"
        );

        Ok(Self {
            path: path.to_path_buf(),
            header,
            frame_limit,
        })
    }

    pub fn header(&self) -> &SerHeader {
        &self.header
    }

    /// Number of frames [`frames`](Self::frames) will yield.
    pub fn frame_count(&self) -> usize {
        match self.frame_limit {
            Some(limit) => limit.min(self.header.frame_count),
            None => self.header.frame_count,
        }
    }

    /// Starts a fresh pass over the frames.
    pub fn frames(&self) -> Result<SerFrames<'_>> {
        let mut file = File::open(&self.path).map_err(|e| {
            FlatFieldError::InputReadError(format!("{}: {}", self.path.display(), e))
        })?;
        file.seek(SeekFrom::Start(self.header.payload_offset))?;
        let frame_bytes = self.header.bytes_per_frame().ok_or_else(|| {
            FlatFieldError::FormatError("declared frame size overflows".to_string())
        })?;

        Ok(SerFrames {
            header: &self.header,
            input: BufReader::new(file),
            buffer: vec![0u8; frame_bytes],
            next_index: 0,
            count: self.frame_count(),
        })
    }
}

pub struct SerFrames<'a> {
    header: &'a SerHeader,
    input: BufReader<File>,
    buffer: Vec<u8>,
    next_index: usize,
    count: usize,
}

impl Iterator for SerFrames<'_> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_index >= self.count {
            return None;
        }
        let index = self.next_index;

        if let Err(e) = self.input.read_exact(&mut self.buffer) {
            self.next_index = self.count;
            return Some(Err(FlatFieldError::FormatError(format!(
                "frame {index} truncated: {e}"
            ))));
        }
        self.next_index += 1;

        debug!(index, "Decoded frame");
        Some(Ok(decode_frame(self.header, index, &self.buffer)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.next_index;
        (remaining, Some(remaining))
    }
}

/// Decodes one raster block, averaging the channels of three-plane captures.
pub(crate) fn decode_frame(header: &SerHeader, index: usize, bytes: &[u8]) -> Frame {
    let samples: Vec<u16> = match (header.bytes_per_sample(), header.byte_order) {
        (1, _) => bytes.iter().map(|&b| b as u16).collect(),
        (_, ByteOrder::LittleEndian) => bytes
            .chunks_exact(2)
            .map(|w| u16::from_le_bytes([w[0], w[1]]))
            .collect(),
        (_, ByteOrder::BigEndian) => bytes
            .chunks_exact(2)
            .map(|w| u16::from_be_bytes([w[0], w[1]]))
            .collect(),
    };

    let data = match header.color_id.planes() {
        1 => samples,
        planes => samples
            .chunks_exact(planes)
            .map(|px| {
                let sum: u32 = px.iter().map(|&v| v as u32).sum();
                ((sum + planes as u32 / 2) / planes as u32) as u16
            })
            .collect(),
    };

    Frame {
        index,
        width: header.width,
        height: header.height,
        data,
    }
}
