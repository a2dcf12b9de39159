use std::io::Read;

use tracing::{debug, instrument};

use crate::image_pipeline::common::error::{FlatFieldError, Result};
use crate::image_pipeline::ser::types::{
    ByteOrder, ColorId, SER_FILE_ID, SER_HEADER_SIZE, SerHeader,
};

const METADATA_FIELD_LEN: usize = 40;

fn u32_at(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

fn u64_at(buf: &[u8], offset: usize) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_le_bytes(word)
}

fn ascii_at(buf: &[u8], offset: usize) -> String {
    String::from_utf8_lossy(&buf[offset..offset + METADATA_FIELD_LEN])
        .trim_end_matches(['\0', ' '])
        .to_string()
}

/// Reads and validates the fixed header against the actual file length.
///
/// Every field is little-endian regardless of the payload byte-order flag.
#[instrument(skip(input))]
pub fn read_header<R: Read>(input: &mut R, file_len: u64) -> Result<SerHeader> {
    let mut buf = [0u8; SER_HEADER_SIZE as usize];
    input.read_exact(&mut buf).map_err(|e| {
        FlatFieldError::FormatError(format!("header truncated ({file_len} bytes): {e}"))
    })?;

    if &buf[0..14] != SER_FILE_ID {
        return Err(FlatFieldError::FormatError(format!(
            "unexpected file id {:?}",
            String::from_utf8_lossy(&buf[0..14])
        )));
    }

    let raw_color = u32_at(&buf, 18);
    let color_id = ColorId::from_raw(raw_color)
        .ok_or_else(|| FlatFieldError::FormatError(format!("unsupported color id {raw_color}")))?;

    let byte_order = match u32_at(&buf, 22) {
        0 => ByteOrder::BigEndian,
        1 => ByteOrder::LittleEndian,
        other => {
            return Err(FlatFieldError::FormatError(format!(
                "invalid byte order flag {other}"
            )));
        }
    };

    let width = u32_at(&buf, 26) as usize;
    let height = u32_at(&buf, 30) as usize;
    if width == 0 || height == 0 {
        return Err(FlatFieldError::FormatError(format!(
            "invalid frame size {width}x{height}"
        )));
    }

    let bit_depth = u32_at(&buf, 34);
    if !(1..=16).contains(&bit_depth) {
        return Err(FlatFieldError::FormatError(format!(
            "unsupported pixel depth {bit_depth} for color id {raw_color}"
        )));
    }

    let frame_count = u32_at(&buf, 38) as usize;
    if frame_count == 0 {
        return Err(FlatFieldError::FormatError("capture declares no frames".to_string()));
    }

    let header = SerHeader {
        lu_id: u32_at(&buf, 14),
        color_id,
        byte_order,
        width,
        height,
        bit_depth,
        frame_count,
        observer: ascii_at(&buf, 42),
        instrument: ascii_at(&buf, 82),
        telescope: ascii_at(&buf, 122),
        date_time: u64_at(&buf, 162),
        date_time_utc: u64_at(&buf, 170),
        payload_offset: SER_HEADER_SIZE,
    };

    let frame_bytes = header
        .bytes_per_frame()
        .ok_or_else(|| FlatFieldError::FormatError("declared frame size overflows".to_string()))?;
    let required = (frame_bytes as u64)
        .checked_mul(frame_count as u64)
        .and_then(|payload| payload.checked_add(header.payload_offset))
        .ok_or_else(|| FlatFieldError::FormatError("declared payload overflows".to_string()))?;
    if required > file_len {
        return Err(FlatFieldError::FormatError(format!(
            "{frame_count} frames of {frame_bytes} bytes need {required} bytes, file has {file_len}"
        )));
    }

    debug!(
        width,
        height,
        bit_depth,
        frame_count,
        color = ?color_id,
        order = ?byte_order,
        "Parsed SER header"
    );
    Ok(header)
}
