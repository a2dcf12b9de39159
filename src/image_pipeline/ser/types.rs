//! SER capture types

/// Size of the fixed SER header preceding the frame payload.
pub const SER_HEADER_SIZE: u64 = 178;

/// Identifier tag every SER capture starts with.
pub const SER_FILE_ID: &[u8; 14] = b"LUCAM-RECORDER";

/// Sensor layout declared by the capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorId {
    Mono,
    /// Any of the single-plane Bayer patterns (RGGB, GRBG, ...), kept raw
    Bayer(u32),
    Rgb,
    Bgr,
}

impl ColorId {
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            0 => Some(ColorId::Mono),
            8..=19 => Some(ColorId::Bayer(value)),
            100 => Some(ColorId::Rgb),
            101 => Some(ColorId::Bgr),
            _ => None,
        }
    }

    pub fn planes(self) -> usize {
        match self {
            ColorId::Mono | ColorId::Bayer(_) => 1,
            ColorId::Rgb | ColorId::Bgr => 3,
        }
    }
}

/// Byte order of the sample words in the frame payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    BigEndian,
    LittleEndian,
}

/// Parsed SER header
#[derive(Debug, Clone, PartialEq)]
pub struct SerHeader {
    pub lu_id: u32,
    pub color_id: ColorId,
    pub byte_order: ByteOrder,
    pub width: usize,
    pub height: usize,
    /// Significant bits per sample (e.g. 8, 12, 14 or 16)
    pub bit_depth: u32,
    pub frame_count: usize,
    pub observer: String,
    pub instrument: String,
    pub telescope: String,
    pub date_time: u64,
    pub date_time_utc: u64,
    /// Offset of the first frame in the file
    pub payload_offset: u64,
}

impl SerHeader {
    pub fn bytes_per_sample(&self) -> usize {
        if self.bit_depth <= 8 { 1 } else { 2 }
    }

    /// Payload bytes of one frame, `None` when the declared size overflows.
    pub fn bytes_per_frame(&self) -> Option<usize> {
        self.width
            .checked_mul(self.height)?
            .checked_mul(self.color_id.planes())?
            .checked_mul(self.bytes_per_sample())
    }

    /// Largest sample value the declared bit depth can hold.
    pub fn max_sample(&self) -> u16 {
        ((1u32 << self.bit_depth) - 1) as u16
    }
}

/// One decoded frame, reduced to a single plane.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Index of the frame within the capture
    pub index: usize,
    pub width: usize,
    pub height: usize,
    pub data: Vec<u16>,
}
