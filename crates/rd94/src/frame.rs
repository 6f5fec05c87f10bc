//! Manchester line decoding and byte packing
//!
//! A synchronized frame arrives as [`RAW_FRAME_BITS`] Manchester-coded
//! *line bits*. Each pair of line bits carries one *logical bit*:
//!
//! ```txt
//! line bits   01 10 10 01 … 01
//! logical      1  0  0  1 …  1
//! ```
//!
//! Logical bits are grouped into 8N1 UART symbols of ten bits each.
//! The start and stop bits are discarded and the eight data bits,
//! least significant bit first, form one byte of the [`Frame`].
//!
//! There is no checksum. Invalid line bit pairs are flagged but
//! pack as zero bits, so a damaged frame can still decode into
//! plausible-looking (but wrong) telemetry.

use std::fmt;

use arrayvec::ArrayVec;

use crate::fix::{FixError, FixRecord};
use crate::waveform::{FRAME_BITS, FRAME_LEN, RAW_FRAME_BITS, UART_SYMBOL_BITS};

/// A Manchester-decoded logical bit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DecodedBit {
    /// Logical zero (line bits `10`)
    #[default]
    Zero,

    /// Logical one (line bits `01`)
    One,

    /// Invalid transition (line bits `00` or `11`)
    Invalid,
}

impl DecodedBit {
    /// Decode a pair of line bits
    ///
    /// Any nonzero value counts as a one.
    #[inline]
    pub fn from_line_pair(first: u8, second: u8) -> Self {
        match (first != 0, second != 0) {
            (false, true) => DecodedBit::One,
            (true, false) => DecodedBit::Zero,
            _ => DecodedBit::Invalid,
        }
    }

    /// True for a valid logical one
    #[inline]
    pub fn is_one(&self) -> bool {
        *self == DecodedBit::One
    }

    /// True for an invalid transition
    #[inline]
    pub fn is_invalid(&self) -> bool {
        *self == DecodedBit::Invalid
    }

    /// Text representation: `0`, `1`, or `x`
    pub fn as_char(&self) -> char {
        match self {
            DecodedBit::Zero => '0',
            DecodedBit::One => '1',
            DecodedBit::Invalid => 'x',
        }
    }
}

impl From<char> for DecodedBit {
    /// Parse `0` or `1`. Anything else is `Invalid`.
    fn from(c: char) -> Self {
        match c {
            '0' => DecodedBit::Zero,
            '1' => DecodedBit::One,
            _ => DecodedBit::Invalid,
        }
    }
}

impl fmt::Display for DecodedBit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Logical bits of one frame
pub type LogicalBits = ArrayVec<DecodedBit, FRAME_BITS>;

/// Decode Manchester line bits into logical bits
///
/// Reads up to [`RAW_FRAME_BITS`] line bits from `raw`. If `raw` is
/// shorter than a full frame, the remainder is zero-filled before
/// decoding; the padding decodes as `Invalid`. The output always
/// holds exactly [`FRAME_BITS`] bits.
pub fn manchester_decode(raw: &[u8]) -> LogicalBits {
    let mut padded = [0u8; RAW_FRAME_BITS];
    let len = raw.len().min(RAW_FRAME_BITS);
    padded[..len].copy_from_slice(&raw[..len]);

    padded
        .chunks_exact(2)
        .map(|pair| DecodedBit::from_line_pair(pair[0], pair[1]))
        .collect()
}

/// Pack logical bits into frame bytes
///
/// Each ten-bit UART symbol in `bits` produces one byte. The start
/// and stop bits are ignored, and `Invalid` bits pack as zero. If
/// `bits` is short, the missing bytes are zero.
pub fn pack_bytes(bits: &[DecodedBit]) -> [u8; FRAME_LEN] {
    let mut out = [0u8; FRAME_LEN];
    for (byte, symbol) in out.iter_mut().zip(bits.chunks(UART_SYMBOL_BITS)) {
        *byte = pack_symbol(symbol);
    }
    out
}

// Pack data bits 1…8 of one UART symbol, LSb first
#[inline]
fn pack_symbol(symbol: &[DecodedBit]) -> u8 {
    symbol
        .iter()
        .skip(1)
        .take(8)
        .enumerate()
        .fold(0u8, |acc, (i, bit)| acc | ((bit.is_one() as u8) << i))
}

/// A decoded RD94 frame
///
/// Holds the logical bits of the frame, the bytes packed from
/// them, and the number of logical bits that were actually
/// received. Bits past the end of a truncated capture are
/// padding.
///
/// The first [`SYNC_BYTES`](crate::waveform::SYNC_BYTES) bytes are
/// the tail of the frame header. Telemetry follows; use
/// [`fix()`](Frame::fix) to decode it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    bits: LogicalBits,
    bytes: [u8; FRAME_LEN],
    captured_bits: usize,
}

impl Frame {
    /// Frame from Manchester-coded line bits
    ///
    /// `raw` starts with the training pattern and should contain
    /// [`RAW_FRAME_BITS`] line bits. Shorter captures are
    /// zero-filled; an incomplete trailing pair is not counted as
    /// captured.
    pub fn from_line_bits(raw: &[u8]) -> Self {
        let captured_bits = raw.len().min(RAW_FRAME_BITS) / 2;
        Self::from_decoded(manchester_decode(raw), captured_bits)
    }

    /// Frame from logical bits
    ///
    /// Takes up to [`FRAME_BITS`] logical bits from `bits`. If fewer
    /// are available, the frame is padded with zeros.
    pub fn from_logical_bits<I>(bits: I) -> Self
    where
        I: IntoIterator<Item = DecodedBit>,
    {
        let bits: LogicalBits = bits.into_iter().take(FRAME_BITS).collect();
        let captured_bits = bits.len();
        Self::from_decoded(bits, captured_bits)
    }

    /// Frame from a string of `0`/`1` characters
    ///
    /// Characters other than `0` and `1` become `Invalid` bits.
    /// Trailing whitespace is ignored.
    pub fn from_bit_str(s: &str) -> Self {
        Self::from_logical_bits(s.trim_end().chars().map(DecodedBit::from))
    }

    /// Decode telemetry fields
    ///
    /// Returns an error if the frame is too short to contain a
    /// position or if any field fails validation.
    pub fn fix(&self) -> Result<FixRecord, FixError> {
        FixRecord::try_from(self)
    }

    /// Logical bits, including any padding
    pub fn bits(&self) -> &[DecodedBit] {
        self.bits.as_slice()
    }

    /// Frame bytes
    pub fn bytes(&self) -> &[u8; FRAME_LEN] {
        &self.bytes
    }

    /// Number of logical bits actually received
    ///
    /// Equals [`FRAME_BITS`] for a complete frame.
    pub fn captured_bits(&self) -> usize {
        self.captured_bits
    }

    /// True if the frame was received in full
    pub fn is_complete(&self) -> bool {
        self.captured_bits == FRAME_BITS
    }

    /// True if the capture covers frame bytes `0..end`
    pub fn covers_bytes(&self, end: usize) -> bool {
        self.captured_bits >= end * UART_SYMBOL_BITS
    }

    /// Count of invalid Manchester transitions in the captured bits
    pub fn invalid_bit_count(&self) -> usize {
        self.bits[..self.captured_bits]
            .iter()
            .filter(|b| b.is_invalid())
            .count()
    }

    fn from_decoded(mut bits: LogicalBits, captured_bits: usize) -> Self {
        while !bits.is_full() {
            bits.push(DecodedBit::Zero);
        }
        let bytes = pack_bytes(&bits);
        Self {
            bits,
            bytes,
            captured_bits,
        }
    }
}
