//! Waveform and framing parameters for the RD94 downlink

/// Baud rate of the line-level bit signal (Hz)
pub const BAUD_HZ: f32 = 4800.0;

/// Length of one UART-style symbol, in logical bits
///
/// 8N1 framing: one start bit (`0`), eight data bits sent least
/// significant bit first, and one stop bit (`1`).
pub const UART_SYMBOL_BITS: usize = 1 + 8 + 1;

/// Frame length, in bytes
pub const FRAME_LEN: usize = 120;

/// Frame length, in logical (Manchester-decoded) bits
pub const FRAME_BITS: usize = FRAME_LEN * UART_SYMBOL_BITS;

/// Frame length, in Manchester-coded line bits
pub const RAW_FRAME_BITS: usize = 2 * FRAME_BITS;

/// Frame header bytes
///
/// Every frame is introduced by these five bytes. Only the last
/// three are part of the training pattern, and they appear as the
/// first three bytes of every decoded [`Frame`](crate::Frame).
pub const HEADER_BYTES: [u8; 5] = [0x1A, 0xCF, 0xFC, 0x1D, 0x01];

/// Header length, in line bits
pub const HEADER_LINE_BITS: usize = HEADER_BYTES.len() * UART_SYMBOL_BITS * 2;

/// Training pattern length, in line bits
pub const SYNC_LEN: usize = 60;

/// Offset of the training pattern within the header, in line bits
pub const SYNC_OFFSET: usize = HEADER_LINE_BITS - SYNC_LEN;

/// Number of header bytes covered by the training pattern
///
/// These bytes open every frame; telemetry fields follow them.
pub const SYNC_BYTES: usize = SYNC_LEN / (2 * UART_SYMBOL_BITS);

// Header as transmitted, one character per line bit
//
// Manchester coded (0 → 10, 1 → 01) 8N1 symbols
const HEADER_STR: &str = concat!(
    "10100110010110101001", // 0x1A
    "10010101011010010101", // 0xCF
    "10101001010101010101", // 0xFC
    "10011001010110101001", // 0x1D
    "10011010101010101001", // 0x01
);

/// Complete frame header, in line bits
pub const HEADER: [u8; HEADER_LINE_BITS] = line_bits(HEADER_STR, 0);

/// Training pattern, in line bits
///
/// The frame synchronizer searches the line bitstream for this
/// exact sequence. It is the tail of the [`HEADER`].
pub const TRAINING_PATTERN: [u8; SYNC_LEN] = line_bits(HEADER_STR, SYNC_OFFSET);

/// Samples per line bit at the given sampling rate `fs`
pub fn samples_per_bit(fs: u32) -> f32 {
    fs as f32 / BAUD_HZ
}

// Convert a string of `0`/`1` characters into bits, skipping
// the first `skip` characters
const fn line_bits<const N: usize>(s: &str, skip: usize) -> [u8; N] {
    let chars = s.as_bytes();
    let mut out = [0u8; N];
    let mut i = 0;
    while i < N {
        out[i] = (chars[skip + i] == b'1') as u8;
        i += 1;
    }
    out
}

/// Frame `bytes` into 8N1 UART symbols
///
/// Emits ten logical bits per byte: start bit, eight data bits
/// (least significant bit first), stop bit.
#[cfg(test)]
pub fn uart_encode(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() * UART_SYMBOL_BITS);
    for byte in bytes {
        out.push(0);
        let mut word = *byte;
        for _i in 0..8 {
            out.push(word & 0x01);
            word >>= 1;
        }
        out.push(1);
    }
    out
}

/// Manchester-encode logical bits into line bits
///
/// `1` → `01` and `0` → `10`.
#[cfg(test)]
pub fn manchester_encode(bits: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bits.len() * 2);
    for bit in bits {
        if *bit == 1 {
            out.extend_from_slice(&[0, 1]);
        } else {
            out.extend_from_slice(&[1, 0]);
        }
    }
    out
}

/// Very simple NRZ modulator
///
/// This method is designed for use in tests. Each line bit is
/// held at `+amplitude` (for `1`) or `-amplitude` (for `0`) for
/// one bit period at the sampling rate `fs`. Bit boundaries fall
/// on fractional sample times when `fs` is not a multiple of the
/// baud rate.
#[cfg(test)]
pub fn modulate_nrz(line_bits: &[u8], fs: u32, amplitude: i32) -> Vec<i32> {
    let bits_per_sample = BAUD_HZ as f64 / fs as f64;
    let mut out = Vec::with_capacity((line_bits.len() as f64 / bits_per_sample) as usize + 1);
    let mut k = 0usize;
    loop {
        let idx = (k as f64 * bits_per_sample) as usize;
        match line_bits.get(idx) {
            Some(1) => out.push(amplitude),
            Some(_) => out.push(-amplitude),
            None => break,
        }
        k += 1;
    }
    out
}
