//! Frame output
//!
//! Frames come from one of two sources: an [`Rd94Receiver`]
//! decoding audio, or lines of frame bits as previously printed
//! with `--rawbits`. Either way, each frame is printed according
//! to the [`OutputMode`].

use std::fmt::Write as _;
use std::io::{BufRead, Write};

use anyhow::Context;
use log::{debug, info, warn};
use rd94::{DecodedBit, FixRecord, Frame, Rd94Receiver, POSITION_END};

/// What to print for each frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputMode {
    /// One line per valid fix
    ///
    /// `verbose` adds the GPS week and the raw velocity fields.
    Fix { verbose: bool },

    /// Frame bits, as `0`, `1`, or `x`
    Bits,

    /// Frame bytes, as hex
    Bytes,
}

/// Decode audio
///
/// Runs the `receiver` over the `input` samples until they are
/// exhausted. Every complete frame is printed to `out`. A frame
/// which is cut short by the end of the input is printed only if
/// `flush_partial` is set. Returns the number of lines printed.
pub fn run_audio<I, W>(
    mode: OutputMode,
    receiver: &mut Rd94Receiver,
    input: I,
    flush_partial: bool,
    out: &mut W,
) -> Result<u64, anyhow::Error>
where
    I: Iterator<Item = i32>,
    W: Write,
{
    let mut lines = 0;
    for frame in receiver.iter(input) {
        lines += print_frame(mode, &frame, out)? as u64;
    }
    if flush_partial {
        if let Some(frame) = receiver.flush() {
            lines += print_frame(mode, &frame, out)? as u64;
        }
    } else if receiver.is_sync() {
        debug!("end of input inside a frame; discarding it");
    }

    info!(
        "end of input: {} samples, {} frames, {} lines",
        receiver.input_sample_counter(),
        receiver.frame_count(),
        lines
    );
    Ok(lines)
}

/// Decode lines of frame bits
///
/// Each line of `input` holds the bits of one frame. Any byte
/// other than `0` or `1` is an invalid bit, so lines need not be
/// valid text. Bits past the end of a frame are discarded. Lines
/// which are too short to contain a position are skipped. Returns
/// the number of lines printed.
pub fn run_bitstream<B, W>(mode: OutputMode, input: B, out: &mut W) -> Result<u64, anyhow::Error>
where
    B: BufRead,
    W: Write,
{
    let mut lines = 0;
    for (lineno, line) in input.split(b'\n').enumerate() {
        let line = line.with_context(|| format!("unable to read line {}", lineno + 1))?;
        let end = line
            .iter()
            .rposition(|b| !b.is_ascii_whitespace())
            .map_or(0, |i| i + 1);
        let bits = &line[..end];
        if bits.is_empty() {
            continue;
        }

        let frame = Frame::from_logical_bits(bits.iter().map(|&b| DecodedBit::from(b as char)));
        if bits.len() > frame.captured_bits() {
            warn!(
                "line {}: {} bits is longer than one frame; ignoring the excess",
                lineno + 1,
                bits.len()
            );
        }
        if !frame.covers_bytes(POSITION_END) {
            debug!(
                "line {}: skipping short frame of {} bits",
                lineno + 1,
                bits.len()
            );
            continue;
        }

        lines += print_frame(mode, &frame, out)? as u64;
    }
    Ok(lines)
}

/// Print one frame
///
/// In [`OutputMode::Fix`], frames which fail to decode are logged
/// and skipped. Returns `true` if a line was printed.
pub fn print_frame<W>(mode: OutputMode, frame: &Frame, out: &mut W) -> Result<bool, anyhow::Error>
where
    W: Write,
{
    let line = match mode {
        OutputMode::Bits => format_bits(frame),
        OutputMode::Bytes => format_bytes(frame),
        OutputMode::Fix { verbose } => match frame.fix() {
            Ok(fix) => format_fix(&fix, verbose),
            Err(e) => {
                debug!("frame rejected: {}", e);
                return Ok(false);
            }
        },
    };

    writeln!(out, "{}", line).context("unable to write output")?;
    Ok(true)
}

/// Frame bits as `0`, `1`, and `x`
pub fn format_bits(frame: &Frame) -> String {
    frame.bits().iter().map(DecodedBit::as_char).collect()
}

/// Frame bytes as space-separated hex
pub fn format_bytes(frame: &Frame) -> String {
    let mut out = String::with_capacity(frame.bytes().len() * 3);
    for byte in frame.bytes() {
        let _ = write!(out, "{:02X} ", byte);
    }
    out
}

/// Human-readable fix
pub fn format_fix(fix: &FixRecord, verbose: bool) -> String {
    let mut out = format!(
        "[{:5}]  {} {} {}",
        fix.frame_number(),
        fix.weekday(),
        fix.date(),
        fix.time_of_day()
    );
    if verbose {
        let _ = write!(out, " (W {})", fix.gps_week());
    }
    let _ = write!(
        out,
        "   lat: {:.5}°  lon: {:.5}°  alt: {:.2}m",
        fix.lat_deg(),
        fix.lon_deg(),
        fix.alt_m()
    );

    if let Some(vel) = fix.velocity() {
        if verbose {
            let v = vel.ecef();
            let _ = write!(
                out,
                "  #  {:6.2}  #  ({:7.2},{:7.2},{:7.2})",
                vel.scalar(),
                v.vx,
                v.vy,
                v.vz
            );
        }
        let _ = write!(
            out,
            "   vH: {:.1}m/s  D: {:.1}°  vV: {:.1}m/s",
            vel.horizontal_mps(),
            vel.heading_deg(),
            vel.vertical_mps()
        );
        if verbose {
            let v2 = vel.secondary();
            let _ = write!(out, "  ({:7.2},{:7.2},{:7.2})", v2.vx, v2.vy, v2.vz);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use rd94::waveform::{FRAME_BITS, HEADER_BYTES, SYNC_BYTES};
    use rd94::Geodetic;

    // Wednesday 12:34:56.789
    const TOW_MS: i32 = (3 * 86400 + 45296) * 1000 + 789;

    // Logical bits of a frame, as printed with --rawbits
    fn frame_bit_str(frame_number: u16, alt_m: f64, velocity_cm: [i32; 3]) -> String {
        let mut bytes = [0u8; 120];
        bytes[0..SYNC_BYTES].copy_from_slice(&HEADER_BYTES[2..]);
        bytes[3..5].copy_from_slice(&frame_number.to_le_bytes());
        bytes[3 + 0x17..3 + 0x1B].copy_from_slice(&TOW_MS.to_le_bytes());
        bytes[3 + 0x1F..3 + 0x21].copy_from_slice(&2150i16.to_le_bytes());

        let pos = Geodetic::new(48.1, 11.5, alt_m).to_ecef();
        for (i, v) in [pos.x, pos.y, pos.z].iter().enumerate() {
            let cm = (v * 100.0).round() as i32;
            bytes[3 + 0x23 + 4 * i..3 + 0x27 + 4 * i].copy_from_slice(&cm.to_le_bytes());
        }
        bytes[3 + 0x2F..3 + 0x33].copy_from_slice(&250i32.to_le_bytes());
        for (i, cm) in velocity_cm.iter().enumerate() {
            bytes[3 + 0x33 + 4 * i..3 + 0x37 + 4 * i].copy_from_slice(&cm.to_le_bytes());
            bytes[3 + 0x49 + 4 * i..3 + 0x4D + 4 * i].copy_from_slice(&cm.to_le_bytes());
        }

        let mut out = String::new();
        for byte in bytes {
            out.push('0');
            for i in 0..8 {
                out.push(if byte & (1 << i) != 0 { '1' } else { '0' });
            }
            out.push('1');
        }
        out
    }

    #[test]
    fn test_format_fix() {
        let frame = Frame::from_bit_str(&frame_bit_str(42, 1500.0, [0, 0, -1200]));
        let fix = frame.fix().expect("valid fix");

        let line = format_fix(&fix, false);
        assert!(line.starts_with("[   42]  Wed 2021-03-24 12:34:56.789   lat: 48.10000°  lon: 11.50000°  alt: 1500.00m"));
        assert!(line.contains("   vH: "));
        assert!(line.ends_with("m/s"));
        assert!(!line.contains("(W "));

        let line = format_fix(&fix, true);
        assert!(line.contains("12:34:56.789 (W 2150)   lat: "));
        assert!(line.contains("#    2.50  #  (   0.00,   0.00, -12.00)"));
        assert!(line.ends_with("(   0.00,   0.00, -12.00)"));
    }

    #[test]
    fn test_format_raw() {
        let text = frame_bit_str(1, 1500.0, [0; 3]);
        let frame = Frame::from_bit_str(&text);
        assert_eq!(text, format_bits(&frame));

        let hex = format_bytes(&frame);
        assert!(hex.starts_with("FC 1D 01 01 00 "));
        assert_eq!(360, hex.len());
    }

    #[test]
    fn test_bitstream() {
        let mut input = String::new();

        // a complete frame
        input.push_str(&frame_bit_str(1, 1500.0, [0; 3]));
        input.push('\n');

        // implausible altitude
        input.push_str(&frame_bit_str(2, 90000.0, [0; 3]));
        input.push('\n');

        // blank line, then a line too short for a position
        input.push('\n');
        input.push_str(&frame_bit_str(3, 1500.0, [0; 3])[0..499]);
        input.push('\n');

        // truncated in the velocity section, with excess bits and
        // DOS line endings
        input.push_str(&frame_bit_str(4, 1500.0, [0; 3])[0..700]);
        input.push_str("\r\n");
        input.push_str(&frame_bit_str(5, 1500.0, [0; 3]));
        input.push_str("0101\r\n");

        let mut out = Vec::new();
        let lines =
            run_bitstream(OutputMode::Fix { verbose: false }, input.as_bytes(), &mut out).expect("run");
        assert_eq!(3, lines);

        let text = String::from_utf8(out).expect("utf-8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(3, lines.len());
        assert!(lines[0].starts_with("[    1]"));
        assert!(lines[0].contains("vH: 0.0m/s"));
        assert!(lines[1].starts_with("[    4]"));
        assert!(!lines[1].contains("vH:"));
        assert!(lines[2].starts_with("[    5]"));
    }

    #[test]
    fn test_bitstream_not_text() {
        let mut input = frame_bit_str(1, 1500.0, [0; 3]).into_bytes();
        input.push(b'\n');

        // a stray byte which is not UTF-8 makes one bit invalid
        let mut bad = frame_bit_str(2, 1500.0, [0; 3]).into_bytes();
        bad[1100] = 0xff;
        input.extend_from_slice(&bad);
        input.push(b'\n');

        input.extend_from_slice(b"0101\xff0101\n");
        input.extend(frame_bit_str(3, 1500.0, [0; 3]).into_bytes());
        input.push(b'\n');

        let mut out = Vec::new();
        let lines = run_bitstream(OutputMode::Fix { verbose: false }, input.as_slice(), &mut out)
            .expect("run");
        assert_eq!(3, lines);

        let text = String::from_utf8(out).expect("utf-8");
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("[    1]"));
        assert!(lines[1].starts_with("[    2]"));
        assert!(lines[2].starts_with("[    3]"));

        let mut out = Vec::new();
        run_bitstream(OutputMode::Bits, &bad[..], &mut out).expect("run");
        assert_eq!(Some('x'), String::from_utf8(out).expect("utf-8").chars().nth(1100));
    }

    #[test]
    fn test_bitstream_raw_out() {
        let text = frame_bit_str(7, 1500.0, [0; 3]);
        let mut out = Vec::new();
        run_bitstream(OutputMode::Bits, text.as_bytes(), &mut out).expect("run");
        assert_eq!(format!("{}\n", text), String::from_utf8(out).expect("utf-8"));
        assert_eq!(FRAME_BITS, text.len());
    }

    #[test]
    fn test_audio() {
        use rd94::Rd94ReceiverBuilder;

        let mut rx = Rd94ReceiverBuilder::new(48000).build();
        let mut out = Vec::new();
        let silence = std::iter::repeat(100).take(48000);
        let lines = run_audio(OutputMode::Bytes, &mut rx, silence, true, &mut out).expect("run");
        assert_eq!(0, lines);
        assert!(out.is_empty());
    }

    #[test]
    fn test_audio_cut_short() {
        use rd94::waveform::HEADER;
        use rd94::Rd94ReceiverBuilder;

        // two frames, with the recording ending 40 bytes before
        // the end of the second
        let mut line = Vec::new();
        for frame_number in [100, 101] {
            line.extend(std::iter::repeat([1u8, 0]).take(50).flatten());
            line.extend_from_slice(&HEADER);
            for c in frame_bit_str(frame_number, 1500.0, [0; 3])
                .bytes()
                .skip(SYNC_BYTES * 10)
            {
                match c {
                    b'1' => line.extend_from_slice(&[0, 1]),
                    _ => line.extend_from_slice(&[1, 0]),
                }
            }
        }
        let cut = line.len() - 40 * 10 * 2;

        // ten samples per line bit at 48 kHz
        let samples: Vec<i32> = line[0..cut]
            .iter()
            .flat_map(|&bit| std::iter::repeat(if bit == 1 { 1000 } else { -1000 }).take(10))
            .collect();

        let mut rx = Rd94ReceiverBuilder::new(48000).build();
        let mut out = Vec::new();
        let mode = OutputMode::Fix { verbose: false };
        let lines = run_audio(mode, &mut rx, samples.iter().copied(), false, &mut out)
            .expect("run");
        assert_eq!(1, lines);
        let text = String::from_utf8(out).expect("utf-8");
        assert!(text.starts_with("[  100]"));
        assert_eq!(1, text.lines().count());

        let mut rx = Rd94ReceiverBuilder::new(48000).build();
        let mut out = Vec::new();
        let lines = run_audio(mode, &mut rx, samples.iter().copied(), true, &mut out)
            .expect("run");
        assert_eq!(2, lines);
        let text = String::from_utf8(out).expect("utf-8");
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("[  100]"));
        assert!(lines[1].starts_with("[  101]"));
        assert!(!lines[1].contains("vH:"));
    }
}
