//! Full receiver chain

mod bitclock;
mod framesync;
mod framing;

#[cfg(not(test))]
use log::{info, trace};

#[cfg(test)]
use std::println as trace;
#[cfg(test)]
use std::println as info;

use crate::builder::Rd94ReceiverBuilder;
use crate::frame::Frame;
use crate::waveform::{RAW_FRAME_BITS, SYNC_LEN};

use bitclock::BitClock;
use framing::Framer;

/// A complete RD94 receiver chain
///
/// The receive chain takes `i32` baseband samples, as they come
/// out of a discriminator or FM receiver, and performs the
/// following operations:
///
/// 1. Bit clock recovery, by measuring the length of each run of
///    samples with the same sign
/// 2. Training pattern search
/// 3. Frame collection, Manchester decoding, and byte packing
///
/// The output is a sequence of [`Frame`]. Use [`Frame::fix()`] to
/// decode the telemetry fields.
///
/// To create the receiver, first create its Builder:
///
/// ```
/// use rd94::Rd94ReceiverBuilder;
///
/// let receiver = Rd94ReceiverBuilder::new(48000).build();
/// assert_eq!(receiver.input_rate(), 48000);
/// ```
#[derive(Clone, Debug)]
pub struct Rd94Receiver {
    clock: BitClock,
    framer: Framer,
    input_rate: u32,
    input_sample_counter: u64,
}

impl Rd94Receiver {
    /// Receive RD94 frames from a source of samples
    ///
    /// Bind an iterator which will consume the `input` and
    /// produce [`Frame`]s. The `input` must be signed PCM at
    /// the [`input_rate()`](#method.input_rate) for this
    /// receiver. Only the sign of each sample matters, so
    /// there is no need to scale it.
    ///
    /// The iterator will consume as many samples of `input`
    /// as are required to produce the next frame. It returns
    /// `None` once the input is exhausted. Call
    /// [`flush()`](#method.flush) afterwards to collect any
    /// frame which was cut short.
    #[must_use = "iterators are lazy and do nothing unless consumed"]
    pub fn iter<'rx, I, T>(&'rx mut self, input: I) -> SourceIter<'rx, T>
    where
        I: IntoIterator<Item = i32> + IntoIterator<IntoIter = T>,
        T: Iterator<Item = i32>,
    {
        SourceIter {
            source: input.into_iter(),
            receiver: self,
        }
    }

    /// Input sampling rate
    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    /// Lifetime total input sample counter
    pub fn input_sample_counter(&self) -> u64 {
        self.input_sample_counter
    }

    /// Lifetime total of frames emitted
    pub fn frame_count(&self) -> u64 {
        self.framer.frame_count()
    }

    /// True if a frame is being collected
    pub fn is_sync(&self) -> bool {
        self.framer.is_sync()
    }

    /// Emit any partial frame
    ///
    /// When the input ends in the middle of a frame, the frame is
    /// returned if it is long enough to contain a position. Its
    /// missing bits are zero-filled. Shorter fragments are dropped.
    pub fn flush(&mut self) -> Option<Frame> {
        let out = self.framer.flush();
        if let Some(frame) = &out {
            info!(
                "receiver [{:<14}]: flushed partial frame: {} bits",
                self.input_sample_counter,
                frame.captured_bits()
            );
        }
        out
    }

    /// Clear all states and reset to zero initial conditions
    pub fn reset(&mut self) {
        self.clock.reset();
        self.framer.reset();
        self.input_sample_counter = 0;
    }

    // Process a single sample
    //
    // Returns a frame if the sample completes one
    #[inline]
    fn process(&mut self, sample: i32) -> Option<Frame> {
        self.input_sample_counter = self.input_sample_counter.wrapping_add(1);
        if self.input_sample_counter % self.input_rate.max(1) as u64 == 0 {
            trace!(
                "[{:<14}]: sync: {}, frames: {}",
                self.input_sample_counter,
                self.framer.is_sync(),
                self.framer.frame_count()
            );
        }

        let run = self.clock.input(sample)?;
        if run.len == 0 {
            trace!(
                "[{:<14}]: ignoring short run of {}",
                self.input_sample_counter,
                run.bit
            );
            return None;
        }

        let mut out = None;
        for bit in run.bits().take(Self::MAX_RUN_BITS) {
            if let Some(frame) = self.framer.input(bit) {
                out = Some(frame);
            }
        }
        out
    }

    // Longest run worth feeding to the framer
    //
    // This fills any frame in progress and then floods the sync
    // buffer. Longer runs cannot change the framer state.
    const MAX_RUN_BITS: usize = RAW_FRAME_BITS + SYNC_LEN;
}

impl From<&Rd94ReceiverBuilder> for Rd94Receiver {
    /// Create the receiver from its Builder
    fn from(cfg: &Rd94ReceiverBuilder) -> Self {
        let input_rate = cfg.input_rate();
        let clock = BitClock::new(
            crate::waveform::samples_per_bit(input_rate),
            cfg.drift_compensation(),
            cfg.inverted_polarity(),
        );

        Self {
            clock,
            framer: Framer::new(),
            input_rate,
            input_sample_counter: 0,
        }
    }
}

/// Sample source iterator
///
/// This iterator is bound to a source of signed PCM samples.
/// Calling the `next()` method will return the next
/// [`Frame`] or `None` if the available samples have been
/// consumed without completing another frame.
#[derive(Debug)]
pub struct SourceIter<'rx, I>
where
    I: Iterator<Item = i32>,
{
    source: I,
    receiver: &'rx mut Rd94Receiver,
}

impl<'rx, I> Iterator for SourceIter<'rx, I>
where
    I: Iterator<Item = i32>,
{
    type Item = Frame;

    fn next(&mut self) -> Option<Self::Item> {
        for sa in &mut self.source {
            if let Some(frame) = self.receiver.process(sa) {
                info!(
                    "receiver [{:<14}]: frame {}: {} bits, {} invalid",
                    self.receiver.input_sample_counter(),
                    self.receiver.frame_count(),
                    frame.captured_bits(),
                    frame.invalid_bit_count()
                );
                return Some(frame);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_approx_eq::assert_approx_eq;

    use crate::fix::make_frame_bytes;
    use crate::waveform::{manchester_encode, modulate_nrz, uart_encode, HEADER, SYNC_BYTES};

    // 48.1° N, 11.5° E, 1500 m
    const MUNICH_CM: [i32; 3] = [418275955, 85099205, 472542573];

    // Wednesday 12:34:56.789
    const TOW_MS: i32 = (3 * 86400 + 45296) * 1000 + 789;

    // Line bits for a transmission of `count` frames
    //
    // Each frame is preceded by idle line bits and its header.
    fn transmission(count: u16) -> Vec<u8> {
        let mut out = Vec::new();
        for i in 0..count {
            let bytes = make_frame_bytes(100 + i, 5000 + i as u32, 2150, TOW_MS, MUNICH_CM, [0; 3]);
            out.extend(std::iter::repeat([1u8, 0]).take(50).flatten());
            out.extend_from_slice(&HEADER);
            out.extend(manchester_encode(&uart_encode(&bytes[SYNC_BYTES..])));
        }
        out.extend(std::iter::repeat([1u8, 0]).take(8).flatten());
        out
    }

    fn check_fix(frame: &Frame, frame_number: u16) {
        assert!(frame.is_complete());
        assert_eq!(0, frame.invalid_bit_count());
        let fix = frame.fix().expect("valid fix");
        assert_eq!(frame_number, fix.frame_number());
        assert_eq!("2021-03-24", fix.date().to_string());
        assert_eq!("12:34:56.789", fix.time_of_day().to_string());
        assert_approx_eq!(48.1, fix.lat_deg(), 1e-6);
        assert_approx_eq!(11.5, fix.lon_deg(), 1e-6);
        assert_approx_eq!(1500.0, fix.alt_m(), 0.01);
        assert_approx_eq!(0.0, fix.velocity().expect("velocity").horizontal_mps());
    }

    #[test]
    fn test_receive() {
        let line = transmission(3);

        for fs in [11025, 22050, 44100, 48000] {
            for drift in [false, true] {
                let mut rx = Rd94ReceiverBuilder::new(fs)
                    .with_drift_compensation(drift)
                    .build();

                let samples = modulate_nrz(&line, fs, 8000);
                let frames: Vec<Frame> = rx.iter(samples.iter().copied()).collect();
                assert_eq!(3, frames.len(), "fs = {}, drift = {}", fs, drift);
                for (i, frame) in frames.iter().enumerate() {
                    check_fix(frame, 100 + i as u16);
                }

                assert!(rx.flush().is_none());
                assert_eq!(3, rx.frame_count());
                assert_eq!(samples.len() as u64, rx.input_sample_counter());
            }
        }
    }

    #[test]
    fn test_receive_inverted() {
        let line = transmission(1);
        let samples: Vec<i32> = modulate_nrz(&line, 48000, 100)
            .into_iter()
            .map(|sa| -sa)
            .collect();

        let mut rx = Rd94ReceiverBuilder::new(48000).build();
        assert_eq!(0, rx.iter(samples.iter().copied()).count());

        let mut rx = Rd94ReceiverBuilder::new(48000)
            .with_inverted_polarity(true)
            .build();
        let frames: Vec<Frame> = rx.iter(samples.iter().copied()).collect();
        assert_eq!(1, frames.len());
        check_fix(&frames[0], 100);
    }

    #[test]
    fn test_flush_partial() {
        let line = transmission(1);

        // cut off the frame halfway through
        let cut = line.len() - 8 * 2 - 60 * 10 * 2;
        let samples = modulate_nrz(&line[0..cut], 48000, 1000);

        let mut rx = Rd94ReceiverBuilder::new(48000).build();
        assert_eq!(0, rx.iter(samples.iter().copied()).count());
        assert!(rx.is_sync());

        let frame = rx.flush().expect("partial frame");
        assert!(!frame.is_complete());
        let fix = frame.fix().expect("valid fix");
        assert_eq!(100, fix.frame_number());
        assert!(fix.velocity().is_none());
        assert!(!rx.is_sync());

        rx.reset();
        assert_eq!(0, rx.input_sample_counter());
        assert_eq!(0, rx.frame_count());
    }

    #[test]
    fn test_silence() {
        let mut rx = Rd94ReceiverBuilder::new(22050).build();
        let silence = std::iter::repeat(-3).take(22050 * 3);
        assert_eq!(0, rx.iter(silence).count());
        assert!(rx.flush().is_none());
    }
}
