//! Bit clock recovery
//!
//! The RD94 line signal is binary FSK, which most receivers deliver
//! as a square-ish baseband waveform. The [`BitClock`] does not
//! track a clock at all. It measures the length of each run of
//! same-signed samples and divides by the nominal number of samples
//! per bit:
//!
//! ```txt
//!  +  ┌───────┐       ┌───┐
//! ────┘       └───────┘   └──── …
//!  -   ←  2  → ←  2  → ← 1 →    bit periods
//!        1 1     0 0     1
//! ```
//!
//! Each completed run becomes a [`BitRun`]: the bit value and the
//! number of bit periods the run spans, rounded to the nearest
//! integer. Rounding error does not accumulate over a run, so this
//! works well as long as the transmitter's clock and our sampling
//! clock agree to within a fraction of a bit over the longest run.
//!
//! When drift compensation is enabled, the zero crossing is
//! linearly interpolated between the two samples which straddle
//! it. The fractional part is carried over into the next run.
//! This helps most at low sampling rates, where a whole sample is
//! a large fraction of a bit.

/// A run of identical line bits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitRun {
    /// Line bit value, `0` or `1`
    pub bit: u8,

    /// Number of bit periods
    ///
    /// May be zero for runs which are much shorter than one bit.
    pub len: u32,
}

impl BitRun {
    /// Expand into `len` copies of `bit`
    pub fn bits(&self) -> impl Iterator<Item = u8> {
        std::iter::repeat(self.bit).take(self.len as usize)
    }
}

/// Run-length bit clock recovery
#[derive(Clone, Debug)]
pub struct BitClock {
    // nominal input samples per line bit
    samples_per_bit: f32,

    // interpolate zero crossings
    compensate_drift: bool,

    // high polarity is a zero
    invert: bool,

    // previous input sample
    last_sample: i32,

    // polarity of the run in progress
    high: bool,

    // samples in the run in progress
    run_samples: u32,

    // fractional crossing time of the previous run, in samples
    carry: f32,
}

impl BitClock {
    /// New bit clock
    ///
    /// Expects `samples_per_bit` input samples per line bit. This
    /// need not be an integer.
    pub fn new(samples_per_bit: f32, compensate_drift: bool, invert: bool) -> Self {
        Self {
            samples_per_bit,
            compensate_drift,
            invert,
            last_sample: 0,
            high: true,
            run_samples: 0,
            carry: 0.0,
        }
    }

    /// Reset to zero initial conditions
    pub fn reset(&mut self) {
        self.last_sample = 0;
        self.high = true;
        self.run_samples = 0;
        self.carry = 0.0;
    }

    /// Process one input sample
    ///
    /// Samples `≥ 0` are high. Returns a [`BitRun`] when `sample`
    /// ends the run in progress. The sample which ends a run is
    /// counted as part of it.
    pub fn input(&mut self, sample: i32) -> Option<BitRun> {
        let y0 = self.last_sample;
        self.last_sample = sample;
        self.run_samples += 1;

        let was_high = self.high;
        self.high = sample >= 0;
        if self.high == was_high {
            return None;
        }

        let n = self.run_samples as f32;
        self.run_samples = 0;

        let periods = if self.compensate_drift {
            // y0 and y1 differ in sign, so the denominator is nonzero
            let x1 = sample as f32 / (sample as f32 - y0 as f32);
            let l = (n + self.carry - x1) / self.samples_per_bit;
            self.carry = x1;
            l
        } else {
            n / self.samples_per_bit
        };

        Some(BitRun {
            bit: (was_high != self.invert) as u8,
            len: (periods + 0.5).max(0.0) as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::waveform::{manchester_encode, modulate_nrz, samples_per_bit, uart_encode};

    fn runs(clock: &mut BitClock, samples: &[i32]) -> Vec<BitRun> {
        samples.iter().filter_map(|&sa| clock.input(sa)).collect()
    }

    #[test]
    fn test_run_lengths() {
        const SAMPLES: &[i32] = &[100, 100, 100, -100, -100, -100, 300];

        let mut clock = BitClock::new(2.0, false, false);
        assert_eq!(
            vec![BitRun { bit: 1, len: 2 }, BitRun { bit: 0, len: 2 }],
            runs(&mut clock, SAMPLES)
        );

        // the crossings are interpolated, and the second run
        // comes up short
        let mut clock = BitClock::new(2.0, true, false);
        assert_eq!(
            vec![BitRun { bit: 1, len: 2 }, BitRun { bit: 0, len: 1 }],
            runs(&mut clock, SAMPLES)
        );

        let mut clock = BitClock::new(2.0, false, true);
        assert_eq!(
            vec![BitRun { bit: 0, len: 2 }, BitRun { bit: 1, len: 2 }],
            runs(&mut clock, SAMPLES)
        );
    }

    #[test]
    fn test_initial_polarity() {
        // we start out high, so an initial low sample closes an
        // empty run
        let mut clock = BitClock::new(10.0, false, false);
        assert_eq!(Some(BitRun { bit: 1, len: 0 }), clock.input(-5));
        assert_eq!(None, clock.input(-5));
        assert_eq!(Some(BitRun { bit: 0, len: 0 }), clock.input(0));

        clock.reset();
        assert_eq!(None, clock.input(0));
    }

    #[test]
    fn test_recover_bits() {
        const LINE: &[u8] = &[1, 0, 0, 1, 1, 1, 0, 1, 0, 0, 0, 0, 1, 1, 0, 1];

        for fs in [22050, 44100, 48000] {
            for compensate in [false, true] {
                let spb = samples_per_bit(fs);
                let mut clock = BitClock::new(spb, compensate, false);

                // the leading low sample makes two runs which are
                // too short to count, and the trailing transition
                // flushes out the last run
                let mut samples = vec![-1000];
                samples.extend(modulate_nrz(LINE, fs, 1000));
                samples.push(-1000);

                let out: Vec<u8> = runs(&mut clock, &samples)
                    .iter()
                    .flat_map(|r| r.bits())
                    .collect();
                assert_eq!(LINE, &out[..], "fs = {}, compensated = {}", fs, compensate);
            }
        }
    }

    #[test]
    fn test_recover_bits_fast_transmitter() {
        // every byte value, then long runs of each polarity
        let bytes: Vec<u8> = (0..=255u8).collect();
        let mut line = manchester_encode(&uart_encode(&bytes));
        line.extend(std::iter::repeat(1).take(30));
        line.extend(std::iter::repeat(0).take(30));
        line.push(1);

        // the transmitter's bit clock runs 0.2% fast relative to
        // our nominal 48 kHz
        let mut clock = BitClock::new(samples_per_bit(48000), true, false);
        let mut samples = vec![-1000];
        samples.extend(modulate_nrz(&line, 48100, 1000));
        samples.push(-1000);

        let out: Vec<u8> = runs(&mut clock, &samples)
            .iter()
            .flat_map(|r| r.bits())
            .collect();
        assert_eq!(line.len(), out.len());
        assert_eq!(line, out);
    }
}
