use crate::receiver::Rd94Receiver;

/// Builds an RD94 receiver
///
/// All you really need to provide is the input sampling rate.
/// Any rate will do, as long as it comfortably exceeds the
/// 4800 Hz line bit rate. Rates of 44.1 kHz or 48 kHz are
/// typical for recordings of a receiver's discriminator output.
///
/// ```
/// use rd94::Rd94ReceiverBuilder;
///
/// let mut builder = Rd94ReceiverBuilder::new(44100);
/// builder
///     .with_drift_compensation(true)
///     .with_inverted_polarity(false);
/// assert!(builder.drift_compensation());
///
/// let receiver = builder.build();
/// assert_eq!(receiver.input_rate(), 44100);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rd94ReceiverBuilder {
    input_rate: u32,
    drift_compensation: bool,
    inverted_polarity: bool,
}

impl Rd94ReceiverBuilder {
    /// New receiver chain with default options
    ///
    /// The only mandatory parameter is the input sampling rate,
    /// in Hz.
    pub fn new(input_rate: u32) -> Self {
        Self {
            input_rate,
            drift_compensation: false,
            inverted_polarity: false,
        }
    }

    /// Build a receiver chain
    ///
    /// Once built, the receiver chain is immediately ready to
    /// process samples.
    pub fn build(&self) -> Rd94Receiver {
        Rd94Receiver::from(self)
    }

    /// Interpolate zero crossings (default: off)
    ///
    /// When enabled, the bit clock estimates where between two
    /// samples each zero crossing occurred and carries the
    /// fraction into the next run. This can recover more frames
    /// at low sampling rates, though not always.
    pub fn with_drift_compensation(&mut self, enable: bool) -> &mut Self {
        self.drift_compensation = enable;
        self
    }

    /// Invert the line polarity (default: off)
    ///
    /// Normally, a positive sample is a `1` line bit. Some
    /// receivers invert the discriminator output. Enable this
    /// to treat negative samples as `1`.
    pub fn with_inverted_polarity(&mut self, enable: bool) -> &mut Self {
        self.inverted_polarity = enable;
        self
    }

    /// Input sampling rate (Hz)
    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    /// Zero crossing interpolation
    pub fn drift_compensation(&self) -> bool {
        self.drift_compensation
    }

    /// Polarity inversion
    pub fn inverted_polarity(&self) -> bool {
        self.inverted_polarity
    }
}

impl Default for Rd94ReceiverBuilder {
    fn default() -> Self {
        Self::new(48000)
    }
}
