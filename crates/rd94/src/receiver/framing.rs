//! RD94 frame synchronization and collection

use arrayvec::ArrayVec;

#[cfg(not(test))]
use log::debug;

#[cfg(test)]
use std::println as debug;

use super::framesync::SyncBuffer;
use crate::fix::POSITION_END;
use crate::frame::Frame;
use crate::waveform::{RAW_FRAME_BITS, SYNC_LEN, TRAINING_PATTERN, UART_SYMBOL_BITS};

/// RD94 frame synchronizer
///
/// The `Framer` accepts one line bit at a time. Every bit is
/// pushed into a [`SyncBuffer`] which searches for the
/// [`TRAINING_PATTERN`]. Once the pattern is found, the framer
/// collects line bits until it holds a full frame of
/// [`RAW_FRAME_BITS`], counting the training pattern itself. The
/// complete frame is then emitted and the search resumes with the
/// very next bit.
///
/// The sync buffer keeps absorbing bits while a frame is being
/// collected, but it is not consulted until the frame is complete.
/// A training pattern which appears inside a frame therefore
/// does not restart it.
#[derive(Clone, Debug)]
pub struct Framer {
    sync: SyncBuffer<SYNC_LEN>,
    state: State,
    frame_count: u64,
}

impl Framer {
    /// New framer, searching for sync
    pub fn new() -> Self {
        Self {
            sync: SyncBuffer::new(TRAINING_PATTERN),
            state: State::Searching,
            frame_count: 0,
        }
    }

    /// Reset to zero initial conditions
    ///
    /// Any frame in progress is discarded.
    pub fn reset(&mut self) {
        self.sync.clear();
        self.state = State::Searching;
        self.frame_count = 0;
    }

    /// Handle one line bit
    ///
    /// Returns a [`Frame`] when `bit` completes one.
    pub fn input(&mut self, bit: u8) -> Option<Frame> {
        self.sync.push(bit);

        match self.state {
            State::Searching => {
                if self.sync.is_match() {
                    debug!("framer: sync acquired after frame {}", self.frame_count);
                    let mut raw = ArrayVec::new();
                    raw.extend(TRAINING_PATTERN.iter().copied());
                    self.state = State::Collecting(raw);
                }
                None
            }
            State::Collecting(ref mut raw) => {
                raw.push(bit);
                if raw.is_full() {
                    self.end()
                } else {
                    None
                }
            }
        }
    }

    /// Emit any partial frame
    ///
    /// Call at the end of the input. If a frame is being collected
    /// and enough of it has arrived to contain a position, it is
    /// returned zero-filled. Otherwise the partial frame is
    /// discarded. Either way, the framer resumes its search.
    pub fn flush(&mut self) -> Option<Frame> {
        let captured = self.collected_bits() / 2;
        if captured >= POSITION_END * UART_SYMBOL_BITS {
            self.end()
        } else {
            if self.is_sync() {
                debug!("framer: discarding partial frame of {} bits", captured);
            }
            self.state = State::Searching;
            None
        }
    }

    /// True if a frame is being collected
    pub fn is_sync(&self) -> bool {
        matches!(self.state, State::Collecting(_))
    }

    /// Line bits collected for the frame in progress
    ///
    /// Includes the training pattern. Zero when searching.
    pub fn collected_bits(&self) -> usize {
        match &self.state {
            State::Searching => 0,
            State::Collecting(raw) => raw.len(),
        }
    }

    /// Lifetime count of frames emitted
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    // Finish the frame in progress, if any, and resume searching
    fn end(&mut self) -> Option<Frame> {
        match std::mem::replace(&mut self.state, State::Searching) {
            State::Searching => None,
            State::Collecting(raw) => {
                self.frame_count += 1;
                debug!(
                    "framer: frame {} ended: {} line bits",
                    self.frame_count,
                    raw.len()
                );
                Some(Frame::from_line_bits(&raw))
            }
        }
    }
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum State {
    // waiting for the training pattern
    Searching,

    // collecting raw line bits, starting with the training pattern
    Collecting(ArrayVec<u8, RAW_FRAME_BITS>),
}
