//! Training pattern search

use arraydeque::ArrayDeque;

/// Sliding-window pattern matcher
///
/// Holds the last `N` line bits received. The window matches when
/// it is full and its contents, oldest first, are exactly equal to
/// the pattern. There is no error tolerance.
#[derive(Clone, Debug)]
pub struct SyncBuffer<const N: usize> {
    pattern: [u8; N],
    window: ArrayDeque<u8, N, arraydeque::Wrapping>,
}

impl<const N: usize> SyncBuffer<N> {
    /// New sync buffer which searches for `pattern`
    pub fn new(pattern: [u8; N]) -> Self {
        Self {
            pattern,
            window: ArrayDeque::new(),
        }
    }

    /// Clear the window
    pub fn clear(&mut self) {
        self.window.clear();
    }

    /// Push a line bit, displacing the oldest bit if full
    #[inline]
    pub fn push(&mut self, bit: u8) {
        self.window.push_back(bit);
    }

    /// Push a line bit and test for a match
    #[inline]
    pub fn input(&mut self, bit: u8) -> bool {
        self.push(bit);
        self.is_match()
    }

    /// True if the window holds the pattern
    pub fn is_match(&self) -> bool {
        self.window.is_full() && self.window.iter().eq(self.pattern.iter())
    }
}
