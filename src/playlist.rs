//! Shuffled track sequence and cursor.
//!
//! The playlist is a permutation of all track numbers `1..=track_count`.
//! It is regenerated only when exhausted, so every track plays exactly once
//! per full cycle while still appearing random to the listener.

use rand::{rngs::StdRng, Rng, SeedableRng};

pub struct ShufflePlaylist {
    track_count: u32,
    order: Vec<u32>,
    cursor: usize,
    // Use StdRng instead of ThreadRng for thread safety
    rng_seed: [u8; 32],
}

impl ShufflePlaylist {
    pub fn new(track_count: u32) -> ShufflePlaylist {
        // Generate a random seed
        let mut seed = [0u8; 32];
        getrandom::fill(&mut seed).expect("Failed to generate random seed");

        ShufflePlaylist {
            track_count: track_count.max(1),
            order: Vec::new(),
            cursor: 0,
            rng_seed: seed,
        }
    }

    /// Regenerates and reshuffles the playlist if it is empty.
    ///
    /// Guarantees the playlist is non-empty and the cursor points at a valid
    /// entry after this call.
    pub fn ensure(&mut self) {
        if self.order.is_empty() {
            self.generate_shuffle_order();
            self.cursor = 0;
        }
    }

    /// Track number at the cursor. Call `ensure` first.
    pub fn current(&self) -> u32 {
        self.order[self.cursor]
    }

    /// Moves the cursor forward. Reshuffles and wraps to the start when the
    /// cursor would pass the end of the playlist.
    pub fn advance(&mut self) {
        self.ensure();

        self.cursor += 1;
        if self.cursor >= self.order.len() {
            self.generate_shuffle_order();
            self.cursor = 0;
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // Generate a random order for all tracks
    fn generate_shuffle_order(&mut self) {
        let mut order: Vec<u32> = (1..=self.track_count).collect();

        // Create a new RNG with our seed
        let mut rng = StdRng::from_seed(self.rng_seed);

        // Fisher-Yates shuffle
        for i in (1..order.len()).rev() {
            let j = rng.random_range(0..=i);
            order.swap(i, j);
        }

        // Update the seed for next time
        let mut new_seed = [0u8; 32];
        rng.fill(&mut new_seed[..]);
        self.rng_seed = new_seed;

        self.order = order;
    }
}
