// crates/tracker-contract-core/src/datagen.rs
// ============================================================================
// Module: Test Data Generation
// Description: Seedable random text for issue payloads.
// Purpose: Produce fresh summaries and descriptions per scenario execution.
// Dependencies: rand
// ============================================================================

//! ## Overview
//! [`TextGenerator`] produces lorem-style sentences and paragraphs. A seeded
//! generator is deterministic, which keeps mock-backed tests reproducible;
//! live runs use an entropy seed so repeated runs never collide on content.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Word pool used for generated text.
const WORDS: &[&str] = &[
    "alpha", "anchor", "beacon", "branch", "bridge", "canvas", "carbon", "cluster", "compass",
    "delta", "drift", "ember", "engine", "field", "filter", "harbor", "index", "kernel", "ledger",
    "lumen", "matrix", "meadow", "module", "north", "orbit", "packet", "pillar", "quartz",
    "queue", "ridge", "signal", "socket", "summit", "timber", "vector", "window",
];

// ============================================================================
// SECTION: Generator
// ============================================================================

/// Random text generator.
#[derive(Debug, Clone)]
pub struct TextGenerator {
    /// Underlying random source.
    rng: StdRng,
}

impl Default for TextGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TextGenerator {
    /// Creates a generator seeded from OS entropy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a deterministic generator.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Returns a single lowercase word.
    pub fn word(&mut self) -> &'static str {
        WORDS.choose(&mut self.rng).copied().unwrap_or("issue")
    }

    /// Returns a capitalized sentence of 4 to 9 words ending with a period.
    pub fn sentence(&mut self) -> String {
        let count = self.rng.gen_range(4..10);
        let words: Vec<&str> = (0..count).map(|_| self.word()).collect();
        let mut sentence = capitalize(&words.join(" "));
        sentence.push('.');
        sentence
    }

    /// Returns a paragraph of 2 to 5 sentences.
    pub fn paragraph(&mut self) -> String {
        let count = self.rng.gen_range(2..6);
        (0..count).map(|_| self.sentence()).collect::<Vec<_>>().join(" ")
    }
}

/// Uppercases the first character.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| first.to_uppercase().chain(chars).collect())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
