//! Page transition styles and their random selection

use crate::{CoreError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Visual animation applied when moving between pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionStyle {
    Slide,
    #[default]
    Fade,
    Zoom,
    Flip,
}

impl TransitionStyle {
    pub const ALL: [TransitionStyle; 4] = [
        TransitionStyle::Slide,
        TransitionStyle::Fade,
        TransitionStyle::Zoom,
        TransitionStyle::Flip,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionStyle::Slide => "slide",
            TransitionStyle::Fade => "fade",
            TransitionStyle::Zoom => "zoom",
            TransitionStyle::Flip => "flip",
        }
    }
}

impl fmt::Display for TransitionStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransitionStyle {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        TransitionStyle::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownTransition(s.to_string()))
    }
}

#[derive(Debug)]
enum StyleSource {
    Random(StdRng),
    Fixed(TransitionStyle),
}

/// Picks the next transition style uniformly at random, repeats allowed
#[derive(Debug)]
pub struct AnimationSelector {
    source: StyleSource,
}

impl Default for AnimationSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationSelector {
    /// Selector seeded from OS entropy
    pub fn new() -> Self {
        Self {
            source: StyleSource::Random(StdRng::from_entropy()),
        }
    }

    /// Deterministic selector for reproducible sequences
    pub fn seeded(seed: u64) -> Self {
        Self {
            source: StyleSource::Random(StdRng::seed_from_u64(seed)),
        }
    }

    /// Always returns `style`
    pub fn fixed(style: TransitionStyle) -> Self {
        Self {
            source: StyleSource::Fixed(style),
        }
    }

    /// Roll the style for the next page; the previous style has no influence
    pub fn next_style(&mut self) -> TransitionStyle {
        match &mut self.source {
            StyleSource::Random(rng) => TransitionStyle::ALL[rng.gen_range(0..TransitionStyle::ALL.len())],
            StyleSource::Fixed(style) => *style,
        }
    }
}
