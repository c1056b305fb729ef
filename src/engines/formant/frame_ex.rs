//! Voice-quality extension block and how user and phoneme values combine.
//!
//! | field | rule |
//! |---|---|
//! | creakiness, breathiness, jitter, shimmer | sum, clamped to `[0, 1]` |
//! | sharpness | phoneme value floored at 1.0, times user value, clamped to `[0.1, 5.0]` |
//! | formant end targets | phoneme value verbatim, 0 = no ramp |
//! | intonation payload | user block (seeded from engine defaults) |

use serde_json::{Map, Value};

pub const FRAME_EX_SLIDER_COUNT: usize = 5;

/// Sliders that produce [`FrameExBlock::NEUTRAL`].
pub const NEUTRAL_FRAME_EX_SLIDERS: [f64; FRAME_EX_SLIDER_COUNT] = [0.0, 0.0, 0.0, 0.0, 50.0];

const SHARPNESS_NEUTRAL: f64 = 1.0;
const SHARPNESS_MIN: f64 = 0.1;
const SHARPNESS_MAX: f64 = 5.0;

/// Simplified intonation-model parameters carried inside the block.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IntonationPayload {
    pub phrase_amplitude: f64,
    pub accent_amplitude: f64,
    pub accent_position: f64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameExBlock {
    pub creakiness: f64,
    pub breathiness: f64,
    pub jitter: f64,
    pub shimmer: f64,
    pub sharpness: f64,
    pub end_cf1: f64,
    pub end_cf2: f64,
    pub end_cf3: f64,
    pub end_pf1: f64,
    pub end_pf2: f64,
    pub end_pf3: f64,
    pub intonation: IntonationPayload,
}

impl FrameExBlock {
    pub const NEUTRAL: Self = Self {
        creakiness: 0.0,
        breathiness: 0.0,
        jitter: 0.0,
        shimmer: 0.0,
        sharpness: SHARPNESS_NEUTRAL,
        end_cf1: 0.0,
        end_cf2: 0.0,
        end_cf3: 0.0,
        end_pf1: 0.0,
        end_pf2: 0.0,
        end_pf3: 0.0,
        intonation: IntonationPayload {
            phrase_amplitude: 0.0,
            accent_amplitude: 0.0,
            accent_position: 0.0,
        },
    };

    /// Size passed to the engine alongside the block.
    pub const SIZE_BYTES: u32 = std::mem::size_of::<Self>() as u32;

    /// Whether submitting this block would change the voice at all.
    pub fn has_effect(&self) -> bool {
        self.creakiness != 0.0
            || self.breathiness != 0.0
            || self.jitter != 0.0
            || self.shimmer != 0.0
            || (self.sharpness - SHARPNESS_NEUTRAL).abs() > f64::EPSILON
    }

    pub fn has_glide_targets(&self) -> bool {
        [
            self.end_cf1,
            self.end_cf2,
            self.end_cf3,
            self.end_pf1,
            self.end_pf2,
            self.end_pf3,
        ]
        .iter()
        .any(|&v| v > 0.0)
    }
}

impl Default for FrameExBlock {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

fn slider(sliders: &[f64], index: usize) -> f64 {
    let value = sliders
        .get(index)
        .copied()
        .unwrap_or(NEUTRAL_FRAME_EX_SLIDERS[index]);
    finite_or(value, NEUTRAL_FRAME_EX_SLIDERS[index]).clamp(0.0, 100.0)
}

/// 0 → 0.5, 50 → 1.0, 100 → 2.0, linear on each side of 50.
fn sharpness_from_slider(v: f64) -> f64 {
    if v <= 50.0 {
        0.5 + v / 50.0 * 0.5
    } else {
        SHARPNESS_NEUTRAL + (v - 50.0) / 50.0
    }
}

/// User-level block from the five FrameEx sliders.
pub fn build_defaults(sliders: &[f64]) -> FrameExBlock {
    build_defaults_from(FrameExBlock::NEUTRAL, sliders)
}

/// Like [`build_defaults`], keeping `base`'s end targets and intonation
/// payload. Used to layer the sliders over engine-supplied defaults.
pub fn build_defaults_from(base: FrameExBlock, sliders: &[f64]) -> FrameExBlock {
    FrameExBlock {
        creakiness: slider(sliders, 0) / 100.0,
        breathiness: slider(sliders, 1) / 100.0,
        jitter: slider(sliders, 2) / 100.0,
        shimmer: slider(sliders, 3) / 100.0,
        sharpness: sharpness_from_slider(slider(sliders, 4)),
        ..base
    }
}

fn additive(user: f64, phoneme: f64) -> f64 {
    (finite_or(user, 0.0) + finite_or(phoneme, 0.0)).clamp(0.0, 1.0)
}

fn end_target(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Combine the user block with an optional per-phoneme override.
pub fn mix(defaults: &FrameExBlock, phoneme: Option<&FrameExBlock>) -> FrameExBlock {
    let overrides = phoneme.copied().unwrap_or(FrameExBlock::NEUTRAL);

    let phoneme_sharpness = finite_or(overrides.sharpness, SHARPNESS_NEUTRAL).max(SHARPNESS_NEUTRAL);
    let user_sharpness = finite_or(defaults.sharpness, SHARPNESS_NEUTRAL);

    FrameExBlock {
        creakiness: additive(defaults.creakiness, overrides.creakiness),
        breathiness: additive(defaults.breathiness, overrides.breathiness),
        jitter: additive(defaults.jitter, overrides.jitter),
        shimmer: additive(defaults.shimmer, overrides.shimmer),
        sharpness: (phoneme_sharpness * user_sharpness).clamp(SHARPNESS_MIN, SHARPNESS_MAX),
        end_cf1: end_target(overrides.end_cf1),
        end_cf2: end_target(overrides.end_cf2),
        end_cf3: end_target(overrides.end_cf3),
        end_pf1: end_target(overrides.end_pf1),
        end_pf2: end_target(overrides.end_pf2),
        end_pf3: end_target(overrides.end_pf3),
        intonation: defaults.intonation,
    }
}

/// Per-phoneme override block from a phoneme map, if it names any FrameEx key.
pub fn override_from_phoneme_map(map: &Map<String, Value>) -> Option<FrameExBlock> {
    let mut block = FrameExBlock {
        sharpness: 0.0,
        ..FrameExBlock::NEUTRAL
    };
    let mut found = false;

    for (key, value) in map {
        let slot = match key.as_str() {
            "creakiness" => &mut block.creakiness,
            "breathiness" => &mut block.breathiness,
            "jitter" => &mut block.jitter,
            "shimmer" => &mut block.shimmer,
            "sharpness" => &mut block.sharpness,
            "endCf1" => &mut block.end_cf1,
            "endCf2" => &mut block.end_cf2,
            "endCf3" => &mut block.end_cf3,
            "endPf1" => &mut block.end_pf1,
            "endPf2" => &mut block.end_pf2,
            "endPf3" => &mut block.end_pf3,
            _ => continue,
        };
        if let Some(number) = value.as_f64().filter(|v| v.is_finite()) {
            *slot = number;
            found = true;
        }
    }

    found.then_some(block)
}
