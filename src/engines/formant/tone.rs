//! Voicing-tone parameters and their slider mappings.
//!
//! | # | field | mapping (v = 0..100) | neutral |
//! |---|---|---|---|
//! | 0 | voicing_peak_pos | 0.85 + v·0.0012 | 50 |
//! | 1 | voiced_pre_emph_a | 0.92 + (v−50)·0.0012 | 50 |
//! | 2 | voiced_pre_emph_mix | v/100 | 35 |
//! | 3 | high_shelf_gain_db | (v−50)·0.24 | 50 |
//! | 4 | high_shelf_fc_hz | 1000 + v·40 | 25 |
//! | 5 | high_shelf_q | 0.5 + v·0.01 | 20 |
//! | 6 | voiced_tilt_db_per_oct | (v−50)·0.24 | 50 |
//! | 7 | noise_glottal_mod_depth | v/100 | 0 |
//! | 8 | pitch_sync_f1_delta_hz | (v−50)·1.2 | 50 |
//! | 9 | pitch_sync_b1_delta_hz | (v−50)·1.2 | 50 |
//! | 10 | speed_quotient | 0.5..2.0 below 50, 2.0..4.0 above | 50 |
//! | 11 | aspiration_tilt_db_per_oct | (v−50)·0.24 | 50 |
//! | 12 | cascade_bw_scale | 0.4..1.0 below 50, 1.0..2.0 above | 50 |
//! | 13 | tremor_depth | v/100·0.5 | 0 |

pub const VOICING_TONE_SLIDER_COUNT: usize = 14;

pub const NEUTRAL_TONE_SLIDERS: [f64; VOICING_TONE_SLIDER_COUNT] = [
    50.0, 50.0, 35.0, 50.0, 25.0, 20.0, 50.0, 0.0, 50.0, 50.0, 50.0, 50.0, 50.0, 0.0,
];

/// Spectral and glottal shaping, independent of any wire layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoicingTone {
    pub voicing_peak_pos: f64,
    pub voiced_pre_emph_a: f64,
    pub voiced_pre_emph_mix: f64,
    pub high_shelf_gain_db: f64,
    pub high_shelf_fc_hz: f64,
    pub high_shelf_q: f64,
    pub voiced_tilt_db_per_oct: f64,
    pub noise_glottal_mod_depth: f64,
    pub pitch_sync_f1_delta_hz: f64,
    pub pitch_sync_b1_delta_hz: f64,
    pub speed_quotient: f64,
    pub aspiration_tilt_db_per_oct: f64,
    pub cascade_bw_scale: f64,
    pub tremor_depth: f64,
}

impl Default for VoicingTone {
    fn default() -> Self {
        Self::from_sliders(&NEUTRAL_TONE_SLIDERS)
    }
}

/// Two linear segments meeting at `mid` when v = 50.
fn two_segment(v: f64, low: f64, mid: f64, high: f64) -> f64 {
    if v <= 50.0 {
        low + v / 50.0 * (mid - low)
    } else {
        mid + (v - 50.0) / 50.0 * (high - mid)
    }
}

fn slider(sliders: &[f64], index: usize) -> f64 {
    let neutral = NEUTRAL_TONE_SLIDERS[index];
    match sliders.get(index) {
        Some(&v) if v.is_finite() => v.clamp(0.0, 100.0),
        _ => neutral,
    }
}

impl VoicingTone {
    /// Map slider values to physical parameters; missing sliders are neutral.
    pub fn from_sliders(sliders: &[f64]) -> Self {
        let v = |i| slider(sliders, i);
        Self {
            voicing_peak_pos: 0.85 + v(0) * 0.0012,
            voiced_pre_emph_a: 0.92 + (v(1) - 50.0) * 0.0012,
            voiced_pre_emph_mix: v(2) / 100.0,
            high_shelf_gain_db: (v(3) - 50.0) * 0.24,
            high_shelf_fc_hz: 1000.0 + v(4) * 40.0,
            high_shelf_q: 0.5 + v(5) * 0.01,
            voiced_tilt_db_per_oct: (v(6) - 50.0) * 0.24,
            noise_glottal_mod_depth: v(7) / 100.0,
            pitch_sync_f1_delta_hz: (v(8) - 50.0) * 1.2,
            pitch_sync_b1_delta_hz: (v(9) - 50.0) * 1.2,
            speed_quotient: two_segment(v(10), 0.5, 2.0, 4.0),
            aspiration_tilt_db_per_oct: (v(11) - 50.0) * 0.24,
            cascade_bw_scale: two_segment(v(12), 0.4, 1.0, 2.0),
            tremor_depth: v(13) / 100.0 * 0.5,
        }
    }

    /// The configured tone, or `None` when every slider is neutral.
    ///
    /// A fresh player already runs the engine's default tone, so a neutral
    /// configuration is never written.
    pub fn from_settings(sliders: &[f64]) -> Option<Self> {
        let neutral = (0..VOICING_TONE_SLIDER_COUNT)
            .all(|i| slider(sliders, i) == NEUTRAL_TONE_SLIDERS[i]);
        (!neutral).then(|| Self::from_sliders(sliders))
    }
}
