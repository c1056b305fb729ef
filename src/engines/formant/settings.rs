use std::str::FromStr;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use super::frame::FRAME_FIELD_COUNT;
use super::frame_ex::NEUTRAL_FRAME_EX_SLIDERS;
use super::tone::NEUTRAL_TONE_SLIDERS;
use super::voices::DEFAULT_VOICE;

/// Frame multiplier slider value that maps to a ratio of 1.0.
pub const NEUTRAL_SLIDER: f64 = 50.0;

/// Which voice shapes the frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "name")]
pub enum VoiceSelection {
    /// A built-in preset applied frame by frame (see [`super::voices`]).
    Preset(String),
    /// A voice profile known to the linguistic engine.
    Profile(String),
}

impl Default for VoiceSelection {
    fn default() -> Self {
        Self::Preset(DEFAULT_VOICE.to_string())
    }
}

/// How much silence goes between clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PauseMode {
    Off,
    #[default]
    Short,
    Long,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("Unknown pause mode '{0}', expected off, short or long")]
pub struct UnknownPauseMode(pub String);

impl FromStr for PauseMode {
    type Err = UnknownPauseMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "short" => Ok(Self::Short),
            "long" => Ok(Self::Long),
            _ => Err(UnknownPauseMode(s.to_string())),
        }
    }
}

/// User-level synthesis settings.
///
/// Rate, pitch, volume and inflection run 0 to 100. Slider arrays are indexed
/// by parameter; entries past the end of an array count as absent.
///
/// ```rust
/// use formant_bridge::engines::formant::{PauseMode, SpeechSettings, VoiceSelection};
///
/// let settings = SpeechSettings::builder()
///     .voice(VoiceSelection::Preset("David".to_string()))
///     .rate(60.0)
///     .pause_mode(PauseMode::Long)
///     .build()?;
/// assert_eq!(settings.volume, 75.0);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(default, setter(into))]
#[serde(default, rename_all = "camelCase")]
pub struct SpeechSettings {
    pub voice: VoiceSelection,
    /// Language tag handed to the linguistic engine, e.g. `"en-us"`.
    pub language: String,
    pub rate: f64,
    pub pitch: f64,
    pub volume: f64,
    pub inflection: f64,
    pub pause_mode: PauseMode,
    /// One multiplier per frame field, 50 = ×1.0.
    pub frame_sliders: Vec<f64>,
    /// Voicing-tone sliders, see [`super::tone`] for the mappings.
    pub voicing_tone_sliders: Vec<f64>,
    /// Creakiness, breathiness, jitter, shimmer, sharpness.
    pub frame_ex_sliders: Vec<f64>,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            voice: VoiceSelection::default(),
            language: "en-us".to_string(),
            rate: 50.0,
            pitch: 50.0,
            volume: 75.0,
            inflection: 50.0,
            pause_mode: PauseMode::default(),
            frame_sliders: vec![NEUTRAL_SLIDER; FRAME_FIELD_COUNT],
            voicing_tone_sliders: NEUTRAL_TONE_SLIDERS.to_vec(),
            frame_ex_sliders: NEUTRAL_FRAME_EX_SLIDERS.to_vec(),
        }
    }
}

impl SpeechSettings {
    pub fn builder() -> SpeechSettingsBuilder {
        SpeechSettingsBuilder::default()
    }

    /// Speed multiplier for the linguistic engine; 50 maps to 1.0 and every
    /// 25 points doubles it.
    pub fn speed(&self) -> f64 {
        0.25 * 2f64.powf(percent(self.rate, 50.0) / 25.0)
    }

    /// Base pitch in Hz; 50 maps to 110 Hz.
    pub fn base_pitch(&self) -> f64 {
        25.0 + 21.25 * (percent(self.pitch, 50.0) / 12.5)
    }

    pub fn inflection_scale(&self) -> f64 {
        percent(self.inflection, 50.0) / 100.0
    }
}

/// Clamp a 0–100 control, substituting `fallback` for non-finite input.
pub(crate) fn percent(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        fallback
    }
}
