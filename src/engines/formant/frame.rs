//! The acoustic frame and the steps that shape it before submission.
//!
//! [`FrameField`] is the single name table for the 47 frame parameters: the
//! phoneme-map reader, voice presets and the slider array all address fields
//! through it.

use serde_json::{Map, Value};

use super::settings::{SpeechSettings, VoiceSelection, NEUTRAL_SLIDER};
use super::voices::voice_preset;

/// Number of scalar parameters in an [`AcousticFrame`].
pub const FRAME_FIELD_COUNT: usize = 47;

/// Pitch used when a phoneme map does not supply a usable one.
pub const DEFAULT_VOICE_PITCH: f64 = 120.0;

/// Volume value that leaves the pre-formant gain untouched.
pub const UNITY_VOLUME: f64 = 75.0;

macro_rules! acoustic_frame {
    ($($field:ident => $variant:ident = $name:literal),+ $(,)?) => {
        /// Names one parameter of an [`AcousticFrame`].
        ///
        /// Declaration order is the engine's field order and the index into
        /// the frame slider array.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum FrameField {
            $($variant),+
        }

        impl FrameField {
            pub const ALL: [FrameField; FRAME_FIELD_COUNT] = [$(FrameField::$variant),+];

            /// Name used by phoneme packs and presets.
            pub fn name(self) -> &'static str {
                match self {
                    $(FrameField::$variant => $name),+
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(FrameField::$variant),)+
                    _ => None,
                }
            }

            pub fn index(self) -> usize {
                self as usize
            }
        }

        /// One instant of formant synthesizer parameters, laid out as the
        /// engine expects it.
        #[repr(C)]
        #[derive(Debug, Clone, Copy, PartialEq, Default)]
        pub struct AcousticFrame {
            $(pub $field: f64),+
        }

        impl AcousticFrame {
            pub fn get(&self, field: FrameField) -> f64 {
                match field {
                    $(FrameField::$variant => self.$field),+
                }
            }

            pub fn get_mut(&mut self, field: FrameField) -> &mut f64 {
                match field {
                    $(FrameField::$variant => &mut self.$field),+
                }
            }
        }
    };
}

acoustic_frame! {
    voice_pitch => VoicePitch = "voicePitch",
    vibrato_pitch_offset => VibratoPitchOffset = "vibratoPitchOffset",
    vibrato_speed => VibratoSpeed = "vibratoSpeed",
    voice_turbulence_amplitude => VoiceTurbulenceAmplitude = "voiceTurbulenceAmplitude",
    glottal_open_quotient => GlottalOpenQuotient = "glottalOpenQuotient",
    voice_amplitude => VoiceAmplitude = "voiceAmplitude",
    aspiration_amplitude => AspirationAmplitude = "aspirationAmplitude",
    cf1 => Cf1 = "cf1",
    cf2 => Cf2 = "cf2",
    cf3 => Cf3 = "cf3",
    cf4 => Cf4 = "cf4",
    cf5 => Cf5 = "cf5",
    cf6 => Cf6 = "cf6",
    cf_n0 => CfN0 = "cfN0",
    cf_np => CfNP = "cfNP",
    cb1 => Cb1 = "cb1",
    cb2 => Cb2 = "cb2",
    cb3 => Cb3 = "cb3",
    cb4 => Cb4 = "cb4",
    cb5 => Cb5 = "cb5",
    cb6 => Cb6 = "cb6",
    cb_n0 => CbN0 = "cbN0",
    cb_np => CbNP = "cbNP",
    ca_np => CaNP = "caNP",
    frication_amplitude => FricationAmplitude = "fricationAmplitude",
    pf1 => Pf1 = "pf1",
    pf2 => Pf2 = "pf2",
    pf3 => Pf3 = "pf3",
    pf4 => Pf4 = "pf4",
    pf5 => Pf5 = "pf5",
    pf6 => Pf6 = "pf6",
    pb1 => Pb1 = "pb1",
    pb2 => Pb2 = "pb2",
    pb3 => Pb3 = "pb3",
    pb4 => Pb4 = "pb4",
    pb5 => Pb5 = "pb5",
    pb6 => Pb6 = "pb6",
    pa1 => Pa1 = "pa1",
    pa2 => Pa2 = "pa2",
    pa3 => Pa3 = "pa3",
    pa4 => Pa4 = "pa4",
    pa5 => Pa5 = "pa5",
    pa6 => Pa6 = "pa6",
    parallel_bypass => ParallelBypass = "parallelBypass",
    pre_formant_gain => PreFormantGain = "preFormantGain",
    output_gain => OutputGain = "outputGain",
    end_voice_pitch => EndVoicePitch = "endVoicePitch",
}

impl AcousticFrame {
    /// Starting point for frames read from phoneme maps: audible pitch and
    /// unity gains, everything else silent.
    pub fn preview_default() -> Self {
        Self {
            voice_pitch: DEFAULT_VOICE_PITCH,
            end_voice_pitch: DEFAULT_VOICE_PITCH,
            pre_formant_gain: 1.0,
            output_gain: 1.0,
            ..Self::default()
        }
    }

    /// Multiply a field, leaving it untouched if the product is not finite.
    pub fn scale(&mut self, field: FrameField, ratio: f64) {
        let value = self.get_mut(field);
        let scaled = *value * ratio;
        if scaled.is_finite() {
            *value = scaled;
        }
    }

    pub fn set(&mut self, field: FrameField, value: f64) {
        if value.is_finite() {
            *self.get_mut(field) = value;
        }
    }
}

/// A frame read from a phoneme map, plus the vowel flag callers use to pick
/// a duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhonemeFrame {
    pub frame: AcousticFrame,
    pub is_vowel: Option<bool>,
}

fn is_pitch_field(field: FrameField) -> bool {
    matches!(field, FrameField::VoicePitch | FrameField::EndVoicePitch)
}

/// Build a frame from a phoneme parameter map.
///
/// Numeric entries overwrite the field of the same name. Non-finite values
/// and non-positive pitches are ignored so the defaults survive.
pub fn build_from_phoneme_map(map: &Map<String, Value>) -> PhonemeFrame {
    let mut frame = AcousticFrame::preview_default();
    let mut is_vowel = None;

    for (key, value) in map {
        if key == "_isVowel" || key == "isVowel" {
            is_vowel = value.as_bool();
            continue;
        }
        let Some(field) = FrameField::from_name(key) else {
            log::trace!("Ignoring phoneme key {key:?}");
            continue;
        };
        let Some(number) = value.as_f64() else {
            log::trace!("Ignoring non-numeric value for {key}: {value}");
            continue;
        };
        if is_pitch_field(field) && number <= 0.0 {
            continue;
        }
        frame.set(field, number);
    }

    PhonemeFrame { frame, is_vowel }
}

/// Apply a built-in voice preset by name.
///
/// Unknown names use the default preset.
pub fn apply_voice_preset(frame: &mut AcousticFrame, name: &str) {
    for op in voice_preset(name).ops {
        op.apply(frame);
    }
}

/// Scale each field by its slider: `v / 50`, so 50 is neutral.
///
/// Sliders past the end of `sliders` count as absent.
pub fn apply_frame_sliders(frame: &mut AcousticFrame, sliders: &[f64]) {
    for (&field, &value) in FrameField::ALL.iter().zip(sliders) {
        if !value.is_finite() {
            continue;
        }
        let ratio = value.clamp(0.0, 100.0) / NEUTRAL_SLIDER;
        if ratio == 1.0 {
            continue;
        }
        frame.scale(field, ratio);
    }
}

/// Scale the pre-formant gain by `volume / 75`.
pub fn apply_volume(frame: &mut AcousticFrame, volume: f64) {
    let volume = super::settings::percent(volume, UNITY_VOLUME);
    frame.scale(FrameField::PreFormantGain, volume / UNITY_VOLUME);
}

/// Run the preset, slider and gain steps in that order.
///
/// Profile voices skip the preset step: their formant transforms are applied
/// by the linguistic engine.
pub fn apply_settings(frame: &mut AcousticFrame, settings: &SpeechSettings) {
    match &settings.voice {
        VoiceSelection::Preset(name) => apply_voice_preset(frame, name),
        VoiceSelection::Profile(_) => {}
    }
    apply_frame_sliders(frame, &settings.frame_sliders);
    apply_volume(frame, settings.volume);
}
