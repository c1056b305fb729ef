use super::frame::{AcousticFrame, FrameField};

/// Preset used when a name is not recognised.
pub const DEFAULT_VOICE: &str = "Adam";

/// One step of a voice preset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PresetOp {
    Multiply(FrameField, f64),
    Set(FrameField, f64),
}

impl PresetOp {
    pub fn apply(&self, frame: &mut AcousticFrame) {
        match *self {
            PresetOp::Multiply(field, factor) => frame.scale(field, factor),
            PresetOp::Set(field, value) => frame.set(field, value),
        }
    }
}

/// A built-in voice: an ordered list of frame operations.
#[derive(Debug)]
pub struct VoicePreset {
    pub name: &'static str,
    pub ops: &'static [PresetOp],
}

static PRESETS: &[VoicePreset] = &[
    VoicePreset {
        name: "Adam",
        ops: &[
            PresetOp::Multiply(FrameField::Cb1, 1.3),
            PresetOp::Multiply(FrameField::Pa6, 1.3),
            PresetOp::Multiply(FrameField::FricationAmplitude, 0.85),
        ],
    },
    VoicePreset {
        name: "Benjamin",
        ops: &[
            PresetOp::Multiply(FrameField::Cf1, 1.01),
            PresetOp::Multiply(FrameField::Cf2, 1.02),
            PresetOp::Set(FrameField::Cf4, 3770.0),
            PresetOp::Set(FrameField::Cf5, 4100.0),
            PresetOp::Set(FrameField::Cf6, 5000.0),
            PresetOp::Multiply(FrameField::CfNP, 0.9),
            PresetOp::Multiply(FrameField::Cb1, 1.3),
            PresetOp::Multiply(FrameField::FricationAmplitude, 0.7),
            PresetOp::Multiply(FrameField::Pa6, 1.3),
        ],
    },
    VoicePreset {
        name: "Caleb",
        ops: &[
            PresetOp::Set(FrameField::AspirationAmplitude, 1.0),
            PresetOp::Set(FrameField::VoiceAmplitude, 0.0),
        ],
    },
    VoicePreset {
        name: "David",
        ops: &[
            PresetOp::Multiply(FrameField::VoicePitch, 0.75),
            PresetOp::Multiply(FrameField::EndVoicePitch, 0.75),
            PresetOp::Multiply(FrameField::Cf1, 0.75),
            PresetOp::Multiply(FrameField::Cf2, 0.85),
            PresetOp::Multiply(FrameField::Cf3, 0.85),
        ],
    },
];

fn find_preset(name: &str) -> Option<&'static VoicePreset> {
    let name = name.trim();
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Look up a preset, falling back to [`DEFAULT_VOICE`].
pub fn voice_preset(name: &str) -> &'static VoicePreset {
    find_preset(name)
        .or_else(|| find_preset(DEFAULT_VOICE))
        .unwrap_or(&PRESETS[0])
}

/// Names of all built-in presets.
pub fn preset_names() -> Vec<&'static str> {
    PRESETS.iter().map(|p| p.name).collect()
}
