//! # formant-bridge
//!
//! A Rust library that renders phonetic token streams to speech through an
//! external formant synthesis engine.
//!
//! ## Features
//!
//! - **Capability negotiation**: Works with old and new engine builds, using
//!   whichever optional features the installed modules export
//! - **Layered voice shaping**: Presets, per-parameter sliders, voice quality
//!   and voicing tone
//! - **Clause pacing**: Prosody hints and pauses from punctuation tokens
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! formant-bridge = { version = "2026.10", features = ["native"] }
//! ```
//!
//! ```ignore
//! use std::path::PathBuf;
//! use formant_bridge::{engines::formant::FormantEngine, SynthesisEngine};
//!
//! let mut engine = FormantEngine::new();
//! engine.load_model(&PathBuf::from("engine/libspeechPlayer.so"))?;
//! engine.set_pack_root(Some(PathBuf::from("engine/packs")));
//!
//! let result = engine.synthesize("h ə l oʊ .", None)?;
//! result.write_wav(&PathBuf::from("output.wav"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod engines;

use std::path::Path;

/// The result of a synthesis operation.
///
/// Contains 16-bit PCM samples and the sample rate of the output audio.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResult {
    /// Mono 16-bit PCM samples
    pub samples: Vec<i16>,
    /// Sample rate the player was created with
    pub sample_rate: u32,
}

impl SynthesisResult {
    /// Write the audio to a 16-bit PCM WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Common interface for speech synthesis engines.
///
/// This trait defines the standard operations that all synthesis engines must support.
/// Each engine may have different parameter types for model loading and synthesis.
pub trait SynthesisEngine {
    /// Parameters for configuring synthesis (voice, rate, etc.)
    type SynthesisParams;
    /// Parameters for configuring model loading
    type ModelParams: Default;

    /// Load a model from the specified path using default parameters.
    fn load_model(&mut self, model_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        self.load_model_with_params(model_path, Self::ModelParams::default())
    }

    /// Load a model from the specified path with custom parameters.
    fn load_model_with_params(
        &mut self,
        model_path: &Path,
        params: Self::ModelParams,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Unload the currently loaded model and free associated resources.
    fn unload_model(&mut self);

    /// Synthesize speech from the given input.
    fn synthesize(
        &mut self,
        text: &str,
        params: Option<Self::SynthesisParams>,
    ) -> Result<SynthesisResult, Box<dyn std::error::Error>>;

    /// Synthesize speech and write it to a WAV file.
    ///
    /// Default implementation calls `synthesize()` then `SynthesisResult::write_wav()`.
    fn synthesize_to_file(
        &mut self,
        text: &str,
        wav_path: &Path,
        params: Option<Self::SynthesisParams>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.synthesize(text, params)?.write_wav(wav_path)
    }
}
