use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::{SynthesisEngine, SynthesisResult};

use super::capabilities::{EngineCapabilities, EngineHandle};
use super::clauses::split_clauses;
use super::driver::{self, SynthesisDriver};
use super::error::{LoadError, SynthesisError};
use super::frame::{apply_settings, build_from_phoneme_map, PhonemeFrame};
use super::frame_ex::override_from_phoneme_map;
use super::settings::SpeechSettings;
use super::voices::preset_names;

/// Output rate when none is configured.
pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;

const PREVIEW_VOWEL_MS: f64 = 300.0;
const PREVIEW_OTHER_MS: f64 = 120.0;
const PREVIEW_FADE_MS: f64 = 10.0;

/// Base name of the linguistic module, without platform prefix or suffix.
const FRONTEND_MODULE: &str = "nvspFrontend";

/// Parameters for loading the engine modules.
#[derive(Debug, Clone)]
pub struct FormantModelParams {
    /// Linguistic module. `None` looks beside the synthesis module.
    pub frontend_path: Option<PathBuf>,
    /// Root of the phoneme and language packs.
    pub pack_root: Option<PathBuf>,
    pub sample_rate: u32,
}

impl Default for FormantModelParams {
    fn default() -> Self {
        Self {
            frontend_path: None,
            pack_root: None,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

/// Where the linguistic module is expected when no path is given.
pub fn default_frontend_path(synth_path: &Path) -> PathBuf {
    synth_path.with_file_name(format!("{DLL_PREFIX}{FRONTEND_MODULE}{DLL_SUFFIX}"))
}

#[cfg(feature = "native")]
fn open_modules(synth_path: &Path, frontend_path: &Path) -> Result<EngineHandle, LoadError> {
    EngineHandle::load(synth_path, frontend_path)
}

#[cfg(not(feature = "native"))]
fn open_modules(_synth_path: &Path, _frontend_path: &Path) -> Result<EngineHandle, LoadError> {
    Err(LoadError::NativeUnavailable)
}

/// Formant synthesis engine.
///
/// `synthesize` takes a phonetic token stream (IPA symbols and clause
/// markers separated by whitespace), not plain text; converting text to
/// tokens is up to the caller.
///
/// ```rust,no_run
/// use formant_bridge::{SynthesisEngine, engines::formant::{FormantEngine, FormantModelParams}};
/// use std::path::PathBuf;
///
/// let mut engine = FormantEngine::new();
/// engine.load_model_with_params(
///     &PathBuf::from("engine/libspeechPlayer.so"),
///     FormantModelParams {
///         pack_root: Some(PathBuf::from("engine/packs")),
///         ..Default::default()
///     },
/// )?;
/// let result = engine.synthesize("h ə l oʊ .", None)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct FormantEngine {
    handle: Option<EngineHandle>,
    model_path: Option<PathBuf>,
    pack_root: Option<PathBuf>,
    sample_rate: u32,
}

impl Default for FormantEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FormantEngine {
    pub fn new() -> Self {
        Self {
            handle: None,
            model_path: None,
            pack_root: None,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }

    /// Wrap an engine handle built from already-opened backends.
    pub fn with_handle(handle: EngineHandle, sample_rate: u32) -> Self {
        Self {
            handle: Some(handle),
            model_path: None,
            pack_root: None,
            sample_rate,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.handle.is_some()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn pack_root(&self) -> Option<&Path> {
        self.pack_root.as_deref()
    }

    /// Point the linguistic engine at another pack root. A change destroys
    /// the current session; the next render creates a fresh one.
    pub fn set_pack_root(&mut self, pack_root: Option<PathBuf>) {
        if self.pack_root == pack_root {
            return;
        }
        if let Some(handle) = self.handle.as_mut() {
            handle.invalidate_session();
        }
        log::debug!("Pack root set to {pack_root:?}");
        self.pack_root = pack_root;
    }

    /// What the loaded modules support, if loaded.
    pub fn capabilities(&self) -> Option<&EngineCapabilities> {
        self.handle.as_ref().map(EngineHandle::capabilities)
    }

    /// Built-in voice preset names.
    pub fn list_voices(&self) -> Vec<&'static str> {
        preset_names()
    }

    /// Render a token stream to samples.
    ///
    /// A stream with no phonetic tokens renders to an empty buffer without
    /// touching the engine.
    pub fn render_tokens(
        &mut self,
        tokens: &str,
        settings: &SpeechSettings,
    ) -> Result<SynthesisResult, SynthesisError> {
        let sample_rate = self.sample_rate;
        let handle = self.handle.as_mut().ok_or(SynthesisError::NotLoaded)?;

        let chunks = split_clauses(tokens);
        if chunks.is_empty() {
            log::warn!("No phonetic tokens in stream: {tokens:?}");
            return Ok(SynthesisResult {
                samples: Vec::new(),
                sample_rate,
            });
        }

        let session = handle.ensure_session(self.pack_root.as_deref(), &settings.language)?;
        handle.apply_voice(&settings.voice);

        let samples = driver::render(handle, session, &chunks, settings, sample_rate)?;
        log::debug!(
            "Rendered {} clause(s) into {} samples",
            chunks.len(),
            samples.len()
        );
        Ok(SynthesisResult {
            samples,
            sample_rate,
        })
    }

    /// Render a single phoneme from its parameter map.
    ///
    /// Vowels play for 300 ms and everything else for 120 ms. Only the
    /// synthesis module is used.
    pub fn preview_phoneme(
        &self,
        phoneme: &Map<String, Value>,
        settings: &SpeechSettings,
    ) -> Result<SynthesisResult, SynthesisError> {
        let handle = self.handle.as_ref().ok_or(SynthesisError::NotLoaded)?;

        let PhonemeFrame { mut frame, is_vowel } = build_from_phoneme_map(phoneme);
        apply_settings(&mut frame, settings);
        let overrides = override_from_phoneme_map(phoneme);
        let duration_ms = if is_vowel == Some(true) {
            PREVIEW_VOWEL_MS
        } else {
            PREVIEW_OTHER_MS
        };

        let mut driver = SynthesisDriver::new(handle, self.sample_rate);
        driver.bind(settings)?;
        driver.submit_frame(Some(&frame), overrides.as_ref(), duration_ms, PREVIEW_FADE_MS)?;
        let samples = driver.drain()?;

        Ok(SynthesisResult {
            samples,
            sample_rate: self.sample_rate,
        })
    }
}

impl Drop for FormantEngine {
    fn drop(&mut self) {
        self.unload_model();
    }
}

impl SynthesisEngine for FormantEngine {
    type SynthesisParams = SpeechSettings;
    type ModelParams = FormantModelParams;

    /// `model_path` is the synthesis module.
    fn load_model_with_params(
        &mut self,
        model_path: &Path,
        params: Self::ModelParams,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let frontend_path = params
            .frontend_path
            .unwrap_or_else(|| default_frontend_path(model_path));
        let handle = open_modules(model_path, &frontend_path)?;

        self.unload_model();
        self.handle = Some(handle);
        self.model_path = Some(model_path.to_path_buf());
        self.sample_rate = params.sample_rate;
        if params.pack_root.is_some() {
            self.pack_root = params.pack_root;
        }
        Ok(())
    }

    fn unload_model(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.invalidate_session();
            log::info!("Unloaded engine modules");
        }
        self.model_path = None;
    }

    fn synthesize(
        &mut self,
        text: &str,
        params: Option<Self::SynthesisParams>,
    ) -> Result<SynthesisResult, Box<dyn std::error::Error>> {
        let settings = params.unwrap_or_default();
        Ok(self.render_tokens(text, &settings)?)
    }
}
