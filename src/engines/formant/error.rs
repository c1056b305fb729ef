use std::path::PathBuf;

use super::backend::EntryPoint;

/// A single call into an engine module did not go through.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("Engine entry point `{0}` is not available in the loaded module")]
    Unsupported(EntryPoint),
    #[error("Engine call `{0}` reported failure")]
    Rejected(EntryPoint),
    #[error("Invalid argument for engine call: {0}")]
    InvalidArgument(String),
}

/// Failures while loading the engine modules.
///
/// `MissingOptional` is never returned: absent optional entry points only
/// switch a capability off. It exists so the degradation can be logged with
/// the same wording everywhere.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("Failed to open engine module {}: {message}", path.display())]
    Library { path: PathBuf, message: String },
    #[error("Engine module is missing required entry points: {0}")]
    MissingCore(String),
    #[error("Optional entry point `{0}` not found, capability disabled")]
    MissingOptional(EntryPoint),
    #[error("Engine modules cannot be loaded by this build. Enable the `native` feature.")]
    NativeUnavailable,
}

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("No phoneme pack root configured. Call set_pack_root() first.")]
    NoPackRoot,
    #[error("Linguistic engine could not create a session for pack root {}", .0.display())]
    CreateFailed(PathBuf),
    #[error("Language rejected by the linguistic engine: {0}")]
    LanguageRejected(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(thiserror::Error, Debug)]
pub enum SynthesisError {
    #[error("Synthesis engine could not create a player instance")]
    EngineInit,
    #[error("Linguistic engine failed: {0}")]
    Linguistic(String),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("Engine not loaded. Call load_model() first.")]
    NotLoaded,
}
