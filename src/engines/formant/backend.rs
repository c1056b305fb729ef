//! The seams between the bridge and the two engine modules.
//!
//! Both modules are reached through traits so the driver never touches raw
//! function pointers. The shared-library implementations live in
//! [`super::native`]; anything else that implements these traits (an
//! in-process engine, a test double) plugs into the same code paths.

use std::ffi::c_void;
use std::fmt;
use std::path::Path;
use std::ptr::NonNull;

use super::capabilities::VoicingToneBlock;
use super::error::EngineError;
use super::frame::AcousticFrame;
use super::frame_ex::FrameExBlock;

/// Every entry point the bridge may call, across both modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryPoint {
    CreatePlayer,
    QueueFrame,
    QueueFrameEx,
    Synthesize,
    DestroyPlayer,
    SetVoicingTone,
    GetDspVersion,
    GetFrameExDefaults,
    CreateSession,
    DestroySession,
    SetLanguage,
    SetVoiceProfile,
    QueueTokens,
    LastError,
}

impl EntryPoint {
    /// Synthesis module entry points without which no session is possible.
    pub const SYNTH_CORE: [EntryPoint; 4] = [
        EntryPoint::CreatePlayer,
        EntryPoint::QueueFrame,
        EntryPoint::Synthesize,
        EntryPoint::DestroyPlayer,
    ];

    pub const SYNTH_OPTIONAL: [EntryPoint; 4] = [
        EntryPoint::QueueFrameEx,
        EntryPoint::SetVoicingTone,
        EntryPoint::GetDspVersion,
        EntryPoint::GetFrameExDefaults,
    ];

    pub const FRONTEND_CORE: [EntryPoint; 5] = [
        EntryPoint::CreateSession,
        EntryPoint::DestroySession,
        EntryPoint::SetLanguage,
        EntryPoint::QueueTokens,
        EntryPoint::LastError,
    ];

    pub const FRONTEND_OPTIONAL: [EntryPoint; 1] = [EntryPoint::SetVoiceProfile];

    /// Exported symbol name in the engine module.
    pub fn symbol(self) -> &'static str {
        match self {
            EntryPoint::CreatePlayer => "speechPlayer_initialize",
            EntryPoint::QueueFrame => "speechPlayer_queueFrame",
            EntryPoint::QueueFrameEx => "speechPlayer_queueFrameEx",
            EntryPoint::Synthesize => "speechPlayer_synthesize",
            EntryPoint::DestroyPlayer => "speechPlayer_terminate",
            EntryPoint::SetVoicingTone => "speechPlayer_setVoicingTone",
            EntryPoint::GetDspVersion => "speechPlayer_getDspVersion",
            EntryPoint::GetFrameExDefaults => "speechPlayer_getFrameExDefaults",
            EntryPoint::CreateSession => "nvspFrontend_create",
            EntryPoint::DestroySession => "nvspFrontend_destroy",
            EntryPoint::SetLanguage => "nvspFrontend_setLanguage",
            EntryPoint::SetVoiceProfile => "nvspFrontend_setVoiceProfile",
            EntryPoint::QueueTokens => "nvspFrontend_queueIPA",
            EntryPoint::LastError => "nvspFrontend_getLastError",
        }
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Reports which entry points a loaded module actually exports.
pub trait ModuleExports {
    fn provides(&self, entry: EntryPoint) -> bool;
}

/// Opaque synthesis-engine player instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerHandle(NonNull<c_void>);

impl PlayerHandle {
    /// Wrap a raw handle; a null pointer means the engine refused.
    pub fn from_raw(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// Opaque linguistic-engine session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionHandle(NonNull<c_void>);

impl SessionHandle {
    pub fn from_raw(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// One item emitted by the linguistic pass for a clause.
///
/// `frame: None` is silence. Durations are in milliseconds; the driver
/// converts them to samples at the player's rate.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameEvent {
    pub frame: Option<AcousticFrame>,
    pub frame_ex: Option<FrameExBlock>,
    pub duration_ms: f64,
    pub fade_ms: f64,
    pub ordinal: i32,
}

/// Arguments shared by both frame submission paths.
#[derive(Debug, Clone, Copy)]
pub struct FrameSubmission<'a> {
    pub frame: Option<&'a AcousticFrame>,
    pub duration_samples: u32,
    pub fade_samples: u32,
    pub ordinal: i32,
    /// Ask the engine to purge anything still queued from a previous call.
    pub reset: bool,
}

/// One clause handed to the linguistic engine.
#[derive(Debug, Clone, Copy)]
pub struct ClauseRequest<'a> {
    pub tokens: &'a str,
    pub speed: f64,
    pub base_pitch: f64,
    pub inflection: f64,
    pub clause_punctuation: u8,
    pub hint_index: i32,
}

/// The acoustic synthesis engine.
///
/// Optional entry points default to [`EngineError::Unsupported`] so a missing
/// feature can never pass for a successful no-op.
pub trait SynthBackend: ModuleExports {
    fn create_player(&self, sample_rate: u32) -> Result<Option<PlayerHandle>, EngineError>;

    fn queue_frame(
        &self,
        player: PlayerHandle,
        submission: &FrameSubmission<'_>,
    ) -> Result<(), EngineError>;

    fn queue_frame_ex(
        &self,
        _player: PlayerHandle,
        _submission: &FrameSubmission<'_>,
        _frame_ex: &FrameExBlock,
    ) -> Result<(), EngineError> {
        Err(EngineError::Unsupported(EntryPoint::QueueFrameEx))
    }

    /// Pull up to `out.len()` samples; returns how many were produced.
    fn synthesize(&self, player: PlayerHandle, out: &mut [i16]) -> Result<i32, EngineError>;

    fn destroy_player(&self, player: PlayerHandle) -> Result<(), EngineError>;

    fn set_voicing_tone(
        &self,
        _player: PlayerHandle,
        _block: &VoicingToneBlock,
    ) -> Result<(), EngineError> {
        Err(EngineError::Unsupported(EntryPoint::SetVoicingTone))
    }

    fn dsp_version(&self) -> Result<u32, EngineError> {
        Err(EngineError::Unsupported(EntryPoint::GetDspVersion))
    }

    fn frame_ex_defaults(&self) -> Result<FrameExBlock, EngineError> {
        Err(EngineError::Unsupported(EntryPoint::GetFrameExDefaults))
    }
}

/// The linguistic engine that turns phonetic tokens into timed frames.
pub trait LinguisticBackend: ModuleExports {
    fn create_session(&self, pack_root: &Path) -> Result<Option<SessionHandle>, EngineError>;

    fn destroy_session(&self, session: SessionHandle) -> Result<(), EngineError>;

    fn set_language(&self, session: SessionHandle, tag: &str) -> Result<bool, EngineError>;

    fn set_voice_profile(&self, _session: SessionHandle, _name: &str) -> Result<bool, EngineError> {
        Err(EngineError::Unsupported(EntryPoint::SetVoiceProfile))
    }

    /// Run the linguistic pass over one clause and collect its frames.
    ///
    /// An engine-side failure is reported as [`EngineError::Rejected`]; the
    /// message is then available from [`LinguisticBackend::last_error`].
    fn queue_tokens(
        &self,
        session: SessionHandle,
        request: &ClauseRequest<'_>,
    ) -> Result<Vec<FrameEvent>, EngineError>;

    fn last_error(&self, session: SessionHandle) -> Result<String, EngineError>;
}
