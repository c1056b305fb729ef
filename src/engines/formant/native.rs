//! Engine modules loaded from shared libraries.
//!
//! Every entry point is resolved once at open time into an `Option` of its
//! function pointer. A missing symbol is never an error here; the resolver
//! decides which absences are fatal.

use std::ffi::{c_char, c_int, c_uint, c_void, CStr, CString};
use std::path::Path;
use std::ptr;

use libloading::Library;

use super::backend::{
    ClauseRequest, EntryPoint, FrameEvent, FrameSubmission, LinguisticBackend, ModuleExports,
    PlayerHandle, SessionHandle, SynthBackend,
};
use super::capabilities::VoicingToneBlock;
use super::error::{EngineError, LoadError};
use super::frame::AcousticFrame;
use super::frame_ex::FrameExBlock;

type CreatePlayerFn = unsafe extern "C" fn(c_int) -> *mut c_void;
type QueueFrameFn =
    unsafe extern "C" fn(*mut c_void, *const AcousticFrame, c_uint, c_uint, c_int, bool);
type QueueFrameExFn = unsafe extern "C" fn(
    *mut c_void,
    *const AcousticFrame,
    *const FrameExBlock,
    c_uint,
    c_uint,
    c_uint,
    c_int,
    bool,
);
type SynthesizeFn = unsafe extern "C" fn(*mut c_void, c_uint, *mut i16) -> c_int;
type DestroyPlayerFn = unsafe extern "C" fn(*mut c_void);
type SetVoicingToneFn = unsafe extern "C" fn(*mut c_void, *const c_void);
type DspVersionFn = unsafe extern "C" fn() -> c_uint;
type FrameExDefaultsFn = unsafe extern "C" fn(*mut FrameExBlock);

type FrameCallback = unsafe extern "C" fn(
    *mut c_void,
    *const AcousticFrame,
    *const FrameExBlock,
    f64,
    f64,
    c_int,
);
type CreateSessionFn = unsafe extern "C" fn(*const c_char) -> *mut c_void;
type DestroySessionFn = unsafe extern "C" fn(*mut c_void);
type SetStringFn = unsafe extern "C" fn(*mut c_void, *const c_char) -> c_int;
type QueueTokensFn = unsafe extern "C" fn(
    *mut c_void,
    *const c_char,
    f64,
    f64,
    f64,
    c_char,
    c_int,
    FrameCallback,
    *mut c_void,
) -> c_int;
type LastErrorFn = unsafe extern "C" fn(*mut c_void) -> *const c_char;

fn open_library(path: &Path) -> Result<Library, LoadError> {
    // SAFETY: opening runs the module's initialisers. Engine modules are
    // trusted plugins chosen by the host.
    unsafe { Library::new(path) }.map_err(|e| LoadError::Library {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn resolve<T: Copy>(library: &Library, entry: EntryPoint) -> Option<T> {
    // SAFETY: callers pick `T` as the C signature of `entry`. The copied
    // pointer stays valid because the owning backend keeps `library` alive.
    let symbol = unsafe { library.get::<T>(entry.symbol().as_bytes()) };
    match symbol {
        Ok(symbol) => Some(*symbol),
        Err(e) => {
            log::trace!("Symbol {entry} not resolved: {e}");
            None
        }
    }
}

fn available<T: Copy>(slot: Option<T>, entry: EntryPoint) -> Result<T, EngineError> {
    slot.ok_or(EngineError::Unsupported(entry))
}

fn c_string(value: &str) -> Result<CString, EngineError> {
    CString::new(value)
        .map_err(|_| EngineError::InvalidArgument(format!("interior NUL in {value:?}")))
}

fn frame_ptr(frame: Option<&AcousticFrame>) -> *const AcousticFrame {
    frame.map_or(ptr::null(), |f| f as *const AcousticFrame)
}

/// The acoustic synthesis module.
pub struct NativeSynth {
    create_player: Option<CreatePlayerFn>,
    queue_frame: Option<QueueFrameFn>,
    queue_frame_ex: Option<QueueFrameExFn>,
    synthesize: Option<SynthesizeFn>,
    destroy_player: Option<DestroyPlayerFn>,
    set_voicing_tone: Option<SetVoicingToneFn>,
    dsp_version: Option<DspVersionFn>,
    frame_ex_defaults: Option<FrameExDefaultsFn>,
    _library: Library,
}

impl NativeSynth {
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let library = open_library(path)?;
        Ok(Self {
            create_player: resolve(&library, EntryPoint::CreatePlayer),
            queue_frame: resolve(&library, EntryPoint::QueueFrame),
            queue_frame_ex: resolve(&library, EntryPoint::QueueFrameEx),
            synthesize: resolve(&library, EntryPoint::Synthesize),
            destroy_player: resolve(&library, EntryPoint::DestroyPlayer),
            set_voicing_tone: resolve(&library, EntryPoint::SetVoicingTone),
            dsp_version: resolve(&library, EntryPoint::GetDspVersion),
            frame_ex_defaults: resolve(&library, EntryPoint::GetFrameExDefaults),
            _library: library,
        })
    }
}

impl ModuleExports for NativeSynth {
    fn provides(&self, entry: EntryPoint) -> bool {
        match entry {
            EntryPoint::CreatePlayer => self.create_player.is_some(),
            EntryPoint::QueueFrame => self.queue_frame.is_some(),
            EntryPoint::QueueFrameEx => self.queue_frame_ex.is_some(),
            EntryPoint::Synthesize => self.synthesize.is_some(),
            EntryPoint::DestroyPlayer => self.destroy_player.is_some(),
            EntryPoint::SetVoicingTone => self.set_voicing_tone.is_some(),
            EntryPoint::GetDspVersion => self.dsp_version.is_some(),
            EntryPoint::GetFrameExDefaults => self.frame_ex_defaults.is_some(),
            _ => false,
        }
    }
}

impl SynthBackend for NativeSynth {
    fn create_player(&self, sample_rate: u32) -> Result<Option<PlayerHandle>, EngineError> {
        let create = available(self.create_player, EntryPoint::CreatePlayer)?;
        let rate = c_int::try_from(sample_rate)
            .map_err(|_| EngineError::InvalidArgument(format!("sample rate {sample_rate}")))?;
        // SAFETY: plain value argument; a null return is handled by `from_raw`.
        let raw = unsafe { create(rate) };
        Ok(PlayerHandle::from_raw(raw))
    }

    fn queue_frame(
        &self,
        player: PlayerHandle,
        submission: &FrameSubmission<'_>,
    ) -> Result<(), EngineError> {
        let queue = available(self.queue_frame, EntryPoint::QueueFrame)?;
        // SAFETY: the engine copies the frame before returning; the pointer
        // is null or borrowed from `submission` for the duration of the call.
        unsafe {
            queue(
                player.as_ptr(),
                frame_ptr(submission.frame),
                submission.duration_samples,
                submission.fade_samples,
                submission.ordinal,
                submission.reset,
            )
        };
        Ok(())
    }

    fn queue_frame_ex(
        &self,
        player: PlayerHandle,
        submission: &FrameSubmission<'_>,
        frame_ex: &FrameExBlock,
    ) -> Result<(), EngineError> {
        let queue = available(self.queue_frame_ex, EntryPoint::QueueFrameEx)?;
        // SAFETY: as for `queue_frame`; the block size tells the engine how
        // much of `frame_ex` it may read.
        unsafe {
            queue(
                player.as_ptr(),
                frame_ptr(submission.frame),
                frame_ex,
                FrameExBlock::SIZE_BYTES,
                submission.duration_samples,
                submission.fade_samples,
                submission.ordinal,
                submission.reset,
            )
        };
        Ok(())
    }

    fn synthesize(&self, player: PlayerHandle, out: &mut [i16]) -> Result<i32, EngineError> {
        let synthesize = available(self.synthesize, EntryPoint::Synthesize)?;
        let capacity = c_uint::try_from(out.len()).unwrap_or(c_uint::MAX);
        // SAFETY: the engine writes at most `capacity` samples, which never
        // exceeds `out.len()`.
        let produced = unsafe { synthesize(player.as_ptr(), capacity, out.as_mut_ptr()) };
        Ok(produced)
    }

    fn destroy_player(&self, player: PlayerHandle) -> Result<(), EngineError> {
        let destroy = available(self.destroy_player, EntryPoint::DestroyPlayer)?;
        // SAFETY: handles come from `create_player` and are destroyed once.
        unsafe { destroy(player.as_ptr()) };
        Ok(())
    }

    fn set_voicing_tone(
        &self,
        player: PlayerHandle,
        block: &VoicingToneBlock,
    ) -> Result<(), EngineError> {
        let set = available(self.set_voicing_tone, EntryPoint::SetVoicingTone)?;
        // SAFETY: the block layout was chosen from this module's own
        // capabilities and outlives the call.
        unsafe { set(player.as_ptr(), block.as_ptr()) };
        Ok(())
    }

    fn dsp_version(&self) -> Result<u32, EngineError> {
        let version = available(self.dsp_version, EntryPoint::GetDspVersion)?;
        // SAFETY: no arguments.
        Ok(unsafe { version() })
    }

    fn frame_ex_defaults(&self) -> Result<FrameExBlock, EngineError> {
        let defaults = available(self.frame_ex_defaults, EntryPoint::GetFrameExDefaults)?;
        let mut block = FrameExBlock::NEUTRAL;
        // SAFETY: `block` is a valid, initialised FrameExBlock for the engine
        // to overwrite.
        unsafe { defaults(&mut block) };
        Ok(block)
    }
}

/// Collects frames emitted during `queue_tokens` into a `Vec<FrameEvent>`.
unsafe extern "C" fn collect_frame(
    user_data: *mut c_void,
    frame: *const AcousticFrame,
    frame_ex: *const FrameExBlock,
    duration_ms: f64,
    fade_ms: f64,
    ordinal: c_int,
) {
    if user_data.is_null() {
        return;
    }
    // SAFETY: `user_data` is the `&mut Vec<FrameEvent>` handed to the engine
    // by `queue_tokens`, live for the whole call. Frame pointers are null or
    // valid for the duration of this callback.
    let (events, frame, frame_ex) = unsafe {
        (
            &mut *user_data.cast::<Vec<FrameEvent>>(),
            frame.as_ref().copied(),
            frame_ex.as_ref().copied(),
        )
    };
    events.push(FrameEvent {
        frame,
        frame_ex,
        duration_ms,
        fade_ms,
        ordinal,
    });
}

/// The linguistic module.
pub struct NativeFrontend {
    create_session: Option<CreateSessionFn>,
    destroy_session: Option<DestroySessionFn>,
    set_language: Option<SetStringFn>,
    set_voice_profile: Option<SetStringFn>,
    queue_tokens: Option<QueueTokensFn>,
    last_error: Option<LastErrorFn>,
    _library: Library,
}

impl NativeFrontend {
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let library = open_library(path)?;
        Ok(Self {
            create_session: resolve(&library, EntryPoint::CreateSession),
            destroy_session: resolve(&library, EntryPoint::DestroySession),
            set_language: resolve(&library, EntryPoint::SetLanguage),
            set_voice_profile: resolve(&library, EntryPoint::SetVoiceProfile),
            queue_tokens: resolve(&library, EntryPoint::QueueTokens),
            last_error: resolve(&library, EntryPoint::LastError),
            _library: library,
        })
    }

    fn set_string(
        &self,
        slot: Option<SetStringFn>,
        entry: EntryPoint,
        session: SessionHandle,
        value: &str,
    ) -> Result<bool, EngineError> {
        let set = available(slot, entry)?;
        let value = c_string(value)?;
        // SAFETY: `value` is NUL-terminated and outlives the call.
        let ok = unsafe { set(session.as_ptr(), value.as_ptr()) };
        Ok(ok != 0)
    }
}

impl ModuleExports for NativeFrontend {
    fn provides(&self, entry: EntryPoint) -> bool {
        match entry {
            EntryPoint::CreateSession => self.create_session.is_some(),
            EntryPoint::DestroySession => self.destroy_session.is_some(),
            EntryPoint::SetLanguage => self.set_language.is_some(),
            EntryPoint::SetVoiceProfile => self.set_voice_profile.is_some(),
            EntryPoint::QueueTokens => self.queue_tokens.is_some(),
            EntryPoint::LastError => self.last_error.is_some(),
            _ => false,
        }
    }
}

impl LinguisticBackend for NativeFrontend {
    fn create_session(&self, pack_root: &Path) -> Result<Option<SessionHandle>, EngineError> {
        let create = available(self.create_session, EntryPoint::CreateSession)?;
        let root = pack_root.to_str().ok_or_else(|| {
            EngineError::InvalidArgument(format!("pack root {} is not UTF-8", pack_root.display()))
        })?;
        let root = c_string(root)?;
        // SAFETY: `root` is NUL-terminated and outlives the call.
        let raw = unsafe { create(root.as_ptr()) };
        Ok(SessionHandle::from_raw(raw))
    }

    fn destroy_session(&self, session: SessionHandle) -> Result<(), EngineError> {
        let destroy = available(self.destroy_session, EntryPoint::DestroySession)?;
        // SAFETY: sessions come from `create_session` and are destroyed once.
        unsafe { destroy(session.as_ptr()) };
        Ok(())
    }

    fn set_language(&self, session: SessionHandle, tag: &str) -> Result<bool, EngineError> {
        self.set_string(self.set_language, EntryPoint::SetLanguage, session, tag)
    }

    fn set_voice_profile(&self, session: SessionHandle, name: &str) -> Result<bool, EngineError> {
        self.set_string(self.set_voice_profile, EntryPoint::SetVoiceProfile, session, name)
    }

    fn queue_tokens(
        &self,
        session: SessionHandle,
        request: &ClauseRequest<'_>,
    ) -> Result<Vec<FrameEvent>, EngineError> {
        let queue = available(self.queue_tokens, EntryPoint::QueueTokens)?;
        let tokens = c_string(request.tokens)?;
        let mut events: Vec<FrameEvent> = Vec::new();

        // SAFETY: `tokens` and `events` outlive the call, and the engine only
        // invokes `collect_frame` before returning.
        let ok = unsafe {
            queue(
                session.as_ptr(),
                tokens.as_ptr(),
                request.speed,
                request.base_pitch,
                request.inflection,
                request.clause_punctuation as c_char,
                request.hint_index,
                collect_frame,
                (&mut events as *mut Vec<FrameEvent>).cast(),
            )
        };

        if ok == 0 {
            return Err(EngineError::Rejected(EntryPoint::QueueTokens));
        }
        Ok(events)
    }

    fn last_error(&self, session: SessionHandle) -> Result<String, EngineError> {
        let last_error = available(self.last_error, EntryPoint::LastError)?;
        // SAFETY: the engine returns null or a NUL-terminated string owned by
        // the session, valid until the next call on it.
        let message = unsafe {
            let raw = last_error(session.as_ptr());
            if raw.is_null() {
                return Ok(String::new());
            }
            CStr::from_ptr(raw).to_string_lossy().into_owned()
        };
        Ok(message)
    }
}
