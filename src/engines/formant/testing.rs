//! In-memory engine doubles for unit tests.
//!
//! `MockSynth` renders every voiced frame as a run of [`VOICED_SAMPLE`] and
//! every silence frame as zeros, so sample buffers can be checked exactly.
//! `MockFrontend` emits one 10 ms frame per token; the token `_` is silence.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::rc::Rc;

use super::backend::{
    ClauseRequest, EntryPoint, FrameEvent, FrameSubmission, LinguisticBackend, ModuleExports,
    PlayerHandle, SessionHandle, SynthBackend,
};
use super::capabilities::{ToneLayoutKind, VoicingToneBlock};
use super::error::EngineError;
use super::frame::AcousticFrame;
use super::frame_ex::FrameExBlock;

pub const VOICED_SAMPLE: i16 = 1000;
pub const TOKEN_MS: f64 = 10.0;

fn fake_handle() -> *mut c_void {
    NonNull::<c_void>::dangling().as_ptr()
}

/// One frame as the engine received it.
#[derive(Debug, Clone, PartialEq)]
pub struct Queued {
    pub frame: Option<AcousticFrame>,
    pub frame_ex: Option<FrameExBlock>,
    pub duration: u32,
    pub fade: u32,
    pub ordinal: i32,
    pub reset: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SynthCall {
    CreatePlayer(u32),
    Queue(Queued),
    SetVoicingTone(ToneLayoutKind),
    Synthesize(usize),
    DestroyPlayer,
}

pub struct MockSynth {
    exports: HashSet<EntryPoint>,
    dsp_version: u32,
    frame_ex_defaults: FrameExBlock,
    fail_create: bool,
    fail_synthesize: bool,
    pending: RefCell<VecDeque<i16>>,
    log: Rc<RefCell<Vec<SynthCall>>>,
}

impl MockSynth {
    /// Exports every synthesis entry point, DSP version 6.
    pub fn new() -> Self {
        Self {
            exports: EntryPoint::SYNTH_CORE
                .into_iter()
                .chain(EntryPoint::SYNTH_OPTIONAL)
                .collect(),
            dsp_version: 6,
            frame_ex_defaults: FrameExBlock::NEUTRAL,
            fail_create: false,
            fail_synthesize: false,
            pending: RefCell::new(VecDeque::new()),
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn without(mut self, entry: EntryPoint) -> Self {
        self.exports.remove(&entry);
        self
    }

    pub fn with_dsp_version(mut self, version: u32) -> Self {
        self.dsp_version = version;
        self
    }

    pub fn with_frame_ex_defaults(mut self, block: FrameExBlock) -> Self {
        self.frame_ex_defaults = block;
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// Every pull reports failure.
    pub fn failing_synthesize(mut self) -> Self {
        self.fail_synthesize = true;
        self
    }

    pub fn log(&self) -> Rc<RefCell<Vec<SynthCall>>> {
        Rc::clone(&self.log)
    }

    fn require(&self, entry: EntryPoint) -> Result<(), EngineError> {
        if self.exports.contains(&entry) {
            Ok(())
        } else {
            Err(EngineError::Unsupported(entry))
        }
    }

    fn enqueue(&self, submission: &FrameSubmission<'_>, frame_ex: Option<&FrameExBlock>) {
        let mut pending = self.pending.borrow_mut();
        if submission.reset {
            pending.clear();
        }
        let value = if submission.frame.is_some() { VOICED_SAMPLE } else { 0 };
        pending.extend(std::iter::repeat(value).take(submission.duration_samples as usize));

        self.log.borrow_mut().push(SynthCall::Queue(Queued {
            frame: submission.frame.copied(),
            frame_ex: frame_ex.copied(),
            duration: submission.duration_samples,
            fade: submission.fade_samples,
            ordinal: submission.ordinal,
            reset: submission.reset,
        }));
    }
}

/// Every queued frame from a call log, in order.
pub fn queued(log: &[SynthCall]) -> Vec<Queued> {
    log.iter()
        .filter_map(|call| match call {
            SynthCall::Queue(q) => Some(q.clone()),
            _ => None,
        })
        .collect()
}

impl ModuleExports for MockSynth {
    fn provides(&self, entry: EntryPoint) -> bool {
        self.exports.contains(&entry)
    }
}

impl SynthBackend for MockSynth {
    fn create_player(&self, sample_rate: u32) -> Result<Option<PlayerHandle>, EngineError> {
        self.require(EntryPoint::CreatePlayer)?;
        self.log.borrow_mut().push(SynthCall::CreatePlayer(sample_rate));
        if self.fail_create {
            return Ok(None);
        }
        Ok(PlayerHandle::from_raw(fake_handle()))
    }

    fn queue_frame(
        &self,
        _player: PlayerHandle,
        submission: &FrameSubmission<'_>,
    ) -> Result<(), EngineError> {
        self.require(EntryPoint::QueueFrame)?;
        self.enqueue(submission, None);
        Ok(())
    }

    fn queue_frame_ex(
        &self,
        _player: PlayerHandle,
        submission: &FrameSubmission<'_>,
        frame_ex: &FrameExBlock,
    ) -> Result<(), EngineError> {
        self.require(EntryPoint::QueueFrameEx)?;
        self.enqueue(submission, Some(frame_ex));
        Ok(())
    }

    fn synthesize(&self, _player: PlayerHandle, out: &mut [i16]) -> Result<i32, EngineError> {
        self.require(EntryPoint::Synthesize)?;
        if self.fail_synthesize {
            return Err(EngineError::Rejected(EntryPoint::Synthesize));
        }
        let mut pending = self.pending.borrow_mut();
        let count = out.len().min(pending.len());
        for (slot, sample) in out.iter_mut().zip(pending.drain(..count)) {
            *slot = sample;
        }
        self.log.borrow_mut().push(SynthCall::Synthesize(count));
        Ok(count as i32)
    }

    fn destroy_player(&self, _player: PlayerHandle) -> Result<(), EngineError> {
        self.require(EntryPoint::DestroyPlayer)?;
        self.pending.borrow_mut().clear();
        self.log.borrow_mut().push(SynthCall::DestroyPlayer);
        Ok(())
    }

    fn set_voicing_tone(
        &self,
        _player: PlayerHandle,
        block: &VoicingToneBlock,
    ) -> Result<(), EngineError> {
        self.require(EntryPoint::SetVoicingTone)?;
        self.log.borrow_mut().push(SynthCall::SetVoicingTone(block.kind()));
        Ok(())
    }

    fn dsp_version(&self) -> Result<u32, EngineError> {
        self.require(EntryPoint::GetDspVersion)?;
        Ok(self.dsp_version)
    }

    fn frame_ex_defaults(&self) -> Result<FrameExBlock, EngineError> {
        self.require(EntryPoint::GetFrameExDefaults)?;
        Ok(self.frame_ex_defaults)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrontendCall {
    CreateSession(PathBuf),
    DestroySession,
    SetLanguage(String),
    SetVoiceProfile(String),
    Queue {
        tokens: String,
        punctuation: u8,
        hint_index: i32,
    },
}

pub struct MockFrontend {
    exports: HashSet<EntryPoint>,
    rejected_language: Option<String>,
    failing_token: Option<String>,
    fail_create: bool,
    frame_ex: HashMap<String, FrameExBlock>,
    last_error: RefCell<String>,
    log: Rc<RefCell<Vec<FrontendCall>>>,
}

impl MockFrontend {
    pub fn new() -> Self {
        Self {
            exports: EntryPoint::FRONTEND_CORE
                .into_iter()
                .chain(EntryPoint::FRONTEND_OPTIONAL)
                .collect(),
            rejected_language: None,
            failing_token: None,
            fail_create: false,
            frame_ex: HashMap::new(),
            last_error: RefCell::new(String::new()),
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn without(mut self, entry: EntryPoint) -> Self {
        self.exports.remove(&entry);
        self
    }

    pub fn rejecting_language(mut self, tag: &str) -> Self {
        self.rejected_language = Some(tag.to_string());
        self
    }

    /// Fail the linguistic pass for any clause containing `token`.
    pub fn failing_on(mut self, token: &str) -> Self {
        self.failing_token = Some(token.to_string());
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// Attach a FrameEx override to every frame produced for `token`.
    pub fn with_frame_ex(mut self, token: &str, block: FrameExBlock) -> Self {
        self.frame_ex.insert(token.to_string(), block);
        self
    }

    pub fn log(&self) -> Rc<RefCell<Vec<FrontendCall>>> {
        Rc::clone(&self.log)
    }

    fn frame_for(request: &ClauseRequest<'_>) -> AcousticFrame {
        AcousticFrame {
            voice_pitch: request.base_pitch,
            end_voice_pitch: request.base_pitch,
            voice_amplitude: 1.0,
            cf1: 500.0,
            cf2: 1500.0,
            cb1: 100.0,
            pre_formant_gain: 1.0,
            output_gain: 1.0,
            ..AcousticFrame::default()
        }
    }
}

impl ModuleExports for MockFrontend {
    fn provides(&self, entry: EntryPoint) -> bool {
        self.exports.contains(&entry)
    }
}

impl LinguisticBackend for MockFrontend {
    fn create_session(&self, pack_root: &Path) -> Result<Option<SessionHandle>, EngineError> {
        self.log
            .borrow_mut()
            .push(FrontendCall::CreateSession(pack_root.to_path_buf()));
        if self.fail_create {
            return Ok(None);
        }
        Ok(SessionHandle::from_raw(fake_handle()))
    }

    fn destroy_session(&self, _session: SessionHandle) -> Result<(), EngineError> {
        self.log.borrow_mut().push(FrontendCall::DestroySession);
        Ok(())
    }

    fn set_language(&self, _session: SessionHandle, tag: &str) -> Result<bool, EngineError> {
        self.log
            .borrow_mut()
            .push(FrontendCall::SetLanguage(tag.to_string()));
        if self.rejected_language.as_deref() == Some(tag) {
            *self.last_error.borrow_mut() = format!("no language pack for {tag}");
            return Ok(false);
        }
        Ok(true)
    }

    fn set_voice_profile(&self, _session: SessionHandle, name: &str) -> Result<bool, EngineError> {
        if !self.exports.contains(&EntryPoint::SetVoiceProfile) {
            return Err(EngineError::Unsupported(EntryPoint::SetVoiceProfile));
        }
        self.log
            .borrow_mut()
            .push(FrontendCall::SetVoiceProfile(name.to_string()));
        Ok(true)
    }

    fn queue_tokens(
        &self,
        _session: SessionHandle,
        request: &ClauseRequest<'_>,
    ) -> Result<Vec<FrameEvent>, EngineError> {
        self.log.borrow_mut().push(FrontendCall::Queue {
            tokens: request.tokens.to_string(),
            punctuation: request.clause_punctuation,
            hint_index: request.hint_index,
        });

        if let Some(bad) = &self.failing_token {
            if request.tokens.split_whitespace().any(|t| t == bad) {
                *self.last_error.borrow_mut() = format!("unknown phoneme '{bad}'");
                return Err(EngineError::Rejected(EntryPoint::QueueTokens));
            }
        }

        Ok(request
            .tokens
            .split_whitespace()
            .map(|token| FrameEvent {
                frame: (token != "_").then(|| Self::frame_for(request)),
                frame_ex: self.frame_ex.get(token).copied(),
                duration_ms: TOKEN_MS,
                fade_ms: TOKEN_MS / 2.0,
                ordinal: request.hint_index,
            })
            .collect())
    }

    fn last_error(&self, _session: SessionHandle) -> Result<String, EngineError> {
        Ok(self.last_error.borrow().clone())
    }
}
