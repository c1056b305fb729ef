//! Renders one utterance through a fresh synthesis player.
//!
//! The driver moves through `Created → SessionBound → Streaming → Drained`,
//! or to `Failed` from any step. The player is released when the driver
//! drains, fails, or is dropped, whichever comes first.

use super::backend::{ClauseRequest, FrameSubmission, PlayerHandle, SessionHandle, SynthBackend};
use super::capabilities::EngineHandle;
use super::clauses::{pause_ms, prosody_byte, ClauseChunk};
use super::error::{EngineError, SynthesisError};
use super::frame::{apply_settings, AcousticFrame};
use super::frame_ex::{self, FrameExBlock};
use super::session::last_error_or;
use super::settings::SpeechSettings;
use super::tone::VoicingTone;

/// Samples requested per pull from the engine.
pub const PULL_BLOCK_SAMPLES: usize = 8192;

/// Fade applied to inserted pauses.
const PAUSE_FADE_MS: f64 = 10.0;

/// Convert milliseconds to a sample count: at least one sample, rounded,
/// saturating at `u32::MAX`.
pub fn ms_to_samples(ms: f64, sample_rate: u32) -> u32 {
    // Float-to-int casts saturate and map NaN to 0.
    let samples = (ms / 1000.0 * f64::from(sample_rate)).round() as u32;
    samples.max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Created,
    SessionBound,
    Streaming,
    Drained,
    Failed,
}

/// Destroys the player when dropped.
struct PlayerGuard<'a> {
    synth: &'a dyn SynthBackend,
    handle: PlayerHandle,
}

impl Drop for PlayerGuard<'_> {
    fn drop(&mut self) {
        log::trace!("Destroying synthesis player");
        if let Err(e) = self.synth.destroy_player(self.handle) {
            log::warn!("Failed to destroy synthesis player: {e}");
        }
    }
}

pub struct SynthesisDriver<'a> {
    engine: &'a EngineHandle,
    sample_rate: u32,
    state: DriverState,
    player: Option<PlayerGuard<'a>>,
    user_frame_ex: FrameExBlock,
    last_frame_ex: Option<FrameExBlock>,
    reset_pending: bool,
    last_ordinal: i32,
}

impl<'a> SynthesisDriver<'a> {
    pub fn new(engine: &'a EngineHandle, sample_rate: u32) -> Self {
        Self {
            engine,
            sample_rate,
            state: DriverState::Created,
            player: None,
            user_frame_ex: FrameExBlock::NEUTRAL,
            last_frame_ex: None,
            reset_pending: true,
            last_ordinal: 0,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Acquire the player and apply the per-call voice configuration: at
    /// most one voicing-tone write and the user FrameEx block.
    pub fn bind(&mut self, settings: &SpeechSettings) -> Result<(), SynthesisError> {
        let engine = self.engine;
        let synth = engine.synth();

        let handle = match synth.create_player(self.sample_rate) {
            Ok(Some(handle)) => handle,
            Ok(None) => return Err(self.abort(SynthesisError::EngineInit)),
            Err(e) => {
                log::warn!("Player creation failed: {e}");
                return Err(self.abort(SynthesisError::EngineInit));
            }
        };
        self.player = Some(PlayerGuard { synth, handle });

        if let Some(tone) = VoicingTone::from_settings(&settings.voicing_tone_sliders) {
            match engine.voicing_tone_block(&tone) {
                Some(block) => {
                    log::debug!("Writing {:?} voicing tone block", block.kind());
                    if let Err(e) = synth.set_voicing_tone(handle, &block) {
                        log::warn!("Voicing tone not applied: {e}");
                    }
                }
                None => log::debug!("Voicing tone configured but not supported by the engine"),
            }
        }

        let base = if engine.capabilities().has_frame_ex_defaults() {
            synth.frame_ex_defaults().unwrap_or_else(|e| {
                log::warn!("Engine FrameEx defaults unavailable: {e}");
                FrameExBlock::NEUTRAL
            })
        } else {
            FrameExBlock::NEUTRAL
        };
        self.user_frame_ex = frame_ex::build_defaults_from(base, &settings.frame_ex_sliders);

        self.state = DriverState::SessionBound;
        Ok(())
    }

    /// Run every clause through the linguistic engine and submit the frames
    /// it produces, with pauses between clauses.
    pub fn stream_clauses(
        &mut self,
        session: SessionHandle,
        chunks: &[ClauseChunk<'_>],
        settings: &SpeechSettings,
    ) -> Result<(), SynthesisError> {
        self.state = DriverState::Streaming;
        let result = self.stream_inner(session, chunks, settings);
        result.map_err(|e| self.abort(e))
    }

    fn stream_inner(
        &mut self,
        session: SessionHandle,
        chunks: &[ClauseChunk<'_>],
        settings: &SpeechSettings,
    ) -> Result<(), SynthesisError> {
        let engine = self.engine;
        let frontend = engine.frontend();
        let (speed, base_pitch, inflection) = (
            settings.speed(),
            settings.base_pitch(),
            settings.inflection_scale(),
        );

        for (index, chunk) in chunks.iter().enumerate() {
            let tokens = chunk.text();
            let request = ClauseRequest {
                tokens: &tokens,
                speed,
                base_pitch,
                inflection,
                clause_punctuation: prosody_byte(chunk.punctuation),
                hint_index: index as i32,
            };

            let events = match frontend.queue_tokens(session, &request) {
                Ok(events) => events,
                Err(EngineError::Rejected(_)) => {
                    let message = last_error_or(frontend, session, "clause rejected");
                    return Err(SynthesisError::Linguistic(message));
                }
                Err(e) => return Err(SynthesisError::Linguistic(e.to_string())),
            };
            log::trace!("Clause {index} produced {} frame(s)", events.len());

            for event in events {
                let frame = event.frame.map(|mut frame| {
                    apply_settings(&mut frame, settings);
                    frame
                });
                self.submit(
                    frame.as_ref(),
                    Some(frame_ex::mix(&self.user_frame_ex, event.frame_ex.as_ref())),
                    event.duration_ms,
                    event.fade_ms,
                    event.ordinal,
                )?;
            }

            if index + 1 < chunks.len() {
                let pause = pause_ms(chunk.punctuation, settings.pause_mode);
                if pause > 0 {
                    self.submit_pause(f64::from(pause))?;
                }
            }
        }
        Ok(())
    }

    /// Submit one frame whose settings are already applied, mixing
    /// `overrides` into the user FrameEx block.
    pub fn submit_frame(
        &mut self,
        frame: Option<&AcousticFrame>,
        overrides: Option<&FrameExBlock>,
        duration_ms: f64,
        fade_ms: f64,
    ) -> Result<(), SynthesisError> {
        self.state = DriverState::Streaming;
        let block = frame_ex::mix(&self.user_frame_ex, overrides);
        let ordinal = self.last_ordinal;
        self.submit(frame, Some(block), duration_ms, fade_ms, ordinal)
            .map_err(|e| self.abort(e))
    }

    /// Silence carrying the last FrameEx block so voice quality does not
    /// jump across the pause.
    fn submit_pause(&mut self, duration_ms: f64) -> Result<(), SynthesisError> {
        log::trace!("Inserting {duration_ms} ms pause");
        self.submit(
            None,
            self.last_frame_ex,
            duration_ms,
            PAUSE_FADE_MS.min(duration_ms),
            self.last_ordinal,
        )
    }

    fn submit(
        &mut self,
        frame: Option<&AcousticFrame>,
        frame_ex: Option<FrameExBlock>,
        duration_ms: f64,
        fade_ms: f64,
        ordinal: i32,
    ) -> Result<(), SynthesisError> {
        let player = self.player_handle()?;
        let synth = self.engine.synth();

        let submission = FrameSubmission {
            frame,
            duration_samples: ms_to_samples(duration_ms, self.sample_rate),
            fade_samples: ms_to_samples(fade_ms, self.sample_rate),
            ordinal,
            reset: self.reset_pending,
        };

        let extended = frame_ex.filter(|block| {
            self.engine.capabilities().has_extended_frame_submission()
                && (block.has_effect() || block.has_glide_targets())
        });
        match &extended {
            Some(block) => synth.queue_frame_ex(player, &submission, block)?,
            None => synth.queue_frame(player, &submission)?,
        }
        log::trace!(
            "Queued {} frame: {} samples, fade {}, ordinal {ordinal}, extended {}",
            if frame.is_some() { "voiced" } else { "silence" },
            submission.duration_samples,
            submission.fade_samples,
            extended.is_some()
        );

        self.reset_pending = false;
        self.last_frame_ex = extended;
        self.last_ordinal = ordinal;
        Ok(())
    }

    /// Pull every remaining sample, then release the player.
    pub fn drain(&mut self) -> Result<Vec<i16>, SynthesisError> {
        let player = self.player_handle()?;
        let synth = self.engine.synth();

        let mut samples = Vec::new();
        let mut block = vec![0i16; PULL_BLOCK_SAMPLES];
        let outcome = loop {
            match synth.synthesize(player, &mut block) {
                Ok(count) if count <= 0 => break Ok(()),
                Ok(count) => {
                    let count = (count as usize).min(block.len());
                    samples.extend_from_slice(&block[..count]);
                    if count < block.len() {
                        break Ok(());
                    }
                }
                Err(e) => break Err(e),
            }
        };
        self.player = None;

        match outcome {
            Ok(()) => {
                self.state = DriverState::Drained;
                log::debug!(
                    "Rendered {} samples ({:.2}s)",
                    samples.len(),
                    samples.len() as f64 / f64::from(self.sample_rate)
                );
                Ok(samples)
            }
            Err(e) => Err(self.abort(e.into())),
        }
    }

    fn player_handle(&self) -> Result<PlayerHandle, SynthesisError> {
        self.player
            .as_ref()
            .map(|guard| guard.handle)
            .ok_or(SynthesisError::EngineInit)
    }

    /// Release the player and mark the call failed.
    fn abort(&mut self, error: SynthesisError) -> SynthesisError {
        log::debug!("Synthesis aborted: {error}");
        self.player = None;
        self.state = DriverState::Failed;
        error
    }
}

/// Bind, stream every clause and drain, in one call.
pub fn render(
    engine: &EngineHandle,
    session: SessionHandle,
    chunks: &[ClauseChunk<'_>],
    settings: &SpeechSettings,
    sample_rate: u32,
) -> Result<Vec<i16>, SynthesisError> {
    let mut driver = SynthesisDriver::new(engine, sample_rate);
    driver.bind(settings)?;
    driver.stream_clauses(session, chunks, settings)?;
    driver.drain()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::formant::backend::EntryPoint;
    use crate::engines::formant::capabilities::ToneLayoutKind;
    use crate::engines::formant::clauses::split_clauses;
    use crate::engines::formant::settings::PauseMode;
    use crate::engines::formant::testing::{
        queued, FrontendCall, MockFrontend, MockSynth, SynthCall, VOICED_SAMPLE,
    };
    use pretty_assertions::assert_eq;
    use std::path::Path;

    const RATE: u32 = 16_000;

    fn engine(synth: MockSynth, frontend: MockFrontend) -> EngineHandle {
        EngineHandle::from_backends(Box::new(synth), Box::new(frontend))
            .expect("core entry points present")
    }

    fn render_stream(
        engine: &mut EngineHandle,
        stream: &str,
        settings: &SpeechSettings,
    ) -> Result<Vec<i16>, SynthesisError> {
        let session = engine.ensure_session(Some(Path::new("/packs")), &settings.language)?;
        let chunks = split_clauses(stream);
        render(engine, session, &chunks, settings, RATE)
    }

    fn zero_runs(samples: &[i16]) -> Vec<usize> {
        samples
            .split(|&s| s != 0)
            .map(<[i16]>::len)
            .filter(|&len| len > 0)
            .collect()
    }

    #[test]
    fn ms_to_samples_rounds_and_floors_at_one() {
        assert_eq!(ms_to_samples(30.0, 16_000), 480);
        assert_eq!(ms_to_samples(10.0, 22_050), 221);
        assert_eq!(ms_to_samples(0.0, 22_050), 1);
        assert_eq!(ms_to_samples(f64::NAN, 22_050), 1);
        assert_eq!(ms_to_samples(1e18, 48_000), u32::MAX);
    }

    #[test]
    fn sentence_pause_is_exact_silence_between_clauses() {
        let mut handle = engine(MockSynth::new(), MockFrontend::new());
        let settings = SpeechSettings {
            pause_mode: PauseMode::Short,
            ..SpeechSettings::default()
        };

        let samples = render_stream(&mut handle, "h ə . l oʊ", &settings).expect("render");

        let token = ms_to_samples(10.0, RATE) as usize;
        assert_eq!(samples.len(), 4 * token + 480);
        assert_eq!(zero_runs(&samples), vec![480]);
        assert!(samples[..2 * token].iter().all(|&s| s == VOICED_SAMPLE));
        assert!(samples[2 * token + 480..].iter().all(|&s| s == VOICED_SAMPLE));
    }

    #[test]
    fn no_pause_after_final_clause_or_with_pauses_off() {
        let mut handle = engine(MockSynth::new(), MockFrontend::new());
        let off = SpeechSettings {
            pause_mode: PauseMode::Off,
            ..SpeechSettings::default()
        };
        let samples = render_stream(&mut handle, "h ə . l oʊ .", &off).expect("render");
        assert!(zero_runs(&samples).is_empty());

        let long = SpeechSettings {
            pause_mode: PauseMode::Long,
            ..SpeechSettings::default()
        };
        let samples = render_stream(&mut handle, "a , b", &long).expect("render");
        assert_eq!(zero_runs(&samples), vec![ms_to_samples(6.0, RATE) as usize]);
    }

    #[test]
    fn clauses_carry_prosody_and_ordinals() {
        let frontend = MockFrontend::new();
        let log = frontend.log();
        let mut handle = engine(MockSynth::new(), frontend);

        render_stream(&mut handle, "w ʌ t ? n oʊ", &SpeechSettings::default()).expect("render");

        let queued: Vec<FrontendCall> = log
            .borrow()
            .iter()
            .filter(|c| matches!(c, FrontendCall::Queue { .. }))
            .cloned()
            .collect();
        assert_eq!(
            queued,
            vec![
                FrontendCall::Queue {
                    tokens: "w ʌ t".to_string(),
                    punctuation: b'?',
                    hint_index: 0,
                },
                FrontendCall::Queue {
                    tokens: "n oʊ".to_string(),
                    punctuation: b'.',
                    hint_index: 1,
                },
            ]
        );
    }

    #[test]
    fn reset_is_requested_on_first_submission_only() {
        let synth = MockSynth::new();
        let log = synth.log();
        let mut handle = engine(synth, MockFrontend::new());

        render_stream(&mut handle, "a b . c", &SpeechSettings::default()).expect("render");

        let resets: Vec<bool> = queued(&log.borrow()).iter().map(|q| q.reset).collect();
        assert_eq!(resets, vec![true, false, false, false]);
    }

    #[test]
    fn linguistic_failure_releases_the_player() {
        let synth = MockSynth::new();
        let log = synth.log();
        let mut handle = engine(synth, MockFrontend::new().failing_on("ʘ"));

        let result = render_stream(&mut handle, "a . ʘ", &SpeechSettings::default());

        match result {
            Err(SynthesisError::Linguistic(message)) => {
                assert_eq!(message, "unknown phoneme 'ʘ'");
            }
            other => panic!("expected Linguistic error, got {other:?}"),
        }
        assert_eq!(log.borrow().last(), Some(&SynthCall::DestroyPlayer));
    }

    #[test]
    fn player_creation_failure_is_engine_init() {
        let mut handle = engine(MockSynth::new().failing_create(), MockFrontend::new());
        assert!(matches!(
            render_stream(&mut handle, "a", &SpeechSettings::default()),
            Err(SynthesisError::EngineInit)
        ));
    }

    #[test]
    fn player_is_destroyed_after_success() {
        let synth = MockSynth::new();
        let log = synth.log();
        let mut handle = engine(synth, MockFrontend::new());

        render_stream(&mut handle, "a", &SpeechSettings::default()).expect("render");

        let calls = log.borrow();
        assert_eq!(calls.first(), Some(&SynthCall::CreatePlayer(RATE)));
        assert_eq!(calls.last(), Some(&SynthCall::DestroyPlayer));
        assert_eq!(
            calls.iter().filter(|c| **c == SynthCall::DestroyPlayer).count(),
            1
        );
    }

    #[test]
    fn neutral_voice_quality_uses_base_submission() {
        let synth = MockSynth::new();
        let log = synth.log();
        let mut handle = engine(synth, MockFrontend::new());

        render_stream(&mut handle, "a b", &SpeechSettings::default()).expect("render");

        assert!(queued(&log.borrow()).iter().all(|q| q.frame_ex.is_none()));
    }

    #[test]
    fn active_voice_quality_uses_extended_submission() {
        let synth = MockSynth::new();
        let log = synth.log();
        let mut handle = engine(synth, MockFrontend::new());
        let settings = SpeechSettings {
            frame_ex_sliders: vec![0.0, 40.0, 0.0, 0.0, 50.0],
            pause_mode: PauseMode::Long,
            ..SpeechSettings::default()
        };

        render_stream(&mut handle, "a . b", &settings).expect("render");

        let frames = queued(&log.borrow());
        assert_eq!(frames.len(), 3);
        for q in &frames {
            let block = q.frame_ex.expect("extended path");
            assert!((block.breathiness - 0.4).abs() < 1e-12);
        }
        assert_eq!(frames[1].frame, None);
        assert_eq!(frames[1].duration, ms_to_samples(50.0, RATE));
        assert_eq!(frames[1].fade, ms_to_samples(10.0, RATE));
    }

    #[test]
    fn without_extended_entry_point_everything_is_base() {
        let synth = MockSynth::new().without(EntryPoint::QueueFrameEx);
        let log = synth.log();
        let mut handle = engine(synth, MockFrontend::new());
        let settings = SpeechSettings {
            frame_ex_sliders: vec![100.0, 100.0, 100.0, 100.0, 100.0],
            ..SpeechSettings::default()
        };

        render_stream(&mut handle, "a b", &settings).expect("render");

        let frames = queued(&log.borrow());
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|q| q.frame_ex.is_none()));
    }

    #[test]
    fn phoneme_overrides_mix_into_user_block() {
        let creaky = FrameExBlock {
            creakiness: 0.3,
            end_cf1: 700.0,
            ..FrameExBlock::NEUTRAL
        };
        let synth = MockSynth::new();
        let log = synth.log();
        let mut handle = engine(synth, MockFrontend::new().with_frame_ex("ʔ", creaky));
        let settings = SpeechSettings {
            frame_ex_sliders: vec![20.0, 0.0, 0.0, 0.0, 50.0],
            ..SpeechSettings::default()
        };

        render_stream(&mut handle, "a ʔ", &settings).expect("render");

        let frames = queued(&log.borrow());
        let plain = frames[0].frame_ex.expect("extended");
        let glottal = frames[1].frame_ex.expect("extended");
        assert!((plain.creakiness - 0.2).abs() < 1e-12);
        assert!((glottal.creakiness - 0.5).abs() < 1e-12);
        assert_eq!(glottal.end_cf1, 700.0);
        assert_eq!(plain.end_cf1, 0.0);
    }

    #[test]
    fn engine_defaults_seed_the_user_block() {
        let mut seeded = FrameExBlock::NEUTRAL;
        seeded.intonation.phrase_amplitude = 0.25;
        let synth = MockSynth::new().with_frame_ex_defaults(seeded);
        let log = synth.log();
        let mut handle = engine(synth, MockFrontend::new());
        let settings = SpeechSettings {
            frame_ex_sliders: vec![0.0, 0.0, 10.0, 0.0, 50.0],
            ..SpeechSettings::default()
        };

        render_stream(&mut handle, "a", &settings).expect("render");

        let block = queued(&log.borrow())[0].frame_ex.expect("extended");
        assert_eq!(block.intonation.phrase_amplitude, 0.25);
    }

    #[test]
    fn settings_shape_submitted_frames() {
        let synth = MockSynth::new();
        let log = synth.log();
        let mut handle = engine(synth, MockFrontend::new());
        let settings = SpeechSettings {
            volume: 150.0,
            pitch: 50.0,
            ..SpeechSettings::default()
        };

        render_stream(&mut handle, "a", &settings).expect("render");

        let frame = queued(&log.borrow())[0].frame.expect("voiced");
        assert_eq!(frame.voice_pitch, 110.0);
        // Volume is clamped to 100, so the gain is 100/75.
        assert!((frame.pre_formant_gain - 100.0 / 75.0).abs() < 1e-12);
        // Default preset widens the first cascade bandwidth.
        assert!((frame.cb1 - 130.0).abs() < 1e-9);
    }

    #[test]
    fn tone_is_written_once_in_detected_layout() {
        let synth = MockSynth::new().with_dsp_version(5);
        let log = synth.log();
        let mut handle = engine(synth, MockFrontend::new());
        let mut sliders = crate::engines::formant::tone::NEUTRAL_TONE_SLIDERS.to_vec();
        sliders[3] = 80.0;
        let settings = SpeechSettings {
            voicing_tone_sliders: sliders,
            ..SpeechSettings::default()
        };

        render_stream(&mut handle, "a . b", &settings).expect("render");

        let tones: Vec<SynthCall> = log
            .borrow()
            .iter()
            .filter(|c| matches!(c, SynthCall::SetVoicingTone(_)))
            .cloned()
            .collect();
        assert_eq!(tones, vec![SynthCall::SetVoicingTone(ToneLayoutKind::Headered10)]);
    }

    #[test]
    fn neutral_tone_is_never_written() {
        let synth = MockSynth::new();
        let log = synth.log();
        let mut handle = engine(synth, MockFrontend::new());

        render_stream(&mut handle, "a", &SpeechSettings::default()).expect("render");

        assert!(!log
            .borrow()
            .iter()
            .any(|c| matches!(c, SynthCall::SetVoicingTone(_))));
    }

    #[test]
    fn driver_states() {
        let handle = engine(MockSynth::new(), MockFrontend::new());
        let mut driver = SynthesisDriver::new(&handle, RATE);
        assert_eq!(driver.state(), DriverState::Created);

        driver.bind(&SpeechSettings::default()).expect("bind");
        assert_eq!(driver.state(), DriverState::SessionBound);

        let frame = AcousticFrame::preview_default();
        driver.submit_frame(Some(&frame), None, 5.0, 1.0).expect("submit");
        assert_eq!(driver.state(), DriverState::Streaming);

        let samples = driver.drain().expect("drain");
        assert_eq!(samples.len(), 80);
        assert_eq!(driver.state(), DriverState::Drained);

        assert!(matches!(driver.drain(), Err(SynthesisError::EngineInit)));
    }

    #[test]
    fn long_output_spans_several_pulls() {
        let synth = MockSynth::new();
        let log = synth.log();
        let handle = engine(synth, MockFrontend::new());
        let mut driver = SynthesisDriver::new(&handle, RATE);
        driver.bind(&SpeechSettings::default()).expect("bind");

        let frame = AcousticFrame::preview_default();
        driver.submit_frame(Some(&frame), None, 1100.0, 10.0).expect("submit");
        let samples = driver.drain().expect("drain");

        assert_eq!(samples.len(), 17_600);
        let pulls: Vec<usize> = log
            .borrow()
            .iter()
            .filter_map(|c| match c {
                SynthCall::Synthesize(n) => Some(*n),
                _ => None,
            })
            .collect();
        assert_eq!(pulls, vec![8192, 8192, 1216]);
    }

    fn pulls(log: &[SynthCall]) -> Vec<usize> {
        log.iter()
            .filter_map(|c| match c {
                SynthCall::Synthesize(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn exact_block_multiple_ends_on_empty_pull() {
        let synth = MockSynth::new();
        let log = synth.log();
        let handle = engine(synth, MockFrontend::new());
        let mut driver = SynthesisDriver::new(&handle, RATE);
        driver.bind(&SpeechSettings::default()).expect("bind");

        let frame = AcousticFrame::preview_default();
        driver.submit_frame(Some(&frame), None, 512.0, 10.0).expect("submit");
        let samples = driver.drain().expect("drain");

        assert_eq!(samples.len(), PULL_BLOCK_SAMPLES);
        assert_eq!(pulls(&log.borrow()), vec![PULL_BLOCK_SAMPLES, 0]);
        assert_eq!(driver.state(), DriverState::Drained);
    }

    #[test]
    fn failed_pull_releases_the_player() {
        let synth = MockSynth::new().failing_synthesize();
        let log = synth.log();
        let handle = engine(synth, MockFrontend::new());
        let mut driver = SynthesisDriver::new(&handle, RATE);
        driver.bind(&SpeechSettings::default()).expect("bind");

        let frame = AcousticFrame::preview_default();
        driver.submit_frame(Some(&frame), None, 100.0, 10.0).expect("submit");
        let err = driver.drain().expect_err("pull fails");

        assert!(matches!(
            err,
            SynthesisError::Engine(EngineError::Rejected(EntryPoint::Synthesize))
        ));
        assert_eq!(driver.state(), DriverState::Failed);
        drop(driver);
        let destroyed = log
            .borrow()
            .iter()
            .filter(|c| matches!(c, SynthCall::DestroyPlayer))
            .count();
        assert_eq!(destroyed, 1);
    }
}
