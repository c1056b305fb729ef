//! Engine loading and capability classification.
//!
//! Optional entry points never fail a load; they switch capability flags off
//! and every call site consults [`EngineCapabilities`] instead of probing
//! the module again. Capabilities belong to one [`EngineHandle`] and are
//! recomputed whenever modules are loaded.

use std::ffi::c_void;
use std::mem::size_of;
#[cfg(feature = "native")]
use std::path::Path;

use super::backend::{EntryPoint, LinguisticBackend, ModuleExports, SynthBackend};
use super::error::LoadError;
use super::session::SessionSlot;
use super::tone::VoicingTone;

/// First DSP version whose voicing-tone block has 14 fields.
const EXTENDED_TONE_DSP_VERSION: u32 = 6;

/// "VTON", little-endian.
const TONE_MAGIC: u32 = 0x4E4F_5456;

/// Which voicing-tone wire layout the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoicingToneTier {
    /// No tone shaping entry point.
    #[default]
    None,
    /// Headerless 7-field layout.
    V1,
    /// Headered layouts, selected by DSP version.
    V2,
}

/// What the loaded engine can do, computed once per load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineCapabilities {
    extended_frame_submission: bool,
    voicing_tone_tier: VoicingToneTier,
    voice_profile_api: bool,
    frame_ex_defaults: bool,
    dsp_version: Option<u32>,
}

impl EngineCapabilities {
    fn detect(synth: &dyn SynthBackend, frontend: &dyn LinguisticBackend) -> Self {
        let (voicing_tone_tier, dsp_version) = match (
            synth.provides(EntryPoint::SetVoicingTone),
            synth.provides(EntryPoint::GetDspVersion),
        ) {
            (false, _) => (VoicingToneTier::None, None),
            (true, false) => (VoicingToneTier::V1, None),
            (true, true) => match synth.dsp_version() {
                Ok(version) => (VoicingToneTier::V2, Some(version)),
                Err(e) => {
                    log::warn!("DSP version query failed, assuming oldest headered layout: {e}");
                    (VoicingToneTier::V2, None)
                }
            },
        };

        Self {
            extended_frame_submission: synth.provides(EntryPoint::QueueFrameEx),
            voicing_tone_tier,
            voice_profile_api: frontend.provides(EntryPoint::SetVoiceProfile),
            frame_ex_defaults: synth.provides(EntryPoint::GetFrameExDefaults),
            dsp_version,
        }
    }

    pub fn has_extended_frame_submission(&self) -> bool {
        self.extended_frame_submission
    }

    pub fn voicing_tone_tier(&self) -> VoicingToneTier {
        self.voicing_tone_tier
    }

    pub fn has_voice_profile_api(&self) -> bool {
        self.voice_profile_api
    }

    pub fn has_frame_ex_defaults(&self) -> bool {
        self.frame_ex_defaults
    }

    pub fn dsp_version(&self) -> Option<u32> {
        self.dsp_version
    }
}

fn missing(module: &dyn ModuleExports, entries: &[EntryPoint]) -> Vec<EntryPoint> {
    entries
        .iter()
        .copied()
        .filter(|&entry| !module.provides(entry))
        .collect()
}

/// The loaded engine modules, their capabilities, and the linguistic session
/// bound to them.
///
/// Dropping the handle destroys the session before the modules go away.
pub struct EngineHandle {
    sessions: SessionSlot,
    synth: Box<dyn SynthBackend>,
    frontend: Box<dyn LinguisticBackend>,
    capabilities: EngineCapabilities,
}

impl EngineHandle {
    /// Classify already-opened backends.
    ///
    /// Fails with [`LoadError::MissingCore`] if either module lacks an entry
    /// point the bridge cannot work without.
    pub fn from_backends(
        synth: Box<dyn SynthBackend>,
        frontend: Box<dyn LinguisticBackend>,
    ) -> Result<Self, LoadError> {
        let mut absent = missing(synth.as_ref(), &EntryPoint::SYNTH_CORE);
        absent.extend(missing(frontend.as_ref(), &EntryPoint::FRONTEND_CORE));
        if !absent.is_empty() {
            let names: Vec<&str> = absent.iter().map(|e| e.symbol()).collect();
            return Err(LoadError::MissingCore(names.join(", ")));
        }

        for entry in missing(synth.as_ref(), &EntryPoint::SYNTH_OPTIONAL)
            .into_iter()
            .chain(missing(frontend.as_ref(), &EntryPoint::FRONTEND_OPTIONAL))
        {
            log::debug!("{}", LoadError::MissingOptional(entry));
        }

        let capabilities = EngineCapabilities::detect(synth.as_ref(), frontend.as_ref());
        log::debug!("Engine capabilities: {capabilities:?}");

        Ok(Self {
            sessions: SessionSlot::default(),
            synth,
            frontend,
            capabilities,
        })
    }

    /// Open both engine modules from shared libraries.
    #[cfg(feature = "native")]
    pub fn load(synth_path: &Path, frontend_path: &Path) -> Result<Self, LoadError> {
        use super::native::{NativeFrontend, NativeSynth};

        log::info!("Loading synthesis engine from {}", synth_path.display());
        let synth = NativeSynth::open(synth_path)?;
        log::info!("Loading linguistic engine from {}", frontend_path.display());
        let frontend = NativeFrontend::open(frontend_path)?;
        Self::from_backends(Box::new(synth), Box::new(frontend))
    }

    pub fn capabilities(&self) -> &EngineCapabilities {
        &self.capabilities
    }

    pub fn synth(&self) -> &dyn SynthBackend {
        self.synth.as_ref()
    }

    pub fn frontend(&self) -> &dyn LinguisticBackend {
        self.frontend.as_ref()
    }

    pub(super) fn sessions(&self) -> &SessionSlot {
        &self.sessions
    }

    /// Split borrow for session management.
    pub(super) fn sessions_mut(&mut self) -> (&mut SessionSlot, &dyn LinguisticBackend, &EngineCapabilities) {
        (&mut self.sessions, self.frontend.as_ref(), &self.capabilities)
    }

    /// Encode `tone` in the one layout this engine accepts, if any.
    pub fn voicing_tone_block(&self, tone: &VoicingTone) -> Option<VoicingToneBlock> {
        VoicingToneBlock::encode(&self.capabilities, tone)
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.sessions.invalidate(self.frontend.as_ref());
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("capabilities", &self.capabilities)
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

/// Header carried by the versioned layouts.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneHeader {
    pub magic: u32,
    pub struct_size: u32,
    pub struct_version: u32,
    pub dsp_version: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
struct LegacyTone {
    voicing_peak_pos: f64,
    voiced_pre_emph_a: f64,
    voiced_pre_emph_mix: f64,
    high_shelf_gain_db: f64,
    high_shelf_fc_hz: f64,
    high_shelf_q: f64,
    voiced_tilt_db_per_oct: f64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
struct HeaderedTone10 {
    header: ToneHeader,
    base: LegacyTone,
    noise_glottal_mod_depth: f64,
    pitch_sync_f1_delta_hz: f64,
    pitch_sync_b1_delta_hz: f64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
struct HeaderedTone14 {
    header: ToneHeader,
    base: LegacyTone,
    noise_glottal_mod_depth: f64,
    pitch_sync_f1_delta_hz: f64,
    pitch_sync_b1_delta_hz: f64,
    speed_quotient: f64,
    aspiration_tilt_db_per_oct: f64,
    cascade_bw_scale: f64,
    tremor_depth: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ToneLayout {
    Legacy(LegacyTone),
    Headered10(HeaderedTone10),
    Headered14(HeaderedTone14),
}

/// Which wire layout a [`VoicingToneBlock`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneLayoutKind {
    Legacy7,
    Headered10,
    Headered14,
}

/// A voicing-tone block ready for the engine.
///
/// Only [`EngineHandle::voicing_tone_block`] builds one, so the layout always
/// matches what the resolver detected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoicingToneBlock(ToneLayout);

impl VoicingToneBlock {
    fn encode(capabilities: &EngineCapabilities, tone: &VoicingTone) -> Option<Self> {
        let base = LegacyTone {
            voicing_peak_pos: tone.voicing_peak_pos,
            voiced_pre_emph_a: tone.voiced_pre_emph_a,
            voiced_pre_emph_mix: tone.voiced_pre_emph_mix,
            high_shelf_gain_db: tone.high_shelf_gain_db,
            high_shelf_fc_hz: tone.high_shelf_fc_hz,
            high_shelf_q: tone.high_shelf_q,
            voiced_tilt_db_per_oct: tone.voiced_tilt_db_per_oct,
        };

        let layout = match capabilities.voicing_tone_tier {
            VoicingToneTier::None => return None,
            VoicingToneTier::V1 => ToneLayout::Legacy(base),
            VoicingToneTier::V2 => {
                let dsp_version = capabilities.dsp_version.unwrap_or(0);
                if dsp_version >= EXTENDED_TONE_DSP_VERSION {
                    ToneLayout::Headered14(HeaderedTone14 {
                        header: header::<HeaderedTone14>(3, dsp_version),
                        base,
                        noise_glottal_mod_depth: tone.noise_glottal_mod_depth,
                        pitch_sync_f1_delta_hz: tone.pitch_sync_f1_delta_hz,
                        pitch_sync_b1_delta_hz: tone.pitch_sync_b1_delta_hz,
                        speed_quotient: tone.speed_quotient,
                        aspiration_tilt_db_per_oct: tone.aspiration_tilt_db_per_oct,
                        cascade_bw_scale: tone.cascade_bw_scale,
                        tremor_depth: tone.tremor_depth,
                    })
                } else {
                    ToneLayout::Headered10(HeaderedTone10 {
                        header: header::<HeaderedTone10>(2, dsp_version),
                        base,
                        noise_glottal_mod_depth: tone.noise_glottal_mod_depth,
                        pitch_sync_f1_delta_hz: tone.pitch_sync_f1_delta_hz,
                        pitch_sync_b1_delta_hz: tone.pitch_sync_b1_delta_hz,
                    })
                }
            }
        };
        Some(Self(layout))
    }

    pub fn kind(&self) -> ToneLayoutKind {
        match self.0 {
            ToneLayout::Legacy(_) => ToneLayoutKind::Legacy7,
            ToneLayout::Headered10(_) => ToneLayoutKind::Headered10,
            ToneLayout::Headered14(_) => ToneLayoutKind::Headered14,
        }
    }

    pub fn field_count(&self) -> usize {
        match self.kind() {
            ToneLayoutKind::Legacy7 => 7,
            ToneLayoutKind::Headered10 => 10,
            ToneLayoutKind::Headered14 => 14,
        }
    }

    pub fn header(&self) -> Option<ToneHeader> {
        match &self.0 {
            ToneLayout::Legacy(_) => None,
            ToneLayout::Headered10(block) => Some(block.header),
            ToneLayout::Headered14(block) => Some(block.header),
        }
    }

    pub fn size_bytes(&self) -> usize {
        match self.0 {
            ToneLayout::Legacy(_) => size_of::<LegacyTone>(),
            ToneLayout::Headered10(_) => size_of::<HeaderedTone10>(),
            ToneLayout::Headered14(_) => size_of::<HeaderedTone14>(),
        }
    }

    /// Pointer to the encoded block, valid while `self` is borrowed.
    pub fn as_ptr(&self) -> *const c_void {
        match &self.0 {
            ToneLayout::Legacy(block) => (block as *const LegacyTone).cast(),
            ToneLayout::Headered10(block) => (block as *const HeaderedTone10).cast(),
            ToneLayout::Headered14(block) => (block as *const HeaderedTone14).cast(),
        }
    }
}

fn header<T>(struct_version: u32, dsp_version: u32) -> ToneHeader {
    ToneHeader {
        magic: TONE_MAGIC,
        struct_size: size_of::<T>() as u32,
        struct_version,
        dsp_version,
    }
}
