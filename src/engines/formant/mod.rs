//! Bridge to an external formant synthesis engine.
//!
//! Two engine modules cooperate: a linguistic module that turns phonetic
//! tokens into timed acoustic frames, and a synthesis module that renders
//! frames to 16-bit PCM. The bridge loads both, works out which optional
//! features the installed versions support, shapes every frame with the
//! caller's voice settings, and drains the result into one buffer.
//!
//! # Module Layout
//!
//! ```text
//! engine/
//! ├── libspeechPlayer.so      # synthesis module (path given to load_model)
//! ├── libnvspFrontend.so      # linguistic module (found beside it by default)
//! └── packs/                  # phoneme and language packs (pack_root)
//! ```
//!
//! Library prefix and suffix follow the platform (`speechPlayer.dll` on
//! Windows). Loading from shared libraries needs the `native` feature.
//!
//! # Optional Engine Features
//!
//! | Feature | Entry point | Without it |
//! |---|---|---|
//! | Voice-quality block (FrameEx) | `speechPlayer_queueFrameEx` | frames go through the base path |
//! | Voicing tone, headered layouts | `speechPlayer_setVoicingTone` + `speechPlayer_getDspVersion` | legacy 7-field layout |
//! | Voicing tone, legacy layout | `speechPlayer_setVoicingTone` | tone sliders are ignored |
//! | Engine FrameEx defaults | `speechPlayer_getFrameExDefaults` | neutral defaults |
//! | Voice profiles | `nvspFrontend_setVoiceProfile` | profile voices log a warning |
//!
//! # Token Streams
//!
//! Input is whitespace-separated phonetic tokens. The tokens `.` `!` `?`
//! `,` `:` `;` and `...` end a clause; everything else is phonetic content.
//!
//! # Examples
//!
//! ```rust,no_run
//! use formant_bridge::SynthesisEngine;
//! use formant_bridge::engines::formant::{
//!     FormantEngine, FormantModelParams, PauseMode, SpeechSettings, VoiceSelection,
//! };
//! use std::path::PathBuf;
//!
//! let mut engine = FormantEngine::new();
//! engine.load_model_with_params(
//!     &PathBuf::from("engine/libspeechPlayer.so"),
//!     FormantModelParams {
//!         pack_root: Some(PathBuf::from("engine/packs")),
//!         ..Default::default()
//!     },
//! )?;
//!
//! let settings = SpeechSettings::builder()
//!     .voice(VoiceSelection::Preset("Benjamin".to_string()))
//!     .pause_mode(PauseMode::Long)
//!     .build()?;
//!
//! engine.synthesize_to_file("h ə l oʊ . w ɜ l d", &PathBuf::from("out.wav"), Some(settings))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backend;
pub mod capabilities;
pub mod clauses;
pub mod driver;
pub mod engine;
pub mod error;
pub mod frame;
pub mod frame_ex;
#[cfg(feature = "native")]
pub mod native;
pub mod session;
pub mod settings;
pub mod tone;
pub mod voices;

#[cfg(test)]
pub(crate) mod testing;

pub use capabilities::{EngineCapabilities, EngineHandle, VoicingToneTier};
pub use engine::{FormantEngine, FormantModelParams};
pub use error::{EngineError, LoadError, SessionError, SynthesisError};
pub use settings::{PauseMode, SpeechSettings, VoiceSelection};
