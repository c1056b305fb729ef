//! Speech synthesis engines.
//!
//! # Available Engines
//!
//! - `formant` - bridge to an external formant synthesizer. Loading the
//!   engine from shared libraries requires the `native` feature.

pub mod formant;
