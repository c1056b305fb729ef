use std::path::PathBuf;
use std::time::Instant;

use formant_bridge::{
    engines::formant::{
        FormantEngine, FormantModelParams, PauseMode, SpeechSettings, VoiceSelection,
    },
    SynthesisEngine,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let synth_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("engine/libspeechPlayer.so"));
    let pack_root = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("engine/packs"));

    let mut engine = FormantEngine::new();

    let load_start = Instant::now();
    engine.load_model_with_params(
        &synth_path,
        FormantModelParams {
            pack_root: Some(pack_root),
            ..Default::default()
        },
    )?;
    println!("Engine loaded in {:.2?}", load_start.elapsed());
    println!("Capabilities: {:?}", engine.capabilities());
    println!("Available voices: {:?}", engine.list_voices());

    let tokens = "h ə l oʊ , ð ɪ s ɪ z ə f ɔ ɹ m ə n t s ɪ n θ ə s aɪ z ɚ . \
                  k ə n j u h ɪ ɹ m i ?";

    let settings = SpeechSettings::builder()
        .voice(VoiceSelection::Preset("Benjamin".to_string()))
        .rate(55.0)
        .pause_mode(PauseMode::Long)
        .build()?;
    println!("Settings: {}", serde_json::to_string(&settings)?);

    let synth_start = Instant::now();
    let result = engine.synthesize(tokens, Some(settings.clone()))?;
    let synth_dur = synth_start.elapsed();

    let audio_duration = result.duration_secs();
    let speedup = audio_duration / synth_dur.as_secs_f64();
    println!(
        "Synthesized {:.2}s audio in {:.2?} ({:.1}x real-time)",
        audio_duration, synth_dur, speedup
    );

    engine.synthesize_to_file(tokens, &PathBuf::from("output.wav"), Some(settings.clone()))?;
    println!("Saved to output.wav");

    let vowel = serde_json::json!({
        "_isVowel": true,
        "voiceAmplitude": 1.0,
        "cf1": 730, "cf2": 1090, "cf3": 2440,
        "cb1": 60, "cb2": 90, "cb3": 120,
        "breathiness": 0.2
    });
    if let Some(map) = vowel.as_object() {
        let preview = engine.preview_phoneme(map, &settings)?;
        preview.write_wav(&PathBuf::from("preview.wav"))?;
        println!("Saved {:.2}s phoneme preview to preview.wav", preview.duration_secs());
    }

    engine.unload_model();
    Ok(())
}
