use super::settings::PauseMode;

/// A punctuation token that ends a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClausePunctuation {
    Period,
    Exclamation,
    Question,
    Comma,
    Colon,
    Semicolon,
    Ellipsis,
}

impl ClausePunctuation {
    /// Recognise a whole token as a clause marker.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "." => Some(Self::Period),
            "!" => Some(Self::Exclamation),
            "?" => Some(Self::Question),
            "," => Some(Self::Comma),
            ":" => Some(Self::Colon),
            ";" => Some(Self::Semicolon),
            "..." => Some(Self::Ellipsis),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::Period => ".",
            Self::Exclamation => "!",
            Self::Question => "?",
            Self::Comma => ",",
            Self::Colon => ":",
            Self::Semicolon => ";",
            Self::Ellipsis => "...",
        }
    }

    /// Ellipsis behaves as a full stop for pauses and prosody.
    pub fn normalized(self) -> Self {
        match self {
            Self::Ellipsis => Self::Period,
            other => other,
        }
    }
}

/// Clause-type byte handed to the linguistic engine.
///
/// The final, unterminated clause is spoken as a statement.
pub fn prosody_byte(punctuation: Option<ClausePunctuation>) -> u8 {
    match punctuation.map(ClausePunctuation::normalized) {
        None | Some(ClausePunctuation::Period | ClausePunctuation::Ellipsis) => b'.',
        Some(ClausePunctuation::Exclamation) => b'!',
        Some(ClausePunctuation::Question) => b'?',
        Some(ClausePunctuation::Comma | ClausePunctuation::Colon | ClausePunctuation::Semicolon) => {
            b','
        }
    }
}

/// Silence in milliseconds after a clause ending in `punctuation`.
pub fn pause_ms(punctuation: Option<ClausePunctuation>, mode: PauseMode) -> u32 {
    let Some(punctuation) = punctuation.map(ClausePunctuation::normalized) else {
        return 0;
    };
    match (punctuation, mode) {
        (_, PauseMode::Off) => 0,
        (ClausePunctuation::Comma, PauseMode::Short) => 0,
        (ClausePunctuation::Comma, PauseMode::Long) => 6,
        (_, PauseMode::Short) => 30,
        (_, PauseMode::Long) => 50,
    }
}

/// A run of phonetic tokens and the marker that ended it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseChunk<'a> {
    pub tokens: Vec<&'a str>,
    pub punctuation: Option<ClausePunctuation>,
}

impl ClauseChunk<'_> {
    /// Tokens joined by single spaces, as the linguistic engine takes them.
    pub fn text(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Split a whitespace-delimited token stream into clauses.
///
/// Markers are dropped from the content. A marker with nothing before it
/// replaces the terminator of the previous chunk, so a run of markers ends
/// on its last member; a leading marker is dropped. The last marker of a run
/// is the one closest to the next clause, so it decides the prosody and the
/// pause (`a , . b` ends `a` with a sentence pause, not a comma).
///
/// A stream with no phonetic tokens, blank or markers only, yields no
/// chunks rather than one empty clause; callers treat that as nothing to
/// render.
pub fn split_clauses(stream: &str) -> Vec<ClauseChunk<'_>> {
    let mut chunks: Vec<ClauseChunk<'_>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for token in stream.split_whitespace() {
        match ClausePunctuation::from_token(token) {
            Some(marker) if current.is_empty() => {
                if let Some(previous) = chunks.last_mut() {
                    previous.punctuation = Some(marker);
                }
            }
            Some(marker) => chunks.push(ClauseChunk {
                tokens: std::mem::take(&mut current),
                punctuation: Some(marker),
            }),
            None => current.push(token),
        }
    }

    if !current.is_empty() {
        chunks.push(ClauseChunk {
            tokens: current,
            punctuation: None,
        });
    }

    log::debug!("Split token stream into {} clause(s)", chunks.len());
    chunks
}
