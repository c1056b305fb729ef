//! The long-lived linguistic session.
//!
//! A session is bound to one pack root and reused across synthesis calls. A
//! different pack root always destroys it and starts a new one; a different
//! language is applied to the existing session.

use std::path::{Path, PathBuf};

use super::backend::{LinguisticBackend, SessionHandle};
use super::capabilities::{EngineCapabilities, EngineHandle};
use super::error::SessionError;
use super::settings::VoiceSelection;

#[derive(Debug)]
struct LinguisticSession {
    handle: SessionHandle,
    pack_root: PathBuf,
    language: Option<String>,
    profile: Option<String>,
}

/// Holds at most one live session.
#[derive(Debug, Default)]
pub struct SessionSlot {
    current: Option<LinguisticSession>,
}

pub(super) fn last_error_or(frontend: &dyn LinguisticBackend, session: SessionHandle, fallback: &str) -> String {
    match frontend.last_error(session) {
        Ok(message) if !message.trim().is_empty() => message,
        Ok(_) => fallback.to_string(),
        Err(e) => format!("{fallback} ({e})"),
    }
}

impl SessionSlot {
    pub fn pack_root(&self) -> Option<&Path> {
        self.current.as_ref().map(|s| s.pack_root.as_path())
    }

    pub fn language(&self) -> Option<&str> {
        self.current.as_ref().and_then(|s| s.language.as_deref())
    }

    /// Return a session bound to `pack_root` speaking `language`, creating
    /// or rebinding as needed.
    pub fn ensure(
        &mut self,
        frontend: &dyn LinguisticBackend,
        pack_root: Option<&Path>,
        language: &str,
    ) -> Result<SessionHandle, SessionError> {
        let pack_root = match pack_root {
            Some(root) if !root.as_os_str().is_empty() => root,
            _ => return Err(SessionError::NoPackRoot),
        };

        if self.pack_root() != Some(pack_root) {
            self.invalidate(frontend);
            let handle = frontend
                .create_session(pack_root)?
                .ok_or_else(|| SessionError::CreateFailed(pack_root.to_path_buf()))?;
            log::info!("Created linguistic session for {}", pack_root.display());
            self.current = Some(LinguisticSession {
                handle,
                pack_root: pack_root.to_path_buf(),
                language: None,
                profile: None,
            });
        }

        let Some(session) = self.current.as_mut() else {
            return Err(SessionError::CreateFailed(pack_root.to_path_buf()));
        };
        if session.language.as_deref() != Some(language) {
            if !frontend.set_language(session.handle, language)? {
                let message = last_error_or(
                    frontend,
                    session.handle,
                    &format!("language '{language}' not available"),
                );
                return Err(SessionError::LanguageRejected(message));
            }
            log::debug!("Linguistic session language set to {language}");
            session.language = Some(language.to_string());
        }

        Ok(session.handle)
    }

    /// Forward the voice choice to the session, best effort.
    ///
    /// Profiles are set through the engine when it supports them; choosing a
    /// preset clears any profile left from an earlier call.
    pub fn apply_voice(
        &mut self,
        frontend: &dyn LinguisticBackend,
        capabilities: &EngineCapabilities,
        voice: &VoiceSelection,
    ) {
        let Some(session) = self.current.as_mut() else {
            return;
        };
        let wanted = match voice {
            VoiceSelection::Profile(name) => Some(name.as_str()),
            VoiceSelection::Preset(_) => None,
        };
        if session.profile.as_deref() == wanted {
            return;
        }
        if !capabilities.has_voice_profile_api() {
            if let Some(name) = wanted {
                log::warn!("Voice profile '{name}' requested but the linguistic engine has no profile support");
            }
            return;
        }

        match frontend.set_voice_profile(session.handle, wanted.unwrap_or("")) {
            Ok(true) => session.profile = wanted.map(str::to_string),
            Ok(false) => {
                let message = last_error_or(frontend, session.handle, "profile rejected");
                log::warn!("Voice profile {wanted:?} rejected: {message}");
            }
            Err(e) => log::warn!("Voice profile {wanted:?} not applied: {e}"),
        }
    }

    /// Destroy the live session, if any.
    pub fn invalidate(&mut self, frontend: &dyn LinguisticBackend) {
        if let Some(session) = self.current.take() {
            log::debug!("Destroying linguistic session for {}", session.pack_root.display());
            if let Err(e) = frontend.destroy_session(session.handle) {
                log::warn!("Failed to destroy linguistic session: {e}");
            }
        }
    }
}

impl EngineHandle {
    /// See [`SessionSlot::ensure`].
    pub fn ensure_session(
        &mut self,
        pack_root: Option<&Path>,
        language: &str,
    ) -> Result<SessionHandle, SessionError> {
        let (slot, frontend, _) = self.sessions_mut();
        slot.ensure(frontend, pack_root, language)
    }

    pub fn apply_voice(&mut self, voice: &VoiceSelection) {
        let (slot, frontend, capabilities) = self.sessions_mut();
        slot.apply_voice(frontend, capabilities, voice);
    }

    pub fn invalidate_session(&mut self) {
        let (slot, frontend, _) = self.sessions_mut();
        slot.invalidate(frontend);
    }

    /// Pack root of the live session, if one exists.
    pub fn session_pack_root(&self) -> Option<&Path> {
        self.sessions().pack_root()
    }
}
