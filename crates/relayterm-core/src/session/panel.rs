//! Terminal panel - open/closed guard around a session
//!
//! A session only exists while the panel is open, and a new one is only
//! created on a closed → open transition.

use std::time::Instant;

use tracing::debug;

use super::lifecycle::{Session, SessionConfig, SessionHost};

pub struct TerminalPanel<H: SessionHost> {
    config: SessionConfig,
    session: Option<Session<H>>,
}

impl<H: SessionHost> TerminalPanel<H> {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Open the panel. Returns false (and drops `host`) if already open.
    pub fn open(&mut self, host: H, now: Instant) -> bool {
        if self.session.is_some() {
            debug!("Terminal panel already open");
            return false;
        }
        self.session = Some(Session::open(host, self.config.clone(), now));
        true
    }

    /// Close the panel, tearing the session down. Returns false if it was
    /// already closed.
    pub fn close(&mut self) -> bool {
        match self.session.take() {
            Some(mut session) => {
                session.close();
                true
            }
            None => false,
        }
    }

    pub fn session(&self) -> Option<&Session<H>> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session<H>> {
        self.session.as_mut()
    }
}
