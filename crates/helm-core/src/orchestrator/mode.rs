//! Realtime/playback switching.
//!
//! A mode change never happens on a live connection: the current stream is
//! closed with a pending reopen and the new mode is opened when the close
//! arrives. The live trail is parked in the store under `self` while playback
//! runs and restored on the way back.

use helm_types::{LoadTicket, PlaybackQuery, Position, SessionMode};
use tracing::{debug, info};

use super::{Continuation, Orchestrator};
use crate::modal::ModalRequest;
use crate::trail::{Trail, TrailKey};

impl Orchestrator {
    /// Switch to `to`, reopening the stream with `query` for playback.
    pub(super) fn switch_mode(&mut self, to: SessionMode, query: Option<PlaybackQuery>) {
        info!(from = %self.mode, to = %to, "switching mode");
        match to {
            SessionMode::Playback => {
                // Only a live trail may be parked under `self`. While already
                // replaying, or while the live trail is still being loaded,
                // the stored copy stays authoritative.
                let loading = self.trail_load.take().is_some();
                if self.mode.is_playback() || loading {
                    debug!(loading, "stored self trail left untouched");
                } else {
                    self.store
                        .save_trail(TrailKey::SelfTrail, &self.trail.to_vec());
                }
                self.trail.clear();
            }
            SessionMode::Realtime => {
                self.begin_trail_load();
                self.trail.clear();
                self.playback_time = None;
            }
        }
        self.switch_active_vessel(None);
        self.stop_trail_timer();
        self.mode = to;
        self.open_stream(query, to, true);
    }

    pub(super) fn begin_trail_load(&mut self) {
        self.next_load = self.next_load.next();
        let ticket = self.next_load;
        self.trail_load = Some(ticket);
        debug!(%ticket, "loading self trail");
        self.store.load_trail(TrailKey::SelfTrail, ticket);
    }

    pub(super) fn on_trail_loaded(&mut self, ticket: LoadTicket, samples: Option<Vec<Position>>) {
        if self.trail_load != Some(ticket) {
            debug!(%ticket, "dropping stale trail load");
            return;
        }
        self.trail_load = None;
        self.trail = Trail::from_samples(samples.unwrap_or_default());
        info!(samples = self.trail.len(), "self trail restored");
    }

    pub(super) fn select_mode(&mut self) {
        match self.mode {
            SessionMode::Realtime => self.present(
                ModalRequest::confirm(
                    "Switch Mode",
                    "Do you want to change to History Playback mode?",
                ),
                Continuation::ConfirmEnterPlayback,
            ),
            SessionMode::Playback => self.present(
                ModalRequest::confirm(
                    "Exit History Playback",
                    "Do you want to exit History Playback mode?",
                ),
                Continuation::ConfirmExitPlayback,
            ),
        }
    }

    pub(super) fn show_playback_settings(&mut self) {
        self.present(ModalRequest::PlaybackSettings, Continuation::PlaybackSettings);
    }
}
