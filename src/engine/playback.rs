/*
    Copyright (C) 2026  Rafal Michalski

    This file is part of CAFETAS, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! Poll-driven movie playback with signature realignment.
use log::info;

use cafetas_core::MAX_VPAD_PLAYERS;
use cafetas_core::hash::runtime_signature;
use cafetas_core::host::HostClock;
use cafetas_core::movie::MovieMode;
use cafetas_core::sample::VpadMovieSample;

use super::{PollLatch, REALIGN_WINDOWS, TasEngine};

impl<H> TasEngine<H> {
    /// Starts a VPAD poll of `player` for `runtime_frame`.
    ///
    /// Drops the passthrough live cache and the playback latch when they
    /// were captured for a different runtime frame.
    pub fn begin_vpad_poll(&self, player: usize, runtime_frame: u64) {
        let mut inner = self.lock();
        if player >= MAX_VPAD_PLAYERS {
            return;
        }
        if let Some((frame, _)) = inner.passthrough_cache[player] {
            if frame != runtime_frame {
                inner.passthrough_cache[player] = None;
            }
        }
        if let Some(latch) = inner.playback_latch[player] {
            if latch.runtime_frame != runtime_frame {
                inner.playback_latch[player] = None;
            }
        }
    }
}

impl<H: HostClock> TasEngine<H> {
    /// Returns the movie sample the host must substitute for a live VPAD
    /// read, or `None` when playback has nothing to inject.
    ///
    /// One movie sample is consumed per unique poll frame: the first call
    /// for a runtime frame binds it to the cursor position and advances
    /// the cursor, repeated polls of the same frame observe the latched
    /// binding. This keeps runtime frame jumps from skipping inputs.
    ///
    /// While signatures are trusted and looping is off, a recorded
    /// signature that contradicts the current runtime is realigned by
    /// searching the nearby timeline for the expected signature; a failed
    /// search marks the movie desynced but still plays the original
    /// sample.
    pub fn try_get_playback_sample(
            &self,
            player: usize,
            runtime_frame: u64
        ) -> Option<VpadMovieSample>
    {
        let mut inner = self.lock();
        if player >= MAX_VPAD_PLAYERS || inner.movie_mode != MovieMode::Playback {
            return None;
        }

        let mut movie_frame = match inner.playback_latch[player] {
            Some(latch) if latch.runtime_frame == runtime_frame => latch.movie_frame,
            _ => {
                let frame = inner.playback_cursor[player];
                inner.playback_latch[player] = Some(PollLatch { runtime_frame, movie_frame: frame });
                inner.playback_cursor[player] = frame.saturating_add(1);
                frame
            }
        };

        let loop_enabled = inner.loop_enabled;
        let mut frame_input = *inner.players[player].frame_for(movie_frame, loop_enabled)?;

        if inner.signatures_trusted && !loop_enabled && frame_input.signature != 0 {
            let expected = runtime_signature(runtime_frame, self.host.gpu_frame_counter());
            if frame_input.signature != expected {
                // Deterministic alignment for loading and RNG sections.
                let aligned = REALIGN_WINDOWS.iter().find_map(|&window| {
                    inner.players[player]
                         .find_signature_in_window(movie_frame, window, expected)
                         .copied()
                });
                match aligned {
                    Some(aligned) => {
                        movie_frame = aligned.frame;
                        frame_input = aligned;
                        inner.playback_cursor[player] = movie_frame.saturating_add(1);
                        if let Some(latch) = inner.playback_latch[player].as_mut() {
                            latch.movie_frame = movie_frame;
                        }
                        inner.desynced = false;
                        info!("TAS: playback signature realign player={} runtimeFrame={} movieFrame={}",
                              player, runtime_frame, movie_frame);
                    }
                    None => inner.desynced = true
                }
            }
        }

        Some(VpadMovieSample::from(&frame_input))
    }
}
