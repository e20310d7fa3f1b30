/*
    Copyright (C) 2026  Rafal Michalski

    This file is part of CAFETAS, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! The record path and its periodic text flush.
use cafetas_core::MAX_VPAD_PLAYERS;
use cafetas_core::hash::runtime_signature;
use cafetas_core::host::{HostClock, HostSystem};
use cafetas_core::movie::MovieMode;
use cafetas_core::sample::{FrameInput, VpadMovieSample};

use super::{FLUSH_INTERVAL_FRAMES, TasEngine};

impl<H: HostClock + HostSystem> TasEngine<H> {
    /// Appends the live sample the host captured for `player` this frame.
    ///
    /// Idempotent per runtime frame: repeated polls within one emulator
    /// frame write at most one movie sample. The sample lands at the
    /// record cursor with a signature binding it to the current runtime,
    /// the movie hash is refreshed and the movie marked dirty.
    pub fn record_vpad_sample(&self, player: usize, runtime_frame: u64, sample: &VpadMovieSample) {
        let mut inner = self.lock();
        if player >= MAX_VPAD_PLAYERS || inner.movie_mode != MovieMode::Record {
            return;
        }
        if inner.record_last_runtime_frame[player] == Some(runtime_frame) {
            return;
        }
        inner.record_last_runtime_frame[player] = Some(runtime_frame);

        let movie_frame = inner.record_cursor[player];
        inner.record_cursor[player] = movie_frame.saturating_add(1);

        let mut input = FrameInput::from_movie_sample(sample);
        input.frame = movie_frame;
        input.signature = runtime_signature(runtime_frame, self.host.gpu_frame_counter());
        inner.players[player].upsert(input);
        inner.last_recorded_frame = Some(match inner.last_recorded_frame {
            Some(last) => last.max(movie_frame),
            None => movie_frame
        });

        let title_id = self.host.foreground_title_id();
        if title_id != 0 {
            inner.movie_title_id = title_id;
        }
        inner.movie_hash = self.compute_movie_hash(&inner);
        inner.dirty = true;
    }

    /// Called by the host after a frame was presented.
    ///
    /// Clears the step-active marker while paused and drives the record
    /// flush policy: a dirty movie is rewritten on the first opportunity
    /// and then at most once per flush interval.
    pub fn on_frame_presented(&self, frame: u64) {
        let mut inner = self.lock();
        if inner.frame_advance_paused {
            inner.frame_advance_step_active = false;
        }
        if inner.movie_mode != MovieMode::Record || inner.file.is_none() {
            return;
        }
        if !inner.dirty {
            return;
        }
        let due = match inner.last_flush_frame {
            None => true,
            Some(last) => frame.wrapping_sub(last) >= FLUSH_INTERVAL_FRAMES
        };
        if due && inner.flush_movie_to_file(self.host.foreground_title_id()) {
            inner.dirty = false;
            inner.last_flush_frame = Some(frame);
        }
    }
}
