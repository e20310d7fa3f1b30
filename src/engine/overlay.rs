/*
    Copyright (C) 2026  Rafal Michalski

    This file is part of CAFETAS, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! Overlay snapshots for external renderers.
use cafetas_core::MAX_VPAD_PLAYERS;
use cafetas_core::movie::MovieMode;
use cafetas_core::sample::{FrameInput, OverlayState};

use super::{EngineInner, TasEngine};

fn fill_overlay(out: &mut OverlayState, input: &FrameInput) {
    out.lx = input.lx;
    out.ly = input.ly;
    out.rx = input.rx;
    out.ry = input.ry;
    out.zl = input.zl;
    out.zr = input.zr;
    out.buttons = input.buttons;
}

impl EngineInner {
    // The overlay shows what the next poll would consume: under playback
    // that is the cursor position, otherwise the runtime frame itself.
    fn overlay_movie_frame(&self, player: usize, runtime_frame: u64) -> u64 {
        if self.movie_mode == MovieMode::Playback {
            self.playback_cursor[player]
        }
        else {
            runtime_frame
        }
    }
}

impl<H> TasEngine<H> {
    /// `true` when an overlay has anything meaningful to draw.
    pub fn has_overlay_data(&self) -> bool {
        let inner = self.lock();
        inner.manual_enabled || inner.enabled ||
        inner.movie_mode != MovieMode::Disabled || inner.frame_advance_paused
    }

    /// A consistent snapshot of the controller state for `player`.
    ///
    /// Playback wins over manual input; with neither active only the
    /// pause marker is reported.
    pub fn overlay_state(&self, frame: u64, player: usize) -> OverlayState {
        let inner = self.lock();
        let mut out = OverlayState {
            frame,
            frame_advance_paused: inner.frame_advance_paused,
            ..Default::default()
        };
        if player >= MAX_VPAD_PLAYERS {
            return out;
        }

        if inner.movie_mode == MovieMode::Playback {
            out.active = true;
            out.playback = true;
            let movie_frame = inner.overlay_movie_frame(player, frame);
            if let Some(input) = inner.players[player].frame_for(movie_frame, inner.loop_enabled) {
                fill_overlay(&mut out, input);
            }
            return out;
        }

        if inner.manual_enabled {
            out.active = true;
            out.manual = true;
            let input = inner.manual_frame_input(player, frame);
            fill_overlay(&mut out, &input);
            return out;
        }

        if !inner.enabled {
            out.active = out.frame_advance_paused;
            return out;
        }

        out.active = true;
        out.playback = true;
        let movie_frame = inner.overlay_movie_frame(player, frame);
        if let Some(input) = inner.players[player].frame_for(movie_frame, inner.loop_enabled) {
            fill_overlay(&mut out, input);
        }
        out
    }
}
