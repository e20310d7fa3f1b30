/*
    Copyright (C) 2026  Rafal Michalski

    This file is part of CAFETAS, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! The per-mapping query router used by the host's controller abstraction.
use core::convert::TryFrom;

use cafetas_core::MAX_VPAD_PLAYERS;
use cafetas_core::host::VpadDriver;
use cafetas_core::mapping::{VpadMapping, mapping_value};
use cafetas_core::movie::MovieMode;
use cafetas_core::sample::apply_turbo;

use super::{LiveCaptureBypass, TasEngine};

impl<H: VpadDriver> TasEngine<H> {
    /// Resolves one VPAD mapping query to an override value, or `None`
    /// when the live controller should win.
    ///
    /// Movie playback always answers `None` here: playback is injected at
    /// the VPAD sample boundary, not per mapping. Record mode also answers
    /// `None` so the recorded inputs stay the live ones. Within a live
    /// capture the router bypasses itself entirely.
    pub fn query_vpad_mapping(
            &self,
            player: usize,
            runtime_frame: u64,
            mapping: VpadMapping
        ) -> Option<f32>
    {
        if LiveCaptureBypass::is_armed() {
            return None;
        }
        let mut inner = self.lock();
        if player >= MAX_VPAD_PLAYERS {
            return None;
        }
        if inner.movie_mode == MovieMode::Playback {
            return None;
        }

        if inner.manual_enabled {
            let turbo_mask = inner.turbo_masks[player];
            let turbo_interval = inner.turbo_interval(player);
            if inner.passthrough_enabled {
                let cached = match inner.passthrough_cache[player] {
                    Some((frame, input)) if frame == runtime_frame => Some(input),
                    _ => None
                };
                let live = match cached {
                    Some(input) => input,
                    None => {
                        // The external read may block and may reenter the
                        // engine, so it happens with the lock dropped and
                        // the bypass armed.
                        drop(inner);
                        let mut captured = {
                            let _bypass = LiveCaptureBypass::arm();
                            self.host.capture_live(player).clamped()
                        };
                        captured.frame = runtime_frame;
                        inner = self.lock();
                        inner.passthrough_cache[player] = Some((runtime_frame, captured));
                        captured
                    }
                };
                let mut manual = inner.manual[player];
                manual.update_from(&live);
                inner.manual[player] = manual;
            }
            let mut input = inner.manual[player].to_frame_input();
            input.frame = runtime_frame;
            input.buttons = apply_turbo(input.buttons, turbo_mask, turbo_interval, runtime_frame);
            return Some(mapping_value(&input, mapping));
        }

        if inner.movie_mode == MovieMode::Record {
            return None;
        }
        if !inner.enabled {
            return None;
        }

        // Fallback: replay the movie through the mapping interface.
        let input = *inner.players[player].frame_for(runtime_frame, inner.loop_enabled)?;
        Some(mapping_value(&input, mapping))
    }

    /// [TasEngine::query_vpad_mapping] for hosts holding raw mapping ids;
    /// unknown ids resolve to `None`.
    pub fn query_vpad_mapping_raw(
            &self,
            player: usize,
            runtime_frame: u64,
            mapping: u64
        ) -> Option<f32>
    {
        let mapping = VpadMapping::try_from(mapping).ok()?;
        self.query_vpad_mapping(player, runtime_frame, mapping)
    }
}
