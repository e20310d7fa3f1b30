/*
    Copyright (C) 2026  Rafal Michalski

    This file is part of CAFETAS, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! Manual input layer accessors.
use cafetas_core::MAX_VPAD_PLAYERS;
use cafetas_core::buttons::TasButtons;
use cafetas_core::sample::ManualState;

use super::TasEngine;

impl<H> TasEngine<H> {
    pub fn set_manual_input_enabled(&self, enabled: bool) {
        self.lock().manual_enabled = enabled;
    }

    pub fn is_manual_input_enabled(&self) -> bool {
        self.lock().manual_enabled
    }

    /// Passthrough reads the physical controller and mirrors it into the
    /// manual layer, so the editor shows the live values.
    pub fn set_controller_passthrough_enabled(&self, enabled: bool) {
        self.lock().passthrough_enabled = enabled;
    }

    pub fn is_controller_passthrough_enabled(&self) -> bool {
        self.lock().passthrough_enabled
    }

    pub fn manual_input_state(&self, player: usize) -> ManualState {
        let inner = self.lock();
        if player >= MAX_VPAD_PLAYERS {
            return ManualState::default();
        }
        inner.manual[player]
    }

    pub fn set_manual_input_state(&self, player: usize, state: ManualState) {
        let mut inner = self.lock();
        if player >= MAX_VPAD_PLAYERS {
            return;
        }
        inner.manual[player] = state;
    }

    pub fn manual_turbo_mask(&self, player: usize) -> TasButtons {
        let inner = self.lock();
        if player >= MAX_VPAD_PLAYERS {
            return TasButtons::empty();
        }
        inner.turbo_masks[player]
    }

    pub fn set_manual_turbo_mask(&self, player: usize, mask: TasButtons) {
        let mut inner = self.lock();
        if player >= MAX_VPAD_PLAYERS {
            return;
        }
        inner.turbo_masks[player] = mask;
    }

    /// The turbo half-period in frames, never less than 1.
    pub fn manual_turbo_interval(&self, player: usize) -> u32 {
        let inner = self.lock();
        if player >= MAX_VPAD_PLAYERS {
            return 1;
        }
        inner.turbo_interval(player)
    }

    pub fn set_manual_turbo_interval(&self, player: usize, interval_frames: u32) {
        let mut inner = self.lock();
        if player >= MAX_VPAD_PLAYERS {
            return;
        }
        inner.turbo_intervals[player] = interval_frames.max(1);
    }
}
