/*
    Copyright (C) 2026  Rafal Michalski

    This file is part of CAFETAS, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! Stateless helpers between the input editor GUI and the manual layer.
//!
//! The editor presents sticks as bytes (1..=255 with 128 centered); the
//! engine stores floats. These mappers keep both sides consistent.
use cafetas_core::buttons::TasButtons;
use cafetas_core::sample::{ManualState, stick_byte_from_float, stick_float_from_byte};

/// The stick presentation bytes of a manual state: `[lx, ly, rx, ry]`.
pub fn stick_bytes_from_manual(state: &ManualState) -> [u8; 4] {
    [
        stick_byte_from_float(state.lx),
        stick_byte_from_float(state.ly),
        stick_byte_from_float(state.rx),
        stick_byte_from_float(state.ry),
    ]
}

/// Builds the manual state pushed by the editor from its stick bytes and
/// button checkboxes.
///
/// Negative vertical values are biased down by 1/512 so the game-side
/// stick quantization rounds to the same byte the editor shows.
pub fn manual_state_from_bytes(lx: u8, ly: u8, rx: u8, ry: u8, buttons: TasButtons) -> ManualState {
    let mut state = ManualState {
        lx: stick_float_from_byte(lx),
        ly: stick_float_from_byte(ly),
        rx: stick_float_from_byte(rx),
        ry: stick_float_from_byte(ry),
        zl: 0.0,
        zr: 0.0,
        buttons,
    };
    if state.ly < 0.0 {
        state.ly = (state.ly - 1.0 / 512.0).max(-1.0);
    }
    if state.ry < 0.0 {
        state.ry = (state.ry - 1.0 / 512.0).max(-1.0);
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stick_bytes_round_trip_through_manual_state() {
        let state = manual_state_from_bytes(1, 128, 255, 200, TasButtons::A);
        assert_eq!(state.buttons, TasButtons::A);
        assert_eq!(stick_bytes_from_manual(&state), [1, 128, 255, 200]);
    }

    #[test]
    fn negative_vertical_bias() {
        let state = manual_state_from_bytes(128, 100, 128, 1, TasButtons::empty());
        let unbiased = stick_float_from_byte(100);
        assert!(state.ly < unbiased);
        assert!((unbiased - state.ly - 1.0 / 512.0).abs() < 1e-6);
        // fully deflected sticks stay in range
        assert_eq!(manual_state_from_bytes(128, 1, 128, 1, TasButtons::empty()).ry, -1.0);
        // positive and centered values are untouched
        assert_eq!(manual_state_from_bytes(128, 128, 128, 200, TasButtons::empty()).ly, 0.0);
    }
}
