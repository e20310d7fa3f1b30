/*
    Copyright (C) 2026  Rafal Michalski

    This file is part of CAFETAS, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! Contracts the engine consumes from the hosting emulator.
use std::path::PathBuf;

use crate::sample::FrameInput;

/// Access to the host's physical controller abstraction.
pub trait VpadDriver {
    /// Reads the physical controller of `player` and returns its current
    /// state; may block briefly.
    ///
    /// The engine calls this with no internal lock held and with the
    /// re-entrancy bypass armed, so implementations may freely route
    /// through code that queries the engine back.
    fn capture_live(&self, player: usize) -> FrameInput;

    /// Invalidates any cached controller read state so the next capture
    /// observes fresh input. Called for every player when a frame-advance
    /// step is requested.
    fn prime_live(&self, _player: usize) {}
}

/// Access to the host's frame-presentation clock.
pub trait HostClock {
    /// The monotonically increasing GPU frame counter.
    fn gpu_frame_counter(&self) -> u64;
}

/// Access to ambient host state.
pub trait HostSystem {
    /// The currently running title, 0 when none.
    fn foreground_title_id(&self) -> u64;
}

/// Engine configuration, read once per engine reload.
///
/// `movie_mode`: 0 disabled, 1 playback, 2 record.
/// `movie_record_policy`: 0 read-only, 1 read-write.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TasConfig {
    pub movie_mode: u32,
    pub movie_record_policy: u32,
    pub strict_tas_mode: bool,
    pub deterministic_scheduler: bool,
    pub deterministic_time: bool,
    /// Movie file to auto-import when `movie_mode` selects playback.
    pub input_playback_file: Option<PathBuf>,
}
