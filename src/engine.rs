/*
    Copyright (C) 2026  Rafal Michalski

    This file is part of CAFETAS, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! The TAS engine: one process-wide value owned by the hosting emulator.
//!
//! All mutable state lives behind a single mutex paired with one condition
//! variable for the frame-advance barrier. Every public entry point holds
//! the lock for its full body with two designed exceptions: the
//! passthrough live capture (the lock is dropped around the external VPAD
//! read) and the barrier waits (the lock is released inside the condition
//! variable).
pub mod barrier;
pub mod io;
pub mod manual;
pub mod overlay;
pub mod playback;
pub mod query;
pub mod record;
pub mod timeline;

use core::cell::Cell;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use log::warn;

use cafetas_core::MAX_VPAD_PLAYERS;
use cafetas_core::buttons::TasButtons;
use cafetas_core::hash::movie_hash;
use cafetas_core::host::{HostSystem, TasConfig};
use cafetas_core::movie::{MovieInputTiming, MovieMode, MovieRecordPolicy, PlayerTimeline};
use cafetas_core::sample::{FrameInput, ManualState, apply_turbo};
use cafetas_formats::ctm::MovieTextMeta;

pub use self::io::read_movie_title_id_from_file;

/// How many presented frames may pass between two text flushes of a dirty
/// record movie.
const FLUSH_INTERVAL_FRAMES: u64 = 30;
/// Signature realign search windows, tried in order.
const REALIGN_WINDOWS: [u64; 2] = [192, 2048];
/// Signed non-neutral samples inspected when deciding signature trust.
const SIGNATURE_TRUST_SAMPLE_LIMIT: usize = 64;

thread_local! {
    static LIVE_CAPTURE_BYPASS: Cell<bool> = Cell::new(false);
}

/// Scoped re-entrancy guard around the passthrough live capture.
///
/// While armed on the current thread every mapping query returns `None`,
/// so an external VPAD read routed back through the engine cannot recurse.
pub(crate) struct LiveCaptureBypass {
    prev: bool,
}

impl LiveCaptureBypass {
    pub(crate) fn arm() -> LiveCaptureBypass {
        let prev = LIVE_CAPTURE_BYPASS.with(|flag| flag.replace(true));
        LiveCaptureBypass { prev }
    }

    pub(crate) fn is_armed() -> bool {
        LIVE_CAPTURE_BYPASS.with(|flag| flag.get())
    }
}

impl Drop for LiveCaptureBypass {
    fn drop(&mut self) {
        let prev = self.prev;
        LIVE_CAPTURE_BYPASS.with(|flag| flag.set(prev));
    }
}

/// The movie frame bound to a runtime frame by the first poll of that frame.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PollLatch {
    pub(crate) runtime_frame: u64,
    pub(crate) movie_frame: u64,
}

#[derive(Debug, Default)]
pub(crate) struct EngineInner {
    pub(crate) enabled: bool,
    pub(crate) loop_enabled: bool,
    pub(crate) manual_enabled: bool,
    pub(crate) passthrough_enabled: bool,
    pub(crate) strict_tas: bool,
    pub(crate) deterministic_scheduler: bool,
    pub(crate) deterministic_time: bool,
    pub(crate) frame_advance_paused: bool,
    pub(crate) frame_advance_steps: u32,
    pub(crate) visual_refresh_permits: u32,
    pub(crate) frame_advance_step_active: bool,
    pub(crate) file: Option<PathBuf>,
    pub(crate) players: [PlayerTimeline; MAX_VPAD_PLAYERS],
    pub(crate) manual: [ManualState; MAX_VPAD_PLAYERS],
    pub(crate) turbo_masks: [TasButtons; MAX_VPAD_PLAYERS],
    pub(crate) turbo_intervals: [u32; MAX_VPAD_PLAYERS],
    pub(crate) movie_mode: MovieMode,
    pub(crate) record_policy: MovieRecordPolicy,
    pub(crate) input_timing: MovieInputTiming,
    pub(crate) movie_hash: u64,
    pub(crate) movie_title_id: u64,
    pub(crate) rerecord_count: u32,
    pub(crate) desynced: bool,
    pub(crate) dirty: bool,
    pub(crate) last_recorded_frame: Option<u64>,
    pub(crate) last_flush_frame: Option<u64>,
    pub(crate) signatures_trusted: bool,
    pub(crate) playback_latch: [Option<PollLatch>; MAX_VPAD_PLAYERS],
    pub(crate) playback_cursor: [u64; MAX_VPAD_PLAYERS],
    pub(crate) record_cursor: [u64; MAX_VPAD_PLAYERS],
    pub(crate) record_last_runtime_frame: [Option<u64>; MAX_VPAD_PLAYERS],
    pub(crate) passthrough_cache: [Option<(u64, FrameInput)>; MAX_VPAD_PLAYERS],
    pub(crate) cursor_restored_from_blob: bool,
    pub(crate) cfg_movie_mode: u32,
    pub(crate) cfg_record_policy: u32,
}

impl EngineInner {
    fn new() -> EngineInner {
        EngineInner {
            manual_enabled: true,
            signatures_trusted: true,
            turbo_intervals: [1; MAX_VPAD_PLAYERS],
            ..Default::default()
        }
    }

    pub(crate) fn reset_poll_state(&mut self) {
        self.playback_latch = [None; MAX_VPAD_PLAYERS];
        self.playback_cursor = [0; MAX_VPAD_PLAYERS];
        self.record_cursor = [0; MAX_VPAD_PLAYERS];
        self.record_last_runtime_frame = [None; MAX_VPAD_PLAYERS];
        self.passthrough_cache = [None; MAX_VPAD_PLAYERS];
    }

    /// Points every record cursor one past its player's stored tail.
    pub(crate) fn init_record_cursor_from_frames(&mut self) {
        for (cursor, player) in self.record_cursor.iter_mut().zip(self.players.iter()) {
            *cursor = player.last().map_or(0, |input| input.frame + 1);
        }
    }

    pub(crate) fn reset_frame_advance(&mut self) {
        self.frame_advance_paused = false;
        self.frame_advance_steps = 0;
        self.visual_refresh_permits = 0;
        self.frame_advance_step_active = false;
    }

    pub(crate) fn enforce_strict_tas(&mut self) {
        if self.strict_tas {
            self.deterministic_scheduler = true;
            self.deterministic_time = true;
        }
    }

    pub(crate) fn turbo_interval(&self, player: usize) -> u32 {
        self.turbo_intervals[player].max(1)
    }

    /// The editor state of `player` as a frame sample with turbo applied.
    pub(crate) fn manual_frame_input(&self, player: usize, frame: u64) -> FrameInput {
        let mut input = self.manual[player].to_frame_input();
        input.buttons = apply_turbo(input.buttons,
                                    self.turbo_masks[player],
                                    self.turbo_interval(player),
                                    frame);
        input.frame = frame;
        input
    }

    /// Trusted iff at least two distinct nonzero signatures exist among the
    /// first non-neutral signed samples across all players. Purely neutral
    /// or single-signature movies fall back to frame-order playback.
    pub(crate) fn evaluate_signatures_trusted(&self) -> bool {
        let mut first_signature = None;
        let mut actionable = 0usize;
        for player in self.players.iter() {
            for input in player.frames() {
                if input.signature == 0 || input.is_neutral() {
                    continue;
                }
                actionable += 1;
                match first_signature {
                    None => first_signature = Some(input.signature),
                    Some(first) if input.signature != first => return true,
                    _ => {}
                }
                if actionable >= SIGNATURE_TRUST_SAMPLE_LIMIT {
                    break;
                }
            }
            if actionable >= SIGNATURE_TRUST_SAMPLE_LIMIT {
                break;
            }
        }
        false
    }

    pub(crate) fn text_meta(&self, movie_mode: u32, title_id: u64) -> MovieTextMeta {
        MovieTextMeta {
            loop_enabled: self.loop_enabled,
            deterministic_scheduler: self.deterministic_scheduler,
            deterministic_time: self.deterministic_time,
            movie_mode,
            movie_record_policy: self.record_policy as u32,
            input_timing: self.input_timing,
            rerecord_count: self.rerecord_count,
            movie_hash: self.movie_hash,
            title_id: if title_id != 0 { title_id } else { self.movie_title_id },
        }
    }
}

/// The TAS input engine.
///
/// A single long-lived value owned by the host, shared between the GUI
/// thread, the emulator CPU/GPU threads and the controller poll path.
/// `H` supplies the host collaborators: the physical controller driver,
/// the GPU frame clock and the foreground title.
#[derive(Debug)]
pub struct TasEngine<H> {
    pub(crate) host: H,
    pub(crate) inner: Mutex<EngineInner>,
    pub(crate) frame_advance_cv: Condvar,
    pub(crate) external_pause: Arc<AtomicBool>,
}

impl<H> TasEngine<H> {
    pub fn new(host: H) -> TasEngine<H> {
        TasEngine {
            host,
            inner: Mutex::new(EngineInner::new()),
            frame_advance_cv: Condvar::new(),
            external_pause: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host-owned pause flag short-circuiting the frame-advance waits.
    ///
    /// Setting the flag does not need to notify anything: the waits poll
    /// it on a short condition variable deadline.
    pub fn external_pause_flag(&self) -> Arc<AtomicBool> {
        self.external_pause.clone()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, EngineInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn movie_mode(&self) -> MovieMode {
        self.lock().movie_mode
    }

    pub fn movie_record_policy(&self) -> MovieRecordPolicy {
        self.lock().record_policy
    }

    pub fn is_movie_active(&self) -> bool {
        self.lock().movie_mode != MovieMode::Disabled
    }

    pub fn is_movie_desynced(&self) -> bool {
        self.lock().desynced
    }

    pub fn is_strict_tas_mode_enabled(&self) -> bool {
        self.lock().strict_tas
    }

    /// The host scheduler pins itself to deterministic mode whenever TAS is
    /// in the picture, not only when explicitly configured.
    pub fn is_deterministic_scheduler_enabled(&self) -> bool {
        let inner = self.lock();
        inner.deterministic_scheduler || inner.enabled ||
        inner.frame_advance_paused || inner.movie_mode != MovieMode::Disabled
    }

    pub fn is_deterministic_time_enabled(&self) -> bool {
        let inner = self.lock();
        inner.deterministic_time || inner.enabled ||
        inner.frame_advance_paused || inner.movie_mode != MovieMode::Disabled
    }
}

impl<H: HostSystem> TasEngine<H> {
    /// Applies a freshly read host configuration.
    ///
    /// Enables the engine, adopts mode and policy, resets all poll state
    /// and, when playback mode names a movie file that is not already
    /// loaded, imports it. An import failure is logged, not returned; the
    /// engine stays in playback mode with an empty timeline.
    pub fn reload_from_config(&self, config: &TasConfig) {
        let auto_import = {
            let mut inner = self.lock();
            inner.cfg_movie_mode = config.movie_mode.min(2);
            inner.cfg_record_policy = config.movie_record_policy.min(1);
            inner.enabled = true;
            inner.loop_enabled = false;
            inner.strict_tas = config.strict_tas_mode;
            inner.deterministic_scheduler = config.deterministic_scheduler || config.strict_tas_mode;
            inner.deterministic_time = config.deterministic_time || config.strict_tas_mode;
            // The TAS input editor always drives manual mode.
            inner.manual_enabled = true;
            inner.movie_mode = match inner.cfg_movie_mode {
                2 => MovieMode::Record,
                1 => MovieMode::Playback,
                _ => MovieMode::Disabled
            };
            inner.record_policy = if inner.cfg_record_policy == 1 {
                MovieRecordPolicy::ReadWrite
            }
            else {
                MovieRecordPolicy::ReadOnly
            };
            inner.desynced = false;
            inner.dirty = false;
            inner.signatures_trusted = true;
            inner.reset_poll_state();
            inner.cursor_restored_from_blob = false;
            inner.last_flush_frame = None;

            if inner.movie_mode == MovieMode::Disabled {
                inner.movie_hash = 0;
                None
            }
            else if inner.movie_mode == MovieMode::Playback {
                match config.input_playback_file {
                    Some(ref path) if !path.as_os_str().is_empty() => {
                        let have_frames = inner.players.iter().any(|p| !p.is_empty());
                        if inner.file.as_deref() != Some(path.as_path()) || !have_frames {
                            Some(path.clone())
                        }
                        else {
                            None
                        }
                    }
                    _ => None
                }
            }
            else {
                None
            }
        };

        if let Some(path) = auto_import {
            if let Err(err) = self.import_movie_for_playback(&path, 0) {
                warn!("TAS: auto-playback import failed path={} err={}", path.display(), err);
            }
        }
    }

    pub(crate) fn compute_movie_hash(&self, inner: &EngineInner) -> u64 {
        movie_hash(self.host.foreground_title_id(), &inner.players)
    }
}
