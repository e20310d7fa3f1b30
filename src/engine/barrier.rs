/*
    Copyright (C) 2026  Rafal Michalski

    This file is part of CAFETAS, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! The frame-advance barrier gating the emulator's worker threads.
//!
//! While paused, the CPU loop blocks in [TasEngine::wait_for_frame_advance_cpu_permit]
//! and the render loop in [TasEngine::wait_for_frame_advance_permit] until
//! a step or visual-refresh permit arrives. The waits poll the host's
//! external pause flag on a short condition variable deadline, so the
//! requester never has to notify the condition variable itself.
use core::sync::atomic::Ordering;
use core::time::Duration;

use cafetas_core::MAX_VPAD_PLAYERS;
use cafetas_core::host::VpadDriver;

use super::TasEngine;

const WAIT_DEADLINE: Duration = Duration::from_millis(1);

impl<H> TasEngine<H> {
    /// Pauses or resumes frame advance. Resuming drops all pending step
    /// and refresh permits.
    pub fn set_frame_advance_paused(&self, paused: bool) {
        {
            let mut inner = self.lock();
            inner.frame_advance_paused = paused;
            if !paused {
                inner.frame_advance_steps = 0;
                inner.visual_refresh_permits = 0;
                inner.frame_advance_step_active = false;
            }
        }
        self.frame_advance_cv.notify_all();
    }

    /// Toggles the pause state and returns the new state.
    pub fn toggle_frame_advance_paused(&self) -> bool {
        let paused = {
            let mut inner = self.lock();
            inner.frame_advance_paused = !inner.frame_advance_paused;
            if !inner.frame_advance_paused {
                inner.frame_advance_steps = 0;
                inner.visual_refresh_permits = 0;
                inner.frame_advance_step_active = false;
            }
            inner.frame_advance_paused
        };
        self.frame_advance_cv.notify_all();
        paused
    }

    pub fn is_frame_advance_paused(&self) -> bool {
        self.lock().frame_advance_paused
    }

    /// `true` between a CPU-advancing wake and the next frame presentation.
    pub fn is_frame_advance_step_active(&self) -> bool {
        let inner = self.lock();
        inner.frame_advance_paused && inner.frame_advance_step_active
    }

    /// Grants the render loop `refresh_count` presentations without
    /// advancing the CPU. Ignored unless paused.
    pub fn request_frame_advance_visual_refresh(&self, refresh_count: u32) {
        if refresh_count == 0 {
            return;
        }
        {
            let mut inner = self.lock();
            if !inner.frame_advance_paused {
                return;
            }
            inner.visual_refresh_permits =
                inner.visual_refresh_permits.saturating_add(refresh_count);
        }
        self.frame_advance_cv.notify_all();
    }

    pub fn pending_frame_advance_visual_refresh_permits(&self) -> u32 {
        let inner = self.lock();
        if !inner.frame_advance_paused {
            return 0;
        }
        inner.visual_refresh_permits
    }

    /// Drops every pending step and refresh permit while staying paused.
    pub fn clear_frame_advance_pending(&self) {
        {
            let mut inner = self.lock();
            if !inner.frame_advance_paused {
                return;
            }
            inner.frame_advance_steps = 0;
            inner.visual_refresh_permits = 0;
            inner.frame_advance_step_active = false;
        }
        self.frame_advance_cv.notify_all();
    }

    /// Takes one visual-refresh permit if any is pending.
    pub fn consume_frame_advance_visual_refresh_permit(&self) -> bool {
        let mut inner = self.lock();
        if !inner.frame_advance_paused || inner.visual_refresh_permits == 0 {
            return false;
        }
        inner.visual_refresh_permits -= 1;
        true
    }

    /// Blocks the render loop while paused with no step and no refresh
    /// permit pending.
    ///
    /// On a visual-refresh wake the step marker is cleared; on a step wake
    /// one step permit is consumed and the step marker raised.
    pub fn wait_for_frame_advance_permit(&self) {
        let mut inner = self.lock();
        if !inner.frame_advance_paused || self.external_pause.load(Ordering::Acquire) {
            return;
        }
        while inner.frame_advance_paused
              && inner.frame_advance_steps == 0
              && inner.visual_refresh_permits == 0
              && !self.external_pause.load(Ordering::Acquire) {
            let (guard, _) = self.frame_advance_cv
                                 .wait_timeout(inner, WAIT_DEADLINE)
                                 .unwrap_or_else(|poisoned| poisoned.into_inner());
            inner = guard;
        }
        if self.external_pause.load(Ordering::Acquire) {
            return;
        }
        if inner.frame_advance_paused && inner.visual_refresh_permits > 0 {
            inner.frame_advance_step_active = false;
            return;
        }
        if inner.frame_advance_paused && inner.frame_advance_steps > 0 {
            inner.frame_advance_steps -= 1;
            inner.frame_advance_step_active = true;
        }
    }

    /// Blocks the CPU loop while paused with no step permit pending.
    pub fn wait_for_frame_advance_cpu_permit(&self) {
        let mut inner = self.lock();
        if !inner.frame_advance_paused || self.external_pause.load(Ordering::Acquire) {
            return;
        }
        while inner.frame_advance_paused
              && inner.frame_advance_steps == 0
              && !self.external_pause.load(Ordering::Acquire) {
            let (guard, _) = self.frame_advance_cv
                                 .wait_timeout(inner, WAIT_DEADLINE)
                                 .unwrap_or_else(|poisoned| poisoned.into_inner());
            inner = guard;
        }
    }
}

impl<H: VpadDriver> TasEngine<H> {
    /// Queues `steps` CPU frame advances. Ignored unless paused.
    ///
    /// Stale visual-refresh permits are dropped and every player's live
    /// input is primed so the stepped frame sees fresh controller state.
    pub fn request_frame_advance_step(&self, steps: u32) {
        if steps == 0 {
            return;
        }
        {
            let mut inner = self.lock();
            if !inner.frame_advance_paused {
                return;
            }
            inner.frame_advance_step_active = false;
            inner.visual_refresh_permits = 0;
            inner.frame_advance_steps = inner.frame_advance_steps.saturating_add(steps);
        }
        for player in 0..MAX_VPAD_PLAYERS {
            self.host.prime_live(player);
        }
        self.frame_advance_cv.notify_all();
    }
}
