/*
    Copyright (C) 2026  Rafal Michalski

    This file is part of CAFETAS, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! Savestate ("timeline") integration: the movie blob and rerecord handling.
use std::io;

use log::{info, warn};

use cafetas_core::hash::runtime_signature;
use cafetas_core::host::{HostClock, HostSystem};
use cafetas_core::movie::{
    MOVIE_SYNC_MAGIC, MOVIE_SYNC_VERSION,
    MovieMode, MovieRecordPolicy, MovieSyncData
};
use cafetas_formats::blob;
use cafetas_formats::blob::MovieBlob;

use super::TasEngine;

impl<H: HostClock> TasEngine<H> {
    /// Captures a sync descriptor for the host to store next to a
    /// savestate; `None` while no movie is active.
    pub fn capture_movie_sync(&self) -> Option<MovieSyncData> {
        let inner = self.lock();
        if inner.movie_mode == MovieMode::Disabled {
            return None;
        }
        let frame = self.host.gpu_frame_counter();
        Some(MovieSyncData {
            magic: MOVIE_SYNC_MAGIC,
            version: MOVIE_SYNC_VERSION,
            movie_hash: inner.movie_hash,
            frame,
            rerecord_count: inner.rerecord_count,
            signature: runtime_signature(frame, frame),
        })
    }
}

impl<H> TasEngine<H> {
    /// Checks a restored sync descriptor against the loaded movie.
    ///
    /// Never fails: a hash mismatch under the read-only policy is logged
    /// and returned as a message for the UI, everything else passes
    /// silently. The engine prefers progress to hard aborts.
    pub fn validate_movie_sync(&self, sync: Option<&MovieSyncData>) -> Option<String> {
        let inner = self.lock();
        if inner.movie_mode == MovieMode::Disabled {
            return None;
        }
        let sync = sync?;
        if !sync.is_current() {
            return None;
        }
        if sync.movie_hash != inner.movie_hash
           && inner.record_policy == MovieRecordPolicy::ReadOnly {
            let mut message = String::from("Timeline movie sync mismatch (read-only mode)");
            if inner.strict_tas {
                message.push_str(" [strict TAS mode]");
            }
            warn!("TAS: {}", message);
            return Some(message);
        }
        None
    }

    /// Serializes the movie into its savestate blob; `None` while no
    /// movie is active.
    ///
    /// Record mode stores the record cursors, playback mode the playback
    /// cursors, so a restore resumes from the right poll position.
    pub fn serialize_movie_blob(&self) -> Option<Vec<u8>> {
        let inner = self.lock();
        if inner.movie_mode == MovieMode::Disabled {
            return None;
        }
        let cursors = if inner.movie_mode == MovieMode::Record {
            inner.record_cursor
        }
        else {
            inner.playback_cursor
        };
        let movie_blob = MovieBlob {
            movie_mode: inner.movie_mode as u32,
            record_policy: inner.record_policy as u32,
            loop_enabled: inner.loop_enabled,
            deterministic_scheduler: inner.deterministic_scheduler,
            deterministic_time: inner.deterministic_time,
            rerecord_count: inner.rerecord_count,
            movie_hash: inner.movie_hash,
            last_recorded_frame: inner.last_recorded_frame,
            players: inner.players.clone(),
            input_timing: inner.input_timing,
            cursors: Some(cursors),
        };
        Some(blob::write_movie_blob(&movie_blob))
    }
}

impl<H: HostSystem> TasEngine<H> {
    /// Replaces the movie with a blob restored from a savestate.
    ///
    /// The previous movie is retained on any decode error. The live mode
    /// takes precedence over the blob's stored mode: an active playback
    /// stays playback, an active read-write record stays record, and
    /// otherwise the runtime configuration decides, defaulting to
    /// playback for read-only restores.
    pub fn deserialize_movie_blob(&self, data: &[u8]) -> io::Result<()> {
        let mut inner = self.lock();
        let active_mode = inner.movie_mode;
        let runtime_mode = match inner.cfg_movie_mode.min(2) {
            2 => MovieMode::Record,
            1 => MovieMode::Playback,
            _ => MovieMode::Disabled
        };
        let runtime_policy = if inner.cfg_record_policy.min(1) == 1 {
            MovieRecordPolicy::ReadWrite
        }
        else {
            MovieRecordPolicy::ReadOnly
        };

        let movie_blob = blob::read_movie_blob(data)?;

        inner.players = movie_blob.players;
        inner.input_timing = movie_blob.input_timing;
        inner.loop_enabled = movie_blob.loop_enabled;
        inner.deterministic_scheduler = movie_blob.deterministic_scheduler;
        inner.deterministic_time = movie_blob.deterministic_time;
        inner.enforce_strict_tas();
        // The stored mode and policy words are historical; policy always
        // follows the runtime configuration.
        inner.record_policy = runtime_policy;
        inner.movie_mode = if active_mode == MovieMode::Playback {
            MovieMode::Playback
        }
        else if active_mode == MovieMode::Record
                && runtime_policy == MovieRecordPolicy::ReadWrite {
            MovieMode::Record
        }
        else if runtime_mode == MovieMode::Disabled
                && runtime_policy == MovieRecordPolicy::ReadOnly {
            MovieMode::Playback
        }
        else if runtime_mode == MovieMode::Disabled {
            MovieMode::Disabled
        }
        else if runtime_mode == MovieMode::Record
                && runtime_policy == MovieRecordPolicy::ReadWrite {
            MovieMode::Record
        }
        else {
            MovieMode::Playback
        };
        inner.rerecord_count = movie_blob.rerecord_count;
        inner.movie_hash = if movie_blob.movie_hash != 0 {
            movie_blob.movie_hash
        }
        else {
            self.compute_movie_hash(&inner)
        };
        inner.desynced = false;
        inner.dirty = false;
        inner.last_recorded_frame = movie_blob.last_recorded_frame;
        inner.reset_poll_state();
        match movie_blob.cursors {
            Some(cursors) => {
                inner.playback_cursor = cursors;
                inner.record_cursor = cursors;
                inner.cursor_restored_from_blob = true;
            }
            None => {
                inner.init_record_cursor_from_frames();
                inner.cursor_restored_from_blob = false;
            }
        }
        inner.signatures_trusted = inner.evaluate_signatures_trusted();
        if !inner.signatures_trusted {
            warn!("TAS: movie signatures marked untrusted (using frame-order playback)");
        }
        Ok(())
    }

    /// Called after the host restored a savestate at `restored_frame`.
    ///
    /// Poll latches and caches reset, but playback keeps its poll cursors:
    /// playback is poll driven, so the cursor must not jump on a reload of
    /// a blob written mid-playback. A read-write record truncates the
    /// movie at the restored position, bumps the rerecord counter and
    /// flushes immediately.
    pub fn on_timeline_loaded(&self, restored_frame: u64, sync: Option<&MovieSyncData>) {
        let mut inner = self.lock();
        let preserved_playback = inner.playback_cursor;
        let preserved_record = inner.record_cursor;
        inner.reset_poll_state();
        inner.last_recorded_frame = None;

        if inner.movie_mode == MovieMode::Playback {
            inner.playback_cursor = preserved_playback;
            inner.record_cursor = preserved_record;
            inner.cursor_restored_from_blob = false;
            inner.desynced = false;
            info!("TAS: timeline playback anchored runtimeFrame={} movieFrame0={}",
                  restored_frame, inner.playback_cursor[0]);
        }
        if inner.movie_mode != MovieMode::Record {
            return;
        }
        if !sync.map_or(false, MovieSyncData::is_current) {
            return;
        }
        if inner.record_policy == MovieRecordPolicy::ReadOnly {
            return;
        }

        let mut truncate_at = restored_frame;
        if inner.cursor_restored_from_blob {
            let max_cursor = preserved_record.iter().copied().max().unwrap_or(0);
            truncate_at = max_cursor.saturating_sub(1);
        }
        for player in inner.players.iter_mut() {
            player.truncate_after(truncate_at);
        }
        inner.init_record_cursor_from_frames();
        inner.cursor_restored_from_blob = false;
        inner.rerecord_count = inner.rerecord_count.wrapping_add(1);
        inner.movie_hash = self.compute_movie_hash(&inner);
        inner.dirty = true;
        inner.flush_movie_to_file(self.host.foreground_title_id());
        inner.dirty = false;
        inner.last_flush_frame = Some(restored_frame);
    }
}
