/*
    Copyright (C) 2026  Rafal Michalski

    This file is part of CAFETAS, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! Movie file import, export and the record-path text flush.
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Error, ErrorKind, Write};
use std::path::Path;

use log::warn;

use cafetas_core::MAX_VPAD_PLAYERS;
use cafetas_core::host::HostSystem;
use cafetas_core::movie::MovieMode;
use cafetas_formats::ctm;
use cafetas_formats::ctm::{MovieText, MovieTextMeta};

use super::{EngineInner, TasEngine};

fn invalid_path() -> Error {
    Error::new(ErrorKind::InvalidInput, "Invalid movie file path")
}

fn open_failed(err: Error) -> Error {
    Error::new(err.kind(), format!("Failed to open movie file: {}", err))
}

/// Metadata defaults a text parse starts from: the loop and determinism
/// flags keep their current values, everything else resets.
fn text_parse_defaults(inner: &EngineInner) -> MovieTextMeta {
    MovieTextMeta {
        loop_enabled: inner.loop_enabled,
        deterministic_scheduler: inner.deterministic_scheduler,
        deterministic_time: inner.deterministic_time,
        ..Default::default()
    }
}

fn adopt_movie_text(inner: &mut EngineInner, movie: MovieText) {
    let MovieText { meta, players } = movie;
    inner.players = players;
    inner.loop_enabled = meta.loop_enabled;
    inner.deterministic_scheduler = meta.deterministic_scheduler;
    inner.deterministic_time = meta.deterministic_time;
    inner.input_timing = meta.input_timing;
    inner.rerecord_count = meta.rerecord_count;
    inner.movie_hash = meta.movie_hash;
    inner.movie_title_id = meta.title_id;
    inner.desynced = false;
    inner.dirty = false;
    inner.last_recorded_frame = None;
}

impl EngineInner {
    /// Rewrites the whole movie text file in place (truncate + rewrite).
    ///
    /// Returns `false` when no file is attached or writing fails; the
    /// caller decides whether the movie stays dirty.
    pub(crate) fn flush_movie_to_file(&self, title_id: u64) -> bool {
        let path = match self.file {
            Some(ref path) if !path.as_os_str().is_empty() => path,
            _ => return false
        };
        let file = match File::create(path) {
            Ok(file) => file,
            Err(_) => return false
        };
        let mut writer = BufWriter::new(file);
        let meta = self.text_meta(self.movie_mode as u32, title_id);
        ctm::write_movie_text(&mut writer, &meta, &self.players).is_ok()
            && writer.flush().is_ok()
    }
}

impl<H: HostSystem> TasEngine<H> {
    /// Imports a movie file and switches the engine to playback mode.
    ///
    /// A non-zero `start_movie_frame` seeds every playback cursor, letting
    /// a movie resume from the middle of its timeline. Nothing of the
    /// previous movie survives a failed parse.
    pub fn import_movie_for_playback(
            &self,
            path: &Path,
            start_movie_frame: u64
        ) -> io::Result<()>
    {
        let mut inner = self.lock();
        if path.as_os_str().is_empty() {
            return Err(invalid_path());
        }
        let file = File::open(path).map_err(open_failed)?;
        let movie = ctm::parse_movie_text(BufReader::new(file),
                                          ctm::flavor_for_path(path),
                                          text_parse_defaults(&inner))?;
        adopt_movie_text(&mut inner, movie);
        inner.file = Some(path.to_path_buf());
        inner.movie_mode = MovieMode::Playback;
        inner.reset_frame_advance();
        inner.reset_poll_state();
        inner.playback_cursor = [start_movie_frame; MAX_VPAD_PLAYERS];
        inner.init_record_cursor_from_frames();
        inner.cursor_restored_from_blob = start_movie_frame > 0;
        inner.last_flush_frame = None;
        inner.enforce_strict_tas();
        if inner.movie_hash == 0 {
            inner.movie_hash = self.compute_movie_hash(&inner);
        }
        inner.signatures_trusted = inner.evaluate_signatures_trusted();
        if !inner.signatures_trusted {
            warn!("TAS: movie signatures marked untrusted (using frame-order playback)");
        }
        Ok(())
    }

    /// Attaches a record timeline backed by `path` and switches to record
    /// mode.
    ///
    /// Recording the same file again is a no-op, as is any call while a
    /// playback movie is active. An existing file is loaded first so
    /// recording continues after its stored tail; a missing file starts an
    /// empty timeline.
    pub fn ensure_movie_record_timeline(&self, path: &Path) -> io::Result<()> {
        let mut inner = self.lock();
        if path.as_os_str().is_empty() {
            return Err(invalid_path());
        }
        if inner.movie_mode == MovieMode::Record && inner.file.as_deref() == Some(path) {
            return Ok(());
        }
        if inner.movie_mode == MovieMode::Playback {
            return Ok(());
        }
        if inner.movie_mode == MovieMode::Disabled || inner.file.as_deref() != Some(path) {
            let movie = match File::open(path) {
                Ok(file) => ctm::parse_movie_text(BufReader::new(file),
                                                  ctm::flavor_for_path(path),
                                                  text_parse_defaults(&inner))?,
                // Keep recording and playback in one timing model.
                Err(_) => MovieText {
                    meta: text_parse_defaults(&inner),
                    ..Default::default()
                }
            };
            adopt_movie_text(&mut inner, movie);
            inner.file = Some(path.to_path_buf());
        }
        inner.movie_mode = MovieMode::Record;
        inner.reset_frame_advance();
        inner.signatures_trusted = true;
        inner.reset_poll_state();
        inner.init_record_cursor_from_frames();
        inner.cursor_restored_from_blob = false;
        inner.last_flush_frame = None;
        inner.enforce_strict_tas();
        inner.movie_hash = self.compute_movie_hash(&inner);
        Ok(())
    }

    /// Writes the current movie to `path` in the CTM text format.
    ///
    /// The exported metadata always claims playback mode so a reimported
    /// file starts as a playback movie; the periodic flush writes the live
    /// mode instead.
    pub fn export_movie_to_file(&self, path: &Path) -> io::Result<()> {
        let inner = self.lock();
        if path.as_os_str().is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput, "Invalid output path"));
        }
        if inner.movie_mode == MovieMode::Disabled {
            return Err(Error::new(ErrorKind::Other, "Movie mode is disabled"));
        }
        let file = File::create(path).map_err(|err| {
            Error::new(err.kind(), format!("Failed to open movie output file: {}", err))
        })?;
        let mut writer = BufWriter::new(file);
        let meta = inner.text_meta(MovieMode::Playback as u32, self.host.foreground_title_id());
        ctm::write_movie_text(&mut writer, &meta, &inner.players)?;
        writer.flush()
    }
}

/// Reads the title id a movie file was recorded for without loading it.
pub fn read_movie_title_id_from_file(path: &Path) -> io::Result<u64> {
    if path.as_os_str().is_empty() {
        return Err(invalid_path());
    }
    let file = File::open(path).map_err(open_failed)?;
    ctm::read_title_id(BufReader::new(file))
}
