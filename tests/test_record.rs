//! Record-path scenarios: per-frame idempotence, the text flush policy,
//! rerecord on savestate load and the export asymmetry.
mod common;

use std::fs;
use std::io::Cursor;

use cafetas::TasEngine;
use cafetas::buttons::TasButtons;
use cafetas::formats::blob;
use cafetas::formats::ctm::{self, MovieTextFlavor, MovieTextMeta};
use cafetas::host::TasConfig;
use cafetas::movie::{MovieMode, MovieRecordPolicy};
use cafetas::sample::VpadMovieSample;

use common::{MockHost, temp_movie_path};

fn record_engine(name: &str) -> (TasEngine<MockHost>, std::path::PathBuf) {
    let host = MockHost::with_title(0x0005_0000_1234_5678);
    let engine = TasEngine::new(host);
    engine.reload_from_config(&TasConfig {
        movie_mode: 2,
        movie_record_policy: 1,
        ..Default::default()
    });
    assert_eq!(engine.movie_mode(), MovieMode::Record);
    assert_eq!(engine.movie_record_policy(), MovieRecordPolicy::ReadWrite);
    let path = temp_movie_path(name);
    fs::remove_file(&path).ok();
    engine.ensure_movie_record_timeline(&path).unwrap();
    (engine, path)
}

fn button_sample(buttons: TasButtons) -> VpadMovieSample {
    VpadMovieSample { buttons, ..Default::default() }
}

fn stored_movie(engine: &TasEngine<MockHost>) -> blob::MovieBlob {
    blob::read_movie_blob(&engine.serialize_movie_blob().unwrap()).unwrap()
}

#[test]
fn one_record_write_per_runtime_frame() {
    let (engine, path) = record_engine("dedup.ctm");
    let sample = button_sample(TasButtons::A);
    engine.record_vpad_sample(0, 5, &sample);
    engine.record_vpad_sample(0, 5, &button_sample(TasButtons::B));
    engine.record_vpad_sample(0, 5, &button_sample(TasButtons::X));

    let movie = stored_movie(&engine);
    assert_eq!(movie.players[0].len(), 1);
    assert_eq!(movie.players[0].frames()[0].buttons, TasButtons::A);
    assert_ne!(movie.players[0].frames()[0].signature, 0);

    // the next runtime frame lands on the next movie frame
    engine.record_vpad_sample(0, 6, &button_sample(TasButtons::B));
    let movie = stored_movie(&engine);
    assert_eq!(movie.players[0].len(), 2);
    assert_eq!(movie.players[0].frames()[1].frame, 1);
    assert_eq!(movie.last_recorded_frame, Some(1));

    fs::remove_file(&path).ok();
}

#[test]
fn flush_policy_is_first_then_interval() {
    let (engine, path) = record_engine("flush.ctm");
    engine.record_vpad_sample(0, 0, &button_sample(TasButtons::A));
    assert!(!path.exists());

    // the first flush happens on the first presented frame
    engine.on_frame_presented(0);
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().filter(|l| l.starts_with("F,")).count(), 1);
    // the flush writes the live (record) mode
    assert!(text.lines().any(|l| l == "M,movie_mode,2"));

    // a dirty movie is not rewritten before the interval elapses
    engine.record_vpad_sample(0, 1, &button_sample(TasButtons::B));
    engine.on_frame_presented(10);
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().filter(|l| l.starts_with("F,")).count(), 1);

    engine.on_frame_presented(30);
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().filter(|l| l.starts_with("F,")).count(), 2);

    // a clean movie is never rewritten
    fs::remove_file(&path).unwrap();
    engine.on_frame_presented(100);
    assert!(!path.exists());
}

#[test]
fn rerecord_truncates_bumps_and_flushes() {
    let (engine, path) = record_engine("rerecord.ctm");
    for runtime_frame in 0..10u64 {
        engine.record_vpad_sample(0, runtime_frame, &button_sample(TasButtons::A));
    }
    let sync = engine.capture_movie_sync().unwrap();
    engine.on_timeline_loaded(4, Some(&sync));

    let movie = stored_movie(&engine);
    assert_eq!(movie.players[0].len(), 5);
    assert_eq!(movie.players[0].max_frame(), 4);
    assert_eq!(movie.rerecord_count, 1);
    // the rerecord flushed immediately
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().filter(|l| l.starts_with("F,")).count(), 5);
    assert!(text.lines().any(|l| l == "M,rerecord_count,1"));

    // recording resumes one past the preserved tail
    engine.record_vpad_sample(0, 100, &button_sample(TasButtons::B));
    let movie = stored_movie(&engine);
    assert_eq!(movie.players[0].max_frame(), 5);
    assert_eq!(movie.players[0].frames()[5].buttons, TasButtons::B);

    fs::remove_file(&path).ok();
}

#[test]
fn rerecord_requires_current_sync_and_read_write() {
    let (engine, path) = record_engine("rerecord-ro.ctm");
    for runtime_frame in 0..10u64 {
        engine.record_vpad_sample(0, runtime_frame, &button_sample(TasButtons::A));
    }
    // a missing or stale sync descriptor leaves the movie untouched
    engine.on_timeline_loaded(4, None);
    assert_eq!(stored_movie(&engine).players[0].len(), 10);
    let mut stale = engine.capture_movie_sync().unwrap();
    stale.version = 99;
    engine.on_timeline_loaded(4, Some(&stale));
    assert_eq!(stored_movie(&engine).players[0].len(), 10);
    assert_eq!(stored_movie(&engine).rerecord_count, 0);

    fs::remove_file(&path).ok();
}

#[test]
fn record_timeline_reload_is_idempotent() {
    let (engine, path) = record_engine("reattach.ctm");
    engine.record_vpad_sample(0, 0, &button_sample(TasButtons::A));
    engine.on_frame_presented(0);

    // attaching the same file again is a no-op
    engine.ensure_movie_record_timeline(&path).unwrap();
    assert_eq!(stored_movie(&engine).players[0].len(), 1);

    // a fresh engine picks the stored tail up from the file
    let other = TasEngine::new(MockHost::default());
    other.reload_from_config(&TasConfig {
        movie_mode: 2,
        movie_record_policy: 1,
        ..Default::default()
    });
    other.ensure_movie_record_timeline(&path).unwrap();
    other.record_vpad_sample(0, 50, &button_sample(TasButtons::B));
    let movie = stored_movie(&other);
    assert_eq!(movie.players[0].len(), 2);
    assert_eq!(movie.players[0].frames()[1].frame, 1);

    fs::remove_file(&path).ok();
}

#[test]
fn export_always_claims_playback_mode() {
    let (engine, path) = record_engine("export.ctm");
    engine.record_vpad_sample(0, 0, &button_sample(TasButtons::A|TasButtons::ZR));
    let export_path = temp_movie_path("exported.ctm");
    engine.export_movie_to_file(&export_path).unwrap();

    let text = fs::read_to_string(&export_path).unwrap();
    assert!(text.lines().any(|l| l == "M,movie_mode,1"));
    assert!(text.lines().any(|l| l == "M,movie_record_policy,1"));

    // the exported file reimports to the identical timeline
    let parsed = ctm::parse_movie_text(Cursor::new(text.as_bytes()),
                                       MovieTextFlavor::Ctm,
                                       MovieTextMeta::default()).unwrap();
    assert_eq!(parsed.players[0].frames(), stored_movie(&engine).players[0].frames());

    fs::remove_file(&path).ok();
    fs::remove_file(&export_path).ok();
}

#[test]
fn export_requires_an_active_movie() {
    let engine = TasEngine::new(MockHost::default());
    let export_path = temp_movie_path("inactive.ctm");
    assert!(engine.export_movie_to_file(&export_path).is_err());
    assert!(!export_path.exists());
}
