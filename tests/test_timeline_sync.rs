//! Savestate integration: blob round-trips, cursor preservation and sync
//! descriptor validation.
mod common;

use std::fs;

use cafetas::TasEngine;
use cafetas::buttons::TasButtons;
use cafetas::formats::blob;
use cafetas::host::TasConfig;
use cafetas::movie::{MOVIE_SYNC_MAGIC, MOVIE_SYNC_VERSION, MovieMode, MovieRecordPolicy};
use cafetas::sample::VpadMovieSample;

use common::{MockHost, temp_movie_path};

fn recording_engine(name: &str, frames: u64) -> (TasEngine<MockHost>, std::path::PathBuf) {
    let engine = TasEngine::new(MockHost::with_title(0xCAFE));
    engine.reload_from_config(&TasConfig {
        movie_mode: 2,
        movie_record_policy: 1,
        ..Default::default()
    });
    let path = temp_movie_path(name);
    fs::remove_file(&path).ok();
    engine.ensure_movie_record_timeline(&path).unwrap();
    for runtime_frame in 0..frames {
        engine.record_vpad_sample(0, runtime_frame, &VpadMovieSample {
            buttons: TasButtons::A,
            ..Default::default()
        });
    }
    (engine, path)
}

#[test]
fn blob_round_trips_through_a_second_engine() {
    let (engine, path) = recording_engine("blob-rt.ctm", 12);
    let bytes = engine.serialize_movie_blob().unwrap();

    let restored = TasEngine::new(MockHost::with_title(0xCAFE));
    restored.reload_from_config(&TasConfig {
        movie_mode: 2,
        movie_record_policy: 1,
        ..Default::default()
    });
    restored.deserialize_movie_blob(&bytes).unwrap();
    assert_eq!(restored.movie_mode(), MovieMode::Record);

    // cursors, frames and counters survive byte-identically
    let again = restored.serialize_movie_blob().unwrap();
    assert_eq!(again, bytes);

    fs::remove_file(&path).ok();
}

#[test]
fn corrupt_blob_retains_the_previous_movie() {
    let (engine, path) = recording_engine("blob-bad.ctm", 3);
    let before = engine.serialize_movie_blob().unwrap();

    assert!(engine.deserialize_movie_blob(&[1, 2, 3]).is_err());
    let mut bad = before.clone();
    bad[4] = 99; // unsupported version
    assert!(engine.deserialize_movie_blob(&bad).is_err());

    assert_eq!(engine.serialize_movie_blob().unwrap(), before);

    fs::remove_file(&path).ok();
}

#[test]
fn disabled_engine_restores_read_only_blobs_as_playback() {
    let (engine, path) = recording_engine("blob-ro.ctm", 5);
    let bytes = engine.serialize_movie_blob().unwrap();

    let restored = TasEngine::new(MockHost::default());
    restored.deserialize_movie_blob(&bytes).unwrap();
    assert_eq!(restored.movie_mode(), MovieMode::Playback);
    assert_eq!(restored.movie_record_policy(), MovieRecordPolicy::ReadOnly);

    // the restored cursors seed playback where the recording stopped
    let movie = blob::read_movie_blob(&restored.serialize_movie_blob().unwrap()).unwrap();
    assert_eq!(movie.cursors, Some([5, 0, 0, 0]));

    fs::remove_file(&path).ok();
}

#[test]
fn serialize_requires_an_active_movie() {
    let engine = TasEngine::new(MockHost::default());
    assert!(engine.serialize_movie_blob().is_none());
    assert!(engine.capture_movie_sync().is_none());
}

#[test]
fn sync_descriptor_carries_the_movie_identity() {
    let (engine, path) = recording_engine("sync-cap.ctm", 4);
    engine.host().set_gpu_frame(1234);
    let sync = engine.capture_movie_sync().unwrap();
    assert_eq!(sync.magic, MOVIE_SYNC_MAGIC);
    assert_eq!(sync.version, MOVIE_SYNC_VERSION);
    assert!(sync.is_current());
    assert_eq!(sync.frame, 1234);
    assert_eq!(sync.rerecord_count, 0);
    assert_ne!(sync.signature, 0);
    let movie = blob::read_movie_blob(&engine.serialize_movie_blob().unwrap()).unwrap();
    assert_eq!(sync.movie_hash, movie.movie_hash);

    fs::remove_file(&path).ok();
}

#[test]
fn sync_mismatch_warns_only_under_read_only() {
    let (engine, path) = recording_engine("sync-val.ctm", 4);
    let mut sync = engine.capture_movie_sync().unwrap();
    assert_eq!(engine.validate_movie_sync(Some(&sync)), None);

    sync.movie_hash ^= 0xDEAD;
    // read-write tolerates the mismatch silently
    assert_eq!(engine.validate_movie_sync(Some(&sync)), None);

    // a read-only engine reports it, but still does not fail
    let bytes = engine.serialize_movie_blob().unwrap();
    let readonly = TasEngine::new(MockHost::default());
    readonly.deserialize_movie_blob(&bytes).unwrap();
    assert_eq!(readonly.movie_record_policy(), MovieRecordPolicy::ReadOnly);
    let message = readonly.validate_movie_sync(Some(&sync)).unwrap();
    assert!(message.contains("read-only"));

    // absent or unversioned descriptors pass
    assert_eq!(readonly.validate_movie_sync(None), None);
    sync.magic = 0;
    assert_eq!(readonly.validate_movie_sync(Some(&sync)), None);

    fs::remove_file(&path).ok();
}

#[test]
fn playback_cursors_survive_a_timeline_load() {
    let path = temp_movie_path("timeline-pb.ctm");
    let lines: String = (0..20u64)
        .map(|frame| format!("F,{},0,0,0,0,0,0,0,A,0,0\n", frame))
        .collect();
    fs::write(&path, format!("CTM1\n{}", lines)).unwrap();

    let engine = TasEngine::new(MockHost::default());
    engine.import_movie_for_playback(&path, 0).unwrap();
    for runtime_frame in 0..5u64 {
        engine.begin_vpad_poll(0, runtime_frame);
        engine.try_get_playback_sample(0, runtime_frame).unwrap();
    }

    // playback is poll driven: the cursor must not jump on a reload
    engine.on_timeline_loaded(42, None);
    assert!(!engine.is_movie_desynced());
    let movie = blob::read_movie_blob(&engine.serialize_movie_blob().unwrap()).unwrap();
    assert_eq!(movie.cursors.unwrap()[0], 5);

    // the poll latch was reset: a repeated runtime frame binds afresh
    engine.begin_vpad_poll(0, 4);
    let sample = engine.try_get_playback_sample(0, 4).unwrap();
    assert_eq!(sample.buttons, TasButtons::A);
    let movie = blob::read_movie_blob(&engine.serialize_movie_blob().unwrap()).unwrap();
    assert_eq!(movie.cursors.unwrap()[0], 6);

    fs::remove_file(&path).ok();
}

#[test]
fn restored_record_cursors_steer_the_rerecord_truncation() {
    let (engine, path) = recording_engine("timeline-rr.ctm", 10);
    let bytes = engine.serialize_movie_blob().unwrap();

    let restored = TasEngine::new(MockHost::with_title(0xCAFE));
    restored.reload_from_config(&TasConfig {
        movie_mode: 2,
        movie_record_policy: 1,
        ..Default::default()
    });
    let record_path = temp_movie_path("timeline-rr-restored.ctm");
    fs::remove_file(&record_path).ok();
    restored.ensure_movie_record_timeline(&record_path).unwrap();
    restored.deserialize_movie_blob(&bytes).unwrap();

    // with cursors restored from the blob the truncation target is the
    // largest cursor minus one, not the host frame
    let sync = restored.capture_movie_sync().unwrap();
    restored.on_timeline_loaded(3, Some(&sync));
    let movie = blob::read_movie_blob(&restored.serialize_movie_blob().unwrap()).unwrap();
    assert_eq!(movie.players[0].max_frame(), 9);
    assert_eq!(movie.players[0].len(), 10);
    assert_eq!(movie.rerecord_count, 1);

    fs::remove_file(&path).ok();
    fs::remove_file(&record_path).ok();
}
