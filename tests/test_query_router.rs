//! Query-router scenarios: source precedence, passthrough caching and
//! turbo evaluation.
mod common;

use std::fs;
use std::sync::atomic::Ordering;

use cafetas::TasEngine;
use cafetas::buttons::TasButtons;
use cafetas::host::TasConfig;
use cafetas::mapping::VpadMapping;
use cafetas::sample::{FrameInput, ManualState, VpadMovieSample};

use common::{MockHost, temp_movie_path};

#[test]
fn manual_state_drives_mapping_queries() {
    let engine = TasEngine::new(MockHost::default());
    engine.set_manual_input_state(0, ManualState {
        lx: -0.5,
        zl: 0.25,
        buttons: TasButtons::A,
        ..Default::default()
    });

    assert_eq!(engine.query_vpad_mapping(0, 0, VpadMapping::A), Some(1.0));
    assert_eq!(engine.query_vpad_mapping(0, 0, VpadMapping::B), Some(0.0));
    assert_eq!(engine.query_vpad_mapping(0, 0, VpadMapping::Zl), Some(0.25));
    assert_eq!(engine.query_vpad_mapping(0, 0, VpadMapping::StickLLeft), Some(0.5));
    assert_eq!(engine.query_vpad_mapping(0, 0, VpadMapping::StickLRight), Some(0.0));
    // raw ids resolve through the same path, unknown ids do not
    assert_eq!(engine.query_vpad_mapping_raw(0, 0, VpadMapping::A as u64), Some(1.0));
    assert_eq!(engine.query_vpad_mapping_raw(0, 0, 999), None);
    assert_eq!(engine.query_vpad_mapping(9, 0, VpadMapping::A), None);
}

#[test]
fn manual_turbo_phases() {
    // S5: turbo mask A with interval 3 passes frames 0-2, drops 3-5, ...
    let engine = TasEngine::new(MockHost::default());
    engine.set_manual_input_state(0, ManualState {
        buttons: TasButtons::A|TasButtons::B,
        ..Default::default()
    });
    engine.set_manual_turbo_mask(0, TasButtons::A);
    engine.set_manual_turbo_interval(0, 3);

    for runtime_frame in 0..9u64 {
        let a = engine.query_vpad_mapping(0, runtime_frame, VpadMapping::A).unwrap();
        let b = engine.query_vpad_mapping(0, runtime_frame, VpadMapping::B).unwrap();
        let expected = if (runtime_frame / 3) & 1 == 0 { 1.0 } else { 0.0 };
        assert_eq!(a, expected, "frame {}", runtime_frame);
        assert_eq!(b, 1.0);
    }
}

#[test]
fn turbo_interval_is_never_zero() {
    let engine = TasEngine::new(MockHost::default());
    engine.set_manual_turbo_interval(0, 0);
    assert_eq!(engine.manual_turbo_interval(0), 1);
    assert_eq!(engine.manual_turbo_interval(9), 1);
}

#[test]
fn passthrough_captures_once_per_frame_and_mirrors_manual() {
    let host = MockHost::default();
    host.set_live(FrameInput {
        lx: 0.5,
        buttons: TasButtons::A,
        ..Default::default()
    });
    let engine = TasEngine::new(host);
    engine.set_controller_passthrough_enabled(true);

    // several same-frame queries cost a single live capture
    for _ in 0..4 {
        assert_eq!(engine.query_vpad_mapping(0, 0, VpadMapping::A), Some(1.0));
    }
    assert_eq!(engine.host().captures.load(Ordering::SeqCst), 1);
    // the captured values drive the manual layer
    let manual = engine.manual_input_state(0);
    assert_eq!(manual.lx, 0.5);
    assert_eq!(manual.buttons, TasButtons::A);

    // a new poll frame invalidates the cache
    engine.begin_vpad_poll(0, 1);
    engine.host().set_live(FrameInput { buttons: TasButtons::B, ..Default::default() });
    assert_eq!(engine.query_vpad_mapping(0, 1, VpadMapping::B), Some(1.0));
    assert_eq!(engine.host().captures.load(Ordering::SeqCst), 2);
}

#[test]
fn passthrough_turbo_drops_held_buttons_on_odd_phases() {
    // S5: passthrough holds A, turbo interval 3
    let host = MockHost::default();
    host.set_live(FrameInput { buttons: TasButtons::A, ..Default::default() });
    let engine = TasEngine::new(host);
    engine.set_controller_passthrough_enabled(true);
    engine.set_manual_turbo_mask(0, TasButtons::A);
    engine.set_manual_turbo_interval(0, 3);

    for runtime_frame in 0..9u64 {
        engine.begin_vpad_poll(0, runtime_frame);
        let value = engine.query_vpad_mapping(0, runtime_frame, VpadMapping::A).unwrap();
        let expected = if (runtime_frame / 3) & 1 == 0 { 1.0 } else { 0.0 };
        assert_eq!(value, expected, "frame {}", runtime_frame);
    }
}

#[test]
fn playback_and_record_modes_suppress_mapping_overrides() {
    let path = temp_movie_path("router-playback.ctm");
    fs::write(&path, "CTM1\nF,0,0,0,0,0,0,0,0,A,0,0\n").unwrap();
    let engine = TasEngine::new(MockHost::default());
    engine.import_movie_for_playback(&path, 0).unwrap();
    // playback injects at the sample boundary, not per mapping
    assert_eq!(engine.query_vpad_mapping(0, 0, VpadMapping::A), None);
    fs::remove_file(&path).ok();

    let record = TasEngine::new(MockHost::default());
    record.reload_from_config(&TasConfig {
        movie_mode: 2,
        movie_record_policy: 1,
        ..Default::default()
    });
    record.set_manual_input_enabled(false);
    // record reads live inputs, it does not suppress them
    assert_eq!(record.query_vpad_mapping(0, 0, VpadMapping::A), None);
    record.record_vpad_sample(0, 0, &VpadMovieSample::default());
}

#[test]
fn disabled_engine_with_manual_off_answers_nothing() {
    let engine = TasEngine::new(MockHost::default());
    engine.set_manual_input_enabled(false);
    assert_eq!(engine.query_vpad_mapping(0, 0, VpadMapping::A), None);
}
