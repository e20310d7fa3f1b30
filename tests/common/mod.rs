#![allow(dead_code)]
//! A scriptable host shared by the engine integration tests.
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use cafetas::host::{HostClock, HostSystem, VpadDriver};
use cafetas::sample::FrameInput;

#[derive(Debug, Default)]
pub struct MockHost {
    pub gpu_frame: AtomicU64,
    pub title_id: AtomicU64,
    pub live: Mutex<FrameInput>,
    pub captures: AtomicUsize,
    pub primes: AtomicUsize,
}

impl MockHost {
    pub fn with_title(title_id: u64) -> MockHost {
        let host = MockHost::default();
        host.title_id.store(title_id, Ordering::SeqCst);
        host
    }

    pub fn set_gpu_frame(&self, frame: u64) {
        self.gpu_frame.store(frame, Ordering::SeqCst);
    }

    pub fn set_live(&self, input: FrameInput) {
        *self.live.lock().unwrap() = input;
    }
}

impl VpadDriver for MockHost {
    fn capture_live(&self, _player: usize) -> FrameInput {
        self.captures.fetch_add(1, Ordering::SeqCst);
        *self.live.lock().unwrap()
    }

    fn prime_live(&self, _player: usize) {
        self.primes.fetch_add(1, Ordering::SeqCst);
    }
}

impl HostClock for MockHost {
    fn gpu_frame_counter(&self) -> u64 {
        self.gpu_frame.load(Ordering::SeqCst)
    }
}

impl HostSystem for MockHost {
    fn foreground_title_id(&self) -> u64 {
        self.title_id.load(Ordering::SeqCst)
    }
}

/// A per-process unique scratch path; tests clean up behind themselves.
pub fn temp_movie_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("cafetas-test-{}-{}", std::process::id(), name));
    path
}
