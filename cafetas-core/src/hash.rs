/*
    Copyright (C) 2026  Rafal Michalski

    This file is part of CAFETAS, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! FNV-1a hashing primitives, runtime signatures and the movie hash.
use crate::movie::PlayerTimeline;

/// FNV-1a 32-bit offset basis.
pub const FNV1A32_INIT: u32 = 2166136261;
/// FNV-1a 64-bit offset basis.
pub const FNV1A64_INIT: u64 = 14695981039346656037;
/// Seed mixed into every runtime signature.
pub const MOVIE_SIGNATURE_SALT: u32 = 0xC3D2_F1A5;

/// Folds `bytes` into an FNV-1a 32-bit hash continued from `seed`.
pub fn fnv1a32(bytes: &[u8], seed: u32) -> u32 {
    let mut hash = seed;
    for &byte in bytes {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(16777619);
    }
    hash
}

/// Folds `bytes` into an FNV-1a 64-bit hash continued from `seed`.
pub fn fnv1a64(bytes: &[u8], seed: u64) -> u64 {
    let mut hash = seed;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    hash
}

/// The signature binding a recorded sample to `(runtime_frame, gpu_frame_counter)`.
pub fn runtime_signature(runtime_frame: u64, gpu_frame_counter: u64) -> u32 {
    let hash = fnv1a32(&runtime_frame.to_le_bytes(), MOVIE_SIGNATURE_SALT);
    fnv1a32(&gpu_frame_counter.to_le_bytes(), hash)
}

/// A 64-bit digest of the whole movie used for cross-savestate validation.
///
/// Covers the foreground title id, then for each player its index followed
/// by the canonical wire bytes of every frame.
pub fn movie_hash(title_id: u64, players: &[PlayerTimeline]) -> u64 {
    let mut hash = fnv1a64(&title_id.to_le_bytes(), FNV1A64_INIT);
    for (index, player) in players.iter().enumerate() {
        hash = fnv1a64(&(index as u64).to_le_bytes(), hash);
        for input in player.frames() {
            hash = fnv1a64(&input.to_raw_bytes(), hash);
        }
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::FrameInput;

    #[test]
    fn fnv1a32_vectors() {
        // Standard FNV-1a test vectors.
        assert_eq!(fnv1a32(b"", FNV1A32_INIT), 0x811c9dc5);
        assert_eq!(fnv1a32(b"a", FNV1A32_INIT), 0xe40c292c);
        assert_eq!(fnv1a32(b"foobar", FNV1A32_INIT), 0xbf9cf968);
    }

    #[test]
    fn fnv1a64_vectors() {
        assert_eq!(fnv1a64(b"", FNV1A64_INIT), 0xcbf29ce484222325);
        assert_eq!(fnv1a64(b"a", FNV1A64_INIT), 0xaf63dc4c8601ec8c);
        assert_eq!(fnv1a64(b"foobar", FNV1A64_INIT), 0x85944171f73967e8);
    }

    #[test]
    fn signature_depends_on_both_inputs() {
        let base = runtime_signature(100, 7);
        assert_ne!(base, 0);
        assert_ne!(base, runtime_signature(101, 7));
        assert_ne!(base, runtime_signature(100, 8));
        assert_eq!(base, runtime_signature(100, 7));
    }

    #[test]
    fn movie_hash_changes_with_content() {
        let mut players = vec![PlayerTimeline::default(), PlayerTimeline::default()];
        let empty = movie_hash(1, &players);
        assert_ne!(empty, movie_hash(2, &players));
        players[0].upsert(FrameInput { frame: 0, ..Default::default() });
        let one = movie_hash(1, &players);
        assert_ne!(empty, one);
        // The same frame on another player hashes differently.
        let mut players2 = vec![PlayerTimeline::default(), PlayerTimeline::default()];
        players2[1].upsert(FrameInput { frame: 0, ..Default::default() });
        assert_ne!(one, movie_hash(1, &players2));
    }
}
