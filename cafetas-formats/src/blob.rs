/*
    Copyright (C) 2026  Rafal Michalski

    This file is part of CAFETAS, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
/*! Binary movie blob utilities.

The blob is the movie payload embedded in host savestates. All fields are
little-endian, with no padding and no checksum. Version 3 layout:

| field                                   | size |
|-----------------------------------------|------|
| magic `"CTMB"`                          | u32  |
| version = 3                             | u32  |
| movie mode, record policy, loop         | 3×u32|
| deterministic scheduler, time           | 2×u32|
| rerecord count                          | u32  |
| movie hash                              | u64  |
| last recorded frame (`u64::MAX` = none) | u64  |
| player count                            | u32  |
| per player: max frame, frame count      | u64, u32 |
| per frame: ordinal, 6 axes, buttons, signature, hold | u64, 6×f32, 3×u32 |
| input timing                            | u32  |
| per-player poll cursors                 | N×u64|

Version 1 ends after the player data; version 2 adds the timing word and
the cursor array; version 3 adds the per-frame hold bits. The reader
accepts any version up to 3 and fills missing fields with defaults.
*/
use std::io;
use std::io::{Error, ErrorKind};

use log::warn;

use cafetas_core::MAX_VPAD_PLAYERS;
use cafetas_core::buttons::TasButtons;
use cafetas_core::movie::{MovieInputTiming, PlayerTimeline};
use cafetas_core::sample::{FrameInput, clamp_stick, clamp_trigger};

/// Magic of the movie blob: `"CTMB"`.
pub const MOVIE_BLOB_MAGIC: u32 = 0x424D_5443;
/// The movie blob version this module writes.
pub const MOVIE_BLOB_VERSION: u32 = 3;

/// An in-memory image of the movie blob.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MovieBlob {
    /// Raw movie mode word; how it interacts with the runtime
    /// configuration is the engine's business.
    pub movie_mode: u32,
    /// Raw record policy word, see [MovieBlob::movie_mode].
    pub record_policy: u32,
    pub loop_enabled: bool,
    pub deterministic_scheduler: bool,
    pub deterministic_time: bool,
    pub rerecord_count: u32,
    pub movie_hash: u64,
    pub last_recorded_frame: Option<u64>,
    pub players: [PlayerTimeline; MAX_VPAD_PLAYERS],
    pub input_timing: MovieInputTiming,
    /// Poll cursors; `None` when restored from a blob predating version 2.
    pub cursors: Option<[u64; MAX_VPAD_PLAYERS]>,
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Serializes `blob` at the current version.
pub fn write_movie_blob(blob: &MovieBlob) -> Vec<u8> {
    let mut out = Vec::new();
    push_u32(&mut out, MOVIE_BLOB_MAGIC);
    push_u32(&mut out, MOVIE_BLOB_VERSION);
    push_u32(&mut out, blob.movie_mode);
    push_u32(&mut out, blob.record_policy);
    push_u32(&mut out, blob.loop_enabled as u32);
    push_u32(&mut out, blob.deterministic_scheduler as u32);
    push_u32(&mut out, blob.deterministic_time as u32);
    push_u32(&mut out, blob.rerecord_count);
    push_u64(&mut out, blob.movie_hash);
    push_u64(&mut out, blob.last_recorded_frame.unwrap_or(u64::MAX));
    push_u32(&mut out, blob.players.len() as u32);
    for player in blob.players.iter() {
        push_u64(&mut out, player.max_frame());
        push_u32(&mut out, player.len() as u32);
        for input in player.frames() {
            out.extend_from_slice(&input.to_raw_bytes());
        }
    }
    push_u32(&mut out, blob.input_timing as u32);
    let cursors = blob.cursors.unwrap_or([0; MAX_VPAD_PLAYERS]);
    for &cursor in cursors.iter() {
        push_u64(&mut out, cursor);
    }
    out
}

struct BlobReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> BlobReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        BlobReader { data, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn read_bytes(&mut self, count: usize) -> Option<&'a [u8]> {
        let end = self.offset.checked_add(count)?;
        let bytes = self.data.get(self.offset..end)?;
        self.offset = end;
        Some(bytes)
    }

    fn read_u32(&mut self) -> Option<u32> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.read_bytes(4)?);
        Some(u32::from_le_bytes(bytes))
    }

    fn read_u64(&mut self) -> Option<u64> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.read_bytes(8)?);
        Some(u64::from_le_bytes(bytes))
    }

    fn read_f32(&mut self) -> Option<f32> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.read_bytes(4)?);
        Some(f32::from_le_bytes(bytes))
    }
}

fn invalid_data(message: &str) -> Error {
    Error::new(ErrorKind::InvalidData, message.to_string())
}

/// Deserializes a movie blob of any version up to [MOVIE_BLOB_VERSION].
pub fn read_movie_blob(data: &[u8]) -> io::Result<MovieBlob> {
    if data.len() < 8 {
        return Err(invalid_data("Invalid movie blob"));
    }
    let mut reader = BlobReader::new(data);
    let magic = reader.read_u32()
                      .ok_or_else(|| invalid_data("Corrupted movie blob header"))?;
    let version = reader.read_u32()
                        .ok_or_else(|| invalid_data("Corrupted movie blob header"))?;
    if magic != MOVIE_BLOB_MAGIC || version == 0 || version > MOVIE_BLOB_VERSION {
        return Err(invalid_data("Unsupported movie blob"));
    }

    let mut blob = MovieBlob::default();
    let metadata = (|| {
        blob.movie_mode = reader.read_u32()?;
        blob.record_policy = reader.read_u32()?;
        blob.loop_enabled = reader.read_u32()? != 0;
        blob.deterministic_scheduler = reader.read_u32()? != 0;
        blob.deterministic_time = reader.read_u32()? != 0;
        blob.rerecord_count = reader.read_u32()?;
        blob.movie_hash = reader.read_u64()?;
        blob.last_recorded_frame = match reader.read_u64()? {
            u64::MAX => None,
            frame => Some(frame)
        };
        reader.read_u32()
    })();
    let player_count = metadata.ok_or_else(|| invalid_data("Corrupted movie blob metadata"))?;
    if player_count == 0 || player_count as usize > MAX_VPAD_PLAYERS {
        return Err(invalid_data("Invalid movie blob player count"));
    }

    for player in 0..player_count as usize {
        let header = reader.read_u64().and_then(|max| Some((max, reader.read_u32()?)));
        let (_stored_max, frame_count) = header
            .ok_or_else(|| invalid_data("Corrupted movie blob player header"))?;
        let mut frames = Vec::with_capacity(frame_count as usize);
        for _ in 0..frame_count {
            let input = (|| {
                Some(FrameInput {
                    frame: reader.read_u64()?,
                    lx: clamp_stick(reader.read_f32()?),
                    ly: clamp_stick(reader.read_f32()?),
                    rx: clamp_stick(reader.read_f32()?),
                    ry: clamp_stick(reader.read_f32()?),
                    zl: clamp_trigger(reader.read_f32()?),
                    zr: clamp_trigger(reader.read_f32()?),
                    buttons: TasButtons::from_bits_truncate(reader.read_u32()?),
                    signature: reader.read_u32()?,
                    vpad_hold: 0,
                })
            })();
            let mut input = input.ok_or_else(|| invalid_data("Corrupted movie blob frame data"))?;
            if version >= 3 {
                input.vpad_hold = reader.read_u32()
                    .ok_or_else(|| invalid_data("Corrupted movie blob frame hold data"))?;
            }
            frames.push(input);
        }
        blob.players[player] = PlayerTimeline::from_frames(frames);
    }

    if reader.remaining() >= 4 {
        if let Some(timing) = reader.read_u32() {
            if timing == MovieInputTiming::Poll as u32 {
                warn!("TAS: coerced unsupported poll movie timing to frame timing (movie blob)");
            }
            blob.input_timing = MovieInputTiming::Frame;
        }
    }
    if version >= 2 {
        let mut cursors = [0u64; MAX_VPAD_PLAYERS];
        let mut have_all = true;
        for cursor in cursors.iter_mut() {
            match reader.read_u64() {
                Some(value) => *cursor = value,
                None => {
                    have_all = false;
                    break;
                }
            }
        }
        if have_all {
            blob.cursors = Some(cursors);
        }
    }
    Ok(blob)
}
