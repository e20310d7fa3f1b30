/*
    Copyright (C) 2026  Rafal Michalski

    This file is part of CAFETAS, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! Movie mode enums, the savestate sync descriptor and per-player timelines.
use core::convert::TryFrom;
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use crate::sample::FrameInput;

/// Magic of the [MovieSyncData] descriptor: `"MSYN"`.
pub const MOVIE_SYNC_MAGIC: u32 = 0x4D53_594E;
/// Current [MovieSyncData] version.
pub const MOVIE_SYNC_VERSION: u32 = 1;

/// What the movie machinery is currently doing.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(try_from = "u32", into = "u32"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MovieMode {
    Disabled = 0,
    Playback = 1,
    Record = 2,
}

/// Whether a loaded movie may be modified by rerecording.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(try_from = "u32", into = "u32"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MovieRecordPolicy {
    ReadOnly = 0,
    ReadWrite = 1,
}

/// The movie sample timing model.
///
/// Only frame timing is supported; poll timing is accepted by the codecs
/// and coerced to frame timing with a warning.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(try_from = "u32", into = "u32"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MovieInputTiming {
    Frame = 0,
    Poll = 1,
}

impl Default for MovieMode {
    fn default() -> Self {
        MovieMode::Disabled
    }
}

impl Default for MovieRecordPolicy {
    fn default() -> Self {
        MovieRecordPolicy::ReadOnly
    }
}

impl Default for MovieInputTiming {
    fn default() -> Self {
        MovieInputTiming::Frame
    }
}

macro_rules! impl_mode_try_from_u32 {
    ($($enum:ty: [$($val:literal => $var:ident),*]),*) => {$(
        impl TryFrom<u32> for $enum {
            type Error = TryFromU32ModeError;
            fn try_from(mode: u32) -> core::result::Result<Self, Self::Error> {
                match mode {
                    $($val => Ok(<$enum>::$var),)*
                    _ => Err(TryFromU32ModeError(mode))
                }
            }
        }
        impl From<$enum> for u32 {
            fn from(mode: $enum) -> u32 {
                mode as u32
            }
        }
    )*};
}

impl_mode_try_from_u32! {
    MovieMode: [0 => Disabled, 1 => Playback, 2 => Record],
    MovieRecordPolicy: [0 => ReadOnly, 1 => ReadWrite],
    MovieInputTiming: [0 => Frame, 1 => Poll]
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TryFromU32ModeError(pub u32);

impl std::error::Error for TryFromU32ModeError {}

impl fmt::Display for TryFromU32ModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "converted integer ({}) is out of range for a movie mode", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct ParseMovieInputTimingError;

impl std::error::Error for ParseMovieInputTimingError {}

impl fmt::Display for ParseMovieInputTimingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot parse `MovieInputTiming`: unrecognized string")
    }
}

impl FromStr for MovieInputTiming {
    type Err = ParseMovieInputTimingError;
    fn from_str(timing: &str) -> core::result::Result<Self, Self::Err> {
        let timing = timing.trim();
        if timing.eq_ignore_ascii_case("frame") || timing == "0" {
            Ok(MovieInputTiming::Frame)
        }
        else if timing.eq_ignore_ascii_case("poll") || timing == "1" {
            Ok(MovieInputTiming::Poll)
        }
        else {
            Err(ParseMovieInputTimingError)
        }
    }
}

impl From<MovieInputTiming> for &str {
    fn from(timing: MovieInputTiming) -> Self {
        match timing {
            MovieInputTiming::Frame => "frame",
            MovieInputTiming::Poll => "poll"
        }
    }
}

impl fmt::Display for MovieInputTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        <&str>::from(*self).fmt(f)
    }
}

/// A descriptor stored next to a host savestate to validate movie identity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
pub struct MovieSyncData {
    pub magic: u32,
    pub version: u32,
    pub movie_hash: u64,
    /// GPU frame counter at capture time.
    pub frame: u64,
    pub rerecord_count: u32,
    /// Runtime signature of `frame`, see [crate::hash::runtime_signature].
    pub signature: u32,
}

impl MovieSyncData {
    /// `true` when magic and version match the current descriptor layout.
    pub fn is_current(&self) -> bool {
        self.magic == MOVIE_SYNC_MAGIC && self.version == MOVIE_SYNC_VERSION
    }
}

/// An ordered sequence of [FrameInput] samples keyed by movie frame.
///
/// Frames are kept sorted with unique keys; `max_frame` caches the largest
/// present key (0 when empty).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
pub struct PlayerTimeline {
    frames: Vec<FrameInput>,
    max_frame: u64,
}

impl PlayerTimeline {
    /// Builds a timeline from frames in any order; later duplicates win.
    pub fn from_frames(frames: Vec<FrameInput>) -> PlayerTimeline {
        let mut timeline = PlayerTimeline { frames, max_frame: 0 };
        timeline.sort_frames();
        timeline
    }

    #[inline]
    pub fn frames(&self) -> &[FrameInput] {
        &self.frames
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline]
    pub fn max_frame(&self) -> u64 {
        self.max_frame
    }

    #[inline]
    pub fn last(&self) -> Option<&FrameInput> {
        self.frames.last()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.max_frame = 0;
    }

    /// Appends a frame without ordering; callers must finish a batch of
    /// appends with [PlayerTimeline::sort_frames].
    pub fn push_unsorted(&mut self, input: FrameInput) {
        self.max_frame = self.max_frame.max(input.frame);
        self.frames.push(input);
    }

    /// Restores ordering and key uniqueness after unsorted appends.
    ///
    /// For duplicate keys the last appended sample wins, matching what a
    /// lower-bound lookup over the unsorted data would have returned.
    pub fn sort_frames(&mut self) {
        self.frames.sort_by_key(|input| input.frame);
        let mut write = 0;
        for read in 0..self.frames.len() {
            let input = self.frames[read];
            if write > 0 && self.frames[write - 1].frame == input.frame {
                self.frames[write - 1] = input;
            }
            else {
                self.frames[write] = input;
                write += 1;
            }
        }
        self.frames.truncate(write);
        self.max_frame = self.frames.last().map_or(0, |input| input.frame);
    }

    /// Inserts or replaces the sample with the same frame key.
    pub fn upsert(&mut self, input: FrameInput) {
        match self.frames.binary_search_by_key(&input.frame, |e| e.frame) {
            Ok(index) => self.frames[index] = input,
            Err(index) => self.frames.insert(index, input)
        }
        self.max_frame = self.max_frame.max(input.frame);
    }

    /// Step-and-hold lookup: the entry with the largest key `<= frame`.
    ///
    /// With `loop_enabled` the query wraps at `max_frame + 1`. Gaps
    /// between recorded frames repeat the prior sample.
    pub fn frame_for(&self, frame: u64, loop_enabled: bool) -> Option<&FrameInput> {
        if self.frames.is_empty() {
            return None;
        }
        let mut query = frame;
        if loop_enabled && self.max_frame > 0 {
            query = frame % (self.max_frame + 1);
        }
        let index = self.frames.partition_point(|e| e.frame <= query);
        if index == 0 {
            None
        }
        else {
            Some(&self.frames[index - 1])
        }
    }

    /// Removes every entry with a key greater than `frame`.
    pub fn truncate_after(&mut self, frame: u64) {
        let index = self.frames.partition_point(|e| e.frame <= frame);
        self.frames.truncate(index);
        self.max_frame = self.frames.last().map_or(0, |input| input.frame);
    }

    /// The first entry in `[center - window, center + window]` whose
    /// signature equals `signature`.
    pub fn find_signature_in_window(
            &self,
            center: u64,
            window: u64,
            signature: u32
        ) -> Option<&FrameInput>
    {
        let start = center.saturating_sub(window);
        let end = center.saturating_add(window);
        let index = self.frames.partition_point(|e| e.frame < start);
        self.frames[index..].iter()
                            .take_while(|e| e.frame <= end)
                            .find(|e| e.signature == signature)
    }
}
