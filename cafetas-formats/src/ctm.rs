/*
    Copyright (C) 2026  Rafal Michalski

    This file is part of CAFETAS, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
/*! **CTM** text movie format utilities.

A CTM movie is a UTF-8 line-oriented file:

* header line `CTM1`;
* metadata lines `M,<key>,<value>`;
* frame lines `F,<frame>,<player>,<lx>,<ly>,<rx>,<ry>,<zl>,<zr>,<buttons>,<signature>,<vpadHold>`;
* `#` comment lines and blank lines are skipped.

`<buttons>` is either a decimal/hex number or a `|`/`+`-separated list of
button names (case-insensitive, with `Start`/`Select`/`L3`/`R3` aliases).

Recognized metadata keys: `loop`, `deterministic_scheduler`,
`deterministic_time`, `movie_mode`, `movie_record_policy`, `input_timing`,
`rerecord_count`, `movie_hash`, `title_id`. The two mode keys are written
for compatibility but ignored on load: the live mode is a runtime property
of the engine, the file only carries historical state.

A legacy CSV flavor without tag prefixes is also parseable: 8 columns
(single player) or 9 columns with the player index in the second column.
*/
use std::io::{self, BufRead, Error, ErrorKind, Write};
use std::path::Path;

use log::warn;

use nom::IResult;
use nom::bytes::complete::take_while;
use nom::character::complete::char;
use nom::multi::many0;
use nom::sequence::preceded;

use cafetas_core::MAX_VPAD_PLAYERS;
use cafetas_core::buttons::TasButtons;
use cafetas_core::movie::{MovieInputTiming, PlayerTimeline};
use cafetas_core::sample::{FrameInput, clamp_stick, clamp_trigger};

/// The CTM header line.
pub const CTM_HEADER: &str = "CTM1";

/// Which text grammar a movie file uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieTextFlavor {
    /// Tagged `CTM1` format.
    Ctm,
    /// Untagged legacy CSV rows.
    LegacyCsv,
}

/// Selects the text flavor by file extension: `.ctm` (case-insensitively)
/// selects [MovieTextFlavor::Ctm], anything else the legacy CSV flavor.
pub fn flavor_for_path(path: &Path) -> MovieTextFlavor {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("ctm") => MovieTextFlavor::Ctm,
        _ => MovieTextFlavor::LegacyCsv
    }
}

/// Movie metadata carried by the text format.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MovieTextMeta {
    pub loop_enabled: bool,
    pub deterministic_scheduler: bool,
    pub deterministic_time: bool,
    /// Written for compatibility, ignored on load.
    pub movie_mode: u32,
    /// Written for compatibility, ignored on load.
    pub movie_record_policy: u32,
    pub input_timing: MovieInputTiming,
    pub rerecord_count: u32,
    pub movie_hash: u64,
    pub title_id: u64,
}

/// A parsed text movie: metadata plus one timeline per player.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MovieText {
    pub meta: MovieTextMeta,
    pub players: [PlayerTimeline; MAX_VPAD_PLAYERS],
}

fn text_field(input: &str) -> IResult<&str, &str> {
    take_while(|c| c != ',')(input)
}

fn text_fields(input: &str) -> IResult<&str, Vec<&str>> {
    let (rest, first) = text_field(input)?;
    let (rest, mut fields) = many0(preceded(char(','), text_field))(rest)?;
    fields.insert(0, first);
    Ok((rest, fields))
}

fn split_columns(line: &str) -> Vec<&str> {
    match text_fields(line) {
        Ok((_, fields)) => fields.into_iter().map(str::trim).collect(),
        Err(_) => Vec::new()
    }
}

fn parse_u32_auto(token: &str) -> Option<u32> {
    let token = token.trim();
    if let Some(hex) = strip_hex_prefix(token) {
        u32::from_str_radix(hex, 16).ok()
    }
    else {
        token.parse().ok()
    }
}

fn parse_u64_auto(token: &str) -> Option<u64> {
    let token = token.trim();
    if let Some(hex) = strip_hex_prefix(token) {
        u64::from_str_radix(hex, 16).ok()
    }
    else {
        token.parse().ok()
    }
}

fn strip_hex_prefix(token: &str) -> Option<&str> {
    if token.len() > 2 && (token.starts_with("0x") || token.starts_with("0X")) {
        Some(&token[2..])
    }
    else {
        None
    }
}

fn parse_f32(token: &str) -> Option<f32> {
    token.trim().parse().ok()
}

// Frame ordinals tolerate negative values by clamping to 0.
fn parse_frame_ordinal(token: &str) -> Option<u64> {
    let token = token.trim();
    if let Some(positive) = token.strip_prefix('-') {
        positive.parse::<u64>().ok().map(|_| 0)
    }
    else {
        token.parse().ok()
    }
}

fn parse_bool_token(token: &str) -> Option<bool> {
    let token = token.trim();
    for yes in &["1", "true", "yes", "on"] {
        if token.eq_ignore_ascii_case(yes) {
            return Some(true);
        }
    }
    for no in &["0", "false", "no", "off"] {
        if token.eq_ignore_ascii_case(no) {
            return Some(false);
        }
    }
    None
}

fn parse_buttons_column(token: &str) -> Option<TasButtons> {
    if let Some(bits) = parse_u32_auto(token) {
        return Some(TasButtons::from_bits_truncate(bits));
    }
    token.parse().ok()
}

// columns: frame, lx, ly, rx, ry, zl, zr, buttons
fn parse_frame_columns(columns: &[&str]) -> Option<FrameInput> {
    if columns.len() != 8 {
        return None;
    }
    Some(FrameInput {
        frame: parse_frame_ordinal(columns[0])?,
        lx: clamp_stick(parse_f32(columns[1])?),
        ly: clamp_stick(parse_f32(columns[2])?),
        rx: clamp_stick(parse_f32(columns[3])?),
        ry: clamp_stick(parse_f32(columns[4])?),
        zl: clamp_trigger(parse_f32(columns[5])?),
        zr: clamp_trigger(parse_f32(columns[6])?),
        buttons: parse_buttons_column(columns[7])?,
        signature: 0,
        vpad_hold: 0,
    })
}

fn parse_player_index(token: &str) -> usize {
    let index = token.trim().parse::<i64>().unwrap_or(0).max(0) as usize;
    index.min(MAX_VPAD_PLAYERS - 1)
}

fn parse_ctm_line(columns: &[&str], movie: &mut MovieText) -> Result<(), ()> {
    let tag = match columns.first() {
        Some(tag) => *tag,
        None => return Ok(())
    };
    if tag.eq_ignore_ascii_case(CTM_HEADER) {
        return Ok(());
    }
    if tag.eq_ignore_ascii_case("M") {
        if columns.len() < 3 {
            return Err(());
        }
        let meta = &mut movie.meta;
        let key = columns[1].to_ascii_lowercase();
        let value = columns[2];
        match key.as_str() {
            "loop" => {
                if let Some(v) = parse_bool_token(value) {
                    meta.loop_enabled = v;
                }
            }
            "deterministic_scheduler" => {
                if let Some(v) = parse_bool_token(value) {
                    meta.deterministic_scheduler = v;
                }
            }
            "deterministic_time" => {
                if let Some(v) = parse_bool_token(value) {
                    meta.deterministic_time = v;
                }
            }
            // The live mode and record policy are runtime properties driven
            // by the host config and UI; file metadata must not override them.
            "movie_mode" | "movie_record_policy" => {}
            "input_timing" => {
                if let Ok(timing) = value.parse::<MovieInputTiming>() {
                    meta.input_timing = timing;
                    if meta.input_timing == MovieInputTiming::Poll {
                        meta.input_timing = MovieInputTiming::Frame;
                        warn!("TAS: coerced unsupported poll movie timing to frame timing (ctm metadata)");
                    }
                }
            }
            "rerecord_count" => {
                if let Some(v) = parse_u32_auto(value) {
                    meta.rerecord_count = v;
                }
            }
            "movie_hash" => {
                if let Some(v) = parse_u64_auto(value) {
                    meta.movie_hash = v;
                }
            }
            "title_id" => {
                if let Some(v) = parse_u64_auto(value) {
                    meta.title_id = v;
                }
            }
            _ => {}
        }
        return Ok(());
    }
    if !tag.eq_ignore_ascii_case("F") || columns.len() != 12 {
        return Err(());
    }
    let player = parse_player_index(columns[2]);
    let data = [columns[1], columns[3], columns[4], columns[5],
                columns[6], columns[7], columns[8], columns[9]];
    let mut input = parse_frame_columns(&data).ok_or(())?;
    input.signature = parse_u32_auto(columns[10]).ok_or(())?;
    input.vpad_hold = parse_u32_auto(columns[11]).ok_or(())?;
    movie.players[player].push_unsorted(input);
    Ok(())
}

fn parse_legacy_line(columns: &[&str], movie: &mut MovieText) -> Result<(), ()> {
    let (player, data) = match columns.len() {
        8 => (0, [columns[0], columns[1], columns[2], columns[3],
                  columns[4], columns[5], columns[6], columns[7]]),
        9 => (parse_player_index(columns[1]),
              [columns[0], columns[2], columns[3], columns[4],
               columns[5], columns[6], columns[7], columns[8]]),
        _ => return Err(())
    };
    let input = parse_frame_columns(&data).ok_or(())?;
    movie.players[player].push_unsorted(input);
    Ok(())
}

/// Parses a text movie from `reader`.
///
/// `meta` provides the values metadata keys default to when the file does
/// not mention them. Frame timelines come back sorted with unique keys.
pub fn parse_movie_text<R: BufRead>(
        reader: R,
        flavor: MovieTextFlavor,
        meta: MovieTextMeta
    ) -> io::Result<MovieText>
{
    let mut movie = MovieText { meta, ..Default::default() };
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let columns = split_columns(trimmed);
        let parsed = match flavor {
            MovieTextFlavor::Ctm => parse_ctm_line(&columns, &mut movie),
            MovieTextFlavor::LegacyCsv => parse_legacy_line(&columns, &mut movie)
        };
        if parsed.is_err() {
            let what = match flavor {
                MovieTextFlavor::Ctm => "CTM",
                MovieTextFlavor::LegacyCsv => "legacy CSV"
            };
            return Err(Error::new(ErrorKind::InvalidData,
                        format!("Invalid {} movie line: {}", what, trimmed)));
        }
    }
    for player in movie.players.iter_mut() {
        player.sort_frames();
    }
    Ok(movie)
}

/// Writes a movie in the tagged CTM text format.
pub fn write_movie_text<W: Write>(
        writer: &mut W,
        meta: &MovieTextMeta,
        players: &[PlayerTimeline]
    ) -> io::Result<()>
{
    writeln!(writer, "{}", CTM_HEADER)?;
    writeln!(writer, "M,loop,{}", meta.loop_enabled as u32)?;
    writeln!(writer, "M,deterministic_scheduler,{}", meta.deterministic_scheduler as u32)?;
    writeln!(writer, "M,deterministic_time,{}", meta.deterministic_time as u32)?;
    writeln!(writer, "M,movie_mode,{}", meta.movie_mode)?;
    writeln!(writer, "M,movie_record_policy,{}", meta.movie_record_policy)?;
    writeln!(writer, "M,input_timing,{}", meta.input_timing)?;
    writeln!(writer, "M,rerecord_count,{}", meta.rerecord_count)?;
    writeln!(writer, "M,movie_hash,{}", meta.movie_hash)?;
    writeln!(writer, "M,title_id,{}", meta.title_id)?;
    for (player, timeline) in players.iter().enumerate() {
        for input in timeline.frames() {
            writeln!(writer, "F,{},{},{},{},{},{},{},{},{},{},{}",
                     input.frame, player,
                     input.lx, input.ly, input.rx, input.ry,
                     input.zl, input.zr,
                     input.buttons.bits(), input.signature, input.vpad_hold)?;
        }
    }
    Ok(())
}

/// Reads the `title_id` metadata from a CTM stream without parsing frames.
///
/// Stops at the first frame line. Returns 0 when the file carries no
/// title id; fails only on an unparseable `title_id` value.
pub fn read_title_id<R: BufRead>(reader: R) -> io::Result<u64> {
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let columns = split_columns(trimmed);
        let tag = match columns.first() {
            Some(tag) => *tag,
            None => continue
        };
        if tag.eq_ignore_ascii_case("F") {
            break;
        }
        if !tag.eq_ignore_ascii_case("M") || columns.len() < 3 {
            continue;
        }
        if !columns[1].eq_ignore_ascii_case("title_id") {
            continue;
        }
        return parse_u64_auto(columns[2]).ok_or_else(|| {
            Error::new(ErrorKind::InvalidData, "Invalid title_id metadata in movie file")
        });
    }
    Ok(0)
}
