/*
    Copyright (C) 2026  Rafal Michalski

    This file is part of CAFETAS, a Rust library for building emulators.

    CAFETAS is free software: you can redistribute it and/or modify it under
    the terms of the GNU Lesser General Public License (LGPL) as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    CAFETAS is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Lesser General Public License for more details.

    You should have received a copy of the GNU Lesser General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.

    Author contact information: see Cargo.toml file, section [package.authors].
*/
//! The core components of the CAFETAS library.
//!
//! Fundamental types shared by the movie file codecs and the TAS engine:
//! the button mask, per-frame controller samples, per-player movie
//! timelines, mapping identifiers, hashing primitives and the host
//! collaborator traits.
pub mod buttons;
pub mod hash;
pub mod host;
pub mod mapping;
pub mod movie;
pub mod sample;

/// The number of emulated VPAD controllers the engine keeps state for.
pub const MAX_VPAD_PLAYERS: usize = 4;
