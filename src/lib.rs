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
//! CAFETAS is a library implementing a TAS (tool-assisted speedrun) input
//! engine for Wii U emulators.
//!
//! The engine sits between the host's controller-polling path and its
//! frame-presentation path and provides three tightly coupled services:
//!
//! * deterministic frame-advance pacing of the emulator;
//! * manual-override input injected by an editor GUI, with controller
//!   passthrough and turbo;
//! * movie record/playback of per-frame controller samples with
//!   signature resync, rerecord accounting and binary savestate
//!   serialization.
//!
//! The host owns a single [TasEngine] and wires it into its VPAD poll
//! lifecycle; see the [engine] module for the locking and ordering rules.
pub use cafetas_core::{MAX_VPAD_PLAYERS, buttons, hash, host, mapping, movie, sample};
pub use cafetas_formats as formats;

pub mod editor;
pub mod engine;

pub use engine::{TasEngine, read_movie_title_id_from_file};
