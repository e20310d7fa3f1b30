/*
    Copyright (C) 2026  Rafal Michalski

    This file is part of CAFETAS, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! VPAD mapping identifiers and the projection of a sample onto one mapping.
use core::convert::TryFrom;
use core::fmt;

#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use crate::buttons::TasButtons;
use crate::sample::FrameInput;

/// A single queryable element of the emulated VPAD.
///
/// Covers the 17 buttons (discriminants follow the [TasButtons] bit order)
/// and the 8 "stick-as-button" axis directions. The discriminants are
/// stable so hosts may keep raw `u64` ids and convert with [TryFrom].
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum VpadMapping {
    A = 0,
    B = 1,
    X = 2,
    Y = 3,
    L = 4,
    R = 5,
    Zl = 6,
    Zr = 7,
    Plus = 8,
    Minus = 9,
    Up = 10,
    Down = 11,
    Left = 12,
    Right = 13,
    StickL = 14,
    StickR = 15,
    Home = 16,
    StickLLeft = 17,
    StickLRight = 18,
    StickLUp = 19,
    StickLDown = 20,
    StickRLeft = 21,
    StickRRight = 22,
    StickRUp = 23,
    StickRDown = 24,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TryFromU64VpadMappingError(pub u64);

impl std::error::Error for TryFromU64VpadMappingError {}

impl fmt::Display for TryFromU64VpadMappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "converted integer ({}) is not a `VpadMapping` id", self.0)
    }
}

impl TryFrom<u64> for VpadMapping {
    type Error = TryFromU64VpadMappingError;
    fn try_from(id: u64) -> core::result::Result<Self, Self::Error> {
        use VpadMapping::*;
        Ok(match id {
            0 => A, 1 => B, 2 => X, 3 => Y,
            4 => L, 5 => R, 6 => Zl, 7 => Zr,
            8 => Plus, 9 => Minus,
            10 => Up, 11 => Down, 12 => Left, 13 => Right,
            14 => StickL, 15 => StickR, 16 => Home,
            17 => StickLLeft, 18 => StickLRight, 19 => StickLUp, 20 => StickLDown,
            21 => StickRLeft, 22 => StickRRight, 23 => StickRUp, 24 => StickRDown,
            _ => return Err(TryFromU64VpadMappingError(id))
        })
    }
}

impl From<VpadMapping> for u64 {
    fn from(mapping: VpadMapping) -> u64 {
        mapping as u64
    }
}

impl VpadMapping {
    /// The button mask of a plain button mapping, `None` for axis mappings.
    pub fn button_mask(self) -> Option<TasButtons> {
        let id = self as u64;
        if id <= 16 {
            TasButtons::from_bits(1 << id)
        }
        else {
            None
        }
    }
}

/// Projects a sample onto a single mapping.
///
/// Buttons yield 0/1; triggers yield the maximum of the analog trigger and
/// the digital ZL/ZR button; stick-as-button axes project one signed axis
/// to `[0, 1]`.
pub fn mapping_value(input: &FrameInput, mapping: VpadMapping) -> f32 {
    use VpadMapping::*;
    let btn = |mask: TasButtons| if input.buttons.contains(mask) { 1.0f32 } else { 0.0 };
    match mapping {
        Zl => input.zl.max(btn(TasButtons::ZL)),
        Zr => input.zr.max(btn(TasButtons::ZR)),
        StickLLeft => (-input.lx).max(0.0),
        StickLRight => input.lx.max(0.0),
        StickLUp => input.ly.max(0.0),
        StickLDown => (-input.ly).max(0.0),
        StickRLeft => (-input.rx).max(0.0),
        StickRRight => input.rx.max(0.0),
        StickRUp => input.ry.max(0.0),
        StickRDown => (-input.ry).max(0.0),
        button => btn(button.button_mask().unwrap_or_else(TasButtons::empty))
    }
}
