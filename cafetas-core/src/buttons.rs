/*
    Copyright (C) 2026  Rafal Michalski

    This file is part of CAFETAS, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! The stable 17-bit VPAD button mask.
use core::convert::TryFrom;
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use bitflags::bitflags;

bitflags! {
    /// Flags for the 17 logical VPAD buttons.
    ///
    /// The same mask is shared by the movie text format, the binary movie
    /// blob and the manual input layer. Bit positions are part of the
    /// on-disk formats and must never change.
    #[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "snapshot", serde(try_from = "u32", into = "u32"))]
    #[derive(Default)]
    pub struct TasButtons: u32 {
        const A       = 1 << 0;
        const B       = 1 << 1;
        const X       = 1 << 2;
        const Y       = 1 << 3;
        const L       = 1 << 4;
        const R       = 1 << 5;
        const ZL      = 1 << 6;
        const ZR      = 1 << 7;
        const PLUS    = 1 << 8;
        const MINUS   = 1 << 9;
        const UP      = 1 << 10;
        const DOWN    = 1 << 11;
        const LEFT    = 1 << 12;
        const RIGHT   = 1 << 13;
        const STICK_L = 1 << 14;
        const STICK_R = 1 << 15;
        const HOME    = 1 << 16;
    }
}

impl TasButtons {
    /// Resolves a single button name, case-insensitively.
    ///
    /// `Start`/`Select` and `L3`/`R3` are accepted as aliases used by
    /// other controller layouts. An empty name resolves to an empty mask.
    pub fn from_name(name: &str) -> Option<TasButtons> {
        let name = name.trim();
        if name.is_empty() {
            return Some(TasButtons::empty());
        }
        let eq = |s: &str| name.eq_ignore_ascii_case(s);
        Some(if eq("a") { TasButtons::A }
        else if eq("b") { TasButtons::B }
        else if eq("x") { TasButtons::X }
        else if eq("y") { TasButtons::Y }
        else if eq("l") { TasButtons::L }
        else if eq("r") { TasButtons::R }
        else if eq("zl") { TasButtons::ZL }
        else if eq("zr") { TasButtons::ZR }
        else if eq("plus") || eq("start") { TasButtons::PLUS }
        else if eq("minus") || eq("select") { TasButtons::MINUS }
        else if eq("up") { TasButtons::UP }
        else if eq("down") { TasButtons::DOWN }
        else if eq("left") { TasButtons::LEFT }
        else if eq("right") { TasButtons::RIGHT }
        else if eq("stickl") || eq("l3") { TasButtons::STICK_L }
        else if eq("stickr") || eq("r3") { TasButtons::STICK_R }
        else if eq("home") { TasButtons::HOME }
        else {
            return None
        })
    }

    /// The canonical name of a single-bit mask.
    pub fn name(self) -> Option<&'static str> {
        Some(match self {
            TasButtons::A => "A",
            TasButtons::B => "B",
            TasButtons::X => "X",
            TasButtons::Y => "Y",
            TasButtons::L => "L",
            TasButtons::R => "R",
            TasButtons::ZL => "ZL",
            TasButtons::ZR => "ZR",
            TasButtons::PLUS => "Plus",
            TasButtons::MINUS => "Minus",
            TasButtons::UP => "Up",
            TasButtons::DOWN => "Down",
            TasButtons::LEFT => "Left",
            TasButtons::RIGHT => "Right",
            TasButtons::STICK_L => "StickL",
            TasButtons::STICK_R => "StickR",
            TasButtons::HOME => "Home",
            _ => return None
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TryFromU32TasButtonsError(pub u32);

impl std::error::Error for TryFromU32TasButtonsError {}

impl fmt::Display for TryFromU32TasButtonsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "converted integer (0x{:x}) contains extraneous bits for `TasButtons`", self.0)
    }
}

impl TryFrom<u32> for TasButtons {
    type Error = TryFromU32TasButtonsError;
    fn try_from(mask: u32) -> core::result::Result<Self, Self::Error> {
        TasButtons::from_bits(mask).ok_or(TryFromU32TasButtonsError(mask))
    }
}

impl From<TasButtons> for u32 {
    fn from(buttons: TasButtons) -> u32 {
        buttons.bits()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseTasButtonsError(pub String);

impl std::error::Error for ParseTasButtonsError {}

impl fmt::Display for ParseTasButtonsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot parse `TasButtons`: unrecognized button name: {}", self.0)
    }
}

impl FromStr for TasButtons {
    type Err = ParseTasButtonsError;
    /// Parses a `|` or `+` separated list of button names.
    fn from_str(list: &str) -> core::result::Result<Self, Self::Err> {
        let mut mask = TasButtons::empty();
        for token in list.split(|c| c == '|' || c == '+') {
            match TasButtons::from_name(token) {
                Some(btn) => mask |= btn,
                None => return Err(ParseTasButtonsError(token.trim().to_string()))
            }
        }
        Ok(mask)
    }
}

impl fmt::Display for TasButtons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for bit in (0..17).map(|n| TasButtons::from_bits_truncate(1u32 << n)) {
            if let Some(name) = bit.name() {
                if self.contains(bit) {
                    if !first {
                        f.write_str("|")?;
                    }
                    f.write_str(name)?;
                    first = false;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_names_parse() {
        assert_eq!(TasButtons::from_name("a"), Some(TasButtons::A));
        assert_eq!(TasButtons::from_name(" HOME "), Some(TasButtons::HOME));
        assert_eq!(TasButtons::from_name("start"), Some(TasButtons::PLUS));
        assert_eq!(TasButtons::from_name("Select"), Some(TasButtons::MINUS));
        assert_eq!(TasButtons::from_name("L3"), Some(TasButtons::STICK_L));
        assert_eq!(TasButtons::from_name("r3"), Some(TasButtons::STICK_R));
        assert_eq!(TasButtons::from_name(""), Some(TasButtons::empty()));
        assert_eq!(TasButtons::from_name("c"), None);
    }

    #[test]
    fn button_lists_parse() {
        assert_eq!("A|B".parse::<TasButtons>().unwrap(), TasButtons::A|TasButtons::B);
        assert_eq!("a+zl+Up".parse::<TasButtons>().unwrap(),
                   TasButtons::A|TasButtons::ZL|TasButtons::UP);
        assert_eq!("".parse::<TasButtons>().unwrap(), TasButtons::empty());
        assert!("A|Q".parse::<TasButtons>().is_err());
    }

    #[test]
    fn buttons_display() {
        assert_eq!((TasButtons::A|TasButtons::STICK_R).to_string(), "A|StickR");
        assert_eq!(TasButtons::empty().to_string(), "");
    }

    #[test]
    fn buttons_from_u32() {
        use core::convert::TryInto;
        let mask: TasButtons = 0x1FFFFu32.try_into().unwrap();
        assert_eq!(mask, TasButtons::all());
        let res: Result<TasButtons, _> = 0x20000u32.try_into();
        assert!(res.is_err());
    }

    #[cfg(feature = "snapshot")]
    #[test]
    fn buttons_serde() {
        let mask = TasButtons::A|TasButtons::HOME;
        let json = serde_json::to_string(&mask).unwrap();
        assert_eq!(json, "65537");
        let back: TasButtons = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mask);
    }
}
