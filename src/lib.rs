//! rawm: a dynamic tiling window manager for X11.
//!
//! rawm manages top-level client windows as the single X client holding
//! `SubstructureRedirectMask` on the root window. Clients are grouped by
//! tags (virtual workspaces), laid out per-monitor by a table of dynamic
//! layouts, and presented with a per-monitor status bar.
//!
//! The engine is written against the [XConn][crate::x::XConn] trait so that
//! all interaction with the X server goes through a single mockable seam:
//! the production backend lives in [crate::x11rb] and a recording mock is
//! used by the test suite.
#![warn(
    clippy::complexity,
    clippy::correctness,
    clippy::style,
    future_incompatible,
    missing_debug_implementations,
    rust_2018_idioms,
    unused
)]
#![allow(clippy::too_many_arguments)]

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::ffi::NulError;

pub mod bar;
pub mod config;
pub mod core;
pub mod draw;
pub mod geometry;
pub mod layout;
pub mod util;
pub mod x;
pub mod x11rb;

#[doc(inline)]
pub use crate::core::{State, WindowManager, Xid};

/// Error variants from the core window manager logic and the X backend.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unable to establish a connection to the X server.
    #[error(transparent)]
    Connect(#[from] ::x11rb::errors::ConnectError),

    /// Something went wrong when communicating with the X server.
    #[error(transparent)]
    Connection(#[from] ::x11rb::errors::ConnectionError),

    /// A string used to construct an exec argv contained an interior nul byte.
    #[error("invalid argv string: {0}")]
    InvalidArgv(#[from] NulError),

    /// A user provided color was not a valid hex string.
    #[error("invalid hex color: {hex}")]
    InvalidHexColor {
        /// The string that was invalid
        hex: String,
    },

    /// An IO error was encountered.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A property requested from the X server was not set for the given client.
    #[error("the {0} property is not set for client {1}")]
    MissingProperty(String, Xid),

    /// No usable screens were detected on the X server.
    #[error("no screens available")]
    NoScreens,

    /// An error was returned from the OS when setting up signal handling or re-execing.
    #[error(transparent)]
    Os(#[from] nix::Error),

    /// Another window manager is already holding SubstructureRedirect on the root window.
    #[error("another window manager is already running")]
    OtherWmRunning,

    /// An X request returned an error reply.
    #[error(transparent)]
    ReplyError(#[from] ::x11rb::errors::ReplyError),

    /// Generating a new X resource id failed.
    #[error(transparent)]
    ReplyOrIdError(#[from] ::x11rb::errors::ReplyOrIdError),

    /// Parsing an [Atom][crate::x::Atom] from a str failed.
    #[error(transparent)]
    Strum(#[from] strum::ParseError),

    /// A mock method was called that has no implementation provided.
    #[cfg(test)]
    #[error("mock method called without implementation")]
    UnimplementedMock,
}

/// A Result where the error type is a rawm [Error].
pub type Result<T> = std::result::Result<T, Error>;

/// A simple ARGB color representation parsed from user supplied hex strings.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color {
    argb: u32,
}

impl Color {
    /// The raw 0xAARRGGBB format of this color.
    pub fn argb_u32(&self) -> u32 {
        self.argb
    }

    /// The raw 0xRRGGBB format of this color, as used for core X pixel values.
    pub fn rgb_u32(&self) -> u32 {
        self.argb & 0x00ff_ffff
    }

    /// The red, green and blue components of this color.
    pub fn rgb(&self) -> (u8, u8, u8) {
        (
            (self.argb >> 16) as u8,
            (self.argb >> 8) as u8,
            self.argb as u8,
        )
    }
}

impl From<u32> for Color {
    fn from(argb: u32) -> Self {
        Self { argb }
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from(rgb: (u8, u8, u8)) -> Self {
        let (r, g, b) = rgb;

        Self {
            argb: 0xff00_0000 | ((r as u32) << 16) | ((g as u32) << 8) | b as u32,
        }
    }
}

impl TryFrom<&str> for Color {
    type Error = Error;

    /// Parse a color from a `#rrggbb` or `#aarrggbb` hex string.
    fn try_from(s: &str) -> Result<Self> {
        let err = || Error::InvalidHexColor { hex: s.to_owned() };
        let hex = s.strip_prefix('#').ok_or_else(err)?;
        let raw = u32::from_str_radix(hex, 16).map_err(|_| err())?;

        match hex.len() {
            6 => Ok(Self {
                argb: 0xff00_0000 | raw,
            }),
            8 => Ok(Self { argb: raw }),
            _ => Err(err()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    #[test_case("#ff0000", 0xffff0000; "red no alpha")]
    #[test_case("#00ff00", 0xff00ff00; "green no alpha")]
    #[test_case("#80808080", 0x80808080; "grey with alpha")]
    #[test]
    fn color_from_hex(s: &str, expected: u32) {
        let c = Color::try_from(s).unwrap();

        assert_eq!(c.argb_u32(), expected);
    }

    #[test_case("ff0000"; "missing hash")]
    #[test_case("#ff00"; "wrong length")]
    #[test_case("#zzzzzz"; "not hex")]
    #[test]
    fn invalid_hex_strings_error(s: &str) {
        assert!(Color::try_from(s).is_err());
    }
}
