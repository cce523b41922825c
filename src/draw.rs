//! The drawing seam used by the bar renderer.
//!
//! Glyph rendering itself is out of scope for the engine: the bar module
//! computes what to draw and issues primitive operations through the
//! [Draw] trait. The production implementation (core X fonts over a
//! double-buffer pixmap) lives in [crate::x11rb]; tests use a recorder.
use crate::{core::Xid, geometry::Rect, Color, Result};

/// One fg/bg/border triple from the configured color table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorScheme {
    /// Window border color
    pub border: Color,
    /// Text foreground
    pub fg: Color,
    /// Cell background
    pub bg: Color,
}

impl ColorScheme {
    /// Parse a `[border, fg, bg]` hex string triple.
    pub fn try_from_strs(raw: &[&str; 3]) -> Result<Self> {
        Ok(Self {
            border: raw[0].try_into()?,
            fg: raw[1].try_into()?,
            bg: raw[2].try_into()?,
        })
    }
}

/// Primitive drawing operations against an off-screen buffer the width of
/// the screen and one bar high.
///
/// A scheme index selects a [ColorScheme]; `invert` swaps foreground and
/// background for that operation.
pub trait Draw: std::fmt::Debug {
    /// The advance width of `text` in pixels for the loaded font.
    fn text_width(&self, text: &str) -> i32;

    /// The height of the loaded font in pixels.
    fn font_height(&self) -> i32;

    /// Fill or outline a rectangle in the buffer.
    fn rect(&mut self, r: Rect, scheme: usize, filled: bool, invert: bool);

    /// Draw `text` clipped to `w` pixels starting at `x` with `pad` pixels
    /// of leading padding, filling the cell background first.
    fn text(&mut self, x: i32, w: i32, pad: i32, text: &str, scheme: usize, invert: bool);

    /// Copy the first `w` x `h` pixels of the buffer onto the given bar
    /// window.
    fn flush_to(&mut self, barwin: Xid, w: i32, h: i32) -> Result<()>;

    /// Resize the underlying buffer after the screen geometry changed.
    fn resize_buffer(&mut self, w: i32, h: i32) -> Result<()>;
}

/// A recording [Draw] used to assert on bar rendering in tests.
#[cfg(test)]
pub mod recording {
    use super::*;

    /// A single recorded drawing operation.
    #[derive(Debug, Clone, PartialEq)]
    pub enum DrawOp {
        /// A call to [Draw::rect]
        Rect {
            /// Target rectangle
            r: Rect,
            /// Scheme index used
            scheme: usize,
            /// Whether the rect was filled
            filled: bool,
            /// Whether fg/bg were swapped
            invert: bool,
        },
        /// A call to [Draw::text]
        Text {
            /// x position of the cell
            x: i32,
            /// Width of the cell
            w: i32,
            /// The rendered string
            text: String,
            /// Scheme index used
            scheme: usize,
            /// Whether fg/bg were swapped
            invert: bool,
        },
        /// A call to [Draw::flush_to]
        Flush {
            /// Target bar window
            barwin: Xid,
            /// Copied width
            w: i32,
        },
    }

    /// Records every operation; text advances are a fixed width per char.
    ///
    /// The op log is behind a shared handle so a test can keep inspecting
    /// it after the draw has been boxed into engine state.
    #[derive(Debug, Default)]
    pub struct RecordingDraw {
        ops: std::rc::Rc<std::cell::RefCell<Vec<DrawOp>>>,
    }

    impl RecordingDraw {
        /// A new recorder and the handle to its op log.
        pub fn new() -> (Self, std::rc::Rc<std::cell::RefCell<Vec<DrawOp>>>) {
            let d = Self::default();
            let handle = std::rc::Rc::clone(&d.ops);

            (d, handle)
        }
    }

    /// The fixed per-char advance used by [RecordingDraw].
    pub const CHAR_W: i32 = 8;

    /// The fixed font height used by [RecordingDraw].
    pub const FONT_H: i32 = 12;

    impl Draw for RecordingDraw {
        fn text_width(&self, text: &str) -> i32 {
            CHAR_W * text.chars().count() as i32
        }

        fn font_height(&self) -> i32 {
            FONT_H
        }

        fn rect(&mut self, r: Rect, scheme: usize, filled: bool, invert: bool) {
            self.ops.borrow_mut().push(DrawOp::Rect {
                r,
                scheme,
                filled,
                invert,
            });
        }

        fn text(&mut self, x: i32, w: i32, _pad: i32, text: &str, scheme: usize, invert: bool) {
            self.ops.borrow_mut().push(DrawOp::Text {
                x,
                w,
                text: text.to_owned(),
                scheme,
                invert,
            });
        }

        fn flush_to(&mut self, barwin: Xid, w: i32, _h: i32) -> Result<()> {
            self.ops.borrow_mut().push(DrawOp::Flush { barwin, w });

            Ok(())
        }

        fn resize_buffer(&mut self, _w: i32, _h: i32) -> Result<()> {
            Ok(())
        }
    }
}
