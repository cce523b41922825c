//! [Draw] implemented with core X fonts over a double-buffer pixmap.
//!
//! Glyph quality is whatever the server's core font rendering gives us;
//! the bar only needs rectangles and short strings. The draw owns its own
//! connection so rendering traffic never interleaves with the event
//! stream.
use crate::{
    core::Xid,
    draw::{ColorScheme, Draw},
    geometry::Rect,
    Result,
};
use tracing::warn;
use x11rb::{
    connection::Connection,
    protocol::xproto::{
        ChangeGCAux, Char2b, ConnectionExt as _, CreateGCAux, Rectangle,
    },
    rust_connection::RustConnection,
};

/// An x11rb based [Draw] implementation using core X fonts.
#[derive(Debug)]
pub struct X11rbDraw {
    conn: RustConnection,
    root: u32,
    depth: u8,
    buffer: u32,
    gc: u32,
    schemes: Vec<ColorScheme>,
    ascent: i32,
    font_h: i32,
    width: i32,
    height: i32,
}

impl X11rbDraw {
    /// Connect and load the given core font (falling back to `fixed`),
    /// allocating a buffer one screen wide and one bar tall.
    pub fn new(font_name: &str, schemes: Vec<ColorScheme>) -> Result<Self> {
        let (conn, screen_num) = RustConnection::connect(None)?;
        let screen = &conn.setup().roots[screen_num];
        let (root, depth) = (screen.root, screen.root_depth);
        let screen_w = screen.width_in_pixels as i32;

        let font = conn.generate_id()?;
        if conn.open_font(font, font_name.as_bytes())?.check().is_err() {
            warn!(font_name, "unable to open font, falling back to fixed");
            conn.open_font(font, "fixed".as_bytes())?.check()?;
        }

        let info = conn.query_font(font)?.reply()?;
        let (ascent, descent) = (info.font_ascent as i32, info.font_descent as i32);
        let font_h = ascent + descent;

        let gc = conn.generate_id()?;
        conn.create_gc(gc, root, &CreateGCAux::new().font(font))?;

        let mut draw = Self {
            conn,
            root,
            depth,
            buffer: 0,
            gc,
            schemes,
            ascent,
            font_h,
            width: 0,
            height: 0,
        };
        draw.resize_buffer(screen_w, font_h + 2)?;

        Ok(draw)
    }

    fn set_fg(&self, pixel: u32) -> Result<()> {
        self.conn
            .change_gc(self.gc, &ChangeGCAux::new().foreground(pixel))?;

        Ok(())
    }

    fn scheme(&self, i: usize) -> ColorScheme {
        self.schemes.get(i).copied().unwrap_or(self.schemes[0])
    }

    fn raw_text_width(&self, text: &str) -> Result<i32> {
        let chars: Vec<Char2b> = text
            .bytes()
            .map(|b| Char2b { byte1: 0, byte2: b })
            .collect();
        let reply = self.conn.query_text_extents(self.gc, &chars)?.reply()?;

        Ok(reply.overall_width)
    }
}

impl Draw for X11rbDraw {
    fn text_width(&self, text: &str) -> i32 {
        self.raw_text_width(text).unwrap_or(0)
    }

    fn font_height(&self) -> i32 {
        self.font_h
    }

    fn rect(&mut self, r: Rect, scheme: usize, filled: bool, invert: bool) {
        let s = self.scheme(scheme);
        let pixel = if invert { s.bg } else { s.fg };
        if self.set_fg(pixel.rgb_u32()).is_err() {
            return;
        }

        let rect = Rectangle {
            x: r.x as i16,
            y: r.y as i16,
            width: r.w.max(0) as u16,
            height: r.h.max(0) as u16,
        };
        let res = if filled {
            self.conn.poly_fill_rectangle(self.buffer, self.gc, &[rect])
        } else {
            self.conn.poly_rectangle(self.buffer, self.gc, &[rect])
        };
        if let Err(e) = res {
            warn!(%e, "bar rect draw failed");
        }
    }

    fn text(&mut self, x: i32, w: i32, pad: i32, text: &str, scheme: usize, invert: bool) {
        let s = self.scheme(scheme);
        let (fg, bg) = if invert { (s.bg, s.fg) } else { (s.fg, s.bg) };

        // cell background
        let _ = self.set_fg(bg.rgb_u32());
        let _ = self.conn.poly_fill_rectangle(
            self.buffer,
            self.gc,
            &[Rectangle {
                x: x as i16,
                y: 0,
                width: w.max(0) as u16,
                height: self.height.max(0) as u16,
            }],
        );

        // clip by dropping glyphs that no longer fit
        let budget = w - pad;
        let mut visible = String::with_capacity(text.len());
        for ch in text.chars() {
            if self.text_width(&visible) + self.text_width(&ch.to_string()) > budget {
                break;
            }
            visible.push(ch);
        }

        let aux = ChangeGCAux::new()
            .foreground(fg.rgb_u32())
            .background(bg.rgb_u32());
        if self.conn.change_gc(self.gc, &aux).is_err() {
            return;
        }

        let y = (self.height - self.font_h) / 2 + self.ascent;
        // core fonts are byte oriented; non-latin text degrades but draws
        if let Err(e) = self.conn.image_text8(
            self.buffer,
            self.gc,
            (x + pad) as i16,
            y as i16,
            visible.as_bytes(),
        ) {
            warn!(%e, "bar text draw failed");
        }
    }

    fn flush_to(&mut self, barwin: Xid, w: i32, h: i32) -> Result<()> {
        self.conn.copy_area(
            self.buffer,
            *barwin,
            self.gc,
            0,
            0,
            0,
            0,
            w.clamp(0, self.width) as u16,
            h.clamp(0, self.height) as u16,
        )?;
        self.conn.flush()?;

        Ok(())
    }

    fn resize_buffer(&mut self, w: i32, h: i32) -> Result<()> {
        if self.buffer != 0 {
            self.conn.free_pixmap(self.buffer)?;
        }

        let buffer = self.conn.generate_id()?;
        self.conn
            .create_pixmap(self.depth, buffer, self.root, w.max(1) as u16, h.max(1) as u16)?;
        self.buffer = buffer;
        self.width = w;
        self.height = h;

        Ok(())
    }
}
