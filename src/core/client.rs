//! The managed client window record.
use crate::{
    core::Xid,
    geometry::Rect,
    x::property::SizeHints,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A managed top-level window.
///
/// A client is owned by exactly one monitor at a time: `mon` indexes the
/// monitor list and the owning monitor's `clients` / `stack` vectors both
/// contain this client's id exactly once.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Client {
    /// The X window id
    pub id: Xid,
    /// The window title (from _NET_WM_NAME, falling back to WM_NAME)
    pub title: String,
    /// The tags this client carries
    pub tags: u32,
    /// Index of the owning monitor
    pub mon: usize,
    /// Current geometry (frame rectangle, excluding the border)
    pub r: Rect,
    /// Geometry before the last resize, for restore after fullscreen or a
    /// float toggle
    pub old_r: Rect,
    /// Current border width
    pub bw: i32,
    /// Border width before fullscreen
    pub old_bw: i32,
    /// Normalised ICCCM size hints
    pub hints: SizeHints,
    /// min == max in both axes: the client refuses to be resized
    pub is_fixed: bool,
    /// Not subject to tiled layout arrangement
    pub is_floating: bool,
    /// Auto-center when floating (dialogs, rule matches)
    pub is_centered: bool,
    /// The urgency hint is set and the client is not selected
    pub is_urgent: bool,
    /// WM_HINTS input field was false: never give this window input focus
    pub never_focus: bool,
    /// The floating state saved when entering fullscreen
    pub old_state: bool,
    /// Currently fullscreen
    pub is_fullscreen: bool,
}

impl Client {
    /// A new client for a freshly mapped window.
    pub fn new(id: Xid, r: Rect, border_width: i32) -> Self {
        Self {
            id,
            title: String::new(),
            tags: 0,
            mon: 0,
            r,
            old_r: r,
            bw: border_width,
            old_bw: border_width,
            hints: SizeHints::default(),
            is_fixed: false,
            is_floating: false,
            is_centered: false,
            is_urgent: false,
            never_focus: false,
            old_state: false,
            is_fullscreen: false,
        }
    }

    /// Total on-screen width including the border.
    pub fn total_w(&self) -> i32 {
        self.r.w + 2 * self.bw
    }

    /// Total on-screen height including the border.
    pub fn total_h(&self) -> i32 {
        self.r.h + 2 * self.bw
    }

    /// Whether this client shows on a monitor displaying `tagset`.
    pub fn shows_on(&self, tagset: u32) -> bool {
        self.tags & tagset != 0
    }

    /// Normalise a proposed geometry against the screen, the monitor work
    /// area and the client's size hints.
    ///
    /// Interactive (mouse) moves are clamped loosely against the whole
    /// screen so a drag can hang a window partially off the edge; anything
    /// else is clamped against the work area. Size hints are honoured when
    /// `honor_hints` is set (the global resize-hints toggle, a floating
    /// client, or a floating layout).
    pub fn clamped(
        &self,
        mut r: Rect,
        interact: bool,
        wa: Rect,
        screen: (i32, i32),
        bar_h: i32,
        honor_hints: bool,
    ) -> Rect {
        r.w = r.w.max(1);
        r.h = r.h.max(1);

        if interact {
            let (sw, sh) = screen;
            if r.x > sw {
                r.x = sw - self.total_w();
            }
            if r.y > sh {
                r.y = sh - self.total_h();
            }
            if r.x + r.w + 2 * self.bw < 0 {
                r.x = 0;
            }
            if r.y + r.h + 2 * self.bw < 0 {
                r.y = 0;
            }
        } else {
            if r.x >= wa.right() {
                r.x = wa.right() - self.total_w();
            }
            if r.y >= wa.bottom() {
                r.y = wa.bottom() - self.total_h();
            }
            if r.x + r.w + 2 * self.bw <= wa.x {
                r.x = wa.x;
            }
            if r.y + r.h + 2 * self.bw <= wa.y {
                r.y = wa.y;
            }
        }

        r.h = r.h.max(bar_h);
        r.w = r.w.max(bar_h);

        if honor_hints {
            let (w, h) = self.hints.apply_to(r.w, r.h);
            r.w = w;
            r.h = h;
        }

        r
    }
}
