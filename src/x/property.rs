//! Data types for ICCCM window properties.
use bitflags::bitflags;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The ICCCM WM_STATE of a client window.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WmState {
    /// The window is mapped and visible to the user
    Normal,
    /// The window is iconified
    Iconic,
    /// The window is not mapped and is not an icon either
    Withdrawn,
}

impl From<WmState> for u32 {
    fn from(s: WmState) -> u32 {
        match s {
            WmState::Withdrawn => 0,
            WmState::Normal => 1,
            WmState::Iconic => 3,
        }
    }
}

/// The current map state of a client window.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapState {
    /// The window is unmapped
    Unmapped,
    /// The window is mapped but obscured by an unviewable ancestor
    Unviewable,
    /// The window is mapped and viewable
    Viewable,
}

/// The subset of X window attributes the engine cares about.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowAttributes {
    /// Whether the window has asked not to be managed (popups, menus)
    pub override_redirect: bool,
    /// The current map state of the window
    pub map_state: MapState,
}

bitflags! {
    /// Flag bits for the ICCCM WM_HINTS property.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WmHintsFlags: u32 {
        /// The input field carries meaning
        const INPUT = 1 << 0;
        /// The window is flagged as urgent
        const URGENCY = 1 << 8;
    }
}

/// Parsed ICCCM WM_HINTS.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WmHints {
    /// XUrgencyHint: the client wants attention
    pub urgent: bool,
    /// The InputHint input field: false means the client never takes focus
    pub accepts_input: bool,
}

impl WmHints {
    /// Parse from the raw CARD32 words of WM_HINTS. The property is 9 words
    /// long: flags, input, initial_state, icons and window_group.
    pub fn from_raw(data: &[u32]) -> Option<Self> {
        if data.len() < 2 {
            return None;
        }

        let flags = WmHintsFlags::from_bits_truncate(data[0]);

        Some(Self {
            urgent: flags.contains(WmHintsFlags::URGENCY),
            accepts_input: !flags.contains(WmHintsFlags::INPUT) || data[1] != 0,
        })
    }
}

bitflags! {
    /// Flag bits for the ICCCM WM_NORMAL_HINTS property.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SizeHintsFlags: u32 {
        /// User specified position
        const US_POSITION = 1 << 0;
        /// User specified size
        const US_SIZE = 1 << 1;
        /// Program specified position
        const P_POSITION = 1 << 2;
        /// Program specified size
        const P_SIZE = 1 << 3;
        /// Program specified minimum size
        const P_MIN_SIZE = 1 << 4;
        /// Program specified maximum size
        const P_MAX_SIZE = 1 << 5;
        /// Program specified resize increments
        const P_RESIZE_INC = 1 << 6;
        /// Program specified aspect ratio limits
        const P_ASPECT = 1 << 7;
        /// Program specified base size
        const P_BASE_SIZE = 1 << 8;
        /// Program specified window gravity
        const P_WIN_GRAVITY = 1 << 9;
    }
}

/// Normalised ICCCM size hints for a client window.
///
/// The raw property is normalised the way clients expect it to be read:
/// a missing base size falls back to the minimum size and vice versa, and
/// aspect limits are pre-divided into ratios.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SizeHints {
    /// Base size subtracted before applying resize increments
    pub base_w: i32,
    /// Base size subtracted before applying resize increments
    pub base_h: i32,
    /// Resize increment step (0 for none)
    pub inc_w: i32,
    /// Resize increment step (0 for none)
    pub inc_h: i32,
    /// Maximum size (0 for unbounded)
    pub max_w: i32,
    /// Maximum size (0 for unbounded)
    pub max_h: i32,
    /// Minimum size (0 for none)
    pub min_w: i32,
    /// Minimum size (0 for none)
    pub min_h: i32,
    /// Minimum aspect ratio as h/w (0.0 for none)
    pub min_aspect: f32,
    /// Maximum aspect ratio as w/h (0.0 for none)
    pub max_aspect: f32,
    /// base == min, so increments apply to the space above the base size
    pub base_is_min: bool,
}

impl SizeHints {
    /// Parse and normalise the raw CARD32 words of WM_NORMAL_HINTS.
    ///
    /// The modern property is 18 words: flags, 4 legacy geometry words,
    /// min/max size, resize increments, aspect limits, base size and
    /// gravity. Pre-ICCCM clients send only the first 15.
    pub fn from_raw(data: &[u32]) -> Option<Self> {
        if data.len() < 15 {
            return None;
        }

        let flags = SizeHintsFlags::from_bits_truncate(data[0]);
        let word = |i: usize| *data.get(i).unwrap_or(&0) as i32;

        let (min_w, min_h) = if flags.contains(SizeHintsFlags::P_MIN_SIZE) {
            (word(5), word(6))
        } else {
            (0, 0)
        };
        let (base_w, base_h) = if flags.contains(SizeHintsFlags::P_BASE_SIZE) {
            (word(15), word(16))
        } else {
            (min_w, min_h)
        };
        let (min_w, min_h) = if min_w == 0 && min_h == 0 {
            (base_w, base_h)
        } else {
            (min_w, min_h)
        };
        let (max_w, max_h) = if flags.contains(SizeHintsFlags::P_MAX_SIZE) {
            (word(7), word(8))
        } else {
            (0, 0)
        };
        let (inc_w, inc_h) = if flags.contains(SizeHintsFlags::P_RESIZE_INC) {
            (word(9), word(10))
        } else {
            (0, 0)
        };
        let (min_aspect, max_aspect) = if flags.contains(SizeHintsFlags::P_ASPECT) {
            let (min_num, min_den) = (word(11), word(12));
            let (max_num, max_den) = (word(13), word(14));
            let min_a = if min_num > 0 {
                min_den as f32 / min_num as f32
            } else {
                0.0
            };
            let max_a = if max_den > 0 {
                max_num as f32 / max_den as f32
            } else {
                0.0
            };

            (min_a, max_a)
        } else {
            (0.0, 0.0)
        };

        Some(Self {
            base_w,
            base_h,
            inc_w,
            inc_h,
            max_w,
            max_h,
            min_w,
            min_h,
            min_aspect,
            max_aspect,
            base_is_min: base_w == min_w && base_h == min_h,
        })
    }

    /// Whether the hints pin the window to a single size in both axes.
    pub fn is_fixed(&self) -> bool {
        self.max_w != 0 && self.max_h != 0 && self.max_w == self.min_w && self.max_h == self.min_h
    }

    /// Adjust a proposed inner size to honour these hints.
    ///
    /// Applies, in order: base subtraction, aspect limits, resize
    /// increments, then min/max bounds. When base == min the base size is
    /// re-subtracted before rounding so that increments apply to the space
    /// above the base size.
    pub fn apply_to(&self, mut w: i32, mut h: i32) -> (i32, i32) {
        if !self.base_is_min {
            w -= self.base_w;
            h -= self.base_h;
        }

        if self.min_aspect > 0.0 && self.max_aspect > 0.0 {
            if self.max_aspect < w as f32 / h as f32 {
                w = (h as f32 * self.max_aspect + 0.5) as i32;
            } else if self.min_aspect < h as f32 / w as f32 {
                h = (w as f32 * self.min_aspect + 0.5) as i32;
            }
        }

        if self.base_is_min {
            w -= self.base_w;
            h -= self.base_h;
        }

        if self.inc_w > 0 {
            w -= w % self.inc_w;
        }
        if self.inc_h > 0 {
            h -= h % self.inc_h;
        }

        w = self.min_w.max(w + self.base_w);
        h = self.min_h.max(h + self.base_h);

        if self.max_w > 0 {
            w = w.min(self.max_w);
        }
        if self.max_h > 0 {
            h = h.min(self.max_h);
        }

        (w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    fn raw_hints(flags: u32, fields: &[(usize, u32)]) -> Vec<u32> {
        let mut data = vec![0; 18];
        data[0] = flags;
        for &(i, v) in fields {
            data[i] = v;
        }

        data
    }

    #[test]
    fn min_size_falls_back_to_base(/* PBaseSize only */) {
        let data = raw_hints(SizeHintsFlags::P_BASE_SIZE.bits(), &[(15, 80), (16, 24)]);
        let h = SizeHints::from_raw(&data).unwrap();

        assert_eq!((h.base_w, h.base_h), (80, 24));
        assert_eq!((h.min_w, h.min_h), (80, 24));
    }

    #[test]
    fn base_size_falls_back_to_min() {
        let data = raw_hints(SizeHintsFlags::P_MIN_SIZE.bits(), &[(5, 100), (6, 50)]);
        let h = SizeHints::from_raw(&data).unwrap();

        assert_eq!((h.base_w, h.base_h), (100, 50));
        assert!(h.base_is_min);
    }

    #[test]
    fn fixed_when_min_eq_max() {
        let flags = SizeHintsFlags::P_MIN_SIZE | SizeHintsFlags::P_MAX_SIZE;
        let data = raw_hints(flags.bits(), &[(5, 200), (6, 100), (7, 200), (8, 100)]);
        let h = SizeHints::from_raw(&data).unwrap();

        assert!(h.is_fixed());
    }

    #[test]
    fn increments_round_down() {
        let flags = SizeHintsFlags::P_BASE_SIZE | SizeHintsFlags::P_RESIZE_INC;
        let data = raw_hints(flags.bits(), &[(9, 7), (10, 13), (15, 3), (16, 4)]);
        let h = SizeHints::from_raw(&data).unwrap();

        // 100 - 3 = 97 -> 91 (13 * 7) + 3 = 94; 60 - 4 = 56 -> 52 (4 * 13) + 4 = 56
        assert_eq!(h.apply_to(100, 60), (94, 56));
    }

    #[test_case(300, 100, (200, 100); "wider than max aspect")]
    #[test_case(100, 300, (100, 200); "taller than min aspect")]
    #[test_case(150, 100, (150, 100); "within limits")]
    #[test]
    fn aspect_limits(w: i32, h: i32, expected: (i32, i32)) {
        let data = raw_hints(
            SizeHintsFlags::P_ASPECT.bits(),
            &[(11, 1), (12, 2), (13, 2), (14, 1)],
        );
        let h_ = SizeHints::from_raw(&data).unwrap();

        assert_eq!(h_.apply_to(w, h), expected);
    }

    #[test]
    fn min_and_max_bounds() {
        let flags = SizeHintsFlags::P_MIN_SIZE | SizeHintsFlags::P_MAX_SIZE;
        let data = raw_hints(flags.bits(), &[(5, 50), (6, 40), (7, 400), (8, 300)]);
        let h = SizeHints::from_raw(&data).unwrap();

        assert_eq!(h.apply_to(10, 10), (50, 40));
        assert_eq!(h.apply_to(1000, 1000), (400, 300));
    }

    #[test]
    fn urgency_hint_parsed() {
        let hints = WmHints::from_raw(&[1 << 8, 1]).unwrap();

        assert!(hints.urgent);
        assert!(hints.accepts_input);
    }

    #[test]
    fn input_hint_false_means_never_focus() {
        let hints = WmHints::from_raw(&[1, 0]).unwrap();

        assert!(!hints.accepts_input);
    }
}
