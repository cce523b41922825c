//! X keysym values used by the default key bindings.
//!
//! Values are from X11/keysymdef.h. Key bindings are declared against
//! keysyms and resolved to keycodes by the backend using the server's
//! current keyboard mapping.
#![allow(non_upper_case_globals, missing_docs)]

/// A raw X keysym value.
pub type KeySym = u32;

pub const XK_space: KeySym = 0x0020;
pub const XK_comma: KeySym = 0x002c;
pub const XK_period: KeySym = 0x002e;

pub const XK_0: KeySym = 0x0030;
pub const XK_1: KeySym = 0x0031;
pub const XK_2: KeySym = 0x0032;
pub const XK_3: KeySym = 0x0033;
pub const XK_4: KeySym = 0x0034;
pub const XK_5: KeySym = 0x0035;
pub const XK_6: KeySym = 0x0036;
pub const XK_7: KeySym = 0x0037;
pub const XK_8: KeySym = 0x0038;
pub const XK_9: KeySym = 0x0039;

pub const XK_a: KeySym = 0x0061;
pub const XK_b: KeySym = 0x0062;
pub const XK_c: KeySym = 0x0063;
pub const XK_d: KeySym = 0x0064;
pub const XK_f: KeySym = 0x0066;
pub const XK_g: KeySym = 0x0067;
pub const XK_h: KeySym = 0x0068;
pub const XK_i: KeySym = 0x0069;
pub const XK_j: KeySym = 0x006a;
pub const XK_k: KeySym = 0x006b;
pub const XK_l: KeySym = 0x006c;
pub const XK_m: KeySym = 0x006d;
pub const XK_n: KeySym = 0x006e;
pub const XK_o: KeySym = 0x006f;
pub const XK_p: KeySym = 0x0070;
pub const XK_q: KeySym = 0x0071;
pub const XK_s: KeySym = 0x0073;
pub const XK_t: KeySym = 0x0074;
pub const XK_u: KeySym = 0x0075;

pub const XK_BackSpace: KeySym = 0xff08;
pub const XK_Tab: KeySym = 0xff09;
pub const XK_Return: KeySym = 0xff0d;
pub const XK_Escape: KeySym = 0xff1b;

pub const XK_Num_Lock: KeySym = 0xff7f;
