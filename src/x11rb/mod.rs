//! The production X backend: [XConn][crate::x::XConn] and
//! [Draw][crate::draw::Draw] implementations over the x11rb crate.
//!
//! Everything X specific lives here: atom interning, event conversion,
//! keyboard mapping, cursors, the benign-error whitelist and core-font
//! text drawing for the bar.
mod draw;
mod event;
mod xconn;

pub use draw::X11rbDraw;
pub use xconn::X11rbConnection;
