//! Logic for interacting with the X server.
//!
//! [XConn] is the single seam between the management engine and the X
//! server: the engine only ever talks to the display through this trait.
//! The production implementation lives in [crate::x11rb]; the test suite
//! uses a recording mock.
use crate::{
    core::{bindings::ModMask, Xid},
    geometry::{Point, Rect},
    x::keysym::KeySym,
    Color, Result,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod atom;
pub mod event;
pub mod keysym;
pub mod property;

#[cfg(test)]
pub mod mock;

pub use atom::{Atom, EWMH_SUPPORTED_ATOMS};
pub use event::XEvent;
pub use property::{MapState, SizeHints, WindowAttributes, WmHints, WmState};

/// The pointer shapes the engine asks the backend to display.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorKind {
    /// The default left pointer
    Normal,
    /// The bottom-right sizing cursor shown while resizing
    Resize,
    /// The fleur cursor shown while moving
    Move,
}

/// A handle on a running X11 connection used for issuing X requests.
///
/// All engine state changes flow through these methods so that the test
/// suite can drive the engine with scripted events and assert on the
/// protocol calls that result.
pub trait XConn {
    // -- setup / teardown ---------------------------------------------------

    /// The ID of the window manager root window.
    fn root(&self) -> Xid;

    /// Select SubstructureRedirect on the root, erroring with
    /// [Error::OtherWmRunning][crate::Error::OtherWmRunning] if another
    /// window manager already holds it, then select the full root event
    /// mask the engine needs.
    fn become_wm(&self) -> Result<()>;

    /// Declare EWMH support on the root: `_NET_SUPPORTED`, and a
    /// `_NET_SUPPORTING_WM_CHECK` window carrying `_NET_WM_NAME`.
    fn init_ewmh(&self, wm_name: &str) -> Result<()>;

    /// Ask the X server for the usable screen regions (Xinerama heads,
    /// deduplicated; a single whole-screen region without RandR data).
    fn screen_sizes(&self) -> Result<Vec<Rect>>;

    /// The pixel dimensions of the whole X screen.
    fn screen_extent(&self) -> (i32, i32);

    /// The IDs of all current top-level children of the root, in stacking
    /// order, for the startup scan.
    fn query_tree(&self) -> Result<Vec<Xid>>;

    // -- event pump ---------------------------------------------------------

    /// Block and wait for the next event from the X server.
    fn next_event(&self) -> Result<XEvent>;

    /// Block for the next event relevant inside a pointer grab: motion,
    /// button release, and the re-dispatched subset (ConfigureRequest,
    /// Expose, MapRequest).
    fn next_drag_event(&self) -> Result<XEvent>;

    /// Throw away any queued EnterNotify events so that a restack or an
    /// ungrab does not cause spurious focus changes.
    fn drain_enter_events(&self) -> Result<()>;

    /// Flush any pending requests to the X server.
    fn flush(&self);

    /// Flush and wait for the server to have processed every request.
    fn sync(&self) -> Result<()>;

    // -- property reads -----------------------------------------------------

    /// The [WindowAttributes] for a window.
    fn get_window_attributes(&self, id: Xid) -> Result<WindowAttributes>;

    /// The current geometry and border width of a window.
    fn get_geometry(&self, id: Xid) -> Result<(Rect, i32)>;

    /// Read a text property (UTF8 or Latin-1) from a window.
    fn get_prop_string(&self, id: Xid, atom: Atom) -> Result<Option<String>>;

    /// Read the WM_CLASS pair `(instance, class)` for a window.
    fn get_wm_class(&self, id: Xid) -> Result<Option<(String, String)>>;

    /// Read and parse WM_HINTS for a window.
    fn get_wm_hints(&self, id: Xid) -> Result<Option<WmHints>>;

    /// Read and normalise WM_NORMAL_HINTS for a window.
    fn get_size_hints(&self, id: Xid) -> Result<Option<SizeHints>>;

    /// Read WM_TRANSIENT_FOR for a window.
    fn get_transient_for(&self, id: Xid) -> Result<Option<Xid>>;

    /// Read an ATOM[] property, returning the atom names.
    fn get_prop_atoms(&self, id: Xid, prop: Atom) -> Result<Vec<String>>;

    /// The server-side id of a known [Atom] (client message payloads carry
    /// raw atom ids).
    fn atom_id(&self, atom: Atom) -> Result<u32>;

    /// Read the ICCCM WM_STATE property for a window if set.
    fn get_wm_state(&self, id: Xid) -> Result<Option<WmState>>;

    /// Whether the window advertises the given protocol in WM_PROTOCOLS.
    fn supports_protocol(&self, id: Xid, proto: Atom) -> Result<bool>;

    /// Clear the urgency bit in a client's WM_HINTS (the WM clears it when
    /// the client becomes selected).
    fn clear_urgency_hint(&self, id: Xid) -> Result<()>;

    // -- property writes ----------------------------------------------------

    /// Write the ICCCM WM_STATE property for a window.
    fn set_wm_state(&self, id: Xid, state: WmState) -> Result<()>;

    /// Update `_NET_ACTIVE_WINDOW` on the root; `None` deletes the property.
    fn set_active_window(&self, id: Option<Xid>) -> Result<()>;

    /// Append a window to the root `_NET_CLIENT_LIST`.
    fn append_to_client_list(&self, id: Xid) -> Result<()>;

    /// Replace the root `_NET_CLIENT_LIST` with the given windows.
    fn set_client_list(&self, ids: &[Xid]) -> Result<()>;

    /// Add or remove `_NET_WM_STATE_FULLSCREEN` from a window's
    /// `_NET_WM_STATE`.
    fn set_fullscreen_state(&self, id: Xid, fullscreen: bool) -> Result<()>;

    /// Set `_NET_WM_WINDOW_OPACITY` on a window (`opacity` in `[0, 1]`).
    fn set_window_opacity(&self, id: Xid, opacity: f64) -> Result<()>;

    // -- window manipulation ------------------------------------------------

    /// Move and resize a window, setting its border width.
    fn configure(&self, id: Xid, r: Rect, border_width: i32) -> Result<()>;

    /// Move a window without touching its size (used to park hidden
    /// clients off-screen).
    fn move_window(&self, id: Xid, x: i32, y: i32) -> Result<()>;

    /// Set only the border width of a window.
    fn set_border_width(&self, id: Xid, border_width: i32) -> Result<()>;

    /// Set the border color of a window.
    fn set_border_color(&self, id: Xid, color: Color) -> Result<()>;

    /// Send a synthetic ConfigureNotify telling the client its current
    /// geometry (used when a configure request is refused).
    fn send_configure_notify(&self, id: Xid, r: Rect, border_width: i32) -> Result<()>;

    /// Apply a raw configure request for a window the engine does not
    /// manage, passing through whatever fields the client asked for.
    fn configure_unmanaged(&self, ev: &event::ConfigureRequest) -> Result<()>;

    /// Restack a window directly below a sibling.
    fn stack_below(&self, id: Xid, sibling: Xid) -> Result<()>;

    /// Raise a window to the top of the stacking order.
    fn raise(&self, id: Xid) -> Result<()>;

    /// Map a window, making it visible.
    fn map(&self, id: Xid) -> Result<()>;

    /// Select the per-client event mask (enter, focus, property and
    /// structure notifications) on a managed window.
    fn select_client_events(&self, id: Xid) -> Result<()>;

    /// Send `proto` to a client as a WM_PROTOCOLS client message.
    fn send_protocol_message(&self, id: Xid, proto: Atom) -> Result<()>;

    /// Forcibly kill a client connection server-side.
    fn kill_client(&self, id: Xid) -> Result<()>;

    /// Set X input focus to the given window.
    fn set_input_focus(&self, id: Xid) -> Result<()>;

    /// Revert input focus to the root window.
    fn focus_root(&self) -> Result<()>;

    // -- bar windows --------------------------------------------------------

    /// Create an override-redirect bar window at the given position.
    fn create_bar_window(&self, r: Rect) -> Result<Xid>;

    /// Destroy a window created by the window manager itself.
    fn destroy_window(&self, id: Xid) -> Result<()>;

    // -- grabs and the pointer ----------------------------------------------

    /// Grab every binding's key combination on the root, with each
    /// combination of num lock and caps lock.
    fn grab_keys(&self, keys: &[(ModMask, KeySym)]) -> Result<()>;

    /// Release all key grabs on the root.
    fn ungrab_keys(&self) -> Result<()>;

    /// Grab mouse buttons on a client window. With `any_button` every
    /// button/modifier combination is grabbed (so that a click refocuses
    /// an unfocused client); otherwise only the given bindings are, with
    /// each lock combination.
    fn grab_buttons(&self, id: Xid, buttons: &[(ModMask, u8)], any_button: bool) -> Result<()>;

    /// Release all button grabs on a client window.
    fn ungrab_buttons(&self, id: Xid) -> Result<()>;

    /// Grab the pointer for an interactive move or resize, displaying the
    /// given cursor. Returns false if the grab could not be acquired.
    fn grab_pointer(&self, cursor: CursorKind) -> Result<bool>;

    /// Release a pointer grab taken with [XConn::grab_pointer].
    fn ungrab_pointer(&self) -> Result<()>;

    /// Grab the whole server around a destructive critical section.
    fn grab_server(&self) -> Result<()>;

    /// Release a server grab.
    fn ungrab_server(&self) -> Result<()>;

    /// The current pointer position relative to the root.
    fn query_pointer(&self) -> Result<Point>;

    /// Warp the pointer to `(x, y)` relative to the given window.
    fn warp_pointer(&self, id: Xid, x: i32, y: i32) -> Result<()>;

    /// Recompute which modifier bit num lock currently lives on.
    fn numlock_mask(&self) -> Result<ModMask>;

    /// Refresh the cached keyboard mapping after a MappingNotify.
    fn refresh_keyboard_mapping(&self) -> Result<()>;
}
