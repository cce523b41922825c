//! Data types for working with X events
use crate::{
    core::{bindings::ModMask, Xid},
    geometry::{Point, Rect},
    x::keysym::KeySym,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Wrapper around the low level X event types that the engine reacts to.
///
/// The variant names and data follow the X11 protocol event names; backends
/// drop anything the engine has no handler for during conversion.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum XEvent {
    /// A grabbed mouse button has been pressed
    ButtonPress(ButtonEvent),
    /// A previously pressed mouse button has been released
    ButtonRelease(ButtonEvent),
    /// A message has been sent to a particular client
    ClientMessage(ClientMessage),
    /// A window (or the root) has changed size or position
    ConfigureNotify(ConfigureEvent),
    /// A client is requesting to be repositioned
    ConfigureRequest(ConfigureRequest),
    /// A client window has been destroyed
    DestroyNotify(Xid),
    /// The mouse pointer has entered a new window
    Enter(EnterEvent),
    /// A part or all of a window has become visible
    Expose(ExposeEvent),
    /// A client has gained input focus
    FocusIn(Xid),
    /// A grabbed key combination has been entered by the user
    KeyPress(KeyPressEvent),
    /// The keyboard or pointer mapping has changed
    MappingNotify {
        /// Whether the keyboard mapping changed (pointer otherwise)
        keyboard: bool,
    },
    /// A client window is requesting to be positioned and rendered on the screen
    MapRequest(Xid),
    /// The mouse pointer has moved
    MotionNotify(MotionEvent),
    /// A client property has changed in some way
    PropertyNotify(PropertyEvent),
    /// A systray icon is requesting a new size; ignored (no systray support)
    ResizeRequest(Xid),
    /// A client window is being unmapped
    UnmapNotify {
        /// The window being unmapped
        id: Xid,
        /// True for synthetic unmaps sent by the client itself to withdraw
        send_event: bool,
    },
}

impl std::fmt::Display for XEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use XEvent::*;

        match self {
            ButtonPress(_) => write!(f, "ButtonPress"),
            ButtonRelease(_) => write!(f, "ButtonRelease"),
            ClientMessage(_) => write!(f, "ClientMessage"),
            ConfigureNotify(_) => write!(f, "ConfigureNotify"),
            ConfigureRequest(_) => write!(f, "ConfigureRequest"),
            DestroyNotify(_) => write!(f, "DestroyNotify"),
            Enter(_) => write!(f, "EnterNotify"),
            Expose(_) => write!(f, "Expose"),
            FocusIn(_) => write!(f, "FocusIn"),
            KeyPress(_) => write!(f, "KeyPress"),
            MappingNotify { .. } => write!(f, "MappingNotify"),
            MapRequest(_) => write!(f, "MapRequest"),
            MotionNotify(_) => write!(f, "MotionNotify"),
            PropertyNotify(_) => write!(f, "PropertyNotify"),
            ResizeRequest(_) => write!(f, "ResizeRequest"),
            UnmapNotify { .. } => write!(f, "UnmapNotify"),
        }
    }
}

/// A mouse button press or release.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ButtonEvent {
    /// The window the event was delivered for (the root for bar / desktop clicks)
    pub id: Xid,
    /// The button that was pressed (1..=5)
    pub button: u8,
    /// Held modifiers
    pub mask: ModMask,
    /// Position relative to the event window
    pub pos: Point,
    /// Position relative to the root window
    pub root_pos: Point,
}

/// A message sent to a client (or the root) by some other X client.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientMessage {
    /// The window the message targets
    pub id: Xid,
    /// The name of the message type atom
    pub dtype: String,
    /// The message payload, widened to u32 words
    pub data: [u32; 5],
}

/// A notification that a window changed size or position.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigureEvent {
    /// The window that was configured
    pub id: Xid,
    /// The new geometry
    pub r: Rect,
    /// Is this window the root window?
    pub is_root: bool,
}

/// A client request to be repositioned. Each field is present only if the
/// corresponding bit was set in the request's value mask.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConfigureRequest {
    /// The window requesting reconfiguration
    pub id: Xid,
    /// Requested x position
    pub x: Option<i32>,
    /// Requested y position
    pub y: Option<i32>,
    /// Requested width
    pub w: Option<i32>,
    /// Requested height
    pub h: Option<i32>,
    /// Requested border width
    pub border_width: Option<i32>,
    /// Requested stacking sibling
    pub sibling: Option<Xid>,
    /// Requested stacking mode, as the raw protocol value
    pub stack_mode: Option<u32>,
}

/// The mouse pointer has entered a window.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnterEvent {
    /// The window that was entered
    pub id: Xid,
    /// Whether the entered window is the root
    pub is_root: bool,
    /// The crossing mode was NotifyNormal
    pub normal: bool,
    /// The crossing detail was NotifyInferior
    pub inferior: bool,
}

/// A notification that a window has become visible.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExposeEvent {
    /// The window that has become exposed
    pub id: Xid,
    /// How many following expose events are pending
    pub count: u16,
}

/// A grabbed key press, resolved to a keysym by the backend.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyPressEvent {
    /// The keysym for the pressed keycode
    pub keysym: KeySym,
    /// Held modifiers
    pub mask: ModMask,
}

/// The mouse has moved.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MotionEvent {
    /// The window the motion was reported against
    pub id: Xid,
    /// Whether the event window is the root
    pub is_root: bool,
    /// Position relative to the root window
    pub root_pos: Point,
    /// Server timestamp in milliseconds, used for rate limiting drags
    pub time: u32,
}

/// A property change on some window.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyEvent {
    /// The window that had a property changed
    pub id: Xid,
    /// The name of the property that changed
    pub atom: String,
    /// Is this window the root window?
    pub is_root: bool,
    /// Whether the property was deleted rather than replaced
    pub deleted: bool,
}
