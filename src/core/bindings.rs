//! User defined key and mouse bindings.
use crate::{
    x::{event::ButtonEvent, keysym::KeySym, XConn},
    Result,
};
use bitflags::bitflags;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// An X modifier bitmask as carried in key and button events.
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ModMask: u16 {
        /// Shift
        const SHIFT = 1 << 0;
        /// Caps lock
        const LOCK = 1 << 1;
        /// Control
        const CONTROL = 1 << 2;
        /// Mod1 (typically alt)
        const MOD1 = 1 << 3;
        /// Mod2 (typically num lock)
        const MOD2 = 1 << 4;
        /// Mod3
        const MOD3 = 1 << 5;
        /// Mod4 (typically super)
        const MOD4 = 1 << 6;
        /// Mod5
        const MOD5 = 1 << 7;
    }
}

impl ModMask {
    /// Canonicalise an event state for comparison against bindings by
    /// dropping caps lock and the detected num lock modifier.
    pub fn clean(self, numlock: ModMask) -> ModMask {
        self & !(numlock | ModMask::LOCK)
    }
}

/// The regions of the screen that mouse bindings can be attached to.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickTarget {
    /// A tag cell in the bar
    TagBar,
    /// The layout symbol in the bar
    LayoutSymbol,
    /// The status text section of the bar
    StatusText,
    /// The window title section of the bar
    WinTitle,
    /// A managed client window
    ClientWin,
    /// The root window itself
    RootWin,
}

/// An action to be run in response to a key press.
pub type KeyEventHandler<X> = Box<dyn FnMut(&mut crate::core::State, &X) -> Result<()>>;

/// An action to be run in response to a mouse button press.
///
/// For [ClickTarget::TagBar] bindings the handler receives the index of the
/// clicked tag via the [ButtonEvent] position resolved by the dispatcher.
pub type MouseEventHandler<X> =
    Box<dyn FnMut(&mut crate::core::State, &X, &ClickInfo) -> Result<()>>;

/// Context handed to mouse binding handlers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickInfo {
    /// The raw button event
    pub event: ButtonEvent,
    /// For tag bar clicks, the index of the clicked tag
    pub tag_index: Option<usize>,
}

/// A user key binding: a modifier mask and keysym paired with an action.
pub struct KeyBinding<X>
where
    X: XConn,
{
    /// Modifiers that must be held
    pub mods: ModMask,
    /// The bound keysym
    pub keysym: KeySym,
    /// The action to run
    pub action: KeyEventHandler<X>,
}

impl<X: XConn> fmt::Debug for KeyBinding<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyBinding")
            .field("mods", &self.mods)
            .field("keysym", &self.keysym)
            .finish()
    }
}

/// A user mouse binding: a click target, modifier mask and button paired
/// with an action.
pub struct ButtonBinding<X>
where
    X: XConn,
{
    /// Where on the screen this binding applies
    pub target: ClickTarget,
    /// Modifiers that must be held
    pub mods: ModMask,
    /// The bound button (1..=5)
    pub button: u8,
    /// The action to run
    pub action: MouseEventHandler<X>,
}

impl<X: XConn> fmt::Debug for ButtonBinding<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ButtonBinding")
            .field("target", &self.target)
            .field("mods", &self.mods)
            .field("button", &self.button)
            .finish()
    }
}
