//! Core data structures and the window manager run loop.
use crate::{
    bar,
    config::Config,
    core::bindings::{ButtonBinding, KeyBinding, ModMask},
    draw::Draw,
    x::{keysym::KeySym, MapState, WmState, XConn},
    Result,
};
use nix::sys::{
    signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal},
    wait::{waitpid, WaitPidFlag},
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fmt,
    ops::Deref,
    sync::atomic::{AtomicBool, Ordering},
};
use tracing::{debug, error, span, trace, warn, Level};

pub mod actions;
pub mod bindings;
pub mod client;
pub mod handle;
pub mod monitor;
pub mod ops;

#[cfg(test)]
pub(crate) mod tests;

pub use client::Client;
pub use monitor::{Monitor, Pertag};

/// An X11 ID for a given resource
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Default, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct Xid(pub(crate) u32);

impl fmt::Display for Xid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Deref for Xid {
    type Target = u32;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<u32> for Xid {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<Xid> for u32 {
    fn from(id: Xid) -> Self {
        id.0
    }
}

/// The sentinel used wherever a client text property is missing or empty.
pub(crate) const BROKEN: &str = "broken";

static SHOULD_EXIT: AtomicBool = AtomicBool::new(false);
static SHOULD_RESTART: AtomicBool = AtomicBool::new(false);

extern "C" fn on_sigterm(_: libc_int) {
    SHOULD_EXIT.store(true, Ordering::SeqCst);
}

extern "C" fn on_sighup(_: libc_int) {
    SHOULD_RESTART.store(true, Ordering::SeqCst);
}

// Reap inside the handler: only waitpid(-1, WNOHANG) is called, which is
// async-signal-safe.
extern "C" fn on_sigchld(_: libc_int) {
    while let Ok(status) = waitpid(None, Some(WaitPidFlag::WNOHANG)) {
        if matches!(status, nix::sys::wait::WaitStatus::StillAlive) {
            break;
        }
    }
}

#[allow(non_camel_case_types)]
type libc_int = std::os::raw::c_int;

/// Mutable internal state for the window manager.
///
/// All of it is owned by the event loop thread; handlers receive it by
/// mutable reference together with the X connection.
#[derive(Debug)]
pub struct State {
    /// The static configuration tables
    pub config: Config,
    /// Every managed client, keyed by window id
    pub clients: HashMap<Xid, Client>,
    /// The monitor list; never empty after setup
    pub monitors: Vec<Monitor>,
    /// Index of the selected monitor
    pub selmon: usize,
    /// The status text shown in the bar, from the root WM_NAME
    pub status: String,
    /// Current tag labels (renamable at runtime)
    pub tag_labels: Vec<String>,
    /// The bar height in pixels
    pub bar_h: i32,
    /// The modifier bit num lock currently lives on
    pub numlock: ModMask,
    /// Cleared to exit the main loop
    pub running: bool,
    /// Set together with `!running` to re-exec after cleanup
    pub restart: bool,
    /// The (mods, button) pairs grabbed on focused client windows
    pub(crate) button_specs: Vec<(ModMask, u8)>,
    /// The monitor the pointer was last seen on (root motion tracking)
    pub(crate) motion_mon: Option<usize>,
    /// The drawing backend for the bars
    pub(crate) draw: Box<dyn Draw>,
}

impl State {
    /// Construct the initial state for the given config and connection.
    pub fn try_new<X: XConn>(config: Config, draw: Box<dyn Draw>, x: &X) -> Result<Self> {
        assert!(config.tags.len() <= 31, "at most 31 tags are supported");
        assert!(
            config.colors.len() > crate::config::SCHEME_URGENT,
            "the color table needs at least norm/sel/urgent schemes"
        );

        let bar_h = if config.bar_height > 0 {
            config.bar_height
        } else {
            draw.font_height() + 2
        };

        let mut state = Self {
            tag_labels: config.tags.iter().map(|t| t.name.to_owned()).collect(),
            config,
            clients: HashMap::new(),
            monitors: Vec::new(),
            selmon: 0,
            status: format!("rawm-{}", env!("CARGO_PKG_VERSION")),
            bar_h,
            numlock: x.numlock_mask()?,
            running: true,
            restart: false,
            button_specs: Vec::new(),
            motion_mon: None,
            draw,
        };

        ops::update_geometry(&mut state, x)?;

        Ok(state)
    }

    /// The selected monitor.
    pub fn selected_monitor(&self) -> &Monitor {
        &self.monitors[self.selmon]
    }

    /// The selected client on the selected monitor, if any.
    pub fn selected_client(&self) -> Option<&Client> {
        self.monitors[self.selmon]
            .sel
            .and_then(|id| self.clients.get(&id))
    }

    /// The monitor owning the given window: a client's monitor, a bar
    /// window's monitor, or the monitor under the pointer for anything else.
    pub fn win_to_monitor(&self, id: Xid) -> Option<usize> {
        if let Some(c) = self.clients.get(&id) {
            return Some(c.mon);
        }

        self.monitors.iter().position(|m| m.barwin == id)
    }

    /// The monitor whose outer rectangle has the largest intersection with
    /// `r` (dominant-monitor rule).
    pub fn rect_to_monitor(&self, r: crate::geometry::Rect) -> usize {
        let mut best = self.selmon;
        let mut area = 0;

        for (i, m) in self.monitors.iter().enumerate() {
            let a = m.mon_r.intersection_area(&r);
            if a > area {
                area = a;
                best = i;
            }
        }

        best
    }

    /// Whether the given client is visible on its owning monitor.
    pub fn is_visible(&self, c: &Client) -> bool {
        c.shows_on(self.monitors[c.mon].tagmask())
    }
}

/// A top level struct holding everything required to run the window manager.
pub struct WindowManager<X>
where
    X: XConn,
{
    x: X,
    /// The mutable engine state
    pub state: State,
    keys: Vec<KeyBinding<X>>,
    buttons: Vec<ButtonBinding<X>>,
}

impl<X: XConn> fmt::Debug for WindowManager<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowManager")
            .field("state", &self.state)
            .field("keys", &self.keys.len())
            .field("buttons", &self.buttons.len())
            .finish()
    }
}

impl<X> WindowManager<X>
where
    X: XConn,
{
    /// Construct a new [WindowManager] with the provided configuration,
    /// bindings, drawing backend and X connection.
    ///
    /// This checks that no other window manager is running and takes over
    /// the root window, but does not touch existing windows until
    /// [WindowManager::run].
    pub fn new(
        config: Config,
        keys: Vec<KeyBinding<X>>,
        buttons: Vec<ButtonBinding<X>>,
        draw: Box<dyn Draw>,
        x: X,
    ) -> Result<Self> {
        x.become_wm()?;

        let mut state = State::try_new(config, draw, &x)?;
        state.button_specs = buttons
            .iter()
            .filter(|b| b.target == bindings::ClickTarget::ClientWin)
            .map(|b| (b.mods, b.button))
            .collect();

        Ok(Self {
            x,
            state,
            keys,
            buttons,
        })
    }

    /// Start the window manager and run it until told to exit.
    ///
    /// Returns `true` if a restart (SIGHUP or the restart action) was
    /// requested: the caller should re-exec itself with its original argv.
    pub fn run(mut self) -> Result<bool> {
        register_signal_handlers()?;
        self.setup()?;
        self.scan()?;

        let WindowManager {
            x,
            state,
            keys,
            buttons,
        } = &mut self;

        while state.running {
            if SHOULD_EXIT.swap(false, Ordering::SeqCst) {
                break;
            }
            if SHOULD_RESTART.swap(false, Ordering::SeqCst) {
                state.restart = true;
                break;
            }

            match x.next_event() {
                Ok(event) => {
                    let span = span!(target: "rawm", Level::DEBUG, "XEvent", %event);
                    let _enter = span.enter();
                    trace!(details = ?event, "event details");

                    if let Err(e) = handle::x_event(&event, state, x, keys, buttons) {
                        error!(%e, %event, "error handling event");
                    }
                    x.flush();
                }

                Err(e) => error!(%e, "error pulling next x event"),
            }
        }

        let restart = self.state.restart;
        self.cleanup()?;

        Ok(restart)
    }

    fn setup(&mut self) -> Result<()> {
        let WindowManager { x, state, keys, .. } = self;

        debug!("initialising EWMH properties");
        x.init_ewmh("rawm")?;
        x.set_client_list(&[])?;

        debug!("creating bar windows");
        ops::update_bars(state, x)?;
        ops::update_status(state, x)?;

        debug!("grabbing key bindings");
        let key_specs: Vec<(ModMask, KeySym)> = keys.iter().map(|k| (k.mods, k.keysym)).collect();
        x.grab_keys(&key_specs)?;

        ops::focus(state, x, None)?;
        bar::draw_bars(state, x)?;
        x.flush();

        Ok(())
    }

    /// Manage windows that existed before we started: non-transients
    /// first so that transients can inherit their target's monitor/tags.
    fn scan(&mut self) -> Result<()> {
        let WindowManager { x, state, .. } = self;
        let ids = x.query_tree()?;
        let mut transients = Vec::new();

        for &id in ids.iter() {
            let attrs = match x.get_window_attributes(id) {
                Ok(attrs) => attrs,
                Err(_) => continue, // raced with the window going away
            };
            if attrs.override_redirect {
                continue;
            }
            if x.get_transient_for(id)?.is_some() {
                transients.push((id, attrs));
                continue;
            }

            if attrs.map_state == MapState::Viewable
                || x.get_wm_state(id)? == Some(WmState::Iconic)
            {
                ops::manage(state, x, id)?;
            }
        }

        for (id, attrs) in transients {
            if attrs.map_state == MapState::Viewable
                || x.get_wm_state(id)? == Some(WmState::Iconic)
            {
                ops::manage(state, x, id)?;
            }
        }

        debug!(managed = state.clients.len(), "scanned existing windows");

        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        let WindowManager { x, state, .. } = self;

        trace!("unmanaging all clients");
        let ids: Vec<Xid> = state.clients.keys().copied().collect();
        for id in ids {
            ops::unmanage(state, x, id, false)?;
        }

        x.ungrab_keys()?;

        for m in state.monitors.iter() {
            if *m.barwin != 0 {
                x.destroy_window(m.barwin)?;
            }
        }

        x.focus_root()?;
        x.set_active_window(None)?;
        x.sync()?;

        Ok(())
    }
}

fn register_signal_handlers() -> Result<()> {
    let install = |sig: Signal, handler: extern "C" fn(libc_int), flags: SaFlags| -> Result<()> {
        let action = SigAction::new(SigHandler::Handler(handler), flags, SigSet::empty());
        // Safety: the handlers only touch atomics and waitpid
        unsafe { sigaction(sig, &action) }?;

        Ok(())
    };

    install(
        Signal::SIGCHLD,
        on_sigchld,
        SaFlags::SA_RESTART | SaFlags::SA_NOCLDSTOP,
    )?;
    // exit / restart requests must interrupt the blocking event read
    install(Signal::SIGTERM, on_sigterm, SaFlags::empty())?;
    install(Signal::SIGHUP, on_sighup, SaFlags::empty())?;

    // Reap any children inherited from a previous run
    on_sigchld(0);

    Ok(())
}

/// Fetch a string property, falling back to the "broken" sentinel the way
/// every text consumer in the engine expects.
pub(crate) fn text_prop_or_broken<X: XConn>(x: &X, id: Xid, atom: crate::x::Atom) -> String {
    match x.get_prop_string(id, atom) {
        Ok(Some(s)) if !s.is_empty() => s,
        Ok(_) => BROKEN.to_owned(),
        Err(e) => {
            warn!(%id, %e, "unable to read text property");
            BROKEN.to_owned()
        }
    }
}
