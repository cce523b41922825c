//! Engine operations shared by the event handlers and the user actions.
//!
//! These are the state transitions of the manager: focus movement,
//! arrangement, manage/unmanage, monitor geometry updates and the EWMH
//! bookkeeping that goes with them. Handlers and actions compose these;
//! nothing here is called from outside the crate.
use crate::{
    bar,
    config::{SCHEME_NORM, SCHEME_SEL},
    core::{text_prop_or_broken, Client, Monitor, State, Xid, BROKEN},
    geometry::Rect,
    layout::{self, ArrangeFn},
    x::{Atom, WmState, XConn},
    Error, Result,
};
use tracing::{debug, trace, warn};

/// The ids of all clients visible on the given monitor, in creation order.
pub(crate) fn visible_clients(state: &State, m: usize) -> Vec<Xid> {
    let mon = &state.monitors[m];

    mon.clients
        .iter()
        .copied()
        .filter(|id| state.clients[id].shows_on(mon.tagmask()))
        .collect()
}

/// The ids of clients subject to layout arrangement on the given monitor:
/// visible and not floating, in creation order.
pub(crate) fn tiled_clients(state: &State, m: usize) -> Vec<Xid> {
    let mon = &state.monitors[m];

    mon.clients
        .iter()
        .copied()
        .filter(|id| {
            let c = &state.clients[id];
            c.shows_on(mon.tagmask()) && !c.is_floating
        })
        .collect()
}

/// Resize a client after normalising the proposed geometry against the
/// monitor and the client's size hints. Does nothing if the result equals
/// the current geometry.
pub(crate) fn resize<X: XConn>(
    state: &mut State,
    x: &X,
    id: Xid,
    r: Rect,
    interact: bool,
) -> Result<()> {
    let Some(c) = state.clients.get(&id) else {
        return Ok(());
    };
    let mon = &state.monitors[c.mon];
    let honor_hints = state.config.resize_hints
        || c.is_floating
        || state.config.layouts[mon.lt[mon.sellt]].is_floating();

    let new = c.clamped(
        r,
        interact,
        mon.win_r,
        x.screen_extent(),
        state.bar_h,
        honor_hints,
    );

    if new != c.r {
        resize_client(state, x, id, new)?;
    }

    Ok(())
}

/// Apply a new geometry to a client unconditionally, remembering the
/// previous one for restore-after-fullscreen / float-toggle.
pub(crate) fn resize_client<X: XConn>(state: &mut State, x: &X, id: Xid, r: Rect) -> Result<()> {
    let Some(c) = state.clients.get_mut(&id) else {
        return Ok(());
    };

    c.old_r = c.r;
    c.r = r;
    let bw = c.bw;

    x.configure(id, r, bw)?;
    x.send_configure_notify(id, r, bw)
}

/// Re-run the layout for a monitor (or all of them), move hidden clients
/// out of view and restack.
pub(crate) fn arrange<X: XConn>(state: &mut State, x: &X, mon: Option<usize>) -> Result<()> {
    match mon {
        Some(m) => {
            show_hide(state, x, m)?;
            arrange_monitor(state, x, m)?;
            restack(state, x, m)
        }
        None => {
            for m in 0..state.monitors.len() {
                show_hide(state, x, m)?;
            }
            for m in 0..state.monitors.len() {
                arrange_monitor(state, x, m)?;
            }

            Ok(())
        }
    }
}

/// Move visible clients into place and park hidden ones off-screen at
/// negative x, in focus order so the top of the stack settles last.
fn show_hide<X: XConn>(state: &mut State, x: &X, m: usize) -> Result<()> {
    let stack = state.monitors[m].stack.clone();
    let tagmask = state.monitors[m].tagmask();
    let floating_layout = {
        let mon = &state.monitors[m];
        state.config.layouts[mon.lt[mon.sellt]].is_floating()
    };

    for &id in stack.iter() {
        let c = &state.clients[&id];
        if c.shows_on(tagmask) {
            x.move_window(id, c.r.x, c.r.y)?;
            if (floating_layout || c.is_floating) && !c.is_fullscreen {
                let r = c.r;
                resize(state, x, id, r, false)?;
            }
        }
    }

    for &id in stack.iter().rev() {
        let c = &state.clients[&id];
        if !c.shows_on(tagmask) {
            x.move_window(id, c.total_w() * -2, c.r.y)?;
        }
    }

    Ok(())
}

/// Apply the monitor's current layout to its tiled visible clients and
/// refresh the layout symbol.
fn arrange_monitor<X: XConn>(state: &mut State, x: &X, m: usize) -> Result<()> {
    let lt = {
        let mon = &state.monitors[m];
        state.config.layouts[mon.lt[mon.sellt]]
    };
    state.monitors[m].ltsymbol = lt.symbol.to_owned();

    let Some(arrange_fn) = lt.arrange else {
        update_counter_symbol(state, m, "<", ">");

        return Ok(());
    };

    let tiled = tiled_clients(state, m);
    let (win_r, mfact, nmaster) = {
        let mon = &state.monitors[m];
        (mon.win_r, mon.mfact, mon.nmaster)
    };
    let rects = arrange_fn(tiled.len() as u32, win_r, mfact, nmaster);

    for (&id, frame) in tiled.iter().zip(rects) {
        // monocle and lone tiled clients fill the work area and lose
        // their border
        let bw = if frame == win_r {
            0
        } else {
            state.config.border_px
        };

        if let Some(c) = state.clients.get_mut(&id) {
            c.bw = bw;
        }

        let inner = Rect::new(frame.x, frame.y, frame.w - 2 * bw, frame.h - 2 * bw);
        resize(state, x, id, inner, false)?;
    }

    if arrange_fn == layout::monocle as ArrangeFn {
        update_counter_symbol(state, m, "[", "]");
    }

    Ok(())
}

/// Set the `[N/M]` / `<N/M>` style symbol for monocle and floating views:
/// N is the 1-based position of the selected client among the visible
/// ones, M the visible count.
fn update_counter_symbol(state: &mut State, m: usize, open: &str, close: &str) {
    let visible = visible_clients(state, m);
    if visible.is_empty() {
        return;
    }

    let n = state.monitors[m]
        .sel
        .and_then(|sel| visible.iter().position(|&id| id == sel))
        .map(|i| i + 1)
        .unwrap_or(0);

    state.monitors[m].ltsymbol = format!("{}{}/{}{}", open, n, visible.len(), close);
}

/// Raise the selected client if it floats, stack tiled clients below the
/// bar in focus order, and drop the EnterNotify events the shuffle causes.
pub(crate) fn restack<X: XConn>(state: &mut State, x: &X, m: usize) -> Result<()> {
    bar::draw_bar(state, x, m)?;

    let mon = &state.monitors[m];
    let Some(sel) = mon.sel else {
        return Ok(());
    };
    let floating_layout = state.config.layouts[mon.lt[mon.sellt]].is_floating();

    if state.clients[&sel].is_floating || floating_layout {
        x.raise(sel)?;
    }

    if !floating_layout {
        let mut sibling = mon.barwin;
        for &id in mon.stack.iter() {
            let c = &state.clients[&id];
            if !c.is_floating && c.shows_on(mon.tagmask()) {
                x.stack_below(id, sibling)?;
                sibling = id;
            }
        }
    }

    x.sync()?;
    x.drain_enter_events()
}

/// Focus the given client, or the most recently focused visible client on
/// the selected monitor when `c` is None or not visible.
pub(crate) fn focus<X: XConn>(state: &mut State, x: &X, c: Option<Xid>) -> Result<()> {
    let mut target = c.filter(|id| {
        state
            .clients
            .get(id)
            .map(|c| state.is_visible(c))
            .unwrap_or(false)
    });

    if target.is_none() {
        target = state.monitors[state.selmon]
            .stack
            .iter()
            .copied()
            .find(|id| state.is_visible(&state.clients[id]));
    }

    if let Some(prev) = state.monitors[state.selmon].sel {
        if target != Some(prev) {
            unfocus(state, x, prev, false)?;
        }
    }

    match target {
        Some(id) => {
            let cmon = state.clients[&id].mon;
            if cmon != state.selmon {
                state.selmon = cmon;
            }
            if state.clients[&id].is_urgent {
                set_urgent(state, x, id, false)?;
            }

            let mon = &mut state.monitors[cmon];
            mon.detach_stack(id);
            mon.attach_stack(id);

            x.grab_buttons(id, &state.button_specs, false)?;
            x.set_border_color(id, state.config.colors[SCHEME_SEL].border)?;
            set_input_focus(state, x, id)?;
        }
        None => {
            x.focus_root()?;
            x.set_active_window(None)?;
        }
    }

    state.monitors[state.selmon].sel = target;
    bar::draw_bars(state, x)
}

/// Hand X input focus to a client, respecting `neverfocus` (in which case
/// only `_NET_ACTIVE_WINDOW` is updated) and offering WM_TAKE_FOCUS.
pub(crate) fn set_input_focus<X: XConn>(state: &State, x: &X, id: Xid) -> Result<()> {
    if !state.clients[&id].never_focus {
        x.set_input_focus(id)?;
    }
    x.set_active_window(Some(id))?;

    if x.supports_protocol(id, Atom::WmTakeFocus)? {
        x.send_protocol_message(id, Atom::WmTakeFocus)?;
    }

    Ok(())
}

/// Repaint a client as unselected and regrab its buttons so that any
/// click refocuses it. Optionally drop X input focus back to the root.
pub(crate) fn unfocus<X: XConn>(
    state: &mut State,
    x: &X,
    id: Xid,
    focus_root: bool,
) -> Result<()> {
    if !state.clients.contains_key(&id) {
        return Ok(());
    }

    x.grab_buttons(id, &state.button_specs, true)?;
    x.set_border_color(id, state.config.colors[SCHEME_NORM].border)?;

    if focus_root {
        x.focus_root()?;
        x.set_active_window(None)?;
    }

    Ok(())
}

/// Promote a client to the head of its monitor's client list and focus it.
pub(crate) fn pop<X: XConn>(state: &mut State, x: &X, id: Xid) -> Result<()> {
    let m = match state.clients.get(&id) {
        Some(c) => c.mon,
        None => return Ok(()),
    };

    let mon = &mut state.monitors[m];
    mon.detach(id);
    mon.attach(id);

    focus(state, x, Some(id))?;
    arrange(state, x, Some(m))
}

/// Mark or clear urgency on a client, writing the hint back when clearing.
pub(crate) fn set_urgent<X: XConn>(state: &mut State, x: &X, id: Xid, urgent: bool) -> Result<()> {
    if let Some(c) = state.clients.get_mut(&id) {
        c.is_urgent = urgent;
        if !urgent {
            x.clear_urgency_hint(id)?;
        }
    }

    Ok(())
}

/// Take over management of a new top-level window.
pub(crate) fn manage<X: XConn>(state: &mut State, x: &X, id: Xid) -> Result<()> {
    if state.clients.contains_key(&id) {
        return Ok(());
    }
    trace!(%id, "managing new client");

    let (geom, old_bw) = x.get_geometry(id)?;
    let mut c = Client::new(id, geom, state.config.border_px);
    c.old_bw = old_bw;
    c.mon = state.selmon;
    c.title = read_title(x, id);

    let transient_target = x
        .get_transient_for(id)?
        .filter(|t| state.clients.contains_key(t));
    match transient_target {
        Some(t) => {
            let tc = &state.clients[&t];
            c.mon = tc.mon;
            c.tags = tc.tags;
        }
        None => apply_rules(state, x, &mut c)?,
    }

    // clamp into the owning monitor's outer rectangle
    let mon_r = state.monitors[c.mon].mon_r;
    if c.r.x + c.total_w() > mon_r.right() {
        c.r.x = mon_r.right() - c.total_w();
    }
    if c.r.y + c.total_h() > mon_r.bottom() {
        c.r.y = mon_r.bottom() - c.total_h();
    }
    c.r.x = c.r.x.max(mon_r.x);
    c.r.y = c.r.y.max(mon_r.y);

    x.set_border_width(id, c.bw)?;
    x.set_border_color(id, state.config.colors[SCHEME_NORM].border)?;
    x.send_configure_notify(id, c.r, c.bw)?;

    let wants_fullscreen = update_window_type(state, x, &mut c)?;
    if let Some(h) = x.get_size_hints(id)? {
        c.hints = h;
        c.is_fixed = h.is_fixed();
    }
    if let Some(h) = x.get_wm_hints(id)? {
        c.is_urgent = h.urgent;
        c.never_focus = !h.accepts_input;
    }
    x.select_client_events(id)?;
    x.grab_buttons(id, &state.button_specs, true)?;

    if !c.is_floating {
        c.is_floating = transient_target.is_some() || c.is_fixed;
        c.old_state = c.is_floating;
    }
    if c.is_centered {
        c.r = c.r.centered_in(&state.monitors[c.mon].win_r);
    }
    if c.is_floating {
        x.raise(id)?;
    }

    let mon_idx = c.mon;
    state.monitors[mon_idx].attach(id);
    state.monitors[mon_idx].attach_stack(id);
    state.clients.insert(id, c);

    x.append_to_client_list(id)?;
    if state.config.default_opacity < 1.0 {
        x.set_window_opacity(id, state.config.default_opacity)?;
    }

    // park the window out of view until the arrange settles, so the user
    // never sees it flash at the wrong position
    let (sw, _) = x.screen_extent();
    let c = &state.clients[&id];
    x.configure(id, Rect::new(c.r.x + 2 * sw, c.r.y, c.r.w, c.r.h), c.bw)?;
    x.set_wm_state(id, WmState::Normal)?;

    if wants_fullscreen {
        set_fullscreen(state, x, id, true)?;
    }

    if mon_idx == state.selmon {
        if let Some(prev) = state.monitors[state.selmon].sel {
            unfocus(state, x, prev, false)?;
        }
    }
    state.monitors[mon_idx].sel = Some(id);

    arrange(state, x, Some(mon_idx))?;
    x.map(id)?;
    focus(state, x, None)
}

/// Stop managing a window, restoring what we changed about it unless it
/// is already gone.
pub(crate) fn unmanage<X: XConn>(state: &mut State, x: &X, id: Xid, destroyed: bool) -> Result<()> {
    let Some(c) = state.clients.remove(&id) else {
        return Ok(());
    };
    trace!(%id, destroyed, "unmanaging client");

    let mon = &mut state.monitors[c.mon];
    mon.detach(id);
    mon.detach_stack(id);

    if !destroyed {
        // server grab: the client may be disappearing under us and the
        // backend swallows errors against dead windows for the duration
        x.grab_server()?;
        x.set_border_width(id, c.old_bw)?;
        x.ungrab_buttons(id)?;
        x.set_wm_state(id, WmState::Withdrawn)?;
        x.sync()?;
        x.ungrab_server()?;
    }

    focus(state, x, None)?;
    update_client_list(state, x)?;
    arrange(state, x, Some(c.mon))
}

/// Fetch WM_CLASS / WM_WINDOW_ROLE and fold every matching rule into the
/// client, defaulting the tags to the monitor's current view.
fn apply_rules<X: XConn>(state: &State, x: &X, c: &mut Client) -> Result<()> {
    c.is_floating = false;
    c.tags = 0;

    let (instance, class) = x
        .get_wm_class(c.id)?
        .unwrap_or_else(|| (BROKEN.to_owned(), BROKEN.to_owned()));
    let role = text_prop_or_broken(x, c.id, Atom::WmWindowRole);

    for rule in state.config.rules.iter() {
        if rule.matches(&class, &instance, &c.title, &role) {
            c.is_floating |= rule.is_floating;
            c.is_centered |= rule.is_centered;
            c.tags |= rule.tags;
            if let Some(mi) = rule.monitor {
                if mi < state.monitors.len() {
                    c.mon = mi;
                }
            }
        }
    }

    c.tags &= state.config.tagmask();
    if c.tags == 0 {
        c.tags = state.monitors[c.mon].tagmask();
    }

    Ok(())
}

/// Apply `_NET_WM_WINDOW_TYPE` / `_NET_WM_STATE` to a client, returning
/// whether the window asked to start fullscreen.
pub(crate) fn update_window_type<X: XConn>(
    state: &State,
    x: &X,
    c: &mut Client,
) -> Result<bool> {
    let wm_state = x.get_prop_atoms(c.id, Atom::NetWmState)?;
    let wants_fullscreen = wm_state
        .iter()
        .any(|a| a == Atom::NetWmStateFullscreen.as_ref());

    let types = x.get_prop_atoms(c.id, Atom::NetWmWindowType)?;
    if types.iter().any(|a| a == Atom::NetWindowTypeDialog.as_ref()) {
        c.is_floating = true;
        if state.config.center_dialogs {
            c.is_centered = true;
        }
    }

    Ok(wants_fullscreen)
}

/// Refresh a client's urgency / input hints after a WM_HINTS change.
pub(crate) fn update_wm_hints<X: XConn>(state: &mut State, x: &X, id: Xid) -> Result<()> {
    let Some(h) = x.get_wm_hints(id)? else {
        return Ok(());
    };

    let selected = state.monitors[state.selmon].sel == Some(id);
    if let Some(c) = state.clients.get_mut(&id) {
        if selected && h.urgent {
            // we already have focus, refuse the attention grab
            x.clear_urgency_hint(id)?;
        } else {
            c.is_urgent = h.urgent;
        }
        c.never_focus = !h.accepts_input;
    }

    Ok(())
}

/// Re-read a client's title, falling back from _NET_WM_NAME to WM_NAME to
/// the "broken" sentinel.
pub(crate) fn update_title<X: XConn>(state: &mut State, x: &X, id: Xid) {
    if let Some(c) = state.clients.get_mut(&id) {
        c.title = read_title(x, id);
    }
}

fn read_title<X: XConn>(x: &X, id: Xid) -> String {
    let mut title = match x.get_prop_string(id, Atom::NetWmName) {
        Ok(Some(s)) if !s.is_empty() => s,
        _ => text_prop_or_broken(x, id, Atom::WmName),
    };

    // titles are bounded; truncate on a char boundary
    if title.len() > 255 {
        let mut end = 255;
        while !title.is_char_boundary(end) {
            end -= 1;
        }
        title.truncate(end);
    }

    title
}

/// Enter or leave fullscreen, saving / restoring geometry, border and
/// floating state.
pub(crate) fn set_fullscreen<X: XConn>(
    state: &mut State,
    x: &X,
    id: Xid,
    fullscreen: bool,
) -> Result<()> {
    let Some(c) = state.clients.get_mut(&id) else {
        return Ok(());
    };

    if fullscreen && !c.is_fullscreen {
        x.set_fullscreen_state(id, true)?;
        c.is_fullscreen = true;
        c.old_state = c.is_floating;
        c.old_bw = c.bw;
        c.bw = 0;
        c.is_floating = true;

        let mon_r = state.monitors[c.mon].mon_r;
        resize_client(state, x, id, mon_r)?;
        x.raise(id)?;
    } else if !fullscreen && c.is_fullscreen {
        x.set_fullscreen_state(id, false)?;
        c.is_fullscreen = false;
        c.is_floating = c.old_state;
        c.bw = c.old_bw;

        let (old_r, m) = (c.old_r, c.mon);
        resize_client(state, x, id, old_r)?;
        arrange(state, x, Some(m))?;
    }

    Ok(())
}

/// Move a client to another monitor. The client adopts the target's
/// current tagset (this is not tag-preserving).
pub(crate) fn send_to_monitor<X: XConn>(
    state: &mut State,
    x: &X,
    id: Xid,
    target: usize,
) -> Result<()> {
    let Some(c) = state.clients.get(&id) else {
        return Ok(());
    };
    if c.mon == target || target >= state.monitors.len() {
        return Ok(());
    }

    unfocus(state, x, id, true)?;

    let old = state.clients[&id].mon;
    state.monitors[old].detach(id);
    state.monitors[old].detach_stack(id);

    let tags = state.monitors[target].tagmask();
    if let Some(c) = state.clients.get_mut(&id) {
        c.mon = target;
        c.tags = tags;
    }
    state.monitors[target].attach(id);
    state.monitors[target].attach_stack(id);

    focus(state, x, None)?;
    arrange(state, x, None)
}

/// Rebuild the root `_NET_CLIENT_LIST` from the per-monitor client lists.
pub(crate) fn update_client_list<X: XConn>(state: &State, x: &X) -> Result<()> {
    let ids: Vec<Xid> = state
        .monitors
        .iter()
        .flat_map(|m| m.clients.iter().copied())
        .collect();

    x.set_client_list(&ids)
}

/// Rebuild the monitor list from the X server's screen regions.
///
/// New monitors are appended with configured defaults; when the head
/// count shrinks, orphaned clients migrate to the first monitor.
pub(crate) fn update_geometry<X: XConn>(state: &mut State, x: &X) -> Result<bool> {
    let screens = x.screen_sizes()?;
    if screens.is_empty() {
        return Err(Error::NoScreens);
    }

    let mut dirty = false;
    let before = state.monitors.len();

    for i in before..screens.len() {
        state.monitors.push(Monitor::new(i, &state.config));
        dirty = true;
    }

    if screens.len() < before {
        debug!(from = before, to = screens.len(), "monitors were removed");
        dirty = true;

        for i in screens.len()..before {
            let orphans: Vec<Xid> = state.monitors[i].clients.clone();
            for id in orphans {
                if let Some(c) = state.clients.get_mut(&id) {
                    c.mon = 0;
                }
                state.monitors[0].attach(id);
                state.monitors[0].attach_stack(id);
            }

            let barwin = state.monitors[i].barwin;
            if *barwin != 0 {
                x.destroy_window(barwin)?;
            }
        }

        state.monitors.truncate(screens.len());
        if state.selmon >= screens.len() {
            state.selmon = 0;
        }
    }

    for (i, &r) in screens.iter().enumerate() {
        let m = &mut state.monitors[i];
        m.num = i;
        if m.mon_r != r {
            dirty = true;
            m.mon_r = r;
            m.update_bar_pos(state.bar_h);
        }
    }

    if dirty {
        trace!(monitors = state.monitors.len(), "monitor geometry updated");
    }

    Ok(dirty)
}

/// Create missing bar windows and reposition existing ones.
pub(crate) fn update_bars<X: XConn>(state: &mut State, x: &X) -> Result<()> {
    for i in 0..state.monitors.len() {
        let (barwin, r) = {
            let m = &state.monitors[i];
            (m.barwin, Rect::new(m.win_r.x, m.by, m.win_r.w, state.bar_h))
        };

        if *barwin == 0 {
            let id = x.create_bar_window(r)?;
            if state.config.default_opacity < 1.0 {
                x.set_window_opacity(id, state.config.default_opacity)?;
            }
            state.monitors[i].barwin = id;
        } else {
            x.configure(barwin, r, 0)?;
        }
    }

    Ok(())
}

/// Recompute the work area and reposition the bar window after anything
/// that may have changed bar visibility (a pertag view switch, the
/// toggle-bar action).
pub(crate) fn sync_bar_position<X: XConn>(state: &mut State, x: &X, m: usize) -> Result<()> {
    let bar_h = state.bar_h;
    let mon = &mut state.monitors[m];
    mon.update_bar_pos(bar_h);

    let r = Rect::new(mon.win_r.x, mon.by, mon.win_r.w, bar_h);
    let barwin = mon.barwin;
    if *barwin != 0 {
        x.configure(barwin, r, 0)?;
    }

    Ok(())
}

/// Re-read the status text from the root WM_NAME.
pub(crate) fn update_status<X: XConn>(state: &mut State, x: &X) -> Result<()> {
    state.status = match x.get_prop_string(x.root(), Atom::WmName) {
        Ok(Some(s)) if !s.is_empty() => s,
        Ok(_) => format!("rawm-{}", env!("CARGO_PKG_VERSION")),
        Err(e) => {
            warn!(%e, "unable to read root name");
            return Ok(());
        }
    };

    // the status buffer is bounded
    if state.status.len() > 255 {
        let mut end = 255;
        while !state.status.is_char_boundary(end) {
            end -= 1;
        }
        state.status.truncate(end);
    }

    Ok(())
}

/// Close the selected client: politely via WM_DELETE_WINDOW when the
/// client supports it, otherwise server-side under a grab.
pub(crate) fn kill_client<X: XConn>(state: &mut State, x: &X) -> Result<()> {
    let Some(sel) = state.monitors[state.selmon].sel else {
        return Ok(());
    };

    if x.supports_protocol(sel, Atom::WmDeleteWindow)? {
        x.send_protocol_message(sel, Atom::WmDeleteWindow)
    } else {
        x.grab_server()?;
        x.kill_client(sel)?;
        x.sync()?;
        x.ungrab_server()
    }
}
