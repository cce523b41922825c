//! XEvent handlers for the main event loop.
//!
//! Each handler mutates the model through [ops][crate::core::ops] and
//! triggers layout / bar updates on the affected monitor. Events for
//! windows we do not manage are ignored or passed through untouched.
use crate::{
    bar,
    core::{
        actions,
        bindings::{ButtonBinding, ClickInfo, ClickTarget, KeyBinding},
        ops, State, Xid,
    },
    geometry::Rect,
    x::{
        event::{
            ButtonEvent, ClientMessage, ConfigureEvent, ConfigureRequest, EnterEvent, ExposeEvent,
            KeyPressEvent, MotionEvent, PropertyEvent,
        },
        Atom, WmState, XConn, XEvent,
    },
    Result,
};
use tracing::trace;

// _NET_WM_STATE client message actions
const NET_WM_STATE_REMOVE: u32 = 0;
const NET_WM_STATE_ADD: u32 = 1;
const NET_WM_STATE_TOGGLE: u32 = 2;

/// Dispatch one X event to its handler. Unknown event types never reach
/// this point: backends drop them during conversion.
pub(crate) fn x_event<X: XConn>(
    event: &XEvent,
    state: &mut State,
    x: &X,
    keys: &mut [KeyBinding<X>],
    buttons: &mut [ButtonBinding<X>],
) -> Result<()> {
    match event {
        XEvent::ButtonPress(e) => button_press(e, state, x, buttons),
        XEvent::ButtonRelease(_) => Ok(()),
        XEvent::ClientMessage(m) => client_message(m, state, x),
        XEvent::ConfigureNotify(e) => configure_notify(e, state, x),
        XEvent::ConfigureRequest(e) => configure_request(e, state, x),
        XEvent::DestroyNotify(id) => ops::unmanage(state, x, *id, true),
        XEvent::Enter(e) => enter_notify(e, state, x),
        XEvent::Expose(e) => expose(e, state, x),
        XEvent::FocusIn(id) => focus_in(*id, state, x),
        XEvent::KeyPress(e) => key_press(e, state, x, keys),
        XEvent::MappingNotify { keyboard } => mapping_notify(*keyboard, state, x, keys),
        XEvent::MapRequest(id) => map_request(*id, state, x),
        XEvent::MotionNotify(e) => motion_notify(e, state, x),
        XEvent::PropertyNotify(e) => property_notify(e, state, x),
        XEvent::ResizeRequest(_) => Ok(()), // systray icons only; not supported
        XEvent::UnmapNotify { id, send_event } => unmap_notify(*id, *send_event, state, x),
    }
}

/// The subset of events re-dispatched while a mouse grab loop is running,
/// so client requests are not dropped mid-drag.
pub(crate) fn drag_event<X: XConn>(event: &XEvent, state: &mut State, x: &X) -> Result<()> {
    match event {
        XEvent::ConfigureRequest(e) => configure_request(e, state, x),
        XEvent::Expose(e) => expose(e, state, x),
        XEvent::MapRequest(id) => map_request(*id, state, x),
        _ => Ok(()),
    }
}

fn button_press<X: XConn>(
    e: &ButtonEvent,
    state: &mut State,
    x: &X,
    buttons: &mut [ButtonBinding<X>],
) -> Result<()> {
    // a click selects the monitor it happens on
    if let Some(m) = state.win_to_monitor(e.id) {
        if m != state.selmon {
            if let Some(sel) = state.monitors[state.selmon].sel {
                ops::unfocus(state, x, sel, true)?;
            }
            state.selmon = m;
            ops::focus(state, x, None)?;
        }
    }

    let mut click = ClickTarget::RootWin;
    let mut tag_index = None;

    if e.id == state.monitors[state.selmon].barwin {
        let (target, idx) = bar::click_at(state, state.selmon, e.pos.x);
        click = target;
        tag_index = idx;
    } else if state.clients.contains_key(&e.id) {
        ops::focus(state, x, Some(e.id))?;
        ops::restack(state, x, state.selmon)?;
        click = ClickTarget::ClientWin;
    }

    let info = ClickInfo {
        event: *e,
        tag_index,
    };
    let mask = e.mask.clean(state.numlock);

    for b in buttons.iter_mut() {
        if b.target == click && b.button == e.button && b.mods == mask {
            (b.action)(state, x, &info)?;
        }
    }

    Ok(())
}

fn client_message<X: XConn>(m: &ClientMessage, state: &mut State, x: &X) -> Result<()> {
    if !state.clients.contains_key(&m.id) {
        return Ok(());
    }
    trace!(id = %m.id, dtype = %m.dtype, "client message");

    if m.dtype == Atom::NetWmState.as_ref() {
        let fullscreen = x.atom_id(Atom::NetWmStateFullscreen)?;
        if m.data[1] == fullscreen || m.data[2] == fullscreen {
            let currently = state.clients[&m.id].is_fullscreen;
            let target = match m.data[0] {
                NET_WM_STATE_ADD => true,
                NET_WM_STATE_REMOVE => false,
                NET_WM_STATE_TOGGLE => !currently,
                _ => return Ok(()), // malformed, ignore
            };

            ops::set_fullscreen(state, x, m.id, target)?;
        }
    } else if m.dtype == Atom::NetActiveWindow.as_ref() {
        // bring the client into view and raise it
        state.selmon = state.clients[&m.id].mon;
        if !state.is_visible(&state.clients[&m.id]) {
            let bit = 1 << state.clients[&m.id].tags.trailing_zeros();
            actions::view(state, x, bit)?;
        }
        ops::pop(state, x, m.id)?;
    }

    Ok(())
}

fn configure_notify<X: XConn>(e: &ConfigureEvent, state: &mut State, x: &X) -> Result<()> {
    if !e.is_root {
        return Ok(());
    }

    let dirty = ops::update_geometry(state, x)?;
    if dirty {
        let (sw, _) = x.screen_extent();
        let bar_h = state.bar_h;
        state.draw.resize_buffer(sw, bar_h)?;
        ops::update_bars(state, x)?;

        let fullscreen: Vec<Xid> = state
            .clients
            .values()
            .filter(|c| c.is_fullscreen)
            .map(|c| c.id)
            .collect();
        for id in fullscreen {
            let mon_r = state.monitors[state.clients[&id].mon].mon_r;
            ops::resize_client(state, x, id, mon_r)?;
        }

        ops::focus(state, x, None)?;
        ops::arrange(state, x, None)?;
    }

    Ok(())
}

fn configure_request<X: XConn>(e: &ConfigureRequest, state: &mut State, x: &X) -> Result<()> {
    let (floating_layout, mon_r, win_visible) = match state.clients.get(&e.id) {
        Some(c) => {
            let mon = &state.monitors[c.mon];
            (
                state.config.layouts[mon.lt[mon.sellt]].is_floating(),
                mon.mon_r,
                state.is_visible(c),
            )
        }
        None => return x.configure_unmanaged(e),
    };

    let Some(c) = state.clients.get_mut(&e.id) else {
        return Ok(());
    };

    if let Some(bw) = e.border_width {
        c.bw = bw;

        return Ok(());
    }

    if c.is_floating || floating_layout {
        if let Some(nx) = e.x {
            c.old_r.x = c.r.x;
            c.r.x = mon_r.x + nx;
        }
        if let Some(ny) = e.y {
            c.old_r.y = c.r.y;
            c.r.y = mon_r.y + ny;
        }
        if let Some(nw) = e.w {
            c.old_r.w = c.r.w;
            c.r.w = nw;
        }
        if let Some(nh) = e.h {
            c.old_r.h = c.r.h;
            c.r.h = nh;
        }

        // keep floating windows from escaping their monitor entirely
        if c.r.x + c.total_w() > mon_r.right() && c.is_floating {
            c.r.x = mon_r.x + (mon_r.w / 2 - c.total_w() / 2);
        }
        if c.r.y + c.total_h() > mon_r.bottom() && c.is_floating {
            c.r.y = mon_r.y + (mon_r.h / 2 - c.total_h() / 2);
        }

        let (r, bw) = (c.r, c.bw);
        let moved_only = (e.x.is_some() || e.y.is_some()) && e.w.is_none() && e.h.is_none();
        if moved_only {
            x.send_configure_notify(e.id, r, bw)?;
        }
        if win_visible {
            x.configure(e.id, r, bw)?;
        }
    } else {
        // tiled clients don't get to configure themselves
        let (r, bw) = (c.r, c.bw);
        x.send_configure_notify(e.id, r, bw)?;
    }

    Ok(())
}

fn enter_notify<X: XConn>(e: &EnterEvent, state: &mut State, x: &X) -> Result<()> {
    if (!e.normal || e.inferior) && !e.is_root {
        return Ok(());
    }

    let client_mon = state.clients.get(&e.id).map(|c| c.mon);
    let m = match client_mon {
        Some(m) => m,
        None => {
            let p = x.query_pointer()?;
            state.rect_to_monitor(Rect::new(p.x, p.y, 1, 1))
        }
    };

    if m != state.selmon {
        if let Some(sel) = state.monitors[state.selmon].sel {
            ops::unfocus(state, x, sel, true)?;
        }
        state.selmon = m;
    } else if client_mon.is_none() || Some(e.id) == state.monitors[state.selmon].sel {
        return Ok(());
    }

    ops::focus(state, x, client_mon.map(|_| e.id))
}

fn expose<X: XConn>(e: &ExposeEvent, state: &mut State, x: &X) -> Result<()> {
    if e.count == 0 {
        if let Some(m) = state.win_to_monitor(e.id) {
            bar::draw_bar(state, x, m)?;
        }
    }

    Ok(())
}

// Some clients try to acquire focus behind our back; give it back to the
// selection.
fn focus_in<X: XConn>(id: Xid, state: &mut State, x: &X) -> Result<()> {
    match state.monitors[state.selmon].sel {
        Some(sel) if sel != id => ops::set_input_focus(state, x, sel),
        _ => Ok(()),
    }
}

fn key_press<X: XConn>(
    e: &KeyPressEvent,
    state: &mut State,
    x: &X,
    keys: &mut [KeyBinding<X>],
) -> Result<()> {
    let mask = e.mask.clean(state.numlock);

    for k in keys.iter_mut() {
        if k.keysym == e.keysym && k.mods == mask {
            trace!(keysym = e.keysym, "running key binding");
            (k.action)(state, x)?;
        }
    }

    Ok(())
}

fn mapping_notify<X: XConn>(
    keyboard: bool,
    state: &mut State,
    x: &X,
    keys: &mut [KeyBinding<X>],
) -> Result<()> {
    if !keyboard {
        return Ok(());
    }

    x.refresh_keyboard_mapping()?;
    state.numlock = x.numlock_mask()?;

    let specs: Vec<_> = keys.iter().map(|k| (k.mods, k.keysym)).collect();
    x.grab_keys(&specs)
}

fn map_request<X: XConn>(id: Xid, state: &mut State, x: &X) -> Result<()> {
    let attrs = match x.get_window_attributes(id) {
        Ok(attrs) => attrs,
        Err(_) => return Ok(()), // window already gone
    };

    if attrs.override_redirect || state.clients.contains_key(&id) {
        return Ok(());
    }

    ops::manage(state, x, id)
}

fn motion_notify<X: XConn>(e: &MotionEvent, state: &mut State, x: &X) -> Result<()> {
    if !e.is_root {
        return Ok(());
    }

    let m = state.rect_to_monitor(Rect::new(e.root_pos.x, e.root_pos.y, 1, 1));
    if state.motion_mon.is_some() && Some(m) != state.motion_mon && m != state.selmon {
        if let Some(sel) = state.monitors[state.selmon].sel {
            ops::unfocus(state, x, sel, true)?;
        }
        state.selmon = m;
        ops::focus(state, x, None)?;
    }
    state.motion_mon = Some(m);

    Ok(())
}

fn property_notify<X: XConn>(e: &PropertyEvent, state: &mut State, x: &X) -> Result<()> {
    if e.is_root && e.atom == Atom::WmName.as_ref() {
        ops::update_status(state, x)?;

        return bar::draw_bar(state, x, state.selmon);
    }
    if e.deleted || !state.clients.contains_key(&e.id) {
        return Ok(());
    }

    let id = e.id;
    match e.atom.parse::<Atom>() {
        Ok(Atom::WmTransientFor) => {
            if !state.clients[&id].is_floating {
                let target = x.get_transient_for(id)?;
                if target.map(|t| state.clients.contains_key(&t)).unwrap_or(false) {
                    let m = state.clients[&id].mon;
                    if let Some(c) = state.clients.get_mut(&id) {
                        c.is_floating = true;
                    }
                    ops::arrange(state, x, Some(m))?;
                }
            }
        }
        Ok(Atom::WmNormalHints) => {
            if let Some(h) = x.get_size_hints(id)? {
                if let Some(c) = state.clients.get_mut(&id) {
                    c.hints = h;
                    c.is_fixed = h.is_fixed();
                }
            }
        }
        Ok(Atom::WmHints) => {
            ops::update_wm_hints(state, x, id)?;
            bar::draw_bars(state, x)?;
        }
        Ok(Atom::WmName) | Ok(Atom::NetWmName) => {
            ops::update_title(state, x, id);
            if state.monitors[state.selmon].sel == Some(id) {
                let m = state.clients[&id].mon;
                bar::draw_bar(state, x, m)?;
            }
        }
        Ok(Atom::NetWmWindowType) => {
            if let Some(mut c) = state.clients.get(&id).cloned() {
                let fullscreen = ops::update_window_type(state, x, &mut c)?;
                state.clients.insert(id, c);
                if fullscreen {
                    ops::set_fullscreen(state, x, id, true)?;
                }
            }
        }
        _ => (),
    }

    Ok(())
}

fn unmap_notify<X: XConn>(id: Xid, send_event: bool, state: &mut State, x: &X) -> Result<()> {
    if !state.clients.contains_key(&id) {
        return Ok(());
    }

    if send_event {
        // the client is withdrawing itself (ICCCM 4.1.4)
        x.set_wm_state(id, WmState::Withdrawn)
    } else {
        ops::unmanage(state, x, id, false)
    }
}
