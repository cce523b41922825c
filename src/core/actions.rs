//! User facing actions for use in key and mouse bindings.
//!
//! Every action operates on the selected monitor / client and leaves the
//! model consistent: focus is reselected and the affected monitors are
//! rearranged before returning.
use crate::{
    bar,
    core::{monitor::Pertag, ops, State, Xid},
    geometry::Rect,
    util,
    x::{CursorKind, XConn, XEvent},
    Result,
};
use tracing::{debug, info};

/// Switch the selected monitor to the given tag mask. A mask of 0 swaps
/// back to the previously viewed tags.
pub fn view<X: XConn>(state: &mut State, x: &X, mask: u32) -> Result<()> {
    let mask = mask & state.config.tagmask();
    let n_tags = state.config.tags.len();
    let mon = &mut state.monitors[state.selmon];

    if mask == mon.tagmask() {
        return Ok(());
    }

    mon.seltags ^= 1;
    if mask != 0 {
        mon.tagset[mon.seltags] = mask;
        mon.pertag.prevtag = mon.pertag.curtag;
        mon.pertag.curtag = Pertag::index_for(mask, n_tags);
    } else {
        std::mem::swap(&mut mon.pertag.prevtag, &mut mon.pertag.curtag);
    }
    mon.apply_pertag();

    ops::sync_bar_position(state, x, state.selmon)?;
    ops::focus(state, x, None)?;
    ops::arrange(state, x, Some(state.selmon))
}

/// XOR the given mask into the displayed tagset, refusing to empty it.
pub fn toggle_view<X: XConn>(state: &mut State, x: &X, mask: u32) -> Result<()> {
    let mask = mask & state.config.tagmask();
    let all = state.config.tagmask();
    let mon = &mut state.monitors[state.selmon];
    let newset = mon.tagmask() ^ mask;

    if newset == 0 {
        return Ok(());
    }

    mon.tagset[mon.seltags] = newset;

    if newset == all {
        mon.pertag.prevtag = mon.pertag.curtag;
        mon.pertag.curtag = 0;
    }
    if mon.pertag.curtag > 0 && newset & (1 << (mon.pertag.curtag - 1)) == 0 {
        mon.pertag.prevtag = mon.pertag.curtag;
        mon.pertag.curtag = newset.trailing_zeros() as usize + 1;
    }
    mon.apply_pertag();

    ops::sync_bar_position(state, x, state.selmon)?;
    ops::focus(state, x, None)?;
    ops::arrange(state, x, Some(state.selmon))
}

/// Retag the selected client.
pub fn tag<X: XConn>(state: &mut State, x: &X, mask: u32) -> Result<()> {
    let mask = mask & state.config.tagmask();
    let Some(sel) = state.monitors[state.selmon].sel else {
        return Ok(());
    };
    if mask == 0 {
        return Ok(());
    }

    if let Some(c) = state.clients.get_mut(&sel) {
        c.tags = mask;
    }

    ops::focus(state, x, None)?;
    ops::arrange(state, x, Some(state.selmon))
}

/// Toggle tag bits on the selected client; an empty result is refused.
pub fn toggle_tag<X: XConn>(state: &mut State, x: &X, mask: u32) -> Result<()> {
    let Some(sel) = state.monitors[state.selmon].sel else {
        return Ok(());
    };
    let newtags = state.clients[&sel].tags ^ (mask & state.config.tagmask());
    if newtags == 0 {
        return Ok(());
    }

    if let Some(c) = state.clients.get_mut(&sel) {
        c.tags = newtags;
    }

    ops::focus(state, x, None)?;
    ops::arrange(state, x, Some(state.selmon))
}

/// Select a layout by table index, or flip back to the previous layout
/// when `idx` is None or already current.
pub fn set_layout<X: XConn>(state: &mut State, x: &X, idx: Option<usize>) -> Result<()> {
    if let Some(i) = idx {
        if i >= state.config.layouts.len() {
            return Ok(());
        }
    }

    let mon = &mut state.monitors[state.selmon];
    let pt = mon.pertag.curtag;
    let current = mon.lt[mon.sellt];

    if idx.is_none() || idx != Some(current) {
        mon.sellt ^= 1;
        mon.pertag.sellts[pt] = mon.sellt;
    }
    if let Some(i) = idx {
        mon.lt[mon.sellt] = i;
        mon.pertag.ltidxs[pt] = mon.lt;
    }
    mon.ltsymbol = state.config.layouts[mon.lt[mon.sellt]].symbol.to_owned();

    if state.monitors[state.selmon].sel.is_some() {
        ops::arrange(state, x, Some(state.selmon))
    } else {
        bar::draw_bar(state, x, state.selmon)
    }
}

/// Adjust the master factor: `|f| < 1.0` is a delta, `f > 1.0` sets the
/// absolute value `f - 1.0`. Results outside `[0.1, 0.9]` are refused.
pub fn set_mfact<X: XConn>(state: &mut State, x: &X, f: f32) -> Result<()> {
    let mon = &mut state.monitors[state.selmon];
    if state.config.layouts[mon.lt[mon.sellt]].is_floating() {
        return Ok(());
    }

    let new = if f.abs() < 1.0 { f + mon.mfact } else { f - 1.0 };
    if !(0.1..=0.9).contains(&new) {
        return Ok(());
    }

    mon.mfact = new;
    mon.pertag.mfacts[mon.pertag.curtag] = new;

    ops::arrange(state, x, Some(state.selmon))
}

/// Change the number of clients in the master area.
pub fn inc_nmaster<X: XConn>(state: &mut State, x: &X, delta: i32) -> Result<()> {
    let mon = &mut state.monitors[state.selmon];

    mon.nmaster = (mon.nmaster as i32 + delta).max(0) as u32;
    mon.pertag.nmasters[mon.pertag.curtag] = mon.nmaster;

    ops::arrange(state, x, Some(state.selmon))
}

/// Move focus through the visible clients in list order, wrapping.
pub fn focus_stack<X: XConn>(state: &mut State, x: &X, dir: i32) -> Result<()> {
    let Some(sel) = state.monitors[state.selmon].sel else {
        return Ok(());
    };
    let visible = ops::visible_clients(state, state.selmon);
    if visible.len() < 2 {
        return Ok(());
    }
    let Some(i) = visible.iter().position(|&id| id == sel) else {
        return Ok(());
    };

    let n = visible.len() as i32;
    let next = visible[((i as i32 + dir).rem_euclid(n)) as usize];

    ops::focus(state, x, Some(next))?;
    ops::restack(state, x, state.selmon)
}

/// Focus the i-th visible client in list order (0-based).
pub fn focus_nth<X: XConn>(state: &mut State, x: &X, i: usize) -> Result<()> {
    let visible = ops::visible_clients(state, state.selmon);
    let Some(&id) = visible.get(i) else {
        return Ok(());
    };

    ops::focus(state, x, Some(id))?;
    ops::restack(state, x, state.selmon)
}

/// Swap the selected tiled client with the master (or promote the next
/// tiled client when it already is the master).
pub fn zoom<X: XConn>(state: &mut State, x: &X) -> Result<()> {
    let mon = &state.monitors[state.selmon];
    let Some(sel) = mon.sel else {
        return Ok(());
    };
    if state.config.layouts[mon.lt[mon.sellt]].is_floating() || state.clients[&sel].is_floating {
        return Ok(());
    }

    let tiled = ops::tiled_clients(state, state.selmon);
    let target = if tiled.first() == Some(&sel) {
        match tiled.get(1) {
            Some(&next) => next,
            None => return Ok(()),
        }
    } else {
        sel
    };

    ops::pop(state, x, target)
}

/// Toggle the selected client's floating state.
pub fn toggle_floating<X: XConn>(state: &mut State, x: &X) -> Result<()> {
    let Some(sel) = state.monitors[state.selmon].sel else {
        return Ok(());
    };
    if state.clients[&sel].is_fullscreen {
        return Ok(());
    }

    let (floating, r) = match state.clients.get_mut(&sel) {
        Some(c) => {
            c.is_floating = !c.is_floating || c.is_fixed;
            (c.is_floating, c.r)
        }
        None => return Ok(()),
    };

    if floating {
        ops::resize(state, x, sel, r, false)?;
    }

    ops::arrange(state, x, Some(state.selmon))
}

/// Show or hide the bar on the current view.
pub fn toggle_bar<X: XConn>(state: &mut State, x: &X) -> Result<()> {
    let mon = &mut state.monitors[state.selmon];

    mon.showbar = !mon.showbar;
    mon.pertag.showbars[mon.pertag.curtag] = mon.showbar;

    ops::sync_bar_position(state, x, state.selmon)?;
    ops::arrange(state, x, Some(state.selmon))
}

/// Close the selected client.
pub fn kill_client<X: XConn>(state: &mut State, x: &X) -> Result<()> {
    ops::kill_client(state, x)
}

/// Move selection to the next / previous monitor.
pub fn focus_mon<X: XConn>(state: &mut State, x: &X, dir: i32) -> Result<()> {
    if state.monitors.len() < 2 {
        return Ok(());
    }

    let m = monitor_in_direction(state, dir);
    if m == state.selmon {
        return Ok(());
    }

    if let Some(sel) = state.monitors[state.selmon].sel {
        ops::unfocus(state, x, sel, false)?;
    }
    state.selmon = m;
    ops::focus(state, x, None)
}

/// Send the selected client to the next / previous monitor.
pub fn tag_mon<X: XConn>(state: &mut State, x: &X, dir: i32) -> Result<()> {
    if state.monitors.len() < 2 {
        return Ok(());
    }
    let Some(sel) = state.monitors[state.selmon].sel else {
        return Ok(());
    };

    let target = monitor_in_direction(state, dir);
    ops::send_to_monitor(state, x, sel, target)
}

fn monitor_in_direction(state: &State, dir: i32) -> usize {
    let n = state.monitors.len() as i32;

    (state.selmon as i32 + dir).rem_euclid(n) as usize
}

/// Drag the selected client with the pointer, snapping to work area
/// edges and pulling tiled clients out into floating once they move far
/// enough.
pub fn move_mouse<X: XConn>(state: &mut State, x: &X) -> Result<()> {
    let Some(id) = state.monitors[state.selmon].sel else {
        return Ok(());
    };
    if state.clients[&id].is_fullscreen {
        return Ok(());
    }

    ops::restack(state, x, state.selmon)?;
    let start_r = state.clients[&id].r;

    if !x.grab_pointer(CursorKind::Move)? {
        return Ok(());
    }
    let start = x.query_pointer()?;
    let mut last_motion = 0u32;

    loop {
        match x.next_drag_event()? {
            XEvent::ButtonRelease(_) => break,
            XEvent::MotionNotify(ev) => {
                if ev.time.wrapping_sub(last_motion) <= 1000 / 60 {
                    continue;
                }
                last_motion = ev.time;

                let mut nx = start_r.x + (ev.root_pos.x - start.x);
                let mut ny = start_r.y + (ev.root_pos.y - start.y);
                let c = &state.clients[&id];
                let mon = &state.monitors[state.selmon];
                let wa = mon.win_r;
                let snap = state.config.snap;

                if (wa.x - nx).abs() < snap {
                    nx = wa.x;
                } else if (wa.right() - (nx + c.total_w())).abs() < snap {
                    nx = wa.right() - c.total_w();
                }
                if (wa.y - ny).abs() < snap {
                    ny = wa.y;
                } else if (wa.bottom() - (ny + c.total_h())).abs() < snap {
                    ny = wa.bottom() - c.total_h();
                }

                let floating_layout =
                    state.config.layouts[mon.lt[mon.sellt]].is_floating();
                if !c.is_floating
                    && !floating_layout
                    && ((nx - c.r.x).abs() > snap || (ny - c.r.y).abs() > snap)
                {
                    toggle_floating(state, x)?;
                }
                if floating_layout || state.clients[&id].is_floating {
                    let (w, h) = (state.clients[&id].r.w, state.clients[&id].r.h);
                    ops::resize(state, x, id, Rect::new(nx, ny, w, h), true)?;
                }
            }
            // client requests keep flowing while we hold the grab
            other => crate::core::handle::drag_event(&other, state, x)?,
        }
    }

    x.ungrab_pointer()?;
    finish_drag(state, x, id)
}

/// Resize the selected client with the pointer from its bottom-right
/// corner, enforcing a 1x1 minimum through the size hint machinery.
pub fn resize_mouse<X: XConn>(state: &mut State, x: &X) -> Result<()> {
    let Some(id) = state.monitors[state.selmon].sel else {
        return Ok(());
    };
    if state.clients[&id].is_fullscreen {
        return Ok(());
    }

    ops::restack(state, x, state.selmon)?;
    let start_r = state.clients[&id].r;
    let bw = state.clients[&id].bw;

    if !x.grab_pointer(CursorKind::Resize)? {
        return Ok(());
    }
    x.warp_pointer(id, start_r.w + bw - 1, start_r.h + bw - 1)?;
    let mut last_motion = 0u32;

    loop {
        match x.next_drag_event()? {
            XEvent::ButtonRelease(_) => break,
            XEvent::MotionNotify(ev) => {
                if ev.time.wrapping_sub(last_motion) <= 1000 / 60 {
                    continue;
                }
                last_motion = ev.time;

                let nw = (ev.root_pos.x - start_r.x - 2 * bw + 1).max(1);
                let nh = (ev.root_pos.y - start_r.y - 2 * bw + 1).max(1);
                let c = &state.clients[&id];
                let mon = &state.monitors[state.selmon];
                let within = mon.win_r.contains_point(crate::geometry::Point::new(
                    c.r.x + nw,
                    c.r.y + nh,
                ));

                let floating_layout =
                    state.config.layouts[mon.lt[mon.sellt]].is_floating();
                if within
                    && !c.is_floating
                    && !floating_layout
                    && ((nw - c.r.w).abs() > state.config.snap
                        || (nh - c.r.h).abs() > state.config.snap)
                {
                    toggle_floating(state, x)?;
                }
                if floating_layout || state.clients[&id].is_floating {
                    let (cx, cy) = (state.clients[&id].r.x, state.clients[&id].r.y);
                    ops::resize(state, x, id, Rect::new(cx, cy, nw, nh), true)?;
                }
            }
            other => crate::core::handle::drag_event(&other, state, x)?,
        }
    }

    let r = state.clients[&id].r;
    x.warp_pointer(id, r.w + bw - 1, r.h + bw - 1)?;
    x.ungrab_pointer()?;
    x.drain_enter_events()?;
    finish_drag(state, x, id)
}

/// After a drag: if the client now lives mostly on another monitor, hand
/// it over.
fn finish_drag<X: XConn>(state: &mut State, x: &X, id: Xid) -> Result<()> {
    let r = state.clients[&id].r;
    let m = state.rect_to_monitor(r);

    if m != state.selmon {
        ops::send_to_monitor(state, x, id, m)?;
        state.selmon = m;
        ops::focus(state, x, None)?;
    }

    Ok(())
}

/// Rename the tags currently viewed, prompting through dmenu.
///
/// The pipe blocks the event loop until dmenu exits; this is accepted
/// behavior for an interactive rename.
pub fn name_tag<X: XConn>(state: &mut State, x: &X) -> Result<()> {
    let name = match util::spawn_for_output(&["dmenu", "-p", "tag name:"]) {
        Ok(s) => s.lines().next().unwrap_or("").trim().to_owned(),
        Err(e) => {
            debug!(%e, "unable to run dmenu for tag rename");
            return Ok(());
        }
    };
    if name.is_empty() {
        return Ok(());
    }

    let viewed = state.monitors[state.selmon].tagmask();
    for i in 0..state.tag_labels.len() {
        if viewed & (1 << i) != 0 {
            state.tag_labels[i] = name.clone();
        }
    }

    bar::draw_bars(state, x)
}

/// Exit the main event loop cleanly.
pub fn quit<X: XConn>(state: &mut State, _x: &X) -> Result<()> {
    info!("quit requested");
    state.running = false;

    Ok(())
}

/// Exit the main event loop and re-exec ourselves.
pub fn restart<X: XConn>(state: &mut State, _x: &X) -> Result<()> {
    info!("restart requested");
    state.running = false;
    state.restart = true;

    Ok(())
}
