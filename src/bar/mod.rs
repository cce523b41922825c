//! The per-monitor status bar.
//!
//! Bar content is computed into a [BarPlan] first: tag cells (skipping
//! vacant tags), the layout symbol, the focused window title and the
//! status text with its in-band color switches. The same plan drives both
//! rendering and click routing, so the hit boxes always match what was
//! drawn.
use crate::{
    config::{SCHEME_NORM, SCHEME_SEL, SCHEME_URGENT},
    core::{bindings::ClickTarget, State, Xid},
    geometry::Rect,
    x::XConn,
    Result,
};

/// The tag occupancy sentinel: clients carrying exactly this mask sit on
/// the low eight tags but are ignored when deciding which tag cells light
/// up. A convention inherited from the status tools that set it.
const OCCUPANCY_IGNORE_TAGS: u32 = 0xff;

#[derive(Debug, Clone, PartialEq)]
struct TagCell {
    x: i32,
    w: i32,
    index: usize,
    label: String,
    scheme: usize,
    occupied: bool,
    focused_here: bool,
    urgent: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct StatusChunk {
    x: i32,
    w: i32,
    scheme: usize,
    text: String,
}

#[derive(Debug, Clone, PartialEq)]
struct BarPlan {
    barwin: Xid,
    width: i32,
    height: i32,
    cells: Vec<TagCell>,
    lt_x: i32,
    lt_w: i32,
    ltsymbol: String,
    title_x: i32,
    title_w: i32,
    title: Option<(String, usize, bool, bool)>, // text, scheme, floating, fixed
    status_x: i32,
    status: Vec<StatusChunk>,
}

/// Split status text into `(scheme, text)` runs: bytes `0x01..NUMCOLORS`
/// switch the scheme for the following characters and are not rendered.
/// Scheme 0 applies until the first switch.
pub(crate) fn parse_status(status: &str, n_schemes: usize) -> Vec<(usize, String)> {
    let mut chunks: Vec<(usize, String)> = Vec::new();
    let mut scheme = 0usize;
    let mut current = String::new();

    for ch in status.chars() {
        let code = ch as usize;
        if code >= 1 && code < n_schemes {
            if !current.is_empty() {
                chunks.push((scheme, std::mem::take(&mut current)));
            }
            scheme = code;
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        chunks.push((scheme, current));
    }

    chunks
}

fn occupancy(state: &State, m: usize) -> (u32, u32) {
    let mut occ = 0;
    let mut urg = 0;

    for id in state.monitors[m].clients.iter() {
        let c = &state.clients[id];
        if c.tags != OCCUPANCY_IGNORE_TAGS {
            occ |= c.tags;
        }
        if c.is_urgent {
            urg |= c.tags;
        }
    }

    (occ, urg)
}

fn plan(state: &State, m: usize) -> BarPlan {
    let mon = &state.monitors[m];
    let is_selmon = m == state.selmon;
    let tagset = mon.tagmask();
    let (occ, urg) = occupancy(state, m);
    let lrpad = state.draw.font_height();
    let width = mon.win_r.w;

    let sel = mon.sel.and_then(|id| state.clients.get(&id));
    let sel_tags = sel.map(|c| c.tags).unwrap_or(0);

    // status first so the title knows how much room is left
    let mut status = Vec::new();
    let mut status_w = 0;
    if is_selmon {
        for (scheme, text) in parse_status(&state.status, state.config.colors.len()) {
            let w = state.draw.text_width(&text);
            status.push(StatusChunk {
                x: 0, // patched below once the total width is known
                w,
                scheme,
                text,
            });
            status_w += w;
        }
        status_w += lrpad / 2;
    }
    let status_x = width - status_w;
    let mut sx = status_x;
    for chunk in status.iter_mut() {
        chunk.x = sx;
        sx += chunk.w;
    }

    let mut x = 0;
    let mut cells = Vec::new();
    for (i, label) in state.tag_labels.iter().enumerate() {
        let bit = 1 << i;
        // vacant tags are not drawn
        if occ & bit == 0 && tagset & bit == 0 {
            continue;
        }

        let w = state.draw.text_width(label) + lrpad;
        let scheme = if urg & bit != 0 {
            SCHEME_URGENT
        } else if tagset & bit != 0 {
            SCHEME_SEL
        } else {
            SCHEME_NORM
        };

        cells.push(TagCell {
            x,
            w,
            index: i,
            label: label.clone(),
            scheme,
            occupied: occ & bit != 0,
            focused_here: sel_tags & bit != 0,
            urgent: urg & bit != 0,
        });
        x += w;
    }

    let ltsymbol = adorned_symbol(state, m);
    let lt_x = x;
    let lt_w = state.draw.text_width(&ltsymbol) + lrpad;
    x += lt_w;

    let title_x = x;
    let title_w = status_x - x;
    let title = sel.map(|c| {
        let scheme = if is_selmon { SCHEME_SEL } else { SCHEME_NORM };
        (c.title.clone(), scheme, c.is_floating, c.is_fixed)
    });

    BarPlan {
        barwin: mon.barwin,
        width,
        height: state.bar_h,
        cells,
        lt_x,
        lt_w,
        ltsymbol,
        title_x,
        title_w,
        title,
        status_x,
        status,
    }
}

/// The monitor's layout symbol, adorned with the master count for the
/// master/stack family. Monocle and floating views already carry their
/// `N/M` counters in the symbol itself.
fn adorned_symbol(state: &State, m: usize) -> String {
    let mon = &state.monitors[m];
    let lt = state.config.layouts[mon.lt[mon.sellt]];
    let monocle_like = matches!(
        lt.arrange,
        Some(f) if f == crate::layout::monocle as crate::layout::ArrangeFn
    );

    if lt.arrange.is_some() && !monocle_like && mon.nmaster != 1 {
        format!("{} {}", mon.ltsymbol, mon.nmaster)
    } else {
        mon.ltsymbol.clone()
    }
}

/// Redraw the bar for one monitor.
pub(crate) fn draw_bar<X: XConn>(state: &mut State, _x: &X, m: usize) -> Result<()> {
    let p = plan(state, m);
    if *p.barwin == 0 {
        return Ok(());
    }

    let draw = &mut state.draw;
    let lrpad = draw.font_height();
    let (boxs, boxw) = (lrpad / 9, lrpad / 6 + 2);

    // background for the whole strip
    draw.rect(Rect::new(0, 0, p.width, p.height), SCHEME_NORM, true, false);

    for cell in p.cells.iter() {
        draw.text(cell.x, cell.w, lrpad / 2, &cell.label, cell.scheme, false);
        if cell.occupied {
            draw.rect(
                Rect::new(cell.x + boxs, boxs, boxw, boxw),
                cell.scheme,
                cell.focused_here,
                cell.urgent,
            );
        }
    }

    draw.text(p.lt_x, p.lt_w, lrpad / 2, &p.ltsymbol, SCHEME_NORM, false);

    for chunk in p.status.iter() {
        draw.text(chunk.x, chunk.w, 0, &chunk.text, chunk.scheme, false);
    }

    if p.title_w > p.height {
        match &p.title {
            Some((text, scheme, floating, fixed)) => {
                draw.text(p.title_x, p.title_w, lrpad / 2, text, *scheme, false);
                if *floating {
                    draw.rect(
                        Rect::new(p.title_x + boxs, boxs, boxw, boxw),
                        *scheme,
                        *fixed,
                        false,
                    );
                }
            }
            None => {
                draw.rect(
                    Rect::new(p.title_x, 0, p.title_w, p.height),
                    SCHEME_NORM,
                    true,
                    false,
                );
            }
        }
    }

    draw.flush_to(p.barwin, p.width, p.height)
}

/// Redraw every monitor's bar.
pub(crate) fn draw_bars<X: XConn>(state: &mut State, x: &X) -> Result<()> {
    for m in 0..state.monitors.len() {
        draw_bar(state, x, m)?;
    }

    Ok(())
}

/// Map a click x-offset inside the bar to the region that was drawn
/// there. Returns the clicked tag index for tag cells.
pub(crate) fn click_at(state: &State, m: usize, click_x: i32) -> (ClickTarget, Option<usize>) {
    let p = plan(state, m);

    for cell in p.cells.iter() {
        if click_x >= cell.x && click_x < cell.x + cell.w {
            return (ClickTarget::TagBar, Some(cell.index));
        }
    }
    if click_x >= p.lt_x && click_x < p.lt_x + p.lt_w {
        return (ClickTarget::LayoutSymbol, None);
    }
    if click_x >= p.status_x && !p.status.is_empty() {
        return (ClickTarget::StatusText, None);
    }

    (ClickTarget::WinTitle, None)
}
