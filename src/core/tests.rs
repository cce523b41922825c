//! End to end tests driving the engine through the recording mock
//! connection: scripted events in, recorded protocol calls out.
use crate::{
    config::{Config, Rule},
    core::{actions, handle, ops, State, Xid},
    draw::recording::{DrawOp, RecordingDraw},
    geometry::Rect,
    x::{event::ClientMessage, mock::Req, mock::RecordingConn, Atom, WmHints, XConn, XEvent},
};
use std::collections::HashSet;

fn setup_with(
    config: Config,
    screens: Vec<Rect>,
) -> (
    State,
    RecordingConn,
    std::rc::Rc<std::cell::RefCell<Vec<DrawOp>>>,
) {
    let conn = RecordingConn::new(screens);
    let (draw, ops_handle) = RecordingDraw::new();
    let mut state = State::try_new(config, Box::new(draw), &conn).unwrap();
    ops::update_bars(&mut state, &conn).unwrap();
    conn.clear();

    (state, conn, ops_handle)
}

fn bare_config() -> Config {
    Config {
        border_px: 0,
        show_bar: false,
        ..Config::default()
    }
}

fn dispatch(state: &mut State, conn: &RecordingConn, ev: XEvent) {
    handle::x_event(&ev, state, conn, &mut [], &mut []).unwrap();
}

fn map_window(state: &mut State, conn: &RecordingConn, id: u32, r: Rect) -> Xid {
    let id = Xid(id);
    conn.add_window(id, r);
    dispatch(state, conn, XEvent::MapRequest(id));

    id
}

fn assert_invariants(state: &State) {
    let mut seen = 0;

    for (mi, m) in state.monitors.iter().enumerate() {
        let cs: HashSet<_> = m.clients.iter().collect();
        let ss: HashSet<_> = m.stack.iter().collect();
        assert_eq!(cs.len(), m.clients.len(), "duplicate in clients list");
        assert_eq!(ss.len(), m.stack.len(), "duplicate in stack list");
        assert_eq!(cs, ss, "clients and stack must hold the same set");
        seen += m.clients.len();

        for id in m.clients.iter() {
            assert_eq!(state.clients[id].mon, mi, "client backpointer mismatch");
        }

        assert!((0.05..=0.95).contains(&m.mfact));
        assert!(m.tagmask() != 0 && m.tagmask() <= state.config.tagmask());

        // tiled visible clients never overlap
        let tiled = ops::tiled_clients(state, mi);
        for (i, a) in tiled.iter().enumerate() {
            for b in tiled[i + 1..].iter() {
                let (ra, rb) = (state.clients[a].r, state.clients[b].r);
                assert!(
                    !ra.overlaps(&rb),
                    "tiled clients {a} and {b} overlap: {ra:?} vs {rb:?}"
                );
            }
        }
    }
    assert_eq!(seen, state.clients.len(), "orphaned client records");

    if let Some(sel) = state.monitors[state.selmon].sel {
        assert!(
            state.is_visible(&state.clients[&sel]),
            "selected client must be visible"
        );
    }

    for c in state.clients.values() {
        assert!(c.tags != 0 && c.tags <= state.config.tagmask());
        if c.is_fullscreen {
            assert_eq!(c.bw, 0);
            assert_eq!(c.r, state.monitors[c.mon].mon_r);
        }
    }
}

#[test]
fn rules_assign_monitor_and_tags() {
    let config = Config {
        rules: vec![Rule {
            class: Some("Firefox"),
            tags: 0,
            monitor: Some(0),
            ..Rule::default()
        }],
        ..bare_config()
    };
    let screens = vec![Rect::new(0, 0, 800, 600), Rect::new(800, 0, 800, 600)];
    let (mut state, conn, _) = setup_with(config, screens);
    state.selmon = 1;

    conn.set_class(Xid(10), "firefox", "Firefox");
    let id = map_window(&mut state, &conn, 10, Rect::new(0, 0, 400, 300));

    let c = &state.clients[&id];
    assert_eq!(c.mon, 0);
    assert_eq!(c.tags, state.monitors[0].tagmask());
    assert!(!c.is_floating);
    assert_invariants(&state);
}

#[test]
fn tile_math_matches_master_stack_split() {
    let (mut state, conn, _) = setup_with(bare_config(), vec![Rect::new(0, 0, 1000, 600)]);

    let oldest = map_window(&mut state, &conn, 10, Rect::new(0, 0, 100, 100));
    let middle = map_window(&mut state, &conn, 11, Rect::new(0, 0, 100, 100));
    let newest = map_window(&mut state, &conn, 12, Rect::new(0, 0, 100, 100));

    // newest window is attached at the head and becomes the master
    assert_eq!(state.clients[&newest].r, Rect::new(0, 0, 500, 600));
    assert_eq!(state.clients[&middle].r, Rect::new(500, 0, 500, 300));
    assert_eq!(state.clients[&oldest].r, Rect::new(500, 300, 500, 300));
    assert_invariants(&state);
}

#[test]
fn pertag_settings_are_remembered_per_view() {
    let (mut state, conn, _) = setup_with(bare_config(), vec![Rect::new(0, 0, 1000, 600)]);

    actions::set_mfact(&mut state, &conn, 1.7).unwrap();
    actions::inc_nmaster(&mut state, &conn, 1).unwrap();
    assert_eq!(state.monitors[0].mfact, 0.7);
    assert_eq!(state.monitors[0].nmaster, 2);

    actions::view(&mut state, &conn, 0b10).unwrap();
    actions::set_mfact(&mut state, &conn, 1.3).unwrap();
    assert_eq!(state.monitors[0].mfact, 0.3);

    actions::view(&mut state, &conn, 0b1).unwrap();
    assert_eq!(state.monitors[0].mfact, 0.7);
    assert_eq!(state.monitors[0].nmaster, 2);

    actions::view(&mut state, &conn, 0b10).unwrap();
    assert_eq!(state.monitors[0].mfact, 0.3);
    assert_eq!(state.monitors[0].nmaster, 1);
    assert_invariants(&state);
}

fn fullscreen_message(conn: &RecordingConn, id: Xid, action: u32) -> XEvent {
    XEvent::ClientMessage(ClientMessage {
        id,
        dtype: Atom::NetWmState.as_ref().to_owned(),
        data: [
            action,
            conn.atom_id(Atom::NetWmStateFullscreen).unwrap(),
            0,
            0,
            0,
        ],
    })
}

#[test]
fn fullscreen_add_then_remove_restores_geometry() {
    let mut config = bare_config();
    config.border_px = 2;
    // a floating layout preserves the mapped geometry for a tiled flag
    config.tags.iter_mut().for_each(|t| t.layout = 1);
    let (mut state, conn, _) = setup_with(config, vec![Rect::new(0, 0, 1000, 600)]);

    let id = map_window(&mut state, &conn, 10, Rect::new(100, 100, 400, 300));
    assert_eq!(state.clients[&id].r, Rect::new(100, 100, 400, 300));
    assert_eq!(state.clients[&id].bw, 2);
    assert!(!state.clients[&id].is_floating);

    dispatch(&mut state, &conn, fullscreen_message(&conn, id, 1));
    {
        let c = &state.clients[&id];
        assert!(c.is_fullscreen && c.is_floating);
        assert_eq!(c.bw, 0);
        assert_eq!(c.r, Rect::new(0, 0, 1000, 600));
    }
    assert_invariants(&state);

    dispatch(&mut state, &conn, fullscreen_message(&conn, id, 0));
    {
        let c = &state.clients[&id];
        assert!(!c.is_fullscreen && !c.is_floating);
        assert_eq!(c.bw, 2);
        assert_eq!(c.r, Rect::new(100, 100, 400, 300));
    }

    let fs_reqs: Vec<_> = conn
        .taken()
        .into_iter()
        .filter(|r| matches!(r, Req::SetFullscreenState { .. }))
        .collect();
    assert_eq!(
        fs_reqs,
        vec![
            Req::SetFullscreenState {
                id,
                fullscreen: true
            },
            Req::SetFullscreenState {
                id,
                fullscreen: false
            },
        ]
    );
    assert_invariants(&state);
}

#[test]
fn colored_status_text_switches_schemes_and_hides_controls() {
    let config = Config::default(); // bar visible
    let (mut state, conn, draw_ops) = setup_with(config, vec![Rect::new(0, 0, 1000, 600)]);

    conn.strings
        .borrow_mut()
        .insert((conn.root(), Atom::WmName), "\u{1}A\u{2}B".to_owned());
    dispatch(
        &mut state,
        &conn,
        XEvent::PropertyNotify(crate::x::event::PropertyEvent {
            id: conn.root(),
            atom: Atom::WmName.as_ref().to_owned(),
            is_root: true,
            deleted: false,
        }),
    );

    let texts: Vec<(String, usize)> = draw_ops
        .borrow()
        .iter()
        .filter_map(|op| match op {
            DrawOp::Text { text, scheme, .. } => Some((text.clone(), *scheme)),
            _ => None,
        })
        .collect();

    assert!(texts.contains(&("A".to_owned(), 1)));
    assert!(texts.contains(&("B".to_owned(), 2)));
    assert!(texts.iter().all(|(t, _)| !t.contains('\u{1}') && !t.contains('\u{2}')));
}

#[test]
fn kill_client_prefers_wm_delete_window() {
    let (mut state, conn, _) = setup_with(bare_config(), vec![Rect::new(0, 0, 1000, 600)]);
    let id = map_window(&mut state, &conn, 10, Rect::new(0, 0, 100, 100));
    conn.protocols
        .borrow_mut()
        .insert((id, Atom::WmDeleteWindow));
    conn.clear();

    actions::kill_client(&mut state, &conn).unwrap();

    let reqs = conn.taken();
    let deletes = reqs
        .iter()
        .filter(|r| {
            matches!(
                r,
                Req::SendProtocolMessage {
                    proto: Atom::WmDeleteWindow,
                    ..
                }
            )
        })
        .count();
    assert_eq!(deletes, 1);
    assert!(!reqs.iter().any(|r| matches!(r, Req::KillClient(_))));
}

#[test]
fn kill_client_without_protocol_uses_server_grab() {
    let (mut state, conn, _) = setup_with(bare_config(), vec![Rect::new(0, 0, 1000, 600)]);
    let id = map_window(&mut state, &conn, 10, Rect::new(0, 0, 100, 100));
    conn.clear();

    actions::kill_client(&mut state, &conn).unwrap();

    let reqs = conn.taken();
    let grab = reqs.iter().position(|r| matches!(r, Req::GrabServer));
    let kill = reqs.iter().position(|r| matches!(r, Req::KillClient(k) if *k == id));
    let ungrab = reqs.iter().position(|r| matches!(r, Req::UngrabServer));

    assert!(grab.is_some() && kill.is_some() && ungrab.is_some());
    assert!(grab < kill && kill < ungrab, "kill must happen under the grab");
}

#[test]
fn view_zero_swaps_back_to_previous_tagset() {
    let (mut state, conn, _) = setup_with(bare_config(), vec![Rect::new(0, 0, 1000, 600)]);

    actions::view(&mut state, &conn, 0b10).unwrap();
    actions::view(&mut state, &conn, 0b100).unwrap();
    actions::view(&mut state, &conn, 0).unwrap();

    assert_eq!(state.monitors[0].tagmask(), 0b10);
    assert_invariants(&state);
}

#[test]
fn toggle_tag_twice_is_identity() {
    let (mut state, conn, _) = setup_with(bare_config(), vec![Rect::new(0, 0, 1000, 600)]);
    let id = map_window(&mut state, &conn, 10, Rect::new(0, 0, 100, 100));

    let before = state.clients[&id].tags;
    actions::toggle_tag(&mut state, &conn, 0b10).unwrap();
    assert_eq!(state.clients[&id].tags, before | 0b10);
    actions::toggle_tag(&mut state, &conn, 0b10).unwrap();
    assert_eq!(state.clients[&id].tags, before);
    assert_invariants(&state);
}

#[test]
fn sendmon_roundtrip_restores_owner_but_not_tags() {
    let screens = vec![Rect::new(0, 0, 800, 600), Rect::new(800, 0, 800, 600)];
    let (mut state, conn, _) = setup_with(bare_config(), screens);
    let id = map_window(&mut state, &conn, 10, Rect::new(0, 0, 100, 100));

    actions::view(&mut state, &conn, 0b100).unwrap(); // hide it, tags stay 0b1
    actions::view(&mut state, &conn, 0b1).unwrap();

    ops::send_to_monitor(&mut state, &conn, id, 1).unwrap();
    assert_eq!(state.clients[&id].mon, 1);
    assert_eq!(state.clients[&id].tags, state.monitors[1].tagmask());

    ops::send_to_monitor(&mut state, &conn, id, 0).unwrap();
    assert_eq!(state.clients[&id].mon, 0);
    // tags were overwritten by the target's tagset along the way
    assert_eq!(state.clients[&id].tags, state.monitors[0].tagmask());
    assert_invariants(&state);
}

#[test]
fn set_layout_same_argument_is_idempotent_and_none_flips() {
    let (mut state, conn, _) = setup_with(bare_config(), vec![Rect::new(0, 0, 1000, 600)]);

    actions::set_layout(&mut state, &conn, Some(2)).unwrap();
    let after_first = (state.monitors[0].lt, state.monitors[0].sellt);
    actions::set_layout(&mut state, &conn, Some(2)).unwrap();
    assert_eq!(
        (state.monitors[0].lt, state.monitors[0].sellt),
        after_first
    );

    // the no-argument form flips between the pair
    let before = (state.monitors[0].lt, state.monitors[0].sellt);
    actions::set_layout(&mut state, &conn, None).unwrap();
    assert_ne!((state.monitors[0].lt, state.monitors[0].sellt), before);
    actions::set_layout(&mut state, &conn, None).unwrap();
    assert_eq!((state.monitors[0].lt, state.monitors[0].sellt), before);
}

#[test]
fn oversized_window_is_clamped_into_the_monitor() {
    let mut config = bare_config();
    config.rules = vec![Rule {
        class: Some("big"),
        is_floating: true,
        ..Rule::default()
    }];
    let (mut state, conn, _) = setup_with(config, vec![Rect::new(0, 0, 1000, 600)]);

    conn.set_class(Xid(10), "big", "big");
    let id = map_window(&mut state, &conn, 10, Rect::new(500, 500, 2000, 1200));

    let c = &state.clients[&id];
    assert_eq!((c.r.x, c.r.y), (0, 0));
    assert_invariants(&state);
}

#[test]
fn killing_the_last_client_clears_selection() {
    let (mut state, conn, _) = setup_with(bare_config(), vec![Rect::new(0, 0, 1000, 600)]);
    let id = map_window(&mut state, &conn, 10, Rect::new(0, 0, 100, 100));
    assert_eq!(state.monitors[0].sel, Some(id));

    dispatch(&mut state, &conn, XEvent::DestroyNotify(id));

    assert!(state.monitors[0].sel.is_none());
    assert!(state.clients.is_empty());
    assert!(state.monitors[0].clients.is_empty() && state.monitors[0].stack.is_empty());
    assert_invariants(&state);
}

#[test]
fn unmap_without_send_event_unmanages() {
    let (mut state, conn, _) = setup_with(bare_config(), vec![Rect::new(0, 0, 1000, 600)]);
    let id = map_window(&mut state, &conn, 10, Rect::new(0, 0, 100, 100));

    dispatch(
        &mut state,
        &conn,
        XEvent::UnmapNotify {
            id,
            send_event: false,
        },
    );

    assert!(state.clients.is_empty());
    // the original border is restored under a server grab
    let reqs = conn.taken();
    assert!(reqs.iter().any(|r| matches!(r, Req::GrabServer)));
    assert!(reqs
        .iter()
        .any(|r| matches!(r, Req::SetBorderWidth { id: i, bw: 1 } if *i == id)));
}

#[test]
fn transient_windows_inherit_monitor_and_tags_and_float() {
    let screens = vec![Rect::new(0, 0, 800, 600), Rect::new(800, 0, 800, 600)];
    let (mut state, conn, _) = setup_with(bare_config(), screens);

    let parent = map_window(&mut state, &conn, 10, Rect::new(0, 0, 100, 100));
    actions::tag(&mut state, &conn, 0b11).unwrap();

    conn.transient_for.borrow_mut().insert(Xid(11), parent);
    let child = map_window(&mut state, &conn, 11, Rect::new(0, 0, 50, 50));

    let c = &state.clients[&child];
    assert_eq!(c.mon, state.clients[&parent].mon);
    assert_eq!(c.tags, state.clients[&parent].tags);
    assert!(c.is_floating);
    assert_invariants(&state);
}

#[test]
fn monocle_symbol_counts_selected_over_visible() {
    let (mut state, conn, _) = setup_with(bare_config(), vec![Rect::new(0, 0, 1000, 600)]);
    map_window(&mut state, &conn, 10, Rect::new(0, 0, 100, 100));
    map_window(&mut state, &conn, 11, Rect::new(0, 0, 100, 100));

    actions::set_layout(&mut state, &conn, Some(2)).unwrap();

    assert_eq!(state.monitors[0].ltsymbol, "[1/2]");
}

#[test]
fn urgent_hint_is_tracked_and_cleared_on_focus() {
    let (mut state, conn, _) = setup_with(bare_config(), vec![Rect::new(0, 0, 1000, 600)]);
    let w1 = map_window(&mut state, &conn, 10, Rect::new(0, 0, 100, 100));
    let _w2 = map_window(&mut state, &conn, 11, Rect::new(0, 0, 100, 100));

    conn.wm_hints.borrow_mut().insert(
        w1,
        WmHints {
            urgent: true,
            accepts_input: true,
        },
    );
    dispatch(
        &mut state,
        &conn,
        XEvent::PropertyNotify(crate::x::event::PropertyEvent {
            id: w1,
            atom: Atom::WmHints.as_ref().to_owned(),
            is_root: false,
            deleted: false,
        }),
    );
    assert!(state.clients[&w1].is_urgent);

    conn.clear();
    ops::focus(&mut state, &conn, Some(w1)).unwrap();

    assert!(!state.clients[&w1].is_urgent);
    assert!(conn.taken().iter().any(|r| matches!(r, Req::ClearUrgency(i) if *i == w1)));
    assert_invariants(&state);
}

#[test]
fn net_active_window_switches_view_and_raises() {
    let (mut state, conn, _) = setup_with(bare_config(), vec![Rect::new(0, 0, 1000, 600)]);
    let id = map_window(&mut state, &conn, 10, Rect::new(0, 0, 100, 100));

    actions::view(&mut state, &conn, 0b100).unwrap();
    assert!(state.monitors[0].sel.is_none());

    dispatch(
        &mut state,
        &conn,
        XEvent::ClientMessage(ClientMessage {
            id,
            dtype: Atom::NetActiveWindow.as_ref().to_owned(),
            data: [0; 5],
        }),
    );

    assert!(state.is_visible(&state.clients[&id]));
    assert_eq!(state.monitors[0].sel, Some(id));
    assert_invariants(&state);
}

#[test]
fn focus_stack_wraps_through_visible_clients() {
    let (mut state, conn, _) = setup_with(bare_config(), vec![Rect::new(0, 0, 1000, 600)]);
    let w1 = map_window(&mut state, &conn, 10, Rect::new(0, 0, 100, 100));
    let w2 = map_window(&mut state, &conn, 11, Rect::new(0, 0, 100, 100));
    let w3 = map_window(&mut state, &conn, 12, Rect::new(0, 0, 100, 100));

    // list order is newest first: [w3, w2, w1], selection starts on w3
    assert_eq!(state.monitors[0].sel, Some(w3));

    actions::focus_stack(&mut state, &conn, 1).unwrap();
    assert_eq!(state.monitors[0].sel, Some(w2));
    actions::focus_stack(&mut state, &conn, 1).unwrap();
    assert_eq!(state.monitors[0].sel, Some(w1));
    actions::focus_stack(&mut state, &conn, 1).unwrap();
    assert_eq!(state.monitors[0].sel, Some(w3), "wraps at the end");
    actions::focus_stack(&mut state, &conn, -1).unwrap();
    assert_eq!(state.monitors[0].sel, Some(w1), "wraps backwards too");
    assert_invariants(&state);
}

#[test]
fn zoom_promotes_selection_to_master() {
    let (mut state, conn, _) = setup_with(bare_config(), vec![Rect::new(0, 0, 1000, 600)]);
    let w1 = map_window(&mut state, &conn, 10, Rect::new(0, 0, 100, 100));
    let w2 = map_window(&mut state, &conn, 11, Rect::new(0, 0, 100, 100));

    actions::focus_stack(&mut state, &conn, 1).unwrap(); // select w1
    actions::zoom(&mut state, &conn).unwrap();

    assert_eq!(state.monitors[0].clients[0], w1);
    assert_eq!(state.clients[&w1].r, Rect::new(0, 0, 500, 600));

    // zooming the master promotes the next tiled client instead
    actions::zoom(&mut state, &conn).unwrap();
    assert_eq!(state.monitors[0].clients[0], w2);
    assert_invariants(&state);
}

#[test]
fn toggle_view_refuses_to_empty_the_tagset() {
    let (mut state, conn, _) = setup_with(bare_config(), vec![Rect::new(0, 0, 1000, 600)]);

    actions::toggle_view(&mut state, &conn, 0b1).unwrap();

    assert_eq!(state.monitors[0].tagmask(), 0b1);
    assert_invariants(&state);
}

#[test]
fn shrinking_monitor_count_migrates_clients() {
    let screens = vec![Rect::new(0, 0, 800, 600), Rect::new(800, 0, 800, 600)];
    let (mut state, conn, _) = setup_with(bare_config(), screens);

    state.selmon = 1;
    let id = map_window(&mut state, &conn, 10, Rect::new(810, 0, 100, 100));
    assert_eq!(state.clients[&id].mon, 1);

    *conn.screens.borrow_mut() = vec![Rect::new(0, 0, 800, 600)];
    dispatch(
        &mut state,
        &conn,
        XEvent::ConfigureNotify(crate::x::event::ConfigureEvent {
            id: conn.root(),
            r: Rect::new(0, 0, 800, 600),
            is_root: true,
        }),
    );

    assert_eq!(state.monitors.len(), 1);
    assert_eq!(state.clients[&id].mon, 0);
    assert_eq!(state.selmon, 0);
    assert_invariants(&state);
}
