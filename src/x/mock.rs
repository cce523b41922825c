//! A recording mock of [XConn] for driving the engine in tests.
//!
//! This module and its contents are only available when testing. The mock
//! answers property reads from maps the test sets up, records every write
//! as a [Req] for assertions, and hands out scripted events for the grab
//! loops.
use crate::{
    core::{bindings::ModMask, Xid},
    geometry::{Point, Rect},
    x::{
        event::ConfigureRequest, Atom, CursorKind, MapState, SizeHints, WindowAttributes, WmHints,
        WmState, XConn, XEvent,
    },
    Color, Error, Result,
};
use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet, VecDeque},
};
use strum::IntoEnumIterator;

/// A recorded protocol call.
#[derive(Debug, Clone, PartialEq)]
pub enum Req {
    AppendClientList(Xid),
    ClearUrgency(Xid),
    Configure { id: Xid, r: Rect, bw: i32 },
    ConfigureUnmanaged(Xid),
    CreateBarWindow(Rect),
    DestroyWindow(Xid),
    DrainEnterEvents,
    FocusRoot,
    GrabButtons { id: Xid, any: bool },
    GrabKeys(usize),
    GrabPointer(CursorKind),
    GrabServer,
    KillClient(Xid),
    Map(Xid),
    MoveWindow { id: Xid, x: i32, y: i32 },
    Raise(Xid),
    SelectClientEvents(Xid),
    SendConfigureNotify(Xid),
    SendProtocolMessage { id: Xid, proto: Atom },
    SetActiveWindow(Option<Xid>),
    SetBorderColor(Xid),
    SetBorderWidth { id: Xid, bw: i32 },
    SetClientList(Vec<Xid>),
    SetFullscreenState { id: Xid, fullscreen: bool },
    SetInputFocus(Xid),
    SetOpacity(Xid),
    SetWmState { id: Xid, state: WmState },
    StackBelow { id: Xid, sibling: Xid },
    UngrabButtons(Xid),
    UngrabKeys,
    UngrabPointer,
    UngrabServer,
    WarpPointer { id: Xid, x: i32, y: i32 },
}

/// A scripted, recording X connection.
#[derive(Debug, Default)]
pub struct RecordingConn {
    /// Every write issued through the connection, in order
    pub requests: RefCell<Vec<Req>>,
    /// Screen regions returned by `screen_sizes`
    pub screens: RefCell<Vec<Rect>>,
    /// The whole-screen extent
    pub screen_ext: Cell<(i32, i32)>,
    /// Windows returned by `query_tree`
    pub tree: RefCell<Vec<Xid>>,
    /// Per-window attributes (default: viewable, not override-redirect)
    pub attrs: RefCell<HashMap<Xid, WindowAttributes>>,
    /// Per-window geometry + border (default: 100x80 at the origin)
    pub geometry: RefCell<HashMap<Xid, (Rect, i32)>>,
    /// String properties keyed by window and atom
    pub strings: RefCell<HashMap<(Xid, Atom), String>>,
    /// WM_CLASS pairs (instance, class)
    pub wm_class: RefCell<HashMap<Xid, (String, String)>>,
    /// Parsed WM_HINTS
    pub wm_hints: RefCell<HashMap<Xid, WmHints>>,
    /// Normalised size hints
    pub size_hints: RefCell<HashMap<Xid, SizeHints>>,
    /// WM_TRANSIENT_FOR targets
    pub transient_for: RefCell<HashMap<Xid, Xid>>,
    /// ATOM[] properties (atom names) keyed by window and property
    pub atom_props: RefCell<HashMap<(Xid, Atom), Vec<String>>>,
    /// Per-window WM_STATE
    pub wm_states: RefCell<HashMap<Xid, WmState>>,
    /// Protocols advertised in WM_PROTOCOLS
    pub protocols: RefCell<HashSet<(Xid, Atom)>>,
    /// Events handed out by `next_event` / `next_drag_event`
    pub events: RefCell<VecDeque<XEvent>>,
    /// The pointer position reported by `query_pointer`
    pub pointer: Cell<Point>,
    next_id: Cell<u32>,
}

impl RecordingConn {
    /// A connection reporting the given screen regions.
    pub fn new(screens: Vec<Rect>) -> Self {
        let ext = screens
            .iter()
            .fold((0, 0), |(w, h), r| (w.max(r.right()), h.max(r.bottom())));

        let conn = Self::default();
        *conn.screens.borrow_mut() = screens;
        conn.screen_ext.set(ext);
        conn.next_id.set(1000);

        conn
    }

    /// Record a request.
    fn push(&self, req: Req) {
        self.requests.borrow_mut().push(req);
    }

    /// The requests recorded so far.
    pub fn taken(&self) -> Vec<Req> {
        self.requests.borrow().clone()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.requests.borrow_mut().clear();
    }

    /// Register a window with explicit geometry.
    pub fn add_window(&self, id: Xid, r: Rect) {
        self.geometry.borrow_mut().insert(id, (r, 1));
    }

    /// Set the WM_CLASS pair for a window.
    pub fn set_class(&self, id: Xid, instance: &str, class: &str) {
        self.wm_class
            .borrow_mut()
            .insert(id, (instance.to_owned(), class.to_owned()));
    }

    /// Queue an event for the grab loops.
    pub fn script_event(&self, ev: XEvent) {
        self.events.borrow_mut().push_back(ev);
    }
}

impl XConn for RecordingConn {
    fn root(&self) -> Xid {
        Xid(1)
    }

    fn become_wm(&self) -> Result<()> {
        Ok(())
    }

    fn init_ewmh(&self, _wm_name: &str) -> Result<()> {
        Ok(())
    }

    fn screen_sizes(&self) -> Result<Vec<Rect>> {
        Ok(self.screens.borrow().clone())
    }

    fn screen_extent(&self) -> (i32, i32) {
        self.screen_ext.get()
    }

    fn query_tree(&self) -> Result<Vec<Xid>> {
        Ok(self.tree.borrow().clone())
    }

    fn next_event(&self) -> Result<XEvent> {
        self.events
            .borrow_mut()
            .pop_front()
            .ok_or(Error::UnimplementedMock)
    }

    fn next_drag_event(&self) -> Result<XEvent> {
        self.next_event()
    }

    fn drain_enter_events(&self) -> Result<()> {
        self.push(Req::DrainEnterEvents);

        Ok(())
    }

    fn flush(&self) {}

    fn sync(&self) -> Result<()> {
        Ok(())
    }

    fn get_window_attributes(&self, id: Xid) -> Result<WindowAttributes> {
        Ok(self
            .attrs
            .borrow()
            .get(&id)
            .copied()
            .unwrap_or(WindowAttributes {
                override_redirect: false,
                map_state: MapState::Viewable,
            }))
    }

    fn get_geometry(&self, id: Xid) -> Result<(Rect, i32)> {
        Ok(self
            .geometry
            .borrow()
            .get(&id)
            .copied()
            .unwrap_or((Rect::new(0, 0, 100, 80), 1)))
    }

    fn get_prop_string(&self, id: Xid, atom: Atom) -> Result<Option<String>> {
        Ok(self.strings.borrow().get(&(id, atom)).cloned())
    }

    fn get_wm_class(&self, id: Xid) -> Result<Option<(String, String)>> {
        Ok(self.wm_class.borrow().get(&id).cloned())
    }

    fn get_wm_hints(&self, id: Xid) -> Result<Option<WmHints>> {
        Ok(self.wm_hints.borrow().get(&id).copied())
    }

    fn get_size_hints(&self, id: Xid) -> Result<Option<SizeHints>> {
        Ok(self.size_hints.borrow().get(&id).copied())
    }

    fn get_transient_for(&self, id: Xid) -> Result<Option<Xid>> {
        Ok(self.transient_for.borrow().get(&id).copied())
    }

    fn get_prop_atoms(&self, id: Xid, prop: Atom) -> Result<Vec<String>> {
        Ok(self
            .atom_props
            .borrow()
            .get(&(id, prop))
            .cloned()
            .unwrap_or_default())
    }

    fn atom_id(&self, atom: Atom) -> Result<u32> {
        let i = Atom::iter()
            .position(|a| a == atom)
            .expect("atom is a known variant");

        Ok(100 + i as u32)
    }

    fn get_wm_state(&self, id: Xid) -> Result<Option<WmState>> {
        Ok(self.wm_states.borrow().get(&id).copied())
    }

    fn supports_protocol(&self, id: Xid, proto: Atom) -> Result<bool> {
        Ok(self.protocols.borrow().contains(&(id, proto)))
    }

    fn clear_urgency_hint(&self, id: Xid) -> Result<()> {
        self.push(Req::ClearUrgency(id));

        Ok(())
    }

    fn set_wm_state(&self, id: Xid, state: WmState) -> Result<()> {
        self.wm_states.borrow_mut().insert(id, state);
        self.push(Req::SetWmState { id, state });

        Ok(())
    }

    fn set_active_window(&self, id: Option<Xid>) -> Result<()> {
        self.push(Req::SetActiveWindow(id));

        Ok(())
    }

    fn append_to_client_list(&self, id: Xid) -> Result<()> {
        self.push(Req::AppendClientList(id));

        Ok(())
    }

    fn set_client_list(&self, ids: &[Xid]) -> Result<()> {
        self.push(Req::SetClientList(ids.to_vec()));

        Ok(())
    }

    fn set_fullscreen_state(&self, id: Xid, fullscreen: bool) -> Result<()> {
        self.push(Req::SetFullscreenState { id, fullscreen });

        Ok(())
    }

    fn set_window_opacity(&self, id: Xid, _opacity: f64) -> Result<()> {
        self.push(Req::SetOpacity(id));

        Ok(())
    }

    fn configure(&self, id: Xid, r: Rect, border_width: i32) -> Result<()> {
        self.geometry.borrow_mut().insert(id, (r, border_width));
        self.push(Req::Configure {
            id,
            r,
            bw: border_width,
        });

        Ok(())
    }

    fn move_window(&self, id: Xid, x: i32, y: i32) -> Result<()> {
        self.push(Req::MoveWindow { id, x, y });

        Ok(())
    }

    fn set_border_width(&self, id: Xid, border_width: i32) -> Result<()> {
        self.push(Req::SetBorderWidth {
            id,
            bw: border_width,
        });

        Ok(())
    }

    fn set_border_color(&self, id: Xid, _color: Color) -> Result<()> {
        self.push(Req::SetBorderColor(id));

        Ok(())
    }

    fn send_configure_notify(&self, id: Xid, _r: Rect, _border_width: i32) -> Result<()> {
        self.push(Req::SendConfigureNotify(id));

        Ok(())
    }

    fn configure_unmanaged(&self, ev: &ConfigureRequest) -> Result<()> {
        self.push(Req::ConfigureUnmanaged(ev.id));

        Ok(())
    }

    fn stack_below(&self, id: Xid, sibling: Xid) -> Result<()> {
        self.push(Req::StackBelow { id, sibling });

        Ok(())
    }

    fn raise(&self, id: Xid) -> Result<()> {
        self.push(Req::Raise(id));

        Ok(())
    }

    fn map(&self, id: Xid) -> Result<()> {
        self.push(Req::Map(id));

        Ok(())
    }

    fn select_client_events(&self, id: Xid) -> Result<()> {
        self.push(Req::SelectClientEvents(id));

        Ok(())
    }

    fn send_protocol_message(&self, id: Xid, proto: Atom) -> Result<()> {
        self.push(Req::SendProtocolMessage { id, proto });

        Ok(())
    }

    fn kill_client(&self, id: Xid) -> Result<()> {
        self.push(Req::KillClient(id));

        Ok(())
    }

    fn set_input_focus(&self, id: Xid) -> Result<()> {
        self.push(Req::SetInputFocus(id));

        Ok(())
    }

    fn focus_root(&self) -> Result<()> {
        self.push(Req::FocusRoot);

        Ok(())
    }

    fn create_bar_window(&self, r: Rect) -> Result<Xid> {
        self.push(Req::CreateBarWindow(r));
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        Ok(Xid(id))
    }

    fn destroy_window(&self, id: Xid) -> Result<()> {
        self.push(Req::DestroyWindow(id));

        Ok(())
    }

    fn grab_keys(&self, keys: &[(ModMask, u32)]) -> Result<()> {
        self.push(Req::GrabKeys(keys.len()));

        Ok(())
    }

    fn ungrab_keys(&self) -> Result<()> {
        self.push(Req::UngrabKeys);

        Ok(())
    }

    fn grab_buttons(&self, id: Xid, _buttons: &[(ModMask, u8)], any_button: bool) -> Result<()> {
        self.push(Req::GrabButtons {
            id,
            any: any_button,
        });

        Ok(())
    }

    fn ungrab_buttons(&self, id: Xid) -> Result<()> {
        self.push(Req::UngrabButtons(id));

        Ok(())
    }

    fn grab_pointer(&self, cursor: CursorKind) -> Result<bool> {
        self.push(Req::GrabPointer(cursor));

        Ok(true)
    }

    fn ungrab_pointer(&self) -> Result<()> {
        self.push(Req::UngrabPointer);

        Ok(())
    }

    fn grab_server(&self) -> Result<()> {
        self.push(Req::GrabServer);

        Ok(())
    }

    fn ungrab_server(&self) -> Result<()> {
        self.push(Req::UngrabServer);

        Ok(())
    }

    fn query_pointer(&self) -> Result<Point> {
        Ok(self.pointer.get())
    }

    fn warp_pointer(&self, id: Xid, x: i32, y: i32) -> Result<()> {
        self.push(Req::WarpPointer { id, x, y });

        Ok(())
    }

    fn numlock_mask(&self) -> Result<ModMask> {
        Ok(ModMask::MOD2)
    }

    fn refresh_keyboard_mapping(&self) -> Result<()> {
        Ok(())
    }
}
