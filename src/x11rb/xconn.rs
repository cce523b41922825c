//! API wrapper for talking to the X server using x11rb.
use crate::{
    core::{bindings::ModMask, Xid},
    geometry::{Point, Rect},
    x::{
        event::ConfigureRequest,
        keysym::{KeySym, XK_Num_Lock},
        Atom, CursorKind, MapState, SizeHints, WindowAttributes, WmHints, WmState, XConn, XEvent,
        EWMH_SUPPORTED_ATOMS,
    },
    Color, Error, Result,
};
use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, VecDeque},
};
use strum::IntoEnumIterator;
use x11rb::{
    connection::Connection,
    errors::ReplyError,
    properties::WmClass,
    protocol::{
        randr::ConnectionExt as _,
        xproto::{
            AtomEnum, ButtonIndex, ChangeWindowAttributesAux, ClientMessageEvent,
            ConfigureNotifyEvent, ConfigureWindowAux, ConnectionExt as _, CreateWindowAux,
            CursorWrapper, EventMask, FontWrapper, GrabMode, GrabStatus, InputFocus,
            MapState as XMapState, ModMask as XModMask, PropMode, StackMode, WindowClass,
            CLIENT_MESSAGE_EVENT,
        },
        ErrorKind,
    },
    rust_connection::RustConnection,
    wrapper::ConnectionExt as _,
    CURRENT_TIME, NONE,
};

const WM_STATE_FORMAT: u8 = 32;

// cursor font glyphs (X11/cursorfont.h)
const XC_LEFT_PTR: u16 = 68;
const XC_SIZING: u16 = 120;
const XC_FLEUR: u16 = 52;

// the event masks we select on the root and on managed clients
fn root_event_mask() -> EventMask {
    EventMask::SUBSTRUCTURE_REDIRECT
        | EventMask::SUBSTRUCTURE_NOTIFY
        | EventMask::BUTTON_PRESS
        | EventMask::POINTER_MOTION
        | EventMask::ENTER_WINDOW
        | EventMask::LEAVE_WINDOW
        | EventMask::STRUCTURE_NOTIFY
        | EventMask::PROPERTY_CHANGE
}

fn client_event_mask() -> EventMask {
    EventMask::ENTER_WINDOW
        | EventMask::FOCUS_CHANGE
        | EventMask::PROPERTY_CHANGE
        | EventMask::STRUCTURE_NOTIFY
}

fn mouse_mask() -> EventMask {
    EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION
}

/// The keyboard mapping cache: keycode to keysym and back.
#[derive(Debug, Default)]
pub(super) struct KeyMap {
    min_keycode: u8,
    per_code: u8,
    syms: Vec<u32>,
}

impl KeyMap {
    /// The first-column keysym for a keycode.
    pub(super) fn keysym_for(&self, code: u8) -> Option<KeySym> {
        let i = (code.checked_sub(self.min_keycode)? as usize) * self.per_code as usize;

        self.syms.get(i).copied()
    }

    fn keycodes_for(&self, sym: KeySym) -> Vec<u8> {
        let per = self.per_code.max(1) as usize;

        self.syms
            .chunks(per)
            .enumerate()
            .filter(|(_, row)| row.first() == Some(&sym))
            .map(|(i, _)| self.min_keycode + i as u8)
            .collect()
    }
}

/// Handles communication with an X server via the x11rb crate.
#[derive(Debug)]
pub struct X11rbConnection {
    conn: RustConnection,
    root: u32,
    screen_extent: Cell<(i32, i32)>,
    atoms: HashMap<Atom, u32>,
    atom_names: RefCell<HashMap<u32, String>>,
    cursors: HashMap<CursorKind, u32>,
    check_win: Cell<u32>,
    keymap: RefCell<KeyMap>,
    numlock: Cell<u16>,
    pending: RefCell<VecDeque<XEvent>>,
}

impl X11rbConnection {
    /// Connect to the X server named by `$DISPLAY`.
    pub fn new() -> Result<Self> {
        let (conn, screen_num) = RustConnection::connect(None)?;
        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;
        let extent = (
            screen.width_in_pixels as i32,
            screen.height_in_pixels as i32,
        );

        // intern all known atoms up front: send every request, then
        // collect the replies
        let cookies: Vec<_> = Atom::iter()
            .map(|atom| (atom, conn.intern_atom(false, atom.as_ref().as_bytes())))
            .collect();
        let mut atoms = HashMap::new();
        let mut atom_names = HashMap::new();
        for (atom, cookie) in cookies {
            let id = cookie?.reply()?.atom;
            atoms.insert(atom, id);
            atom_names.insert(id, atom.as_ref().to_owned());
        }

        let cursors = create_cursors(&conn)?;

        let this = Self {
            conn,
            root,
            screen_extent: Cell::new(extent),
            atoms,
            atom_names: RefCell::new(atom_names),
            cursors,
            check_win: Cell::new(NONE),
            keymap: RefCell::new(KeyMap::default()),
            numlock: Cell::new(0),
            pending: RefCell::new(VecDeque::new()),
        };
        this.load_keymap()?;

        Ok(this)
    }

    pub(super) fn root_win(&self) -> u32 {
        self.root
    }

    pub(super) fn keymap_ref(&self) -> &RefCell<KeyMap> {
        &self.keymap
    }

    pub(super) fn set_screen_extent(&self, w: i32, h: i32) {
        self.screen_extent.set((w, h));
    }

    pub(super) fn known_atom(&self, atom: Atom) -> u32 {
        // every Atom variant was interned at connection time
        self.atoms[&atom]
    }

    /// The name of an atom, caching server lookups.
    pub(super) fn name_of_atom(&self, id: u32) -> Result<String> {
        if let Some(name) = self.atom_names.borrow().get(&id) {
            return Ok(name.clone());
        }

        let reply = self.conn.get_atom_name(id)?.reply()?;
        let name = String::from_utf8_lossy(&reply.name).to_string();
        self.atom_names.borrow_mut().insert(id, name.clone());

        Ok(name)
    }

    fn load_keymap(&self) -> Result<()> {
        let setup = self.conn.setup();
        let (min, max) = (setup.min_keycode, setup.max_keycode);
        let reply = self
            .conn
            .get_keyboard_mapping(min, max - min + 1)?
            .reply()?;

        *self.keymap.borrow_mut() = KeyMap {
            min_keycode: min,
            per_code: reply.keysyms_per_keycode,
            syms: reply.keysyms,
        };

        Ok(())
    }

    fn get_prop32(&self, id: Xid, prop: u32, ty: u32, len: u32) -> Result<Vec<u32>> {
        let reply = self
            .conn
            .get_property(false, *id, prop, ty, 0, len)?
            .reply()?;

        Ok(reply.value32().map(|it| it.collect()).unwrap_or_default())
    }

    fn lock_combinations(&self) -> [u16; 4] {
        let numlock = self.numlock.get();
        let lock = u16::from(XModMask::LOCK);

        [0, lock, numlock, numlock | lock]
    }

    pub(super) fn push_pending(&self, ev: XEvent) {
        self.pending.borrow_mut().push_back(ev);
    }

    /// Pull, convert and filter one event from the wire, logging errors
    /// that are not in the benign whitelist.
    fn pull_event(&self) -> Result<XEvent> {
        loop {
            if let Some(ev) = self.pending.borrow_mut().pop_front() {
                return Ok(ev);
            }

            let raw = self.conn.wait_for_event()?;
            if let Some(ev) = self.convert_event(raw) {
                return Ok(ev);
            }
        }
    }
}

fn create_cursors(conn: &RustConnection) -> Result<HashMap<CursorKind, u32>> {
    let font = FontWrapper::open_font(conn, "cursor".as_bytes())?;
    let mut cursors = HashMap::new();

    for (kind, glyph) in [
        (CursorKind::Normal, XC_LEFT_PTR),
        (CursorKind::Resize, XC_SIZING),
        (CursorKind::Move, XC_FLEUR),
    ] {
        let cursor = CursorWrapper::create_glyph_cursor(
            conn,
            font.font(),
            font.font(),
            glyph,
            glyph + 1,
            0,
            0,
            0,
            0xffff,
            0xffff,
            0xffff,
        )?;
        cursors.insert(kind, cursor.into_cursor());
    }

    Ok(cursors)
}

impl XConn for X11rbConnection {
    fn root(&self) -> Xid {
        Xid(self.root)
    }

    fn become_wm(&self) -> Result<()> {
        let aux =
            ChangeWindowAttributesAux::new().event_mask(EventMask::SUBSTRUCTURE_REDIRECT);
        let res = self
            .conn
            .change_window_attributes(self.root, &aux)?
            .check();

        match res {
            Err(ReplyError::X11Error(ref e)) if e.error_kind == ErrorKind::Access => {
                return Err(Error::OtherWmRunning)
            }
            Err(e) => return Err(e.into()),
            Ok(()) => (),
        }

        let aux = ChangeWindowAttributesAux::new()
            .event_mask(root_event_mask())
            .cursor(self.cursors[&CursorKind::Normal]);
        self.conn.change_window_attributes(self.root, &aux)?.check()?;
        self.numlock.set(self.numlock_mask()?.bits());

        Ok(())
    }

    fn init_ewmh(&self, wm_name: &str) -> Result<()> {
        let check = self.conn.generate_id()?;
        let aux = CreateWindowAux::new().override_redirect(1);
        self.conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            check,
            self.root,
            -1,
            -1,
            1,
            1,
            0,
            WindowClass::INPUT_OUTPUT,
            x11rb::COPY_FROM_PARENT,
            &aux,
        )?;
        self.check_win.set(check);

        let check_atom = self.known_atom(Atom::NetSupportingWmCheck);
        let name_atom = self.known_atom(Atom::NetWmName);
        let utf8 = self.known_atom(Atom::UTF8String);
        for win in [check, self.root] {
            self.conn
                .change_property32(PropMode::REPLACE, win, check_atom, AtomEnum::WINDOW, &[check])?;
        }
        self.conn
            .change_property8(PropMode::REPLACE, check, name_atom, utf8, wm_name.as_bytes())?;

        let supported: Vec<u32> = EWMH_SUPPORTED_ATOMS
            .iter()
            .map(|a| self.known_atom(*a))
            .collect();
        self.conn.change_property32(
            PropMode::REPLACE,
            self.root,
            self.known_atom(Atom::NetSupported),
            AtomEnum::ATOM,
            &supported,
        )?;

        Ok(())
    }

    fn screen_sizes(&self) -> Result<Vec<Rect>> {
        let reply = match self.conn.randr_get_monitors(self.root, true) {
            Ok(cookie) => cookie.reply().ok(),
            Err(_) => None,
        };

        let mut rects: Vec<Rect> = match reply {
            Some(reply) if !reply.monitors.is_empty() => reply
                .monitors
                .iter()
                .map(|m| Rect::new(m.x as i32, m.y as i32, m.width as i32, m.height as i32))
                .collect(),
            _ => {
                let (w, h) = self.screen_extent.get();
                vec![Rect::new(0, 0, w, h)]
            }
        };

        // drop duplicate geometries (mirrored outputs)
        let mut unique: Vec<Rect> = Vec::with_capacity(rects.len());
        for r in rects.drain(..) {
            if !unique.contains(&r) {
                unique.push(r);
            }
        }

        Ok(unique)
    }

    fn screen_extent(&self) -> (i32, i32) {
        self.screen_extent.get()
    }

    fn query_tree(&self) -> Result<Vec<Xid>> {
        let reply = self.conn.query_tree(self.root)?.reply()?;

        Ok(reply.children.into_iter().map(Xid).collect())
    }

    fn next_event(&self) -> Result<XEvent> {
        self.pull_event()
    }

    fn next_drag_event(&self) -> Result<XEvent> {
        loop {
            let raw = self.conn.wait_for_event()?;
            let Some(ev) = self.convert_event(raw) else {
                continue;
            };

            match ev {
                XEvent::MotionNotify(_)
                | XEvent::ButtonRelease(_)
                | XEvent::ConfigureRequest(_)
                | XEvent::Expose(_)
                | XEvent::MapRequest(_) => return Ok(ev),
                // everything else waits until the grab is released
                other => self.push_pending(other),
            }
        }
    }

    fn drain_enter_events(&self) -> Result<()> {
        while let Some(raw) = self.conn.poll_for_event()? {
            match self.convert_event(raw) {
                Some(XEvent::Enter(_)) | None => (),
                Some(other) => self.push_pending(other),
            }
        }

        Ok(())
    }

    fn flush(&self) {
        let _ = self.conn.flush();
    }

    fn sync(&self) -> Result<()> {
        self.conn.sync()?;

        Ok(())
    }

    fn get_window_attributes(&self, id: Xid) -> Result<WindowAttributes> {
        let reply = self.conn.get_window_attributes(*id)?.reply()?;
        let map_state = match reply.map_state {
            XMapState::UNMAPPED => MapState::Unmapped,
            XMapState::UNVIEWABLE => MapState::Unviewable,
            _ => MapState::Viewable,
        };

        Ok(WindowAttributes {
            override_redirect: reply.override_redirect,
            map_state,
        })
    }

    fn get_geometry(&self, id: Xid) -> Result<(Rect, i32)> {
        let geo = self.conn.get_geometry(*id)?.reply()?;

        Ok((
            Rect::new(geo.x as i32, geo.y as i32, geo.width as i32, geo.height as i32),
            geo.border_width as i32,
        ))
    }

    fn get_prop_string(&self, id: Xid, atom: Atom) -> Result<Option<String>> {
        let reply = self
            .conn
            .get_property(
                false,
                *id,
                self.known_atom(atom),
                AtomEnum::ANY,
                0,
                1024,
            )?
            .reply()?;

        if reply.value.is_empty() {
            return Ok(None);
        }

        // values may be UTF8_STRING, STRING (Latin-1) or COMPOUND_TEXT;
        // a lossy conversion keeps us going for all of them
        let s = String::from_utf8_lossy(&reply.value)
            .trim_end_matches('\0')
            .to_owned();

        Ok(Some(s))
    }

    fn get_wm_class(&self, id: Xid) -> Result<Option<(String, String)>> {
        let reply = match WmClass::get(&self.conn, *id)?.reply_unchecked() {
            Ok(Some(reply)) => reply,
            _ => return Ok(None),
        };

        let instance = String::from_utf8_lossy(reply.instance()).to_string();
        let class = String::from_utf8_lossy(reply.class()).to_string();

        Ok(Some((instance, class)))
    }

    fn get_wm_hints(&self, id: Xid) -> Result<Option<WmHints>> {
        let hints = self.known_atom(Atom::WmHints);
        let data = self.get_prop32(id, hints, hints, 9)?;

        Ok(WmHints::from_raw(&data))
    }

    fn get_size_hints(&self, id: Xid) -> Result<Option<SizeHints>> {
        let data = self.get_prop32(
            id,
            self.known_atom(Atom::WmNormalHints),
            u32::from(AtomEnum::WM_SIZE_HINTS),
            18,
        )?;

        Ok(SizeHints::from_raw(&data))
    }

    fn get_transient_for(&self, id: Xid) -> Result<Option<Xid>> {
        let data = self.get_prop32(
            id,
            u32::from(AtomEnum::WM_TRANSIENT_FOR),
            u32::from(AtomEnum::WINDOW),
            1,
        )?;

        Ok(data.first().filter(|&&w| w != NONE).map(|&w| Xid(w)))
    }

    fn get_prop_atoms(&self, id: Xid, prop: Atom) -> Result<Vec<String>> {
        let ids = self.get_prop32(
            id,
            self.known_atom(prop),
            u32::from(AtomEnum::ATOM),
            32,
        )?;

        ids.into_iter().map(|a| self.name_of_atom(a)).collect()
    }

    fn atom_id(&self, atom: Atom) -> Result<u32> {
        Ok(self.known_atom(atom))
    }

    fn get_wm_state(&self, id: Xid) -> Result<Option<WmState>> {
        let wm_state = self.known_atom(Atom::WmState);
        let data = self.get_prop32(id, wm_state, wm_state, 2)?;

        Ok(match data.first() {
            Some(0) => Some(WmState::Withdrawn),
            Some(1) => Some(WmState::Normal),
            Some(3) => Some(WmState::Iconic),
            _ => None,
        })
    }

    fn supports_protocol(&self, id: Xid, proto: Atom) -> Result<bool> {
        let protocols = self.get_prop32(
            id,
            self.known_atom(Atom::WmProtocols),
            u32::from(AtomEnum::ATOM),
            32,
        )?;

        Ok(protocols.contains(&self.known_atom(proto)))
    }

    fn clear_urgency_hint(&self, id: Xid) -> Result<()> {
        let hints = self.known_atom(Atom::WmHints);
        let mut data = self.get_prop32(id, hints, hints, 9)?;
        if data.is_empty() {
            return Ok(());
        }

        data[0] &= !(1 << 8);
        self.conn
            .change_property32(PropMode::REPLACE, *id, hints, hints, &data)?;

        Ok(())
    }

    fn set_wm_state(&self, id: Xid, state: WmState) -> Result<()> {
        let wm_state = self.known_atom(Atom::WmState);
        let data = [u32::from(state), NONE];
        self.conn
            .change_property32(PropMode::REPLACE, *id, wm_state, wm_state, &data)?;

        Ok(())
    }

    fn set_active_window(&self, id: Option<Xid>) -> Result<()> {
        let active = self.known_atom(Atom::NetActiveWindow);

        match id {
            Some(id) => {
                self.conn.change_property32(
                    PropMode::REPLACE,
                    self.root,
                    active,
                    AtomEnum::WINDOW,
                    &[*id],
                )?;
            }
            None => {
                self.conn.delete_property(self.root, active)?;
            }
        }

        Ok(())
    }

    fn append_to_client_list(&self, id: Xid) -> Result<()> {
        self.conn.change_property32(
            PropMode::APPEND,
            self.root,
            self.known_atom(Atom::NetClientList),
            AtomEnum::WINDOW,
            &[*id],
        )?;

        Ok(())
    }

    fn set_client_list(&self, ids: &[Xid]) -> Result<()> {
        let raw: Vec<u32> = ids.iter().map(|id| **id).collect();
        self.conn.change_property32(
            PropMode::REPLACE,
            self.root,
            self.known_atom(Atom::NetClientList),
            AtomEnum::WINDOW,
            &raw,
        )?;

        Ok(())
    }

    fn set_fullscreen_state(&self, id: Xid, fullscreen: bool) -> Result<()> {
        let data: &[u32] = if fullscreen {
            &[self.known_atom(Atom::NetWmStateFullscreen)]
        } else {
            &[]
        };
        self.conn.change_property32(
            PropMode::REPLACE,
            *id,
            self.known_atom(Atom::NetWmState),
            AtomEnum::ATOM,
            data,
        )?;

        Ok(())
    }

    fn set_window_opacity(&self, id: Xid, opacity: f64) -> Result<()> {
        let value = (opacity.clamp(0.0, 1.0) * u32::MAX as f64) as u32;
        self.conn.change_property32(
            PropMode::REPLACE,
            *id,
            self.known_atom(Atom::NetWmWindowOpacity),
            AtomEnum::CARDINAL,
            &[value],
        )?;

        Ok(())
    }

    fn configure(&self, id: Xid, r: Rect, border_width: i32) -> Result<()> {
        let aux = ConfigureWindowAux::new()
            .x(r.x)
            .y(r.y)
            .width(r.w.max(1) as u32)
            .height(r.h.max(1) as u32)
            .border_width(border_width.max(0) as u32);
        self.conn.configure_window(*id, &aux)?;

        Ok(())
    }

    fn move_window(&self, id: Xid, x: i32, y: i32) -> Result<()> {
        let aux = ConfigureWindowAux::new().x(x).y(y);
        self.conn.configure_window(*id, &aux)?;

        Ok(())
    }

    fn set_border_width(&self, id: Xid, border_width: i32) -> Result<()> {
        let aux = ConfigureWindowAux::new().border_width(border_width.max(0) as u32);
        self.conn.configure_window(*id, &aux)?;

        Ok(())
    }

    fn set_border_color(&self, id: Xid, color: Color) -> Result<()> {
        let aux = ChangeWindowAttributesAux::new().border_pixel(color.rgb_u32());
        self.conn.change_window_attributes(*id, &aux)?;

        Ok(())
    }

    fn send_configure_notify(&self, id: Xid, r: Rect, border_width: i32) -> Result<()> {
        let event = ConfigureNotifyEvent {
            response_type: x11rb::protocol::xproto::CONFIGURE_NOTIFY_EVENT,
            sequence: 0,
            event: *id,
            window: *id,
            above_sibling: NONE,
            x: r.x as i16,
            y: r.y as i16,
            width: r.w.max(1) as u16,
            height: r.h.max(1) as u16,
            border_width: border_width.max(0) as u16,
            override_redirect: false,
        };
        self.conn
            .send_event(false, *id, EventMask::STRUCTURE_NOTIFY, event)?;

        Ok(())
    }

    fn configure_unmanaged(&self, ev: &ConfigureRequest) -> Result<()> {
        let aux = ConfigureWindowAux::new()
            .x(ev.x)
            .y(ev.y)
            .width(ev.w.map(|w| w.max(1) as u32))
            .height(ev.h.map(|h| h.max(1) as u32))
            .border_width(ev.border_width.map(|b| b.max(0) as u32))
            .sibling(ev.sibling.map(|s| *s))
            .stack_mode(ev.stack_mode.map(|m| StackMode::from(m as u8)));
        self.conn.configure_window(*ev.id, &aux)?;

        Ok(())
    }

    fn stack_below(&self, id: Xid, sibling: Xid) -> Result<()> {
        let aux = ConfigureWindowAux::new()
            .sibling(*sibling)
            .stack_mode(StackMode::BELOW);
        self.conn.configure_window(*id, &aux)?;

        Ok(())
    }

    fn raise(&self, id: Xid) -> Result<()> {
        let aux = ConfigureWindowAux::new().stack_mode(StackMode::ABOVE);
        self.conn.configure_window(*id, &aux)?;

        Ok(())
    }

    fn map(&self, id: Xid) -> Result<()> {
        self.conn.map_window(*id)?;

        Ok(())
    }

    fn select_client_events(&self, id: Xid) -> Result<()> {
        let aux = ChangeWindowAttributesAux::new().event_mask(client_event_mask());
        self.conn.change_window_attributes(*id, &aux)?;

        Ok(())
    }

    fn send_protocol_message(&self, id: Xid, proto: Atom) -> Result<()> {
        let event = ClientMessageEvent {
            response_type: CLIENT_MESSAGE_EVENT,
            format: WM_STATE_FORMAT,
            sequence: 0,
            window: *id,
            type_: self.known_atom(Atom::WmProtocols),
            data: [self.known_atom(proto), CURRENT_TIME, 0, 0, 0].into(),
        };
        self.conn
            .send_event(false, *id, EventMask::NO_EVENT, event)?;

        Ok(())
    }

    fn kill_client(&self, id: Xid) -> Result<()> {
        self.conn.kill_client(*id)?;

        Ok(())
    }

    fn set_input_focus(&self, id: Xid) -> Result<()> {
        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, *id, CURRENT_TIME)?;

        Ok(())
    }

    fn focus_root(&self) -> Result<()> {
        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, self.root, CURRENT_TIME)?;

        Ok(())
    }

    fn create_bar_window(&self, r: Rect) -> Result<Xid> {
        let id = self.conn.generate_id()?;
        let aux = CreateWindowAux::new()
            .override_redirect(1)
            .background_pixel(0)
            .event_mask(EventMask::BUTTON_PRESS | EventMask::EXPOSURE)
            .cursor(self.cursors[&CursorKind::Normal]);
        self.conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            id,
            self.root,
            r.x as i16,
            r.y as i16,
            r.w.max(1) as u16,
            r.h.max(1) as u16,
            0,
            WindowClass::INPUT_OUTPUT,
            x11rb::COPY_FROM_PARENT,
            &aux,
        )?;
        self.conn.map_window(id)?;
        self.raise(Xid(id))?;

        Ok(Xid(id))
    }

    fn destroy_window(&self, id: Xid) -> Result<()> {
        self.conn.destroy_window(*id)?;

        Ok(())
    }

    fn grab_keys(&self, keys: &[(ModMask, KeySym)]) -> Result<()> {
        self.conn.ungrab_key(
            x11rb::protocol::xproto::Grab::ANY,
            self.root,
            XModMask::ANY,
        )?;

        let keymap = self.keymap.borrow();
        for &(mods, sym) in keys {
            for code in keymap.keycodes_for(sym) {
                for extra in self.lock_combinations() {
                    self.conn.grab_key(
                        true,
                        self.root,
                        XModMask::from(mods.bits() | extra),
                        code,
                        GrabMode::ASYNC,
                        GrabMode::ASYNC,
                    )?;
                }
            }
        }

        Ok(())
    }

    fn ungrab_keys(&self) -> Result<()> {
        self.conn.ungrab_key(
            x11rb::protocol::xproto::Grab::ANY,
            self.root,
            XModMask::ANY,
        )?;

        Ok(())
    }

    fn grab_buttons(&self, id: Xid, buttons: &[(ModMask, u8)], any_button: bool) -> Result<()> {
        self.conn
            .ungrab_button(ButtonIndex::ANY, *id, XModMask::ANY)?;

        if any_button {
            self.conn.grab_button(
                false,
                *id,
                mouse_mask(),
                GrabMode::ASYNC,
                GrabMode::SYNC,
                NONE,
                NONE,
                ButtonIndex::ANY,
                XModMask::ANY,
            )?;

            return Ok(());
        }

        for &(mods, button) in buttons {
            for extra in self.lock_combinations() {
                self.conn.grab_button(
                    false,
                    *id,
                    mouse_mask(),
                    GrabMode::ASYNC,
                    GrabMode::SYNC,
                    NONE,
                    NONE,
                    ButtonIndex::from(button),
                    XModMask::from(mods.bits() | extra),
                )?;
            }
        }

        Ok(())
    }

    fn ungrab_buttons(&self, id: Xid) -> Result<()> {
        self.conn
            .ungrab_button(ButtonIndex::ANY, *id, XModMask::ANY)?;

        Ok(())
    }

    fn grab_pointer(&self, cursor: CursorKind) -> Result<bool> {
        let reply = self
            .conn
            .grab_pointer(
                false,
                self.root,
                mouse_mask(),
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                NONE,
                self.cursors[&cursor],
                CURRENT_TIME,
            )?
            .reply()?;

        Ok(reply.status == GrabStatus::SUCCESS)
    }

    fn ungrab_pointer(&self) -> Result<()> {
        self.conn.ungrab_pointer(CURRENT_TIME)?;

        Ok(())
    }

    fn grab_server(&self) -> Result<()> {
        self.conn.grab_server()?;

        Ok(())
    }

    fn ungrab_server(&self) -> Result<()> {
        self.conn.ungrab_server()?;
        self.conn.sync()?;

        Ok(())
    }

    fn query_pointer(&self) -> Result<Point> {
        let reply = self.conn.query_pointer(self.root)?.reply()?;

        Ok(Point::new(reply.root_x as i32, reply.root_y as i32))
    }

    fn warp_pointer(&self, id: Xid, x: i32, y: i32) -> Result<()> {
        self.conn
            .warp_pointer(NONE, *id, 0, 0, 0, 0, x as i16, y as i16)?;

        Ok(())
    }

    fn numlock_mask(&self) -> Result<ModMask> {
        let reply = self.conn.get_modifier_mapping()?.reply()?;
        let per = reply.keycodes_per_modifier() as usize;
        let keymap = self.keymap.borrow();

        for (i, code) in reply.keycodes.iter().enumerate() {
            if *code != 0 && keymap.keysym_for(*code) == Some(XK_Num_Lock) {
                let mask = ModMask::from_bits_truncate(1 << (i / per.max(1)) as u16);
                self.numlock.set(mask.bits());

                return Ok(mask);
            }
        }

        self.numlock.set(0);

        Ok(ModMask::empty())
    }

    fn refresh_keyboard_mapping(&self) -> Result<()> {
        self.load_keymap()
    }
}
