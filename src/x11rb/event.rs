//! Conversion from raw x11rb events into [XEvent]s, and the benign X
//! error whitelist.
use crate::{
    core::{bindings::ModMask, Xid},
    geometry::{Point, Rect},
    x::{
        event::{
            ButtonEvent, ClientMessage, ConfigureEvent, ConfigureRequest, EnterEvent, ExposeEvent,
            KeyPressEvent, MotionEvent, PropertyEvent,
        },
        XEvent,
    },
    x11rb::X11rbConnection,
};
use tracing::{error, trace};
use x11rb::protocol::{
    xproto::{
        ConfigWindow, Mapping, NotifyDetail, NotifyMode, Property, CONFIGURE_WINDOW_REQUEST,
        COPY_AREA_REQUEST, GRAB_BUTTON_REQUEST, GRAB_KEY_REQUEST, IMAGE_TEXT8_REQUEST,
        POLY_FILL_RECTANGLE_REQUEST, POLY_SEGMENT_REQUEST, POLY_TEXT8_REQUEST,
        SET_INPUT_FOCUS_REQUEST,
    },
    ErrorKind, Event,
};

const SEND_EVENT_MASK: u8 = 0x80;

/// X errors that races with misbehaving or dying clients produce in
/// normal operation: these are dropped, everything else is reported.
fn is_benign(kind: ErrorKind, major_opcode: u8) -> bool {
    match kind {
        ErrorKind::Window => true,
        ErrorKind::Match => {
            [SET_INPUT_FOCUS_REQUEST, CONFIGURE_WINDOW_REQUEST].contains(&major_opcode)
        }
        ErrorKind::Drawable => [
            POLY_TEXT8_REQUEST,
            POLY_FILL_RECTANGLE_REQUEST,
            POLY_SEGMENT_REQUEST,
            COPY_AREA_REQUEST,
            IMAGE_TEXT8_REQUEST,
        ]
        .contains(&major_opcode),
        ErrorKind::Access => [GRAB_BUTTON_REQUEST, GRAB_KEY_REQUEST].contains(&major_opcode),
        _ => false,
    }
}

impl X11rbConnection {
    /// Convert one wire event. Returns None for event types the engine
    /// has no handler for and for whitelisted errors.
    pub(super) fn convert_event(&self, raw: Event) -> Option<XEvent> {
        let root = self.root_win();

        match raw {
            Event::Error(e) => {
                if is_benign(e.error_kind, e.major_opcode) {
                    trace!(kind = ?e.error_kind, opcode = e.major_opcode, "ignoring benign X error");
                } else {
                    error!(
                        kind = ?e.error_kind,
                        opcode = e.major_opcode,
                        bad_value = e.bad_value,
                        "X error"
                    );
                }

                None
            }

            Event::ButtonPress(e) => Some(XEvent::ButtonPress(ButtonEvent {
                id: Xid(e.event),
                button: e.detail,
                mask: ModMask::from_bits_truncate(u16::from(e.state)),
                pos: Point::new(e.event_x as i32, e.event_y as i32),
                root_pos: Point::new(e.root_x as i32, e.root_y as i32),
            })),

            Event::ButtonRelease(e) => Some(XEvent::ButtonRelease(ButtonEvent {
                id: Xid(e.event),
                button: e.detail,
                mask: ModMask::from_bits_truncate(u16::from(e.state)),
                pos: Point::new(e.event_x as i32, e.event_y as i32),
                root_pos: Point::new(e.root_x as i32, e.root_y as i32),
            })),

            Event::ClientMessage(e) => {
                if e.format != 32 {
                    return None; // malformed for the messages we understand
                }
                let dtype = self.name_of_atom(e.type_).ok()?;

                Some(XEvent::ClientMessage(ClientMessage {
                    id: Xid(e.window),
                    dtype,
                    data: e.data.as_data32(),
                }))
            }

            Event::ConfigureNotify(e) => {
                let is_root = e.window == root;
                if is_root {
                    self.set_screen_extent(e.width as i32, e.height as i32);
                }

                Some(XEvent::ConfigureNotify(ConfigureEvent {
                    id: Xid(e.window),
                    r: Rect::new(e.x as i32, e.y as i32, e.width as i32, e.height as i32),
                    is_root,
                }))
            }

            Event::ConfigureRequest(e) => {
                let has = |bit| u16::from(e.value_mask) & u16::from(bit) != 0;

                Some(XEvent::ConfigureRequest(ConfigureRequest {
                    id: Xid(e.window),
                    x: has(ConfigWindow::X).then_some(e.x as i32),
                    y: has(ConfigWindow::Y).then_some(e.y as i32),
                    w: has(ConfigWindow::WIDTH).then_some(e.width as i32),
                    h: has(ConfigWindow::HEIGHT).then_some(e.height as i32),
                    border_width: has(ConfigWindow::BORDER_WIDTH)
                        .then_some(e.border_width as i32),
                    sibling: has(ConfigWindow::SIBLING).then_some(Xid(e.sibling)),
                    stack_mode: has(ConfigWindow::STACK_MODE)
                        .then_some(u32::from(e.stack_mode)),
                }))
            }

            Event::DestroyNotify(e) => Some(XEvent::DestroyNotify(Xid(e.window))),

            Event::EnterNotify(e) => Some(XEvent::Enter(EnterEvent {
                id: Xid(e.event),
                is_root: e.event == root,
                normal: e.mode == NotifyMode::NORMAL,
                inferior: e.detail == NotifyDetail::INFERIOR,
            })),

            Event::Expose(e) => Some(XEvent::Expose(ExposeEvent {
                id: Xid(e.window),
                count: e.count,
            })),

            Event::FocusIn(e) => Some(XEvent::FocusIn(Xid(e.event))),

            Event::KeyPress(e) => {
                let keysym = self.keymap_ref().borrow().keysym_for(e.detail)?;

                Some(XEvent::KeyPress(KeyPressEvent {
                    keysym,
                    mask: ModMask::from_bits_truncate(u16::from(e.state)),
                }))
            }

            Event::MappingNotify(e) => Some(XEvent::MappingNotify {
                keyboard: e.request == Mapping::KEYBOARD,
            }),

            Event::MapRequest(e) => Some(XEvent::MapRequest(Xid(e.window))),

            Event::MotionNotify(e) => Some(XEvent::MotionNotify(MotionEvent {
                id: Xid(e.event),
                is_root: e.event == root,
                root_pos: Point::new(e.root_x as i32, e.root_y as i32),
                time: e.time,
            })),

            Event::PropertyNotify(e) => {
                let atom = self.name_of_atom(e.atom).ok()?;

                Some(XEvent::PropertyNotify(PropertyEvent {
                    id: Xid(e.window),
                    atom,
                    is_root: e.window == root,
                    deleted: e.state == Property::DELETE,
                }))
            }

            Event::ResizeRequest(e) => Some(XEvent::ResizeRequest(Xid(e.window))),

            Event::UnmapNotify(e) => Some(XEvent::UnmapNotify {
                id: Xid(e.window),
                send_event: e.response_type & SEND_EVENT_MASK != 0,
            }),

            _ => None,
        }
    }
}
