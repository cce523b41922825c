//! The compile-time configuration contract consumed by the engine.
//!
//! Everything here is data: color schemes, the tag table with default
//! layouts, the rule table for auto-tagging, behavioral flags and the
//! default key / button binding tables. None of it is mutable at runtime.
use crate::{
    core::{
        actions,
        bindings::{ButtonBinding, ClickTarget, KeyBinding, ModMask},
    },
    draw::ColorScheme,
    layout::{self, Layout},
    util,
    x::{keysym::*, XConn},
};

/// The modifier used by the default bindings (Mod4 / super).
pub const MODKEY: ModMask = ModMask::MOD4;

/// Color scheme index for unselected elements.
pub const SCHEME_NORM: usize = 0;
/// Color scheme index for the selected tag / client.
pub const SCHEME_SEL: usize = 1;
/// Color scheme index for tags holding an urgent client.
pub const SCHEME_URGENT: usize = 2;

/// The command launched by the default `MOD+p` binding.
pub const DMENU_CMD: &[&str] = &["dmenu_run"];
/// The terminal launched by the default `MOD+Shift+Return` binding.
pub const TERM_CMD: &[&str] = &["st"];

/// A tag definition: its bar label and the layout the tag starts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagDef {
    /// The label drawn in the bar
    pub name: &'static str,
    /// Index into the layout table used when this tag is first viewed
    pub layout: usize,
}

/// An auto-tagging rule applied to newly managed windows.
///
/// Each present pattern must be a substring of the corresponding window
/// attribute for the rule to match; all matching rules apply additively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rule {
    /// Substring matched against the WM_CLASS class field
    pub class: Option<&'static str>,
    /// Substring matched against the WM_CLASS instance field
    pub instance: Option<&'static str>,
    /// Substring matched against the window title
    pub title: Option<&'static str>,
    /// Substring matched against WM_WINDOW_ROLE
    pub role: Option<&'static str>,
    /// Tag bits OR'd into the client
    pub tags: u32,
    /// Center the client when floating
    pub is_centered: bool,
    /// Make the client floating
    pub is_floating: bool,
    /// Move the client to this monitor if it exists
    pub monitor: Option<usize>,
}

impl Rule {
    /// Whether every present pattern is a substring of the corresponding
    /// attribute.
    pub fn matches(&self, class: &str, instance: &str, title: &str, role: &str) -> bool {
        let sub = |pat: Option<&str>, s: &str| pat.map(|p| s.contains(p)).unwrap_or(true);

        sub(self.class, class)
            && sub(self.instance, instance)
            && sub(self.title, title)
            && sub(self.role, role)
    }
}

const DEFAULT_TAGS: [TagDef; 9] = [
    TagDef { name: "1", layout: 0 },
    TagDef { name: "2", layout: 0 },
    TagDef { name: "3", layout: 0 },
    TagDef { name: "4", layout: 0 },
    TagDef { name: "5", layout: 0 },
    TagDef { name: "6", layout: 0 },
    TagDef { name: "7", layout: 0 },
    TagDef { name: "8", layout: 0 },
    TagDef { name: "9", layout: 0 },
];

// Tag masks are u32 bitsets with the top bit reserved
const _: () = assert!(DEFAULT_TAGS.len() <= 31);

/// The static configuration consumed by the engine.
#[derive(Debug, Clone)]
pub struct Config {
    /// Xft-style font pattern handed to the draw backend
    pub font: &'static str,
    /// Color schemes; indices 0..=2 are norm/sel/urgent, the rest are
    /// reachable through status text color escapes
    pub colors: Vec<ColorScheme>,
    /// Border width for managed clients, in pixels
    pub border_px: i32,
    /// Edge snap distance for interactive moves, in pixels
    pub snap: i32,
    /// Whether bars start visible
    pub show_bar: bool,
    /// Bar at the top (bottom otherwise)
    pub top_bar: bool,
    /// Bar height override; 0 derives it from the font
    pub bar_height: i32,
    /// Honour client size hints in tiled layouts
    pub resize_hints: bool,
    /// Auto-center dialog windows
    pub center_dialogs: bool,
    /// Window opacity applied to all managed clients and bars, in [0, 1];
    /// 1.0 disables the opacity property entirely
    pub default_opacity: f64,
    /// Default master area factor
    pub mfact: f32,
    /// Default master count
    pub nmaster: u32,
    /// The tag table
    pub tags: Vec<TagDef>,
    /// The layout table; index 0 is the default layout
    pub layouts: Vec<Layout>,
    /// The auto-tagging rule table
    pub rules: Vec<Rule>,
}

impl Default for Config {
    fn default() -> Self {
        let scheme = |raw: &[&str; 3]| ColorScheme::try_from_strs(raw).expect("valid hex code");

        Config {
            font: "monospace:size=10",
            colors: vec![
                scheme(&["#444444", "#bbbbbb", "#222222"]), // norm
                scheme(&["#005577", "#eeeeee", "#005577"]), // sel
                scheme(&["#ff0000", "#222222", "#bbbbbb"]), // urgent
                scheme(&["#444444", "#77bb77", "#222222"]),
                scheme(&["#444444", "#bb7777", "#222222"]),
            ],
            border_px: 1,
            snap: 32,
            show_bar: true,
            top_bar: true,
            bar_height: 0,
            resize_hints: false,
            center_dialogs: true,
            default_opacity: 1.0,
            mfact: 0.55,
            nmaster: 1,
            tags: DEFAULT_TAGS.to_vec(),
            layouts: vec![
                Layout {
                    symbol: "[]=",
                    arrange: Some(layout::tile),
                },
                Layout {
                    symbol: "><>",
                    arrange: None,
                },
                Layout {
                    symbol: "[M]",
                    arrange: Some(layout::monocle),
                },
                Layout {
                    symbol: "TTT",
                    arrange: Some(layout::bstack),
                },
                Layout {
                    symbol: "===",
                    arrange: Some(layout::bstackhoriz),
                },
                Layout {
                    symbol: "###",
                    arrange: Some(layout::gaplessgrid),
                },
            ],
            rules: vec![Rule {
                class: Some("Gimp"),
                is_floating: true,
                ..Rule::default()
            }],
        }
    }
}

impl Config {
    /// The bitmask covering every configured tag.
    pub fn tagmask(&self) -> u32 {
        (1 << self.tags.len()) - 1
    }
}

/// The default key binding table.
pub fn default_keys<X: XConn + 'static>() -> Vec<KeyBinding<X>> {
    let m = MODKEY;
    let ms = MODKEY | ModMask::SHIFT;
    let mc = MODKEY | ModMask::CONTROL;
    let mcs = MODKEY | ModMask::CONTROL | ModMask::SHIFT;

    let mut keys: Vec<KeyBinding<X>> = vec![
        bind(m, XK_p, |_, _| util::spawn(DMENU_CMD)),
        bind(ms, XK_Return, |_, _| util::spawn(TERM_CMD)),
        bind(m, XK_b, actions::toggle_bar),
        bind(m, XK_j, |s, x| actions::focus_stack(s, x, 1)),
        bind(m, XK_k, |s, x| actions::focus_stack(s, x, -1)),
        bind(m, XK_i, |s, x| actions::inc_nmaster(s, x, 1)),
        bind(m, XK_d, |s, x| actions::inc_nmaster(s, x, -1)),
        bind(m, XK_h, |s, x| actions::set_mfact(s, x, -0.05)),
        bind(m, XK_l, |s, x| actions::set_mfact(s, x, 0.05)),
        bind(m, XK_Return, actions::zoom),
        bind(m, XK_Tab, |s, x| actions::view(s, x, 0)),
        bind(ms, XK_c, actions::kill_client),
        bind(m, XK_t, |s, x| actions::set_layout(s, x, Some(0))),
        bind(m, XK_f, |s, x| actions::set_layout(s, x, Some(1))),
        bind(m, XK_m, |s, x| actions::set_layout(s, x, Some(2))),
        bind(m, XK_u, |s, x| actions::set_layout(s, x, Some(3))),
        bind(m, XK_o, |s, x| actions::set_layout(s, x, Some(4))),
        bind(m, XK_g, |s, x| actions::set_layout(s, x, Some(5))),
        bind(m, XK_space, |s, x| actions::set_layout(s, x, None)),
        bind(ms, XK_space, actions::toggle_floating),
        bind(m, XK_n, actions::name_tag),
        bind(m, XK_0, |s, x| {
            let mask = s.config.tagmask();
            actions::view(s, x, mask)
        }),
        bind(ms, XK_0, |s, x| {
            let mask = s.config.tagmask();
            actions::tag(s, x, mask)
        }),
        bind(m, XK_comma, |s, x| actions::focus_mon(s, x, -1)),
        bind(m, XK_period, |s, x| actions::focus_mon(s, x, 1)),
        bind(ms, XK_comma, |s, x| actions::tag_mon(s, x, -1)),
        bind(ms, XK_period, |s, x| actions::tag_mon(s, x, 1)),
        bind(ms, XK_q, actions::quit),
        bind(mcs, XK_q, actions::restart),
    ];

    let tag_keys = [XK_1, XK_2, XK_3, XK_4, XK_5, XK_6, XK_7, XK_8, XK_9];
    for (i, &sym) in tag_keys.iter().enumerate() {
        let bit = 1 << i;
        keys.push(bind(m, sym, move |s, x| actions::view(s, x, bit)));
        keys.push(bind(mc, sym, move |s, x| actions::toggle_view(s, x, bit)));
        keys.push(bind(ms, sym, move |s, x| actions::tag(s, x, bit)));
        keys.push(bind(mcs, sym, move |s, x| actions::toggle_tag(s, x, bit)));
    }

    keys
}

/// The default mouse binding table.
pub fn default_buttons<X: XConn + 'static>() -> Vec<ButtonBinding<X>> {
    use ClickTarget::*;

    vec![
        button(LayoutSymbol, ModMask::empty(), 1, |s, x, _| {
            actions::set_layout(s, x, None)
        }),
        button(LayoutSymbol, ModMask::empty(), 3, |s, x, _| {
            actions::set_layout(s, x, Some(2))
        }),
        button(WinTitle, ModMask::empty(), 2, |s, x, _| actions::zoom(s, x)),
        button(StatusText, ModMask::empty(), 2, |_, _, _| util::spawn(TERM_CMD)),
        button(ClientWin, MODKEY, 1, |s, x, _| actions::move_mouse(s, x)),
        button(ClientWin, MODKEY, 2, |s, x, _| actions::toggle_floating(s, x)),
        button(ClientWin, MODKEY, 3, |s, x, _| actions::resize_mouse(s, x)),
        button(TagBar, ModMask::empty(), 1, |s, x, info| {
            match info.tag_index {
                Some(i) => actions::view(s, x, 1 << i),
                None => Ok(()),
            }
        }),
        button(TagBar, ModMask::empty(), 3, |s, x, info| {
            match info.tag_index {
                Some(i) => actions::toggle_view(s, x, 1 << i),
                None => Ok(()),
            }
        }),
        button(TagBar, MODKEY, 1, |s, x, info| match info.tag_index {
            Some(i) => actions::tag(s, x, 1 << i),
            None => Ok(()),
        }),
        button(TagBar, MODKEY, 3, |s, x, info| match info.tag_index {
            Some(i) => actions::toggle_tag(s, x, 1 << i),
            None => Ok(()),
        }),
    ]
}

fn bind<X, F>(mods: ModMask, keysym: u32, f: F) -> KeyBinding<X>
where
    X: XConn,
    F: FnMut(&mut crate::core::State, &X) -> crate::Result<()> + 'static,
{
    KeyBinding {
        mods,
        keysym,
        action: Box::new(f),
    }
}

fn button<X, F>(target: ClickTarget, mods: ModMask, btn: u8, f: F) -> ButtonBinding<X>
where
    X: XConn,
    F: FnMut(
            &mut crate::core::State,
            &X,
            &crate::core::bindings::ClickInfo,
        ) -> crate::Result<()>
        + 'static,
{
    ButtonBinding {
        target,
        mods,
        button: btn,
        action: Box::new(f),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    #[test_case(
        Rule { class: Some("Firefox"), ..Rule::default() },
        ("Firefox", "Navigator", "", ""),
        true;
        "class match"
    )]
    #[test_case(
        Rule { class: Some("fox"), ..Rule::default() },
        ("Firefox", "", "", ""),
        true;
        "substring match"
    )]
    #[test_case(
        Rule { class: Some("Firefox"), role: Some("pop"), ..Rule::default() },
        ("Firefox", "", "", "browser"),
        false;
        "all present patterns must match"
    )]
    #[test_case(
        Rule::default(),
        ("anything", "at", "all", ""),
        true;
        "empty rule matches everything"
    )]
    #[test]
    fn rule_matching(rule: Rule, attrs: (&str, &str, &str, &str), expected: bool) {
        let (class, instance, title, role) = attrs;

        assert_eq!(rule.matches(class, instance, title, role), expected);
    }

    #[test]
    fn default_config_has_the_norm_sel_urgent_schemes() {
        let c = Config::default();

        assert!(c.colors.len() > SCHEME_URGENT);
    }

    #[test]
    fn tagmask_covers_all_tags() {
        let c = Config::default();

        assert_eq!(c.tagmask(), 0b1_1111_1111);
    }
}
