//! The per-monitor client model: tagsets, layouts, lists and the bar.
use crate::{config::Config, core::Xid, geometry::Rect};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Remembered per-view settings, keyed by the 1-based index of the lowest
/// tag shown in the view. Index 0 is the "all tags" pseudo-view.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Pertag {
    /// The view currently in effect
    pub curtag: usize,
    /// The previously selected view
    pub prevtag: usize,
    /// Master counts per view
    pub nmasters: Vec<u32>,
    /// Master factors per view
    pub mfacts: Vec<f32>,
    /// Selected layout slot per view
    pub sellts: Vec<usize>,
    /// Layout pair (current, previous) per view, as layout table indices
    pub ltidxs: Vec<[usize; 2]>,
    /// Bar visibility per view
    pub showbars: Vec<bool>,
}

impl Pertag {
    fn new(config: &Config) -> Self {
        let n = config.tags.len() + 1;
        let first = config.tags.first().map(|t| t.layout).unwrap_or(0);
        let default_lts: Vec<[usize; 2]> = std::iter::once([first, first])
            .chain(config.tags.iter().map(|t| [t.layout, t.layout]))
            .collect();

        Self {
            curtag: 1,
            prevtag: 1,
            nmasters: vec![config.nmaster; n],
            mfacts: vec![config.mfact; n],
            sellts: vec![0; n],
            ltidxs: default_lts,
            showbars: vec![config.show_bar; n],
        }
    }

    /// The pertag index for a tag mask: 0 for the all-tags view, otherwise
    /// the 1-based index of the lowest set bit.
    pub fn index_for(mask: u32, n_tags: usize) -> usize {
        if mask == 0 || mask == (1 << n_tags) - 1 {
            0
        } else {
            mask.trailing_zeros() as usize + 1
        }
    }
}

/// A display region with its own client lists, tagset pair, layout pair
/// and bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Monitor {
    /// Index of this monitor in the monitor list
    pub num: usize,
    /// The layout symbol currently shown in the bar
    pub ltsymbol: String,
    /// Master area factor
    pub mfact: f32,
    /// Number of clients in the master area
    pub nmaster: u32,
    /// Outer geometry of the monitor
    pub mon_r: Rect,
    /// Work area: outer geometry minus the bar
    pub win_r: Rect,
    /// Selected slot of the tagset pair
    pub seltags: usize,
    /// Selected slot of the layout pair
    pub sellt: usize,
    /// Current and previous displayed tag masks
    pub tagset: [u32; 2],
    /// Whether the bar is shown on the current view
    pub showbar: bool,
    /// Whether the bar sits at the top of the monitor
    pub topbar: bool,
    /// Creation-ordered list of owned clients (newest first)
    pub clients: Vec<Xid>,
    /// Focus-history ordering of the same clients (most recent first)
    pub stack: Vec<Xid>,
    /// The selected client, if any
    pub sel: Option<Xid>,
    /// The bar window for this monitor
    pub barwin: Xid,
    /// The bar's y position
    pub by: i32,
    /// Current and previous layouts, as layout table indices
    pub lt: [usize; 2],
    /// Per-view remembered settings
    pub pertag: Pertag,
}

impl Monitor {
    /// A new monitor seeded from the configured defaults.
    pub fn new(num: usize, config: &Config) -> Self {
        let layout = config.tags.first().map(|t| t.layout).unwrap_or(0);
        let symbol = config
            .layouts
            .get(layout)
            .map(|l| l.symbol)
            .unwrap_or_default();

        Self {
            num,
            ltsymbol: symbol.to_owned(),
            mfact: config.mfact,
            nmaster: config.nmaster,
            mon_r: Rect::default(),
            win_r: Rect::default(),
            seltags: 0,
            sellt: 0,
            tagset: [1, 1],
            showbar: config.show_bar,
            topbar: config.top_bar,
            clients: Vec::new(),
            stack: Vec::new(),
            sel: None,
            barwin: Xid(0),
            by: 0,
            lt: [layout, layout],
            pertag: Pertag::new(config),
        }
    }

    /// The currently displayed tag mask.
    pub fn tagmask(&self) -> u32 {
        self.tagset[self.seltags]
    }

    /// Attach a client at the head of the creation-ordered list.
    pub fn attach(&mut self, id: Xid) {
        self.clients.insert(0, id);
    }

    /// Attach a client at the head of the focus history.
    pub fn attach_stack(&mut self, id: Xid) {
        self.stack.insert(0, id);
    }

    /// Detach a client from the creation-ordered list.
    pub fn detach(&mut self, id: Xid) {
        self.clients.retain(|&c| c != id);
    }

    /// Detach a client from the focus history.
    pub fn detach_stack(&mut self, id: Xid) {
        self.stack.retain(|&c| c != id);
        if self.sel == Some(id) {
            self.sel = None;
        }
    }

    /// Recompute the work area and bar position for the current outer
    /// geometry and bar visibility.
    pub fn update_bar_pos(&mut self, bar_h: i32) {
        self.win_r = self.mon_r;

        if self.showbar {
            self.win_r.h -= bar_h;
            if self.topbar {
                self.by = self.win_r.y;
                self.win_r.y += bar_h;
            } else {
                self.by = self.win_r.bottom();
            }
        } else {
            self.by = -bar_h;
        }
    }

    /// Reload the remembered settings for the current pertag view into the
    /// monitor after a tagset switch. The caller maintains
    /// `pertag.curtag` / `pertag.prevtag` before calling.
    pub fn apply_pertag(&mut self) {
        let i = self.pertag.curtag;

        self.nmaster = self.pertag.nmasters[i];
        self.mfact = self.pertag.mfacts[i];
        self.sellt = self.pertag.sellts[i];
        self.lt = self.pertag.ltidxs[i];
        self.showbar = self.pertag.showbars[i];
    }
}
