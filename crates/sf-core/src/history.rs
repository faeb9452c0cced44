//! Page vs. popup navigation state.
//!
//! The browser history stack always reflects exactly one of "on the page" or
//! "looking at the popup for URL X". Every transition returns the effects the
//! DOM layer must apply, in order.

use crate::routing::PopupRoute;
use sf_api_types::HistoryState;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavState {
    Page,
    Popup { url: String, title: Option<String> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavEffect {
    PushState(HistoryState),
    SetTitle(String),
    HideAllPopups,
    ClearScrollLock,
    /// Re-run the opener for `route` without pushing history.
    Reopen { route: PopupRoute, url: String },
}

/// How a URL popup is shown given what is already mounted for that URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MountPlan {
    /// Nothing mounted: build a container and fetch.
    Fetch,
    /// A cached container exists: show it again without a request.
    Reuse,
    /// A stale non-cacheable container exists: unmount it, then fetch.
    Replace,
}

impl MountPlan {
    pub fn decide(already_mounted: bool, cacheable: bool) -> Self {
        match (already_mounted, cacheable) {
            (false, _) => Self::Fetch,
            (true, true) => Self::Reuse,
            (true, false) => Self::Replace,
        }
    }

    pub fn fetches(self) -> bool {
        !matches!(self, Self::Reuse)
    }
}

#[derive(Clone, Debug)]
pub struct HistoryMachine {
    initial_url: String,
    initial_title: String,
    state: NavState,
}

impl HistoryMachine {
    pub fn new(initial_url: impl Into<String>, initial_title: impl Into<String>) -> Self {
        Self {
            initial_url: initial_url.into(),
            initial_title: initial_title.into(),
            state: NavState::Page,
        }
    }

    pub fn state(&self) -> &NavState {
        &self.state
    }

    pub fn initial_url(&self) -> &str {
        &self.initial_url
    }

    pub fn initial_title(&self) -> &str {
        &self.initial_title
    }

    pub fn is_popup_open(&self) -> bool {
        matches!(self.state, NavState::Popup { .. })
    }

    pub fn open_popup(&mut self, url: &str, title: Option<&str>, push: bool) -> Vec<NavEffect> {
        debug!(url, push, "history: open popup");
        self.state = NavState::Popup {
            url: url.to_owned(),
            title: title.map(str::to_owned),
        };
        if !push {
            return Vec::new();
        }
        let mut effects = vec![NavEffect::PushState(HistoryState::Popup {
            url: url.to_owned(),
            title: title.map(str::to_owned),
        })];
        if let Some(title) = title.filter(|t| !t.is_empty()) {
            effects.push(NavEffect::SetTitle(title.to_owned()));
        }
        effects
    }

    pub fn close_popup(&mut self, push: bool) -> Vec<NavEffect> {
        let was_open = self.is_popup_open();
        self.state = NavState::Page;
        let mut effects = vec![NavEffect::ClearScrollLock];
        if push && was_open {
            effects.push(NavEffect::PushState(HistoryState::Page {
                url: self.initial_url.clone(),
                title: Some(self.initial_title.clone()),
            }));
            effects.push(NavEffect::SetTitle(self.initial_title.clone()));
        }
        effects
    }

    /// Back/forward navigation. `classify` maps a stored URL to its popup route.
    pub fn navigate<F>(&mut self, entry: Option<HistoryState>, classify: F) -> Vec<NavEffect>
    where
        F: Fn(&str) -> Option<PopupRoute>,
    {
        let reopen = match &entry {
            Some(HistoryState::Popup { url, .. }) => classify(url)
                .filter(PopupRoute::restorable)
                .map(|route| (route, url.clone())),
            _ => None,
        };

        match reopen {
            Some((route, url)) => {
                debug!(%url, ?route, "history: restoring popup");
                let title = entry.as_ref().and_then(|e| e.title().map(str::to_owned));
                self.state = NavState::Popup {
                    url: url.clone(),
                    title,
                };
                vec![NavEffect::Reopen { route, url }]
            }
            None => {
                self.state = NavState::Page;
                let title = entry
                    .as_ref()
                    .filter(|e| !e.is_popup())
                    .and_then(|e| e.title().map(str::to_owned))
                    .unwrap_or_else(|| self.initial_title.clone());
                vec![
                    NavEffect::HideAllPopups,
                    NavEffect::ClearScrollLock,
                    NavEffect::SetTitle(title),
                ]
            }
        }
    }
}
