//! View-filter store: the parameters driving the book list query

use tokio::sync::watch;

use crate::{
    models::{Availability, SortOption},
    StateReset,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewFilters {
    /// Author substring query
    pub author: String,
    pub availability: Availability,
    /// Always >= 1
    pub page: u32,
    pub sort: SortOption,
}

impl Default for ViewFilters {
    fn default() -> Self {
        Self {
            author: String::new(),
            availability: Availability::All,
            page: 1,
            sort: SortOption::Newest,
        }
    }
}

/// Holds the current [`ViewFilters`] and notifies watchers on change.
///
/// Changing the author or availability filter moves back to page 1: the new
/// result set may have fewer pages than the old position.
pub struct FilterStore {
    state: watch::Sender<ViewFilters>,
}

impl Default for FilterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ViewFilters::default());
        Self { state }
    }

    pub fn snapshot(&self) -> ViewFilters {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewFilters> {
        self.state.subscribe()
    }

    pub fn set_author(&self, author: impl Into<String>) {
        let author = author.into();
        self.state.send_modify(|filters| {
            filters.author = author;
            filters.page = 1;
        });
    }

    pub fn clear_author(&self) {
        self.set_author(String::new());
    }

    pub fn set_availability(&self, availability: Availability) {
        self.state.send_modify(|filters| {
            filters.availability = availability;
            filters.page = 1;
        });
    }

    pub fn set_page(&self, page: u32) {
        self.state.send_modify(|filters| filters.page = page.max(1));
    }

    pub fn set_sort(&self, sort: SortOption) {
        self.state.send_modify(|filters| filters.sort = sort);
    }
}

impl StateReset for FilterStore {
    fn reset(&self) {
        self.state.send_replace(ViewFilters::default());
    }
}
