use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::catalog::ShowPreview;
use crate::search::{search_shows, Similarity};

pub const ITEMS_PER_PAGE: usize = 15;
pub const FEATURED_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    TitleAsc,
    TitleDesc,
    UpdatedAsc,
    #[default]
    UpdatedDesc,
}

impl SortOrder {
    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::TitleAsc => "Title A-Z",
            SortOrder::TitleDesc => "Title Z-A",
            SortOrder::UpdatedAsc => "Oldest First",
            SortOrder::UpdatedDesc => "Recently Updated",
        }
    }

    fn compare(&self, a: &ShowPreview, b: &ShowPreview) -> Ordering {
        match self {
            SortOrder::TitleAsc => compare_titles(&a.title, &b.title),
            SortOrder::TitleDesc => compare_titles(&b.title, &a.title),
            SortOrder::UpdatedAsc => a.updated.cmp(&b.updated),
            SortOrder::UpdatedDesc => b.updated.cmp(&a.updated),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "a-z" => Ok(SortOrder::TitleAsc),
            "z-a" => Ok(SortOrder::TitleDesc),
            "date-asc" => Ok(SortOrder::UpdatedAsc),
            "date-desc" => Ok(SortOrder::UpdatedDesc),
            other => Err(format!(
                "unknown sort '{}' (expected a-z, z-a, date-asc or date-desc)",
                other
            )),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            SortOrder::TitleAsc => "a-z",
            SortOrder::TitleDesc => "z-a",
            SortOrder::UpdatedAsc => "date-asc",
            SortOrder::UpdatedDesc => "date-desc",
        };
        f.write_str(key)
    }
}

fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Selected genre codes. An empty selection means "All".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenreSelection {
    selected: Vec<u32>,
}

impl GenreSelection {
    pub fn toggle(&mut self, code: u32) {
        if let Some(pos) = self.selected.iter().position(|&g| g == code) {
            self.selected.remove(pos);
        } else {
            self.selected.push(code);
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn is_all(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, code: u32) -> bool {
        self.selected.contains(&code)
    }

    pub fn selected(&self) -> &[u32] {
        &self.selected
    }

    pub fn matches(&self, show: &ShowPreview) -> bool {
        self.is_all() || show.genres.iter().any(|g| self.selected.contains(g))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page(usize),
    Ellipsis,
}

/// Page numbers to offer around `current`, 1-based.
pub fn page_window(current: usize, total: usize) -> Vec<PageLink> {
    if total <= 1 {
        return Vec::new();
    }

    let mut pages = vec![PageLink::Page(1)];
    if current > 3 {
        pages.push(PageLink::Ellipsis);
    }

    let start = current.saturating_sub(1).max(2);
    let end = (current + 1).min(total - 1);
    for page in start..=end {
        if !pages.contains(&PageLink::Page(page)) {
            pages.push(PageLink::Page(page));
        }
    }

    if current + 2 < total {
        pages.push(PageLink::Ellipsis);
    }
    if !pages.contains(&PageLink::Page(total)) {
        pages.push(PageLink::Page(total));
    }

    pages
}

#[derive(Debug)]
pub struct BrowsePage<'a> {
    pub items: Vec<&'a ShowPreview>,
    pub total_matches: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

impl BrowsePage<'_> {
    pub fn is_empty(&self) -> bool {
        self.total_matches == 0
    }

    pub fn window(&self) -> Vec<PageLink> {
        page_window(self.current_page, self.total_pages)
    }
}

/// Search, filter, sort and page state of the show listing.
#[derive(Debug, Clone)]
pub struct BrowseState {
    search: String,
    genres: GenreSelection,
    sort: SortOrder,
    page: usize,
    page_size: usize,
}

impl Default for BrowseState {
    fn default() -> Self {
        Self::with_page_size(ITEMS_PER_PAGE)
    }
}

impl BrowseState {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            search: String::new(),
            genres: GenreSelection::default(),
            sort: SortOrder::default(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn genres(&self) -> &GenreSelection {
        &self.genres
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn is_filtered(&self) -> bool {
        !self.search.trim().is_empty() || !self.genres.is_all()
    }

    pub fn set_search(&mut self, query: &str) {
        self.search = query.to_string();
        self.page = 1;
    }

    pub fn toggle_genre(&mut self, code: u32) {
        self.genres.toggle(code);
        self.page = 1;
    }

    pub fn clear_genres(&mut self) {
        self.genres.clear();
        self.page = 1;
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.sort = sort;
        self.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Every show that passes the search and genre filter, in display order.
    pub fn filter<'a, M: Similarity>(
        &self,
        shows: &'a [ShowPreview],
        matcher: &M,
    ) -> Vec<&'a ShowPreview> {
        let mut result: Vec<&ShowPreview> = search_shows(shows, &self.search, matcher)
            .into_iter()
            .filter(|show| self.genres.matches(show))
            .collect();

        result.sort_by(|a, b| self.sort.compare(a, b));
        result
    }

    pub fn apply<'a, M: Similarity>(
        &self,
        shows: &'a [ShowPreview],
        matcher: &M,
    ) -> BrowsePage<'a> {
        let filtered = self.filter(shows, matcher);
        let total_matches = filtered.len();
        let total_pages = total_matches.div_ceil(self.page_size);
        let current_page = self.page.min(total_pages.max(1));

        let items = filtered
            .into_iter()
            .skip((current_page - 1) * self.page_size)
            .take(self.page_size)
            .collect();

        BrowsePage {
            items,
            total_matches,
            total_pages,
            current_page,
        }
    }
}

pub fn featured(shows: &[ShowPreview]) -> &[ShowPreview] {
    &shows[..shows.len().min(FEATURED_COUNT)]
}
