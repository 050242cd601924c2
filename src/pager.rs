use serde::Serialize;

/// Results shown per page when the caller does not supply a page size.
pub const DEFAULT_RESULTS_PER_PAGE: usize = 30;

/// Navigation and display metadata for one page window.
///
/// `previous_page` and `next_page` are intentionally unclamped and may be
/// `0` or `total_pages + 1`. Templates decide whether to render the links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationOptions {
    pub previous_page: usize,
    pub next_page: usize,
    pub current_page: usize,
    pub total_pages: usize,
    pub num_results: usize,
    pub start_of_page: usize,
    pub end_of_page: usize,
}

/// Pages an in-memory ordered result set into fixed-size windows.
///
/// The requested page arrives as an optional string straight from the query
/// string. Absent, empty, and unparseable values all fall back to page 1, and
/// out-of-range pages are clamped into `[1, total_pages]` (page 1 when there
/// are no results at all).
pub struct Pager<T> {
    results_per_page: usize,
    total_pages: usize,
    current_page: usize,
    results: Vec<T>,
}

impl<T> Pager<T> {
    pub fn new(requested_page: Option<&str>, results: Vec<T>) -> Self {
        Self::with_page_size(requested_page, results, DEFAULT_RESULTS_PER_PAGE)
    }

    pub fn with_page_size(
        requested_page: Option<&str>,
        results: Vec<T>,
        results_per_page: usize,
    ) -> Self {
        let results_per_page = results_per_page.max(1);
        let total_pages = results.len().div_ceil(results_per_page);

        let requested = requested_page
            .map(str::trim)
            .filter(|page| !page.is_empty())
            .and_then(|page| page.parse::<i64>().ok())
            .unwrap_or(1);

        // Clamp below to 1, above to the last page. With zero results the
        // floor still applies and the pager sits on an empty page 1.
        let current_page = if requested < 1 {
            1
        } else {
            (requested as usize).min(total_pages.max(1))
        };

        Self {
            results_per_page,
            total_pages,
            current_page,
            results,
        }
    }

    pub fn pagination_options(&self) -> PaginationOptions {
        let start_of_range_offset = (self.current_page * self.results_per_page) - self.results_per_page;

        let end_of_range = start_of_range_offset + self.results_per_page;
        let end_of_page = end_of_range.min(self.results.len());

        PaginationOptions {
            previous_page: self.current_page - 1,
            next_page: self.current_page + 1,
            current_page: self.current_page,
            total_pages: self.total_pages,
            num_results: self.results.len(),
            start_of_page: start_of_range_offset + 1,
            end_of_page,
        }
    }

    pub fn page_results(&self) -> &[T] {
        let start = ((self.current_page - 1) * self.results_per_page).min(self.results.len());
        let end = (start + self.results_per_page).min(self.results.len());

        &self.results[start..end]
    }
}
