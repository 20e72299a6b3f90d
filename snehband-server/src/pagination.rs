//! Page arithmetic for profile listings

/// Profiles per listing page
pub const PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page (1-based, clamped)
    pub page: i64,
    pub total_pages: i64,
    /// Row offset for `LIMIT`/`OFFSET`
    pub offset: i64,
}

/// Clamp `requested_page` into `[1, total_pages]` and derive the offset
///
/// ```
/// use snehband_server::pagination::paginate;
///
/// let p = paginate(250, Some(99));
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 200);
/// ```
pub fn paginate(total_results: i64, requested_page: Option<i64>) -> Pagination {
    let total_pages = (total_results + PAGE_SIZE - 1) / PAGE_SIZE;
    let page = requested_page
        .unwrap_or(1)
        .max(1)
        .min(total_pages.max(1));

    Pagination {
        page,
        total_pages,
        offset: (page - 1) * PAGE_SIZE,
    }
}
