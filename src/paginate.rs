use crate::error::{FetchError, FetchResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    pub page_size: usize,
    /// Most requests one fetch may issue while every page comes back full.
    pub max_pages: usize,
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            page_size: crate::config::DEFAULT_PAGE_SIZE,
            max_pages: 500,
        }
    }
}

/// Drain an offset-paginated resource.
///
/// `fetch_page` is called with `offset = 0, P, 2P, ...` one page at a time. A page
/// holding exactly `page_size` items means "maybe more"; anything shorter ends the
/// walk. Pages are concatenated in the order they arrive. The first failing page
/// aborts the whole fetch and nothing accumulated so far is returned.
pub fn fetch_all_pages<T, F>(path: &str, spec: PageSpec, mut fetch_page: F) -> FetchResult<Vec<T>>
where
    F: FnMut(usize) -> FetchResult<Vec<T>>,
{
    let page_size = spec.page_size.max(1);
    let mut items = Vec::new();
    let mut offset = 0usize;
    let mut pages = 0usize;

    loop {
        let page = fetch_page(offset)?;
        pages += 1;
        let full = page.len() == page_size;
        items.extend(page);

        if !full {
            return Ok(items);
        }
        if pages >= spec.max_pages {
            return Err(FetchError::PageLimit {
                path: path.to_string(),
                pages,
            });
        }
        offset += page_size;
    }
}
