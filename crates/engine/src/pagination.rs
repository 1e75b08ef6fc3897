//! Page-at-a-time listing on top of sea-orm's `Paginator`.

use sea_orm::{ConnectionTrait, Paginator, SelectorTrait};

use crate::ResultEngine;

pub const DEFAULT_PER_PAGE: u64 = 30;

/// One page of an ordered listing. `page` is 1-based.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn previous(&self) -> Option<u64> {
        (self.page > 1).then(|| self.page - 1)
    }

    pub fn next(&self) -> Option<u64> {
        (self.page < self.total_pages).then(|| self.page + 1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

/// Fetch `page` (1-based, values below 1 are treated as 1) from `paginator`.
///
/// Pages past the last one come back empty without touching the rows, which
/// also keeps the offset computation in range for any `page`.
pub(crate) async fn fetch_page<'db, C, S>(
    paginator: Paginator<'db, C, S>,
    page: u64,
    per_page: u64,
) -> ResultEngine<Page<S::Item>>
where
    C: ConnectionTrait,
    S: SelectorTrait + 'db,
{
    let page = page.max(1);
    let totals = paginator.num_items_and_pages().await?;
    let items = if page > totals.number_of_pages {
        Vec::new()
    } else {
        paginator.fetch_page(page - 1).await?
    };

    Ok(Page {
        items,
        page,
        per_page,
        total_items: totals.number_of_items,
        total_pages: totals.number_of_pages,
    })
}
