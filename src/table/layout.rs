use anyhow::{bail, Result};

use super::{
    page::{ROWS_PER_PAGE, TABLE_MAX_PAGES},
    row::ROW_SIZE,
};

/// Upper bound on `max_pages`. `RowStore::new` reserves one entry per page up
/// front, so this bounds that allocation.
pub const MAX_TABLE_PAGES: usize = 1 << 20;

/// Shape of a row store: how many rows fit on a page and how many pages the
/// store may ever own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLayout {
    rows_per_page: usize,
    max_pages: usize,
}

/// Physical address of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub page_index: usize,
    pub offset: usize,
}

impl TableLayout {
    pub fn new(rows_per_page: usize, max_pages: usize) -> Result<Self> {
        if rows_per_page == 0 {
            bail!("a page must hold at least one row");
        }
        if max_pages == 0 {
            bail!("a table must have at least one page");
        }
        if max_pages > MAX_TABLE_PAGES {
            bail!(
                "a table may have at most {} pages, got {}",
                MAX_TABLE_PAGES,
                max_pages
            );
        }
        // row numbers are handed to the index as u32
        match rows_per_page.checked_mul(max_pages) {
            Some(capacity) if u32::try_from(capacity).is_ok() => {}
            _ => bail!(
                "{} rows per page over {} pages does not fit in a row number",
                rows_per_page,
                max_pages
            ),
        }
        Ok(TableLayout {
            rows_per_page,
            max_pages,
        })
    }

    pub fn for_page_size(page_size: usize, max_pages: usize) -> Result<Self> {
        if page_size < ROW_SIZE {
            bail!(
                "page size {} is smaller than a single row ({} bytes)",
                page_size,
                ROW_SIZE
            );
        }
        TableLayout::new(page_size / ROW_SIZE, max_pages)
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Never overflows: `new` rejects layouts whose product does not fit.
    pub fn capacity(&self) -> usize {
        self.rows_per_page * self.max_pages
    }

    pub fn slot(&self, row_num: usize) -> Slot {
        Slot {
            page_index: row_num / self.rows_per_page,
            offset: row_num % self.rows_per_page,
        }
    }
}

impl Default for TableLayout {
    fn default() -> Self {
        TableLayout {
            rows_per_page: ROWS_PER_PAGE,
            max_pages: TABLE_MAX_PAGES,
        }
    }
}
