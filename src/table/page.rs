use super::row::{Row, ROW_SIZE};

pub const PAGE_SIZE: usize = 4096;
pub const TABLE_MAX_PAGES: usize = 100;
pub const ROWS_PER_PAGE: usize = PAGE_SIZE / ROW_SIZE;

/// A fixed-capacity block of rows. Freshly allocated pages hold zeroed rows.
#[derive(Debug, Clone)]
pub struct Page {
    pub rows: Box<[Row]>,
}

impl Page {
    pub fn new(rows_per_page: usize) -> Self {
        Page {
            rows: vec![Row::default(); rows_per_page].into_boxed_slice(),
        }
    }
}
