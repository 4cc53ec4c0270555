use std::{borrow::Cow, io};

use log::{debug, warn};
use ptree::{write_tree_with, PrintConfig, Style, TreeItem};

use super::{
    error::StoreError,
    layout::TableLayout,
    page::Page,
    row::Row,
};

/// Append-only row heap. Pages are materialised on first touch and rows never
/// move once written.
#[derive(Debug)]
pub struct RowStore {
    layout: TableLayout,
    pages: Vec<Option<Page>>,
    num_rows: usize,
}

impl RowStore {
    pub fn new(layout: TableLayout) -> Self {
        RowStore {
            layout,
            pages: (0..layout.max_pages()).map(|_| None).collect(),
            num_rows: 0,
        }
    }

    pub fn layout(&self) -> TableLayout {
        self.layout
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn capacity(&self) -> usize {
        self.layout.capacity()
    }

    pub fn allocated_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.is_some()).count()
    }

    pub fn is_page_allocated(&self, page_index: usize) -> bool {
        matches!(self.pages.get(page_index), Some(Some(_)))
    }

    /// Resolves `row_num` to its slot, allocating the owning page if needed.
    ///
    /// # Panics
    ///
    /// Panics if `row_num` is not below [`RowStore::capacity`].
    pub fn row_slot(&mut self, row_num: usize) -> &mut Row {
        let slot = self.layout.slot(row_num);
        let rows_per_page = self.layout.rows_per_page();
        let page = self.pages[slot.page_index].get_or_insert_with(|| {
            debug!("allocating page {} for row {}", slot.page_index, row_num);
            Page::new(rows_per_page)
        });
        &mut page.rows[slot.offset]
    }

    pub fn insert(&mut self, row: &Row) -> Result<(), StoreError> {
        if self.num_rows >= self.capacity() {
            warn!("rejecting insert of id {}: table is full", row.id);
            return Err(StoreError::StoreFull {
                capacity: self.capacity(),
            });
        }
        *self.row_slot(self.num_rows) = *row;
        self.num_rows += 1;
        Ok(())
    }

    pub fn get(&self, row_num: usize) -> Option<&Row> {
        if row_num >= self.num_rows {
            return None;
        }
        let slot = self.layout.slot(row_num);
        self.pages
            .get(slot.page_index)?
            .as_ref()?
            .rows
            .get(slot.offset)
    }

    pub fn scan(&self) -> RowReader {
        RowReader::new(self)
    }

    pub fn pretty_print(&self, out: &mut impl io::Write) -> io::Result<()> {
        let config = PrintConfig {
            leaf: Style {
                bold: true,
                ..Style::default()
            },
            ..PrintConfig::default()
        };
        write_tree_with(&StoreNode::from_store(self), out, &config)
    }
}

pub struct RowReader<'a> {
    store: &'a RowStore,
    next_row: usize,
}

impl<'a> RowReader<'a> {
    pub fn new(store: &'a RowStore) -> Self {
        RowReader { store, next_row: 0 }
    }
}

impl<'a> Iterator for RowReader<'a> {
    type Item = &'a Row;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.store.get(self.next_row)?;
        self.next_row += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.store.num_rows().saturating_sub(self.next_row);
        (left, Some(left))
    }
}

impl ExactSizeIterator for RowReader<'_> {}

/// Owned snapshot of the store used for tree rendering.
#[derive(Debug, Clone)]
pub enum StoreNode {
    Table {
        num_rows: usize,
        capacity: usize,
        pages: Vec<StoreNode>,
    },
    Page {
        index: usize,
        rows: Vec<StoreNode>,
    },
    Row {
        row_num: usize,
        row: Row,
    },
}

impl StoreNode {
    pub fn from_store(store: &RowStore) -> Self {
        let rows_per_page = store.layout.rows_per_page();
        let pages = store
            .pages
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_some())
            .map(|(index, _)| {
                let first = index * rows_per_page;
                let rows = (first..first + rows_per_page)
                    .filter_map(|row_num| {
                        store
                            .get(row_num)
                            .map(|row| StoreNode::Row { row_num, row: *row })
                    })
                    .collect();
                StoreNode::Page { index, rows }
            })
            .collect();
        StoreNode::Table {
            num_rows: store.num_rows,
            capacity: store.capacity(),
            pages,
        }
    }
}

impl TreeItem for StoreNode {
    type Child = Self;

    fn write_self<W: io::Write>(&self, f: &mut W, _: &Style) -> io::Result<()> {
        match self {
            StoreNode::Table {
                num_rows,
                capacity,
                pages,
            } => write!(f, "Table-{}/{} ({} pages)", num_rows, capacity, pages.len()),
            StoreNode::Page { index, .. } => write!(f, "Page-{}", index),
            StoreNode::Row { row_num, row } => write!(f, "Row-{} {}", row_num, row),
        }
    }

    fn children(&self) -> Cow<[Self::Child]> {
        match self {
            StoreNode::Table { pages, .. } => Cow::from(pages),
            StoreNode::Page { rows, .. } => Cow::from(rows),
            StoreNode::Row { .. } => Cow::from(vec![]),
        }
    }
}
