// Page-based storage
// Rows live in fixed-capacity pages; a row id encodes (page, slot)
// Deleted rows leave a tombstone so the ids of the remaining rows stay valid

use super::Row;

/// A page is a fixed-capacity block of row slots
#[derive(Debug, Clone)]
pub struct Page {
    /// The page ID (unique identifier)
    pub id: usize,
    /// Row slots; None marks a deleted row
    slots: Vec<Option<Row>>,
    /// Maximum number of slots per page
    pub max_rows: usize,
}

impl Page {
    /// Create a new page with a given ID
    pub fn new(id: usize, max_rows: usize) -> Self {
        Self {
            id,
            slots: Vec::with_capacity(max_rows),
            max_rows,
        }
    }

    /// A page is full once every slot has been used, live or not
    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.max_rows
    }

    pub fn get(&self, slot: usize) -> Option<&Row> {
        self.slots.get(slot)?.as_ref()
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Row> {
        self.slots.get_mut(slot)?.as_mut()
    }

    /// Tombstone a slot, returning the row it held
    pub fn delete(&mut self, slot: usize) -> Option<Row> {
        self.slots.get_mut(slot)?.take()
    }

    /// Number of live rows in this page
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

/// Page Manager - owns every page of one table
#[derive(Debug)]
pub struct PageManager {
    pages: Vec<Page>,
    max_rows_per_page: usize,
}

impl PageManager {
    pub fn new(max_rows_per_page: usize) -> Self {
        Self {
            pages: Vec::new(),
            max_rows_per_page: max_rows_per_page.max(1),
        }
    }

    /// Insert a row into the last page, opening a new page when it is full
    /// Returns the row id
    pub fn insert(&mut self, row: Row) -> usize {
        if self.pages.last().map_or(true, |p| p.is_full()) {
            let page_id = self.pages.len();
            self.pages.push(Page::new(page_id, self.max_rows_per_page));
        }

        let page_id = self.pages.len() - 1;
        let slot = self.pages[page_id].slots.len();
        self.pages[page_id].slots.push(Some(row));

        page_id * self.max_rows_per_page + slot
    }

    fn locate(&self, row_id: usize) -> (usize, usize) {
        (row_id / self.max_rows_per_page, row_id % self.max_rows_per_page)
    }

    pub fn get(&self, row_id: usize) -> Option<&Row> {
        let (page_id, slot) = self.locate(row_id);
        self.pages.get(page_id)?.get(slot)
    }

    pub fn get_mut(&mut self, row_id: usize) -> Option<&mut Row> {
        let (page_id, slot) = self.locate(row_id);
        self.pages.get_mut(page_id)?.get_mut(slot)
    }

    pub fn delete(&mut self, row_id: usize) -> Option<Row> {
        let (page_id, slot) = self.locate(row_id);
        self.pages.get_mut(page_id)?.delete(slot)
    }

    /// All live rows with their ids, in insertion order
    pub fn scan(&self) -> Vec<(usize, &Row)> {
        let mut results = Vec::new();

        for page in &self.pages {
            for (slot, row) in page.slots.iter().enumerate() {
                if let Some(row) = row {
                    results.push((page.id * self.max_rows_per_page + slot, row));
                }
            }
        }

        results
    }

    /// Get the total number of live rows across all pages
    pub fn total_rows(&self) -> usize {
        self.pages.iter().map(|p| p.len()).sum()
    }
}
