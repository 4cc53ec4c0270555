use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Table is full.")]
    StoreFull { capacity: usize },
}
