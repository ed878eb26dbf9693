//! Listing tables: query state, columns and fetching

pub mod columns;
pub mod fetcher;
pub mod query;

pub use columns::{ColumnDescriptor, ColumnType, Formatter};
pub use fetcher::{fetch_page, TableFetcher, TableView};
pub use query::{build_query, build_query_pairs, SortDirection, TablePatch, TableState};
