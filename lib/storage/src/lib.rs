//! # Pantry Storage
//!
//! CSV-file tables in a data directory. [`TableStore`] moves raw
//! [`pantry_core::Table`]s in and out; [`PantryStore`] knows each table's
//! columns and implements the reference and property sources the matching
//! and property-fill paths consume.

pub mod error;
pub mod pantry_store;
pub mod table_store;

pub use error::{Result, StorageError};
pub use pantry_store::{NewTaxonomyVector, PantryStore, TableNames, VECTOR_TEXT_DECIMALS};
pub use table_store::{read_table, write_table, TableStore};
