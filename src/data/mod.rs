//! Data layer: storage, ingestion, derived views, and editing.
//!
//! Storage ([`datatable`]) is separated from presentation: filters,
//! sorts and projections live in [`data_view`] and never mutate the
//! table, while every mutation goes through [`history`] so it can be
//! undone.

pub mod csv_source;
pub mod data_view;
pub mod datatable;
pub mod exporter;
pub mod filter;
pub mod history;
pub mod sort;
pub mod store;
pub mod type_inference;
