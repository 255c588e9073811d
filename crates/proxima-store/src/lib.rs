//! Proxima Store - query builder and field metadata adapters
//!
//! This crate provides implementations of the `QueryBuilder` and
//! `FieldResolver` ports: an in-memory address store that evaluates
//! proximity queries, a SQL renderer for MySQL and Postgres, and a
//! Postgres executor.

pub mod memory;
pub mod postgres;
pub mod sql;

pub use memory::{AddressRow, FieldRegistry, MemoryAddressStore, MemoryQuery, SearchHit};
pub use sql::{RenderedSql, SqlDialect, SqlParam, SqlQuery};
