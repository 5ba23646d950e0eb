//! Persistence layer for forge: connection pool, migrations, row models,
//! and query functions grouped per table.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
