/// SQLite connection, schema creation and index setup
pub mod database;

/// Lookup seed data loading from config.toml
pub mod seed;
