//! Embedded SQL migrations
//!
//! Migration files are compiled into the binary with `include_str!` so a
//! deployment never depends on files next to the executable.

/// One embedded migration, identified by its file stem
pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

/// All embedded migrations, in apply order
pub fn all() -> &'static [Migration] {
    const MIGRATIONS: &[Migration] = &[
        Migration {
            id: "001_initial_schema",
            sql: include_str!("../../migrations/001_initial_schema.sql"),
        },
        Migration {
            id: "002_fts_index",
            sql: include_str!("../../migrations/002_fts_index.sql"),
        },
    ];
    MIGRATIONS
}
