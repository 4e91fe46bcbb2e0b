// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary at build time
//! and applied on every [`Database::open`](crate::Database::open).

use plugline_core::PluglineError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), PluglineError> {
    embedded::migrations::runner()
        .run(conn)
        .map_err(|e| PluglineError::Storage {
            source: Box::new(e),
        })?;
    Ok(())
}
