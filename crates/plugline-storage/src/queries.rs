// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order queries.

use plugline_core::PluglineError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::{Order, OrderStatus};

fn now() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

/// Insert a new `pending` order. Returns its row id.
pub async fn insert_pending(
    db: &Database,
    conversation_id: &str,
    details: &str,
    order_code: &str,
) -> Result<String, PluglineError> {
    let id = uuid::Uuid::new_v4().to_string();
    let row_id = id.clone();
    let conversation_id = conversation_id.to_string();
    let details = details.to_string();
    let order_code = order_code.to_string();
    let created_at = now();

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO orders (id, order_code, conversation_id, details, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, 'pending', ?5, ?5)",
                params![row_id, order_code, conversation_id, details, created_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
    Ok(id)
}

/// Flip the newest pending order with this code (case-insensitive) to
/// `confirmed`. Returns the owning conversation id, or `None`.
pub async fn confirm_newest_pending(
    db: &Database,
    order_code: &str,
) -> Result<Option<String>, PluglineError> {
    let order_code = order_code.trim().to_string();
    let updated_at = now();

    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let found: Option<(String, String)> = tx
                .query_row(
                    "SELECT id, conversation_id FROM orders
                     WHERE order_code = ?1 COLLATE NOCASE AND status = 'pending'
                     ORDER BY created_at DESC, rowid DESC LIMIT 1",
                    params![order_code],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            if let Some((id, _)) = &found {
                tx.execute(
                    "UPDATE orders SET status = 'confirmed', updated_at = ?1 WHERE id = ?2",
                    params![updated_at, id],
                )?;
            }
            tx.commit()?;
            Ok(found.map(|(_, conversation_id)| conversation_id))
        })
        .await
        .map_err(map_tr_err)
}

/// All orders, oldest first.
pub async fn list_orders(db: &Database) -> Result<Vec<Order>, PluglineError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, order_code, conversation_id, details, status, created_at, updated_at
                 FROM orders ORDER BY created_at ASC, rowid ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                let status: String = row.get(4)?;
                Ok(Order {
                    id: row.get(0)?,
                    order_code: row.get(1)?,
                    conversation_id: row.get(2)?,
                    details: row.get(3)?,
                    status: OrderStatus::parse(&status).unwrap_or(OrderStatus::Pending),
                    created_at: row.get(5)?,
                    updated_at: row.get(6)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}
