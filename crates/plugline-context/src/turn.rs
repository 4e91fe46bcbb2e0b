// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn composition: prepends invisible shop context to the customer's text.

use std::collections::BTreeSet;

/// Builds the text actually sent to the backend for one turn.
///
/// The context block is re-generated every turn so the backend always sees
/// the current menu and stock, never a stale copy from earlier history.
pub fn compose_turn(menu: &str, out_of_stock: &BTreeSet<String>, message: &str) -> String {
    let mut context = String::new();

    if !menu.is_empty() {
        context.push_str("Current menu and prices:\n");
        context.push_str(menu);
        context.push('\n');
    }

    if !out_of_stock.is_empty() {
        let items: Vec<&str> = out_of_stock.iter().map(String::as_str).collect();
        context.push_str("Out of stock right now (do not sell these): ");
        context.push_str(&items.join(", "));
        context.push('\n');
    }

    if context.is_empty() {
        return message.to_string();
    }

    format!("[CONTEXT - hidden from the customer]\n{context}[END CONTEXT]\n\n{message}")
}
