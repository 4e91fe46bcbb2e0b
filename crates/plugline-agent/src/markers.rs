// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Marker protocol parser.
//!
//! The generative backend signals structured events by embedding bracketed
//! tokens in its reply. All marker vocabulary lives here; nothing else in
//! the crate matches on raw marker text.

use strum::{Display, EnumString};

/// Closes a ticket body. Text after it is marketing copy for the customer only.
pub const END_TICKET: &str = "[END_TICKET]";

/// What a reply asks the router to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MarkerKind {
    None,
    NewOrder,
    AddOnOrder,
    HumanNeeded,
    PriceRequest,
    AddOnRequest,
    CancelOrder,
}

impl MarkerKind {
    /// Bracketed token for this kind, if it has one.
    pub fn token(self) -> Option<&'static str> {
        match self {
            MarkerKind::None => None,
            MarkerKind::NewOrder => Some("[NEW_ORDER]"),
            MarkerKind::AddOnOrder => Some("[ADD_ON_ORDER]"),
            MarkerKind::HumanNeeded => Some("[HUMAN_NEEDED]"),
            MarkerKind::PriceRequest => Some("[PRICE_REQUEST]"),
            MarkerKind::AddOnRequest => Some("[ADD_ON_REQUEST]"),
            MarkerKind::CancelOrder => Some("[CANCEL_ORDER]"),
        }
    }

    /// Ticket kinds carry an order body and are persisted.
    pub fn is_ticket(self) -> bool {
        matches!(self, MarkerKind::NewOrder | MarkerKind::AddOnOrder)
    }
}

/// Non-ticket kinds, strongest first. Escalation must never be downgraded.
const PRIORITY: [MarkerKind; 4] = [
    MarkerKind::HumanNeeded,
    MarkerKind::PriceRequest,
    MarkerKind::AddOnRequest,
    MarkerKind::CancelOrder,
];

const ALL_TOKENS: [&str; 7] = [
    "[NEW_ORDER]",
    "[ADD_ON_ORDER]",
    "[HUMAN_NEEDED]",
    "[PRICE_REQUEST]",
    "[ADD_ON_REQUEST]",
    "[CANCEL_ORDER]",
    END_TICKET,
];

/// A reply split into what each audience should see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub customer_view: String,
    pub operator_view: String,
    pub kind: MarkerKind,
}

/// Classifies a generated reply. Pure function over text.
pub fn classify(reply: &str) -> Classified {
    let kind = detect_kind(reply);
    let customer_view = strip_markers(reply);

    let operator_view = match kind.token().filter(|_| kind.is_ticket()) {
        Some(token) => {
            let body = reply
                .find(token)
                .map(|at| &reply[at..])
                .unwrap_or(reply);
            let body = match body.find(END_TICKET) {
                Some(end) => &body[..end],
                None => body,
            };
            strip_markers(body)
        }
        None => customer_view.clone(),
    };

    Classified {
        customer_view,
        operator_view,
        kind,
    }
}

fn detect_kind(reply: &str) -> MarkerKind {
    if let Some(kind) = PRIORITY
        .iter()
        .copied()
        .find(|k| k.token().is_some_and(|t| reply.contains(t)))
    {
        return kind;
    }

    let new_at = reply.find("[NEW_ORDER]");
    let add_at = reply.find("[ADD_ON_ORDER]");
    match (new_at, add_at) {
        (Some(n), Some(a)) if a < n => MarkerKind::AddOnOrder,
        (Some(_), _) => MarkerKind::NewOrder,
        (None, Some(_)) => MarkerKind::AddOnOrder,
        (None, None) => MarkerKind::None,
    }
}

/// Removes every marker token. Lines that held nothing but markers are
/// dropped entirely; the result is trimmed.
pub fn strip_markers(text: &str) -> String {
    let lines: Vec<String> = text
        .lines()
        .filter_map(|line| {
            let mut cleaned = line.to_string();
            let mut had_token = false;
            for token in ALL_TOKENS {
                if cleaned.contains(token) {
                    had_token = true;
                    cleaned = cleaned.replace(token, "");
                }
            }
            if !had_token {
                Some(line.to_string())
            } else if cleaned.trim().is_empty() {
                None
            } else {
                Some(cleaned.trim().to_string())
            }
        })
        .collect();
    lines.join("\n").trim().to_string()
}
