// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin command interpreter.
//!
//! Commands are parsed into [`Command`], then applied one at a time under a
//! single lock so shop state has exactly one writer. Synthetic customer turns
//! (`price`, `confirm`, `allow`, `deny`) run after the lock is released, so a
//! slow backend never holds up other commands. Every command yields exactly
//! one reply string for the issuer, including on error.

use std::sync::Arc;

use plugline_core::ConversationId;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::app::AppContext;
use crate::responder::ReplyOutcome;
use crate::state::ShopMode;

pub const HELP: &str = "\
🛠️ Admin commands
open · close · auto
pause <reason>
out <item, item> · restock <item, item> | all
sync (reload the menu)
price <code> <amount>
confirm <code>
allow <code> · deny <code>
msg <code> <text> · resume <code>
status
shutdown · restart (owner only)
<code> is an order code like SP-1234 or the customer's number.";

/// A parsed admin command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open,
    Close,
    Auto,
    Pause(String),
    OutOfStock(Vec<String>),
    Restock(Restock),
    Sync,
    Price { code: String, amount: u64 },
    Confirm(String),
    Allow(String),
    Deny(String),
    Message { code: String, text: String },
    Resume(String),
    Status,
    Shutdown,
    Restart,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restock {
    All,
    Items(Vec<String>),
}

/// Why a command could not be applied. Rendered into the admin reply.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("⚠️ I don't know the order code or number `{0}`.")]
    UnknownCode(String),

    #[error("⛔ Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Unknown command `{0}`.")]
    Unknown(String),

    #[error("🙋 {0} is in human mode, so the bot stays quiet. Send `resume {0}` first.")]
    HumanMode(String),
}

/// Parses one admin message. The first word (case-insensitive, optional
/// leading `/`) selects the command.
pub fn parse(input: &str) -> Result<Command, CommandError> {
    let input = input.trim();
    let input = input.strip_prefix('/').unwrap_or(input);
    let (word, rest) = split_word(input);

    match word.to_lowercase().as_str() {
        "" | "help" => Ok(Command::Help),
        "open" => Ok(Command::Open),
        "close" => Ok(Command::Close),
        "auto" => Ok(Command::Auto),
        "pause" if !rest.is_empty() => Ok(Command::Pause(rest.to_string())),
        "pause" => Err(CommandError::Usage("pause <reason>")),
        "out" => parse_items(rest)
            .map(Command::OutOfStock)
            .ok_or(CommandError::Usage("out <item, item>")),
        "restock" if rest.eq_ignore_ascii_case("all") => Ok(Command::Restock(Restock::All)),
        "restock" => parse_items(rest)
            .map(|items| Command::Restock(Restock::Items(items)))
            .ok_or(CommandError::Usage("restock <item, item> | all")),
        "sync" => Ok(Command::Sync),
        "price" => {
            let (code, amount) = split_word(rest);
            match (code.is_empty(), parse_amount(amount)) {
                (false, Some(amount)) => Ok(Command::Price {
                    code: code.to_string(),
                    amount,
                }),
                _ => Err(CommandError::Usage("price <code> <amount>")),
            }
        }
        "confirm" => single_code(rest, "confirm <code>").map(Command::Confirm),
        "allow" => single_code(rest, "allow <code>").map(Command::Allow),
        "deny" => single_code(rest, "deny <code>").map(Command::Deny),
        "msg" | "message" => {
            let (code, text) = split_word(rest);
            if code.is_empty() || text.is_empty() {
                return Err(CommandError::Usage("msg <code> <text>"));
            }
            Ok(Command::Message {
                code: code.to_string(),
                text: text.to_string(),
            })
        }
        "resume" => single_code(rest, "resume <code>").map(Command::Resume),
        "status" => Ok(Command::Status),
        "shutdown" => Ok(Command::Shutdown),
        "restart" => Ok(Command::Restart),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn split_word(s: &str) -> (&str, &str) {
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (s, ""),
    }
}

fn single_code(rest: &str, usage: &'static str) -> Result<String, CommandError> {
    let (code, extra) = split_word(rest);
    if code.is_empty() || !extra.is_empty() {
        return Err(CommandError::Usage(usage));
    }
    Ok(code.to_string())
}

fn parse_items(rest: &str) -> Option<Vec<String>> {
    let items: Vec<String> = rest
        .split(',')
        .map(|i| i.trim().to_lowercase())
        .filter(|i| !i.is_empty())
        .collect();
    (!items.is_empty()).then_some(items)
}

/// Accepts `6800`, `N6800`, `₦6,800`.
pub fn parse_amount(s: &str) -> Option<u64> {
    let s = s.trim();
    let s = s
        .strip_prefix('₦')
        .or_else(|| s.strip_prefix(['N', 'n']))
        .unwrap_or(s);
    let digits: String = s.chars().filter(|c| *c != ',').collect();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// `6800` → `₦6,800`.
pub fn format_naira(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    format!("₦{out}")
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Open => "open",
            Command::Close => "close",
            Command::Auto => "auto",
            Command::Pause(_) => "pause",
            Command::OutOfStock(_) => "out",
            Command::Restock(_) => "restock",
            Command::Sync => "sync",
            Command::Price { .. } => "price",
            Command::Confirm(_) => "confirm",
            Command::Allow(_) => "allow",
            Command::Deny(_) => "deny",
            Command::Message { .. } => "msg",
            Command::Resume(_) => "resume",
            Command::Status => "status",
            Command::Shutdown => "shutdown",
            Command::Restart => "restart",
            Command::Help => "help",
        }
    }
}

/// What applying a command under the serial lock left to do.
enum Applied {
    /// Final reply for the issuer.
    Reply(String),
    /// State is settled; a synthetic turn still has to reach the customer.
    /// `summary` starts the issuer's reply, delivery notes follow it.
    Turn {
        conversation: ConversationId,
        turn: String,
        summary: String,
    },
}

fn reply(text: String) -> Result<Applied, CommandError> {
    Ok(Applied::Reply(text))
}

pub struct AdminInterpreter {
    app: Arc<AppContext>,
    serial: Mutex<()>,
}

impl AdminInterpreter {
    pub fn new(app: Arc<AppContext>) -> Self {
        Self {
            app,
            serial: Mutex::new(()),
        }
    }

    /// Runs one command and returns the reply for the issuer.
    pub async fn execute(&self, issuer: &ConversationId, input: &str) -> String {
        if !self.app.is_admin(issuer) {
            warn!(issuer = %issuer, "admin command from non-operator rejected");
            return CommandError::Unauthorized("you are not an operator.".into()).to_string();
        }

        let command = match parse(input) {
            Ok(command) => command,
            Err(e @ CommandError::Unknown(_)) => return format!("{e}\n\n{HELP}"),
            Err(e) => return e.to_string(),
        };
        let name = command.name();

        let applied = {
            let _serial = self.serial.lock().await;
            self.apply(issuer, command).await
        };

        match applied {
            Ok(Applied::Reply(text)) => {
                info!(issuer = %issuer, command = name, "admin command applied");
                text
            }
            Ok(Applied::Turn {
                conversation,
                turn,
                summary,
            }) => {
                if self.app.overrides.contains(&conversation) {
                    // An operator took over between apply and now.
                    let label = self.app.registry.code_for(&conversation);
                    return CommandError::HumanMode(label).to_string();
                }
                info!(issuer = %issuer, command = name, conversation_id = %conversation, "admin command applied, sending synthetic turn");
                let note = self.converse(&conversation, &turn).await;
                format!("{summary}{note}")
            }
            Err(e) => {
                warn!(issuer = %issuer, command = name, error = %e, "admin command rejected");
                e.to_string()
            }
        }
    }

    async fn apply(
        &self,
        issuer: &ConversationId,
        command: Command,
    ) -> Result<Applied, CommandError> {
        let app = &self.app;
        match command {
            Command::Open => {
                self.set_mode(ShopMode::Open).await;
                reply("✅ Shop is OPEN (manual). Send `auto` to follow the schedule again.".into())
            }
            Command::Close => {
                self.set_mode(ShopMode::Closed).await;
                reply("🔒 Shop is CLOSED (manual). Customers get the closed message.".into())
            }
            Command::Auto => {
                self.set_mode(ShopMode::Auto).await;
                let now_open = app.hours.within_schedule(app.clock.now());
                reply(format!(
                    "🕒 Following the schedule ({}). Right now the shop is {}.",
                    app.hours.describe(),
                    if now_open { "open" } else { "closed" }
                ))
            }
            Command::Pause(reason) => {
                let mut shop = app.shop.write().await;
                shop.mode = ShopMode::Closed;
                shop.pause_reason = Some(reason.clone());
                info!(reason = %reason, "orders paused");
                reply(format!(
                    "⏸️ Orders paused: {reason}\nSend `open` or `auto` to resume."
                ))
            }
            Command::OutOfStock(items) => {
                let mut shop = app.shop.write().await;
                shop.out_of_stock.extend(items.iter().cloned());
                info!(items = ?items, "items marked out of stock");
                reply(format!(
                    "🚫 Marked out of stock: {}\nOut of stock now: {}",
                    items.join(", "),
                    join_or_none(shop.out_of_stock.iter())
                ))
            }
            Command::Restock(Restock::All) => {
                app.shop.write().await.out_of_stock.clear();
                info!("all items restocked");
                reply("✅ Everything is back in stock.".into())
            }
            Command::Restock(Restock::Items(items)) => {
                let mut shop = app.shop.write().await;
                for item in &items {
                    shop.out_of_stock.remove(item);
                }
                info!(items = ?items, "items restocked");
                reply(format!(
                    "✅ Restocked: {}\nOut of stock now: {}",
                    items.join(", "),
                    join_or_none(shop.out_of_stock.iter())
                ))
            }
            Command::Sync => reply(match app.context.sync_menu().await {
                Ok(bytes) => format!("🔄 Menu synced ({bytes} bytes)."),
                Err(e) => format!("⚠️ Menu sync failed: {e}\nStill using the previous menu."),
            }),
            Command::Price { code, amount } => {
                let (conversation, label) = self.resolve_for_turn(&code)?;
                let price = format_naira(amount);
                Ok(Applied::Turn {
                    conversation,
                    turn: format!(
                        "[SYSTEM: The shop has priced the customer's request at {price}. \
                         Tell the customer this price, give the updated total, and ask them to confirm.]"
                    ),
                    summary: format!("💰 Sent {price} to {label}."),
                })
            }
            Command::Confirm(code) => self.confirm(&code).await,
            Command::Allow(code) => {
                let (conversation, label) = self.resolve_for_turn(&code)?;
                Ok(Applied::Turn {
                    conversation,
                    turn: "[SYSTEM: The shop has APPROVED the customer's add-on request. \
                           Add it to their order, give the new total, and confirm the updated order.]"
                        .to_string(),
                    summary: format!("👍 Add-on approved for {label}."),
                })
            }
            Command::Deny(code) => {
                let (conversation, label) = self.resolve_for_turn(&code)?;
                Ok(Applied::Turn {
                    conversation,
                    turn: "[SYSTEM: The shop has DECLINED the customer's add-on request because \
                           the order is already being prepared. Apologise politely. Do not change \
                           the order or the total.]"
                        .to_string(),
                    summary: format!("👎 Add-on declined for {label}."),
                })
            }
            Command::Message { code, text } => {
                let conversation = self.resolve(&code)?;
                let label = app.registry.code_for(&conversation);
                let newly = app.overrides.enter(&conversation);
                let mut text_back = if newly {
                    format!(
                        "🙋 Human mode ON for {label}. The bot is quiet for them and their \
                         messages come to you. Send `resume {label}` to hand back."
                    )
                } else {
                    format!("🙋 Sent to {label} (human mode already active).")
                };
                if let Err(e) = app.notifier.send_text(&conversation, &text).await {
                    text_back.push_str(&format!("\n⚠️ Delivery to the customer failed: {e}"));
                }
                reply(text_back)
            }
            Command::Resume(code) => {
                let conversation = self.resolve(&code)?;
                let label = app.registry.code_for(&conversation);
                reply(if app.overrides.leave(&conversation) {
                    format!("🤖 Bot resumed for {label}.")
                } else {
                    format!("{label} was not in human mode.")
                })
            }
            Command::Status => reply(self.status().await),
            Command::Shutdown => {
                self.require_super_admin(issuer, "shutdown")?;
                app.shop.write().await.subscription_active = false;
                warn!("service suspended by owner");
                reply("🛑 Service suspended. Everyone but you gets the suspension notice until `restart`.".into())
            }
            Command::Restart => {
                self.require_super_admin(issuer, "restart")?;
                app.shop.write().await.subscription_active = true;
                info!("service restored by owner");
                reply("▶️ Service restored.".into())
            }
            Command::Help => reply(HELP.to_string()),
        }
    }

    async fn confirm(&self, code: &str) -> Result<Applied, CommandError> {
        let app = &self.app;
        let known = app.registry.resolve(code);
        let canonical = match &known {
            Some(c) => app.registry.code_for(c),
            None => code.trim().to_ascii_uppercase(),
        };

        let persisted = match app.storage.mark_order_confirmed(&canonical).await {
            Ok(found) => {
                if found.is_none() {
                    warn!(order_code = %canonical, "no pending order to confirm");
                }
                found
            }
            Err(e) => {
                error!(order_code = %canonical, error = %e, "failed to confirm order in storage");
                None
            }
        };

        let conversation = match (known, persisted.clone()) {
            (Some(c), _) => c,
            (None, Some(c)) => {
                app.registry.restore(&c, &canonical);
                c
            }
            (None, None) => return Err(CommandError::UnknownCode(code.to_string())),
        };

        let record = if persisted.is_some() {
            ""
        } else {
            "\n⚠️ No pending order record was updated."
        };
        let summary = format!("✅ Order {canonical} confirmed.{record}");
        if app.overrides.contains(&conversation) {
            let label = app.registry.code_for(&conversation);
            return Ok(Applied::Reply(format!(
                "{summary}\n🙋 {label} is in human mode, so the bot stayed quiet. \
                 Tell the customer yourself with `msg {label} <text>`."
            )));
        }
        Ok(Applied::Turn {
            conversation,
            turn: "[SYSTEM: The shop has confirmed this customer's order and payment. \
                   Thank them and let them know their order is being prepared.]"
                .to_string(),
            summary,
        })
    }

    /// Drives a synthetic turn through the responder and delivers the result.
    /// Returns a note for the admin reply, empty when everything worked.
    async fn converse(&self, conversation: &ConversationId, turn: &str) -> String {
        let reply = self.app.responder.respond(conversation, turn).await;
        let delivered = self
            .app
            .fanout
            .deliver(conversation, turn, &reply.text)
            .await;

        let mut note = String::new();
        if reply.outcome == ReplyOutcome::TotalFailure {
            note.push_str("\n⚠️ The assistant is unavailable; the customer got the apology message.");
        }
        if let Err(e) = delivered.customer {
            note.push_str(&format!("\n⚠️ Delivery to the customer failed: {e}"));
        }
        note
    }

    async fn status(&self) -> String {
        let app = &self.app;
        let shop = app.shop.read().await.clone();
        let accepting = app.hours.is_accepting(&shop, app.clock.now());

        let mut lines = vec![
            "📊 Status".to_string(),
            format!(
                "Mode: {} (schedule {}), accepting orders: {}",
                shop.mode,
                app.hours.describe(),
                if accepting { "yes" } else { "no" }
            ),
        ];
        if let Some(reason) = &shop.pause_reason {
            lines.push(format!("Paused: {reason}"));
        }
        lines.push(format!(
            "Out of stock: {}",
            join_or_none(shop.out_of_stock.iter())
        ));
        lines.push(format!(
            "Service: {}",
            if shop.subscription_active {
                "active"
            } else {
                "SUSPENDED"
            }
        ));

        let members = app.overrides.members();
        if members.is_empty() {
            lines.push("Human mode: none".into());
        } else {
            lines.push(format!("Human mode ({}):", members.len()));
            for c in members {
                lines.push(format!("• {} ({c})", app.registry.code_for(&c)));
            }
        }
        lines.join("\n")
    }

    async fn set_mode(&self, mode: ShopMode) {
        self.app.shop.write().await.mode = mode;
        info!(mode = %mode, "shop mode changed");
    }

    fn resolve(&self, code: &str) -> Result<ConversationId, CommandError> {
        self.app
            .registry
            .resolve(code)
            .ok_or_else(|| CommandError::UnknownCode(code.to_string()))
    }

    /// Resolves a code for a synthetic turn. Conversations an operator has
    /// taken over are refused.
    fn resolve_for_turn(&self, code: &str) -> Result<(ConversationId, String), CommandError> {
        let conversation = self.resolve(code)?;
        let label = self.app.registry.code_for(&conversation);
        if self.app.overrides.contains(&conversation) {
            return Err(CommandError::HumanMode(label));
        }
        Ok((conversation, label))
    }

    fn require_super_admin(
        &self,
        issuer: &ConversationId,
        command: &str,
    ) -> Result<(), CommandError> {
        if self.app.is_super_admin(issuer) {
            Ok(())
        } else {
            Err(CommandError::Unauthorized(format!(
                "only the owner can use `{command}`."
            )))
        }
    }
}

fn join_or_none<'a>(items: impl Iterator<Item = &'a String>) -> String {
    let joined: Vec<&str> = items.map(String::as_str).collect();
    if joined.is_empty() {
        "none".to_string()
    } else {
        joined.join(", ")
    }
}
