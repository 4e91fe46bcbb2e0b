// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete routing pipeline.
//!
//! Each test builds an isolated TestHarness with temp SQLite, mock adapters,
//! and a fixed clock. Tests are independent and order-insensitive.

use chrono::{TimeZone, Utc};
use plugline_agent::{Backend, Outcome, ReplyOutcome};
use plugline_core::types::ConversationId;
use plugline_storage::OrderStatus;
use plugline_test_utils::TestHarness;
use plugline_test_utils::harness::{DEFAULT_OPERATOR, DEFAULT_OWNER};

const CUSTOMER: &str = "2348011111111";

fn customer() -> ConversationId {
    ConversationId::new(CUSTOMER)
}

// ---- Order lifecycle ----

#[tokio::test]
async fn order_is_recorded_then_confirmed_by_operator() {
    let h = TestHarness::builder()
        .with_mock_responses(vec![
            "[NEW_ORDER]\nName: Ada\n2x Solo beef\nTotal: N6400\n[END_TICKET]\nThanks for ordering!"
                .to_string(),
            "Great news, your order is confirmed and on the grill.".to_string(),
        ])
        .build()
        .await
        .unwrap();

    let outcome = h.send_text("m1", CUSTOMER, "2 solo beef please, I'm Ada").await;
    assert_eq!(outcome, Outcome::Replied(ReplyOutcome::Answered(Backend::Primary)));

    let code = h.app.registry.existing_code(&customer()).unwrap();
    let orders = h.orders().await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order_code, code);
    assert_eq!(orders[0].status, OrderStatus::Pending);
    assert_eq!(orders[0].details, "Name: Ada\n2x Solo beef\nTotal: N6400");

    let alert = &h.channel.texts_to(DEFAULT_OPERATOR).await[0];
    assert!(alert.contains(&format!("confirm {code}")));

    let outcome = h
        .send_text("a1", DEFAULT_OPERATOR, &format!("confirm {}", code.to_lowercase()))
        .await;
    assert_eq!(outcome, Outcome::Admin);

    let orders = h.orders().await.unwrap();
    assert_eq!(orders[0].status, OrderStatus::Confirmed);
    let to_customer = h.channel.texts_to(CUSTOMER).await;
    assert_eq!(
        to_customer.last().map(String::as_str),
        Some("Great news, your order is confirmed and on the grill.")
    );
}

#[tokio::test]
async fn customer_keeps_one_code_across_orders() {
    let h = TestHarness::builder()
        .with_mock_responses(vec![
            "[NEW_ORDER]\nSolo beef\n[END_TICKET]".to_string(),
            "[ADD_ON_ORDER]\nExtra cheese\n[END_TICKET]".to_string(),
        ])
        .build()
        .await
        .unwrap();

    h.send_text("m1", CUSTOMER, "solo beef").await;
    h.send_text("m2", CUSTOMER, "add cheese").await;

    let orders = h.orders().await.unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].order_code, orders[1].order_code);
}

// ---- Failover ----

#[tokio::test]
async fn fallback_answers_when_primary_is_down() {
    let h = TestHarness::builder().build().await.unwrap();
    for _ in 0..=h.config.responder.retries {
        h.primary.push_failure("503 overloaded").await;
    }
    h.fallback.push_reply("Backup brain here, what can I get you?").await;

    let outcome = h.send_text("m1", CUSTOMER, "hello").await;
    assert_eq!(outcome, Outcome::Replied(ReplyOutcome::FailedOver));
    assert_eq!(
        h.channel.texts_to(CUSTOMER).await,
        vec!["Backup brain here, what can I get you?"]
    );

    // The session stays on the fallback.
    h.fallback.push_reply("Still me!").await;
    let outcome = h.send_text("m2", CUSTOMER, "one solo beef").await;
    assert_eq!(outcome, Outcome::Replied(ReplyOutcome::Answered(Backend::Fallback)));
}

#[tokio::test]
async fn total_failure_sends_apology() {
    let h = TestHarness::builder().build().await.unwrap();
    for _ in 0..=h.config.responder.retries {
        h.primary.push_failure("timeout").await;
    }

    let outcome = h.send_text("m1", CUSTOMER, "hello").await;
    assert_eq!(outcome, Outcome::Replied(ReplyOutcome::TotalFailure));
    assert_eq!(
        h.channel.texts_to(CUSTOMER).await,
        vec![h.app.responder.apology().to_string()]
    );
}

// ---- Gates ----

#[tokio::test]
async fn duplicate_delivery_is_answered_once() {
    let h = TestHarness::builder().build().await.unwrap();
    h.send_text("wamid.1", CUSTOMER, "hi").await;
    let outcome = h.send_text("wamid.1", CUSTOMER, "hi").await;
    assert_eq!(outcome, Outcome::Duplicate);
    assert_eq!(h.primary.call_count().await, 1);
}

#[tokio::test]
async fn closed_hours_send_excuse_but_admin_still_works() {
    let h = TestHarness::builder()
        .at(Utc.with_ymd_and_hms(2026, 3, 14, 23, 30, 0).unwrap())
        .build()
        .await
        .unwrap();

    assert_eq!(h.send_text("m1", CUSTOMER, "hi").await, Outcome::Closed);
    assert_eq!(
        h.channel.texts_to(CUSTOMER).await,
        vec![h.app.shop_config.closed_message.clone()]
    );

    assert_eq!(h.send_text("a1", DEFAULT_OPERATOR, "open").await, Outcome::Admin);
    assert!(matches!(
        h.send_text("m2", CUSTOMER, "hi again").await,
        Outcome::Replied(_)
    ));
}

#[tokio::test]
async fn owner_kill_switch_suspends_and_restores() {
    let h = TestHarness::builder().build().await.unwrap();

    assert_eq!(h.send_text("o1", DEFAULT_OWNER, "shutdown").await, Outcome::Admin);
    assert_eq!(h.send_text("m1", CUSTOMER, "hi").await, Outcome::Suspended);
    assert_eq!(
        h.channel.texts_to(CUSTOMER).await,
        vec![h.app.shop_config.suspension_message.clone()]
    );

    assert_eq!(h.send_text("o2", DEFAULT_OWNER, "restart").await, Outcome::Admin);
    assert!(matches!(
        h.send_text("m2", CUSTOMER, "hi").await,
        Outcome::Replied(_)
    ));
}

// ---- Human handoff ----

#[tokio::test]
async fn escalation_then_operator_takeover_and_release() {
    let h = TestHarness::builder()
        .with_mock_responses(vec![
            "I'm sorry, let me get a manager. [HUMAN_NEEDED]".to_string(),
            "Welcome back! Anything else?".to_string(),
        ])
        .build()
        .await
        .unwrap();

    h.send_text("m1", CUSTOMER, "my rider never came!!").await;
    let code = h.app.registry.existing_code(&customer()).unwrap();
    let alert = &h.channel.texts_to(DEFAULT_OWNER).await[0];
    assert!(alert.contains("my rider never came!!"));
    assert!(alert.contains(&format!("msg {code}")));

    h.send_text("a1", DEFAULT_OPERATOR, &format!("msg {code} So sorry, rider is 5 mins away"))
        .await;
    assert_eq!(
        h.channel.texts_to(CUSTOMER).await.last().map(String::as_str),
        Some("So sorry, rider is 5 mins away")
    );

    let calls_before = h.primary.call_count().await;
    assert_eq!(h.send_text("m2", CUSTOMER, "ok thanks").await, Outcome::Forwarded);
    assert_eq!(h.primary.call_count().await, calls_before);
    assert!(
        h.channel
            .texts_to(DEFAULT_OPERATOR)
            .await
            .iter()
            .any(|t| t.contains("ok thanks"))
    );

    h.send_text("a2", DEFAULT_OPERATOR, &format!("resume {code}")).await;
    assert_eq!(
        h.send_text("m3", CUSTOMER, "can I add a drink?").await,
        Outcome::Replied(ReplyOutcome::Answered(Backend::Primary))
    );
}

#[tokio::test]
async fn non_admin_commands_go_to_the_assistant() {
    let h = TestHarness::builder()
        .with_mock_responses(vec!["We are open from 10am!".to_string()])
        .build()
        .await
        .unwrap();
    let outcome = h.send_text("m1", CUSTOMER, "status").await;
    assert_eq!(outcome, Outcome::Replied(ReplyOutcome::Answered(Backend::Primary)));
    assert_eq!(h.channel.texts_to(CUSTOMER).await, vec!["We are open from 10am!"]);
}
