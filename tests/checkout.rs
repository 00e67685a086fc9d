mod support;

use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shagun::config::PaymentSettings;
use shagun::errors::ApiError;
use shagun::handlers::contributions::{CheckoutError, CheckoutFlow, CheckoutState};
use shagun::models::contribution::Relation;
use shagun::models::event::Event;
use shagun::requests::contribution::{ContributionRequest, PaymentMethod};
use shagun::services::contributions::ContributionsApi;
use shagun::services::gateway::Gateway;
use shagun::services::handoff::HandoffError;
use shagun::services::upi::Platform;
use support::{FakeSession, RecordingNavigator, ScriptedHost};

const ADD_PATH: &str = "/contributions/add/evt1";

fn event(upi_id: &str) -> Event {
    Event {
        id: "evt1".into(),
        occasion_type: "wedding".into(),
        bride_name: "Asha".into(),
        groom_name: "Rohan".into(),
        event_date: NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
        upi_id: upi_id.into(),
        owner_id: "uid-1".into(),
        total_amount: None,
        contributions_count: None,
        created_at: None,
    }
}

fn form(amount: &str, method: PaymentMethod) -> ContributionRequest {
    ContributionRequest {
        name: "Meera".into(),
        amount: amount.into(),
        relation: Relation::Bride,
        message: "Blessings!".into(),
        method,
    }
}

fn settings() -> PaymentSettings {
    PaymentSettings {
        fallback_delay_ms: 20,
        intent_ttl_secs: 900,
    }
}

fn flow(server: &MockServer, host: ScriptedHost, settings: &PaymentSettings) -> CheckoutFlow<ScriptedHost> {
    // guests have no session; the record goes over the public route
    let gateway = Gateway::with_client(
        Client::new(),
        &server.uri(),
        "/",
        Arc::new(FakeSession::unauthenticated()),
        Arc::new(RecordingNavigator::default()),
    );
    CheckoutFlow::new(ContributionsApi::new(Arc::new(gateway)), host, settings)
}

fn gpay_on_android() -> ScriptedHost {
    ScriptedHost::new(Platform::Android, |uri| uri.starts_with("intent://gpay/"))
}

fn recorded_body() -> serde_json::Value {
    json!({
        "eventId": "evt1",
        "name": "Meera",
        "amount": 501,
        "relation": "bride",
        "message": "Blessings!"
    })
}

#[tokio::test]
async fn confirmed_payment_records_exactly_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ADD_PATH))
        .and(body_json(recorded_body()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let flow = flow(&server, gpay_on_android(), &settings());
    let state = flow.submit(&event("bride@upi"), &form("501", PaymentMethod::Upi)).await.unwrap();

    let CheckoutState::AwaitingConfirmation { intent, app } = state else {
        panic!("expected confirmation prompt");
    };
    assert_eq!(app, "Google Pay");
    assert_eq!(intent.amount, Decimal::from(501));
    assert_eq!(flow.host().opened().len(), 1);
    assert!(flow.host().opened()[0].contains("pa=bride%40upi"));

    let CheckoutState::ThankYou(receipt) = flow.confirm(true).await.unwrap() else {
        panic!("expected thank-you");
    };
    assert_eq!(receipt.display_amount, "₹501");
    assert_eq!(receipt.couple, "Asha & Rohan");
    assert_eq!(receipt.transaction_id, Some(intent.transaction_id));
    assert_eq!(receipt.share_text, "I just sent my blessings to Asha & Rohan's wedding!");
    assert!(flow.pending_intent().await.is_none());

    // the intent is consumed, a second answer has nothing to confirm
    assert_eq!(flow.confirm(true).await, Err(CheckoutError::NoPendingPayment));
}

#[tokio::test]
async fn declined_payment_creates_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let flow = flow(&server, gpay_on_android(), &settings());
    flow.submit(&event("bride@upi"), &form("501", PaymentMethod::Upi)).await.unwrap();

    assert_eq!(flow.confirm(false).await, Ok(CheckoutState::Declined));
    assert!(flow.pending_intent().await.is_none());
}

#[tokio::test]
async fn desktop_is_rejected_before_any_launch() {
    let server = MockServer::start().await;
    let flow = flow(&server, ScriptedHost::silent(Platform::Desktop), &settings());

    let result = flow.submit(&event("bride@upi"), &form("501", PaymentMethod::Upi)).await;
    assert_eq!(result, Err(CheckoutError::Handoff(HandoffError::UnsupportedPlatform)));
    assert!(flow.host().opened().is_empty());
    assert!(flow.pending_intent().await.is_none());
}

#[tokio::test]
async fn ios_falls_back_through_apps_in_order() {
    let server = MockServer::start().await;
    let host = ScriptedHost::new(Platform::Ios, |uri| uri.starts_with("phonepe://"));
    let flow = flow(&server, host, &settings());

    let state = flow.submit(&event("bride@upi"), &form("501", PaymentMethod::Upi)).await.unwrap();
    assert!(matches!(
        state,
        CheckoutState::AwaitingConfirmation { app: "PhonePe", .. }
    ));

    let opened = flow.host().opened();
    assert_eq!(opened.len(), 3);
    assert!(opened[0].starts_with("gpay://upi/pay?"));
    assert!(opened[1].starts_with("https://pay.google.com/pay?"));
    assert!(opened[2].starts_with("phonepe://pay?"));
}

#[tokio::test]
async fn unopenable_app_falls_through_to_the_next() {
    let server = MockServer::start().await;
    let host = ScriptedHost::new(Platform::Android, |uri| uri.starts_with("intent://phonepe/"))
        .refusing(|uri| uri.contains("gpay"));
    let flow = flow(&server, host, &settings());

    let state = flow.submit(&event("bride@upi"), &form("501", PaymentMethod::Upi)).await.unwrap();
    assert!(matches!(
        state,
        CheckoutState::AwaitingConfirmation { app: "PhonePe", .. }
    ));

    let opened = flow.host().opened();
    assert_eq!(opened.len(), 3);
    assert!(opened[0].starts_with("intent://gpay/"));
    assert!(opened[1].starts_with("gpay://"));
    assert!(opened[2].starts_with("intent://phonepe/"));
}

#[tokio::test]
async fn every_launch_failing_is_no_app_responded() {
    let server = MockServer::start().await;
    let host = ScriptedHost::silent(Platform::Ios).refusing(|_| true);
    let flow = flow(&server, host, &settings());

    let result = flow.submit(&event("bride@upi"), &form("501", PaymentMethod::Upi)).await;
    assert_eq!(result, Err(CheckoutError::Handoff(HandoffError::NoAppResponded)));
    assert!(flow.pending_intent().await.is_none());
}

#[tokio::test]
async fn no_responding_app_clears_the_attempt() {
    let server = MockServer::start().await;
    let flow = flow(&server, ScriptedHost::silent(Platform::Android), &settings());

    let result = flow.submit(&event("bride@upi"), &form("501", PaymentMethod::Upi)).await;
    assert_eq!(result, Err(CheckoutError::Handoff(HandoffError::NoAppResponded)));

    let opened = flow.host().opened();
    assert_eq!(opened.len(), 7);
    assert!(opened.last().unwrap().starts_with("upi://pay?"));
    assert!(flow.pending_intent().await.is_none());
}

#[tokio::test]
async fn failed_record_can_be_resubmitted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ADD_PATH))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ADD_PATH))
        .and(body_json(recorded_body()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let flow = flow(&server, gpay_on_android(), &settings());
    flow.submit(&event("bride@upi"), &form("501", PaymentMethod::Upi)).await.unwrap();

    let first = flow.confirm(true).await;
    assert_eq!(
        first,
        Err(CheckoutError::Api(ApiError::ServerError { status: 500 }))
    );
    assert!(flow.pending_intent().await.is_some());

    assert!(matches!(
        flow.confirm(true).await,
        Ok(CheckoutState::ThankYou(_))
    ));
}

#[tokio::test]
async fn stale_intent_is_not_recorded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let stale = PaymentSettings {
        fallback_delay_ms: 20,
        intent_ttl_secs: -1,
    };
    let flow = flow(&server, gpay_on_android(), &stale);
    flow.submit(&event("bride@upi"), &form("501", PaymentMethod::Upi)).await.unwrap();

    assert!(matches!(
        flow.confirm(true).await,
        Err(CheckoutError::IntentExpired { .. })
    ));
}

#[tokio::test]
async fn cash_gift_is_recorded_without_handoff() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ADD_PATH))
        .and(body_json(recorded_body()))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let flow = flow(&server, ScriptedHost::silent(Platform::Desktop), &settings());
    let state = flow.submit(&event("bride@upi"), &form("501", PaymentMethod::Cash)).await.unwrap();

    let CheckoutState::ThankYou(receipt) = state else {
        panic!("expected thank-you");
    };
    assert_eq!(receipt.transaction_id, None);
    assert!(flow.host().opened().is_empty());
}

#[tokio::test]
async fn malformed_input_never_reaches_a_payment_app() {
    let server = MockServer::start().await;
    let flow = flow(&server, gpay_on_android(), &settings());

    let result = flow.submit(&event(""), &form("501", PaymentMethod::Upi)).await;
    assert!(matches!(
        result,
        Err(CheckoutError::Handoff(HandoffError::MalformedInput(_)))
    ));

    let result = flow.submit(&event("bride@upi"), &form("abc", PaymentMethod::Upi)).await;
    assert!(matches!(result, Err(CheckoutError::Invalid(_))));
    assert!(flow.host().opened().is_empty());
}

#[tokio::test]
async fn confirm_without_submit_is_rejected() {
    let server = MockServer::start().await;
    let flow = flow(&server, gpay_on_android(), &settings());
    assert_eq!(flow.confirm(true).await, Err(CheckoutError::NoPendingPayment));
}
