//! UPI payment URIs and the apps that can open them.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::Utc;
use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use url::form_urlencoded;

use crate::models::contribution::CreateContribution;
use crate::models::event::Event;
use crate::models::payment::PaymentRequest;
use crate::requests::contribution::check_amount;
use crate::requests::is_valid_upi_id;
use crate::services::handoff::HandoffError;

pub const CURRENCY: &str = "INR";
pub const UPI_BASE: &str = "upi://pay";

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

lazy_static! {
    static ref IOS_AGENT: Regex = Regex::new(r"(?i)iPhone|iPad|iPod").expect("valid iOS pattern");
    static ref ANDROID_AGENT: Regex = Regex::new(r"(?i)Android").expect("valid Android pattern");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Android,
    Ios,
    Desktop,
}

impl Platform {
    pub fn from_user_agent(user_agent: &str) -> Self {
        if IOS_AGENT.is_match(user_agent) {
            Platform::Ios
        } else if ANDROID_AGENT.is_match(user_agent) {
            Platform::Android
        } else {
            Platform::Desktop
        }
    }

    pub fn is_mobile(self) -> bool {
        matches!(self, Platform::Android | Platform::Ios)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UniversalLink {
    /// `<prefix>?<query>`
    Query(&'static str),
    /// `<prefix><base64 of the upi:// uri>`
    EncodedUri(&'static str),
    /// Same as the generic `upi://` uri.
    Generic,
}

/// A payment app reachable by deep link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentApp {
    pub name: &'static str,
    /// App-specific base, e.g. `gpay://upi/pay`.
    pub scheme_base: &'static str,
    universal: UniversalLink,
    pub android_package: Option<&'static str>,
}

pub const GOOGLE_PAY: PaymentApp = PaymentApp {
    name: "Google Pay",
    scheme_base: "gpay://upi/pay",
    universal: UniversalLink::Query("https://pay.google.com/pay"),
    android_package: Some("com.google.android.apps.nbu.paisa.user"),
};

pub const PHONEPE: PaymentApp = PaymentApp {
    name: "PhonePe",
    scheme_base: "phonepe://pay",
    universal: UniversalLink::EncodedUri("https://phon.pe/ru_"),
    android_package: Some("com.phonepe.app"),
};

pub const PAYTM: PaymentApp = PaymentApp {
    name: "Paytm",
    scheme_base: "paytmmp://pay",
    universal: UniversalLink::Query("https://paytm.com/upi"),
    android_package: Some("net.one97.paytm"),
};

pub const OTHER_UPI_APPS: PaymentApp = PaymentApp {
    name: "Other UPI Apps",
    scheme_base: UPI_BASE,
    universal: UniversalLink::Generic,
    android_package: None,
};

/// Handoff order: primary, secondary, tertiary, then any UPI app.
pub fn default_apps() -> Vec<PaymentApp> {
    vec![GOOGLE_PAY, PHONEPE, PAYTM, OTHER_UPI_APPS]
}

impl PaymentApp {
    pub fn app_uri(&self, request: &PaymentRequest) -> String {
        format!("{}?{}", self.scheme_base, request.query)
    }

    pub fn universal_link(&self, request: &PaymentRequest) -> String {
        match self.universal {
            UniversalLink::Query(prefix) => format!("{}?{}", prefix, request.query),
            UniversalLink::EncodedUri(prefix) => format!("{}{}", prefix, STANDARD.encode(&request.uri)),
            UniversalLink::Generic => request.uri.clone(),
        }
    }

    /// `intent://` form of the app uri, pinned to the app's package.
    pub fn intent_uri(&self, request: &PaymentRequest) -> Option<String> {
        let package = self.android_package?;
        let app_uri = self.app_uri(request);
        let (scheme, rest) = app_uri.split_once("://")?;
        Some(format!(
            "intent://{}/{}#Intent;scheme={};package={};end",
            scheme, rest, scheme, package
        ))
    }

    /// URIs to try for this app, in order.
    pub fn launch_sequence(&self, platform: Platform, request: &PaymentRequest) -> Vec<String> {
        match platform {
            Platform::Android => self
                .intent_uri(request)
                .into_iter()
                .chain(std::iter::once(self.app_uri(request)))
                .collect(),
            Platform::Ios => {
                let mut uris = vec![self.app_uri(request)];
                let universal = self.universal_link(request);
                if !uris.contains(&universal) {
                    uris.push(universal);
                }
                uris
            }
            Platform::Desktop => Vec::new(),
        }
    }
}

/// `<unix millis>-<9 random base36 chars>`
pub fn generate_transaction_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}

/// Builds the `upi://pay` request for a gift to `event`.
pub fn build_payment_uri(
    event: &Event,
    contribution: &CreateContribution,
) -> Result<PaymentRequest, HandoffError> {
    let upi_id = event.upi_id.trim();
    if upi_id.is_empty() {
        return Err(HandoffError::MalformedInput(
            "event has no UPI id".to_string(),
        ));
    }
    if !is_valid_upi_id(upi_id) {
        return Err(HandoffError::MalformedInput(format!(
            "{upi_id:?} is not a UPI id"
        )));
    }
    check_amount(contribution.amount)
        .map_err(|e| HandoffError::MalformedInput(e.to_string()))?;

    let transaction_id = generate_transaction_id();
    let amount = contribution.amount.to_string();
    let note = format!("Shagun for {}'s wedding", event.bride_name);

    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("pa", upi_id)
        .append_pair("pn", &event.bride_name)
        .append_pair("am", &amount)
        .append_pair("cu", CURRENCY)
        .append_pair("tn", &note)
        .append_pair("tr", &transaction_id)
        .append_pair("mode", "00")
        .finish();

    Ok(PaymentRequest {
        uri: format!("{UPI_BASE}?{query}"),
        query,
        transaction_id,
        amount: contribution.amount,
        created_at: Utc::now(),
    })
}
