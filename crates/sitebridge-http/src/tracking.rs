//! Order tracking over a hidden-input form login.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use sitebridge_core::traits::{Authenticate, ProtectedOperation};
use sitebridge_core::{
    BaseUrl, BridgeConfig, Credentials, Outcome, Result, StatusObject, Target,
    execute_authenticated,
};

use crate::authenticator::LoginProfile;
use crate::http::PageResponse;
use crate::session::{Caller, SessionClient};

/// Production site root.
pub const DEFAULT_BASE_URL: &str = "https://montreal.lufa.com";

const ORDER_SUMMARY_PATH: &str = "fr/superMarket/GetUserOrderDetails";
const TRACK_ORDER_PATH: &str = "fr/orders/getTrackOrderData";

/// Status of the current order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderStatus {
    pub order_id: String,
    pub details: StatusObject,
}

/// Client for the order-tracking site.
#[derive(Debug)]
pub struct TrackingClient {
    inner: SessionClient,
}

impl TrackingClient {
    pub fn new(credentials: Credentials, base: Option<BaseUrl>, timeout: Duration) -> Result<Self> {
        let base = match base {
            Some(base) => base,
            None => BaseUrl::new(DEFAULT_BASE_URL)?,
        };
        let inner = SessionClient::new(base, LoginProfile::order_tracking(), credentials, timeout)?;
        Ok(Self { inner })
    }

    /// Build from the `tracking` section of `config`.
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        let credentials = config.credentials(Target::Tracking)?;
        let client = Self::new(
            credentials,
            config.base_url(Target::Tracking)?,
            config.timeout(),
        )?;
        Ok(Self {
            inner: client.inner.with_heuristic(config.heuristic()),
        })
    }

    pub fn session_client(&mut self) -> &mut SessionClient {
        &mut self.inner
    }

    pub async fn login(&mut self) -> Result<()> {
        self.inner.login().await
    }

    /// Id of the active order, if there is one.
    #[instrument(skip(self))]
    pub async fn current_order_id(&mut self) -> Result<Option<String>> {
        execute_authenticated(&mut self.inner, &mut CurrentOrderId).await
    }

    /// Raw tracking data for `order_id`.
    #[instrument(skip(self))]
    pub async fn order_details(&mut self, order_id: &str) -> Result<StatusObject> {
        let mut operation = OrderDetails {
            order_id: order_id.to_string(),
        };
        execute_authenticated(&mut self.inner, &mut operation).await
    }

    /// Current order id and its tracking data, or `None` with no active order.
    pub async fn current_status(&mut self) -> Result<Option<OrderStatus>> {
        let Some(order_id) = self.current_order_id().await? else {
            info!("No active order");
            return Ok(None);
        };
        let details = self.order_details(&order_id).await?;
        Ok(Some(OrderStatus { order_id, details }))
    }
}

/// Expiration handling shared by the tracking calls.
fn check_page<T>(page: &PageResponse) -> Option<Outcome<T>> {
    if page.is_redirect() {
        return Some(Outcome::expired(format!(
            "redirected to {}",
            page.location.as_deref().unwrap_or("<unknown>")
        )));
    }
    if !page.is_success() {
        return Some(Outcome::Failed(page.status_error()));
    }
    None
}

/// Order id out of the summary JSON. Numbers are accepted as well as strings.
fn order_id_from(summary: &Value) -> Option<String> {
    let object = summary.as_object()?;
    if object.get("success").and_then(Value::as_bool) != Some(true) {
        return None;
    }
    match object.get("orderId")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

struct CurrentOrderId;

#[async_trait]
impl ProtectedOperation<SessionClient> for CurrentOrderId {
    type Output = Option<String>;

    async fn run(&mut self, client: &mut SessionClient) -> Outcome<Option<String>> {
        let page = match client.get(ORDER_SUMMARY_PATH, &[], Caller::Script).await {
            Ok(page) => page,
            Err(err) => return Outcome::Failed(err),
        };
        if let Some(outcome) = check_page(&page) {
            return outcome;
        }

        client
            .heuristic()
            .classify_json::<Value>("order summary", &page.body)
            .map(|summary| {
                let id = order_id_from(&summary);
                if id.is_none() {
                    debug!("Order summary carries no active order id");
                }
                id
            })
    }
}

struct OrderDetails {
    order_id: String,
}

#[async_trait]
impl ProtectedOperation<SessionClient> for OrderDetails {
    type Output = StatusObject;

    async fn run(&mut self, client: &mut SessionClient) -> Outcome<StatusObject> {
        let form = [("order_id", self.order_id.clone())];
        let page = match client.post_form(TRACK_ORDER_PATH, &form, Caller::Script).await {
            Ok(page) => page,
            Err(err) => return Outcome::Failed(err),
        };
        if let Some(outcome) = check_page(&page) {
            return outcome;
        }

        client
            .heuristic()
            .classify_json::<StatusObject>("order tracking", &page.body)
    }
}
