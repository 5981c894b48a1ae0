//! Request/response transport to the backend.
//!
//! Every call is a transaction: the backend applies all requests or none.

pub mod ws;

use {
    async_trait::async_trait,
    krypta_protocol::{Action, Request},
    serde_json::Value,
};

use crate::error::TransportError;

pub use ws::WsTransport;

/// A connection that can submit transactions to the backend.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Submit `requests` as one atomic transaction and return one payload per
    /// request, in order.
    async fn send_multiple(&self, requests: Vec<Request>) -> Result<Vec<Value>, TransportError>;

    /// Set (or clear) the auth token attached to later transactions.
    fn set_token(&self, token: Option<String>);

    /// Submit a single request.
    async fn send(&self, request: Request) -> Result<Value, TransportError> {
        self.send_multiple(vec![request])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| TransportError::Protocol("empty response".to_string()))
    }
}

/// Send a typed action and decode its typed response.
pub async fn call<T, A>(transport: &T, action: &A) -> Result<A::Response, TransportError>
where
    T: Transport + ?Sized,
    A: Action + Sync,
{
    let payload = transport.send(Request::from_action(action)?).await?;
    Ok(serde_json::from_value(payload)?)
}
