//! Client module for fetching quotes from the inference endpoint.
//!
//! Builds the chat request for a card, sends it through a [`Transport`] and
//! turns whatever comes back into display-ready text. Every failure is
//! absorbed into one of the fallback quotes, so callers never have to handle
//! an error.
use std::io::Read;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, error, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use ureq::Agent;
use ureq::tls::{TlsConfig, TlsProvider};

use crate::cards::CardId;
use crate::config::Config;
use crate::ident;

/// Quote shown when the request fails or the server answers with an error.
pub const TRANSPORT_FALLBACK: &str = "Every journey begins with a single step.";

/// Quote shown when the server answers without a usable quote.
pub const MISSING_QUOTE_FALLBACK: &str = "Stay motivated and keep moving forward!";

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-api-key";

/// Body of the chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteRequest
{
    /// Synthetic user id, fresh for every request.
    pub user_id: String,
    /// Agent that generates the quote.
    pub agent_id: String,
    /// Synthetic session id, fresh for every request.
    pub session_id: String,
    /// Instruction sent to the agent.
    pub message: String,
}

impl QuoteRequest
{
    /// Builds the request asking for a quote for `card_id`.
    pub fn for_card<R: Rng + ?Sized>(rng: &mut R, agent_id: &str, card_id: CardId) -> Self
    {
        Self {
            user_id: ident::user_id(rng),
            agent_id: agent_id.to_owned(),
            session_id: ident::session_id(rng, agent_id),
            message: quote_message(card_id),
        }
    }
}

/// Instruction text for a card.
#[must_use]
pub fn quote_message(card_id: CardId) -> String
{
    format!("Generate motivational quote for card {card_id}")
}

/// Successful answer of the endpoint.
///
/// Only `result.quote` is used. The remaining fields are accepted in any
/// shape so that they can never make an otherwise good answer unusable.
#[derive(Debug, Default, Deserialize)]
pub struct QuoteResponse
{
    /// Generated content.
    #[serde(default)]
    pub result: Option<QuoteResult>,
    /// Model confidence.
    #[serde(default)]
    pub confidence: Option<Value>,
    /// Processing details (`processing_time`, `source`).
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// The `result` object of a [`QuoteResponse`].
#[derive(Debug, Default, Deserialize)]
pub struct QuoteResult
{
    /// The quote itself.
    #[serde(default)]
    pub quote: Option<Value>,
    /// Per-quote details (`cardNumber`, `timestamp`, `isOriginal`).
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl QuoteResponse
{
    /// The quote text, if present, a string and not empty.
    #[must_use]
    pub fn quote(&self) -> Option<&str>
    {
        self.result
            .as_ref()?
            .quote
            .as_ref()?
            .as_str()
            .filter(|quote| !quote.is_empty())
    }
}

/// Status and body of an HTTP answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse
{
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl RawResponse
{
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub const fn is_success(&self) -> bool
    {
        matches!(self.status, 200..=299)
    }
}

/// Reasons a quote could not be fetched.
#[derive(Debug, Error)]
pub enum FetchError
{
    /// The request never produced an answer.
    #[error("request failed: {0:#}")]
    Transport(anyhow::Error),

    /// The server answered with a non-2xx status.
    #[error("server answered with status {0}")]
    Status(u16),

    /// The request could not be encoded or the answer is not JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The answer is the JSON literal `null`.
    #[error("response body is null")]
    NullBody,
}

/// Sends a JSON body to an endpoint.
///
/// Implementations must return non-2xx answers as [`RawResponse`] values and
/// only fail when no answer was received at all.
pub trait Transport: Send + Sync
{
    /// Posts `body` to `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent or the answer cannot be
    /// read.
    fn post_json(&self, url: &str, api_key: Option<&str>, body: &str) -> Result<RawResponse>;
}

/// [`Transport`] backed by a blocking `ureq` agent.
pub struct UreqTransport
{
    /// Shared HTTP agent.
    agent: Agent,
}

impl UreqTransport
{
    /// Create a new transport.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Global per-request timeout, `None` waits indefinitely.
    #[must_use]
    pub fn new(timeout: Option<Duration>) -> Self
    {
        let agent = Agent::config_builder()
            .timeout_global(timeout)
            // status codes are classified by the caller
            .http_status_as_error(false)
            .tls_config(
                TlsConfig::builder()
                    .provider(TlsProvider::NativeTls)
                    .build(),
            )
            .build();

        Self {
            agent: agent.into(),
        }
    }
}

impl Default for UreqTransport
{
    fn default() -> Self
    {
        Self::new(None)
    }
}

impl Transport for UreqTransport
{
    fn post_json(&self, url: &str, api_key: Option<&str>, body: &str) -> Result<RawResponse>
    {
        let mut request = self
            .agent
            .post(url)
            .header("Content-Type", "application/json");

        if let Some(key) = api_key
        {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send(body)
            .context(format!("Failed to send request to {url}"))?;

        let status = response.status().as_u16();

        let mut response_body = String::new();
        response
            .into_body()
            .into_reader()
            .read_to_string(&mut response_body)
            .context("Failed to read response body")?;

        Ok(RawResponse {
            status,
            body: response_body,
        })
    }
}

/// Client for fetching quotes.
///
/// Holds the endpoint settings and the transport used to reach it.
pub struct QuoteClient<T = UreqTransport>
{
    /// How requests are sent.
    transport: T,
    /// URL of the chat endpoint.
    endpoint: String,
    /// Agent that generates the quotes.
    agent_id: String,
    /// Credential sent in the `x-api-key` header.
    api_key: Option<String>,
}

impl QuoteClient<UreqTransport>
{
    /// Create a client that talks HTTP using the given configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self
    {
        Self::with_transport(
            UreqTransport::new(config.timeout),
            &config.endpoint,
            &config.agent_id,
            config.api_key.clone(),
        )
    }
}

impl<T: Transport> QuoteClient<T>
{
    /// Create a client over an arbitrary transport.
    #[must_use]
    pub fn with_transport(
        transport: T,
        endpoint: &str,
        agent_id: &str,
        api_key: Option<String>,
    ) -> Self
    {
        Self {
            transport,
            endpoint: endpoint.to_owned(),
            agent_id: agent_id.to_owned(),
            api_key,
        }
    }

    /// The transport in use.
    #[must_use]
    pub const fn transport(&self) -> &T
    {
        &self.transport
    }

    /// Fetch the quote for a card.
    ///
    /// # Returns
    ///
    /// `Ok(Some(quote))` for a usable quote, `Ok(None)` when the server
    /// answered successfully without one.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the status is not 2xx, or the
    /// body is not JSON or is JSON `null`.
    pub fn try_fetch(&self, card_id: CardId) -> Result<Option<String>, FetchError>
    {
        let request = QuoteRequest::for_card(&mut rand::rng(), &self.agent_id, card_id);
        let body = serde_json::to_string(&request)?;

        debug!(
            "Requesting quote for card {card_id} (session {})",
            request.session_id
        );

        let response = self
            .transport
            .post_json(&self.endpoint, self.api_key.as_deref(), &body)
            .map_err(FetchError::Transport)?;

        if !response.is_success()
        {
            return Err(FetchError::Status(response.status));
        }

        let value: Value = serde_json::from_str(&response.body)?;
        if value.is_null()
        {
            return Err(FetchError::NullBody);
        }

        Ok(QuoteResponse::deserialize(&value)
            .ok()
            .and_then(|parsed| parsed.quote().map(str::to_owned)))
    }

    /// Fetch the quote for a card, substituting a fallback on any failure.
    ///
    /// Never fails and never returns an empty string.
    pub fn fetch_quote(&self, card_id: CardId) -> String
    {
        match self.try_fetch(card_id)
        {
            Ok(Some(quote)) => quote,
            Ok(None) =>
            {
                warn!("Response for card {card_id} has no quote");
                MISSING_QUOTE_FALLBACK.to_owned()
            }
            Err(err) =>
            {
                error!("Error fetching quote for card {card_id}: {err}");
                TRANSPORT_FALLBACK.to_owned()
            }
        }
    }
}

#[cfg(test)]
mod tests
{
    use std::sync::Mutex;

    use anyhow::anyhow;

    use super::*;

    /// Answers every request with a canned outcome and records the bodies.
    struct CannedTransport
    {
        outcome: std::result::Result<RawResponse, String>,
        requests: Mutex<Vec<(String, Option<String>, String)>>,
    }

    impl CannedTransport
    {
        fn answering(status: u16, body: &str) -> Self
        {
            Self {
                outcome: Ok(RawResponse {
                    status,
                    body: body.to_owned(),
                }),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing(reason: &str) -> Self
        {
            Self {
                outcome: Err(reason.to_owned()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn sent(&self) -> Vec<(String, Option<String>, String)>
        {
            self.requests
                .lock()
                .expect("lock")
                .clone()
        }
    }

    impl Transport for CannedTransport
    {
        fn post_json(&self, url: &str, api_key: Option<&str>, body: &str) -> Result<RawResponse>
        {
            self.requests
                .lock()
                .expect("lock")
                .push((url.to_owned(), api_key.map(str::to_owned), body.to_owned()));

            self.outcome
                .clone()
                .map_err(|reason| anyhow!(reason))
        }
    }

    fn client(transport: CannedTransport) -> QuoteClient<CannedTransport>
    {
        QuoteClient::with_transport(
            transport,
            "https://quotes.invalid/chat",
            "agent-42",
            Some("secret".to_owned()),
        )
    }

    #[test]
    fn returns_quote_verbatim()
    {
        let client = client(CannedTransport::answering(
            200,
            r#"{"result":{"quote":"Be bold.","metadata":{"cardNumber":1}},"confidence":0.9}"#,
        ));

        assert_eq!(client.fetch_quote(1), "Be bold.");
    }

    #[test]
    fn missing_quote_uses_its_fallback()
    {
        for body in [
            r#"{"result":{}}"#,
            r"{}",
            r#"{"result":{"quote":""}}"#,
            r#"{"result":{"quote":17}}"#,
            r#"{"result":"nope"}"#,
        ]
        {
            let client = client(CannedTransport::answering(200, body));
            assert_eq!(client.fetch_quote(2), MISSING_QUOTE_FALLBACK, "body {body}");
        }
    }

    #[test]
    fn error_status_uses_transport_fallback()
    {
        let client = client(CannedTransport::answering(
            500,
            r#"{"result":{"quote":"ignored"}}"#,
        ));

        assert!(matches!(client.try_fetch(1), Err(FetchError::Status(500))));
        assert_eq!(client.fetch_quote(1), TRANSPORT_FALLBACK);
    }

    #[test]
    fn network_error_uses_transport_fallback()
    {
        let client = client(CannedTransport::failing("connection refused"));

        assert!(matches!(client.try_fetch(3), Err(FetchError::Transport(_))));
        assert_eq!(client.fetch_quote(3), TRANSPORT_FALLBACK);
    }

    #[test]
    fn non_json_body_uses_transport_fallback()
    {
        let client = client(CannedTransport::answering(200, "<html>oops</html>"));

        assert!(matches!(client.try_fetch(1), Err(FetchError::Json(_))));
        assert_eq!(client.fetch_quote(1), TRANSPORT_FALLBACK);
    }

    #[test]
    fn null_body_uses_transport_fallback()
    {
        let client = client(CannedTransport::answering(200, " null "));

        assert!(matches!(client.try_fetch(1), Err(FetchError::NullBody)));
        assert_eq!(client.fetch_quote(1), TRANSPORT_FALLBACK);
    }

    #[test]
    fn request_carries_agent_and_card()
    {
        let client = client(CannedTransport::answering(200, r#"{"result":{"quote":"x"}}"#));
        client.fetch_quote(2);

        let sent = client.transport().sent();
        assert_eq!(sent.len(), 1);

        let (url, api_key, body) = &sent[0];
        assert_eq!(url, "https://quotes.invalid/chat");
        assert_eq!(api_key.as_deref(), Some("secret"));

        let json: Value = serde_json::from_str(body).expect("body is JSON");
        assert_eq!(json["agent_id"], "agent-42");
        assert_eq!(json["message"], "Generate motivational quote for card 2");
        assert!(
            json["user_id"]
                .as_str()
                .is_some_and(|user| user.ends_with("@test.com"))
        );
        assert!(
            json["session_id"]
                .as_str()
                .is_some_and(|session| session.starts_with("agent-42-"))
        );
    }

    #[test]
    fn each_request_gets_fresh_ids()
    {
        let client = client(CannedTransport::answering(200, r#"{"result":{"quote":"x"}}"#));
        client.fetch_quote(1);
        client.fetch_quote(1);

        let bodies: Vec<Value> = client
            .transport()
            .sent()
            .iter()
            .map(|(_, _, body)| serde_json::from_str(body).expect("body is JSON"))
            .collect();

        assert_ne!(bodies[0]["session_id"], bodies[1]["session_id"]);
        assert_ne!(bodies[0]["user_id"], bodies[1]["user_id"]);
    }

    #[test]
    fn success_range()
    {
        let response = |status| RawResponse {
            status,
            body: String::new(),
        };

        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(!response(199).is_success());
        assert!(!response(301).is_success());
        assert!(!response(404).is_success());
    }
}
