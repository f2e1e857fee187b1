//! OAuth 1.0a request signing and the one-time authorization flow.
//!
//! Mahara's web services authenticate every call with an OAuth 1.0a
//! `Authorization` header signed with HMAC-SHA1. The first run has no access
//! token yet, so [`OAuthFlow`] walks the out-of-band handshake:
//!
//! ```text
//! POST request_token (oauth_callback=oob)  -> request token
//! operator opens authorize?oauth_token=..  -> verifier (PIN)
//! POST access_token (oauth_verifier=..)    -> access token
//! ```

use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::transport::http::{MAX_BODY_SIZE, agent};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::{RngCore, rngs::OsRng};
use sha1::Sha1;
use std::collections::HashMap;
use std::fmt;
use url::Url;

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

/// Path of the OAuth endpoints below the Mahara base URL
pub const OAUTH_PATH: &str = "/artefact/webservice/oauthv1.php";

/// Consumer key and secret registered in Mahara
#[derive(Clone, PartialEq, Eq)]
pub struct Consumer {
    pub key: String,
    pub secret: String,
}

impl Consumer {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Produces signed `Authorization` headers
#[derive(Debug, Clone)]
pub struct Signer {
    consumer: Consumer,
    token: Option<Credentials>,
}

impl Signer {
    pub fn new(consumer: Consumer) -> Self {
        Self {
            consumer,
            token: None,
        }
    }

    /// Sign on behalf of a token
    #[must_use]
    pub fn with_token(mut self, token: Credentials) -> Self {
        self.token = Some(token);
        self
    }

    /// Header value for a request to `url`.
    ///
    /// `extra` carries additional `oauth_*` protocol parameters such as the
    /// callback or the verifier.
    pub fn authorization(&self, method: &str, url: &str, extra: &[(&str, &str)]) -> Result<String> {
        let mut nonce = [0u8; 16];
        OsRng.fill_bytes(&mut nonce);
        self.sign(
            method,
            url,
            extra,
            &URL_SAFE_NO_PAD.encode(nonce),
            Utc::now().timestamp(),
        )
    }

    fn sign(
        &self,
        method: &str,
        url: &str,
        extra: &[(&str, &str)],
        nonce: &str,
        timestamp: i64,
    ) -> Result<String> {
        let url = Url::parse(url).map_err(|e| Error::Authorization(format!("{url}: {e}")))?;
        let timestamp = timestamp.to_string();

        let mut protocol: Vec<(&str, &str)> = vec![
            ("oauth_consumer_key", self.consumer.key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", SIGNATURE_METHOD),
            ("oauth_timestamp", timestamp.as_str()),
            ("oauth_version", OAUTH_VERSION),
        ];
        if let Some(token) = &self.token {
            protocol.push(("oauth_token", token.token.as_str()));
        }
        protocol.extend_from_slice(extra);

        let mut params: Vec<(String, String)> = protocol
            .iter()
            .map(|(k, v)| (encode(k), encode(v)))
            .chain(url.query_pairs().map(|(k, v)| (encode(&k), encode(&v))))
            .collect();
        params.sort();

        let normalized = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let mut base_url = url.clone();
        base_url.set_query(None);
        base_url.set_fragment(None);

        let base = format!(
            "{}&{}&{}",
            method.to_uppercase(),
            encode(base_url.as_str()),
            encode(&normalized)
        );
        let key = format!(
            "{}&{}",
            encode(&self.consumer.secret),
            encode(self.token.as_ref().map_or("", |t| t.secret.as_str()))
        );

        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .map_err(|e| Error::Authorization(e.to_string()))?;
        mac.update(base.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        let header = protocol
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .chain(std::iter::once(format!(
                "oauth_signature=\"{}\"",
                encode(&signature)
            )))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {header}"))
    }
}

fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Asks the operator for the verifier after visiting the authorize URL
pub trait VerifierPrompt {
    fn verifier(&self, authorize_url: &str) -> Result<String>;
}

/// One-time out-of-band authorization
#[derive(Debug, Clone)]
pub struct OAuthFlow {
    base_url: String,
    consumer: Consumer,
}

impl OAuthFlow {
    pub fn new(base_url: impl Into<String>, consumer: Consumer) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            consumer,
        }
    }

    fn endpoint(&self, step: &str) -> String {
        format!("{}{OAUTH_PATH}/{step}", self.base_url)
    }

    /// URL the operator opens to approve the request token
    pub fn authorize_url(&self, request_token: &str) -> String {
        format!(
            "{}?oauth_token={}",
            self.endpoint("authorize"),
            encode(request_token)
        )
    }

    /// Run the handshake and return the access token.
    pub fn authorize(&self, prompt: &dyn VerifierPrompt) -> Result<Credentials> {
        let signer = Signer::new(self.consumer.clone());
        let request_token = post_for_token(
            &self.endpoint("request_token"),
            &signer,
            &[("oauth_callback", "oob")],
        )?;
        log::debug!("received request token {}", request_token.token);

        let verifier = prompt.verifier(&self.authorize_url(&request_token.token))?;
        let verifier = verifier.trim();
        if verifier.is_empty() {
            return Err(Error::Authorization("no verifier entered".to_string()));
        }

        let signer = signer.with_token(request_token);
        post_for_token(
            &self.endpoint("access_token"),
            &signer,
            &[("oauth_verifier", verifier)],
        )
    }
}

fn post_for_token(url: &str, signer: &Signer, extra: &[(&str, &str)]) -> Result<Credentials> {
    let authorization = signer.authorization("POST", url, extra)?;

    let mut response = agent()
        .post(url)
        .header("Authorization", authorization.as_str())
        .send_empty()?;

    let status = response.status().as_u16();
    let body = response
        .body_mut()
        .with_config()
        .limit(MAX_BODY_SIZE)
        .read_to_string()?;

    if !(200..300).contains(&status) {
        return Err(Error::Authorization(format!(
            "{url} returned HTTP {status}: {}",
            body.trim()
        )));
    }

    parse_token_response(&body)
}

/// Parse `oauth_token=..&oauth_token_secret=..`
fn parse_token_response(body: &str) -> Result<Credentials> {
    let fields: HashMap<_, _> = url::form_urlencoded::parse(body.trim().as_bytes()).collect();

    match (fields.get("oauth_token"), fields.get("oauth_token_secret")) {
        (Some(token), Some(secret)) => Ok(Credentials::new(token.as_ref(), secret.as_ref())),
        _ => Err(Error::Authorization(format!(
            "unexpected token response: {}",
            body.trim()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_matches_reference() {
        let signer =
            Signer::new(Consumer::new("ck", "cs")).with_token(Credentials::new("tok", "ts"));
        let header = signer
            .sign(
                "post",
                "https://mahara.example.org/artefact/webservice/rest/server.php?alt=json",
                &[],
                "abc123",
                1_300_000_000,
            )
            .unwrap();

        assert!(header.starts_with("OAuth oauth_consumer_key=\"ck\", "));
        assert!(header.contains("oauth_token=\"tok\""));
        assert!(header.contains("oauth_signature_method=\"HMAC-SHA1\""));
        assert!(header.ends_with("oauth_signature=\"cA6x4DDeVVcwDSA8tI2v2YHZBMA%3D\""));
    }

    #[test]
    fn test_extra_params_in_header() {
        let signer = Signer::new(Consumer::new("ck", "cs"));
        let header = signer
            .authorization(
                "POST",
                "https://mahara.example.org/artefact/webservice/oauthv1.php/request_token",
                &[("oauth_callback", "oob")],
            )
            .unwrap();

        assert!(header.contains("oauth_callback=\"oob\""));
        assert!(!header.contains("oauth_token="));
    }

    #[test]
    fn test_authorize_url() {
        let flow = OAuthFlow::new("https://mahara.example.org/", Consumer::new("ck", "cs"));
        assert_eq!(
            flow.authorize_url("req tok"),
            "https://mahara.example.org/artefact/webservice/oauthv1.php/authorize?oauth_token=req%20tok"
        );
    }

    #[test]
    fn test_parse_token_response() {
        let credentials =
            parse_token_response("oauth_token=abc&oauth_token_secret=x%2By\n").unwrap();
        assert_eq!(credentials, Credentials::new("abc", "x+y"));

        assert!(parse_token_response("error=nope").is_err());
    }

    #[test]
    fn test_invalid_url() {
        let signer = Signer::new(Consumer::new("ck", "cs"));
        assert!(signer.authorization("POST", "not a url", &[]).is_err());
    }
}
