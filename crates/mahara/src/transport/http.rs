//! Signed HTTP transport.
//!
//! Requests are POSTed as JSON to the REST server with an OAuth 1.0a
//! `Authorization` header. Mahara reports failures in the body, so non-2xx
//! responses are read too and only become HTTP errors when the body does not
//! carry an exception.

use super::{Request, Transport};
use crate::error::{Error, Result};
use crate::oauth::Signer;
use serde_json::Value;

/// Maximum response size (a full user listing of a large school fits easily).
pub const MAX_BODY_SIZE: u64 = 64 * 1024 * 1024;

/// Path of the REST server below the Mahara base URL
pub const REST_PATH: &str = "/artefact/webservice/rest/server.php";

const CONTENT_TYPE: &str = "application/jsonrequest";

pub(crate) fn agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .into()
}

/// REST endpoint for a Mahara base URL
pub fn rest_endpoint(base_url: &str) -> String {
    format!("{}{REST_PATH}?alt=json", base_url.trim_end_matches('/'))
}

/// Transport that talks to a live Mahara site.
pub struct HttpTransport {
    agent: ureq::Agent,
    endpoint: String,
    signer: Signer,
}

impl HttpTransport {
    /// Create a transport for the site at `base_url`.
    pub fn new(base_url: &str, signer: Signer) -> Self {
        Self {
            agent: agent(),
            endpoint: rest_endpoint(base_url),
            signer,
        }
    }

    /// Get the REST endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    fn call(&self, request: &Request) -> Result<Value> {
        let body = serde_json::to_string(&request.to_json())?;
        let authorization = self.signer.authorization("POST", &self.endpoint, &[])?;

        log::debug!("calling {} ({} bytes)", request.function, body.len());

        let mut response = self
            .agent
            .post(&self.endpoint)
            .header("Content-Type", CONTENT_TYPE)
            .header("Authorization", authorization.as_str())
            .send(body.as_str())?;

        let status = response.status().as_u16();
        let text = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_SIZE)
            .read_to_string()?;

        log::trace!("{} answered HTTP {status}: {text}", request.function);

        let success = (200..300).contains(&status);
        match serde_json::from_str::<Value>(&text) {
            Ok(value) if success || value.get("exception").is_some() => Ok(value),
            Err(e) if success => Err(Error::InvalidResponse(format!(
                "{} returned non-JSON body: {e}",
                request.function
            ))),
            _ => Err(Error::http(
                format!("{} returned HTTP {status}", request.function),
                Some(status),
            )),
        }
    }
}
