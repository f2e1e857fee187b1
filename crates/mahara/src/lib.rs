//! # mahara
//!
//! Mahara web-service client and the API sink for IDE synchronisation.
//!
//! This crate provides:
//! - OAuth 1.0a signing and the one-time out-of-band authorization
//! - A persisted token file ([`CredentialStore`])
//! - A typed [`Client`] for the user and group web-service functions
//! - [`sync::plan`], which turns an IDE file into a [`reconcile::ChangeSet`]
//!   against the live site
//! - [`ApiSink`], which applies a change set phase by phase
//!
//! ## Example
//!
//! ```no_run
//! use mahara::{ApiSink, Client, Consumer, CredentialStore, Phases, Signer};
//! use mahara::sync::{self, SyncOptions};
//! use reconcile::Sink;
//!
//! let consumer = Consumer::new("key", "secret");
//! let token = CredentialStore::default().load()?.expect("authorized earlier");
//! let client = Client::new(
//!     "https://mahara.hogwarts.school.nz",
//!     Signer::new(consumer).with_token(token),
//! );
//!
//! let file = ide::parse_file("ide.csv".as_ref()).expect("readable IDE file");
//! let plan = sync::plan(&client, &file, &SyncOptions::new("hogwarts.school.nz"))?;
//!
//! let mut sink = ApiSink::new(&client, Phases::all());
//! sink.emit(&plan.changes).expect("sync failed");
//! # Ok::<(), mahara::Error>(())
//! ```

pub mod credentials;
pub mod error;
pub mod oauth;
pub mod sink;
pub mod sync;
pub mod transport;

pub use credentials::{CredentialStore, Credentials, DEFAULT_TOKEN_FILE};
pub use error::{Error, ErrorCategory, Result};
pub use oauth::{Consumer, OAuthFlow, Signer, VerifierPrompt};
pub use sink::{ApiSink, Phases};
pub use transport::{MockTransport, Request, Transport, WsFunction};

use reconcile::{
    AccountRecord, AccountRef, AccountUpdate, ExistingAccount, ExistingGroup, GroupCreate,
    GroupRef, GroupUpdate,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;
use transport::http::HttpTransport;

/// Default Mahara base URL
pub const DEFAULT_URL: &str = "http://mahara.local.net/maharadev";

/// Typed client for the Mahara web services.
///
/// Every call goes through one [`Transport`]; a response carrying an
/// `exception` becomes an error before any caller sees it.
pub struct Client {
    transport: Box<dyn Transport>,
    token_file: Option<PathBuf>,
}

impl Client {
    /// Create a client that signs calls to the site at `base_url`.
    #[must_use]
    pub fn new(base_url: &str, signer: Signer) -> Self {
        Self {
            transport: Box::new(HttpTransport::new(base_url, signer)),
            token_file: None,
        }
    }

    /// Create a client with a custom transport (useful for testing).
    #[must_use]
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            token_file: None,
        }
    }

    /// Name the token file in authentication errors.
    #[must_use]
    pub fn token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }

    /// Create a client using the stored token, authorizing first when there
    /// is none.
    pub fn authorized(
        base_url: &str,
        consumer: Consumer,
        store: &CredentialStore,
        prompt: &dyn VerifierPrompt,
    ) -> Result<Self> {
        let token = store.acquire(|| OAuthFlow::new(base_url, consumer.clone()).authorize(prompt))?;
        Ok(Self::new(base_url, Signer::new(consumer).with_token(token)).token_file(store.path()))
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Institution the token is bound to
    pub fn context(&self) -> Result<String> {
        match self.invoke(Request::new(WsFunction::GetContext))? {
            Value::String(context) => Ok(context),
            other => Err(Error::InvalidResponse(format!(
                "expected an institution name, got {other}"
            ))),
        }
    }

    /// All accounts visible in the institution
    pub fn users(&self) -> Result<Vec<ExistingAccount>> {
        self.fetch(Request::new(WsFunction::GetUsers))
    }

    pub fn create_users(&self, users: &[AccountRecord]) -> Result<Value> {
        self.invoke(Request::new(WsFunction::CreateUsers).with("users", users)?)
    }

    pub fn update_users(&self, users: &[&AccountUpdate]) -> Result<Value> {
        self.invoke(Request::new(WsFunction::UpdateUsers).with("users", users)?)
    }

    pub fn delete_users(&self, users: &[&AccountRef]) -> Result<Value> {
        self.invoke(Request::new(WsFunction::DeleteUsers).with("users", users)?)
    }

    // =========================================================================
    // Groups
    // =========================================================================

    /// All groups visible in the institution
    pub fn groups(&self) -> Result<Vec<ExistingGroup>> {
        self.fetch(Request::new(WsFunction::GetGroups))
    }

    pub fn create_groups(&self, groups: &[GroupCreate]) -> Result<Value> {
        self.invoke(Request::new(WsFunction::CreateGroups).with("groups", groups)?)
    }

    pub fn update_group_members(&self, groups: &[&GroupUpdate]) -> Result<Value> {
        self.invoke(Request::new(WsFunction::UpdateGroupMembers).with("groups", groups)?)
    }

    pub fn delete_groups(&self, groups: &[GroupRef]) -> Result<Value> {
        self.invoke(Request::new(WsFunction::DeleteGroups).with("groups", groups)?)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// Decode a listing; `null` means nothing to list.
    fn fetch<T: DeserializeOwned>(&self, request: Request) -> Result<Vec<T>> {
        match self.invoke(request)? {
            Value::Null => Ok(Vec::new()),
            value => Ok(serde_json::from_value(value)?),
        }
    }

    fn invoke(&self, request: Request) -> Result<Value> {
        let response = self.transport.call(&request)?;

        if let Some(exception) = response.get("exception") {
            let exception = exception
                .as_str()
                .map_or_else(|| exception.to_string(), str::to_string);
            let message = response
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            log::error!("{} failed: {exception}: {message}", request.function);
            return Err(if exception.contains("OAuth") {
                Error::Auth {
                    exception,
                    message,
                    token_file: self.token_file.clone(),
                }
            } else {
                Error::Remote { exception, message }
            });
        }

        if request.function.is_mutating() {
            log::debug!("{} response: {response}", request.function);
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;

    fn client(mock: &MockTransport) -> Client {
        Client::with_transport(Box::new(mock.clone()))
    }

    #[test]
    fn test_context() {
        let mock = MockTransport::new();
        mock.respond(WsFunction::GetContext, json!("hogwarts"));

        assert_eq!(client(&mock).context().unwrap(), "hogwarts");
    }

    #[test]
    fn test_context_rejects_non_string() {
        let mock = MockTransport::new();
        mock.respond(WsFunction::GetContext, json!({"name": "hogwarts"}));

        assert!(matches!(
            client(&mock).context(),
            Err(Error::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_users_decoded() {
        let mock = MockTransport::new();
        mock.respond(
            WsFunction::GetUsers,
            json!([{
                "username": "1001@hogwarts.school.nz",
                "firstname": "Harry",
                "auths": [{"auth": "internal", "remoteuser": "1001"}]
            }]),
        );

        let users = client(&mock).users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].remote_user("internal"), Some("1001"));
    }

    #[test]
    fn test_null_listing_is_empty() {
        let mock = MockTransport::new();
        assert!(client(&mock).groups().unwrap().is_empty());
    }

    #[test]
    fn test_oauth_exception_is_auth_error() {
        let mock = MockTransport::new();
        mock.respond(
            WsFunction::GetContext,
            json!({"exception": "OAuthException2", "message": "Invalid access token"}),
        );

        let err = client(&mock).context().unwrap_err();
        assert!(matches!(err, Error::Auth { .. }));
        assert_eq!(err.category(), ErrorCategory::Auth);
    }

    #[test]
    fn test_auth_error_names_token_file() {
        let mock = MockTransport::new();
        mock.respond(
            WsFunction::GetUsers,
            json!({"exception": "OAuthException2", "message": "Invalid access token"}),
        );

        let err = client(&mock)
            .token_file("oauth_token/mahara.oauth")
            .users()
            .unwrap_err();
        match &err {
            Error::Auth { token_file, .. } => {
                assert_eq!(token_file.as_deref(), Some(Path::new("oauth_token/mahara.oauth")));
            }
            other => panic!("expected an auth error, got {other:?}"),
        }
        assert!(err.advice().contains("oauth_token/mahara.oauth"));
    }

    #[test]
    fn test_other_exception_is_remote_error() {
        let mock = MockTransport::new();
        mock.respond(
            WsFunction::DeleteUsers,
            json!({"exception": "invalid_parameter_exception", "message": "no such user"}),
        );

        let err = client(&mock)
            .delete_users(&[&AccountRef {
                username: "x".to_string(),
            }])
            .unwrap_err();
        assert!(matches!(err, Error::Remote { ref exception, .. } if exception == "invalid_parameter_exception"));
    }

    #[test]
    fn test_payload_field() {
        let mock = MockTransport::new();
        client(&mock)
            .delete_groups(&[GroupRef {
                shortname: "Math".to_string(),
                institution: "hogwarts".to_string(),
            }])
            .unwrap();

        let calls = mock.calls();
        assert_eq!(
            calls[0].to_json(),
            json!({
                "wsfunction": "mahara_group_delete_groups",
                "groups": [{"shortname": "Math", "institution": "hogwarts"}]
            })
        );
    }
}
