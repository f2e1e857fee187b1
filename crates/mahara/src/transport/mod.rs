//! Transports for Mahara web-service calls.
//!
//! Every call is a JSON object tagged with a `wsfunction` name plus one
//! payload field (`users` or `groups`). The [`Transport`] trait hides how the
//! object reaches Mahara; [`http::HttpTransport`] signs and POSTs it, and
//! [`MockTransport`] records it in memory.
//!
//! # Testing
//!
//! ```
//! use mahara::transport::{MockTransport, Request, Transport, WsFunction};
//! use serde_json::json;
//!
//! let mock = MockTransport::new();
//! mock.respond(WsFunction::GetContext, json!("hogwarts"));
//!
//! let context = mock.call(&Request::new(WsFunction::GetContext)).unwrap();
//! assert_eq!(context, json!("hogwarts"));
//! assert_eq!(mock.functions(), vec![WsFunction::GetContext]);
//! ```

pub mod http;

use crate::error::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Web-service functions used by the sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WsFunction {
    GetContext,
    GetUsers,
    CreateUsers,
    UpdateUsers,
    DeleteUsers,
    GetGroups,
    CreateGroups,
    UpdateGroupMembers,
    DeleteGroups,
}

impl WsFunction {
    /// Name sent as `wsfunction`
    pub fn name(self) -> &'static str {
        match self {
            Self::GetContext => "mahara_user_get_context",
            Self::GetUsers => "mahara_user_get_users",
            Self::CreateUsers => "mahara_user_create_users",
            Self::UpdateUsers => "mahara_user_update_users",
            Self::DeleteUsers => "mahara_user_delete_users",
            Self::GetGroups => "mahara_group_get_groups",
            Self::CreateGroups => "mahara_group_create_groups",
            Self::UpdateGroupMembers => "mahara_group_update_group_members",
            Self::DeleteGroups => "mahara_group_delete_groups",
        }
    }

    /// Whether the call changes state on the server
    pub fn is_mutating(self) -> bool {
        !matches!(self, Self::GetContext | Self::GetUsers | Self::GetGroups)
    }
}

impl fmt::Display for WsFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single web-service call
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub function: WsFunction,
    pub payload: Map<String, Value>,
}

impl Request {
    pub fn new(function: WsFunction) -> Self {
        Self {
            function,
            payload: Map::new(),
        }
    }

    /// Attach a payload field
    pub fn with(mut self, field: &str, value: impl Serialize) -> Result<Self> {
        self.payload
            .insert(field.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    /// The JSON body sent to the server
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert(
            "wsfunction".to_string(),
            Value::String(self.function.name().to_string()),
        );
        body.extend(self.payload.clone());
        Value::Object(body)
    }
}

/// Delivers requests to Mahara
pub trait Transport: Send + Sync {
    /// Perform one call and return the decoded response.
    fn call(&self, request: &Request) -> Result<Value>;
}

/// In-memory transport for tests.
///
/// Records every request and answers with canned responses; functions with
/// no configured response answer `null`.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<HashMap<WsFunction, Value>>>,
    calls: Arc<Mutex<Vec<Request>>>,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response for a function
    pub fn respond(&self, function: WsFunction, response: Value) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(function, response);
    }

    /// Requests received so far
    pub fn calls(&self) -> Vec<Request> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Functions called so far, in order
    pub fn functions(&self) -> Vec<WsFunction> {
        self.calls().iter().map(|r| r.function).collect()
    }
}

impl Transport for MockTransport {
    fn call(&self, request: &Request) -> Result<Value> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(responses
            .get(&request.function)
            .cloned()
            .unwrap_or(Value::Null))
    }
}
