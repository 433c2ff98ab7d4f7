use std::borrow::Cow;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EdaError {
    #[error("Couldn't create the EDA HTTP client!")]
    ClientSetup(#[source] reqwest::Error),
    #[error("Request to {url} failed!")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with {status}: {body}")]
    UnexpectedStatus {
        url: String,
        status: StatusCode,
        body: String,
    },
    #[error("Keycloak authentication failed ({})!", .0)]
    Authentication(Cow<'static, str>),
    #[error("EDA returned an invalid response ({})!", .0)]
    InvalidResponse(Cow<'static, str>),
    #[error("Transaction item {item} failed validation: {reason}")]
    ValidationFailed { item: String, reason: String },
    #[error("Transaction {id} failed: {details}")]
    CommitFailed { id: String, details: String },
}
