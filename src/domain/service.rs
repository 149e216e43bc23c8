use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::datatype::security::{
    PasswordHash, PasswordHashError, Token, TokenEncryptionError, TokenKind, TokenPayload,
};
use crate::error::service::DispatchError;

pub trait PasswordHashService {
    fn hash_password(&self, pwd: &str) -> Result<PasswordHash, PasswordHashError>;
    fn verify_password(&self, pwd: &str, hash: &PasswordHash) -> Result<(), PasswordHashError>;
}

pub trait TokenEncryptionService {
    fn issue_token<T>(&self, payload: &TokenPayload<T>) -> Result<String, TokenEncryptionError>
    where
        T: serde::Serialize;

    fn verify_token<T>(&self, token: &str) -> Result<TokenPayload<T>, TokenEncryptionError>
    where
        T: serde::de::DeserializeOwned;
}

impl<T> Token<T> {
    pub fn new<TS>(payload: TokenPayload<T>, encrypter: &TS) -> Result<Self, TokenEncryptionError>
    where
        TS: TokenEncryptionService,
        T: serde::Serialize,
    {
        let token = encrypter.issue_token(&payload)?;
        Ok(Self { token, payload })
    }

    /// Verify the signature and claims, then the token kind.
    pub fn verify<TS>(token: String, kind: TokenKind, encrypter: &TS) -> Result<Self, TokenEncryptionError>
    where
        TS: TokenEncryptionService,
        T: serde::de::DeserializeOwned,
    {
        let payload: TokenPayload<T> = encrypter.verify_token(&token)?;
        if payload.typ != kind {
            return Err(TokenEncryptionError::UnexpectedKind(kind));
        }
        Ok(Self { token, payload })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

impl PaymentIntent {
    pub const SUCCEEDED: &'static str = "succeeded";

    pub fn succeeded(&self) -> bool {
        self.status == Self::SUCCEEDED
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    /// Amount in the smallest currency unit.
    pub amount: i64,
    pub currency: &'static str,
    pub metadata: Vec<(&'static str, String)>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, request: PaymentRequest) -> Result<PaymentIntent, DispatchError>;
    async fn retrieve_intent(&self, id: &str) -> Result<PaymentIntent, DispatchError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Outgoing mail. Delivery happens in the background and never fails the caller.
pub trait Mailer: Send + Sync {
    fn send(&self, email: Email);
}

/// External recommendation engine.
///
/// `Ok(None)` means the engine declined to answer and local ranking applies.
#[async_trait]
pub trait RecommendationService: Send + Sync {
    async fn recommend(&self, request: &Value) -> Result<Option<Value>, DispatchError>;
}
