use std::{str::FromStr, time::Duration};

use chrono::Utc;
use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::status::Role;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum PasswordHashAlgorithm {
    #[display(fmt = "argon2d")]
    Argon2d,
    #[display(fmt = "argon2i")]
    Argon2i,
    #[display(fmt = "argon2id")]
    Argon2id,
}

impl FromStr for PasswordHashAlgorithm {
    type Err = PasswordHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "argon2d" => Ok(Self::Argon2d),
            "argon2i" => Ok(Self::Argon2i),
            "argon2id" => Ok(Self::Argon2id),
            _ => Err(PasswordHashError::UnsupportedAlgorithm),
        }
    }
}

/// Password hash.
///
/// A validated PHC string, as stored in the `users.password_hash` column:
///
/// ```text
/// $<id>[$v=<version>][$<param>=<value>(,<param>=<value>)*][$<salt>[$<hash>]]
/// ```
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub const SEPARATOR: char = '$';

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn algorithm(&self) -> Result<PasswordHashAlgorithm, PasswordHashError> {
        self.0
            .split(Self::SEPARATOR)
            .nth(1)
            .ok_or(PasswordHashError::InvalidPasswordHash)?
            .parse()
    }
}

impl FromStr for PasswordHash {
    type Err = PasswordHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = password_hash::PasswordHash::new(s)?;
        parsed.algorithm.as_str().parse::<PasswordHashAlgorithm>()?;
        Ok(Self(s.into()))
    }
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum PasswordHashError {
    /// Unsupported Algorithm.
    UnsupportedAlgorithm,

    /// Invalid password.
    InvalidPassword,

    /// Invalid password hash.
    InvalidPasswordHash,

    /// Cryptographic error.
    Cryptographic,

    /// Error in the hasher configuration.
    Config,

    Unknown,
}

impl std::error::Error for PasswordHashError {}

impl From<password_hash::Error> for PasswordHashError {
    fn from(err: password_hash::Error) -> Self {
        match err {
            password_hash::Error::Algorithm | password_hash::Error::Version => {
                Self::UnsupportedAlgorithm
            }
            password_hash::Error::B64Encoding(_)
            | password_hash::Error::PhcStringInvalid
            | password_hash::Error::PhcStringTooShort
            | password_hash::Error::PhcStringTooLong => Self::InvalidPasswordHash,
            password_hash::Error::Crypto
            | password_hash::Error::OutputTooShort
            | password_hash::Error::OutputTooLong => Self::Cryptographic,
            password_hash::Error::ParamNameDuplicated
            | password_hash::Error::ParamNameInvalid
            | password_hash::Error::ParamValueInvalid(_)
            | password_hash::Error::ParamsMaxExceeded
            | password_hash::Error::SaltInvalid(_) => Self::Config,
            password_hash::Error::Password => Self::InvalidPassword,
            _ => Self::Unknown,
        }
    }
}

impl From<argon2::Error> for PasswordHashError {
    fn from(err: argon2::Error) -> Self {
        match err {
            argon2::Error::AlgorithmInvalid | argon2::Error::VersionInvalid => {
                Self::UnsupportedAlgorithm
            }
            argon2::Error::PwdTooLong => Self::InvalidPassword,
            _ => Self::Config,
        }
    }
}

pub struct TokenIssuer;

impl TokenIssuer {
    pub const fn as_str() -> &'static str {
        "currypot-api"
    }
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    #[display(fmt = "access")]
    Access,
    #[display(fmt = "refresh")]
    Refresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSubject {
    User(i64),
}

impl TokenSubject {
    fn encode(&self) -> String {
        match self {
            TokenSubject::User(id) => id.to_string(),
        }
    }
}

/// Claims carried next to the registered ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    pub role: Role,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPayload<T> {
    pub iss: String,
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub typ: TokenKind,
    #[serde(flatten)]
    pub claims: T,
}

impl<T> TokenPayload<T> {
    pub fn new(kind: TokenKind, expiration: Duration, subject: TokenSubject, claims: T) -> Self {
        let now = Utc::now().timestamp();
        Self {
            iss: TokenIssuer::as_str().into(),
            sub: subject.encode(),
            exp: now + expiration.as_secs() as i64,
            iat: now,
            jti: uuid::Uuid::new_v4().to_string(),
            typ: kind,
            claims,
        }
    }

    pub fn subject(&self) -> Result<TokenSubject, TokenEncryptionError> {
        self.sub
            .parse()
            .map(TokenSubject::User)
            .map_err(|_| TokenEncryptionError::InvalidClaims)
    }
}

#[derive(Debug, Clone)]
pub struct Token<T> {
    pub(in crate::domain) token: String,
    pub(in crate::domain) payload: TokenPayload<T>,
}

impl<T> Token<T> {
    pub fn payload(&self) -> &TokenPayload<T> {
        &self.payload
    }

    pub fn as_str(&self) -> &str {
        &self.token
    }
}

impl<T> From<Token<T>> for String {
    fn from(token: Token<T>) -> Self {
        token.token
    }
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum TokenEncryptionError {
    #[display(fmt = "token expired")]
    Expired,
    #[display(fmt = "invalid token signature")]
    InvalidSignature,
    #[display(fmt = "invalid token claims")]
    InvalidClaims,
    #[display(fmt = "token of kind {_0} was expected")]
    UnexpectedKind(TokenKind),
    #[display(fmt = "malformed token")]
    Malformed,
    #[display(fmt = "token encoding failure")]
    Encoding,
}

impl std::error::Error for TokenEncryptionError {}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_phc_string() {
        let phc = "$argon2id$v=19$m=4096,t=3,p=1$c2FsdHNhbHRzYWx0$Zm9vYmFyYmF6cXV4Zm9vYmFyYmF6cXV4Zm9vYmFyYg";
        let hash: PasswordHash = phc.parse().unwrap();

        assert_eq!(hash.as_str(), phc);
        assert_eq!(hash.algorithm(), Ok(PasswordHashAlgorithm::Argon2id));
    }

    #[test]
    fn reject_unsupported_hash() {
        assert!("plaintext".parse::<PasswordHash>().is_err());
        assert_eq!(
            "$pbkdf2-sha256$i=1000$c2FsdHNhbHQ$aGFzaGhhc2hoYXNoaGFzaA".parse::<PasswordHash>(),
            Err(PasswordHashError::UnsupportedAlgorithm)
        );
    }

    #[test]
    fn payload_subject() {
        let payload = TokenPayload::new(
            TokenKind::Access,
            Duration::from_secs(60),
            TokenSubject::User(42),
            UserClaims {
                role: Role::Customer,
                email: "some@email.com".into(),
            },
        );

        assert_eq!(payload.subject(), Ok(TokenSubject::User(42)));
        assert_eq!(payload.exp - payload.iat, 60);
        assert_eq!(payload.iss, TokenIssuer::as_str());
    }
}
