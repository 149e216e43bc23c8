use derive_more::Display;
use salvo::{prelude::StatusError, writer::Json, Piece, Response};

use self::http::ErrorResponse;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Display)]
pub struct UnknownError(BoxedError);

impl std::error::Error for UnknownError {}

impl UnknownError {
    pub fn new(err: BoxedError) -> Self {
        Self(err)
    }
}

impl From<BoxedError> for UnknownError {
    fn from(err: BoxedError) -> Self {
        Self::new(err)
    }
}

#[derive(Debug, Display)]
struct StrError(pub Box<str>);

impl std::error::Error for StrError {}

impl<'a> From<&'a str> for UnknownError {
    fn from(err: &'a str) -> Self {
        UnknownError(Box::new(StrError(Box::from(err))))
    }
}

impl From<sqlx::error::Error> for UnknownError {
    fn from(err: sqlx::error::Error) -> Self {
        Self::new(err.into())
    }
}

impl Piece for UnknownError {
    fn render(self, res: &mut Response) {
        tracing::error!("unhandled error: {}", self.0);
        let status = StatusError::internal_server_error();
        res.render(Json(ErrorResponse::from_status_error(
            &status,
            "Internal server error".into(),
            (),
        )));
        res.set_status_error(status);
    }
}

pub mod app {
    use derive_more::Display;
    use salvo::{prelude::StatusError, writer::Json, Piece};
    use serde_json::Value;

    use super::{
        http::{ErrorResponse, RateLimitError},
        persistence::PersistenceError,
        resource::{ConflictError, NotFoundError, OperationError, ValidationError},
        security::{AuthenticationError, ForbiddenError, UnauthorizedError},
        service::DispatchError,
        UnknownError,
    };

    #[derive(Debug, Display)]
    pub enum ApplicationError {
        Authentication(AuthenticationError),
        Unauthorized(UnauthorizedError),
        Forbidden(ForbiddenError),
        Validation(ValidationError),
        Operation(OperationError),
        NotFound(NotFoundError),
        Conflict(ConflictError),
        RateLimited(RateLimitError),
        Dispatch(DispatchError),
        Persistence(PersistenceError),
        Unknown(UnknownError),
    }

    impl std::error::Error for ApplicationError {}

    macro_rules! from_error {
        ($($variant:ident($err:ty)),+ $(,)?) => {
            $(
                impl From<$err> for ApplicationError {
                    fn from(err: $err) -> Self {
                        Self::$variant(err)
                    }
                }
            )+
        };
    }

    from_error! {
        Authentication(AuthenticationError),
        Unauthorized(UnauthorizedError),
        Forbidden(ForbiddenError),
        Validation(ValidationError),
        Operation(OperationError),
        NotFound(NotFoundError),
        Conflict(ConflictError),
        RateLimited(RateLimitError),
        Dispatch(DispatchError),
        Persistence(PersistenceError),
        Unknown(UnknownError),
    }

    impl ApplicationError {
        /// Shorthand for a business rule rejection.
        pub fn operation(message: impl Into<String>) -> Self {
            Self::Operation(OperationError(message.into()))
        }

        pub fn not_found(resource: &'static str) -> Self {
            Self::NotFound(NotFoundError::new(resource))
        }

        pub fn unknown<E>(err: E) -> Self
        where
            E: std::error::Error + Send + Sync + 'static,
        {
            Self::Unknown(UnknownError::new(Box::new(err)))
        }

        pub fn status(&self) -> StatusError {
            match self {
                ApplicationError::Persistence(_) => StatusError::service_unavailable(),
                ApplicationError::Validation(_) | ApplicationError::Operation(_) => {
                    StatusError::bad_request()
                }
                ApplicationError::Authentication(_) | ApplicationError::Unauthorized(_) => {
                    StatusError::unauthorized()
                }
                ApplicationError::Forbidden(_) => StatusError::forbidden(),
                ApplicationError::NotFound(_) => StatusError::not_found(),
                ApplicationError::Conflict(_) => StatusError::conflict(),
                ApplicationError::RateLimited(_) => StatusError::too_many_requests(),
                ApplicationError::Dispatch(_) => StatusError::bad_gateway(),
                ApplicationError::Unknown(_) => StatusError::internal_server_error(),
            }
        }

        /// Message shown to the client in the `error` field.
        pub fn message(&self) -> String {
            match self {
                ApplicationError::Persistence(_) => "Database temporarily unavailable".into(),
                ApplicationError::Dispatch(_) => "External service error".into(),
                ApplicationError::RateLimited(_) => "Rate limit exceeded".into(),
                ApplicationError::Unknown(_) => "Internal server error".into(),
                other => other.to_string(),
            }
        }

        fn detail(&self) -> Value {
            match self {
                ApplicationError::Validation(err) => {
                    serde_json::to_value(&err.fields).unwrap_or(Value::Null)
                }
                ApplicationError::Unauthorized(err) => Value::String(err.code().into()),
                ApplicationError::RateLimited(err) => {
                    serde_json::json!({ "message": err.to_string() })
                }
                _ => Value::Null,
            }
        }
    }

    impl Piece for ApplicationError {
        fn render(self, res: &mut salvo::Response) {
            match &self {
                ApplicationError::Persistence(err) => tracing::error!("persistence failure: {err}"),
                ApplicationError::Dispatch(err) => tracing::error!("dispatch failure: {err}"),
                ApplicationError::Unknown(err) => tracing::error!("unhandled error: {err}"),
                _ => tracing::debug!("request rejected: {self}"),
            }

            let status = self.status();
            res.render(Json(ErrorResponse::from_status_error(
                &status,
                self.message(),
                self.detail(),
            )));
            res.set_status_error(status);
        }
    }
}

pub mod service {
    use derive_more::Display;

    use crate::error::UnknownError;

    #[derive(Debug, Display)]
    pub enum DispatchError {
        #[display(fmt = "Dispatched operation timed out in {_0:?}")]
        Timeout(Option<std::time::Duration>),
        #[display(fmt = "{service} responded with status {code}")]
        Status { service: &'static str, code: u16 },
        #[display(fmt = "IO error dispatching {_0}")]
        IO(std::io::Error),
        #[display(fmt = "Unknown dispatch error {_0}")]
        Unknown(UnknownError),
    }

    impl std::error::Error for DispatchError {}

    impl From<reqwest::Error> for DispatchError {
        fn from(err: reqwest::Error) -> Self {
            if err.is_timeout() {
                return Self::Timeout(None);
            }
            Self::Unknown(UnknownError::new(err.into()))
        }
    }
}

pub mod persistence {
    use std::io;

    use derive_more::Display;

    use super::{service::DispatchError, UnknownError};

    pub type SqlState = String;

    pub const UNIQUE_VIOLATION: &str = "23505";

    #[derive(Debug, Display)]
    pub enum PersistenceError {
        #[display(fmt = "database persistence error: SQLSTATE {_0:?}")]
        Database(Option<SqlState>),
        #[display(fmt = "persistence layer connection error: {_0}")]
        Connection(DispatchError),
        #[display(fmt = "PersistenceError data not found")]
        NotFound,
        #[display(fmt = "PersistenceError decoding data")]
        DecodeData,
        #[display(fmt = "PersistenceError data migration")]
        DataMigration,
        #[display(fmt = "unknown persistence error: {_0}")]
        Unknown(UnknownError),
    }

    impl std::error::Error for PersistenceError {}

    impl PersistenceError {
        pub fn is_unique_violation(&self) -> bool {
            matches!(self, Self::Database(Some(code)) if code == UNIQUE_VIOLATION)
        }
    }

    type SqlxError = sqlx::error::Error;

    impl From<SqlxError> for PersistenceError {
        fn from(err: SqlxError) -> Self {
            match err {
                SqlxError::Configuration(_) => {
                    Self::Connection(DispatchError::IO(io::ErrorKind::InvalidInput.into()))
                }
                SqlxError::Database(db) => Self::Database(db.code().map(|code| code.into())),
                SqlxError::Io(io) => Self::Connection(DispatchError::IO(io)),
                SqlxError::Tls(_) => {
                    Self::Connection(DispatchError::IO(io::ErrorKind::ConnectionRefused.into()))
                }
                SqlxError::Protocol(msg) => Self::Connection(DispatchError::IO(io::Error::new(
                    io::ErrorKind::InvalidData,
                    msg,
                ))),
                SqlxError::RowNotFound => Self::NotFound,
                SqlxError::TypeNotFound { .. }
                | SqlxError::ColumnIndexOutOfBounds { .. }
                | SqlxError::ColumnDecode { .. }
                | SqlxError::Decode(_) => Self::DecodeData,
                SqlxError::ColumnNotFound(_) => Self::NotFound,
                SqlxError::PoolTimedOut => Self::Connection(DispatchError::Timeout(None)),
                SqlxError::PoolClosed => {
                    Self::Connection(DispatchError::IO(io::ErrorKind::NotConnected.into()))
                }
                SqlxError::Migrate(_) => Self::DataMigration,
                _ => PersistenceError::Unknown(err.into()),
            }
        }
    }
}

pub mod resource {
    use derive_more::{Display, Error};
    use serde::Serialize;

    use crate::base::ResourceID;

    #[derive(Debug, Display, Clone, PartialEq, Eq, Hash, Serialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ValidationErrorKind {
        /// When a required property is missing.
        Required,
        /// Maximum inclusive string length.
        MaxLength(u64),
        /// Minimum inclusive string length.
        MinLength(u64),
        /// When the input doesn't match to a pattern.
        Pattern(String),
        /// Inclusive lower bound exceeded.
        Minimum(i64),
        /// Inclusive higher bound exceeded.
        Maximum(i64),
        /// When some number is not positive.
        Positive,
        /// The input value doesn't match any of specified options.
        UnknownVariant,
        /// The input value doesn't match one or multiple required types.
        InvalidType,
        /// Generic kind.
        Invalid,
    }

    impl std::error::Error for ValidationErrorKind {}

    /// Invalid fields of a resource.
    ///
    /// Displayed as the message of the first invalid field, which is
    /// what clients show to the user.
    #[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
    pub struct ValidationError {
        /// Name of the resource
        pub resource_type: &'static str,
        /// Invalid resource fields
        pub fields: Vec<ValidationFieldError>,
    }

    impl ValidationError {
        pub fn from_resource<R: ResourceID>(fields: Vec<ValidationFieldError>) -> Self {
            Self {
                resource_type: R::resource_id(),
                fields,
            }
        }

        pub fn single<R: ResourceID>(field: ValidationFieldError) -> Self {
            Self::from_resource::<R>(vec![field])
        }
    }

    impl std::fmt::Display for ValidationError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self.fields.first() {
                Some(field) => f.write_str(&field.message),
                None => write!(f, "Invalid resource {}", self.resource_type),
            }
        }
    }

    #[derive(Debug, Display, Error, Clone, PartialEq, Eq, Hash, Serialize)]
    #[display(fmt = "{path}: {value:?}, {kinds:?}")]
    pub struct ValidationFieldError {
        /// Resource field path with invalid value
        pub path: String,
        /// Displayed invalid value
        pub value: String,
        /// Kinds of validation errors
        pub kinds: Vec<ValidationErrorKind>,
        /// Human readable description
        pub message: String,
    }

    impl ValidationFieldError {
        pub fn new(
            path: &str,
            value: impl Into<String>,
            kinds: Vec<ValidationErrorKind>,
            message: impl Into<String>,
        ) -> Self {
            Self {
                path: format!("/{path}"),
                value: value.into(),
                kinds,
                message: message.into(),
            }
        }

        pub fn required(path: &str, message: impl Into<String>) -> Self {
            Self::new(path, "", vec![ValidationErrorKind::Required], message)
        }
    }

    #[derive(Debug, Display, Clone, PartialEq, Eq)]
    #[display(fmt = "{resource} not found")]
    pub struct NotFoundError {
        pub resource: &'static str,
    }

    impl std::error::Error for NotFoundError {}

    impl NotFoundError {
        pub fn new(resource: &'static str) -> Self {
            Self { resource }
        }
    }

    #[derive(Debug, Display, Clone, PartialEq, Eq)]
    #[display(fmt = "{message}")]
    pub struct ConflictError {
        /// Name of the resource
        pub resource_type: &'static str,
        pub message: String,
    }

    impl std::error::Error for ConflictError {}

    impl ConflictError {
        pub fn new<R: ResourceID>(message: impl Into<String>) -> Self {
            Self {
                resource_type: R::resource_id(),
                message: message.into(),
            }
        }
    }

    /// A business rule refused the operation.
    #[derive(Debug, Display, Clone, PartialEq, Eq)]
    pub struct OperationError(pub String);

    impl std::error::Error for OperationError {}
}

pub mod security {
    use derive_more::Display;
    use serde::Serialize;

    use crate::domain::datatype::security::{PasswordHashError, TokenEncryptionError};

    /// Unauthorized access to a resource.
    ///
    /// The user is unauthorized to access the resource.
    #[derive(Debug, Display, Serialize)]
    pub enum UnauthorizedError {
        /// Authentication token is not present.
        #[display(fmt = "Missing authorization token")]
        TokenNotPresent,

        /// Authentication token is malformatted.
        ///
        /// The token is no formated as the required authentication scheme
        #[display(fmt = "Malformed authorization header")]
        MalformattedToken,

        /// Authentication token is invalid.
        #[display(fmt = "Invalid or expired token")]
        InvalidToken,
    }

    impl UnauthorizedError {
        pub fn code(&self) -> &'static str {
            match self {
                UnauthorizedError::TokenNotPresent => "token_not_present",
                UnauthorizedError::MalformattedToken => "malformatted_token",
                UnauthorizedError::InvalidToken => "invalid_token",
            }
        }
    }

    impl From<TokenEncryptionError> for UnauthorizedError {
        fn from(_: TokenEncryptionError) -> Self {
            Self::InvalidToken
        }
    }

    #[derive(Debug, Display, Serialize)]
    pub enum AuthenticationError {
        /// Attempt to authenticate with invalid credentials.
        #[display(fmt = "Invalid email or password")]
        InvalidCredential,

        /// Token subject no longer maps to an active user.
        #[display(fmt = "Invalid or inactive user")]
        InactiveUser,
    }

    #[derive(Debug, Display, Serialize)]
    pub enum ForbiddenError {
        /// The user is authenticated, however does not own the requested resource.
        #[display(fmt = "Access denied")]
        AccessDenied,

        /// The user role is not allowed on the endpoint.
        #[display(fmt = "Insufficient permissions")]
        InsufficientPermissions,

        /// Valid credentials of a deactivated account.
        #[display(fmt = "Account is inactive. Please contact support.")]
        AccountDeactivated,

        /// Kitchen not approved, or closed by an admin.
        #[display(fmt = "Producer profile not approved or inactive")]
        InactiveProducer,
    }

    impl From<PasswordHashError> for AuthenticationError {
        fn from(_: PasswordHashError) -> Self {
            Self::InvalidCredential
        }
    }
}

pub mod config {
    use derive_more::Display;

    #[derive(Debug, Display, Clone, PartialEq, Eq)]
    pub enum ConfigError {
        #[display(fmt = "Missing env var {_0}")]
        Missing(&'static str),
        #[display(fmt = "Invalid env var {name}: {value:?}")]
        Invalid { name: &'static str, value: String },
    }

    impl std::error::Error for ConfigError {}
}

pub mod http {
    use std::time::Duration;

    use derive_more::{Display, Error};
    use salvo::{http::ParseError, prelude::StatusError, writer::Json, Piece, Response};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Display, Clone, Error, Serialize, Deserialize)]
    pub enum BadRequest {
        #[display(fmt = "Invalid request body")]
        InvalidContent,
    }

    /// Body of every error response.
    #[derive(Debug, Display, Clone, Serialize, Deserialize)]
    #[display(fmt = "Response error: {title}, {error}")]
    pub struct ErrorResponse<T> {
        pub title: String,
        pub error: String,
        pub detail: T,
    }

    impl<T> ErrorResponse<T> {
        pub fn from_status_error(status: &StatusError, error: String, detail: T) -> Self {
            Self {
                title: status.name.clone(),
                error,
                detail,
            }
        }
    }

    impl From<ParseError> for BadRequest {
        fn from(_: ParseError) -> Self {
            BadRequest::InvalidContent
        }
    }

    impl Piece for BadRequest {
        fn render(self, res: &mut Response) {
            let status = StatusError::bad_request();
            res.render(Json(ErrorResponse::from_status_error(
                &status,
                self.to_string(),
                (),
            )));
            res.set_status_error(status);
        }
    }

    #[derive(Debug, Display, Clone, PartialEq, Eq)]
    #[display(fmt = "Maximum {max_requests} requests per {window_minutes} minutes")]
    pub struct RateLimitError {
        pub max_requests: usize,
        pub window_minutes: u64,
    }

    impl std::error::Error for RateLimitError {}

    #[derive(Debug, Display, Clone, Copy)]
    #[display(fmt = "Request exceeded the {_0:?} timeout")]
    pub struct RequestTimeout(pub Duration);

    impl std::error::Error for RequestTimeout {}

    impl Piece for RequestTimeout {
        fn render(self, res: &mut Response) {
            let status = StatusError::gateway_timeout();
            res.render(Json(ErrorResponse::from_status_error(
                &status,
                self.to_string(),
                (),
            )));
            res.set_status_error(status);
        }
    }
}
