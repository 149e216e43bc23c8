pub mod security {
    use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};
    use jsonwebtoken::{errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
    use serde::{de::DeserializeOwned, Serialize};

    use crate::domain::datatype::security::{
        PasswordHash, PasswordHashAlgorithm, PasswordHashError, TokenEncryptionError, TokenIssuer,
        TokenPayload,
    };
    use crate::domain::service::{PasswordHashService, TokenEncryptionService};

    pub struct Argon2HashService(Argon2<'static>);

    impl Argon2HashService {
        pub const ALGORITHM: PasswordHashAlgorithm = PasswordHashAlgorithm::Argon2id;

        pub fn new() -> Self {
            Self(Argon2::new(
                Algorithm::Argon2id,
                Version::V0x13,
                Params::default(),
            ))
        }
    }

    impl Default for Argon2HashService {
        fn default() -> Self {
            Self::new()
        }
    }

    impl PasswordHashService for Argon2HashService {
        fn hash_password(&self, pwd: &str) -> Result<PasswordHash, PasswordHashError> {
            let salt = password_hash::SaltString::generate(&mut rand_core::OsRng);
            let hash = self.0.hash_password(pwd.as_bytes(), &salt)?;
            hash.to_string().parse()
        }

        fn verify_password(&self, pwd: &str, hash: &PasswordHash) -> Result<(), PasswordHashError> {
            if hash.algorithm()? != Self::ALGORITHM {
                return Err(PasswordHashError::UnsupportedAlgorithm);
            }
            let parsed = password_hash::PasswordHash::new(hash.as_str())?;
            self.0.verify_password(pwd.as_bytes(), &parsed)?;
            Ok(())
        }
    }

    pub struct JWTEncryptionService {
        header: Header,
        encoding_key: EncodingKey,
        decoding_key: DecodingKey,
        validation: Validation,
    }

    impl JWTEncryptionService {
        pub fn new(secret: &str) -> Self {
            let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
            validation.set_required_spec_claims(&["exp", "iss", "sub"]);
            validation.set_issuer(&[TokenIssuer::as_str()]);
            validation.leeway = 60;
            validation.validate_exp = true;
            validation.validate_nbf = false;

            Self {
                encoding_key: EncodingKey::from_secret(secret.as_ref()),
                decoding_key: DecodingKey::from_secret(secret.as_ref()),
                header: Header::new(jsonwebtoken::Algorithm::HS256),
                validation,
            }
        }
    }

    impl From<jsonwebtoken::errors::Error> for TokenEncryptionError {
        fn from(err: jsonwebtoken::errors::Error) -> Self {
            match err.kind() {
                ErrorKind::ExpiredSignature => Self::Expired,
                ErrorKind::InvalidSignature => Self::InvalidSignature,
                ErrorKind::InvalidIssuer
                | ErrorKind::InvalidAudience
                | ErrorKind::InvalidSubject
                | ErrorKind::ImmatureSignature
                | ErrorKind::MissingRequiredClaim(_)
                | ErrorKind::InvalidAlgorithm => Self::InvalidClaims,
                ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => Self::Malformed,
                _ => Self::Encoding,
            }
        }
    }

    impl TokenEncryptionService for JWTEncryptionService {
        fn issue_token<T>(&self, payload: &TokenPayload<T>) -> Result<String, TokenEncryptionError>
        where
            T: Serialize,
        {
            let token = jsonwebtoken::encode(&self.header, payload, &self.encoding_key)?;
            Ok(token)
        }

        fn verify_token<T>(&self, token: &str) -> Result<TokenPayload<T>, TokenEncryptionError>
        where
            T: DeserializeOwned,
        {
            let token_data = jsonwebtoken::decode::<TokenPayload<T>>(
                token,
                &self.decoding_key,
                &self.validation,
            )?;
            Ok(token_data.claims)
        }
    }

    #[cfg(test)]
    mod tests {
        use std::time::Duration;

        use pretty_assertions::assert_eq;

        use super::*;
        use crate::domain::datatype::{
            security::{Token, TokenKind, TokenSubject, UserClaims},
            status::Role,
        };

        #[test]
        fn hash_and_verify_password() {
            let service = Argon2HashService::new();
            let hash = service.hash_password("secret123").unwrap();

            assert_eq!(hash.algorithm(), Ok(PasswordHashAlgorithm::Argon2id));
            assert_eq!(service.verify_password("secret123", &hash), Ok(()));
            assert_eq!(
                service.verify_password("secret124", &hash),
                Err(PasswordHashError::InvalidPassword)
            );
        }

        fn claims() -> UserClaims {
            UserClaims {
                role: Role::Producer,
                email: "chef@test.com".into(),
            }
        }

        #[test]
        fn issue_and_verify_token() {
            let service = JWTEncryptionService::new("test-secret");
            let payload = TokenPayload::new(
                TokenKind::Access,
                Duration::from_secs(300),
                TokenSubject::User(12),
                claims(),
            );
            let token = Token::new(payload, &service).unwrap();

            let verified =
                Token::<UserClaims>::verify(token.as_str().into(), TokenKind::Access, &service)
                    .unwrap();
            assert_eq!(verified.payload().subject(), Ok(TokenSubject::User(12)));
            assert_eq!(verified.payload().claims, claims());

            let err = Token::<UserClaims>::verify(token.into(), TokenKind::Refresh, &service)
                .unwrap_err();
            assert_eq!(err, TokenEncryptionError::UnexpectedKind(TokenKind::Refresh));
        }

        #[test]
        fn reject_foreign_signature() {
            let issuer = JWTEncryptionService::new("one-secret");
            let verifier = JWTEncryptionService::new("another-secret");
            let payload = TokenPayload::new(
                TokenKind::Access,
                Duration::from_secs(300),
                TokenSubject::User(1),
                claims(),
            );
            let token: String = Token::new(payload, &issuer).unwrap().into();

            assert_eq!(
                verifier.verify_token::<UserClaims>(&token).unwrap_err(),
                TokenEncryptionError::InvalidSignature
            );
            assert_eq!(
                verifier.verify_token::<UserClaims>("not.a.token").unwrap_err(),
                TokenEncryptionError::Malformed
            );
        }
    }
}

pub mod payment {
    use async_trait::async_trait;
    use chrono::Utc;
    use reqwest::Client;

    use crate::{
        domain::service::{PaymentGateway, PaymentIntent, PaymentRequest},
        error::service::DispatchError,
    };

    const STRIPE_API: &str = "https://api.stripe.com/v1";

    /// Stripe PaymentIntents over the REST API.
    pub struct StripeGateway {
        client: Client,
        secret_key: String,
    }

    impl StripeGateway {
        pub fn new(client: Client, secret_key: String) -> Self {
            Self { client, secret_key }
        }

        async fn read_intent(res: reqwest::Response) -> Result<PaymentIntent, DispatchError> {
            let status = res.status();
            if !status.is_success() {
                return Err(DispatchError::Status {
                    service: "stripe",
                    code: status.as_u16(),
                });
            }
            Ok(res.json().await?)
        }
    }

    #[async_trait]
    impl PaymentGateway for StripeGateway {
        async fn create_intent(&self, request: PaymentRequest) -> Result<PaymentIntent, DispatchError> {
            let mut form = vec![
                ("amount".to_string(), request.amount.to_string()),
                ("currency".to_string(), request.currency.to_string()),
            ];
            form.extend(
                request
                    .metadata
                    .into_iter()
                    .map(|(key, value)| (format!("metadata[{key}]"), value)),
            );

            let res = self
                .client
                .post(format!("{STRIPE_API}/payment_intents"))
                .bearer_auth(&self.secret_key)
                .form(&form)
                .send()
                .await?;
            Self::read_intent(res).await
        }

        async fn retrieve_intent(&self, id: &str) -> Result<PaymentIntent, DispatchError> {
            let res = self
                .client
                .get(format!("{STRIPE_API}/payment_intents/{id}"))
                .bearer_auth(&self.secret_key)
                .send()
                .await?;
            Self::read_intent(res).await
        }
    }

    /// Used when no Stripe key is configured. Every intent succeeds.
    pub struct DemoGateway;

    impl DemoGateway {
        pub const CLIENT_SECRET: &'static str = "demo_client_secret";
    }

    #[async_trait]
    impl PaymentGateway for DemoGateway {
        async fn create_intent(&self, request: PaymentRequest) -> Result<PaymentIntent, DispatchError> {
            let now = Utc::now();
            Ok(PaymentIntent {
                id: format!("pi_demo_{}.{:06}", now.timestamp(), now.timestamp_subsec_micros()),
                client_secret: Some(Self::CLIENT_SECRET.into()),
                amount: request.amount,
                currency: request.currency.into(),
                status: PaymentIntent::SUCCEEDED.into(),
            })
        }

        async fn retrieve_intent(&self, id: &str) -> Result<PaymentIntent, DispatchError> {
            Ok(PaymentIntent {
                id: id.into(),
                client_secret: Some(Self::CLIENT_SECRET.into()),
                amount: 0,
                currency: "gbp".into(),
                status: PaymentIntent::SUCCEEDED.into(),
            })
        }
    }

    #[cfg(test)]
    mod tests {
        use pretty_assertions::assert_eq;

        use super::*;

        #[tokio::test]
        async fn demo_intents_succeed() {
            let intent = DemoGateway
                .create_intent(PaymentRequest {
                    amount: 3500,
                    currency: "gbp",
                    metadata: vec![("user_id", "1".into())],
                })
                .await
                .unwrap();

            assert!(intent.id.starts_with("pi_demo_"));
            assert_eq!(intent.client_secret.as_deref(), Some("demo_client_secret"));
            assert_eq!(intent.amount, 3500);
            assert!(DemoGateway.retrieve_intent(&intent.id).await.unwrap().succeeded());
        }
    }
}

pub mod mail {
    use std::path::PathBuf;

    use chrono::Utc;
    use uuid::Uuid;

    use crate::{
        config::env_var::MailSettings,
        domain::service::{Email, Mailer},
    };

    /// Writes every message to `<data dir>/outbox` for a relay to pick up.
    pub struct OutboxMailer {
        outbox: PathBuf,
        sender: String,
        server: String,
    }

    impl OutboxMailer {
        pub fn new(data_dir: &str, settings: &MailSettings) -> Self {
            Self {
                outbox: PathBuf::from(data_dir).join("outbox"),
                sender: settings.sender.clone(),
                server: format!("{}:{}", settings.server, settings.port),
            }
        }

        fn file_name(email: &Email) -> String {
            let recipient: String = email
                .to
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .collect();
            format!(
                "{}-{}-{recipient}.eml",
                Utc::now().format("%Y%m%dT%H%M%S%.6f"),
                Uuid::new_v4().simple()
            )
        }

        fn render(&self, email: &Email) -> String {
            format!(
                "From: {}\r\nTo: {}\r\nSubject: {}\r\nContent-Type: text/html; charset=utf-8\r\n\r\n{}\r\n",
                self.sender, email.to, email.subject, email.html
            )
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn burst_to_one_recipient_gets_distinct_files() {
            let email = Email {
                to: "ana+orders@example.com".into(),
                subject: "Order confirmed".into(),
                html: "<p>thanks</p>".into(),
            };

            let first = OutboxMailer::file_name(&email);
            let second = OutboxMailer::file_name(&email);

            assert_ne!(first, second);
            assert!(first.ends_with("-ana_orders_example_com.eml"));
        }
    }

    impl Mailer for OutboxMailer {
        fn send(&self, email: Email) {
            let path = self.outbox.join(Self::file_name(&email));
            let outbox = self.outbox.clone();
            let message = self.render(&email);
            let server = self.server.clone();

            tokio::spawn(async move {
                let result = async {
                    tokio::fs::create_dir_all(&outbox).await?;
                    tokio::fs::write(&path, message).await
                }
                .await;

                match result {
                    Ok(()) => tracing::info!(to = %email.to, subject = %email.subject, relay = %server, "mail queued"),
                    Err(err) => tracing::warn!(to = %email.to, subject = %email.subject, "mail not queued: {err}"),
                }
            });
        }
    }
}

pub mod recommendation {
    use std::time::Duration;

    use async_trait::async_trait;
    use reqwest::{Client, StatusCode};
    use serde_json::Value;
    use url::Url;

    use crate::{domain::service::RecommendationService, error::service::DispatchError};

    pub const AI_SERVICE_TIMEOUT: Duration = Duration::from_secs(2);

    pub struct AiServiceClient {
        client: Client,
        endpoint: Url,
    }

    impl AiServiceClient {
        pub fn new(client: Client, base: &Url) -> Result<Self, url::ParseError> {
            let mut endpoint = base.clone();
            endpoint
                .path_segments_mut()
                .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
                .pop_if_empty()
                .push("recommend");
            Ok(Self { client, endpoint })
        }
    }

    #[async_trait]
    impl RecommendationService for AiServiceClient {
        async fn recommend(&self, request: &Value) -> Result<Option<Value>, DispatchError> {
            let res = self
                .client
                .post(self.endpoint.clone())
                .timeout(AI_SERVICE_TIMEOUT)
                .json(request)
                .send()
                .await?;

            if res.status() != StatusCode::OK {
                return Ok(None);
            }
            Ok(Some(res.json().await?))
        }
    }

    #[cfg(test)]
    mod tests {
        use pretty_assertions::assert_eq;

        use super::*;

        fn endpoint(base: &str) -> String {
            let base = Url::parse(base).expect("valid base url");
            AiServiceClient::new(Client::new(), &base)
                .expect("endpoint")
                .endpoint
                .to_string()
        }

        #[test]
        fn endpoint_extends_base_path() {
            assert_eq!(endpoint("http://localhost:8001"), "http://localhost:8001/recommend");
            assert_eq!(endpoint("http://ai.internal:8001/engine"), "http://ai.internal:8001/engine/recommend");
            assert_eq!(endpoint("http://ai.internal:8001/engine/"), "http://ai.internal:8001/engine/recommend");
        }

        #[test]
        fn opaque_base_is_rejected() {
            let base = Url::parse("mailto:ai@example.com").expect("valid url");
            assert!(AiServiceClient::new(Client::new(), &base).is_err());
        }
    }
}
