use std::time::Duration;

use sqlx::PgPool;

use super::{producer_view, token_subject, user::apply_preferences};
use crate::{
    app::resource::{
        auth::{AccessToken, AuthResponse, Credentials, Health, RegisterUser, ResetPassword},
        user::{PreferencesPatch, ProfileResponse, UserResponse},
        Message,
    },
    domain::{
        datatype::{
            security::{Token, TokenKind, TokenPayload, TokenSubject, UserClaims},
            status::Role,
        },
        entity::{
            producer::ProducerState,
            user::{Preferences, UserState},
            Entity, User,
        },
        service::{PasswordHashService, TokenEncryptionService},
        validation,
    },
    error::{
        app::ApplicationError,
        resource::{ConflictError, ValidationError, ValidationErrorKind, ValidationFieldError},
        security::{AuthenticationError, ForbiddenError, UnauthorizedError},
    },
    infra::database::repository::{producer, user},
};

/// Validity of the issued tokens.
#[derive(Debug, Clone, Copy)]
pub struct TokenLifetime {
    pub access: Duration,
    pub refresh: Duration,
}

fn issue_token<TS>(token_service: &TS, kind: TokenKind, ttl: Duration, user: &User) -> Result<String, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let payload = TokenPayload::new(
        kind,
        ttl,
        TokenSubject::User(user.ident()),
        UserClaims {
            role: user.role(),
            email: user.state.email.clone(),
        },
    );
    let token = Token::new(payload, token_service).map_err(ApplicationError::unknown)?;
    Ok(token.into())
}

fn authenticated<TS>(
    token_service: &TS,
    lifetime: TokenLifetime,
    message: &'static str,
    user: &User,
) -> Result<AuthResponse, ApplicationError>
where
    TS: TokenEncryptionService,
{
    Ok(AuthResponse {
        message,
        user: UserResponse::from(user),
        access_token: issue_token(token_service, TokenKind::Access, lifetime.access, user)?,
        refresh_token: issue_token(token_service, TokenKind::Refresh, lifetime.refresh, user)?,
    })
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Sign up a customer, a producer with a pending kitchen, or an admin.
pub async fn register<HS, TS>(
    pool: &PgPool,
    hash_service: &HS,
    token_service: &TS,
    lifetime: TokenLifetime,
    form: RegisterUser,
) -> Result<AuthResponse, ApplicationError>
where
    HS: PasswordHashService,
    TS: TokenEncryptionService,
{
    let name = form.name.unwrap_or_default();
    let email = normalize_email(form.email.as_deref().unwrap_or_default());
    let password = form.password.unwrap_or_default();

    let mut errors = Vec::new();
    if let Err(err) = validation::name(&name) {
        errors.push(err);
    }
    if let Err(err) = validation::email(&email) {
        errors.push(err);
    }
    if let Err(err) = validation::password("password", &password) {
        errors.push(err);
    }
    if let Some(phone) = form.phone.as_deref().filter(|phone| !phone.is_empty()) {
        if let Err(err) = validation::phone(phone) {
            errors.push(err);
        }
    }

    let role = match form.role.as_deref().filter(|role| !role.is_empty()) {
        None => {
            errors.push(ValidationFieldError::required("role", "Role is required"));
            Role::Customer
        }
        Some(text) => match text.parse::<Role>() {
            Ok(role) => role,
            Err(_) => {
                errors.push(ValidationFieldError::new(
                    "role",
                    text,
                    vec![ValidationErrorKind::UnknownVariant],
                    "Invalid role. Must be one of: customer, producer, admin",
                ));
                Role::Customer
            }
        },
    };

    if !errors.is_empty() {
        return Err(ValidationError::from_resource::<RegisterUser>(errors).into());
    }

    if user::email_exists(pool, &email).await? {
        return Err(ConflictError::new::<RegisterUser>("Email already registered").into());
    }

    let password_hash = hash_service.hash_password(&password).map_err(|_| {
        ValidationError::single::<RegisterUser>(ValidationFieldError::new(
            "password",
            "",
            vec![ValidationErrorKind::Invalid],
            "Invalid password",
        ))
    })?;

    let mut state = UserState::new(name.trim().to_string(), email, password_hash, role);
    state.phone = form.phone.filter(|phone| !phone.is_empty());
    if role == Role::Customer {
        let mut preferences = Preferences::customer_defaults();
        apply_preferences(
            &mut preferences,
            PreferencesPatch {
                dietary_preferences: form.dietary_preferences,
                spice_level: form.spice_level,
                budget_preference: form.budget_preference,
                dietary_restrictions: form.dietary_restrictions,
                allergens: form.allergens,
                preferred_cuisines: form.preferred_cuisines,
                meal_preferences: form.meal_preferences,
                delivery_time_windows: form.delivery_time_windows,
            },
        );
        state.preferences = preferences;
    }

    let inserted = match role {
        Role::Producer => {
            let kitchen_name = form
                .kitchen_name
                .filter(|kitchen| !kitchen.trim().is_empty())
                .unwrap_or_else(|| state.name.clone());
            let cuisine = form.cuisine_specialty;
            let radius = form.delivery_radius_km;
            let minimum = form.minimum_order_value;
            user::insert_producer_user(pool, &state, move |user_id| {
                let mut kitchen = ProducerState::pending(user_id, kitchen_name, cuisine);
                if let Some(radius) = radius.filter(|radius| *radius > 0.0) {
                    kitchen.delivery_radius_km = radius;
                }
                if let Some(minimum) = minimum.filter(|minimum| *minimum >= 0.0) {
                    kitchen.minimum_order_value = minimum;
                }
                kitchen
            })
            .await
            .map(|(user, kitchen)| {
                tracing::info!(user = user.ident(), producer = kitchen.ident(), "producer registered, pending approval");
                user
            })
        }
        _ => user::insert_user(pool, &state).await,
    };

    let registered = match inserted {
        Ok(user) => user,
        Err(err) if err.is_unique_violation() => {
            return Err(ConflictError::new::<RegisterUser>("Email already registered").into())
        }
        Err(err) => return Err(err.into()),
    };

    authenticated(token_service, lifetime, "Registration successful", &registered)
}

pub async fn login<HS, TS>(
    pool: &PgPool,
    hash_service: &HS,
    token_service: &TS,
    lifetime: TokenLifetime,
    credentials: Credentials,
) -> Result<AuthResponse, ApplicationError>
where
    HS: PasswordHashService,
    TS: TokenEncryptionService,
{
    let (email, password) = match (credentials.email, credentials.password) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => (email, password),
        _ => return Err(ApplicationError::operation("Email and password are required")),
    };

    let found = user::find_user_by_email(pool, &normalize_email(&email))
        .await?
        .ok_or(AuthenticationError::InvalidCredential)?;

    hash_service
        .verify_password(&password, &found.state.password_hash)
        .map_err(AuthenticationError::from)?;

    if !found.is_active() {
        return Err(ForbiddenError::AccountDeactivated.into());
    }

    authenticated(token_service, lifetime, "Login successful", &found)
}

/// New access token from a refresh token.
pub async fn refresh<TS>(
    pool: &PgPool,
    token_service: &TS,
    lifetime: TokenLifetime,
    token: &str,
) -> Result<AccessToken, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let token = Token::<UserClaims>::verify(token.into(), TokenKind::Refresh, token_service)
        .map_err(UnauthorizedError::from)?;
    let TokenSubject::User(user_id) = token.payload().subject().map_err(UnauthorizedError::from)?;

    let found = user::find_user(pool, user_id)
        .await?
        .filter(User::is_active)
        .ok_or(AuthenticationError::InactiveUser)?;

    Ok(AccessToken {
        access_token: issue_token(token_service, TokenKind::Access, lifetime.access, &found)?,
    })
}

/// The token owner, whatever its account state.
pub async fn me<TS>(pool: &PgPool, token_service: &TS, token: &str) -> Result<ProfileResponse, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let user_id = token_subject(token_service, token)?;
    let found = user::find_user(pool, user_id)
        .await?
        .ok_or_else(|| ApplicationError::not_found("User"))?;

    let kitchen = match found.role() {
        Role::Producer => match producer::find_producer_by_user(pool, user_id).await? {
            Some(kitchen) => Some(producer_view(pool, &kitchen).await?),
            None => None,
        },
        _ => None,
    };

    Ok(ProfileResponse {
        user: UserResponse::from(&found),
        producer: kitchen,
    })
}

/// Tokens are stateless, the client drops them.
pub fn logout<TS>(token_service: &TS, token: &str) -> Result<Message, ApplicationError>
where
    TS: TokenEncryptionService,
{
    token_subject(token_service, token)?;
    Ok(Message::new("Logged out successfully"))
}

pub async fn reset_password<HS>(
    pool: &PgPool,
    hash_service: &HS,
    form: ResetPassword,
) -> Result<Message, ApplicationError>
where
    HS: PasswordHashService,
{
    let email = match form.email.filter(|email| !email.is_empty()) {
        Some(email) => normalize_email(&email),
        None => return Err(ApplicationError::operation("Email is required")),
    };
    let new_password = match form.new_password.filter(|password| !password.is_empty()) {
        Some(password) => password,
        None => return Err(ApplicationError::operation("New password is required")),
    };
    validation::password("new_password", &new_password)
        .map_err(ValidationError::single::<ResetPassword>)?;

    let mut found = user::find_user_by_email(pool, &email)
        .await?
        .ok_or_else(|| ApplicationError::not_found("Email"))?;

    found.state.password_hash = hash_service
        .hash_password(&new_password)
        .map_err(ApplicationError::unknown)?;
    user::update_user(pool, &found).await?;
    tracing::info!(user = found.ident(), "password reset");

    Ok(Message::new(
        "Password reset successfully. You can now login with your new password.",
    ))
}

pub fn health() -> Health {
    Health {
        status: "ok",
        message: "Auth service is running",
    }
}
