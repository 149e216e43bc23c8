use std::{error::Error, sync::Arc, time::Duration};

use clap::{Parser, Subcommand};
use salvo::{listener::TcpListener, Server};
use sqlx::PgPool;

use app::use_case::auth::TokenLifetime;
use config::env_var::{self, EnvVar};
use domain::{
    entity::Entity,
    service::{PaymentGateway, RecommendationService},
};
use infra::{
    controller::ApiContext,
    database::{connection, schema},
    router, seed,
    service::{
        mail::OutboxMailer,
        payment::{DemoGateway, StripeGateway},
        recommendation::AiServiceClient,
        security::{Argon2HashService, JWTEncryptionService},
    },
};

mod app;
mod base;
mod config;
mod domain;
mod error;
mod infra;

const HTTP_CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Parser)]
#[command(name = "currypot_api", about = "Home cooked food marketplace API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve,
    /// Insert the sample admin, customer, kitchens and dishes.
    Seed,
}

fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let env = env_var::get()?;

    tracing_subscriber::fmt().with_max_level(env.log_level).init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(env.runtime_threads())
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match cli.command.unwrap_or(Command::Serve) {
            Command::Serve => serve(env).await,
            Command::Seed => run_seed(env).await,
        }
    })
}

async fn prepare_database(env: &EnvVar) -> Result<PgPool, Box<dyn Error>> {
    let pool = connection::create_sqlx_pool(env).await?;
    schema::migrate(&pool).await?;
    Ok(pool)
}

async fn serve(env: &'static EnvVar) -> Result<(), Box<dyn Error>> {
    tokio::fs::create_dir_all(&env.data_dir).await?;
    let pool = prepare_database(env).await?;

    let hash_service = Argon2HashService::new();
    seed::ensure_admin(&pool, &hash_service, &env.admin_email, &env.admin_password).await?;

    let client = reqwest::Client::builder().timeout(HTTP_CLIENT_TIMEOUT).build()?;

    let payment_gateway: Box<dyn PaymentGateway> = match &env.stripe_secret_key {
        Some(key) => Box::new(StripeGateway::new(client.clone(), key.clone())),
        None => {
            tracing::warn!("STRIPE_SECRET_KEY is not set, payments run in demo mode");
            Box::new(DemoGateway)
        }
    };

    let recommendation_service = match &env.ai_service_url {
        Some(url) => {
            let service: Box<dyn RecommendationService> = Box::new(AiServiceClient::new(client, url)?);
            Some(service)
        }
        None => None,
    };

    let ctx = Arc::new(ApiContext {
        pool,
        hash_service,
        token_service: JWTEncryptionService::new(&env.token_key),
        token_lifetime: TokenLifetime {
            access: env.access_token_ttl,
            refresh: env.refresh_token_ttl,
        },
        payment_gateway,
        mailer: Box::new(OutboxMailer::new(&env.data_dir, &env.mail)),
        recommendation_service,
    });

    let address = env.listen_address();
    tracing::info!(%address, threads = env.runtime_threads(), "listening");
    Server::new(TcpListener::bind(&address))
        .serve(router::app(ctx, env.request_timeout))
        .await;
    Ok(())
}

async fn run_seed(env: &'static EnvVar) -> Result<(), Box<dyn Error>> {
    let pool = prepare_database(env).await?;
    let hash_service = Argon2HashService::new();

    let admin = seed::ensure_admin(&pool, &hash_service, &env.admin_email, &env.admin_password).await?;
    let report = seed::sample_data(&pool, &hash_service).await?;

    tracing::info!(
        admin = %env.admin_email,
        admin_id = admin.ident(),
        users = report.users,
        kitchens = report.kitchens,
        dishes = report.dishes,
        "sample data is in place"
    );
    Ok(())
}
