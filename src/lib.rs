use std::{net::SocketAddr, sync::Arc};

use dotenvy::dotenv;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::AppState;
use jobs::spawn_all_jobs;

pub mod app;
pub mod auth;
pub mod constants;
pub mod database;
pub mod fcm;
pub mod handlers;
pub mod jobs;
pub mod models;
pub mod swagger;
pub mod utils;

#[cfg(test)]
use mockall_double::double;

#[cfg_attr(test, double)]
use database::AppDatabase;

#[cfg_attr(test, double)]
use fcm::FcmClient;

pub async fn start_web_server() {
    // import .env file
    dotenv().ok();
    initialize_logging();
    // create database client
    let db_client = AppDatabase::new()
        .await
        .expect("Unable to accquire database client");
    let db_client = Arc::new(db_client);
    // create the push notification client
    let fcm_client = FcmClient::new().expect("Unable to create push notification client");
    let fcm_client = Arc::new(fcm_client);
    spawn_all_jobs(db_client.clone(), fcm_client.clone());
    let state = Arc::new(AppState {
        db: db_client,
        fcm: fcm_client,
    });
    start_server(state).await;
}

fn initialize_logging() {
    // create default env filter
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or("eventdesk_backend_rust=debug".into());

    // initialize tracing subscriber for logging
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}

async fn start_server(state: Arc<AppState>) {
    // read the port number from env variable
    let port = std::env::var("PORT").unwrap_or_default();
    let port = port.parse::<u16>().unwrap_or(3000);
    // build the socket address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    // create the app instance
    let app = app::build_app(state);
    tracing::debug!("Starting the app in: {addr}");
    // start serving the app in the socket address
    axum::Server::bind(&addr).serve(app).await.unwrap();
}
