// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Washline

use std::{env, net::SocketAddr, path::PathBuf};

use tracing_subscriber::EnvFilter;

use washline_server::{
    api::router,
    auth::Role,
    config::{
        ADMIN_ADMISSION_IDS_ENV, ALLOWED_DOMAIN_ENV, AUTH_SECRET_ENV, DATABASE_FILE, DATA_DIR_ENV,
        DEFAULT_ALLOWED_DOMAIN, DEFAULT_DATA_DIR, HOST_ENV, LOG_FORMAT_ENV, PORT_ENV,
    },
    state::{AppState, AuthConfig},
    storage::WashDatabase,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    match env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

/// Grant the admin role to every admission number listed in
/// `ADMIN_ADMISSION_IDS`. The role table stays authoritative afterwards;
/// this only makes sure a fresh deployment has operators at all.
fn seed_admin_roles(db: &WashDatabase) {
    let Ok(raw) = env::var(ADMIN_ADMISSION_IDS_ENV) else {
        return;
    };
    for admission_no in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match db.assign_role(admission_no, Role::Admin) {
            Ok(()) => tracing::info!(admission_no, "seeded admin role"),
            Err(e) => tracing::error!(admission_no, error = %e, "failed to seed admin role"),
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let data_dir = env::var(DATA_DIR_ENV).unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
    let db_path = PathBuf::from(&data_dir).join(DATABASE_FILE);
    let db = WashDatabase::open(&db_path).expect("Failed to open database");
    tracing::info!(path = %db_path.display(), "database open");

    seed_admin_roles(&db);

    let secret = env::var(AUTH_SECRET_ENV).ok();
    if secret.is_none() {
        tracing::warn!("AUTH_SECRET not set: running in development mode, tokens are NOT verified");
    }
    let auth = AuthConfig {
        secret,
        allowed_domain: env::var(ALLOWED_DOMAIN_ENV)
            .unwrap_or_else(|_| DEFAULT_ALLOWED_DOMAIN.to_string()),
    };

    let state = AppState::new(db).with_auth_config(auth);
    let app = router(state);

    let host = env::var(HOST_ENV).unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var(PORT_ENV)
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("Failed to parse bind address");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    tracing::info!(%addr, "Washline server listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server failed");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("shutdown signal received");
}
