use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::env;
use std::sync::Arc;

use nexus_board::api::{self, AppState};
use nexus_board::auth::AuthService;
use nexus_board::metrics::MetricsCollector;
use nexus_board::store::Store;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    // Load environment variables
    dotenvy::dotenv().ok();

    // Get configuration from environment
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8090".to_string())
        .parse()
        .expect("PORT must be a number");

    let db_path = env::var("DATABASE_PATH").unwrap_or_else(|_| "nexus.db".to_string());

    let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
        log::warn!("JWT_SECRET not set, using default (not secure for production!)");
        "default_jwt_secret_change_me".to_string()
    });

    // Admin credential: a pre-computed bcrypt hash, or a plain password
    // hashed at startup for development setups.
    let admin_password_hash = match env::var("ADMIN_PASSWORD_HASH") {
        Ok(hash) => hash,
        Err(_) => match env::var("ADMIN_PASSWORD") {
            Ok(password) if !password.is_empty() => {
                AuthService::hash_password(&password).expect("Failed to hash admin password")
            }
            _ => {
                log::warn!(
                    "ADMIN_PASSWORD_HASH/ADMIN_PASSWORD not set, admin routes are disabled"
                );
                String::new()
            }
        },
    };

    // Initialize store
    let store = Arc::new(Store::new(&db_path).expect("Failed to initialize database"));

    // Initialize auth service and metrics
    let auth_service = Arc::new(AuthService::new(jwt_secret, admin_password_hash));
    let metrics = MetricsCollector::new();

    log::info!("Database: {}", db_path);
    log::info!("Starting nexus-board server on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .wrap(metrics.clone())
            // Register AuthService individually for the admin extractor
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(AppState {
                store: store.clone(),
                auth_service: auth_service.clone(),
                metrics: metrics.clone(),
            }))
            .configure(api::configure_routes)
    })
    .workers(1) // Single worker - the board's traffic is tiny
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
