use actix_web::{middleware as actix_middleware, web, App, HttpServer};
use anyhow::Context;

use guest_token_relay::config::RelayConfig;
use guest_token_relay::handlers;
use guest_token_relay::relay::TokenRelay;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (for development)
    // Try loading from current directory first, then from server/ directory
    if dotenvy::dotenv().is_err() {
        dotenvy::from_filename("server/.env").ok();
    }

    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    log::info!("Starting guest token relay...");

    let config_path = std::env::var("RELAY_CONFIG_PATH")
        .unwrap_or_else(|_| "server/config/relay.toml".to_string());

    let mut config = RelayConfig::load_from_file(&config_path)
        .with_context(|| format!("failed to load relay configuration from '{}'", config_path))?;
    config
        .apply_env_overrides()
        .context("invalid environment override")?;
    config.validate().context("invalid relay configuration")?;

    log::info!(
        "Service account '{}', referer {}, upstream timeout {}s",
        config.credentials.username,
        config.credentials.referer,
        config.upstream.timeout_secs
    );
    if !config.upstream.expose_error_body {
        log::info!("Upstream error bodies will be withheld from callers");
    }

    let relay = TokenRelay::from_config(&config).context("failed to build upstream client")?;

    let host = config.server.host.clone();
    let port = config.server.port;
    let config = web::Data::new(config);
    let relay = web::Data::new(relay);

    log::info!("Starting HTTP server at {}:{}...", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(config.clone())
            .app_data(relay.clone())
            .wrap(actix_middleware::Logger::default())
            .configure(handlers::configure)
    })
    .bind((host.as_str(), port))
    .with_context(|| format!("failed to bind {}:{}", host, port))?
    .run()
    .await
    .context("HTTP server terminated with an error")?;

    Ok(())
}
