use log::{error, info};

mod config;
mod error;
mod extract;
mod handlers;
mod models;
mod notifier;
mod routes;
mod services;
mod state;

#[cfg(test)]
mod tests;

use config::Config;

#[tokio::main]
async fn main() -> Result<(), lambda_http::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Logging initialized with env_logger");
    info!("Starting Trip Service");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    let app = routes::create_router(&config).await;

    if config.lambda {
        info!("Running as Lambda function");
        lambda_http::run(app).await
    } else {
        let addr = format!("0.0.0.0:{}", config.port);
        info!("Running locally on {}", addr);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }
}
