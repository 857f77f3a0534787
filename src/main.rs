use actix_web::{web, HttpServer};
use dotenv::dotenv;
use log::info;
use std::io;

use employee_directory::app::{bootstrap, build_app};
use employee_directory::config::Config;
use employee_directory::errors;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config =
        Config::from_env().map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    errors::expose_internal_details(config.app_env.is_development());

    // Store and asset host are opened once and shared by every worker.
    let state = web::Data::new(
        bootstrap(&config)
            .await
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?,
    );

    info!(
        "Server running in {} mode on port {}",
        config.app_env.as_str(),
        config.port
    );

    let server_state = state.clone();
    let uploads_dir = config.uploads_dir.clone();
    let result = HttpServer::new(move || build_app(server_state.clone(), uploads_dir.clone()))
        .bind(("0.0.0.0", config.port))?
        .run()
        .await;

    state.shutdown().await;
    result
}
