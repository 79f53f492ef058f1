mod catalog;
mod config;
mod job_controller;
mod services;
mod storage;

use crate::catalog::category::CategoryTable;
use crate::config::Config;
use crate::job_controller::state::{JobsState, UploadsState};
use crate::storage::sqlite::SqliteStore;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;
use std::io;
use tokio::sync::mpsc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    // Create the schema up front so a bad database path fails at start-up.
    SqliteStore::open(&config.database_path).map_err(io::Error::other)?;

    // Initialize job controller state
    let (tx, rx) = mpsc::channel(100);
    let jobs_state = JobsState::new(tx);

    // Start job updater task
    let updater_state = jobs_state.clone();
    tokio::spawn(async move {
        job_controller::state::start_job_updater(updater_state, rx).await;
    });

    let uploads_state = UploadsState::default();
    let categories = CategoryTable::standard();
    let bind = (config.host.clone(), config.port);

    info!(
        "Server running at http://{}:{} (database {}, batches of {})",
        config.host, config.port, config.database_path, config.batch_size
    );

    let json_limit = config.max_upload_bytes;
    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(json_limit))
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(categories.clone()))
            .app_data(web::Data::new(jobs_state.clone()))
            .app_data(web::Data::new(uploads_state.clone()))
            .service(services::bulk_upload::configure_routes())
    })
    .bind(bind)?
    .run()
    .await
}
