use actix_cors::Cors;
use actix_files::Files;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::middleware::Logger;
use actix_web::{web, App};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{AssetBackend, Config};
use crate::db::{create_pool, EmployeeStore, MemoryStore, PgStore, Store, UserStore};
use crate::errors::{AppError, AppResult};
use crate::handlers;
use crate::services::assets::{AssetStore, LocalAssetStore, S3AssetStore, UPLOADS_ROUTE};
use crate::services::employee::EmployeeService;
use crate::services::user::UserService;
use crate::utils::jwt::JwtKeys;
use crate::utils::s3::create_s3_client;

/// Process-wide handles, created once at startup and shared by every worker.
pub struct AppState {
    pub employees: EmployeeService,
    pub users: UserService,
    pub max_upload_bytes: usize,
    store: Arc<dyn Store>,
}

impl AppState {
    pub fn new<S>(
        store: Arc<S>,
        assets: Arc<dyn AssetStore>,
        jwt: JwtKeys,
        max_upload_bytes: usize,
    ) -> Self
    where
        S: Store + 'static,
    {
        let employee_store: Arc<dyn EmployeeStore> = store.clone();
        let user_store: Arc<dyn UserStore> = store.clone();
        Self {
            employees: EmployeeService::new(employee_store, assets),
            users: UserService::new(user_store, jwt),
            max_upload_bytes,
            store,
        }
    }

    /// Closes the store connection; call after the server has stopped.
    pub async fn shutdown(&self) {
        self.store.close().await;
        info!("Store connection closed");
    }
}

/// Connects the record store and the asset host described by `config`.
pub async fn bootstrap(config: &Config) -> AppResult<AppState> {
    let jwt = JwtKeys::new(&config.jwt_secret, config.jwt_ttl_days);

    let assets: Arc<dyn AssetStore> = match &config.asset_backend {
        AssetBackend::S3 { bucket, region } => {
            let client = create_s3_client(region.clone()).await;
            info!("Storing profile pictures in S3 bucket {}", bucket);
            Arc::new(S3AssetStore::new(client, bucket.clone()))
        }
        AssetBackend::Local => {
            tokio::fs::create_dir_all(&config.uploads_dir)
                .await
                .map_err(|err| AppError::AssetError(err.to_string()))?;
            info!("Storing profile pictures in {}", config.uploads_dir.display());
            Arc::new(LocalAssetStore::new(config.uploads_dir.clone()))
        }
    };

    let state = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            info!("Connected to Postgres");
            AppState::new(Arc::new(PgStore::new(pool)), assets, jwt, config.max_upload_bytes)
        }
        None => {
            warn!("DATABASE_URL is not set; records are kept in memory and lost on restart");
            AppState::new(Arc::new(MemoryStore::new()), assets, jwt, config.max_upload_bytes)
        }
    };
    Ok(state)
}

pub fn build_app(
    state: web::Data<AppState>,
    uploads_dir: PathBuf,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(state)
        .app_data(web::JsonConfig::default().error_handler(|err, _req| {
            AppError::InvalidInput(err.to_string()).into()
        }))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| {
            AppError::InvalidInput(err.to_string()).into()
        }))
        .app_data(web::PathConfig::default().error_handler(|_err, _req| {
            AppError::NotFound("Resource not found".to_string()).into()
        }))
        .wrap(Logger::default())
        .wrap(Cors::permissive())
        .route("/", web::get().to(handlers::api_root))
        .service(
            web::scope("/api/users")
                .service(web::resource("").route(web::post().to(handlers::user::register_user)))
                .service(web::resource("/login").route(web::post().to(handlers::user::login_user)))
                .service(
                    web::resource("/profile")
                        .route(web::get().to(handlers::user::get_user_profile)),
                ),
        )
        .service(
            web::scope("/api/employees")
                .service(
                    web::resource("")
                        .route(web::get().to(handlers::employee::get_employees))
                        .route(web::post().to(handlers::employee::create_employee)),
                )
                .service(
                    web::resource("/search")
                        .route(web::get().to(handlers::employee::search_employees)),
                )
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(handlers::employee::get_employee))
                        .route(web::put().to(handlers::employee::update_employee))
                        .route(web::delete().to(handlers::employee::delete_employee)),
                ),
        )
        .service(Files::new(UPLOADS_ROUTE, uploads_dir))
        .default_service(web::to(handlers::not_found))
}
