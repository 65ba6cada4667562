use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use sqlx::ConnectOptions;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use api::routes;
use api::state::AppState;
use common::token::generate_api_token;
use common::{init_logging, init_s3_object_store, settings::Settings};
use data::api_token::{
    ENTITLEMENT_ADMIN, ENTITLEMENT_BUNDLE_PUSH, ENTITLEMENT_BUNDLE_ROLLBACK, NewApiToken,
};
use repos::Repo;
use repos::api_token::ApiTokenRepo;

// Room for the multipart framing around an upload of the maximum size.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    #[arg(short = 'C', long, default_value = "config")]
    config_dir: String,
}

struct OtaServer {
    settings: Arc<Settings>,
}

impl OtaServer {
    fn new(config_dir: &str) -> Result<Self, config::ConfigError> {
        Ok(Self {
            settings: Arc::new(Settings::with_config_dir(config_dir)?),
        })
    }

    async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let _guard = init_logging(&self.settings.logger);

        info!("Starting server on port {}", self.settings.server.port);

        let pool = self.init_db().await?;
        let repo = Repo::new(pool);
        let store = init_s3_object_store(&self.settings.object_storage)?;

        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        if let Err(err) = self.ensure_default_api_token(&repo).await {
            error!("Failed to create default API token: {}", err);
        }

        let state = AppState::new(repo, self.settings.clone(), store);

        let body_limit = self.settings.server.max_bundle_size as usize + MULTIPART_OVERHEAD;
        let routes_all = Router::new()
            .nest("/api", routes::routes(state.clone()).await)
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.settings.server.port));

        match (
            &self.settings.server.public_key,
            &self.settings.server.private_key,
        ) {
            (Some(public_key), Some(private_key)) => {
                let config = RustlsConfig::from_pem(
                    public_key.clone().into_bytes(),
                    private_key.clone().into_bytes(),
                )
                .await?;

                info!("Serving HTTPS on {addr}");
                axum_server::bind_rustls(addr, config)
                    .serve(routes_all.into_make_service())
                    .await?;
            }
            _ => {
                warn!("No TLS key pair configured, serving plain HTTP on {addr}");
                axum_server::bind(addr)
                    .serve(routes_all.into_make_service())
                    .await?;
            }
        }

        Ok(())
    }

    async fn init_db(&self) -> Result<PgPool, Box<dyn std::error::Error>> {
        let mut opts: PgConnectOptions = self.settings.database.db_uri.parse()?;
        opts = opts.log_statements(log::LevelFilter::Debug);

        let pool = PgPoolOptions::new()
            .max_connections(self.settings.database.max_connections)
            .connect_with(opts)
            .await?;

        sqlx::migrate!("../../migrations").run(&pool).await?;
        Ok(pool)
    }

    /// Bootstraps an unscoped token with every entitlement when the token
    /// table is empty, so a fresh deployment can be administered.
    async fn ensure_default_api_token(
        &self,
        repo: &Repo,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut conn = repo.acquire().await?;

        if ApiTokenRepo::count(&mut *conn).await? > 0 {
            info!("API tokens already exist, skipping default token creation");
            return Ok(());
        }

        let generated = generate_api_token()?;

        let new_token = NewApiToken {
            description: "Default API token".to_string(),
            token_id: generated.token_id,
            token_hash: generated.token_hash,
            app_id: None,
            entitlements: vec![
                ENTITLEMENT_BUNDLE_PUSH.to_string(),
                ENTITLEMENT_BUNDLE_ROLLBACK.to_string(),
                ENTITLEMENT_ADMIN.to_string(),
            ],
            expires_at: None,
        };

        ApiTokenRepo::create(&mut *conn, new_token).await?;
        info!("Created default API token: {}", generated.token);

        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let server = match OtaServer::new(&args.config_dir) {
        Ok(server) => server,
        Err(err) => {
            eprintln!("Failed to load settings: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = server.run().await {
        error!("Server terminated: {err}");
        std::process::exit(1);
    }
}
