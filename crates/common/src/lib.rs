pub mod settings;
pub mod token;

use object_store::{ObjectStore, aws::AmazonS3Builder};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};
use uuid::Uuid;

use settings::{Logger, ObjectStorage};

/// The verified caller of an operator endpoint.
///
/// Produced by the API token layer and passed explicitly into every core
/// operation that needs to know who is acting.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Principal {
    pub token_id: Uuid,
    pub name: String,
    pub app_id: Option<Uuid>,
}

impl Principal {
    pub fn new(token_id: Uuid, name: String, app_id: Option<Uuid>) -> Self {
        Self {
            token_id,
            name,
            app_id,
        }
    }

    /// Tokens without an app scope may act on every app.
    pub fn can_access_app(&self, app_id: Uuid) -> bool {
        match self.app_id {
            Some(scope) => scope == app_id,
            None => true,
        }
    }
}

use std::{collections::VecDeque, ops::Range};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub sorting: VecDeque<(String, SortOrder)>,
    pub range: Option<Range<usize>>,
    pub filter: Option<String>,
}

/// Installs the global subscriber. The returned guard flushes the log file
/// and must be kept alive for the lifetime of the process.
pub fn init_logging(logger: &Logger) -> Option<WorkerGuard> {
    let level = if logger.level.is_empty() {
        "info"
    } else {
        logger.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = fmt::layer()
        .with_target(true)
        .with_ansi(std::io::stdout().is_terminal());

    let (file_layer, guard) = if logger.directory.is_empty() {
        (None, None)
    } else {
        let file_appender = tracing_appender::rolling::daily(&logger.directory, "ota.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let layer = fmt::layer().with_ansi(false).with_writer(non_blocking);
        (Some(layer), Some(guard))
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer);

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("Global subscriber already installed, keeping the existing one");
        return guard;
    }

    if let Err(err) = tracing_log::LogTracer::init() {
        tracing::warn!("Failed to bridge log records into tracing: {}", err);
    }

    guard
}

pub fn init_s3_object_store(
    settings: &ObjectStorage,
) -> Result<Arc<dyn ObjectStore>, object_store::Error> {
    let mut builder = AmazonS3Builder::new()
        .with_bucket_name(&settings.bucket)
        .with_region(&settings.region)
        .with_access_key_id(&settings.access_key_id)
        .with_secret_access_key(&settings.secret_access_key);

    if let Some(endpoint) = &settings.endpoint {
        builder = builder.with_endpoint(endpoint).with_allow_http(true);
    }

    let store = builder.build()?;
    tracing::info!(bucket = %settings.bucket, "Object storage initialised");
    Ok(Arc::new(store))
}
