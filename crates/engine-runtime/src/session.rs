use crate::{batch::BatchOperations, error::SessionError};
use connectors::market::{client::MarketplaceClient, http::HttpMarketplaceClient};
use engine_config::settings::{self, SettingsOverrides, validated::Settings};
use engine_core::{context::MarketContext, dispatch::dispatcher::RequestDispatcher, metrics::MetricsSnapshot};
use engine_processing::store::registry::{LoadMode, LoadReport, StoreRegistry};
use model::records::field::StoreKind;
use std::{path::Path, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Everything one command works with: validated settings, the shared
/// marketplace context, the dispatcher and the loaded stores.
pub struct Session {
    settings: Settings,
    dispatcher: RequestDispatcher,
    registry: StoreRegistry,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        let context = Arc::new(MarketContext::new(
            settings.dry_run,
            settings.retry.clone(),
            settings.throttle_interval,
        ));
        let registry = StoreRegistry::from_settings(&settings);

        Session {
            dispatcher: RequestDispatcher::new(context),
            registry,
            settings,
        }
    }

    /// Loads and validates a settings file, then builds the session.
    pub fn open(path: &Path, overrides: SettingsOverrides) -> Result<Self, SessionError> {
        Ok(Self::new(settings::load(path, overrides)?))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn context(&self) -> &Arc<MarketContext> {
        self.dispatcher.context()
    }

    pub fn connect(&self, client: Arc<dyn MarketplaceClient>) -> Result<(), SessionError> {
        Ok(self.context().connect(client)?)
    }

    /// Connects to the configured endpoint. Dry sessions never connect.
    pub fn connect_remote(&self) -> Result<(), SessionError> {
        if self.settings.dry_run {
            info!("Dry run, not connecting to the marketplace service");
            return Ok(());
        }

        let client = HttpMarketplaceClient::new(
            self.settings.credentials.clone(),
            self.settings.endpoint.clone(),
            self.settings.sandbox,
        );
        info!(
            "Using {} endpoint {}",
            if self.settings.sandbox { "sandbox" } else { "production" },
            client.endpoint()
        );
        self.connect(Arc::new(client))
    }

    pub fn load(
        &mut self,
        kind: StoreKind,
        path: &str,
        mode: LoadMode,
    ) -> Result<LoadReport, SessionError> {
        let csv = self.settings.csv.clone();
        Ok(self.registry.load_file(kind, path, &csv, mode)?)
    }

    pub fn registry(&self) -> &StoreRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut StoreRegistry {
        &mut self.registry
    }

    pub fn batch(&self, cancel: CancellationToken) -> BatchOperations<'_> {
        BatchOperations::new(&self.dispatcher, &self.registry, cancel)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.dispatcher.metrics()
    }
}
