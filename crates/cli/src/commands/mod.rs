use std::sync::Arc;

use crate::api::{ConnectApi, FleetClient};
use crate::fleet::{FleetFilter, FleetSnapshot, fetch_snapshot};
use crate::settings::Settings;
use crate::summary::SummaryRegistry;

pub mod diff;
pub mod list;
pub mod load;
pub mod ops;
pub mod profiles;
pub mod state;

#[derive(Clone)]
pub struct CommandContext {
    pub settings: Settings,
    pub client: Arc<dyn FleetClient>,
    pub summaries: Arc<SummaryRegistry>,
}

impl CommandContext {
    pub fn new(settings: Settings, client: Arc<dyn FleetClient>) -> Self {
        Self {
            settings,
            client,
            summaries: Arc::new(SummaryRegistry::default()),
        }
    }

    /// Context talking to the coordinator named in `settings`.
    pub fn connect(settings: Settings) -> anyhow::Result<Self> {
        let http = settings.http_client()?;
        let api = ConnectApi::new(http, settings.url.clone());
        Ok(Self::new(settings, Arc::new(api)))
    }

    pub fn client(&self) -> &dyn FleetClient {
        self.client.as_ref()
    }

    /// Fresh snapshot narrowed by `filter`. Ids are assigned before filtering
    /// so they match what an unfiltered listing shows.
    pub async fn snapshot(&self, filter: &FleetFilter) -> anyhow::Result<FleetSnapshot> {
        let fleet = fetch_snapshot(self.client(), self.settings.concurrency).await?;
        Ok(fleet.filtered(filter))
    }
}
