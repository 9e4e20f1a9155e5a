use std::sync::Arc;

use anyhow::Result;
use meilisearch_sdk::client::Client;

use super::{
    config::Config,
    database::{Store, init_store},
    search::init_meilisearch,
};

pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub meili_client: Option<Arc<Client>>,
}

impl AppState {
    pub async fn new() -> Result<Arc<Self>> {
        let config = Config::load()?;

        let store = init_store(&config.redis_url).await?;

        let meili_client = match &config.meili_url {
            Some(meili_url) => {
                Some(init_meilisearch(meili_url, config.meili_key.as_deref(), &store).await?)
            }
            None => None,
        };

        Ok(Self::from_parts(config, store, meili_client))
    }

    pub fn from_parts(config: Config, store: Store, meili_client: Option<Arc<Client>>) -> Arc<Self> {
        Arc::new(Self {
            config,
            store,
            meili_client,
        })
    }

    pub fn search_client(&self) -> Option<&Client> {
        self.meili_client.as_deref()
    }
}
