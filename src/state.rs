use std::sync::Arc;

use crate::config::Config;
use crate::feed::{PushFeed, PushFeedOptions};
use crate::store::{JsonFileStore, MemoryStore, PersistentStore};
use crate::tracker::{Clock, SessionTracker, SystemClock, TrackerOptions};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub tracker: SessionTracker,
    pub feed: Arc<PushFeed>,
    pub store: Arc<dyn PersistentStore>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store: Arc<dyn PersistentStore> = match &config.data_dir {
            Some(dir) => {
                tracing::info!("Persisting sessions under {}", dir.display());
                Arc::new(JsonFileStore::new(dir.clone()))
            }
            None => {
                tracing::info!("No DATA_DIR set; sessions are kept in memory only");
                Arc::new(MemoryStore::new())
            }
        };
        Self::with_parts(config, store, Arc::new(SystemClock))
    }

    pub fn with_parts(config: Config, store: Arc<dyn PersistentStore>, clock: Arc<dyn Clock>) -> Self {
        let feed = Arc::new(PushFeed::new(PushFeedOptions {
            auto_grant: config.location_auto_grant,
            require_initial_fix: config.require_initial_fix,
        }));

        let tracker = SessionTracker::new(
            feed.clone(),
            store.clone(),
            clock,
            TrackerOptions {
                tick_interval: config.tick_interval,
                distance_model: config.distance_model,
            },
        );

        Self {
            config,
            tracker,
            feed,
            store,
        }
    }
}
