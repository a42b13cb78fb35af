use mongodb::{
    bson::doc,
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Collection,
};
use std::time::Duration;

use crate::{config::Config, errors::AppResult};

#[derive(Clone)]
pub struct Database {
    client: Client,
    db_name: String,
}

impl Database {
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let mut client_options = ClientOptions::parse(&config.mongo_conn_string).await?;

        apply_pool_settings(&mut client_options, config);

        let client = Client::with_options(client_options)?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;

        log::info!(
            "Connected to MongoDB database '{}' (pool {}..={})",
            config.mongo_db_name,
            config.mongo_min_pool_size.min(config.mongo_max_pool_size),
            config.mongo_max_pool_size
        );

        Ok(Self {
            client,
            db_name: config.mongo_db_name.clone(),
        })
    }

    pub fn get_collection<T>(&self, collection_name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.client
            .database(&self.db_name)
            .collection(collection_name)
    }

    pub async fn health_check(&self) -> AppResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }
}

/// Pool bounds and timeouts come from `Config`; a minimum above the maximum
/// is lowered to it.
fn apply_pool_settings(options: &mut ClientOptions, config: &Config) {
    let timeout = Duration::from_secs(config.mongo_timeout_secs.max(1));

    options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());
    options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
    options.max_pool_size = Some(config.mongo_max_pool_size);
    options.min_pool_size = Some(config.mongo_min_pool_size.min(config.mongo_max_pool_size));
    options.connect_timeout = Some(timeout);
    options.server_selection_timeout = Some(timeout);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_structure() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<Database>();
    }

    #[test]
    fn test_pool_settings_follow_config() {
        let mut config = Config::test_config();
        config.mongo_max_pool_size = 25;
        config.mongo_min_pool_size = 4;
        config.mongo_timeout_secs = 8;

        let mut options = ClientOptions::default();
        apply_pool_settings(&mut options, &config);

        assert_eq!(options.max_pool_size, Some(25));
        assert_eq!(options.min_pool_size, Some(4));
        assert_eq!(options.connect_timeout, Some(Duration::from_secs(8)));
        assert_eq!(options.server_selection_timeout, Some(Duration::from_secs(8)));
        assert_eq!(options.app_name.as_deref(), Some("quiz-server"));
    }

    #[test]
    fn test_min_pool_size_never_exceeds_max() {
        let mut config = Config::test_config();
        config.mongo_max_pool_size = 3;
        config.mongo_min_pool_size = 9;

        let mut options = ClientOptions::default();
        apply_pool_settings(&mut options, &config);

        assert_eq!(options.min_pool_size, Some(3));
    }
}
