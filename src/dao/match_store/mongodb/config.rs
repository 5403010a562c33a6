use std::time::Duration;

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;
use tracing::debug;

use super::error::{MongoDaoError, MongoResult};

const DEFAULT_DATABASE_NAME: &str = "scoreboard";
const OPEN_ATTEMPTS: u32 = 5;
const OPEN_INITIAL_DELAY: Duration = Duration::from_millis(250);
const OPEN_MAX_DELAY: Duration = Duration::from_secs(5);

/// Connection settings for [`MongoMatchStore`](super::MongoMatchStore).
#[derive(Clone)]
pub struct MongoConfig {
    pub options: ClientOptions,
    pub database_name: String,
}

impl MongoConfig {
    /// Parse a connection string; `db_name` defaults to `scoreboard`.
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let options = ClientOptions::parse(uri)
            .await
            .map_err(|source| MongoDaoError::InvalidUri {
                uri: uri.to_owned(),
                source,
            })?;

        Ok(Self {
            options,
            database_name: db_name.unwrap_or(DEFAULT_DATABASE_NAME).to_owned(),
        })
    }

    /// Build a client and wait until the database answers a ping, backing off between tries.
    pub(super) async fn open(&self) -> MongoResult<(Client, Database)> {
        let client = Client::with_options(self.options.clone())
            .map_err(|source| MongoDaoError::ClientConstruction { source })?;
        let database = client.database(&self.database_name);

        let mut delay = OPEN_INITIAL_DELAY;
        let mut attempts = 0;
        loop {
            attempts += 1;
            match database.run_command(doc! { "ping": 1 }).await {
                Ok(_) => return Ok((client, database)),
                Err(source) if attempts >= OPEN_ATTEMPTS => {
                    return Err(MongoDaoError::InitialPing { attempts, source });
                }
                Err(err) => {
                    debug!(attempts, error = %err, database = %self.database_name, "MongoDB not ready yet");
                    sleep(delay).await;
                    delay = (delay * 2).min(OPEN_MAX_DELAY);
                }
            }
        }
    }
}
