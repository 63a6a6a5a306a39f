use std::time::Duration;

use mongodb::{
    Client, Collection, Database,
    bson::doc,
    options::ClientOptions,
};
use serde::{Deserialize, Serialize};

/// Used when neither the URI nor the configuration names a database.
pub const DEFAULT_DATABASE: &str = "quiz";

pub fn database(client: &Client, name: Option<&str>) -> Database {
    match name {
        Some(name) => client.database(name),
        None => client
            .default_database()
            .unwrap_or_else(|| client.database(DEFAULT_DATABASE)),
    }
}

pub fn get_collection<'d, T>(db: &Database, collection_name: &str) -> Collection<T>
where
    T: Send + Sync + Deserialize<'d> + Serialize,
{
    db.collection::<T>(collection_name)
}

/// Connects to the cluster and pings `db_name`. Connection and server selection
/// are bounded by `timeout`.
pub async fn client(
    uri: &str,
    db_name: Option<&str>,
    timeout: Duration,
) -> mongodb::error::Result<Client> {
    let mut client_options = ClientOptions::parse(uri).await?;

    client_options.app_name = Some(env!("CARGO_CRATE_NAME").to_string());
    client_options.connect_timeout = Some(timeout);
    client_options.server_selection_timeout = Some(timeout);

    let client = Client::with_options(client_options)?;

    database(&client, db_name)
        .run_command(doc! {"ping": 1})
        .await?;
    tracing::debug!("connected to mongodb");

    Ok(client)
}
