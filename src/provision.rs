use tracing::info;

use crate::error::{MigrateError, Result};
use crate::es_client::EsClient;
use crate::models::index_meta::IndexDefinition;

/// Delete each index on the destination. A 404 means the index was never
/// there, which is the state we wanted anyway; any other non-success aborts
/// the run with the destination's response body. Indexes already deleted
/// stay deleted, there is no rollback.
pub async fn delete_indexes(client: &EsClient, definitions: &[IndexDefinition]) -> Result<()> {
    for def in definitions {
        let resp = client.delete_index(&def.name).await?;
        if resp.is_not_found() {
            continue;
        }
        if !resp.is_success() {
            return Err(MigrateError::Provisioning {
                index: def.name.clone(),
                body: resp.body,
            });
        }
        info!("deleted index: {}", def.name);
    }
    Ok(())
}

/// Create each index on the destination from its resolved definition. Any
/// non-success response is fatal; indexes created before the failure are
/// left in place.
pub async fn create_indexes(client: &EsClient, definitions: &[IndexDefinition]) -> Result<()> {
    for def in definitions {
        let body = def.creation_body();
        let resp = client.create_index(&def.name, &body).await?;
        if !resp.is_success() {
            return Err(MigrateError::Provisioning {
                index: def.name.clone(),
                body: resp.body,
            });
        }
        info!("created index: {}", def.name);
    }
    Ok(())
}
