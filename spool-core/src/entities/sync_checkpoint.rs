use crate::events::EventPosition;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;

/// Single-row table holding the position of the last committed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
struct CheckpointRow {
    block_number: i64,
    log_index: i64,
}

impl TryFrom<CheckpointRow> for EventPosition {
    type Error = sqlx::Error;

    fn try_from(row: CheckpointRow) -> Result<Self, Self::Error> {
        let block_number = u64::try_from(row.block_number)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let log_index =
            u32::try_from(row.log_index).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(EventPosition {
            block_number,
            log_index,
        })
    }
}

/// Read the checkpoint and lock its row until the transaction ends.
pub async fn load_for_update_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
) -> Result<Option<EventPosition>, sqlx::Error> {
    let row = sqlx::query_as::<_, CheckpointRow>(
        "SELECT block_number, log_index FROM sync_checkpoint WHERE id = 1 FOR UPDATE",
    )
    .fetch_optional(&mut **tx)
    .await?;
    row.map(EventPosition::try_from).transpose()
}

/// Store `position` as the new checkpoint inside a transaction.
pub async fn save_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    position: EventPosition,
) -> Result<(), sqlx::Error> {
    let block_number =
        i64::try_from(position.block_number).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
    sqlx::query(
        r#"
        INSERT INTO sync_checkpoint (id, block_number, log_index)
        VALUES (1, $1, $2)
        ON CONFLICT (id) DO UPDATE SET
            block_number = EXCLUDED.block_number,
            log_index = EXCLUDED.log_index
        "#,
    )
    .bind(block_number)
    .bind(i64::from(position.log_index))
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub struct GetSyncCheckpoint;

impl Processor<GetSyncCheckpoint> for DatabaseProcessor {
    type Output = Option<EventPosition>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetSyncCheckpoint")]
    async fn process(&self, _: GetSyncCheckpoint) -> Result<Option<EventPosition>, sqlx::Error> {
        let row = sqlx::query_as::<_, CheckpointRow>(
            "SELECT block_number, log_index FROM sync_checkpoint WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        row.map(EventPosition::try_from).transpose()
    }
}
