use async_trait::async_trait;
use eyre::Result;
use migration::{Migrator, MigratorTrait};
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, ConnectOptions, Database, DatabaseConnection, DbErr,
    EntityTrait, QuerySelect,
};

use crate::entities::transfers;
use crate::types::TransferRecord;

/// What the ingestion pipeline needs from the time-series store. Implemented
/// by [`DbClient`] in production and by fakes in tests.
#[async_trait]
pub trait TransferSink: Send + Sync {
    /// Bring the schema up. Safe to call repeatedly.
    async fn ensure_schema(&self) -> Result<()>;

    /// Persist one record. Writing the same identity twice overwrites.
    async fn write_transfer(&self, record: &TransferRecord) -> Result<()>;

    /// Highest block number across all persisted records, if any. This is
    /// the pipeline's sole resumption state.
    async fn max_block_number(&self) -> Result<Option<u64>>;

    /// Lightweight reachability probe for health checks.
    async fn ping(&self) -> Result<()>;
}

#[derive(Clone, Debug)]
pub struct DbClient {
    conn: DatabaseConnection,
}

impl DbClient {
    pub async fn connect(database_url: &str) -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new(database_url.to_owned());
        opt.sqlx_logging(false); // Disable SQLx log

        let conn = Database::connect(opt).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl TransferSink for DbClient {
    async fn ensure_schema(&self) -> Result<()> {
        Migrator::up(&self.conn, None).await?;
        Ok(())
    }

    async fn write_transfer(&self, record: &TransferRecord) -> Result<()> {
        transfers::Entity::insert(record.clone().into_active_model())
            .on_conflict(
                OnConflict::columns([
                    transfers::Column::BlockNumber,
                    transfers::Column::TransactionIndex,
                    transfers::Column::LogIndex,
                ])
                .update_columns([
                    transfers::Column::From,
                    transfers::Column::To,
                    transfers::Column::Amount,
                    transfers::Column::ClosureTime,
                    transfers::Column::BlockTimestamp,
                ])
                .to_owned(),
            )
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    async fn max_block_number(&self) -> Result<Option<u64>> {
        let max: Option<Option<i64>> = transfers::Entity::find()
            .select_only()
            .column_as(transfers::Column::BlockNumber.max(), "max_block_number")
            .into_tuple()
            .one(&self.conn)
            .await?;

        Ok(max.flatten().map(|block| block as u64))
    }

    async fn ping(&self) -> Result<()> {
        self.conn.ping().await.map_err(Into::into)
    }
}
