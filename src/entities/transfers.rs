use sea_orm::entity::prelude::*;

/// One BatchTransfer record. The composite key is the event's on-chain
/// identity, so re-writing the same event overwrites instead of duplicating.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub block_number: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub transaction_index: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub log_index: i64,
    pub from: String,
    pub to: String,
    #[sea_orm(column_type = "Decimal(Some((38, 18)))")]
    pub amount: BigDecimal,
    pub closure_time: i64,
    pub block_timestamp: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
