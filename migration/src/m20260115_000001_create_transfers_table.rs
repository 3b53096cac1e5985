use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Transfers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transfers::BlockNumber)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transfers::TransactionIndex)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transfers::LogIndex)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transfers::From).string().not_null())
                    .col(ColumnDef::new(Transfers::To).string().not_null())
                    .col(
                        ColumnDef::new(Transfers::Amount)
                            .decimal_len(38, 18)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transfers::ClosureTime)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transfers::BlockTimestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(Transfers::BlockNumber)
                            .col(Transfers::TransactionIndex)
                            .col(Transfers::LogIndex),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transfers::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Transfers {
    Table,
    BlockNumber,
    TransactionIndex,
    LogIndex,
    From,
    To,
    Amount,
    ClosureTime,
    BlockTimestamp,
}
