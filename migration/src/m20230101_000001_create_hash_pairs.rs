use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(HashPairs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HashPairs::EthHash)
                            .char_len(66)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(HashPairs::QtumHash).char_len(64).not_null())
                    .col(ColumnDef::new(HashPairs::Height).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_hash_pairs_height")
                    .table(HashPairs::Table)
                    .col(HashPairs::Height)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(HashPairs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum HashPairs {
    Table,
    EthHash,
    QtumHash,
    Height,
}
