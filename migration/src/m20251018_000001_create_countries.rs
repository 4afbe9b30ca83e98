use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Countries::Table)
                    .if_not_exists()
                    .col(pk_auto(Countries::Id))
                    .col(string(Countries::NameKey).unique_key())
                    .col(string(Countries::Name))
                    .col(string(Countries::Capital))
                    .col(string(Countries::Region))
                    .col(string(Countries::RegionKey))
                    .col(big_integer(Countries::Population))
                    .col(string_null(Countries::CurrencyCode))
                    .col(string_null(Countries::CurrencyKey))
                    .col(double_null(Countries::ExchangeRate))
                    .col(double(Countries::EstimatedGdp))
                    .col(string_null(Countries::FlagUrl))
                    .col(big_integer(Countries::LastRefreshedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_countries_estimated_gdp")
                    .table(Countries::Table)
                    .col(Countries::EstimatedGdp)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_countries_region_key")
                    .table(Countries::Table)
                    .col(Countries::RegionKey)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_countries_currency_key")
                    .table(Countries::Table)
                    .col(Countries::CurrencyKey)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RefreshStatus::Table)
                    .if_not_exists()
                    .col(integer(RefreshStatus::Id).primary_key())
                    .col(big_integer(RefreshStatus::LastRefreshedAt))
                    .col(big_integer(RefreshStatus::TotalCountries))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(RefreshStatus::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Countries::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Countries {
    Table,
    Id,
    NameKey,
    Name,
    Capital,
    Region,
    RegionKey,
    Population,
    CurrencyCode,
    CurrencyKey,
    ExchangeRate,
    EstimatedGdp,
    FlagUrl,
    LastRefreshedAt,
}

#[derive(DeriveIden)]
enum RefreshStatus {
    Table,
    Id,
    LastRefreshedAt,
    TotalCountries,
}
