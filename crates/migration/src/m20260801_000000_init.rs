use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Password,
    Role,
    GardenId,
    DisterId,
}

#[derive(Iden)]
enum Countries {
    Table,
    Id,
    Name,
    Currency,
    TariffMinor,
}

#[derive(Iden)]
enum Cities {
    Table,
    Id,
    CountryId,
    Name,
}

#[derive(Iden)]
enum Gardens {
    Table,
    Id,
    Name,
    CityId,
    BalanceMinor,
    Currency,
}

#[derive(Iden)]
enum Groups {
    Table,
    Id,
    GardenId,
    Name,
}

#[derive(Iden)]
enum Cards {
    Table,
    Id,
    GroupId,
    Phone,
    LicenseKind,
    LicenseActive,
    LicenseUntil,
}

#[derive(Iden)]
enum Disters {
    Table,
    Id,
    Name,
    CountryId,
    Percent,
    SecondPercent,
    MainDisterId,
}

#[derive(Iden)]
enum DisterGardens {
    Table,
    DisterId,
    GardenId,
}

#[derive(Iden)]
enum Gateways {
    Table,
    Id,
    Kind,
    Name,
    Currency,
}

#[derive(Iden)]
enum Payments {
    Table,
    Id,
    TransactionNumber,
    Kind,
    Status,
    AmountMinor,
    Currency,
    GardenId,
    CardId,
    GatewayId,
    ExternalOrderId,
    ExternalTransactionId,
    Comment,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 1. Geography and resellers.
        manager
            .create_table(
                Table::create()
                    .table(Countries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Countries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Countries::Name).string().not_null())
                    .col(ColumnDef::new(Countries::Currency).string().not_null())
                    .col(
                        ColumnDef::new(Countries::TariffMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Cities::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Cities::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Cities::CountryId).string().not_null())
                    .col(ColumnDef::new(Cities::Name).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cities-country_id")
                            .from(Cities::Table, Cities::CountryId)
                            .to(Countries::Table, Countries::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Disters::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Disters::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Disters::Name).string().not_null())
                    .col(ColumnDef::new(Disters::CountryId).string().not_null())
                    .col(
                        ColumnDef::new(Disters::Percent)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Disters::SecondPercent)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Disters::MainDisterId).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-disters-country_id")
                            .from(Disters::Table, Disters::CountryId)
                            .to(Countries::Table, Countries::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 2. Gardens, groups, cards.
        manager
            .create_table(
                Table::create()
                    .table(Gardens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Gardens::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Gardens::Name).string().not_null())
                    .col(ColumnDef::new(Gardens::CityId).string().not_null())
                    .col(
                        ColumnDef::new(Gardens::BalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Gardens::Currency).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-gardens-city_id")
                            .from(Gardens::Table, Gardens::CityId)
                            .to(Cities::Table, Cities::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Groups::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Groups::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Groups::GardenId).string().not_null())
                    .col(ColumnDef::new(Groups::Name).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-groups-garden_id")
                            .from(Groups::Table, Groups::GardenId)
                            .to(Gardens::Table, Gardens::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Cards::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Cards::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Cards::GroupId).string().not_null())
                    .col(ColumnDef::new(Cards::Phone).string())
                    .col(ColumnDef::new(Cards::LicenseKind).string().not_null())
                    .col(
                        ColumnDef::new(Cards::LicenseActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Cards::LicenseUntil).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cards-group_id")
                            .from(Cards::Table, Cards::GroupId)
                            .to(Groups::Table, Groups::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cards-group_id")
                    .table(Cards::Table)
                    .col(Cards::GroupId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DisterGardens::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DisterGardens::DisterId).string().not_null())
                    .col(ColumnDef::new(DisterGardens::GardenId).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(DisterGardens::DisterId)
                            .col(DisterGardens::GardenId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-dister_gardens-dister_id")
                            .from(DisterGardens::Table, DisterGardens::DisterId)
                            .to(Disters::Table, Disters::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-dister_gardens-garden_id")
                            .from(DisterGardens::Table, DisterGardens::GardenId)
                            .to(Gardens::Table, Gardens::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 3. Gateways and the payment ledger.
        manager
            .create_table(
                Table::create()
                    .table(Gateways::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Gateways::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Gateways::Kind).string().not_null())
                    .col(ColumnDef::new(Gateways::Name).string().not_null())
                    .col(ColumnDef::new(Gateways::Currency).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Payments::TransactionNumber)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Payments::Kind).string().not_null())
                    .col(ColumnDef::new(Payments::Status).string().not_null())
                    .col(
                        ColumnDef::new(Payments::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Payments::Currency).string().not_null())
                    .col(ColumnDef::new(Payments::GardenId).string())
                    .col(ColumnDef::new(Payments::CardId).string())
                    .col(ColumnDef::new(Payments::GatewayId).string())
                    .col(ColumnDef::new(Payments::ExternalOrderId).string())
                    .col(ColumnDef::new(Payments::ExternalTransactionId).string())
                    .col(ColumnDef::new(Payments::Comment).string())
                    .col(ColumnDef::new(Payments::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Payments::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payments-garden_id")
                            .from(Payments::Table, Payments::GardenId)
                            .to(Gardens::Table, Gardens::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payments-card_id")
                            .from(Payments::Table, Payments::CardId)
                            .to(Cards::Table, Cards::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // The ledger's idempotency key.
        manager
            .create_index(
                Index::create()
                    .name("idx-payments-transaction_number")
                    .table(Payments::Table)
                    .col(Payments::TransactionNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Callback lookups resolve by the gateway's order id.
        manager
            .create_index(
                Index::create()
                    .name("idx-payments-external_order_id")
                    .table(Payments::Table)
                    .col(Payments::ExternalOrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payments-garden_id-created_at")
                    .table(Payments::Table)
                    .col(Payments::GardenId)
                    .col(Payments::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // 4. Users for the auth middleware.
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(ColumnDef::new(Users::Role).string().not_null())
                    .col(ColumnDef::new(Users::GardenId).string())
                    .col(ColumnDef::new(Users::DisterId).string())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Gateways::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DisterGardens::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cards::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Groups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Gardens::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Disters::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cities::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Countries::Table).to_owned())
            .await?;
        Ok(())
    }
}
