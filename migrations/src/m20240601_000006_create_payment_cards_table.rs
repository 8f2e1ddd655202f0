use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240601_000006_create_payment_cards_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PaymentCards::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentCards::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PaymentCards::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(PaymentCards::CardToken)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentCards::Brand).string_len(50).not_null())
                    .col(
                        ColumnDef::new(PaymentCards::LastFour)
                            .string_len(4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentCards::ExpiryMonth)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentCards::ExpiryYear)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentCards::IsDefault)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PaymentCards::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_cards_user")
                            .from(PaymentCards::Table, PaymentCards::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payment_cards_user")
                    .table(PaymentCards::Table)
                    .col(PaymentCards::UserId)
                    .to_owned(),
            )
            .await?;

        // Partial unique index backing the one-default-card-per-user
        // invariant. Supported by both PostgreSQL and SQLite; raw SQL
        // because the index builder has no WHERE clause support.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_payment_cards_user_default \
                 ON payment_cards (user_id) WHERE is_default",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PaymentCards::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PaymentCards {
    Table,
    Id,
    UserId,
    CardToken,
    Brand,
    LastFour,
    ExpiryMonth,
    ExpiryYear,
    IsDefault,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
