//! 推广活动与用户获取表
//!
//! - campaigns: 推广链接（label + hash）
//! - acquisitions: 每个 (bot, subject) 一条获取记录
//! - deposits: 充值流水，按外部交易号去重

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 1. campaigns
        manager
            .create_table(
                Table::create()
                    .table(Campaigns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Campaigns::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Campaigns::BotId).big_integer().not_null())
                    .col(ColumnDef::new(Campaigns::Label).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Campaigns::ReferralSubjectId)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Campaigns::Hash)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Campaigns::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Campaigns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Campaigns::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_campaigns_bot_referral")
                    .table(Campaigns::Table)
                    .col(Campaigns::BotId)
                    .col(Campaigns::ReferralSubjectId)
                    .to_owned(),
            )
            .await?;

        // 2. acquisitions
        manager
            .create_table(
                Table::create()
                    .table(Acquisitions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Acquisitions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Acquisitions::BotId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Acquisitions::SubjectId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Acquisitions::CampaignId).big_integer().null())
                    .col(
                        ColumnDef::new(Acquisitions::Seen)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Acquisitions::Deposited)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Acquisitions::DepositedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Acquisitions::DepositsTotal)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Acquisitions::DepositsSum)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Acquisitions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 唯一索引：bot_id + subject_id
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_acquisitions_bot_subject")
                    .table(Acquisitions::Table)
                    .col(Acquisitions::BotId)
                    .col(Acquisitions::SubjectId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 范围查询：bot_id + created_at
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_acquisitions_bot_created")
                    .table(Acquisitions::Table)
                    .col(Acquisitions::BotId)
                    .col(Acquisitions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // 3. deposits
        manager
            .create_table(
                Table::create()
                    .table(Deposits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Deposits::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Deposits::AcquisitionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Deposits::ExternalTxId)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Deposits::Amount).double().not_null())
                    .col(ColumnDef::new(Deposits::UnitPrice).double().not_null())
                    .col(
                        ColumnDef::new(Deposits::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_deposits_acquisition_time")
                    .table(Deposits::Table)
                    .col(Deposits::AcquisitionId)
                    .col(Deposits::OccurredAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_deposits_acquisition_time")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Deposits::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_acquisitions_bot_created").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_acquisitions_bot_subject").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Acquisitions::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_campaigns_bot_referral").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Campaigns::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Campaigns {
    #[sea_orm(iden = "campaigns")]
    Table,
    Id,
    BotId,
    Label,
    ReferralSubjectId,
    Hash,
    Active,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Acquisitions {
    #[sea_orm(iden = "acquisitions")]
    Table,
    Id,
    BotId,
    SubjectId,
    CampaignId,
    Seen,
    Deposited,
    DepositedAt,
    DepositsTotal,
    DepositsSum,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Deposits {
    #[sea_orm(iden = "deposits")]
    Table,
    Id,
    AcquisitionId,
    ExternalTxId,
    Amount,
    UnitPrice,
    OccurredAt,
}
