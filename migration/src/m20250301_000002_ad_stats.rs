//! 广告统计采集表
//!
//! - ad_tokens: 访问令牌
//! - ad_accounts: 令牌下的广告账户
//! - ad_campaign_stats_daily: 账户 + 活动 + 日期唯一的统计行

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 1. ad_tokens
        manager
            .create_table(
                Table::create()
                    .table(AdTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AdTokens::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AdTokens::Token).text().not_null())
                    .col(
                        ColumnDef::new(AdTokens::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(AdTokens::DaysToFetch)
                            .integer()
                            .not_null()
                            .default(7),
                    )
                    .col(
                        ColumnDef::new(AdTokens::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdTokens::FetchedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 2. ad_accounts
        manager
            .create_table(
                Table::create()
                    .table(AdAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AdAccounts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AdAccounts::TokenId).big_integer().not_null())
                    .col(
                        ColumnDef::new(AdAccounts::ExternalAccountId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(AdAccounts::DisplayName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdAccounts::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(AdAccounts::NoDataStreak)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AdAccounts::FetchDurationSecs)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AdAccounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdAccounts::FetchedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 索引：token_id（按令牌查询待采集账户）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ad_accounts_token")
                    .table(AdAccounts::Table)
                    .col(AdAccounts::TokenId)
                    .to_owned(),
            )
            .await?;

        // 3. ad_campaign_stats_daily
        manager
            .create_table(
                Table::create()
                    .table(AdCampaignStatsDaily::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AdCampaignStatsDaily::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AdCampaignStatsDaily::ExternalAccountId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdCampaignStatsDaily::CampaignId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdCampaignStatsDaily::CampaignName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdCampaignStatsDaily::Status)
                            .string_len(64)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(AdCampaignStatsDaily::EffectiveStatus)
                            .string_len(64)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(AdCampaignStatsDaily::Impressions)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AdCampaignStatsDaily::Clicks)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AdCampaignStatsDaily::Spend)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(AdCampaignStatsDaily::StatDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdCampaignStatsDaily::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdCampaignStatsDaily::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 唯一索引：account + campaign + day（upsert 冲突键）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ad_stats_account_campaign_day")
                    .table(AdCampaignStatsDaily::Table)
                    .col(AdCampaignStatsDaily::ExternalAccountId)
                    .col(AdCampaignStatsDaily::CampaignId)
                    .col(AdCampaignStatsDaily::StatDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 索引：stat_date（报表范围查询）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ad_stats_day")
                    .table(AdCampaignStatsDaily::Table)
                    .col(AdCampaignStatsDaily::StatDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_ad_stats_day").to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_ad_stats_account_campaign_day")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(AdCampaignStatsDaily::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_ad_accounts_token").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AdAccounts::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(AdTokens::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum AdTokens {
    #[sea_orm(iden = "ad_tokens")]
    Table,
    Id,
    Token,
    Active,
    DaysToFetch,
    CreatedAt,
    FetchedAt,
}

#[derive(DeriveIden)]
enum AdAccounts {
    #[sea_orm(iden = "ad_accounts")]
    Table,
    Id,
    TokenId,
    ExternalAccountId,
    DisplayName,
    Active,
    NoDataStreak,
    FetchDurationSecs,
    CreatedAt,
    FetchedAt,
}

#[derive(DeriveIden)]
enum AdCampaignStatsDaily {
    #[sea_orm(iden = "ad_campaign_stats_daily")]
    Table,
    Id,
    ExternalAccountId,
    CampaignId,
    CampaignName,
    Status,
    EffectiveStatus,
    Impressions,
    Clicks,
    Spend,
    StatDate,
    CreatedAt,
    UpdatedAt,
}
