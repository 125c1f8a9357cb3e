//! 广告活动天级统计实体
//!
//! (external_account_id, campaign_id, stat_date) 唯一

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ad_campaign_stats_daily")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub external_account_id: i64,
    pub campaign_id: String,
    pub campaign_name: String,
    pub status: String,
    pub effective_status: String,
    pub impressions: i64,
    pub clicks: i64,
    pub spend: f64,
    pub stat_date: Date,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
