//! 用户获取事件实体（每个 bot + subject 一行）

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "acquisitions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub bot_id: i64,
    pub subject_id: i64,
    pub campaign_id: Option<i64>,
    pub seen: i32,
    pub deposited: bool,
    pub deposited_at: Option<DateTimeUtc>,
    pub deposits_total: i64,
    pub deposits_sum: f64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::deposit::Entity")]
    Deposit,
}

impl Related<super::deposit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deposit.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
