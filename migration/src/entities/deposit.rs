use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "deposits")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub acquisition_id: i64,
    #[sea_orm(unique)]
    pub external_tx_id: String,
    pub amount: f64,
    pub unit_price: f64,
    pub occurred_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::acquisition::Entity",
        from = "Column::AcquisitionId",
        to = "super::acquisition::Column::Id"
    )]
    Acquisition,
}

impl Related<super::acquisition::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Acquisition.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
