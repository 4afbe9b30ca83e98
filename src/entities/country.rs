use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "countries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Lowercased `name`; the only column lookups and upserts key on.
    #[sea_orm(unique)]
    pub name_key: String,
    pub name: String,
    pub capital: String,
    pub region: String,
    /// Lowercased `region`, filtered on by list queries.
    pub region_key: String,
    pub population: i64,
    pub currency_code: Option<String>,
    pub currency_key: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: f64,
    pub flag_url: Option<String>,
    pub last_refreshed_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
