use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Set, sea_query::OnConflict,
};

use crate::{
    entities::{country, refresh_status},
    error::AppResult,
    models::{CountryFilter, CountryRecord, SortKey},
    reconcile::match_key,
};

/// Owner of the `countries` table and the refresh-status singleton.
#[derive(Clone)]
pub struct CountryStore {
    db: DatabaseConnection,
}

impl CountryStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert or fully replace the row whose `name_key` matches, in one statement.
    pub async fn upsert_country(&self, record: &CountryRecord, refreshed_at: i64) -> AppResult<()> {
        let model = country::ActiveModel {
            id: Default::default(),
            name_key: Set(record.name_key.clone()),
            name: Set(record.name.clone()),
            capital: Set(record.capital.clone()),
            region: Set(record.region.clone()),
            region_key: Set(match_key(&record.region)),
            population: Set(record.population),
            currency_code: Set(record.currency_code.clone()),
            currency_key: Set(record.currency_code.as_deref().map(match_key)),
            exchange_rate: Set(record.exchange_rate),
            estimated_gdp: Set(record.estimated_gdp),
            flag_url: Set(record.flag_url.clone()),
            last_refreshed_at: Set(refreshed_at),
        };

        country::Entity::insert(model)
            .on_conflict(
                OnConflict::column(country::Column::NameKey)
                    .update_columns([
                        country::Column::Name,
                        country::Column::Capital,
                        country::Column::Region,
                        country::Column::RegionKey,
                        country::Column::Population,
                        country::Column::CurrencyCode,
                        country::Column::CurrencyKey,
                        country::Column::ExchangeRate,
                        country::Column::EstimatedGdp,
                        country::Column::FlagUrl,
                        country::Column::LastRefreshedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        Ok(())
    }

    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<country::Model>> {
        let found = country::Entity::find()
            .filter(country::Column::NameKey.eq(match_key(name)))
            .one(&self.db)
            .await?;
        Ok(found)
    }

    /// Returns whether a row was removed.
    pub async fn delete_by_name(&self, name: &str) -> AppResult<bool> {
        let res = country::Entity::delete_many()
            .filter(country::Column::NameKey.eq(match_key(name)))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn list(&self, filter: &CountryFilter) -> AppResult<Vec<country::Model>> {
        let mut query = country::Entity::find();

        if let Some(region) = &filter.region {
            query = query.filter(country::Column::RegionKey.eq(match_key(region)));
        }
        if let Some(currency) = &filter.currency {
            query = query.filter(country::Column::CurrencyKey.eq(match_key(currency)));
        }

        let rows = sorted(query, filter.sort).all(&self.db).await?;
        Ok(rows)
    }

    /// Highest estimated GDP first.
    pub async fn top_by_gdp(&self, limit: u64) -> AppResult<Vec<country::Model>> {
        let rows = sorted(country::Entity::find(), Some(SortKey::GdpDesc))
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    pub async fn count(&self) -> AppResult<u64> {
        Ok(country::Entity::find().count(&self.db).await?)
    }

    pub async fn status(&self) -> AppResult<Option<refresh_status::Model>> {
        let status = refresh_status::Entity::find_by_id(refresh_status::SINGLETON_ID)
            .one(&self.db)
            .await?;
        Ok(status)
    }

    /// Overwrite the singleton, creating it on first write.
    pub async fn put_status(&self, refreshed_at: i64, total_countries: u64) -> AppResult<()> {
        let model = refresh_status::ActiveModel {
            id: Set(refresh_status::SINGLETON_ID),
            last_refreshed_at: Set(refreshed_at),
            total_countries: Set(i64::try_from(total_countries).unwrap_or(i64::MAX)),
        };

        refresh_status::Entity::insert(model)
            .on_conflict(
                OnConflict::column(refresh_status::Column::Id)
                    .update_columns([
                        refresh_status::Column::LastRefreshedAt,
                        refresh_status::Column::TotalCountries,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        Ok(())
    }
}

/// Ties and the unsorted case fall back to insertion order.
fn sorted(query: Select<country::Entity>, sort: Option<SortKey>) -> Select<country::Entity> {
    let query = match sort {
        Some(SortKey::GdpAsc) => query.order_by_asc(country::Column::EstimatedGdp),
        Some(SortKey::GdpDesc) => query.order_by_desc(country::Column::EstimatedGdp),
        Some(SortKey::PopulationAsc) => query.order_by_asc(country::Column::Population),
        Some(SortKey::PopulationDesc) => query.order_by_desc(country::Column::Population),
        None => query,
    };
    query.order_by_asc(country::Column::Id)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::db;

    async fn store(dir: &TempDir) -> CountryStore {
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("store.db").display());
        CountryStore::new(db::connect_and_migrate(&url).await.unwrap())
    }

    fn record(
        name: &str,
        region: &str,
        population: i64,
        currency: Option<&str>,
        gdp: f64,
    ) -> CountryRecord {
        CountryRecord {
            name_key: match_key(name),
            name: name.to_string(),
            capital: format!("{name} City"),
            region: region.to_string(),
            population,
            currency_code: currency.map(str::to_string),
            exchange_rate: currency.map(|_| 1.0),
            estimated_gdp: gdp,
            flag_url: None,
        }
    }

    #[tokio::test]
    async fn upsert_replaces_case_insensitively() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;

        store.upsert_country(&record("France", "Europe", 10, Some("EUR"), 5.0), 100).await.unwrap();
        store.upsert_country(&record("FRANCE", "Europe", 20, None, 0.0), 200).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let row = store.find_by_name("france").await.unwrap().unwrap();
        assert_eq!(row.name, "FRANCE");
        assert_eq!(row.population, 20);
        assert_eq!(row.currency_code, None);
        assert_eq!(row.exchange_rate, None);
        assert_eq!(row.last_refreshed_at, 200);
    }

    #[tokio::test]
    async fn list_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;

        store.upsert_country(&record("France", "Europe", 67, Some("EUR"), 3.0), 1).await.unwrap();
        store.upsert_country(&record("Japan", "Asia", 125, Some("JPY"), 4.0), 1).await.unwrap();
        store.upsert_country(&record("Germany", "Europe", 83, Some("EUR"), 5.0), 1).await.unwrap();

        let filter = CountryFilter {
            region: Some("europe".into()),
            sort: Some(SortKey::PopulationDesc),
            ..Default::default()
        };
        let names: Vec<_> = store.list(&filter).await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["Germany", "France"]);

        let filter = CountryFilter { currency: Some("jpy".into()), ..Default::default() };
        let names: Vec<_> = store.list(&filter).await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["Japan"]);

        let natural = store.list(&CountryFilter::default()).await.unwrap();
        let natural: Vec<_> = natural.into_iter().map(|c| c.name).collect();
        assert_eq!(natural, ["France", "Japan", "Germany"]);

        let top: Vec<_> = store.top_by_gdp(2).await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(top, ["Germany", "Japan"]);
    }

    #[tokio::test]
    async fn filters_fold_non_ascii_case() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;

        store.upsert_country(&record("Åland", "Östland", 30, Some("ÉCU"), 1.0), 1).await.unwrap();
        store.upsert_country(&record("Chad", "Africa", 1, Some("XAF"), 0.0), 1).await.unwrap();

        for region in ["Östland", "östland", "ÖSTLAND"] {
            let filter = CountryFilter { region: Some(region.into()), ..Default::default() };
            let names: Vec<_> =
                store.list(&filter).await.unwrap().into_iter().map(|c| c.name).collect();
            assert_eq!(names, ["Åland"], "region {region}");
        }

        let filter = CountryFilter { currency: Some("écu".into()), ..Default::default() };
        let names: Vec<_> = store.list(&filter).await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["Åland"]);
    }

    #[tokio::test]
    async fn delete_reports_missing_rows() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;

        store.upsert_country(&record("Chad", "Africa", 1, None, 0.0), 1).await.unwrap();

        assert!(!store.delete_by_name("Atlantis").await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.delete_by_name("CHAD").await.unwrap());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn status_is_absent_until_first_write() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;

        assert!(store.status().await.unwrap().is_none());

        store.put_status(10, 3).await.unwrap();
        store.put_status(20, 4).await.unwrap();

        let status = store.status().await.unwrap().unwrap();
        assert_eq!(status.last_refreshed_at, 20);
        assert_eq!(status.total_countries, 4);
    }
}
