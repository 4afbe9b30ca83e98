use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::entities::country;

/// A reconciled country ready to be upserted. Every field replaces the stored value.
#[derive(Clone, Debug, PartialEq)]
pub struct CountryRecord {
    pub name_key: String,
    pub name: String,
    pub capital: String,
    pub region: String,
    pub population: i64,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: f64,
    pub flag_url: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct CountryView {
    pub name: String,
    pub capital: String,
    pub region: String,
    pub population: i64,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: f64,
    pub flag_url: Option<String>,
    pub last_refreshed_at: Timestamp,
}

impl From<country::Model> for CountryView {
    fn from(m: country::Model) -> Self {
        Self {
            name: m.name,
            capital: m.capital,
            region: m.region,
            population: m.population,
            currency_code: m.currency_code,
            exchange_rate: m.exchange_rate,
            estimated_gdp: m.estimated_gdp,
            flag_url: m.flag_url,
            last_refreshed_at: from_epoch(m.last_refreshed_at),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct StatusView {
    pub total_countries: u64,
    pub last_refreshed_at: Option<Timestamp>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RefreshSummary {
    pub message: &'static str,
    pub total_countries: u64,
    pub processed: u64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortKey {
    GdpAsc,
    GdpDesc,
    PopulationAsc,
    PopulationDesc,
}

impl SortKey {
    /// Unknown values are ignored rather than rejected.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gdp_asc" => Some(SortKey::GdpAsc),
            "gdp_desc" => Some(SortKey::GdpDesc),
            "population_asc" => Some(SortKey::PopulationAsc),
            "population_desc" => Some(SortKey::PopulationDesc),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub region: Option<String>,
    pub currency: Option<String>,
    pub sort: Option<String>,
}

/// Normalized list parameters: empty filters dropped, sort parsed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CountryFilter {
    pub region: Option<String>,
    pub currency: Option<String>,
    pub sort: Option<SortKey>,
}

impl From<ListQuery> for CountryFilter {
    fn from(q: ListQuery) -> Self {
        let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self {
            region: non_empty(q.region),
            currency: non_empty(q.currency),
            sort: q.sort.as_deref().and_then(SortKey::parse),
        }
    }
}

pub fn from_epoch(seconds: i64) -> Timestamp {
    Timestamp::from_second(seconds).unwrap_or(Timestamp::UNIX_EPOCH)
}
