use std::{collections::HashMap, num::NonZeroU32, sync::Arc};

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;

/// Any non-success outcome of an outbound call: network error, timeout, bad status, or an
/// undecodable body.
#[derive(Debug, thiserror::Error)]
#[error("could not fetch data from {upstream}: {reason}")]
pub struct FetchError {
    /// Host of the data source that failed.
    pub upstream: String,
    pub reason: String,
}

impl FetchError {
    fn new(url: &str, reason: impl ToString) -> Self {
        Self { upstream: upstream_name(url), reason: reason.to_string() }
    }
}

/// One entry of the country listing. Every field is optional upstream, and a field of the
/// wrong shape reads as absent.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawCountry {
    #[serde(deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub capital: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub region: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub population: Option<u64>,
    #[serde(deserialize_with = "lenient")]
    pub flag: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub currencies: Option<Vec<RawCurrency>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawCurrency {
    #[serde(deserialize_with = "lenient")]
    pub code: Option<String>,
}

/// Currency code to units of that currency per USD.
pub type RateTable = HashMap<String, f64>;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RatesResponse {
    #[serde(deserialize_with = "lenient")]
    result: Option<String>,
    #[serde(deserialize_with = "lenient")]
    rates: Option<HashMap<String, Value>>,
}

/// Decodes `T`, mapping a value of the wrong type to `None` instead of failing the payload.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

pub struct UpstreamClient {
    client: reqwest::Client,
    countries_url: String,
    rates_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl UpstreamClient {
    /// `client` carries the per-call timeout.
    pub fn new(client: reqwest::Client, countries_url: String, rates_url: String, rps: u32) -> Self {
        let rps = NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(rps)));
        Self { client, countries_url, rates_url, limiter }
    }

    pub async fn fetch_countries(&self) -> Result<Vec<RawCountry>, FetchError> {
        let entries: Vec<Value> = self.get_json(&self.countries_url).await?;
        let fetched = entries.len();
        let countries: Vec<RawCountry> =
            entries.into_iter().filter_map(|entry| RawCountry::deserialize(entry).ok()).collect();
        if countries.len() < fetched {
            debug!(skipped = fetched - countries.len(), "dropped non-object listing entries");
        }
        debug!(count = countries.len(), "fetched country listing");
        Ok(countries)
    }

    pub async fn fetch_exchange_rates(&self) -> Result<RateTable, FetchError> {
        let resp: RatesResponse = self.get_json(&self.rates_url).await?;
        if resp.result.as_deref() == Some("error") {
            return Err(FetchError::new(&self.rates_url, "rate table reported an error result"));
        }
        let rates = numeric_rates(resp.rates.unwrap_or_default());
        debug!(count = rates.len(), "fetched exchange rates");
        Ok(rates)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        self.limiter.until_ready().await;

        debug!(url = %url, "fetching upstream");
        self.client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| FetchError::new(url, err))?
            .json()
            .await
            .map_err(|err| FetchError::new(url, err))
    }
}

/// Null, string and other non-numeric rates are dropped, leaving those currencies unrated.
fn numeric_rates(raw: HashMap<String, Value>) -> RateTable {
    raw.into_iter().filter_map(|(code, rate)| rate.as_f64().map(|rate| (code, rate))).collect()
}

fn upstream_name(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_country_tolerates_missing_fields() {
        let raw: Vec<RawCountry> = serde_json::from_str(
            r#"[
                {"name": "Testland", "population": 1000000, "currencies": [{"code": "TST"}, {"code": "USD"}]},
                {"name": "Nowhere"},
                {"capital": "Orphan City"}
            ]"#,
        )
        .unwrap();

        assert_eq!(raw.len(), 3);
        assert_eq!(raw[0].currencies.as_ref().unwrap().len(), 2);
        assert!(raw[1].population.is_none());
        assert!(raw[1].currencies.is_none());
        assert!(raw[2].name.is_none());
    }

    #[test]
    fn mistyped_fields_read_as_absent() {
        let raw: RawCountry = serde_json::from_str(
            r#"{"name": "Odd", "capital": 7, "population": 12.5, "currencies": "EUR"}"#,
        )
        .unwrap();

        assert_eq!(raw.name.as_deref(), Some("Odd"));
        assert!(raw.capital.is_none());
        assert!(raw.population.is_none());
        assert!(raw.currencies.is_none());

        let raw: RawCountry = serde_json::from_str(r#"{"name": "Neg", "population": -4}"#).unwrap();
        assert!(raw.population.is_none());
    }

    #[test]
    fn rates_keep_only_numeric_entries() {
        let resp: RatesResponse = serde_json::from_str(
            r#"{"result": "success", "rates": {"USD": 1, "EUR": 0.92, "XYZ": null, "ABC": "2"}}"#,
        )
        .unwrap();
        let rates = numeric_rates(resp.rates.unwrap());

        assert_eq!(rates.len(), 2);
        assert_eq!(rates["USD"], 1.0);
        assert_eq!(rates["EUR"], 0.92);
    }

    #[test]
    fn upstream_name_is_host_of_url() {
        assert_eq!(upstream_name(crate::config::DEFAULT_COUNTRIES_URL), "restcountries.com");
        assert_eq!(upstream_name("not a url"), "not a url");
    }

    #[tokio::test]
    async fn unreachable_upstream_is_fetch_error() {
        let client = UpstreamClient::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9/countries".to_string(),
            "http://127.0.0.1:9/rates".to_string(),
            10,
        );

        let err = client.fetch_countries().await.unwrap_err();
        assert_eq!(err.upstream, "127.0.0.1");
    }
}
