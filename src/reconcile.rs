use rand::Rng;
use tracing::debug;

use crate::{
    gdp,
    models::CountryRecord,
    upstream::{RawCountry, RateTable},
};

/// Maps one fetched entry plus the rate table into the stored shape.
///
/// Entries without a name yield `None`. Only the first listed currency is considered and a
/// missing population counts as 0.
pub fn reconcile(raw: RawCountry, rates: &RateTable, rng: &mut impl Rng) -> Option<CountryRecord> {
    let name = raw.name.filter(|n| !n.is_empty())?;

    let currency_code = raw.currencies.and_then(|c| c.into_iter().next()).and_then(|c| c.code);
    let exchange_rate =
        gdp::usable_rate(currency_code.as_deref().and_then(|code| rates.get(code)).copied());
    let population = raw.population.unwrap_or(0);
    let estimated_gdp = gdp::estimate(population, exchange_rate, rng);

    if currency_code.is_some() && exchange_rate.is_none() {
        debug!(country = %name, currency = ?currency_code, "no usable exchange rate");
    }

    Some(CountryRecord {
        name_key: match_key(&name),
        name,
        capital: raw.capital.unwrap_or_default(),
        region: raw.region.unwrap_or_default(),
        population: i64::try_from(population).unwrap_or(i64::MAX),
        currency_code,
        exchange_rate,
        estimated_gdp,
        flag_url: raw.flag.filter(|f| !f.is_empty()),
    })
}

/// Unicode case fold used for every case-insensitive comparison: names, regions, currencies.
pub fn match_key(value: &str) -> String {
    value.to_lowercase()
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::upstream::RawCurrency;

    fn raw(name: &str, population: Option<u64>, codes: &[&str]) -> RawCountry {
        RawCountry {
            name: Some(name.to_string()),
            capital: Some("Capital".to_string()),
            region: Some("Region".to_string()),
            population,
            flag: Some("https://flags.example/x.svg".to_string()),
            currencies: Some(
                codes.iter().map(|c| RawCurrency { code: Some(c.to_string()) }).collect(),
            ),
        }
    }

    fn rates() -> RateTable {
        RateTable::from([("TST".to_string(), 2.0), ("USD".to_string(), 1.0)])
    }

    #[test]
    fn testland_gets_rate_and_banded_gdp() {
        let mut rng = StdRng::seed_from_u64(3);
        let rec = reconcile(raw("Testland", Some(1_000_000), &["TST"]), &rates(), &mut rng).unwrap();

        assert_eq!(rec.name_key, "testland");
        assert_eq!(rec.currency_code.as_deref(), Some("TST"));
        assert_eq!(rec.exchange_rate, Some(2.0));
        assert!((500_000_000.0..1_000_000_000.0).contains(&rec.estimated_gdp));
    }

    #[test]
    fn unknown_currency_has_no_rate_and_zero_gdp() {
        let mut rng = StdRng::seed_from_u64(3);
        let rec = reconcile(raw("Elsewhere", Some(500), &["XXX"]), &rates(), &mut rng).unwrap();

        assert_eq!(rec.currency_code.as_deref(), Some("XXX"));
        assert_eq!(rec.exchange_rate, None);
        assert_eq!(rec.estimated_gdp, 0.0);
    }

    #[test]
    fn only_first_currency_counts() {
        let mut rng = StdRng::seed_from_u64(3);
        let rec = reconcile(raw("Dual", Some(10), &["XXX", "USD"]), &rates(), &mut rng).unwrap();

        assert_eq!(rec.currency_code.as_deref(), Some("XXX"));
        assert_eq!(rec.estimated_gdp, 0.0);
    }

    #[test]
    fn missing_population_and_currencies_default() {
        let mut rng = StdRng::seed_from_u64(3);
        let entry = RawCountry { name: Some("Bare".to_string()), ..Default::default() };
        let rec = reconcile(entry, &rates(), &mut rng).unwrap();

        assert_eq!(rec.population, 0);
        assert_eq!(rec.capital, "");
        assert_eq!(rec.currency_code, None);
        assert_eq!(rec.flag_url, None);
        assert_eq!(rec.estimated_gdp, 0.0);
    }

    #[test]
    fn nameless_entries_are_skipped() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(reconcile(RawCountry::default(), &rates(), &mut rng).is_none());
        assert!(reconcile(raw("", Some(1), &["USD"]), &rates(), &mut rng).is_none());
    }
}
