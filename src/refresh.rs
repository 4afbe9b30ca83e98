use tracing::{debug, info, warn};

use crate::{
    error::AppResult,
    models::CountryRecord,
    reconcile::reconcile,
    store::CountryStore,
    summary::SummaryRenderer,
    upstream::UpstreamClient,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RefreshOutcome {
    pub total_countries: u64,
    pub processed: u64,
}

/// Pulls both upstream datasets, upserts every named country, records the refresh and redraws
/// the summary image.
///
/// A fetch failure aborts before anything is written. Rows already upserted stay written if a
/// later step fails. Rendering failures are logged and never change the outcome.
pub async fn refresh(
    upstream: &UpstreamClient,
    store: &CountryStore,
    summary: &SummaryRenderer,
) -> AppResult<RefreshOutcome> {
    let countries = upstream.fetch_countries().await?;
    let rates = upstream.fetch_exchange_rates().await?;

    let fetched = countries.len();
    let records: Vec<CountryRecord> = {
        let mut rng = rand::rng();
        countries.into_iter().filter_map(|raw| reconcile(raw, &rates, &mut rng)).collect()
    };
    debug!(fetched = fetched, named = records.len(), rates = rates.len(), "reconciled countries");

    let now = jiff::Timestamp::now().as_second();
    let mut processed = 0u64;
    for record in &records {
        store.upsert_country(record, now).await?;
        processed += 1;
    }

    let total_countries = store.count().await?;
    store.put_status(now, total_countries).await?;

    if let Err(err) = summary.render(store, total_countries).await {
        warn!(error = %err, "failed to render summary image");
    }

    info!(total_countries = total_countries, processed = processed, "refresh complete");
    Ok(RefreshOutcome { total_countries, processed })
}
