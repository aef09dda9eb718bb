//! Multi-provider forecast aggregation
//!
//! All available adapters are called concurrently and awaited together. A
//! failing adapter only removes its own data from the result; the request
//! fails when no adapter succeeds.
//!
//! Merge policy: providers are registered in priority order and the first
//! provider to report a timestamp (or, for daily data, a date) wins that
//! entry as a whole.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::cache::{self, PersistentCache};
use crate::config::SurfcastConfig;
use crate::error::{AggregationError, ProviderError};
use crate::models::{Coordinate, PartialForecast, UnifiedForecast};
use crate::providers::{
    self, CredentialSet, ForecastProvider, ForecastRequest, OpenWeatherMapProvider, ProviderName,
    StormglassProvider, SurflineProvider, WindyProvider,
};

struct ResponseCache {
    store: Arc<PersistentCache>,
    ttl: Duration,
}

pub struct ForecastAggregator {
    providers: Vec<Arc<dyn ForecastProvider>>,
    deadline: Option<Duration>,
    cache: Option<ResponseCache>,
}

impl ForecastAggregator {
    /// Aggregator over `providers`, highest merge priority first
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn ForecastProvider>>) -> Self {
        Self {
            providers,
            deadline: None,
            cache: None,
        }
    }

    /// Register the standard adapters in priority order: Stormglass,
    /// Surfline, Windy, OpenWeatherMap
    pub fn from_config(config: &SurfcastConfig) -> Result<Self> {
        let settings = &config.providers;
        let client = providers::build_client(settings)?;

        let mut registry: Vec<Arc<dyn ForecastProvider>> = vec![Arc::new(StormglassProvider::new(
            client.clone(),
            &settings.stormglass_url,
            &settings.stormglass_source,
        ))];
        if settings.enable_surfline {
            registry.push(Arc::new(SurflineProvider::new(client.clone(), &settings.surfline_url)));
        }
        if settings.enable_windy {
            registry.push(Arc::new(WindyProvider::new(
                client.clone(),
                &settings.windy_url,
                &settings.windy_model,
            )));
        }
        registry.push(Arc::new(OpenWeatherMapProvider::new(client, &settings.openweathermap_url)));

        let mut aggregator = Self::new(registry);
        aggregator.deadline = settings.deadline();

        if config.cache.enabled {
            let store = PersistentCache::open(&config.cache.location)?;
            aggregator = aggregator.with_cache(Arc::new(store), config.cache.ttl());
        }

        Ok(aggregator)
    }

    /// Fail any single provider call that takes longer than `deadline`
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Reuse normalized provider results for `ttl`
    #[must_use]
    pub fn with_cache(mut self, store: Arc<PersistentCache>, ttl: Duration) -> Self {
        self.cache = Some(ResponseCache { store, ttl });
        self
    }

    #[must_use]
    pub fn provider_names(&self) -> Vec<ProviderName> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Forecast for a coordinate from every point-based provider
    pub async fn get_integrated_forecast(
        &self,
        coordinate: Coordinate,
        credentials: &CredentialSet,
    ) -> Result<UnifiedForecast, AggregationError> {
        self.forecast(&ForecastRequest::point(coordinate), credentials)
            .await
    }

    #[instrument(name = "aggregate_forecast", skip(self, credentials), fields(lat = request.coordinate.latitude, lng = request.coordinate.longitude))]
    pub async fn forecast(
        &self,
        request: &ForecastRequest,
        credentials: &CredentialSet,
    ) -> Result<UnifiedForecast, AggregationError> {
        let available: Vec<&Arc<dyn ForecastProvider>> = self
            .providers
            .iter()
            .filter(|provider| {
                let available = provider.is_available(request, credentials);
                if !available {
                    debug!("Skipping {}: not available for this request", provider.name());
                }
                available
            })
            .collect();

        if available.is_empty() {
            warn!("No forecast provider available");
            return Err(AggregationError::NoProviders);
        }

        let outcomes = join_all(
            available
                .iter()
                .map(|provider| self.run_provider(Arc::as_ref(provider), request, credentials)),
        )
        .await;

        let mut partials = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(partial) => partials.push(partial),
                Err(err) => {
                    warn!("Provider failed, continuing without it: {}", err);
                    failures.push(err);
                }
            }
        }

        if partials.is_empty() {
            return Err(AggregationError::AllFailed(failures));
        }

        let mut forecast = merge(partials);
        forecast.unavailable = failures.iter().map(ProviderError::provider).collect();

        info!(
            hours = forecast.hourly.len(),
            days = forecast.daily.len(),
            "Aggregated forecast from {:?}",
            forecast.sources
        );
        Ok(forecast)
    }

    async fn run_provider(
        &self,
        provider: &dyn ForecastProvider,
        request: &ForecastRequest,
        credentials: &CredentialSet,
    ) -> Result<PartialForecast, ProviderError> {
        let key = cache_key(provider.name(), request);

        if let Some(cache) = &self.cache {
            match cache.store.get::<PartialForecast>(&key).await {
                Ok(Some(partial)) => {
                    debug!("Using cached {} forecast", provider.name());
                    return Ok(partial);
                }
                Ok(None) => {}
                Err(e) => warn!("Cache lookup for {} failed: {}", key, e),
            }
        }

        let fetch = provider.fetch(request, credentials);
        let raw = match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, fetch).await.map_err(|_| {
                ProviderError::Timeout {
                    provider: provider.name(),
                    timeout: deadline,
                }
            })??,
            None => fetch.await?,
        };
        let partial = provider.normalize(raw)?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache
                .store
                .put(&key, partial.clone(), cache::jittered(cache.ttl))
                .await
            {
                warn!("Failed to cache {} forecast: {}", provider.name(), e);
            }
        }

        Ok(partial)
    }
}

fn cache_key(provider: ProviderName, request: &ForecastRequest) -> String {
    match (&request.spot_id, provider) {
        (Some(spot_id), ProviderName::Surfline) => format!("{provider}:spot:{spot_id}"),
        _ => format!("{provider}:{}", request.coordinate.cache_key()),
    }
}

/// Merge partial forecasts given in priority order, first writer wins
#[must_use]
pub fn merge(partials: Vec<PartialForecast>) -> UnifiedForecast {
    let mut hourly = BTreeMap::new();
    let mut daily = BTreeMap::new();
    let mut sources = Vec::new();

    for partial in partials {
        let mut contributed = false;
        for hour in partial.hourly {
            if let Entry::Vacant(slot) = hourly.entry(hour.timestamp) {
                slot.insert(hour);
                contributed = true;
            }
        }
        for day in partial.daily {
            if let Entry::Vacant(slot) = daily.entry(day.date) {
                slot.insert(day);
                contributed = true;
            }
        }
        if contributed {
            sources.push(partial.provider);
        }
    }

    UnifiedForecast {
        hourly: hourly.into_values().collect(),
        daily: daily.into_values().collect(),
        sources,
        unavailable: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyObservation, HourlyObservation, TemperatureRange};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn hour(h: u32, wave_height: Option<f64>, wind_speed: Option<f64>) -> HourlyObservation {
        HourlyObservation {
            wave_height,
            wind_speed,
            ..HourlyObservation::empty(Utc.with_ymd_and_hms(2024, 7, 1, h, 0, 0).unwrap())
        }
    }

    fn day(d: u32, weather: &str) -> DailyObservation {
        DailyObservation {
            date: NaiveDate::from_ymd_opt(2024, 7, d).unwrap(),
            temperature: TemperatureRange { min: 20.0, max: 27.0 },
            weather: weather.to_string(),
            weather_description: String::new(),
            wind_speed: None,
            wind_direction: None,
            precipitation_probability: 0.1,
        }
    }

    #[test]
    fn test_merge_first_writer_wins_and_sorts() {
        let marine = PartialForecast {
            provider: ProviderName::Stormglass,
            hourly: vec![hour(7, Some(1.2), None), hour(6, Some(1.0), None)],
            daily: vec![],
        };
        let weather = PartialForecast {
            provider: ProviderName::OpenWeatherMap,
            hourly: vec![hour(6, None, Some(4.0)), hour(8, None, Some(6.0))],
            daily: vec![day(2, "Rain"), day(1, "Clear")],
        };

        let merged = merge(vec![marine, weather]);

        let hours: Vec<(u32, Option<f64>, Option<f64>)> = merged
            .hourly
            .iter()
            .map(|h| (chrono::Timelike::hour(&h.timestamp), h.wave_height, h.wind_speed))
            .collect();
        assert_eq!(
            hours,
            vec![(6, Some(1.0), None), (7, Some(1.2), None), (8, None, Some(6.0))]
        );
        assert_eq!(merged.daily[0].weather, "Clear");
        assert_eq!(merged.daily[1].weather, "Rain");
        assert_eq!(
            merged.sources,
            vec![ProviderName::Stormglass, ProviderName::OpenWeatherMap]
        );
    }

    #[test]
    fn test_merge_omits_providers_that_added_nothing() {
        let first = PartialForecast {
            provider: ProviderName::Stormglass,
            hourly: vec![hour(6, Some(1.0), None)],
            daily: vec![],
        };
        let shadowed = PartialForecast {
            provider: ProviderName::Windy,
            hourly: vec![hour(6, Some(2.0), Some(3.0))],
            daily: vec![],
        };
        let merged = merge(vec![first, shadowed, PartialForecast::new(ProviderName::Surfline)]);
        assert_eq!(merged.hourly.len(), 1);
        assert_eq!(merged.hourly[0].wave_height, Some(1.0));
        assert_eq!(merged.sources, vec![ProviderName::Stormglass]);
    }

    enum Behaviour {
        Succeed(PartialForecast),
        Fail,
        Hang,
        Unavailable,
    }

    struct StubProvider {
        name: ProviderName,
        behaviour: Behaviour,
    }

    fn stub(name: ProviderName, behaviour: Behaviour) -> Arc<dyn ForecastProvider> {
        Arc::new(StubProvider { name, behaviour })
    }

    #[async_trait::async_trait]
    impl ForecastProvider for StubProvider {
        fn name(&self) -> ProviderName {
            self.name
        }

        fn is_available(&self, _: &ForecastRequest, _: &CredentialSet) -> bool {
            !matches!(self.behaviour, Behaviour::Unavailable)
        }

        async fn fetch(
            &self,
            _: &ForecastRequest,
            _: &CredentialSet,
        ) -> Result<providers::RawProviderResponse, ProviderError> {
            match &self.behaviour {
                Behaviour::Fail => Err(ProviderError::Status {
                    provider: self.name,
                    status: 500,
                    body: "boom".to_string(),
                }),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    unreachable!("deadline should fire first")
                }
                _ => Ok(providers::RawProviderResponse::OpenWeatherMap(
                    providers::openweathermap::OneCallResponse {
                        hourly: vec![],
                        daily: vec![],
                    },
                )),
            }
        }

        fn normalize(
            &self,
            _: providers::RawProviderResponse,
        ) -> Result<PartialForecast, ProviderError> {
            match &self.behaviour {
                Behaviour::Succeed(partial) => Ok(partial.clone()),
                _ => Ok(PartialForecast::new(self.name)),
            }
        }
    }

    fn coordinate() -> Coordinate {
        Coordinate::new(35.32, 139.49).unwrap()
    }

    fn marine_partial() -> PartialForecast {
        PartialForecast {
            provider: ProviderName::Stormglass,
            hourly: vec![hour(6, Some(1.1), Some(3.0))],
            daily: vec![],
        }
    }

    #[tokio::test]
    async fn test_one_failing_provider_is_tolerated() {
        let aggregator = ForecastAggregator::new(vec![
            stub(ProviderName::Stormglass, Behaviour::Succeed(marine_partial())),
            stub(ProviderName::OpenWeatherMap, Behaviour::Fail),
        ]);

        let forecast = aggregator
            .get_integrated_forecast(coordinate(), &CredentialSet::default())
            .await
            .unwrap();

        assert_eq!(forecast.hourly.len(), 1);
        assert_eq!(forecast.sources, vec![ProviderName::Stormglass]);
        assert_eq!(forecast.unavailable, vec![ProviderName::OpenWeatherMap]);
        assert!(forecast.is_partial());
    }

    #[tokio::test]
    async fn test_all_failing_providers_fail_the_request() {
        let aggregator = ForecastAggregator::new(vec![
            stub(ProviderName::Stormglass, Behaviour::Fail),
            stub(ProviderName::OpenWeatherMap, Behaviour::Fail),
        ]);

        let err = aggregator
            .get_integrated_forecast(coordinate(), &CredentialSet::default())
            .await
            .unwrap_err();

        assert_eq!(err.failures().len(), 2);
    }

    #[tokio::test]
    async fn test_no_available_provider() {
        let aggregator = ForecastAggregator::new(vec![stub(
            ProviderName::Surfline,
            Behaviour::Unavailable,
        )]);

        let err = aggregator
            .get_integrated_forecast(coordinate(), &CredentialSet::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AggregationError::NoProviders));
    }

    #[tokio::test]
    async fn test_unavailable_provider_is_not_a_failure() {
        let aggregator = ForecastAggregator::new(vec![
            stub(ProviderName::Stormglass, Behaviour::Succeed(marine_partial())),
            stub(ProviderName::Surfline, Behaviour::Unavailable),
        ]);

        let forecast = aggregator
            .get_integrated_forecast(coordinate(), &CredentialSet::default())
            .await
            .unwrap();

        assert!(forecast.unavailable.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_hits_deadline() {
        let aggregator = ForecastAggregator::new(vec![
            stub(ProviderName::Stormglass, Behaviour::Hang),
            stub(ProviderName::OpenWeatherMap, Behaviour::Succeed(PartialForecast {
                provider: ProviderName::OpenWeatherMap,
                hourly: vec![hour(6, None, Some(4.0))],
                daily: vec![],
            })),
        ])
        .with_deadline(Duration::from_secs(5));

        let forecast = aggregator
            .get_integrated_forecast(coordinate(), &CredentialSet::default())
            .await
            .unwrap();

        assert_eq!(forecast.sources, vec![ProviderName::OpenWeatherMap]);
        assert_eq!(forecast.unavailable, vec![ProviderName::Stormglass]);
    }

    #[tokio::test]
    async fn test_cached_result_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(PersistentCache::open(dir.path()).unwrap());
        let request = ForecastRequest::point(coordinate());

        let warm = ForecastAggregator::new(vec![stub(
            ProviderName::Stormglass,
            Behaviour::Succeed(marine_partial()),
        )])
        .with_cache(store.clone(), Duration::from_secs(3600));
        warm.forecast(&request, &CredentialSet::default()).await.unwrap();

        let failing = ForecastAggregator::new(vec![stub(ProviderName::Stormglass, Behaviour::Fail)])
            .with_cache(store, Duration::from_secs(3600));
        let forecast = failing
            .forecast(&request, &CredentialSet::default())
            .await
            .unwrap();

        assert_eq!(forecast.hourly[0].wave_height, Some(1.1));
    }

    #[test]
    fn test_cache_key_uses_spot_for_surfline_only() {
        let coordinate = Coordinate::new(33.655, -118.003).unwrap();
        let request = ForecastRequest::spot(coordinate, "hb-pier").unwrap();
        assert_eq!(cache_key(ProviderName::Surfline, &request), "surfline:spot:hb-pier");
        assert_eq!(cache_key(ProviderName::Windy, &request), "windy:33.66:-118.00");
    }
}
