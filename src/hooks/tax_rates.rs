//! Query and mutation bindings for the tax-rate resource
//!
//! Each read accessor derives a cache key, serves a fresh entry when one
//! exists, and otherwise delegates to the SDK and stores the result. Each
//! mutation delegates to the SDK and, on success, invalidates the key
//! families the change can affect before running caller callbacks.

use super::{MutationCallbacks, MutationTracker, QueryOptions, QueryResult};
use crate::cache::{KeyFactory, QueryCache, QueryKey};
use crate::sdk::TaxRateSdk;
use crate::types::{
    CreateTaxRatePayload, ListTaxRatesQuery, TaxRateDeleteResponse, TaxRateListResponse,
    TaxRateResponse, UpdateTaxRatePayload,
};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Key factory for the tax-rate resource
pub const TAX_RATES_QUERY_KEYS: KeyFactory = KeyFactory::new("tax_rates");

/// Query/mutation bindings for tax rates
///
/// The cache is an injected collaborator; tests build an isolated instance
/// per case.
pub struct TaxRates<S> {
    sdk: Arc<S>,
    cache: Arc<QueryCache>,
    keys: KeyFactory,
    create_state: MutationTracker,
    update_state: MutationTracker,
    delete_state: MutationTracker,
}

impl<S: TaxRateSdk> TaxRates<S> {
    pub fn new(sdk: Arc<S>, cache: Arc<QueryCache>) -> Self {
        Self {
            sdk,
            cache,
            keys: TAX_RATES_QUERY_KEYS,
            create_state: MutationTracker::new(),
            update_state: MutationTracker::new(),
            delete_state: MutationTracker::new(),
        }
    }

    pub fn keys(&self) -> &KeyFactory {
        &self.keys
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn create_state(&self) -> &MutationTracker {
        &self.create_state
    }

    pub fn update_state(&self) -> &MutationTracker {
        &self.update_state
    }

    pub fn delete_state(&self) -> &MutationTracker {
        &self.delete_state
    }

    /// Read one tax rate
    ///
    /// Serves a fresh cache entry under `detail(id)` when present; otherwise
    /// fetches through the SDK and stores the result. Errors pass through
    /// unmodified.
    pub async fn tax_rate(
        &self,
        id: &str,
        query: Option<&ListTaxRatesQuery>,
        options: &QueryOptions,
    ) -> QueryResult<TaxRateResponse> {
        if id.is_empty() {
            return QueryResult::failure(Error::InvalidInput(
                "tax rate id must not be empty".to_string(),
            ));
        }
        let key = self.keys.detail(id);
        self.read(key, options, self.sdk.retrieve(id, query)).await
    }

    /// Read a page of tax rates matching `query`
    ///
    /// The cache key is an order-stable function of the filter, so
    /// semantically identical filters share one entry.
    pub async fn tax_rates(
        &self,
        query: Option<&ListTaxRatesQuery>,
        options: &QueryOptions,
    ) -> QueryResult<TaxRateListResponse> {
        let key = self.keys.list(query);
        self.read(key, options, self.sdk.list(query)).await
    }

    /// Create a tax rate
    ///
    /// On success, invalidates `lists()` so every active list view refetches;
    /// detail entries are untouched. Caller callbacks run after the
    /// invalidation has been issued.
    pub async fn create(
        &self,
        payload: &CreateTaxRatePayload,
        callbacks: &MutationCallbacks<TaxRateResponse>,
    ) -> Result<TaxRateResponse> {
        self.create_state.begin();
        tracing::debug!(name = %payload.name, "Creating tax rate");
        let result = self.sdk.create(payload).await;
        self.settle(
            &self.create_state,
            callbacks,
            result,
            &[self.keys.lists()],
        )
    }

    /// Update a tax rate
    ///
    /// An update can change fields visible in list summaries and in the
    /// detail view, so both `lists()` and `detail(id)` are invalidated.
    pub async fn update(
        &self,
        id: &str,
        payload: &UpdateTaxRatePayload,
        callbacks: &MutationCallbacks<TaxRateResponse>,
    ) -> Result<TaxRateResponse> {
        self.update_state.begin();
        tracing::debug!(id, "Updating tax rate");
        let result = self.sdk.update(id, payload).await;
        self.settle(
            &self.update_state,
            callbacks,
            result,
            &[self.keys.lists(), self.keys.detail(id)],
        )
    }

    /// Delete a tax rate
    ///
    /// Invalidates `lists()` and `detail(id)`. The detail key is invalidated
    /// even though the record no longer exists: a still-mounted detail view
    /// refetches and observes not-found instead of the stale cached record.
    pub async fn delete(
        &self,
        id: &str,
        callbacks: &MutationCallbacks<TaxRateDeleteResponse>,
    ) -> Result<TaxRateDeleteResponse> {
        self.delete_state.begin();
        tracing::debug!(id, "Deleting tax rate");
        let result = self.sdk.delete(id).await;
        self.settle(
            &self.delete_state,
            callbacks,
            result,
            &[self.keys.lists(), self.keys.detail(id)],
        )
    }

    async fn read<T, F>(&self, key: QueryKey, options: &QueryOptions, fetch: F) -> QueryResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: std::future::Future<Output = Result<T>>,
    {
        if !options.enabled {
            return QueryResult::idle();
        }

        if let Some(cached) = self.cache.get_fresh(&key, options.stale_time) {
            return QueryResult::success(cached, true);
        }

        match fetch.await {
            Ok(value) => {
                if let Err(e) = self.cache.insert(key.clone(), &value) {
                    tracing::warn!(%key, error = %e, "Failed to store fetched result");
                }
                QueryResult::success(value, false)
            }
            Err(err) => QueryResult::failure(err),
        }
    }

    /// Shared mutation epilogue: invalidation first, then caller callbacks in
    /// a fixed sequence (success/error, then settled)
    fn settle<T>(
        &self,
        tracker: &MutationTracker,
        callbacks: &MutationCallbacks<T>,
        result: Result<T>,
        invalidate: &[QueryKey],
    ) -> Result<T> {
        match result {
            Ok(value) => {
                for key in invalidate {
                    self.cache.invalidate(key);
                }
                tracker.succeed();
                callbacks.success(&value);
                callbacks.settled();
                Ok(value)
            }
            Err(err) => {
                tracker.fail();
                callbacks.error(&err);
                callbacks.settled();
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::MutationState;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::broadcast;

    fn make_rate(id: &str, code: Option<&str>, rate: Option<f64>) -> crate::types::TaxRate {
        crate::types::TaxRate {
            id: id.to_string(),
            name: format!("Rate {}", id),
            code: code.map(|c| c.to_string()),
            rate,
            is_default: false,
            is_combinable: false,
            tax_region_id: "txreg_1".to_string(),
            metadata: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// In-memory SDK double with programmable failure and call counting
    struct MockSdk {
        rates: Mutex<HashMap<String, crate::types::TaxRate>>,
        next_id: AtomicUsize,
        fail: AtomicBool,
        retrieve_calls: AtomicUsize,
        list_calls: AtomicUsize,
    }

    impl MockSdk {
        fn new() -> Self {
            Self {
                rates: Mutex::new(HashMap::new()),
                next_id: AtomicUsize::new(1),
                fail: AtomicBool::new(false),
                retrieve_calls: AtomicUsize::new(0),
                list_calls: AtomicUsize::new(0),
            }
        }

        fn with_rate(rate: crate::types::TaxRate) -> Self {
            let sdk = Self::new();
            sdk.rates.lock().unwrap().insert(rate.id.clone(), rate);
            sdk.next_id.store(2, Ordering::SeqCst);
            sdk
        }

        fn fail_next(&self) {
            self.fail.store(true, Ordering::SeqCst);
        }

        fn check_fail(&self) -> Result<()> {
            if self.fail.swap(false, Ordering::SeqCst) {
                Err(Error::Api {
                    status: 500,
                    message: "internal server error".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl TaxRateSdk for MockSdk {
        async fn retrieve(
            &self,
            id: &str,
            _query: Option<&ListTaxRatesQuery>,
        ) -> Result<TaxRateResponse> {
            self.retrieve_calls.fetch_add(1, Ordering::SeqCst);
            self.check_fail()?;
            self.rates
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .map(|tax_rate| TaxRateResponse { tax_rate })
                .ok_or_else(|| Error::NotFound(id.to_string()))
        }

        async fn list(&self, _query: Option<&ListTaxRatesQuery>) -> Result<TaxRateListResponse> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.check_fail()?;
            let mut tax_rates: Vec<_> = self.rates.lock().unwrap().values().cloned().collect();
            tax_rates.sort_by(|a, b| a.id.cmp(&b.id));
            let count = tax_rates.len();
            Ok(TaxRateListResponse {
                tax_rates,
                count,
                offset: 0,
                limit: 50,
            })
        }

        async fn create(&self, payload: &CreateTaxRatePayload) -> Result<TaxRateResponse> {
            self.check_fail()?;
            let id = format!("txr_{}", self.next_id.fetch_add(1, Ordering::SeqCst));
            let mut tax_rate = make_rate(&id, payload.code.as_deref(), payload.rate);
            tax_rate.name = payload.name.clone();
            self.rates
                .lock()
                .unwrap()
                .insert(id, tax_rate.clone());
            Ok(TaxRateResponse { tax_rate })
        }

        async fn update(
            &self,
            id: &str,
            payload: &UpdateTaxRatePayload,
        ) -> Result<TaxRateResponse> {
            self.check_fail()?;
            let mut rates = self.rates.lock().unwrap();
            let tax_rate = rates
                .get_mut(id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            if let Some(rate) = payload.rate {
                tax_rate.rate = Some(rate);
            }
            if let Some(name) = &payload.name {
                tax_rate.name = name.clone();
            }
            Ok(TaxRateResponse {
                tax_rate: tax_rate.clone(),
            })
        }

        async fn delete(&self, id: &str) -> Result<TaxRateDeleteResponse> {
            self.check_fail()?;
            self.rates
                .lock()
                .unwrap()
                .remove(id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            Ok(TaxRateDeleteResponse {
                id: id.to_string(),
                object: "tax_rate".to_string(),
                deleted: true,
            })
        }
    }

    fn bindings_with(sdk: MockSdk) -> TaxRates<MockSdk> {
        TaxRates::new(Arc::new(sdk), Arc::new(QueryCache::default()))
    }

    /// Drain pending invalidation events, counting per key
    fn drain(rx: &mut broadcast::Receiver<QueryKey>) -> HashMap<QueryKey, usize> {
        let mut counts = HashMap::new();
        while let Ok(key) = rx.try_recv() {
            *counts.entry(key).or_insert(0) += 1;
        }
        counts
    }

    #[tokio::test]
    async fn test_detail_read_hits_cache_on_second_call() {
        let hooks = bindings_with(MockSdk::with_rate(make_rate("txr_1", None, Some(7.25))));
        let options = QueryOptions::default();

        let first = hooks.tax_rate("txr_1", None, &options).await;
        assert!(first.is_success());
        assert!(!first.from_cache);

        let second = hooks.tax_rate("txr_1", None, &options).await;
        assert!(second.from_cache);
        assert_eq!(second.data.unwrap().tax_rate.id, "txr_1");
        assert_eq!(hooks.sdk.retrieve_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_detail_read_rejects_empty_id() {
        let hooks = bindings_with(MockSdk::new());
        let result = hooks.tax_rate("", None, &QueryOptions::default()).await;
        assert!(matches!(result.error, Some(Error::InvalidInput(_))));
        assert_eq!(hooks.sdk.retrieve_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disabled_read_skips_cache_and_network() {
        let hooks = bindings_with(MockSdk::with_rate(make_rate("txr_1", None, None)));
        let options = QueryOptions {
            enabled: false,
            ..Default::default()
        };
        let result = hooks.tax_rate("txr_1", None, &options).await;
        assert!(!result.is_success());
        assert!(!result.is_error());
        assert_eq!(hooks.sdk.retrieve_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_equivalent_filters_share_one_list_entry() {
        let hooks = bindings_with(MockSdk::with_rate(make_rate("txr_1", None, None)));
        let options = QueryOptions::default();
        let query = ListTaxRatesQuery {
            limit: Some(20),
            q: Some("tx".to_string()),
            ..Default::default()
        };

        let first = hooks.tax_rates(Some(&query), &options).await;
        assert!(first.is_success());

        // A separately constructed but equal filter hits the same entry
        let equivalent = query.clone();
        let second = hooks.tax_rates(Some(&equivalent), &options).await;
        assert!(second.from_cache);
        assert_eq!(hooks.sdk.list_calls.load(Ordering::SeqCst), 1);

        // A different filter misses
        let other = ListTaxRatesQuery {
            limit: Some(10),
            ..Default::default()
        };
        let third = hooks.tax_rates(Some(&other), &options).await;
        assert!(!third.from_cache);
        assert_eq!(hooks.sdk.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_create_invalidates_lists_exactly_once() {
        let hooks = bindings_with(MockSdk::new());
        let mut rx = hooks.cache().subscribe();

        let payload = CreateTaxRatePayload {
            name: "Texas Sales Tax".to_string(),
            code: Some("US-TX".to_string()),
            rate: Some(7.25),
            tax_region_id: "txreg_1".to_string(),
            ..Default::default()
        };
        let response = hooks
            .create(&payload, &MutationCallbacks::new())
            .await
            .unwrap();
        assert_eq!(response.tax_rate.id, "txr_1");
        assert_eq!(response.tax_rate.code.as_deref(), Some("US-TX"));

        let counts = drain(&mut rx);
        assert_eq!(counts.get(&hooks.keys().lists()), Some(&1));
        assert_eq!(counts.len(), 1);
        assert_eq!(hooks.create_state().state(), MutationState::Success);
    }

    #[tokio::test]
    async fn test_create_refreshes_active_list_views() {
        let hooks = bindings_with(MockSdk::new());
        let options = QueryOptions::default();

        let before = hooks.tax_rates(None, &options).await;
        assert_eq!(before.data.unwrap().count, 0);

        let payload = CreateTaxRatePayload {
            name: "VAT".to_string(),
            tax_region_id: "txreg_1".to_string(),
            ..Default::default()
        };
        hooks
            .create(&payload, &MutationCallbacks::new())
            .await
            .unwrap();

        // The cached list is stale now, so the next read refetches
        let after = hooks.tax_rates(None, &options).await;
        assert!(!after.from_cache);
        assert_eq!(after.data.unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_update_invalidates_lists_and_detail_once_each() {
        let hooks = bindings_with(MockSdk::with_rate(make_rate("txr_1", None, Some(5.0))));
        let mut rx = hooks.cache().subscribe();

        let payload = UpdateTaxRatePayload {
            rate: Some(8.0),
            ..Default::default()
        };
        let response = hooks
            .update("txr_1", &payload, &MutationCallbacks::new())
            .await
            .unwrap();
        assert_eq!(response.tax_rate.rate, Some(8.0));

        let counts = drain(&mut rx);
        assert_eq!(counts.get(&hooks.keys().lists()), Some(&1));
        assert_eq!(counts.get(&hooks.keys().detail("txr_1")), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_invalidates_both_and_refetch_sees_not_found() {
        let hooks = bindings_with(MockSdk::with_rate(make_rate("txr_1", None, None)));
        let options = QueryOptions::default();

        // Warm the detail cache
        assert!(hooks.tax_rate("txr_1", None, &options).await.is_success());

        let mut rx = hooks.cache().subscribe();
        let response = hooks
            .delete("txr_1", &MutationCallbacks::new())
            .await
            .unwrap();
        assert_eq!(response.id, "txr_1");
        assert!(response.deleted);

        let counts = drain(&mut rx);
        assert_eq!(counts.get(&hooks.keys().lists()), Some(&1));
        assert_eq!(counts.get(&hooks.keys().detail("txr_1")), Some(&1));

        // The stale detail entry is not served; the refetch observes not-found
        let read = hooks.tax_rate("txr_1", None, &options).await;
        assert!(matches!(read.error, Some(Error::NotFound(_))));
        assert!(read.data.is_none());
    }

    #[tokio::test]
    async fn test_failed_mutation_invalidates_nothing() {
        let hooks = bindings_with(MockSdk::with_rate(make_rate("txr_1", None, None)));
        let mut rx = hooks.cache().subscribe();
        hooks.sdk.fail_next();

        let errored = std::sync::Arc::new(AtomicBool::new(false));
        let succeeded = std::sync::Arc::new(AtomicBool::new(false));
        let e = errored.clone();
        let s = succeeded.clone();
        let callbacks = MutationCallbacks::new()
            .on_success(move |_| {
                s.store(true, Ordering::SeqCst);
            })
            .on_error(move |err| {
                assert!(matches!(err, Error::Api { status: 500, .. }));
                e.store(true, Ordering::SeqCst);
            });

        let payload = UpdateTaxRatePayload::default();
        let result = hooks.update("txr_1", &payload, &callbacks).await;
        assert!(matches!(result, Err(Error::Api { status: 500, .. })));

        assert!(drain(&mut rx).is_empty());
        assert!(errored.load(Ordering::SeqCst));
        assert!(!succeeded.load(Ordering::SeqCst));
        assert_eq!(hooks.update_state().state(), MutationState::Error);
    }

    #[tokio::test]
    async fn test_success_callback_observes_invalidation_already_issued() {
        let hooks = bindings_with(MockSdk::new());
        let rx = Mutex::new(hooks.cache().subscribe());
        let lists_key = hooks.keys().lists();

        let saw_invalidation = std::sync::Arc::new(AtomicBool::new(false));
        let saw = saw_invalidation.clone();
        let callbacks = MutationCallbacks::new().on_success(move |_: &TaxRateResponse| {
            let mut rx = rx.lock().unwrap();
            if let Ok(key) = rx.try_recv() {
                assert_eq!(key, lists_key);
                saw.store(true, Ordering::SeqCst);
            }
        });

        let payload = CreateTaxRatePayload {
            name: "GST".to_string(),
            tax_region_id: "txreg_1".to_string(),
            ..Default::default()
        };
        hooks.create(&payload, &callbacks).await.unwrap();
        assert!(saw_invalidation.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_settled_fires_on_both_outcomes() {
        let hooks = bindings_with(MockSdk::new());
        let settled = std::sync::Arc::new(AtomicUsize::new(0));

        let s = settled.clone();
        let callbacks = MutationCallbacks::new().on_settled(move || {
            s.fetch_add(1, Ordering::SeqCst);
        });

        let payload = CreateTaxRatePayload {
            name: "GST".to_string(),
            tax_region_id: "txreg_1".to_string(),
            ..Default::default()
        };
        hooks.create(&payload, &callbacks).await.unwrap();
        assert_eq!(settled.load(Ordering::SeqCst), 1);

        hooks.sdk.fail_next();
        let _ = hooks.create(&payload, &callbacks).await;
        assert_eq!(settled.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_mutation_state_resets_on_new_invocation() {
        let hooks = bindings_with(MockSdk::with_rate(make_rate("txr_1", None, None)));
        assert_eq!(hooks.delete_state().state(), MutationState::Idle);

        hooks
            .delete("txr_1", &MutationCallbacks::new())
            .await
            .unwrap();
        assert_eq!(hooks.delete_state().state(), MutationState::Success);

        // Deleting again fails (already gone) after passing through Pending
        let result = hooks.delete("txr_1", &MutationCallbacks::new()).await;
        assert!(result.is_err());
        assert_eq!(hooks.delete_state().state(), MutationState::Error);
    }

    #[tokio::test]
    async fn test_read_error_passes_through_unaltered() {
        let hooks = bindings_with(MockSdk::new());
        hooks.sdk.fail_next();

        let result = hooks.tax_rates(None, &QueryOptions::default()).await;
        match result.error {
            Some(Error::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "internal server error");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }
}
