// Search service: request validation, catalogue snapshot, engine run

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{error, info};

use crate::catalogue::{CatalogueError, ContractCatalogue};
use crate::model::{SearchResult, StayRequest};
use crate::search;
use crate::validation::{check_in_not_in_past, SearchRequestPayload, ValidationFailure};

#[derive(Error, Debug)]
pub enum SearchError {
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error(transparent)]
    Catalogue(#[from] CatalogueError),
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub reject_past_check_in: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            reject_past_check_in: true,
        }
    }
}

#[derive(Debug, Default)]
struct SearchStats {
    total_searches: AtomicUsize,
    rejected_requests: AtomicUsize,
    catalogue_failures: AtomicUsize,
    contracts_evaluated: AtomicUsize,
    available_results: AtomicUsize,
    unavailable_results: AtomicUsize,
    average_search_time_us: AtomicU64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SearchStatsReport {
    pub total_searches: usize,
    pub rejected_requests: usize,
    pub catalogue_failures: usize,
    pub contracts_evaluated: usize,
    pub available_results: usize,
    pub unavailable_results: usize,
    pub average_search_time_us: u64,
}

pub struct SearchService {
    catalogue: Arc<dyn ContractCatalogue>,
    config: RwLock<SearchConfig>,
    stats: SearchStats,
}

impl SearchService {
    pub fn new(catalogue: Arc<dyn ContractCatalogue>, config: SearchConfig) -> Self {
        Self {
            catalogue,
            config: RwLock::new(config),
            stats: SearchStats::default(),
        }
    }

    pub async fn search(
        &self,
        payload: SearchRequestPayload,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let request = match self.validate(payload) {
            Ok(request) => request,
            Err(failure) => {
                self.stats.rejected_requests.fetch_add(1, Ordering::SeqCst);
                info!(errors = failure.errors.len(), %failure, "Search request rejected");
                return Err(failure.into());
            }
        };

        self.search_stay(&request).await
    }

    // Already validated; the catalogue is read once per search
    pub async fn search_stay(
        &self,
        request: &StayRequest,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let started = Instant::now();

        let contracts = match self.catalogue.list_all_contracts().await {
            Ok(contracts) => contracts,
            Err(err) => {
                self.stats.catalogue_failures.fetch_add(1, Ordering::SeqCst);
                error!(error = %err, "Could not load contract catalogue");
                return Err(err.into());
            }
        };

        let results = search::search(request, &contracts);
        let available = results.iter().filter(|r| r.is_available()).count();

        self.stats.total_searches.fetch_add(1, Ordering::SeqCst);
        self.stats
            .contracts_evaluated
            .fetch_add(contracts.len(), Ordering::SeqCst);
        self.stats
            .available_results
            .fetch_add(available, Ordering::SeqCst);
        self.stats
            .unavailable_results
            .fetch_add(results.len() - available, Ordering::SeqCst);
        self.store_search_time(started);

        info!(
            check_in = %request.check_in(),
            nights = request.number_of_nights(),
            room_requests = request.room_requests().len(),
            contracts = contracts.len(),
            available,
            elapsed_us = started.elapsed().as_micros() as u64,
            "Search completed"
        );
        Ok(results)
    }

    pub fn stats(&self) -> SearchStatsReport {
        SearchStatsReport {
            total_searches: self.stats.total_searches.load(Ordering::SeqCst),
            rejected_requests: self.stats.rejected_requests.load(Ordering::SeqCst),
            catalogue_failures: self.stats.catalogue_failures.load(Ordering::SeqCst),
            contracts_evaluated: self.stats.contracts_evaluated.load(Ordering::SeqCst),
            available_results: self.stats.available_results.load(Ordering::SeqCst),
            unavailable_results: self.stats.unavailable_results.load(Ordering::SeqCst),
            average_search_time_us: self.stats.average_search_time_us.load(Ordering::SeqCst),
        }
    }

    pub fn config(&self) -> SearchConfig {
        self.config.read().clone()
    }

    pub fn update_config(&self, config: SearchConfig) {
        info!(reject_past_check_in = config.reject_past_check_in, "Search config updated");
        *self.config.write() = config;
    }

    fn validate(&self, payload: SearchRequestPayload) -> Result<StayRequest, ValidationFailure> {
        let request = payload.into_stay_request()?;
        if self.config.read().reject_past_check_in {
            check_in_not_in_past(&request, today())?;
        }
        Ok(request)
    }

    fn store_search_time(&self, started: Instant) {
        let duration_us = started.elapsed().as_micros() as u64;
        let total_searches = self.stats.total_searches.load(Ordering::SeqCst) as u64;
        let current_avg = self.stats.average_search_time_us.load(Ordering::SeqCst);

        let new_avg = if total_searches <= 1 {
            duration_us
        } else {
            (current_avg * (total_searches - 1) + duration_us) / total_searches
        };

        self.stats
            .average_search_time_us
            .store(new_avg, Ordering::SeqCst);
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
