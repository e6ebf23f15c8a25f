//! Query resolution pipeline.
//!
//! `classify → select_route → (extract → validate → execute) | aggregate → format`
//!
//! Every stage except execution is pure and synchronous. The only shared
//! state is the catalog and the node pool inside the executor.

pub mod classifier;
pub mod error;
pub mod extractor;
pub mod lexicon;
pub mod selector;
pub mod validator;

pub use classifier::{classify, Classification, Complexity, EntityType, QueryType};
pub use error::ResolveError;
pub use extractor::{extract_parameters, ParamValue, ParameterBinding};
pub use selector::{select_route, Route, RouteLabel, ScoringTables};
pub use validator::validate_binding;

use crate::catalog::{Catalog, EndpointDescriptor};
use crate::config::AppConfig;
use crate::executor::{ReqwestTransport, ResilientExecutor};
use crate::formatter::format_response;
use crate::nodes::{NodeDirectory, NodePool};
use crate::popularity::{rank_artists, rank_genres, PopularityError, TrackRecord};
use crate::server::metrics;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

const TRENDING_TRACKS: &str = "Get Trending Tracks";

/// What a caller gets back for one query.
#[derive(Clone, Debug, Serialize)]
pub struct FormattedResponse {
    pub answer: String,
    pub route: Option<RouteLabel>,
    pub classification: Classification,
}

/// Everything decided about a query before anything is sent to a node.
#[derive(Clone, Debug, Serialize)]
pub struct QueryPlan {
    pub classification: Classification,
    pub route: RouteLabel,
    /// Bound parameters for a catalog call, `None` for aggregates.
    pub parameters: Option<ParameterBinding>,
}

pub struct Resolver {
    catalog: Arc<Catalog>,
    tables: ScoringTables,
    executor: Arc<ResilientExecutor>,
    batch_size: u32,
}

impl Resolver {
    pub fn new(catalog: Arc<Catalog>, executor: Arc<ResilientExecutor>, batch_size: u32) -> Self {
        Self {
            catalog,
            tables: ScoringTables::default(),
            executor,
            batch_size,
        }
    }

    /// Wire the pipeline from resolved configuration, with real HTTP
    /// transport and a node pool over `directory`.
    pub fn from_config(
        config: &AppConfig,
        catalog: Catalog,
        directory: Arc<dyn NodeDirectory>,
    ) -> anyhow::Result<Self> {
        let pool = Arc::new(NodePool::new(
            directory,
            config.directory.fallback_nodes.clone(),
        ));
        let transport = Arc::new(ReqwestTransport::new(config.executor.request_timeout_sec)?);
        let executor = Arc::new(ResilientExecutor::new(pool, transport, &config.executor));
        Ok(Self::new(
            Arc::new(catalog),
            executor,
            config.aggregates.batch_size,
        ))
    }

    pub fn with_tables(mut self, tables: ScoringTables) -> Self {
        self.tables = tables;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn executor(&self) -> &Arc<ResilientExecutor> {
        &self.executor
    }

    pub fn classify(&self, query: &str) -> Classification {
        classify(query)
    }

    /// Classify, route and bind parameters without executing anything.
    pub fn plan(&self, query: &str) -> Result<QueryPlan, ResolveError> {
        let classification = self.classify(query);
        let route = select_route(&self.tables, &self.catalog, &classification, query)?;
        let parameters = match route {
            Route::CatalogCall(endpoint) => {
                let binding = extract_parameters(query, &classification, endpoint);
                validate_binding(endpoint, &binding)?;
                Some(binding)
            }
            Route::ArtistAggregate | Route::GenreAggregate => None,
        };
        Ok(QueryPlan {
            route: route.label(),
            classification,
            parameters,
        })
    }

    /// Run the whole pipeline for `query`.
    pub async fn resolve(&self, query: &str) -> Result<FormattedResponse, ResolveError> {
        let classification = self.classify(query);
        let route = select_route(&self.tables, &self.catalog, &classification, query)?;
        let answer = self.run_route(query, &classification, route).await?;
        Ok(FormattedResponse {
            answer,
            route: Some(route.label()),
            classification,
        })
    }

    /// Like [`Resolver::resolve`], but failures become a user-facing answer.
    /// Records metrics for every query.
    pub async fn answer(&self, query: &str) -> FormattedResponse {
        let started = Instant::now();
        let classification = self.classify(query);

        let (route, result) =
            match select_route(&self.tables, &self.catalog, &classification, query) {
                Ok(route) => (Some(route), self.run_route(query, &classification, route).await),
                Err(err) => (None, Err(err)),
            };
        let metric_route = route.map(|r| r.metric_name().to_string());
        let metric_route = metric_route.as_deref().unwrap_or("none");

        match result {
            Ok(answer) => {
                metrics::record_query(metric_route, "success", started.elapsed());
                info!("Answered {:?} via {} in {:?}", query, metric_route, started.elapsed());
                FormattedResponse {
                    answer,
                    route: route.map(|r| r.label()),
                    classification,
                }
            }
            Err(err) => {
                metrics::record_query(metric_route, err.kind(), started.elapsed());
                match err {
                    ResolveError::UnsupportedQuery | ResolveError::NoSuitableEndpoint => {
                        info!("Could not route {:?}: {}", query, err)
                    }
                    _ => error!("Failed to answer {:?} via {}: {}", query, metric_route, err),
                }
                FormattedResponse {
                    answer: err.user_message(query),
                    route: None,
                    classification,
                }
            }
        }
    }

    async fn run_route(
        &self,
        query: &str,
        classification: &Classification,
        route: Route<'_>,
    ) -> Result<String, ResolveError> {
        match route {
            Route::CatalogCall(endpoint) => {
                let binding = extract_parameters(query, classification, endpoint);
                validate_binding(endpoint, &binding)?;
                let data = self.executor.call(endpoint, &binding).await?;
                Ok(format_response(&route, &data, binding.limit()))
            }
            Route::ArtistAggregate => {
                let tracks = self.fetch_trending_batch(query, classification).await?;
                let ranking = rank_artists(&tracks).map_err(|e| no_data("artist", e))?;
                let data = to_value(&ranking.scores)?;
                Ok(format_response(&route, &data, extractor::extract_limit(query)))
            }
            Route::GenreAggregate => {
                let tracks = self.fetch_trending_batch(query, classification).await?;
                let scores = rank_genres(&tracks).map_err(|e| no_data("genre", e))?;
                let data = to_value(&scores)?;
                Ok(format_response(&route, &data, extractor::extract_limit(query)))
            }
        }
    }

    /// Trending tracks feeding the aggregate calculators.
    async fn fetch_trending_batch(
        &self,
        query: &str,
        classification: &Classification,
    ) -> Result<Vec<TrackRecord>, ResolveError> {
        let endpoint = self.trending_endpoint()?;
        let mut binding =
            ParameterBinding::new().with("limit", ParamValue::Number(self.batch_size as u64));
        let tokens = lexicon::tokenize(&lexicon::normalize(query));
        if let Some(window) = lexicon::time_window(&tokens) {
            binding.insert("time", ParamValue::Text(window.to_string()));
        }
        if let Some(genre) = &classification.genre {
            binding.insert("genre", ParamValue::Text(genre.clone()));
        }

        let data = self.executor.call(endpoint, &binding).await?;
        if data.is_null() {
            return Ok(vec![]);
        }
        let tracks: Vec<TrackRecord> = serde_json::from_value(data)
            .map_err(|e| ResolveError::InvalidPayload(e.to_string()))?;
        debug!("Fetched {} trending tracks for aggregation", tracks.len());
        Ok(tracks)
    }

    fn trending_endpoint(&self) -> Result<&EndpointDescriptor, ResolveError> {
        self.catalog.by_api_name(TRENDING_TRACKS).ok_or_else(|| {
            warn!("Catalog has no '{}' endpoint, aggregates are unavailable", TRENDING_TRACKS);
            ResolveError::NoSuitableEndpoint
        })
    }
}

fn no_data(calculation: &'static str, err: PopularityError) -> ResolveError {
    debug!("{} calculation produced nothing: {}", calculation, err);
    ResolveError::NoDataAvailable { calculation }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, ResolveError> {
    serde_json::to_value(value).map_err(|e| ResolveError::InvalidPayload(e.to_string()))
}
