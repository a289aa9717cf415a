//! Spatial queries and the query engine contract.
//!
//! An engine answers asynchronously: [`QueryEngine::query_features`] returns a
//! [`PendingQuery`] at once and the result arrives on a channel later. The UI
//! thread polls pending queries once per frame and never blocks on them.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::Duration;

use serde_json::Map;

use super::features::{Feature, FeatureSet};
use super::geometry::{Circle, Geometry, RadiusUnit};
use super::layers::FeatureLayer;
use crate::error::QueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpatialRelationship {
    #[default]
    Intersects,
    Disjoint,
}

/// Parameters of a feature query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    /// Region to test against. Required by every engine in this crate.
    pub geometry: Option<Geometry>,
    pub spatial_relationship: SpatialRelationship,
    /// When false, returned features carry no geometry.
    pub return_geometry: bool,
    /// Attribute names to return; `"*"` means all.
    pub out_fields: Vec<String>,
    pub max_record_count: Option<usize>,
}

impl Query {
    /// Run the query synchronously against `features`.
    pub fn evaluate(&self, features: &[Feature]) -> Result<FeatureSet, QueryError> {
        let region = match &self.geometry {
            None => return Err(QueryError::MissingGeometry),
            Some(Geometry::Circle(c)) => *c,
            Some(Geometry::Point(p)) => Circle::new(*p, 0.0, RadiusUnit::Meters),
            Some(other) => return Err(QueryError::UnsupportedGeometry(other.type_name())),
        };

        let mut out = FeatureSet::default();
        for f in features {
            let hit = f
                .geometry
                .as_ref()
                .is_some_and(|g| g.intersects_circle(&region));
            let selected = match self.spatial_relationship {
                SpatialRelationship::Intersects => hit,
                SpatialRelationship::Disjoint => !hit,
            };
            if !selected {
                continue;
            }
            if self.max_record_count.is_some_and(|max| out.features.len() >= max) {
                out.exceeded_transfer_limit = true;
                break;
            }
            out.features.push(self.shape_result(f));
        }
        Ok(out)
    }

    fn shape_result(&self, f: &Feature) -> Feature {
        let all_fields = self.out_fields.is_empty() || self.out_fields.iter().any(|n| n == "*");
        let attributes = if all_fields {
            f.attributes.clone()
        } else {
            f.attributes
                .iter()
                .filter(|(k, _)| self.out_fields.iter().any(|n| n == *k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<_, _>>()
        };
        Feature {
            id: f.id.clone(),
            attributes,
            geometry: if self.return_geometry {
                f.geometry.clone()
            } else {
                None
            },
        }
    }
}

pub type QueryResult = Result<FeatureSet, QueryError>;

/// A query whose result may not be known yet.
pub struct PendingQuery {
    layer: String,
    rx: Receiver<QueryResult>,
}

impl PendingQuery {
    /// Create a pending query together with the handle that completes it.
    pub fn channel(layer: impl Into<String>) -> (QueryResolver, PendingQuery) {
        let (tx, rx) = mpsc::channel();
        (
            QueryResolver { tx },
            PendingQuery {
                layer: layer.into(),
                rx,
            },
        )
    }

    /// An already-completed query.
    pub fn ready(layer: impl Into<String>, result: QueryResult) -> Self {
        let (resolver, pending) = Self::channel(layer);
        resolver.complete(result);
        pending
    }

    pub fn layer(&self) -> &str {
        &self.layer
    }

    /// Non-blocking check. `None` while the engine is still working; a dropped
    /// resolver counts as a failure.
    pub fn try_take(&self) -> Option<QueryResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(QueryError::Abandoned {
                layer: self.layer.clone(),
            })),
        }
    }

    /// Block until the result arrives or `timeout` elapses.
    pub fn wait(self, timeout: Duration) -> QueryResult {
        self.rx
            .recv_timeout(timeout)
            .unwrap_or_else(|_| Err(QueryError::Abandoned { layer: self.layer }))
    }
}

/// Completes a [`PendingQuery`]. Dropping it without completing abandons the query.
pub struct QueryResolver {
    tx: Sender<QueryResult>,
}

impl QueryResolver {
    pub fn resolve(self, features: FeatureSet) {
        self.complete(Ok(features));
    }

    pub fn reject(self, error: QueryError) {
        self.complete(Err(error));
    }

    pub fn complete(self, result: QueryResult) {
        // Receiver gone means nobody is interested anymore.
        let _ = self.tx.send(result);
    }
}

/// Contract of the geometry/query engine.
pub trait QueryEngine: Send + Sync {
    fn query_features(&self, layer: &FeatureLayer, query: Query) -> PendingQuery;
}

/// In-process engine evaluating queries on a worker thread.
#[derive(Debug, Clone, Default)]
pub struct LocalQueryEngine {
    /// Artificial delay before answering, to make in-flight behaviour visible.
    pub latency: Duration,
}

impl LocalQueryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }
}

impl QueryEngine for LocalQueryEngine {
    fn query_features(&self, layer: &FeatureLayer, query: Query) -> PendingQuery {
        let (resolver, pending) = PendingQuery::channel(layer.id.clone());
        let layer = layer.clone();
        let latency = self.latency;
        let spawned = std::thread::Builder::new()
            .name("feature-query".into())
            .spawn(move || {
                if !latency.is_zero() {
                    std::thread::sleep(latency);
                }
                let result = query.evaluate(layer.features());
                if let Ok(set) = &result {
                    tracing::debug!(layer = %layer.id, hits = set.len(), "query evaluated");
                }
                resolver.complete(result);
            });
        match spawned {
            Ok(_) => pending,
            Err(e) => PendingQuery::ready(
                pending.layer().to_string(),
                Err(QueryError::Engine(format!("failed to spawn query worker: {e}"))),
            ),
        }
    }
}
