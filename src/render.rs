//! Chart instances and their lifecycle.
//!
//! A refresh hands the freshly built [`ChartBundle`] to a [`ChartRegistry`], which
//! drops every chart from the previous refresh before creating the new ones. Each
//! chart lives in a [`ChartHandle`] that gives its instance back to the backend
//! when dropped, so replacing or clearing the registry always releases the old
//! instances, including when the new roster is empty. Readers only see a backend's
//! charts after [`ChartBackend::commit`], so a rebuild in progress is never visible.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

use crate::charts::{ChartBundle, ChartDataset, ChartKind};
use crate::error::Result;

/// Something that can draw a chart and later tear it down.
pub trait ChartBackend {
    type Instance;

    fn create(&self, kind: ChartKind, dataset: &ChartDataset) -> Result<Self::Instance>;

    fn destroy(&self, instance: Self::Instance);

    /// Called once the registry has finished replacing or clearing its charts.
    fn commit(&self) {}
}

/// Owns one live chart instance; releases it on drop.
pub struct ChartHandle<B: ChartBackend> {
    backend: Arc<B>,
    instance: Option<B::Instance>,
}

impl<B: ChartBackend> ChartHandle<B> {
    pub fn new(backend: Arc<B>, instance: B::Instance) -> Self {
        Self {
            backend,
            instance: Some(instance),
        }
    }
}

impl<B: ChartBackend> Drop for ChartHandle<B> {
    fn drop(&mut self) {
        if let Some(instance) = self.instance.take() {
            self.backend.destroy(instance);
        }
    }
}

pub struct ChartRegistry<B: ChartBackend> {
    backend: Arc<B>,
    charts: BTreeMap<ChartKind, ChartHandle<B>>,
}

impl<B: ChartBackend> ChartRegistry<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            charts: BTreeMap::new(),
        }
    }

    /// Replaces every chart with one built from `bundle`. Returns how many are live.
    pub fn rebuild(&mut self, bundle: &ChartBundle) -> usize {
        self.charts.clear();
        if !bundle.is_empty() {
            for kind in ChartKind::ALL {
                let dataset = bundle.dataset(kind);
                match self.backend.create(kind, &dataset) {
                    Ok(instance) => {
                        let handle = ChartHandle::new(Arc::clone(&self.backend), instance);
                        self.charts.insert(kind, handle);
                    }
                    Err(err) => warn!(chart = kind.name(), error = %err, "failed to build chart"),
                }
            }
        }
        self.backend.commit();
        debug!(live = self.charts.len(), "charts rebuilt");
        self.charts.len()
    }

    pub fn release_all(&mut self) {
        self.charts.clear();
        self.backend.commit();
    }

    pub fn active(&self) -> usize {
        self.charts.len()
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RenderedChart {
    pub id: u64,
    pub kind: ChartKind,
    pub element: String,
    pub config: Value,
}

/// In-memory backend: keeps the chart configs the page should currently draw.
#[derive(Default)]
pub struct ChartCanvas {
    next_id: AtomicU64,
    live: Mutex<BTreeMap<u64, RenderedChart>>,
    published: Mutex<Arc<Vec<RenderedChart>>>,
}

impl ChartCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Charts as of the last commit, in dashboard order.
    pub fn charts(&self) -> Arc<Vec<RenderedChart>> {
        Arc::clone(&self.published.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn live_count(&self) -> usize {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl ChartBackend for ChartCanvas {
    type Instance = u64;

    fn create(&self, kind: ChartKind, dataset: &ChartDataset) -> Result<u64> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let chart = RenderedChart {
            id,
            kind,
            element: kind.element_id(),
            config: chart_config(kind, dataset),
        };
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, chart);
        Ok(id)
    }

    fn destroy(&self, instance: u64) {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&instance);
    }

    fn commit(&self) {
        let mut charts: Vec<RenderedChart> = self
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        charts.sort_by_key(|chart| chart.kind);
        *self.published.lock().unwrap_or_else(PoisonError::into_inner) = Arc::new(charts);
    }
}

/// Chart.js configuration for one dataset.
pub fn chart_config(kind: ChartKind, dataset: &ChartDataset) -> Value {
    let (labels, data) = match dataset {
        ChartDataset::Series(series) => (json!(series.labels), json!(series.values)),
        ChartDataset::Points(points) => (Value::Null, json!(points)),
    };

    match kind {
        ChartKind::Final => json!({
            "type": "bar",
            "data": {
                "labels": labels,
                "datasets": [{
                    "label": "Students",
                    "data": data,
                    "backgroundColor": "#2563eb",
                    "borderRadius": 6
                }]
            },
            "options": { "responsive": true, "scales": { "y": { "beginAtZero": true } } }
        }),
        ChartKind::Gender => json!({
            "type": "doughnut",
            "data": {
                "labels": labels,
                "datasets": [{ "data": data, "backgroundColor": ["#3b82f6", "#ec4899"] }]
            },
            "options": { "responsive": true }
        }),
        ChartKind::Study => json!({
            "type": "bar",
            "data": {
                "labels": labels,
                "datasets": [{ "label": "Avg G3", "data": data, "backgroundColor": "#06b6d4" }]
            },
            "options": { "responsive": true, "indexAxis": "y" }
        }),
        ChartKind::Failures => json!({
            "type": "pie",
            "data": {
                "labels": labels,
                "datasets": [{
                    "data": data,
                    "backgroundColor": ["#ef4444", "#f59e0b", "#10b981", "#3b82f6"]
                }]
            },
            "options": { "responsive": true }
        }),
        ChartKind::Progression => json!({
            "type": "line",
            "data": {
                "labels": labels,
                "datasets": [{
                    "label": "Average grade",
                    "data": data,
                    "borderColor": "#2563eb",
                    "backgroundColor": "rgba(37,99,235,0.2)",
                    "tension": 0.3
                }]
            },
            "options": {
                "responsive": true,
                "scales": { "y": { "beginAtZero": true, "max": 20 } }
            }
        }),
        ChartKind::Absence => json!({
            "type": "scatter",
            "data": {
                "datasets": [{ "label": "Student", "data": data, "backgroundColor": "#06b6d4" }]
            },
            "options": {
                "responsive": true,
                "scales": {
                    "x": { "title": { "display": true, "text": "Absences" } },
                    "y": {
                        "title": { "display": true, "text": "G3" },
                        "beginAtZero": true,
                        "max": 20
                    }
                }
            }
        }),
    }
}
