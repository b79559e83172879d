use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::charts::ChartBuilder;
use crate::client::RosterSource;
use crate::render::{ChartCanvas, ChartRegistry};
use crate::state::{DashboardSnapshot, DashboardState, RefreshOutcome};

/// Drives the fetch → aggregate → chart cycle and publishes each result.
///
/// The controller owns the dashboard state and the live charts. Each cycle awaits
/// its fetch before the next one starts, so the most recently completed fetch is
/// always the one on display.
pub struct RefreshController {
    source: RosterSource,
    builder: ChartBuilder,
    state: DashboardState,
    charts: ChartRegistry<ChartCanvas>,
    publisher: watch::Sender<Arc<DashboardSnapshot>>,
}

impl RefreshController {
    pub fn new(
        source: RosterSource,
        builder: ChartBuilder,
        canvas: Arc<ChartCanvas>,
        publisher: watch::Sender<Arc<DashboardSnapshot>>,
    ) -> Self {
        Self {
            source,
            builder,
            state: DashboardState::default(),
            charts: ChartRegistry::new(canvas),
            publisher,
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn live_charts(&self) -> usize {
        self.charts.active()
    }

    pub async fn refresh_once(&mut self) -> Arc<DashboardSnapshot> {
        let outcome = match self.source.fetch().await {
            Ok(records) => {
                info!(
                    students = records.len(),
                    source = %self.source.describe(),
                    "roster loaded"
                );
                RefreshOutcome::Loaded {
                    records,
                    at: Utc::now(),
                }
            }
            Err(err) => {
                warn!(
                    error = %err,
                    source = %self.source.describe(),
                    "roster refresh failed, keeping previous data"
                );
                RefreshOutcome::Failed {
                    error: err.to_string(),
                }
            }
        };
        let loaded = matches!(outcome, RefreshOutcome::Loaded { .. });

        self.state = std::mem::take(&mut self.state).apply(outcome);
        let snapshot = Arc::new(DashboardSnapshot::build(&self.state, &self.builder));
        if loaded {
            self.charts.rebuild(&snapshot.charts);
        }

        self.publisher.send_replace(Arc::clone(&snapshot));
        snapshot
    }

    /// Refreshes immediately, then every `period` until nobody is listening.
    pub async fn run(mut self, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            every_secs = period.as_secs(),
            source = %self.source.describe(),
            "refresh loop started"
        );

        loop {
            ticker.tick().await;
            if self.publisher.is_closed() {
                info!("no dashboard readers left, stopping refresh loop");
                self.charts.release_all();
                break;
            }
            self.refresh_once().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ERROR_INDICATOR;
    use std::path::PathBuf;

    fn roster_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "student_dashboard_refresh_{}_{}.csv",
            name,
            std::process::id()
        ))
    }

    type Fixture = (
        RefreshController,
        Arc<ChartCanvas>,
        watch::Receiver<Arc<DashboardSnapshot>>,
    );

    fn fixture(path: &PathBuf) -> Fixture {
        let canvas = Arc::new(ChartCanvas::new());
        let (tx, rx) = watch::channel(Arc::new(DashboardSnapshot::empty()));
        let controller = RefreshController::new(
            RosterSource::Csv(path.clone()),
            ChartBuilder::default(),
            Arc::clone(&canvas),
            tx,
        );
        (controller, canvas, rx)
    }

    #[tokio::test]
    async fn refresh_cycle_publishes_and_rebuilds() {
        let path = roster_path("cycle");
        std::fs::write(
            &path,
            "id,school,gender,age,study,failures,absences,g1,g2,g3\n\
             1,GP,F,18,2,0,6,5,6,6\n\
             2,GP,M,17,1,1,4,14,15,16\n",
        )
        .unwrap();
        let (mut controller, canvas, rx) = fixture(&path);

        let snapshot = controller.refresh_once().await;
        assert_eq!(snapshot.generation, 1);
        assert_eq!(snapshot.display.total, "2");
        assert_eq!(controller.live_charts(), 6);
        assert_eq!(canvas.live_count(), 6);
        assert_eq!(rx.borrow().generation, 1);

        // A failed fetch keeps the roster and the charts.
        std::fs::remove_file(&path).unwrap();
        let snapshot = controller.refresh_once().await;
        assert_eq!(snapshot.display.total, ERROR_INDICATOR);
        assert_eq!(snapshot.summary.total, 2);
        assert_eq!(canvas.live_count(), 6);
        assert!(controller.state().is_failed());

        // An empty roster clears every chart.
        std::fs::write(&path, "id,school,gender,age,study,failures,absences,g1,g2,g3\n").unwrap();
        let snapshot = controller.refresh_once().await;
        std::fs::remove_file(&path).ok();
        assert_eq!(snapshot.generation, 2);
        assert_eq!(snapshot.display.total, "0");
        assert!(snapshot.charts.is_empty());
        assert_eq!(canvas.live_count(), 0);
        assert!(!controller.state().is_failed());
    }

    #[tokio::test]
    async fn first_refresh_failure_shows_error() {
        let path = roster_path("missing");
        let (mut controller, canvas, _rx) = fixture(&path);
        let snapshot = controller.refresh_once().await;
        assert_eq!(snapshot.generation, 0);
        assert_eq!(snapshot.display.total, ERROR_INDICATOR);
        assert!(snapshot.error.is_some());
        assert_eq!(canvas.live_count(), 0);
    }

    #[tokio::test]
    async fn run_stops_when_readers_are_gone() {
        let path = roster_path("stop");
        std::fs::write(
            &path,
            "id,school,gender,age,study,failures,absences,g1,g2,g3\n1,GP,F,18,2,0,6,12,13,14\n",
        )
        .unwrap();
        let (mut controller, canvas, rx) = fixture(&path);
        controller.refresh_once().await;
        assert_eq!(canvas.charts().len(), 6);

        drop(rx);
        tokio::time::timeout(Duration::from_secs(5), controller.run(Duration::from_millis(10)))
            .await
            .expect("refresh loop should stop once the receiver is dropped");
        std::fs::remove_file(&path).ok();
        assert_eq!(canvas.live_count(), 0);
        assert!(canvas.charts().is_empty());
    }

    #[tokio::test]
    async fn run_refreshes_on_every_tick() {
        let path = roster_path("ticks");
        std::fs::write(
            &path,
            "id,school,gender,age,study,failures,absences,g1,g2,g3\n\
             1,GP,F,18,2,0,6,12,13,14\n",
        )
        .unwrap();
        let (controller, canvas, mut rx) = fixture(&path);
        let refresher = tokio::spawn(controller.run(Duration::from_millis(20)));

        let reached = tokio::time::timeout(Duration::from_secs(5), async {
            while rx.borrow_and_update().generation < 3 {
                if rx.changed().await.is_err() {
                    break;
                }
            }
            rx.borrow().generation
        })
        .await;
        let published = canvas.charts().len();
        refresher.abort();
        std::fs::remove_file(&path).ok();

        assert!(reached.expect("refresh loop should keep ticking") >= 3);
        assert_eq!(published, 6);
    }
}
