//! Async handle over a [`PlannerService`]
//!
//! Path computations run on tokio's blocking pool and report back through an
//! event channel instead of blocking the caller. Penalty changes take the
//! write lock, so they never overlap a running computation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use qroute_core::{NodeId, PenaltyArea, Result, RouteError};

use crate::service::{PlannedRoute, PlannerService};

/// Completion notice of a path request
#[derive(Debug)]
pub enum PlanEvent {
    PathCalculated(PlannedRoute),
    CalculationFailed {
        start: NodeId,
        end: NodeId,
        error: RouteError,
    },
}

/// Cloneable async front-end; clones share one service and one event stream
#[derive(Clone)]
pub struct PlannerHandle {
    service: Arc<RwLock<PlannerService>>,
    events: mpsc::UnboundedSender<PlanEvent>,
    busy: Arc<AtomicBool>,
}

impl PlannerHandle {
    /// Wrap `service`; the receiver gets one event per accepted request
    pub fn new(service: PlannerService) -> (Self, mpsc::UnboundedReceiver<PlanEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let handle = Self {
            service: Arc::new(RwLock::new(service)),
            events,
            busy: Arc::new(AtomicBool::new(false)),
        };
        (handle, receiver)
    }

    /// Start computing a path from `start` to `end` in the background.
    ///
    /// Fails immediately with [`RouteError::PlanningFailure`] while another
    /// request is in flight. The outcome, success or failure, arrives as a
    /// [`PlanEvent`]; the returned handle resolves after it was sent.
    pub async fn request_path(&self, start: NodeId, end: NodeId) -> Result<JoinHandle<()>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(RouteError::PlanningFailure(
                "computation already in progress".to_string(),
            ));
        }
        // Clears the flag even if this future is dropped while waiting for the lock
        let busy = BusyGuard(Arc::clone(&self.busy));

        info!("Path requested: {} -> {}", start, end);
        let service = Arc::clone(&self.service).read_owned().await;
        let events = self.events.clone();

        Ok(tokio::spawn(async move {
            let result =
                tokio::task::spawn_blocking(move || service.compute_route(start, end)).await;

            let event = match result {
                Ok(Ok(route)) => PlanEvent::PathCalculated(route),
                Ok(Err(error)) => {
                    error!("Path calculation {} -> {} failed: {}", start, end, error);
                    PlanEvent::CalculationFailed { start, end, error }
                }
                Err(join_error) => {
                    error!("Path worker {} -> {} aborted: {}", start, end, join_error);
                    PlanEvent::CalculationFailed {
                        start,
                        end,
                        error: RouteError::PlanningFailure(join_error.to_string()),
                    }
                }
            };

            drop(busy);
            if events.send(event).is_err() {
                debug!("No subscriber for path {} -> {}", start, end);
            }
        }))
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub async fn apply_penalty_area(&self, area: PenaltyArea) -> Result<usize> {
        self.service.write().await.apply_penalty_area(&area)
    }

    pub async fn reset_penalty(&self) -> usize {
        self.service.write().await.reset_penalty()
    }

    pub async fn find_nearest_facility(
        &self,
        from: NodeId,
        facilities: &[NodeId],
    ) -> Result<NodeId> {
        self.service.read().await.find_nearest_facility(from, facilities)
    }

    /// Shared service, for synchronous reads such as coordinates
    pub fn service(&self) -> Arc<RwLock<PlannerService>> {
        Arc::clone(&self.service)
    }
}

/// Marks the handle idle again when dropped
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
