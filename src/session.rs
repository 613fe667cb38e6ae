use crate::{
    assets::AssetSource, controller::WorkflowController, inference::InferenceClient,
    preview::PreviewRegistry,
};
use parking_lot::{Mutex, RwLock};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{
    sync::broadcast::Receiver,
    time::{self, Instant, MissedTickBehavior},
};
use uuid::Uuid;

struct Session {
    controller: Arc<WorkflowController>,
    last_access: Mutex<Instant>,
}

impl Session {
    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*self.last_access.lock())
    }
}

/// One [`WorkflowController`] per browser session.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
    inference: Arc<dyn InferenceClient>,
    assets: Arc<dyn AssetSource>,
    previews: PreviewRegistry,
}

impl SessionStore {
    pub fn new(
        inference: Arc<dyn InferenceClient>,
        assets: Arc<dyn AssetSource>,
        previews: PreviewRegistry,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            inference,
            assets,
            previews,
        }
    }

    pub fn create(&self) -> (Uuid, Arc<WorkflowController>) {
        let id = Uuid::new_v4();
        let controller = Arc::new(WorkflowController::new(
            self.inference.clone(),
            self.assets.clone(),
            self.previews.clone(),
        ));
        self.sessions.write().insert(
            id,
            Session {
                controller: controller.clone(),
                last_access: Mutex::new(Instant::now()),
            },
        );
        tracing::info!("Session {} created", id);

        (id, controller)
    }

    /// Looks a session up and marks it as used.
    pub fn get(&self, id: &Uuid) -> Option<Arc<WorkflowController>> {
        let sessions = self.sessions.read();
        let session = sessions.get(id)?;
        *session.last_access.lock() = Instant::now();
        Some(session.controller.clone())
    }

    /// Ends a session and releases its preview handle right away, even if a
    /// classification task still holds the controller.
    pub fn remove(&self, id: &Uuid) -> bool {
        let removed = self.sessions.write().remove(id);
        match removed {
            Some(session) => {
                session.controller.shutdown();
                tracing::info!("Session {} ended", id);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    pub fn shutdown_all(&self) {
        let sessions: Vec<_> = self.sessions.write().drain().collect();
        for (_, session) in &sessions {
            session.controller.shutdown();
        }
        tracing::info!("Closed {} sessions", sessions.len());
    }

    /// Ends every session that has not been looked up for `idle_timeout`.
    pub fn expire_idle(&self, idle_timeout: Duration) -> usize {
        let now = Instant::now();
        let mut expired = Vec::new();
        self.sessions.write().retain(|id, session| {
            if session.idle_for(now) >= idle_timeout {
                expired.push((*id, session.controller.clone()));
                false
            } else {
                true
            }
        });

        for (id, controller) in &expired {
            controller.shutdown();
            tracing::info!("Session {} expired", id);
        }
        expired.len()
    }
}

/// Sweeps idle sessions every `sweep_every` until shutdown.
pub async fn expire_idle_sessions(
    store: Arc<SessionStore>,
    idle_timeout: Duration,
    sweep_every: Duration,
    mut shutdown_rx: Receiver<()>,
) {
    let mut ticker = time::interval(sweep_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let expired = store.expire_idle(idle_timeout);
                if expired > 0 {
                    tracing::debug!("Expired {} idle sessions, {} remain", expired, store.len());
                }
            }
            _ = shutdown_rx.recv() => break,
        }
    }
}
