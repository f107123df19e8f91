use crate::engine::pacing::Pacing;
use crate::engine::selector::{self, ActionSpec};
use crate::engine::stats::{OutcomeRecord, StatsHandle};
use crate::engine::transport::{self, Transport};
use crate::error::EngineError;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use stampede_common::ProfileConfig;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Immutable behavior description for one class of virtual users.
/// Built once from configuration, validated, then shared read-only by
/// every user instance spawned from it.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub name: String,
    pub actions: Vec<ActionSpec>,
    pub pacing: Pacing,
    pub default_headers: HashMap<String, String>,
    pub target_users: usize,
}

impl UserProfile {
    /// Validates and freezes a profile. All `ConfigurationError`s a
    /// profile can cause surface here, before any user spawns.
    pub fn from_config(config: &ProfileConfig) -> Result<Self, EngineError> {
        if config.actions.is_empty() {
            return Err(EngineError::Configuration(format!(
                "profile '{}' has no actions",
                config.name
            )));
        }

        let mut actions = Vec::with_capacity(config.actions.len());
        for action in &config.actions {
            if action.weight == 0 {
                return Err(EngineError::Configuration(format!(
                    "action '{}' in profile '{}' has weight 0",
                    action.name, config.name
                )));
            }
            transport::validate_method(&action.method)?;
            actions.push(ActionSpec {
                name: action.name.clone(),
                method: action.method.clone(),
                path: action.path.clone(),
                weight: action.weight,
            });
        }

        Ok(Self {
            name: config.name.clone(),
            actions,
            pacing: Pacing::new(config.wait_min_secs, config.wait_max_secs)?,
            default_headers: config.headers.clone(),
            target_users: config.users,
        })
    }
}

struct ActiveUserGuard {
    counter: Arc<AtomicUsize>,
}

impl ActiveUserGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        crate::metrics::ACTIVE_USERS.inc();
        Self { counter }
    }
}

impl Drop for ActiveUserGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
        crate::metrics::ACTIVE_USERS.dec();
    }
}

/// Drives one simulated user until the stop token fires.
///
/// The loop is the Acting/Waiting cycle: select an action, execute it,
/// hand the outcome to the collector, wait out the pacing delay. The
/// token is checked before each action and interrupts the wait, so a
/// user never starts a new action after cancellation; an action already
/// in flight runs to completion.
///
/// A failed request is still a completed action. The user records it
/// with `succeeded: false` and moves on, keeping the offered load steady
/// no matter how unhealthy the target is.
pub async fn run_user(
    profile: Arc<UserProfile>,
    transport: Arc<dyn Transport>,
    stats: StatsHandle,
    active: Arc<AtomicUsize>,
    stop: CancellationToken,
) {
    let mut rng = SmallRng::from_entropy();
    let _guard = ActiveUserGuard::new(active);
    debug!(profile = %profile.name, "User starting");

    loop {
        if stop.is_cancelled() {
            break;
        }

        // Profiles are validated at startup, so selection cannot fail here.
        let action = match selector::select(&profile.actions, &mut rng) {
            Ok(action) => action,
            Err(_) => break,
        };

        let started_at = SystemTime::now();
        let result = transport.execute(&action.method, &action.path).await;
        let succeeded = result.error.is_none() && result.status.map_or(false, |s| s < 400);
        stats.record(OutcomeRecord {
            action_name: action.name.clone(),
            started_at,
            duration: result.duration,
            succeeded,
            status_code: result.status,
        });

        let delay = profile.pacing.next_delay(&mut rng);
        tokio::select! {
            _ = stop.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    debug!(profile = %profile.name, "User stopped");
}
