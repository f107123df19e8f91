use crate::engine::stats::StatsHandle;
use crate::engine::transport::Transport;
use crate::engine::user::{self, UserProfile};
use crate::error::EngineError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Run-wide knobs. Owned by the orchestrator, consumed read-only here.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// User instances brought online per second, per profile.
    pub spawn_rate: f64,
    /// Time bound after which the run cancels itself; `None` runs until
    /// an explicit `stop`.
    pub duration: Option<Duration>,
    /// How long `stop` waits for users before abandoning them.
    pub grace_timeout: Duration,
}

/// A validated profile paired with the transport its users execute
/// against. The transport carries the profile's default headers.
pub struct ProfileRuntime {
    pub profile: Arc<UserProfile>,
    pub transport: Arc<dyn Transport>,
}

/// Outcome of a stop sequence. `abandoned` users were still running when
/// the grace timeout elapsed and were forcibly aborted; any action they
/// had in flight is lost. That window is the documented data-loss bound,
/// surfaced as a warning rather than an error.
#[derive(Debug, Clone, Copy)]
pub struct StopReport {
    pub stopped: usize,
    pub abandoned: usize,
}

pub struct Population;

impl Population {
    /// Spawns one ramp-up task per profile. All profiles ramp
    /// concurrently, each bringing users online at `spawn_rate` per
    /// second until its target count is reached or the run is cancelled.
    pub fn start(
        run: RunConfig,
        profiles: Vec<ProfileRuntime>,
        stats: StatsHandle,
    ) -> Result<PopulationHandle, EngineError> {
        if !run.spawn_rate.is_finite() || run.spawn_rate <= 0.0 {
            return Err(EngineError::Configuration(format!(
                "spawn_rate must be positive, got {}",
                run.spawn_rate
            )));
        }
        if profiles.is_empty() {
            return Err(EngineError::Configuration(
                "no profiles configured".to_string(),
            ));
        }

        let spawn_interval = Duration::from_secs_f64(1.0 / run.spawn_rate);
        let token = CancellationToken::new();
        let active = Arc::new(AtomicUsize::new(0));
        let spawned = Arc::new(AtomicUsize::new(0));

        let mut rampers = JoinSet::new();
        for runtime in profiles {
            rampers.spawn(ramp_profile(
                runtime,
                spawn_interval,
                token.clone(),
                stats.clone(),
                active.clone(),
                spawned.clone(),
            ));
        }

        if let Some(duration) = run.duration {
            let timer_token = token.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = sleep(duration) => {
                        info!(duration_secs = duration.as_secs_f64(), "Run duration elapsed");
                        timer_token.cancel();
                    }
                    _ = timer_token.cancelled() => {}
                }
            });
        }

        Ok(PopulationHandle {
            token,
            rampers,
            active,
            spawned,
            grace_timeout: run.grace_timeout,
        })
    }
}

async fn ramp_profile(
    runtime: ProfileRuntime,
    spawn_interval: Duration,
    stop: CancellationToken,
    stats: StatsHandle,
    active: Arc<AtomicUsize>,
    spawned: Arc<AtomicUsize>,
) {
    let target = runtime.profile.target_users;
    info!(profile = %runtime.profile.name, target, "Ramp-up starting");

    let mut users = JoinSet::new();
    for i in 0..target {
        if stop.is_cancelled() {
            break;
        }
        users.spawn(user::run_user(
            runtime.profile.clone(),
            runtime.transport.clone(),
            stats.clone(),
            active.clone(),
            stop.clone(),
        ));
        spawned.fetch_add(1, Ordering::SeqCst);

        if i + 1 < target {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = sleep(spawn_interval) => {}
            }
        }
    }
    info!(profile = %runtime.profile.name, running = users.len(), "Ramp-up finished");

    // Hold the users until they all exit. If this task is aborted during
    // the stop grace sequence, dropping the JoinSet aborts the users too.
    while users.join_next().await.is_some() {}
}

pub struct PopulationHandle {
    token: CancellationToken,
    rampers: JoinSet<()>,
    active: Arc<AtomicUsize>,
    spawned: Arc<AtomicUsize>,
    grace_timeout: Duration,
}

impl PopulationHandle {
    /// Users currently in their Acting/Waiting loop.
    pub fn active_users(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Total users brought online so far, across all profiles.
    pub fn spawned_users(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }

    /// Resolves when the run has been cancelled, either by the duration
    /// bound or an earlier `stop`.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Broadcasts the stop signal and waits for every user to exit its
    /// loop, up to the grace timeout. Users still running after the
    /// grace period are aborted and counted in the report.
    pub async fn stop(mut self) -> StopReport {
        self.token.cancel();

        let deadline = tokio::time::Instant::now() + self.grace_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            match tokio::time::timeout(remaining, self.rampers.join_next()).await {
                Ok(Some(_)) => continue,
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        grace_secs = self.grace_timeout.as_secs_f64(),
                        "Grace timeout elapsed before all users stopped"
                    );
                    break;
                }
            }
        }

        let abandoned = self.active.load(Ordering::SeqCst);
        self.rampers.abort_all();
        while self.rampers.join_next().await.is_some() {}

        let spawned = self.spawned.load(Ordering::SeqCst);
        if abandoned > 0 {
            warn!(
                abandoned,
                "Abandoned users with in-flight actions; their last outcome is lost"
            );
        }
        StopReport {
            stopped: spawned.saturating_sub(abandoned),
            abandoned,
        }
    }
}
