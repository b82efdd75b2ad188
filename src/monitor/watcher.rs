use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use log::{info, error, debug};
use tokio::signal;
use tokio::sync::Notify;
use tokio::time::{interval, MissedTickBehavior};

use crate::config::WatchedAccount;
use crate::error::Result;
use crate::logging::{ErrorLogger, LogContext, MetricsLogger};
use crate::monitor::checker::AccountChecker;
use crate::state::{AccountState, StateStore};

/// Outcome of one pass over the watched accounts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub accounts: usize,
    pub failures: usize,
}

/// Polls every watched account on a fixed interval and keeps their state on disk
pub struct Watcher {
    checker: AccountChecker,
    store: StateStore,
    accounts: Vec<WatchedAccount>,
    poll_interval_seconds: u64,
    pub shutdown_signal: Arc<AtomicBool>,
    shutdown_notify: Arc<Notify>,
}

impl Watcher {
    pub fn new(
        checker: AccountChecker,
        store: StateStore,
        accounts: Vec<WatchedAccount>,
        poll_interval_seconds: u64,
    ) -> Self {
        Self {
            checker,
            store,
            accounts,
            poll_interval_seconds,
            shutdown_signal: Arc::new(AtomicBool::new(false)),
            shutdown_notify: Arc::new(Notify::new()),
        }
    }

    /// Poll until Ctrl-C is received
    pub async fn start(&self) -> Result<()> {
        info!(
            "Watching {} accounts every {} seconds",
            self.accounts.len(),
            self.poll_interval_seconds
        );

        let shutdown_signal = Arc::clone(&self.shutdown_signal);
        let shutdown_notify = Arc::clone(&self.shutdown_notify);
        let listener = tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received shutdown signal");
                    shutdown_signal.store(true, Ordering::Relaxed);
                    shutdown_notify.notify_one();
                }
                Err(err) => {
                    error!("Unable to listen for shutdown signal: {}", err);
                }
            }
        });

        let result = self.poll_until_shutdown().await;
        listener.abort();
        result
    }

    async fn poll_until_shutdown(&self) -> Result<()> {
        let mut interval = interval(Duration::from_secs(self.poll_interval_seconds));
        // A slow poll pushes the next one back instead of triggering catch-up polls
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if self.shutdown_signal.load(Ordering::Relaxed) {
                info!("Shutdown signal received, stopping watcher");
                return Ok(());
            }

            tokio::select! {
                _ = interval.tick() => {}
                _ = self.shutdown_notify.notified() => {
                    info!("Shutdown signal received, stopping watcher");
                    return Ok(());
                }
            }

            self.run_once().await?;
        }
    }

    /// Check every watched account once.
    ///
    /// A failing check is logged and leaves that part of the account's state as
    /// it was; only state file errors end the pass early.
    pub async fn run_once(&self) -> Result<PollSummary> {
        let started = Instant::now();
        let mut state = self.store.load()?;
        let mut summary = PollSummary::default();

        for watched in &self.accounts {
            if self.shutdown_signal.load(Ordering::Relaxed) {
                info!("Shutdown signal received during poll");
                break;
            }

            let previous = state.account(&watched.account);
            let (next, failures) = self.check_account(watched, previous).await;

            summary.accounts += 1;
            if failures > 0 {
                summary.failures += 1;
            }

            state.update(&watched.account, next);
            self.store.save(&state)?;
        }

        MetricsLogger::log_poll_cycle(
            summary.accounts,
            summary.failures,
            started.elapsed().as_millis() as u64,
        );
        Ok(summary)
    }

    async fn check_account(&self, watched: &WatchedAccount, previous: AccountState) -> (AccountState, usize) {
        let mut next = previous.clone();
        let mut failures = 0;

        match self
            .checker
            .check_account_for_new_transactions(
                &watched.account,
                previous.last_known_hash.as_deref(),
                &watched.emails,
            )
            .await
        {
            Ok(hash) => next.last_known_hash = hash,
            Err(e) => {
                failures += 1;
                let context = LogContext::new("watcher", "transactions").with_account(&watched.account);
                ErrorLogger::log_error(&e, Some(context));
            }
        }

        match self
            .checker
            .check_account_for_new_pending(&watched.account, &previous.last_known_pending, &watched.emails)
            .await
        {
            Ok(pending) => next.last_known_pending = pending,
            Err(e) => {
                failures += 1;
                let context = LogContext::new("watcher", "pending").with_account(&watched.account);
                ErrorLogger::log_error(&e, Some(context));
            }
        }

        debug!("Finished checking {} with {} failures", watched.account, failures);
        (next, failures)
    }

    /// Request graceful shutdown; a waiting [`Watcher::start`] returns right away
    pub fn shutdown(&self) {
        info!("Requesting graceful shutdown");
        self.shutdown_signal.store(true, Ordering::Relaxed);
        self.shutdown_notify.notify_one();
    }
}
