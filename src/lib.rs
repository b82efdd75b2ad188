pub mod node;
pub mod monitor;
pub mod models;
pub mod notify;
pub mod state;
pub mod error;
pub mod logging;
pub mod config;

pub use node::{NodeClient, NodeRpc};
pub use error::{NotifierError, Result};
pub use monitor::{AccountChecker, Watcher};
pub use notify::{Notifier, RelayMailer};
pub use logging::{LogContext, PerformanceMonitor, ErrorLogger, MetricsLogger};
pub use config::{AppConfig, NodeConfig, EmailConfig, WatcherConfig, LoggingConfig, WatchedAccount};
