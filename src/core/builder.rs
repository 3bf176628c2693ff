use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use tracing::info;

use crate::{
    alert::{AlertDispatcher, AlertGate, AlertSink, WebhookTransport},
    core::{Config, EagerPool, NamedThreadFactory, ThreadFactory, pool::Shared},
    error::ConfigError,
    policies::{RejectionInterceptor, RejectionStrategy, default_strategy},
};

/// Builder for constructing an [`EagerPool`] with optional collaborators.
pub struct PoolBuilder {
    cfg: Config,
    strategy: Option<Arc<dyn RejectionStrategy>>,
    factory: Option<Arc<dyn ThreadFactory>>,
    alert_sink: Option<Arc<dyn AlertSink>>,
    rejected: Option<Arc<AtomicU64>>,
}

impl PoolBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            strategy: None,
            factory: None,
            alert_sink: None,
            rejected: None,
        }
    }

    /// Sets the rejection strategy. Defaults to
    /// [`AbortPolicy`](crate::policies::AbortPolicy).
    pub fn with_rejection_strategy(mut self, strategy: Arc<dyn RejectionStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Sets the worker thread factory. Defaults to [`NamedThreadFactory`].
    pub fn with_thread_factory(mut self, factory: Arc<dyn ThreadFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Replaces the webhook dispatcher with a custom alert sink.
    ///
    /// With a custom sink, `alert.webhook_url` is not required.
    pub fn with_alert_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.alert_sink = Some(sink);
        self
    }

    /// Counts rejections into `counter`, which may be shared between pools.
    pub fn with_rejected_counter(mut self, counter: Arc<AtomicU64>) -> Self {
        self.rejected = Some(counter);
        self
    }

    /// Validates the configuration and starts the pool.
    ///
    /// Starts the alert sender thread when a webhook is configured and, with
    /// `prestart_all_core_threads`, every core worker.
    pub fn build(self) -> Result<EagerPool, ConfigError> {
        self.cfg.validate()?;
        let name = self.cfg.pool_name();

        let sink = match self.alert_sink {
            Some(sink) => Some(sink),
            None => webhook_sink(&name, &self.cfg)?,
        };
        let gate = AlertGate::new(&name, &self.cfg.alert, sink);
        let interceptor = RejectionInterceptor::new(
            self.strategy.unwrap_or_else(default_strategy),
            self.rejected.unwrap_or_default(),
            gate,
        );
        let factory: Arc<dyn ThreadFactory> = match self.factory {
            Some(factory) => factory,
            None => Arc::new(NamedThreadFactory::new(&name)),
        };

        let shared = Arc::new(Shared::new(&self.cfg, name, interceptor, factory));
        let pool = EagerPool::from_shared(shared);

        if self.cfg.prestart_all_core_threads {
            let started = pool.prestart_all_core_threads();
            if started < pool.core_size() {
                pool.shutdown_now();
                return Err(ConfigError::ThreadSpawn(format!(
                    "started {started} of {} core workers",
                    pool.core_size()
                )));
            }
        }

        info!(
            pool = %pool.name(),
            core = pool.core_size(),
            max = pool.max_size(),
            queue = self.cfg.queue_capacity,
            alerts = pool.is_alert_enabled(),
            "pool started"
        );
        Ok(pool)
    }
}

fn webhook_sink(pool: &str, cfg: &Config) -> Result<Option<Arc<dyn AlertSink>>, ConfigError> {
    let alert = &cfg.alert;
    if !alert.has_webhook() {
        if alert.enabled {
            return Err(ConfigError::MissingWebhookUrl);
        }
        return Ok(None);
    }

    let transport = WebhookTransport::new(alert.webhook_url.trim())
        .map_err(|e| ConfigError::AlertSink(e.to_string()))?;
    let dispatcher =
        AlertDispatcher::spawn(pool, Arc::new(transport), AlertDispatcher::DEFAULT_CAPACITY)
            .map_err(|e| ConfigError::AlertSink(e.to_string()))?;
    let sink: Arc<dyn AlertSink> = Arc::new(dispatcher);
    Ok(Some(sink))
}
