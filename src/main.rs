//! Client pool demo.
//!
//! Builds a pool of simulated clients, installs the configured middleware
//! stack, drives concurrent calls through it and prints what happened.
//!
//! ```text
//! client-pool --strategy weighted_random --calls 200 --concurrency 8 \
//!     --failing node-b --fail-rate 0.05 --json
//! ```

use clap::Parser;
use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

use client_pool::config::{load_config, ClientConfig, ClientPoolConfig};
use client_pool::middleware::MetricsMiddleware;
use client_pool::observability::logging;
use client_pool::{
    install_middleware, BoxError, ClientPool, Context, HandleStatus, MetricsCollector, PoolError, Strategy,
};

#[derive(Parser)]
#[command(name = "client-pool")]
#[command(version, about = "Drive a pool of simulated clients through the load balancer", long_about = None)]
struct Cli {
    /// Config file path (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Selection strategy (round_robin, weighted_random, random); defaults to the pool's
    #[arg(long)]
    strategy: Option<Strategy>,

    /// Total number of calls
    #[arg(long, default_value = "30")]
    calls: u64,

    /// Number of concurrent workers
    #[arg(long, default_value = "4")]
    concurrency: usize,

    /// Client id that always fails (repeatable)
    #[arg(long)]
    failing: Vec<String>,

    /// Client id whose calls panic (repeatable)
    #[arg(long)]
    panic_client: Vec<String>,

    /// Random failure probability for every other client
    #[arg(long, default_value = "0.0")]
    fail_rate: f64,

    /// Simulated call latency in milliseconds
    #[arg(long, default_value = "5")]
    latency_ms: u64,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Print the Prometheus rendering of the call metrics
    #[arg(long)]
    metrics: bool,

    /// Log level (error, warn, info, debug, trace); overrides the config file
    #[arg(long)]
    log_level: Option<String>,
}

/// Stand-in for a real upstream client.
#[derive(Debug)]
struct SimulatedClient {
    id: String,
    failing: bool,
    panics: bool,
    fail_rate: f64,
    latency: Duration,
}

impl SimulatedClient {
    async fn call(&self, ctx: &Context) -> Result<(), BoxError> {
        if self.panics {
            panic!("simulated panic in {}", self.id);
        }

        tokio::select! {
            _ = tokio::time::sleep(self.latency) => {}
            _ = ctx.cancelled() => return Err(format!("{}: call cancelled", self.id).into()),
        }

        if self.failing || fastrand::f64() < self.fail_rate {
            return Err(format!("{}: simulated failure", self.id).into());
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Counters {
    succeeded: AtomicU64,
    failed: AtomicU64,
    no_available_client: AtomicU64,
}

#[derive(Debug, Serialize)]
struct Report {
    strategy: Strategy,
    calls: u64,
    succeeded: u64,
    failed: u64,
    no_available_client: u64,
    selections: BTreeMap<String, u64>,
    clients: Vec<HandleStatus>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientPoolConfig::default(),
    };

    let log_level = cli.log_level.as_deref().unwrap_or(&config.observability.log_level);
    logging::init(log_level);

    tracing::info!(
        max_fails = config.pool.max_fails,
        cooldown_ms = config.pool.cooldown_ms,
        default_strategy = %config.pool.default_strategy,
        "Configuration loaded"
    );

    let pool = Arc::new(ClientPool::from_settings(&config.pool));
    for client in clients_from(&config) {
        let simulated = SimulatedClient {
            failing: cli.failing.contains(&client.id),
            panics: cli.panic_client.contains(&client.id),
            fail_rate: cli.fail_rate,
            latency: Duration::from_millis(cli.latency_ms),
            id: client.id.clone(),
        };
        pool.add_client(simulated, client.id, client.weight);
    }

    let mut collector = install_middleware(&pool, &config.middleware);
    if cli.metrics && collector.is_none() {
        let created = Arc::new(MetricsCollector::new());
        pool.register_middleware(MetricsMiddleware::new(created.clone()));
        collector = Some(created);
    }

    let strategy = cli.strategy.unwrap_or(config.pool.default_strategy);
    let selections: Arc<DashMap<String, u64>> = Arc::new(DashMap::new());
    let counters = Arc::new(Counters::default());
    let issued = Arc::new(AtomicU64::new(0));

    let mut workers = JoinSet::new();
    for _ in 0..cli.concurrency.max(1) {
        let pool = pool.clone();
        let selections = selections.clone();
        let counters = counters.clone();
        let issued = issued.clone();
        let calls = cli.calls;

        workers.spawn(async move {
            let selections = &selections;
            while issued.fetch_add(1, Ordering::Relaxed) < calls {
                let ctx = Context::new().with_method("simulated_call");
                let result = pool
                    .execute_with(ctx, strategy, move |ctx, client: Arc<SimulatedClient>| async move {
                        *selections.entry(client.id.clone()).or_insert(0) += 1;
                        client.call(&ctx).await
                    })
                    .await;

                let counter = match &result {
                    Ok(()) => &counters.succeeded,
                    Err(PoolError::NoAvailableClient) => &counters.no_available_client,
                    Err(e) => {
                        tracing::debug!(error = %e, "Call failed");
                        &counters.failed
                    }
                };
                counter.fetch_add(1, Ordering::Relaxed);
            }
        });
    }

    while let Some(joined) = workers.join_next().await {
        joined?;
    }

    let report = Report {
        strategy,
        calls: cli.calls,
        succeeded: counters.succeeded.load(Ordering::Relaxed),
        failed: counters.failed.load(Ordering::Relaxed),
        no_available_client: counters.no_available_client.load(Ordering::Relaxed),
        selections: selections.iter().map(|e| (e.key().clone(), *e.value())).collect(),
        clients: pool.status(),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if cli.metrics {
        if let Some(collector) = collector {
            println!("\n{}", collector.render());
        }
    }

    Ok(())
}

fn clients_from(config: &ClientPoolConfig) -> Vec<ClientConfig> {
    if !config.clients.is_empty() {
        return config.clients.clone();
    }
    (1..=3)
        .map(|i| ClientConfig {
            id: format!("client-{i}"),
            weight: i,
        })
        .collect()
}

fn print_report(report: &Report) {
    println!("strategy:            {}", report.strategy);
    println!("calls:               {}", report.calls);
    println!("succeeded:           {}", report.succeeded);
    println!("failed:              {}", report.failed);
    println!("no available client: {}", report.no_available_client);
    println!();
    println!("{:<16} {:>8} {:>8} {:>10} {:>8}", "CLIENT", "WEIGHT", "CALLS", "FAILURES", "STATE");
    for client in &report.clients {
        let calls = report.selections.get(&client.id).copied().unwrap_or(0);
        let state = if client.tripped { "tripped" } else { "ok" };
        println!(
            "{:<16} {:>8} {:>8} {:>10} {:>8}",
            client.id, client.weight, calls, client.consecutive_failures, state
        );
    }
}
