//! # Indexer Runtime
//!
//! Builds every subsystem against the node and the database, then runs the
//! background tasks until shutdown.
//!
//! ## Startup Sequence
//!
//! 1. Open the index database
//! 2. Resolve the chain identity from the node
//! 3. Discover processors from the node's module metadata
//! 4. Check the node exposes every endpoint the indexer calls
//! 5. Spawn the synchronizer, retry worker, pending refresher, node
//!    subscription and metrics recorder

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use indexer_telemetry::CHANNEL_RESOLUTIONS;
use ix_02_index_store::KeyValueStore;
use ix_03_account_index::{AccountIndex, AccountIndexApi, RetryWorker, SystemTimeSource};
use ix_04_block_indexing::{BlockIndexingApi, BlockIndexingEngine, ProcessorRegistry};
use ix_05_pending_transactions::{
    PendingError, PendingQuery, PendingRefresher, PendingTransaction, PendingTransactionMirror,
};
use ix_06_chain_resolver::{
    ChainContext, ChainResolverError, ChannelResolver, MainchainServiceClient, ResolvedChannel,
};
use shared_bus::{EventFilter, EventPublisher, EventTopic, HaltNotice, InMemoryEventBus};
use shared_types::{ChainId, Page};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::adapters::{NodeEventSubscriber, NodeRpcClient, RocksDbConfig, RocksDbStore};
use crate::config::IndexerConfig;
use crate::metrics::MetricsRecorder;
use crate::sync::{BlockSynchronizer, SyncSettings};

/// How long shutdown waits for each task.
const TASK_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct IndexerRuntime {
    config: IndexerConfig,
    bus: Arc<InMemoryEventBus>,
    node: Arc<NodeRpcClient>,
    context: Arc<ChainContext>,
    accounts: Arc<AccountIndex>,
    engine: Arc<BlockIndexingEngine>,
    mirror: Arc<PendingTransactionMirror>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl IndexerRuntime {
    /// Connect to the node and build every subsystem.
    pub async fn bootstrap(config: IndexerConfig) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(
            RocksDbStore::open(RocksDbConfig {
                path: config.storage.data_dir.clone(),
                block_cache_size: config.storage.block_cache_size,
                sync_writes: config.storage.sync_writes,
                ..RocksDbConfig::default()
            })
            .with_context(|| format!("Failed to open index at {:?}", config.storage.data_dir))?,
        );

        let node = Arc::new(
            NodeRpcClient::new(config.node.rpc_url.clone(), config.rpc_timeout())
                .context("Failed to build node RPC client")?,
        );

        let context = Arc::new(ChainContext::new());
        let chain_id = context
            .resolve(node.as_ref())
            .await
            .context("Failed to resolve chain identity")?;
        info!(chain_id = %chain_id, mainchain = chain_id.is_mainchain(), "Chain identity resolved");

        let metadata = node
            .metadata()
            .await
            .context("Failed to read node metadata")?;
        let (registry, report) = ProcessorRegistry::discover(&metadata);
        if !report.unsupported.is_empty() {
            warn!(
                commands = ?report.unsupported,
                "Blocks carrying these commands will halt indexing"
            );
        }

        match node.check_registered_actions().await {
            Ok(missing) if missing.is_empty() => info!("Node exposes every required endpoint"),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Could not list node endpoints"),
        }

        let accounts = Arc::new(AccountIndex::new(store.clone(), Arc::new(SystemTimeSource)));
        let engine = Arc::new(BlockIndexingEngine::new(
            store,
            Arc::new(registry),
            accounts.clone(),
        ));
        let mirror = Arc::new(PendingTransactionMirror::new(
            node.clone(),
            accounts.clone(),
            context.clone(),
            config.rpc_timeout(),
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            bus: Arc::new(InMemoryEventBus::with_capacity(
                config.workers.event_channel_capacity,
            )),
            config,
            node,
            context,
            accounts,
            engine,
            mirror,
            shutdown_tx,
            shutdown_rx,
            tasks: Vec::new(),
        })
    }

    /// Spawn every background task.
    pub fn start(&mut self) -> Result<()> {
        match self.engine.last_indexed_height() {
            Ok(Some(height)) => info!(block_height = height, "Resuming from indexed height"),
            Ok(None) => info!(start_height = self.config.workers.start_height, "Empty index"),
            Err(e) => return Err(e).context("Failed to read indexed height"),
        }

        let synchronizer = BlockSynchronizer::new(
            self.node.clone(),
            self.engine.clone(),
            self.bus.clone(),
            SyncSettings {
                start_height: self.config.workers.start_height,
                fetch_retries: self.config.node.fetch_retries,
                fetch_backoff: self.config.fetch_backoff(),
                poll_interval: self.config.sync_poll_interval(),
            },
        );
        let node_events = self.bus.subscribe(EventFilter::topics(vec![EventTopic::Node]));
        self.spawn("block-synchronizer", synchronizer.run(node_events, self.shutdown_rx.clone()));

        let retry = RetryWorker::new(self.accounts.clone(), self.config.retry_interval());
        self.spawn("retry-worker", retry.run(self.shutdown_rx.clone()));

        let refresher = PendingRefresher::new(
            self.mirror.clone(),
            self.bus.clone(),
            self.config.pending_refresh_interval(),
        );
        let triggers = self
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::Node, EventTopic::Indexing]));
        self.spawn("pending-refresher", refresher.run(triggers, self.shutdown_rx.clone()));

        let recorder = MetricsRecorder::new(self.accounts.clone(), self.config.retry_interval());
        let all_events = self.bus.subscribe(EventFilter::all());
        self.spawn("metrics-recorder", recorder.run(all_events, self.shutdown_rx.clone()));

        // Subscribe last so no relayed event precedes its consumers.
        let subscriber =
            NodeEventSubscriber::new(self.config.node.ws_url.clone(), self.bus.clone());
        self.spawn("node-subscription", subscriber.run(self.shutdown_rx.clone()));

        info!(
            tasks = self.tasks.len(),
            block_subscribers = self.bus.subscribers_on(EventTopic::Indexing),
            "Indexer running"
        );
        Ok(())
    }

    /// Resolves once indexing halts. Returns immediately if it already has.
    pub async fn wait_for_halt(&self) -> HaltNotice {
        let mut halt = self.bus.watch_halt();
        loop {
            if let Some(notice) = halt.borrow_and_update().clone() {
                return notice;
            }
            if halt.changed().await.is_err() {
                // Bus dropped: no halt can follow.
                std::future::pending::<()>().await;
            }
        }
    }

    fn spawn<F>(&mut self, name: &'static str, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.tasks.push((name, tokio::spawn(task)));
    }

    /// Signal every task and wait for them to stop.
    pub async fn shutdown(self) {
        info!(
            events_published = self.bus.events_published(),
            "Initiating graceful shutdown..."
        );
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
        for (name, handle) in self.tasks {
            match tokio::time::timeout(TASK_SHUTDOWN_TIMEOUT, handle).await {
                Ok(Ok(())) => info!(task = name, "Task stopped"),
                Ok(Err(e)) => error!(task = name, error = %e, "Task panicked"),
                Err(_) => warn!(task = name, "Task did not stop in time"),
            }
        }
    }

    pub fn chain_id(&self) -> Result<ChainId, ChainResolverError> {
        self.context.chain_id()
    }

    pub fn is_mainchain(&self) -> Result<bool, ChainResolverError> {
        self.context.is_mainchain()
    }

    pub fn accounts(&self) -> Arc<dyn AccountIndexApi> {
        self.accounts.clone()
    }

    pub fn engine(&self) -> Arc<dyn BlockIndexingApi> {
        self.engine.clone()
    }

    /// Refresh the pending mirror once and query it.
    pub async fn query_pending(
        &self,
        query: &PendingQuery,
    ) -> Result<Page<PendingTransaction>, PendingError> {
        self.mirror.refresh().await;
        self.mirror.query(query)
    }

    /// Channel resolver wired to the local node and this network's mainchain service.
    pub fn channel_resolver(&self) -> Result<ChannelResolver, ChainResolverError> {
        let chain_id = self.context.chain_id()?;
        let mainchain = MainchainServiceClient::for_network(
            &chain_id,
            self.config.chain.mainchain_service_url.as_deref(),
            self.config.rpc_timeout(),
        )?;
        info!(service = mainchain.base_url(), "Mainchain service selected");
        Ok(ChannelResolver::new(
            self.context.clone(),
            self.node.clone(),
            Arc::new(mainchain),
        ))
    }

    /// Resolve one channel, counting the outcome by route.
    pub async fn resolve_channel(
        &self,
        target: &ChainId,
    ) -> Result<ResolvedChannel, ChainResolverError> {
        let result = self.channel_resolver()?.resolve_channel(target).await;
        let (route, outcome) = match &result {
            Ok(resolved) => (resolved.route.as_str(), "ok"),
            Err(e) if e.is_usage() => ("none", "rejected"),
            Err(_) => ("unknown", "error"),
        };
        CHANNEL_RESOLUTIONS.with_label_values(&[route, outcome]).inc();
        result
    }
}
