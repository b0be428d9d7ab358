//! # Chain Identity and Channel Routing
//!
//! The chain id is read once from the node and drives mainchain detection,
//! the choice of mainchain service and where channel lookups are answered.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ix_06_chain_resolver::{
    ChainContext, ChainResolverError, ChannelInfo, ChannelResolver, ChannelRoute, ChannelSource,
    MainchainServiceClient, NodeInfoSource,
};
use parking_lot::Mutex;
use shared_types::ChainId;

struct CountingNode {
    chain_id: ChainId,
    calls: AtomicUsize,
}

impl CountingNode {
    fn new(id: &str) -> Self {
        Self {
            chain_id: id.parse().unwrap(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl NodeInfoSource for CountingNode {
    async fn chain_id(&self) -> Result<ChainId, ChainResolverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.chain_id)
    }
}

/// Channel source that records which partners it was asked about.
#[derive(Default)]
struct RecordingChannels {
    root: &'static str,
    asked: Mutex<Vec<ChainId>>,
}

impl RecordingChannels {
    fn answering(root: &'static str) -> Arc<Self> {
        Arc::new(Self {
            root,
            ..Self::default()
        })
    }
}

#[async_trait]
impl ChannelSource for RecordingChannels {
    async fn get_channel(&self, chain_id: &ChainId) -> Result<ChannelInfo, ChainResolverError> {
        self.asked.lock().push(*chain_id);
        Ok(ChannelInfo {
            partner_chain_outbox_root: self.root.into(),
            ..ChannelInfo::default()
        })
    }
}

fn id(s: &str) -> ChainId {
    s.parse().unwrap()
}

#[tokio::test]
async fn test_mainchain_detection_from_node() {
    let node = CountingNode::new("04000000");
    let context = ChainContext::new();
    assert_eq!(context.is_mainchain(), Err(ChainResolverError::Unresolved));

    context.resolve(&node).await.unwrap();
    assert_eq!(context.is_mainchain(), Ok(true));
    // Resolution is cached after the first answer.
    context.resolve(&node).await.unwrap();
    assert_eq!(node.calls.load(Ordering::SeqCst), 1);

    let sidechain = ChainContext::new();
    sidechain.resolve(&CountingNode::new("04000001")).await.unwrap();
    assert_eq!(sidechain.is_mainchain(), Ok(false));
    assert_eq!(sidechain.chain_id().unwrap().mainchain(), id("04000000"));
}

#[tokio::test]
async fn test_channel_lookups_route_by_chain_kind() {
    let context = Arc::new(ChainContext::new());
    context.resolve(&CountingNode::new("04000001")).await.unwrap();
    let local = RecordingChannels::answering("local");
    let mainchain = RecordingChannels::answering("remote");
    let resolver = ChannelResolver::new(context, local.clone(), mainchain.clone());

    // Sidechain to its mainchain: the local node holds the channel.
    let resolved = resolver.resolve_channel(&id("04000000")).await.unwrap();
    assert_eq!(resolved.route, ChannelRoute::Local);
    assert_eq!(resolved.channel.partner_chain_outbox_root, "local");

    // Sidechain to sidechain: only the mainchain service knows it.
    let resolved = resolver.resolve_channel(&id("04000002")).await.unwrap();
    assert_eq!(resolved.route, ChannelRoute::Delegated);
    assert_eq!(resolved.channel.partner_chain_outbox_root, "remote");

    assert_eq!(*local.asked.lock(), vec![id("04000000")]);
    assert_eq!(*mainchain.asked.lock(), vec![id("04000002")]);

    let err = resolver.resolve_channel(&id("04000001")).await.unwrap_err();
    assert!(err.is_usage());
}

#[tokio::test]
async fn test_unresolved_context_rejects_channel_lookups() {
    let resolver = ChannelResolver::new(
        Arc::new(ChainContext::new()),
        RecordingChannels::answering("local"),
        RecordingChannels::answering("remote"),
    );
    assert_eq!(
        resolver.resolve_channel(&id("04000000")).await.unwrap_err(),
        ChainResolverError::Unresolved
    );
}

#[test]
fn test_mainchain_service_selected_per_network() {
    let timeout = Duration::from_secs(1);
    let devnet = MainchainServiceClient::for_network(&id("04000001"), None, timeout).unwrap();
    assert_eq!(devnet.base_url(), "https://devnet-service.liskdev.net");

    let configured =
        MainchainServiceClient::for_network(&id("07000001"), Some("http://localhost:9901"), timeout)
            .unwrap();
    assert_eq!(configured.base_url(), "http://localhost:9901");

    assert!(matches!(
        MainchainServiceClient::for_network(&id("07000001"), None, timeout),
        Err(ChainResolverError::UnknownNetwork(7))
    ));
}
