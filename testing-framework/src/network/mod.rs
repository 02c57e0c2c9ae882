//! TestNetwork - devnet handle for contract tests
//!
//! Wraps an in-process devnet with the pieces a contract test needs:
//! signers for the unlocked accounts, contract factories and snapshot-backed
//! fixtures.

mod fixture;

pub use fixture::FixtureCache;

use anyhow::{bail, Context, Result};
use log::debug;
use std::any::TypeId;
use std::future::Future;
use std::sync::Arc;
use tokenbench_devnet::{
    config::{DevnetConfig, Hardfork},
    core::blockchain::SnapshotId,
    Devnet, DevnetBuilder, Provider,
};

use crate::contract::ContractFactory;
use crate::signer::Signer;

/// In-process network for contract tests
///
/// Cheap to clone: clones share the same devnet and fixture cache.
///
/// # Example
///
/// ```rust,ignore
/// use tokenbench_testing_framework::prelude::*;
///
/// async fn deploy_token_fixture(network: TestNetwork) -> Result<Token> {
///     Token::deploy(&network.contract_factory(Token::ARTIFACT).await?).await
/// }
///
/// let network = TestNetworkBuilder::new().build().await?;
/// let token = network.load_fixture(deploy_token_fixture).await?;
/// ```
#[derive(Clone)]
pub struct TestNetwork {
    devnet: Arc<Devnet>,
    provider: Arc<dyn Provider>,
    fixtures: Arc<FixtureCache>,
}

impl TestNetwork {
    /// Wrap an existing devnet
    pub fn new(devnet: Arc<Devnet>) -> Self {
        let provider: Arc<dyn Provider> = devnet.clone();
        Self {
            devnet,
            provider,
            fixtures: Arc::new(FixtureCache::new()),
        }
    }

    /// Underlying devnet, for direct state access in assertions
    pub fn devnet(&self) -> &Arc<Devnet> {
        &self.devnet
    }

    /// Provider over the devnet
    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// One signer per unlocked account, in account order
    pub async fn signers(&self) -> Result<Vec<Signer>> {
        let accounts = self.provider.accounts().await?;
        Ok(accounts
            .into_iter()
            .map(|address| Signer::new(address, self.provider.clone()))
            .collect())
    }

    /// Signer of the account at `index`
    pub async fn signer(&self, index: usize) -> Result<Signer> {
        self.signers()
            .await?
            .into_iter()
            .nth(index)
            .with_context(|| format!("No signer at index {}", index))
    }

    /// Factory for the artifact `name`, deploying from the first signer
    pub async fn contract_factory(&self, name: &str) -> Result<ContractFactory> {
        let artifact = self.devnet.artifact(name).await?;
        Ok(ContractFactory::new(artifact, self.signer(0).await?))
    }

    /// Capture the chain state
    pub async fn snapshot(&self) -> Result<SnapshotId> {
        Ok(self.provider.snapshot().await?)
    }

    /// Restore a snapshot, returning false if it is unknown or consumed
    pub async fn revert(&self, snapshot: SnapshotId) -> Result<bool> {
        let reverted = self.provider.revert(snapshot).await?;
        if reverted {
            self.fixtures.invalidate_from(snapshot);
        }
        Ok(reverted)
    }

    /// Run `fixture` once, then restore its resulting state on every later call.
    ///
    /// The first call runs the fixture and snapshots the chain right after.
    /// Later calls with the same fixture function revert to that snapshot,
    /// take a fresh one for the next call and return the cached value, so
    /// each test starts from the same state without redeploying.
    ///
    /// # Errors
    ///
    /// Fails if the fixture fails, or if its snapshot was consumed behind the
    /// network's back (a revert sent straight to the provider). Reverts made
    /// through [`TestNetwork::revert`] make the fixture run again instead.
    pub async fn load_fixture<F, Fut, T>(&self, fixture: F) -> Result<T>
    where
        F: FnOnce(TestNetwork) -> Fut + 'static,
        Fut: Future<Output = Result<T>>,
        T: Clone + Send + Sync + 'static,
    {
        let key = TypeId::of::<F>();

        if let Some(snapshot) = self.fixtures.snapshot_of(&key) {
            if !self.provider.revert(snapshot).await? {
                self.fixtures.remove(&key);
                bail!(
                    "Snapshot {} of fixture {} is no longer valid",
                    snapshot,
                    std::any::type_name::<F>()
                );
            }
            self.fixtures.invalidate_after(snapshot);
            let renewed = self.provider.snapshot().await?;
            self.fixtures.renew(&key, renewed);

            if log::log_enabled!(log::Level::Debug) {
                debug!(
                    "Restored fixture {} from snapshot {}",
                    std::any::type_name::<F>(),
                    snapshot
                );
            }
            return self
                .fixtures
                .value_of::<T>(&key)
                .context("Cached fixture value has an unexpected type");
        }

        let value = fixture(self.clone()).await?;
        let snapshot = self.provider.snapshot().await?;
        self.fixtures.insert(key, snapshot, value.clone());
        debug!(
            "Fixture {} ran, snapshot {}",
            std::any::type_name::<F>(),
            snapshot
        );
        Ok(value)
    }

    /// Fixtures currently cached
    pub fn fixture_count(&self) -> usize {
        self.fixtures.len()
    }
}

/// Builder for TestNetwork instances with fluent API
///
/// # Example
///
/// ```rust,ignore
/// let network = TestNetworkBuilder::new()
///     .with_account_count(3)
///     .with_hardfork(Hardfork::Berlin)
///     .build()
///     .await?;
/// ```
pub struct TestNetworkBuilder {
    devnet: DevnetBuilder,
}

impl TestNetworkBuilder {
    /// Default devnet: London, chain 31337, 20 funded accounts
    pub fn new() -> Self {
        Self {
            devnet: DevnetBuilder::new(),
        }
    }

    /// Use a full devnet configuration
    pub fn with_config(mut self, config: DevnetConfig) -> Self {
        self.devnet = self.devnet.with_config(config);
        self
    }

    /// Number of unlocked accounts
    pub fn with_account_count(mut self, count: usize) -> Self {
        self.devnet = self.devnet.with_account_count(count);
        self
    }

    /// Fee rules of the chain
    pub fn with_hardfork(mut self, hardfork: Hardfork) -> Self {
        self.devnet = self.devnet.with_hardfork(hardfork);
        self
    }

    /// Chain id transactions may carry
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.devnet = self.devnet.with_chain_id(chain_id);
        self
    }

    /// Build the TestNetwork instance
    ///
    /// # Errors
    ///
    /// Returns an error if the devnet fails to start.
    pub async fn build(self) -> Result<TestNetwork> {
        let devnet = self.devnet.build_shared()?;
        Ok(TestNetwork::new(devnet))
    }
}

impl Default for TestNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
