//! Lifecycle sequencing and the controller event loop.

use std::fmt;
use std::sync::Arc;

use fitshell_core::{CacheStorage, CacheStore, CacheVersion, Error, Request};
use serde::Serialize;
use tokio::sync::{RwLock, mpsc, oneshot};

use super::activate::{ActivationReport, activate as activate_stores};
use super::install::install as install_manifest;
use super::manifest::Manifest;
use super::strategy::{Fetched, ResponseSource, cache_first};
use crate::fetch::Network;

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Constructed, nothing run yet.
    Parsed,
    Installing,
    Installed,
    Activating,
    /// Serving fetches from the cache.
    Activated,
    /// Install or activation failed. Install may be retried.
    Redundant,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Parsed => "parsed",
            Phase::Installing => "installing",
            Phase::Installed => "installed",
            Phase::Activating => "activating",
            Phase::Activated => "activated",
            Phase::Redundant => "redundant",
        };
        f.write_str(s)
    }
}

/// Snapshot of the controller for status reporting.
#[derive(Debug, Clone, Serialize, schemars::JsonSchema)]
pub struct CacheStatus {
    pub phase: Phase,
    pub version: String,
    /// Every store present in storage, oldest first.
    pub stores: Vec<String>,
    /// Entries in the current store.
    pub entries: u64,
}

/// A lifecycle event with its reply channel.
#[derive(Debug)]
pub enum LifecycleEvent {
    Install { reply: oneshot::Sender<Result<(), Error>> },
    Activate { reply: oneshot::Sender<Result<ActivationReport, Error>> },
    Fetch { request: Request, reply: oneshot::Sender<Result<Fetched, Error>> },
}

/// Owns one cache generation and sequences install, activate and fetch.
pub struct CacheController {
    storage: CacheStorage,
    network: Arc<dyn Network>,
    version: CacheVersion,
    manifest: Manifest,
    phase: RwLock<Phase>,
    store: RwLock<Option<CacheStore>>,
}

impl CacheController {
    pub fn new(storage: CacheStorage, network: Arc<dyn Network>, version: CacheVersion, manifest: Manifest) -> Self {
        Self { storage, network, version, manifest, phase: RwLock::new(Phase::Parsed), store: RwLock::new(None) }
    }

    pub async fn phase(&self) -> Phase {
        *self.phase.read().await
    }

    pub fn version(&self) -> &CacheVersion {
        &self.version
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Move from one of `from` into `to`, or fail without changing anything.
    async fn transition(&self, from: &[Phase], to: Phase) -> Result<(), Error> {
        let mut phase = self.phase.write().await;
        if !from.contains(&*phase) {
            return Err(Error::Lifecycle(format!("cannot enter {} from {}", to, *phase)));
        }
        tracing::debug!(from = %*phase, to = %to, "controller phase");
        *phase = to;
        Ok(())
    }

    async fn set_phase(&self, to: Phase) {
        *self.phase.write().await = to;
    }

    /// Pre-cache the manifest into the current version's store.
    pub async fn install(&self) -> Result<(), Error> {
        self.transition(&[Phase::Parsed, Phase::Redundant], Phase::Installing)
            .await?;

        match install_manifest(&self.storage, self.network.as_ref(), &self.version, &self.manifest).await {
            Ok(store) => {
                *self.store.write().await = Some(store);
                self.set_phase(Phase::Installed).await;
                Ok(())
            }
            Err(e) => {
                tracing::error!(version = %self.version, error = %e, "install failed");
                self.set_phase(Phase::Redundant).await;
                Err(e)
            }
        }
    }

    /// Delete stale stores and start serving from the cache.
    ///
    /// On an already active controller this repeats the sweep.
    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        self.transition(&[Phase::Installed, Phase::Activated], Phase::Activating)
            .await?;

        match activate_stores(&self.storage, &self.version).await {
            Ok(report) => {
                self.set_phase(Phase::Activated).await;
                Ok(report)
            }
            Err(e) => {
                tracing::error!(version = %self.version, error = %e, "activation failed");
                self.set_phase(Phase::Redundant).await;
                Err(e)
            }
        }
    }

    /// Answer a request: cache-first once activated, straight to the network
    /// before that.
    pub async fn fetch(&self, request: Request) -> Result<Fetched, Error> {
        let store = if self.phase().await == Phase::Activated { self.store.read().await.clone() } else { None };

        match store {
            Some(store) => cache_first(&store, self.network.as_ref(), request).await,
            None => {
                tracing::debug!(url = %request.url, "controller not active; passing through");
                let response = self.network.fetch(request).await?;
                Ok(Fetched { response, source: ResponseSource::Network })
            }
        }
    }

    pub async fn status(&self) -> Result<CacheStatus, Error> {
        let stores = self.storage.store_names().await?;
        let current = self.store.read().await.clone();
        let entries = match current {
            Some(store) => store.len().await?,
            None => 0,
        };
        Ok(CacheStatus { phase: self.phase().await, version: self.version.to_string(), stores, entries })
    }

    /// Process one event. Install and activate complete before this returns;
    /// a fetch is spawned onto its own task.
    pub async fn handle(self: &Arc<Self>, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Install { reply } => {
                let _ = reply.send(self.install().await);
            }
            LifecycleEvent::Activate { reply } => {
                let _ = reply.send(self.activate().await);
            }
            LifecycleEvent::Fetch { request, reply } => {
                let controller = Arc::clone(self);
                tokio::spawn(async move {
                    let _ = reply.send(controller.fetch(request).await);
                });
            }
        }
    }

    /// Consume events until every sender is dropped.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<LifecycleEvent>) {
        tracing::info!(version = %self.version, "cache controller running");
        while let Some(event) = events.recv().await {
            self.handle(event).await;
        }
        tracing::info!(version = %self.version, "cache controller stopped");
    }

    /// Start the event loop on a background task.
    pub fn spawn(self: Arc<Self>, buffer: usize) -> ControllerHandle {
        let (events, rx) = mpsc::channel(buffer);
        tokio::spawn(self.run(rx));
        ControllerHandle { events }
    }
}

/// Sending side of a running controller.
#[derive(Clone, Debug)]
pub struct ControllerHandle {
    events: mpsc::Sender<LifecycleEvent>,
}

impl ControllerHandle {
    async fn send<T>(&self, event: LifecycleEvent, reply: oneshot::Receiver<Result<T, Error>>) -> Result<T, Error> {
        self.events.send(event).await.map_err(|_| Error::ControllerStopped)?;
        reply.await.map_err(|_| Error::ControllerStopped)?
    }

    pub async fn install(&self) -> Result<(), Error> {
        let (reply, rx) = oneshot::channel();
        self.send(LifecycleEvent::Install { reply }, rx).await
    }

    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        let (reply, rx) = oneshot::channel();
        self.send(LifecycleEvent::Activate { reply }, rx).await
    }

    pub async fn fetch(&self, request: Request) -> Result<Fetched, Error> {
        let (reply, rx) = oneshot::channel();
        self.send(LifecycleEvent::Fetch { request, reply }, rx).await
    }
}
