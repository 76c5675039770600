//! Client code for fitshell.
//!
//! This crate provides the network fetch primitive and the offline cache
//! controller that sits between the application and the network.

pub mod fetch;
pub mod worker;

pub use fetch::{FetchClient, FetchConfig, Network};
pub use worker::{
    ActivationReport, CacheController, CacheStatus, ControllerHandle, Fetched, LifecycleEvent, Manifest, Phase, ResponseSource,
};
