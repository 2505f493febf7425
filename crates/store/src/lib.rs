//! Aggregate store logic for the Cobalt engine.
//!
//! `DaoBuildingBlocks` is the keyed get/merge/insert surface a storage
//! backend must provide; `MemoryStore` is the in-process implementation.
//! `DataService` composes the building blocks into the atomic units of work
//! the rest of the engine calls: per-event aggregation, per-report/day
//! observation generation, enablement lifecycle, and cleanup.

pub mod aggregators;
pub mod dao;
pub mod data_service;
pub mod memory;

pub use aggregators::{count_aggregator, string_index_aggregator, LogAggregator};
pub use dao::{DaoBuildingBlocks, GlobalValueKey, StoredObservationBatch, SystemProfileAndAggregateValue};
pub use data_service::DataService;
pub use memory::MemoryStore;
