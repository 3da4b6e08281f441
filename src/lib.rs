//! SofaScore: a SOFA severity scoring engine for clinical time-series data
//!
//! Computes the Sepsis-related Organ Failure Assessment score from
//! per-patient physiological measurements:
//! - A pure scoring core over point-in-time condition snapshots
//! - Dataset adapters that resolve snapshots from time-series records
//! - An in-memory time-chunked record store and a REST surface

pub mod adapters;
pub mod api;
pub mod config;
pub mod sofa;
pub mod storage;

pub use adapters::{AdapterError, DatasetAdapter, RecordStoreAdapter};
pub use sofa::{compute, Catecholamine, CatecholamineAgent, Condition, OrganScores};
