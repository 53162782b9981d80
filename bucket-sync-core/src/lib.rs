#![doc = "bucket-sync-core: core logic library for bucket-sync."]

//! This crate contains the business logic of bucket-sync: storage bucket
//! reconciliation and deterministic per-branch project credentials.
//! HTTP clients, configuration files and output formatting live in the CLI crate.
//!
//! # Usage
//! Implement [`contract::BucketDirectory`] / [`contract::SigningKeySource`] for a
//! backend and call [`reconcile::upsert_buckets`] or
//! [`credentials::generate_credentials`].

pub mod branch;
pub mod contract;
pub mod credentials;
pub mod error;
pub mod project;
pub mod reconcile;
