//! # dossier-core
//!
//! Foundation types, oracle traits, errors, and events for dossier.
//!
//! This crate provides the shared vocabulary that all other dossier crates
//! depend on:
//!
//! - **Project files**: [`files::RepoFile`] and [`files::ExternalFile`] for
//!   tracked and out-of-tree content
//! - **Code units**: [`units::CodeUnit`] as the opaque key the analyzer
//!   hands back for classes and methods
//! - **Oracles**: the [`analyzer::Analyzer`] / [`analyzer::Repository`]
//!   traits and the non-blocking [`analyzer::AnalyzerCell`]
//! - **Errors**: [`errors::ContentError`] and [`errors::AnalyzerError`]
//! - **Events**: [`events::WorkspaceEvent`] broadcast to observers

#![deny(unsafe_code)]

pub mod analyzer;
pub mod errors;
pub mod events;
pub mod files;
pub mod logging;
pub mod units;
