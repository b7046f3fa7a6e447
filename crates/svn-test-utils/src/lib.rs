//! Shared test utilities for the svn-scm workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only — never published.
//!
//! # Modules
//!
//! - [`invoker`] — scripted [`svn_cli::CliInvoker`] double
//! - [`fixtures`] — working-copy directory fixtures and canned CLI output

pub mod fixtures;
pub mod invoker;

pub use invoker::ScriptedInvoker;
