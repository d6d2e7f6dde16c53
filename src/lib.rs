// Cartage - E-commerce Batch ETL Pipeline
// Copyright (c) 2025 Cartage Contributors
// Licensed under the MIT License

//! # Cartage - E-commerce Batch ETL Pipeline
//!
//! Cartage moves e-commerce data from remote flat files through two
//! relational stores and produces a joined daily extract. One scheduled
//! invocation runs a directed task graph:
//!
//! - **Extract** the customers and orders CSV files into a staging
//!   directory (two independent roots)
//! - **Load** each staged file into its own PostgreSQL store (concurrent
//!   once the matching extract finished)
//! - **Archive** the consumed files out of the intake directory and
//!   **Join** the two tables into a materialized `customers_orders`
//!   table (both behind the load barrier, unordered between themselves)
//! - **Export** the materialized join as a dated CSV artifact
//!
//! ## Architecture
//!
//! Cartage follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`graph`] - Task graph: nodes, dependency edges, concurrent executor
//! - [`core`] - The pipeline stages, coordinator and run summary
//! - [`adapters`] - External integrations (HTTP sources, staging
//!   filesystem, PostgreSQL stores)
//! - [`domain`] - Core domain types, records and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cartage::config::load_config;
//! use cartage::core::pipeline::PipelineCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("cartage.toml")?;
//!     let coordinator = PipelineCoordinator::new(&config)?;
//!
//!     let summary = coordinator
//!         .execute_run(chrono::Local::now().date_naive())
//!         .await?;
//!
//!     println!("Run reached phase {}", summary.phase);
//!     Ok(())
//! }
//! ```
//!
//! ## Failure isolation
//!
//! A failed task never cancels its siblings: if the orders load fails,
//! the customers load still commits, and archive, join and export are
//! skipped with the blocking task recorded in the run summary. Staged
//! files stay in the intake directory for the retry the external
//! scheduler decides to make.
//!
//! ## Error Handling
//!
//! Cartage uses the [`domain::PipelineError`] type for all errors:
//!
//! ```rust,no_run
//! use cartage::domain::Result;
//!
//! fn example() -> Result<()> {
//!     let config = cartage::config::load_config("cartage.toml")?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod graph;
pub mod logging;
