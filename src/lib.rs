//! Case Intake API Library
//!
//! Client intake records stored in a single JSON document, plus the
//! return-to-work scoring used by the intake UI.
//!
//! # Modules
//!
//! - `api`: HTTP-facing components.
//! - `domain`: Records, scoring and errors.
//! - `data`: Persistence.
//! - `client_storage`: Record-level store operations.
//! - `config`: Configuration management.
//! - `db`: Document backends (JSON file, in-memory).
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Record and API data models.
//! - `routes`: Router and middleware assembly.
//! - `scoring`: Return-to-work scoring.

pub mod api;
pub mod data;
pub mod domain;

pub mod client_storage;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod scoring;
