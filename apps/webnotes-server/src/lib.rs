//! WebNotes Server Library
//!
//! Page highlighting and the annotation service behind it.
//!
//! # Modules
//!
//! - `dom`: document tree abstraction, ranges and selections
//! - `locator`: structural paths naming highlighted elements
//! - `highlight`: selection segmentation and marker placement
//! - `capture`: highlight and note commands against a selection
//! - `annotations`: records and the single-writer store
//! - `service`: message protocol and the in-process bus
//! - `browse`, `export`: listing, statistics and markdown reports
//! - `routes`: HTTP surface over the service

pub mod annotations;
pub mod browse;
pub mod capture;
pub mod config;
pub mod dom;
pub mod error;
pub mod export;
pub mod highlight;
pub mod locator;
pub mod routes;
pub mod service;
pub mod state;
