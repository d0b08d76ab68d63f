//! Core business logic for Settla.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Domain types, validation rules and cascade planning live here; the database
//! layer loads snapshots, asks this crate what to write, and writes it.
//!
//! # Modules
//!
//! - `payment` - Payment recording, approval cascade and return cancellation

pub mod payment;
