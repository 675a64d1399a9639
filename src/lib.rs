//! GATT sensor probe library
//! Discovers a BLE sensor by address, walks its GATT tree, reads its
//! calibration value and polls its sensor characteristics until interrupted.

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;

pub use error::ProbeError;
