// src/lib.rs

//! Cert Tracker Library
//!
//! A small catalog of certification pages, the learning resources attached
//! to them, and the workflow that publishes a cert once its page route is
//! live.

pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod storage;
pub mod utils;
