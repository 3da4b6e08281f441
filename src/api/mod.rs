//! HTTP API
//!
//! REST surface for ingesting observations and medications and for
//! reading SOFA scores.

pub mod rest;
