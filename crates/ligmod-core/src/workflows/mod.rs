//! # Workflows Module
//!
//! The variant pipeline: declarative run configuration ([`config`]) and its
//! executor ([`pipeline`]), which strings the core and engine layers into
//! load → edit → validate → expand → embed → minimize → write.

pub mod config;
pub mod pipeline;
