//! Application layer: conversion, sources and rendering
//!
//! This layer builds on the domain model and is what source loaders and
//! export paths call into.

pub mod converter;
pub mod display;
pub mod error;
pub mod source;

pub use converter::{from_hierarchical_map, to_hierarchical_map, Converter};
pub use display::{TreeNodeConvert, TreeRenderer};
pub use error::{ApplicationError, ApplicationResult};
pub use source::{empty_map_source, wrap_as_source, MapSource, Source, SourceInfo};
