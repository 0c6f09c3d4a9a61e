//! SiteWatch - construction progress from historical satellite imagery
//!
//! This library talks to a quadtree tile service that speaks a schema-less
//! protobuf-style wire format. It decodes the service's metadata, builds
//! versioned locators for a chosen imagery dataset, pulls JPEG textures out of
//! node payloads and stitches them into one composite per area and year. A
//! survey runs that pipeline over a set of building footprints, classifies
//! each composite and reports the sites whose construction has stalled.
//!
//! Layering, from the bytes up:
//!
//! - [`wire`]: varints, tags and a table-driven message scan
//! - [`metadata`]: bulk, node and planetoid metadata
//! - [`locator`]: resource URLs and dataset version triples
//! - [`imagery`]: JPEG extraction from node data
//! - [`provider`]: HTTP transport and the [`provider::TileService`]
//! - [`mosaic`]: grid placement and compositing
//! - [`survey`]: the batch runner, results table and stall report

pub mod classify;
pub mod config;
pub mod geo;
pub mod imagery;
pub mod locator;
pub mod logging;
pub mod metadata;
pub mod mosaic;
pub mod overlap;
pub mod provider;
pub mod survey;
pub mod tile;
pub mod wire;
