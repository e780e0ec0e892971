//! Resize policy layer.
//!
//! Pure functions that decide the stored dimensions of an upload. No I/O
//! happens here; the ingestion pipeline feeds in decoder metadata and hands
//! the resulting [`ResizeDecision`] to the codec.
//!
//! # Components
//!
//! - [`ResizePolicy`]: tile-budget, long-edge and pass-through modes
//! - [`ResizeDecision`]: the target dimensions
//! - [`tile_count`]: the tile arithmetic shared by the policy and its callers

mod policy;

pub use policy::{
    tile_count, ResizeDecision, ResizePolicy, DEFAULT_MAX_EDGE, DEFAULT_MAX_TILES,
    DEFAULT_TILE_SIZE,
};
