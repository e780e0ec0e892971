//! Resize policies.
//!
//! A policy maps the native dimensions of an upload to the dimensions it is
//! stored at. Policies only ever shrink, and applying a policy to its own
//! output returns that output unchanged.
//!
//! # Tile budget
//!
//! The image is covered by a grid of `tile_size × tile_size` tiles. When the
//! grid holds more than `max_tiles` tiles, both sides are divided by
//! `sqrt(tiles / max_tiles)` and floored. That factor bounds the area; when the
//! ceil-based re-tiling of the floored result still overflows the budget, the
//! factor is raised to the smallest one that fits a grid of at most
//! `max_tiles` tiles.
//!
//! ```
//! use image_depot::resize::{ResizeDecision, ResizePolicy};
//!
//! let policy = ResizePolicy::tile_budget(512, 4);
//! assert_eq!(policy.decide(4096, 4096), ResizeDecision::new(1024, 1024));
//! assert_eq!(policy.decide(800, 600), ResizeDecision::new(800, 600));
//! ```

use serde::Serialize;

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 512;

/// Default number of tiles an image may occupy.
pub const DEFAULT_MAX_TILES: u32 = 16;

/// Default long-edge ceiling for [`ResizePolicy::LongEdge`].
pub const DEFAULT_MAX_EDGE: u32 = 2048;

// =============================================================================
// Resize Decision
// =============================================================================

/// Output dimensions chosen by a [`ResizePolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResizeDecision {
    /// Target width in pixels
    pub width: u32,

    /// Target height in pixels
    pub height: u32,
}

impl ResizeDecision {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether this decision keeps the given source dimensions.
    pub fn is_unchanged(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }
}

// =============================================================================
// Resize Policy
// =============================================================================

/// How uploads are downsampled before they are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizePolicy {
    /// Keep the tile count of the image at or under `max_tiles`.
    TileBudget { tile_size: u32, max_tiles: u32 },

    /// Keep the longest side at or under `max_edge`.
    LongEdge { max_edge: u32 },

    /// Store uploads at their native size.
    Passthrough,
}

impl Default for ResizePolicy {
    fn default() -> Self {
        Self::tile_budget(DEFAULT_TILE_SIZE, DEFAULT_MAX_TILES)
    }
}

impl ResizePolicy {
    /// Tile-budget policy.
    ///
    /// `tile_size` and `max_tiles` must both be non-zero; [`crate::Config::validate`]
    /// rejects zero before a policy is built.
    pub fn tile_budget(tile_size: u32, max_tiles: u32) -> Self {
        Self::TileBudget {
            tile_size,
            max_tiles,
        }
    }

    /// Long-edge ceiling policy.
    pub fn long_edge(max_edge: u32) -> Self {
        Self::LongEdge { max_edge }
    }

    /// Compute the stored dimensions for an image of `width × height`.
    pub fn decide(&self, width: u32, height: u32) -> ResizeDecision {
        let unchanged = ResizeDecision::new(width, height);
        if width == 0 || height == 0 {
            return unchanged;
        }

        match *self {
            ResizePolicy::TileBudget {
                tile_size,
                max_tiles,
            } => {
                if tile_size == 0 || max_tiles == 0 {
                    return unchanged;
                }
                decide_tile_budget(width, height, tile_size, max_tiles)
            }
            ResizePolicy::LongEdge { max_edge } => {
                if max_edge == 0 {
                    return unchanged;
                }
                decide_long_edge(width, height, max_edge)
            }
            ResizePolicy::Passthrough => unchanged,
        }
    }

    /// Short name for logs and the startup summary.
    pub fn mode_name(&self) -> &'static str {
        match self {
            ResizePolicy::TileBudget { .. } => "tile-budget",
            ResizePolicy::LongEdge { .. } => "long-edge",
            ResizePolicy::Passthrough => "none",
        }
    }
}

// =============================================================================
// Tile Arithmetic
// =============================================================================

/// Number of `tile_size` tiles needed to cover `width × height`.
#[inline]
pub fn tile_count(width: u32, height: u32, tile_size: u32) -> u64 {
    let tiles_wide = u64::from(width).div_ceil(u64::from(tile_size));
    let tiles_high = u64::from(height).div_ceil(u64::from(tile_size));
    tiles_wide * tiles_high
}

fn scale_down(dimension: u32, factor: f64) -> u32 {
    ((f64::from(dimension) / factor).floor() as u32).max(1)
}

fn decide_tile_budget(width: u32, height: u32, tile_size: u32, max_tiles: u32) -> ResizeDecision {
    let tiles = tile_count(width, height, tile_size);
    let budget = u64::from(max_tiles);
    if tiles <= budget {
        return ResizeDecision::new(width, height);
    }

    let area_factor = (tiles as f64 / budget as f64).sqrt();
    let candidate = ResizeDecision::new(scale_down(width, area_factor), scale_down(height, area_factor));
    if tile_count(candidate.width, candidate.height, tile_size) <= budget {
        return candidate;
    }

    let factor = area_factor.max(grid_fit_factor(width, height, tile_size, max_tiles));
    ResizeDecision::new(scale_down(width, factor), scale_down(height, factor))
}

/// Smallest factor that fits the image into some `a × b` grid with `a * b <= max_tiles`.
///
/// Columns beyond the source's own column count only tighten the row
/// constraint, so the search stops there.
fn grid_fit_factor(width: u32, height: u32, tile_size: u32, max_tiles: u32) -> f64 {
    let tile = f64::from(tile_size);
    let max_columns = u64::from(width)
        .div_ceil(u64::from(tile_size))
        .min(u64::from(max_tiles)) as u32;

    (1..=max_columns)
        .map(|columns| {
            let rows = max_tiles / columns;
            let horizontal = f64::from(width) / (f64::from(columns) * tile);
            let vertical = f64::from(height) / (f64::from(rows) * tile);
            horizontal.max(vertical)
        })
        .fold(f64::INFINITY, f64::min)
}

fn decide_long_edge(width: u32, height: u32, max_edge: u32) -> ResizeDecision {
    let long_edge = width.max(height);
    if long_edge <= max_edge {
        return ResizeDecision::new(width, height);
    }

    let factor = f64::from(long_edge) / f64::from(max_edge);
    if width >= height {
        ResizeDecision::new(max_edge, scale_down(height, factor))
    } else {
        ResizeDecision::new(scale_down(width, factor), max_edge)
    }
}

// =============================================================================
// Tests
// =============================================================================
