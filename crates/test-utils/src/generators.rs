//! Test data generators for creating synthetic raster layers.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite.

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0); // col=1, row=0
/// assert_eq!(grid[10], 1.0);   // col=0, row=1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates a grid ramping linearly from `min` (top-left) to `max`
/// (bottom-right).
pub fn create_ramp_grid(width: usize, height: usize, min: f32, max: f32) -> Vec<f32> {
    let steps = (width + height).saturating_sub(2).max(1) as f32;
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push(min + (max - min) * (row + col) as f32 / steps);
        }
    }
    data
}

/// Creates a heavy-tailed population-density-like grid.
///
/// Most cells are sparse (1-20 people/km²) with a dense settlement near the
/// center reaching `peak`.
pub fn create_population_grid(width: usize, height: usize, peak: f32) -> Vec<f32> {
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let dx = col as f32 - cx;
            let dy = row as f32 - cy;
            let dist2 = dx * dx + dy * dy;
            let sparse = 1.0 + (simple_hash(col as u32, row as u32, 7) % 20) as f32;
            data.push(sparse + peak * (-dist2 / 4.0).exp());
        }
    }
    data
}

/// Creates precipitation-like values in mm with dry (zero) cells.
pub fn create_precipitation_grid(width: usize, height: usize, seed: u32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let hash = simple_hash(col as u32, row as u32, seed);
            // Roughly a quarter of cells are dry
            let precip = if hash % 4 == 0 {
                0.0
            } else {
                (hash % 40000) as f32 / 100.0
            };
            data.push(precip);
        }
    }
    data
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

/// Creates a grid filled with a constant value.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Creates a grid with `fill` everywhere except `nodata` at the given
/// (col, row) positions.
pub fn create_grid_with_nodata(
    width: usize,
    height: usize,
    fill: f32,
    nodata: f32,
    positions: &[(usize, usize)],
) -> Vec<f32> {
    let mut data = vec![fill; width * height];
    for &(col, row) in positions {
        if col < width && row < height {
            data[row * width + col] = nodata;
        }
    }
    data
}
