use demgrid::{Grid, Header, DEFAULT_NODATA};

/// Returns the slope (degrees) of `grid` using Horn's 3x3 weighted
/// finite difference:
///
/// ```text
/// dz/dx = ((NE + 2E + SE) - (NW + 2W + SW)) / (8 * cellsize)
/// dz/dy = ((NW + 2N + NE) - (SW + 2S + SE)) / (8 * cellsize)
/// slope = atan(sqrt(dz/dx² + dz/dy²))
/// ```
///
/// Border cells, and cells with a missing neighbor, are no-data.
pub fn slope(grid: &Grid) -> Grid {
    let header = Header {
        nodata: DEFAULT_NODATA,
        ..*grid.header()
    };
    let (nrows, ncols) = grid.dimensions();
    let cellsize = header.cellsize;
    let mut samples = vec![DEFAULT_NODATA; header.len()];

    for row in 1..nrows.saturating_sub(1) {
        for col in 1..ncols.saturating_sub(1) {
            if let Some(window) = window(grid, row, col) {
                let [nw, n, ne, w, _, e, sw, s, se] = window;
                let dz_dx = ((ne + 2.0 * e + se) - (nw + 2.0 * w + sw)) / (8.0 * cellsize);
                let dz_dy = ((nw + 2.0 * n + ne) - (sw + 2.0 * s + se)) / (8.0 * cellsize);
                #[allow(clippy::cast_possible_truncation)]
                let degrees = dz_dx.hypot(dz_dy).atan().to_degrees() as f32;
                samples[row * ncols + col] = degrees;
            }
        }
    }

    Grid::new(header, samples).unwrap_or_else(|_| Grid::filled(header, DEFAULT_NODATA))
}

/// Returns the 3x3 neighborhood of `(row, col)`, north row first,
/// if every cell in it is valid.
fn window(grid: &Grid, row: usize, col: usize) -> Option<[f64; 9]> {
    let mut out = [0.0; 9];
    for (i, r) in (row - 1..=row + 1).enumerate() {
        for (j, c) in (col - 1..=col + 1).enumerate() {
            out[i * 3 + j] = f64::from(grid.value(r, c)?);
        }
    }
    Some(out)
}
