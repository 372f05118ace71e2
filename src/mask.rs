//! Morphology on validity masks.
//!
//! Erosion and dilation use the 4-connected cross structuring element and
//! treat everything outside the grid as 0, so pixels on the raster border
//! are always boundary pixels.

use crate::model::{BinaryMask, ElevationGrid};

const CROSS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// 1 where the cell holds an elevation sample, 0 where it is NoData.
pub fn validity_mask(grid: &ElevationGrid) -> BinaryMask {
    let cells = grid
        .values
        .iter()
        .map(|&v| u8::from(!grid.is_nodata(v)))
        .collect();

    BinaryMask {
        rows: grid.rows,
        cols: grid.cols,
        cells,
    }
}

pub fn erode(mask: &BinaryMask) -> BinaryMask {
    let mut out = BinaryMask::zeros(mask.rows, mask.cols);
    for row in 0..mask.rows as isize {
        for col in 0..mask.cols as isize {
            if mask.get(row, col) == 0 {
                continue;
            }
            let interior = CROSS
                .iter()
                .all(|&(dr, dc)| mask.get(row + dr, col + dc) != 0);
            if interior {
                out.cells[row as usize * mask.cols + col as usize] = 1;
            }
        }
    }
    out
}

pub fn dilate(mask: &BinaryMask, iterations: u32) -> BinaryMask {
    let mut current = mask.clone();
    for _ in 0..iterations {
        let mut next = current.clone();
        for row in 0..current.rows as isize {
            for col in 0..current.cols as isize {
                if current.get(row, col) != 0 {
                    continue;
                }
                let touched = CROSS
                    .iter()
                    .any(|&(dr, dc)| current.get(row + dr, col + dc) != 0);
                if touched {
                    next.cells[row as usize * current.cols + col as usize] = 1;
                }
            }
        }
        current = next;
    }
    current
}

/// Boundary pixels of the valid region, thickened by `iterations` dilations.
pub fn extract_edge_mask(grid: &ElevationGrid, iterations: u32) -> BinaryMask {
    let valid = validity_mask(grid);
    let eroded = erode(&valid);

    // 有効領域から収縮結果を引いて境界だけを残す
    let cells = valid
        .cells
        .iter()
        .zip(&eroded.cells)
        .map(|(&v, &e)| v & !e & 1)
        .collect();
    let edge = BinaryMask {
        rows: valid.rows,
        cols: valid.cols,
        cells,
    };

    tracing::debug!(
        "Edge mask: {} boundary pixels of {} valid",
        edge.count_set(),
        valid.count_set()
    );

    // 可視化しやすいように線を太くする
    if iterations > 0 {
        dilate(&edge, iterations)
    } else {
        edge
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODATA: f64 = -9999.0;

    /// rows x cols のグリッドで (r0..r1, c0..c1) だけ有効値を持つ
    fn grid_with_block(rows: usize, cols: usize, r0: usize, r1: usize, c0: usize, c1: usize) -> ElevationGrid {
        let mut values = vec![NODATA; rows * cols];
        for r in r0..r1 {
            for c in c0..c1 {
                values[r * cols + c] = 42.0;
            }
        }
        ElevationGrid {
            rows,
            cols,
            values,
            nodata: NODATA,
        }
    }

    #[test]
    fn test_validity_mask() {
        let grid = grid_with_block(4, 4, 1, 3, 1, 3);
        let mask = validity_mask(&grid);
        assert_eq!(mask.count_set(), 4);
        assert_eq!(mask.get(1, 1), 1);
        assert_eq!(mask.get(0, 0), 0);
    }

    #[test]
    fn test_erode_removes_outer_ring() {
        let grid = grid_with_block(7, 7, 1, 6, 1, 6);
        let eroded = erode(&validity_mask(&grid));
        assert_eq!(eroded.count_set(), 9);
        assert_eq!(eroded.get(1, 1), 0);
        assert_eq!(eroded.get(2, 2), 1);
    }

    #[test]
    fn test_raster_border_counts_as_boundary() {
        let grid = grid_with_block(3, 3, 0, 3, 0, 3);
        let eroded = erode(&validity_mask(&grid));
        assert_eq!(eroded.count_set(), 1);
        assert_eq!(eroded.get(1, 1), 1);
    }

    #[test]
    fn test_dilate_uses_cross() {
        let mut mask = BinaryMask::zeros(5, 5);
        mask.cells[2 * 5 + 2] = 1;
        let once = dilate(&mask, 1);
        assert_eq!(once.count_set(), 5);
        assert_eq!(once.get(1, 1), 0);
        let twice = dilate(&mask, 2);
        assert_eq!(twice.count_set(), 13);
    }

    #[test]
    fn test_edge_mask_without_dilation_is_boundary() {
        let grid = grid_with_block(10, 10, 2, 8, 2, 8);
        let edge = extract_edge_mask(&grid, 0);
        // 6x6 ブロックの外周
        assert_eq!(edge.count_set(), 20);
        assert_eq!(edge.get(2, 2), 1);
        assert_eq!(edge.get(4, 4), 0);
    }

    #[test]
    fn test_edge_mask_grows_with_iterations() {
        let grid = grid_with_block(20, 20, 4, 16, 3, 15);
        let mut previous = 0;
        for iterations in 0..5 {
            let count = extract_edge_mask(&grid, iterations).count_set();
            assert!(
                count >= previous,
                "iterations {} produced {} pixels (previous {})",
                iterations,
                count,
                previous
            );
            previous = count;
        }
    }

    #[test]
    fn test_all_nodata_gives_empty_mask() {
        let grid = grid_with_block(5, 5, 0, 0, 0, 0);
        assert_eq!(extract_edge_mask(&grid, 2).count_set(), 0);
    }
}
