//! Raster-to-vector tracing of mask regions.
//!
//! Pixels of equal non-zero value that touch along an edge (4-connectivity)
//! form one region. Every region becomes one polygon whose rings run along
//! pixel edges: one exterior ring plus a ring for each enclosed hole.

use std::collections::{HashMap, VecDeque};

use gdal::Dataset;
use geo::{LineString, Polygon};

use crate::error::Result;
use crate::model::{Georeference, TracedPolygon};

type Vertex = (i64, i64);

/// A traced region in pixel-corner coordinates (x = column, y = row).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelRegion {
    pub id: u32,
    pub value: u8,
    pub exterior: Vec<Vertex>,
    pub holes: Vec<Vec<Vertex>>,
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    from: Vertex,
    to: Vertex,
    pixel: Vertex,
}

/// Traces all non-zero regions of a row-major `cells` grid.
///
/// Region ids start at 1 and follow the scan order of each region's first
/// pixel.
pub fn trace_regions(cells: &[u8], cols: usize, rows: usize) -> Vec<PixelRegion> {
    let (labels, values) = label_regions(cells, cols, rows);
    let label_at = |row: i64, col: i64| -> u32 {
        if row < 0 || col < 0 || row >= rows as i64 || col >= cols as i64 {
            0
        } else {
            labels[row as usize * cols + col as usize]
        }
    };

    // 各領域の境界エッジを集める（領域が進行方向の左側になる向き）
    let mut edges: Vec<Vec<Edge>> = vec![Vec::new(); values.len()];
    for row in 0..rows as i64 {
        for col in 0..cols as i64 {
            let label = label_at(row, col);
            if label == 0 {
                continue;
            }
            let region = &mut edges[label as usize - 1];
            let pixel = (col, row);
            if label_at(row - 1, col) != label {
                region.push(Edge { from: (col + 1, row), to: (col, row), pixel });
            }
            if label_at(row, col - 1) != label {
                region.push(Edge { from: (col, row), to: (col, row + 1), pixel });
            }
            if label_at(row + 1, col) != label {
                region.push(Edge { from: (col, row + 1), to: (col + 1, row + 1), pixel });
            }
            if label_at(row, col + 1) != label {
                region.push(Edge { from: (col + 1, row + 1), to: (col + 1, row), pixel });
            }
        }
    }

    edges
        .iter()
        .zip(values)
        .enumerate()
        .filter_map(|(index, (region_edges, value))| {
            let mut rings: Vec<Vec<Vertex>> = link_rings(region_edges)
                .into_iter()
                .map(|ring| remove_collinear(&ring))
                .filter(|ring| ring.len() >= 4)
                .collect();

            let exterior_index = rings
                .iter()
                .enumerate()
                .max_by_key(|(_, ring)| twice_signed_area(ring).abs())
                .map(|(i, _)| i)?;
            let exterior = rings.swap_remove(exterior_index);

            Some(PixelRegion {
                id: index as u32 + 1,
                value,
                exterior,
                holes: rings,
            })
        })
        .collect()
}

/// Traces the first band of an in-memory mask raster into georeferenced polygons.
pub fn polygonize_mask(dataset: &Dataset) -> Result<Vec<TracedPolygon>> {
    let (cols, rows) = dataset.raster_size();
    let band = dataset.rasterband(1)?;
    let cells: Vec<u8> = band
        .read_as::<u8>((0, 0), (cols, rows), (cols, rows), None)?
        .into_iter()
        .collect();

    let georef = Georeference {
        geo_transform: dataset.geo_transform()?,
        projection: dataset.projection(),
    };

    let polygons: Vec<TracedPolygon> = trace_regions(&cells, cols, rows)
        .into_iter()
        .map(|region| region_to_polygon(&region, &georef))
        .collect();

    tracing::debug!("Polygonized mask into {} polygons", polygons.len());
    Ok(polygons)
}

pub fn region_to_polygon(region: &PixelRegion, georef: &Georeference) -> TracedPolygon {
    let to_world = |ring: &[Vertex]| -> LineString<f64> {
        ring.iter()
            .map(|&(x, y)| georef.pixel_to_world(x as f64, y as f64))
            .collect::<Vec<_>>()
            .into()
    };

    TracedPolygon {
        id: region.id,
        value: region.value,
        geometry: Polygon::new(
            to_world(&region.exterior),
            region.holes.iter().map(|h| to_world(h)).collect(),
        ),
    }
}

/// 4近傍で同じ値の画素をラベリング（0は背景）
fn label_regions(cells: &[u8], cols: usize, rows: usize) -> (Vec<u32>, Vec<u8>) {
    let mut labels = vec![0u32; cols * rows];
    let mut values = Vec::new();
    let mut queue = VecDeque::new();

    for start in 0..cells.len() {
        let value = cells[start];
        if value == 0 || labels[start] != 0 {
            continue;
        }
        values.push(value);
        let label = values.len() as u32;
        labels[start] = label;
        queue.push_back(start);

        while let Some(index) = queue.pop_front() {
            let (row, col) = (index / cols, index % cols);
            let mut neighbors = Vec::with_capacity(4);
            if row > 0 {
                neighbors.push(index - cols);
            }
            if row + 1 < rows {
                neighbors.push(index + cols);
            }
            if col > 0 {
                neighbors.push(index - 1);
            }
            if col + 1 < cols {
                neighbors.push(index + 1);
            }
            for n in neighbors {
                if labels[n] == 0 && cells[n] == value {
                    labels[n] = label;
                    queue.push_back(n);
                }
            }
        }
    }

    (labels, values)
}

/// Chains directed boundary edges into closed rings.
///
/// Where a region touches itself only at a corner the walk continues along
/// the other pixel, so the background cells meeting at that corner end up in
/// separate rings.
fn link_rings(edges: &[Edge]) -> Vec<Vec<Vertex>> {
    let mut outgoing: HashMap<Vertex, Vec<usize>> = HashMap::new();
    for (i, edge) in edges.iter().enumerate() {
        outgoing.entry(edge.from).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut rings = Vec::new();

    for start in 0..edges.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let mut ring = vec![edges[start].from];
        let mut current = start;

        loop {
            let arrived = edges[current];
            let Some(candidates) = outgoing.get(&arrived.to) else {
                break;
            };
            let next = match candidates.as_slice() {
                [only] => *only,
                _ => candidates
                    .iter()
                    .copied()
                    .find(|&i| edges[i].pixel != arrived.pixel)
                    .unwrap_or(candidates[0]),
            };
            if next == start || used[next] {
                break;
            }
            ring.push(arrived.to);
            used[next] = true;
            current = next;
        }

        rings.push(ring);
    }

    rings
}

fn remove_collinear(ring: &[Vertex]) -> Vec<Vertex> {
    let n = ring.len();
    if n < 3 {
        return ring.to_vec();
    }
    let direction = |a: Vertex, b: Vertex| ((b.0 - a.0).signum(), (b.1 - a.1).signum());

    (0..n)
        .filter(|&i| {
            let prev = ring[(i + n - 1) % n];
            let next = ring[(i + 1) % n];
            direction(prev, ring[i]) != direction(ring[i], next)
        })
        .map(|i| ring[i])
        .collect()
}

fn twice_signed_area(ring: &[Vertex]) -> i64 {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let (x0, y0) = ring[i];
            let (x1, y1) = ring[(i + 1) % n];
            x0 * y1 - x1 * y0
        })
        .sum()
}
