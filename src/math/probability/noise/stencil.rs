// src/math/probability/noise/stencil.rs

use super::{Float, GradientGrid};
use crate::math::{
    error::{MathError, MathResult},
    types::{IndexIter, NdGrid},
    utils::{constants::STENCIL_SOFTENING, numerical::linspace},
};
use rayon::prelude::*;
use std::time::Instant;
use tracing::debug;

/// Ecke des Einheitshyperwürfels, Offset 0 oder 1 pro Achse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Corner(Vec<u8>);

impl Corner {
    /// Achse 0 entspricht dem höchstwertigen Bit der Maske.
    pub fn from_mask(mask: usize, dimensions: usize) -> Self {
        Self(
            (0..dimensions)
                .map(|axis| ((mask >> (dimensions - 1 - axis)) & 1) as u8)
                .collect(),
        )
    }

    pub fn offsets(&self) -> &[u8] {
        &self.0
    }

    /// Richtung von der Ecke in die Zelle hinein: +1 für Offset 0, -1 für Offset 1.
    pub fn signs(&self) -> Vec<i8> {
        self.0.iter().map(|&o| if o == 0 { 1 } else { -1 }).collect()
    }

    /// Die gegenüberliegende Ecke (alle Achsen gespiegelt).
    pub fn opposite(&self) -> Self {
        Self(self.0.iter().map(|&o| 1 - o).collect())
    }
}

/// Vorberechnete Verschiebungsvektoren zum Hochtasten einer Gitterzelle auf
/// `size` Abtastpunkte pro Achse.
///
/// Pro Ecke `c` enthält das Muster an Position `j` den Vektor
/// `d / (|d| + 0.05)²` mit `d = p_j - c` und `p_j` aus `linspace(0, 1, size)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Stencil {
    size: usize,
    dimensions: usize,
    corners: Vec<(Corner, GradientGrid)>,
}

impl Stencil {
    pub fn new(size: usize, dimensions: usize) -> MathResult<Self> {
        if size == 0 {
            return Err(MathError::InvalidConfiguration {
                message: "Stencil size must be at least 1.".to_string(),
            });
        }
        if dimensions == 0 {
            return Err(MathError::InvalidConfiguration {
                message: "Stencil needs at least one dimension.".to_string(),
            });
        }

        let corner_count = u32::try_from(dimensions)
            .ok()
            .and_then(|d| 1usize.checked_shl(d))
            .ok_or(MathError::UnsupportedDimensions {
                operation: "stencil",
                dimensions,
            })?;

        let positions = linspace(0.0, 1.0, size);
        let extent = vec![size; dimensions];
        let mut shape = extent.clone();
        shape.push(dimensions);

        let corners = (0..corner_count)
            .map(|mask| {
                let corner = Corner::from_mask(mask, dimensions);
                let mut pattern = NdGrid::filled(&shape, 0.0);
                for index in IndexIter::new(&extent) {
                    let lane = pattern.lane_mut(&index);
                    for (axis, &i) in index.iter().enumerate() {
                        lane[axis] = positions[i] - Float::from(corner.0[axis]);
                    }
                    let length = lane.iter().map(|d| d * d).sum::<Float>().sqrt();
                    let scale = (length + STENCIL_SOFTENING).powi(2);
                    lane.iter_mut().for_each(|d| *d /= scale);
                }
                (corner, pattern)
            })
            .collect();

        Ok(Self {
            size,
            dimensions,
            corners,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Muster der Form `[size; n] + [n]` für eine Ecke.
    pub fn get(&self, corner: &Corner) -> Option<&GradientGrid> {
        self.corners
            .iter()
            .find(|(c, _)| c == corner)
            .map(|(_, pattern)| pattern)
    }

    /// Alle Ecken in Maskenreihenfolge.
    pub fn iter(&self) -> impl Iterator<Item = (&Corner, &GradientGrid)> {
        self.corners.iter().map(|(c, p)| (c, p))
    }

    // Summe der Skalarprodukte aller Eckmuster mit den Eckgradienten einer Zelle.
    fn cell_block(&self, gradient: &GradientGrid, base: &[usize]) -> Vec<Float> {
        let mut block = vec![0.0; self.size.pow(self.dimensions as u32)];
        let mut node = vec![0; self.dimensions];
        for (corner, pattern) in &self.corners {
            for axis in 0..self.dimensions {
                node[axis] = base[axis] + usize::from(corner.0[axis]);
            }
            let g = gradient.lane(&node);
            for (value, v) in block.iter_mut().zip(pattern.data().chunks(self.dimensions)) {
                *value += v.iter().zip(g).map(|(a, b)| a * b).sum::<Float>();
            }
        }
        block
    }

    /// Tastet ein Gradientengitter `[..m, n]` auf `(m_d - 1) * size` Werte pro Achse hoch.
    ///
    /// Jeder Zellblock wird entlang aller Achsen gespiegelt abgelegt.
    pub fn render(&self, gradient: &GradientGrid) -> MathResult<NdGrid<Float>> {
        let dims = self.dimensions;
        if gradient.ndim() != dims + 1 || gradient.shape()[dims] != dims {
            return Err(MathError::DimensionMismatch {
                expected: dims,
                actual: gradient.ndim().saturating_sub(1),
            });
        }
        let started = Instant::now();
        let k = self.size;
        let cells: Vec<usize> = gradient.shape()[..dims]
            .iter()
            .map(|n| n.saturating_sub(1))
            .collect();
        let out_shape: Vec<usize> = cells.iter().map(|c| c * k).collect();

        let bases: Vec<Vec<usize>> = IndexIter::new(&cells).collect();
        let blocks: Vec<Vec<Float>> = bases
            .par_iter()
            .map(|base| self.cell_block(gradient, base))
            .collect();

        let mut output = NdGrid::filled(&out_shape, 0.0);
        let local: Vec<Vec<usize>> = IndexIter::new(&vec![k; dims]).collect();
        let mut target = vec![0; dims];
        for (base, block) in bases.iter().zip(&blocks) {
            for (offset, value) in local.iter().zip(block) {
                for axis in 0..dims {
                    target[axis] = base[axis] * k + (k - 1 - offset[axis]);
                }
                output[target.as_slice()] = *value;
            }
        }

        debug!(
            "Rendered {} cells at stencil size {} into {:?} in {:?}",
            bases.len(),
            k,
            out_shape,
            started.elapsed()
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_corner_masks() {
        assert_eq!(Corner::from_mask(0b10, 2).offsets(), &[1, 0]);
        assert_eq!(Corner::from_mask(0b011, 3).offsets(), &[0, 1, 1]);
        assert_eq!(Corner::from_mask(0b10, 2).signs(), vec![-1, 1]);
        assert_eq!(Corner::from_mask(0b10, 2).opposite(), Corner::from_mask(0b01, 2));
    }

    #[test]
    fn test_stencil_has_all_corners() {
        let stencil = Stencil::new(4, 3).unwrap();
        assert_eq!(stencil.iter().count(), 8);
        for (_, pattern) in stencil.iter() {
            assert_eq!(pattern.shape(), &[4, 4, 4, 3]);
        }
    }

    #[test]
    fn test_displacement_vanishes_at_own_corner() {
        let stencil = Stencil::new(3, 2).unwrap();
        let origin = stencil.get(&Corner::from_mask(0, 2)).unwrap();
        assert_eq!(origin.lane(&[0, 0]), &[0.0, 0.0]);
        let far = stencil.get(&Corner::from_mask(0b11, 2)).unwrap();
        assert_eq!(far.lane(&[2, 2]), &[0.0, 0.0]);
        // d = (1, 0) => (1, 0) / 1.05²
        let v = origin.lane(&[2, 0]);
        assert_abs_diff_eq!(v[0], 1.0 / 1.05_f64.powi(2), epsilon = 1e-12);
        assert_abs_diff_eq!(v[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_opposite_corners_mirror() {
        let stencil = Stencil::new(5, 2).unwrap();
        let magnitude = |v: &[Float]| v.iter().map(|x| x * x).sum::<Float>().sqrt();
        for (corner, pattern) in stencil.iter() {
            let mirror = stencil.get(&corner.opposite()).unwrap();
            for index in IndexIter::new(&[5, 5]) {
                let flipped: Vec<usize> = index.iter().map(|i| 4 - i).collect();
                assert_abs_diff_eq!(
                    magnitude(pattern.lane(&index)),
                    magnitude(mirror.lane(&flipped)),
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn test_render_one_dimensional_cell() {
        // Zwei Knoten mit Gradient +1 und -1, size 2 => Positionen 0 und 1
        let gradient = NdGrid::from_vec(&[2, 1], vec![1.0, -1.0]).unwrap();
        let stencil = Stencil::new(2, 1).unwrap();
        let out = stencil.render(&gradient).unwrap();
        assert_eq!(out.shape(), &[2]);
        // Position p=1: Ecke 0 liefert 1/1.05² * 1, Ecke 1 liefert 0
        // Position p=0: Ecke 0 liefert 0, Ecke 1 liefert -1/1.05² * -1
        // Gespiegelt abgelegt: out[0] = Block[1], out[1] = Block[0]
        let expected = 1.0 / 1.05_f64.powi(2);
        assert_abs_diff_eq!(out[&[0][..]], expected, epsilon = 1e-12);
        assert_abs_diff_eq!(out[&[1][..]], expected, epsilon = 1e-12);
    }

    #[test]
    fn test_render_places_later_cells_mirrored() {
        // Zelle 1 hat die Eckgradienten -1 und 2: Block [-2e, -e] liegt gespiegelt bei 2..4
        let gradient = NdGrid::from_vec(&[3, 1], vec![1.0, -1.0, 2.0]).unwrap();
        let stencil = Stencil::new(2, 1).unwrap();
        let out = stencil.render(&gradient).unwrap();
        assert_eq!(out.shape(), &[4]);
        let e = 1.0 / 1.05_f64.powi(2);
        let expected = [e, e, -e, -2.0 * e];
        for (i, value) in expected.iter().enumerate() {
            assert_abs_diff_eq!(out[&[i][..]], *value, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rejects_unrepresentable_corner_count() {
        assert!(matches!(
            Stencil::new(1, usize::BITS as usize),
            Err(MathError::UnsupportedDimensions { .. })
        ));
    }

    #[test]
    fn test_render_rejects_wrong_dimensions() {
        let gradient = NdGrid::filled(&[3, 3, 2], 0.0);
        let stencil = Stencil::new(2, 3).unwrap();
        assert!(matches!(
            stencil.render(&gradient),
            Err(MathError::DimensionMismatch { .. })
        ));
    }
}
