// src/math/probability/noise/kernel.rs

//! Leitet aus einem Gradientenfeld ein skalares Potentialfeld ab.
//!
//! Das Gitter wird in überlappenden Fenstern verarbeitet. Innerhalb eines Fensters
//! wird der Gradient entlang eines achsenparallelen Pfads von der Fensterecke aus
//! integriert (Simpsonregel). Die Fensterbeiträge werden in einem auf doppelte
//! Größe gekachelten Puffer aufsummiert und anschließend periodisch auf die
//! Basisgröße zurückgefaltet.

use super::{Float, GradientGrid};
use crate::math::{
    error::{MathError, MathResult},
    types::{IndexIter, NdGrid},
    utils::numerical::simpson,
};
use rayon::prelude::*;
use std::time::Instant;
use tracing::debug;

/// Räumliche Dimension eines Vektorgitters `[..räumlich, n]`, geprüft auf `n == räumlich`.
fn spatial_dimensions(gradient: &GradientGrid) -> MathResult<usize> {
    let ndim = gradient.ndim();
    if ndim < 2 {
        return Err(MathError::DimensionMismatch {
            expected: 2,
            actual: ndim,
        });
    }
    let dims = ndim - 1;
    let components = gradient.shape()[dims];
    if components != dims {
        return Err(MathError::DimensionMismatch {
            expected: dims,
            actual: components,
        });
    }
    Ok(dims)
}

/// Integriert den Gradienten eines Fensters der Form `[..w, n]` zu einem
/// Potential der Form `[..w]` mit Referenz 0 in der Ecke `[0, ..., 0]`.
///
/// Für eine Zelle `j`, deren höchste von Null verschiedene Achse `a` ist, gilt
/// `P[j] = P[j mit j_a = 0] + ∫ g_a` über die Stützstellen `0..=j_a` entlang `a`.
pub fn integrate_kernel(window: &GradientGrid) -> MathResult<NdGrid<Float>> {
    let dims = spatial_dimensions(window)?;
    let extent = &window.shape()[..dims];
    let mut potential = NdGrid::filled(extent, 0.0);

    for cell in IndexIter::new(extent) {
        let Some(axis) = (0..dims).rev().find(|&d| cell[d] > 0) else {
            continue;
        };
        let mut reference = cell.clone();
        reference[axis] = 0;

        let mut probe = reference.clone();
        let samples: Vec<Float> = (0..=cell[axis])
            .map(|t| {
                probe[axis] = t;
                window.lane(&probe)[axis]
            })
            .collect();

        let value = potential[reference.as_slice()] + simpson(&samples, 1.0);
        potential[cell.as_slice()] = value;
    }
    Ok(potential)
}

/// Kachelt ein Vektorgitter periodisch auf die doppelte Ausdehnung jeder räumlichen Achse.
fn tile_doubled(gradient: &GradientGrid, base: &[usize]) -> GradientGrid {
    let dims = base.len();
    let mut shape: Vec<usize> = base.iter().map(|s| 2 * s).collect();
    shape.push(dims);
    let mut tiled = NdGrid::filled(&shape, 0.0);
    let mut source = vec![0; dims];
    for index in IndexIter::new(&shape[..dims]) {
        for (axis, &i) in index.iter().enumerate() {
            source[axis] = i % base[axis];
        }
        tiled.lane_mut(&index).copy_from_slice(gradient.lane(&source));
    }
    tiled
}

fn extract_window(tiled: &GradientGrid, origin: &[usize], extent: &[usize]) -> GradientGrid {
    let dims = extent.len();
    let mut shape = extent.to_vec();
    shape.push(dims);
    let mut window = NdGrid::filled(&shape, 0.0);
    let mut source = vec![0; dims];
    for local in IndexIter::new(extent) {
        for axis in 0..dims {
            source[axis] = origin[axis] + local[axis];
        }
        window.lane_mut(&local).copy_from_slice(tiled.lane(&source));
    }
    window
}

/// Skalarfeld aus einem Gradientengitter `[..s, n]` mit Fenstergröße `window_size`,
/// normiert auf [0, 1].
///
/// Die Fensterausdehnung pro Achse ist `min(window_size, s_d)`. Ist das Ergebnis
/// vor der Normierung konstant, besteht das Feld vollständig aus NaN.
pub fn kernel_method(gradient: &GradientGrid, window_size: usize) -> MathResult<NdGrid<Float>> {
    let dims = spatial_dimensions(gradient)?;
    if window_size == 0 {
        return Err(MathError::InvalidConfiguration {
            message: "Kernel window size must be at least 1.".to_string(),
        });
    }
    let started = Instant::now();
    let base = gradient.shape()[..dims].to_vec();
    let extent: Vec<usize> = base.iter().map(|&s| s.min(window_size)).collect();
    let doubled: Vec<usize> = base.iter().map(|s| 2 * s).collect();

    let tiled = tile_doubled(gradient, &base);
    let origins: Vec<Vec<usize>> = IndexIter::new(&base).collect();
    let potentials = origins
        .par_iter()
        .map(|origin| integrate_kernel(&extract_window(&tiled, origin, &extent)))
        .collect::<MathResult<Vec<_>>>()?;

    // Feste Summationsreihenfolge: Fenster in row-major Reihenfolge
    let mut accumulator = NdGrid::filled(&doubled, 0.0);
    let local: Vec<Vec<usize>> = IndexIter::new(&extent).collect();
    let mut target = vec![0; dims];
    for (origin, potential) in origins.iter().zip(&potentials) {
        for (offset, value) in local.iter().zip(potential.data()) {
            for axis in 0..dims {
                target[axis] = origin[axis] + offset[axis];
            }
            accumulator[target.as_slice()] += value;
        }
    }

    let blend = extent.iter().product::<usize>() as Float;
    accumulator.data_mut().iter_mut().for_each(|v| *v /= blend);

    // Periodische Rückfaltung des Überlaufs auf die Basisgröße
    let mut field = NdGrid::filled(&base, 0.0);
    let mut wrapped = vec![0; dims];
    for index in accumulator.indices() {
        for axis in 0..dims {
            wrapped[axis] = index[axis] % base[axis];
        }
        field[wrapped.as_slice()] += accumulator[index.as_slice()];
    }

    debug!(
        "Kernel integration over {:?} with {} windows of {:?} in {:?}",
        base,
        origins.len(),
        extent,
        started.elapsed()
    );
    Ok(field.normalized())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn constant_gradient(extent: &[usize], vector: &[Float]) -> GradientGrid {
        let mut shape = extent.to_vec();
        shape.push(vector.len());
        let mut grid = NdGrid::filled(&shape, 0.0);
        for index in IndexIter::new(extent) {
            grid.lane_mut(&index).copy_from_slice(vector);
        }
        grid
    }

    #[test]
    fn test_constant_gradient_gives_plane() {
        let window = constant_gradient(&[3, 3], &[0.5, -2.0]);
        let potential = integrate_kernel(&window).unwrap();
        for index in IndexIter::new(&[3, 3]) {
            let expected = 0.5 * index[0] as Float - 2.0 * index[1] as Float;
            assert_abs_diff_eq!(potential[index.as_slice()], expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_linear_gradient_integrates_to_parabola() {
        // g(x) = x  =>  P(x) = x² / 2
        let window = NdGrid::from_vec(&[5, 1], vec![0.0, 1.0, 2.0, 3.0, 4.0]).unwrap();
        let potential = integrate_kernel(&window).unwrap();
        for x in 0..5 {
            let expected = (x * x) as Float / 2.0;
            assert_abs_diff_eq!(potential[&[x][..]], expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_field_is_normalized() {
        let mut grid = NdGrid::filled(&[4, 5, 2], 0.0);
        for (i, v) in grid.data_mut().iter_mut().enumerate() {
            *v = ((i * 7919) % 13) as Float / 13.0 - 0.5;
        }
        let field = kernel_method(&grid, 3).unwrap();
        assert_eq!(field.shape(), &[4, 5]);
        let (min, max) = field.value_range();
        assert_abs_diff_eq!(min, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(max, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_overflow_folds_back_periodically() {
        // Fensterpotentiale [0, 0, -1/3], [0, 0.5, 8/3], [0, 1.5, 5/3],
        // gefaltet: [25/18, 10/18, 1/18] => normiert [1, 0.375, 0]
        let grid = NdGrid::from_vec(&[3, 1], vec![1.0, -1.0, 2.0]).unwrap();
        let field = kernel_method(&grid, 3).unwrap();
        assert_abs_diff_eq!(field[&[0][..]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(field[&[1][..]], 0.375, epsilon = 1e-12);
        assert_abs_diff_eq!(field[&[2][..]], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_window_is_clamped_to_grid() {
        let grid = NdGrid::from_vec(&[2, 1], vec![1.0, -1.0]).unwrap();
        let field = kernel_method(&grid, 9).unwrap();
        assert_eq!(field.shape(), &[2]);
    }

    #[test]
    fn test_zero_gradient_is_degenerate() {
        let grid = constant_gradient(&[3, 3], &[0.0, 0.0]);
        let field = kernel_method(&grid, 3).unwrap();
        assert!(field.data().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_rejects_malformed_gradient() {
        let grid = NdGrid::filled(&[3, 3, 3], 0.0);
        assert!(matches!(
            kernel_method(&grid, 3),
            Err(MathError::DimensionMismatch { .. })
        ));
        let grid = NdGrid::filled(&[3, 3, 2], 0.0);
        assert!(matches!(
            kernel_method(&grid, 0),
            Err(MathError::InvalidConfiguration { .. })
        ));
    }
}
