// src/math/probability/noise/spectrum.rs

//! Frequenzdiagnose für Skalarfelder.

use super::Float;
use crate::math::{
    error::{MathError, MathResult},
    types::NdGrid,
};
use rustfft::{FftPlanner, num_complex::Complex};

/// Zweidimensionale diskrete Fouriertransformation (Zeilen, dann Spalten), nicht normiert.
pub fn fft2(field: &NdGrid<Float>) -> MathResult<NdGrid<Complex<Float>>> {
    if field.ndim() != 2 {
        return Err(MathError::UnsupportedDimensions {
            operation: "fft",
            dimensions: field.ndim(),
        });
    }
    let (rows, cols) = (field.shape()[0], field.shape()[1]);
    let mut data: Vec<Complex<Float>> = field.data().iter().map(|&v| Complex::new(v, 0.0)).collect();
    if data.is_empty() {
        return NdGrid::from_vec(field.shape(), data);
    }
    let mut planner = FftPlanner::<Float>::new();

    let row_fft = planner.plan_fft_forward(cols);
    for row in data.chunks_exact_mut(cols) {
        row_fft.process(row);
    }

    let col_fft = planner.plan_fft_forward(rows);
    let mut column = vec![Complex::new(0.0, 0.0); rows];
    for col in 0..cols {
        for (r, value) in column.iter_mut().enumerate() {
            *value = data[r * cols + col];
        }
        col_fft.process(&mut column);
        for (r, value) in column.iter().enumerate() {
            data[r * cols + col] = *value;
        }
    }
    NdGrid::from_vec(field.shape(), data)
}

/// Mittlerer Betrag des Spektrums pro Achse: Eintrag `a` hat die Länge `shape[a]`
/// und mittelt über alle übrigen Achsen.
pub fn mean_magnitudes(spectrum: &NdGrid<Complex<Float>>) -> Vec<Vec<Float>> {
    let shape = spectrum.shape();
    let mut sums: Vec<Vec<Float>> = shape.iter().map(|&d| vec![0.0; d]).collect();
    for index in spectrum.indices() {
        let magnitude = spectrum[index.as_slice()].norm();
        for (axis, &i) in index.iter().enumerate() {
            sums[axis][i] += magnitude;
        }
    }
    for (axis, sum) in sums.iter_mut().enumerate() {
        let others = (spectrum.len() / shape[axis].max(1)) as Float;
        sum.iter_mut().for_each(|s| *s /= others);
    }
    sums
}
