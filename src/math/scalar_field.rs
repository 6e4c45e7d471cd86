// src/math/scalar_field.rs

use crate::math::types::NdGrid;

/// Trait für ein zweidimensionales Skalarfeld.
/// Schnittstelle zur Bildschicht: die Farbabbildung liefert der Aufrufer.
pub trait ScalarField2D {
    /// Gibt die Breite des Feldes in Zellen zurück.
    fn width(&self) -> usize;

    /// Gibt die Höhe des Feldes in Zellen zurück.
    fn height(&self) -> usize;

    /// Gibt den Skalarwert an der Zelle (x_idx, y_idx) zurück.
    /// Außerhalb der Grenzen wird 0.0 geliefert.
    fn get_value(&self, x_idx: usize, y_idx: usize) -> f64;

    /// Wendet `color` auf jede Zelle an, Zeile für Zeile, 4 Bytes pro Zelle.
    fn to_rgba<F>(&self, color: F) -> Vec<u8>
    where
        F: Fn(f64) -> (u8, u8, u8, u8),
    {
        let mut pixels = Vec::with_capacity(self.width() * self.height() * 4);
        for y in 0..self.height() {
            for x in 0..self.width() {
                let (r, g, b, a) = color(self.get_value(x, y));
                pixels.extend_from_slice(&[r, g, b, a]);
            }
        }
        pixels
    }
}

// Achse 0 sind Zeilen (y), Achse 1 Spalten (x). Andere Dimensionen haben keine Fläche.
impl ScalarField2D for NdGrid<f64> {
    fn width(&self) -> usize {
        if self.ndim() == 2 { self.shape()[1] } else { 0 }
    }

    fn height(&self) -> usize {
        if self.ndim() == 2 { self.shape()[0] } else { 0 }
    }

    fn get_value(&self, x_idx: usize, y_idx: usize) -> f64 {
        self.get(&[y_idx, x_idx]).copied().unwrap_or(0.0)
    }
}
