// src/math/types/grid.rs

use crate::math::error::{MathError, MathResult};
use std::ops::{Index, IndexMut};

/// N-dimensionales Gitter über einem flachen Puffer.
/// Die Daten werden zeilenweise (row-major) gespeichert, die letzte Achse
/// läuft am schnellsten.
#[derive(Debug, Clone, PartialEq)]
pub struct NdGrid<T> {
    shape: Vec<usize>,
    strides: Vec<usize>,
    data: Vec<T>,
}

/// Berechnet die Strides für ein row-major Layout.
fn strides_for(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }
    strides
}

impl<T: Clone> NdGrid<T> {
    /// Erstellt ein Gitter, in dem jede Zelle `value` enthält.
    pub fn filled(shape: &[usize], value: T) -> Self {
        let len = shape.iter().product();
        Self {
            shape: shape.to_vec(),
            strides: strides_for(shape),
            data: vec![value; len],
        }
    }
}

impl<T> NdGrid<T> {
    /// Übernimmt einen flachen Puffer. Die Länge muss zum Shape passen.
    pub fn from_vec(shape: &[usize], data: Vec<T>) -> MathResult<Self> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(MathError::DimensionMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            shape: shape.to_vec(),
            strides: strides_for(shape),
            data,
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Flacher Offset eines vollständigen oder führenden Index.
    /// Ein kürzerer Index adressiert den Beginn des entsprechenden Teilblocks.
    #[inline]
    pub fn offset(&self, index: &[usize]) -> usize {
        debug_assert!(index.len() <= self.shape.len());
        index
            .iter()
            .zip(&self.strides)
            .map(|(i, stride)| i * stride)
            .sum()
    }

    pub fn get(&self, index: &[usize]) -> Option<&T> {
        if self.contains(index) {
            self.data.get(self.offset(index))
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, index: &[usize]) -> Option<&mut T> {
        if self.contains(index) {
            let offset = self.offset(index);
            self.data.get_mut(offset)
        } else {
            None
        }
    }

    fn contains(&self, index: &[usize]) -> bool {
        index.len() == self.shape.len() && index.iter().zip(&self.shape).all(|(i, d)| i < d)
    }

    /// Zusammenhängender Abschnitt entlang der letzten Achse.
    /// Bei Vektorgittern (`[..räumlich, n]`) ist das der Vektor am Knoten `index`.
    pub fn lane(&self, index: &[usize]) -> &[T] {
        debug_assert_eq!(index.len() + 1, self.shape.len());
        let start = self.offset(index);
        let width = self.shape.last().copied().unwrap_or(1);
        &self.data[start..start + width]
    }

    pub fn lane_mut(&mut self, index: &[usize]) -> &mut [T] {
        debug_assert_eq!(index.len() + 1, self.shape.len());
        let start = self.offset(index);
        let width = self.shape.last().copied().unwrap_or(1);
        &mut self.data[start..start + width]
    }

    /// Alle Indizes des Gitters in row-major Reihenfolge.
    pub fn indices(&self) -> IndexIter {
        IndexIter::new(&self.shape)
    }

    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> NdGrid<U> {
        NdGrid {
            shape: self.shape.clone(),
            strides: self.strides.clone(),
            data: self.data.iter().map(f).collect(),
        }
    }
}

impl NdGrid<f64> {
    /// (min, max) über alle Werte. NaN-Werte werden ignoriert.
    pub fn value_range(&self) -> (f64, f64) {
        self.data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }

    /// Skaliert linear auf [0, 1] via `(x - min) / (max - min)`.
    ///
    /// Ein konstantes Feld ergibt 0/0 und damit durchgehend NaN.
    pub fn normalized(&self) -> Self {
        let (min, max) = self.value_range();
        let range = max - min;
        self.map(|&v| (v - min) / range)
    }
}

impl<T> Index<&[usize]> for NdGrid<T> {
    type Output = T;

    fn index(&self, index: &[usize]) -> &T {
        &self.data[self.offset(index)]
    }
}

impl<T> IndexMut<&[usize]> for NdGrid<T> {
    fn index_mut(&mut self, index: &[usize]) -> &mut T {
        let offset = self.offset(index);
        &mut self.data[offset]
    }
}

/// Iteriert alle Indextupel eines Shapes in row-major Reihenfolge.
#[derive(Debug, Clone)]
pub struct IndexIter {
    shape: Vec<usize>,
    current: Option<Vec<usize>>,
}

impl IndexIter {
    pub fn new(shape: &[usize]) -> Self {
        let current = if shape.contains(&0) {
            None
        } else {
            Some(vec![0; shape.len()])
        };
        Self {
            shape: shape.to_vec(),
            current,
        }
    }
}

impl Iterator for IndexIter {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.current.take()?;
        let mut next = current.clone();
        for axis in (0..next.len()).rev() {
            next[axis] += 1;
            if next[axis] < self.shape[axis] {
                self.current = Some(next);
                break;
            }
            next[axis] = 0;
        }
        Some(current)
    }
}
