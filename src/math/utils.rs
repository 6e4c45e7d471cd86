// src/math/utils.rs

/// Mathematische Konstanten
pub mod constants {
    /// Abstand, der bei der Stencil-Normierung auf die Verschiebungslänge addiert wird,
    /// damit die Ecke selbst keine Singularität erzeugt.
    pub const STENCIL_SOFTENING: f64 = 0.05;
    /// Standard-Fenstergröße der Kernel-Integration.
    pub const DEFAULT_WINDOW_SIZE: usize = 3;
}

/// Numerische Algorithmen
pub mod numerical {
    /// `num` gleichmäßig verteilte Werte in [start, stop], Endpunkt inklusive.
    /// Für `num == 1` wird nur `start` geliefert.
    pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
        match num {
            0 => Vec::new(),
            1 => vec![start],
            _ => {
                let step = (stop - start) / (num - 1) as f64;
                (0..num)
                    .map(|i| {
                        if i == num - 1 {
                            stop
                        } else {
                            start + step * i as f64
                        }
                    })
                    .collect()
            }
        }
    }

    /// Integriert äquidistante Stützwerte mit der Simpsonregel.
    ///
    /// - ein Stützwert: 0
    /// - ein Intervall: Trapezregel
    /// - gerade Intervallanzahl: zusammengesetzte Simpsonregel
    /// - ungerade Intervallanzahl: Simpson über alle bis auf das letzte Intervall,
    ///   das letzte Intervall mit `h (5/12 y_N + 2/3 y_{N-1} - 1/12 y_{N-2})`
    pub fn simpson(samples: &[f64], dx: f64) -> f64 {
        let n = samples.len();
        match n {
            0 | 1 => 0.0,
            2 => 0.5 * dx * (samples[0] + samples[1]),
            _ if (n - 1) % 2 == 0 => composite_simpson(samples, dx),
            _ => {
                let head = composite_simpson(&samples[..n - 1], dx);
                let tail = dx
                    * (5.0 / 12.0 * samples[n - 1] + 2.0 / 3.0 * samples[n - 2]
                        - 1.0 / 12.0 * samples[n - 3]);
                head + tail
            }
        }
    }

    // Erwartet eine gerade Anzahl von Intervallen.
    fn composite_simpson(samples: &[f64], dx: f64) -> f64 {
        let last = samples.len() - 1;
        let interior: f64 = samples[1..last]
            .iter()
            .enumerate()
            .map(|(i, y)| if i % 2 == 0 { 4.0 * y } else { 2.0 * y })
            .sum();
        dx / 3.0 * (samples[0] + interior + samples[last])
    }
}
