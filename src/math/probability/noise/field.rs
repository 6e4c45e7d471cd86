// src/math/probability/noise/field.rs

use super::{
    Float, GradientGrid,
    cache::KeyedCache,
    config::NoiseFieldConfig,
    kernel::kernel_method,
    octave::NoiseOctave,
    spectrum::{fft2, mean_magnitudes},
    stencil::Stencil,
};
use crate::math::{error::MathResult, types::NdGrid};
use rayon::prelude::*;
use rustfft::num_complex::Complex;
use std::hash::{Hash, Hasher};
use std::sync::{
    Arc, OnceLock,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Instant;
use tracing::{debug, info, trace};

/// Mehrschichtiges Gradienten-Rauschfeld.
///
/// Alle abgeleiteten Größen (Gradientengitter, Skalarfeld, Spektrum, Stencils,
/// Renderings) werden beim ersten Zugriff berechnet und danach unverändert
/// wiederverwendet. Das Feld ist nach der Konstruktion unveränderlich, es gibt
/// daher keine Invalidierung.
#[derive(Debug)]
pub struct NoiseField {
    config: NoiseFieldConfig,
    layers: Vec<NoiseOctave>,
    generations: Arc<AtomicUsize>,
    gradient: OnceLock<MathResult<GradientGrid>>,
    scalar_field: OnceLock<MathResult<NdGrid<Float>>>,
    fft: OnceLock<MathResult<NdGrid<Complex<Float>>>>,
    freqs: OnceLock<MathResult<Vec<Vec<Float>>>>,
    stencils: KeyedCache<usize, Stencil>,
    renders: KeyedCache<(usize, bool), NdGrid<Float>>,
}

impl NoiseField {
    pub fn new(config: NoiseFieldConfig) -> MathResult<Self> {
        config.validate()?;
        let generations = Arc::new(AtomicUsize::new(0));
        let layers = (0..config.octaves)
            .map(|octave| NoiseOctave::new(&config, octave, Arc::clone(&generations)))
            .collect::<MathResult<Vec<_>>>()?;
        Ok(Self {
            config,
            layers,
            generations,
            gradient: OnceLock::new(),
            scalar_field: OnceLock::new(),
            fft: OnceLock::new(),
            freqs: OnceLock::new(),
            stencils: KeyedCache::new(),
            renders: KeyedCache::new(),
        })
    }

    pub fn config(&self) -> &NoiseFieldConfig {
        &self.config
    }

    pub fn shape(&self) -> &[usize] {
        &self.config.shape
    }

    pub fn dimensions(&self) -> usize {
        self.config.dimensions()
    }

    pub fn seed(&self) -> u64 {
        self.config.seed
    }

    /// `density^dimensions`: Knotenzuwachs pro Oktave.
    pub fn real_density(&self) -> usize {
        self.config.density.pow(self.dimensions() as u32)
    }

    /// Oktaven in Indexreihenfolge, die letzte ist die feinste.
    pub fn octave_layers(&self) -> &[NoiseOctave] {
        &self.layers
    }

    /// Wie oft bisher ein Oktavgitter erzeugt wurde.
    pub fn octave_generations(&self) -> usize {
        self.generations.load(Ordering::Relaxed)
    }

    fn finest(&self) -> &NoiseOctave {
        // `validate` garantiert mindestens eine Oktave
        &self.layers[self.layers.len() - 1]
    }

    /// Knotenkoordinaten der feinsten Oktave.
    pub fn points(&self) -> NdGrid<Float> {
        self.finest().points()
    }

    /// Summe aller Oktaven auf dem Gitter der feinsten Oktave, Form `[..shape, n]`.
    pub fn gradient(&self) -> MathResult<&GradientGrid> {
        self.gradient
            .get_or_init(|| self.compose_gradient())
            .as_ref()
            .map_err(Clone::clone)
    }

    fn compose_gradient(&self) -> MathResult<GradientGrid> {
        let started = Instant::now();
        let finest = self.finest();
        let points = finest.points();
        let last = self.layers.len() - 1;

        let contributions = self
            .layers
            .par_iter()
            .enumerate()
            .map(|(i, layer)| {
                if i == last {
                    layer.gradient_grid().cloned()
                } else {
                    layer.interpolated_gradient(&points)
                }
            })
            .collect::<MathResult<Vec<_>>>()?;

        // Summation in Oktavreihenfolge
        let mut contributions = contributions.into_iter();
        let mut sum = contributions
            .next()
            .unwrap_or_else(|| NdGrid::filled(&[0], 0.0));
        for contribution in contributions {
            for (acc, v) in sum.data_mut().iter_mut().zip(contribution.data()) {
                *acc += v;
            }
        }

        info!(
            "Composed gradient of {} octaves on grid {:?} in {:?}",
            self.layers.len(),
            finest.shape(),
            started.elapsed()
        );
        Ok(sum)
    }

    /// Auf [0, 1] normiertes Potentialfeld aus der Kernel-Integration des Gradienten.
    pub fn scalar_field(&self) -> MathResult<&NdGrid<Float>> {
        self.scalar_field
            .get_or_init(|| kernel_method(self.gradient()?, self.config.window_size))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// 2-D DFT des Skalarfelds. Nur für zweidimensionale Felder.
    pub fn fft(&self) -> MathResult<&NdGrid<Complex<Float>>> {
        self.fft
            .get_or_init(|| fft2(self.scalar_field()?))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Mittleres Betragsspektrum pro Achse.
    pub fn freqs(&self) -> MathResult<&[Vec<Float>]> {
        self.freqs
            .get_or_init(|| Ok(mean_magnitudes(self.fft()?)))
            .as_ref()
            .map(Vec::as_slice)
            .map_err(Clone::clone)
    }

    /// Stencil für `size` Abtastwerte pro Zelle und Achse, pro Größe zwischengespeichert.
    pub fn stencil(&self, size: usize) -> MathResult<Arc<Stencil>> {
        self.stencils.get_or_compute(size, || {
            debug!("Building stencil of size {} for {} dimensions", size, self.dimensions());
            Stencil::new(size, self.dimensions())
        })
    }

    /// Rauschen mit `size` Pixeln pro Gitterzelle, Form `(gradient.shape[d] - 1) * size`.
    ///
    /// Mit `normalize` auf [0, 1] skaliert; ein konstantes Ergebnis wird dann zu NaN.
    /// Ergebnisse sind pro `(size, normalize)` zwischengespeichert; wiederholte
    /// Aufrufe liefern dasselbe `Arc`.
    pub fn render_noise(&self, size: usize, normalize: bool) -> MathResult<Arc<NdGrid<Float>>> {
        let key = (size, normalize);
        if self.renders.contains(&key) {
            trace!("render_noise({}, {}): cache hit", size, normalize);
        }
        self.renders.get_or_compute(key, || {
            debug!("render_noise({}, {}): cache miss", size, normalize);
            let raw = self.stencil(size)?.render(self.gradient()?)?;
            Ok(if normalize { raw.normalized() } else { raw })
        })
    }
}

// Identität eines Felds ist seine Konfiguration.
impl PartialEq for NoiseField {
    fn eq(&self, other: &Self) -> bool {
        self.config == other.config
    }
}

impl Eq for NoiseField {}

impl Hash for NoiseField {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.config.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::types::IndexIter;
    use approx::assert_abs_diff_eq;

    fn field(octaves: u32) -> NoiseField {
        NoiseField::new(
            NoiseFieldConfig::new()
                .with_shape(&[3, 2])
                .with_seed(17)
                .with_octaves(octaves)
                .with_density(2),
        )
        .unwrap()
    }

    #[test]
    fn test_layers_follow_config() {
        let field = field(3);
        assert_eq!(field.octave_layers().len(), 3);
        assert_eq!(field.octave_layers()[2].shape(), &[12, 8]);
        assert_eq!(field.real_density(), 4);
        assert_eq!(field.octave_generations(), 0);
    }

    #[test]
    fn test_gradient_sums_octaves_on_finest_grid() {
        let field = field(2);
        let gradient = field.gradient().unwrap();
        assert_eq!(gradient.shape(), &[6, 4, 2]);

        let coarse = &field.octave_layers()[0];
        let fine = field.octave_layers()[1].gradient_grid().unwrap();
        let points = field.points();
        for index in IndexIter::new(&[6, 4]) {
            let expected = coarse.interpolate_at(points.lane(&index)).unwrap();
            for axis in 0..2 {
                assert_abs_diff_eq!(
                    gradient.lane(&index)[axis],
                    expected[axis] + fine.lane(&index)[axis],
                    epsilon = 1e-12
                );
            }
        }
        assert_eq!(field.octave_generations(), 2);
    }

    #[test]
    fn test_single_octave_gradient_is_native_grid() {
        let field = field(1);
        assert_eq!(
            field.gradient().unwrap(),
            field.octave_layers()[0].gradient_grid().unwrap()
        );
    }

    #[test]
    fn test_render_shape_and_range() {
        let field = field(2);
        let rendered = field.render_noise(3, true).unwrap();
        assert_eq!(rendered.shape(), &[15, 9]);
        let (min, max) = rendered.value_range();
        assert_abs_diff_eq!(min, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(max, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_render_is_memoized_per_key() {
        let field = field(2);
        let a = field.render_noise(4, true).unwrap();
        let b = field.render_noise(4, true).unwrap();
        let raw = field.render_noise(4, false).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &raw));
        assert!(Arc::ptr_eq(&field.stencil(4).unwrap(), &field.stencil(4).unwrap()));
        assert_eq!(field.octave_generations(), 2);
    }

    #[test]
    fn test_render_rejects_zero_size() {
        assert!(field(1).render_noise(0, true).is_err());
    }

    #[test]
    fn test_scalar_field_and_spectrum() {
        let field = field(2);
        let scalar = field.scalar_field().unwrap();
        assert_eq!(scalar.shape(), &[6, 4]);
        let spectrum = field.fft().unwrap();
        let total: Float = scalar.data().iter().sum();
        assert_abs_diff_eq!(spectrum[&[0, 0][..]].re, total, epsilon = 1e-9);
        let freqs = field.freqs().unwrap();
        assert_eq!(freqs.len(), 2);
        assert_eq!(freqs[0].len(), 6);
        assert_eq!(freqs[1].len(), 4);
    }

    #[test]
    fn test_identity_is_config() {
        assert_eq!(field(2), field(2));
        assert_ne!(field(2), field(3));
    }
}
