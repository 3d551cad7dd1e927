//! Probability distributions and constrained sampling.

use rand::{Rng, rngs::StdRng};

use crate::error::{BicepError, Result};

/// Rejection rounds before a constraint is considered unsatisfiable.
const MAX_REJECTION_ROUNDS: usize = 10_000;

/// A univariate distribution that can be sampled with a seeded RNG.
pub trait Distribution {
    /// Draws one value.
    fn draw(&self, rng: &mut StdRng) -> f64;

    /// Whether the distribution has the data it needs to be sampled.
    fn is_initialized(&self) -> bool {
        true
    }

    /// Draws `n` independent values.
    fn sample(&self, rng: &mut StdRng, n: usize) -> Vec<f64> {
        (0..n).map(|_| self.draw(rng)).collect()
    }

    /// Draws exactly `n` values within `[min, max]`.
    ///
    /// Values outside the bounds are discarded and further batches of `n`
    /// are drawn until enough values remain.
    ///
    /// # Errors
    ///
    /// Returns `EmptyDistribution` if the distribution is uninitialized and
    /// `InvalidDistribution` if the bounds reject every draw.
    fn constrained_samples(
        &self,
        rng: &mut StdRng,
        n: usize,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Result<Vec<f64>> {
        if !self.is_initialized() {
            return Err(BicepError::EmptyDistribution);
        }
        if n == 0 {
            return Ok(Vec::new());
        }

        let in_bounds = |v: &f64| min.is_none_or(|lo| *v >= lo) && max.is_none_or(|hi| *v <= hi);

        let mut samples: Vec<f64> = self.sample(rng, n).into_iter().filter(in_bounds).collect();
        let mut rounds = 0;
        while samples.len() < n {
            rounds += 1;
            if rounds > MAX_REJECTION_ROUNDS {
                return Err(BicepError::InvalidDistribution(format!(
                    "bounds [{min:?}, {max:?}] reject nearly every draw"
                )));
            }
            samples.extend(self.sample(rng, n).into_iter().filter(in_bounds));
        }
        samples.truncate(n);
        Ok(samples)
    }
}

/// Standard normal draw via the Box-Muller transform.
pub fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Uniform draw on the open interval (0, 1).
fn open_unit(rng: &mut StdRng) -> f64 {
    rng.random::<f64>().clamp(1e-12, 1.0 - 1e-12)
}

/// Normal distribution with mean `mean` and standard deviation `std`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normal {
    pub mean: f64,
    pub std: f64,
}

impl Normal {
    pub fn new(mean: f64, std: f64) -> Result<Self> {
        if !(std >= 0.0) {
            return Err(BicepError::InvalidDistribution(format!(
                "normal std must be >= 0, got {std}"
            )));
        }
        Ok(Self { mean, std })
    }
}

impl Distribution for Normal {
    fn draw(&self, rng: &mut StdRng) -> f64 {
        self.mean + self.std * standard_normal(rng)
    }
}

/// Log-normal distribution parameterized like `scipy.stats.lognorm`:
/// `loc + scale * exp(shape * Z)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogNormal {
    pub shape: f64,
    pub scale: f64,
    pub loc: f64,
}

impl LogNormal {
    pub fn new(shape: f64, scale: f64, loc: f64) -> Result<Self> {
        if !(shape > 0.0 && scale > 0.0) {
            return Err(BicepError::InvalidDistribution(format!(
                "lognormal shape and scale must be > 0, got s={shape}, scale={scale}"
            )));
        }
        Ok(Self { shape, scale, loc })
    }
}

impl Distribution for LogNormal {
    fn draw(&self, rng: &mut StdRng) -> f64 {
        self.loc + self.scale * (self.shape * standard_normal(rng)).exp()
    }
}

/// Fréchet (inverse Weibull) distribution parameterized like
/// `scipy.stats.invweibull`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frechet {
    pub c: f64,
    pub scale: f64,
    pub loc: f64,
}

impl Frechet {
    pub fn new(c: f64, scale: f64, loc: f64) -> Result<Self> {
        if !(c > 0.0 && scale > 0.0) {
            return Err(BicepError::InvalidDistribution(format!(
                "frechet c and scale must be > 0, got c={c}, scale={scale}"
            )));
        }
        Ok(Self { c, scale, loc })
    }
}

impl Distribution for Frechet {
    fn draw(&self, rng: &mut StdRng) -> f64 {
        let u = open_unit(rng);
        self.loc + self.scale * (-u.ln()).powf(-1.0 / self.c)
    }
}

/// One-dimensional gaussian kernel density estimate with Scott's bandwidth.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianKde {
    data: Vec<f64>,
    bandwidth: f64,
}

impl GaussianKde {
    /// Fits the estimate to `data`, ignoring non-finite values.
    pub fn fit(data: &[f64]) -> Self {
        let data: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
        let n = data.len();
        let bandwidth = if n > 1 {
            let mean = data.iter().sum::<f64>() / n as f64;
            let var = data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            var.sqrt() * (n as f64).powf(-0.2)
        } else {
            0.0
        };
        Self { data, bandwidth }
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Distribution for GaussianKde {
    fn is_initialized(&self) -> bool {
        !self.data.is_empty()
    }

    fn draw(&self, rng: &mut StdRng) -> f64 {
        if self.data.is_empty() {
            return f64::NAN;
        }
        let center = self.data[rng.random_range(0..self.data.len())];
        center + self.bandwidth * standard_normal(rng)
    }
}

/// Equal-width histogram of `samples` over `bins` bins.
///
/// Returns `(lower_edge, upper_edge, count)` per bin; empty input or zero
/// bins yields no bins.
pub fn histogram(samples: &[f64], bins: usize) -> Vec<(f64, f64, usize)> {
    let finite: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }
    let lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = if hi > lo { (hi - lo) / bins as f64 } else { 1.0 };

    let mut counts = vec![0_usize; bins];
    for v in finite {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, c)| (lo + i as f64 * width, lo + (i + 1) as f64 * width, c))
        .collect()
}
