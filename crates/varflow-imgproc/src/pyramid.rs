use varflow_image::{Image, ImageError, ImageView};

use crate::filter::gaussian_blur;
use crate::interpolation::InterpolationMode;
use crate::parallel::ExecutionStrategy;
use crate::resize::resize_by_factor;

/// Downsampling ratio used when the requested one is outside [`MIN_RATIO`, `MAX_RATIO`].
pub const DEFAULT_RATIO: f64 = 0.75;

/// Smallest accepted downsampling ratio between consecutive levels.
pub const MIN_RATIO: f64 = 0.4;

/// Largest accepted downsampling ratio between consecutive levels.
pub const MAX_RATIO: f64 = 0.98;

/// The downsampling ratio actually used for a requested `ratio`.
///
/// Values outside `[0.4, 0.98]` (including NaN) fall back to [`DEFAULT_RATIO`].
///
/// # Examples
///
/// ```
/// use varflow_imgproc::pyramid::effective_ratio;
///
/// assert_eq!(effective_ratio(0.5), 0.5);
/// assert_eq!(effective_ratio(0.2), 0.75);
/// assert_eq!(effective_ratio(1.0), 0.75);
/// ```
pub fn effective_ratio(ratio: f64) -> f64 {
    if (MIN_RATIO..=MAX_RATIO).contains(&ratio) {
        ratio
    } else {
        DEFAULT_RATIO
    }
}

/// Number of pyramid levels for an image of `width` pixels.
///
/// Computed as `trunc(ln(min_width / width) / ln(ratio))` with a minimum of one level,
/// after `ratio` has gone through [`effective_ratio`].
///
/// # Examples
///
/// ```
/// use varflow_imgproc::pyramid::num_levels;
///
/// assert_eq!(num_levels(480, 0.75, 30), 9);
/// assert_eq!(num_levels(20, 0.75, 30), 1);
/// ```
pub fn num_levels(width: usize, ratio: f64, min_width: usize) -> usize {
    let ratio = effective_ratio(ratio);
    let levels = ((min_width as f64 / width as f64).ln() / ratio.ln()) as i64;
    levels.max(1) as usize
}

// Past this level the pyramid smooths an earlier level instead of the full
// resolution image, which keeps the kernel size bounded.
fn crossover_level(ratio: f64) -> usize {
    ((0.25f64).ln() / ratio.ln()) as usize
}

/// A Gaussian image pyramid.
///
/// Level 0 is an exact copy of the input and each following level is smaller by
/// `ratio`. Levels up to the crossover index `trunc(ln(0.25) / ln(ratio))` are
/// obtained by smoothing the full resolution image with `sigma = (1 / ratio - 1) * i`
/// and resizing it by `ratio^i`. Deeper levels smooth level `i - crossover` with the
/// crossover sigma and resize it to the same nominal scale.
#[derive(Debug, Clone)]
pub struct GaussianPyramid<const C: usize> {
    levels: Vec<Image<f64, C>>,
    ratio: f64,
}

impl<const C: usize> GaussianPyramid<C> {
    /// Build a pyramid whose coarsest level is about `min_width` pixels wide.
    ///
    /// # Arguments
    ///
    /// * `image` - The full resolution image, copied into level 0.
    /// * `ratio` - The downsampling ratio between consecutive levels.
    /// * `min_width` - The target width of the coarsest level.
    /// * `strategy` - The execution strategy of the smoothing and resizing kernels.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is empty or a buffer cannot be allocated.
    pub fn new(
        image: ImageView<'_, f64, C>,
        ratio: f64,
        min_width: usize,
        strategy: ExecutionStrategy,
    ) -> Result<Self, ImageError> {
        let effective = effective_ratio(ratio);
        if effective != ratio {
            log::warn!(
                "pyramid ratio {ratio} is outside [{MIN_RATIO}, {MAX_RATIO}], using {effective}"
            );
        }
        let n_levels = num_levels(image.width(), ratio, min_width);
        Self::with_levels(image, ratio, n_levels, strategy)
    }

    /// Build a pyramid with an explicit number of levels (at least one).
    ///
    /// The ratio is defaulted like in [`GaussianPyramid::new`], without a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is empty or a buffer cannot be allocated.
    pub fn with_levels(
        image: ImageView<'_, f64, C>,
        ratio: f64,
        n_levels: usize,
        strategy: ExecutionStrategy,
    ) -> Result<Self, ImageError> {
        let size = image.size();
        if size.is_empty() {
            return Err(ImageError::InvalidImageSize(size.width, size.height, 1, 1));
        }

        let ratio = effective_ratio(ratio);
        let n_levels = n_levels.max(1);
        let mut levels = Vec::new();
        levels
            .try_reserve_exact(n_levels)
            .map_err(|_| ImageError::AllocationFailed(n_levels))?;
        levels.push(image.to_image()?);

        let base_sigma = 1.0 / ratio - 1.0;
        let crossover = crossover_level(ratio);
        let crossover_sigma = base_sigma * crossover as f64;

        for i in 1..n_levels {
            let nominal_scale = ratio.powi(i as i32);
            let (source, sigma, factor) = if i <= crossover {
                (&levels[0], base_sigma * i as f64, nominal_scale)
            } else {
                let source = &levels[i - crossover];
                let factor = nominal_scale * size.width as f64 / source.width() as f64;
                (source, crossover_sigma, factor)
            };

            let mut smoothed = Image::from_size_val(source.size(), 0.0)?;
            gaussian_blur(source, &mut smoothed, sigma, (3.0 * sigma) as usize, strategy)?;
            let level = resize_by_factor(&smoothed, factor, InterpolationMode::Bicubic, strategy)?;
            levels.push(level);
        }

        log::debug!(
            "gaussian pyramid: {} levels, ratio {}, {}x{} -> {}x{}",
            levels.len(),
            ratio,
            size.width,
            size.height,
            levels[levels.len() - 1].width(),
            levels[levels.len() - 1].height(),
        );

        Ok(Self { levels, ratio })
    }

    /// Number of levels in the pyramid.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// A pyramid always holds at least level 0.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// The ratio the pyramid was built with, after defaulting.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// The image at `level`, 0 being the full resolution.
    pub fn level(&self, level: usize) -> Option<&Image<f64, C>> {
        self.levels.get(level)
    }

    /// All levels from finest to coarsest.
    pub fn levels(&self) -> &[Image<f64, C>] {
        &self.levels
    }

    /// Consume the pyramid and return its levels from finest to coarsest.
    pub fn into_levels(self) -> Vec<Image<f64, C>> {
        self.levels
    }
}
