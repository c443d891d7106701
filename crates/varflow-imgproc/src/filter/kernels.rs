/// Create a gaussian blur kernel.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel.
/// * `sigma` - The sigma of the gaussian kernel.
///
/// # Returns
///
/// A normalized vector of the kernel.
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f64) -> Vec<f64> {
    let mut kernel = Vec::with_capacity(kernel_size);

    let mean = kernel_size.saturating_sub(1) as f64 / 2.0;
    let sigma_sq = sigma * sigma;

    // compute the kernel
    for i in 0..kernel_size {
        let x = i as f64 - mean;
        kernel.push((-(x * x) / (2.0 * sigma_sq)).exp());
    }

    // normalize the kernel
    let norm = kernel.iter().sum::<f64>();
    kernel.iter_mut().for_each(|k| *k /= norm);
    kernel
}

/// Five point centered first derivative stencil, `[1, -8, 0, 8, -1] / 12`.
pub fn derivative_kernel_1d() -> Vec<f64> {
    vec![1.0 / 12.0, -8.0 / 12.0, 0.0, 8.0 / 12.0, -1.0 / 12.0]
}

/// Light low-pass applied to both frames before differentiation.
pub fn derivative_prefilter_kernel_1d() -> Vec<f64> {
    vec![0.02, 0.11, 0.74, 0.11, 0.02]
}

/// Three tap kernel `[1, center, 1] / (center + 2)`.
///
/// With `center = 3` this is the `[0.2, 0.6, 0.2]` kernel used to smooth the data term.
pub fn tent_kernel_1d(center: f64) -> Vec<f64> {
    let norm = center + 2.0;
    vec![1.0 / norm, center / norm, 1.0 / norm]
}
