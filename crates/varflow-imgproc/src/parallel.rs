use rayon::prelude::*;
use varflow_image::Image;

/// Buffers with at least this many samples run in parallel under [`ExecutionStrategy::Auto`].
pub const AUTO_PARALLEL_MIN_SAMPLES: usize = 100_000;

/// Controls how the row kernels are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ExecutionStrategy {
    /// Parallel rows for large buffers, serial otherwise.
    #[default]
    Auto,

    /// Use the global Rayon thread pool to process rows in parallel.
    Parallel,

    /// Run sequentially on the current thread.
    ///
    /// Useful for small images, debugging, or when the overhead of parallelization
    /// outweighs the benefits.
    Serial,
}

impl ExecutionStrategy {
    /// Whether a buffer of `num_samples` elements should be processed in parallel.
    pub fn is_parallel(&self, num_samples: usize) -> bool {
        match self {
            ExecutionStrategy::Auto => num_samples >= AUTO_PARALLEL_MIN_SAMPLES,
            ExecutionStrategy::Parallel => true,
            ExecutionStrategy::Serial => false,
        }
    }
}

/// Apply `f(row_index, row)` to every row of a row-major buffer.
///
/// `row_len` is the number of elements per row (width times channels).
pub fn for_each_row<T, F>(data: &mut [T], row_len: usize, strategy: ExecutionStrategy, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    if row_len == 0 {
        return;
    }
    if strategy.is_parallel(data.len()) {
        data.par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(r, row)| f(r, row));
    } else {
        data.chunks_mut(row_len)
            .enumerate()
            .for_each(|(r, row)| f(r, row));
    }
}

/// Apply `f(row_index, row_a, row_b)` to the rows of two buffers with the same row count.
pub fn for_each_row_pair<T, U, F>(
    a: &mut [T],
    a_row_len: usize,
    b: &mut [U],
    b_row_len: usize,
    strategy: ExecutionStrategy,
    f: F,
) where
    T: Send,
    U: Send,
    F: Fn(usize, &mut [T], &mut [U]) + Send + Sync,
{
    if a_row_len == 0 || b_row_len == 0 {
        return;
    }
    if strategy.is_parallel(a.len() + b.len()) {
        a.par_chunks_mut(a_row_len)
            .zip(b.par_chunks_mut(b_row_len))
            .enumerate()
            .for_each(|(r, (row_a, row_b))| f(r, row_a, row_b));
    } else {
        a.chunks_mut(a_row_len)
            .zip(b.chunks_mut(b_row_len))
            .enumerate()
            .for_each(|(r, (row_a, row_b))| f(r, row_a, row_b));
    }
}

/// Apply `f(x, y, pixel)` to every pixel of the destination image.
///
/// This is the building block of the resampling kernels: the callback receives the
/// integer coordinates of the destination pixel and writes its `C` channel values.
pub fn for_each_pixel<const C: usize, F>(dst: &mut Image<f64, C>, strategy: ExecutionStrategy, f: F)
where
    F: Fn(usize, usize, &mut [f64]) + Send + Sync,
{
    let cols = dst.cols();
    for_each_row(dst.as_slice_mut(), cols * C, strategy, |y, row| {
        row.chunks_exact_mut(C)
            .enumerate()
            .for_each(|(x, pixel)| f(x, y, pixel));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_selection() {
        assert!(ExecutionStrategy::Parallel.is_parallel(1));
        assert!(!ExecutionStrategy::Serial.is_parallel(usize::MAX));
        assert!(!ExecutionStrategy::Auto.is_parallel(AUTO_PARALLEL_MIN_SAMPLES - 1));
        assert!(ExecutionStrategy::Auto.is_parallel(AUTO_PARALLEL_MIN_SAMPLES));
    }

    #[test]
    fn rows_serial_and_parallel_agree() {
        for strategy in [ExecutionStrategy::Serial, ExecutionStrategy::Parallel] {
            let mut data = vec![0usize; 12];
            for_each_row(&mut data, 4, strategy, |r, row| {
                row.iter_mut().enumerate().for_each(|(i, v)| *v = r * 10 + i)
            });
            assert_eq!(data, vec![0, 1, 2, 3, 10, 11, 12, 13, 20, 21, 22, 23]);
        }
    }

    #[test]
    fn row_pairs() {
        let mut a = vec![0.0f64; 6];
        let mut b = vec![0u8; 3];
        for_each_row_pair(&mut a, 2, &mut b, 1, ExecutionStrategy::Parallel, |r, ra, rb| {
            ra.fill(r as f64);
            rb[0] = r as u8;
        });
        assert_eq!(a, vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0]);
        assert_eq!(b, vec![0, 1, 2]);
    }

    #[test]
    fn pixels_receive_coordinates() -> Result<(), varflow_image::ImageError> {
        let mut image = Image::<f64, 2>::from_size_val([3, 2].into(), 0.0)?;
        for_each_pixel(&mut image, ExecutionStrategy::Serial, |x, y, pixel| {
            pixel[0] = x as f64;
            pixel[1] = y as f64;
        });
        assert_eq!(image.get_pixel(2, 1)?, [2.0, 1.0]);
        Ok(())
    }
}
