use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use thermoreg_image::Image;

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),

    /// The number of rows per chunk must be valid.
    #[error("rows per chunk must be > 0 for RowChunks strategy")]
    InvalidRowChunk(usize),
}

/// Controls how row-parallel operations are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExecutionStrategy {
    /// Run sequentially on the current thread.
    ///
    /// Useful for small images, debugging, or when the overhead of parallelization
    /// outweighs the benefits.
    Serial,

    /// Use the global Rayon thread pool and hand out one row per task.
    #[default]
    ParallelRows,

    /// Use the global Rayon thread pool and hand out `n` consecutive rows per task.
    ///
    /// Larger chunks amortize scheduling overhead for cheap per-pixel kernels.
    RowChunks(usize),

    /// Run on a local thread pool with `n` threads.
    ///
    /// # Warning
    /// Creates a new thread pool on every call, which has significant overhead.
    /// Use this primarily for benchmarking or specific isolation needs.
    Fixed(usize),
}

/// Apply a function to every row of the image, passing the row index along.
///
/// Each invocation of `f` owns a disjoint row slice of length
/// `width * C`, so no synchronization is needed between rows.
///
/// # Arguments
///
/// * `dst` - The image whose rows are visited.
/// * `strategy` - How the rows are scheduled.
/// * `f` - The function receiving `(row_index, row)`.
///
/// # Errors
///
/// Returns an error if the strategy carries an invalid parameter or the
/// local thread pool cannot be built.
pub fn par_iter_rows_indexed<T, const C: usize, F>(
    dst: &mut Image<T, C>,
    strategy: ExecutionStrategy,
    f: F,
) -> Result<(), ParallelError>
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    let stride = dst.row_stride();
    if stride == 0 {
        return Ok(());
    }

    match strategy {
        ExecutionStrategy::Serial => {
            dst.as_slice_mut()
                .chunks_exact_mut(stride)
                .enumerate()
                .for_each(|(r, row)| f(r, row));
        }
        ExecutionStrategy::ParallelRows => {
            par_iter_rows_mut(dst, f);
        }
        ExecutionStrategy::RowChunks(rows) => {
            if rows == 0 {
                return Err(ParallelError::InvalidRowChunk(rows));
            }
            // a chunk never needs to span more than the whole image
            let rows = rows.min(dst.rows().max(1));
            dst.as_slice_mut()
                .par_chunks_mut(stride * rows)
                .enumerate()
                .for_each(|(chunk_idx, chunk)| {
                    chunk
                        .chunks_exact_mut(stride)
                        .enumerate()
                        .for_each(|(i, row)| f(chunk_idx * rows + i, row));
                });
        }
        ExecutionStrategy::Fixed(n) => {
            if n == 0 {
                return Err(ParallelError::InvalidThreadCount(n));
            }
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| ParallelError::BuildError(e.to_string()))?;

            pool.install(|| par_iter_rows_mut(dst, f));
        }
    }

    Ok(())
}

/// Apply a function to every row of the image in parallel on the global Rayon pool.
///
/// Infallible counterpart of [`par_iter_rows_indexed`] with
/// [`ExecutionStrategy::ParallelRows`].
pub fn par_iter_rows_mut<T, const C: usize>(
    dst: &mut Image<T, C>,
    f: impl Fn(usize, &mut [T]) + Send + Sync,
) where
    T: Send,
{
    let stride = dst.row_stride();
    if stride == 0 {
        return;
    }

    dst.as_slice_mut()
        .par_chunks_exact_mut(stride)
        .enumerate()
        .for_each(|(r, row)| f(r, row));
}

/// Apply a function to each pixel of two source images and a destination in parallel.
///
/// The three images must share the same size; the caller is responsible for checking it.
pub fn par_iter_rows_val_two<T1, const C1: usize, T2, const C2: usize, T3, const C3: usize>(
    src1: &Image<T1, C1>,
    src2: &Image<T2, C2>,
    dst: &mut Image<T3, C3>,
    f: impl Fn(&[T1], &[T2], &mut [T3]) + Send + Sync,
) where
    T1: Sync,
    T2: Sync,
    T3: Send,
{
    let cols = src1.cols();
    if cols == 0 {
        return;
    }

    src1.as_slice()
        .par_chunks_exact(C1 * cols)
        .zip(src2.as_slice().par_chunks_exact(C2 * cols))
        .zip(dst.as_slice_mut().par_chunks_exact_mut(C3 * cols))
        .for_each(|((src1_chunk, src2_chunk), dst_chunk)| {
            src1_chunk
                .chunks_exact(C1)
                .zip(src2_chunk.chunks_exact(C2))
                .zip(dst_chunk.chunks_exact_mut(C3))
                .for_each(|((src1_pixel, src2_pixel), dst_pixel)| {
                    f(src1_pixel, src2_pixel, dst_pixel);
                });
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermoreg_image::ImageError;

    fn fill_row_index(
        strategy: ExecutionStrategy,
    ) -> Result<Image<u32, 2>, Box<dyn std::error::Error>> {
        let mut image = Image::<u32, 2>::from_size_val([3, 5].into(), 0)?;
        par_iter_rows_indexed(&mut image, strategy, |r, row| {
            row.chunks_exact_mut(2).enumerate().for_each(|(c, px)| {
                px[0] = r as u32;
                px[1] = c as u32;
            });
        })?;
        Ok(image)
    }

    fn expected() -> Vec<u32> {
        let mut v = vec![];
        for r in 0..5 {
            for c in 0..3 {
                v.push(r);
                v.push(c);
            }
        }
        v
    }

    #[test]
    fn rows_serial() -> Result<(), Box<dyn std::error::Error>> {
        let image = fill_row_index(ExecutionStrategy::Serial)?;
        assert_eq!(image.as_slice(), expected().as_slice());
        Ok(())
    }

    #[test]
    fn rows_parallel() -> Result<(), Box<dyn std::error::Error>> {
        let image = fill_row_index(ExecutionStrategy::ParallelRows)?;
        assert_eq!(image.as_slice(), expected().as_slice());
        Ok(())
    }

    #[test]
    fn rows_chunked_uneven() -> Result<(), Box<dyn std::error::Error>> {
        // 5 rows in chunks of 2 leaves a trailing single row
        let image = fill_row_index(ExecutionStrategy::RowChunks(2))?;
        assert_eq!(image.as_slice(), expected().as_slice());
        Ok(())
    }

    #[test]
    fn rows_chunk_larger_than_image() -> Result<(), Box<dyn std::error::Error>> {
        for rows in [5, 6, usize::MAX / 2, usize::MAX] {
            let image = fill_row_index(ExecutionStrategy::RowChunks(rows))?;
            assert_eq!(image.as_slice(), expected().as_slice(), "{}", rows);
        }
        Ok(())
    }

    #[test]
    fn rows_fixed_pool() -> Result<(), Box<dyn std::error::Error>> {
        let image = fill_row_index(ExecutionStrategy::Fixed(2))?;
        assert_eq!(image.as_slice(), expected().as_slice());
        Ok(())
    }

    #[test]
    fn rows_invalid_parameters() -> Result<(), ImageError> {
        let mut image = Image::<u32, 2>::from_size_val([3, 5].into(), 0)?;
        assert_eq!(
            par_iter_rows_indexed(&mut image, ExecutionStrategy::RowChunks(0), |_, _| {}),
            Err(ParallelError::InvalidRowChunk(0))
        );
        assert_eq!(
            par_iter_rows_indexed(&mut image, ExecutionStrategy::Fixed(0), |_, _| {}),
            Err(ParallelError::InvalidThreadCount(0))
        );
        Ok(())
    }

    #[test]
    fn strategy_from_json() -> Result<(), serde_json::Error> {
        let s: ExecutionStrategy = serde_json::from_str("\"Serial\"")?;
        assert_eq!(s, ExecutionStrategy::Serial);
        let s: ExecutionStrategy = serde_json::from_str("{\"RowChunks\": 8}")?;
        assert_eq!(s, ExecutionStrategy::RowChunks(8));
        assert_eq!(ExecutionStrategy::default(), ExecutionStrategy::ParallelRows);
        Ok(())
    }

    #[test]
    fn val_two_pixelwise() -> Result<(), ImageError> {
        let a = Image::<u8, 1>::new([2, 2].into(), vec![1, 2, 3, 4])?;
        let b = Image::<u8, 1>::new([2, 2].into(), vec![10, 20, 30, 40])?;
        let mut out = Image::<u8, 1>::from_size_val([2, 2].into(), 0)?;
        par_iter_rows_val_two(&a, &b, &mut out, |x, y, z| z[0] = x[0] + y[0]);
        assert_eq!(out.as_slice(), &[11, 22, 33, 44]);
        Ok(())
    }
}
