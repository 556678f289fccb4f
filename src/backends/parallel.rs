//! Многопоточное умножение на пуле rayon
//!
//! Строки результата делятся на непрерывные блоки по `ceil(rows / threads)`,
//! каждый блок пишет только свой поток. Каждый элемент считается тем же
//! циклом, что и в эталонном умножении, поэтому результат не зависит от
//! числа потоков.

use std::num::NonZeroUsize;
use std::thread;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::error::Result;
use crate::matrix::{check_multiply_shapes, Element, Matrix};

/// Число потоков по умолчанию, когда запрошено `0`
pub fn default_threads() -> usize {
    thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

pub fn multiply<T: Element>(a: &Matrix<T>, b: &Matrix<T>, threads: usize) -> Result<Matrix<T>> {
    check_multiply_shapes(a, b)?;

    let threads = if threads == 0 { default_threads() } else { threads };
    let (rows, inner, columns) = (a.rows(), a.columns(), b.columns());
    let rows_per_worker = rows.div_ceil(threads);

    let pool = ThreadPoolBuilder::new().num_threads(threads).build()?;
    let mut result = Matrix::new(rows, columns)?;
    let (a_data, b_data) = (a.as_slice(), b.as_slice());

    pool.install(|| {
        result
            .as_mut_slice()
            .par_chunks_mut(rows_per_worker * columns)
            .enumerate()
            .for_each(|(block, out)| {
                let first_row = block * rows_per_worker;
                for (offset, out_row) in out.chunks_mut(columns).enumerate() {
                    let a_row = &a_data[(first_row + offset) * inner..][..inner];
                    for (c, cell) in out_row.iter_mut().enumerate() {
                        let mut sum = T::zero();
                        for (k, &x) in a_row.iter().enumerate() {
                            sum += x * b_data[k * columns + c];
                        }
                        *cell = sum;
                    }
                }
            });
    });

    Ok(result)
}
