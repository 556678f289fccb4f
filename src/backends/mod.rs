//! Бэкенды умножения матриц
//!
//! Все бэкенды принимают операнды по ссылке и возвращают новую матрицу.
//! Результат любого бэкенда приближенно равен эталонному на тех же входах.

pub mod offloaded;
pub mod parallel;
pub mod vectorized;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::matrix::{baseline_multiply, Element, Matrix};

/// Стратегия умножения
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Backend {
    /// Последовательный тройной цикл, эталон для остальных
    Baseline,
    /// SIMD-регистры фиксированной ширины
    Vectorized,
    /// Пул потоков; `0` означает все доступные ядра
    Parallel { threads: usize },
    /// OpenCL устройство
    Offloaded,
}

impl Backend {
    /// Бэкенды, которые сверяются с эталоном при проверке
    pub fn alternates(threads: usize) -> [Backend; 3] {
        [Backend::Vectorized, Backend::Parallel { threads }, Backend::Offloaded]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Baseline => "Baseline",
            Backend::Vectorized => "SIMD",
            Backend::Parallel { .. } => "Parallel",
            Backend::Offloaded => "OpenCL",
        }
    }

    pub fn multiply<T: Element>(&self, a: &Matrix<T>, b: &Matrix<T>) -> Result<Matrix<T>> {
        match *self {
            Backend::Baseline => baseline_multiply(a, b),
            Backend::Vectorized => vectorized::multiply(a, b),
            Backend::Parallel { threads } => parallel::multiply(a, b, threads),
            Backend::Offloaded => offloaded::multiply(a, b),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Parallel { threads: 0 } => write!(f, "Parallel (all cores)"),
            Backend::Parallel { threads } => write!(f, "Parallel ({} threads)", threads),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatmulError;
    use proptest::prelude::*;

    fn seeded<T: Element>(rows: usize, columns: usize, seed: u64) -> Matrix<T> {
        let mut m = Matrix::new(rows, columns).unwrap();
        m.randomize(seed);
        m
    }

    #[test]
    fn test_cpu_backends_agree_on_known_values() {
        let a = Matrix::from_rows(&[&[1.0f64, 2.0, 3.0], &[4.0, 5.0, 6.0]]).unwrap();
        let b = Matrix::from_rows(&[&[7.0f64, 8.0], &[9.0, 10.0], &[11.0, 12.0]]).unwrap();
        let expected = Matrix::from_rows(&[&[58.0f64, 64.0], &[139.0, 154.0]]).unwrap();

        for backend in [Backend::Baseline, Backend::Vectorized, Backend::Parallel { threads: 4 }] {
            assert_eq!(backend.multiply(&a, &b).unwrap(), expected, "{}", backend);
        }
    }

    #[test]
    fn test_every_backend_rejects_mismatch() {
        let a: Matrix<f32> = seeded(3, 4, 1);
        let b: Matrix<f32> = seeded(5, 2, 2);
        for backend in [
            Backend::Baseline,
            Backend::Vectorized,
            Backend::Parallel { threads: 2 },
            Backend::Offloaded,
        ] {
            assert!(
                matches!(backend.multiply(&a, &b), Err(MatmulError::DimensionMismatch { .. })),
                "{}",
                backend
            );
        }
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let a: Matrix<f32> = seeded(11, 13, 1337);
        let b: Matrix<f32> = seeded(13, 11, 42);
        let (a_copy, b_copy) = (a.clone(), b.clone());
        for backend in Backend::alternates(3) {
            let _ = backend.multiply(&a, &b);
        }
        assert_eq!(a, a_copy);
        assert_eq!(b, b_copy);
    }

    #[test]
    fn test_display() {
        assert_eq!(Backend::Vectorized.to_string(), "SIMD");
        assert_eq!(Backend::Parallel { threads: 4 }.to_string(), "Parallel (4 threads)");
        assert_eq!(Backend::Parallel { threads: 0 }.to_string(), "Parallel (all cores)");
    }

    #[test]
    fn test_serde_roundtrip_of_parallel() {
        let json = serde_json::to_string(&Backend::Parallel { threads: 8 }).unwrap();
        assert_eq!(serde_json::from_str::<Backend>(&json).unwrap(), Backend::Parallel { threads: 8 });
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_cpu_backends_match_baseline(
            rows in 1usize..24,
            inner in 1usize..24,
            columns in 1usize..24,
            threads in 1usize..9,
            seed in any::<u64>(),
        ) {
            let a: Matrix<f64> = seeded(rows, inner, seed);
            let b: Matrix<f64> = seeded(inner, columns, seed.wrapping_add(1));
            let baseline = Backend::Baseline.multiply(&a, &b).unwrap();

            prop_assert_eq!(baseline.shape(), (rows, columns));
            prop_assert!(Backend::Vectorized.multiply(&a, &b).unwrap().approx_eq(&baseline));
            let parallel = Backend::Parallel { threads };
            prop_assert!(parallel.multiply(&a, &b).unwrap().approx_eq(&baseline));
        }
    }
}
