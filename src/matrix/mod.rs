//! Модуль для работы с матрицами
//!
//! Предоставляет:
//! - Матрицу с построчным хранением и трейт типа элемента
//! - Детерминированное заполнение случайными числами
//! - Эталонное умножение и приближенное сравнение
//! - Исходный код OpenCL ядра

mod types;
pub mod kernels;
pub mod operations;
pub mod random;

pub use kernels::{matrix_multiply_kernel, MATRIX_MULTIPLY_KERNEL_NAME};
pub use operations::{baseline_multiply, check_multiply_shapes, compare, Comparison, Mismatch, TOLERANCE};
pub use random::{RandomStream, RandomValue};
pub use types::{Element, Matrix, MatrixView};
