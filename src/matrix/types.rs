//! Типы матриц и связанные структуры

use std::fmt;
use std::ops::{Index, IndexMut};

use num_traits::{Float, NumAssign};

use super::random::{RandomStream, RandomValue};
use crate::backends::vectorized;
use crate::error::{MatmulError, Result};

/// Тип элемента матрицы: `f32` или `f64`.
///
/// Все бэкенды обобщены по этому трейту, отдельного кода на каждый тип нет.
pub trait Element:
    Float + NumAssign + RandomValue + Default + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Имя типа в заголовках таблиц замеров
    const LABEL: &'static str;
    /// Имя типа в исходном коде OpenCL ядра
    const CL_TYPE: &'static str;
    /// Нужно ли расширение cl_khr_fp64
    const CL_NEEDS_FP64: bool;

    /// Скалярное произведение двух срезов равной длины на SIMD-регистрах
    fn simd_dot(a: &[Self], b: &[Self]) -> Self;

    fn as_f64(self) -> f64;
}

impl Element for f32 {
    const LABEL: &'static str = "Float";
    const CL_TYPE: &'static str = "float";
    const CL_NEEDS_FP64: bool = false;

    #[inline]
    fn simd_dot(a: &[f32], b: &[f32]) -> f32 {
        vectorized::dot_f32(a, b)
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl Element for f64 {
    const LABEL: &'static str = "Double";
    const CL_TYPE: &'static str = "double";
    const CL_NEEDS_FP64: bool = true;

    #[inline]
    fn simd_dot(a: &[f64], b: &[f64]) -> f64 {
        vectorized::dot_f64(a, b)
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self
    }
}

/// Плотная матрица с построчным хранением.
///
/// Буфер принадлежит только этой матрице. Для передачи только на чтение
/// используется заимствование или [`MatrixView`], копия делается явно через `clone`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    rows: usize,
    columns: usize,
    data: Vec<T>,
}

impl<T: Element> Matrix<T> {
    /// Создает матрицу, заполненную нулями
    pub fn new(rows: usize, columns: usize) -> Result<Self> {
        let len = checked_len(rows, columns)?;
        Ok(Self {
            rows,
            columns,
            data: vec![T::zero(); len],
        })
    }

    /// Создает матрицу из готового буфера
    pub fn from_vec(rows: usize, columns: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != checked_len(rows, columns)? {
            return Err(MatmulError::InvalidDimension { rows, columns });
        }
        Ok(Self { rows, columns, data })
    }

    /// Создает матрицу из списка строк, удобно в тестах
    pub fn from_rows(rows: &[&[T]]) -> Result<Self> {
        let columns = rows.first().map_or(0, |r| r.len());
        if rows.iter().any(|r| r.len() != columns) {
            return Err(MatmulError::InvalidDimension { rows: rows.len(), columns });
        }
        let data = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Self::from_vec(rows.len(), columns, data)
    }

    /// Заполняет все элементы из потока, инициализированного `seed`
    pub fn randomize(&mut self, seed: u64) -> &mut Self {
        let mut stream = RandomStream::<T>::new(seed);
        for value in self.data.iter_mut() {
            *value = stream.next_value();
        }
        self
    }

    #[inline]
    pub fn get(&self, row: usize, column: usize) -> T {
        self[(row, column)]
    }

    #[inline]
    pub fn set(&mut self, row: usize, column: usize, value: T) {
        self[(row, column)] = value;
    }

    pub fn transpose(&self) -> Matrix<T> {
        let mut data = Vec::with_capacity(self.data.len());
        for c in 0..self.columns {
            for r in 0..self.rows {
                data.push(self.data[r * self.columns + c]);
            }
        }
        Matrix {
            rows: self.columns,
            columns: self.rows,
            data,
        }
    }
}

/// Длина буфера `rows x columns`; ноль и переполнение недопустимы
fn checked_len(rows: usize, columns: usize) -> Result<usize> {
    match rows.checked_mul(columns) {
        Some(len) if len > 0 => Ok(len),
        _ => Err(MatmulError::InvalidDimension { rows, columns }),
    }
}

impl<T> Matrix<T> {
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[T] {
        debug_assert!(row < self.rows, "строка {} вне матрицы {}x{}", row, self.rows, self.columns);
        &self.data[row * self.columns..(row + 1) * self.columns]
    }

    /// Представление только для чтения
    pub fn view(&self) -> MatrixView<'_, T> {
        MatrixView {
            rows: self.rows,
            columns: self.columns,
            data: &self.data,
        }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    #[inline]
    fn index(&self, (row, column): (usize, usize)) -> &T {
        debug_assert!(row < self.rows && column < self.columns, "индекс ({}, {}) вне матрицы", row, column);
        &self.data[row * self.columns + column]
    }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T> {
    #[inline]
    fn index_mut(&mut self, (row, column): (usize, usize)) -> &mut T {
        debug_assert!(row < self.rows && column < self.columns, "индекс ({}, {}) вне матрицы", row, column);
        &mut self.data[row * self.columns + column]
    }
}

impl<T: Element> fmt::Display for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Matrix: ")?;
        for r in 0..self.rows {
            for value in self.row(r) {
                write!(f, "{:>6.4} ", value)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Заимствованное представление матрицы только для чтения
#[derive(Debug, Clone, Copy)]
pub struct MatrixView<'a, T> {
    rows: usize,
    columns: usize,
    data: &'a [T],
}

impl<'a, T: Copy> MatrixView<'a, T> {
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn get(&self, row: usize, column: usize) -> T {
        debug_assert!(row < self.rows && column < self.columns);
        self.data[row * self.columns + column]
    }

    #[inline]
    pub fn row(&self, row: usize) -> &'a [T] {
        &self.data[row * self.columns..(row + 1) * self.columns]
    }

    #[inline]
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }
}
