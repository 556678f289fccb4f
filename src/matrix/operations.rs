//! Операции над матрицами: эталонное умножение и приближенное сравнение

use super::types::{Element, Matrix};
use crate::error::{MatmulError, Result};

/// Допустимый квадрат разности между элементами.
///
/// Одна константа для `f32` и `f64`; бэкенды могут переставлять слагаемые.
pub const TOLERANCE: f64 = 1e-6;

/// Первое расхождение, найденное при сравнении
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mismatch {
    pub row: usize,
    pub column: usize,
    pub lhs: f64,
    pub rhs: f64,
    pub squared_error: f64,
}

/// Итог поэлементного сравнения двух матриц
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    Equal,
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
    ValueMismatch(Mismatch),
}

impl Comparison {
    pub fn is_equal(&self) -> bool {
        matches!(self, Comparison::Equal)
    }
}

/// Проверяет, что `a` и `b` можно перемножить
pub fn check_multiply_shapes<T>(a: &Matrix<T>, b: &Matrix<T>) -> Result<()> {
    if a.columns() != b.rows() {
        return Err(MatmulError::DimensionMismatch {
            left: a.shape(),
            right: b.shape(),
        });
    }
    Ok(())
}

/// Эталонное умножение матриц.
///
/// Один аккумулятор на элемент результата, суммирование строго слева направо
/// по строке `a` и столбцу `b`. Остальные бэкенды сверяются именно с ним.
pub fn baseline_multiply<T: Element>(a: &Matrix<T>, b: &Matrix<T>) -> Result<Matrix<T>> {
    check_multiply_shapes(a, b)?;

    let rows = a.rows();
    let columns = b.columns();
    let mut result = Matrix::new(rows, columns)?;

    for r in 0..rows {
        for c in 0..columns {
            let mut e = T::zero();
            for i in 0..b.rows() {
                e += a[(r, i)] * b[(i, c)];
            }
            result[(r, c)] = e;
        }
    }

    Ok(result)
}

/// Сравнивает матрицы поэлементно, останавливаясь на первом расхождении
pub fn compare<T: Element>(lhs: &Matrix<T>, rhs: &Matrix<T>) -> Comparison {
    if lhs.shape() != rhs.shape() {
        return Comparison::ShapeMismatch {
            left: lhs.shape(),
            right: rhs.shape(),
        };
    }

    for r in 0..lhs.rows() {
        for c in 0..lhs.columns() {
            let lv = lhs[(r, c)];
            let rv = rhs[(r, c)];
            // Одинаковые значения, в том числе NaN на обеих сторонах, совпадают
            if lv == rv || (lv.is_nan() && rv.is_nan()) {
                continue;
            }
            let diff = lv - rv;
            let err = (diff * diff).as_f64();
            if err >= TOLERANCE || err.is_nan() {
                return Comparison::ValueMismatch(Mismatch {
                    row: r,
                    column: c,
                    lhs: lv.as_f64(),
                    rhs: rv.as_f64(),
                    squared_error: err,
                });
            }
        }
    }

    Comparison::Equal
}

impl<T: Element> Matrix<T> {
    /// Эталонное умножение, см. [`baseline_multiply`]
    pub fn multiply(a: &Matrix<T>, b: &Matrix<T>) -> Result<Matrix<T>> {
        baseline_multiply(a, b)
    }

    /// Приближенное равенство с порогом [`TOLERANCE`]
    pub fn approx_eq(&self, other: &Matrix<T>) -> bool {
        compare(self, other).is_equal()
    }

    pub fn compare(&self, other: &Matrix<T>) -> Comparison {
        compare(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_multiply_known_values() {
        let a = Matrix::from_rows(&[&[1.0f32, 2.0, 3.0], &[4.0, 5.0, 6.0]]).unwrap();
        let b = Matrix::from_rows(&[&[7.0f32, 8.0], &[9.0, 10.0], &[11.0, 12.0]]).unwrap();
        let c = Matrix::multiply(&a, &b).unwrap();

        let expected = Matrix::from_rows(&[&[58.0f32, 64.0], &[139.0, 154.0]]).unwrap();
        assert_eq!(c, expected);
    }

    #[test]
    fn test_multiply_one_by_one() {
        let a = Matrix::from_vec(1, 1, vec![2.0f64]).unwrap();
        let b = Matrix::from_vec(1, 1, vec![3.0f64]).unwrap();
        let c = Matrix::multiply(&a, &b).unwrap();
        assert_eq!(c.as_slice(), &[6.0]);
    }

    #[test]
    fn test_multiply_dimension_mismatch() {
        let a: Matrix<f32> = Matrix::new(2, 3).unwrap();
        let b: Matrix<f32> = Matrix::new(2, 2).unwrap();
        assert!(matches!(
            Matrix::multiply(&a, &b),
            Err(MatmulError::DimensionMismatch { left: (2, 3), right: (2, 2) })
        ));
    }

    #[test]
    fn test_compare_reports_first_mismatch() {
        let a = Matrix::from_rows(&[&[1.0f64, 2.0], &[3.0, 4.0]]).unwrap();
        let mut b = a.clone();
        b.set(1, 0, 3.5);
        b.set(1, 1, 9.0);

        match a.compare(&b) {
            Comparison::ValueMismatch(m) => {
                assert_eq!((m.row, m.column), (1, 0));
                assert_eq!(m.squared_error, 0.25);
            }
            other => panic!("unexpected comparison: {:?}", other),
        }
    }

    #[test]
    fn test_compare_within_tolerance() {
        let a = Matrix::from_vec(1, 2, vec![1.0f64, 2.0]).unwrap();
        let b = Matrix::from_vec(1, 2, vec![1.0 + 1e-4, 2.0 - 1e-4]).unwrap();
        assert!(a.approx_eq(&b));

        let c = Matrix::from_vec(1, 2, vec![1.0 + 2e-3, 2.0]).unwrap();
        assert!(!a.approx_eq(&c));
    }

    #[test]
    fn test_shape_mismatch_is_not_equal() {
        let a: Matrix<f32> = Matrix::new(2, 3).unwrap();
        let b: Matrix<f32> = Matrix::new(3, 2).unwrap();
        assert!(!a.approx_eq(&b));
        assert!(matches!(a.compare(&b), Comparison::ShapeMismatch { .. }));
    }

    #[test]
    fn test_nan_matrix_equals_itself() {
        let a = Matrix::from_vec(1, 2, vec![1.0f32, f32::NAN]).unwrap();
        assert!(a.approx_eq(&a));
        assert!(a.approx_eq(&a.clone()));
    }

    #[test]
    fn test_nan_against_number_is_a_mismatch() {
        let a = Matrix::from_vec(1, 2, vec![1.0f64, f64::NAN]).unwrap();
        let b = Matrix::from_vec(1, 2, vec![1.0f64, 2.0]).unwrap();
        assert!(!a.approx_eq(&b));
        assert!(!b.approx_eq(&a));
        match a.compare(&b) {
            Comparison::ValueMismatch(m) => assert_eq!((m.row, m.column), (0, 1)),
            other => panic!("unexpected comparison: {:?}", other),
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_new_shape_and_zero(r in 1usize..40, c in 1usize..40) {
            let m: Matrix<f64> = Matrix::new(r, c).unwrap();
            prop_assert_eq!(m.rows(), r);
            prop_assert_eq!(m.columns(), c);
            prop_assert!(m.as_slice().iter().all(|&v| v == 0.0));
        }

        #[test]
        fn prop_zero_dimension_fails(n in 0usize..40) {
            prop_assert!(Matrix::<f32>::new(0, n).is_err());
            prop_assert!(Matrix::<f32>::new(n, 0).is_err());
        }

        #[test]
        fn prop_multiply_shape(m in 1usize..12, k in 1usize..12, n in 1usize..12, other in 1usize..12) {
            let a: Matrix<f32> = Matrix::new(m, k).unwrap();
            let b: Matrix<f32> = Matrix::new(k, n).unwrap();
            let c = Matrix::multiply(&a, &b).unwrap();
            prop_assert_eq!(c.shape(), (m, n));

            let bad: Matrix<f32> = Matrix::new(other, n).unwrap();
            prop_assert_eq!(Matrix::multiply(&a, &bad).is_err(), other != k);
        }

        #[test]
        fn prop_approx_eq_reflexive_and_symmetric(r in 1usize..16, c in 1usize..16, s1 in any::<u64>(), s2 in any::<u64>()) {
            let mut a: Matrix<f32> = Matrix::new(r, c).unwrap();
            let mut b: Matrix<f32> = Matrix::new(r, c).unwrap();
            a.randomize(s1);
            b.randomize(s2);
            prop_assert!(a.approx_eq(&a));
            prop_assert_eq!(a.approx_eq(&b), b.approx_eq(&a));
        }
    }
}
