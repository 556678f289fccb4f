//! SIMD-ускоренное умножение матриц
//!
//! Матрица `b` транспонируется, после чего каждый элемент результата — это
//! скалярное произведение двух непрерывных строк. Произведение считается на
//! векторных регистрах:
//! - AVX на x86_64, если доступен (8 x f32 или 4 x f64)
//! - SSE/SSE2 на остальных x86_64 (4 x f32 или 2 x f64)
//! - NEON на aarch64 (4 x f32 или 2 x f64)
//! - массив аккумуляторов фиксированной ширины на прочих архитектурах
//!
//! Хвост, не кратный ширине регистра, досчитывается скалярным циклом.
//! Порядок сложения отличается от эталонного, поэтому результат совпадает
//! с ним только в пределах допуска.

use num_traits::Float;

use crate::error::Result;
use crate::matrix::{check_multiply_shapes, Element, Matrix};

/// Ширина портируемого варианта
#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
const PORTABLE_LANES: usize = 8;

pub fn multiply<T: Element>(a: &Matrix<T>, b: &Matrix<T>) -> Result<Matrix<T>> {
    check_multiply_shapes(a, b)?;

    let columns = b.columns();
    let b_transposed = b.transpose();
    let mut result = Matrix::new(a.rows(), columns)?;

    for (r, out_row) in result.as_mut_slice().chunks_mut(columns).enumerate() {
        let a_row = a.row(r);
        for (c, out) in out_row.iter_mut().enumerate() {
            *out = T::simd_dot(a_row, b_transposed.row(c));
        }
    }

    Ok(result)
}

/// Скалярное произведение на массиве из `LANES` независимых аккумуляторов
pub fn dot_lanes<T: Float, const LANES: usize>(a: &[T], b: &[T]) -> T {
    let n = a.len().min(b.len());
    let (a, b) = (&a[..n], &b[..n]);

    let mut acc = [T::zero(); LANES];
    let mut chunks_a = a.chunks_exact(LANES);
    let mut chunks_b = b.chunks_exact(LANES);
    for (ca, cb) in (&mut chunks_a).zip(&mut chunks_b) {
        for lane in 0..LANES {
            acc[lane] = acc[lane] + ca[lane] * cb[lane];
        }
    }

    let mut sum = acc.iter().fold(T::zero(), |s, &v| s + v);
    for (&x, &y) in chunks_a.remainder().iter().zip(chunks_b.remainder()) {
        sum = sum + x * y;
    }
    sum
}

// =============================================================================
// f32
// =============================================================================

pub fn dot_f32(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx") {
            // SAFETY: наличие AVX проверено выше
            return unsafe { dot_f32_avx(a, b) };
        }
        // SAFETY: SSE есть на любом x86_64
        return unsafe { dot_f32_sse(a, b) };
    }

    #[cfg(target_arch = "aarch64")]
    {
        // SAFETY: NEON всегда доступен на aarch64
        return unsafe { dot_f32_neon(a, b) };
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        dot_lanes::<f32, PORTABLE_LANES>(a, b)
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx")]
unsafe fn dot_f32_avx(a: &[f32], b: &[f32]) -> f32 {
    use std::arch::x86_64::*;

    let n = a.len().min(b.len());
    let mut sum = _mm256_setzero_ps();
    let mut k = 0;

    while k + 8 <= n {
        let a_vec = _mm256_loadu_ps(a.as_ptr().add(k));
        let b_vec = _mm256_loadu_ps(b.as_ptr().add(k));
        sum = _mm256_add_ps(sum, _mm256_mul_ps(a_vec, b_vec));
        k += 8;
    }

    // Горизонтальная сумма 256-битного регистра
    let sum128 = _mm_add_ps(_mm256_castps256_ps128(sum), _mm256_extractf128_ps(sum, 1));
    let sum64 = _mm_add_ps(sum128, _mm_movehl_ps(sum128, sum128));
    let sum32 = _mm_add_ss(sum64, _mm_shuffle_ps(sum64, sum64, 1));
    let mut scalar_sum = _mm_cvtss_f32(sum32);

    while k < n {
        scalar_sum += a[k] * b[k];
        k += 1;
    }
    scalar_sum
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse")]
unsafe fn dot_f32_sse(a: &[f32], b: &[f32]) -> f32 {
    use std::arch::x86_64::*;

    let n = a.len().min(b.len());
    let mut sum = _mm_setzero_ps();
    let mut k = 0;

    while k + 4 <= n {
        let a_vec = _mm_loadu_ps(a.as_ptr().add(k));
        let b_vec = _mm_loadu_ps(b.as_ptr().add(k));
        sum = _mm_add_ps(sum, _mm_mul_ps(a_vec, b_vec));
        k += 4;
    }

    let sum64 = _mm_add_ps(sum, _mm_movehl_ps(sum, sum));
    let sum32 = _mm_add_ss(sum64, _mm_shuffle_ps(sum64, sum64, 1));
    let mut scalar_sum = _mm_cvtss_f32(sum32);

    while k < n {
        scalar_sum += a[k] * b[k];
        k += 1;
    }
    scalar_sum
}

#[cfg(target_arch = "aarch64")]
unsafe fn dot_f32_neon(a: &[f32], b: &[f32]) -> f32 {
    use std::arch::aarch64::*;

    let n = a.len().min(b.len());
    let mut sum = vdupq_n_f32(0.0);
    let mut k = 0;

    while k + 4 <= n {
        let a_vec = vld1q_f32(a.as_ptr().add(k));
        let b_vec = vld1q_f32(b.as_ptr().add(k));
        sum = vaddq_f32(sum, vmulq_f32(a_vec, b_vec));
        k += 4;
    }

    let mut scalar_sum = vaddvq_f32(sum);
    while k < n {
        scalar_sum += a[k] * b[k];
        k += 1;
    }
    scalar_sum
}

// =============================================================================
// f64
// =============================================================================

pub fn dot_f64(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx") {
            // SAFETY: наличие AVX проверено выше
            return unsafe { dot_f64_avx(a, b) };
        }
        // SAFETY: SSE2 есть на любом x86_64
        return unsafe { dot_f64_sse2(a, b) };
    }

    #[cfg(target_arch = "aarch64")]
    {
        // SAFETY: NEON всегда доступен на aarch64
        return unsafe { dot_f64_neon(a, b) };
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        dot_lanes::<f64, PORTABLE_LANES>(a, b)
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx")]
unsafe fn dot_f64_avx(a: &[f64], b: &[f64]) -> f64 {
    use std::arch::x86_64::*;

    let n = a.len().min(b.len());
    let mut sum = _mm256_setzero_pd();
    let mut k = 0;

    while k + 4 <= n {
        let a_vec = _mm256_loadu_pd(a.as_ptr().add(k));
        let b_vec = _mm256_loadu_pd(b.as_ptr().add(k));
        sum = _mm256_add_pd(sum, _mm256_mul_pd(a_vec, b_vec));
        k += 4;
    }

    let sum128 = _mm_add_pd(_mm256_castpd256_pd128(sum), _mm256_extractf128_pd(sum, 1));
    let sum_scalar = _mm_add_sd(sum128, _mm_unpackhi_pd(sum128, sum128));
    let mut scalar_sum = _mm_cvtsd_f64(sum_scalar);

    while k < n {
        scalar_sum += a[k] * b[k];
        k += 1;
    }
    scalar_sum
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
unsafe fn dot_f64_sse2(a: &[f64], b: &[f64]) -> f64 {
    use std::arch::x86_64::*;

    let n = a.len().min(b.len());
    let mut sum = _mm_setzero_pd();
    let mut k = 0;

    while k + 2 <= n {
        let a_vec = _mm_loadu_pd(a.as_ptr().add(k));
        let b_vec = _mm_loadu_pd(b.as_ptr().add(k));
        sum = _mm_add_pd(sum, _mm_mul_pd(a_vec, b_vec));
        k += 2;
    }

    let sum_scalar = _mm_add_sd(sum, _mm_unpackhi_pd(sum, sum));
    let mut scalar_sum = _mm_cvtsd_f64(sum_scalar);

    while k < n {
        scalar_sum += a[k] * b[k];
        k += 1;
    }
    scalar_sum
}

#[cfg(target_arch = "aarch64")]
unsafe fn dot_f64_neon(a: &[f64], b: &[f64]) -> f64 {
    use std::arch::aarch64::*;

    let n = a.len().min(b.len());
    let mut sum = vdupq_n_f64(0.0);
    let mut k = 0;

    while k + 2 <= n {
        let a_vec = vld1q_f64(a.as_ptr().add(k));
        let b_vec = vld1q_f64(b.as_ptr().add(k));
        sum = vaddq_f64(sum, vmulq_f64(a_vec, b_vec));
        k += 2;
    }

    let mut scalar_sum = vaddvq_f64(sum);
    while k < n {
        scalar_sum += a[k] * b[k];
        k += 1;
    }
    scalar_sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{baseline_multiply, RandomStream};

    fn scalar_dot(a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_dot_handles_every_remainder() {
        for len in 0..40 {
            let a: Vec<f64> = RandomStream::new(len as u64).take(len).collect();
            let b: Vec<f64> = RandomStream::new(len as u64 + 100).take(len).collect();
            let expected = scalar_dot(&a, &b);

            assert!((dot_f64(&a, &b) - expected).abs() < 1e-12, "len = {}", len);
            assert!((dot_lanes::<f64, 8>(&a, &b) - expected).abs() < 1e-12, "len = {}", len);

            let a32: Vec<f32> = a.iter().map(|&v| v as f32).collect();
            let b32: Vec<f32> = b.iter().map(|&v| v as f32).collect();
            assert!((dot_f32(&a32, &b32) as f64 - expected).abs() < 1e-4, "len = {}", len);
            assert!((dot_lanes::<f32, 4>(&a32, &b32) as f64 - expected).abs() < 1e-4, "len = {}", len);
        }
    }

    #[test]
    fn test_known_values() {
        let a = Matrix::from_rows(&[&[1.0f32, 2.0, 3.0], &[4.0, 5.0, 6.0]]).unwrap();
        let b = Matrix::from_rows(&[&[7.0f32, 8.0], &[9.0, 10.0], &[11.0, 12.0]]).unwrap();
        let c = multiply(&a, &b).unwrap();
        assert_eq!(c.as_slice(), &[58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn test_matches_baseline_on_seeded_11x11() {
        let mut a: Matrix<f32> = Matrix::new(11, 11).unwrap();
        let mut b: Matrix<f32> = Matrix::new(11, 11).unwrap();
        a.randomize(1337);
        b.randomize(42);

        let baseline = baseline_multiply(&a, &b).unwrap();
        let simd = multiply(&a, &b).unwrap();
        assert!(simd.approx_eq(&baseline));
    }

    #[test]
    fn test_matches_baseline_non_square_f64() {
        let mut a: Matrix<f64> = Matrix::new(13, 29).unwrap();
        let mut b: Matrix<f64> = Matrix::new(29, 7).unwrap();
        a.randomize(1);
        b.randomize(2);

        let baseline = baseline_multiply(&a, &b).unwrap();
        assert!(multiply(&a, &b).unwrap().approx_eq(&baseline));
    }

    #[test]
    fn test_dimension_mismatch() {
        let a: Matrix<f64> = Matrix::new(3, 4).unwrap();
        let b: Matrix<f64> = Matrix::new(3, 4).unwrap();
        assert!(multiply(&a, &b).is_err());
    }
}
