//! Детерминированный генератор случайных чисел для заполнения матриц

use std::marker::PhantomData;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Тип, который умеет получать значение из генератора.
///
/// Вещественные числа равномерно распределены в [0, 1),
/// целые покрывают весь диапазон типа.
pub trait RandomValue: Sized {
    fn draw(rng: &mut StdRng) -> Self;
}

macro_rules! impl_random_value {
    ($($t:ty),*) => {
        $(
            impl RandomValue for $t {
                #[inline]
                fn draw(rng: &mut StdRng) -> Self {
                    rng.gen::<$t>()
                }
            }
        )*
    };
}

impl_random_value!(f32, f64, i32, i64, u32, u64);

/// Поток псевдослучайных значений одного типа.
///
/// Одинаковый seed всегда дает одинаковую последовательность.
#[derive(Debug, Clone)]
pub struct RandomStream<T> {
    rng: StdRng,
    _marker: PhantomData<T>,
}

impl<T: RandomValue> RandomStream<T> {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn next_value(&mut self) -> T {
        T::draw(&mut self.rng)
    }
}

impl<T: RandomValue> Iterator for RandomStream<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        Some(self.next_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let a: Vec<f64> = RandomStream::new(1337).take(64).collect();
        let b: Vec<f64> = RandomStream::new(1337).take(64).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_diverge() {
        let a: Vec<u64> = RandomStream::new(1337).take(8).collect();
        let b: Vec<u64> = RandomStream::new(42).take(8).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn test_reals_in_unit_interval() {
        for v in RandomStream::<f32>::new(7).take(10_000) {
            assert!((0.0..1.0).contains(&v));
        }
        for v in RandomStream::<f64>::new(7).take(10_000) {
            assert!((0.0..1.0).contains(&v));
        }
    }
}
