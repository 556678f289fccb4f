//! Эксперименты: перебор размеров и замер фаз
//!
//! Для каждого показателя `e` из `[from, to)` строка таблицы содержит время
//! создания операндов, время заполнения и `repeats` замеров умножения для
//! `f32`, затем для `f64`. Каждая группа фаз выводится сразу после замера.

use std::hint::black_box;
use std::io::Write;
use std::path::Path;

use crate::backends::Backend;
use crate::config::BenchmarkConfig;
use crate::error::{MatmulError, Result};
use crate::matrix::{Element, Matrix};
use crate::utils::Timer;

use super::row::{generate_header, MeasurementRow};
use super::sink::DualSink;

const HEADERS: [&str; 4] = ["Experiment", "Matrix size", "Construct (s)", "Randomize (s)"];

/// Вид эксперимента
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Experiment {
    /// Скалярное произведение: (1 x 2^e) на (2^e x 1), эталонное умножение
    Vector,
    /// Квадратные матрицы 2^e x 2^e на выбранном бэкенде
    Matrix(Backend),
}

impl Experiment {
    /// Имя файла результатов по умолчанию
    pub fn file_name(&self) -> String {
        match self {
            Experiment::Vector => "vec.csv".to_string(),
            Experiment::Matrix(Backend::Baseline) => "mat.csv".to_string(),
            Experiment::Matrix(Backend::Vectorized) => "mat_simd.csv".to_string(),
            Experiment::Matrix(Backend::Parallel { .. }) => "mat_omp.csv".to_string(),
            Experiment::Matrix(Backend::Offloaded) => "mat_ocl.csv".to_string(),
        }
    }

    fn title(&self) -> String {
        match self {
            Experiment::Vector => "Скалярное произведение векторов".to_string(),
            Experiment::Matrix(backend) => format!("Умножение матриц: {}", backend),
        }
    }

    fn backend(&self) -> Backend {
        match self {
            Experiment::Vector => Backend::Baseline,
            Experiment::Matrix(backend) => *backend,
        }
    }

    /// Размеры левого и правого операндов для показателя `e`
    pub fn operand_shapes(&self, e: u32) -> Result<((usize, usize), (usize, usize))> {
        let n = dimension(e)?;
        Ok(match self {
            Experiment::Vector => ((1, n), (n, 1)),
            Experiment::Matrix(_) => ((n, n), (n, n)),
        })
    }
}

/// Прогоняет эксперимент и пишет таблицу в консоль и в файл `path`.
///
/// Файл открывается до первого замера. Ошибка устройства отмечает
/// оставшиеся замеры этого размера и типа как `n/a`, прогон продолжается.
pub fn run_experiment<W: Write>(
    experiment: Experiment,
    config: &BenchmarkConfig,
    path: &Path,
    console: W,
) -> Result<()> {
    if config.from < config.to {
        dimension(config.to - 1)?;
    }

    let mut sink = DualSink::create(path, console)?;
    log::info!("{} -> {}", experiment.title(), sink.path().display());

    sink.emit(&generate_header(&HEADERS, &[f32::LABEL, f64::LABEL], config.repeats))?;

    let backend = experiment.backend();
    let mut timer = Timer::new();

    for e in config.from..config.to {
        let ((a_rows, a_cols), (b_rows, b_cols)) = experiment.operand_shapes(e)?;
        let mut row = MeasurementRow::new(e, dimension(e)?);

        let (mut a32, mut b32, mut a64, mut b64) = timer.time(|| -> Result<_> {
            Ok((
                Matrix::<f32>::new(a_rows, a_cols)?,
                Matrix::<f32>::new(b_rows, b_cols)?,
                Matrix::<f64>::new(a_rows, a_cols)?,
                Matrix::<f64>::new(b_rows, b_cols)?,
            ))
        })?;
        timer.report(&mut row, HEADERS[2]);

        timer.time(|| {
            a32.randomize(config.seed_a);
            b32.randomize(config.seed_b);
            a64.randomize(config.seed_a);
            b64.randomize(config.seed_b);
        });
        timer.report(&mut row, HEADERS[3]);

        sink.emit(&row.take_pending())?;

        time_repeats(backend, &a32, &b32, config.repeats, &mut timer, &mut row, &mut sink)?;
        time_repeats(backend, &a64, &b64, config.repeats, &mut timer, &mut row, &mut sink)?;

        row.finish();
        sink.emit(&row.take_pending())?;
    }

    Ok(())
}

/// `2^e` или ошибка, если значение не помещается в usize
fn dimension(e: u32) -> Result<usize> {
    1usize
        .checked_shl(e)
        .ok_or(MatmulError::SizeOutOfRange { exponent: e })
}

fn time_repeats<T: Element, W: Write>(
    backend: Backend,
    a: &Matrix<T>,
    b: &Matrix<T>,
    repeats: u32,
    timer: &mut Timer,
    row: &mut MeasurementRow,
    sink: &mut DualSink<W>,
) -> Result<()> {
    let mut unavailable = false;

    for r in 0..repeats {
        let label = format!("{} {}", T::LABEL, r);
        if unavailable {
            row.push_sample(label, None);
        } else {
            timer.start();
            let result = backend.multiply(a, b);
            timer.stop();
            match result {
                Ok(c) => {
                    black_box(c);
                    timer.report(row, label);
                }
                Err(e) if e.is_device_error() => {
                    log::warn!("{} недоступен для {} {}x{}: {}", backend, T::LABEL, a.rows(), b.columns(), e);
                    unavailable = true;
                    row.push_sample(label, None);
                }
                Err(e) => return Err(e),
            }
        }
        sink.emit(&row.take_pending())?;
    }

    Ok(())
}
