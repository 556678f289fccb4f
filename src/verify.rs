//! Проверка бэкендов против эталонного умножения
//!
//! В каждом испытании берутся нечетные размеры `r` и `c` из [11, 29],
//! операнды `r x c` и `c x r` заполняются фиксированными seed'ами, эталон
//! считается один раз, и результат каждого бэкенда сравнивается с ним.
//! Бэкенд, вернувший ошибку устройства, считается недоступным до конца прогона.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use indicatif::{ProgressBar, ProgressStyle};
use prettytable::{row, Table};

use crate::backends::Backend;
use crate::config::BenchmarkConfig;
use crate::error::Result;
use crate::matrix::{baseline_multiply, Comparison, Element, Matrix, RandomStream};

/// Нечетный размер из [11, 29]
fn odd_dimension(value: u64) -> usize {
    11 + (value.wrapping_mul(2) % 20) as usize
}

/// Исход одного сравнения
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Passed,
    Failed(Comparison),
    /// Ошибка устройства, текст ошибки
    Unavailable(String),
}

/// Результат сравнения одного бэкенда в одном испытании
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    pub backend: Backend,
    pub trial: u32,
    pub rows: usize,
    pub columns: usize,
    pub outcome: Outcome,
}

impl ComparisonResult {
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }
}

/// Итог проверки для одного типа элемента
#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub element: &'static str,
    pub backends: Vec<Backend>,
    pub results: Vec<ComparisonResult>,
}

impl VerificationReport {
    /// `Some(true)`, если все испытания бэкенда прошли; `None`, если бэкенд недоступен
    pub fn backend_passed(&self, backend: Backend) -> Option<bool> {
        let mut ran = false;
        for result in self.results.iter().filter(|r| r.backend == backend) {
            match result.outcome {
                Outcome::Unavailable(_) => return None,
                Outcome::Failed(_) => return Some(false),
                Outcome::Passed => ran = true,
            }
        }
        ran.then_some(true)
    }

    /// Нет ни одного расхождения; недоступные бэкенды провалом не считаются
    pub fn passed(&self) -> bool {
        self.results
            .iter()
            .all(|r| !matches!(r.outcome, Outcome::Failed(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = &ComparisonResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Failed(_)))
    }

    /// Таблица "бэкенд / испытаний / статус"
    pub fn summary_table(&self) -> Table {
        let mut table = Table::new();
        table.add_row(row!["Тип", "Бэкенд", "Испытаний", "Статус"]);
        for &backend in &self.backends {
            let trials = self.results.iter().filter(|r| r.backend == backend).count();
            let status = match self.backend_passed(backend) {
                Some(true) => "PASSED",
                Some(false) => "FAILED",
                None => "UNAVAILABLE",
            };
            table.add_row(row![self.element, backend, trials, status]);
        }
        table
    }
}

/// Прогоняет испытания на заданных бэкендах
#[derive(Debug, Clone)]
pub struct Verifier {
    pub repeats: u32,
    pub verbose: bool,
    pub backends: Vec<Backend>,
    pub seed_a: u64,
    pub seed_b: u64,
    pub shape_seed: u64,
}

impl Verifier {
    pub fn new(backends: Vec<Backend>, repeats: u32) -> Self {
        let defaults = BenchmarkConfig::default();
        Self {
            repeats,
            verbose: false,
            backends,
            seed_a: defaults.seed_a,
            seed_b: defaults.seed_b,
            shape_seed: time_seed(),
        }
    }

    /// Все альтернативные бэкенды с параметрами из конфигурации
    pub fn from_config(config: &BenchmarkConfig) -> Self {
        Self {
            repeats: config.repeats,
            verbose: config.verbose_testing,
            backends: Backend::alternates(config.threads).to_vec(),
            seed_a: config.seed_a,
            seed_b: config.seed_b,
            shape_seed: config.shape_seed.unwrap_or_else(time_seed),
        }
    }

    pub fn run<T: Element>(&self) -> Result<VerificationReport> {
        if self.verbose {
            log::info!("Проверка умножения матриц ({})", T::LABEL);
        }

        let progress = self.progress_bar(T::LABEL);
        let mut shapes = RandomStream::<u64>::new(self.shape_seed);
        let mut unavailable: HashSet<Backend> = HashSet::new();
        let mut results = Vec::new();

        for trial in 0..self.repeats {
            let rows = odd_dimension(shapes.next_value());
            let columns = odd_dimension(shapes.next_value());

            let mut a = Matrix::<T>::new(rows, columns)?;
            let mut b = Matrix::<T>::new(columns, rows)?;
            a.randomize(self.seed_a);
            b.randomize(self.seed_b);

            if self.verbose {
                log::info!(
                    "Испытание {}: a {}x{} (seed {}), b {}x{} (seed {})",
                    trial, rows, columns, self.seed_a, columns, rows, self.seed_b
                );
            }

            let baseline = baseline_multiply(&a, &b)?;

            for &backend in &self.backends {
                progress.inc(1);
                if unavailable.contains(&backend) {
                    continue;
                }

                let outcome = match backend.multiply(&a, &b) {
                    Ok(result) => match result.compare(&baseline) {
                        Comparison::Equal => Outcome::Passed,
                        mismatch => {
                            self.log_mismatch(backend, &mismatch);
                            Outcome::Failed(mismatch)
                        }
                    },
                    Err(e) if e.is_device_error() => {
                        log::warn!("{} недоступен: {}", backend, e);
                        unavailable.insert(backend);
                        Outcome::Unavailable(e.to_string())
                    }
                    Err(e) => return Err(e),
                };

                results.push(ComparisonResult {
                    backend,
                    trial,
                    rows,
                    columns,
                    outcome,
                });
            }
        }
        progress.finish_and_clear();

        Ok(VerificationReport {
            element: T::LABEL,
            backends: self.backends.clone(),
            results,
        })
    }

    fn log_mismatch(&self, backend: Backend, mismatch: &Comparison) {
        if !self.verbose {
            return;
        }
        match mismatch {
            Comparison::ValueMismatch(m) => log::error!(
                "\t{} failed: ({}, {}) {} != {}, квадрат разности {:e}",
                backend, m.row, m.column, m.lhs, m.rhs, m.squared_error
            ),
            Comparison::ShapeMismatch { left, right } => log::error!(
                "\t{} failed: размер {:?} вместо {:?}",
                backend, left, right
            ),
            Comparison::Equal => {}
        }
    }

    fn progress_bar(&self, label: &str) -> ProgressBar {
        if self.verbose {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(u64::from(self.repeats) * self.backends.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} {msg} [{wide_bar:.cyan/blue}] {pos}/{len}")
            .map(|s| s.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb.set_message(label.to_string());
        pb
    }
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Mismatch;

    fn quiet(backends: Vec<Backend>, repeats: u32) -> Verifier {
        let mut verifier = Verifier::new(backends, repeats);
        verifier.shape_seed = 7;
        verifier
    }

    #[test]
    fn test_odd_dimension_range() {
        for v in 0..1000u64 {
            let d = odd_dimension(v);
            assert!((11..=29).contains(&d) && d % 2 == 1, "{}", d);
        }
        assert_eq!(odd_dimension(u64::MAX), 11 + (u64::MAX.wrapping_mul(2) % 20) as usize);
    }

    #[test]
    fn test_cpu_backends_pass() {
        let verifier = quiet(vec![Backend::Vectorized, Backend::Parallel { threads: 3 }], 4);

        let report = verifier.run::<f32>().unwrap();
        assert!(report.passed());
        assert_eq!(report.results.len(), 8);
        assert_eq!(report.backend_passed(Backend::Vectorized), Some(true));

        let report = verifier.run::<f64>().unwrap();
        assert!(report.passed());
        assert_eq!(report.element, "Double");
    }

    #[test]
    fn test_trials_use_odd_non_square_shapes() {
        let report = quiet(vec![Backend::Baseline], 10).run::<f64>().unwrap();
        for r in &report.results {
            assert!(r.rows % 2 == 1 && r.columns % 2 == 1);
            assert!((11..=29).contains(&r.rows) && (11..=29).contains(&r.columns));
        }
    }

    #[test]
    fn test_offloaded_is_passed_or_unavailable() {
        let report = quiet(vec![Backend::Offloaded], 3).run::<f32>().unwrap();
        assert!(report.passed());
        match report.backend_passed(Backend::Offloaded) {
            Some(passed) => assert!(passed),
            // после ошибки устройства бэкенд больше не вызывается
            None => assert_eq!(report.results.len(), 1),
        }
    }

    #[test]
    fn test_report_with_failure() {
        let failed = Comparison::ValueMismatch(Mismatch {
            row: 1,
            column: 2,
            lhs: 1.0,
            rhs: 2.0,
            squared_error: 1.0,
        });
        let report = VerificationReport {
            element: "Float",
            backends: vec![Backend::Vectorized, Backend::Offloaded],
            results: vec![
                ComparisonResult { backend: Backend::Vectorized, trial: 0, rows: 11, columns: 13, outcome: Outcome::Passed },
                ComparisonResult { backend: Backend::Vectorized, trial: 1, rows: 11, columns: 13, outcome: Outcome::Failed(failed) },
                ComparisonResult {
                    backend: Backend::Offloaded,
                    trial: 0,
                    rows: 11,
                    columns: 13,
                    outcome: Outcome::Unavailable("OpenCL платформы не обнаружены".into()),
                },
            ],
        };

        assert!(!report.passed());
        assert_eq!(report.backend_passed(Backend::Vectorized), Some(false));
        assert_eq!(report.backend_passed(Backend::Offloaded), None);
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.summary_table().len(), 3);
    }

    #[test]
    fn test_zero_repeats() {
        let report = quiet(vec![Backend::Vectorized], 0).run::<f32>().unwrap();
        assert!(report.passed());
        assert_eq!(report.backend_passed(Backend::Vectorized), None);
    }
}
