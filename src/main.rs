//! acsmatmult: замеры и проверка умножения матриц

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use env_logger::Env;

use acsmatmult::bench::{run_experiment, Experiment};
use acsmatmult::{Backend, BenchmarkConfig, Verifier};

#[derive(Parser)]
#[command(name = "acsmatmult")]
#[command(version, about = "Бенчмарк и проверка умножения матриц")]
struct Cli {
    /// Начать с размера 2^X
    #[arg(short = 'x', value_name = "X")]
    from: Option<u32>,

    /// Закончить перед размером 2^Y
    #[arg(short = 'y', value_name = "Y")]
    to: Option<u32>,

    /// Повторить каждый замер или испытание R раз
    #[arg(short = 'r', value_name = "R")]
    repeats: Option<u32>,

    /// Скалярное произведение векторов
    #[arg(short = 'v')]
    vector: bool,

    /// Эталонное умножение матриц
    #[arg(short = 'm')]
    matrix: bool,

    /// SIMD умножение
    #[arg(short = 's')]
    simd: bool,

    /// Многопоточное умножение на N потоках (0 - все ядра)
    #[arg(short = 'o', value_name = "N")]
    threads: Option<usize>,

    /// Многопоточное умножение на 1..8 потоках
    #[arg(short = 'O')]
    thread_sweep: bool,

    /// Умножение на OpenCL устройстве
    #[arg(short = 'c')]
    opencl: bool,

    /// Проверить все бэкенды против эталона
    #[arg(short = 't')]
    tests: bool,

    /// Подробный вывод проверок
    #[arg(short = 'u')]
    verbose: bool,

    /// Все эксперименты и проверки
    #[arg(short = 'a')]
    all: bool,

    /// JSON с настройками; флаги командной строки важнее
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Каталог для CSV файлов
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<BenchmarkConfig> {
        let mut config = match &self.config {
            Some(path) => BenchmarkConfig::from_file(path)?,
            None => BenchmarkConfig::default(),
        };

        if let Some(from) = self.from {
            config.from = from;
        }
        if let Some(to) = self.to {
            config.to = to;
        }
        if let Some(repeats) = self.repeats {
            config.repeats = repeats;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
            config.openmp_single = true;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }

        config.vector |= self.vector;
        config.matrix |= self.matrix;
        config.simd |= self.simd;
        config.openmp_range |= self.thread_sweep;
        config.opencl |= self.opencl;
        config.tests |= self.tests;
        config.verbose_testing |= self.verbose;
        if self.all {
            config.select_all();
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Cli::parse().into_config()?;
    if config.nothing_selected() {
        Cli::command().print_help()?;
        return Ok(());
    }

    run(&config)
}

fn run(config: &BenchmarkConfig) -> Result<()> {
    let mut experiments = Vec::new();
    if config.vector {
        experiments.push((Experiment::Vector, None));
    }
    if config.matrix {
        experiments.push((Experiment::Matrix(Backend::Baseline), None));
    }
    if config.simd {
        experiments.push((Experiment::Matrix(Backend::Vectorized), None));
    }
    if config.openmp_single {
        experiments.push((Experiment::Matrix(Backend::Parallel { threads: config.threads }), None));
    }
    if config.openmp_range {
        for threads in 1..=8 {
            experiments.push((
                Experiment::Matrix(Backend::Parallel { threads }),
                Some(format!("mat_omp_t{}.csv", threads)),
            ));
        }
    }
    if config.opencl {
        experiments.push((Experiment::Matrix(Backend::Offloaded), None));
    }

    for (experiment, file_name) in experiments {
        let path = config.output_path(&file_name.unwrap_or_else(|| experiment.file_name()));
        run_experiment(experiment, config, &path, io::stdout())
            .with_context(|| format!("Эксперимент {:?} не завершен", experiment))?;
    }

    if config.tests {
        run_tests(config)?;
    }

    Ok(())
}

/// Проверка для f32 и f64; расхождения выводятся, но не прерывают программу
fn run_tests(config: &BenchmarkConfig) -> Result<()> {
    let verifier = Verifier::from_config(config);
    log::info!("Seed размеров проверки: {}", verifier.shape_seed);

    let single = verifier.run::<f32>().context("Проверка f32 не завершена")?;
    let double = verifier.run::<f64>().context("Проверка f64 не завершена")?;

    single.summary_table().printstd();
    double.summary_table().printstd();

    if !single.passed() {
        eprintln!("Single-precision floating point matrix multiplication FAILED.");
    }
    if !double.passed() {
        eprintln!("Double-precision floating point matrix multiplication FAILED.");
    }

    Ok(())
}
