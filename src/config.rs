//! Настройки запуска бенчмарков и проверок

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Все параметры одного запуска.
///
/// Читается из JSON, отсутствующие поля берутся из `Default`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Первый показатель степени размера, включительно
    pub from: u32,
    /// Последний показатель степени, не включительно
    pub to: u32,
    /// Повторы каждого умножения и число проверочных испытаний
    pub repeats: u32,
    /// Потоки для одиночного многопоточного эксперимента
    pub threads: usize,

    pub vector: bool,
    pub matrix: bool,
    pub simd: bool,
    pub openmp_single: bool,
    pub openmp_range: bool,
    pub opencl: bool,
    pub tests: bool,
    pub verbose_testing: bool,

    pub output_dir: PathBuf,

    /// Seed левого операнда
    pub seed_a: u64,
    /// Seed правого операнда
    pub seed_b: u64,
    /// Seed выбора размеров в проверках; без него берется текущее время
    pub shape_seed: Option<u64>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            from: 1,
            to: 8,
            repeats: 1,
            threads: 1,
            vector: false,
            matrix: false,
            simd: false,
            openmp_single: false,
            openmp_range: false,
            opencl: false,
            tests: false,
            verbose_testing: true,
            output_dir: PathBuf::from("."),
            seed_a: 1337,
            seed_b: 42,
            shape_seed: None,
        }
    }
}

impl BenchmarkConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Не удалось прочитать конфигурацию {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("Некорректная конфигурация {}", path.display()))?;
        Ok(config)
    }

    /// Включает все эксперименты и проверки
    pub fn select_all(&mut self) {
        self.vector = true;
        self.matrix = true;
        self.simd = true;
        self.openmp_single = true;
        self.openmp_range = true;
        self.opencl = true;
        self.tests = true;
    }

    pub fn nothing_selected(&self) -> bool {
        !(self.vector
            || self.matrix
            || self.simd
            || self.openmp_single
            || self.openmp_range
            || self.opencl
            || self.tests)
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}
