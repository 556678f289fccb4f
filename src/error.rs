//! Ошибки библиотеки

use std::path::PathBuf;

use thiserror::Error;

/// Результат операций библиотеки
pub type Result<T> = std::result::Result<T, MatmulError>;

/// Все ошибки, которые могут возникнуть при создании, умножении и замерах
#[derive(Debug, Error)]
pub enum MatmulError {
    /// Матрица с нулевым числом строк или столбцов
    #[error("Недопустимые размеры матрицы: {rows}x{columns}")]
    InvalidDimension { rows: usize, columns: usize },

    /// Показатель степени размера не помещается в usize
    #[error("Размер 2^{exponent} вне допустимого диапазона")]
    SizeOutOfRange { exponent: u32 },

    /// Размеры операндов не допускают умножения
    #[error("Размеры {}x{} и {}x{} не допускают умножения", left.0, left.1, right.0, right.1)]
    DimensionMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },

    /// Не удалось открыть файл для записи результатов
    #[error("Не удалось открыть файл {}", path.display())]
    OutputUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Нет ни одной OpenCL платформы (или нет самой библиотеки OpenCL)
    #[error("OpenCL платформы не обнаружены")]
    NoPlatformAvailable,

    /// Платформа есть, но устройств на ней нет
    #[error("OpenCL устройства не обнаружены")]
    NoDeviceAvailable,

    /// Вызов OpenCL API вернул код ошибки
    #[error("OpenCL error code: {status} in {call}")]
    DeviceOperationFailed { status: i32, call: &'static str },

    #[error("Не удалось запустить пул потоков: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl MatmulError {
    /// Ошибки ускорителя: драйвер понижает их до "бэкенд недоступен"
    pub fn is_device_error(&self) -> bool {
        matches!(
            self,
            MatmulError::NoPlatformAvailable
                | MatmulError::NoDeviceAvailable
                | MatmulError::DeviceOperationFailed { .. }
        )
    }
}
