//! Бенчмарки бэкендов
//!
//! Предоставляет:
//! - Строку замеров и форматирование полей таблицы
//! - Одновременный вывод в консоль и в файл
//! - Прогон экспериментов по диапазону размеров

pub mod experiments;
pub mod row;
pub mod sink;

pub use experiments::{run_experiment, Experiment};
pub use row::{field, generate_header, MeasurementRow, Sample, FIELD_WIDTH, MISSING};
pub use sink::DualSink;
