//! Вспомогательные функции и утилиты

use std::time::{Duration, Instant};

use crate::bench::MeasurementRow;

/// Измеряет время выполнения функции
pub fn measure_time<F, T>(f: F) -> (T, Duration)
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let result = f();
    let duration = start.elapsed();
    (result, duration)
}

/// Таймер, который можно запускать и останавливать многократно
#[derive(Debug, Default)]
pub struct Timer {
    started: Option<Instant>,
    last: Duration,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Фиксирует интервал с последнего `start`; без `start` интервал нулевой
    pub fn stop(&mut self) -> Duration {
        self.last = self.started.take().map_or(Duration::ZERO, |s| s.elapsed());
        self.last
    }

    /// Последний зафиксированный интервал в секундах
    pub fn elapsed(&self) -> f64 {
        self.last.as_secs_f64()
    }

    /// Добавляет последний интервал в строку замеров
    pub fn report(&self, row: &mut MeasurementRow, label: impl Into<String>) {
        row.push_sample(label, Some(self.elapsed()));
    }

    /// Выполняет `f` между `start` и `stop`
    pub fn time<T>(&mut self, f: impl FnOnce() -> T) -> T {
        self.start();
        let (result, duration) = measure_time(f);
        self.started = None;
        self.last = duration;
        result
    }
}
