//! Строка замеров и ее текстовое представление

/// Ширина одного поля вместе с запятой
pub const FIELD_WIDTH: usize = 15;

/// Текст пропущенного замера
pub const MISSING: &str = "n/a";

/// Поле таблицы: значение с запятой, выровненное вправо
pub fn field(value: impl std::fmt::Display) -> String {
    format!("{:>width$}", format!("{},", value), width = FIELD_WIDTH)
}

/// Заголовок таблицы: обычные поля, затем повторяемые с номером повтора
pub fn generate_header(headers: &[&str], repeated_headers: &[&str], repeats: u32) -> String {
    let mut header: String = headers.iter().map(field).collect();
    for name in repeated_headers {
        for r in 0..repeats {
            header.push_str(&field(format!("{} {}", name, r)));
        }
    }
    header.push('\n');
    header
}

/// Один замер
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub label: String,
    /// `None`, если бэкенд недоступен
    pub seconds: Option<f64>,
}

impl Sample {
    fn render(&self) -> String {
        match self.seconds {
            Some(s) => field(format!("{:.9}", s)),
            None => field(MISSING),
        }
    }
}

/// Строка вывода бенчмарка для одного размера задачи.
///
/// Замеры только добавляются. Уже выведенная часть строки запоминается,
/// так что [`take_pending`](Self::take_pending) отдает только новый текст.
#[derive(Debug, Clone)]
pub struct MeasurementRow {
    experiment: u32,
    size: usize,
    samples: Vec<Sample>,
    flushed_samples: usize,
    prefix_flushed: bool,
    finished: bool,
    newline_flushed: bool,
}

impl MeasurementRow {
    pub fn new(experiment: u32, size: usize) -> Self {
        Self {
            experiment,
            size,
            samples: Vec::new(),
            flushed_samples: 0,
            prefix_flushed: false,
            finished: false,
            newline_flushed: false,
        }
    }

    pub fn experiment(&self) -> u32 {
        self.experiment
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn push_sample(&mut self, label: impl Into<String>, seconds: Option<f64>) {
        debug_assert!(!self.finished, "строка уже завершена");
        self.samples.push(Sample {
            label: label.into(),
            seconds,
        });
    }

    /// Отмечает строку завершенной; следующий вывод закончит ее переводом строки
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Текст, еще не отданный на вывод
    pub fn take_pending(&mut self) -> String {
        let mut out = String::new();
        if !self.prefix_flushed {
            out.push_str(&field(self.experiment));
            out.push_str(&field(self.size));
            self.prefix_flushed = true;
        }
        for sample in &self.samples[self.flushed_samples..] {
            out.push_str(&sample.render());
        }
        self.flushed_samples = self.samples.len();
        if self.finished && !self.newline_flushed {
            out.push('\n');
            self.newline_flushed = true;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_is_padded_to_width() {
        assert_eq!(field("Experiment"), "    Experiment,");
        assert_eq!(field(3).len(), FIELD_WIDTH);
        // Длинное значение не обрезается
        assert_eq!(field("Construct (s) long"), "Construct (s) long,");
    }

    #[test]
    fn test_header_with_repeats() {
        let header = generate_header(&["Experiment", "Matrix size"], &["Float", "Double"], 2);
        let fields: Vec<&str> = header.trim_end().split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
        assert_eq!(fields, ["Experiment", "Matrix size", "Float 0", "Float 1", "Double 0", "Double 1"]);
        assert!(header.ends_with(",\n"));
        assert_eq!(header.len(), 6 * FIELD_WIDTH + 1);
    }

    #[test]
    fn test_pending_text_is_emitted_once() {
        let mut row = MeasurementRow::new(4, 16);
        row.push_sample("Construct (s)", Some(0.5));
        let first = row.take_pending();
        assert_eq!(first, format!("{}{}{}", field(4), field(16), field("0.500000000")));

        row.push_sample("Float 0", None);
        row.finish();
        assert_eq!(row.take_pending(), format!("{}\n", field("n/a")));
        assert_eq!(row.take_pending(), "");
        assert_eq!(row.samples().len(), 2);
    }
}
