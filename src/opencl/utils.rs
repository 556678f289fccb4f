//! Вспомогательные функции для OpenCL

use std::os::raw::c_char;

/// Преобразует строку в null-terminated массив байт для C
pub fn to_c_string(s: &str) -> Vec<c_char> {
    let mut result: Vec<c_char> = s.bytes().map(|b| b as c_char).collect();
    result.push(0);
    result
}

/// Обрезает строку, полученную из clGet*Info, по первому нулевому байту
pub fn from_c_buffer(buffer: &[u8]) -> String {
    let end = buffer.iter().position(|&b| b == 0).unwrap_or(buffer.len());
    String::from_utf8_lossy(&buffer[..end]).trim().to_string()
}
