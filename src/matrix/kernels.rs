//! OpenCL ядра для матричных операций

use super::types::Element;

/// Имя функции ядра в программе
pub const MATRIX_MULTIPLY_KERNEL_NAME: &str = "matrix_multiply";

/// Шаблон ядра умножения матриц; `REAL` подставляется под тип элемента.
///
/// Один work-item считает один элемент результата. Глобальный размер
/// округляется вверх до размера рабочей группы, поэтому лишние work-item'ы
/// выходят по проверке индекса.
static MATRIX_MULTIPLY_TEMPLATE: &str = r#"
__kernel void matrix_multiply(
    __global const REAL* a,
    __global const REAL* b,
    __global REAL* c,
    const uint rows,
    const uint inner,
    const uint columns
) {
    const size_t id = get_global_id(0);
    if (id >= (size_t)rows * columns) {
        return;
    }

    const size_t row = id / columns;
    const size_t col = id % columns;

    REAL sum = 0;
    for (uint i = 0; i < inner; i++) {
        sum += a[row * inner + i] * b[i * columns + col];
    }

    c[id] = sum;
}
"#;

/// Исходный код ядра для типа `T`
pub fn matrix_multiply_kernel<T: Element>() -> String {
    let mut source = String::new();
    if T::CL_NEEDS_FP64 {
        source.push_str("#pragma OPENCL EXTENSION cl_khr_fp64 : enable\n");
    }
    source.push_str(&MATRIX_MULTIPLY_TEMPLATE.replace("REAL", T::CL_TYPE));
    source
}
