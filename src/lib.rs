//! Бенчмарк и проверка умножения плотных матриц
//!
//! Четыре бэкенда с одним контрактом: эталонный, SIMD, многопоточный и OpenCL.

// Макросы объявлены до модулей, которые их используют
#[macro_use]
mod macros {
    /// Вызывает функцию OpenCL и возвращает ошибку при ненулевом коде возврата
    #[macro_export]
    macro_rules! cl_check {
        ($cl:expr, $func:ident($($arg:expr),* $(,)?)) => {{
            let status = unsafe { ($cl.$func)($($arg),*) };
            if status != $crate::opencl::types::CL_SUCCESS {
                return Err($crate::error::MatmulError::DeviceOperationFailed {
                    status,
                    call: stringify!($func),
                });
            }
        }};
    }

    /// Создает объект OpenCL; код ошибки передается последним аргументом автоматически
    #[macro_export]
    macro_rules! cl_create {
        ($cl:expr, $func:ident($($arg:expr),* $(,)?)) => {{
            let mut status: $crate::opencl::types::cl_int = $crate::opencl::types::CL_SUCCESS;
            let obj = unsafe { ($cl.$func)($($arg,)* &mut status) };
            if status != $crate::opencl::types::CL_SUCCESS || obj.is_null() {
                return Err($crate::error::MatmulError::DeviceOperationFailed {
                    status: if status == $crate::opencl::types::CL_SUCCESS {
                        $crate::opencl::types::CL_INVALID_VALUE
                    } else {
                        status
                    },
                    call: stringify!($func),
                });
            }
            obj
        }};
    }
}

pub mod backends;
pub mod bench;
pub mod config;
pub mod error;
pub mod matrix;
pub mod opencl;
pub mod utils;
pub mod verify;

// Реэкспорт основных типов для удобства
pub use backends::Backend;
pub use config::BenchmarkConfig;
pub use error::{MatmulError, Result};
pub use matrix::{Element, Matrix, MatrixView, TOLERANCE};
pub use verify::{ComparisonResult, VerificationReport, Verifier};
