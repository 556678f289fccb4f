//! Умножение на OpenCL устройстве
//!
//! Каждый вызов заново выбирает устройство, создает контекст, очередь и
//! программу, копирует операнды, запускает ядро и читает результат.
//! Все объекты OpenCL освобождаются при выходе из функции, в том числе по ошибке.

use crate::error::{MatmulError, Result};
use crate::matrix::{check_multiply_shapes, matrix_multiply_kernel, Element, Matrix, MATRIX_MULTIPLY_KERNEL_NAME};
use crate::opencl::resources::{Buffer, CommandQueue, Context, Kernel, Program};
use crate::opencl::types::{cl_uint, CL_MEM_READ_ONLY, CL_MEM_WRITE_ONLY};
use crate::opencl::{select_device, OpenCl};

/// Верхняя граница локального размера рабочей группы
const WORK_GROUP_SIZE: usize = 64;

pub fn multiply<T: Element>(a: &Matrix<T>, b: &Matrix<T>) -> Result<Matrix<T>> {
    check_multiply_shapes(a, b)?;

    let cl = OpenCl::load().ok_or(MatmulError::NoPlatformAvailable)?;
    let (platform, device) = select_device(cl)?;
    log::debug!("OpenCL: {} на платформе {}", device.name, platform.name);

    let (rows, inner, columns) = (a.rows(), a.columns(), b.columns());
    let total = rows * columns;
    let kernel_dims = (to_cl_uint(rows, inner)?, to_cl_uint(inner, columns)?, to_cl_uint(columns, rows)?);

    let context = Context::new(cl, &device)?;
    let queue = CommandQueue::new(cl, &context, &device)?;
    let program = Program::build(cl, &context, &device, &matrix_multiply_kernel::<T>())?;
    let kernel = Kernel::new(cl, &program, MATRIX_MULTIPLY_KERNEL_NAME)?;

    let a_buffer = Buffer::<T>::new(cl, &context, CL_MEM_READ_ONLY, a.as_slice().len())?;
    let b_buffer = Buffer::<T>::new(cl, &context, CL_MEM_READ_ONLY, b.as_slice().len())?;
    let c_buffer = Buffer::<T>::new(cl, &context, CL_MEM_WRITE_ONLY, total)?;

    queue.write(&a_buffer, a.as_slice())?;
    queue.write(&b_buffer, b.as_slice())?;

    kernel.set_buffer(0, &a_buffer)?;
    kernel.set_buffer(1, &b_buffer)?;
    kernel.set_buffer(2, &c_buffer)?;
    kernel.set_arg(3, &kernel_dims.0)?;
    kernel.set_arg(4, &kernel_dims.1)?;
    kernel.set_arg(5, &kernel_dims.2)?;

    let local_size = WORK_GROUP_SIZE.min(device.max_work_group_size).max(1);
    let global_size = total.div_ceil(local_size) * local_size;
    log::trace!("global = {}, local = {}", global_size, local_size);
    queue.run_1d(&kernel, global_size, local_size)?;

    let mut result = Matrix::new(rows, columns)?;
    queue.read(&c_buffer, result.as_mut_slice())?;

    Ok(result)
}

// Размер, не помещающийся в uint ядра, считается недопустимым
fn to_cl_uint(value: usize, other: usize) -> Result<cl_uint> {
    cl_uint::try_from(value).map_err(|_| MatmulError::InvalidDimension { rows: value, columns: other })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::baseline_multiply;

    // На машине без OpenCL допустима только ошибка устройства
    #[test]
    fn test_matches_baseline_or_reports_device_error() {
        let mut a: Matrix<f32> = Matrix::new(11, 13).unwrap();
        let mut b: Matrix<f32> = Matrix::new(13, 9).unwrap();
        a.randomize(1337);
        b.randomize(42);

        match multiply(&a, &b) {
            Ok(c) => assert!(c.approx_eq(&baseline_multiply(&a, &b).unwrap())),
            Err(e) => assert!(e.is_device_error(), "unexpected error: {}", e),
        }
    }

    #[test]
    fn test_dimension_mismatch_checked_before_device() {
        let a: Matrix<f64> = Matrix::new(2, 3).unwrap();
        let b: Matrix<f64> = Matrix::new(2, 3).unwrap();
        assert!(matches!(multiply(&a, &b), Err(MatmulError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_cl_uint_conversion() {
        assert_eq!(to_cl_uint(29, 11).unwrap(), 29);
        #[cfg(target_pointer_width = "64")]
        assert!(to_cl_uint(usize::MAX, 1).is_err());
    }
}
