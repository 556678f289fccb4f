//! Владеющие обертки над объектами OpenCL
//!
//! Каждый объект освобождается в `Drop`, в том числе когда умножение
//! прерывается ошибкой на середине. Локальные переменные удаляются в обратном
//! порядке, так что буферы освобождаются раньше контекста.

use std::marker::PhantomData;
use std::mem;
use std::os::raw::c_void;
use std::ptr;

use super::bindings::OpenCl;
use super::callbacks::log_context_error;
use super::device::Device;
use super::types::*;
use super::utils::to_c_string;
use crate::error::{MatmulError, Result};

macro_rules! cl_handle {
    ($(#[$meta:meta])* $name:ident, $raw:ty, $release:ident) => {
        $(#[$meta])*
        pub struct $name {
            cl: &'static OpenCl,
            raw: $raw,
        }

        impl $name {
            pub fn raw(&self) -> $raw {
                self.raw
            }
        }

        impl Drop for $name {
            fn drop(&mut self) {
                let status = unsafe { (self.cl.$release)(self.raw) };
                if status != CL_SUCCESS {
                    log::warn!("{} вернул {}", stringify!($release), status);
                }
            }
        }
    };
}

cl_handle!(
    /// Контекст OpenCL на одном устройстве
    Context, cl_context, clReleaseContext
);
cl_handle!(
    /// Очередь команд
    CommandQueue, cl_command_queue, clReleaseCommandQueue
);
cl_handle!(
    /// Скомпилированная программа
    Program, cl_program, clReleaseProgram
);
cl_handle!(
    /// Ядро программы
    Kernel, cl_kernel, clReleaseKernel
);

/// Буфер в памяти устройства под `len` элементов типа `T`
pub struct Buffer<T> {
    cl: &'static OpenCl,
    raw: cl_mem,
    len: usize,
    _marker: PhantomData<T>,
}

impl Context {
    pub fn new(cl: &'static OpenCl, device: &Device) -> Result<Self> {
        let raw = cl_create!(cl, clCreateContext(
            ptr::null(),
            1,
            &device.id,
            Some(log_context_error),
            ptr::null_mut()
        ));
        Ok(Self { cl, raw })
    }
}

impl CommandQueue {
    pub fn new(cl: &'static OpenCl, context: &Context, device: &Device) -> Result<Self> {
        let raw = cl_create!(cl, clCreateCommandQueue(context.raw, device.id, 0));
        Ok(Self { cl, raw })
    }

    /// Блокирующая запись в буфер устройства
    pub fn write<T: Copy>(&self, buffer: &Buffer<T>, data: &[T]) -> Result<()> {
        debug_assert_eq!(buffer.len, data.len());
        let cl = self.cl;
        cl_check!(cl, clEnqueueWriteBuffer(
            self.raw,
            buffer.raw,
            CL_TRUE,
            0,
            mem::size_of_val(data),
            data.as_ptr() as *const c_void,
            0,
            ptr::null(),
            ptr::null_mut()
        ));
        Ok(())
    }

    /// Блокирующее чтение из буфера устройства
    pub fn read<T: Copy>(&self, buffer: &Buffer<T>, out: &mut [T]) -> Result<()> {
        debug_assert_eq!(buffer.len, out.len());
        let cl = self.cl;
        cl_check!(cl, clEnqueueReadBuffer(
            self.raw,
            buffer.raw,
            CL_TRUE,
            0,
            mem::size_of_val(out),
            out.as_mut_ptr() as *mut c_void,
            0,
            ptr::null(),
            ptr::null_mut()
        ));
        Ok(())
    }

    /// Запускает одномерное ядро и ждет его завершения
    pub fn run_1d(&self, kernel: &Kernel, global_size: usize, local_size: usize) -> Result<()> {
        let cl = self.cl;
        cl_check!(cl, clEnqueueNDRangeKernel(
            self.raw,
            kernel.raw,
            1,
            ptr::null(),
            &global_size,
            &local_size,
            0,
            ptr::null(),
            ptr::null_mut()
        ));
        cl_check!(cl, clFinish(self.raw));
        Ok(())
    }
}

impl Program {
    /// Компилирует программу; при ошибке лог компиляции пишется в лог
    pub fn build(cl: &'static OpenCl, context: &Context, device: &Device, source: &str) -> Result<Self> {
        let source_ptr = source.as_ptr() as *const std::os::raw::c_char;
        let source_len = source.len();
        let raw = cl_create!(cl, clCreateProgramWithSource(context.raw, 1, &source_ptr, &source_len));
        let program = Self { cl, raw };

        let status = unsafe {
            (cl.clBuildProgram)(program.raw, 1, &device.id, ptr::null(), None, ptr::null_mut())
        };
        if status != CL_SUCCESS {
            log::error!("Ошибка при компиляции программы: {}", status);
            log::error!("Лог компиляции: {}", program.build_log(device));
            return Err(MatmulError::DeviceOperationFailed { status, call: "clBuildProgram" });
        }

        Ok(program)
    }

    fn build_log(&self, device: &Device) -> String {
        let mut log_size: usize = 0;
        unsafe {
            (self.cl.clGetProgramBuildInfo)(
                self.raw,
                device.id,
                CL_PROGRAM_BUILD_LOG,
                0,
                ptr::null_mut(),
                &mut log_size,
            );
        }
        let mut build_log = vec![0u8; log_size];
        unsafe {
            (self.cl.clGetProgramBuildInfo)(
                self.raw,
                device.id,
                CL_PROGRAM_BUILD_LOG,
                log_size,
                build_log.as_mut_ptr() as *mut c_void,
                ptr::null_mut(),
            );
        }
        super::utils::from_c_buffer(&build_log)
    }
}

impl Kernel {
    pub fn new(cl: &'static OpenCl, program: &Program, name: &str) -> Result<Self> {
        let name = to_c_string(name);
        let raw = cl_create!(cl, clCreateKernel(program.raw, name.as_ptr()));
        Ok(Self { cl, raw })
    }

    pub fn set_buffer<T>(&self, index: cl_uint, buffer: &Buffer<T>) -> Result<()> {
        self.set_arg(index, &buffer.raw)
    }

    /// Скалярный аргумент ядра
    pub fn set_arg<A: Copy>(&self, index: cl_uint, value: &A) -> Result<()> {
        let cl = self.cl;
        cl_check!(cl, clSetKernelArg(
            self.raw,
            index,
            mem::size_of::<A>(),
            value as *const A as *const c_void
        ));
        Ok(())
    }
}

impl<T: Copy> Buffer<T> {
    pub fn new(cl: &'static OpenCl, context: &Context, flags: cl_mem_flags, len: usize) -> Result<Self> {
        let raw = cl_create!(cl, clCreateBuffer(
            context.raw,
            flags,
            len * mem::size_of::<T>(),
            ptr::null_mut()
        ));
        Ok(Self {
            cl,
            raw,
            len,
            _marker: PhantomData,
        })
    }
}

impl<T> Drop for Buffer<T> {
    fn drop(&mut self) {
        let status = unsafe { (self.cl.clReleaseMemObject)(self.raw) };
        if status != CL_SUCCESS {
            log::warn!("clReleaseMemObject вернул {}", status);
        }
    }
}
