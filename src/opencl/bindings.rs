//! Низкоуровневые привязки к OpenCL API
//!
//! Библиотека OpenCL загружается во время выполнения, поэтому крейт
//! собирается и работает на машинах без OpenCL: в этом случае
//! [`OpenCl::load`] возвращает `None`.

use std::os::raw::{c_char, c_void};
use std::sync::OnceLock;

use libloading::{Library, Symbol};

use super::callbacks::ContextNotifyCallback;
use super::types::*;

type FnGetPlatformIDs = unsafe extern "C" fn(cl_uint, *mut cl_platform_id, *mut cl_uint) -> cl_int;
type FnGetPlatformInfo =
    unsafe extern "C" fn(cl_platform_id, cl_platform_info, usize, *mut c_void, *mut usize) -> cl_int;
type FnGetDeviceIDs =
    unsafe extern "C" fn(cl_platform_id, cl_device_type, cl_uint, *mut cl_device_id, *mut cl_uint) -> cl_int;
type FnGetDeviceInfo =
    unsafe extern "C" fn(cl_device_id, cl_device_info, usize, *mut c_void, *mut usize) -> cl_int;
type FnCreateContext = unsafe extern "C" fn(
    *const cl_context_properties,
    cl_uint,
    *const cl_device_id,
    ContextNotifyCallback,
    *mut c_void,
    *mut cl_int,
) -> cl_context;
type FnCreateCommandQueue =
    unsafe extern "C" fn(cl_context, cl_device_id, cl_command_queue_properties, *mut cl_int) -> cl_command_queue;
type FnCreateProgramWithSource =
    unsafe extern "C" fn(cl_context, cl_uint, *const *const c_char, *const usize, *mut cl_int) -> cl_program;
type FnBuildProgram = unsafe extern "C" fn(
    cl_program,
    cl_uint,
    *const cl_device_id,
    *const c_char,
    Option<unsafe extern "C" fn(cl_program, *mut c_void)>,
    *mut c_void,
) -> cl_int;
type FnGetProgramBuildInfo = unsafe extern "C" fn(
    cl_program,
    cl_device_id,
    cl_program_build_info,
    usize,
    *mut c_void,
    *mut usize,
) -> cl_int;
type FnCreateKernel = unsafe extern "C" fn(cl_program, *const c_char, *mut cl_int) -> cl_kernel;
type FnCreateBuffer = unsafe extern "C" fn(cl_context, cl_mem_flags, usize, *mut c_void, *mut cl_int) -> cl_mem;
type FnSetKernelArg = unsafe extern "C" fn(cl_kernel, cl_uint, usize, *const c_void) -> cl_int;
type FnEnqueueWriteBuffer = unsafe extern "C" fn(
    cl_command_queue,
    cl_mem,
    cl_bool,
    usize,
    usize,
    *const c_void,
    cl_uint,
    *const cl_event,
    *mut cl_event,
) -> cl_int;
type FnEnqueueReadBuffer = unsafe extern "C" fn(
    cl_command_queue,
    cl_mem,
    cl_bool,
    usize,
    usize,
    *mut c_void,
    cl_uint,
    *const cl_event,
    *mut cl_event,
) -> cl_int;
type FnEnqueueNDRangeKernel = unsafe extern "C" fn(
    cl_command_queue,
    cl_kernel,
    cl_uint,
    *const usize,
    *const usize,
    *const usize,
    cl_uint,
    *const cl_event,
    *mut cl_event,
) -> cl_int;
type FnFinish = unsafe extern "C" fn(cl_command_queue) -> cl_int;
type FnRelease = unsafe extern "C" fn(*mut c_void) -> cl_int;

/// Таблица функций OpenCL, загруженных из системной библиотеки
#[allow(non_snake_case)]
pub struct OpenCl {
    pub clGetPlatformIDs: FnGetPlatformIDs,
    pub clGetPlatformInfo: FnGetPlatformInfo,
    pub clGetDeviceIDs: FnGetDeviceIDs,
    pub clGetDeviceInfo: FnGetDeviceInfo,
    pub clCreateContext: FnCreateContext,
    pub clCreateCommandQueue: FnCreateCommandQueue,
    pub clCreateProgramWithSource: FnCreateProgramWithSource,
    pub clBuildProgram: FnBuildProgram,
    pub clGetProgramBuildInfo: FnGetProgramBuildInfo,
    pub clCreateKernel: FnCreateKernel,
    pub clCreateBuffer: FnCreateBuffer,
    pub clSetKernelArg: FnSetKernelArg,
    pub clEnqueueWriteBuffer: FnEnqueueWriteBuffer,
    pub clEnqueueReadBuffer: FnEnqueueReadBuffer,
    pub clEnqueueNDRangeKernel: FnEnqueueNDRangeKernel,
    pub clFinish: FnFinish,
    pub clReleaseMemObject: FnRelease,
    pub clReleaseKernel: FnRelease,
    pub clReleaseProgram: FnRelease,
    pub clReleaseCommandQueue: FnRelease,
    pub clReleaseContext: FnRelease,
}

static LIBRARY: OnceLock<Option<Library>> = OnceLock::new();
static RUNTIME: OnceLock<Option<OpenCl>> = OnceLock::new();

#[cfg(target_os = "linux")]
const LIBRARY_NAMES: &[&str] = &["libOpenCL.so.1", "libOpenCL.so"];
#[cfg(target_os = "windows")]
const LIBRARY_NAMES: &[&str] = &["OpenCL.dll"];
#[cfg(target_os = "macos")]
const LIBRARY_NAMES: &[&str] = &["/System/Library/Frameworks/OpenCL.framework/OpenCL"];
#[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
const LIBRARY_NAMES: &[&str] = &[];

impl OpenCl {
    /// Загружает OpenCL один раз на процесс.
    ///
    /// `None` означает, что ICD loader не установлен.
    pub fn load() -> Option<&'static OpenCl> {
        let library = LIBRARY.get_or_init(|| {
            for name in LIBRARY_NAMES {
                // SAFETY: загружаем системный ICD loader, его инициализаторы не имеют побочных эффектов
                if let Ok(lib) = unsafe { Library::new(name) } {
                    log::debug!("Загружена библиотека {}", name);
                    return Some(lib);
                }
            }
            log::debug!("Библиотека OpenCL не найдена");
            None
        });

        RUNTIME
            .get_or_init(|| library.as_ref().and_then(Self::from_library))
            .as_ref()
    }

    fn from_library(lib: &Library) -> Option<OpenCl> {
        macro_rules! load_sym {
            ($name:ident, $ty:ty) => {{
                // SAFETY: сигнатура совпадает с заголовками OpenCL 1.2
                let sym: Symbol<'_, $ty> = unsafe { lib.get(stringify!($name).as_bytes()) }.ok()?;
                *sym
            }};
        }

        Some(OpenCl {
            clGetPlatformIDs: load_sym!(clGetPlatformIDs, FnGetPlatformIDs),
            clGetPlatformInfo: load_sym!(clGetPlatformInfo, FnGetPlatformInfo),
            clGetDeviceIDs: load_sym!(clGetDeviceIDs, FnGetDeviceIDs),
            clGetDeviceInfo: load_sym!(clGetDeviceInfo, FnGetDeviceInfo),
            clCreateContext: load_sym!(clCreateContext, FnCreateContext),
            clCreateCommandQueue: load_sym!(clCreateCommandQueue, FnCreateCommandQueue),
            clCreateProgramWithSource: load_sym!(clCreateProgramWithSource, FnCreateProgramWithSource),
            clBuildProgram: load_sym!(clBuildProgram, FnBuildProgram),
            clGetProgramBuildInfo: load_sym!(clGetProgramBuildInfo, FnGetProgramBuildInfo),
            clCreateKernel: load_sym!(clCreateKernel, FnCreateKernel),
            clCreateBuffer: load_sym!(clCreateBuffer, FnCreateBuffer),
            clSetKernelArg: load_sym!(clSetKernelArg, FnSetKernelArg),
            clEnqueueWriteBuffer: load_sym!(clEnqueueWriteBuffer, FnEnqueueWriteBuffer),
            clEnqueueReadBuffer: load_sym!(clEnqueueReadBuffer, FnEnqueueReadBuffer),
            clEnqueueNDRangeKernel: load_sym!(clEnqueueNDRangeKernel, FnEnqueueNDRangeKernel),
            clFinish: load_sym!(clFinish, FnFinish),
            clReleaseMemObject: load_sym!(clReleaseMemObject, FnRelease),
            clReleaseKernel: load_sym!(clReleaseKernel, FnRelease),
            clReleaseProgram: load_sym!(clReleaseProgram, FnRelease),
            clReleaseCommandQueue: load_sym!(clReleaseCommandQueue, FnRelease),
            clReleaseContext: load_sym!(clReleaseContext, FnRelease),
        })
    }
}
