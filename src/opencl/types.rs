//! OpenCL типы данных

use std::os::raw::c_void;

#[allow(non_camel_case_types)]
pub type cl_platform_id = *mut c_void;
#[allow(non_camel_case_types)]
pub type cl_device_id = *mut c_void;
#[allow(non_camel_case_types)]
pub type cl_context = *mut c_void;
#[allow(non_camel_case_types)]
pub type cl_command_queue = *mut c_void;
#[allow(non_camel_case_types)]
pub type cl_program = *mut c_void;
#[allow(non_camel_case_types)]
pub type cl_kernel = *mut c_void;
#[allow(non_camel_case_types)]
pub type cl_mem = *mut c_void;
#[allow(non_camel_case_types)]
pub type cl_event = *mut c_void;
#[allow(non_camel_case_types)]
pub type cl_platform_info = u32;
#[allow(non_camel_case_types)]
pub type cl_device_info = u32;
#[allow(non_camel_case_types)]
pub type cl_device_type = u64;
#[allow(non_camel_case_types)]
pub type cl_int = i32;
#[allow(non_camel_case_types)]
pub type cl_uint = u32;
#[allow(non_camel_case_types)]
pub type cl_bool = u32;
#[allow(non_camel_case_types)]
pub type cl_context_properties = isize;
#[allow(non_camel_case_types)]
pub type cl_command_queue_properties = u64;
#[allow(non_camel_case_types)]
pub type cl_mem_flags = u64;
#[allow(non_camel_case_types)]
pub type cl_program_build_info = u32;

// Коды возврата
pub const CL_SUCCESS: cl_int = 0;
pub const CL_DEVICE_NOT_FOUND: cl_int = -1;
pub const CL_INVALID_VALUE: cl_int = -30;
pub const CL_PLATFORM_NOT_FOUND_KHR: cl_int = -1001;

pub const CL_TRUE: cl_bool = 1;

pub const CL_DEVICE_TYPE_ALL: cl_device_type = 0xFFFF_FFFF;

pub const CL_PLATFORM_VERSION: cl_platform_info = 0x0901;
pub const CL_PLATFORM_NAME: cl_platform_info = 0x0902;
pub const CL_PLATFORM_VENDOR: cl_platform_info = 0x0903;

pub const CL_DEVICE_MAX_WORK_GROUP_SIZE: cl_device_info = 0x1004;
pub const CL_DEVICE_NAME: cl_device_info = 0x102B;

pub const CL_MEM_READ_ONLY: cl_mem_flags = 1 << 2;
pub const CL_MEM_WRITE_ONLY: cl_mem_flags = 1 << 1;

pub const CL_PROGRAM_BUILD_LOG: cl_program_build_info = 0x1183;
