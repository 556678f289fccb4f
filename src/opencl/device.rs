//! Обнаружение OpenCL платформ и устройств

use std::os::raw::c_void;
use std::ptr;

use super::bindings::OpenCl;
use super::types::*;
use super::utils::from_c_buffer;
use crate::error::{MatmulError, Result};

/// OpenCL платформа с информацией для лога
#[derive(Debug, Clone)]
pub struct Platform {
    pub(crate) id: cl_platform_id,
    pub name: String,
    pub vendor: String,
    pub version: String,
}

/// Вычислительное устройство платформы
#[derive(Debug, Clone)]
pub struct Device {
    pub(crate) id: cl_device_id,
    pub name: String,
    pub max_work_group_size: usize,
}

/// Возвращает все платформы; пустой список, если их нет
pub fn list_platforms(cl: &OpenCl) -> Result<Vec<Platform>> {
    let mut count: cl_uint = 0;
    let status = unsafe { (cl.clGetPlatformIDs)(0, ptr::null_mut(), &mut count) };
    if status == CL_PLATFORM_NOT_FOUND_KHR || (status == CL_SUCCESS && count == 0) {
        return Ok(Vec::new());
    }
    if status != CL_SUCCESS {
        return Err(MatmulError::DeviceOperationFailed { status, call: "clGetPlatformIDs" });
    }

    let mut ids: Vec<cl_platform_id> = vec![ptr::null_mut(); count as usize];
    cl_check!(cl, clGetPlatformIDs(count, ids.as_mut_ptr(), &mut count));
    ids.truncate(count as usize);

    let mut platforms = Vec::with_capacity(ids.len());
    for id in ids {
        let platform = Platform {
            id,
            name: platform_info(cl, id, CL_PLATFORM_NAME)?,
            vendor: platform_info(cl, id, CL_PLATFORM_VENDOR)?,
            version: platform_info(cl, id, CL_PLATFORM_VERSION)?,
        };
        log::debug!(
            "Платформа: {} ({}), {}",
            platform.name,
            platform.vendor,
            platform.version
        );
        platforms.push(platform);
    }
    Ok(platforms)
}

/// Возвращает все устройства платформы; пустой список, если их нет
pub fn list_devices(cl: &OpenCl, platform: &Platform) -> Result<Vec<Device>> {
    let mut count: cl_uint = 0;
    let status = unsafe {
        (cl.clGetDeviceIDs)(platform.id, CL_DEVICE_TYPE_ALL, 0, ptr::null_mut(), &mut count)
    };
    if status == CL_DEVICE_NOT_FOUND || (status == CL_SUCCESS && count == 0) {
        return Ok(Vec::new());
    }
    if status != CL_SUCCESS {
        return Err(MatmulError::DeviceOperationFailed { status, call: "clGetDeviceIDs" });
    }

    let mut ids: Vec<cl_device_id> = vec![ptr::null_mut(); count as usize];
    cl_check!(cl, clGetDeviceIDs(platform.id, CL_DEVICE_TYPE_ALL, count, ids.as_mut_ptr(), &mut count));
    ids.truncate(count as usize);

    let mut devices = Vec::with_capacity(ids.len());
    for id in ids {
        let mut max_work_group_size: usize = 0;
        cl_check!(cl, clGetDeviceInfo(
            id,
            CL_DEVICE_MAX_WORK_GROUP_SIZE,
            std::mem::size_of::<usize>(),
            &mut max_work_group_size as *mut usize as *mut c_void,
            ptr::null_mut()
        ));
        let device = Device {
            id,
            name: device_info(cl, id, CL_DEVICE_NAME)?,
            max_work_group_size,
        };
        log::debug!(
            "\tУстройство: {}, max work group size: {}",
            device.name,
            device.max_work_group_size
        );
        devices.push(device);
    }
    Ok(devices)
}

/// Первое устройство на первой платформе, где устройства вообще есть
pub fn select_device(cl: &OpenCl) -> Result<(Platform, Device)> {
    let platforms = list_platforms(cl)?;
    if platforms.is_empty() {
        return Err(MatmulError::NoPlatformAvailable);
    }
    for platform in platforms {
        if let Some(device) = list_devices(cl, &platform)?.into_iter().next() {
            return Ok((platform, device));
        }
    }
    Err(MatmulError::NoDeviceAvailable)
}

fn platform_info(cl: &OpenCl, id: cl_platform_id, param: cl_platform_info) -> Result<String> {
    let mut size: usize = 0;
    cl_check!(cl, clGetPlatformInfo(id, param, 0, ptr::null_mut(), &mut size));
    let mut buffer = vec![0u8; size];
    cl_check!(cl, clGetPlatformInfo(id, param, size, buffer.as_mut_ptr() as *mut c_void, ptr::null_mut()));
    Ok(from_c_buffer(&buffer))
}

fn device_info(cl: &OpenCl, id: cl_device_id, param: cl_device_info) -> Result<String> {
    let mut size: usize = 0;
    cl_check!(cl, clGetDeviceInfo(id, param, 0, ptr::null_mut(), &mut size));
    let mut buffer = vec![0u8; size];
    cl_check!(cl, clGetDeviceInfo(id, param, size, buffer.as_mut_ptr() as *mut c_void, ptr::null_mut()));
    Ok(from_c_buffer(&buffer))
}
