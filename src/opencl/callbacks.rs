use std::ffi::CStr;
use std::os::raw::{c_char, c_void};

/// Тип callback-функции для контекста OpenCL
pub type ContextNotifyCallback = Option<
    unsafe extern "C" fn(
        errinfo: *const c_char,
        private_info: *const c_void,
        cb: usize,
        user_data: *mut c_void,
    ),
>;

/// Пишет асинхронные ошибки контекста в лог
pub unsafe extern "C" fn log_context_error(
    errinfo: *const c_char,
    _private_info: *const c_void,
    _cb: usize,
    _user_data: *mut c_void,
) {
    if errinfo.is_null() {
        return;
    }
    let message = CStr::from_ptr(errinfo).to_string_lossy();
    log::error!("OpenCL context: {}", message);
}
