//! `#[repr(C)]` mirror of the Zygisk module ABI, API version 3.
//!
//! # Invariants
//! - Field order and types match the host's `api_table`, `module_abi` and
//!   specialize argument structs byte for byte.
//! - Every pointer in the argument structs is owned by the host and only
//!   valid for the duration of the callback it was passed to.
//! - Optional argument pointers may be null and must be checked first.

use jni::sys::{jboolean, jint, jintArray, jlong, jobjectArray, jstring, JNIEnv, JNINativeMethod};
use std::ffi::{c_char, c_int, c_long, c_void};

/// API version this module is built against.
pub const ZYGISK_API_VERSION: c_long = 3;

/// The process was granted root access by the root manager.
pub const PROCESS_GRANTED_ROOT: u32 = 1 << 0;
/// The process is on the root manager's denylist.
pub const PROCESS_ON_DENYLIST: u32 = 1 << 1;

/// Options a module can set on the host for the current process.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZygiskOption {
    /// Force the denylist unmount routine for this process.
    ForceDenylistUnmount = 0,
    /// `dlclose` the module library after `post[XXX]Specialize` returns.
    DlcloseModuleLibrary = 1,
}

/// Arguments of an app specialization.
///
/// Required fields are references on the host side and never null in
/// practice; they are still checked because a null deref here would take
/// down zygote.
#[repr(C)]
pub struct AppSpecializeArgs {
    pub uid: *mut jint,
    pub gid: *mut jint,
    pub gids: *mut jintArray,
    pub runtime_flags: *mut jint,
    pub mount_external: *mut jint,
    pub se_info: *mut jstring,
    pub nice_name: *mut jstring,
    pub instruction_set: *mut jstring,
    pub app_data_dir: *mut jstring,

    // Optional: null when the platform does not pass the argument.
    pub fds_to_ignore: *mut jintArray,
    pub is_child_zygote: *mut jboolean,
    pub is_top_app: *mut jboolean,
    pub pkg_data_info_list: *mut jobjectArray,
    pub whitelisted_data_info_list: *mut jobjectArray,
    pub mount_data_dirs: *mut jboolean,
    pub mount_storage_dirs: *mut jboolean,
}

/// Arguments of the system server specialization.
#[repr(C)]
pub struct ServerSpecializeArgs {
    pub uid: *mut jint,
    pub gid: *mut jint,
    pub gids: *mut jintArray,
    pub runtime_flags: *mut jint,
    pub permitted_capabilities: *mut jlong,
    pub effective_capabilities: *mut jlong,
}

pub type PreAppSpecializeFn = unsafe extern "C" fn(*mut c_void, *mut AppSpecializeArgs);
pub type PostAppSpecializeFn = unsafe extern "C" fn(*mut c_void, *const AppSpecializeArgs);
pub type PreServerSpecializeFn = unsafe extern "C" fn(*mut c_void, *mut ServerSpecializeArgs);
pub type PostServerSpecializeFn = unsafe extern "C" fn(*mut c_void, *const ServerSpecializeArgs);

/// Callback table handed to the host on registration.
#[repr(C)]
pub struct ModuleAbi {
    pub api_version: c_long,
    /// Passed back as the first argument of every callback.
    pub this: *mut c_void,
    pub pre_app_specialize: PreAppSpecializeFn,
    pub post_app_specialize: PostAppSpecializeFn,
    pub pre_server_specialize: PreServerSpecializeFn,
    pub post_server_specialize: PostServerSpecializeFn,
}

/// Host service table.
///
/// Only `this` and `register_module` are filled in when the entry point is
/// called; the rest becomes valid after a successful registration.
#[repr(C)]
pub struct ApiTable {
    pub this: *mut c_void,
    pub register_module: Option<unsafe extern "C" fn(*mut ApiTable, *mut ModuleAbi) -> bool>,

    pub hook_jni_native_methods:
        Option<unsafe extern "C" fn(*mut JNIEnv, *const c_char, *mut JNINativeMethod, c_int)>,
    pub plt_hook_register: Option<
        unsafe extern "C" fn(*const c_char, *const c_char, *mut c_void, *mut *mut c_void),
    >,
    pub plt_hook_exclude: Option<unsafe extern "C" fn(*const c_char, *const c_char)>,
    pub plt_hook_commit: Option<unsafe extern "C" fn() -> bool>,
    pub connect_companion: Option<unsafe extern "C" fn(*mut c_void) -> c_int>,
    pub set_option: Option<unsafe extern "C" fn(*mut c_void, ZygiskOption)>,
    pub get_module_dir: Option<unsafe extern "C" fn(*mut c_void) -> c_int>,
    pub get_flags: Option<unsafe extern "C" fn(*mut c_void) -> u32>,
}
