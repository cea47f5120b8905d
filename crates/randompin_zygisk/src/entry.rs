//! Exported entry point and callback trampolines.
//!
//! # Invariants
//! - No panic unwinds into the host: every exported function runs inside
//!   `catch_unwind` and aborts the process on panic.
//! - The module instance and its callback table live until process exit; the
//!   host keeps raw pointers to both.

use crate::abi::{
    ApiTable, AppSpecializeArgs, ModuleAbi, ServerSpecializeArgs, ZYGISK_API_VERSION,
};
use crate::api::ZygiskApi;
use crate::args;
use crate::module::RandomPinModule;
use log::{debug, warn};
use randompin_core::{ProcessIdentity, ServerIdentity};
use std::ffi::c_void;
use std::panic::{catch_unwind, AssertUnwindSafe};

struct ModuleInstance {
    module: RandomPinModule,
    api: ZygiskApi,
    env: *mut jni::sys::JNIEnv,
}

/// Called by the host right after the library is loaded into zygote.
///
/// # Safety
/// `table` must be the host's live API table and `env` the JNI env of the
/// calling thread.
#[no_mangle]
pub unsafe extern "C" fn zygisk_module_entry(table: *mut ApiTable, env: *mut jni::sys::JNIEnv) {
    guard(|| {
        if table.is_null() {
            return;
        }
        let api = ZygiskApi::from_raw(table);
        let instance = Box::into_raw(Box::new(ModuleInstance {
            module: RandomPinModule::new(),
            api,
            env,
        }));
        let abi = Box::into_raw(Box::new(ModuleAbi {
            api_version: ZYGISK_API_VERSION,
            this: instance.cast::<c_void>(),
            pre_app_specialize,
            post_app_specialize,
            pre_server_specialize,
            post_server_specialize,
        }));

        if api.register_module(abi).is_err() {
            // Rejected: the host holds no reference to either allocation.
            drop(Box::from_raw(abi));
            drop(Box::from_raw(instance));
            return;
        }
        (*instance).module.on_load();
    });
}

unsafe extern "C" fn pre_app_specialize(this: *mut c_void, args: *mut AppSpecializeArgs) {
    guard(|| {
        let instance = &mut *this.cast::<ModuleInstance>();
        let identity = if args.is_null() {
            ProcessIdentity::default()
        } else {
            args::app_identity(instance.env, &*args).unwrap_or_else(|err| {
                warn!("event=read_args module=entry status=error error={err}");
                ProcessIdentity::default()
            })
        };
        instance.module.pre_app_specialize(&instance.api, &identity);
    });
}

unsafe extern "C" fn post_app_specialize(this: *mut c_void, _args: *const AppSpecializeArgs) {
    guard(|| {
        let instance = &mut *this.cast::<ModuleInstance>();
        let sdk = read_sdk(instance.env);
        instance.module.post_app_specialize(&instance.api, sdk);
    });
}

unsafe extern "C" fn pre_server_specialize(this: *mut c_void, args: *mut ServerSpecializeArgs) {
    guard(|| {
        let instance = &mut *this.cast::<ModuleInstance>();
        let identity = if args.is_null() {
            ServerIdentity::default()
        } else {
            args::server_identity(instance.env, &*args).unwrap_or_else(|err| {
                warn!("event=read_args module=entry status=error error={err}");
                ServerIdentity::default()
            })
        };
        instance.module.pre_server_specialize(&instance.api, &identity);
    });
}

unsafe extern "C" fn post_server_specialize(this: *mut c_void, _args: *const ServerSpecializeArgs) {
    guard(|| {
        let instance = &mut *this.cast::<ModuleInstance>();
        let sdk = read_sdk(instance.env);
        instance.module.post_server_specialize(&instance.api, sdk);
    });
}

/// SDK level of the device; 0 selects the oldest hook layout.
unsafe fn read_sdk(env: *mut jni::sys::JNIEnv) -> i32 {
    args::sdk_level(env).unwrap_or_else(|err| {
        debug!("event=read_sdk module=entry status=error error={err}");
        0
    })
}

fn guard(body: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(body)).is_err() {
        std::process::abort();
    }
}
