//! Conversion of host specialize arguments into owned identities.
//!
//! # Invariants
//! - Host-owned JNI references are only read, never deleted or replaced.
//! - Null slots read as zero, empty or `None`.
//! - A failed JNI call never leaves a Java exception pending.

use crate::abi::{AppSpecializeArgs, ServerSpecializeArgs};
use jni::objects::{JIntArray, JString};
use jni::sys::{jint, jintArray, jlong, jstring};
use jni::JNIEnv;
use randompin_core::{ProcessIdentity, ServerIdentity};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Reads the identity of an app process about to be specialized.
///
/// # Safety
/// `env` must be null or the JNI env of the current thread; every non-null
/// pointer in `args` must be valid for the current callback.
pub unsafe fn app_identity(
    env: *mut jni::sys::JNIEnv,
    args: &AppSpecializeArgs,
) -> Result<ProcessIdentity, ArgsError> {
    let mut env = JNIEnv::from_raw(env).map_err(ArgsError::Jni)?;
    Ok(ProcessIdentity {
        uid: read_int(args.uid),
        gid: read_int(args.gid),
        gids: read_int_array(&mut env, args.gids)?,
        runtime_flags: read_int(args.runtime_flags),
        nice_name: read_string(&mut env, args.nice_name)?,
        app_data_dir: read_string(&mut env, args.app_data_dir)?,
    })
}

/// Reads the identity of the system server about to be specialized.
///
/// # Safety
/// Same contract as [`app_identity`].
pub unsafe fn server_identity(
    env: *mut jni::sys::JNIEnv,
    args: &ServerSpecializeArgs,
) -> Result<ServerIdentity, ArgsError> {
    let mut env = JNIEnv::from_raw(env).map_err(ArgsError::Jni)?;
    Ok(ServerIdentity {
        uid: read_int(args.uid),
        gid: read_int(args.gid),
        gids: read_int_array(&mut env, args.gids)?,
        runtime_flags: read_int(args.runtime_flags),
        permitted_capabilities: read_long(args.permitted_capabilities),
        effective_capabilities: read_long(args.effective_capabilities),
    })
}

/// Reads `android.os.Build.VERSION.SDK_INT`.
///
/// # Safety
/// `env` must be null or the JNI env of the current thread.
pub unsafe fn sdk_level(env: *mut jni::sys::JNIEnv) -> Result<i32, ArgsError> {
    let mut env = JNIEnv::from_raw(env).map_err(ArgsError::Jni)?;
    let sdk = env
        .get_static_field("android/os/Build$VERSION", "SDK_INT", "I")
        .and_then(|value| value.i());
    clear_on_error(sdk, || clear_exception(&mut env))
}

unsafe fn read_int(slot: *const jint) -> i32 {
    if slot.is_null() {
        0
    } else {
        *slot
    }
}

unsafe fn read_long(slot: *const jlong) -> i64 {
    if slot.is_null() {
        0
    } else {
        *slot
    }
}

unsafe fn read_string(env: &mut JNIEnv, slot: *const jstring) -> Result<Option<String>, ArgsError> {
    if slot.is_null() || (*slot).is_null() {
        return Ok(None);
    }
    let value = JString::from_raw(*slot);
    let text = env.get_string(&value).map(String::from);
    clear_on_error(text, || clear_exception(env)).map(Some)
}

unsafe fn read_int_array(env: &mut JNIEnv, slot: *const jintArray) -> Result<Vec<i32>, ArgsError> {
    if slot.is_null() || (*slot).is_null() {
        return Ok(Vec::new());
    }
    let array = JIntArray::from_raw(*slot);
    let len = env.get_array_length(&array);
    let len = clear_on_error(len, || clear_exception(env))?;
    let len = usize::try_from(len).map_err(|_| ArgsError::NegativeLength(len))?;
    let mut values = vec![0; len];
    let filled = env.get_int_array_region(&array, 0, &mut values);
    clear_on_error(filled, || clear_exception(env))?;
    Ok(values)
}

/// Maps a JNI failure to `ArgsError`, running `clear` first so the failed
/// call's exception does not leak into the specializing process.
fn clear_on_error<T>(
    result: jni::errors::Result<T>,
    clear: impl FnOnce(),
) -> Result<T, ArgsError> {
    result.map_err(|err| {
        clear();
        ArgsError::Jni(err)
    })
}

fn clear_exception(env: &mut JNIEnv) {
    if env.exception_check().unwrap_or(false) {
        let _ = env.exception_clear();
    }
}

/// Argument extraction errors.
#[derive(Debug)]
pub enum ArgsError {
    Jni(jni::errors::Error),
    NegativeLength(i32),
}

impl Display for ArgsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Jni(err) => write!(f, "jni call failed: {err}"),
            Self::NegativeLength(len) => write!(f, "jni array reported negative length {len}"),
        }
    }
}

impl Error for ArgsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Jni(err) => Some(err),
            Self::NegativeLength(_) => None,
        }
    }
}
