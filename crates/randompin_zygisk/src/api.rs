//! Host API used by the module lifecycle.
//!
//! # Responsibility
//! - Wrap the raw Zygisk service table in safe, use-case-level calls.
//! - Turn missing host entries and failure sentinels into `HostError`.
//!
//! # Invariants
//! - No call ever goes through a null function pointer.
//! - File descriptors returned by the host are owned by the caller.
//!
//! # See also
//! - docs/architecture/lifecycle.md

use crate::abi::{ApiTable, ModuleAbi, ZygiskOption};
use jni::sys::{JNIEnv, JNINativeMethod};
use std::error::Error;
use std::ffi::{c_int, c_void, CString};
use std::fmt::{Display, Formatter};
use std::os::fd::{FromRawFd, OwnedFd};
use std::os::unix::net::UnixStream;

/// Host services the module lifecycle depends on.
pub trait HostApi {
    /// Sets a host option for the current process.
    fn set_option(&self, option: ZygiskOption) -> Result<(), HostError>;

    /// Opens the module's installation directory.
    ///
    /// Only valid during the `pre[XXX]Specialize` callbacks.
    fn module_dir(&self) -> Result<OwnedFd, HostError>;

    /// Returns the root manager state flags of the current process.
    fn flags(&self) -> Result<u32, HostError>;
}

/// Safe handle over the host's `api_table`.
#[derive(Debug, Clone, Copy)]
pub struct ZygiskApi {
    table: *mut ApiTable,
}

impl ZygiskApi {
    /// Wraps a host-provided table.
    ///
    /// # Safety
    /// `table` must point to a live `ApiTable` that outlives every copy of the
    /// returned handle. The host keeps it alive for the whole process.
    pub unsafe fn from_raw(table: *mut ApiTable) -> Self {
        Self { table }
    }

    fn table(&self) -> &ApiTable {
        // SAFETY: `from_raw` contract.
        unsafe { &*self.table }
    }

    /// Hands the module's callback table to the host.
    ///
    /// # Safety
    /// `abi` must stay valid for as long as the library is loaded.
    pub unsafe fn register_module(&self, abi: *mut ModuleAbi) -> Result<(), HostError> {
        let register = self
            .table()
            .register_module
            .ok_or(HostError::MissingEntry("registerModule"))?;
        if register(self.table, abi) {
            Ok(())
        } else {
            Err(HostError::RegistrationRejected)
        }
    }

    /// Replaces JNI native method implementations of `class_name`.
    ///
    /// On return, each `fnPtr` holds the previous implementation, or null when
    /// the host could not find that method.
    ///
    /// # Safety
    /// `env` must be the JNI env of the current thread and every `fnPtr` must
    /// match the declared signature.
    pub unsafe fn hook_jni_native_methods(
        &self,
        env: *mut JNIEnv,
        class_name: &str,
        methods: &mut [JNINativeMethod],
    ) -> Result<(), HostError> {
        let hook = self
            .table()
            .hook_jni_native_methods
            .ok_or(HostError::MissingEntry("hookJniNativeMethods"))?;
        let class_name = to_c_string(class_name)?;
        let count = c_int::try_from(methods.len())
            .map_err(|_| HostError::InvalidArgument("too many native methods".to_string()))?;
        hook(env, class_name.as_ptr(), methods.as_mut_ptr(), count);
        Ok(())
    }

    /// Queues a PLT redirection of `symbol` in every library whose path
    /// matches `lib_regex`. Nothing changes until [`Self::plt_hook_commit`].
    ///
    /// # Safety
    /// `replacement` must be a function with the same ABI as `symbol`, and
    /// `original` must be null or point to storage that outlives the hook.
    pub unsafe fn plt_hook_register(
        &self,
        lib_regex: &str,
        symbol: &str,
        replacement: *mut c_void,
        original: *mut *mut c_void,
    ) -> Result<(), HostError> {
        let register = self
            .table()
            .plt_hook_register
            .ok_or(HostError::MissingEntry("pltHookRegister"))?;
        let lib_regex = to_c_string(lib_regex)?;
        let symbol = to_c_string(symbol)?;
        register(lib_regex.as_ptr(), symbol.as_ptr(), replacement, original);
        Ok(())
    }

    /// Excludes libraries matching `lib_regex` from queued `symbol` hooks.
    pub fn plt_hook_exclude(&self, lib_regex: &str, symbol: &str) -> Result<(), HostError> {
        let exclude = self
            .table()
            .plt_hook_exclude
            .ok_or(HostError::MissingEntry("pltHookExclude"))?;
        let lib_regex = to_c_string(lib_regex)?;
        let symbol = to_c_string(symbol)?;
        // SAFETY: both strings outlive the call; the host copies them.
        unsafe { exclude(lib_regex.as_ptr(), symbol.as_ptr()) };
        Ok(())
    }

    /// Applies every queued PLT redirection.
    pub fn plt_hook_commit(&self) -> Result<(), HostError> {
        let commit = self
            .table()
            .plt_hook_commit
            .ok_or(HostError::MissingEntry("pltHookCommit"))?;
        // SAFETY: takes no arguments; valid after registration.
        if unsafe { commit() } {
            Ok(())
        } else {
            Err(HostError::CommitRejected)
        }
    }

    /// Connects to the module's root companion process.
    pub fn connect_companion(&self) -> Result<UnixStream, HostError> {
        let connect = self
            .table()
            .connect_companion
            .ok_or(HostError::MissingEntry("connectCompanion"))?;
        // SAFETY: `this` is the host's own impl pointer.
        let fd = unsafe { connect(self.table().this) };
        let fd = owned_fd(fd).ok_or(HostError::CompanionUnavailable)?;
        Ok(UnixStream::from(fd))
    }
}

impl HostApi for ZygiskApi {
    fn set_option(&self, option: ZygiskOption) -> Result<(), HostError> {
        let set_option = self
            .table()
            .set_option
            .ok_or(HostError::MissingEntry("setOption"))?;
        // SAFETY: `this` is the host's own impl pointer.
        unsafe { set_option(self.table().this, option) };
        Ok(())
    }

    fn module_dir(&self) -> Result<OwnedFd, HostError> {
        let get_module_dir = self
            .table()
            .get_module_dir
            .ok_or(HostError::MissingEntry("getModuleDir"))?;
        // SAFETY: `this` is the host's own impl pointer.
        let fd = unsafe { get_module_dir(self.table().this) };
        owned_fd(fd).ok_or(HostError::ModuleDirUnavailable)
    }

    fn flags(&self) -> Result<u32, HostError> {
        let get_flags = self
            .table()
            .get_flags
            .ok_or(HostError::MissingEntry("getFlags"))?;
        // SAFETY: `this` is the host's own impl pointer.
        Ok(unsafe { get_flags(self.table().this) })
    }
}

fn owned_fd(raw: c_int) -> Option<OwnedFd> {
    if raw < 0 {
        return None;
    }
    // SAFETY: the host transfers ownership of non-negative descriptors.
    Some(unsafe { OwnedFd::from_raw_fd(raw) })
}

fn to_c_string(value: &str) -> Result<CString, HostError> {
    CString::new(value).map_err(|_| HostError::InvalidArgument(format!("interior NUL in `{value}`")))
}

/// Host interaction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The host left this table entry null.
    MissingEntry(&'static str),
    RegistrationRejected,
    CommitRejected,
    CompanionUnavailable,
    ModuleDirUnavailable,
    InvalidArgument(String),
}

impl Display for HostError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEntry(name) => write!(f, "host api entry is missing: {name}"),
            Self::RegistrationRejected => write!(f, "host rejected module registration"),
            Self::CommitRejected => write!(f, "host failed to commit plt hooks"),
            Self::CompanionUnavailable => write!(f, "companion process is unavailable"),
            Self::ModuleDirUnavailable => write!(f, "module directory is unavailable"),
            Self::InvalidArgument(message) => write!(f, "invalid host api argument: {message}"),
        }
    }
}

impl Error for HostError {}
