use randompin::abi::{ApiTable, ModuleAbi, ZygiskOption, PROCESS_ON_DENYLIST};
use randompin::{HostApi, HostError, ZygiskApi};
use std::ffi::{c_char, c_int, c_void, CStr};
use std::io::{Read, Write};
use std::os::fd::IntoRawFd;
use std::os::unix::net::UnixStream;
use std::ptr::null_mut;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;

static LAST_OPTION: AtomicI32 = AtomicI32::new(-1);
static EXCLUDED: Mutex<Vec<(String, String)>> = Mutex::new(Vec::new());
static COMPANION_PEER: Mutex<Option<UnixStream>> = Mutex::new(None);

unsafe extern "C" fn set_option(_this: *mut c_void, option: ZygiskOption) {
    LAST_OPTION.store(option as i32, Ordering::SeqCst);
}

unsafe extern "C" fn get_flags(_this: *mut c_void) -> u32 {
    PROCESS_ON_DENYLIST
}

unsafe extern "C" fn get_module_dir_failing(_this: *mut c_void) -> c_int {
    -1
}

unsafe extern "C" fn commit_failing() -> bool {
    false
}

unsafe extern "C" fn exclude(lib_regex: *const c_char, symbol: *const c_char) {
    let lib_regex = CStr::from_ptr(lib_regex).to_string_lossy().into_owned();
    let symbol = CStr::from_ptr(symbol).to_string_lossy().into_owned();
    EXCLUDED
        .lock()
        .expect("exclude lock")
        .push((lib_regex, symbol));
}

unsafe extern "C" fn connect_companion(_this: *mut c_void) -> c_int {
    let (ours, theirs) = UnixStream::pair().expect("socket pair");
    *COMPANION_PEER.lock().expect("peer lock") = Some(ours);
    theirs.into_raw_fd()
}

unsafe extern "C" fn register_v3_only(_table: *mut ApiTable, abi: *mut ModuleAbi) -> bool {
    (*abi).api_version == 3
}

fn empty_table() -> ApiTable {
    ApiTable {
        this: null_mut(),
        register_module: None,
        hook_jni_native_methods: None,
        plt_hook_register: None,
        plt_hook_exclude: None,
        plt_hook_commit: None,
        connect_companion: None,
        set_option: None,
        get_module_dir: None,
        get_flags: None,
    }
}

#[test]
fn missing_entries_surface_as_errors() {
    let mut table = empty_table();
    let api = unsafe { ZygiskApi::from_raw(&mut table) };

    assert_eq!(
        api.set_option(ZygiskOption::DlcloseModuleLibrary),
        Err(HostError::MissingEntry("setOption"))
    );
    assert_eq!(api.flags(), Err(HostError::MissingEntry("getFlags")));
    assert_eq!(
        api.plt_hook_commit(),
        Err(HostError::MissingEntry("pltHookCommit"))
    );
    assert!(matches!(
        api.connect_companion(),
        Err(HostError::MissingEntry("connectCompanion"))
    ));
}

#[test]
fn options_and_flags_reach_the_host() {
    let mut table = empty_table();
    table.set_option = Some(set_option);
    table.get_flags = Some(get_flags);
    let api = unsafe { ZygiskApi::from_raw(&mut table) };

    api.set_option(ZygiskOption::DlcloseModuleLibrary)
        .expect("set option");
    assert_eq!(LAST_OPTION.load(Ordering::SeqCst), 1);
    assert_eq!(api.flags(), Ok(PROCESS_ON_DENYLIST));
}

#[test]
fn failure_sentinels_map_to_errors() {
    let mut table = empty_table();
    table.get_module_dir = Some(get_module_dir_failing);
    table.plt_hook_commit = Some(commit_failing);
    let api = unsafe { ZygiskApi::from_raw(&mut table) };

    assert!(matches!(
        api.module_dir(),
        Err(HostError::ModuleDirUnavailable)
    ));
    assert_eq!(api.plt_hook_commit(), Err(HostError::CommitRejected));
}

#[test]
fn plt_exclusions_pass_strings_and_reject_interior_nul() {
    let mut table = empty_table();
    table.plt_hook_exclude = Some(exclude);
    let api = unsafe { ZygiskApi::from_raw(&mut table) };

    api.plt_hook_exclude(r".*libhwui\.so$", "open")
        .expect("exclude");
    let recorded = EXCLUDED.lock().expect("exclude lock").clone();
    assert_eq!(
        recorded,
        vec![(r".*libhwui\.so$".to_string(), "open".to_string())]
    );

    let err = api
        .plt_hook_exclude("lib\0c", "open")
        .expect_err("interior NUL");
    assert!(matches!(err, HostError::InvalidArgument(_)));
}

#[test]
fn companion_connection_is_a_working_stream() {
    let mut table = empty_table();
    table.connect_companion = Some(connect_companion);
    let api = unsafe { ZygiskApi::from_raw(&mut table) };

    let mut stream = api.connect_companion().expect("companion");
    stream.write_all(b"ping").expect("write");

    let mut peer = COMPANION_PEER
        .lock()
        .expect("peer lock")
        .take()
        .expect("peer end");
    let mut buf = [0u8; 4];
    peer.read_exact(&mut buf).expect("read");
    assert_eq!(&buf, b"ping");
}

#[test]
fn registration_result_is_propagated() {
    let mut table = empty_table();
    table.register_module = Some(register_v3_only);
    let api = unsafe { ZygiskApi::from_raw(&mut table) };

    unsafe extern "C" fn noop_app(_: *mut c_void, _: *mut randompin::abi::AppSpecializeArgs) {}
    unsafe extern "C" fn noop_post_app(
        _: *mut c_void,
        _: *const randompin::abi::AppSpecializeArgs,
    ) {
    }
    unsafe extern "C" fn noop_server(_: *mut c_void, _: *mut randompin::abi::ServerSpecializeArgs) {
    }
    unsafe extern "C" fn noop_post_server(
        _: *mut c_void,
        _: *const randompin::abi::ServerSpecializeArgs,
    ) {
    }

    let mut abi = ModuleAbi {
        api_version: 3,
        this: null_mut(),
        pre_app_specialize: noop_app,
        post_app_specialize: noop_post_app,
        pre_server_specialize: noop_server,
        post_server_specialize: noop_post_server,
    };
    unsafe { api.register_module(&mut abi) }.expect("v3 accepted");

    abi.api_version = 2;
    assert_eq!(
        unsafe { api.register_module(&mut abi) },
        Err(HostError::RegistrationRejected)
    );
}
