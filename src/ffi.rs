//! FFI bindings for Wellness Insights
//!
//! This module provides C-compatible functions for calling the engine from
//! host applications. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using
//! `wellness_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::{InsightsConfig, StoredMedication, StoredSettings};
use crate::error::InsightsError;
use crate::pipeline::{sleep_rows_to_insights, InsightsProcessor};
use crate::schema::parse_clock_time;
use crate::score::DailyEngagement;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Resolve optional settings JSON; NULL means defaults
unsafe fn settings_from_ptr(
    settings_json: *const c_char,
) -> Result<InsightsConfig, InsightsError> {
    match cstr_to_string(settings_json) {
        Some(json) => StoredSettings::from_json_str(&json)?.resolve(),
        None => StoredSettings::default().resolve(),
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Analyze sleep rows and return the insights payload JSON.
///
/// # Safety
/// - `sleep_json` must be a valid null-terminated C string.
/// - `workouts_json` must be a valid null-terminated C string or NULL.
/// - Returns a newly allocated string that must be freed with `wellness_free_string`.
/// - Returns NULL on error; call `wellness_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellness_sleep_to_insights(
    sleep_json: *const c_char,
    workouts_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let sleep_str = match cstr_to_string(sleep_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid sleep JSON string pointer");
            return ptr::null_mut();
        }
    };
    let workouts_str = cstr_to_string(workouts_json);

    match sleep_rows_to_insights(sleep_str, workouts_str) {
        Ok(payload) => string_to_cstr(&payload),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Compute the 0-100 daily score for one day of engagement.
///
/// # Safety
/// - `engagement_json` must be a valid null-terminated C string.
/// - `settings_json` must be a valid null-terminated C string or NULL (defaults).
/// - Returns -1 on error; call `wellness_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellness_daily_score(
    engagement_json: *const c_char,
    settings_json: *const c_char,
) -> i32 {
    clear_last_error();

    let engagement_str = match cstr_to_string(engagement_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid engagement JSON string pointer");
            return -1;
        }
    };

    let config = match settings_from_ptr(settings_json) {
        Ok(config) => config,
        Err(e) => {
            set_last_error(&e.to_string());
            return -1;
        }
    };

    match serde_json::from_str::<DailyEngagement>(&engagement_str) {
        Ok(engagement) => i32::from(InsightsProcessor::with_config(config).daily_score(&engagement)),
        Err(e) => {
            set_last_error(&InsightsError::from(e).to_string());
            -1
        }
    }
}

/// Classify the medication status at a local clock time.
///
/// # Safety
/// - `schedule_json` must be a valid null-terminated C string holding the
///   stored medication settings.
/// - `now` must be a valid null-terminated C string ("HH:MM").
/// - Returns a newly allocated string that must be freed with `wellness_free_string`.
/// - Returns NULL on error; call `wellness_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellness_medication_status(
    schedule_json: *const c_char,
    now: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let schedule_str = match cstr_to_string(schedule_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid schedule JSON string pointer");
            return ptr::null_mut();
        }
    };

    let now_str = match cstr_to_string(now) {
        Some(s) => s,
        None => {
            set_last_error("Invalid time string pointer");
            return ptr::null_mut();
        }
    };

    let result = medication_status_json(&schedule_str, &now_str);
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

fn medication_status_json(schedule_json: &str, now: &str) -> Result<String, InsightsError> {
    let stored: StoredMedication = serde_json::from_str(schedule_json)?;
    let config = StoredSettings {
        medication: Some(stored),
        ..StoredSettings::default()
    }
    .resolve()?;
    let now = parse_clock_time(now)?;
    let status = InsightsProcessor::with_config(config).medication_status(now);
    Ok(serde_json::to_string(&status)?)
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to an InsightsProcessor
pub struct InsightsProcessorHandle {
    processor: InsightsProcessor,
}

/// Create a new InsightsProcessor from stored settings.
///
/// # Safety
/// - `settings_json` must be a valid null-terminated C string or NULL (defaults).
/// - Returns a pointer to a newly allocated InsightsProcessor.
/// - Must be freed with `wellness_processor_free`.
/// - Returns NULL on error; call `wellness_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellness_processor_new(
    settings_json: *const c_char,
) -> *mut InsightsProcessorHandle {
    clear_last_error();

    match settings_from_ptr(settings_json) {
        Ok(config) => {
            let processor = InsightsProcessor::with_config(config);
            Box::into_raw(Box::new(InsightsProcessorHandle { processor }))
        }
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free an InsightsProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `wellness_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn wellness_processor_free(processor: *mut InsightsProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Analyze sleep rows with a configured processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `wellness_processor_new`.
/// - `sleep_json` must be a valid null-terminated C string.
/// - `workouts_json` must be a valid null-terminated C string or NULL.
/// - Returns a newly allocated string that must be freed with `wellness_free_string`.
/// - Returns NULL on error; call `wellness_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellness_processor_analyze(
    processor: *const InsightsProcessorHandle,
    sleep_json: *const c_char,
    workouts_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    let sleep_str = match cstr_to_string(sleep_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid sleep JSON string pointer");
            return ptr::null_mut();
        }
    };
    let workouts_str = cstr_to_string(workouts_json);

    match handle
        .processor
        .process_json(&sleep_str, workouts_str.as_deref())
    {
        Ok(payload) => string_to_cstr(&payload),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Wellness Insights functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a `wellness_*` function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn wellness_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next `wellness_*` call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn wellness_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn wellness_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
