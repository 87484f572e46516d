use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current local time in the format YYYY-MM-DD HH:MM:SS TZ
#[cfg(unix)]
pub fn now() -> String {
    use std::ffi::CStr;

    let secs = unix_timestamp() as libc::time_t;
    let mut tm: libc::tm = unsafe { std::mem::zeroed() };
    let mut buf = [0 as libc::c_char; 100];
    let fmt = b"%Y-%m-%d %H:%M:%S %Z\0";

    unsafe {
        if libc::localtime_r(&secs, &mut tm).is_null() {
            return String::new();
        }
        let written = libc::strftime(
            buf.as_mut_ptr(),
            buf.len(),
            fmt.as_ptr() as *const libc::c_char,
            &tm,
        );
        if written == 0 {
            return String::new();
        }
        CStr::from_ptr(buf.as_ptr()).to_string_lossy().into_owned()
    }
}

/// Returns the current local time in the format YYYY-MM-DD HH:MM:SS TZ
#[cfg(windows)]
pub fn now() -> String {
    use windows_sys::Win32::Foundation::SYSTEMTIME;
    use windows_sys::Win32::System::SystemInformation::GetLocalTime;
    use windows_sys::Win32::System::Time::{GetTimeZoneInformation, TIME_ZONE_INFORMATION};

    let mut tm: SYSTEMTIME = unsafe { std::mem::zeroed() };
    let mut tz: TIME_ZONE_INFORMATION = unsafe { std::mem::zeroed() };
    unsafe {
        GetLocalTime(&mut tm);
        GetTimeZoneInformation(&mut tz);
    }

    let name_len = tz
        .StandardName
        .iter()
        .position(|c| *c == 0)
        .unwrap_or(tz.StandardName.len());
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02} {}",
        tm.wYear,
        tm.wMonth,
        tm.wDay,
        tm.wHour,
        tm.wMinute,
        tm.wSecond,
        String::from_utf16_lossy(&tz.StandardName[..name_len])
    )
}

/// Returns the current Unix timestamp in seconds
pub fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or(0)
}
