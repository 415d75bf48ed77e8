/// Get the tool name used in diagnostics by stripping the 'f' prefix.
/// e.g., "faconv" -> "aconv"
#[inline]
pub fn tool_name(binary_name: &str) -> &str {
    binary_name.strip_prefix('f').unwrap_or(binary_name)
}

/// Reset SIGPIPE to default behavior (SIG_DFL).
/// Rust sets SIGPIPE to SIG_IGN by default, but a filter in a pipeline
/// should be killed by SIGPIPE (exit code 141 = 128 + 13) like the
/// other tools. This must be called at the start of main().
#[inline]
pub fn reset_sigpipe() {
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

/// Enlarge stdin/stdout pipe buffers on Linux for higher throughput.
/// Best effort: tries 1MB, then 256KB, then gives up silently.
/// No-op when the descriptors are not pipes.
#[cfg(target_os = "linux")]
pub fn enlarge_pipes() {
    for &fd in &[0i32, 1] {
        for &size in &[1024 * 1024i32, 256 * 1024] {
            if unsafe { libc::fcntl(fd, libc::F_SETPIPE_SZ, size) } > 0 {
                break;
            }
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub fn enlarge_pipes() {}

/// Format an IO error message without the "(os error N)" suffix.
/// Prints e.g. "Broken pipe" where Rust's Display impl
/// adds " (os error 32)".
pub fn io_error_msg(e: &std::io::Error) -> String {
    match e.raw_os_error() {
        Some(raw) => {
            let msg = std::io::Error::from_raw_os_error(raw).to_string();
            msg.replace(&format!(" (os error {})", raw), "")
        }
        None => e.to_string(),
    }
}
