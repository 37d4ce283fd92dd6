//! Stderr helpers usable inside `pre_exec` hooks.
//!
//! Between `fork()` and `execve()` only async-signal-safe calls are allowed,
//! so these write straight to the file descriptor from stack buffers.

/// Write a raw message to stderr.
#[cfg(unix)]
pub fn pre_exec_log(msg: &[u8]) {
    unsafe {
        libc::write(
            libc::STDERR_FILENO,
            msg.as_ptr() as *const libc::c_void,
            msg.len(),
        );
    }
}

/// Append `errno=<n>` and a newline to stderr.
#[cfg(unix)]
pub fn pre_exec_log_errno(errno: i32) {
    let mut buf = [0u8; 24];
    let len = format_errno(errno, &mut buf);
    pre_exec_log(b"errno=");
    pre_exec_log(&buf[buf.len() - len..]);
    pre_exec_log(b"\n");
}

/// Render `errno` right-aligned into `buf`, returning the number of bytes used.
#[cfg(unix)]
fn format_errno(errno: i32, buf: &mut [u8; 24]) -> usize {
    let mut n = errno.unsigned_abs();
    let mut idx = buf.len();
    loop {
        idx -= 1;
        buf[idx] = b'0' + (n % 10) as u8;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    if errno < 0 {
        idx -= 1;
        buf[idx] = b'-';
    }
    buf.len() - idx
}
