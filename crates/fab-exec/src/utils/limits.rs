//! POSIX rlimits for job processes.
//!
//! On Unix the limits are installed with a `pre_exec` hook, so they are in
//! place before the job script starts. Other platforms log a warning and run
//! the job unrestricted.
//!
//! The soft limit is set to the requested value; the hard limit is kept when
//! it is already higher.

use tokio::process::Command;
#[cfg(not(unix))]
use tracing::warn;

use crate::ExecError;

/// Resource limits applied to one job process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RlimitConfig {
    /// Address-space limit in bytes (`RLIMIT_AS`), taken from the job's `memory` resource.
    pub max_address_space_bytes: Option<u64>,
    /// Set `RLIMIT_CORE` to zero.
    pub disable_core_dumps: bool,
}

impl RlimitConfig {
    /// `true` if no limit is configured.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max_address_space_bytes.is_none() && !self.disable_core_dumps
    }
}

/// Parse a memory size as written in job resources (`2G`, `512M`, `1024`).
///
/// Suffixes `K`, `M`, `G`, `T` (case-insensitive, optionally followed by `B`)
/// are binary multiples; a bare number is bytes.
pub fn parse_memory(value: &str) -> Result<u64, ExecError> {
    let invalid = || ExecError::InvalidMemory(value.to_string());

    let trimmed = value.trim();
    let upper = trimmed.to_ascii_uppercase();
    let digits = upper.strip_suffix('B').unwrap_or(&upper);
    let (number, shift) = match digits.chars().last() {
        Some('K') => (&digits[..digits.len() - 1], 10),
        Some('M') => (&digits[..digits.len() - 1], 20),
        Some('G') => (&digits[..digits.len() - 1], 30),
        Some('T') => (&digits[..digits.len() - 1], 40),
        Some(_) => (digits, 0),
        None => return Err(invalid()),
    };

    let n: u64 = number.trim().parse().map_err(|_| invalid())?;
    if n == 0 {
        return Err(invalid());
    }
    n.checked_mul(1u64 << shift).ok_or_else(invalid)
}

/// Attach rlimits to a command.
pub fn attach_rlimits(cmd: &mut Command, config: &RlimitConfig) {
    if config.is_empty() {
        return;
    }

    #[cfg(unix)]
    {
        unix_impl::attach_rlimits(cmd, *config);
    }

    #[cfg(not(unix))]
    {
        let _ = cmd;
        warn!(?config, "rlimits are not supported on this platform; ignoring");
    }
}

#[cfg(unix)]
mod unix_impl {
    use std::io;

    use tokio::process::Command;

    use super::RlimitConfig;
    use crate::utils::log::{pre_exec_log, pre_exec_log_errno};

    #[cfg(any(target_os = "linux", target_os = "android"))]
    type Resource = libc::__rlimit_resource_t;
    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    type Resource = libc::c_int;

    pub fn attach_rlimits(cmd: &mut Command, config: RlimitConfig) {
        unsafe {
            cmd.pre_exec(move || {
                if let Some(bytes) = config.max_address_space_bytes {
                    apply_or_log(libc::RLIMIT_AS as Resource, bytes, b"fab-exec: failed to set RLIMIT_AS: ")?;
                }
                if config.disable_core_dumps {
                    apply_or_log(libc::RLIMIT_CORE as Resource, 0, b"fab-exec: failed to set RLIMIT_CORE: ")?;
                }
                Ok(())
            });
        }
    }

    fn apply_or_log(resource: Resource, value: u64, msg: &[u8]) -> io::Result<()> {
        apply_rlimit(resource, value).inspect_err(|e| {
            pre_exec_log(msg);
            if let Some(code) = e.raw_os_error() {
                pre_exec_log_errno(code);
            }
        })
    }

    fn apply_rlimit(resource: Resource, value: u64) -> io::Result<()> {
        if value > libc::rlim_t::MAX as u64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "rlimit value exceeds platform maximum",
            ));
        }

        let mut current = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        if unsafe { libc::getrlimit(resource, &mut current) } != 0 {
            return Err(io::Error::last_os_error());
        }

        let soft = value as libc::rlim_t;
        let hard = if current.rlim_max == libc::RLIM_INFINITY || current.rlim_max > soft {
            current.rlim_max
        } else {
            soft
        };
        let limit = libc::rlimit {
            rlim_cur: soft,
            rlim_max: hard,
        };
        if unsafe { libc::setrlimit(resource, &limit) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}
