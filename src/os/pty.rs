// src/os/pty.rs

//! PTY session: a child process behind a pseudo-terminal pair.
//!
//! The master side is non-blocking; `read`/`write` surface `WouldBlock`
//! when the kernel buffers are drained or full, and the engine's pump
//! loop treats that as "come back later". The slave side becomes the
//! child's controlling terminal.

use anyhow::{Context, Result};
use log::{debug, trace, warn};
use std::ffi::CString;
use std::io::{Error as IoError, ErrorKind as IoErrorKind, Read, Result as IoResult, Write};
use std::os::unix::io::{AsFd, AsRawFd, OwnedFd, RawFd};

use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::pty::{openpty, Winsize};
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{execvp, fork, setsid, ForkResult, Pid};

nix::ioctl_write_ptr_bad!(tcsetwinsize, nix::libc::TIOCSWINSZ, Winsize);

/// What to spawn and at what initial size.
#[derive(Debug, Clone)]
pub struct PtyConfig<'a> {
    pub command_executable: &'a str,
    pub args: &'a [&'a str],
    pub initial_cols: u16,
    pub initial_rows: u16,
}

/// How the child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildExit {
    /// Normal exit with a status code.
    Exited(i32),
    /// Killed by a signal (signal number).
    Signaled(i32),
}

/// One spawned child behind a pseudo-terminal. Dropping the session
/// performs a best-effort shutdown.
#[derive(Debug)]
pub struct PtySession {
    master_fd: OwnedFd,
    child_pid: Pid,
    exit: Option<ChildExit>,
}

impl PtySession {
    /// Forks a child attached to a fresh PTY pair and execs the
    /// configured command. Any failure is reported synchronously; no
    /// partial session is ever returned.
    pub fn spawn(config: &PtyConfig) -> Result<Self> {
        let pty = openpty(None, None).context("opening PTY pair")?;
        let master_fd = pty.master;
        let slave_fd = pty.slave;

        let child_pid = match unsafe { fork() }.context("forking child process")? {
            ForkResult::Parent { child, .. } => {
                drop(slave_fd);
                debug!(
                    "forked child {} behind PTY master fd {}",
                    child,
                    master_fd.as_raw_fd()
                );
                Self::set_size(&master_fd, config.initial_cols, config.initial_rows)
                    .context("setting initial PTY size")?;
                Self::set_nonblocking(&master_fd)
                    .context("setting PTY master non-blocking")?;
                child
            }
            ForkResult::Child => {
                drop(master_fd);
                // Past this point only exec or _exit; the parent's state
                // is shared until exec replaces the image.
                Self::child_exec(slave_fd, config);
            }
        };

        Ok(PtySession {
            master_fd,
            child_pid,
            exit: None,
        })
    }

    /// Child-side setup: new session, controlling terminal, stdio on the
    /// slave, then exec. Never returns.
    fn child_exec(slave_fd: OwnedFd, config: &PtyConfig) -> ! {
        let slave_raw = slave_fd.as_raw_fd();
        if setsid().is_err() {
            unsafe { libc::_exit(127) };
        }
        if unsafe { libc::ioctl(slave_raw, libc::TIOCSCTTY as _, 0) } == -1 {
            unsafe { libc::_exit(127) };
        }
        for target in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] {
            if unsafe { libc::dup2(slave_raw, target) } == -1 {
                unsafe { libc::_exit(127) };
            }
        }
        drop(slave_fd);

        let arg0 = config
            .command_executable
            .split('/')
            .next_back()
            .unwrap_or(config.command_executable);
        let Ok(command) = CString::new(config.command_executable) else {
            unsafe { libc::_exit(127) };
        };
        let mut argv = Vec::with_capacity(config.args.len() + 1);
        match CString::new(arg0) {
            Ok(arg0) => argv.push(arg0),
            Err(_) => unsafe { libc::_exit(127) },
        }
        for arg in config.args {
            match CString::new(*arg) {
                Ok(arg) => argv.push(arg),
                Err(_) => unsafe { libc::_exit(127) },
            }
        }
        let _ = execvp(&command, &argv);
        unsafe { libc::_exit(127) }
    }

    fn set_size<Fd: AsFd>(fd: Fd, cols: u16, rows: u16) -> Result<()> {
        let raw_fd = fd.as_fd().as_raw_fd();
        let winsize = Winsize {
            ws_row: rows,
            ws_col: cols,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        unsafe { tcsetwinsize(raw_fd, &winsize) }
            .with_context(|| format!("ioctl TIOCSWINSZ on fd {}", raw_fd))?;
        trace!("PTY fd {} resized to {}x{}", raw_fd, cols, rows);
        Ok(())
    }

    fn set_nonblocking<Fd: AsFd>(fd: Fd) -> Result<()> {
        let flags = fcntl(fd.as_fd(), FcntlArg::F_GETFL).context("F_GETFL")?;
        let mut flags = OFlag::from_bits_truncate(flags);
        flags.insert(OFlag::O_NONBLOCK);
        fcntl(fd.as_fd(), FcntlArg::F_SETFL(flags)).context("F_SETFL O_NONBLOCK")?;
        Ok(())
    }

    /// Propagates a size change to the device and nudges the child with
    /// SIGWINCH.
    pub fn resize(&self, cols: u16, rows: u16) -> Result<()> {
        Self::set_size(&self.master_fd, cols, rows)
            .with_context(|| format!("resizing PTY to {}x{}", cols, rows))?;
        if self.exit.is_none() {
            if let Err(err) = kill(self.child_pid, Some(Signal::SIGWINCH)) {
                debug!("SIGWINCH to {} failed: {}", self.child_pid, err);
            }
        }
        Ok(())
    }

    pub fn child_pid(&self) -> Pid {
        self.child_pid
    }

    /// The recorded exit, once the child has been reaped.
    pub fn child_exit(&self) -> Option<ChildExit> {
        self.exit
    }

    /// Non-blocking check for child termination. Returns the exit status
    /// the first time the child is found dead and remembers it.
    pub fn try_wait(&mut self) -> Option<ChildExit> {
        if self.exit.is_some() {
            return self.exit;
        }
        match waitpid(self.child_pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => None,
            Ok(WaitStatus::Exited(_, code)) => {
                self.exit = Some(ChildExit::Exited(code));
                self.exit
            }
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                self.exit = Some(ChildExit::Signaled(signal as i32));
                self.exit
            }
            Ok(other) => {
                trace!("child {} state change: {:?}", self.child_pid, other);
                None
            }
            Err(nix::Error::ECHILD) => {
                // Already reaped elsewhere; treat as a normal exit.
                self.exit = Some(ChildExit::Exited(0));
                self.exit
            }
            Err(err) => {
                warn!("waitpid({}) failed: {}", self.child_pid, err);
                None
            }
        }
    }

    /// Terminates the child's whole process group (SIGHUP then SIGKILL)
    /// and reaps it, so grandchildren are not orphaned onto the PTY.
    pub fn shutdown(&mut self) {
        if self.try_wait().is_some() {
            return;
        }
        let group = Pid::from_raw(-self.child_pid.as_raw());
        for signal in [Signal::SIGHUP, Signal::SIGKILL] {
            match kill(group, Some(signal)) {
                Ok(()) | Err(nix::Error::ESRCH) => {}
                Err(err) => warn!("kill({}, {}) failed: {}", group, signal, err),
            }
            if self.try_wait().is_some() {
                return;
            }
        }
        match waitpid(self.child_pid, None) {
            Ok(WaitStatus::Exited(_, code)) => self.exit = Some(ChildExit::Exited(code)),
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                self.exit = Some(ChildExit::Signaled(signal as i32));
            }
            Ok(_) | Err(nix::Error::ECHILD) => self.exit = Some(ChildExit::Exited(0)),
            Err(err) => warn!("reaping child {} failed: {}", self.child_pid, err),
        }
    }
}

impl Drop for PtySession {
    fn drop(&mut self) {
        self.shutdown();
        debug!(
            "PTY session closed (fd {}, child {}, exit {:?})",
            self.master_fd.as_raw_fd(),
            self.child_pid,
            self.exit
        );
    }
}

fn map_nix_err(err: nix::Error) -> IoError {
    if matches!(err, nix::Error::EAGAIN) {
        IoError::new(IoErrorKind::WouldBlock, err)
    } else {
        IoError::other(err)
    }
}

impl Read for PtySession {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        match nix::unistd::read(&self.master_fd, buf) {
            Ok(n) => Ok(n),
            // EIO from a PTY master means the slave side is gone.
            Err(nix::Error::EIO) => Ok(0),
            Err(err) => Err(map_nix_err(err)),
        }
    }
}

impl Write for PtySession {
    fn write(&mut self, buf: &[u8]) -> IoResult<usize> {
        nix::unistd::write(&self.master_fd, buf).map_err(map_nix_err)
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

impl AsRawFd for PtySession {
    fn as_raw_fd(&self) -> RawFd {
        self.master_fd.as_raw_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::{Duration, Instant};

    fn read_until(session: &mut PtySession, needle: &str, timeout: Duration) -> String {
        let mut collected = String::new();
        let start = Instant::now();
        let mut buf = [0u8; 1024];
        while start.elapsed() < timeout {
            match session.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => collected.push_str(&String::from_utf8_lossy(&buf[..n])),
                Err(err) if err.kind() == IoErrorKind::WouldBlock => {
                    sleep(Duration::from_millis(10));
                }
                Err(err) => panic!("read failed: {}", err),
            }
            if collected.contains(needle) {
                break;
            }
        }
        collected
    }

    #[test]
    fn echo_round_trip() {
        let config = PtyConfig {
            command_executable: "/bin/echo",
            args: &["pty-works"],
            initial_cols: 80,
            initial_rows: 24,
        };
        let mut session = PtySession::spawn(&config).unwrap();
        let output = read_until(&mut session, "pty-works", Duration::from_secs(5));
        assert!(output.contains("pty-works"), "got: {:?}", output);
    }

    #[test]
    fn child_exit_is_reported() {
        let config = PtyConfig {
            command_executable: "/bin/sh",
            args: &["-c", "exit 3"],
            initial_cols: 80,
            initial_rows: 24,
        };
        let mut session = PtySession::spawn(&config).unwrap();
        let start = Instant::now();
        let exit = loop {
            if let Some(exit) = session.try_wait() {
                break exit;
            }
            assert!(start.elapsed() < Duration::from_secs(5), "child never exited");
            sleep(Duration::from_millis(10));
        };
        assert_eq!(exit, ChildExit::Exited(3));
        // Repeated polls keep returning the recorded status.
        assert_eq!(session.try_wait(), Some(ChildExit::Exited(3)));
    }

    #[test]
    fn spawn_failure_is_synchronous_or_exit_127() {
        let config = PtyConfig {
            command_executable: "/nonexistent/definitely-not-a-shell",
            args: &[],
            initial_cols: 80,
            initial_rows: 24,
        };
        // exec happens after fork, so the failure surfaces as exit 127.
        if let Ok(mut session) = PtySession::spawn(&config) {
            let start = Instant::now();
            loop {
                if let Some(exit) = session.try_wait() {
                    assert_eq!(exit, ChildExit::Exited(127));
                    break;
                }
                assert!(start.elapsed() < Duration::from_secs(5));
                sleep(Duration::from_millis(10));
            }
        }
    }

    #[test]
    fn shutdown_reaps_the_child() {
        let config = PtyConfig {
            command_executable: "/bin/sh",
            args: &["-c", "sleep 30"],
            initial_cols: 80,
            initial_rows: 24,
        };
        let mut session = PtySession::spawn(&config).unwrap();
        session.shutdown();
        assert!(session.child_exit().is_some());
    }

    #[test]
    fn resize_succeeds_on_live_session() {
        let config = PtyConfig {
            command_executable: "/bin/sh",
            args: &["-c", "sleep 5"],
            initial_cols: 80,
            initial_rows: 24,
        };
        let session = PtySession::spawn(&config).unwrap();
        session.resize(132, 43).unwrap();
    }
}
