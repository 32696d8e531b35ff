//! Endpoint backed by a character device, FIFO, or pty opened by path.
//!
//! The file is opened non-blocking and owned by the endpoint alone, so
//! [`ByteEndpoint::disconnect`] closes the descriptor and no read can outlive
//! it.  Waiting reads use `poll(2)` bounded by the input timeout.
//!
//! When the path is a terminal the line is put in raw mode at the requested
//! speed, and [`ByteEndpoint::reconfigure`] changes that speed.  A FIFO or
//! regular file has no line speed, so reconfiguring one fails with
//! [`io::ErrorKind::Unsupported`].

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::mem::MaybeUninit;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, trace};

use super::ByteEndpoint;

/// How long a write may wait for room in the output queue.
const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// A [`ByteEndpoint`] over a file path.
pub struct PipeEndpoint {
    path: PathBuf,
    file: Option<File>,
    terminal: bool,
    input_timeout: Duration,
    baud: u32,
}

impl PipeEndpoint {
    /// Opens `path` for reading and writing.
    ///
    /// A terminal is switched to raw mode at `baud`; any other file is used
    /// as is.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from opening the file, or from configuring the
    /// terminal.  An unsupported speed gives [`io::ErrorKind::InvalidInput`].
    pub fn open(path: &Path, baud: u32, input_timeout: Duration) -> io::Result<Self> {
        info!("opening {} at {baud} baud", path.display());
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
            .open(path)?;

        // SAFETY: the descriptor is open for the lifetime of `file`.
        let terminal = unsafe { libc::isatty(file.as_raw_fd()) } == 1;
        if terminal {
            set_line_speed(file.as_raw_fd(), baud)?;
        } else {
            trace!("{} is not a terminal", path.display());
        }

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            terminal,
            input_timeout,
            baud,
        })
    }

    pub fn baud(&self) -> u32 {
        self.baud
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    fn file(&mut self) -> io::Result<&mut File> {
        match self.file.as_mut() {
            Some(file) => Ok(file),
            None => Err(closed(&self.path)),
        }
    }
}

impl ByteEndpoint for PipeEndpoint {
    fn read_byte(&mut self, wait: bool) -> io::Result<Option<u8>> {
        let input_timeout = self.input_timeout;
        let file = self.file()?;

        if wait && !wait_for(file.as_raw_fd(), libc::POLLIN, input_timeout)? {
            return Ok(None);
        }

        let mut buf = [0u8; 1];
        loop {
            match file.read(&mut buf) {
                Ok(1) => return Ok(Some(buf[0])),
                Ok(_) => return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "end of input")),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                Err(e) => return Err(e),
            }
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let file = self.file()?;
        let mut remaining = bytes;

        while !remaining.is_empty() {
            match file.write(remaining) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(written) => remaining = &remaining[written..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if !wait_for(file.as_raw_fd(), libc::POLLOUT, WRITE_TIMEOUT)? {
                        return Err(io::Error::new(io::ErrorKind::TimedOut, "output queue full"));
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn reconfigure(&mut self, baud: u32) -> io::Result<()> {
        let terminal = self.terminal;
        let fd = self.file()?.as_raw_fd();
        if !terminal {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("{} has no line speed", self.path.display()),
            ));
        }

        set_line_speed(fd, baud)?;
        debug!("{}: line speed {} -> {baud}", self.path.display(), self.baud);
        self.baud = baud;
        Ok(())
    }

    fn drain(&mut self) -> io::Result<()> {
        let terminal = self.terminal;
        match self.file.as_mut() {
            // SAFETY: the descriptor belongs to the open `file`.
            Some(file) if terminal => check(unsafe { libc::tcdrain(file.as_raw_fd()) }),
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }

    fn disconnect(&mut self) {
        if self.file.take().is_some() {
            info!("closed {}", self.path.display());
        }
    }
}

fn closed(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotConnected,
        format!("{} is closed", path.display()),
    )
}

fn check(status: libc::c_int) -> io::Result<()> {
    if status == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

fn speed_constant(baud: u32) -> io::Result<libc::speed_t> {
    match baud {
        9600 => Ok(libc::B9600),
        19200 => Ok(libc::B19200),
        38400 => Ok(libc::B38400),
        57600 => Ok(libc::B57600),
        115200 => Ok(libc::B115200),
        other => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unsupported line speed {other}"),
        )),
    }
}

/// Puts the terminal on `fd` in raw mode at `baud`.
fn set_line_speed(fd: RawFd, baud: u32) -> io::Result<()> {
    let speed = speed_constant(baud)?;
    let mut termios = MaybeUninit::<libc::termios>::uninit();

    // SAFETY: `tcgetattr` fills the whole struct on success, which `check`
    // confirms before it is read.
    unsafe {
        check(libc::tcgetattr(fd, termios.as_mut_ptr()))?;
        let mut termios = termios.assume_init();
        libc::cfmakeraw(&mut termios);
        check(libc::cfsetispeed(&mut termios, speed))?;
        check(libc::cfsetospeed(&mut termios, speed))?;
        check(libc::tcsetattr(fd, libc::TCSANOW, &termios))
    }
}

/// Waits until `fd` is ready for `events`; returns `false` on timeout.
fn wait_for(fd: RawFd, events: libc::c_short, timeout: Duration) -> io::Result<bool> {
    let mut pollfd = libc::pollfd {
        fd,
        events,
        revents: 0,
    };
    let millis = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);

    loop {
        // SAFETY: `pollfd` is a single valid entry.
        match unsafe { libc::poll(&mut pollfd, 1, millis) } {
            -1 => {
                let error = io::Error::last_os_error();
                if error.kind() != io::ErrorKind::Interrupted {
                    return Err(error);
                }
            }
            0 => return Ok(false),
            _ => return Ok(true),
        }
    }
}
