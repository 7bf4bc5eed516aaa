use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::{Result, TransportError};
use crate::stream::{EofPolicy, StreamLink};
use crate::traits::LinkTransport;

/// Character-device link (serial tty, JTAG-UART bridge node, FIFO).
///
/// The device is opened non-blocking so reads and writes return immediately.
/// When the node is a terminal it is switched to raw mode: no line
/// discipline, no echo, no CR/LF translation, every byte passes through
/// unchanged. Line speed is left as configured unless a baud rate is given
/// to [`DeviceLink::open_with_baud`].
pub struct DeviceLink {
    link: StreamLink<File>,
    path: PathBuf,
    raw_mode: bool,
}

/// Line speeds accepted by [`DeviceLink::open_with_baud`].
pub const SUPPORTED_BAUD_RATES: [u32; 9] =
    [1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200, 230400];

impl DeviceLink {
    /// Open a device node for exclusive read/write use, keeping its line speed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_baud(path, None)
    }

    /// Open a device node and, when it is a terminal, set its line speed.
    ///
    /// The rate must be one of [`SUPPORTED_BAUD_RATES`]; it is checked before
    /// the node is opened. A rate given for a non-terminal node is ignored.
    pub fn open_with_baud(path: impl AsRef<Path>, baud: Option<u32>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let speed = baud.map(speed_for).transpose()?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK | libc::O_NOCTTY)
            .open(&path)
            .map_err(|source| TransportError::Open {
                path: path.clone(),
                source,
            })?;

        let raw_mode = if is_terminal(&file) {
            make_raw(&file, speed).map_err(|source| TransportError::Open {
                path: path.clone(),
                source,
            })?;
            true
        } else {
            if let Some(baud) = baud {
                warn!(?path, baud, "not a terminal; ignoring baud rate");
            }
            false
        };

        debug!(?path, raw_mode, ?baud, "opened device link");

        Ok(Self {
            link: StreamLink::with_policy(file, EofPolicy::Empty).named("device"),
            path,
            raw_mode,
        })
    }

    /// The device path this link was opened on.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether terminal raw mode was applied.
    pub fn is_raw(&self) -> bool {
        self.raw_mode
    }
}

impl LinkTransport for DeviceLink {
    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        self.link.write(bytes)
    }

    fn read(&mut self, max_bytes: usize) -> Result<Bytes> {
        self.link.read(max_bytes)
    }

    fn transport_name(&self) -> &'static str {
        "device"
    }
}

impl Drop for DeviceLink {
    fn drop(&mut self) {
        debug!(path = ?self.path, "closing device link");
    }
}

impl std::fmt::Debug for DeviceLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceLink")
            .field("path", &self.path)
            .field("raw_mode", &self.raw_mode)
            .finish()
    }
}

fn is_terminal(file: &File) -> bool {
    // SAFETY: `isatty` only inspects the descriptor, which `file` keeps open.
    unsafe { libc::isatty(file.as_raw_fd()) == 1 }
}

fn speed_for(baud: u32) -> Result<libc::speed_t> {
    let speed = match baud {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115200 => libc::B115200,
        230400 => libc::B230400,
        other => return Err(TransportError::UnsupportedBaud(other)),
    };
    Ok(speed)
}

fn make_raw(file: &File, speed: Option<libc::speed_t>) -> std::io::Result<()> {
    let fd = file.as_raw_fd();
    let mut termios = std::mem::MaybeUninit::<libc::termios>::uninit();

    // SAFETY: `termios` points to writable storage of the right size and `fd`
    // is an open terminal descriptor owned by `file`.
    if unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) } != 0 {
        return Err(std::io::Error::last_os_error());
    }
    // SAFETY: `tcgetattr` succeeded, so the structure is fully initialized.
    let mut termios = unsafe { termios.assume_init() };

    // SAFETY: `termios` is a valid, initialized structure.
    unsafe { libc::cfmakeraw(&mut termios) };

    if let Some(speed) = speed {
        // SAFETY: `termios` is valid and `speed` is one of the `B*` constants.
        if unsafe { libc::cfsetspeed(&mut termios, speed) } != 0 {
            return Err(std::io::Error::last_os_error());
        }
    }

    // SAFETY: `termios` is valid and `fd` is still open.
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) } != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}
