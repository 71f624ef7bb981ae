//! Serial link management.
//!
//! The byte-stream link is exclusively owned by the acquisition loop for
//! the duration of a run. The two firmware revisions want different port
//! settings, so open policy is keyed on [`ProtocolVariant`]:
//!
//! - Variant A: even parity, RTS/CTS hardware flow control, and one
//!   close/reopen cycle after the initial open to clear stale driver state.
//! - Variant B: no parity, no flow control, and an explicit input-buffer
//!   reset after open.

use crate::config::BaudRate;
use crate::error::{AcqResult, EmgError};
use crate::protocol::ProtocolVariant;
use serialport::{ClearBuffer, DataBits, Parity, SerialPort};
use std::io::Read;
use std::time::Duration;
use tracing::info;

// Frame reads are effectively blocking; the device paces the stream at its
// own sampling cadence, so the driver timeout is only a backstop against a
// wedged link.
const READ_TIMEOUT: Duration = Duration::from_secs(3600);

fn builder(port: &str, baud: BaudRate, variant: ProtocolVariant) -> serialport::SerialPortBuilder {
    let builder = serialport::new(port, baud.as_u32())
        .data_bits(DataBits::Eight)
        .timeout(READ_TIMEOUT);
    match variant {
        ProtocolVariant::A => builder
            .parity(Parity::Even)
            .flow_control(serialport::FlowControl::Hardware),
        ProtocolVariant::B => builder
            .parity(Parity::None)
            .flow_control(serialport::FlowControl::None),
    }
}

/// Open the serial link with the settings the configured firmware revision
/// expects, and clear any stale buffered input before first use.
///
/// Failure is [`EmgError::LinkOpenFailed`]; callers open the link before
/// creating a session table so a bad port never leaves a partial table
/// behind.
pub fn open_link(
    port: &str,
    baud: BaudRate,
    variant: ProtocolVariant,
) -> AcqResult<Box<dyn SerialPort>> {
    let open_failed = |source| EmgError::LinkOpenFailed {
        port: port.to_string(),
        source,
    };

    let link = match variant {
        ProtocolVariant::A => {
            // Revision A adapters come up with stale driver state; a full
            // close/reopen cycle clears it where a buffer flush does not.
            let first = builder(port, baud, variant).open().map_err(open_failed)?;
            drop(first);
            builder(port, baud, variant).open().map_err(open_failed)?
        }
        ProtocolVariant::B => {
            let link = builder(port, baud, variant).open().map_err(open_failed)?;
            link.clear(ClearBuffer::Input).map_err(open_failed)?;
            link
        }
    };

    info!(port, baud = baud.as_u32(), ?variant, "serial link established");
    Ok(link)
}

/// Fill `buf` with exactly one frame's worth of bytes from the link.
///
/// The stream ending mid-frame is [`EmgError::LinkClosed`], which is fatal
/// to the run; anything else I/O-shaped propagates as is.
pub fn read_frame<R: Read + ?Sized>(link: &mut R, buf: &mut [u8]) -> AcqResult<()> {
    link.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            EmgError::LinkClosed
        } else {
            EmgError::Io(e)
        }
    })
}

/// Names of the serial ports currently visible to the host.
pub fn available_port_names() -> AcqResult<Vec<String>> {
    let ports = serialport::available_ports()
        .map_err(|e| EmgError::Io(std::io::Error::other(e.to_string())))?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}
