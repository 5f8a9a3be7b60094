//! Local port allocation.

use std::net::{Ipv4Addr, TcpListener};

use crate::error::{Error, Result};

/// Returns a TCP port that was free on the loopback interface at the time of
/// the call.
///
/// The probe socket is closed before returning, so another process can take
/// the port before the driver binds it. That window is a platform limitation.
pub fn find_free_port() -> Result<u16> {
	let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).map_err(Error::PortAllocation)?;
	let port = listener.local_addr().map_err(Error::PortAllocation)?.port();
	drop(listener);
	Ok(port)
}
