//! Device-type dispatch.

use log::debug;

use super::builder::DeviceDescriptor;
use super::session::Session;
use crate::error::Result;
use crate::platform::registry;

/// Build an unconnected session with the profile registered for the
/// descriptor's device type.
pub fn session_for(descriptor: DeviceDescriptor) -> Result<Session> {
    let constructor = registry::resolve(descriptor.device_type().as_str())?;
    let profile = constructor();
    debug!("{}: using {} profile", descriptor.label(), profile.device_type);
    Ok(Session::new(descriptor, profile))
}

/// Connect to a device and return a session ready for commands.
///
/// ```rust,no_run
/// use ferromiko::DeviceDescriptor;
///
/// # async fn example() -> Result<(), ferromiko::Error> {
/// let device = DeviceDescriptor::builder("192.0.2.10")
///     .username("admin")
///     .password("admin")
///     .device_type("cisco_xr")
///     .build()?;
///
/// let mut session = ferromiko::connect(device).await?;
/// println!("{}", session.find_prompt().await?);
/// session.disconnect().await?;
/// # Ok(())
/// # }
/// ```
pub async fn connect(descriptor: DeviceDescriptor) -> Result<Session> {
    let mut session = session_for(descriptor)?;
    session.connect().await?;
    Ok(session)
}
