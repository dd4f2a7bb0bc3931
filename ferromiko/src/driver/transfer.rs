//! File transfer over SFTP on the session's SSH connection.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use log::info;
use russh_sftp::protocol::OpenFlags;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::session::Session;
use crate::error::{DriverError, Error, Result, TransportError};

/// Direction of a file transfer, seen from the local host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    /// Local file to the device.
    Put,
    /// Device file to the local host.
    Get,
}

impl FromStr for TransferDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "put" => Ok(TransferDirection::Put),
            "get" => Ok(TransferDirection::Get),
            other => Err(DriverError::InvalidConfig {
                message: format!("transfer direction must be 'put' or 'get', got '{}'", other),
            }
            .into()),
        }
    }
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferDirection::Put => f.write_str("put"),
            TransferDirection::Get => f.write_str("get"),
        }
    }
}

impl Session {
    /// Copy a file to or from the device.
    ///
    /// Opens an SFTP channel next to the interactive shell; the shell and
    /// the prompt state are not touched. The device must have the SFTP
    /// subsystem enabled.
    pub async fn file_transfer(
        &mut self,
        source: &str,
        dest: &str,
        direction: TransferDirection,
    ) -> Result<String> {
        if direction == TransferDirection::Put && !Path::new(source).exists() {
            return Err(DriverError::SourceNotFound {
                path: source.into(),
            }
            .into());
        }

        let transport = self.transport().ok_or(DriverError::NotConnected)?;
        info!("{}: {} {} -> {}", self.label(), direction, source, dest);
        let sftp = transport.open_sftp().await?;

        match direction {
            TransferDirection::Put => {
                let contents = tokio::fs::read(source).await.map_err(TransportError::Io)?;
                let mut remote = sftp
                    .open_with_flags(dest, OpenFlags::CREATE | OpenFlags::TRUNCATE | OpenFlags::WRITE)
                    .await
                    .map_err(sftp_error)?;
                remote.write_all(&contents).await.map_err(TransportError::Io)?;
                remote.flush().await.map_err(TransportError::Io)?;
                remote.shutdown().await.map_err(TransportError::Io)?;
                Ok(format!("File {} uploaded to {}", source, dest))
            }
            TransferDirection::Get => {
                let mut remote = sftp
                    .open_with_flags(source, OpenFlags::READ)
                    .await
                    .map_err(sftp_error)?;
                let mut contents = Vec::new();
                remote.read_to_end(&mut contents).await.map_err(TransportError::Io)?;

                let mut local = tokio::fs::File::create(dest).await.map_err(TransportError::Io)?;
                local.write_all(&contents).await.map_err(TransportError::Io)?;
                local.flush().await.map_err(TransportError::Io)?;
                Ok(format!("File {} downloaded to {}", source, dest))
            }
        }
    }
}

fn sftp_error(e: russh_sftp::client::error::Error) -> Error {
    TransportError::Sftp(e.to_string()).into()
}
