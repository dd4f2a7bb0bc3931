//! SSH transport over russh: connect, authenticate, open channels, close.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use russh::Channel;
use russh::client::{self, Handle, Msg};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use russh_sftp::client::SftpSession;
use secrecy::ExposeSecret;

use super::config::{AuthMethod, HostKeyVerification, SshConfig};
use crate::error::{Result, TransportError};

/// Terminal type requested for interactive shells.
const TERM: &str = "xterm";

/// An authenticated SSH connection to one device.
///
/// The interactive shell and any SFTP session are separate channels on the
/// same connection.
pub struct SshTransport {
    handle: Handle<SshHandler>,
    addr: String,
    terminal: (u32, u32),
}

impl SshTransport {
    /// Connect and authenticate within `config.timeout`.
    pub async fn connect(config: SshConfig) -> Result<Self> {
        let addr = config.socket_addr();
        let rejection = Arc::new(Mutex::new(None));
        let handler = SshHandler {
            policy: HostKeyPolicy::from_config(&config),
            rejection: Arc::clone(&rejection),
        };

        debug!("{}: opening SSH connection", addr);
        let handshake = async {
            let mut handle = client::connect(
                Arc::new(client::Config::default()),
                (config.host.as_str(), config.port),
                handler,
            )
            .await
            .map_err(|e| connect_error(&config, &rejection, e))?;

            authenticate(&mut handle, &config).await?;
            Ok::<_, crate::Error>(handle)
        };

        let handle = tokio::time::timeout(config.timeout, handshake)
            .await
            .map_err(|_| TransportError::Timeout(config.timeout))??;

        info!("{}: authenticated as {}", addr, config.username);
        Ok(Self {
            handle,
            addr,
            terminal: (config.terminal_width, config.terminal_height),
        })
    }

    /// Open a session channel with a PTY and an interactive shell.
    pub async fn open_shell(&self) -> Result<Channel<Msg>> {
        let channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        let (width, height) = self.terminal;
        channel
            .request_pty(true, TERM, width, height, 0, 0, &[])
            .await
            .map_err(TransportError::Ssh)?;
        channel.request_shell(true).await.map_err(TransportError::Ssh)?;

        debug!("{}: shell open ({}x{})", self.addr, width, height);
        Ok(channel)
    }

    /// Open an SFTP session on a secondary channel.
    pub async fn open_sftp(&self) -> Result<SftpSession> {
        let channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;
        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(TransportError::Ssh)?;

        SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| TransportError::Sftp(e.to_string()).into())
    }

    /// Whether the connection's background task is still running.
    pub fn is_alive(&self) -> bool {
        !self.handle.is_closed()
    }

    /// Disconnect the SSH session.
    pub async fn close(self) -> Result<()> {
        debug!("{}: closing SSH connection", self.addr);
        self.handle
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(|e| TransportError::Ssh(e).into())
    }
}

async fn authenticate(handle: &mut Handle<SshHandler>, config: &SshConfig) -> Result<()> {
    let accepted = match &config.auth {
        AuthMethod::Password(password) => handle
            .authenticate_password(&config.username, password.expose_secret())
            .await
            .map_err(TransportError::Ssh)?
            .success(),
        AuthMethod::PrivateKey { path, passphrase } => {
            let key = load_secret_key(path, passphrase.as_ref().map(|p| p.expose_secret()))
                .map_err(|e| TransportError::Key(e.to_string()))?;

            // RSA keys sign with the best hash the server offers
            let hash_alg = handle
                .best_supported_rsa_hash()
                .await
                .map_err(TransportError::Ssh)?
                .flatten();

            handle
                .authenticate_publickey(
                    &config.username,
                    PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
                )
                .await
                .map_err(TransportError::Ssh)?
                .success()
        }
    };

    if accepted {
        Ok(())
    } else {
        Err(TransportError::AuthenticationFailed {
            user: config.username.clone(),
        }
        .into())
    }
}

/// Map a russh connect failure, preferring a recorded host-key rejection
/// over russh's generic `UnknownKey`.
fn connect_error(
    config: &SshConfig,
    rejection: &Mutex<Option<TransportError>>,
    error: russh::Error,
) -> TransportError {
    let recorded = rejection.lock().ok().and_then(|mut slot| slot.take());
    match (recorded, error) {
        (Some(rejected), _) => rejected,
        (None, russh::Error::IO(source)) => TransportError::ConnectionFailed {
            host: config.host.clone(),
            port: config.port,
            source,
        },
        (None, e) => TransportError::Ssh(e),
    }
}

/// Host key policy for one connection.
#[derive(Debug, Clone)]
struct HostKeyPolicy {
    host: String,
    port: u16,
    mode: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl HostKeyPolicy {
    fn from_config(config: &SshConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            mode: config.host_key_verification,
            known_hosts_path: config.known_hosts_path.clone(),
        }
    }

    /// Accept or reject the server's key.
    fn verify(&self, key: &PublicKey) -> std::result::Result<(), TransportError> {
        match self.mode {
            HostKeyVerification::Disabled => Ok(()),
            HostKeyVerification::AcceptNew => {
                if !self.is_known(key)? {
                    info!("{}:{}: learning new host key", self.host, self.port);
                    if let Err(e) = self.learn(key) {
                        warn!("{}:{}: could not save host key: {}", self.host, self.port, e);
                    }
                }
                Ok(())
            }
            HostKeyVerification::Strict => {
                if self.is_known(key)? {
                    Ok(())
                } else {
                    Err(TransportError::HostKeyUnknown {
                        host: self.host.clone(),
                        port: self.port,
                    })
                }
            }
        }
    }

    /// `Ok(false)` for an unknown host, `HostKeyChanged` for a mismatch.
    fn is_known(&self, key: &PublicKey) -> std::result::Result<bool, TransportError> {
        let checked = match &self.known_hosts_path {
            Some(path) => russh::keys::check_known_hosts_path(&self.host, self.port, key, path),
            None => russh::keys::check_known_hosts(&self.host, self.port, key),
        };

        checked.map_err(|e| match e {
            russh::keys::Error::KeyChanged { line } => TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            },
            other => TransportError::KnownHosts(other.to_string()),
        })
    }

    fn learn(&self, key: &PublicKey) -> std::result::Result<(), TransportError> {
        let learned = match &self.known_hosts_path {
            Some(path) => {
                russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, key, path)
            }
            None => russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, key),
        };
        learned.map_err(|e| TransportError::KnownHosts(e.to_string()))
    }
}

struct SshHandler {
    policy: HostKeyPolicy,
    /// Why the host key was rejected, for `connect` to report.
    rejection: Arc<Mutex<Option<TransportError>>>,
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        match self.policy.verify(server_public_key) {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!("{}", e);
                if let Ok(mut slot) = self.rejection.lock() {
                    *slot = Some(e);
                }
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    const KEY_A: &str =
        "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIAEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEB";
    const KEY_B: &str =
        "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIAICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgIC";

    fn key(openssh: &str) -> PublicKey {
        PublicKey::from_openssh(openssh).unwrap()
    }

    fn known_hosts(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "ferromiko-known-hosts-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        path
    }

    fn policy(mode: HostKeyVerification, path: &PathBuf) -> HostKeyPolicy {
        HostKeyPolicy {
            host: "192.0.2.7".to_string(),
            port: 2222,
            mode,
            known_hosts_path: Some(path.clone()),
        }
    }

    #[test]
    fn test_disabled_accepts_anything() {
        let path = known_hosts("disabled");
        assert!(policy(HostKeyVerification::Disabled, &path).verify(&key(KEY_A)).is_ok());
        assert!(!path.exists());
    }

    #[test]
    fn test_strict_rejects_unknown_host() {
        let path = known_hosts("strict");
        let err = policy(HostKeyVerification::Strict, &path)
            .verify(&key(KEY_A))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Host key for 192.0.2.7:2222 is not in known_hosts"
        );
    }

    #[test]
    fn test_accept_new_learns_then_detects_change() {
        let path = known_hosts("accept-new");
        let accept_new = policy(HostKeyVerification::AcceptNew, &path);

        accept_new.verify(&key(KEY_A)).unwrap();
        assert!(path.exists());

        // Learned key is now trusted, even in strict mode
        policy(HostKeyVerification::Strict, &path)
            .verify(&key(KEY_A))
            .unwrap();

        let err = accept_new.verify(&key(KEY_B)).unwrap_err();
        assert!(matches!(err, TransportError::HostKeyChanged { port: 2222, .. }));

        let _ = std::fs::remove_file(&path);
    }
}
