//! Basic example: connect to a device and run one command
//!
//! # Usage
//!
//! With password authentication:
//! ```bash
//! cargo run --example basic_command -- --host 192.0.2.1 --user admin --password secret \
//!     --device-type cisco_ios --command "show version"
//! ```
//!
//! With SSH key authentication:
//! ```bash
//! cargo run --example basic_command -- --host localhost --user me --key ~/.ssh/id_ed25519 \
//!     --device-type linux --command "uname -a"
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use ferromiko::{DeviceDescriptor, HostKeyVerification};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut builder = DeviceDescriptor::builder(&args.host)
        .port(args.port)
        .username(&args.user)
        .device_type(&args.device_type)
        .conn_timeout(Duration::from_secs(args.timeout))
        .host_key_verification(HostKeyVerification::Disabled);

    if let Some(password) = &args.password {
        builder = builder.password(password);
    } else if let Some(key_path) = &args.key {
        builder = builder.private_key(key_path);
    } else {
        eprintln!("Error: Must provide either --password or --key");
        std::process::exit(1);
    }
    if let Some(secret) = &args.secret {
        builder = builder.secret(secret);
    }

    let device = builder.build()?;
    println!("Connecting to {}...", device.label());
    let mut session = ferromiko::connect(device).await?;
    println!("Connected, prompt: {}\n", session.find_prompt().await?);

    if args.enable {
        let output = session.enable().await?;
        if !output.is_empty() {
            println!("{}", output);
        }
    }

    println!("> {}", args.command);
    println!("{}", "-".repeat(40));
    let output = session.send_command(&args.command).await?;
    println!("{}", output);

    session.disconnect().await?;
    Ok(())
}

/// Simple argument parser
struct Args {
    host: String,
    port: u16,
    user: String,
    password: Option<String>,
    key: Option<PathBuf>,
    secret: Option<String>,
    device_type: String,
    command: String,
    enable: bool,
    timeout: u64,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut parsed = Self {
            host: "localhost".to_string(),
            port: 22,
            user: env::var("USER").unwrap_or_else(|_| "admin".to_string()),
            password: None,
            key: None,
            secret: None,
            device_type: "linux".to_string(),
            command: "uname -a".to_string(),
            enable: false,
            timeout: 20,
        };

        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1).cloned();
            match args[i].as_str() {
                "--host" | "-h" => parsed.host = value.unwrap_or(parsed.host),
                "--port" | "-p" => parsed.port = value.and_then(|v| v.parse().ok()).unwrap_or(22),
                "--user" | "-u" => parsed.user = value.unwrap_or(parsed.user),
                "--password" | "-P" => parsed.password = value,
                "--key" | "-k" => parsed.key = value.map(PathBuf::from),
                "--secret" | "-s" => parsed.secret = value,
                "--device-type" | "-d" => parsed.device_type = value.unwrap_or(parsed.device_type),
                "--command" | "-c" => parsed.command = value.unwrap_or(parsed.command),
                "--timeout" | "-t" => {
                    parsed.timeout = value.and_then(|v| v.parse().ok()).unwrap_or(20)
                }
                "--enable" | "-e" => {
                    parsed.enable = true;
                    i += 1;
                    continue;
                }
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                _ => {
                    i += 1;
                    continue;
                }
            }
            i += 2;
        }

        parsed
    }

    fn print_help() {
        println!(
            r#"ferromiko basic command example

USAGE:
    cargo run --example basic_command -- [OPTIONS]

OPTIONS:
    -h, --host <HOST>              Target host [default: localhost]
    -p, --port <PORT>              SSH port [default: 22]
    -u, --user <USER>              Username [default: $USER]
    -P, --password <PASSWORD>      Password for authentication
    -k, --key <PATH>               Path to SSH private key
    -s, --secret <SECRET>          Enable secret
    -d, --device-type <TYPE>       cisco_ios, cisco_xr, cisco_nxos, juniper_junos, linux [default: linux]
    -c, --command <COMMAND>        Command to run [default: uname -a]
    -e, --enable                   Enter enable mode first
    -t, --timeout <SECS>           Connection timeout [default: 20]
        --help                     Print this help"#
        );
    }
}
