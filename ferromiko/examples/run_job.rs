//! Run a JSON job file against one device
//!
//! The job carries the device descriptor, the operation name and the
//! command text, the same shape an orchestration layer hands over:
//!
//! ```json
//! {
//!   "device": {
//!     "host": "192.0.2.10",
//!     "username": "admin",
//!     "password": "admin",
//!     "deviceType": "cisco_xr",
//!     "readTimeoutMs": 30000
//!   },
//!   "operation": "send_config",
//!   "commands": "hostname edge-1\nntp server 192.0.2.123"
//! }
//! ```
//!
//! On XR a `send_config` job also commits the batch.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example run_job -- job.json
//! ```

use std::env;

use ferromiko::{DeviceDescriptor, Operation, with_connection};
use serde::Deserialize;

#[derive(Deserialize)]
struct Job {
    device: DeviceDescriptor,
    operation: String,
    commands: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(path) = env::args().nth(1) else {
        eprintln!("Usage: run_job <job.json>");
        std::process::exit(1);
    };

    let job: Job = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    let operation: Operation = job.operation.parse()?;
    println!("{} on {}", operation, job.device.label());

    let commands = job.commands;
    let output = with_connection(job.device, move |session| {
        Box::pin(async move { operation.execute(session, &commands).await })
    })
    .await;

    match output {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Job failed: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
