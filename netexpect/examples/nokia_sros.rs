//! Nokia SR OS example
//!
//! Connects with the vendor constructor, runs operational commands and
//! pushes a file to the compact flash. Works against both MD-CLI and
//! classic CLI nodes.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example nokia_sros -- pe1 admin admin
//! cargo run --example nokia_sros -- pe1 admin admin ./license.txt cf3:/license.txt
//! ```

use std::env;
use std::time::Duration;

use netexpect::{Driver, GenericDriver};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 3 {
        eprintln!("usage: nokia_sros HOST USER PASSWORD [LOCAL REMOTE]");
        std::process::exit(1);
    }

    let mut driver = GenericDriver::nokia_sros(&args[0], &args[1], &args[2], 22);
    driver.set_timeout(Duration::from_secs(30));
    driver.connect().await?;
    println!("Connected to {}\n", driver.prompt().unwrap_or_default());

    for command in ["show version", "show uptime", "show router interface"] {
        let response = driver.send_command(command).await?;
        println!("> {command}");
        if let Some(reason) = &response.failure_message {
            eprintln!("rejected ({reason}): {}", response.result);
        } else {
            println!("{}", response.result);
        }
        println!();
    }

    if let [_, _, _, local, remote, ..] = args.as_slice() {
        match driver.file_transfer(local, remote).await {
            Ok(bytes) => println!("Uploaded {bytes} bytes to {remote}"),
            Err(e) => eprintln!("Upload failed: {e}"),
        }
    }

    driver.disconnect().await?;
    Ok(())
}
