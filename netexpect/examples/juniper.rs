//! Juniper JUNOS example
//!
//! Runs a few operational commands, optionally commits a configuration
//! change, and pulls the active configuration file off the box.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example juniper -- --host 192.168.1.1 --user admin --password secret
//! ```
//!
//! Commit a host-name change and download the config:
//! ```bash
//! cargo run --example juniper -- --host vmx1 --user admin --key ~/.ssh/id_ed25519 \
//!     --hostname edge-1 --fetch juniper.conf.gz
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use netexpect::{DeviceType, Driver, DriverBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    println!("Connecting to {}:{}...", args.host, args.port);

    let mut builder = DriverBuilder::new(&args.host)
        .port(args.port)
        .username(&args.user)
        .device_type(DeviceType::JuniperJunos)
        .timeout(Duration::from_secs(args.timeout));

    if let Some(password) = &args.password {
        builder = builder.password(password);
    } else if let Some(key_path) = &args.key {
        builder = builder.private_key(key_path);
    } else {
        eprintln!("Error: Must provide either --password or --key");
        std::process::exit(1);
    }

    let mut driver = builder.build()?;
    driver.connect().await?;
    println!("Connected, prompt is {:?}\n", driver.prompt().unwrap_or_default());

    let commands = ["show version", "show system uptime", "show interfaces terse"];
    for response in driver.send_commands(&commands).await? {
        println!("> {}", response.command);
        println!("{}", "-".repeat(40));
        match &response.failure_message {
            Some(reason) => eprintln!("Failed ({reason}):\n{}", response.result),
            None => {
                for line in response.lines().take(15) {
                    println!("{line}");
                }
                if response.lines().count() > 15 {
                    println!("... (truncated)");
                }
            }
        }
        println!("({:?})\n", response.elapsed);
    }

    if let Some(hostname) = &args.hostname {
        let change = format!("set system host-name {hostname}");
        println!("Committing: {change}");
        let response = driver.send_config_set(&[change.as_str()]).await?;
        if response.is_success() {
            println!("Committed in {:?}\n", response.elapsed);
        } else {
            eprintln!("Commit failed: {:?}\n{}", response.failure_message, response.result);
        }
    }

    if let Some(local) = &args.fetch {
        let bytes = driver
            .retrieve_file("/config/juniper.conf.gz", local)
            .await?;
        println!("Saved {} bytes to {}", bytes, local.display());
    }

    driver.disconnect().await?;
    println!("Done!");
    Ok(())
}

/// Simple argument parser
struct Args {
    host: String,
    port: u16,
    user: String,
    password: Option<String>,
    key: Option<PathBuf>,
    timeout: u64,
    hostname: Option<String>,
    fetch: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let mut args = Self {
            host: "localhost".to_string(),
            port: 22,
            user: env::var("USER").unwrap_or_else(|_| "admin".to_string()),
            password: None,
            key: None,
            timeout: 30,
            hostname: None,
            fetch: None,
        };

        let mut argv = env::args().skip(1);
        while let Some(flag) = argv.next() {
            let mut value = || argv.next().unwrap_or_default();
            match flag.as_str() {
                "--host" | "-h" => args.host = value(),
                "--port" | "-p" => args.port = value().parse().unwrap_or(22),
                "--user" | "-u" => args.user = value(),
                "--password" | "-P" => args.password = Some(value()),
                "--key" | "-k" => args.key = Some(PathBuf::from(value())),
                "--timeout" | "-t" => args.timeout = value().parse().unwrap_or(30),
                "--hostname" => args.hostname = Some(value()),
                "--fetch" => args.fetch = Some(PathBuf::from(value())),
                "--help" => {
                    println!(
                        "usage: juniper --host HOST --user USER (--password PASS | --key PATH) \
                         [--port N] [--timeout SECS] [--hostname NAME] [--fetch LOCAL_PATH]"
                    );
                    std::process::exit(0);
                }
                other => eprintln!("ignoring unknown argument {other}"),
            }
        }
        args
    }
}
