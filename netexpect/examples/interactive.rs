//! Interactive command example
//!
//! Answers device prompts with `send_interactive`: saves the running
//! configuration of an IOS-XR router, then walks through a `clear`
//! command that asks for confirmation.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example interactive -- RP0-HOST cisco cisco disk0:/backup.cfg
//! ```

use std::env;
use std::time::Duration;

use netexpect::platform::vendors::cisco_iosxr::copy_running_config;
use netexpect::{Driver, GenericDriver, InteractiveBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 4 {
        eprintln!("usage: interactive HOST USER PASSWORD DESTINATION");
        std::process::exit(1);
    }

    let mut driver = GenericDriver::cisco_iosxr(&args[0], &args[1], &args[2], 22);
    driver.connect().await?;
    let prompt = regex::escape(driver.prompt().unwrap_or_default());

    println!("--- copy running-config {} ---", args[3]);
    let result = copy_running_config(&mut driver, &args[3], Duration::from_secs(60)).await?;
    for step in &result.steps {
        println!("[{:?}] {:?}\n{}", step.elapsed, step.input, step.output.trim());
    }

    println!("\n--- clear counters ---");
    let events = InteractiveBuilder::new()
        .send("clear counters")
        .expect(r"\[confirm\]")
        .send("")
        .expect(&format!(r"{prompt}#\s*$"))
        .with_timeout(Duration::from_secs(10))
        .build()?;

    let result = driver.send_interactive(&events).await?;
    if result.failed {
        eprintln!("clear counters failed: {:?}", result.failure_message());
    } else {
        println!("cleared in {:?}", result.elapsed);
    }

    driver.disconnect().await?;
    Ok(())
}
