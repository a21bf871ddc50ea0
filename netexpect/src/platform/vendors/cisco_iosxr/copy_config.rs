//! `copy running-config <file>` on IOS-XR.
//!
//! The device asks for the destination filename and, when the file
//! exists, whether to overwrite it:
//!
//! ```text
//! RP/0/RP0/CPU0:R1#copy running-config disk0:/r1.cfg
//! Destination file name (control-c to abort): [/r1.cfg]?
//! The destination file already exists. Do you want to overwrite? [no]: yes
//! Building configuration.
//! [OK]
//! RP/0/RP0/CPU0:R1#
//! ```

use std::time::Duration;

use regex::escape;

use crate::driver::{Driver, GenericDriver, InteractiveEvent, InteractiveResult};
use crate::error::{DriverError, PlatformError, Result};
use crate::platform::DeviceType;

const FILENAME_PROMPT: &str = r"\]\?\s*$";
const COPY_FAILED: &str = "%Error";

/// Save the running configuration to `destination` on the device,
/// answering the filename and overwrite prompts.
///
/// Returns the exchange; a step whose output contains `%Error` fails the
/// whole copy with [`DriverError::CommandFailed`].
pub async fn copy_running_config(
    driver: &mut GenericDriver,
    destination: &str,
    timeout: Duration,
) -> Result<InteractiveResult> {
    let platform = driver.platform();
    if platform.device_type != DeviceType::CiscoIosxr {
        return Err(PlatformError::InvalidDefinition {
            message: format!(
                "copy running-config needs an IOS-XR device, {} is {}",
                platform.name, platform.device_type
            ),
        }
        .into());
    }
    let prompt = escape(driver.prompt().ok_or(DriverError::NotConnected)?);
    let done = format!(r"{prompt}#\s*$");

    let mut result = driver
        .send_interactive(&[
            InteractiveEvent::new(format!("copy running-config {destination}"), FILENAME_PROMPT)?
                .with_timeout(timeout),
            InteractiveEvent::new("", &format!(r"(?i)overwrite\?|{done}"))?.with_timeout(timeout),
        ])
        .await?;

    let asked_overwrite = result
        .final_output()
        .is_some_and(|out| out.to_lowercase().contains("overwrite?"));
    if asked_overwrite {
        let confirm = driver
            .send_interactive(&[InteractiveEvent::new("yes", &done)?.with_timeout(timeout)])
            .await?;
        result.steps.extend(confirm.steps);
        result.elapsed += confirm.elapsed;
    }

    if let Some(step) = result.steps.iter().find(|s| s.output.contains(COPY_FAILED)) {
        return Err(DriverError::CommandFailed {
            message: step
                .output
                .lines()
                .find(|l| l.contains(COPY_FAILED))
                .unwrap_or(COPY_FAILED)
                .trim()
                .to_string(),
        }
        .into());
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[tokio::test]
    async fn test_rejects_other_platforms() {
        let mut driver = GenericDriver::juniper_junos("192.0.2.1", "admin", "admin", 22);
        let err = copy_running_config(&mut driver, "disk0:/r1.cfg", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Platform(PlatformError::InvalidDefinition { .. })));
    }

    #[tokio::test]
    async fn test_accepts_custom_iosxr_definitions() {
        let platform = crate::PlatformDefinition::new("xr-lab", DeviceType::CiscoIosxr);
        let mut driver = GenericDriver::new(crate::SshConfig::new("192.0.2.1", "admin", "admin"), platform);
        let err = copy_running_config(&mut driver, "disk0:/r1.cfg", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Driver(DriverError::NotConnected)));
    }

    #[tokio::test]
    async fn test_requires_connection() {
        let mut driver = GenericDriver::cisco_iosxr("192.0.2.1", "admin", "admin", 22);
        let err = copy_running_config(&mut driver, "disk0:/r1.cfg", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Driver(DriverError::NotConnected)));
    }
}
