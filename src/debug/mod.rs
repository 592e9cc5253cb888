// SPDX-License-Identifier: Unlicense

//! Capture and log debugging output.

use crate::Result;

#[cfg(target_arch = "arm")]
use crate::util::result::Error;

#[cfg(target_arch = "arm")]
pub mod uart_logger;

#[cfg(test)]
pub mod unit_test_logging;

/// Route `log` output to the debug UART.
///
/// Host builds log through whichever logger the test harness installed.
pub fn init() -> Result<()> {
    #[cfg(target_arch = "arm")]
    uart_logger::init().map_err(|_| Error::AlreadyInitialised)?;

    info!("init");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_on_host() {
        unit_test_logging::setup();
        assert_ok!(init());
    }
}
