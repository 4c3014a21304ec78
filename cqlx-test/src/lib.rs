use std::sync::Arc;

use cqlx_core::mock::MockDriver;

pub fn setup_if_needed() {
    let _ = dotenvy::dotenv();
    let _ = env_logger::builder().is_test(true).try_init();
}

// Make a fresh in-memory driver runtime
// Ensure [dotenvy] and [env_logger] have been setup
pub fn driver() -> Arc<MockDriver> {
    setup_if_needed();
    MockDriver::new()
}

/// Asserts that every handle `driver` ever allocated was released exactly once.
pub fn assert_all_released(driver: &MockDriver) -> anyhow::Result<()> {
    anyhow::ensure!(
        driver.live_handles() == 0,
        "{} handle(s) still live",
        driver.live_handles()
    );
    anyhow::ensure!(
        driver.releases() == driver.allocations(),
        "{} release(s) for {} allocation(s)",
        driver.releases(),
        driver.allocations()
    );

    log::debug!("all {} handle(s) released once", driver.allocations());

    Ok(())
}
