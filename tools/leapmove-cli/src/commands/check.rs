//! Check that the configured sensor can be started.

use std::time::Duration;

use leapmove_common::config::TrackingConfig;
use leapmove_frame_source::backends::detect_best_driver;
use leapmove_frame_source::{FrameSource, SensorDriver};

pub async fn run(tracking: &TrackingConfig) -> anyhow::Result<()> {
    println!("LeapMove Sensor Check");
    println!("{}", "=".repeat(50));

    if let Err(e) = tracking.validate() {
        println!("[FAIL] Configuration: {e}");
        return Err(e.into());
    }
    println!("[OK] Configuration valid");

    let mut driver = detect_best_driver(tracking);
    println!(
        "[{}] Driver: {}",
        if driver.is_available() { "OK" } else { "FAIL" },
        driver.name()
    );

    let mut source = match FrameSource::start(driver.as_mut(), tracking.buffer_capacity) {
        Ok(source) => source,
        Err(e) => {
            println!("[FAIL] {e}");
            println!();
            println!("The sensor could not be started. Is the device connected?");
            return Err(e.into());
        }
    };
    println!("[OK] Listener attached (capacity {})", tracking.buffer_capacity);

    tokio::time::sleep(Duration::from_millis(tracking.tick_interval_ms)).await;
    let frames = source.poll().count();
    if frames > 0 {
        println!("[OK] Received {frames} frames in {}ms", tracking.tick_interval_ms);
    } else {
        println!("[WARN] No frames within {}ms", tracking.tick_interval_ms);
    }

    source.shutdown();
    println!("[OK] Sensor shut down cleanly");

    println!();
    println!("The sensor is ready.");
    Ok(())
}
