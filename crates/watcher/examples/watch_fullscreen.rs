//! Example: Watch for fullscreen applications and print visibility requests.
//!
//! Run with: cargo run -p backdrop-watcher --example watch_fullscreen

use std::time::Duration;

use backdrop_snapshot::platform::PlatformProvider;
use backdrop_watcher::{platform, FullscreenWatcher, VisibilityController, WatcherConfig};

/// Prints requests instead of touching a real overlay.
struct PrintingController;

impl VisibilityController for PrintingController {
    fn request_show(&self) {
        println!(
            "[{}] show overlay",
            chrono::Local::now().format("%H:%M:%S%.3f")
        );
    }

    fn request_hide(&self) {
        println!(
            "[{}] hide overlay",
            chrono::Local::now().format("%H:%M:%S%.3f")
        );
    }
}

const RUN_FOR: Duration = Duration::from_secs(30);

fn main() -> anyhow::Result<()> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt()
        .with_env_filter("backdrop_watcher=debug")
        .init();

    println!("=== Fullscreen Watcher Example ===");
    println!("Enter and leave fullscreen apps or switch spaces to see requests.\n");

    let mut config = WatcherConfig::load_or_default()?;
    config.diagnostics.enabled = true;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()?;

    let mut handle = {
        let _guard = runtime.enter();
        FullscreenWatcher::new(PlatformProvider::default(), PrintingController, config)?.spawn()?
    };

    // Observers must be registered from the thread that runs the main run loop.
    handle.hold(platform::register_workspace_observers(handle.notifier()));

    println!("Running for {} seconds...\n", RUN_FOR.as_secs());
    run_main_loop(RUN_FOR);

    runtime.block_on(handle.shutdown())?;
    println!("\nDone.");
    Ok(())
}

#[cfg(target_os = "macos")]
fn run_main_loop(duration: Duration) {
    use core_foundation::runloop::{kCFRunLoopDefaultMode, CFRunLoop};

    // SAFETY: kCFRunLoopDefaultMode is a constant CFString provided by CoreFoundation.
    let mode = unsafe { kCFRunLoopDefaultMode };
    CFRunLoop::run_in_mode(mode, duration, false);
}

#[cfg(not(target_os = "macos"))]
fn run_main_loop(duration: Duration) {
    std::thread::sleep(duration);
}
