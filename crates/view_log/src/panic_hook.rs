//! Panic hook for crash reporting

use backtrace::Backtrace;
use chrono::Local;
use std::panic::PanicHookInfo;

/// Initialize the panic hook for crash reporting
pub fn init_panic_hook() {
    std::panic::set_hook(Box::new(panic_handler));
    tracing::debug!("Panic hook initialized");
}

fn panic_payload(info: &PanicHookInfo) -> String {
    if let Some(s) = info.payload().downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "<unknown>".to_string()
    }
}

fn panic_handler(info: &PanicHookInfo) {
    let backtrace = Backtrace::new();
    let thread = std::thread::current();
    let thread_name = thread.name().unwrap_or("<unnamed>");
    let timestamp = Local::now().to_rfc3339();

    let report = format!(
        "=== CRITICAL PANIC ===\n\
         Timestamp: {}\n\
         Thread: {}\n\
         Location: {:?}\n\
         Payload: {}\n\n\
         Stack Trace:\n{:?}",
        timestamp,
        thread_name,
        info.location(),
        panic_payload(info),
        backtrace
    );

    eprintln!("{}", report);
    tracing::error!("{}", report);

    let dump_filename = format!(
        "imageview_crash_{}.txt",
        Local::now().format("%Y%m%d_%H%M%S")
    );
    let dump_path = std::env::temp_dir().join(&dump_filename);

    if let Err(e) = std::fs::write(&dump_path, &report) {
        eprintln!("Failed to write crash dump: {}", e);
    }
}
