/// Logs a message to stderr when the active client is in debug mode.
///
/// This is the SDK's diagnostic channel: it must never panic and never
/// surface into application code.
#[macro_export]
macro_rules! radar_debug {
    ($($arg:tt)*) => {
        if let Some(client) = $crate::registry::current_client() {
            if client.options().debug {
                eprint!("[xrayradar] ");
                eprintln!($($arg)*);
            }
        }
    };
}
