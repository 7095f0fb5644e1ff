/// Target used for "operation succeeded" lines so the terminal formatter can
/// render them with their own glyph.
pub const SUCCESS_TARGET: &str = "scout::success";

/// Logs a success message at `INFO` level on the [`SUCCESS_TARGET`] target.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        ::tracing::info!(target: $crate::log::SUCCESS_TARGET, $($arg)*)
    };
}

/// Target carrying pre-rendered console output in a `raw_msg` field.
///
/// The terminal formatter prints these lines verbatim, without a level glyph.
pub const PRINT_TARGET: &str = "scout::print";
