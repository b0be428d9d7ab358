//! Structured log macros with consistent field names.

/// Log an event tagged with the component that emitted it.
#[macro_export]
macro_rules! log_event {
    ($level:ident, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a block-related event with standard fields.
#[macro_export]
macro_rules! log_block_event {
    (
        $level:ident,
        $component:expr,
        $msg:expr,
        $block_height:expr,
        $block_id:expr
        $(, $($field:tt)*)?
    ) => {
        tracing::$level!(
            component = $component,
            block_height = $block_height,
            block_id = %$block_id,
            $($($field)*,)?
            $msg
        )
    };
}
