//! The standard error hierarchy
//!
//! Mirrors the builtin classes that provider SDKs and request handlers
//! raise, with the same ancestry, so status lookups by resolution order
//! behave the same for recorded and live errors.

use std::sync::LazyLock;

use crate::class::{ErrorType, ErrorTypeRef};

/// Module name shared by every builtin class
pub const MODULE: &str = "builtins";

pub static BASE_EXCEPTION: LazyLock<ErrorTypeRef> = LazyLock::new(|| ErrorType::root("BaseException", MODULE));

pub static EXCEPTION: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| ErrorType::subclass("Exception", MODULE, &BASE_EXCEPTION));

pub static VALUE_ERROR: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| ErrorType::subclass("ValueError", MODULE, &EXCEPTION));

pub static TYPE_ERROR: LazyLock<ErrorTypeRef> = LazyLock::new(|| ErrorType::subclass("TypeError", MODULE, &EXCEPTION));

pub static LOOKUP_ERROR: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| ErrorType::subclass("LookupError", MODULE, &EXCEPTION));

pub static KEY_ERROR: LazyLock<ErrorTypeRef> = LazyLock::new(|| ErrorType::subclass("KeyError", MODULE, &LOOKUP_ERROR));

pub static INDEX_ERROR: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| ErrorType::subclass("IndexError", MODULE, &LOOKUP_ERROR));

pub static RUNTIME_ERROR: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| ErrorType::subclass("RuntimeError", MODULE, &EXCEPTION));

pub static NOT_IMPLEMENTED_ERROR: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| ErrorType::subclass("NotImplementedError", MODULE, &RUNTIME_ERROR));

pub static OS_ERROR: LazyLock<ErrorTypeRef> = LazyLock::new(|| ErrorType::subclass("OSError", MODULE, &EXCEPTION));

pub static PERMISSION_ERROR: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| ErrorType::subclass("PermissionError", MODULE, &OS_ERROR));

pub static FILE_NOT_FOUND_ERROR: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| ErrorType::subclass("FileNotFoundError", MODULE, &OS_ERROR));

pub static CONNECTION_ERROR: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| ErrorType::subclass("ConnectionError", MODULE, &OS_ERROR));

pub static CONNECTION_REFUSED_ERROR: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| ErrorType::subclass("ConnectionRefusedError", MODULE, &CONNECTION_ERROR));

pub static CONNECTION_RESET_ERROR: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| ErrorType::subclass("ConnectionResetError", MODULE, &CONNECTION_ERROR));

pub static TIMEOUT_ERROR: LazyLock<ErrorTypeRef> =
    LazyLock::new(|| ErrorType::subclass("TimeoutError", MODULE, &OS_ERROR));

/// Map an I/O error kind onto the closest builtin class
pub fn class_for_io_kind(kind: std::io::ErrorKind) -> ErrorTypeRef {
    use std::io::ErrorKind;

    let class = match kind {
        ErrorKind::PermissionDenied => &PERMISSION_ERROR,
        ErrorKind::NotFound => &FILE_NOT_FOUND_ERROR,
        ErrorKind::ConnectionRefused => &CONNECTION_REFUSED_ERROR,
        ErrorKind::ConnectionReset => &CONNECTION_RESET_ERROR,
        ErrorKind::ConnectionAborted | ErrorKind::NotConnected | ErrorKind::BrokenPipe => &CONNECTION_ERROR,
        ErrorKind::TimedOut => &TIMEOUT_ERROR,
        ErrorKind::Unsupported => &NOT_IMPLEMENTED_ERROR,
        ErrorKind::InvalidInput | ErrorKind::InvalidData => &VALUE_ERROR,
        _ => &OS_ERROR,
    };
    ErrorTypeRef::clone(class)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_error_descends_from_os_error() {
        let names: Vec<_> = PERMISSION_ERROR.mro().map(ErrorType::name).collect();
        assert_eq!(names, ["PermissionError", "OSError", "Exception", "BaseException"]);
    }

    #[test]
    fn key_error_passes_through_lookup_error() {
        assert!(KEY_ERROR.is_subclass_of(&LOOKUP_ERROR));
        assert!(!KEY_ERROR.is_subclass_of(&VALUE_ERROR));
    }

    #[test]
    fn io_kinds_map_to_builtin_classes() {
        assert_eq!(class_for_io_kind(std::io::ErrorKind::TimedOut).name(), "TimeoutError");
        assert_eq!(class_for_io_kind(std::io::ErrorKind::PermissionDenied).name(), "PermissionError");
        assert!(class_for_io_kind(std::io::ErrorKind::ConnectionRefused).is_subclass_of(&CONNECTION_ERROR));
        assert_eq!(class_for_io_kind(std::io::ErrorKind::Other).name(), "OSError");
    }
}
