use thiserror::Error;

/// Errors from the statistical core.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid detector configuration: {0}")]
    InvalidConfig(String),

    #[error("device id must not be empty")]
    EmptyDeviceId,

    #[error("reading for device {device_id} is not finite: {value}")]
    NonFiniteValue { device_id: String, value: f64 },

    #[error("result queue closed: no consumer attached")]
    OutputClosed,
}

/// Convenience type alias for core results.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let e = CoreError::InvalidConfig("window_capacity must be positive".into());
        assert!(e.to_string().contains("window_capacity"));

        let e = CoreError::NonFiniteValue {
            device_id: "sensor-7".into(),
            value: f64::NAN,
        };
        assert!(e.to_string().contains("sensor-7"));
        assert!(e.to_string().contains("NaN"));
    }

    #[test]
    fn test_result_type_works() {
        let ok: CoreResult<u32> = Ok(42);
        assert_eq!(ok.unwrap(), 42);

        let err: CoreResult<u32> = Err(CoreError::OutputClosed);
        assert!(err.is_err());
    }
}
