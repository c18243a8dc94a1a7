//! Error taxonomy mapping.
//!
//! Reduces any [`BridgeError`] to the caller-visible [`ErrorRecord`]:
//!
//! - domain errors keep their code; the message is localized against the
//!   bound host context when the key resolves, else the fallback message
//! - malformed input uses [`UNEXPECTED_ERROR_CODE`] and reports the inner
//!   cause when there is one
//! - precondition failures use [`NOT_INITIALIZED_CODE`]
//! - everything else uses [`UNEXPECTED_ERROR_CODE`] with the error's display
//!
//! [`UNEXPECTED_ERROR_CODE`]: cardlink_core::constants::UNEXPECTED_ERROR_CODE
//! [`NOT_INITIALIZED_CODE`]: cardlink_core::constants::NOT_INITIALIZED_CODE

use cardlink_core::ErrorRecord;
use cardlink_hardware::HostContext;

use crate::commands::{CommandError, DomainError};
use crate::error::BridgeError;

/// Map an error to its record, localizing against `context` when given.
pub fn map_error(error: &BridgeError, context: Option<&dyn HostContext>) -> ErrorRecord {
    match error {
        BridgeError::NotInitialized => ErrorRecord::not_initialized(),
        BridgeError::Command(CommandError::Domain(domain)) => map_domain(domain, context),
        BridgeError::Command(CommandError::MalformedPayload { description, cause })
        | BridgeError::Malformed { description, cause } => {
            ErrorRecord::unexpected(cause.as_deref().unwrap_or(description))
        }
        BridgeError::Command(CommandError::Other(message)) => ErrorRecord::unexpected(message),
        other => ErrorRecord::unexpected(other.to_string()),
    }
}

fn map_domain(domain: &DomainError, context: Option<&dyn HostContext>) -> ErrorRecord {
    let localized = domain
        .message_key
        .as_deref()
        .zip(context)
        .and_then(|(key, context)| context.localized_string(key));

    ErrorRecord::new(domain.code, localized.unwrap_or_else(|| domain.message.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardlink_core::constants::{NOT_INITIALIZED_CODE, UNEXPECTED_ERROR_CODE};
    use cardlink_hardware::HardwareError;
    use cardlink_hardware::mock::MockHostContext;
    use rstest::rstest;

    fn busy() -> BridgeError {
        DomainError::new(50002, "Card is busy")
            .with_message_key("error_busy")
            .into()
    }

    #[test]
    fn test_domain_localized() {
        let context = MockHostContext::new(1).with_string("error_busy", "Karte beschäftigt");
        let record = map_error(&busy(), Some(&context));
        assert_eq!(record, ErrorRecord::new(50002, "Karte beschäftigt"));
    }

    #[test]
    fn test_domain_without_context_uses_fallback() {
        let record = map_error(&busy(), None);
        assert_eq!(record, ErrorRecord::new(50002, "Card is busy"));
    }

    #[test]
    fn test_domain_unresolved_key_uses_fallback() {
        let context = MockHostContext::new(1);
        let record = map_error(&busy(), Some(&context));
        assert_eq!(record.message, "Card is busy");
    }

    #[test]
    fn test_domain_without_key_ignores_context() {
        let context = MockHostContext::new(1).with_string("", "nope");
        let error: BridgeError = DomainError::new(40001, "Wrong PIN").into();
        assert_eq!(
            map_error(&error, Some(&context)),
            ErrorRecord::new(40001, "Wrong PIN")
        );
    }

    #[rstest]
    #[case(BridgeError::malformed("Invalid hash", "Odd number of digits"), "Odd number of digits")]
    #[case(BridgeError::Malformed { description: "Invalid hash".into(), cause: None }, "Invalid hash")]
    #[case(CommandError::malformed("bad json", Some("EOF".into())).into(), "EOF")]
    #[case(CommandError::other("radio crashed").into(), "radio crashed")]
    #[case(HardwareError::communication("tag lost").into(), "Communication error: tag lost")]
    #[case(BridgeError::unexpected("boom"), "boom")]
    #[case(BridgeError::Configuration("bad".into()), "Configuration error: bad")]
    fn test_sentinel_mappings(#[case] error: BridgeError, #[case] message: &str) {
        let record = map_error(&error, None);
        assert_eq!(record.code, UNEXPECTED_ERROR_CODE);
        assert_eq!(record.message, message);
    }

    #[test]
    fn test_not_initialized() {
        let record = map_error(&BridgeError::NotInitialized, None);
        assert_eq!(record.code, NOT_INITIALIZED_CODE);
    }
}
