//! ARN and E.164 value grammars.
//!
//! Shared by post-render validation and the cross-artifact validator.
//! Parsing is character-level; no pattern library is involved, so there is
//! no chance of matching inside escaped JSON text.

/// A parsed AWS ARN: `arn:aws:<service>:<region>:<account>:<resource>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn {
    pub service: String,
    pub region: String,
    pub account: String,
    pub resource: String,
}

impl Arn {
    /// For Connect-service ARNs, the instance id embedded in the resource
    /// path (`instance/<id>/...` or a bare `instance/<id>`), if any.
    pub fn instance_id(&self) -> Option<&str> {
        let rest = self.resource.strip_prefix("instance/")?;
        match rest.find('/') {
            Some(idx) => Some(&rest[..idx]),
            None => Some(rest),
        }
    }
}

/// Parse a strict ARN: exactly `arn:aws:` partition, non-empty service and
/// region, a 12-digit account, and a non-empty resource path.
pub fn parse_arn(s: &str) -> Option<Arn> {
    let mut parts = s.splitn(6, ':');
    if parts.next()? != "arn" {
        return None;
    }
    if parts.next()? != "aws" {
        return None;
    }
    let service = parts.next()?;
    let region = parts.next()?;
    let account = parts.next()?;
    let resource = parts.next()?;

    if service.is_empty() || region.is_empty() || resource.is_empty() {
        return None;
    }
    if !service.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        return None;
    }
    if account.len() != 12 || !account.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    Some(Arn {
        service: service.to_owned(),
        region: region.to_owned(),
        account: account.to_owned(),
        resource: resource.to_owned(),
    })
}

/// True when `s` looks like it was meant to be an ARN (starts with `arn:`).
/// Used to decide whether the strict grammar applies at all.
pub fn is_arn_shaped(s: &str) -> bool {
    s.starts_with("arn:")
}

/// Strict Connect-service ARN.
pub fn is_connect_arn(s: &str) -> bool {
    parse_arn(s).is_some_and(|a| a.service == "connect")
}

/// Strict Lambda function ARN.
pub fn is_lambda_arn(s: &str) -> bool {
    parse_arn(s).is_some_and(|a| a.service == "lambda" && a.resource.starts_with("function:"))
}

/// E.164 phone number: `+`, then 2-15 digits, leading digit 1-9.
pub fn is_e164(s: &str) -> bool {
    let Some(digits) = s.strip_prefix('+') else {
        return false;
    };
    if !(2..=15).contains(&digits.len()) {
        return false;
    }
    let mut chars = digits.chars();
    matches!(chars.next(), Some('1'..='9')) && chars.all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_connect_queue_arn() {
        let arn = parse_arn(
            "arn:aws:connect:us-east-1:123456789012:instance/abc-123/queue/def-456",
        )
        .unwrap();
        assert_eq!(arn.service, "connect");
        assert_eq!(arn.region, "us-east-1");
        assert_eq!(arn.account, "123456789012");
        assert_eq!(arn.instance_id(), Some("abc-123"));
    }

    #[test]
    fn rejects_malformed_arns() {
        assert!(parse_arn("invalid-arn-format").is_none());
        assert!(parse_arn("arn:aws:connect:us-east-1:12345:instance/x").is_none()); // short account
        assert!(parse_arn("arn:gov:connect:us-east-1:123456789012:r").is_none()); // partition
        assert!(parse_arn("arn:aws:connect::123456789012:r").is_none()); // empty region
    }

    #[test]
    fn sqs_arn_is_not_connect() {
        assert!(!is_connect_arn(
            "arn:aws:sqs:us-east-1:123456789012:my-queue"
        ));
    }

    #[test]
    fn lambda_arn_requires_function_resource() {
        assert!(is_lambda_arn(
            "arn:aws:lambda:us-east-1:123456789012:function:router"
        ));
        assert!(!is_lambda_arn(
            "arn:aws:lambda:us-east-1:123456789012:layer:shared:3"
        ));
    }

    #[test]
    fn e164_fixtures() {
        assert!(is_e164("+15551234567"));
        assert!(!is_e164("5551234567")); // no leading +
        assert!(!is_e164("+0123")); // leading zero
        assert!(!is_e164("+1")); // too short
        assert!(!is_e164("+1234567890123456")); // too long
        assert!(!is_e164("+1555-123")); // non-digit
    }

    #[test]
    fn instance_id_without_trailing_path() {
        let arn = parse_arn("arn:aws:connect:us-east-1:123456789012:instance/abc-123").unwrap();
        assert_eq!(arn.instance_id(), Some("abc-123"));
    }
}
