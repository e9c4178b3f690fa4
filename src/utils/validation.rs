use crate::models::{AppError, VisitorActionRequest};

pub fn validate_otp(code: &str) -> Result<(), AppError> {
    if !(4..=8).contains(&code.len()) {
        return Err(AppError::ValidationError("OTP must be 4 to 8 digits".to_string()));
    }

    if !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::ValidationError("OTP may only contain digits".to_string()));
    }

    Ok(())
}

pub fn validate_action_request(request: &VisitorActionRequest) -> Result<(), AppError> {
    let has_name = request
        .name
        .as_deref()
        .is_some_and(|name| !name.trim().is_empty());
    if request.credential.trim().is_empty() && !has_name {
        return Err(AppError::ValidationError(
            "credential (or name) is required".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_url(url: &str) -> Result<(), AppError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(AppError::ValidationError(format!("Invalid URL: {}", url)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_rules() {
        assert!(validate_otp("123456").is_ok());
        assert!(validate_otp("12a456").is_err());
        assert!(validate_otp("123").is_err());
        assert!(validate_otp("123456789").is_err());
    }

    #[test]
    fn test_action_request_needs_identifier() {
        let request = VisitorActionRequest {
            credential: " ".to_string(),
            name: None,
            visitor_type: None,
        };
        assert!(validate_action_request(&request).is_err());

        let request = VisitorActionRequest {
            name: Some("Ada".to_string()),
            ..request
        };
        assert!(validate_action_request(&request).is_ok());
    }

    #[test]
    fn test_url_scheme() {
        assert!(validate_url("https://app.nuveq.cloud/visitors").is_ok());
        assert!(validate_url("app.nuveq.cloud").is_err());
    }
}
