use anyhow::{Result, anyhow};

pub fn validate_email(address: &str) -> Result<()> {
    if address.is_empty() {
        return Err(anyhow!("Email address cannot be empty"));
    }

    if address.len() > 254 {
        return Err(anyhow!("Email address too long (maximum 254 characters)"));
    }

    if address.chars().any(char::is_whitespace) {
        return Err(anyhow!("Email address contains whitespace"));
    }

    let Some((local, domain)) = address.split_once('@') else {
        return Err(anyhow!("Email address is missing '@'"));
    };

    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(anyhow!("Email address is malformed"));
    }

    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<()> {
    if phone.is_empty() {
        return Err(anyhow!("Phone number cannot be empty"));
    }

    let rest = phone.strip_prefix('+').unwrap_or(phone);

    let valid_chars = rest
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '-');

    if !valid_chars {
        return Err(anyhow!("Phone number contains invalid characters"));
    }

    let digits = rest.chars().filter(char::is_ascii_digit).count();

    if digits < 7 {
        return Err(anyhow!("Phone number too short (minimum 7 digits)"));
    }

    if digits > 15 {
        return Err(anyhow!("Phone number too long (maximum 15 digits)"));
    }

    Ok(())
}
