//! Account field rules shared by the model and service layers.

/// Role assigned to every self-registered account.
pub const DEFAULT_ROLE: &str = "USER";
pub const MAX_EMAIL_LEN: usize = 255;
pub const MAX_FULL_NAME_LEN: usize = 128;

/// Check an already normalized email: non-empty local part, dotted domain, no whitespace.
pub fn check_email(email: &str) -> Result<(), &'static str> {
    if email.is_empty() || email.len() > MAX_EMAIL_LEN {
        return Err("email length out of range");
    }
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() > 1
                && domain.split('.').all(|part| !part.is_empty())
                && !email.contains(char::is_whitespace) =>
        {
            Ok(())
        }
        _ => Err("invalid email"),
    }
}

/// Trimmed name must be non-empty and at most [`MAX_FULL_NAME_LEN`] characters.
pub fn check_full_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("full name required");
    }
    if trimmed.chars().count() > MAX_FULL_NAME_LEN {
        return Err("full name too long");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_rules() {
        assert!(check_email("a@b.com").is_ok());
        assert!(check_email("lan@shop.example.vn").is_ok());
        assert_eq!(check_email("a@b"), Err("invalid email"));
        assert_eq!(check_email("a@.com"), Err("invalid email"));
        assert_eq!(check_email("a@b."), Err("invalid email"));
        assert_eq!(check_email("@b.com"), Err("invalid email"));
        assert_eq!(check_email("a@b@c.com"), Err("invalid email"));
        assert_eq!(check_email("a b@c.com"), Err("invalid email"));
        assert_eq!(check_email(""), Err("email length out of range"));
        let long = format!("{}@example.com", "x".repeat(MAX_EMAIL_LEN));
        assert_eq!(check_email(&long), Err("email length out of range"));
    }

    #[test]
    fn full_name_rules() {
        assert!(check_full_name(" Lan ").is_ok());
        assert_eq!(check_full_name("   "), Err("full name required"));
        assert_eq!(check_full_name(&"n".repeat(MAX_FULL_NAME_LEN + 1)), Err("full name too long"));
    }
}
