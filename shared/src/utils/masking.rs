//! Masking helpers for log output

/// Mask an email address for logs: `parent@example.com` -> `p****t@example.com`
pub fn mask_email(email: &str) -> String {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            let chars: Vec<char> = local.chars().collect();
            let masked_local = match chars.len() {
                0 => String::new(),
                1 | 2 => format!("{}*", chars[0]),
                n => format!("{}****{}", chars[0], chars[n - 1]),
            };
            format!("{}@{}", masked_local, domain)
        }
        None => "****".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("parent@example.com"), "p****t@example.com");
        assert_eq!(mask_email("ab@x.io"), "a*@x.io");
        assert_eq!(mask_email("not-an-email"), "****");
    }
}
