//! Email template for verification codes

use once_cell::sync::Lazy;

/// Rendered subject and bodies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailTemplate {
    pub subject: String,
    pub html: String,
    pub text: String,
}

static TAG: Lazy<regex::Regex> = Lazy::new(|| {
    regex::Regex::new(r"</?[^>]+(>|$)").expect("tag regex is valid")
});

static WHITESPACE: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r"\s+").expect("whitespace regex is valid"));

/// Plain-text alternative of an HTML body: tags become spaces, whitespace collapses
pub fn html_to_plain_text(html: &str) -> String {
    let without_tags = TAG.replace_all(html, " ");
    WHITESPACE.replace_all(&without_tags, " ").trim().to_string()
}

/// Email asking the user to confirm their address
pub fn verification_email(app_name: &str, code: &str, ttl_minutes: i64) -> EmailTemplate {
    let body = format!(
        "<p style=\"color: #333333; font-size: 16px; line-height: 24px;\">\
         Thank you for registering! Please use the verification code below to verify your email address:</p>\
         {code_block}\
         <p style=\"color: #666666; font-size: 14px; line-height: 21px;\">\
         This code will expire in {ttl} minutes. If you didn't request this verification, you can safely ignore this email.</p>",
        code_block = code_block(code),
        ttl = ttl_minutes,
    );
    render(app_name, "Email Verification", "Your Email Verification Code", &body)
}

fn code_block(code: &str) -> String {
    format!(
        "<div style=\"background-color: #f5f5f5; padding: 20px; border-radius: 8px; text-align: center; border: 1px dashed #dddddd;\">\
         <h2 style=\"font-size: 32px; letter-spacing: 5px; margin: 0; font-family: 'Courier New', monospace;\">{}</h2></div>",
        code
    )
}

fn render(app_name: &str, heading: &str, subject: &str, body: &str) -> EmailTemplate {
    let html = format!(
        "<!DOCTYPE html>\
         <html lang=\"en\"><head><meta charset=\"UTF-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\
         <title>{heading}</title></head>\
         <body style=\"margin: 0; padding: 0; font-family: Arial, sans-serif; background-color: #f9f9f9;\">\
         <table align=\"center\" width=\"100%\" style=\"max-width: 600px; margin: 0 auto; background-color: #ffffff; border-radius: 8px;\">\
         <tr><td style=\"padding: 40px 30px; text-align: center; background-color: #4A90E2;\">\
         <h1 style=\"color: #ffffff; font-size: 24px; margin: 0;\">{heading}</h1></td></tr>\
         <tr><td style=\"padding: 40px 30px;\">{body}</td></tr>\
         <tr><td style=\"padding: 20px 30px; text-align: center; color: #777777; font-size: 12px;\">\
         <p style=\"margin: 0;\">{app_name}</p>\
         <p style=\"margin: 5px 0 0 0;\">This is an automated email, please do not reply.</p></td></tr>\
         </table></body></html>",
        heading = heading,
        body = body,
        app_name = app_name,
    );
    let text = html_to_plain_text(&html);
    EmailTemplate {
        subject: format!("{} - {}", app_name, subject),
        html,
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_plain_text() {
        let text = html_to_plain_text("<p>Hello\n  <b>there</b></p>\t<br/>friend");
        assert_eq!(text, "Hello there friend");
    }

    #[test]
    fn test_verification_email_embeds_code_and_expiry() {
        let template = verification_email("AhliAnak", "0482", 30);
        assert!(template.subject.contains("Verification Code"));
        assert!(template.html.contains("0482"));
        assert!(template.text.contains("0482"));
        assert!(template.text.contains("expire in 30 minutes"));
        assert!(!template.text.contains('<'));
    }
}
