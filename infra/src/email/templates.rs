//! Verification email rendering

use bh_core::domain::entities::otp_record::OtpPurpose;
use bh_core::domain::entities::user::UserRole;
use bh_core::services::otp::DeliveryContext;

/// A rendered message, ready for a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Render the verification email for `code`
pub fn render_otp_email(brand: &str, code: &str, context: &DeliveryContext) -> RenderedEmail {
    let greeting = match context.display_name.as_deref() {
        Some(name) => format!("Hi {},", name),
        None => "Hi,".to_string(),
    };

    let (subject, intro) = match context.purpose {
        OtpPurpose::Register => (
            format!("Your {} verification code", brand),
            format!(
                "Use the code below to finish creating your {} account{}.",
                brand,
                match context.role {
                    UserRole::Owner => " and start listing your boarding house",
                    UserRole::Tenant => "",
                }
            ),
        ),
        OtpPurpose::ResetPassword => (
            format!("Reset your {} password", brand),
            "Use the code below to choose a new password.".to_string(),
        ),
    };

    let expiry = format!(
        "The code expires in {} minute{}. If you did not ask for it, ignore this email.",
        context.expires_in_minutes,
        if context.expires_in_minutes == 1 { "" } else { "s" }
    );

    let text_body = format!("{}\n\n{}\n\n    {}\n\n{}\n\n{}\n", greeting, intro, code, expiry, brand);
    let html_body = format!(
        "<p>{}</p><p>{}</p><p style=\"font-size:24px;font-weight:bold;letter-spacing:4px\">{}</p><p>{}</p><p>{}</p>",
        escape_html(&greeting),
        escape_html(&intro),
        code,
        escape_html(&expiry),
        escape_html(brand)
    );

    RenderedEmail {
        subject,
        text_body,
        html_body,
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(purpose: OtpPurpose, name: Option<&str>) -> DeliveryContext {
        DeliveryContext {
            purpose,
            role: UserRole::Tenant,
            display_name: name.map(String::from),
            expires_in_minutes: purpose.expiry().num_minutes(),
        }
    }

    #[test]
    fn test_register_email() {
        let email = render_otp_email("BoardHub", "482913", &context(OtpPurpose::Register, Some("Ana")));

        assert_eq!(email.subject, "Your BoardHub verification code");
        assert!(email.text_body.starts_with("Hi Ana,"));
        assert!(email.text_body.contains("482913"));
        assert!(email.text_body.contains("5 minutes"));
        assert!(email.html_body.contains("482913"));
    }

    #[test]
    fn test_reset_email() {
        let email = render_otp_email("BoardHub", "104857", &context(OtpPurpose::ResetPassword, None));

        assert_eq!(email.subject, "Reset your BoardHub password");
        assert!(email.text_body.starts_with("Hi,"));
        assert!(email.text_body.contains("10 minutes"));
    }

    #[test]
    fn test_display_name_is_escaped_in_html() {
        let email = render_otp_email(
            "BoardHub",
            "111111",
            &context(OtpPurpose::Register, Some("<script>")),
        );
        assert!(!email.html_body.contains("<script>"));
        assert!(email.html_body.contains("&lt;script&gt;"));
    }
}
