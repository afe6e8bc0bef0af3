//! Email templates for expiry notifications.

use passwatch_domain::{ExpiryAssessment, ExpiryStatus, Identity};

/// Subject line shared by every expiry notification.
pub const EXPIRY_NOTICE_SUBJECT: &str = "Google password expire soon!";

/// Help page linked from warning emails.
pub const PASSWORD_RESET_HELP_URL: &str =
    "https://support.google.com/accounts/answer/41078?hl=en&co=GENIE.Platform%3DDesktop";

/// Rendered notification for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryNotice {
    /// Recipient address.
    pub recipient: String,
    /// Email subject.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

impl ExpiryNotice {
    /// Renders the notice for an assessment, or `None` when the user needs no
    /// email.
    #[must_use]
    pub fn for_assessment(identity: &Identity, assessment: &ExpiryAssessment) -> Option<Self> {
        let body = match assessment.status {
            ExpiryStatus::Ok => return None,
            ExpiryStatus::Expired => format!(
                "Dear {identity}! Your password is expired! Please ask admins to reset it for you!"
            ),
            ExpiryStatus::Warning => format!(
                "Dear {identity}! Your password is about to expire in {days} days! Please update it!\n\
                 How to reset password:\n\
                 {PASSWORD_RESET_HELP_URL}\n",
                days = assessment.days_remaining
            ),
        };

        Some(Self {
            recipient: identity.as_str().to_owned(),
            subject: EXPIRY_NOTICE_SUBJECT.to_owned(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use passwatch_domain::{ExpiryAssessment, ExpiryStatus, Identity};

    use super::{EXPIRY_NOTICE_SUBJECT, ExpiryNotice, PASSWORD_RESET_HELP_URL};

    fn jane() -> Identity {
        match Identity::new("jane@example.com") {
            Ok(identity) => identity,
            Err(error) => panic!("test identity invalid: {error}"),
        }
    }

    #[test]
    fn ok_status_renders_nothing() {
        let assessment = ExpiryAssessment {
            status: ExpiryStatus::Ok,
            days_remaining: 40,
        };
        assert!(ExpiryNotice::for_assessment(&jane(), &assessment).is_none());
    }

    #[test]
    fn warning_mentions_days_and_reset_instructions() {
        let assessment = ExpiryAssessment {
            status: ExpiryStatus::Warning,
            days_remaining: 4,
        };
        let notice = ExpiryNotice::for_assessment(&jane(), &assessment);

        let Some(notice) = notice else {
            panic!("warning must render a notice");
        };
        assert_eq!(notice.recipient, "jane@example.com");
        assert_eq!(notice.subject, EXPIRY_NOTICE_SUBJECT);
        assert!(notice.body.contains("about to expire in 4 days"));
        assert!(notice.body.contains(PASSWORD_RESET_HELP_URL));
    }

    #[test]
    fn expired_asks_for_admin_reset() {
        let assessment = ExpiryAssessment {
            status: ExpiryStatus::Expired,
            days_remaining: -3,
        };
        let body = ExpiryNotice::for_assessment(&jane(), &assessment).map(|notice| notice.body);
        assert_eq!(
            body.as_deref(),
            Some(
                "Dear jane@example.com! Your password is expired! Please ask admins to reset it for you!"
            )
        );
    }
}
