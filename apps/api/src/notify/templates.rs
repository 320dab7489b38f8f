use std::fmt::{self, Display};

use crate::models::interview::{Interview, InterviewReport, NextStep};
use crate::notify::OutgoingEmail;

const SERVICE_NAME: &str = "Recruiter";

/// Minimal HTML escaping for values interpolated into templates.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"><title>{title}</title></head>
<body style="font-family: -apple-system, 'Segoe UI', Roboto, Arial, sans-serif; color: #333; line-height: 1.6;">
  <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
    <div style="background-color: #0d9488; color: white; padding: 16px; text-align: center;">
      <h1 style="margin: 0;">{title}</h1>
    </div>
    <div style="padding: 20px;">{body}</div>
    <div style="text-align: center; color: #666; font-size: 14px;">{SERVICE_NAME}</div>
  </div>
</body>
</html>"#
    )
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "<p>None noted.</p>".to_string();
    }
    let items: String = items
        .iter()
        .map(|i| format!("<li>{}</li>", escape(i)))
        .collect();
    format!("<ul>{items}</ul>")
}

/// Sent to a shortlisted candidate with the booking link.
pub struct ShortlistInvitation<'a> {
    pub candidate_name: &'a str,
    pub match_score: u32,
    pub scheduling_url: Option<&'a str>,
}

impl Display for ShortlistInvitation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let booking = match self.scheduling_url {
            Some(url) => format!(
                r#"<p>Please pick a time for a short AI-led voice interview:</p>
<p style="text-align: center;"><a href="{0}" style="background-color: #0d9488; color: white; padding: 12px 24px; border-radius: 6px; text-decoration: none;">Schedule interview</a></p>"#,
                escape(url)
            ),
            None => "<p>Our team will reach out shortly to schedule your interview.</p>".to_string(),
        };
        let body = format!(
            "<p>Hello {},</p><p>Thank you for applying. Your profile matched the role well (score {}/100) and we would like to invite you to the next step.</p>{booking}",
            escape(self.candidate_name),
            self.match_score,
        );
        write!(f, "{}", layout("You've been shortlisted", &body))
    }
}

impl ShortlistInvitation<'_> {
    pub fn to_email(&self, to: &str) -> OutgoingEmail {
        OutgoingEmail {
            to: to.to_string(),
            to_name: Some(self.candidate_name.to_string()),
            subject: "Next step: schedule your interview".to_string(),
            html_body: self.to_string(),
        }
    }
}

/// Internal summary of a finished interview.
pub struct InterviewReportNotice<'a> {
    pub interview: &'a Interview,
    pub report: &'a InterviewReport,
}

impl Display for InterviewReportNotice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = format!(
            "<p><strong>{}</strong> ({}) finished their interview.</p>\
             <p>Overall score: <strong>{}/100</strong>, recommendation: <strong>{}</strong></p>\
             <h3>Strengths</h3>{}<h3>Weaknesses</h3>{}<h3>Notes</h3><p>{}</p>\
             <p style=\"color: #666;\">Interview {} · {} transcript turns</p>",
            escape(&self.interview.candidate_name),
            escape(&self.interview.candidate_email),
            self.report.overall_score,
            next_step_label(self.report.recommendation),
            bullet_list(&self.report.strengths),
            bullet_list(&self.report.weaknesses),
            escape(&self.report.notes),
            self.interview.id,
            self.interview.transcript.len(),
        );
        write!(f, "{}", layout("Interview report", &body))
    }
}

impl InterviewReportNotice<'_> {
    pub fn to_email(&self, to: &str) -> OutgoingEmail {
        OutgoingEmail {
            to: to.to_string(),
            to_name: None,
            subject: format!(
                "Interview report: {} ({}/100)",
                self.interview.candidate_name, self.report.overall_score
            ),
            html_body: self.to_string(),
        }
    }
}

/// Sent to the candidate once their interview has been graded.
pub struct InterviewOutcome<'a> {
    pub candidate_name: &'a str,
    pub recommendation: NextStep,
}

impl Display for InterviewOutcome<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self.recommendation {
            NextStep::Advance => {
                "We enjoyed speaking with you and would like to move you forward. A member of our team will contact you about the next round."
            }
            NextStep::Hold => {
                "Thank you for your time. We are still reviewing candidates and will be in touch once we have an update."
            }
            NextStep::Reject => {
                "Thank you for your time. After careful review we will not be moving forward with your application on this occasion."
            }
        };
        let body = format!(
            "<p>Hello {},</p><p>Thank you for completing your interview.</p><p>{message}</p>",
            escape(self.candidate_name)
        );
        write!(f, "{}", layout("Thank you for interviewing", &body))
    }
}

impl InterviewOutcome<'_> {
    pub fn to_email(&self, to: &str) -> OutgoingEmail {
        OutgoingEmail {
            to: to.to_string(),
            to_name: Some(self.candidate_name.to_string()),
            subject: "Your interview".to_string(),
            html_body: self.to_string(),
        }
    }
}

fn next_step_label(step: NextStep) -> &'static str {
    match step {
        NextStep::Advance => "advance",
        NextStep::Hold => "hold",
        NextStep::Reject => "reject",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invitation_includes_link_and_escapes_name() {
        let invite = ShortlistInvitation {
            candidate_name: "Jane <script>",
            match_score: 91,
            scheduling_url: Some("https://calendly.com/acme/interview"),
        };
        let html = invite.to_string();
        assert!(html.contains("https://calendly.com/acme/interview"));
        assert!(html.contains("Jane &lt;script&gt;"));
        assert!(html.contains("91/100"));
    }

    #[test]
    fn test_invitation_without_link() {
        let invite = ShortlistInvitation {
            candidate_name: "Jane",
            match_score: 90,
            scheduling_url: None,
        };
        let email = invite.to_email("jane@example.com");
        assert!(email.html_body.contains("reach out shortly"));
        assert_eq!(email.to, "jane@example.com");
    }

    #[test]
    fn test_outcome_varies_by_recommendation() {
        let advance = InterviewOutcome {
            candidate_name: "Jane",
            recommendation: NextStep::Advance,
        }
        .to_string();
        let reject = InterviewOutcome {
            candidate_name: "Jane",
            recommendation: NextStep::Reject,
        }
        .to_string();
        assert!(advance.contains("move you forward"));
        assert!(reject.contains("not be moving forward"));
    }
}
