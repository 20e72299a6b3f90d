//! Registration confirmation e-mail
//!
//! Fixed bilingual (Marathi + English) HTML. The QR image is referenced by
//! URL, never attached.

use crate::db::models::Profile;
use crate::qr::{qr_image_url, QrPayload};
use crate::Result;

pub const EVENT_NAME: &str = "स्नेहबंध पंढरपूर 2025";

/// Rendered message body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub html: String,
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn detail_row(label: &str, value: &str) -> String {
    format!(
        "<tr><td style=\"padding:4px 12px;color:#555\">{}</td>\
         <td style=\"padding:4px 12px;font-weight:bold\">{}</td></tr>",
        label,
        escape_html(value)
    )
}

/// Confirmation e-mail with the check-in QR code for `profile`
pub fn registration_email(profile: &Profile, qr_service_url: &str) -> Result<EmailContent> {
    let qr_url = qr_image_url(qr_service_url, &QrPayload::for_profile(profile))?;

    let rows = [
        detail_row("अनुबंध आयडी / Anubandh ID", &profile.anubandh_id.to_string()),
        detail_row("नाव / Name", &profile.name),
        detail_row("मोबाईल / Mobile", &profile.mobile),
        detail_row(
            "उपस्थित व्यक्ती / Attendees",
            &profile.attendee_count.to_string(),
        ),
    ]
    .concat();

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="mr">
<head><meta charset="utf-8"><title>{event}</title></head>
<body style="font-family:sans-serif;max-width:600px;margin:auto">
<h2>{event}</h2>
<p>नमस्कार {name},</p>
<p>मेळाव्यासाठी आपली नोंदणी झाली आहे. प्रवेशाच्या वेळी खालील QR कोड दाखवा.</p>
<p>Dear {name}, your registration is confirmed. Please show the QR code below at the venue entrance.</p>
<table>{rows}</table>
<p style="text-align:center"><img src="{qr}" alt="QR code" width="300" height="300"></p>
<p style="color:#777;font-size:12px">हा ई-मेल स्वयंचलितपणे पाठवला आहे. / This is an automated message.</p>
</body>
</html>
"#,
        event = EVENT_NAME,
        name = escape_html(&profile.name),
        rows = rows,
        qr = escape_html(qr_url.as_str()),
    );

    Ok(EmailContent {
        subject: format!("{} - नोंदणी निश्चित / Registration confirmed #{}", EVENT_NAME, profile.anubandh_id),
        html,
    })
}
