//! Notification rendering
//!
//! Turns delivery data into subject lines and HTML bodies. Subject and badge
//! depend only on whether a live-site URL exists.

use std::fmt::Write as _;

/// Everything the two notifications show
#[derive(Debug, Clone, Default)]
pub struct NotificationData<'a> {
    pub session_id: &'a str,
    pub business_name: &'a str,
    pub contact_name: Option<&'a str>,
    pub contact_email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub industry: Option<&'a str>,
    pub tagline: Option<&'a str>,
    pub quality_score: Option<f64>,
    pub site_url: Option<&'a str>,
    pub credits_remaining: Option<u32>,
    pub revision: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

fn badge(site_url: Option<&str>) -> &'static str {
    match site_url {
        Some(_) => r#"<span style="background:#16a34a;color:#fff;padding:2px 8px;border-radius:4px">SITE LIVE</span>"#,
        None => r#"<span style="background:#d97706;color:#fff;padding:2px 8px;border-radius:4px">BRIEF ONLY</span>"#,
    }
}

fn row(out: &mut String, label: &str, value: &str) {
    let _ = write!(
        out,
        "<tr><td style=\"padding:4px 12px 4px 0;color:#6b7280\">{}</td><td>{}</td></tr>",
        label,
        escape_html(value)
    );
}

/// Internal notice for the team inbox
pub fn lead_notice(data: &NotificationData<'_>) -> RenderedEmail {
    let name = data.business_name;
    let subject = match data.site_url {
        Some(_) => format!("New lead: {} (site live)", name),
        None => format!("New lead: {} (brief only)", name),
    };

    let mut html = String::new();
    let _ = write!(html, "<h2>{} {}</h2><table>", escape_html(name), badge(data.site_url));
    row(&mut html, "Session", data.session_id);
    if let Some(v) = data.contact_name {
        row(&mut html, "Contact", v);
    }
    if let Some(v) = data.contact_email {
        row(&mut html, "Email", v);
    }
    if let Some(v) = data.phone {
        row(&mut html, "Phone", v);
    }
    if let Some(v) = data.industry {
        row(&mut html, "Industry", v);
    }
    if let Some(score) = data.quality_score {
        row(&mut html, "Quality score", &format!("{:.1}/10", score));
    }
    row(
        &mut html,
        "Submission",
        &if data.revision > 0 {
            format!("Revision {}", data.revision)
        } else {
            "First submission".to_string()
        },
    );
    if let Some(credits) = data.credits_remaining {
        row(&mut html, "Credits remaining", &credits.to_string());
    }
    match data.site_url {
        Some(url) => {
            let url = escape_html(url);
            let _ = write!(html, "</table><p>Live site: <a href=\"{url}\">{url}</a></p>");
        }
        None => html.push_str("</table><p>No site was published; follow up with the brief.</p>"),
    }

    RenderedEmail { subject, html }
}

/// Confirmation sent to the submitter
pub fn confirmation(data: &NotificationData<'_>) -> RenderedEmail {
    let name = data.business_name;
    let subject = match data.site_url {
        Some(_) => format!("Your {} website is live", name),
        None => format!("We received your {} website brief", name),
    };

    let greeting = data.contact_name.map(escape_html).unwrap_or_else(|| "there".to_string());
    let mut html = String::new();
    let _ = write!(html, "<p>Hi {},</p>{}", greeting, badge(data.site_url));

    if let Some(tagline) = data.tagline.filter(|t| !t.is_empty()) {
        let _ = write!(html, "<blockquote>{}</blockquote>", escape_html(tagline));
    }

    match data.site_url {
        Some(url) => {
            let url = escape_html(url);
            let _ = write!(
                html,
                "<p>Your website for {} is ready: <a href=\"{url}\">{url}</a></p>",
                escape_html(name)
            );
        }
        None => {
            let _ = write!(
                html,
                "<p>Thanks for telling us about {}. Our team is reviewing your enhanced brief and will be in touch shortly.</p>",
                escape_html(name)
            );
        }
    }

    if let Some(credits) = data.credits_remaining {
        let _ = write!(html, "<p>Revisions remaining: {}</p>", credits);
    }

    RenderedEmail { subject, html }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(site_url: Option<&'static str>) -> NotificationData<'static> {
        NotificationData {
            session_id: "s-1",
            business_name: "Harbor <Bakery>",
            contact_name: Some("Ana"),
            contact_email: Some("ana@harbor.example"),
            site_url,
            ..Default::default()
        }
    }

    #[test]
    fn test_subject_and_badge_follow_site_url() {
        let live = lead_notice(&data(Some("https://harbor-bakery.pages.dev")));
        assert!(live.subject.contains("site live"));
        assert!(live.html.contains("SITE LIVE"));
        assert!(live.html.contains("https://harbor-bakery.pages.dev"));

        let brief_only = lead_notice(&data(None));
        assert!(brief_only.subject.contains("brief only"));
        assert!(brief_only.html.contains("BRIEF ONLY"));

        assert!(confirmation(&data(Some("https://x.pages.dev"))).subject.contains("is live"));
        assert!(confirmation(&data(None)).subject.contains("received"));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let email = confirmation(&data(None));
        assert!(email.html.contains("Harbor &lt;Bakery&gt;"));
        assert!(!email.html.contains("<Bakery>"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"a & "b" <c>"#), "a &amp; &quot;b&quot; &lt;c&gt;");
    }
}
