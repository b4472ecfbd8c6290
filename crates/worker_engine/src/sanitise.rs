use url::Url;
use worker_logging::worker_trace;
use worker_model::{Part, ResultReport};

pub const MAX_TITLE_LENGTH: usize = 250;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;
pub const MAX_URL_LENGTH: usize = 2048;

/// Trims and bounds text fields and turns URL fields into absolute URLs.
/// Never fails: a field that cannot be made valid is left out.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReportSanitiser;

impl ReportSanitiser {
    pub fn sanitise(&self, unit: &ResultReport, base_url: &str) -> ResultReport {
        let mut clean = ResultReport::default();
        for part in Part::ALL {
            let value = unit.get(part).and_then(|raw| match part {
                Part::Title => clamp_text(raw, MAX_TITLE_LENGTH),
                Part::Description => clamp_text(raw, MAX_DESCRIPTION_LENGTH),
                Part::Image | Part::Url => absolute_url(raw, base_url),
            });
            if value.is_none() && unit.get(part).is_some() {
                worker_trace!("sanitiser dropped {} field", part);
            }
            clean.set(part, value);
        }
        clean
    }
}

fn clamp_text(raw: &str, max_chars: usize) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(truncate_chars(trimmed, max_chars).to_string())
}

fn absolute_url(raw: &str, base_url: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let absolute = match Url::parse(trimmed) {
        Ok(_) => trimmed.to_string(),
        Err(_) => Url::parse(base_url).ok()?.join(trimmed).ok()?.into(),
    };
    Some(truncate_chars(&absolute, MAX_URL_LENGTH).to_string())
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://local.host";

    fn report(title: &str, description: &str, image: &str, url: &str) -> ResultReport {
        let field = |v: &str| Some(v.to_string());
        ResultReport {
            title: field(title),
            description: field(description),
            image: field(image),
            url: field(url),
        }
    }

    #[test]
    fn text_fields_are_trimmed() {
        let clean = ReportSanitiser.sanitise(&report("  Title \n", "\tBody ", "", ""), BASE);
        assert_eq!(clean.title.as_deref(), Some("Title"));
        assert_eq!(clean.description.as_deref(), Some("Body"));
    }

    #[test]
    fn empty_fields_are_omitted() {
        let clean = ReportSanitiser.sanitise(&report("   ", "", " ", ""), BASE);
        assert_eq!(clean, ResultReport::default());
    }

    #[test]
    fn text_fields_are_truncated_on_char_boundaries() {
        let long_title = "\u{e9}".repeat(MAX_TITLE_LENGTH + 10);
        let long_description = "d".repeat(MAX_DESCRIPTION_LENGTH * 2);
        let clean = ReportSanitiser.sanitise(&report(&long_title, &long_description, "", ""), BASE);
        assert_eq!(clean.title.unwrap().chars().count(), MAX_TITLE_LENGTH);
        assert_eq!(clean.description.unwrap().len(), MAX_DESCRIPTION_LENGTH);
    }

    #[test]
    fn relative_urls_resolve_against_base() {
        let clean = ReportSanitiser.sanitise(&report("", "", " /img.png ", "/foo"), BASE);
        assert_eq!(clean.url.as_deref(), Some("https://local.host/foo"));
        assert_eq!(clean.image.as_deref(), Some("https://local.host/img.png"));
    }

    #[test]
    fn absolute_urls_are_kept_verbatim() {
        let clean = ReportSanitiser.sanitise(&report("", "", "", "https://other.host"), BASE);
        assert_eq!(clean.url.as_deref(), Some("https://other.host"));
    }

    #[test]
    fn unresolvable_urls_are_dropped() {
        let clean = ReportSanitiser.sanitise(&report("t", "", "", "/foo"), "not a base");
        assert_eq!(clean.url, None);
        assert_eq!(clean.title.as_deref(), Some("t"));
    }

    #[test]
    fn long_urls_are_clamped() {
        let long = format!("https://local.host/{}", "a".repeat(MAX_URL_LENGTH));
        let clean = ReportSanitiser.sanitise(&report("", "", "", &long), BASE);
        assert_eq!(clean.url.unwrap().len(), MAX_URL_LENGTH);
    }
}
