use std::fmt::Write;

use sha2::{Digest, Sha256};
use worker_model::ResultReport;

use crate::error::JobError;

/// Content fingerprint of a sanitised record: lower-case hex SHA-256 of its
/// canonical JSON (fields in declaration order, absent fields omitted).
#[derive(Debug, Default, Clone, Copy)]
pub struct ReportHasher;

impl ReportHasher {
    pub fn hash(&self, unit: &ResultReport) -> Result<String, JobError> {
        let canonical = serde_json::to_vec(unit)?;
        let digest = Sha256::digest(&canonical);
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest.iter() {
            let _ = write!(&mut hex, "{byte:02x}");
        }
        Ok(hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_and_hex() {
        let unit = ResultReport::description("Hello");
        let first = ReportHasher.hash(&unit).unwrap();
        let second = ReportHasher.hash(&unit.clone()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn any_field_change_changes_the_hash() {
        let base = ResultReport {
            title: Some("t".into()),
            description: Some("d".into()),
            image: Some("https://local.host/i.png".into()),
            url: Some("https://local.host/".into()),
        };
        let reference = ReportHasher.hash(&base).unwrap();

        let mut changed = base.clone();
        changed.url = Some("https://local.host/other".into());
        assert_ne!(ReportHasher.hash(&changed).unwrap(), reference);

        let mut removed = base.clone();
        removed.image = None;
        assert_ne!(ReportHasher.hash(&removed).unwrap(), reference);
    }

    #[test]
    fn moving_a_value_between_fields_changes_the_hash() {
        let as_title = ResultReport {
            title: Some("same".into()),
            ..Default::default()
        };
        let as_description = ResultReport::description("same");
        assert_ne!(
            ReportHasher.hash(&as_title).unwrap(),
            ReportHasher.hash(&as_description).unwrap()
        );
    }
}
