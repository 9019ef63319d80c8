//! DNS challenge selection and formatting

use crate::model::Challenge;

/// DNS ownership verification record
pub const MANAGED_DNS: &str = "managed-dns";
/// CNAME record routing the domain to the edge
pub const MANAGED_HTTP_CNAME: &str = "managed-http-cname";
/// A records routing the domain to the edge
pub const MANAGED_HTTP_A: &str = "managed-http-a";

/// Challenges whose type equals `kind`, in their original order
pub fn select_by_type<'a>(challenges: &'a [Challenge], kind: &str) -> Vec<&'a Challenge> {
    challenges
        .iter()
        .filter(|challenge| challenge.kind == kind)
        .collect()
}

/// A challenge prepared for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDisplay {
    pub record_type: String,
    pub record_name: String,
    /// Record values joined with `", "`
    pub joined_values: String,
}

pub fn format(challenge: &Challenge) -> RecordDisplay {
    RecordDisplay {
        record_type: challenge.record_type.clone(),
        record_name: challenge.record_name.clone(),
        joined_values: challenge.values.join(", "),
    }
}

impl From<&Challenge> for RecordDisplay {
    fn from(challenge: &Challenge) -> Self {
        format(challenge)
    }
}

impl std::fmt::Display for RecordDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "DNS Record Type: {}", self.record_type)?;
        writeln!(f, "DNS Record Name: {}", self.record_name)?;
        write!(f, "DNS Record value(s): {}", self.joined_values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn challenge(kind: &str, record_type: &str, record_name: &str, values: &[&str]) -> Challenge {
        Challenge {
            kind: kind.to_string(),
            record_type: record_type.to_string(),
            record_name: record_name.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    fn sample_challenges() -> Vec<Challenge> {
        vec![
            challenge(
                MANAGED_DNS,
                "CNAME",
                "_acme-challenge.www.example.org",
                &["dvxzuc4govtr3juagj.fastly-validations.com"],
            ),
            challenge(
                MANAGED_HTTP_CNAME,
                "CNAME",
                "www.example.org",
                &["j.sni.global.fastly.net"],
            ),
            challenge(
                MANAGED_HTTP_A,
                "A",
                "www.example.org",
                &[
                    "151.101.2.132",
                    "151.101.66.132",
                    "151.101.130.132",
                    "151.101.194.132",
                ],
            ),
        ]
    }

    #[test]
    fn test_managed_dns_renders() {
        let challenges = sample_challenges();
        let selected = select_by_type(&challenges, MANAGED_DNS);
        assert_eq!(selected.len(), 1);

        let display = format(selected[0]);
        assert_eq!(display.record_type, "CNAME");
        assert_eq!(display.record_name, "_acme-challenge.www.example.org");
        assert_eq!(
            display.joined_values,
            "dvxzuc4govtr3juagj.fastly-validations.com"
        );
    }

    #[test]
    fn test_managed_http_cname_renders() {
        let challenges = sample_challenges();
        let display = format(select_by_type(&challenges, MANAGED_HTTP_CNAME)[0]);
        assert_eq!(
            display.to_string(),
            "DNS Record Type: CNAME\n\
             DNS Record Name: www.example.org\n\
             DNS Record value(s): j.sni.global.fastly.net"
        );
    }

    #[test]
    fn test_managed_http_a_renders() {
        let challenges = sample_challenges();
        let selected = select_by_type(&challenges, MANAGED_HTTP_A);
        assert_eq!(selected.len(), 1);

        let display = format(selected[0]);
        assert_eq!(display.record_type, "A");
        assert_eq!(display.record_name, "www.example.org");
        assert_eq!(
            display.joined_values,
            "151.101.2.132, 151.101.66.132, 151.101.130.132, 151.101.194.132"
        );
    }

    #[test]
    fn test_managed_http_a_with_fewer_addresses() {
        let challenges = vec![challenge(
            MANAGED_HTTP_A,
            "A",
            "www.example.org",
            &["151.101.2.132", "151.101.66.132"],
        )];
        let display = RecordDisplay::from(select_by_type(&challenges, MANAGED_HTTP_A)[0]);
        assert_eq!(display.joined_values, "151.101.2.132, 151.101.66.132");
    }

    #[test]
    fn test_select_preserves_order_and_filters_exactly() {
        let challenges = vec![
            challenge(MANAGED_HTTP_A, "A", "a.example.org", &["1.1.1.1"]),
            challenge(MANAGED_DNS, "CNAME", "_acme-challenge.a.example.org", &["x"]),
            challenge(MANAGED_HTTP_A, "A", "b.example.org", &["2.2.2.2"]),
            challenge("managed-http-a-v6", "AAAA", "a.example.org", &["::1"]),
        ];

        let selected = select_by_type(&challenges, MANAGED_HTTP_A);
        let names: Vec<_> = selected.iter().map(|c| c.record_name.as_str()).collect();
        assert_eq!(names, vec!["a.example.org", "b.example.org"]);
    }

    #[test]
    fn test_select_without_match_is_empty() {
        let challenges = sample_challenges();
        assert!(select_by_type(&challenges, "managed-tls-alpn").is_empty());
        assert!(select_by_type(&[], MANAGED_DNS).is_empty());
    }

    #[test]
    fn test_format_without_values() {
        let display = format(&challenge(MANAGED_HTTP_A, "A", "www.example.org", &[]));
        assert_eq!(display.joined_values, "");
    }
}
