use super::*;

fn org(name: &str, localities: Option<&[&str]>) -> OrganizationTarget {
    OrganizationTarget {
        name: name.to_string(),
        localities: localities.map(|l| l.iter().map(ToString::to_string).collect()),
    }
}

#[test]
fn parses_minimal_file() {
    let yaml = r"
organizations:
  - name: CIH Bank
";
    let targets = parse_targets(yaml).unwrap();
    assert_eq!(targets.organizations.len(), 1);
    assert!(targets.default_localities.is_empty());
    assert!(targets.country.is_none());
}

#[test]
fn parses_full_file() {
    let yaml = r"
country: Morocco
default_localities: [Rabat, Casablanca]
organizations:
  - name: CIH Bank
  - name: Attijariwafa Bank
    localities: [Tanger]
";
    let targets = parse_targets(yaml).unwrap();
    assert_eq!(targets.country.as_deref(), Some("Morocco"));
    let cih = &targets.organizations[0];
    let awb = &targets.organizations[1];
    assert_eq!(targets.localities_for(cih), ["Rabat", "Casablanca"]);
    assert_eq!(targets.localities_for(awb), ["Tanger"]);
}

#[test]
fn validate_rejects_empty_organization_list() {
    let targets = TargetsFile {
        organizations: vec![],
        default_localities: vec![],
        country: None,
    };
    let err = validate_targets(&targets).unwrap_err();
    assert!(err.to_string().contains("at least one organization"));
}

#[test]
fn validate_rejects_blank_name() {
    let targets = TargetsFile {
        organizations: vec![org("  ", None)],
        default_localities: vec![],
        country: None,
    };
    let err = validate_targets(&targets).unwrap_err();
    assert!(err.to_string().contains("non-empty"));
}

#[test]
fn validate_rejects_duplicate_name_ignoring_case() {
    let targets = TargetsFile {
        organizations: vec![org("CIH Bank", None), org("cih bank", None)],
        default_localities: vec![],
        country: None,
    };
    let err = validate_targets(&targets).unwrap_err();
    assert!(err.to_string().contains("duplicate organization"));
}

#[test]
fn validate_rejects_blank_locality() {
    let targets = TargetsFile {
        organizations: vec![org("CIH Bank", Some(&["Rabat", ""]))],
        default_localities: vec![],
        country: None,
    };
    let err = validate_targets(&targets).unwrap_err();
    assert!(err.to_string().contains("blank locality"));
}

#[test]
fn explicit_empty_localities_override_defaults() {
    let targets = TargetsFile {
        organizations: vec![org("CIH Bank", Some(&[]))],
        default_localities: vec!["Rabat".to_string()],
        country: None,
    };
    assert!(targets.localities_for(&targets.organizations[0]).is_empty());
}

#[test]
fn filtered_keeps_matching_organization_only() {
    let targets = TargetsFile {
        organizations: vec![org("CIH Bank", None), org("Bank of Africa", None)],
        default_localities: vec![],
        country: None,
    }
    .filtered("bank of africa");
    assert_eq!(targets.organizations.len(), 1);
    assert_eq!(targets.organizations[0].name, "Bank of Africa");
}

#[test]
fn load_targets_reports_missing_file() {
    let err = load_targets(std::path::Path::new("/nonexistent/targets.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::TargetsFileIo { .. }));
}

#[test]
fn shipped_targets_file_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/targets.yaml");
    let targets = load_targets(&path).unwrap();

    let popular = targets
        .organizations
        .iter()
        .find(|o| o.name == "Banque Populaire")
        .unwrap();
    assert_eq!(targets.localities_for(popular), ["Casablanca", "Rabat"]);
    assert_eq!(targets.country.as_deref(), Some("Morocco"));
}
