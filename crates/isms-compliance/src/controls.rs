//! ISO 27001:2022 Annex A Catalog

use serde::{Deserialize, Serialize};

/// Number of Annex A controls
pub const ANNEX_A_CONTROL_COUNT: usize = 93;

/// Annex A theme (clauses 5 to 8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlTheme {
    Organizational,
    People,
    Physical,
    Technological,
}

impl std::fmt::Display for ControlTheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Organizational => write!(f, "Organizational"),
            Self::People => write!(f, "People"),
            Self::Physical => write!(f, "Physical"),
            Self::Technological => write!(f, "Technological"),
        }
    }
}

/// Annex A control definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnexAControl {
    pub id: &'static str,
    pub name: &'static str,
    pub theme: ControlTheme,
}

const fn control(id: &'static str, name: &'static str, theme: ControlTheme) -> AnnexAControl {
    AnnexAControl { id, name, theme }
}

/// Controls every ISMS declares applicable regardless of risk treatment
pub const MANDATORY_CONTROLS: &[&str] = &[
    "A.5.1", "A.5.2", "A.5.4", "A.5.9", "A.5.15", "A.5.24", "A.5.31", "A.5.35", "A.5.36", "A.6.3",
];

/// All Annex A controls in catalog order
pub static ANNEX_A: [AnnexAControl; ANNEX_A_CONTROL_COUNT] = [
    // A.5 - Organizational controls
    control("A.5.1", "Policies for information security", ControlTheme::Organizational),
    control("A.5.2", "Information security roles and responsibilities", ControlTheme::Organizational),
    control("A.5.3", "Segregation of duties", ControlTheme::Organizational),
    control("A.5.4", "Management responsibilities", ControlTheme::Organizational),
    control("A.5.5", "Contact with authorities", ControlTheme::Organizational),
    control("A.5.6", "Contact with special interest groups", ControlTheme::Organizational),
    control("A.5.7", "Threat intelligence", ControlTheme::Organizational),
    control("A.5.8", "Information security in project management", ControlTheme::Organizational),
    control("A.5.9", "Inventory of information and other associated assets", ControlTheme::Organizational),
    control("A.5.10", "Acceptable use of information and other associated assets", ControlTheme::Organizational),
    control("A.5.11", "Return of assets", ControlTheme::Organizational),
    control("A.5.12", "Classification of information", ControlTheme::Organizational),
    control("A.5.13", "Labelling of information", ControlTheme::Organizational),
    control("A.5.14", "Information transfer", ControlTheme::Organizational),
    control("A.5.15", "Access control", ControlTheme::Organizational),
    control("A.5.16", "Identity management", ControlTheme::Organizational),
    control("A.5.17", "Authentication information", ControlTheme::Organizational),
    control("A.5.18", "Access rights", ControlTheme::Organizational),
    control("A.5.19", "Information security in supplier relationships", ControlTheme::Organizational),
    control("A.5.20", "Addressing information security within supplier agreements", ControlTheme::Organizational),
    control("A.5.21", "Managing information security in the ICT supply chain", ControlTheme::Organizational),
    control("A.5.22", "Monitoring, review and change management of supplier services", ControlTheme::Organizational),
    control("A.5.23", "Information security for use of cloud services", ControlTheme::Organizational),
    control("A.5.24", "Information security incident management planning and preparation", ControlTheme::Organizational),
    control("A.5.25", "Assessment and decision on information security events", ControlTheme::Organizational),
    control("A.5.26", "Response to information security incidents", ControlTheme::Organizational),
    control("A.5.27", "Learning from information security incidents", ControlTheme::Organizational),
    control("A.5.28", "Collection of evidence", ControlTheme::Organizational),
    control("A.5.29", "Information security during disruption", ControlTheme::Organizational),
    control("A.5.30", "ICT readiness for business continuity", ControlTheme::Organizational),
    control("A.5.31", "Legal, statutory, regulatory and contractual requirements", ControlTheme::Organizational),
    control("A.5.32", "Intellectual property rights", ControlTheme::Organizational),
    control("A.5.33", "Protection of records", ControlTheme::Organizational),
    control("A.5.34", "Privacy and protection of PII", ControlTheme::Organizational),
    control("A.5.35", "Independent review of information security", ControlTheme::Organizational),
    control("A.5.36", "Compliance with policies, rules and standards for information security", ControlTheme::Organizational),
    control("A.5.37", "Documented operating procedures", ControlTheme::Organizational),
    // A.6 - People controls
    control("A.6.1", "Screening", ControlTheme::People),
    control("A.6.2", "Terms and conditions of employment", ControlTheme::People),
    control("A.6.3", "Information security awareness, education and training", ControlTheme::People),
    control("A.6.4", "Disciplinary process", ControlTheme::People),
    control("A.6.5", "Responsibilities after termination or change of employment", ControlTheme::People),
    control("A.6.6", "Confidentiality or non-disclosure agreements", ControlTheme::People),
    control("A.6.7", "Remote working", ControlTheme::People),
    control("A.6.8", "Information security event reporting", ControlTheme::People),
    // A.7 - Physical controls
    control("A.7.1", "Physical security perimeters", ControlTheme::Physical),
    control("A.7.2", "Physical entry", ControlTheme::Physical),
    control("A.7.3", "Securing offices, rooms and facilities", ControlTheme::Physical),
    control("A.7.4", "Physical security monitoring", ControlTheme::Physical),
    control("A.7.5", "Protecting against physical and environmental threats", ControlTheme::Physical),
    control("A.7.6", "Working in secure areas", ControlTheme::Physical),
    control("A.7.7", "Clear desk and clear screen", ControlTheme::Physical),
    control("A.7.8", "Equipment siting and protection", ControlTheme::Physical),
    control("A.7.9", "Security of assets off-premises", ControlTheme::Physical),
    control("A.7.10", "Storage media", ControlTheme::Physical),
    control("A.7.11", "Supporting utilities", ControlTheme::Physical),
    control("A.7.12", "Cabling security", ControlTheme::Physical),
    control("A.7.13", "Equipment maintenance", ControlTheme::Physical),
    control("A.7.14", "Secure disposal or re-use of equipment", ControlTheme::Physical),
    // A.8 - Technological controls
    control("A.8.1", "User endpoint devices", ControlTheme::Technological),
    control("A.8.2", "Privileged access rights", ControlTheme::Technological),
    control("A.8.3", "Information access restriction", ControlTheme::Technological),
    control("A.8.4", "Access to source code", ControlTheme::Technological),
    control("A.8.5", "Secure authentication", ControlTheme::Technological),
    control("A.8.6", "Capacity management", ControlTheme::Technological),
    control("A.8.7", "Protection against malware", ControlTheme::Technological),
    control("A.8.8", "Management of technical vulnerabilities", ControlTheme::Technological),
    control("A.8.9", "Configuration management", ControlTheme::Technological),
    control("A.8.10", "Information deletion", ControlTheme::Technological),
    control("A.8.11", "Data masking", ControlTheme::Technological),
    control("A.8.12", "Data leakage prevention", ControlTheme::Technological),
    control("A.8.13", "Information backup", ControlTheme::Technological),
    control("A.8.14", "Redundancy of information processing facilities", ControlTheme::Technological),
    control("A.8.15", "Logging", ControlTheme::Technological),
    control("A.8.16", "Monitoring activities", ControlTheme::Technological),
    control("A.8.17", "Clock synchronization", ControlTheme::Technological),
    control("A.8.18", "Use of privileged utility programs", ControlTheme::Technological),
    control("A.8.19", "Installation of software on operational systems", ControlTheme::Technological),
    control("A.8.20", "Networks security", ControlTheme::Technological),
    control("A.8.21", "Security of network services", ControlTheme::Technological),
    control("A.8.22", "Segregation of networks", ControlTheme::Technological),
    control("A.8.23", "Web filtering", ControlTheme::Technological),
    control("A.8.24", "Use of cryptography", ControlTheme::Technological),
    control("A.8.25", "Secure development life cycle", ControlTheme::Technological),
    control("A.8.26", "Application security requirements", ControlTheme::Technological),
    control("A.8.27", "Secure system architecture and engineering principles", ControlTheme::Technological),
    control("A.8.28", "Secure coding", ControlTheme::Technological),
    control("A.8.29", "Security testing in development and acceptance", ControlTheme::Technological),
    control("A.8.30", "Outsourced development", ControlTheme::Technological),
    control("A.8.31", "Separation of development, test and production environments", ControlTheme::Technological),
    control("A.8.32", "Change management", ControlTheme::Technological),
    control("A.8.33", "Test information", ControlTheme::Technological),
    control("A.8.34", "Protection of information systems during audit testing", ControlTheme::Technological),
];

/// Look up control by id
pub fn find(id: &str) -> Option<&'static AnnexAControl> {
    ANNEX_A.iter().find(|c| c.id == id)
}

/// Whether `id` is an Annex A control id
pub fn is_known(id: &str) -> bool {
    find(id).is_some()
}

/// Whether `id` is in [`MANDATORY_CONTROLS`]
pub fn is_mandatory(id: &str) -> bool {
    MANDATORY_CONTROLS.contains(&id)
}

/// Controls of one theme
pub fn by_theme(theme: ControlTheme) -> impl Iterator<Item = &'static AnnexAControl> {
    ANNEX_A.iter().filter(move |c| c.theme == theme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_has_93_unique_ids() {
        let ids: HashSet<_> = ANNEX_A.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), ANNEX_A_CONTROL_COUNT);
    }

    #[test]
    fn test_theme_sizes() {
        assert_eq!(by_theme(ControlTheme::Organizational).count(), 37);
        assert_eq!(by_theme(ControlTheme::People).count(), 8);
        assert_eq!(by_theme(ControlTheme::Physical).count(), 14);
        assert_eq!(by_theme(ControlTheme::Technological).count(), 34);
    }

    #[test]
    fn test_mandatory_controls_exist() {
        assert!(MANDATORY_CONTROLS.iter().all(|id| is_known(id)));
        assert_eq!(find("A.8.15").map(|c| c.name), Some("Logging"));
        assert!(!is_known("A.9.1"));
    }
}
