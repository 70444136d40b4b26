//! Assets, Threats and Vulnerabilities
//!
//! Identifiers are derived from names with a 32-bit string hash, so selecting
//! the same predefined entry twice yields the same id. The hash is not
//! collision resistant: two different names can map to the same id.

use serde::{Deserialize, Serialize};

/// Asset type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetType {
    #[default]
    Information,
    Physical,
    Software,
    Human,
}

/// Information classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    Public,
    #[default]
    Internal,
    Confidential,
    Restricted,
}

/// Business value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetValue {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

macro_rules! kebab_from_str {
    ($ty:ty, $($name:literal => $variant:expr),+ $(,)?) => {
        impl std::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok($variant),)+
                    _ => Err(format!(concat!("unknown ", stringify!($ty), " '{}'"), s)),
                }
            }
        }
    };
}

kebab_from_str!(AssetType,
    "information" => AssetType::Information,
    "physical" => AssetType::Physical,
    "software" => AssetType::Software,
    "human" => AssetType::Human,
);
kebab_from_str!(Classification,
    "public" => Classification::Public,
    "internal" => Classification::Internal,
    "confidential" => Classification::Confidential,
    "restricted" => Classification::Restricted,
);
kebab_from_str!(AssetValue,
    "low" => AssetValue::Low,
    "medium" => AssetValue::Medium,
    "high" => AssetValue::High,
    "critical" => AssetValue::Critical,
);

/// Asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub classification: Classification,
    #[serde(default)]
    pub value: AssetValue,
}

impl Asset {
    /// Create asset with name-derived id
    pub fn new(name: &str, asset_type: AssetType) -> Self {
        Self {
            id: asset_id(name),
            name: name.to_string(),
            asset_type,
            description: String::new(),
            owner: String::new(),
            classification: Classification::default(),
            value: AssetValue::default(),
        }
    }
}

/// Threat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Threat {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
}

impl Threat {
    pub fn new(name: &str, description: &str, category: &str) -> Self {
        Self {
            id: threat_id(name),
            name: name.to_string(),
            description: description.to_string(),
            category: category.to_string(),
        }
    }
}

/// Vulnerability of one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vulnerability {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub asset_id: String,
    #[serde(default)]
    pub threat_ids: Vec<String>,
}

impl Vulnerability {
    pub fn new(asset_id: &str, name: &str, description: &str) -> Self {
        Self {
            id: vulnerability_id(asset_id, name),
            name: name.to_string(),
            description: description.to_string(),
            asset_id: asset_id.to_string(),
            threat_ids: Vec::new(),
        }
    }
}

/// 32-bit string hash (`h = h * 31 + c`, wrapping), as an unsigned magnitude
pub fn name_hash(name: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in name.encode_utf16() {
        hash = hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(unit as i32);
    }
    hash.unsigned_abs()
}

fn base36(mut n: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".into();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Name-derived id with a type prefix
pub fn derive_id(prefix: &str, name: &str) -> String {
    format!("{}-{}", prefix, base36(name_hash(name.trim())))
}

pub fn asset_id(name: &str) -> String {
    derive_id("asset", name)
}

pub fn threat_id(name: &str) -> String {
    derive_id("threat", name)
}

/// Vulnerability ids are scoped to their asset
pub fn vulnerability_id(asset_id: &str, name: &str) -> String {
    derive_id("vuln", &format!("{}:{}", asset_id, name.trim()))
}

// =============================================================================
// Catalog
// =============================================================================

/// Predefined asset template
#[derive(Debug, Clone, Copy)]
pub struct PredefinedAsset {
    pub name: &'static str,
    pub asset_type: AssetType,
    pub description: &'static str,
    pub classification: Classification,
    pub value: AssetValue,
}

impl PredefinedAsset {
    pub fn to_asset(&self) -> Asset {
        Asset {
            description: self.description.to_string(),
            classification: self.classification,
            value: self.value,
            ..Asset::new(self.name, self.asset_type)
        }
    }
}

/// (name, description, category)
type ThreatEntry = (&'static str, &'static str, &'static str);

pub const PREDEFINED_ASSETS: &[PredefinedAsset] = &[
    PredefinedAsset {
        name: "Customer Database",
        asset_type: AssetType::Information,
        description: "Customer records and contact details",
        classification: Classification::Confidential,
        value: AssetValue::Critical,
    },
    PredefinedAsset {
        name: "Financial Records",
        asset_type: AssetType::Information,
        description: "Accounting ledgers, invoices and payroll",
        classification: Classification::Restricted,
        value: AssetValue::High,
    },
    PredefinedAsset {
        name: "Web Application",
        asset_type: AssetType::Software,
        description: "Customer-facing web application",
        classification: Classification::Internal,
        value: AssetValue::High,
    },
    PredefinedAsset {
        name: "Email System",
        asset_type: AssetType::Software,
        description: "Corporate email and calendaring",
        classification: Classification::Internal,
        value: AssetValue::Medium,
    },
    PredefinedAsset {
        name: "Servers",
        asset_type: AssetType::Physical,
        description: "On-premises server hardware",
        classification: Classification::Internal,
        value: AssetValue::High,
    },
    PredefinedAsset {
        name: "Laptops",
        asset_type: AssetType::Physical,
        description: "Employee endpoint devices",
        classification: Classification::Internal,
        value: AssetValue::Medium,
    },
    PredefinedAsset {
        name: "IT Staff",
        asset_type: AssetType::Human,
        description: "Administrators with privileged access",
        classification: Classification::Internal,
        value: AssetValue::High,
    },
];

const THREATS_BY_ASSET: &[(&str, &[ThreatEntry])] = &[
    ("Customer Database", &[
        ("Data breach", "Unauthorized disclosure of stored records", "Confidentiality"),
        ("SQL injection", "Malicious queries through application inputs", "Technical"),
        ("Insider misuse", "Authorized users abusing access", "Human"),
        ("Data corruption", "Loss of integrity through faults or tampering", "Integrity"),
    ]),
    ("Financial Records", &[
        ("Fraud", "Manipulation of records for financial gain", "Integrity"),
        ("Data breach", "Unauthorized disclosure of stored records", "Confidentiality"),
        ("Accidental deletion", "Records removed by mistake", "Human"),
    ]),
    ("Web Application", &[
        ("Denial of service", "Service made unavailable by excessive load", "Availability"),
        ("Cross-site scripting", "Injected scripts executing in user browsers", "Technical"),
        ("SQL injection", "Malicious queries through application inputs", "Technical"),
    ]),
    ("Email System", &[
        ("Phishing", "Deceptive messages harvesting credentials", "Social engineering"),
        ("Malware", "Malicious software delivered through attachments", "Technical"),
        ("Account takeover", "Mailbox access with stolen credentials", "Technical"),
    ]),
    ("Servers", &[
        ("Hardware failure", "Component failure causing outage", "Availability"),
        ("Physical theft", "Removal of equipment from premises", "Physical"),
        ("Power outage", "Loss of supporting utilities", "Environmental"),
    ]),
    ("Laptops", &[
        ("Device theft", "Loss of portable equipment", "Physical"),
        ("Malware", "Malicious software delivered through attachments", "Technical"),
    ]),
    ("IT Staff", &[
        ("Social engineering", "Manipulation of staff into revealing information", "Social engineering"),
        ("Human error", "Mistakes in operation or configuration", "Human"),
        ("Key person dependency", "Knowledge concentrated in few individuals", "Organizational"),
    ]),
];

const GENERIC_THREATS: &[ThreatEntry] = &[
    ("Unauthorized access", "Access by persons without authorization", "Technical"),
    ("Human error", "Mistakes in operation or configuration", "Human"),
    ("Malware", "Malicious software delivered through attachments", "Technical"),
    ("Natural disaster", "Fire, flood or other environmental events", "Environmental"),
];

/// (name, description) per threat name
const VULNERABILITIES_BY_THREAT: &[(&str, &[(&str, &str)])] = &[
    ("Data breach", &[
        ("Unencrypted data at rest", "Stored data readable without keys"),
        ("Excessive access rights", "Users hold more privileges than needed"),
    ]),
    ("SQL injection", &[("Unvalidated input", "User input reaches queries unchanged")]),
    ("Insider misuse", &[("Missing activity monitoring", "Privileged actions are not logged or reviewed")]),
    ("Phishing", &[("Insufficient awareness training", "Staff cannot recognise deceptive messages")]),
    ("Malware", &[
        ("Outdated anti-malware", "Signatures or engines not current"),
        ("Unpatched software", "Known vulnerabilities left open"),
    ]),
    ("Denial of service", &[("No rate limiting", "Requests are not throttled")]),
    ("Hardware failure", &[("No redundancy", "Single points of failure in hardware")]),
    ("Device theft", &[("No full-disk encryption", "Lost devices expose stored data")]),
    ("Human error", &[("Undocumented procedures", "Operators rely on memory")]),
];

const GENERIC_VULNERABILITIES: &[(&str, &str)] = &[
    ("Weak access control", "Access is not restricted by need"),
    ("Lack of backups", "Data cannot be restored after loss"),
];

/// Predefined asset by name
pub fn predefined_asset(name: &str) -> Option<&'static PredefinedAsset> {
    PREDEFINED_ASSETS.iter().find(|a| a.name.eq_ignore_ascii_case(name))
}

/// Threats suggested for an asset: the mapped list for predefined names,
/// the generic list otherwise
pub fn suggest_threats(asset: &Asset) -> Vec<Threat> {
    THREATS_BY_ASSET
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(&asset.name))
        .map(|(_, threats)| *threats)
        .unwrap_or(GENERIC_THREATS)
        .iter()
        .map(|(name, desc, cat)| Threat::new(name, desc, cat))
        .collect()
}

/// Vulnerabilities suggested for an asset exposed to `threat`
pub fn suggest_vulnerabilities(asset: &Asset, threat: &Threat) -> Vec<Vulnerability> {
    VULNERABILITIES_BY_THREAT
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(&threat.name))
        .map(|(_, vulns)| *vulns)
        .unwrap_or(GENERIC_VULNERABILITIES)
        .iter()
        .map(|(name, desc)| {
            let mut v = Vulnerability::new(&asset.id, name, desc);
            v.threat_ids.push(threat.id.clone());
            v
        })
        .collect()
}
