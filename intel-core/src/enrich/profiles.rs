//! Reference profile sets for the attribution enrichers
//!
//! Profiles are serde-deserializable so deployments can ship their own sets;
//! a built-in set covers the common groups. Malformed profile data is a
//! `Validation` error - callers degrade the affected enricher to an empty
//! match set instead of blocking the batch.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// A named adversary profile: APT group or criminal actor.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ActorProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub malware: Vec<String>,
    #[serde(default)]
    pub techniques: Vec<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub sectors: Vec<String>,
    #[serde(default)]
    pub countries: Vec<String>,
}

/// A ransomware leak-site victim entry.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VictimRecord {
    pub id: String,
    /// Victim organization name as posted.
    pub victim: String,
    /// Ransomware group claiming the victim.
    pub group: String,
    #[serde(default)]
    pub industry: String,
}

/// An indexed paste / dump with its extracted indicators.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PasteRecord {
    pub id: String,
    /// Where the paste was seen (forum, paste site, channel).
    pub source: String,
    #[serde(default)]
    pub ips: Vec<String>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub hashes: Vec<String>,
    #[serde(default)]
    pub cves: Vec<String>,
}

/// Detection severity of a rule, used to weight technique matches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum DetectionSeverity {
    Critical,
    High,
    Medium,
    Low,
}

/// A detection rule mapped to the ATT&CK techniques it covers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionRule {
    pub id: String,
    pub name: String,
    pub techniques: Vec<String>,
    pub severity: DetectionSeverity,
    /// "stable" or "preview"; anything else gets no status bonus.
    #[serde(default)]
    pub status: String,
}

/// A geopolitical context profile: a region of tension, the countries and
/// actors involved, and the vocabulary that signals it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeoProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default)]
    pub sectors: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Everything the five enrichers match against.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfileSet {
    #[serde(default)]
    pub apt_groups: Vec<ActorProfile>,
    #[serde(default)]
    pub actors: Vec<ActorProfile>,
    #[serde(default)]
    pub ransomware_victims: Vec<VictimRecord>,
    #[serde(default)]
    pub pastes: Vec<PasteRecord>,
    #[serde(default)]
    pub detection_rules: Vec<DetectionRule>,
    #[serde(default)]
    pub geo_profiles: Vec<GeoProfile>,
}

impl ProfileSet {
    /// Parse and validate a profile set from JSON.
    pub fn from_json(json: &str) -> PipelineResult<Self> {
        let set: ProfileSet =
            serde_json::from_str(json).map_err(|e| PipelineError::Validation(e.to_string()))?;
        set.validate()?;
        Ok(set)
    }

    /// Reject profile entries that cannot be matched against.
    pub fn validate(&self) -> PipelineResult<()> {
        for p in self.apt_groups.iter().chain(self.actors.iter()) {
            if p.id.trim().is_empty() || p.name.trim().is_empty() {
                return Err(PipelineError::Validation(
                    "actor profile missing id or name".into(),
                ));
            }
        }
        for v in &self.ransomware_victims {
            if v.victim.trim().is_empty() || v.group.trim().is_empty() {
                return Err(PipelineError::Validation(format!(
                    "victim record '{}' missing victim or group",
                    v.id
                )));
            }
        }
        for r in &self.detection_rules {
            if r.techniques.is_empty() {
                return Err(PipelineError::Validation(format!(
                    "detection rule '{}' covers no techniques",
                    r.id
                )));
            }
        }
        for g in &self.geo_profiles {
            if g.name.trim().is_empty() {
                return Err(PipelineError::Validation(format!(
                    "geo profile '{}' missing name",
                    g.id
                )));
            }
        }
        Ok(())
    }

    /// The built-in reference set.
    pub fn builtin() -> Self {
        Self {
            apt_groups: builtin_apt_groups(),
            actors: builtin_actors(),
            ransomware_victims: builtin_victims(),
            pastes: Vec::new(),
            detection_rules: builtin_detection_rules(),
            geo_profiles: builtin_geo_profiles(),
        }
    }
}

fn svec(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn actor(
    id: &str,
    name: &str,
    aliases: &[&str],
    malware: &[&str],
    techniques: &[&str],
    tools: &[&str],
    sectors: &[&str],
    countries: &[&str],
) -> ActorProfile {
    ActorProfile {
        id: id.into(),
        name: name.into(),
        aliases: svec(aliases),
        malware: svec(malware),
        techniques: svec(techniques),
        tools: svec(tools),
        sectors: svec(sectors),
        countries: svec(countries),
    }
}

fn builtin_apt_groups() -> Vec<ActorProfile> {
    vec![
        actor(
            "apt28",
            "APT28",
            &["Fancy Bear", "Sofacy", "Forest Blizzard"],
            &["X-Agent", "Zebrocy", "Drovorub"],
            &["T1566.001", "T1110.003", "T1071.001"],
            &["Mimikatz", "Responder"],
            &["government", "defense", "media"],
            &["Ukraine", "Germany", "United States", "Georgia"],
        ),
        actor(
            "apt29",
            "APT29",
            &["Cozy Bear", "Nobelium", "Midnight Blizzard"],
            &["SUNBURST", "WellMess", "MagicWeb"],
            &["T1195.002", "T1078.004", "T1552.004"],
            &["AdFind", "Sliver"],
            &["government", "diplomacy", "technology"],
            &["United States", "United Kingdom", "Norway"],
        ),
        actor(
            "lazarus",
            "Lazarus Group",
            &["Hidden Cobra", "Diamond Sleet"],
            &["AppleJeus", "BLINDINGCAN", "DTrack"],
            &["T1566.002", "T1204.002", "T1055"],
            &["3proxy"],
            &["cryptocurrency", "finance", "defense"],
            &["South Korea", "United States", "Japan"],
        ),
        actor(
            "apt41",
            "APT41",
            &["Double Dragon", "Wicked Panda"],
            &["ShadowPad", "PlugX", "Winnti"],
            &["T1190", "T1133", "T1059.003"],
            &["Cobalt Strike", "China Chopper"],
            &["healthcare", "telecommunications", "gaming"],
            &["United States", "Taiwan", "India"],
        ),
        actor(
            "sandworm",
            "Sandworm",
            &["Voodoo Bear", "Seashell Blizzard"],
            &["Industroyer", "NotPetya", "Cyclops Blink"],
            &["T1485", "T1490", "T1562.001"],
            &["Impacket"],
            &["energy", "government", "transportation"],
            &["Ukraine", "Poland"],
        ),
        actor(
            "mustang-panda",
            "Mustang Panda",
            &["Bronze President", "Stately Taurus"],
            &["PlugX", "Korplug"],
            &["T1566.001", "T1091"],
            &[],
            &["government", "ngo"],
            &["Myanmar", "Vietnam", "Philippines", "Mongolia"],
        ),
    ]
}

fn builtin_actors() -> Vec<ActorProfile> {
    vec![
        actor(
            "fin7",
            "FIN7",
            &["Carbanak Group", "Sangria Tempest"],
            &["Carbanak", "Griffon", "Diceloader"],
            &["T1566.001", "T1059.007"],
            &["Cobalt Strike"],
            &["retail", "hospitality", "finance"],
            &["United States"],
        ),
        actor(
            "wizard-spider",
            "Wizard Spider",
            &["Trickbot Group", "Periwinkle Tempest"],
            &["TrickBot", "Conti", "Ryuk", "BazarLoader"],
            &["T1486", "T1021.002"],
            &["Cobalt Strike", "AdFind"],
            &["healthcare", "manufacturing", "government"],
            &["United States", "United Kingdom", "Ireland"],
        ),
        actor(
            "scattered-spider",
            "Scattered Spider",
            &["Octo Tempest", "0ktapus", "UNC3944"],
            &["ALPHV"],
            &["T1621", "T1656", "T1078.004"],
            &[],
            &["hospitality", "telecommunications", "gaming"],
            &["United States", "United Kingdom"],
        ),
        actor(
            "ta505",
            "TA505",
            &["Spandex Tempest"],
            &["Clop", "Dridex", "SDBbot"],
            &["T1190", "T1566.001"],
            &[],
            &["finance", "retail", "education"],
            &["United States", "Germany", "South Korea"],
        ),
    ]
}

fn builtin_victims() -> Vec<VictimRecord> {
    vec![
        VictimRecord {
            id: "v-0001".into(),
            victim: "Meridian Health Partners".into(),
            group: "LockBit".into(),
            industry: "healthcare".into(),
        },
        VictimRecord {
            id: "v-0002".into(),
            victim: "Northwind Logistics".into(),
            group: "ALPHV".into(),
            industry: "transportation".into(),
        },
        VictimRecord {
            id: "v-0003".into(),
            victim: "Cascade Credit Union".into(),
            group: "Play".into(),
            industry: "finance".into(),
        },
    ]
}

fn builtin_detection_rules() -> Vec<DetectionRule> {
    fn rule(
        id: &str,
        name: &str,
        techniques: &[&str],
        severity: DetectionSeverity,
        status: &str,
    ) -> DetectionRule {
        DetectionRule {
            id: id.into(),
            name: name.into(),
            techniques: svec(techniques),
            severity,
            status: status.into(),
        }
    }

    vec![
        rule("DR-001", "Phishing Attachment Execution", &["T1566.001", "T1204.002"], DetectionSeverity::Critical, "stable"),
        rule("DR-002", "LSASS Credential Dumping", &["T1003.001"], DetectionSeverity::Critical, "stable"),
        rule("DR-003", "Encoded PowerShell Command", &["T1059.001"], DetectionSeverity::High, "stable"),
        rule("DR-004", "Public-Facing Application Exploit", &["T1190"], DetectionSeverity::High, "preview"),
        rule("DR-005", "Shadow Copy Deletion", &["T1490"], DetectionSeverity::Critical, "stable"),
        rule("DR-006", "Data Encrypted for Impact", &["T1486"], DetectionSeverity::High, "stable"),
        rule("DR-007", "Valid Cloud Account Abuse", &["T1078.004"], DetectionSeverity::Medium, "preview"),
        rule("DR-008", "Remote Services Lateral Movement", &["T1021.002"], DetectionSeverity::Medium, "stable"),
        rule("DR-009", "Ingress Tool Transfer", &["T1105"], DetectionSeverity::Low, "stable"),
    ]
}

fn builtin_geo_profiles() -> Vec<GeoProfile> {
    fn geo(
        id: &str,
        name: &str,
        countries: &[&str],
        actors: &[&str],
        sectors: &[&str],
        keywords: &[&str],
    ) -> GeoProfile {
        GeoProfile {
            id: id.into(),
            name: name.into(),
            countries: svec(countries),
            actors: svec(actors),
            sectors: svec(sectors),
            keywords: svec(keywords),
        }
    }

    vec![
        geo(
            "geo-ru-ua",
            "Russia-Ukraine conflict",
            &["Russia", "Ukraine", "Belarus", "Poland"],
            &["APT28", "Sandworm", "Gamaredon"],
            &["energy", "government", "defense"],
            &["wiper", "ddos", "disinformation"],
        ),
        geo(
            "geo-cn-tw",
            "Taiwan strait tensions",
            &["China", "Taiwan", "Philippines", "Vietnam"],
            &["APT41", "Mustang Panda", "Volt Typhoon"],
            &["telecommunications", "semiconductors", "government"],
            &["prepositioning", "espionage"],
        ),
        geo(
            "geo-kp",
            "Korean peninsula",
            &["North Korea", "South Korea", "Japan"],
            &["Lazarus", "Kimsuky", "Andariel"],
            &["cryptocurrency", "finance", "defense"],
            &["sanctions evasion", "exchange theft"],
        ),
        geo(
            "geo-me",
            "Middle East tensions",
            &["Iran", "Israel", "Saudi Arabia", "United Arab Emirates"],
            &["APT33", "APT34", "MuddyWater"],
            &["energy", "water", "government"],
            &["wiper", "hacktivist"],
        ),
    ]
}

// ============================================================================
// TESTS
// ============================================================================
