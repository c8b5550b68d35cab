//! Scoring rule tables
//!
//! Every constant the base and enhanced scorers consume lives here so the
//! scoring policy can be read (and reviewed) in one place.

// ============================================================================
// BASE SCORE BUCKETS
// ============================================================================

// Indicator chain (first match wins, cap 40)
pub const KEV_SCORE: u32 = 40;
pub const ZERO_DAY_SCORE: u32 = 30;
pub const CVE_SCORE: u32 = 20;
// Independent of the chain above
pub const MITRE_SCORE: u32 = 10;

// Exploitability (first match wins, cap 30)
pub const ACTIVE_EXPLOITATION_SCORE: u32 = 30;
pub const EXPLOIT_KIT_SCORE: u32 = 20;
pub const POC_SCORE: u32 = 15;

// Temporal (cap 20)
pub const FRESH_24H_SCORE: u32 = 20;
pub const FRESH_7D_SCORE: u32 = 15;
pub const FRESH_30D_SCORE: u32 = 10;
pub const STALE_SCORE: u32 = 5;

// Threat type (first match in priority order, cap 10)
pub const RANSOMWARE_SCORE: u32 = 10;
pub const APT_SCORE: u32 = 8;
pub const MALWARE_SCORE: u32 = 6;
pub const EXPLOIT_SCORE: u32 = 6;
pub const PHISHING_SCORE: u32 = 4;

// ============================================================================
// TEXT PATTERNS
// ============================================================================

pub const ACTIVE_EXPLOITATION_PATTERNS: &[&str] = &[
    "actively exploited",
    "active exploitation",
    "exploited in the wild",
    "exploitation in the wild",
    "under exploitation",
];

pub const EXPLOIT_KIT_NAMES: &[&str] = &[
    "metasploit",
    "cobalt strike",
    "exploit kit",
    "angler",
    "rig ek",
    "magnitude ek",
];

pub const POC_PATTERNS: &[&str] = &[
    "proof of concept",
    "proof-of-concept",
    "poc released",
    "poc available",
    "poc exploit",
    "public exploit",
];

// ============================================================================
// SOURCE CREDIBILITY
// ============================================================================

pub const GOV_MULTIPLIER: f64 = 1.2;
pub const VENDOR_MULTIPLIER: f64 = 1.1;
pub const NEWS_MULTIPLIER: f64 = 1.0;
pub const UNKNOWN_MULTIPLIER: f64 = 0.9;

pub const GOV_SOURCE_KEYWORDS: &[&str] = &[
    "cisa", "us-cert", "cert", "nist", "nvd", "fbi", "nsa", "ncsc", ".gov",
];

pub const VENDOR_SOURCE_KEYWORDS: &[&str] = &[
    "microsoft",
    "google",
    "cisco",
    "palo alto",
    "crowdstrike",
    "mandiant",
    "talos",
    "recorded future",
    "sentinelone",
    "rapid7",
    "tenable",
    "research",
    "labs",
];

pub const NEWS_SOURCE_KEYWORDS: &[&str] = &[
    "bleeping",
    "hacker news",
    "krebs",
    "dark reading",
    "securityweek",
    "threatpost",
    "the record",
];

/// Fixed allowlist for the GOV-CONFIRMED bonus (matched case-insensitively
/// by substring against merged source names).
pub const GOV_ALLOWLIST: &[&str] = &["cisa", "us-cert", "ncsc", "nist", "nvd", "fbi"];

// ============================================================================
// ENHANCED SCORE BONUSES
// ============================================================================

pub const MULTI_SOURCE_BONUS: u32 = 10;
pub const MULTI_SOURCE_MIN: usize = 3;
pub const GOV_CONFIRMED_BONUS: u32 = 15;
pub const GOV_CONFIRMED_MIN: usize = 2;
pub const CRITICAL_COMBO_BONUS: u32 = 20;
pub const RANSOMWARE_CRITICAL_BONUS: u32 = 15;
pub const RANSOMWARE_CRITICAL_SCORE_MIN: u32 = 90;
pub const TRENDING_BONUS: u32 = 5;
pub const TRENDING_RELATED_MIN: usize = 3;

// ============================================================================
// SEVERITY THRESHOLDS
// ============================================================================

// Base phase
pub const BASE_CRITICAL_MIN: u32 = 90;
pub const BASE_HIGH_MIN: u32 = 70;
pub const BASE_MEDIUM_MIN: u32 = 40;

// Enhanced phase
pub const ENHANCED_CRITICAL_MIN: u32 = 95;
pub const ENHANCED_HIGH_MIN: u32 = 85;
pub const ENHANCED_MEDIUM_MIN: u32 = 70;
pub const ENHANCED_LOW_MIN: u32 = 40;
