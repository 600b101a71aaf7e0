/*
 * Responsibility
 * - Configuration types for the origin admission policy (PolicyConfig, AllowedOrigins, AllowedHeaders)
 * - The two named profiles (strict / permissive)
 * - The verdict type returned by evaluate (AdmissionDecision / AdmissionReason)
 *
 * No HTTP I/O here. Header rendering lives in middleware::cors.
 */
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use axum::http::{Method, StatusCode};
use serde::{Serialize, Serializer};

/// Why a request was admitted or denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AdmissionReason {
    NoOriginHeader,
    DevelopmentLocalMatch,
    AllowListMatch,
    Denied,
}

/// Verdict of a single evaluation.
///
/// `admit` is derived from `reason`, so the two can never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdmissionDecision {
    pub admit: bool,
    pub reason: AdmissionReason,
}

impl AdmissionDecision {
    pub fn from_reason(reason: AdmissionReason) -> Self {
        Self {
            admit: reason != AdmissionReason::Denied,
            reason,
        }
    }
}

/// Origins admitted by exact match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(BTreeSet<String>),
}

impl AllowedOrigins {
    pub fn list<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(origins.into_iter().map(Into::into).collect())
    }

    /// Exact, case-sensitive comparison. No subdomain or scheme folding.
    pub fn matches(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::List(origins) => origins.contains(origin),
        }
    }
}

impl Serialize for AllowedOrigins {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Any => serializer.serialize_str("*"),
            Self::List(origins) => origins.serialize(serializer),
        }
    }
}

/// Request headers a browser may send cross-origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedHeaders {
    Any,
    List(Vec<String>),
}

impl AllowedHeaders {
    pub fn list<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for h in headers.into_iter().map(Into::into) {
            if !out.iter().any(|seen| seen.eq_ignore_ascii_case(&h)) {
                out.push(h);
            }
        }
        Self::List(out)
    }

    /// Value for `Access-Control-Allow-Headers`.
    pub fn header_value(&self) -> String {
        match self {
            Self::Any => "*".to_string(),
            Self::List(headers) => headers.join(", "),
        }
    }
}

impl Serialize for AllowedHeaders {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Any => serializer.serialize_str("*"),
            Self::List(headers) => headers.serialize(serializer),
        }
    }
}

/// The full CORS contract: who is admitted and what the browser is told.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyConfig {
    pub allowed_origins: AllowedOrigins,
    pub allow_credentials: bool,
    #[serde(serialize_with = "serialize_methods")]
    pub allowed_methods: Vec<Method>,
    pub allowed_headers: AllowedHeaders,
    pub exposed_headers: Vec<String>,
    pub max_age_seconds: u64,
    pub preflight_continue: bool,
    #[serde(serialize_with = "serialize_status")]
    pub success_status: StatusCode,
}

impl PolicyConfig {
    /// Explicit allow-list, explicit request headers, credentials on.
    pub fn strict<I, S>(allowed_origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_origins: AllowedOrigins::list(allowed_origins),
            allow_credentials: true,
            allowed_headers: AllowedHeaders::list([
                "Content-Type",
                "Authorization",
                "X-Requested-With",
                "Accept",
                "Origin",
            ]),
            ..Self::shared()
        }
    }

    /// Any origin, any request header. Credentials stay off: browsers ignore
    /// wildcard headers on credentialed requests.
    pub fn permissive() -> Self {
        Self {
            allowed_origins: AllowedOrigins::Any,
            allow_credentials: false,
            allowed_headers: AllowedHeaders::Any,
            ..Self::shared()
        }
    }

    fn shared() -> Self {
        Self {
            allowed_origins: AllowedOrigins::List(BTreeSet::new()),
            allow_credentials: false,
            allowed_methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ],
            allowed_headers: AllowedHeaders::List(Vec::new()),
            exposed_headers: vec![
                "X-Total-Count".to_string(),
                "X-Page-Count".to_string(),
                "Link".to_string(),
            ],
            max_age_seconds: 60 * 60 * 24,
            preflight_continue: false,
            success_status: StatusCode::NO_CONTENT,
        }
    }
}

fn serialize_methods<S: Serializer>(methods: &[Method], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(methods.iter().map(Method::as_str))
}

fn serialize_status<S: Serializer>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u16(status.as_u16())
}

/// Which PolicyConfig a deployment runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorsProfile {
    Strict,
    Permissive,
}

impl FromStr for CorsProfile {
    type Err = UnknownProfile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "permissive" => Ok(Self::Permissive),
            _ => Err(UnknownProfile(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProfile(pub String);

impl fmt::Display for UnknownProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown CORS profile: {}", self.0)
    }
}

impl std::error::Error for UnknownProfile {}
