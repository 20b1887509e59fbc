//! Company de-duplication audit.
//!
//! # Usage
//!
//! ```bash
//! pos-cli audit-companies
//! ```
//!
//! Lists companies sharing a lowercase-trimmed name, and companies whose
//! names only collide once normalized ("Acme POS" and "acme's"). Each
//! company is shown with its user count so the survivor of a merge is easy
//! to pick.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use pos_dashboard_core::names::{company_dedup_key, normalize_company_name};
use tracing::{info, instrument, warn};

use crate::supabase::{CompanyRecord, SupabaseClient, SupabaseError, USER_COUNTS_RPC};

/// Companies sharing one lowercase-trimmed name, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub key: String,
    pub companies: Vec<CompanyRecord>,
}

/// Distinct names that normalize to the same canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NearDuplicateGroup {
    pub canonical: String,
    /// Lowercase-trimmed names, sorted.
    pub names: Vec<String>,
}

/// How user counts were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCountSource {
    /// One call to the aggregate RPC.
    Aggregate,
    /// One profiles query per company.
    PerCompany,
}

/// Result of an audit run.
#[derive(Debug, Clone)]
pub struct AuditReport {
    pub total: usize,
    pub duplicates: Vec<DuplicateGroup>,
    pub near_duplicates: Vec<NearDuplicateGroup>,
    pub user_counts: HashMap<String, u64>,
    pub source: UserCountSource,
}

/// Group companies by lowercase-trimmed name, keeping groups of two or more.
///
/// Groups are ordered by key; companies within a group by creation time.
#[must_use]
pub fn find_duplicates(companies: &[CompanyRecord]) -> Vec<DuplicateGroup> {
    let mut groups: BTreeMap<String, Vec<CompanyRecord>> = BTreeMap::new();
    for company in companies {
        groups
            .entry(company_dedup_key(company.name()))
            .or_default()
            .push(company.clone());
    }

    groups
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(key, mut members)| {
            members.sort_by_key(|c| c.created_at);
            DuplicateGroup {
                key,
                companies: members,
            }
        })
        .collect()
}

/// Find distinct exact names that share a normalized form.
///
/// Names that normalize to an empty string are skipped.
#[must_use]
pub fn find_near_duplicates(companies: &[CompanyRecord]) -> Vec<NearDuplicateGroup> {
    let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for company in companies {
        let canonical = normalize_company_name(Some(company.name()));
        if canonical.is_empty() {
            continue;
        }
        groups
            .entry(canonical)
            .or_default()
            .insert(company_dedup_key(company.name()));
    }

    groups
        .into_iter()
        .filter(|(_, names)| names.len() > 1)
        .map(|(canonical, names)| NearDuplicateGroup {
            canonical,
            names: names.into_iter().collect(),
        })
        .collect()
}

/// Run the audit against Supabase.
///
/// # Errors
///
/// Returns an error if companies cannot be fetched, or if both the
/// aggregate RPC and the per-company fallback fail.
#[instrument(skip(client))]
pub async fn run(client: &SupabaseClient) -> Result<AuditReport, SupabaseError> {
    let companies = client.fetch_companies().await?;
    info!(count = companies.len(), "Auditing companies");

    let duplicates = find_duplicates(&companies);
    let near_duplicates = find_near_duplicates(&companies);
    let (user_counts, source) = user_counts(client, &companies).await?;

    Ok(AuditReport {
        total: companies.len(),
        duplicates,
        near_duplicates,
        user_counts,
        source,
    })
}

async fn user_counts(
    client: &SupabaseClient,
    companies: &[CompanyRecord],
) -> Result<(HashMap<String, u64>, UserCountSource), SupabaseError> {
    match client.company_user_counts().await {
        Ok(counts) => Ok((counts, UserCountSource::Aggregate)),
        Err(e) => {
            warn!(
                error = %e,
                rpc = USER_COUNTS_RPC,
                "Aggregate user counts unavailable, counting per company"
            );
            let mut counts = HashMap::with_capacity(companies.len());
            for company in companies {
                let count = client.count_company_users(&company.id).await?;
                counts.insert(company.id.clone(), count);
            }
            Ok((counts, UserCountSource::PerCompany))
        }
    }
}

impl AuditReport {
    fn users(&self, company_id: &str) -> u64 {
        self.user_counts.get(company_id).copied().unwrap_or(0)
    }
}

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Companies: {}", self.total)?;

        if self.duplicates.is_empty() {
            writeln!(f, "No duplicate company names found.")?;
        } else {
            writeln!(f, "Duplicate names: {}", self.duplicates.len())?;
            for group in &self.duplicates {
                writeln!(f, "  {:?} ({} companies)", group.key, group.companies.len())?;
                for company in &group.companies {
                    writeln!(
                        f,
                        "    - {} {:?} created {} users {}",
                        company.id,
                        company.name(),
                        company.created_at.format("%Y-%m-%d %H:%M:%S"),
                        self.users(&company.id)
                    )?;
                }
            }
        }

        if !self.near_duplicates.is_empty() {
            writeln!(f, "Near duplicates: {}", self.near_duplicates.len())?;
            for group in &self.near_duplicates {
                let names: Vec<String> = group.names.iter().map(|n| format!("{n:?}")).collect();
                writeln!(f, "  {} <- {}", group.canonical, names.join(", "))?;
            }
        }

        let source = match self.source {
            UserCountSource::Aggregate => "aggregate RPC",
            UserCountSource::PerCompany => "per-company queries",
        };
        write!(f, "User counts from {source}.")
    }
}
