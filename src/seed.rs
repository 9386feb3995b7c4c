//! Built-in demo practice.
//!
//! Three clients with one or two matters each, a handful of time entries
//! and four short documents. Loaded when `[corpus].seed_demo = true` so a
//! fresh install can answer questions before any corpus is configured.

use anyhow::{anyhow, Result};
use chrono::NaiveDate;

use crate::models::SourceItem;
use brieflens_core::registry::PracticeRegistry;

const JOHNSON: &str = "Johnson Corporation";
const RIVERSIDE: &str = "Riverside Holdings LLC";
const MERIDIAN: &str = "Meridian Health Partners";

const CLIENTS: &[(&str, &str)] = &[
    (JOHNSON, "Manufacturing"),
    (RIVERSIDE, "Commercial real estate"),
    (MERIDIAN, "Healthcare"),
];

const MATTERS: &[(&str, &str, &str)] = &[
    (JOHNSON, "Johnson v. Smith Supply", "open"),
    (RIVERSIDE, "Harbor Point Lease", "open"),
    (MERIDIAN, "Vendor Confidentiality Review", "open"),
    (MERIDIAN, "2023 Compliance Audit", "closed"),
];

/// (client, matter, date, hours, description)
const TIME_ENTRIES: &[(&str, &str, &str, f64, &str)] = &[
    (JOHNSON, "Johnson v. Smith Supply", "2024-03-04", 3.5, "Draft complaint"),
    (JOHNSON, "Johnson v. Smith Supply", "2024-03-11", 1.25, "Client call on damages"),
    (RIVERSIDE, "Harbor Point Lease", "2024-03-06", 2.0, "Review lease renewal terms"),
    (MERIDIAN, "Vendor Confidentiality Review", "2024-03-08", 1.5, "Mark up NDA"),
];

/// (id, name, client, matter, text)
const DOCUMENTS: &[(&str, &str, &str, &str, &str)] = &[
    (
        "johnson-complaint",
        "Johnson_Complaint.txt",
        JOHNSON,
        "Johnson v. Smith Supply",
        "Johnson Corporation filed a complaint against Smith Supply for breach of contract. \
         The complaint alleges that Smith Supply failed to deliver steel components by the agreed date. \
         Johnson Corporation seeks damages of $250,000 plus interest and costs. \
         The complaint was filed in the Superior Court on March 12, 2024.",
    ),
    (
        "riverside-lease",
        "Harbor_Point_Lease.txt",
        RIVERSIDE,
        "Harbor Point Lease",
        "This commercial lease is between Riverside Holdings LLC as landlord and Harbor Point Cafe as tenant. \
         The tenant shall pay monthly rent of $8,500 on the first day of each month. \
         The lease term is five years with one renewal option of three years. \
         The landlord is responsible for roof and structural repairs.",
    ),
    (
        "meridian-nda",
        "Meridian_Vendor_NDA.txt",
        MERIDIAN,
        "Vendor Confidentiality Review",
        "Meridian Health Partners and its vendor agree to keep patient and business information confidential. \
         The confidentiality obligations survive for five years after termination. \
         Either party may seek injunctive relief for a breach of this agreement.",
    ),
    (
        "firm-billing-policy",
        "Billing_Policy.md",
        "",
        "",
        "Time is recorded in increments of one tenth of an hour. \
         Invoices are sent to clients on the fifth business day of each month. \
         Payment is due within thirty days of the invoice date.",
    ),
];

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Demo documents as raw source items.
pub fn demo_items() -> Vec<SourceItem> {
    DOCUMENTS
        .iter()
        .map(|(id, name, client, matter, text)| SourceItem {
            source: "demo".to_string(),
            source_id: id.to_string(),
            title: name.to_string(),
            client: non_empty(client),
            matter: non_empty(matter),
            content_type: "text/plain".to_string(),
            body: text.to_string(),
        })
        .collect()
}

/// Add demo clients, matters and time entries to `registry`.
///
/// Documents are not added here; see [`demo_items`].
pub fn seed_registry(registry: &mut PracticeRegistry) -> Result<()> {
    for (name, industry) in CLIENTS {
        registry.add_client(name, Some(*industry))?;
    }
    for (client, title, status) in MATTERS {
        registry.add_matter(client, title, status)?;
    }
    for (client, matter, date, hours, description) in TIME_ENTRIES {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| anyhow!("bad demo date {}: {}", date, e))?;
        registry.add_time_entry(client, Some(*matter), date, *hours, description)?;
    }
    Ok(())
}
