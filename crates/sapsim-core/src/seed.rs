//! Deterministic sample business data.
//!
//! Generates business partners, materials and sales orders keyed by
//! SAP-style document numbers from a seeded RNG, so the same `rng_seed`
//! always produces the same records. Collections that already hold records
//! (a file store from an earlier run) are left untouched.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sapsim_store::{DataProvider, Record, RecordFilter, StoreError};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::config::DataSettings;

/// Business partner collection.
pub const BUSINESS_PARTNERS: &str = "BusinessPartners";
/// Material master collection.
pub const MATERIALS: &str = "Materials";
/// Sales order collection.
pub const SALES_ORDERS: &str = "SalesOrders";

const DEFAULT_PARTNERS: usize = 25;
const DEFAULT_MATERIALS: usize = 40;
const DEFAULT_ORDERS: usize = 60;

const COMPANY_STEMS: &[&str] = &[
    "Nordwind", "Alpen", "Rhein", "Baltic", "Sonnen", "Atlas", "Meridian", "Kestrel", "Falken",
    "Linde", "Polar", "Vega",
];
const COMPANY_FORMS: &[&str] = &["GmbH", "AG", "KG", "Ltd", "Inc", "SE"];
const CITIES: &[(&str, &str)] = &[
    ("Walldorf", "DE"),
    ("Hamburg", "DE"),
    ("Munich", "DE"),
    ("Vienna", "AT"),
    ("Zurich", "CH"),
    ("Paris", "FR"),
    ("Chicago", "US"),
    ("Toronto", "CA"),
];
const MATERIAL_KINDS: &[(&str, &str)] = &[
    ("Pump", "FERT"),
    ("Valve", "FERT"),
    ("Bearing", "HALB"),
    ("Gasket", "ROH"),
    ("Motor", "FERT"),
    ("Sensor", "HALB"),
    ("Cable", "ROH"),
];
const MATERIAL_GRADES: &[&str] = &["Standard", "Heavy Duty", "Compact", "Industrial"];
const UNITS: &[&str] = &["EA", "PC", "KG", "M"];
const ORDER_STATUSES: &[&str] = &["Open", "In Process", "Completed"];

/// Records written per collection by [`seed_sample_data`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// Collection name to records written.
    pub written: BTreeMap<String, usize>,
    /// Collections skipped because they already held records.
    pub skipped: Vec<String>,
}

/// Populate `data` with sample records according to `settings`.
///
/// # Errors
///
/// Returns the first [`StoreError`] raised by the provider.
pub async fn seed_sample_data(
    data: &DataProvider,
    settings: &DataSettings,
) -> Result<SeedReport, StoreError> {
    let mut rng = StdRng::seed_from_u64(settings.rng_seed);
    let partners = business_partners(&mut rng, settings.records_for(BUSINESS_PARTNERS, DEFAULT_PARTNERS));
    let stock = materials(&mut rng, settings.records_for(MATERIALS, DEFAULT_MATERIALS));
    let orders = sales_orders(
        &mut rng,
        settings.records_for(SALES_ORDERS, DEFAULT_ORDERS),
        &partners,
        &stock,
    );

    let mut report = SeedReport::default();
    for (collection, records) in [
        (BUSINESS_PARTNERS, partners),
        (MATERIALS, stock),
        (SALES_ORDERS, orders),
    ] {
        let existing = data.list(collection, &RecordFilter::all().limit(1)).await?;
        if !existing.is_empty() {
            debug!(collection, "Collection already populated, seeding skipped");
            report.skipped.push(collection.to_owned());
            continue;
        }
        let count = records.len();
        for (key, record) in records {
            data.write(collection, &key, record).await?;
        }
        report.written.insert(collection.to_owned(), count);
    }

    info!(
        provider = data.name(),
        written = ?report.written,
        skipped = ?report.skipped,
        "Sample data seeded"
    );
    Ok(report)
}

fn pick<'a, T>(rng: &mut StdRng, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.random_range(0..items.len()))
}

fn pick_str(rng: &mut StdRng, items: &[&'static str]) -> &'static str {
    pick(rng, items).copied().unwrap_or_default()
}

fn amount(cents: u64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

fn document_date(rng: &mut StdRng) -> String {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    let offset = rng.random_range(0..365);
    base.checked_add_days(Days::new(offset))
        .unwrap_or(base)
        .format("%Y-%m-%d")
        .to_string()
}

/// Generate `count` business partners keyed `1000001`, `1000002`, ...
pub fn business_partners(rng: &mut StdRng, count: usize) -> Vec<(String, Record)> {
    (0..count)
        .map(|i| {
            let key = 1_000_001_usize.saturating_add(i).to_string();
            let (city, country) = pick(rng, CITIES).copied().unwrap_or(("Walldorf", "DE"));
            let name = format!(
                "{} {}",
                pick_str(rng, COMPANY_STEMS),
                pick_str(rng, COMPANY_FORMS)
            );
            let category = if rng.random_bool(0.85) { "2" } else { "1" };
            let currency = if country == "US" || country == "CA" { "USD" } else { "EUR" };
            let record = json!({
                "BusinessPartner": key,
                "BusinessPartnerCategory": category,
                "BusinessPartnerFullName": name,
                "CityName": city,
                "Country": country,
                "CreditLimit": amount(rng.random_range(100_000..5_000_000)),
                "Currency": currency,
                "IsBlocked": rng.random_bool(0.05),
            });
            (key, record)
        })
        .collect()
}

/// Generate `count` materials keyed `MAT-000001`, `MAT-000002`, ...
pub fn materials(rng: &mut StdRng, count: usize) -> Vec<(String, Record)> {
    (0..count)
        .map(|i| {
            let key = format!("MAT-{:06}", i.saturating_add(1));
            let (kind, material_type) = pick(rng, MATERIAL_KINDS).copied().unwrap_or(("Pump", "FERT"));
            let record = json!({
                "Material": key,
                "MaterialDescription": format!("{} {}", pick_str(rng, MATERIAL_GRADES), kind),
                "MaterialType": material_type,
                "BaseUnit": pick_str(rng, UNITS),
                "Plant": format!("{}", rng.random_range(1000..1004_u16)),
                "StandardPrice": amount(rng.random_range(500..250_000)),
                "Currency": "EUR",
                "StockQuantity": rng.random_range(0..10_000_u32),
            });
            (key, record)
        })
        .collect()
}

/// Generate `count` sales orders keyed `0000500001`, ... referencing the
/// given partners and materials.
pub fn sales_orders(
    rng: &mut StdRng,
    count: usize,
    partners: &[(String, Record)],
    materials: &[(String, Record)],
) -> Vec<(String, Record)> {
    (0..count)
        .map(|i| {
            let key = format!("{:010}", 500_001_usize.saturating_add(i));
            let sold_to = pick(rng, partners).map_or("", |(k, _)| k.as_str());
            let material = pick(rng, materials).map_or("", |(k, _)| k.as_str());
            let quantity: u64 = rng.random_range(1..100);
            let unit_cents: u64 = rng.random_range(500..250_000);
            let record = json!({
                "SalesOrder": key,
                "SalesOrderType": "OR",
                "SalesOrganization": "1010",
                "SoldToParty": sold_to,
                "Material": material,
                "RequestedQuantity": quantity,
                "TotalNetAmount": amount(quantity.saturating_mul(unit_cents)),
                "TransactionCurrency": "EUR",
                "OverallSDProcessStatus": pick_str(rng, ORDER_STATUSES),
                "CreationDate": document_date(rng),
            });
            (key, record)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn settings(rng_seed: u64) -> DataSettings {
        let mut settings = DataSettings {
            rng_seed,
            ..DataSettings::default()
        };
        settings.seed_records.insert(String::from(BUSINESS_PARTNERS), 3);
        settings.seed_records.insert(String::from(MATERIALS), 4);
        settings.seed_records.insert(String::from(SALES_ORDERS), 5);
        settings
    }

    #[test]
    fn same_seed_same_records() {
        let a = business_partners(&mut StdRng::seed_from_u64(9), 10);
        let b = business_partners(&mut StdRng::seed_from_u64(9), 10);
        assert_eq!(a, b);
    }

    #[test]
    fn keys_follow_document_numbering() {
        let mut rng = StdRng::seed_from_u64(1);
        let partners = business_partners(&mut rng, 2);
        let mats = materials(&mut rng, 2);
        let orders = sales_orders(&mut rng, 2, &partners, &mats);
        assert_eq!(partners.first().unwrap().0, "1000001");
        assert_eq!(mats.get(1).unwrap().0, "MAT-000002");
        assert_eq!(orders.first().unwrap().0, "0000500001");
    }

    #[test]
    fn orders_reference_generated_masters() {
        let mut rng = StdRng::seed_from_u64(3);
        let partners = business_partners(&mut rng, 4);
        let mats = materials(&mut rng, 4);
        for (_, order) in sales_orders(&mut rng, 20, &partners, &mats) {
            let sold_to = order["SoldToParty"].as_str().unwrap();
            assert!(partners.iter().any(|(k, _)| k == sold_to));
            let material = order["Material"].as_str().unwrap();
            assert!(mats.iter().any(|(k, _)| k == material));
        }
    }

    #[test]
    fn amounts_have_two_decimals() {
        assert_eq!(amount(0), "0.00");
        assert_eq!(amount(1205), "12.05");
    }

    #[tokio::test]
    async fn seeds_provider_with_configured_counts() {
        let data = DataProvider::in_memory();
        let report = seed_sample_data(&data, &settings(42)).await.unwrap();
        assert_eq!(report.written.get(SALES_ORDERS), Some(&5));

        let partners = data.list(BUSINESS_PARTNERS, &RecordFilter::all()).await.unwrap();
        assert_eq!(partners.len(), 3);
        let order = data.read(SALES_ORDERS, "0000500001").await.unwrap().unwrap();
        assert_eq!(order["SalesOrder"], "0000500001");
    }

    #[tokio::test]
    async fn populated_collections_are_skipped() {
        let data = DataProvider::in_memory();
        data.write(MATERIALS, "CUSTOM", json!({"Material": "CUSTOM"}))
            .await
            .unwrap();
        let report = seed_sample_data(&data, &settings(42)).await.unwrap();
        assert_eq!(report.skipped, vec![String::from(MATERIALS)]);
        let materials = data.list(MATERIALS, &RecordFilter::all()).await.unwrap();
        assert_eq!(materials.len(), 1);
    }
}
