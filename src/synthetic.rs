//! Synthetic subject tables
//!
//! Generates a reproducible snapshot with a realistic shape: a few studies,
//! sites nested in countries nested in regions, and sparse right-skewed
//! issue counts whose rate varies by site. Used for demos and tests.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::schema::{COUNTRY, REGION, SITE_ID, STUDY, SUBJECT_ID};
use crate::scoring::weights::WeightRegistry;

const STUDIES: [&str; 3] = ["STUDY-101", "STUDY-202", "STUDY-303"];

/// `(country, region)` pairs sites are placed in
const COUNTRIES: [(&str, &str); 8] = [
    ("US", "NA"),
    ("CA", "NA"),
    ("DE", "EU"),
    ("DK", "EU"),
    ("FR", "EU"),
    ("JP", "APAC"),
    ("AU", "APAC"),
    ("BR", "LATAM"),
];

const SITES_PER_STUDY: usize = 12;

/// Site-level settings shared by all its subjects
struct SiteProfile {
    study: &'static str,
    site_id: String,
    country: &'static str,
    region: &'static str,
    /// Multiplier on every feature's activation probability
    propensity: f64,
}

fn site_profiles(rng: &mut StdRng) -> Vec<SiteProfile> {
    let mut sites = Vec::with_capacity(STUDIES.len() * SITES_PER_STUDY);
    for study in STUDIES {
        for idx in 0..SITES_PER_STUDY {
            let (country, region) = COUNTRIES[rng.random_range(0..COUNTRIES.len())];
            sites.push(SiteProfile {
                study,
                site_id: format!("{country}-{:03}", idx + 1),
                country,
                region,
                propensity: rng.random_range(0.2..2.5),
            });
        }
    }
    sites
}

/// Draw one feature value: zero most of the time, otherwise a skewed count
fn feature_value(rng: &mut StdRng, name: &str, propensity: f64) -> f64 {
    let base_rate = match name {
        "sae_pending" => 0.03,
        "protocol_deviations" | "lab_issues" => 0.08,
        _ => 0.2,
    };
    if !rng.random_bool((base_rate * propensity).min(0.95)) {
        return 0.0;
    }
    if name == "days_outstanding" {
        return f64::from(rng.random_range(1..120_u32)) * (1.0 + propensity);
    }
    // Geometric tail: mostly 1 or 2, occasionally much larger
    let mut count = 1.0;
    while count < 50.0 && rng.random_bool(0.45) {
        count += 1.0;
    }
    count
}

/// Generate a subject table with one Float64 column per registered feature
///
/// The same `(num_subjects, seed, registry)` always produces the same table.
pub fn generate_subject_table(
    num_subjects: usize,
    seed: u64,
    registry: &WeightRegistry,
) -> Result<RecordBatch> {
    let mut rng = StdRng::seed_from_u64(seed);
    let sites = site_profiles(&mut rng);

    let assigned: Vec<&SiteProfile> = (0..num_subjects)
        .map(|_| &sites[rng.random_range(0..sites.len())])
        .collect();

    let mut fields = vec![
        Field::new(STUDY, DataType::Utf8, false),
        Field::new(SUBJECT_ID, DataType::Utf8, false),
        Field::new(SITE_ID, DataType::Utf8, false),
        Field::new(COUNTRY, DataType::Utf8, false),
        Field::new(REGION, DataType::Utf8, false),
    ];
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(assigned.iter().map(|s| s.study))),
        Arc::new(StringArray::from_iter_values(
            (0..num_subjects).map(|i| format!("SUBJ-{:06}", i + 1)),
        )),
        Arc::new(StringArray::from_iter_values(
            assigned.iter().map(|s| s.site_id.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(assigned.iter().map(|s| s.country))),
        Arc::new(StringArray::from_iter_values(assigned.iter().map(|s| s.region))),
    ];

    for name in registry.feature_names() {
        let values: Vec<f64> = assigned
            .iter()
            .map(|site| feature_value(&mut rng, name, site.propensity))
            .collect();
        fields.push(Field::new(name, DataType::Float64, false));
        columns.push(Arc::new(Float64Array::from(values)));
    }

    log::debug!(
        "Generated {num_subjects} synthetic subjects across {} sites (seed {seed})",
        sites.len()
    );
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}
