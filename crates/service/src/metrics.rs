use once_cell::sync::Lazy;
use prometheus::{register_int_counter, Encoder, IntCounter, TextEncoder};

// Prometheus metrics (default registry)
pub static PETS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("pet_adoption_pets_created_total", "Pets created directly by admins")
        .expect("register pets_created_total")
});

pub static PETS_SUBMITTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("pet_adoption_pets_submitted_total", "Pets submitted by users for moderation")
        .expect("register pets_submitted_total")
});

pub static PETS_APPROVED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("pet_adoption_pets_approved_total", "Submitted pets approved")
        .expect("register pets_approved_total")
});

pub static PETS_DELETED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("pet_adoption_pets_deleted_total", "Pets deleted")
        .expect("register pets_deleted_total")
});

pub static ADOPTION_REQUESTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("pet_adoption_adoption_requests_total", "Adoption requests recorded")
        .expect("register adoption_requests_total")
});

pub static ADOPTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("pet_adoption_adoptions_total", "Adoptions completed")
        .expect("register adoptions_total")
});

pub static NOTIFICATIONS_DELIVERED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("pet_adoption_notifications_delivered_total", "Notifications pushed to a live connection")
        .expect("register notifications_delivered_total")
});

pub static NOTIFICATIONS_OFFLINE_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "pet_adoption_notifications_offline_total",
        "Notifications stored without a live connection to push to"
    )
    .expect("register notifications_offline_total")
});

/// Render the default registry in the Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_encoded_output() {
        PETS_CREATED_TOTAL.inc();
        let text = encode_metrics().unwrap();
        assert!(text.contains("pet_adoption_pets_created_total"));
    }
}
