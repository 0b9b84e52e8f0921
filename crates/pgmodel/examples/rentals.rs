//! Walk through the six verbs against the `Unit` table.
//!
//! Expects `DATABASE_URL` (or a `.env` file) pointing at a database with a
//! `"Unit"` table (`id serial`, `unit_number text`, `rent_amount int`,
//! `status text`, `property_id int`).
//!
//! Run with: `cargo run -p pgmodel --example rentals`

use pgmodel::{DbConfig, Filter, ModelResult, Models, Order, Record};
use serde_json::json;

#[tokio::main]
async fn main() -> ModelResult<()> {
    let config = DbConfig::from_env()?;
    let models = Models::connect(&config)?;

    let unit = models
        .unit
        .create(
            &Record::from_json(json!({
                "propertyId": 1,
                "unitNumber": "A1",
                "rentAmount": 1200,
                "status": "available",
            }))?,
        )
        .await?;
    println!("created: {}", unit.clone().into_json());

    let id = unit.get("id").cloned().unwrap_or_default();

    let vacant = models
        .unit
        .find_many(
            &Filter::from_json(json!({ "status": { "within": ["available", "reserved"] } }))?
                .order_by("unitNumber", Order::Asc),
        )
        .await?;
    println!("vacant units: {}", vacant.len());

    let updated = models
        .unit
        .update(
            &Filter::new().eq("id", id.clone()),
            &Record::new().with("rentAmount", 1500),
        )
        .await?;
    println!("updated: {updated:?}");

    let total = models.unit.count(&Filter::new().eq("propertyId", 1)).await?;
    println!("units on property 1: {total}");

    let deleted = models.unit.delete(&Filter::new().eq("id", id)).await?;
    println!("deleted {} row(s)", deleted.rows_affected);

    Ok(())
}
