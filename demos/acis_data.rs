//! Prints the first days of precipitation and max temperature for a basin.
//!
//! The basin may be an 8-digit HUC, a shorter HUC prefix or a basin name:
//! `cargo run --example acis_data -- Klamath`

use climata::services::acis::Acis;
use climata::services::huc8::{expand_basin, HucCodes};
use climata::{raw_values, Climata, ClimataError};

#[tokio::main]
async fn main() -> Result<(), ClimataError> {
    let client = Climata::new().await?;
    let basin = std::env::args().nth(1).unwrap_or_else(|| "07010206".to_string());

    let basins = if basin.len() == 8 && basin.chars().all(|c| c.is_ascii_digit()) {
        vec![basin]
    } else {
        let hucs = client
            .load()
            .service(&HucCodes::new())
            .values(raw_values! {})
            .call()
            .await?;
        expand_basin(&hucs, &basin)
    };
    if basins.is_empty() {
        eprintln!("No 8-digit HUCs found");
        return Ok(());
    }

    let values = raw_values! {
        "basin" => basins,
        "start_date" => "2014-07-01",
        "end_date" => "2014-07-07",
        "parameter" => ["pcpn", "maxt"],
    };

    // Show the request before sending it
    let url = client
        .request_url()
        .service(&Acis::station_data())
        .values(values.clone())
        .call()?;
    println!("{}", url);

    let rows = client
        .load()
        .service(&Acis::station_data())
        .values(values)
        .call()
        .await?;

    for row in rows.iter().take(14) {
        println!("{} {} pcpn={} maxt={}", row["name"], row["date"], row["pcpn"], row["maxt"]);
    }

    Ok(())
}
