use climata::services::usgs::Nwis;
use climata::{raw_values, Climata, ClimataError};

#[tokio::main]
async fn main() -> Result<(), ClimataError> {
    let client = Climata::new().await?;

    let sites = client
        .load()
        .service(&Nwis::sites())
        .values(raw_values! {
            "basin" => "07010206",
            "sitetype" => "ST",
        })
        .call()
        .await?;

    println!("Found {} stream sites", sites.len());
    for site in sites.iter().take(10) {
        println!("{} {}", site["site_no"], site["station_nm"]);
    }

    Ok(())
}
