use climata::services::acis::Acis;
use climata::services::epa::WqxDomain;
use climata::services::hydromet::Hydromet;
use climata::services::nws::EnsembleForecast;
use climata::services::snotel::Snotel;
use climata::services::usgs::Nwis;
use climata::{raw_values, Climata, ClimataError, DecodeError, LoadError};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::{Cursor, Write};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const SITES_RDB: &str = "# US Geological Survey\n\
agency_cd\tsite_no\tstation_nm\tsite_tp_cd\n\
5s\t15s\t50s\t7s\n\
USGS\t05331000\tMISSISSIPPI RIVER AT ST. PAUL, MN\tST\n\
USGS\t05331580\tMISSISSIPPI RIVER BELOW L&D #2 AT HASTINGS, MN\tST\n";

async fn cached_client() -> (Climata, tempfile::TempDir) {
    let cache = tempfile::tempdir().expect("temp dir");
    let client = Climata::with_cache_folder(cache.path().join("cache"))
        .await
        .expect("client creation");
    (client, cache)
}

#[tokio::test]
async fn nwis_sites_are_cached() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nwis/site/"))
        .and(query_param("format", "rdb,1.0"))
        .and(query_param("site", "05331000,05331580"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SITES_RDB))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _cache) = cached_client().await;
    let nwis = Nwis::sites().with_base_url(format!("{}/nwis/", mock_server.uri()));

    for _ in 0..2 {
        let rows = client
            .load()
            .service(&nwis)
            .values(raw_values! { "station" => ["05331000", "05331580"] })
            .call()
            .await
            .expect("load");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["site_no"], json!("05331580"));
    }
}

#[tokio::test]
async fn refresh_bypasses_the_cache() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nwis/site/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SITES_RDB))
        .expect(2)
        .mount(&mock_server)
        .await;

    let (client, _cache) = cached_client().await;
    let nwis = Nwis::sites().with_base_url(format!("{}/nwis/", mock_server.uri()));

    for refresh in [false, true] {
        client
            .fetch()
            .service(&nwis)
            .values(raw_values! { "basin" => "07010206" })
            .refresh(refresh)
            .call()
            .await
            .expect("fetch");
    }
}

#[tokio::test]
async fn http_errors_keep_the_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&mock_server)
        .await;

    let client = Climata::without_cache();
    let nwis = Nwis::daily_values().with_base_url(format!("{}/nwis/", mock_server.uri()));
    let result = client
        .load()
        .service(&nwis)
        .values(raw_values! { "station" => "05331000" })
        .call()
        .await;

    match result {
        Err(ClimataError::Load(LoadError::HttpStatus { status, .. })) => {
            assert_eq!(status.as_u16(), 500)
        }
        other => panic!("expected an HTTP status error, got {:?}", other),
    }
}

#[tokio::test]
async fn validation_happens_before_any_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = Climata::without_cache();
    let hydromet = Hydromet::daily().with_base_url(format!("{}/", mock_server.uri()));
    let result = client
        .load()
        .service(&hydromet)
        .values(raw_values! { "region" => "xx" })
        .call()
        .await;

    let Err(ClimataError::Validation(error)) = result else {
        panic!("expected a validation error");
    };
    // station and parameter are missing, region is not a valid choice
    assert_eq!(error.errors().len(), 3);
}

#[tokio::test]
async fn acis_rows_are_expanded_per_day() {
    let mock_server = MockServer::start().await;
    let body = json!({
        "data": [
            {
                "meta": {"name": "ST PAUL", "sids": ["215435 2"], "uid": 12},
                "data": [["0.10", "81"], ["T", "84"]]
            }
        ]
    });
    Mock::given(method("GET"))
        .and(path("/MultiStnData"))
        .and(query_param("sdate", "2014-07-01"))
        .and(query_param("elems", "pcpn,maxt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&mock_server)
        .await;

    let client = Climata::without_cache();
    let acis = Acis::station_data().with_base_url(format!("{}/", mock_server.uri()));
    let rows = client
        .load()
        .service(&acis)
        .values(raw_values! {
            "basin" => "07010206",
            "start_date" => "2014-07-01",
            "end_date" => "2014-07-02",
            "parameter" => ["pcpn", "maxt"],
        })
        .call()
        .await
        .expect("load");

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["date"], json!("2014-07-02"));
    assert_eq!(rows[1]["pcpn"], json!("T"));
    assert_eq!(rows[0]["sids"], json!({"COOP": "215435"}));
}

fn zipped(name: &str, contents: &str) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    writer.start_file(name, options).expect("zip entry");
    writer.write_all(contents.as_bytes()).expect("zip write");
    writer.finish().expect("zip finish").into_inner()
}

#[tokio::test]
async fn wqx_domain_archives_are_decoded() {
    let archive = zipped(
        "MeasureUnit.xml",
        r#"<WQXElement>
            <WQXElementRow>
                <WQXElementRowColumn colname="Code" value="mg/l" type="Text"/>
                <WQXElementRowColumn colname="Description" value="milligrams per liter" type="Text"/>
            </WQXElementRow>
        </WQXElement>"#,
    );
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/MeasureUnit.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive.clone()))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = Climata::without_cache();
    let wqx = WqxDomain::new().with_base_url(format!("{}/", mock_server.uri()));
    let values = raw_values! { "domain" => "MeasureUnit" };

    let body = client
        .fetch()
        .service(&wqx)
        .values(values.clone())
        .call()
        .await
        .expect("fetch");
    assert_eq!(body, archive);

    let rows = client
        .load()
        .service(&wqx)
        .values(values)
        .call()
        .await
        .expect("load");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["Code"], json!("mg/l"));
    assert_eq!(rows[0]["Description"], json!("milligrams per liter"));
}

#[tokio::test]
async fn ensemble_forecast_archives_are_decoded_and_filtered() {
    let archive = zipped(
        "2014070112_klamath_hefs_csv_daily.csv",
        "GMT,KLAO3,KLAO3,YREC1\n\
,QINE,QINE,QINE\n\
2014-07-01 12:00:00,410.0,415.5,22.1\n\
2014-07-02 12:00:00,405.2,409.8,21.7\n",
    );
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2014070112_klamath_hefs_csv_daily.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Climata::without_cache();
    let cnrfc = EnsembleForecast::new().with_base_url(format!("{}/", mock_server.uri()));
    let rows = client
        .load()
        .service(&cnrfc)
        .values(raw_values! {
            "start_date" => "2014-07-01",
            "end_date" => "2014-07-01",
            "basin" => "klamath",
            "station" => "KLAO3",
        })
        .call()
        .await
        .expect("load");
    assert_eq!(
        rows.iter().map(|row| row["year"].clone()).collect::<Vec<_>>(),
        vec![json!(1950), json!(1951)]
    );
    assert!(rows.iter().all(|row| row["site"] == json!("KLAO3")));
    assert_eq!(rows[1]["value"], json!("415.5"));
}

#[tokio::test]
async fn corrupt_archives_are_decode_errors() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/MeasureUnit.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04".to_vec()))
        .mount(&mock_server)
        .await;

    let client = Climata::without_cache();
    let wqx = WqxDomain::new().with_base_url(format!("{}/", mock_server.uri()));
    let result = client
        .load()
        .service(&wqx)
        .values(raw_values! { "domain" => "MeasureUnit" })
        .call()
        .await;
    assert!(matches!(
        result,
        Err(ClimataError::Decode(DecodeError::Zip(_)))
    ));
}

#[tokio::test]
async fn soap_services_are_not_sent() {
    let client = Climata::without_cache();
    let result = client
        .load()
        .service(&Snotel::station_metadata())
        .values(raw_values! { "station" => "302:OR:SNTL" })
        .call()
        .await;
    assert!(matches!(
        result,
        Err(ClimataError::Load(LoadError::UnsupportedTransport { .. }))
    ));
}

#[tokio::test]
async fn clear_cache_removes_the_directory() {
    let (client, _cache) = cached_client().await;
    let dir = client.cache_dir().expect("cache dir").to_path_buf();
    assert!(dir.is_dir());
    client.clear_cache().await.expect("clear");
    assert!(!dir.exists());
}
