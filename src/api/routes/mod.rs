pub mod charts;
pub mod kpis;
pub mod options;
pub mod players;
pub mod reload;

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::NaiveDate;
    use serde_json::Value;
    use tower::util::ServiceExt;

    use crate::api::state::AppState;
    use crate::cache::DatasetStore;
    use crate::config::AppConfig;

    pub const HEADER: &str =
        "name,country,title,rank,classicalrating,rapidrating,blitzrating,lastupdated\n";

    /// Two snapshots for Carlsen (the 01/14 one is fresher), a stale-only
    /// row with a broken date, and a handful of single-snapshot players.
    pub const SAMPLE_ROWS: &str = "\
Carlsen,NOR,GM,1,2830,2820,2880,01/01/2024
Carlsen,NOR,GM,1,2832,2823,2886,01/14/2024
Caruana,USA,GM,2,2800,2760,2790,01/14/2024
Nakamura,USA,GM,3,2790,2770,2900,2024-01-13
Ju,CHN,GM,40,2560,2500,2520,01/10/2024
Vaishali,IND,IM,60,2470,,2400,01/12/2024
Ghost,IND,GM,5,2700,2700,2700,someday
Unlisted,,,90,2300,2200,2250,01/15/2024
";

    pub fn run_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    pub fn write_csv(dir: &std::path::Path, rows: &str) -> std::path::PathBuf {
        let path = dir.join("Ranking.csv");
        std::fs::write(&path, format!("{}{}", HEADER, rows)).unwrap();
        path
    }

    pub fn setup_test_state(dir: &std::path::Path, rows: &str) -> AppState {
        let path = write_csv(dir, rows);
        let store = DatasetStore::open(&path).unwrap();
        let mut config = AppConfig::default();
        config.data_file = path;
        AppState::new(config, store).with_run_date(run_date())
    }

    pub async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        send(app, "GET", uri).await
    }

    pub async fn send(app: axum::Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }
}
