use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::{as_row, merged_list, string_list, DataSource};
use crate::domain::FilterTuple;
use crate::error::{DashboardError, Result};
use crate::extract::{extract_scalar, Row, OFFERING_TOTAL_FIELDS, PROGRAM_COUNT_FIELDS};

pub const ENDPOINT_PROVINCES: &str = "/api/provincias_list";
pub const ENDPOINT_YEARS: &str = "/api/matriculas_years";
pub const ENDPOINT_LEVELS: &str = "/api/matriculas_levels";
pub const ENDPOINT_TOTAL_OFFERING: &str = "/api/total_oferta_provincia";
pub const ENDPOINT_TOTAL_PROGRAMS: &str = "/api/total_carreras_provincia";
pub const ENDPOINT_COMPARE: &str = "/api/compare";
pub const ENDPOINT_EXPORT: &str = "/api/export_compare_csv";

/// [`DataSource`] backed by the statistics JSON API.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}{path}", self.base_url);
        let start = std::time::Instant::now();

        let params: Vec<(&str, &str)> = query
            .iter()
            .copied()
            .filter(|(_, value)| !value.is_empty())
            .collect();

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .query(&params)
            .send()
            .await
            .map_err(|e| DashboardError::transport(&url, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("HTTP {} from {} - body: {}", status.as_u16(), url, body);
            return Err(DashboardError::Fetch {
                url,
                status: Some(status.as_u16()),
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| DashboardError::transport(&url, &e))?;
        // A success body that is not JSON reads as empty data downstream.
        let value = serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!("non-JSON body from {}: {}", url, e);
            Value::String(text)
        });

        debug!(
            "GET {} ({:?}) completed in {:.2}s",
            url,
            params,
            start.elapsed().as_secs_f32()
        );
        Ok(value)
    }
}

#[async_trait(?Send)]
impl DataSource for HttpSource {
    async fn provinces(&self) -> Result<Vec<String>> {
        let value = self.get_json(ENDPOINT_PROVINCES, &[]).await?;
        Ok(string_list(&value, "provincias"))
    }

    async fn years(&self) -> Result<Vec<String>> {
        let value = self.get_json(ENDPOINT_YEARS, &[]).await?;
        Ok(string_list(&value, "years"))
    }

    async fn levels(&self) -> Result<Vec<String>> {
        let value = self.get_json(ENDPOINT_LEVELS, &[]).await?;
        Ok(string_list(&value, "levels"))
    }

    async fn total_offering(&self, province: Option<&str>) -> Result<f64> {
        let value = self
            .get_json(ENDPOINT_TOTAL_OFFERING, &[("provincia", province.unwrap_or(""))])
            .await?;
        Ok(extract_scalar(&as_row(value), OFFERING_TOTAL_FIELDS))
    }

    async fn total_programs(&self, province: Option<&str>) -> Result<f64> {
        let value = self
            .get_json(ENDPOINT_TOTAL_PROGRAMS, &[("provincia", province.unwrap_or(""))])
            .await?;
        Ok(extract_scalar(&as_row(value), PROGRAM_COUNT_FIELDS))
    }

    async fn merged_rows(&self, tuple: &FilterTuple) -> Result<Vec<Row>> {
        let year = if tuple.year.is_all() { "" } else { tuple.year.as_str() };
        let value = self
            .get_json(
                ENDPOINT_COMPARE,
                &[
                    ("provincia", tuple.province.as_str()),
                    ("anio", year),
                    ("nivel", tuple.level.as_str()),
                ],
            )
            .await?;
        Ok(merged_list(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::YearFilter;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn base_url_drops_trailing_slash() {
        let source = HttpSource::new("http://localhost:5000/");
        assert_eq!(source.base_url(), "http://localhost:5000");
    }

    /// Serves one fixed HTTP response to every connection.
    async fn serve(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0_u8; 4096];
                let _ = stream.read(&mut buf).await;
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn plain_text_success_reads_as_empty() {
        let base = serve(
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 2\r\nConnection: close\r\n\r\nOK",
        )
        .await;
        let source = HttpSource::new(&base);

        let tuple = FilterTuple::new("", YearFilter::parse("2022"), "");
        assert!(source.merged_rows(&tuple).await.unwrap().is_empty());
        assert_eq!(source.total_offering(None).await.unwrap(), 0.0);
        assert_eq!(source.total_programs(Some("Azuay")).await.unwrap(), 0.0);
        assert!(source.years().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn error_status_is_a_fetch_failure() {
        let base = serve(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 4\r\nConnection: close\r\n\r\nboom",
        )
        .await;
        let err = HttpSource::new(&base).levels().await.err();
        assert!(matches!(
            err,
            Some(DashboardError::Fetch { status: Some(500), ref body, .. }) if body == "boom"
        ));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_fetch_failure() {
        // Nothing listens on the discard port.
        let source = HttpSource::new("http://127.0.0.1:9");
        let err = source.provinces().await.err();
        assert!(matches!(
            err,
            Some(DashboardError::Fetch { status: None, .. })
        ));
    }
}
