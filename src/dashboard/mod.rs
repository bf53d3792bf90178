use std::sync::Arc;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::AuthGuard;
use crate::error::ClientError;
use crate::transport::{HttpRequest, Transport};

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DayCount {
    #[serde(rename = "dia")]
    pub day: String,
    #[serde(default)]
    pub total: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StatusCounts {
    #[serde(rename = "finalizadas", default)]
    pub completed: u64,
    #[serde(rename = "incompletas", default)]
    pub incomplete: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DashboardMetrics {
    #[serde(rename = "total_visitas", default)]
    pub total_visits: u64,
    #[serde(rename = "visitas_hoy", default)]
    pub visits_today: u64,
    #[serde(rename = "visitas_activas", default)]
    pub active_visits: u64,
    #[serde(rename = "visitas_por_dia", default)]
    pub per_day: Option<Vec<DayCount>>,
    #[serde(rename = "estados", default)]
    pub statuses: Option<StatusCounts>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Donut,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Series {
    pub name: String,
    pub data: Vec<u64>,
}

/// What a chart library needs: a kind, category labels and value series.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChartConfig {
    pub kind: ChartKind,
    pub title: String,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
}

pub trait ChartRenderer {
    fn render(&mut self, chart: &ChartConfig);
}

/// `YYYY-MM-DD` to `DD/MM`; anything else is shown as is.
fn day_label(day: &str) -> String {
    let parts: Vec<&str> = day.trim().split('-').collect();
    match parts.as_slice() {
        [_, month, dd] => format!("{dd}/{month}"),
        _ => day.to_string(),
    }
}

/// Bar chart of visits per day; `None` when the endpoint sent no series.
pub fn visits_per_day_chart(metrics: &DashboardMetrics) -> Option<ChartConfig> {
    let per_day = metrics.per_day.as_ref()?;
    Some(ChartConfig {
        kind: ChartKind::Bar,
        title: "Visits per day".to_string(),
        labels: per_day.iter().map(|d| day_label(&d.day)).collect(),
        series: vec![Series {
            name: "Visits".to_string(),
            data: per_day.iter().map(|d| d.total).collect(),
        }],
    })
}

/// Donut of completed vs incomplete visits; missing counts are zero.
pub fn status_chart(metrics: &DashboardMetrics) -> ChartConfig {
    let statuses = metrics.statuses.clone().unwrap_or_default();
    ChartConfig {
        kind: ChartKind::Donut,
        title: "Visit status".to_string(),
        labels: vec!["Completed".to_string(), "Incomplete".to_string()],
        series: vec![Series {
            name: "Visits".to_string(),
            data: vec![statuses.completed, statuses.incomplete],
        }],
    }
}

pub fn render_charts(metrics: &DashboardMetrics, renderer: &mut dyn ChartRenderer) {
    if let Some(chart) = visits_per_day_chart(metrics) {
        renderer.render(&chart);
    }
    renderer.render(&status_chart(metrics));
}

pub struct DashboardClient {
    transport: Arc<dyn Transport>,
    guard: Arc<AuthGuard>,
    url: String,
}

impl DashboardClient {
    pub fn new(transport: Arc<dyn Transport>, guard: Arc<AuthGuard>, url: impl Into<String>) -> Self {
        Self {
            transport,
            guard,
            url: url.into(),
        }
    }

    pub async fn fetch(&self) -> Result<DashboardMetrics, ClientError> {
        let token = self.guard.require_token()?;
        let resp = self
            .transport
            .send(HttpRequest::new(Method::GET, self.url.as_str()).bearer(&token))
            .await?;
        if !resp.is_success() {
            let body = resp.json_or_empty();
            self.guard.screen(resp.status, &body)?;
            let detail = body
                .get("detail")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err(ClientError::Remote {
                status: resp.status,
                body: detail,
            });
        }
        serde_json::from_str(&resp.body)
            .map_err(|e| ClientError::Transport(format!("malformed dashboard response: {e}")))
    }
}
