//! Purpose: Describe the yearly export line chart as a serializable figure.
//! Exports: `Figure`, `Trace`, `Layout`, `Axis`, `Title`, `Annotation`, `line_chart`.
//! Role: Server-side chart model; the page hands the JSON to Plotly unchanged.
//! Invariants: Field names follow Plotly's figure schema (`data` traces + `layout`).
//! Invariants: Hover text is preformatted here so the browser never formats numbers.

use serde::Serialize;

use crate::core::format::format_currency;
use crate::core::query::YearTotal;

pub const CHART_TITLE: &str = "Sumatorio de Exportaciones por Año";
pub const X_AXIS_TITLE: &str = "Año";
pub const Y_AXIS_TITLE: &str = "Volumen de Exportaciones (€)";
pub const NO_DATA_TEXT: &str = "No hay datos disponibles para la selección.";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: String,
    pub mode: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub text: Vec<String>,
    pub hovertemplate: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Layout {
    pub title: Title,
    pub xaxis: Axis,
    pub yaxis: Axis,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Axis {
    pub title: Title,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Annotation {
    pub text: String,
    pub showarrow: bool,
    pub xref: String,
    pub yref: String,
    pub x: f64,
    pub y: f64,
}

fn title(text: &str) -> Title {
    Title {
        text: text.to_string(),
    }
}

/// Build the line chart for per-year totals. An empty input yields an empty
/// trace plus a centered "no data" annotation.
pub fn line_chart(totals: &[YearTotal]) -> Figure {
    let trace = Trace {
        kind: "scatter".to_string(),
        mode: "lines+markers".to_string(),
        x: totals.iter().map(|total| total.year.clone()).collect(),
        y: totals.iter().map(|total| total.volume).collect(),
        text: totals
            .iter()
            .map(|total| {
                format!(
                    "{X_AXIS_TITLE}={}<br>Volumen={}",
                    total.year,
                    format_currency(total.volume)
                )
            })
            .collect(),
        hovertemplate: "%{text}<extra></extra>".to_string(),
    };

    let mut annotations = Vec::new();
    if totals.is_empty() {
        annotations.push(Annotation {
            text: NO_DATA_TEXT.to_string(),
            showarrow: false,
            xref: "paper".to_string(),
            yref: "paper".to_string(),
            x: 0.5,
            y: 0.5,
        });
    }

    Figure {
        data: vec![trace],
        layout: Layout {
            title: title(CHART_TITLE),
            xaxis: Axis {
                title: title(X_AXIS_TITLE),
                kind: "category".to_string(),
            },
            yaxis: Axis {
                title: title(Y_AXIS_TITLE),
                kind: "linear".to_string(),
            },
            annotations,
        },
    }
}
