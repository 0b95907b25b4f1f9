use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// A typed answer produced by the upstream agent.
///
/// The variant is selected by the `type` field of the JSON object. Tags this
/// crate does not know about deserialize into [`Response::Unsupported`]
/// instead of failing, so newer upstream answer kinds never break a
/// consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// A plain text answer.
    Text {
        #[serde(default)]
        message: String,
    },

    /// A tabular answer with a caption.
    Table {
        #[serde(default)]
        message: String,
        table: Table,
    },

    /// A chart answer with a caption.
    Chart {
        #[serde(default)]
        message: String,
        chart: Chart,
    },

    /// An answer type this client cannot render.
    #[serde(other)]
    Unsupported,
}

impl Response {
    #[must_use]
    pub fn text(message: impl Into<String>) -> Self {
        Self::Text {
            message: message.into(),
        }
    }

    /// The caption or text of the answer, if the type is known.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Text { message } | Self::Table { message, .. } | Self::Chart { message, .. } => {
                Some(message)
            }
            Self::Unsupported => None,
        }
    }

    /// The wire tag of the answer.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Table { .. } => "table",
            Self::Chart { .. } => "chart",
            Self::Unsupported => "unsupported",
        }
    }

    #[must_use]
    pub const fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

/// A rectangular grid: one header row and any number of body rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub head: Vec<String>,
    #[serde(default)]
    pub body: Vec<Vec<Cell>>,
}

/// A single scalar table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    #[serde(rename = "type")]
    pub kind: ChartKind,

    #[serde(default)]
    pub data: ChartData,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, rename = "xLabel", skip_serializing_if = "Option::is_none")]
    pub x_label: Option<String>,

    #[serde(default, rename = "yLabel", skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,
}

impl Chart {
    /// Normalise the chart data into plottable series.
    ///
    /// A single dataset becomes a list of `(label, value)` points where
    /// non-numeric values count as `0`. Several datasets become named series
    /// in which non-numeric values are left out. Returns `None` when there
    /// are no labels or no datasets to plot.
    #[must_use]
    pub fn series(&self) -> Option<Series> {
        let ChartData { labels, datasets } = &self.data;
        if labels.is_empty() || datasets.is_empty() {
            return None;
        }

        if let [dataset] = datasets.as_slice() {
            let points = labels
                .iter()
                .enumerate()
                .map(|(i, label)| {
                    let value = dataset.values.get(i).and_then(Value::as_f64).unwrap_or(0.0);
                    (label.clone(), value)
                })
                .collect();

            return Some(Series::Points(points));
        }

        let series = datasets
            .iter()
            .map(|dataset| NamedSeries {
                name: dataset.name.clone(),
                points: labels
                    .iter()
                    .zip(&dataset.values)
                    .filter_map(|(label, value)| value.as_f64().map(|v| (label.clone(), v)))
                    .collect(),
            })
            .collect();

        Some(Series::Named(series))
    }

    /// Whether this client knows how to plot the chart kind.
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        !matches!(self.kind, ChartKind::Other(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChartKind {
    Bar,
    Line,
    Other(String),
}

impl From<String> for ChartKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "bar" => Self::Bar,
            "line" => Self::Line,
            _ => Self::Other(kind),
        }
    }
}

impl From<ChartKind> for String {
    fn from(kind: ChartKind) -> Self {
        match kind {
            ChartKind::Bar => "bar".to_owned(),
            ChartKind::Line => "line".to_owned(),
            ChartKind::Other(kind) => kind,
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bar => f.write_str("bar"),
            Self::Line => f.write_str("line"),
            Self::Other(kind) => f.write_str(kind),
        }
    }
}

/// Labeled categories mapped to one or more named series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub name: String,

    /// Raw values, index-aligned with [`ChartData::labels`]. The upstream
    /// does not guarantee these are numbers.
    #[serde(default)]
    pub values: Vec<Value>,
}

/// Plottable chart data, see [`Chart::series`].
#[derive(Debug, Clone, PartialEq)]
pub enum Series {
    Points(Vec<(String, f64)>),
    Named(Vec<NamedSeries>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedSeries {
    pub name: String,
    pub points: Vec<(String, f64)>,
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
