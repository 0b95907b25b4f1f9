use chatter_protocol::{Chart, Response, Series, Table};
use comfy_table::{Cell, Row};

pub(crate) const UNSUPPORTED: &str = "Unsupported response type";

const UTF8_FULL: &str = "││──├──┤     ──╭╮╰╯";

/// Render a response for the terminal.
pub(crate) fn response(response: &Response) -> String {
    match response {
        Response::Text { message } => message.clone(),
        Response::Table { message, table } => captioned(message, &grid(table)),
        Response::Chart { message, chart } if chart.is_supported() => {
            captioned(message, &series(chart))
        }
        Response::Chart { .. } | Response::Unsupported => UNSUPPORTED.to_owned(),
    }
}

fn captioned(message: &str, body: &str) -> String {
    if message.is_empty() {
        return body.to_owned();
    }

    format!("{message}\n\n{body}")
}

fn grid(table: &Table) -> String {
    let rows = table
        .body
        .iter()
        .map(|row| Row::from(row.iter().map(ToString::to_string).collect::<Vec<_>>()))
        .collect();

    list(Row::from(table.head.clone()), rows)
}

fn series(chart: &Chart) -> String {
    let x_label = chart.x_label.clone().unwrap_or_default();
    let y_label = chart.y_label.clone().unwrap_or_else(|| "value".to_owned());

    let plot = match chart.series() {
        None => "No chart data".to_owned(),
        Some(Series::Points(points)) => list(
            Row::from(vec![x_label, y_label]),
            points
                .into_iter()
                .map(|(label, value)| Row::from(vec![label, value.to_string()]))
                .collect(),
        ),
        Some(Series::Named(series)) => {
            let mut header = vec![Cell::new(x_label)];
            header.extend(series.iter().map(|s| Cell::new(&s.name)));

            // Named series skip non-numeric values, leaving gaps.
            let rows = chart
                .data
                .labels
                .iter()
                .map(|label| {
                    let mut row = Row::new();
                    row.add_cell(Cell::new(label));
                    for s in &series {
                        let value = s
                            .points
                            .iter()
                            .find(|(l, _)| l == label)
                            .map(|(_, v)| v.to_string())
                            .unwrap_or_default();
                        row.add_cell(Cell::new(value));
                    }
                    row
                })
                .collect();

            list(Row::from(header), rows)
        }
    };

    match &chart.title {
        Some(title) => format!("{title} ({})\n{plot}", chart.kind),
        None => plot,
    }
}

fn list(header: Row, rows: Vec<Row>) -> String {
    let mut table = comfy_table::Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(header);
    table.add_rows(rows);

    table.trim_fmt()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn parse(value: serde_json::Value) -> Response {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn text_is_printed_as_is() {
        assert_eq!(response(&Response::text("hello")), "hello");
    }

    #[test]
    fn table_is_rendered_as_grid() {
        let out = response(&parse(json!({
            "type": "table",
            "message": "Results",
            "table": { "head": ["name", "count"], "body": [["a", 1], ["b", null]] }
        })));

        assert!(out.starts_with("Results\n\n"), "{out}");
        for needle in ["name", "count", "a", "1", "b"] {
            assert!(out.contains(needle), "missing {needle}: {out}");
        }
    }

    #[test]
    fn single_series_chart_lists_points() {
        let out = response(&parse(json!({
            "type": "chart",
            "message": "",
            "chart": {
                "type": "bar",
                "title": "Sales",
                "yLabel": "units",
                "data": { "labels": ["q1", "q2"], "datasets": [{ "name": "s", "values": [3, "x"] }] }
            }
        })));

        assert!(out.starts_with("Sales (bar)\n"), "{out}");
        assert!(out.contains("units"), "{out}");
        assert!(out.contains("q1") && out.contains('3'), "{out}");
        assert!(out.contains("q2") && out.contains('0'), "{out}");
    }

    #[test]
    fn unknown_chart_kind_is_unsupported() {
        let out = response(&parse(json!({
            "type": "chart",
            "chart": { "type": "pie", "data": { "labels": ["a"], "datasets": [] } }
        })));

        assert_eq!(out, UNSUPPORTED);
    }

    #[test]
    fn unknown_type_is_unsupported() {
        assert_eq!(response(&parse(json!({ "type": "map" }))), UNSUPPORTED);
    }
}
