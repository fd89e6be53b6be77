//! Rank history table parsing.
//!
//! The table's header row names the columns; metric headers carry the unit
//! of the whole column, e.g. `Rmax (PFlop/s)`. Each following row is one list
//! edition the system appeared in.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use top500_core::{Amount, ListDate, Measurement, Metric, Quantity, RankingEntry, Unit};
use tracing::debug;

use crate::table::cell_text;

static RANK_TABLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("table.table-responsive, .table-responsive table:not(.table-condensed)")
        .expect("valid selector")
});
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
static TH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th").expect("valid selector"));
static TD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").expect("valid selector"));

static METRIC_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(Rmax|Rpeak)\s*\(([^)]+)\)$").expect("valid metric header regex")
});

#[derive(Debug, Clone, Copy, PartialEq)]
enum Column {
    Rank,
    List,
    Metric(Metric, Unit),
    Other,
}

fn classify(header: &str) -> Column {
    let header = header.replace(':', "");
    let header = header.trim();
    match header {
        "Rank" => Column::Rank,
        "List" => Column::List,
        _ => {
            let Some(caps) = METRIC_HEADER_RE.captures(header) else {
                return Column::Other;
            };
            let metric = Metric::from_label(&caps[1]);
            let unit = Unit::from_suffix(&caps[2]);
            match (metric, unit) {
                (Some(m), Some(u)) => Column::Metric(m, u),
                _ => {
                    debug!(header, "metric column with unknown unit ignored");
                    Column::Other
                }
            }
        }
    }
}

/// Parse the rank table into entries, in table order.
///
/// Rows without a numeric rank are dropped. A row without a usable `List`
/// date takes the date of the closest preceding dated row.
pub fn parse_rankings(doc: &Html) -> Vec<RankingEntry> {
    let mut entries = Vec::new();
    let Some(table) = doc.select(&RANK_TABLE).next() else {
        return entries;
    };

    let mut columns: Option<Vec<Column>> = None;
    let mut last_date: Option<ListDate> = None;

    for row in table.select(&ROW) {
        if columns.is_none() {
            let headers: Vec<Column> = row.select(&TH).map(|th| classify(&cell_text(th))).collect();
            if !headers.is_empty() {
                columns = Some(headers);
            }
            continue;
        }
        let Some(cols) = columns.as_ref() else {
            continue;
        };

        let cells: Vec<String> = row.select(&TD).map(cell_text).collect();
        if cells.is_empty() {
            continue;
        }

        let mut rank = None;
        let mut date = None;
        let mut measurements = Vec::new();
        for (col, cell) in cols.iter().zip(&cells) {
            match *col {
                Column::Rank => rank = cell.parse::<u32>().ok(),
                Column::List => date = ListDate::parse(cell),
                Column::Metric(metric, unit) => match Amount::parse(cell) {
                    Some(amount) => measurements.push(Measurement {
                        metric,
                        value: Quantity::new(amount, Some(unit)),
                    }),
                    None => debug!(metric = ?metric, cell = %cell, "unparseable metric cell"),
                },
                Column::Other => {}
            }
        }

        if date.is_some() {
            last_date = date;
        }
        let Some(rank) = rank else {
            debug!(cells = ?cells, "ranking row without rank dropped");
            continue;
        };
        entries.push(RankingEntry {
            rank,
            date: last_date,
            measurements,
        });
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANK_HTML: &str = r#"
        <div class="table-responsive">
        <table class="table">
          <thead>
            <tr><th>List</th><th>Rank</th><th>System</th><th>Vendor</th><th>Total Cores</th>
                <th>Rmax (PFlop/s)</th><th>Rpeak (PFlop/s)</th><th>Power (kW)</th></tr>
          </thead>
          <tbody>
            <tr><td>11/2023</td><td>1</td><td>HPE Cray EX235a</td><td>HPE</td><td>8,699,904</td>
                <td>1,194.00</td><td>1,679.82</td><td>22,703</td></tr>
            <tr><td>06/2023</td><td>2</td><td>HPE Cray EX235a</td><td>HPE</td><td>8,699,904</td>
                <td>1,194.00</td><td></td><td>22,703</td></tr>
            <tr><td>11/2022</td><td></td><td>HPE Cray EX235a</td><td>HPE</td><td>8,730,112</td>
                <td>1,102.00</td><td>1,685.65</td><td>21,100</td></tr>
          </tbody>
        </table>
        </div>
    "#;

    #[test]
    fn entries_in_table_order() {
        let entries = parse_rankings(&Html::parse_document(RANK_HTML));
        assert_eq!(entries.len(), 2, "row without rank is dropped");
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[1].rank, 2);
        assert_eq!(entries[0].date, Some(ListDate { year: 2023, month: 11 }));
        assert_eq!(entries[1].date, Some(ListDate { year: 2023, month: 6 }));
    }

    #[test]
    fn metrics_take_header_unit() {
        let entries = parse_rankings(&Html::parse_document(RANK_HTML));
        let rmax = entries[0].measurement(Metric::Rmax).unwrap();
        assert_eq!(rmax.amount.as_str(), "1194");
        assert_eq!(rmax.unit, Some(Unit::PetaFlops));
        let rpeak = entries[0].measurement(Metric::Rpeak).unwrap();
        assert_eq!(rpeak.amount.as_str(), "1679.82");
    }

    #[test]
    fn empty_metric_cell_is_dropped() {
        let entries = parse_rankings(&Html::parse_document(RANK_HTML));
        assert!(entries[1].measurement(Metric::Rmax).is_some());
        assert!(entries[1].measurement(Metric::Rpeak).is_none());
    }

    #[test]
    fn undated_row_inherits_previous_date() {
        let html = r#"<table class="table-responsive">
            <tr><th>List</th><th>Rank</th><th>Rmax (TFlops)</th></tr>
            <tr><td>06/2010</td><td>5</td><td>1,042.00</td></tr>
            <tr><td></td><td>7</td><td>1,042.00</td></tr>
        </table>"#;
        let entries = parse_rankings(&Html::parse_document(html));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].date, entries[0].date);
        assert_eq!(
            entries[1].measurement(Metric::Rmax).unwrap().unit,
            Some(Unit::TeraFlops)
        );
    }

    #[test]
    fn no_table_no_entries() {
        assert!(parse_rankings(&Html::parse_document("<p>nothing</p>")).is_empty());
    }

    #[test]
    fn unknown_metric_unit_column_ignored() {
        assert_eq!(classify("Rmax (furlongs)"), Column::Other);
        assert_eq!(classify("Rpeak (GFlop/s)"), Column::Metric(Metric::Rpeak, Unit::GigaFlops));
        assert_eq!(classify("Rank:"), Column::Rank);
    }
}
