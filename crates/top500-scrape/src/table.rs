//! Specification table and title parsing.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use top500_core::{Field, FieldValue, Quantity};
use tracing::{debug, trace};

static SPEC_TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.table-condensed").expect("valid selector"));
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
static TH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th").expect("valid selector"));
static TD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").expect("valid selector"));
static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").expect("valid selector"));

/// Element text with whitespace runs collapsed to one space and trimmed.
pub(crate) fn cell_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn joined_text(row: ElementRef<'_>, sel: &Selector) -> String {
    row.select(sel)
        .map(cell_text)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// System name and platform from the page heading.
///
/// Headings read `"<name> - <platform>, <processor>, <interconnect>, <vendor>"`;
/// the platform is the first comma-separated part after the dash.
pub fn parse_title(doc: &Html) -> Option<(String, Option<String>)> {
    let heading = cell_text(doc.select(&H1).next()?);
    let (name, rest) = match heading.split_once(" - ") {
        Some((name, rest)) => (name.trim(), Some(rest)),
        None => (heading.trim(), None),
    };
    if name.is_empty() {
        return None;
    }
    let platform = rest
        .and_then(|r| r.split(", ").next())
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);
    Some((name.to_string(), platform))
}

fn parse_value(field: Field, raw: String) -> FieldValue {
    if !field.is_numeric() {
        return FieldValue::Text(raw);
    }
    match Quantity::parse(&raw) {
        Some(q) => FieldValue::Quantity(q),
        None => {
            debug!(field = %field, value = %raw, "numeric field kept as text");
            FieldValue::Text(raw)
        }
    }
}

/// Parse the specification table into recognised fields.
///
/// Unrecognised labels and empty value cells are skipped. If a label repeats,
/// the first non-empty occurrence wins.
pub fn parse_spec_table(doc: &Html) -> BTreeMap<Field, FieldValue> {
    let mut fields = BTreeMap::new();
    let Some(table) = doc.select(&SPEC_TABLE).next() else {
        debug!("no specification table on page");
        return fields;
    };

    for row in table.select(&ROW) {
        let label = joined_text(row, &TH).replace(':', "");
        let label = label.trim();
        if label.is_empty() {
            continue;
        }
        let Some(field) = Field::from_label(label) else {
            trace!(label, "ignoring unrecognised row");
            continue;
        };
        let value = joined_text(row, &TD);
        if value.is_empty() || fields.contains_key(&field) {
            continue;
        }
        fields.insert(field, parse_value(field, value));
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use top500_core::Unit;

    const SPEC_HTML: &str = r#"
        <html><body>
        <h1>Frontier - HPE Cray EX235a, AMD Optimized 3rd Generation EPYC 64C 2GHz, AMD Instinct MI250X, Slingshot-11, HPE</h1>
        <table class="table table-condensed">
          <tr><th>Site:</th><td><a href="/site/48553">DOE/SC/Oak Ridge National Laboratory</a></td></tr>
          <tr><th>System URL:</th><td><a href="https://www.olcf.ornl.gov/frontier/">link</a></td></tr>
          <tr><th>Manufacturer:</th><td>HPE</td></tr>
          <tr><th>Cores:</th><td>8,699,904</td></tr>
          <tr><th>Memory:</th><td>4,866,560 GB</td></tr>
          <tr><th>Processor:</th><td>AMD Optimized 3rd Generation EPYC 64C 2GHz</td></tr>
          <tr><th>Interconnect:</th><td>Slingshot-11</td></tr>
          <tr><th>Installation Year:</th><td>2021</td></tr>
          <tr><th colspan="2">Performance</th></tr>
          <tr><th>Linpack Performance (Rmax)</th><td>1,353 PFlop/s</td></tr>
          <tr><th colspan="2">Power Consumption</th></tr>
          <tr><th>Power:</th><td>24,607.00 kW (Submitted)</td></tr>
          <tr><th colspan="2">Software</th></tr>
          <tr><th>Operating System:</th><td>
                HPE Cray    OS
          </td></tr>
          <tr><th>Compiler:</th><td></td></tr>
        </table>
        </body></html>
    "#;

    #[test]
    fn recognised_rows_only() {
        let doc = Html::parse_document(SPEC_HTML);
        let fields = parse_spec_table(&doc);

        // Site, Manufacturer, Cores, Memory, Processor, Interconnect,
        // Installation Year, Power, Operating System; Compiler is empty.
        assert_eq!(fields.len(), 9);
        assert_eq!(
            fields[&Field::Site],
            FieldValue::Text("DOE/SC/Oak Ridge National Laboratory".into())
        );
        assert_eq!(
            fields[&Field::OperatingSystem],
            FieldValue::Text("HPE Cray OS".into())
        );
        assert!(!fields.contains_key(&Field::Compiler));
    }

    #[test]
    fn numeric_rows_split_units() {
        let doc = Html::parse_document(SPEC_HTML);
        let fields = parse_spec_table(&doc);

        let FieldValue::Quantity(memory) = &fields[&Field::Memory] else {
            panic!("memory should be a quantity");
        };
        assert_eq!(memory.amount.as_str(), "4866560");
        assert_eq!(memory.unit, Some(Unit::Gigabyte));

        let FieldValue::Quantity(power) = &fields[&Field::PowerConsumption] else {
            panic!("power should be a quantity");
        };
        assert_eq!(power.amount.as_str(), "24607");
        assert_eq!(power.unit, Some(Unit::Kilowatt));

        let FieldValue::Quantity(cores) = &fields[&Field::Cores] else {
            panic!("cores should be a quantity");
        };
        assert_eq!(cores.unit, None);
    }

    #[test]
    fn unparseable_numeric_degrades_to_text() {
        let html = r#"<table class="table-condensed">
            <tr><th>Memory:</th><td>not disclosed</td></tr>
            <tr><th>Cores:</th><td>1,024</td></tr>
        </table>"#;
        let fields = parse_spec_table(&Html::parse_document(html));
        assert_eq!(fields[&Field::Memory], FieldValue::Text("not disclosed".into()));
        assert!(matches!(fields[&Field::Cores], FieldValue::Quantity(_)));
    }

    #[test]
    fn missing_table_yields_nothing() {
        let fields = parse_spec_table(&Html::parse_document("<html><p>gone</p></html>"));
        assert!(fields.is_empty());
    }

    #[test]
    fn title_splits_name_and_platform() {
        let doc = Html::parse_document(SPEC_HTML);
        let (name, platform) = parse_title(&doc).unwrap();
        assert_eq!(name, "Frontier");
        assert_eq!(platform.as_deref(), Some("HPE Cray EX235a"));
    }

    #[test]
    fn title_without_platform() {
        let doc = Html::parse_document("<h1>  Lonely   Cluster </h1>");
        assert_eq!(parse_title(&doc), Some(("Lonely Cluster".to_string(), None)));
        assert!(parse_title(&Html::parse_document("<p>no heading</p>")).is_none());
    }
}
