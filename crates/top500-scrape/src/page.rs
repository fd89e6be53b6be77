use scraper::Html;
use thiserror::Error;
use top500_core::{Record, SystemId};
use tracing::debug;

use crate::ranking::parse_rankings;
use crate::table::{parse_spec_table, parse_title};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("system {0}: page has no system heading")]
    MissingTitle(SystemId),
}

/// Parse a full system page into a [`Record`].
///
/// Only a missing heading fails the page; every other problem degrades or
/// drops the affected field.
pub fn parse_record(id: SystemId, html: &str) -> Result<Record, ParseError> {
    let doc = Html::parse_document(html);
    let (name, platform) = parse_title(&doc).ok_or(ParseError::MissingTitle(id))?;

    let mut record = Record::new(id, name);
    record.platform = platform;
    record.fields = parse_spec_table(&doc);
    record.rankings = parse_rankings(&doc);

    debug!(
        id = %id,
        fields = record.fields.len(),
        rankings = record.rankings.len(),
        "parsed system page"
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use top500_core::{Field, FieldValue, Metric, Unit};

    const PAGE: &str = r#"<!DOCTYPE html>
        <html><head><title>Acme One - Acme Cluster, Acme CPU 2GHz | TOP500</title></head>
        <body>
          <h1>Acme One - Acme Cluster, Acme CPU 2GHz, Acme Link, Acme Corp</h1>
          <table class="table table-condensed">
            <tr><th>Manufacturer:</th><td>Acme Corp</td></tr>
            <tr><th>Favourite Colour:</th><td>teal</td></tr>
          </table>
          <div class="table-responsive"><table class="table">
            <tr><th>List</th><th>Rank</th><th>Rmax (PFlop/s)</th></tr>
            <tr><td>11/2023</td><td>1</td><td>1.50</td></tr>
          </table></div>
        </body></html>"#;

    #[test]
    fn full_page() {
        let record = parse_record(SystemId(123), PAGE).unwrap();
        assert_eq!(record.id, SystemId(123));
        assert_eq!(record.name, "Acme One");
        assert_eq!(record.platform.as_deref(), Some("Acme Cluster"));
        assert_eq!(record.fields.len(), 1);
        assert_eq!(
            record.field(Field::Manufacturer),
            Some(&FieldValue::Text("Acme Corp".into()))
        );

        assert_eq!(record.rankings.len(), 1);
        let rmax = record.rankings[0].measurement(Metric::Rmax).unwrap();
        assert_eq!(rmax.amount.as_str(), "1.5");
        assert_eq!(rmax.unit, Some(Unit::PetaFlops));
        assert_eq!(record.rankings[0].date.unwrap().to_string(), "2023-11");
    }

    #[test]
    fn page_without_heading_fails() {
        let err = parse_record(SystemId(0), "<html><body>Not found</body></html>").unwrap_err();
        assert!(matches!(err, ParseError::MissingTitle(SystemId(0))));
    }
}
