//! XML and WaterML 1.1 decoding on top of `roxmltree`.

use crate::decode::error::DecodeError;
use crate::decode::Record;
use roxmltree::{Document, Node};
use serde_json::Value;

/// Local tag name, without namespace.
fn tag_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

fn find_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && tag_name(*child) == tag)
}

fn find_children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |child| child.is_element() && tag_name(*child) == tag)
}

fn find_descendant<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.descendants()
        .find(|child| child.is_element() && tag_name(*child) == tag)
}

fn text_of(node: Node<'_, '_>) -> String {
    node.text().map(str::trim).unwrap_or_default().to_string()
}

/// Decodes repeated item elements into records.
///
/// `item_path` is followed from the root element; the elements matching its last
/// segment are the items. With an empty path every child of the root is an item.
/// Each record holds the item's attributes, the text of each leaf child, and each
/// child attribute as `child.attribute`.
pub fn decode_xml(body: &str, item_path: &[&str]) -> Result<Vec<Record>, DecodeError> {
    let document = Document::parse(body)?;
    let mut parent = document.root_element();

    let items: Vec<Node<'_, '_>> = match item_path.split_last() {
        None => parent.children().filter(Node::is_element).collect(),
        Some((item_tag, ancestors)) => {
            for tag in ancestors {
                parent = find_child(parent, tag).ok_or_else(|| {
                    DecodeError::UnexpectedShape(format!("missing <{}> element", tag))
                })?;
            }
            find_children(parent, item_tag).collect()
        }
    };

    Ok(items.into_iter().map(item_record).collect())
}

fn item_record(item: Node<'_, '_>) -> Record {
    let mut record = Record::new();
    for attribute in item.attributes() {
        record.insert(
            attribute.name().to_string(),
            Value::String(attribute.value().to_string()),
        );
    }
    for child in item.children().filter(Node::is_element) {
        let name = tag_name(child);
        if !child.children().any(|node| node.is_element()) {
            record.insert(name.to_string(), Value::String(text_of(child)));
        }
        for attribute in child.attributes() {
            record.insert(
                format!("{}.{}", name, attribute.name()),
                Value::String(attribute.value().to_string()),
            );
        }
    }
    record
}

/// Decodes rows whose fields are stored as attribute pairs on repeated column elements,
/// e.g. `<Row><Column colname="Name" value="pH"/></Row>`.
pub fn decode_column_rows(
    body: &str,
    row_tag: &str,
    column_tag: &str,
    name_attribute: &str,
    value_attribute: &str,
) -> Result<Vec<Record>, DecodeError> {
    let document = Document::parse(body)?;
    Ok(document
        .descendants()
        .filter(|node| node.is_element() && tag_name(*node) == row_tag)
        .map(|row| {
            find_children(row, column_tag)
                .filter_map(|column| {
                    let name = column.attribute(name_attribute)?;
                    let value = column.attribute(value_attribute).unwrap_or_default();
                    Some((name.to_string(), Value::String(value.to_string())))
                })
                .collect()
        })
        .collect())
}

/// Decodes a WaterML 1.1 response into one record per value.
///
/// Site and variable metadata are repeated on every row: `site_name`, `site_code`,
/// `variable_name`, `variable_code`, `unit`, `latitude`, `longitude`, then `date`,
/// `value` and `qualifiers`.
pub fn decode_waterml(body: &str) -> Result<Vec<Record>, DecodeError> {
    let document = Document::parse(body)?;
    let root = document.root_element();

    let mut records = Vec::new();
    for series in find_children(root, "timeSeries") {
        let site = find_child(series, "sourceInfo")
            .ok_or_else(|| DecodeError::UnexpectedShape("missing <sourceInfo>".to_string()))?;
        let variable = find_child(series, "variable")
            .ok_or_else(|| DecodeError::UnexpectedShape("missing <variable>".to_string()))?;

        let mut metadata = Record::new();
        metadata.insert("site_name".to_string(), leaf_text(site, "siteName"));
        metadata.insert("site_code".to_string(), leaf_text(site, "siteCode"));
        metadata.insert("variable_name".to_string(), leaf_text(variable, "variableName"));
        metadata.insert("variable_code".to_string(), leaf_text(variable, "variableCode"));
        metadata.insert("unit".to_string(), leaf_text(variable, "unitCode"));
        metadata.insert("latitude".to_string(), leaf_number(site, "latitude"));
        metadata.insert("longitude".to_string(), leaf_number(site, "longitude"));

        let Some(values) = find_child(series, "values") else {
            continue;
        };
        for value in find_children(values, "value") {
            let mut record = metadata.clone();
            record.insert(
                "date".to_string(),
                Value::String(value.attribute("dateTime").unwrap_or_default().to_string()),
            );
            record.insert("value".to_string(), number_or_text(&text_of(value)));
            record.insert(
                "qualifiers".to_string(),
                Value::String(value.attribute("qualifiers").unwrap_or_default().to_string()),
            );
            records.push(record);
        }
    }
    Ok(records)
}

fn leaf_text(node: Node<'_, '_>, tag: &str) -> Value {
    find_descendant(node, tag)
        .map(|found| Value::String(text_of(found)))
        .unwrap_or(Value::Null)
}

fn leaf_number(node: Node<'_, '_>, tag: &str) -> Value {
    find_descendant(node, tag)
        .map(|found| number_or_text(&text_of(found)))
        .unwrap_or(Value::Null)
}

fn number_or_text(text: &str) -> Value {
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_by_path() {
        let body = r#"<Cocorahs>
            <DailyPrecipReports>
                <DailyPrecipReport>
                    <StationNumber>MN-HN-12</StationNumber>
                    <TotalPrecipAmt units="in">0.25</TotalPrecipAmt>
                </DailyPrecipReport>
                <DailyPrecipReport>
                    <StationNumber>MN-HN-13</StationNumber>
                    <TotalPrecipAmt units="in">T</TotalPrecipAmt>
                </DailyPrecipReport>
            </DailyPrecipReports>
        </Cocorahs>"#;
        let records = decode_xml(body, &["DailyPrecipReports", "DailyPrecipReport"]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["StationNumber"], "MN-HN-12");
        assert_eq!(records[1]["TotalPrecipAmt"], "T");
        assert_eq!(records[1]["TotalPrecipAmt.units"], "in");
    }

    #[test]
    fn test_root_children_with_namespace() {
        let body = r#"<WQXElement xmlns="http://www.exchangenetwork.net/schema/wqx/2">
            <WQXElementRow id="1"><Name>pH</Name></WQXElementRow>
            <WQXElementRow id="2"><Name>Temperature, water</Name></WQXElementRow>
        </WQXElement>"#;
        let records = decode_xml(body, &[]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["id"], "2");
        assert_eq!(records[1]["Name"], "Temperature, water");
    }

    #[test]
    fn test_missing_path() {
        assert!(matches!(
            decode_xml("<root/>", &["missing", "item"]),
            Err(DecodeError::UnexpectedShape(_))
        ));
    }

    #[test]
    fn test_waterml() {
        let body = r#"<ns1:timeSeriesResponse xmlns:ns1="http://www.cuahsi.org/waterML/1.1/">
          <ns1:timeSeries name="USGS:05331000:00060:00003">
            <ns1:sourceInfo>
              <ns1:siteName>MISSISSIPPI RIVER AT ST. PAUL, MN</ns1:siteName>
              <ns1:siteCode network="NWIS" agencyCode="USGS">05331000</ns1:siteCode>
              <ns1:geoLocation>
                <ns1:geogLocation>
                  <ns1:latitude>44.94444444</ns1:latitude>
                  <ns1:longitude>-93.0886111</ns1:longitude>
                </ns1:geogLocation>
              </ns1:geoLocation>
            </ns1:sourceInfo>
            <ns1:variable>
              <ns1:variableCode network="NWIS">00060</ns1:variableCode>
              <ns1:variableName>Streamflow, ft&#179;/s</ns1:variableName>
              <ns1:unit><ns1:unitCode>ft3/s</ns1:unitCode></ns1:unit>
            </ns1:variable>
            <ns1:values>
              <ns1:value qualifiers="A" dateTime="2014-07-01T00:00:00.000">41400</ns1:value>
              <ns1:value qualifiers="A" dateTime="2014-07-02T00:00:00.000">43100</ns1:value>
            </ns1:values>
          </ns1:timeSeries>
        </ns1:timeSeriesResponse>"#;
        let records = decode_waterml(body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["site_code"], "05331000");
        assert_eq!(records[0]["variable_code"], "00060");
        assert_eq!(records[0]["unit"], "ft3/s");
        assert_eq!(records[1]["date"], "2014-07-02T00:00:00.000");
        assert_eq!(records[1]["value"], 43100.0);
        assert_eq!(records[0]["latitude"], 44.94444444);
    }
}
