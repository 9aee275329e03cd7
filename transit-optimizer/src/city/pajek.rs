//! Pajek-style vertex text format.
//!
//! ```text
//! *vertices 3
//! 0 CBD 0 0 0 0 1
//! 1 P_1 15 0 1 1 1
//! 2 SC_1 10 0 2 1 1
//! ```
//!
//! Each vertex line is `<id> <name> <x> <y> <type-code> <zone> <weight>`.
//! Edges are not stored; they are rebuilt from the city structure.
//! Numbers are written with the shortest representation that parses back
//! to the same value, so export → parse → export is byte-identical.

use std::fmt::Write;

use super::graph::MAX_ZONES;
use super::{CityError, Graph, Node, NodeId, NodeKind};

const HEADER: &str = "*vertices";

/// Parse a graph from vertex text.
pub fn parse(text: &str) -> Result<Graph, CityError> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header) = lines
        .next()
        .ok_or_else(|| CityError::Format("empty graph text".to_string()))?;
    let declared = parse_header(header)?;

    let mut nodes = Vec::new();
    for (line_no, line) in lines {
        nodes.push(parse_vertex(line_no + 1, line, nodes.len())?);
    }

    if nodes.len() != declared {
        return Err(CityError::Format(format!(
            "header declares {declared} vertices but {} were given",
            nodes.len()
        )));
    }

    let zones = nodes.iter().map(|n| n.zone).max().unwrap_or(0);
    if zones > MAX_ZONES {
        return Err(CityError::Format(format!(
            "{zones} zones exceeds the limit of {MAX_ZONES}"
        )));
    }
    if nodes.len() != 2 * zones + 1 {
        return Err(CityError::Format(format!(
            "{zones} zones need {} vertices, found {}",
            2 * zones + 1,
            nodes.len()
        )));
    }

    Graph::from_structure(nodes)
}

/// Write a graph's vertices as text.
pub fn export(graph: &Graph) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = writeln!(out, "{HEADER} {}", graph.node_count());
    for node in graph.nodes() {
        let _ = writeln!(
            out,
            "{} {} {} {} {} {} {}",
            node.id,
            node.name,
            node.x,
            node.y,
            node.kind.code(),
            node.zone,
            node.weight
        );
    }
    out
}

fn parse_header(line: &str) -> Result<usize, CityError> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(keyword), Some(count), None) if keyword.eq_ignore_ascii_case(HEADER) => count
            .parse()
            .map_err(|_| CityError::Format(format!("invalid vertex count {count:?}"))),
        _ => Err(CityError::Format(format!(
            "expected '{HEADER} <count>' header, found {line:?}"
        ))),
    }
}

fn parse_vertex(line_no: usize, line: &str, expected_id: usize) -> Result<Node, CityError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let &[id, name, x, y, code, zone, weight] = fields.as_slice() else {
        return Err(CityError::Format(format!(
            "line {line_no}: expected 7 fields, found {}",
            fields.len()
        )));
    };

    let field_error =
        |what: &str, value: &str| CityError::Format(format!("line {line_no}: invalid {what} {value:?}"));

    let id: usize = id.parse().map_err(|_| field_error("id", id))?;
    if id != expected_id {
        return Err(CityError::Format(format!(
            "line {line_no}: expected id {expected_id}, found {id}"
        )));
    }
    let x: f64 = x.parse().map_err(|_| field_error("x", x))?;
    let y: f64 = y.parse().map_err(|_| field_error("y", y))?;
    let kind = code
        .parse()
        .ok()
        .and_then(NodeKind::from_code)
        .ok_or_else(|| field_error("type code", code))?;
    let zone: usize = zone.parse().map_err(|_| field_error("zone", zone))?;
    let weight: f64 = weight.parse().map_err(|_| field_error("weight", weight))?;

    if !x.is_finite() || !y.is_finite() || !weight.is_finite() {
        return Err(CityError::Format(format!(
            "line {line_no}: numbers must be finite"
        )));
    }
    if weight < 0.0 {
        return Err(CityError::Format(format!(
            "line {line_no}: weight must be non-negative, found {weight}"
        )));
    }

    let mut node = Node::new(NodeId(id), name, x, y, kind, zone);
    node.weight = weight;
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::GraphParameters;

    const ONE_ZONE: &str = "*vertices 3\n0 CBD 0 0 0 0 1\n1 P_1 15 0 1 1 1\n2 SC_1 10 0 2 1 1\n";

    #[test]
    fn parse_one_zone() {
        let graph = parse(ONE_ZONE).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edges().len(), 4);
        assert_eq!(graph.node(NodeId(1)).unwrap().kind, NodeKind::Periphery);
        assert_eq!(graph.node(NodeId(2)).unwrap().x, 10.0);
    }

    #[test]
    fn export_is_stable() {
        let graph = parse(ONE_ZONE).unwrap();
        assert_eq!(export(&graph), ONE_ZONE);
    }

    #[test]
    fn header_is_case_insensitive() {
        let text = ONE_ZONE.replace("*vertices", "*Vertices");
        assert!(parse(&text).is_ok());
    }

    #[test]
    fn reject_wrong_line_count() {
        let text = "*vertices 2\n0 CBD 0 0 0 0 1\n1 P_1 15 0 1 1 1\n";
        let err = parse(text).unwrap_err();
        assert!(matches!(err, CityError::Format(_)));
        assert!(err.to_string().contains("need 3 vertices"));
    }

    #[test]
    fn reject_header_mismatch() {
        let text = ONE_ZONE.replace("*vertices 3", "*vertices 4");
        assert!(parse(&text).is_err());
    }

    #[test]
    fn reject_bad_numbers() {
        let text = ONE_ZONE.replace("15 0 1 1 1", "fifteen 0 1 1 1");
        let err = parse(&text).unwrap_err();
        assert_eq!(
            err,
            CityError::Format("line 3: invalid x \"fifteen\"".to_string())
        );

        let text = ONE_ZONE.replace("15 0 1 1 1", "15 0 7 1 1");
        assert!(parse(&text).is_err());
    }

    #[test]
    fn reject_negative_weight() {
        let text = ONE_ZONE.replace("10 0 2 1 1", "10 0 2 1 -0.5");
        assert_eq!(
            parse(&text).unwrap_err(),
            CityError::Format("line 4: weight must be non-negative, found -0.5".to_string())
        );
    }

    #[test]
    fn reject_missing_fields_and_header() {
        assert!(parse("").is_err());
        assert!(parse("0 CBD 0 0 0 0 1\n").is_err());
        assert!(parse("*vertices 1\n0 CBD 0 0 0\n").is_err());
    }

    #[test]
    fn reject_too_many_zones() {
        let mut text = String::from("*vertices 3\n0 CBD 0 0 0 0 1\n");
        text.push_str("1 P_1 15 0 1 5001 1\n2 SC_1 10 0 2 5001 1\n");
        let err = parse(&text).unwrap_err();
        assert!(err.to_string().contains("exceeds the limit"));
    }

    #[test]
    fn reject_incomplete_zone() {
        let text = "*vertices 3\n0 CBD 0 0 0 0 1\n1 P_1 15 0 1 1 1\n2 P_2 10 0 1 1 1\n";
        assert!(parse(text).is_err());
    }

    #[test]
    fn roundtrip_parameter_graph() {
        let graph = Graph::build_from_parameters(&GraphParameters::new(6, 8.0, 0.75, 1.5)).unwrap();
        let text = export(&graph);
        let parsed = parse(&text).unwrap();

        assert_eq!(parsed.nodes(), graph.nodes());
        assert_eq!(parsed.edges(), graph.edges());
        assert_eq!(export(&parsed), text);
    }
}
