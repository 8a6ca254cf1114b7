//! Input data for the bar-chart, word-cloud and graph renderers.
//!
//! Nothing here draws anything. Each function shapes analysis results into the
//! structure one renderer consumes; all of them serialize to JSON.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::{Position, ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Pixel size a node gets per neighbour.
pub const NODE_SIZE_PER_DEGREE: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChartData {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub labels: Vec<String>,
    pub values: Vec<usize>,
}

/// Title and axis labels of a bar chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartText {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

impl Default for ChartText {
    fn default() -> Self {
        Self {
            title: "词频统计".to_string(),
            x_label: "词语".to_string(),
            y_label: "频率".to_string(),
        }
    }
}

/// Take the first `limit` rows of an already ranked table. The order is kept
/// as given.
pub fn for_bar_chart(table: &[(String, usize)], limit: usize, text: ChartText) -> BarChartData {
    let rows = &table[..limit.min(table.len())];
    BarChartData {
        title: text.title,
        x_label: text.x_label,
        y_label: text.y_label,
        labels: rows.iter().map(|(w, _)| w.clone()).collect(),
        values: rows.iter().map(|(_, c)| *c).collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordCloudOptions {
    pub width: u32,
    pub height: u32,
    pub background: String,
    /// A font with CJK glyphs; renderers fall back to boxes without one.
    pub font_path: String,
}

impl Default for WordCloudOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            background: "white".to_string(),
            font_path: "simhei.ttf".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordCloudData {
    /// Raw counts, not normalized.
    pub weights: HashMap<String, usize>,
    pub options: WordCloudOptions,
}

pub fn for_word_cloud(table: &[(String, usize)], options: WordCloudOptions) -> WordCloudData {
    WordCloudData {
        weights: table.iter().cloned().collect(),
        options,
    }
}

/// Undirected, weighted interaction between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

impl Relationship {
    pub fn new(source: impl Into<String>, target: impl Into<String>, weight: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight,
        }
    }
}

/// Sample relationships shown when the user supplies none.
pub fn default_relationships() -> Vec<Relationship> {
    vec![
        Relationship::new("刘备", "关羽", 5.0),
        Relationship::new("关羽", "张飞", 4.0),
        Relationship::new("刘备", "张飞", 5.0),
        Relationship::new("曹操", "刘备", 3.0),
        Relationship::new("曹操", "孙权", 2.0),
        Relationship::new("孙权", "刘备", 2.0),
    ]
}

/// Read `source<TAB>target<TAB>weight` lines. Blank lines and lines starting
/// with `#` are skipped; fields may be quoted the way [`crate::sink`] writes them.
pub fn load_relationships(path: &Path) -> Result<Vec<Relationship>> {
    let content =
        fs::read_to_string(path).map_err(|e| AnalysisError::io("Read relationships", path, e))?;
    let parse_err = |line: usize, message: String| AnalysisError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());
    let mut record = StringRecord::new();
    let mut out = Vec::new();
    loop {
        match reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line() as usize);
                return Err(parse_err(line, e.to_string()));
            }
        }
        if record.iter().all(str::is_empty) {
            // whitespace-only line
            continue;
        }
        let line = record_line(&content, reader.position());
        if record.len() != 3 {
            return Err(parse_err(
                line,
                format!("expected 3 tab-separated fields, found {}", record.len()),
            ));
        }
        let (source, target, weight) = (&record[0], &record[1], &record[2]);
        let weight: f64 = weight
            .parse()
            .map_err(|_| parse_err(line, format!("weight '{weight}' is not a number")))?;
        out.push(Relationship::new(source, target, weight));
    }
    Ok(out)
}

/// 1-based line of the record the reader has just finished at `end`.
fn record_line(content: &str, end: &Position) -> usize {
    let line = end.line() as usize;
    let consumed = content
        .as_bytes()
        .get(..end.byte() as usize)
        .unwrap_or(content.as_bytes());
    // the terminating newline has already been counted
    if consumed.ends_with(b"\n") {
        line.saturating_sub(1)
    } else {
        line
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    /// Number of distinct neighbours.
    pub degree: usize,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphData {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Build the graph description for the relationship renderer.
///
/// Node size follows the number of distinct neighbours, not the summed edge
/// weight: one strong link does not make an entity look central. A pair given
/// twice (in either direction) is a single edge carrying the last weight. A
/// self-loop is kept as an edge but is not a neighbour.
pub fn for_relationship_graph(relationships: &[Relationship]) -> Result<GraphData> {
    let mut order: Vec<String> = Vec::new();
    let mut neighbours: HashMap<String, Vec<String>> = HashMap::new();
    let mut edges: Vec<GraphEdge> = Vec::new();
    let mut edge_index: HashMap<(String, String), usize> = HashMap::new();

    for rel in relationships {
        if !(rel.weight.is_finite() && rel.weight > 0.0) {
            return Err(AnalysisError::InvalidRelationship {
                source_entity: rel.source.clone(),
                target_entity: rel.target.clone(),
                weight: rel.weight,
            });
        }
        for id in [&rel.source, &rel.target] {
            if !neighbours.contains_key(id) {
                neighbours.insert(id.clone(), Vec::new());
                order.push(id.clone());
            }
        }

        let key = if rel.source <= rel.target {
            (rel.source.clone(), rel.target.clone())
        } else {
            (rel.target.clone(), rel.source.clone())
        };
        match edge_index.get(&key) {
            Some(&i) => edges[i].weight = rel.weight,
            None => {
                edge_index.insert(key, edges.len());
                edges.push(GraphEdge {
                    source: rel.source.clone(),
                    target: rel.target.clone(),
                    weight: rel.weight,
                });
                if rel.source != rel.target {
                    for (a, b) in [(&rel.source, &rel.target), (&rel.target, &rel.source)] {
                        if let Some(list) = neighbours.get_mut(a) {
                            list.push(b.clone());
                        }
                    }
                }
            }
        }
    }

    let nodes = order
        .into_iter()
        .map(|id| {
            let degree = neighbours.get(&id).map_or(0, Vec::len);
            GraphNode {
                id,
                degree,
                size: degree as f64 * NODE_SIZE_PER_DEGREE,
            }
        })
        .collect();
    Ok(GraphData { nodes, edges })
}

/// Write any assembled structure as pretty JSON for an external renderer.
pub fn write_json<T: Serialize>(data: &T, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| AnalysisError::io("Create", path, e))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, data)
        .map_err(|e| AnalysisError::io("Write", path, e.into()))?;
    out.flush().map_err(|e| AnalysisError::io("Write", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[(&str, usize)]) -> Vec<(String, usize)> {
        rows.iter().map(|(w, c)| (w.to_string(), *c)).collect()
    }

    #[test]
    fn bar_chart_keeps_order_and_truncates() {
        // deliberately not sorted: the assembler must not re-sort
        let rows = table(&[("关羽", 1), ("刘备", 3), ("张飞", 2)]);
        let bar = for_bar_chart(&rows, 2, ChartText::default());
        assert_eq!(bar.labels, vec!["关羽", "刘备"]);
        assert_eq!(bar.values, vec![1, 3]);
        assert_eq!(bar.title, "词频统计");

        let all = for_bar_chart(&rows, 15, ChartText::default());
        assert_eq!(all.labels.len(), 3);
    }

    #[test]
    fn word_cloud_passes_raw_counts() {
        let rows = table(&[("刘备", 3), ("关羽", 1)]);
        let cloud = for_word_cloud(&rows, WordCloudOptions::default());
        assert_eq!(cloud.weights["刘备"], 3);
        assert_eq!(cloud.weights["关羽"], 1);
        assert_eq!(cloud.options.width, 800);
        assert_eq!(cloud.options.height, 600);
        assert_eq!(cloud.options.background, "white");
    }

    #[test]
    fn node_size_follows_degree_not_weight() {
        let graph = for_relationship_graph(&[
            Relationship::new("A", "B", 5.0),
            Relationship::new("B", "C", 4.0),
            Relationship::new("A", "C", 5.0),
        ])
        .unwrap();
        for id in ["A", "B", "C"] {
            let node = graph.node(id).unwrap();
            assert_eq!(node.degree, 2);
            assert_eq!(node.size, 40.0);
        }
        assert_eq!(graph.edges.len(), 3);
        assert_eq!(graph.edges[1].weight, 4.0);
    }

    #[test]
    fn default_relationships_degrees() {
        let graph = for_relationship_graph(&default_relationships()).unwrap();
        assert_eq!(graph.node("刘备").unwrap().degree, 4);
        assert_eq!(graph.node("关羽").unwrap().degree, 2);
        assert_eq!(graph.node("孙权").unwrap().degree, 2);
        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["刘备", "关羽", "张飞", "曹操", "孙权"]);
    }

    #[test]
    fn repeated_pair_is_one_edge_with_last_weight() {
        let graph = for_relationship_graph(&[
            Relationship::new("A", "B", 1.0),
            Relationship::new("B", "A", 7.0),
            Relationship::new("A", "A", 2.0),
        ])
        .unwrap();
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.edges[0].weight, 7.0);
        assert_eq!(graph.node("A").unwrap().degree, 1);
        assert_eq!(graph.node("B").unwrap().degree, 1);
    }

    #[test]
    fn non_positive_weight_is_rejected() {
        let err = for_relationship_graph(&[Relationship::new("A", "B", 0.0)]).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidRelationship { .. }));
        assert!(for_relationship_graph(&[Relationship::new("A", "B", f64::NAN)]).is_err());
    }

    #[test]
    fn relationships_file_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rel.tsv");
        fs::write(&path, "# a\tb\tw\n刘备\t关羽\t5\n\n曹操\t孙权\t2.5\n").unwrap();
        let rels = load_relationships(&path).unwrap();
        assert_eq!(rels.len(), 2);
        assert_eq!(rels[1], Relationship::new("曹操", "孙权", 2.5));

        fs::write(&path, "刘备\t关羽\n").unwrap();
        match load_relationships(&path).unwrap_err() {
            AnalysisError::Parse { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn relationships_errors_name_the_file_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rel.tsv");
        fs::write(&path, "# header\n  \n刘备\t关羽\t5\n曹操\t孙权\tmany\n").unwrap();
        match load_relationships(&path).unwrap_err() {
            AnalysisError::Parse { line, message, .. } => {
                assert_eq!(line, 4);
                assert!(message.contains("many"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }

        fs::write(&path, "刘备\t关羽\t5\n曹操\t孙权\t1\t9").unwrap();
        match load_relationships(&path).unwrap_err() {
            AnalysisError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn relationships_accept_quoted_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rel.tsv");
        fs::write(&path, "\"刘\t备\"\t关羽\t3\n").unwrap();
        let rels = load_relationships(&path).unwrap();
        assert_eq!(rels, vec![Relationship::new("刘\t备", "关羽", 3.0)]);
    }

    #[test]
    fn graph_serializes_to_json() {
        let graph = for_relationship_graph(&[Relationship::new("A", "B", 1.5)]).unwrap();
        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(json["nodes"][0]["id"], "A");
        assert_eq!(json["nodes"][0]["degree"], 1);
        assert_eq!(json["edges"][0]["weight"], 1.5);
    }
}
