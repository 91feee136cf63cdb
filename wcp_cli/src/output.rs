//! Output files: the appended summary CSV, the per-iteration runtime CSV
//! and the GraphML solution dump.

use cabling::report::{RuntimeRow, SummaryRow};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use windfarm::{Instance, Windfarm};

/// Appends the summary row, writing the header first when the file is new
/// or empty.
pub fn append_summary(path: &Path, summary: &SummaryRow) -> io::Result<()> {
    let needs_header = std::fs::metadata(path).map(|meta| meta.len() == 0).unwrap_or(true);
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::new(file);
    if needs_header {
        SummaryRow::write_header(&mut writer)?;
    }
    summary.write_row(&mut writer)?;
    writer.flush()
}

pub fn write_runtime_rows(path: &Path, rows: &[RuntimeRow]) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    RuntimeRow::write_header(&mut writer)?;
    for row in rows {
        row.write_row(&mut writer)?;
    }
    writer.flush()
}

/// Writes the solution as GraphML: node coordinates, and per original edge
/// its id as label and its flow as weight.
pub fn write_graphml(path: &Path, instance: &Instance, farm: &Windfarm) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(writer, r#"<graphml xmlns="http://graphml.graphdrawing.org/xmlns">"#)?;
    writeln!(writer, r#"  <key id="x" for="node" attr.name="x" attr.type="double"/>"#)?;
    writeln!(writer, r#"  <key id="y" for="node" attr.name="y" attr.type="double"/>"#)?;
    writeln!(writer, r#"  <key id="label" for="edge" attr.name="label" attr.type="string"/>"#)?;
    writeln!(writer, r#"  <key id="weight" for="edge" attr.name="weight" attr.type="double"/>"#)?;
    writeln!(writer, r#"  <graph id="G" edgedefault="undirected">"#)?;

    for id in 0..instance.num_nodes() {
        let node = instance.node(id);
        writeln!(
            writer,
            r#"    <node id="n{}"><data key="x">{}</data><data key="y">{}</data></node>"#,
            id, node.x, node.y
        )?;
    }
    for edge in 0..farm.num_original_edges() {
        writeln!(
            writer,
            r#"    <edge id="e{}" source="n{}" target="n{}"><data key="label">{}</data><data key="weight">{}</data></edge>"#,
            edge,
            farm.start_vertex(edge),
            farm.end_vertex(edge),
            edge,
            farm.flow(edge)
        )?;
    }

    writeln!(writer, "  </graph>")?;
    writeln!(writer, "</graphml>")?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cabling::mocks;

    #[test]
    fn summary_header_is_written_once() {
        let dir = std::env::temp_dir().join("wcp-summary-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("general.csv");
        let _ = std::fs::remove_file(&path);

        let summary = SummaryRow::new("run".into(), 0, 1);
        append_summary(&path, &summary).unwrap();
        append_summary(&path, &summary).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert_eq!(text.lines().filter(|line| line.starts_with("Name,")).count(), 1);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn graphml_contains_flows() {
        let mut instance = windfarm::Instance::with_default_cables(0, 1);
        let t = instance.add_turbine(0.0, 0.0);
        let s = instance.add_substation(10.0, 0.0, 5);
        instance.add_edge(t, s);
        let mut farm = windfarm::Windfarm::new(&instance);
        mocks::route_unit(&mut farm, &[0]);

        let dir = std::env::temp_dir().join("wcp-graphml-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("solution.graphml");
        write_graphml(&path, &instance, &farm).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains(r#"<node id="n0">"#));
        assert!(text.contains(r#"<data key="weight">1</data>"#));
        let _ = std::fs::remove_file(&path);
    }
}
