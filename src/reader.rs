use std::{fmt::Display, str::FromStr};

use crate::{
    datatypes::{Edge, MeshData, Triangle, Vertex},
    error::MeshPlotError,
};

/// First token of a line that is discarded as a comment
const COMMENT_MARKER: &str = ">";

#[derive(Debug, Clone, Copy)]
enum MeshSection {
    Nodes,
    Triangles,
    Edges,
}

impl MeshSection {
    fn name(&self) -> &'static str {
        match self {
            MeshSection::Nodes => "node",
            MeshSection::Triangles => "triangle",
            MeshSection::Edges => "edge",
        }
    }
}

/// A non-comment line together with its 1-based position in the file
#[derive(Debug, Clone, Copy)]
struct SourceLine<'a> {
    number: usize,
    text: &'a str,
}

impl<'a> SourceLine<'a> {
    fn fields(&self) -> Vec<&'a str> {
        self.text.split('\t').collect()
    }

    fn error(&self, section: MeshSection, message: String) -> MeshPlotError {
        MeshPlotError::Parse(format!(
            "line {} ({} section): {}",
            self.number,
            section.name(),
            message
        ))
    }

    /// Parses the tab field at `position`, ignoring column padding
    fn parse_field<T>(
        &self,
        fields: &[&str],
        position: usize,
        section: MeshSection,
    ) -> Result<T, MeshPlotError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = match fields.get(position) {
            Some(f) => f.trim(),
            None => {
                return Err(self.error(
                    section,
                    format!(
                        "expected at least {} tab-separated fields, found {}",
                        position + 1,
                        fields.len()
                    ),
                ))
            }
        };

        match raw.parse() {
            Ok(v) => Ok(v),
            Err(err) => Err(self.error(
                section,
                format!("bad value '{}' in field {}: {err}", raw, position + 1),
            )),
        }
    }
}

fn is_comment(line: &str) -> bool {
    line.split(' ').next() == Some(COMMENT_MARKER)
}

/// Splits the file into lines and drops comments, keeping order
fn strip_comments(contents: &str) -> Vec<SourceLine> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, text)| !is_comment(text))
        .map(|(i, text)| SourceLine {
            number: i + 1,
            text,
        })
        .collect()
}

/// Walks the comment-free lines one header or record at a time
struct SectionCursor<'a> {
    lines: Vec<SourceLine<'a>>,
    position: usize,
}

impl<'a> SectionCursor<'a> {
    fn new(lines: Vec<SourceLine<'a>>) -> SectionCursor<'a> {
        SectionCursor { lines, position: 0 }
    }

    fn next_line(
        &mut self,
        section: MeshSection,
        what: &str,
    ) -> Result<SourceLine<'a>, MeshPlotError> {
        match self.lines.get(self.position) {
            Some(line) => {
                self.position += 1;
                Ok(*line)
            }
            None => Err(MeshPlotError::Parse(format!(
                "unexpected end of file while reading {} {}",
                section.name(),
                what
            ))),
        }
    }

    /// Reads a `<label> <count>` header and returns the count
    fn read_header(&mut self, section: MeshSection) -> Result<usize, MeshPlotError> {
        let line = self.next_line(section, "header")?;

        let count = match line.text.split(' ').nth(1) {
            Some(c) => c.trim(),
            None => {
                return Err(line.error(
                    section,
                    format!("header '{}' is not of the form '<label> <count>'", line.text),
                ))
            }
        };

        match count.parse() {
            Ok(n) => Ok(n),
            Err(err) => Err(line.error(section, format!("bad record count '{count}': {err}"))),
        }
    }

    /// Reads a header and exactly as many records as it declares
    fn read_section<T, F>(
        &mut self,
        section: MeshSection,
        parse_record: F,
    ) -> Result<Vec<T>, MeshPlotError>
    where
        F: Fn(&SourceLine<'a>) -> Result<T, MeshPlotError>,
    {
        let count = self.read_header(section)?;
        let mut records: Vec<T> = Vec::with_capacity(count);

        for i in 0..count {
            let line = match self.next_line(section, "record") {
                Ok(l) => l,
                Err(_) => {
                    return Err(MeshPlotError::Parse(format!(
                        "{} section declares {} records but the file ends after {}",
                        section.name(),
                        count,
                        i
                    )))
                }
            };
            records.push(parse_record(&line)?);
        }

        Ok(records)
    }
}

fn parse_node(line: &SourceLine) -> Result<Vertex, MeshPlotError> {
    let fields = line.fields();
    let section = MeshSection::Nodes;

    // first field is the node label; position in the file decides the index
    Ok(Vertex {
        x: line.parse_field(&fields, 1, section)?,
        y: line.parse_field(&fields, 2, section)?,
    })
}

fn parse_triangle(line: &SourceLine) -> Result<Triangle, MeshPlotError> {
    let fields = line.fields();
    let section = MeshSection::Triangles;

    Ok(Triangle {
        index: line.parse_field(&fields, 0, section)?,
        nodes: [
            line.parse_field(&fields, 1, section)?,
            line.parse_field(&fields, 2, section)?,
            line.parse_field(&fields, 3, section)?,
        ],
    })
}

fn parse_edge(line: &SourceLine) -> Result<Edge, MeshPlotError> {
    let fields = line.fields();
    let section = MeshSection::Edges;

    // `<a> <b>` or the labelled `<i> <a> <b> <t0> <t1> <bdry>` layout
    let first = if fields.len() >= 3 { 1 } else { 0 };

    Ok(Edge {
        nodes: [
            line.parse_field(&fields, first, section)?,
            line.parse_field(&fields, first + 1, section)?,
        ],
    })
}

/// Parses the contents of a mesh file
///
/// # Arguments
/// * `contents` - The full text of the mesh file
///
/// # Returns
/// The parsed nodes, triangles and edges. Triangle and edge node references
/// are stored exactly as written and are not range-checked.
pub fn parse_mesh(contents: &str) -> Result<MeshData, MeshPlotError> {
    let mut cursor = SectionCursor::new(strip_comments(contents));

    let nodes = cursor.read_section(MeshSection::Nodes, parse_node)?;
    let triangles = cursor.read_section(MeshSection::Triangles, parse_triangle)?;
    let edges = cursor.read_section(MeshSection::Edges, parse_edge)?;

    Ok(MeshData {
        nodes,
        triangles,
        edges,
    })
}

/// Reads and parses a mesh file from disk
///
/// # Arguments
/// * `mesh_file` - The path to the mesh file
pub fn read_mesh(mesh_file: &str) -> Result<MeshData, MeshPlotError> {
    let contents = match std::fs::read_to_string(mesh_file) {
        Ok(c) => c,
        Err(err) => {
            return Err(MeshPlotError::Input(format!(
                "Unable to open mesh file {mesh_file}: {err}"
            )))
        }
    };

    let mesh = parse_mesh(&contents)?;

    println!(
        "info: loaded {} nodes, {} triangles and {} edges from {}",
        mesh.nodes.len(),
        mesh.triangles.len(),
        mesh.edges.len(),
        mesh_file
    );

    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    const SMALL_MESH: &str = "> comment\n\
        m 3\n\
        1\t0.0\t0.0\n\
        2\t1.0\t0.0\n\
        3\t0.0\t1.0\n\
        t 1\n\
        1\t0\t1\t2\n\
        e 0\n";

    #[test]
    fn test_small_mesh() {
        let mesh = parse_mesh(SMALL_MESH).unwrap();

        assert_eq!(
            mesh.nodes,
            vec![
                Vertex { x: 0.0, y: 0.0 },
                Vertex { x: 1.0, y: 0.0 },
                Vertex { x: 0.0, y: 1.0 },
            ]
        );
        assert_eq!(mesh.triangle_nodes(), vec![[0, 1, 2]]);
        assert_eq!(mesh.tri_index(), vec![1]);
        assert!(mesh.edges.is_empty());
    }

    #[test]
    fn test_empty_sections() {
        let mesh = parse_mesh("NODES 0\nTRIANGLES 0\nEDGES 0\n").unwrap();

        assert!(mesh.nodes.is_empty());
        assert!(mesh.triangles.is_empty());
        assert!(mesh.tri_index().is_empty());
        assert!(mesh.edges.is_empty());
    }

    #[test]
    fn test_node_label_is_ignored() {
        let mesh = parse_mesh("n 2\n42\t9.0\t9.0\n1\t2.5\t-3.25\nt 0\ne 0\n").unwrap();

        assert_eq!(mesh.nodes.len(), 2);
        assert_relative_eq!(mesh.nodes[1].x, 2.5);
        assert_relative_eq!(mesh.nodes[1].y, -3.25);
    }

    #[test]
    fn test_triangle_record() {
        let mesh = parse_mesh("n 0\nt 1\n7\t0\t1\t2\ne 0\n").unwrap();

        assert_eq!(mesh.triangles[0].nodes, [0, 1, 2]);
        assert_eq!(mesh.triangles[0].index, 7);
    }

    #[test]
    fn test_negative_node_references_kept() {
        let contents = "n 3\n\
            1\t0.0\t0.0\n\
            2\t1.0\t0.0\n\
            3\t0.0\t1.0\n\
            t 1\n\
            1\t0\t1\t-1\n\
            e 1\n\
            -1\t2\n";
        let mesh = parse_mesh(contents).unwrap();

        assert_eq!(mesh.triangle_nodes(), vec![[0, 1, -1]]);
        assert_eq!(mesh.edges, vec![Edge { nodes: [-1, 2] }]);
    }

    #[test]
    fn test_negative_count_rejected() {
        let err = parse_mesh("n -1\nt 0\ne 0\n").unwrap_err();

        match err {
            MeshPlotError::Parse(msg) => assert!(msg.starts_with("line 1 (node section)")),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_counts_match_headers() {
        let contents = "NODES 4\n\
            0\t0.0\t0.0\n\
            1\t1.0\t0.0\n\
            2\t1.0\t1.0\n\
            3\t0.0\t1.0\n\
            TRIANGLES 2\n\
            0\t0\t1\t2\n\
            1\t0\t2\t3\n\
            EDGES 5\n\
            0\t1\n\
            1\t2\n\
            2\t3\n\
            3\t0\n\
            0\t2\n";
        let mesh = parse_mesh(contents).unwrap();

        assert_eq!(mesh.nodes.len(), 4);
        assert_eq!(mesh.triangles.len(), 2);
        assert_eq!(mesh.tri_index().len(), 2);
        assert_eq!(mesh.edges.len(), 5);
        assert_eq!(mesh.edges[4].nodes, [0, 2]);
    }

    #[test]
    fn test_comments_anywhere() {
        let contents = "> header comment\n\
            n 2\n\
            > between records\n\
            1\t0.0\t0.0\n\
            2\t1.0\t0.0\n\
            > before triangles\n\
            t 0\n\
            e 1\n\
            > inside edges\n\
            0\t1\n\
            > trailing\n";
        let mesh = parse_mesh(contents).unwrap();

        assert_eq!(mesh.nodes.len(), 2);
        assert_eq!(mesh.edges[0].nodes, [0, 1]);
    }

    #[test]
    fn test_comment_filter_keeps_order() {
        let lines = strip_comments("a 1\n> x\n>not a comment\nb 2\n> y\nc 3");
        let texts: Vec<&str> = lines.iter().map(|l| l.text).collect();
        let numbers: Vec<usize> = lines.iter().map(|l| l.number).collect();

        assert_eq!(texts, vec!["a 1", ">not a comment", "b 2", "c 3"]);
        assert_eq!(numbers, vec![1, 3, 4, 6]);
        assert!(lines.iter().all(|l| !is_comment(l.text)));
    }

    #[test]
    fn test_writer_layout() {
        // padded columns, boundary names and a trailing neighbor block
        let contents = "NODES 3\r\n\
            0\t  0.00000\t  0.00000\tWALL\tNone\r\n\
            1\t  1.00000\t  0.00000\tWALL\tNone\r\n\
            2\t  0.50000\t  0.75000\tNone\tNone\r\n\
            TRIANGLES 1\r\n\
            4\t0\t1\t2\r\n\
            EDGES 1\r\n\
            0\t        0\t        1\t        4\t       -1\tWALL\r\n\
            TRI NEIGHBORS 1\r\n\
            4\t       -1\t       -1\t       -1\t        0\t       -1\t       -1\r\n";
        let mesh = parse_mesh(contents).unwrap();

        assert_relative_eq!(mesh.nodes[2].x, 0.5);
        assert_relative_eq!(mesh.nodes[2].y, 0.75);
        assert_eq!(mesh.triangles[0].index, 4);
        assert_eq!(mesh.edges, vec![Edge { nodes: [0, 1] }]);
    }

    #[test]
    fn test_short_triangle_section() {
        let contents = "n 3\n\
            1\t0.0\t0.0\n\
            2\t1.0\t0.0\n\
            3\t0.0\t1.0\n\
            t 2\n\
            1\t0\t1\t2\n\
            e 0\n";
        let err = parse_mesh(contents).unwrap_err();

        match err {
            MeshPlotError::Parse(msg) => assert!(msg.starts_with("line 7 (triangle section)")),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_truncated_file() {
        let err = parse_mesh("n 2\n1\t0.0\t0.0\n").unwrap_err();

        match err {
            MeshPlotError::Parse(msg) => assert!(msg.contains("declares 2 records")),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_missing_edge_header() {
        assert!(matches!(
            parse_mesh("n 0\nt 0\n"),
            Err(MeshPlotError::Parse(_))
        ));
    }

    #[test]
    fn test_bad_header() {
        assert!(matches!(parse_mesh("NODES\n"), Err(MeshPlotError::Parse(_))));
        assert!(matches!(parse_mesh("NODES three\n"), Err(MeshPlotError::Parse(_))));
        assert!(matches!(parse_mesh("NODES\t3\n"), Err(MeshPlotError::Parse(_))));
    }

    #[test]
    fn test_non_numeric_field() {
        let err = parse_mesh("n 1\n1\tabc\t0.0\nt 0\ne 0\n").unwrap_err();

        match err {
            MeshPlotError::Parse(msg) => {
                assert!(msg.starts_with("line 2 (node section)"));
                assert!(msg.contains("'abc'"));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_space_delimited_record_rejected() {
        assert!(matches!(
            parse_mesh("n 1\n1 0.0 0.0\nt 0\ne 0\n"),
            Err(MeshPlotError::Parse(_))
        ));
    }

    #[test]
    fn test_read_mesh_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SMALL_MESH.as_bytes()).unwrap();

        let mesh = read_mesh(file.path().to_str().unwrap()).unwrap();
        assert_eq!(mesh.nodes.len(), 3);
        assert_eq!(mesh.triangles.len(), 1);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.dat");

        assert!(matches!(
            read_mesh(path.to_str().unwrap()),
            Err(MeshPlotError::Input(_))
        ));
    }
}
