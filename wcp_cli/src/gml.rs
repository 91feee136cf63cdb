//! GML input parsing.
//!
//! The parser understands the classic key-value GML shape: nested lists in
//! brackets, quoted strings and plain numbers. Nodes carry coordinates and
//! a shape inside their `graphics` block (`rectangle` for turbines,
//! `ellipse` for substations); substations carry their capacity in the
//! node `label`. Node ids must span `0..n`, edges refer to them.

use std::path::Path;
use windfarm::Instance;

#[derive(Debug, Clone)]
enum GmlValue {
    Number(f64),
    Text(String),
    List(Vec<(String, GmlValue)>),
}

#[derive(Debug, Clone)]
enum Token {
    Open,
    Close,
    Word(String),
    Quoted(String),
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            '[' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ']' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '"' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some(other) => text.push(other),
                        None => return Err("unterminated string in GML input".to_string()),
                    }
                }
                tokens.push(Token::Quoted(text));
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || c == '[' || c == ']' {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
        }
    }
    Ok(tokens)
}

/// Parses key-value entries until a closing bracket (or the end of input
/// at the top level).
fn parse_entries(
    tokens: &[Token],
    position: &mut usize,
) -> Result<Vec<(String, GmlValue)>, String> {
    let mut entries = Vec::new();
    while *position < tokens.len() {
        match &tokens[*position] {
            Token::Close => {
                *position += 1;
                return Ok(entries);
            }
            Token::Word(key) => {
                let key = key.clone();
                *position += 1;
                let value = match tokens.get(*position) {
                    Some(Token::Open) => {
                        *position += 1;
                        GmlValue::List(parse_entries(tokens, position)?)
                    }
                    Some(Token::Quoted(text)) => {
                        let text = text.clone();
                        *position += 1;
                        GmlValue::Text(text)
                    }
                    Some(Token::Word(word)) => {
                        let number = word
                            .parse::<f64>()
                            .map_err(|_| format!("expected a number after key '{}'", key))?;
                        *position += 1;
                        GmlValue::Number(number)
                    }
                    _ => return Err(format!("missing value after key '{}'", key)),
                };
                entries.push((key, value));
            }
            other => return Err(format!("unexpected token {:?} in GML input", other)),
        }
    }
    Ok(entries)
}

fn find<'a>(entries: &'a [(String, GmlValue)], key: &str) -> Option<&'a GmlValue> {
    entries.iter().find(|(k, _)| k.as_str() == key).map(|(_, v)| v)
}

fn number(entries: &[(String, GmlValue)], key: &str) -> Option<f64> {
    match find(entries, key) {
        Some(GmlValue::Number(n)) => Some(*n),
        _ => None,
    }
}

fn text<'a>(entries: &'a [(String, GmlValue)], key: &str) -> Option<&'a str> {
    match find(entries, key) {
        Some(GmlValue::Text(t)) => Some(t),
        _ => None,
    }
}

struct ParsedNode {
    id: usize,
    x: f64,
    y: f64,
    is_turbine: bool,
    capacity: i32,
}

/// Reads an instance from a GML file; the testset and instance numbers are
/// taken from the file name (`...-<testset>-...-<instance>....gml`).
pub fn read_instance(path: &Path) -> Result<Instance, String> {
    let input = std::fs::read_to_string(path)
        .map_err(|error| format!("could not read '{}': {}", path.display(), error))?;
    let (testset, instance_number) = numbers_from_file_name(path);
    parse_instance(&input, testset, instance_number)
}

/// First two digit runs in the file stem, in order; zero when absent.
pub fn numbers_from_file_name(path: &Path) -> (usize, usize) {
    let stem = path.file_stem().and_then(|stem| stem.to_str()).unwrap_or("");
    let mut runs = Vec::new();
    let mut current = String::new();
    for c in stem.chars() {
        if c.is_ascii_digit() {
            current.push(c);
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    let parse = |index: usize| runs.get(index).and_then(|run| run.parse().ok()).unwrap_or(0);
    (parse(0), parse(1))
}

pub fn parse_instance(
    input: &str,
    testset: usize,
    instance_number: usize,
) -> Result<Instance, String> {
    let tokens = tokenize(input)?;
    let mut position = 0;
    let document = parse_entries(&tokens, &mut position)?;
    let graph = match find(&document, "graph") {
        Some(GmlValue::List(entries)) => entries,
        _ => return Err("GML input has no graph block".to_string()),
    };

    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for (key, value) in graph {
        match (key.as_str(), value) {
            ("node", GmlValue::List(entries)) => nodes.push(parse_node(entries)?),
            ("edge", GmlValue::List(entries)) => {
                let source = number(entries, "source")
                    .ok_or_else(|| "edge without source".to_string())? as usize;
                let target = number(entries, "target")
                    .ok_or_else(|| "edge without target".to_string())? as usize;
                edges.push((source, target));
            }
            _ => {}
        }
    }

    nodes.sort_by_key(|node| node.id);
    for (index, node) in nodes.iter().enumerate() {
        if node.id != index {
            return Err(format!("node ids do not span 0..{}, found {}", nodes.len(), node.id));
        }
    }

    let mut instance = Instance::with_default_cables(testset, instance_number);
    for node in &nodes {
        if node.is_turbine {
            instance.add_turbine(node.x, node.y);
        } else {
            instance.add_substation(node.x, node.y, node.capacity);
        }
    }
    for (source, target) in edges {
        if source >= nodes.len() || target >= nodes.len() {
            return Err(format!("edge endpoint {}-{} out of range", source, target));
        }
        instance.add_edge(source, target);
    }
    Ok(instance)
}

fn parse_node(entries: &[(String, GmlValue)]) -> Result<ParsedNode, String> {
    let id = number(entries, "id").ok_or_else(|| "node without id".to_string())? as usize;
    let graphics = match find(entries, "graphics") {
        Some(GmlValue::List(entries)) => entries,
        _ => return Err(format!("node {} has no graphics block", id)),
    };
    let x = number(graphics, "x").ok_or_else(|| format!("node {} has no x coordinate", id))?;
    let y = number(graphics, "y").ok_or_else(|| format!("node {} has no y coordinate", id))?;
    let shape = text(graphics, "type")
        .or_else(|| text(graphics, "shape"))
        .ok_or_else(|| format!("node {} has no shape", id))?;

    match shape {
        "rectangle" => Ok(ParsedNode { id, x, y, is_turbine: true, capacity: 0 }),
        "ellipse" | "oval" => {
            let label = text(entries, "label")
                .ok_or_else(|| format!("substation {} has no capacity label", id))?;
            let capacity = label
                .trim()
                .parse::<i32>()
                .map_err(|_| format!("substation {} has capacity label '{}'", id, label))?;
            Ok(ParsedNode { id, x, y, is_turbine: false, capacity })
        }
        other => Err(format!("node {} has unrecognized shape '{}'", id, other)),
    }
}
