use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

use crate::error::LoadError;
use crate::model::WeightedNode;

/// Reads a weighted tree from nested XML elements, e.g.
///
/// ```xml
/// <Node Name="mscorlib.dll">
///   <Node Name="System.String"><Node Name="Concat" Size="120"/></Node>
/// </Node>
/// ```
///
/// Every element is a node regardless of its tag. Values of the size and
/// secondary attributes are summed bottom-up; values that do not parse as
/// integers are ignored.
#[derive(Debug, Clone)]
pub struct XmlLoader {
    pub size_attr: String,
    pub secondary_attr: String,
}

impl Default for XmlLoader {
    fn default() -> Self {
        Self {
            size_attr: "Size".into(),
            secondary_attr: "Extra".into(),
        }
    }
}

impl XmlLoader {
    pub fn new(size_attr: impl Into<String>, secondary_attr: impl Into<String>) -> Self {
        Self {
            size_attr: size_attr.into(),
            secondary_attr: secondary_attr.into(),
        }
    }

    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<WeightedNode, LoadError> {
        let text = std::fs::read_to_string(path)?;
        self.load_str(&text)
    }

    /// Parses the first root element of `text`. Anything after it is ignored.
    pub fn load_str(&self, text: &str) -> Result<WeightedNode, LoadError> {
        let mut reader = Reader::from_str(text);
        reader.trim_text(true);
        let mut open: Vec<WeightedNode> = Vec::new();
        loop {
            let finished = match reader.read_event()? {
                Event::Start(e) => {
                    open.push(self.start_node(&e)?);
                    None
                }
                Event::Empty(e) => {
                    let node = self.start_node(&e)?;
                    attach(&mut open, node)?
                }
                Event::End(_) => {
                    let node = open.pop().ok_or(LoadError::NoRoot)?;
                    attach(&mut open, node)?
                }
                Event::Eof => return Err(LoadError::NoRoot),
                _ => None,
            };
            if let Some(root) = finished {
                tracing::debug!(nodes = root.node_count(), weight = root.weight, "loaded xml tree");
                return Ok(root);
            }
        }
    }

    fn start_node(&self, e: &BytesStart<'_>) -> Result<WeightedNode, LoadError> {
        let mut node = WeightedNode::default();
        let mut size = None;
        for attr in e.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = attr.key.as_ref();
            let value = attr.unescape_value()?;
            if key == b"Name" {
                node.name = value.into_owned();
            } else if key == self.size_attr.as_bytes() {
                size = value.trim().parse::<i64>().ok();
            } else if key == self.secondary_attr.as_bytes() {
                node.secondary = value.trim().parse::<i64>().unwrap_or(0);
            }
        }
        if let Some(value) = size {
            node.weight = u64::try_from(value).map_err(|_| LoadError::NegativeWeight {
                name: node.name.clone(),
                value,
            })?;
        }
        Ok(node)
    }
}

/// Closes `node`, folding it into its parent. Returns it if it was the root.
fn attach(
    open: &mut [WeightedNode],
    node: WeightedNode,
) -> Result<Option<WeightedNode>, LoadError> {
    let Some(parent) = open.last_mut() else {
        return Ok(Some(node));
    };
    parent.weight = parent
        .weight
        .checked_add(node.weight)
        .ok_or_else(|| LoadError::Overflow(parent.name.clone()))?;
    parent.secondary = parent
        .secondary
        .checked_add(node.secondary)
        .ok_or_else(|| LoadError::Overflow(parent.name.clone()))?;
    parent.children.push(node);
    Ok(None)
}
