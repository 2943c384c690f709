use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed xml: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("document has no root element")]
    NoRoot,
    #[error("negative weight {value} on node {name:?}")]
    NegativeWeight { name: String, value: i64 },
    #[error("weight overflow below node {0:?}")]
    Overflow(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavError {
    #[error("no node at path {0:?}")]
    NoSuchNode(Vec<usize>),
    #[error("node {0:?} has no children to enter")]
    Leaf(String),
}
