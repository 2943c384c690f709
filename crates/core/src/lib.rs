pub mod error;
pub mod export;
pub mod human;
pub mod model;
pub mod progress;
pub mod scanner;
pub mod search;
pub mod treemap;
pub mod view;
pub mod xml;

pub use error::*;
pub use model::*;
pub use progress::*;
pub use treemap::{layout, squarify, Layout, LayoutConfig, LayoutItem};
pub use view::{Frame, TreemapView};
pub use xml::XmlLoader;
