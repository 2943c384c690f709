use bytesize::ByteSize;

pub fn human_bytes(b: u64) -> String {
    ByteSize::b(b).to_string()
}

/// What a tree's weights measure. Scanned directories weigh bytes; loaded
/// trees carry whatever unit their size attribute uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WeightUnit {
    Bytes,
    #[default]
    Plain,
}

impl WeightUnit {
    pub fn format(self, weight: u64) -> String {
        match self {
            WeightUnit::Bytes => human_bytes(weight),
            WeightUnit::Plain => weight.to_string(),
        }
    }
}

/// Splits a dotted name one segment per line. Also returns the longest
/// segment, which renderers use to pick a font size.
pub fn make_caption(name: &str) -> (String, usize) {
    let max = name.split('.').map(|s| s.chars().count()).max().unwrap_or(0);
    (name.replace('.', "\n"), max)
}
