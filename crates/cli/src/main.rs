use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use treemap_core::human::WeightUnit;
use treemap_core::scanner::{ScanMsg, Scanner};
use treemap_core::treemap::DEFAULT_MIN_RECURSE_AREA;
use treemap_core::{export, LayoutConfig, Rect, TreemapView, WeightedNode, XmlLoader};

#[derive(Parser, Debug)]
#[command(name = "treemap-cli", about = "Squarified treemap layout of weighted trees")]
struct Args {
    /// XML tree description, or a directory to scan
    input: PathBuf,
    /// Viewport width
    #[arg(long, default_value_t = 1024.0)]
    width: f64,
    /// Viewport height
    #[arg(long, default_value_t = 768.0)]
    height: f64,
    /// Smallest area that is subdivided further
    #[arg(long, default_value_t = DEFAULT_MIN_RECURSE_AREA)]
    min_recurse_area: u64,
    /// Lay out sibling subtrees in parallel
    #[arg(long)]
    parallel: bool,
    /// XML attribute holding the primary weight
    #[arg(long, default_value = "Size")]
    size_attr: String,
    /// XML attribute holding the secondary metric
    #[arg(long, default_value = "Extra")]
    secondary_attr: String,
    /// Child to drill into, by name (repeatable, applied in order)
    #[arg(short, long)]
    drill: Vec<String>,
    /// Output JSON layout path
    #[arg(short, long)]
    json: Option<PathBuf>,
    /// Output CSV layout path
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn scan_dir(root: PathBuf) -> anyhow::Result<WeightedNode> {
    let cancel = Arc::new(AtomicBool::new(false));
    let (tx, rx) = crossbeam_channel::unbounded::<ScanMsg>();
    let scanner = Scanner::new(cancel);
    std::thread::spawn(move || scanner.scan(root, tx));

    let mut errors = 0u64;
    while let Ok(msg) = rx.recv() {
        match msg {
            ScanMsg::Progress(p) => {
                tracing::trace!(scanned = p.scanned, bytes = p.bytes, "progress")
            }
            ScanMsg::Error(_) => errors += 1,
            ScanMsg::Done(tree) => {
                if errors > 0 {
                    eprintln!("{errors} entries could not be read");
                }
                return Ok(tree);
            }
        }
    }
    bail!("scanner stopped without producing a tree")
}

fn load(args: &Args) -> anyhow::Result<(WeightedNode, WeightUnit)> {
    if args.input.is_dir() {
        return Ok((scan_dir(args.input.clone())?, WeightUnit::Bytes));
    }
    let tree = XmlLoader::new(&args.size_attr, &args.secondary_attr)
        .load_file(&args.input)
        .with_context(|| format!("loading {}", args.input.display()))?;
    Ok((tree, WeightUnit::Plain))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if !(args.width > 0.0 && args.height > 0.0) {
        bail!("viewport must have a positive size");
    }
    let (tree, unit) = load(&args)?;
    let config = LayoutConfig {
        min_recurse_area: args.min_recurse_area,
        parallel: args.parallel,
    };
    let mut view = TreemapView::new(&tree, Rect::new(0.0, 0.0, args.width, args.height), config);

    for name in &args.drill {
        let index = view
            .find_child(name)
            .with_context(|| format!("no child matching {name:?}"))?;
        view.enter_child(&[index])?;
    }

    let frame = view.current();
    let layout = frame.layout();
    println!("{}", view.breadcrumbs().join(" > "));
    println!(
        "{} ({}), {} children, {} visible rectangles",
        frame.node().name,
        unit.format(frame.node().weight),
        frame.node().children.len(),
        layout.items.len()
    );
    for item in layout.top_level() {
        println!(
            "  {:<40} {:>12} {:>8.1}x{:<8.1} at ({:.1}, {:.1})",
            item.name,
            unit.format(item.weight),
            item.rect.w,
            item.rect.h,
            item.rect.x,
            item.rect.y
        );
    }

    if let Some(path) = &args.json {
        let json = export::to_json(layout);
        std::fs::write(path, serde_json::to_string_pretty(&json)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    if let Some(path) = &args.csv {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        export::to_csv(layout, std::io::BufWriter::new(file))?;
    }
    Ok(())
}
