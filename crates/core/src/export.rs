use crate::treemap::Layout;

fn path_string(path: &[usize]) -> String {
    path.iter().map(usize::to_string).collect::<Vec<_>>().join("/")
}

pub fn to_csv(layout: &Layout, mut w: impl std::io::Write) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(&mut w);
    writer.write_record([
        "path", "depth", "name", "weight", "secondary", "area", "x", "y", "w", "h",
    ])?;
    for item in &layout.items {
        writer.write_record([
            path_string(&item.path),
            item.depth.to_string(),
            item.name.clone(),
            item.weight.to_string(),
            item.secondary.to_string(),
            item.area.to_string(),
            item.rect.x.to_string(),
            item.rect.y.to_string(),
            item.rect.w.to_string(),
            item.rect.h.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn to_json(layout: &Layout) -> serde_json::Value {
    serde_json::json!({
        "bounds": layout.bounds,
        "items": layout.items,
    })
}
