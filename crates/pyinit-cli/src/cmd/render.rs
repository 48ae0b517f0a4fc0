use crate::output::{print_fields, print_json};
use anyhow::Context;
use pyinit_core::bootstrap;
use pyinit_core::config::InitConfig;
use std::path::Path;

pub fn run(source: &Path, target: &Path, json: bool) -> anyhow::Result<()> {
    if !source.is_dir() {
        anyhow::bail!("template source '{}' is not a directory", source.display());
    }
    let cfg = InitConfig::default();
    let summary = bootstrap::apply_template(&cfg, source, target)
        .with_context(|| format!("failed to render {}", source.display()))?;

    if json {
        print_json(&summary)?;
    } else {
        println!(
            "Rendered '{}' into {}",
            source.display(),
            summary.target.display()
        );
        print_fields(&[
            ("processed", summary.render.processed.to_string()),
            ("rendered", summary.render.rendered.to_string()),
            ("skipped", summary.render.skipped.to_string()),
            ("context keys", summary.context_keys.to_string()),
        ]);
    }
    Ok(())
}
