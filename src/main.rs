use anyhow::Context;
use sitesketch::{init_logging, run_script, PlanningSession, Script, SettingsPersistence};
use std::path::Path;

const USAGE: &str = "usage: sitesketch <script.json> [settings.toml|settings.json]";

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let script_path = args.next().context(USAGE)?;

    let persistence = match args.next() {
        Some(path) => SettingsPersistence::load_from_file(Path::new(&path))
            .with_context(|| format!("loading settings from {}", path))?,
        None => SettingsPersistence::load_or_default(&SettingsPersistence::default_path()?)?,
    };

    init_logging(&persistence.config().logging)?;
    tracing::info!(
        "SiteSketch {} (built {})",
        sitesketch::VERSION,
        sitesketch::BUILD_DATE
    );

    let script = Script::load(Path::new(&script_path))
        .with_context(|| format!("loading script {}", script_path))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = tokio::task::LocalSet::new();

    let report = local.block_on(&runtime, async move {
        let session = PlanningSession::new(persistence)?;
        anyhow::Ok(run_script(&session, script).await)
    })?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.errors.is_empty() {
        tracing::warn!("{} step(s) were refused", report.errors.len());
    }
    Ok(())
}
