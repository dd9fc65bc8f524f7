use std::path::Path;

use stagewalk_core::BUILTIN_STAGES;

use crate::project::load_stage;

pub fn dump(stage: &str, output: Option<&Path>) -> anyhow::Result<()> {
    let (def, _) = load_stage(stage)?;
    let text = def.to_toml()?;
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            log::info!("wrote {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

pub fn list() {
    for name in BUILTIN_STAGES {
        println!("{name}");
    }
}
