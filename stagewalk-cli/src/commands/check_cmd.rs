use std::path::PathBuf;

use crate::project::load_stage_file;

/// Outcome of checking one stage file.
#[derive(Debug)]
pub struct CheckResult {
    pub path: PathBuf,
    pub error: Option<String>,
}

pub fn check_files(files: &[PathBuf]) -> Vec<CheckResult> {
    files
        .iter()
        .map(|path| {
            let error = load_stage_file(path)
                .and_then(|stage| stage.validate().map_err(anyhow::Error::from))
                .err()
                .map(|e| format!("{e:#}"));
            CheckResult {
                path: path.clone(),
                error,
            }
        })
        .collect()
}

pub fn check(files: Vec<PathBuf>) -> anyhow::Result<()> {
    let results = check_files(&files);
    let mut failed = 0;
    for result in &results {
        match &result.error {
            None => println!("ok     {}", result.path.display()),
            Some(e) => {
                failed += 1;
                println!("error  {}: {e}", result.path.display());
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} stage files failed", results.len());
    }
    Ok(())
}
