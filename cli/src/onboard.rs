use anyhow::{Context, Result};
use archchat_core::config::{self, Config};
use archchat_core::providers::SUPPORTED_MODELS;
use console::style;
use dialoguer::{Confirm, Input, Select};
use std::path::{Path, PathBuf};

const BANNER: &str = r"
    -------------------------------------

       a r c h c h a t

       chat with your architecture diagrams

    -------------------------------------
";

const TOTAL_STEPS: usize = 4;

fn print_step(step: usize, title: &str) {
    println!();
    println!(
        "{}",
        style(format!("[{}/{}] {}", step, TOTAL_STEPS, title))
            .cyan()
            .bold()
    );
    println!();
}

fn setup_region(current: Option<&str>) -> Result<String> {
    let region: String = Input::new()
        .with_prompt("AWS region with Bedrock access")
        .default(current.unwrap_or("us-east-1").to_string())
        .interact_text()
        .context("Failed to read region")?;

    let region = region.trim().to_string();
    if region.is_empty() {
        return Err(anyhow::anyhow!("Region cannot be empty"));
    }

    Ok(region)
}

fn setup_model(current: &str) -> Result<String> {
    let labels: Vec<String> = SUPPORTED_MODELS
        .iter()
        .map(|m| format!("{} ({})", m.label, m.id))
        .collect();
    let default = SUPPORTED_MODELS
        .iter()
        .position(|m| m.id == current)
        .unwrap_or(0);

    let selection = Select::new()
        .with_prompt("Select your model")
        .items(&labels)
        .default(default)
        .interact()
        .context("Failed to select model")?;

    Ok(SUPPORTED_MODELS[selection].id.to_string())
}

fn setup_knowledge_base(current: Option<&str>) -> Result<Option<String>> {
    let kb_id: String = Input::new()
        .with_prompt("Knowledge base id for best practices (leave empty to skip)")
        .default(current.unwrap_or_default().to_string())
        .allow_empty(true)
        .interact_text()
        .context("Failed to read knowledge base id")?;

    let kb_id = kb_id.trim();
    Ok((!kb_id.is_empty()).then(|| kb_id.to_string()))
}

fn setup_data_dir(current: &Path) -> Result<PathBuf> {
    let dir: String = Input::new()
        .with_prompt("Directory holding diagrams and tool data")
        .default(current.display().to_string())
        .interact_text()
        .context("Failed to read data directory")?;

    let dir = PathBuf::from(dir.trim());
    if !dir.exists() {
        let create = Confirm::new()
            .with_prompt(format!("{} does not exist. Create it?", dir.display()))
            .default(true)
            .interact()
            .context("Failed to confirm data directory")?;
        if create {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
    }

    Ok(dir)
}

pub fn run_onboard() -> Result<Config> {
    println!("{}", style(BANNER).cyan().bold());

    println!("  {}", style("Welcome to archchat!").white().bold());
    println!(
        "  {}",
        style("This wizard writes your Bedrock settings to the config file.").dim()
    );
    println!();

    let existing = if config::config_exists() {
        config::load_config().unwrap_or_default()
    } else {
        Config::default()
    };

    print_step(1, "AWS Region");
    let region = setup_region(existing.region.as_deref())?;

    print_step(2, "Model Selection");
    let model_id = setup_model(&existing.model_id)?;

    print_step(3, "Knowledge Base");
    let knowledge_base_id = setup_knowledge_base(existing.knowledge_base_id.as_deref())?;

    print_step(4, "Data Directory");
    let data_dir = setup_data_dir(&existing.data_dir)?;

    let config = Config {
        region: Some(region),
        model_id,
        knowledge_base_id,
        data_dir,
        ..existing
    };

    println!();
    println!("  {} Configuration complete!", style("✓").green().bold());
    println!(
        "  {} Config saved to {}",
        style("→").green(),
        style(config::get_config_path().display()).cyan()
    );
    println!(
        "  {} Credentials are read from AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY",
        style("→").green()
    );
    println!();
    println!(
        "  {} You can now run: {}",
        style("→").green(),
        style("archchat chat").cyan().bold()
    );
    println!();

    Ok(config)
}
