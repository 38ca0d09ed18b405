//! Image commands

use std::path::Path;

use colored::Colorize;
use horizon_image::{SystemImage, compare, deployment_order, validate};

use crate::error::{CliError, Result};

fn load_image(path: &Path) -> Result<SystemImage> {
    SystemImage::load(path)
        .map_err(|e| CliError::user(format!("Cannot read image {}: {e}", path.display())))
}

/// Report every integrity violation in the image at `path`
pub fn run_image_validate(path: &Path) -> Result<()> {
    let image = load_image(path)?;
    let violations = validate(&image);

    if violations.is_empty() {
        println!("{} Image {} is valid", "✓".green(), image.version.cyan());
        return Ok(());
    }

    println!("{}", "Integrity violations".red().bold());
    println!();
    for violation in &violations {
        println!("  {} {}", "-".red(), violation);
    }
    Err(CliError::user(format!(
        "{} violation(s) found",
        violations.len()
    )))
}

/// Print the content digest of the image at `path`
pub fn run_image_digest(path: &Path) -> Result<()> {
    let image = load_image(path)?;
    println!("{}", image.checksum()?);
    Ok(())
}

/// Show what changed from `old` to `new`
pub fn run_image_diff(old: &Path, new: &Path, json: bool) -> Result<()> {
    let diff = compare(&load_image(old)?, &load_image(new)?);

    if json {
        println!("{}", serde_json::to_string_pretty(&diff)?);
    } else {
        print!("{diff}");
    }
    Ok(())
}

/// Print the deployment order of the image's layers
pub fn run_image_order(path: &Path) -> Result<()> {
    let image = load_image(path)?;
    let order = deployment_order(&image)?;

    if order.is_empty() {
        println!("{}", "No layers".dimmed());
        return Ok(());
    }
    for (n, layer) in order.iter().enumerate() {
        println!(
            "{:>3}. {} {}",
            n + 1,
            layer.name.cyan(),
            format!("(priority {})", layer.priority).dimmed()
        );
    }
    Ok(())
}
