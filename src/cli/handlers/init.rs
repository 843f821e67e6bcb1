use crate::cli::commands::InitArgs;
use crate::io::project_io;

const LANGUAGES: [&str; 4] = ["en", "de", "fr", "ja"];

/// Validate a language code against the built-in string tables.
fn validate_language(language: &str) -> Result<(), String> {
    if LANGUAGES.contains(&language) {
        Ok(())
    } else {
        Err(format!(
            "unsupported language \"{}\" (expected one of: {})",
            language,
            LANGUAGES.join(", ")
        ))
    }
}

pub fn cmd_init(args: InitArgs, start: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    validate_language(&args.language)?;

    // Warn when nesting inside another project
    if let Some(parent) = start.parent()
        && let Ok(parent_root) = project_io::discover_project(parent)
    {
        eprintln!(
            "Note: parent project found at {}/",
            parent_root.join(project_io::PROJECT_DIR).display()
        );
    }

    let project = project_io::init_project(start, args.name, &args.language)?;
    println!("Initialized contree project: {}", project.config.project.name);
    println!("  groups are titled \"{}\"", project.config.locale.group_name());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_languages_validate() {
        for language in LANGUAGES {
            assert!(validate_language(language).is_ok());
        }
        assert!(validate_language("xx").is_err());
        assert!(validate_language("").is_err());
    }
}
