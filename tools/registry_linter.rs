/// Registry Linter: validates a story registry and flags thin content.
///
/// Usage: registry_linter <registry.ron>

use narrative_translation::core::registry::Registry;
use narrative_translation::schema::fact::FactKind;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: registry_linter <registry.ron>");
        process::exit(0);
    }

    // Structural checks (level coverage, ids, lesson numbering) happen on load
    let registry = match Registry::load_from_ron(Path::new(&args[1])) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    println!(
        "Loaded {} scales, {} facts, {} boundaries, {} lessons, {} exemplars",
        registry.scales().len(),
        registry.facts().len(),
        registry.boundaries().len(),
        registry.lessons().len(),
        registry.voice().len()
    );

    let warnings = lint_registry(&registry);

    println!("\n=== Registry Lint Report ===\n");

    if warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    println!("\nSummary: {} warnings", warnings.len());
}

fn lint_registry(registry: &Registry) -> Vec<String> {
    let mut warnings = Vec::new();

    for scale in registry.scales().iter() {
        for (level, text) in scale.levels() {
            if text.trim().is_empty() {
                warnings.push(format!("Scale '{}' level {} has blank text", scale.id, level));
            }
        }
        if scale.transitions.is_empty() {
            warnings.push(format!("Scale '{}' declares no transitions", scale.id));
        }
    }

    for fact in registry.facts().iter() {
        match &fact.kind {
            FactKind::Flag { on, off } if on.trim().is_empty() && off.trim().is_empty() => {
                warnings.push(format!("Fact '{}' never contributes a line", fact.id));
            }
            FactKind::Buckets(states) => {
                for (state, text) in states {
                    if text.trim().is_empty() {
                        warnings.push(format!(
                            "Fact '{}' state '{}' has blank text",
                            fact.id, state
                        ));
                    }
                }
            }
            _ => {}
        }
    }

    for lesson in registry.lessons().iter() {
        let (insight, angle) = lesson.pair();
        if insight.trim().is_empty() || angle.trim().is_empty() {
            warnings.push(format!("Lesson {} ('{}') is missing a line", lesson.index, lesson.title));
        }
    }

    if !registry.boundaries().has_fallback() {
        warnings.push("No boundary fallback: unlisted boundary names will fail".to_string());
    }

    if registry.voice().is_empty() {
        warnings.push("Voice bank is empty".to_string());
    }

    warnings
}
