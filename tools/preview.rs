/// Preview: compose a JSON state file and print the context by section.
///
/// Usage: preview [--story <name> | --registry <path>] [--previous <state.json>] <state.json>

use narrative_translation::core::context::Section;
use narrative_translation::core::pipeline::Composer;
use narrative_translation::schema::snapshot::RawState;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut builder = Composer::builder().story("no_vacancies");
    let mut previous_path = None;
    let mut state_path = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--story" if i + 1 < args.len() => {
                i += 1;
                builder = builder.story(&args[i]);
            }
            "--registry" if i + 1 < args.len() => {
                i += 1;
                builder = builder.registry_path(&args[i]);
            }
            "--previous" if i + 1 < args.len() => {
                i += 1;
                previous_path = Some(args[i].clone());
            }
            other if !other.starts_with("--") && state_path.is_none() => {
                state_path = Some(other.to_string());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let Some(state_path) = state_path else {
        print_usage();
        process::exit(1);
    };

    let composer = match builder.build() {
        Ok(composer) => composer,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    let current = read_state(&state_path);
    let context = match composer.compose_raw(&current) {
        Ok(context) => context,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    for (title, section) in [
        ("Scales", Section::Scale),
        ("Facts", Section::Fact),
        ("Lessons", Section::Lesson),
        ("Voice", Section::Exemplar),
    ] {
        println!("=== {} ===", title);
        for line in context.section(section) {
            println!("{}", line);
        }
        println!();
    }

    match composer.normalize(&current).and_then(|snapshot| composer.lesson_history(&snapshot)) {
        Ok(history) => {
            println!("=== History ===");
            for line in &history {
                println!("{}", line);
            }
            println!();
        }
        Err(e) => eprintln!("ERROR: {}", e),
    }

    if let Some(path) = previous_path {
        let bridge = composer
            .normalize(&read_state(&path))
            .and_then(|previous| {
                let current = composer.normalize(&current)?;
                composer.bridge(&previous, &current)
            });
        match bridge {
            Ok(bridge) => {
                println!("=== Changed: {} ===", bridge.changed.join(", "));
                for line in &bridge.lines {
                    println!("{}", line);
                }
            }
            Err(e) => eprintln!("ERROR: {}", e),
        }
    }
}

fn read_state(path: &str) -> RawState {
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|json| RawState::from_json(&json).map_err(|e| e.to_string()));
    match parsed {
        Ok(state) => state,
        Err(e) => {
            eprintln!("ERROR: failed to read {}: {}", path, e);
            process::exit(1);
        }
    }
}

fn print_usage() {
    println!("Usage: preview [--story <name> | --registry <path>] [--previous <state.json>] <state.json>");
}
