use anyhow::{Result, bail};
use std::path::Path;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use reps_core::error::{CoreError, CoreResult};
use reps_core::models::{NewWorkout, UpdateWorkout, Workout};

use super::helpers::{json_error, read_media, truncate};
use crate::Service;

/// Unwrap a workout lookup, exiting with status 2 when it does not exist.
fn or_not_found<T>(result: CoreResult<T>, json: bool) -> Result<T> {
    match result {
        Err(err @ CoreError::WorkoutNotFound(_)) => {
            if json {
                println!("{}", json_error(&err.to_string()));
            } else {
                eprintln!("{err}");
            }
            process::exit(2);
        }
        other => Ok(other?),
    }
}

fn print_workout(workout: &Workout) {
    println!("#{} {}", workout.id, workout.name);
    if let Some(ref category) = workout.category {
        println!("  Category: {category}");
    }
    if workout.plan.is_empty() {
        println!("  (no plan steps)");
    }
    for (i, step) in workout.plan.iter().enumerate() {
        println!("  {}. {step}", i + 1);
    }
    if let Some(ref url) = workout.image_url {
        println!("  Photo: {url}");
    }
    if let Some(ref url) = workout.video_url {
        println!("  Video: {url}");
    }
    if let Some(completed_at) = workout.completed_at {
        println!(
            "  Last done: {}",
            completed_at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
        );
    }
}

pub(crate) fn cmd_workout_add(
    service: &Service,
    name: &str,
    steps: Vec<String>,
    category: Option<String>,
    json: bool,
) -> Result<()> {
    let workout = service.create_workout(NewWorkout {
        name: name.to_string(),
        plan: steps,
        category,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&workout)?);
    } else {
        let count = workout.plan.len();
        println!("Created workout #{}: {} ({count} steps)", workout.id, workout.name);
    }

    Ok(())
}

pub(crate) fn cmd_workout_list(service: &Service, json: bool) -> Result<()> {
    let workouts = service.list_workouts()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&workouts)?);
    } else if workouts.is_empty() {
        eprintln!("No workouts yet. Use `reps workout add` to create one.");
    } else {
        #[derive(Tabled)]
        struct WorkoutRow {
            #[tabled(rename = "ID")]
            id: i64,
            #[tabled(rename = "Name")]
            name: String,
            #[tabled(rename = "Category")]
            category: String,
            #[tabled(rename = "Steps")]
            steps: usize,
            #[tabled(rename = "Last done")]
            last_done: String,
        }

        let rows: Vec<WorkoutRow> = workouts
            .iter()
            .map(|w| WorkoutRow {
                id: w.id,
                name: truncate(&w.name, 35),
                category: w.category.clone().unwrap_or_default(),
                steps: w.plan.len(),
                last_done: w.completed_at.map_or_else(
                    || "-".to_string(),
                    |at| {
                        at.with_timezone(&chrono::Local)
                            .format("%Y-%m-%d")
                            .to_string()
                    },
                ),
            })
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(3..4)).with(Alignment::right()))
            .to_string();
        println!("{table}");
    }

    Ok(())
}

pub(crate) fn cmd_workout_show(service: &Service, id: i64, json: bool) -> Result<()> {
    let workout = or_not_found(service.get_workout(id), json)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&workout)?);
    } else {
        print_workout(&workout);
    }

    Ok(())
}

#[allow(clippy::option_option)]
pub(crate) fn cmd_workout_edit(
    service: &Service,
    id: i64,
    name: Option<String>,
    steps: Option<Vec<String>>,
    category: Option<Option<String>>,
    json: bool,
) -> Result<()> {
    let update = UpdateWorkout {
        name,
        plan: steps,
        category,
        ..UpdateWorkout::default()
    };
    if update.is_empty() {
        bail!("Nothing to update. Provide at least one of --name, --step, --category, or --clear-category");
    }

    let workout = or_not_found(service.update_workout(id, update), json)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&workout)?);
    } else {
        println!("Updated workout #{}", workout.id);
        print_workout(&workout);
    }

    Ok(())
}

pub(crate) fn cmd_workout_delete(service: &Service, id: i64, json: bool) -> Result<()> {
    or_not_found(service.delete_workout(id), json)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted workout {id}. Past completions stay in your history.");
    }

    Ok(())
}

pub(crate) fn cmd_workout_photo(service: &Service, id: i64, file: &Path, json: bool) -> Result<()> {
    let (bytes, content_type) = read_media(file)?;
    let workout = or_not_found(service.attach_workout_photo(id, &bytes, content_type), json)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&workout)?);
    } else {
        println!(
            "Attached photo to #{}: {}",
            workout.id,
            workout.image_url.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

pub(crate) fn cmd_workout_video(service: &Service, id: i64, file: &Path, json: bool) -> Result<()> {
    let (bytes, content_type) = read_media(file)?;
    let workout = or_not_found(service.attach_workout_video(id, &bytes, content_type), json)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&workout)?);
    } else {
        println!(
            "Attached video to #{}: {}",
            workout.id,
            workout.video_url.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

pub(crate) fn cmd_done(service: &Service, id: i64, json: bool) -> Result<()> {
    let receipt = or_not_found(service.mark_complete(id), json)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
    } else {
        println!(
            "Nice work! +{} points, {} total (level {}, {}/{} to next)",
            reps_core::xp::POINTS_PER_COMPLETION,
            receipt.points,
            receipt.xp.level,
            receipt.xp.in_level,
            reps_core::xp::POINTS_PER_LEVEL,
        );
    }

    Ok(())
}
