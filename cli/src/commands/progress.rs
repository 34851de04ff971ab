use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use reps_core::achievements::AchievementState;
use reps_core::store::Clock;
use reps_core::timeline::Timeline;

use super::helpers::{parse_day, progress_bar, truncate};
use crate::Service;

const MAX_TIMELINE_DAYS: u32 = 366;

fn print_timeline(timeline: &Timeline) {
    for bucket in timeline {
        let marker = if bucket.is_today { " <- today" } else { "" };
        let dots = "●".repeat(bucket.completion_count as usize);
        println!("  {}  {dots:<5}{marker}", bucket.date_key);
    }
}

fn print_achievements(achievements: &[AchievementState]) {
    #[derive(Tabled)]
    struct AchievementRow {
        #[tabled(rename = "")]
        status: &'static str,
        #[tabled(rename = "Achievement")]
        title: &'static str,
        #[tabled(rename = "Description")]
        description: String,
        #[tabled(rename = "Progress")]
        progress: String,
    }

    let rows: Vec<AchievementRow> = achievements
        .iter()
        .map(|a| AchievementRow {
            status: if a.unlocked { "✓" } else { " " },
            title: a.title,
            description: truncate(a.description, 40),
            progress: format!("{}/{}", a.progress, a.threshold),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn cmd_stats(service: &Service, json: bool) -> Result<()> {
    let dashboard = service.dashboard()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        return Ok(());
    }

    let weekly = dashboard.weekly;
    let xp = dashboard.xp;
    let unlocked = dashboard.achievements.iter().filter(|a| a.unlocked).count();

    println!("Progress for {}", dashboard.user_id);
    println!();
    println!("  Streak:       {} day(s)", dashboard.streak_days);
    if weekly.is_met() {
        println!("  This week:    {}/{} - target met", weekly.done, weekly.target);
    } else {
        println!(
            "  This week:    {}/{} - {} to go",
            weekly.done,
            weekly.target,
            weekly.remaining()
        );
    }
    println!(
        "  Level {:<3}    {} {}/{} XP",
        xp.level,
        progress_bar(xp.pct),
        xp.in_level,
        reps_core::xp::POINTS_PER_LEVEL
    );
    println!("  Points:       {}", dashboard.points);
    println!(
        "  Achievements: {unlocked}/{} unlocked",
        dashboard.achievements.len()
    );
    println!();
    println!("Last {} days:", dashboard.timeline.len());
    print_timeline(&dashboard.timeline);

    Ok(())
}

pub(crate) fn cmd_timeline(service: &Service, days: u32, json: bool) -> Result<()> {
    if days == 0 || days > MAX_TIMELINE_DAYS {
        bail!("--days must be between 1 and {MAX_TIMELINE_DAYS}");
    }
    let timeline = service.timeline(days)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&timeline)?);
    } else {
        print_timeline(&timeline);
        println!();
        println!("{} completion(s) in the last {days} days", timeline.total());
    }

    Ok(())
}

pub(crate) fn cmd_day(service: &Service, day: Option<&str>, json: bool) -> Result<()> {
    let ymd = parse_day(day, service.clock().now().date_naive())?;
    let details = service.day_details(&ymd)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&details)?);
    } else if details.is_empty() {
        eprintln!("No workouts completed on {ymd}");
    } else {
        #[derive(Tabled)]
        struct DetailRow {
            #[tabled(rename = "Time")]
            time: String,
            #[tabled(rename = "Workout")]
            workout: String,
            #[tabled(rename = "Category")]
            category: String,
        }

        let rows: Vec<DetailRow> = details
            .iter()
            .map(|d| DetailRow {
                time: d
                    .completed_at
                    .with_timezone(&service.clock().timezone())
                    .format("%H:%M")
                    .to_string(),
                workout: truncate(&d.workout_name, 35),
                category: d.category.clone().unwrap_or_default(),
            })
            .collect();

        println!("{ymd}");
        let table = Table::new(&rows).with(Style::rounded()).to_string();
        println!("{table}");
    }

    Ok(())
}

pub(crate) fn cmd_achievements(service: &Service, json: bool) -> Result<()> {
    let achievements = service.achievements()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&achievements)?);
    } else {
        print_achievements(&achievements);
    }

    Ok(())
}
