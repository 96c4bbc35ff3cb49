//! Queue and settings commands that only touch the store.

use anyhow::{bail, Result};
use chrono::Utc;
use relay_core::{split_prompts, PromptRecord, Settings};
use relay_engine::{PageInspection, QueueStore};

const PREVIEW_CHARS: usize = 60;

/// Converts a 1-based position from the command line.
pub fn position(index: usize) -> Result<usize> {
    match index.checked_sub(1) {
        Some(position) => Ok(position),
        None => bail!("prompt positions start at 1"),
    }
}

pub fn add(store: &QueueStore, raw: &str) -> Result<()> {
    let prompts = split_prompts(raw);
    if prompts.is_empty() {
        bail!("no prompt text given");
    }
    let added = store.add_prompts(&prompts, Utc::now())?;
    let queued = store.queue()?.len();
    println!("Added {added} prompt(s); {queued} queued");
    Ok(())
}

pub fn list(store: &QueueStore) -> Result<()> {
    let queue = store.queue()?;
    if queue.is_empty() {
        println!("Queue is empty");
        return Ok(());
    }
    for (index, record) in queue.iter().enumerate() {
        println!("{:>3}. {}", index + 1, summary(record));
    }
    Ok(())
}

pub fn show(store: &QueueStore, index: usize) -> Result<()> {
    let queue = store.queue()?;
    let record = queue.get(position(index)?)?;
    println!("{}", record.title);
    println!(
        "created {} | sent {} time(s)",
        record.created_at.to_rfc3339(),
        record.sent_count
    );
    println!();
    println!("{}", record.text);
    Ok(())
}

pub fn edit(store: &QueueStore, index: usize, text: &str) -> Result<()> {
    store.edit(position(index)?, text)?;
    println!("Updated prompt {index}");
    Ok(())
}

pub fn remove(store: &QueueStore, index: usize) -> Result<()> {
    let record = store.remove(position(index)?)?;
    println!("Removed {}", summary(&record));
    Ok(())
}

pub fn move_prompt(store: &QueueStore, from: usize, to: usize) -> Result<()> {
    store.move_prompt(position(from)?, position(to)?)?;
    println!("Moved prompt {from} to position {to}");
    Ok(())
}

pub fn clear(store: &QueueStore) -> Result<()> {
    let dropped = store.clear()?;
    println!("Cleared {dropped} prompt(s)");
    Ok(())
}

/// Applies the given overrides to the stored settings; prints the result.
pub fn settings(
    store: &QueueStore,
    poll_interval: Option<u64>,
    auto_submit: Option<bool>,
    delay: Option<u64>,
) -> Result<Settings> {
    let mut settings = store.settings()?;
    let changed = poll_interval.is_some() || auto_submit.is_some() || delay.is_some();
    if let Some(seconds) = poll_interval {
        settings.poll_interval_seconds = seconds;
    }
    if let Some(enabled) = auto_submit {
        settings.auto_submit_enabled = enabled;
    }
    if let Some(seconds) = delay {
        settings.auto_submit_delay_seconds = seconds;
    }
    if changed {
        store.save_settings(&settings)?;
        settings = store.settings()?;
    }

    println!("poll interval:     {}s", settings.poll_interval_seconds);
    println!("auto-submit:       {}", settings.auto_submit_enabled);
    println!("auto-submit delay: {}s", settings.auto_submit_delay_seconds);
    Ok(settings)
}

pub fn print_inspection(inspection: &PageInspection) {
    let describe = |handle: &Option<relay_engine::ControlHandle>| match handle {
        Some(handle) => format!("{handle} ({:?})", handle.kind),
        None => "not found".to_string(),
    };
    println!("status: {}", inspection.status);
    println!("prompt input:  {}", describe(&inspection.input));
    println!("submit button: {}", describe(&inspection.submit));
    println!();
    for control in &inspection.controls {
        println!(
            "{} text={:?} placeholder={:?} aria-label={:?} id={:?} class={:?}",
            control.handle,
            control.text,
            control.placeholder.as_deref().unwrap_or(""),
            control.aria_label.as_deref().unwrap_or(""),
            control.id.as_deref().unwrap_or(""),
            control.class.as_deref().unwrap_or(""),
        );
    }
}

fn summary(record: &PromptRecord) -> String {
    let sent = if record.is_sent {
        format!(" [sent x{}]", record.sent_count)
    } else {
        String::new()
    };
    format!("{}{} | {}", record.title, sent, record.preview(PREVIEW_CHARS))
}
