//! Bulb command handlers.

use chrono::DateTime;
use tabled::Tabled;
use valo_core::{BulbDto, BulbPayload, BulbsPayload, Controller};

use crate::cli::{BulbsArgs, BulbsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub(super) struct BulbRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Power")]
    power: String,
    #[tabled(rename = "Online")]
    online: String,
    #[tabled(rename = "Color")]
    color: String,
    #[tabled(rename = "Alpha")]
    alpha: String,
    #[tabled(rename = "Last Seen")]
    last_seen: String,
}

impl BulbRow {
    pub(super) fn new(b: &BulbDto, color: bool) -> Self {
        let state = b.light_state();
        Self {
            id: b.accessory_id.to_string(),
            name: b.name.clone(),
            power: output::power_label(b.is_on, color),
            online: if b.is_online { "yes" } else { "no" }.into(),
            color: output::color_label(&state),
            alpha: format!("{:.2}", b.rgba.alpha),
            last_seen: last_seen(b.last_seen_unix_timestamp),
        }
    }
}

fn last_seen(unix: i64) -> String {
    DateTime::from_timestamp(unix, 0).map_or_else(
        || "-".into(),
        |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

fn detail(b: &BulbDto, color: bool) -> String {
    [
        format!("ID:        {}", b.accessory_id),
        format!("Name:      {}", b.name),
        format!("Power:     {}", output::power_label(b.is_on, color)),
        format!("Online:    {}", if b.is_online { "yes" } else { "no" }),
        format!("Color:     {}", output::color_label(&b.light_state())),
        format!("Alpha:     {:.2}", b.rgba.alpha),
        format!("Last Seen: {}", last_seen(b.last_seen_unix_timestamp)),
    ]
    .join("\n")
}

fn print_bulb(global: &GlobalOpts, bulb: BulbDto) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let payload = BulbPayload { bulb };
    let out = output::render_single(
        &global.output,
        &payload.bulb,
        &payload,
        |b| detail(b, color),
        |b| b.accessory_id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: BulbsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        BulbsCommand::List { group } => {
            let bulbs = output::checked(global, controller.list_bulbs(group).await)?;
            let color = output::should_color(&global.color);
            let payload = BulbsPayload { bulbs };
            let out = output::render_list(
                &global.output,
                &payload.bulbs,
                &payload,
                |b| BulbRow::new(b, color),
                |b| b.accessory_id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        BulbsCommand::Show { id } => {
            let bulb = output::checked(global, controller.bulb(id).await)?;
            print_bulb(global, bulb)
        }

        BulbsCommand::Rename { id, name } => {
            let bulb = output::checked(global, controller.rename_bulb(id, &name).await)?;
            print_bulb(global, bulb)
        }

        BulbsCommand::SetLight { id, light } => {
            let state = light.to_state();
            let bulb = output::checked(global, controller.set_bulb_light(id, state).await)?;
            print_bulb(global, bulb)
        }
    }
}
