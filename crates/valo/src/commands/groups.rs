//! Group command handlers.

use tabled::Tabled;
use valo_core::{Controller, GroupDto, GroupPayload, GroupsPayload};

use crate::cli::{GlobalOpts, GroupsArgs, GroupsCommand};
use crate::error::CliError;
use crate::output;

use super::bulbs::BulbRow;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Bulbs")]
    bulbs: String,
    #[tabled(rename = "Power")]
    power: String,
    #[tabled(rename = "Color")]
    color: String,
    #[tabled(rename = "Alpha")]
    alpha: String,
}

impl GroupRow {
    fn new(g: &GroupDto, color: bool) -> Self {
        Self {
            id: g.id.to_string(),
            name: g.name.clone(),
            bulbs: g.bulbs.len().to_string(),
            power: output::power_label(g.light_state.on, color),
            color: output::color_label(&g.light_state),
            alpha: format!("{:.2}", g.light_state.intensity),
        }
    }
}

fn detail(g: &GroupDto, color: bool) -> String {
    let mut lines = vec![
        format!("ID:     {}", g.id),
        format!("Name:   {}", g.name),
        format!("Power:  {}", output::power_label(g.light_state.on, color)),
        format!("Color:  {}", output::color_label(&g.light_state)),
        format!("Alpha:  {:.2}", g.light_state.intensity),
    ];
    if g.bulbs.is_empty() {
        lines.push("Bulbs:  -".into());
    } else {
        let rows: Vec<BulbRow> = g.bulbs.iter().map(|b| BulbRow::new(b, color)).collect();
        lines.push(String::new());
        lines.push(
            tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string(),
        );
    }
    lines.join("\n")
}

// ── Shared printers ─────────────────────────────────────────────────

pub(super) fn print_groups(global: &GlobalOpts, groups: Vec<GroupDto>) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let payload = GroupsPayload { groups };
    let out = output::render_list(
        &global.output,
        &payload.groups,
        &payload,
        |g| GroupRow::new(g, color),
        |g| g.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn print_group(global: &GlobalOpts, group: GroupDto) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let payload = GroupPayload { group };
    let out = output::render_single(
        &global.output,
        &payload.group,
        &payload,
        |g| detail(g, color),
        |g| g.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: GroupsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        GroupsCommand::List => {
            let groups = output::checked(global, controller.list_groups().await)?;
            print_groups(global, groups)
        }

        GroupsCommand::Show { id } => {
            let group = output::checked(global, controller.group(id).await)?;
            print_group(global, group)
        }

        GroupsCommand::Rename { id, name } => {
            let group = output::checked(global, controller.rename_group(id, &name).await)?;
            print_group(global, group)
        }

        GroupsCommand::SetLight { id, light } => {
            let state = light.to_state();
            let group = output::checked(global, controller.set_group_light(id, state).await)?;
            print_group(global, group)
        }
    }
}
