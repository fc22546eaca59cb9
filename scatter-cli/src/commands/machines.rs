//! Machine Commands
//!
//! Manage the block nodes the gateway distributes to.

use super::truncate;
use crate::client::{GatewayClient, MachineInfo, MachineRequest};
use crate::symbols;
use anyhow::{Context, Result};
use console::style;

pub enum MachineAction {
    List,
    Add(MachineRequest),
    Edit { id: i64, request: MachineRequest },
    Toggle { id: i64 },
    Remove { id: i64 },
    Check { id: Option<i64> },
}

pub async fn run(client: &GatewayClient, action: MachineAction) -> Result<()> {
    match action {
        MachineAction::List => {
            let machines = client
                .list_machines()
                .await
                .context("Failed to list machines")?;
            print_table(&machines);
        }

        MachineAction::Add(request) => {
            let machine = client
                .add_machine(&request)
                .await
                .context("Failed to add machine")?;
            println!(
                "{} Added {} ({}) as machine {}",
                style(symbols::CHECK).green(),
                style(&machine.name).bold(),
                machine.url,
                machine.id
            );
        }

        MachineAction::Edit { id, request } => {
            let machine = client
                .update_machine(id, &request)
                .await
                .context("Failed to update machine")?;
            println!(
                "{} Updated {} -> {} {}",
                style(symbols::CHECK).green(),
                style(&machine.name).bold(),
                machine.url,
                machine.storage_path
            );
        }

        MachineAction::Toggle { id } => {
            let machine = client
                .toggle_machine(id)
                .await
                .context("Failed to toggle machine")?;
            let state = if machine.is_active {
                style("active").green()
            } else {
                style("inactive").yellow()
            };
            println!("{} {} is now {}", style(symbols::CHECK).green(), machine.name, state);
        }

        MachineAction::Remove { id } => {
            client
                .remove_machine(id)
                .await
                .context("Failed to remove machine")?;
            println!("{} Removed machine {}", style(symbols::CHECK).green(), id);
        }

        MachineAction::Check { id } => {
            let ids = match id {
                Some(id) => vec![id],
                None => client
                    .list_machines()
                    .await
                    .context("Failed to list machines")?
                    .into_iter()
                    .map(|m| m.id)
                    .collect(),
            };
            for id in ids {
                let status = client
                    .machine_status(id)
                    .await
                    .context("Failed to check machine")?;
                if status.online {
                    println!(
                        "{} {:<20} {} online",
                        style(symbols::CHECK).green(),
                        status.machine.name,
                        status.machine.url
                    );
                } else {
                    println!(
                        "{} {:<20} {} offline",
                        style(symbols::CROSS).red(),
                        status.machine.name,
                        status.machine.url
                    );
                }
            }
        }
    }
    Ok(())
}

fn print_table(machines: &[MachineInfo]) {
    if machines.is_empty() {
        println!("{} No machines registered", style("Info:").cyan());
        return;
    }

    println!(
        "{:>4}  {:<20} {:<28} {:<24} {:<8} {}",
        style("ID").bold(),
        style("NAME").bold(),
        style("URL").bold(),
        style("STORAGE PATH").bold(),
        style("ACTIVE").bold(),
        style("LAST CHECK").bold()
    );
    println!("{}", symbols::rule(100));
    for m in machines {
        println!(
            "{:>4}  {:<20} {:<28} {:<24} {:<8} {}",
            m.id,
            truncate(&m.name, 20),
            truncate(&m.url, 28),
            truncate(&m.storage_path, 24),
            if m.is_active { "yes" } else { "no" },
            m.last_check
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "never".to_string())
        );
    }
}
