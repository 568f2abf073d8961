//! Order command handlers.

use tabled::Tabled;

use tankwatch_api::{FuelApiClient, Order};
use tankwatch_config::Config;
use tankwatch_core::CoreError;

use crate::cli::{GlobalOpts, OrdersArgs, OrdersCommand};
use crate::config::build_client;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct OrderRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Oil")]
    oil_type: String,
    #[tabled(rename = "Station")]
    station: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&Order> for OrderRow {
    fn from(o: &Order) -> Self {
        Self {
            id: o.id,
            name: o.name.clone(),
            oil_type: o.oil_type.clone(),
            station: o.station.map(|s| s.to_string()).unwrap_or_default(),
            email: o.email.clone(),
            status: o.status.clone(),
            created: o
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: OrdersArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let client = build_client(cfg)?;

    match args.command {
        OrdersCommand::List => {
            let orders = client.list_orders().await?;
            let rendered =
                output::render_list(global.output, &orders, |o| OrderRow::from(o), |o| o.id.to_string())?;
            output::print_output(&rendered, global.quiet);
            Ok(())
        }

        OrdersCommand::Approve {
            id,
            email,
            no_notify,
        } => {
            // Resolve the recipient before touching the order so a missing
            // email never leaves an approved order without its notice.
            let recipient = match (no_notify, email) {
                (true, _) => None,
                (false, Some(email)) => Some(email),
                (false, None) => Some(requester_email(&client, id).await?),
            };

            client
                .approve_order(id)
                .await
                .map_err(|e| order_error(e, id))?;
            if !global.quiet {
                eprintln!("Order {id} approved");
            }

            if let Some(recipient) = recipient {
                match client.send_approval_notification(&recipient).await {
                    Ok(()) => {
                        if !global.quiet {
                            eprintln!("Approval notice sent to {recipient}");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "approval notice failed");
                        eprintln!("warning: order approved but the notice to {recipient} failed: {e}");
                    }
                }
            }
            Ok(())
        }
    }
}

/// The notice goes to whoever placed the order.
async fn requester_email(client: &FuelApiClient, id: u64) -> Result<String, CliError> {
    let order = client.get_order(id).await.map_err(|e| order_error(e, id))?;
    let email = order.email.trim();
    if email.is_empty() {
        return Err(CliError::Validation {
            field: "email".into(),
            reason: format!("order {id} has no requester email; pass --email or --no-notify"),
        });
    }
    Ok(email.to_owned())
}

fn order_error(e: tankwatch_api::Error, id: u64) -> CliError {
    match CoreError::from(e) {
        CoreError::NotFound { .. } => CliError::NotFound {
            resource_type: "order".into(),
            identifier: id.to_string(),
            list_command: "orders list".into(),
        },
        other => other.into(),
    }
}
