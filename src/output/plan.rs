//! Dry-run login plan output

use comfy_table::{presets::NOTHING, Table};
use serde::Serialize;

use super::common::{or_not_set, print_json, print_yaml};
use crate::cli::OutputFormat;
use crate::session::LoginPlan;

#[derive(Serialize, Debug)]
struct SerializablePlan {
    decision: &'static str,
    environment: String,
    endpoint: String,
    new_environment: bool,
    account: String,
    account_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tenant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    replaces: Option<String>,
}

impl From<&LoginPlan> for SerializablePlan {
    fn from(plan: &LoginPlan) -> Self {
        Self {
            decision: plan.decision.as_str(),
            environment: plan.environment.name().to_string(),
            endpoint: plan.environment.endpoint().to_string(),
            new_environment: plan.new_environment,
            account: plan.account.id().to_string(),
            account_type: plan.account.kind().label(),
            tenant: plan.account.tenant().map(str::to_string),
            replaces: plan.replaces.as_ref().map(|ctx| {
                format!("{} on {}", ctx.account().id(), ctx.environment().name())
            }),
        }
    }
}

/// Output what a login would do
pub fn output_login_plan(plan: &LoginPlan, format: OutputFormat) {
    let data = SerializablePlan::from(plan);
    match format {
        OutputFormat::Table => println!("{}", plan_table(&data)),
        OutputFormat::Json => print_json(&data),
        OutputFormat::Yaml => print_yaml(&data),
    }
}

fn plan_table(data: &SerializablePlan) -> Table {
    let account = if data.account.is_empty() {
        "<interactive>"
    } else {
        data.account.as_str()
    };
    let environment = if data.new_environment {
        format!("{} (new)", data.environment)
    } else {
        data.environment.clone()
    };

    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.add_row(vec!["Context", data.decision]);
    table.add_row(vec!["Environment", environment.as_str()]);
    table.add_row(vec!["Endpoint", data.endpoint.as_str()]);
    table.add_row(vec!["Account", account]);
    table.add_row(vec!["Type", data.account_type]);
    table.add_row(vec!["Tenant", or_not_set(data.tenant.as_deref())]);
    table.add_row(vec!["Replaces", or_not_set(data.replaces.as_deref())]);
    table
}
